#![warn(rust_2018_idioms)]

//! OpenType glyph substitution.
//!
//! Maps characters to glyphs with the `cmap` table and applies `GSUB` lookups to sequences of
//! glyphs. Tables are validated in full when they are loaded and are safe to share between
//! threads once parsed.

/// Reading of binary data.
pub mod binary;
pub mod buffer;
pub mod context;
pub mod error;
pub mod gdef;
pub mod gsub;
pub mod layout;
pub mod sanitize;
pub mod search;
pub mod size;
pub mod tables;
