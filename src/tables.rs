//! OpenType font table parsing.

pub mod cmap;
