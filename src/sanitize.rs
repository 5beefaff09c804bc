//! Validate-once wrapper for font tables.
//!
//! A table is parsed (and so bounds checked) in full exactly once, when it is loaded. If that
//! fails the table is kept in an unusable state and every query made against it reports that
//! nothing was found, rather than parsing again or reading unvalidated data.

use log::warn;

use crate::binary::read::{ReadBinaryDep, ReadScope};
use crate::error::ParseError;

/// The outcome of validating a table.
#[derive(Debug)]
pub enum Sanitized<T> {
    /// Every structure in the table passed validation.
    Usable(T),
    /// Validation failed; the table must not be used.
    Corrupt(ParseError),
}

impl<T> Sanitized<T> {
    /// Record the outcome of parsing a table named `name` (used for logging).
    pub fn new(name: &str, result: Result<T, ParseError>) -> Self {
        match result {
            Ok(table) => Sanitized::Usable(table),
            Err(err) => {
                warn!("{} table is unusable: {}", name, err);
                Sanitized::Corrupt(err)
            }
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Sanitized::Usable(table) => Some(table),
            Sanitized::Corrupt(_) => None,
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, Sanitized::Usable(_))
    }

    pub fn error(&self) -> Option<&ParseError> {
        match self {
            Sanitized::Usable(_) => None,
            Sanitized::Corrupt(err) => Some(err),
        }
    }
}

/// Validate `data` as a table of type `T`.
pub fn sanitize<'a, T>(name: &str, data: &'a [u8]) -> Sanitized<T::HostType<'a>>
where
    T: ReadBinaryDep<Args<'a> = ()>,
{
    Sanitized::new(name, ReadScope::new(data).read::<T>())
}
