//! Configuration access port trait.

use std::fmt::Display;
use std::str::FromStr;

use crate::domain::error::EngineError;

pub trait ConfigPort {
    /// Raw value of `key` in `section`, `None` when absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}

/// Parses a string value with `FromStr`, falling back to `default` when the
/// key is absent.
pub fn get_parsed<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, EngineError>
where
    T: FromStr,
    T::Err: Display,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| EngineError::invalid(section, key, e.to_string())),
    }
}
