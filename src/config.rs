//! Parser configuration
//!
//! Settings consumed when a document is loaded. They are copied into the
//! [`Document`](crate::Document) and never change afterwards.

use crate::error::{Error, Result};

pub const DEFAULT_BUFFER_SIZE: usize = 8192;
pub const DEFAULT_ENCODING: &str = "UTF-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Read buffer capacity used when loading a document from a file
    pub buffer_size: usize,
    /// Encoding label assumed for input without a byte order mark
    pub encoding: String,
    /// Treat `xmlns` / `xmlns:*` declarations as namespace nodes rather
    /// than attributes
    pub namespace_aware: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            encoding: DEFAULT_ENCODING.to_string(),
            namespace_aware: false,
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfig("buffer size must be positive".into()));
        }
        if self.encoding.trim().is_empty() {
            return Err(Error::InvalidConfig("encoding must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.encoding, "UTF-8");
        assert!(!config.namespace_aware);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = ParserConfig {
            buffer_size: 0,
            ..ParserConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
