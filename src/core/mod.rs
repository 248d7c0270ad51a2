//! Core XML parsing primitives
//!
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: markup/character-data splitting with the ScanHandler trait
//! - Entities: entity decoding with Cow (zero-copy when possible)
//! - Encoding: UTF-16 detection and conversion to UTF-8

pub mod encoding;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
