//! Span - offset and length into the decoded input
//!
//! Element names, attribute names/values and text content are stored as
//! spans, never as owned strings. Strings are only produced when a query
//! materializes an element.

/// A span referencing a portion of the document bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset into the input
    pub offset: u32,
    /// Length in bytes
    pub len: u32,
}

impl Span {
    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Build a span from `start..end` byte positions
    #[inline]
    pub fn from_range(start: usize, end: usize) -> Self {
        Self::new(start as u32, end.saturating_sub(start) as u32)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// End offset (exclusive)
    #[inline]
    pub const fn end(&self) -> u32 {
        self.offset.saturating_add(self.len)
    }

    /// Extract the byte slice from input, empty when out of bounds
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let start = self.offset as usize;
        let end = start.saturating_add(self.len as usize);
        input.get(start..end).unwrap_or(&[])
    }

    /// Extract as UTF-8 string from input
    #[inline]
    pub fn as_str<'a>(&self, input: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(self.slice(input)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic() {
        let span = Span::new(5, 10);
        assert_eq!(span.end(), 15);
        assert!(!span.is_empty());
        assert!(Span::default().is_empty());
    }

    #[test]
    fn test_span_from_range() {
        let span = Span::from_range(3, 8);
        assert_eq!(span, Span::new(3, 5));
        assert!(Span::from_range(8, 3).is_empty());
    }

    #[test]
    fn test_span_slice() {
        let input = b"hello world";
        assert_eq!(Span::new(6, 5).slice(input), b"world");
        assert_eq!(Span::new(0, 5).as_str(input), Some("hello"));
    }

    #[test]
    fn test_span_out_of_bounds_is_empty() {
        let input = b"short";
        assert_eq!(Span::new(3, 100).slice(input), b"");
        assert_eq!(Span::new(100, 1).slice(input), b"");
    }
}
