//! Tokenizer with ScanHandler Trait
//!
//! Splits decoded document text into markup and character data and hands
//! each token to a [`ScanHandler`] as spans. Lexical errors (unterminated
//! constructs, malformed attributes) are reported here; nesting errors are
//! the handler's business.

use super::scanner::{is_name_start_char, is_xml_whitespace, Scanner};
use crate::error::ParseError;
use crate::index::Span;

/// An attribute as it appears in a start tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute {
    pub name: Span,
    pub value: Span,
    /// Value contains an entity reference
    pub needs_decode: bool,
}

/// Receives tokens from [`Tokenizer::scan`] in document order
pub trait ScanHandler {
    /// `offset` is the position of the opening `<`
    fn start_element(
        &mut self,
        offset: usize,
        name: Span,
        attrs: &[RawAttribute],
        is_empty: bool,
    ) -> Result<(), ParseError>;

    fn end_element(&mut self, offset: usize, name: Span) -> Result<(), ParseError>;

    /// Character data; `needs_decode` when it contains `&`
    fn text(&mut self, span: Span, needs_decode: bool, is_whitespace: bool) -> Result<(), ParseError>;

    /// CDATA content, without the `<![CDATA[` and `]]>` delimiters
    fn cdata(&mut self, span: Span) -> Result<(), ParseError>;

    fn comment(&mut self, _span: Span) -> Result<(), ParseError> {
        Ok(())
    }

    fn processing_instruction(&mut self, _target: Span, _data: Option<Span>) -> Result<(), ParseError> {
        Ok(())
    }
}

pub struct Tokenizer<'a> {
    input: &'a [u8],
    scanner: Scanner<'a>,
    /// Reusable attribute buffer
    attrs_buf: Vec<RawAttribute>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        let input = input.as_bytes();
        Self {
            input,
            scanner: Scanner::new(input),
            attrs_buf: Vec::with_capacity(8),
        }
    }

    /// Scan the whole input, stopping at the first error
    pub fn scan<H: ScanHandler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        while !self.scanner.is_eof() {
            if self.scanner.peek() == Some(b'<') {
                self.scan_markup(handler)?;
            } else {
                self.scan_text(handler)?;
            }
        }
        Ok(())
    }

    fn scan_markup<H: ScanHandler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        let start = self.scanner.position();

        match self.scanner.peek_at(1) {
            Some(b'/') => {
                self.scanner.advance(2);
                self.scan_end_tag(start, handler)
            }
            Some(b'!') => {
                self.scanner.advance(2);
                if self.scanner.starts_with(b"--") {
                    self.scanner.advance(2);
                    let span = self.take_until(b"-->", start, "unterminated comment")?;
                    handler.comment(span)
                } else if self.scanner.starts_with(b"[CDATA[") {
                    self.scanner.advance(7);
                    let span = self.take_until(b"]]>", start, "unterminated CDATA section")?;
                    handler.cdata(span)
                } else if self.scanner.starts_with(b"DOCTYPE") {
                    self.skip_doctype(start)
                } else {
                    Err(ParseError::new(start, "unsupported markup declaration"))
                }
            }
            Some(b'?') => {
                self.scanner.advance(2);
                self.scan_pi(start, handler)
            }
            Some(c) if is_name_start_char(c) => {
                self.scanner.advance(1);
                self.scan_start_tag(start, handler)
            }
            _ => Err(ParseError::new(start, "invalid character after '<'")),
        }
    }

    fn scan_start_tag<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> Result<(), ParseError> {
        let name = self.read_name_span(start)?;
        self.attrs_buf.clear();

        loop {
            let had_space = matches!(self.scanner.peek(), Some(b) if is_xml_whitespace(b));
            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                Some(b'>') => {
                    self.scanner.advance(1);
                    return handler.start_element(start, name, &self.attrs_buf, false);
                }
                Some(b'/') if self.scanner.peek_at(1) == Some(b'>') => {
                    self.scanner.advance(2);
                    return handler.start_element(start, name, &self.attrs_buf, true);
                }
                Some(c) if had_space && is_name_start_char(c) => {
                    let attr = self.scan_attribute()?;
                    self.attrs_buf.push(attr);
                }
                Some(_) => {
                    return Err(ParseError::new(
                        self.scanner.position(),
                        "unexpected character in start tag",
                    ))
                }
                None => return Err(ParseError::new(start, "unterminated start tag")),
            }
        }
    }

    fn scan_attribute(&mut self) -> Result<RawAttribute, ParseError> {
        let name_start = self.scanner.position();
        let name = self.read_name_span(name_start)?;

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            return Err(ParseError::new(name_start, "attribute without value"));
        }
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        let quote = match self.scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(ParseError::new(
                    self.scanner.position(),
                    "attribute value must be quoted",
                ))
            }
        };
        self.scanner.advance(1);

        let value_start = self.scanner.position();
        let value_end = self
            .scanner
            .find_byte(quote)
            .ok_or_else(|| ParseError::new(name_start, "unterminated attribute value"))?;
        let raw = &self.input[value_start..value_end];
        if raw.contains(&b'<') {
            return Err(ParseError::new(value_start, "'<' in attribute value"));
        }
        self.scanner.set_position(value_end + 1);

        Ok(RawAttribute {
            name,
            value: Span::from_range(value_start, value_end),
            needs_decode: raw.contains(&b'&'),
        })
    }

    fn scan_end_tag<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> Result<(), ParseError> {
        let name = self.read_name_span(start)?;
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(ParseError::new(start, "unterminated end tag"));
        }
        self.scanner.advance(1);
        handler.end_element(start, name)
    }

    fn scan_text<H: ScanHandler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        let start = self.scanner.position();
        let end = self.scanner.find_byte(b'<').unwrap_or(self.input.len());
        self.scanner.set_position(end);

        let raw = &self.input[start..end];
        let needs_decode = memchr::memchr(b'&', raw).is_some();
        let is_whitespace = raw.iter().all(|&b| is_xml_whitespace(b));
        handler.text(Span::from_range(start, end), needs_decode, is_whitespace)
    }

    fn scan_pi<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> Result<(), ParseError> {
        let target = self.read_name_span(start)?;
        self.scanner.skip_whitespace();
        let data_start = self.scanner.position();
        let data_end = self
            .scanner
            .find_sequence(b"?>")
            .ok_or_else(|| ParseError::new(start, "unterminated processing instruction"))?;
        self.scanner.set_position(data_end + 2);

        // The XML declaration is not a processing instruction
        if target.slice(self.input).eq_ignore_ascii_case(b"xml") {
            return Ok(());
        }
        let data = (data_end > data_start).then(|| Span::from_range(data_start, data_end));
        handler.processing_instruction(target, data)
    }

    /// Skip a DOCTYPE declaration, including an internal subset
    fn skip_doctype(&mut self, start: usize) -> Result<(), ParseError> {
        let mut depth = 0usize;
        let mut quote = None;
        while let Some(c) = self.scanner.peek() {
            self.scanner.advance(1);
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(c),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(ParseError::new(start, "unterminated DOCTYPE declaration"))
    }

    /// Consume content up to `terminator`, returning the content span
    fn take_until(&mut self, terminator: &[u8], start: usize, message: &str) -> Result<Span, ParseError> {
        let content_start = self.scanner.position();
        let end = self
            .scanner
            .find_sequence(terminator)
            .ok_or_else(|| ParseError::new(start, message))?;
        self.scanner.set_position(end + terminator.len());
        Ok(Span::from_range(content_start, end))
    }

    fn read_name_span(&mut self, start: usize) -> Result<Span, ParseError> {
        let name_start = self.scanner.position();
        self.scanner
            .read_name()
            .ok_or_else(|| ParseError::new(start, "expected a name"))?;
        Ok(Span::from_range(name_start, self.scanner.position()))
    }
}
