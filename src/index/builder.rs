//! Index Builder
//!
//! Builds a StructuralIndex from tokenizer events, enforcing element
//! nesting as it goes. Sibling and child links are wired during the scan;
//! the flat children lists are built from parent links in `finish`.

use super::element::{attr_flags, text_flags, IndexAttribute, IndexElement, IndexText, NO_NODE};
use super::span::Span;
use super::structural::StructuralIndex;
use crate::core::tokenizer::{RawAttribute, ScanHandler, Tokenizer};
use crate::error::ParseError;

pub struct IndexBuilder<'a> {
    index: StructuralIndex,
    input: &'a [u8],
    /// Stack of open element indices
    stack: Vec<u32>,
    /// The root element has been closed
    root_closed: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(input: &'a str) -> Self {
        // Rough estimates: one element per ~35 bytes, two texts per element
        let estimated_elements = (input.len() / 35).max(16);
        Self {
            index: StructuralIndex::with_capacity(
                estimated_elements,
                estimated_elements * 2,
                estimated_elements / 2,
            ),
            input: input.as_bytes(),
            stack: Vec::with_capacity(32),
            root_closed: false,
        }
    }

    /// Finish building and return the index
    pub fn finish(mut self) -> Result<StructuralIndex, ParseError> {
        if let Some(&open) = self.stack.last() {
            let (offset, name) = self
                .index
                .get_element(open)
                .map(|e| (e.name.offset as usize, self.name_of(e.name)))
                .unwrap_or_default();
            return Err(ParseError::new(offset, format!("unclosed element <{name}>")));
        }
        if self.index.root.is_none() {
            return Err(ParseError::new(self.input.len(), "document has no root element"));
        }

        self.index.build_children_from_parents();
        self.index.shrink_to_fit();
        Ok(self.index)
    }

    #[inline]
    fn current_parent(&self) -> u32 {
        self.stack.last().copied().unwrap_or(NO_NODE)
    }

    fn name_of(&self, span: Span) -> String {
        String::from_utf8_lossy(span.slice(self.input)).into_owned()
    }

    fn require_open(&self, offset: usize, what: &str) -> Result<u32, ParseError> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| ParseError::new(offset, format!("{what} outside the root element")))
    }
}

impl ScanHandler for IndexBuilder<'_> {
    fn start_element(
        &mut self,
        offset: usize,
        name: Span,
        attrs: &[RawAttribute],
        is_empty: bool,
    ) -> Result<(), ParseError> {
        if self.root_closed {
            return Err(ParseError::new(offset, "element after the root element"));
        }

        let parent = self.current_parent();
        let depth = self.stack.len().min(u16::MAX as usize) as u16;
        let mut elem = IndexElement::new(name, parent, depth);

        elem.attr_start = self.index.attribute_count() as u32;
        elem.attr_count = attrs.len() as u32;
        for attr in attrs {
            let attr_name = attr.name.slice(self.input);
            let mut flags = 0;
            if attr.needs_decode {
                flags |= attr_flags::NEEDS_ENTITY_DECODE;
            }
            if attr_name == b"xmlns" || attr_name.starts_with(b"xmlns:") {
                flags |= attr_flags::IS_NAMESPACE_DECL;
            }
            self.index
                .add_attribute(IndexAttribute::new(attr.name, attr.value, flags));
        }

        let elem_idx = self.index.add_element(elem);
        if parent == NO_NODE {
            self.index.root = Some(elem_idx);
        } else {
            if let Some(prev) = self.index.last_child(parent) {
                self.index.link_siblings(prev, elem_idx);
            }
            self.index.append_child_link(parent, elem_idx);
        }

        if is_empty {
            self.root_closed = parent == NO_NODE;
        } else {
            self.stack.push(elem_idx);
        }
        Ok(())
    }

    fn end_element(&mut self, offset: usize, name: Span) -> Result<(), ParseError> {
        let open = self
            .stack
            .pop()
            .ok_or_else(|| ParseError::new(offset, "closing tag without an open element"))?;
        let open_name = self.index.get_element(open).map(|e| e.name).unwrap_or_default();
        if open_name.slice(self.input) != name.slice(self.input) {
            return Err(ParseError::new(
                offset,
                format!(
                    "mismatched closing tag </{}>, expected </{}>",
                    self.name_of(name),
                    self.name_of(open_name)
                ),
            ));
        }
        if self.stack.is_empty() {
            self.root_closed = true;
        }
        Ok(())
    }

    fn text(&mut self, span: Span, needs_decode: bool, is_whitespace: bool) -> Result<(), ParseError> {
        if self.stack.is_empty() {
            // Whitespace around the root element is insignificant
            if is_whitespace {
                return Ok(());
            }
            return Err(ParseError::new(span.offset as usize, "text outside the root element"));
        }

        let mut flags = 0;
        if needs_decode {
            flags |= text_flags::NEEDS_ENTITY_DECODE;
        }
        if is_whitespace {
            flags |= text_flags::IS_WHITESPACE;
        }
        self.index
            .add_text(IndexText::new(span, self.current_parent(), flags));
        Ok(())
    }

    fn cdata(&mut self, span: Span) -> Result<(), ParseError> {
        let parent = self.require_open(span.offset as usize, "CDATA section")?;
        self.index
            .add_text(IndexText::new(span, parent, text_flags::IS_CDATA));
        Ok(())
    }

    fn comment(&mut self, span: Span) -> Result<(), ParseError> {
        self.index
            .add_text(IndexText::new(span, self.current_parent(), text_flags::IS_COMMENT));
        Ok(())
    }

    fn processing_instruction(&mut self, target: Span, _data: Option<Span>) -> Result<(), ParseError> {
        self.index
            .add_text(IndexText::new(target, self.current_parent(), text_flags::IS_PI));
        Ok(())
    }
}

/// Build a StructuralIndex for decoded document text
pub fn build_index(input: &str) -> Result<StructuralIndex, ParseError> {
    let mut builder = IndexBuilder::new(input);
    Tokenizer::new(input).scan(&mut builder)?;
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_simple() {
        let index = build_index("<root><child>text</child></root>").unwrap();
        assert_eq!(index.element_count(), 2);
        assert_eq!(index.root, Some(0));
        assert_eq!(index.text_children(1).count(), 1);
    }

    #[test]
    fn test_build_with_attributes() {
        let index = build_index(r#"<root id="1" name="test"><child/></root>"#).unwrap();
        assert_eq!(index.attribute_count(), 2);
        assert_eq!(index.element_attributes(0).len(), 2);
        assert!(index.element_attributes(1).is_empty());
    }

    #[test]
    fn test_sibling_links() {
        let index = build_index("<a><b><c/></b><d/><b/></a>").unwrap();
        assert_eq!(index.element_children(0).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(index.prev_sibling(4), Some(3));
        assert_eq!(index.prev_sibling(3), Some(1));
        assert_eq!(index.prev_sibling(1), None);
        assert_eq!(index.next_sibling(2), None);
        assert_eq!(index.parent(2), Some(1));
        assert_eq!(index.get_element(2).map(|e| e.depth), Some(2));
    }

    #[test]
    fn test_mixed_content_order() {
        let index = build_index("<p>A<b/>C</p>").unwrap();
        let kinds: Vec<bool> = index.children(0).map(|c| c.is_text()).collect();
        assert_eq!(kinds, vec![true, false, true]);
    }

    #[test]
    fn test_namespace_declarations_flagged() {
        let index = build_index(r#"<r xmlns="urn:a" xmlns:p="urn:p" p:x="1"/>"#).unwrap();
        let flags: Vec<bool> = index
            .element_attributes(0)
            .iter()
            .map(|a| a.is_namespace_decl())
            .collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn test_whitespace_outside_root_ignored() {
        let index = build_index("\n  <root/>\n").unwrap();
        assert_eq!(index.element_count(), 1);
    }

    #[test]
    fn test_nesting_errors() {
        assert!(build_index("").is_err());
        assert!(build_index("<a><b></a></b>").is_err());
        assert!(build_index("<a>").is_err());
        assert!(build_index("</a>").is_err());
        assert!(build_index("<a/><b/>").is_err());
        assert!(build_index("text<a/>").is_err());
        assert!(build_index("<a/>trailing").is_err());
    }

    #[test]
    fn test_mismatch_message() {
        let err = build_index("<a><b></c></a>").unwrap_err();
        assert_eq!(err.offset, 6);
        assert!(err.message.contains("</c>"));
        assert!(err.message.contains("</b>"));
    }
}
