//! Element Materializer
//!
//! Turns the element under the cursor into a detached [`Element`] value
//! that holds no reference back into the document.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::nav::{resolve_position, Cursor};

/// A materialized query match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    text: String,
    attributes: HashMap<String, String>,
    ordinal: usize,
    sibling_position: usize,
    canonical_path: String,
    address: u32,
}

impl Element {
    #[inline]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Content of the first text-bearing child, `""` when there is none
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Same as [`text`](Element::text)
    #[inline]
    pub fn value(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// 1-based position of this match in its result sequence
    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// 1-based position among same-named siblings
    #[inline]
    pub fn sibling_position(&self) -> usize {
        self.sibling_position
    }

    /// Selector that locates exactly this element, e.g. `/root[1]/element[3]`
    #[inline]
    pub fn canonical_path(&self) -> &str {
        &self.canonical_path
    }

    /// Document-order index of the source node
    #[inline]
    pub fn address(&self) -> u32 {
        self.address
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Element{{tag={}, path={}, ordinal={}, text={:?}, attributes={}}}",
            self.tag_name,
            self.canonical_path,
            self.ordinal,
            self.text,
            self.attributes.len()
        )
    }
}

/// Materialize the element under the cursor as match number `ordinal`.
///
/// Missing text or attributes yield empty values. The cursor is left where
/// it was.
pub fn materialize(cursor: &mut Cursor, ordinal: usize) -> Result<Element> {
    let addr = cursor.current_address();
    let doc = cursor.document();

    let tag_name = doc
        .tag_name(addr)
        .ok_or_else(|| Error::invalid_node(addr, "element has no tag name"))?
        .to_string();
    let text = doc.first_text(addr).map(|t| t.into_owned()).unwrap_or_default();
    // Later duplicates overwrite earlier ones
    let attributes: HashMap<String, String> = doc
        .attributes(addr)
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.into_owned()))
        .collect();

    let position = resolve_position(cursor)?;

    Ok(Element {
        tag_name,
        text,
        attributes,
        ordinal,
        sibling_position: position.sibling_position,
        canonical_path: position.canonical_path,
        address: addr.index(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::index::{Document, NodeAddress};
    use std::sync::Arc;

    fn cursor(xml: &str) -> Cursor {
        Cursor::new(Arc::new(Document::parse(xml, &ParserConfig::default()).unwrap()))
    }

    #[test]
    fn test_materialize_full_element() {
        let mut cur = cursor(r#"<root><item/><item id="7" kind="a &amp; b">  hello </item></root>"#);
        cur.move_to(NodeAddress::new(2));

        let element = materialize(&mut cur, 3).unwrap();
        assert_eq!(element.tag_name(), "item");
        assert_eq!(element.text(), "  hello ");
        assert_eq!(element.value(), element.text());
        assert_eq!(element.attribute("id"), Some("7"));
        assert_eq!(element.attribute("kind"), Some("a & b"));
        assert_eq!(element.attribute("missing"), None);
        assert_eq!(element.ordinal(), 3);
        assert_eq!(element.sibling_position(), 2);
        assert_eq!(element.canonical_path(), "/root[1]/item[2]");
        assert_eq!(element.address(), 2);
        assert_eq!(cur.current_address(), NodeAddress::new(2));
        assert_eq!(cur.depth(), 0);
    }

    #[test]
    fn test_absent_text_and_attributes_are_empty() {
        let mut cur = cursor("<root><empty/></root>");
        cur.move_to_first_child();
        let element = materialize(&mut cur, 1).unwrap();
        assert_eq!(element.text(), "");
        assert!(element.attributes().is_empty());
    }

    #[test]
    fn test_duplicate_attribute_last_wins() {
        let mut cur = cursor(r#"<root k="1" k="2"/>"#);
        let element = materialize(&mut cur, 1).unwrap();
        assert_eq!(element.attributes().len(), 1);
        assert_eq!(element.attribute("k"), Some("2"));
    }

    #[test]
    fn test_display() {
        let mut cur = cursor("<root>x</root>");
        let element = materialize(&mut cur, 1).unwrap();
        assert_eq!(
            element.to_string(),
            r#"Element{tag=root, path=/root[1], ordinal=1, text="x", attributes=0}"#
        );
    }
}
