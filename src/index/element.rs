//! Structural Index Record Types
//!
//! Compact records storing XML structure as offsets into the input.

use super::span::Span;

/// Flags for IndexText
pub mod text_flags {
    /// Text needs entity decoding (contains &amp; etc.)
    pub const NEEDS_ENTITY_DECODE: u16 = 0x0001;
    /// Text is a CDATA section
    pub const IS_CDATA: u16 = 0x0002;
    /// Text is a comment
    pub const IS_COMMENT: u16 = 0x0004;
    /// Text is a processing instruction
    pub const IS_PI: u16 = 0x0008;
    /// Character data made only of XML whitespace
    pub const IS_WHITESPACE: u16 = 0x0010;
}

/// Flags for IndexAttribute
pub mod attr_flags {
    /// Value needs entity decoding
    pub const NEEDS_ENTITY_DECODE: u8 = 0x01;
    /// `xmlns` or `xmlns:*` declaration
    pub const IS_NAMESPACE_DECL: u8 = 0x02;
}

/// Sentinel value for "no node"
pub const NO_NODE: u32 = u32::MAX;

/// An element in the structural index
#[derive(Debug, Clone, Copy)]
pub struct IndexElement {
    /// Element name span (qualified name)
    pub name: Span,
    /// Parent element index (NO_NODE for the root element)
    pub parent: u32,
    pub first_child: u32,
    pub last_child: u32,
    pub next_sibling: u32,
    pub prev_sibling: u32,
    /// Start index in the attributes array
    pub attr_start: u32,
    pub attr_count: u32,
    /// Depth in document tree (0 = root element)
    pub depth: u16,
}

impl IndexElement {
    #[inline]
    pub fn new(name: Span, parent: u32, depth: u16) -> Self {
        Self {
            name,
            parent,
            first_child: NO_NODE,
            last_child: NO_NODE,
            next_sibling: NO_NODE,
            prev_sibling: NO_NODE,
            attr_start: 0,
            attr_count: 0,
            depth,
        }
    }
}

impl Default for IndexElement {
    fn default() -> Self {
        Self::new(Span::default(), NO_NODE, 0)
    }
}

/// A text node (character data, CDATA, comment or PI)
#[derive(Debug, Clone, Copy)]
pub struct IndexText {
    pub span: Span,
    /// Parent element index
    pub parent: u32,
    pub flags: u16,
}

impl IndexText {
    #[inline]
    pub fn new(span: Span, parent: u32, flags: u16) -> Self {
        Self {
            span,
            parent,
            flags,
        }
    }

    #[inline]
    pub fn needs_decode(&self) -> bool {
        self.flags & text_flags::NEEDS_ENTITY_DECODE != 0
    }

    #[inline]
    pub fn is_cdata(&self) -> bool {
        self.flags & text_flags::IS_CDATA != 0
    }

    #[inline]
    pub fn is_comment(&self) -> bool {
        self.flags & text_flags::IS_COMMENT != 0
    }

    #[inline]
    pub fn is_pi(&self) -> bool {
        self.flags & text_flags::IS_PI != 0
    }

    /// Character data or CDATA that carries something besides whitespace.
    ///
    /// This is what an element's "text" is read from.
    #[inline]
    pub fn is_text_bearing(&self) -> bool {
        if self.is_comment() || self.is_pi() {
            return false;
        }
        self.is_cdata() || self.flags & text_flags::IS_WHITESPACE == 0
    }
}

/// An attribute in the structural index
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexAttribute {
    pub name: Span,
    pub value: Span,
    pub flags: u8,
}

impl IndexAttribute {
    #[inline]
    pub fn new(name: Span, value: Span, flags: u8) -> Self {
        Self { name, value, flags }
    }

    #[inline]
    pub fn needs_decode(&self) -> bool {
        self.flags & attr_flags::NEEDS_ENTITY_DECODE != 0
    }

    #[inline]
    pub fn is_namespace_decl(&self) -> bool {
        self.flags & attr_flags::IS_NAMESPACE_DECL != 0
    }
}

/// A child reference - either an element or a text node
///
/// The high bit of the index discriminates the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRef(u32);

impl ChildRef {
    const TEXT_BIT: u32 = 0x8000_0000;

    #[inline]
    pub const fn element(idx: u32) -> Self {
        debug_assert!(idx < Self::TEXT_BIT);
        Self(idx)
    }

    #[inline]
    pub const fn text(idx: u32) -> Self {
        debug_assert!(idx < Self::TEXT_BIT);
        Self(idx | Self::TEXT_BIT)
    }

    #[inline]
    pub const fn is_text(&self) -> bool {
        self.0 & Self::TEXT_BIT != 0
    }

    #[inline]
    pub const fn is_element(&self) -> bool {
        self.0 & Self::TEXT_BIT == 0
    }

    /// Index with the type bit stripped
    #[inline]
    pub const fn index(&self) -> u32 {
        self.0 & !Self::TEXT_BIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_ref() {
        let elem = ChildRef::element(42);
        assert!(elem.is_element());
        assert!(!elem.is_text());
        assert_eq!(elem.index(), 42);

        let text = ChildRef::text(100);
        assert!(text.is_text());
        assert_eq!(text.index(), 100);
    }

    #[test]
    fn test_element_defaults_are_unlinked() {
        let elem = IndexElement::default();
        assert_eq!(elem.parent, NO_NODE);
        assert_eq!(elem.first_child, NO_NODE);
        assert_eq!(elem.prev_sibling, NO_NODE);
        assert_eq!(elem.next_sibling, NO_NODE);
    }

    #[test]
    fn test_text_bearing() {
        let plain = IndexText::new(Span::new(0, 3), 0, 0);
        assert!(plain.is_text_bearing());

        let blank = IndexText::new(Span::new(0, 3), 0, text_flags::IS_WHITESPACE);
        assert!(!blank.is_text_bearing());

        let blank_cdata = IndexText::new(
            Span::new(0, 3),
            0,
            text_flags::IS_CDATA | text_flags::IS_WHITESPACE,
        );
        assert!(blank_cdata.is_text_bearing());

        let comment = IndexText::new(Span::new(0, 3), 0, text_flags::IS_COMMENT);
        assert!(!comment.is_text_bearing());
    }

    #[test]
    fn test_attribute_flags() {
        let attr = IndexAttribute::new(Span::new(0, 5), Span::new(7, 3), attr_flags::IS_NAMESPACE_DECL);
        assert!(attr.is_namespace_decl());
        assert!(!attr.needs_decode());
    }
}
