//! Indexed Document
//!
//! The addressable, immutable form of one parsed XML document: the decoded
//! text plus its structural index. Every read primitive used by the cursor,
//! the evaluator and the materializer lives here.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::builder::build_index;
use super::structural::StructuralIndex;
use crate::config::ParserConfig;
use crate::core::encoding::decode_input;
use crate::core::entities::decode_text;
use crate::error::{Error, Result};

/// Address of an element node: its index in document order.
///
/// Address 0 is always the root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeAddress(u32);

impl NodeAddress {
    pub const ROOT: NodeAddress = NodeAddress(0);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Document {
    text: String,
    index: StructuralIndex,
    config: ParserConfig,
}

impl Document {
    /// Parse raw document bytes
    pub fn parse(input: impl Into<Vec<u8>>, config: &ParserConfig) -> Result<Self> {
        config.validate()?;
        let text = decode_input(input.into(), &config.encoding)?;
        let index = build_index(&text)?;
        tracing::debug!(
            elements = index.element_count(),
            texts = index.text_count(),
            attributes = index.attribute_count(),
            bytes = text.len(),
            "document indexed"
        );
        Ok(Self {
            text,
            index,
            config: config.clone(),
        })
    }

    /// Read and parse a file, buffered by `config.buffer_size`
    pub fn open(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let io_err = |source: std::io::Error| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut reader = BufReader::with_capacity(config.buffer_size, file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(io_err)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "document read");
        Self::parse(bytes, config)
    }

    #[inline]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    #[inline]
    pub fn root(&self) -> NodeAddress {
        NodeAddress::ROOT
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.index.element_count()
    }

    /// Whether `addr` names an element of this document
    #[inline]
    pub fn contains(&self, addr: NodeAddress) -> bool {
        (addr.index() as usize) < self.index.element_count()
    }

    /// Qualified tag name
    pub fn tag_name(&self, addr: NodeAddress) -> Option<&str> {
        self.index
            .get_element(addr.index())?
            .name
            .as_str(self.text.as_bytes())
    }

    pub fn parent(&self, addr: NodeAddress) -> Option<NodeAddress> {
        self.index.parent(addr.index()).map(NodeAddress)
    }

    pub fn first_child(&self, addr: NodeAddress) -> Option<NodeAddress> {
        self.index.first_child(addr.index()).map(NodeAddress)
    }

    pub fn next_sibling(&self, addr: NodeAddress) -> Option<NodeAddress> {
        self.index.next_sibling(addr.index()).map(NodeAddress)
    }

    pub fn previous_sibling(&self, addr: NodeAddress) -> Option<NodeAddress> {
        self.index.prev_sibling(addr.index()).map(NodeAddress)
    }

    /// Element children in document order
    pub fn element_children(&self, addr: NodeAddress) -> impl Iterator<Item = NodeAddress> + '_ {
        self.index.element_children(addr.index()).map(NodeAddress)
    }

    /// Element descendants in document order, excluding `addr` itself
    pub fn descendants(&self, addr: NodeAddress) -> impl Iterator<Item = NodeAddress> + '_ {
        self.index.descendants(addr.index()).map(NodeAddress)
    }

    /// First text-bearing child (character data or CDATA), entity-decoded.
    ///
    /// Whitespace-only character data, comments and PIs are skipped.
    pub fn first_text(&self, addr: NodeAddress) -> Option<Cow<'_, str>> {
        let input = self.text.as_bytes();
        self.index
            .text_children(addr.index())
            .filter_map(|idx| self.index.get_text(idx))
            .find(|text| text.is_text_bearing())
            .and_then(|text| {
                let raw = text.span.as_str(input)?;
                Some(if text.needs_decode() {
                    decode_text(raw)
                } else {
                    Cow::Borrowed(raw)
                })
            })
    }

    /// Attributes in source order, values entity-decoded.
    ///
    /// With `namespace_aware`, namespace declarations are not attributes.
    pub fn attributes(&self, addr: NodeAddress) -> Vec<(&str, Cow<'_, str>)> {
        let input = self.text.as_bytes();
        let skip_ns = self.config.namespace_aware;
        self.index
            .element_attributes(addr.index())
            .iter()
            .filter(|attr| !(skip_ns && attr.is_namespace_decl()))
            .filter_map(|attr| {
                let name = attr.name.as_str(input)?;
                let raw = attr.value.as_str(input)?;
                let value = if attr.needs_decode() {
                    decode_text(raw)
                } else {
                    Cow::Borrowed(raw)
                };
                Some((name, value))
            })
            .collect()
    }

    /// Value of the last attribute named `name`, `None` when absent
    pub fn attribute(&self, addr: NodeAddress, name: &str) -> Option<Cow<'_, str>> {
        self.attributes(addr)
            .into_iter()
            .rev()
            .find(|(attr_name, _)| *attr_name == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.index.element_count())
            .field("bytes", &self.text.len())
            .field("config", &self.config)
            .finish()
    }
}
