//! Structural Index - main index structure
//!
//! Stores the whole document structure as offsets into the decoded input.
//! Elements are numbered in document order; the subtree of an element is
//! therefore the contiguous run of elements that follows it with a greater
//! depth.

use super::element::{ChildRef, IndexAttribute, IndexElement, IndexText, NO_NODE};

/// The structural index of an XML document
///
/// - Elements stored contiguously in document order
/// - Attributes stored contiguously, referenced by (start, count)
/// - Text nodes stored separately, linked via ChildRef
/// - Children stored as a flat list, one range per element
#[derive(Debug, Default)]
pub struct StructuralIndex {
    /// Element nodes (index 0 is the root element when present)
    pub elements: Vec<IndexElement>,
    /// Text nodes (text, CDATA, comments, PIs)
    pub texts: Vec<IndexText>,
    /// Attributes, referenced by elements via attr_start/attr_count
    pub attributes: Vec<IndexAttribute>,
    /// (start, count) into `children_data` for each element
    children_ranges: Vec<(u32, u32)>,
    children_data: Vec<ChildRef>,
    /// Root element index (None if the document is empty)
    pub root: Option<u32>,
}

impl StructuralIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity
    pub fn with_capacity(elements: usize, texts: usize, attributes: usize) -> Self {
        Self {
            elements: Vec::with_capacity(elements),
            texts: Vec::with_capacity(texts),
            attributes: Vec::with_capacity(attributes),
            children_ranges: Vec::new(),
            children_data: Vec::new(),
            root: None,
        }
    }

    #[inline]
    pub fn get_element(&self, idx: u32) -> Option<&IndexElement> {
        self.elements.get(idx as usize)
    }

    #[inline]
    pub fn get_text(&self, idx: u32) -> Option<&IndexText> {
        self.texts.get(idx as usize)
    }

    /// Attribute records of an element
    pub fn element_attributes(&self, idx: u32) -> &[IndexAttribute] {
        if let Some(elem) = self.get_element(idx) {
            let start = elem.attr_start as usize;
            let end = start + elem.attr_count as usize;
            if let Some(attrs) = self.attributes.get(start..end) {
                return attrs;
            }
        }
        &[]
    }

    /// Iterate over children (elements and texts) in document order
    pub fn children(&self, elem_idx: u32) -> ChildIter<'_> {
        let (start, count) = self
            .children_ranges
            .get(elem_idx as usize)
            .copied()
            .unwrap_or((0, 0));
        ChildIter {
            index: self,
            data_idx: start as usize,
            end_idx: start.saturating_add(count) as usize,
        }
    }

    /// Iterate over element children only, following sibling links
    pub fn element_children(&self, elem_idx: u32) -> SiblingIter<'_> {
        let first = self
            .get_element(elem_idx)
            .map(|e| e.first_child)
            .unwrap_or(NO_NODE);
        SiblingIter {
            index: self,
            next: first,
        }
    }

    /// Iterate over text children only
    pub fn text_children(&self, elem_idx: u32) -> impl Iterator<Item = u32> + '_ {
        self.children(elem_idx)
            .filter(ChildRef::is_text)
            .map(|child| child.index())
    }

    /// Element descendants of an element in document order (excluding itself)
    pub fn descendants(&self, elem_idx: u32) -> impl Iterator<Item = u32> + '_ {
        let depth = self.get_element(elem_idx).map(|e| e.depth);
        let start = elem_idx.saturating_add(1) as usize;
        self.elements
            .get(start..)
            .unwrap_or(&[])
            .iter()
            .take_while(move |e| depth.is_some_and(|d| e.depth > d))
            .enumerate()
            .map(move |(offset, _)| (start + offset) as u32)
    }

    #[inline]
    pub fn parent(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.parent)
    }

    #[inline]
    pub fn first_child(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.first_child)
    }

    #[inline]
    pub fn next_sibling(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.next_sibling)
    }

    #[inline]
    pub fn prev_sibling(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.prev_sibling)
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    // === Builder methods (used by IndexBuilder) ===

    pub(crate) fn add_element(&mut self, elem: IndexElement) -> u32 {
        let idx = self.elements.len() as u32;
        self.elements.push(elem);
        idx
    }

    pub(crate) fn add_text(&mut self, text: IndexText) -> u32 {
        let idx = self.texts.len() as u32;
        self.texts.push(text);
        idx
    }

    pub(crate) fn add_attribute(&mut self, attr: IndexAttribute) -> u32 {
        let idx = self.attributes.len() as u32;
        self.attributes.push(attr);
        idx
    }

    /// Link two adjacent sibling elements in both directions
    pub(crate) fn link_siblings(&mut self, prev_idx: u32, next_idx: u32) {
        if let Some(prev) = self.elements.get_mut(prev_idx as usize) {
            prev.next_sibling = next_idx;
        }
        if let Some(next) = self.elements.get_mut(next_idx as usize) {
            next.prev_sibling = prev_idx;
        }
    }

    /// Record a new last child, setting first_child when it is the first one
    pub(crate) fn append_child_link(&mut self, parent_idx: u32, child_idx: u32) {
        if let Some(parent) = self.elements.get_mut(parent_idx as usize) {
            if parent.first_child == NO_NODE {
                parent.first_child = child_idx;
            }
            parent.last_child = child_idx;
        }
    }

    #[inline]
    pub(crate) fn last_child(&self, parent_idx: u32) -> Option<u32> {
        link(self.get_element(parent_idx)?.last_child)
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.elements.shrink_to_fit();
        self.texts.shrink_to_fit();
        self.attributes.shrink_to_fit();
        self.children_ranges.shrink_to_fit();
        self.children_data.shrink_to_fit();
    }

    /// Build the flat children lists from parent links.
    ///
    /// Mixed content is ordered by source offset so children come out in
    /// document order.
    pub(crate) fn build_children_from_parents(&mut self) {
        let num_elements = self.elements.len();
        if num_elements == 0 {
            return;
        }

        let mut counts = vec![0u32; num_elements];
        for elem in &self.elements {
            if let Some(count) = counts.get_mut(elem.parent as usize) {
                *count += 1;
            }
        }
        for text in &self.texts {
            if let Some(count) = counts.get_mut(text.parent as usize) {
                *count += 1;
            }
        }

        let total: u32 = counts.iter().sum();
        self.children_ranges = Vec::with_capacity(num_elements);
        let mut offset = 0u32;
        for &count in &counts {
            self.children_ranges.push((offset, count));
            offset += count;
        }
        self.children_data = vec![ChildRef::element(0); total as usize];

        let mut placed = vec![0u32; num_elements];
        let elements = self
            .elements
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.parent, ChildRef::element(idx as u32)));
        let texts = self
            .texts
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.parent, ChildRef::text(idx as u32)));
        for (parent, child) in elements.chain(texts) {
            let parent = parent as usize;
            if parent >= num_elements {
                continue;
            }
            let (start, _) = self.children_ranges[parent];
            self.children_data[(start + placed[parent]) as usize] = child;
            placed[parent] += 1;
        }

        for &(start, count) in &self.children_ranges {
            if count > 1 {
                let slice = &mut self.children_data[start as usize..(start + count) as usize];
                let elements = &self.elements;
                let texts = &self.texts;
                slice.sort_by_key(|child| {
                    if child.is_text() {
                        texts[child.index() as usize].span.offset
                    } else {
                        elements[child.index() as usize].name.offset
                    }
                });
            }
        }
    }
}

#[inline]
fn link(idx: u32) -> Option<u32> {
    (idx != NO_NODE).then_some(idx)
}

/// Iterator over children of an element
pub struct ChildIter<'a> {
    index: &'a StructuralIndex,
    data_idx: usize,
    end_idx: usize,
}

impl Iterator for ChildIter<'_> {
    type Item = ChildRef;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data_idx >= self.end_idx {
            return None;
        }
        let child = *self.index.children_data.get(self.data_idx)?;
        self.data_idx += 1;
        Some(child)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end_idx.saturating_sub(self.data_idx);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChildIter<'_> {}

/// Iterator following next-sibling links
pub struct SiblingIter<'a> {
    index: &'a StructuralIndex,
    next: u32,
}

impl Iterator for SiblingIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let current = link(self.next)?;
        self.next = self
            .index
            .get_element(current)
            .map(|e| e.next_sibling)
            .unwrap_or(NO_NODE);
        Some(current)
    }
}
