//! Navigation Cursor
//!
//! A movable position over one [`Document`] plus a LIFO stack of saved
//! positions. Movement never fails loudly: when the requested relation does
//! not exist the cursor stays where it is and the call returns `false`.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::index::{Document, NodeAddress};

#[derive(Debug, Clone)]
pub struct Cursor {
    doc: Arc<Document>,
    current: NodeAddress,
    stack: Vec<NodeAddress>,
}

impl Cursor {
    /// Create a cursor positioned at the root element
    pub fn new(doc: Arc<Document>) -> Self {
        let current = doc.root();
        Self {
            doc,
            current,
            stack: Vec::new(),
        }
    }

    #[inline]
    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    #[inline]
    pub fn current_address(&self) -> NodeAddress {
        self.current
    }

    /// Tag name of the current element
    pub fn tag_name(&self) -> Option<&str> {
        self.doc.tag_name(self.current)
    }

    /// Number of saved positions on the context stack
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Save the current position
    pub fn push(&mut self) {
        self.stack.push(self.current);
    }

    /// Restore the most recently saved position.
    ///
    /// Returns `false` and leaves the cursor unchanged when nothing is saved.
    pub fn pop(&mut self) -> bool {
        match self.stack.pop() {
            Some(addr) => {
                self.current = addr;
                true
            }
            None => false,
        }
    }

    /// Push now and pop when the returned guard is dropped
    pub fn save(&mut self) -> SavedContext<'_> {
        self.push();
        SavedContext { cursor: self }
    }

    pub fn move_to_parent(&mut self) -> bool {
        self.step(Document::parent)
    }

    pub fn move_to_previous_sibling(&mut self) -> bool {
        self.step(Document::previous_sibling)
    }

    pub fn move_to_next_sibling(&mut self) -> bool {
        self.step(Document::next_sibling)
    }

    pub fn move_to_first_child(&mut self) -> bool {
        self.step(Document::first_child)
    }

    /// Jump to `addr`, rejecting addresses outside the document
    pub fn move_to(&mut self, addr: NodeAddress) -> bool {
        if !self.doc.contains(addr) {
            return false;
        }
        self.current = addr;
        true
    }

    /// Return to the root element and drop every saved position
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = self.doc.root();
    }

    fn step(&mut self, relation: fn(&Document, NodeAddress) -> Option<NodeAddress>) -> bool {
        match relation(&self.doc, self.current) {
            Some(next) => {
                self.current = next;
                true
            }
            None => false,
        }
    }
}

/// Scoped save of a cursor position.
///
/// Created by [`Cursor::save`]; restores the saved position on drop, on
/// every exit path.
pub struct SavedContext<'a> {
    cursor: &'a mut Cursor,
}

impl Deref for SavedContext<'_> {
    type Target = Cursor;

    fn deref(&self) -> &Cursor {
        self.cursor
    }
}

impl DerefMut for SavedContext<'_> {
    fn deref_mut(&mut self) -> &mut Cursor {
        self.cursor
    }
}

impl Drop for SavedContext<'_> {
    fn drop(&mut self) {
        self.cursor.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn cursor(xml: &str) -> Cursor {
        let doc = Document::parse(xml, &ParserConfig::default()).unwrap();
        Cursor::new(Arc::new(doc))
    }

    #[test]
    fn test_starts_at_root() {
        let cur = cursor("<root><a/></root>");
        assert_eq!(cur.current_address(), NodeAddress::ROOT);
        assert_eq!(cur.tag_name(), Some("root"));
        assert_eq!(cur.depth(), 0);
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut cur = cursor("<r><a/><b/><c/></r>");
        cur.push();
        assert!(cur.move_to_first_child());
        cur.push();
        assert!(cur.move_to_next_sibling());
        assert_eq!(cur.tag_name(), Some("b"));

        assert!(cur.pop());
        assert_eq!(cur.tag_name(), Some("a"));
        assert!(cur.pop());
        assert_eq!(cur.tag_name(), Some("r"));
        assert!(!cur.pop());
        assert_eq!(cur.tag_name(), Some("r"));
    }

    #[test]
    fn test_failed_moves_leave_cursor_unchanged() {
        let mut cur = cursor("<r><only/></r>");
        assert!(!cur.move_to_parent());
        assert!(!cur.move_to_next_sibling());
        assert!(cur.move_to_first_child());
        let at = cur.current_address();
        assert!(!cur.move_to_previous_sibling());
        assert!(!cur.move_to_next_sibling());
        assert!(!cur.move_to_first_child());
        assert_eq!(cur.current_address(), at);
        assert!(cur.move_to_parent());
        assert_eq!(cur.tag_name(), Some("r"));
    }

    #[test]
    fn test_move_to_bounds() {
        let mut cur = cursor("<r><a/></r>");
        assert!(cur.move_to(NodeAddress::new(1)));
        assert_eq!(cur.tag_name(), Some("a"));
        assert!(!cur.move_to(NodeAddress::new(9)));
        assert_eq!(cur.tag_name(), Some("a"));
    }

    #[test]
    fn test_saved_context_restores_on_drop() {
        let mut cur = cursor("<r><a><b/></a></r>");
        {
            let mut saved = cur.save();
            assert_eq!(saved.depth(), 1);
            saved.move_to_first_child();
            saved.move_to_first_child();
            assert_eq!(saved.tag_name(), Some("b"));
        }
        assert_eq!(cur.tag_name(), Some("r"));
        assert_eq!(cur.depth(), 0);
    }

    #[test]
    fn test_saved_context_restores_on_early_return() {
        fn wander(cur: &mut Cursor) -> Result<(), ()> {
            let mut saved = cur.save();
            if saved.move_to_first_child() {
                return Err(());
            }
            Ok(())
        }

        let mut cur = cursor("<r><a/></r>");
        assert!(wander(&mut cur).is_err());
        assert_eq!(cur.tag_name(), Some("r"));
        assert_eq!(cur.depth(), 0);
    }

    #[test]
    fn test_reset() {
        let mut cur = cursor("<r><a/></r>");
        cur.push();
        cur.move_to_first_child();
        cur.reset();
        assert_eq!(cur.current_address(), NodeAddress::ROOT);
        assert_eq!(cur.depth(), 0);
    }
}
