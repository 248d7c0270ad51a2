//! Position Path Resolver
//!
//! Computes where the element under the cursor sits: its 1-based position
//! among same-named siblings and its canonical path, e.g.
//! `/root[1]/element[3]/childElement[2]`.

use std::fmt::Write;

use super::cursor::Cursor;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionTuple {
    pub sibling_position: usize,
    pub canonical_path: String,
}

/// Resolve the position of the current element.
///
/// The cursor walks to the root and back; on return it is at the original
/// element with the original context stack depth.
pub fn resolve_position(cursor: &mut Cursor) -> Result<PositionTuple> {
    let mut walk = cursor.save();
    let mut levels: Vec<(String, usize)> = Vec::new();

    loop {
        let addr = walk.current_address();
        let tag = walk
            .tag_name()
            .ok_or_else(|| Error::invalid_node(addr, "element has no tag name"))?
            .to_string();
        let position = same_name_position(&mut walk, &tag);
        levels.push((tag, position));

        if !walk.move_to_parent() {
            break;
        }
    }

    let sibling_position = levels.first().map(|(_, pos)| *pos).unwrap_or(1);
    let mut canonical_path = String::new();
    for (tag, position) in levels.iter().rev() {
        let _ = write!(canonical_path, "/{tag}[{position}]");
    }

    Ok(PositionTuple {
        sibling_position,
        canonical_path,
    })
}

/// 1 plus the number of preceding siblings named exactly `tag`
fn same_name_position(cursor: &mut Cursor, tag: &str) -> usize {
    let mut scan = cursor.save();
    let mut position = 1;
    while scan.move_to_previous_sibling() {
        if scan.tag_name() == Some(tag) {
            position += 1;
        }
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::index::{Document, NodeAddress};
    use std::sync::Arc;

    fn cursor(xml: &str) -> Cursor {
        let doc = Document::parse(xml, &ParserConfig::default()).unwrap();
        Cursor::new(Arc::new(doc))
    }

    #[test]
    fn test_root_position() {
        let mut cur = cursor("<root/>");
        let pos = resolve_position(&mut cur).unwrap();
        assert_eq!(pos.sibling_position, 1);
        assert_eq!(pos.canonical_path, "/root[1]");
    }

    #[test]
    fn test_counts_only_same_name_siblings() {
        // r, a, b, a, c(d, d)
        let mut cur = cursor("<r><a/><b/><a/><c><d/><d/></c></r>");

        cur.move_to(NodeAddress::new(3));
        let pos = resolve_position(&mut cur).unwrap();
        assert_eq!(pos.sibling_position, 2);
        assert_eq!(pos.canonical_path, "/r[1]/a[2]");

        cur.move_to(NodeAddress::new(2));
        assert_eq!(resolve_position(&mut cur).unwrap().canonical_path, "/r[1]/b[1]");

        cur.move_to(NodeAddress::new(6));
        let pos = resolve_position(&mut cur).unwrap();
        assert_eq!(pos.sibling_position, 2);
        assert_eq!(pos.canonical_path, "/r[1]/c[1]/d[2]");
    }

    #[test]
    fn test_cursor_restored() {
        let mut cur = cursor("<r><a><b/><b/></a></r>");
        cur.push();
        cur.move_to(NodeAddress::new(3));
        let depth = cur.depth();

        resolve_position(&mut cur).unwrap();
        assert_eq!(cur.current_address(), NodeAddress::new(3));
        assert_eq!(cur.depth(), depth);
    }

    #[test]
    fn test_prefixed_names_compared_exactly() {
        let mut cur = cursor(r#"<r xmlns:p="urn:p"><p:x/><x/><p:x/></r>"#);
        cur.move_to(NodeAddress::new(3));
        assert_eq!(resolve_position(&mut cur).unwrap().canonical_path, "/r[1]/p:x[2]");
    }
}
