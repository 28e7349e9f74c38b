//! Concrete syntax trees and their traversal.
//!
//! A [`Tree`] owns an immutable tree of green nodes (see `green`) plus the
//! list of edits recorded against it since it was produced:
//!
//! ```text
//!            Tree ──────────► Arc<GreenNodeData>      (shared, lengths only)
//!             │                    │
//!             │ root_node()        │ children: [GreenChild]
//!             ▼                    ▼
//!            Node<'t> ────────► absolute offsets, visible-child view
//!             │
//!             │ walk()
//!             ▼
//!            TreeCursor<'t> ──► stateful descent, O(1) parent moves
//! ```
//!
//! Edits do not move anything: [`Tree::edit`] records the change and the
//! next parse with this tree consults the records to decide which subtrees
//! still describe unmodified text. Node positions read from an edited tree
//! are therefore pre-edit positions.

mod cursor;
mod diff;
mod edit;
mod green;
mod node;

use std::sync::Arc;

use text_size::{TextRange, TextSize};

pub use cursor::TreeCursor;
pub use edit::{EditError, InputEdit};
pub use node::{Children, NamedChildren, Node};

pub(crate) use green::{
    ERROR_COST_PER_MISSING_TOKEN, ERROR_COST_PER_RECOVERY, GreenChild, GreenElement,
    GreenNodeData, GreenToken,
};

use crate::language::Language;

/// A parsed concrete syntax tree.
///
/// Cloning is cheap: the node store is shared. Two clones edited
/// differently diverge only in their edit records.
#[derive(Debug, Clone)]
pub struct Tree {
    language: Language,
    root: Arc<GreenNodeData>,
    edits: Vec<InputEdit>,
}

impl Tree {
    pub(crate) fn new(language: Language, root: Arc<GreenNodeData>) -> Tree {
        Tree {
            language,
            root,
            edits: Vec::new(),
        }
    }

    /// The grammar this tree was parsed with.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Byte length of the text this tree was parsed from.
    pub fn len(&self) -> TextSize {
        self.root.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.len == TextSize::new(0)
    }

    /// The root node, spanning the whole text.
    pub fn root_node(&self) -> Node<'_> {
        Node::new_root(self)
    }

    /// A cursor positioned on the root node.
    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }

    /// Whether any error or missing node is present anywhere in the tree.
    pub fn has_error(&self) -> bool {
        self.root.error_count > 0
    }

    /// Number of error and missing nodes in the tree.
    pub fn error_count(&self) -> u32 {
        self.root.error_count
    }

    /// Ranges covered by error nodes, plus zero-width ranges at missing
    /// tokens, in document order.
    pub fn error_ranges(&self) -> Vec<TextRange> {
        let mut out = Vec::new();
        collect_error_ranges(&self.root, TextSize::new(0), &mut out);
        out
    }

    /// Record a text replacement so the next parse can reuse the nodes the
    /// edit did not touch. Byte offsets refer to the text as it stands
    /// after all previously recorded edits.
    pub fn edit(&mut self, edit: &InputEdit) -> Result<(), EditError> {
        edit.check(self.edited_len())?;
        self.edits.push(*edit);
        Ok(())
    }

    /// Byte length of the text after applying the recorded edits.
    pub(crate) fn edited_len(&self) -> TextSize {
        let mut len = i64::from(u32::from(self.root.len));
        for edit in &self.edits {
            len += edit.delta();
        }
        TextSize::new(len.max(0) as u32)
    }

    pub(crate) fn edits(&self) -> &[InputEdit] {
        &self.edits
    }

    pub(crate) fn root_green(&self) -> &Arc<GreenNodeData> {
        &self.root
    }

    /// Ranges of this tree's text that differ structurally from `old`.
    /// Both trees must come from the same [`Language`]; otherwise the
    /// whole text is reported as changed.
    pub fn changed_ranges(&self, old: &Tree) -> Vec<TextRange> {
        if self.language != old.language {
            return vec![TextRange::up_to(self.len())];
        }
        diff::changed_ranges(&old.root, &self.root)
    }
}

fn collect_error_ranges(node: &GreenNodeData, offset: TextSize, out: &mut Vec<TextRange>) {
    if node.is_error {
        out.push(TextRange::at(offset, node.len));
        return;
    }
    if node.error_count == 0 {
        return;
    }
    for child in node.children.iter() {
        let at = offset + child.rel_offset;
        match &child.element {
            GreenElement::Node(inner) => collect_error_ranges(inner, at, out),
            GreenElement::Token(token) => {
                if token.is_missing || token.is_error {
                    out.push(TextRange::at(at, token.len));
                }
            }
        }
    }
}
