//! Stateful tree traversal.
//!
//! A cursor keeps the path from its root node to the current node as a
//! stack of child indices into the green tree, so every move is local:
//! no parent pointers are stored in the tree itself. Hidden rule nodes
//! are part of the path but never surface as cursor positions.

use text_size::TextSize;

use crate::language::FieldId;
use crate::tree::green::{GreenChild, GreenElement};
use crate::tree::node::{element_is_visible, ElementRef};
use crate::tree::{Node, Tree};

/// A mutable position within a tree, created by [`Node::walk`].
///
/// The cursor never leaves the subtree of the node it was created at.
pub struct TreeCursor<'t> {
    tree: &'t Tree,
    root: Node<'t>,
    stack: Vec<CursorFrame<'t>>,
}

/// One ancestor level. `children[index]` is the path step taken through
/// this level; for the top frame it is the current node itself.
#[derive(Clone, Copy)]
struct CursorFrame<'t> {
    children: &'t [GreenChild],
    /// Absolute offset of the node owning `children`.
    offset: TextSize,
    index: usize,
    /// Field inherited from the hidden edge this frame was entered
    /// through; `None` on visible frames.
    inherited: Option<FieldId>,
    /// Whether this frame's node is a visible ancestor, as opposed to a
    /// hidden rule node passed through transparently.
    visible: bool,
}

impl<'t> TreeCursor<'t> {
    pub(crate) fn new(node: Node<'t>) -> TreeCursor<'t> {
        TreeCursor {
            tree: node.tree(),
            root: node,
            stack: Vec::new(),
        }
    }

    /// The node the cursor is currently on.
    pub fn node(&self) -> Node<'t> {
        match self.stack.last() {
            None => self.root,
            Some(frame) => {
                // Invariant: the top frame always points at a visible child.
                let child = &frame.children[frame.index];
                Node::new(
                    self.tree,
                    ElementRef::of(&child.element),
                    frame.offset + child.rel_offset,
                )
            }
        }
    }

    /// Field tag of the current node within its visible parent.
    pub fn field_id(&self) -> Option<FieldId> {
        let frame = self.stack.last()?;
        let child = &frame.children[frame.index];
        child.field.or(frame.inherited)
    }

    pub fn field_name(&self) -> Option<&'t str> {
        self.tree.language().field_name(self.field_id()?)
    }

    /// Move to the first visible child. Returns `false` (without moving)
    /// on tokens and on nodes with no visible children.
    pub fn goto_first_child(&mut self) -> bool {
        let current = self.node();
        let ElementRef::Node(green) = current.element() else {
            return false;
        };
        let depth = self.stack.len();
        self.stack.push(CursorFrame {
            children: &green.children,
            offset: current.start_byte(),
            index: 0,
            inherited: None,
            visible: true,
        });
        if self.scan_to_visible() {
            true
        } else {
            self.stack.truncate(depth);
            false
        }
    }

    /// Move to the next visible sibling. Returns `false` (without moving)
    /// when the current node is the last one, or the cursor's root.
    pub fn goto_next_sibling(&mut self) -> bool {
        if self.stack.is_empty() {
            return false;
        }
        let saved = self.stack.clone();
        if let Some(frame) = self.stack.last_mut() {
            frame.index += 1;
        }
        if self.scan_to_visible() {
            true
        } else {
            self.stack = saved;
            false
        }
    }

    /// Move to the visible parent. Returns `false` at the cursor's root.
    pub fn goto_parent(&mut self) -> bool {
        while let Some(frame) = self.stack.pop() {
            if frame.visible {
                return true;
            }
        }
        false
    }

    /// Move to the first visible child whose end lies past `byte`.
    /// Returns `false` (without moving) when no child qualifies.
    pub fn goto_first_child_for_byte(&mut self, byte: TextSize) -> bool {
        if !self.goto_first_child() {
            return false;
        }
        loop {
            if self.node().end_byte() > byte {
                return true;
            }
            if !self.goto_next_sibling() {
                self.goto_parent();
                return false;
            }
        }
    }

    /// Re-root the cursor on another node of the same tree.
    pub fn reset(&mut self, node: Node<'t>) {
        self.tree = node.tree();
        self.root = node;
        self.stack.clear();
    }

    /// Advance from the top frame's current position to the next visible
    /// element, entering hidden rule nodes and leaving exhausted ones.
    /// Fails when the enclosing visible frame runs out of children, with
    /// the stack left for the caller to restore.
    fn scan_to_visible(&mut self) -> bool {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return false;
            };
            if let Some(child) = frame.children.get(frame.index) {
                if element_is_visible(self.tree.language(), &child.element) {
                    return true;
                }
                if let GreenElement::Node(hidden) = &child.element {
                    let offset = frame.offset + child.rel_offset;
                    let inherited = child.field.or(frame.inherited);
                    self.stack.push(CursorFrame {
                        children: &hidden.children,
                        offset,
                        index: 0,
                        inherited,
                        visible: false,
                    });
                } else {
                    frame.index += 1;
                }
            } else if frame.visible {
                return false;
            } else {
                self.stack.pop();
                if let Some(parent) = self.stack.last_mut() {
                    parent.index += 1;
                }
            }
        }
    }
}
