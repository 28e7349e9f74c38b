//! Read-side view of a tree: absolute positions and the visible-child
//! structure.
//!
//! The green layer keeps every symbol the parser produced, including
//! hidden rules and invisible tokens. A [`Node`] presents the visible
//! view: children of hidden rule nodes are spliced into their closest
//! visible ancestor, invisible tokens disappear, and a field tag on a
//! hidden edge is inherited by the spliced-up children that carry none of
//! their own.

use std::fmt;
use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::language::{FieldId, Language, Symbol};
use crate::tree::green::{GreenChild, GreenElement, GreenNodeData, GreenToken};
use crate::tree::{Tree, TreeCursor};

/// A node of the concrete syntax tree: either a rule node or a token.
///
/// Nodes are lightweight handles borrowing their [`Tree`]; copy freely.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    element: ElementRef<'t>,
    offset: TextSize,
}

#[derive(Clone, Copy)]
pub(crate) enum ElementRef<'t> {
    Node(&'t Arc<GreenNodeData>),
    Token(&'t Arc<GreenToken>),
}

impl<'t> ElementRef<'t> {
    pub(crate) fn of(element: &'t GreenElement) -> ElementRef<'t> {
        match element {
            GreenElement::Node(node) => ElementRef::Node(node),
            GreenElement::Token(token) => ElementRef::Token(token),
        }
    }

    fn len(&self) -> TextSize {
        match self {
            ElementRef::Node(node) => node.len,
            ElementRef::Token(token) => token.len,
        }
    }

    fn symbol(&self) -> Symbol {
        match self {
            ElementRef::Node(node) => node.symbol,
            ElementRef::Token(token) => token.symbol,
        }
    }

    fn ptr_id(&self) -> usize {
        match self {
            ElementRef::Node(node) => Arc::as_ptr(node) as usize,
            ElementRef::Token(token) => Arc::as_ptr(token) as usize,
        }
    }
}

/// Whether an element appears in the visible tree.
pub(crate) fn element_is_visible(language: &Language, element: &GreenElement) -> bool {
    match element {
        GreenElement::Node(node) => node.is_error || language.is_visible(node.symbol),
        GreenElement::Token(token) => token.is_missing || language.is_visible(token.symbol),
    }
}

impl<'t> Node<'t> {
    pub(crate) fn new_root(tree: &'t Tree) -> Node<'t> {
        Node {
            tree,
            element: ElementRef::Node(tree.root_green()),
            offset: TextSize::new(0),
        }
    }

    pub(crate) fn new(tree: &'t Tree, element: ElementRef<'t>, offset: TextSize) -> Node<'t> {
        Node {
            tree,
            element,
            offset,
        }
    }

    pub(crate) fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub(crate) fn element(&self) -> ElementRef<'t> {
        self.element
    }

    /// An identifier unique per shared subtree. Two nodes (possibly from
    /// different trees) have equal ids exactly when they share the same
    /// underlying allocation, which makes this the observable witness of
    /// incremental reuse.
    pub fn id(&self) -> usize {
        self.element.ptr_id()
    }

    pub fn language(&self) -> &'t Language {
        self.tree.language()
    }

    /// Grammar name of this node's symbol.
    pub fn kind(&self) -> &'t str {
        self.tree.language().symbol_name(self.symbol())
    }

    pub fn kind_id(&self) -> u16 {
        self.symbol().raw()
    }

    pub(crate) fn symbol(&self) -> Symbol {
        self.element.symbol()
    }

    pub fn is_named(&self) -> bool {
        self.tree.language().is_named(self.symbol())
    }

    /// Whether this node was attached outside any production, the way
    /// trivia is.
    pub fn is_extra(&self) -> bool {
        match self.element {
            ElementRef::Node(node) => node.is_extra_wrapper,
            ElementRef::Token(token) => token.is_extra,
        }
    }

    /// Whether this node is an `ERROR` node or an unparsable token.
    pub fn is_error(&self) -> bool {
        match self.element {
            ElementRef::Node(node) => node.is_error,
            ElementRef::Token(token) => token.is_error,
        }
    }

    /// Whether this is a zero-width token inserted during recovery.
    pub fn is_missing(&self) -> bool {
        match self.element {
            ElementRef::Node(_) => false,
            ElementRef::Token(token) => token.is_missing,
        }
    }

    /// Whether this subtree contains any error or missing node.
    pub fn has_error(&self) -> bool {
        match self.element {
            ElementRef::Node(node) => node.error_count > 0,
            ElementRef::Token(token) => token.is_error || token.is_missing,
        }
    }

    pub fn start_byte(&self) -> TextSize {
        self.offset
    }

    pub fn end_byte(&self) -> TextSize {
        self.offset + self.element.len()
    }

    pub fn byte_range(&self) -> TextRange {
        TextRange::at(self.offset, self.element.len())
    }

    /// Number of visible children.
    pub fn child_count(&self) -> usize {
        self.children().count()
    }

    /// The `i`th visible child.
    pub fn child(&self, i: usize) -> Option<Node<'t>> {
        self.children().nth(i)
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, i: usize) -> Option<Node<'t>> {
        self.named_children().nth(i)
    }

    /// Visible children, in order.
    pub fn children(&self) -> Children<'t> {
        Children {
            inner: self.children_with_fields(),
        }
    }

    /// Visible named children, in order.
    pub fn named_children(&self) -> NamedChildren<'t> {
        NamedChildren {
            inner: self.children_with_fields(),
        }
    }

    pub(crate) fn children_with_fields(&self) -> VisibleChildren<'t> {
        let stack = match self.element {
            ElementRef::Node(node) => vec![SpliceFrame {
                children: &node.children,
                index: 0,
                offset: self.offset,
                inherited: None,
            }],
            ElementRef::Token(_) => Vec::new(),
        };
        VisibleChildren {
            tree: self.tree,
            stack,
        }
    }

    /// The first visible child tagged with the given field.
    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'t>> {
        let id = self.tree.language().field_id_for_name(name)?;
        self.child_by_field_id(id)
    }

    pub fn child_by_field_id(&self, id: FieldId) -> Option<Node<'t>> {
        self.children_with_fields()
            .find(|(_, field)| *field == Some(id))
            .map(|(node, _)| node)
    }

    /// The field tag of the `i`th visible child, if any.
    pub fn field_name_for_child(&self, i: usize) -> Option<&'t str> {
        let (_, field) = self.children_with_fields().nth(i)?;
        self.tree.language().field_name(field?)
    }

    /// The smallest node within this subtree that spans the given range.
    /// Returns `None` when the range falls outside this node.
    pub fn descendant_for_byte_range(&self, range: TextRange) -> Option<Node<'t>> {
        if !covers(self.byte_range(), range) {
            return None;
        }
        let mut node = *self;
        'descend: loop {
            for child in node.children() {
                if covers(child.byte_range(), range) {
                    node = child;
                    continue 'descend;
                }
            }
            return Some(node);
        }
    }

    /// The slice of `source` this node spans, decoded as UTF-8. The range
    /// is clamped to `source`, so a stale tree yields a shorter slice
    /// rather than a panic.
    pub fn utf8_text<'s>(&self, source: &'s [u8]) -> Result<&'s str, std::str::Utf8Error> {
        let start = usize::from(self.start_byte()).min(source.len());
        let end = usize::from(self.end_byte()).min(source.len());
        std::str::from_utf8(&source[start..end])
    }

    /// A cursor positioned on this node.
    pub fn walk(&self) -> TreeCursor<'t> {
        TreeCursor::new(*self)
    }

    /// S-expression rendering of the named structure, in the form
    /// `(kind field: (child) ...)`. Missing tokens render as
    /// `(MISSING kind)` and unparsable tokens as `(UNEXPECTED)`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        match self.element {
            ElementRef::Token(token) if token.is_missing => {
                out.push_str("(MISSING ");
                self.write_sexp_kind(out);
                out.push(')');
            }
            ElementRef::Token(token) if token.is_error => {
                out.push_str("(UNEXPECTED)");
            }
            ElementRef::Token(_) => {
                out.push('(');
                self.write_sexp_kind(out);
                out.push(')');
            }
            ElementRef::Node(_) => {
                out.push('(');
                self.write_sexp_kind(out);
                for (child, field) in self.children_with_fields() {
                    if !(child.is_named() || child.is_error() || child.is_missing()) {
                        continue;
                    }
                    out.push(' ');
                    if let Some(name) = field.and_then(|f| self.tree.language().field_name(f)) {
                        out.push_str(name);
                        out.push_str(": ");
                    }
                    child.write_sexp(out);
                }
                out.push(')');
            }
        }
    }

    fn write_sexp_kind(&self, out: &mut String) {
        if self.is_named() {
            out.push_str(self.kind());
        } else {
            out.push('"');
            out.push_str(self.kind());
            out.push('"');
        }
    }
}

fn covers(outer: TextRange, inner: TextRange) -> bool {
    outer.start() <= inner.start() && inner.end() <= outer.end()
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Node<'_>) -> bool {
        self.id() == other.id() && self.offset == other.offset
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.kind(), self.byte_range())
    }
}

// ============================================================================
// VISIBLE-CHILD TRAVERSAL
// ============================================================================

#[derive(Clone, Copy)]
struct SpliceFrame<'t> {
    children: &'t [GreenChild],
    index: usize,
    offset: TextSize,
    /// Field carried by the hidden edge this frame was entered through.
    inherited: Option<FieldId>,
}

/// Iterator over visible children, descending through hidden rule nodes.
pub(crate) struct VisibleChildren<'t> {
    tree: &'t Tree,
    stack: Vec<SpliceFrame<'t>>,
}

impl<'t> Iterator for VisibleChildren<'t> {
    type Item = (Node<'t>, Option<FieldId>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(child) = frame.children.get(frame.index) else {
                self.stack.pop();
                continue;
            };
            frame.index += 1;
            let offset = frame.offset + child.rel_offset;
            let field = child.field.or(frame.inherited);
            if element_is_visible(self.tree.language(), &child.element) {
                let node = Node::new(self.tree, ElementRef::of(&child.element), offset);
                return Some((node, field));
            }
            if let GreenElement::Node(hidden) = &child.element {
                self.stack.push(SpliceFrame {
                    children: &hidden.children,
                    index: 0,
                    offset,
                    inherited: field,
                });
            }
        }
    }
}

/// Iterator returned by [`Node::children`].
pub struct Children<'t> {
    inner: VisibleChildren<'t>,
}

impl<'t> Iterator for Children<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(node, _)| node)
    }
}

/// Iterator returned by [`Node::named_children`].
pub struct NamedChildren<'t> {
    inner: VisibleChildren<'t>,
}

impl<'t> Iterator for NamedChildren<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .map(|(node, _)| node)
            .find(Node::is_named)
    }
}
