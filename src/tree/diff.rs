//! Structural comparison of two trees built from the same grammar.
//!
//! Reused subtrees are recognized by allocation identity, which is what
//! incremental parsing preserves. The walk peels identical children off
//! both ends of each matching node and recurses only when exactly one
//! child differs on each side; anything less aligned is reported as one
//! changed range. Ranges come out in new-tree coordinates, sorted and
//! merged.

use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::tree::green::{GreenElement, GreenNodeData};

pub(crate) fn changed_ranges(old: &Arc<GreenNodeData>, new: &Arc<GreenNodeData>) -> Vec<TextRange> {
    let mut out = Vec::new();
    diff_elements(
        &GreenElement::Node(old.clone()),
        &GreenElement::Node(new.clone()),
        TextSize::new(0),
        &mut out,
    );
    out
}

fn diff_elements(old: &GreenElement, new: &GreenElement, new_offset: TextSize, out: &mut Vec<TextRange>) {
    if old.ptr_eq(new) {
        return;
    }
    let (GreenElement::Node(old_node), GreenElement::Node(new_node)) = (old, new) else {
        push_range(out, TextRange::at(new_offset, new.len()));
        return;
    };
    if old_node.symbol != new_node.symbol {
        push_range(out, TextRange::at(new_offset, new.len()));
        return;
    }

    let old_children = &old_node.children;
    let new_children = &new_node.children;
    let mut prefix = 0;
    while prefix < old_children.len().min(new_children.len())
        && old_children[prefix]
            .element
            .ptr_eq(&new_children[prefix].element)
    {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < (old_children.len() - prefix).min(new_children.len() - prefix)
        && old_children[old_children.len() - 1 - suffix]
            .element
            .ptr_eq(&new_children[new_children.len() - 1 - suffix].element)
    {
        suffix += 1;
    }

    let old_mid = &old_children[prefix..old_children.len() - suffix];
    let new_mid = &new_children[prefix..new_children.len() - suffix];
    if old_mid.is_empty() && new_mid.is_empty() {
        // Same children under a rebuilt wrapper; nothing textual changed.
        return;
    }
    if old_mid.len() == 1 && new_mid.len() == 1 {
        diff_elements(
            &old_mid[0].element,
            &new_mid[0].element,
            new_offset + new_mid[0].rel_offset,
            out,
        );
    } else if new_mid.is_empty() {
        // Children disappeared with no replacement text; mark the seam.
        let at = new_children
            .get(prefix)
            .map(|child| child.rel_offset)
            .unwrap_or(new_node.len);
        push_range(out, TextRange::empty(new_offset + at));
    } else {
        let start = new_mid[0].rel_offset;
        let last = &new_mid[new_mid.len() - 1];
        let end = last.rel_offset + last.element.len();
        push_range(
            out,
            TextRange::new(new_offset + start, new_offset + end),
        );
    }
}

fn push_range(out: &mut Vec<TextRange>, range: TextRange) {
    if let Some(last) = out.last_mut() {
        if range.start() <= last.end() {
            *last = TextRange::new(last.start(), last.end().max(range.end()));
            return;
        }
    }
    out.push(range);
}
