//! Subtree reuse for incremental parsing.
//!
//! The edits recorded on an old tree are composed into [`Patches`]: disjoint
//! replaced spans in the old text's coordinates, each paired with the length
//! of its replacement. A subtree of the old tree survives into the new parse
//! when its span, extended by the lookahead its lexing consumed, touches no
//! patch. [`ReuseCursor`] walks the old green tree's frontier in text order
//! and surfaces clean, error-free subtrees whose mapped position lines up
//! with the parser's; whether such a candidate is actually shiftable in the
//! current parse state stays the parser's call.

use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::tree::{GreenElement, GreenNodeData, GreenToken, InputEdit};

// ============================================================================
// PATCHES
// ============================================================================

/// One replaced span, in original-text coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Patch {
    pub(crate) orig: TextRange,
    pub(crate) new_len: TextSize,
}

/// All edits since the old tree was parsed, composed into original-text
/// coordinates. Spans are sorted and disjoint.
#[derive(Debug, Default)]
pub(crate) struct Patches {
    patches: Vec<Patch>,
}

impl Patches {
    /// Compose a recorded edit sequence. Each edit is expressed in the
    /// coordinates produced by the edits before it, so later edits are
    /// translated back through the accumulated patches; edits that touch an
    /// existing patch are absorbed into it.
    pub(crate) fn compose(edits: &[InputEdit]) -> Patches {
        let mut patches: Vec<Patch> = Vec::new();
        for edit in edits {
            let start = u32::from(edit.start_byte) as usize;
            let old_end = u32::from(edit.old_end_byte) as usize;
            let edit_new_len = edit.new_range().len();

            // Edit endpoints in original coordinates, clamped outward when
            // they land inside an already-replaced span.
            let mapped_start = current_to_orig(&patches, start, false);
            let mapped_end = current_to_orig(&patches, old_end, true);

            let mut shift = 0i64;
            let mut merged_orig_start = mapped_start;
            let mut merged_orig_end = mapped_end;
            let mut merged_cur_start = start as i64;
            let mut merged_cur_end = old_end as i64;
            let mut keep = Vec::with_capacity(patches.len() + 1);

            for patch in patches.drain(..) {
                let cur_start = u32::from(patch.orig.start()) as i64 + shift;
                let cur_end = cur_start + u32::from(patch.new_len) as i64;
                shift += u32::from(patch.new_len) as i64 - u32::from(patch.orig.len()) as i64;

                // Touching counts as overlap so adjacent repairs coalesce.
                if cur_end < start as i64 || cur_start > old_end as i64 {
                    keep.push(patch);
                    continue;
                }
                merged_orig_start = merged_orig_start.min(patch.orig.start());
                merged_orig_end = merged_orig_end.max(patch.orig.end());
                merged_cur_start = merged_cur_start.min(cur_start);
                merged_cur_end = merged_cur_end.max(cur_end);
            }

            // Current text surviving inside the merged span, plus the
            // edit's replacement.
            let span = merged_cur_end - merged_cur_start;
            let replaced = old_end as i64 - start as i64;
            let new_len = span - replaced + u32::from(edit_new_len) as i64;

            let merged = Patch {
                orig: TextRange::new(merged_orig_start, merged_orig_end),
                new_len: TextSize::new(new_len.max(0) as u32),
            };
            let at = keep
                .iter()
                .position(|p| p.orig.start() > merged.orig.start())
                .unwrap_or(keep.len());
            keep.insert(at, merged);
            patches = keep;
        }
        Patches { patches }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Whether `range` plus `lookahead` bytes of slack misses every patch.
    /// Zero-length patches (pure insertions) are widened to one byte so a
    /// token whose lexing window reaches the insertion point is invalidated.
    pub(crate) fn is_clean(&self, range: TextRange, lookahead: u32) -> bool {
        let start = u32::from(range.start()) as u64;
        let end = u32::from(range.end()) as u64 + lookahead as u64;
        self.patches.iter().all(|patch| {
            let p_start = u32::from(patch.orig.start()) as u64;
            let p_end = (u32::from(patch.orig.end()) as u64).max(p_start + 1);
            end <= p_start || p_end <= start
        })
    }

    /// Map an original position into new-text coordinates. Positions inside
    /// a replaced span clamp into the replacement.
    pub(crate) fn map_position(&self, pos: usize) -> usize {
        let mut delta = 0i64;
        for patch in &self.patches {
            let p_start = u32::from(patch.orig.start()) as usize;
            let p_end = u32::from(patch.orig.end()) as usize;
            if p_end <= pos {
                delta += u32::from(patch.new_len) as i64 - (p_end - p_start) as i64;
            } else if p_start < pos {
                let into = (pos - p_start).min(u32::from(patch.new_len) as usize);
                return ((p_start as i64 + delta) as usize) + into;
            } else {
                break;
            }
        }
        (pos as i64 + delta) as usize
    }
}

/// Map a current-text position back to original coordinates. Positions
/// inside a replaced span clamp to the span's original start, or end when
/// `clamp_to_end` is set.
fn current_to_orig(patches: &[Patch], pos: usize, clamp_to_end: bool) -> TextSize {
    let mut delta = 0i64;
    for patch in patches {
        let cur_start = u32::from(patch.orig.start()) as i64 + delta;
        let cur_end = cur_start + u32::from(patch.new_len) as i64;
        if cur_end <= pos as i64 {
            delta += u32::from(patch.new_len) as i64 - u32::from(patch.orig.len()) as i64;
        } else if cur_start < pos as i64 {
            return if clamp_to_end {
                patch.orig.end()
            } else {
                patch.orig.start()
            };
        } else {
            break;
        }
    }
    TextSize::new((pos as i64 - delta) as u32)
}

// ============================================================================
// THE REUSE CURSOR
// ============================================================================

/// A reusable old subtree, positioned in new-text coordinates.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) element: GreenElement,
    pub(crate) new_start: usize,
}

/// Walks the old tree's frontier left to right, one subtree at a time.
/// `candidate_at` peeks; the parser then consumes with [`advance_past`]
/// (subtree shifted whole) or [`descend`] (try its children instead).
///
/// [`advance_past`]: ReuseCursor::advance_past
/// [`descend`]: ReuseCursor::descend
pub(crate) struct ReuseCursor {
    patches: Patches,
    /// Pending (element, original offset) frames, last = next in text order.
    stack: Vec<(GreenElement, usize)>,
}

impl ReuseCursor {
    pub(crate) fn new(root: &Arc<GreenNodeData>, edits: &[InputEdit]) -> ReuseCursor {
        ReuseCursor {
            patches: Patches::compose(edits),
            stack: vec![(GreenElement::Node(Arc::clone(root)), 0)],
        }
    }

    /// The next clean, error-free subtree starting exactly at `new_pos`, if
    /// the old tree still has one. Subtrees ending at or before `new_pos`
    /// are discarded; dirty or error-carrying ones are broken into their
    /// children on the fly.
    pub(crate) fn candidate_at(&mut self, new_pos: usize) -> Option<Candidate> {
        loop {
            let (element, orig_start) = self.stack.last()?;
            let orig_start = *orig_start;
            let len = usize::from(element.len());
            let new_start = self.patches.map_position(orig_start);

            if new_start + len <= new_pos && len > 0 {
                self.stack.pop();
                continue;
            }
            if new_start > new_pos {
                return None;
            }
            if new_start < new_pos {
                self.descend();
                continue;
            }

            let range = TextRange::new(
                TextSize::new(orig_start as u32),
                TextSize::new((orig_start + len) as u32),
            );
            if element.error_count() > 0 || !self.patches.is_clean(range, element.lookahead()) {
                self.descend();
                continue;
            }
            return Some(Candidate {
                element: element.clone(),
                new_start,
            });
        }
    }

    /// Drop the current subtree; its span has been consumed.
    pub(crate) fn advance_past(&mut self) {
        self.stack.pop();
    }

    /// Replace the current subtree with its children (tokens just vanish).
    pub(crate) fn descend(&mut self) {
        let Some((element, orig_start)) = self.stack.pop() else {
            return;
        };
        if let GreenElement::Node(node) = element {
            for child in node.children.iter().rev() {
                self.stack.push((
                    child.element.clone(),
                    orig_start + usize::from(child.rel_offset),
                ));
            }
        }
    }
}

/// First token under an element, used as the effective lookahead when
/// deciding whether pending reductions make a node candidate pushable.
pub(crate) fn first_leaf(element: &GreenElement) -> Option<&Arc<GreenToken>> {
    match element {
        GreenElement::Token(token) => Some(token),
        GreenElement::Node(node) => node
            .children
            .first()
            .and_then(|child| first_leaf(&child.element)),
    }
}
