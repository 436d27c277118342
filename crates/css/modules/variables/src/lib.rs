//! Lexical scope chain for preprocessor variables and mixin definitions.
//!
//! Frames live in a [`ScopeArena`] owned by one evaluation and are addressed by
//! [`FrameId`]. A frame is an append-only list of `(name, binding)` pairs with a
//! link to its parent. Handles into the chain are [`ScopeRef`] snapshots: a
//! frame plus the number of its bindings that were visible when the handle was
//! taken. Lookups through a snapshot never see bindings added later, which is
//! what makes closures (detached blocks, mixin definitions) observe the chain
//! as it was at their definition and rules out forward declarations.
//!
//! The binding type is generic so the arena carries no knowledge of values.

#![forbid(unsafe_code)]

use log::trace;

/// Index of a frame in its arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

impl FrameId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A frame plus how many of its bindings are visible through this handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeRef {
    pub frame: FrameId,
    pub visible: usize,
}

/// One lexical frame.
#[derive(Debug)]
struct Frame<B> {
    bindings: Vec<(String, B)>,
    parent: Option<ScopeRef>,
}

/// Arena of frames for a single evaluation. Dropped in bulk with it.
#[derive(Debug)]
pub struct ScopeArena<B> {
    frames: Vec<Frame<B>>,
}

impl<B> Default for ScopeArena<B> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<B> ScopeArena<B> {
    #[inline]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Number of frames allocated so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Allocate a new frame chained to `parent` (or a root frame).
    pub fn push_frame(&mut self, parent: Option<ScopeRef>) -> FrameId {
        let id = FrameId(self.frames.len());
        self.frames.push(Frame {
            bindings: Vec::new(),
            parent,
        });
        trace!(target: "css_variables", "frame {} pushed (parent {:?})", id.0, parent);
        id
    }

    /// Append a binding to `frame`. Earlier snapshots of the frame are unaffected.
    pub fn bind(&mut self, frame: FrameId, name: impl Into<String>, binding: B) {
        if let Some(target) = self.frames.get_mut(frame.0) {
            target.bindings.push((name.into(), binding));
        }
    }

    /// Snapshot of `frame` including every binding added so far.
    pub fn snapshot(&self, frame: FrameId) -> ScopeRef {
        let visible = self
            .frames
            .get(frame.0)
            .map_or(0, |target| target.bindings.len());
        ScopeRef { frame, visible }
    }

    /// Bindings of one frame named `name` and accepted by `accept`, in
    /// insertion order, limited to what the snapshot can see.
    fn frame_matches<'arena, F>(
        &'arena self,
        scope: ScopeRef,
        name: &str,
        accept: &F,
    ) -> (Vec<&'arena B>, Option<ScopeRef>)
    where
        F: Fn(&B) -> bool,
    {
        let Some(frame) = self.frames.get(scope.frame.0) else {
            return (Vec::new(), None);
        };
        let limit = scope.visible.min(frame.bindings.len());
        let found = frame
            .bindings
            .get(..limit)
            .unwrap_or(&[])
            .iter()
            .filter(|(bound, binding)| bound == name && accept(binding))
            .map(|(_, binding)| binding)
            .collect();
        (found, frame.parent)
    }

    /// Every accepted binding for `name` in the first frame (walking outward)
    /// that has any. Outer frames are not merged in.
    pub fn lookup_all<F>(&self, scope: ScopeRef, name: &str, accept: F) -> Vec<&B>
    where
        F: Fn(&B) -> bool,
    {
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            let (found, parent) = self.frame_matches(current, name, &accept);
            if !found.is_empty() {
                return found;
            }
            cursor = parent;
        }
        Vec::new()
    }

    /// The most recent accepted binding for `name` in the first frame that has
    /// one.
    pub fn lookup_last<F>(&self, scope: ScopeRef, name: &str, accept: F) -> Option<&B>
    where
        F: Fn(&B) -> bool,
    {
        self.lookup_all(scope, name, accept).pop()
    }

    /// Number of frames between `scope` and the root, inclusive.
    pub fn depth(&self, scope: ScopeRef) -> usize {
        let mut depth = 0usize;
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            depth = depth.saturating_add(1);
            cursor = self
                .frames
                .get(current.frame.0)
                .and_then(|frame| frame.parent);
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inner frames shadow outer ones entirely.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn first_frame_with_binding_wins() {
        let mut arena: ScopeArena<u32> = ScopeArena::new();
        let root = arena.push_frame(None);
        arena.bind(root, ".m", 1);
        arena.bind(root, ".m", 2);
        let inner = arena.push_frame(Some(arena.snapshot(root)));
        arena.bind(inner, ".m", 3);

        let inner_view = arena.snapshot(inner);
        assert_eq!(arena.lookup_all(inner_view, ".m", |_| true), vec![&3]);
        let root_view = arena.snapshot(root);
        assert_eq!(arena.lookup_all(root_view, ".m", |_| true), vec![&1, &2]);
    }

    /// Snapshots do not see later bindings.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn snapshot_hides_later_bindings() {
        let mut arena: ScopeArena<&str> = ScopeArena::new();
        let root = arena.push_frame(None);
        arena.bind(root, "@a", "early");
        let captured = arena.snapshot(root);
        arena.bind(root, "@a", "late");
        arena.bind(root, "@b", "late");

        assert_eq!(arena.lookup_last(captured, "@a", |_| true), Some(&"early"));
        assert_eq!(arena.lookup_last(captured, "@b", |_| true), None);
        let current = arena.snapshot(root);
        assert_eq!(arena.lookup_last(current, "@a", |_| true), Some(&"late"));
    }

    /// Child frames see the parent only up to their creation point.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn child_sees_parent_prefix_only() {
        let mut arena: ScopeArena<i32> = ScopeArena::new();
        let root = arena.push_frame(None);
        let child = arena.push_frame(Some(arena.snapshot(root)));
        arena.bind(root, "@late", 7);
        let view = arena.snapshot(child);
        assert_eq!(arena.lookup_last(view, "@late", |_| true), None);
        assert_eq!(arena.depth(view), 2);
    }

    /// The accept filter separates namespaces sharing a name.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn accept_filter_skips_frames_without_accepted_bindings() {
        let mut arena: ScopeArena<i32> = ScopeArena::new();
        let root = arena.push_frame(None);
        arena.bind(root, "x", 10);
        let inner = arena.push_frame(Some(arena.snapshot(root)));
        arena.bind(inner, "x", -1);
        let view = arena.snapshot(inner);
        assert_eq!(arena.lookup_last(view, "x", |value| *value > 0), Some(&10));
    }
}
