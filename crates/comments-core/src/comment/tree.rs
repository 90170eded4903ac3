//! Reply tree reconstruction

use super::view::CommentView;
use crate::types::RecordId;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A comment with its nested replies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: CommentView,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, including this one
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CommentNode::size).sum::<usize>()
    }
}

/// Parent index over a flat comment list
#[derive(Debug, Clone, Default)]
pub struct ThreadIndex {
    /// Positions in the flat list, keyed by parent id (`None` for roots)
    by_parent: HashMap<Option<RecordId>, Vec<usize>>,
}

impl ThreadIndex {
    /// Index a flat list, preserving its relative order
    pub fn build(comments: &[CommentView]) -> Self {
        let mut by_parent: HashMap<Option<RecordId>, Vec<usize>> = HashMap::new();
        for (position, comment) in comments.iter().enumerate() {
            by_parent
                .entry(comment.thread_of.clone())
                .or_default()
                .push(position);
        }
        Self { by_parent }
    }

    /// Positions of the direct replies to `parent`
    pub fn children(&self, parent: Option<&RecordId>) -> &[usize] {
        self.by_parent
            .get(&parent.cloned())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Nest a flat, annotated list into reply trees.
///
/// Starts from the replies of `starting_from`, or from the roots when it is
/// `None`. With `drop_blocked_threads`, a `blockedThread` comment is left
/// out together with its whole subtree; otherwise everything below it is
/// rendered blocked. A comment already on the current path is never
/// re-entered.
pub fn build_tree(
    comments: Vec<CommentView>,
    starting_from: Option<&RecordId>,
    drop_blocked_threads: bool,
) -> Vec<CommentNode> {
    let index = ThreadIndex::build(&comments);
    let mut builder = TreeBuilder {
        index,
        slots: comments.into_iter().map(Some).collect(),
        drop_blocked_threads,
        path: HashSet::new(),
    };
    if let Some(start) = starting_from {
        builder.path.insert(start.clone());
    }
    builder.nest(starting_from.cloned(), false)
}

struct TreeBuilder {
    index: ThreadIndex,
    slots: Vec<Option<CommentView>>,
    drop_blocked_threads: bool,
    path: HashSet<RecordId>,
}

impl TreeBuilder {
    fn nest(&mut self, parent: Option<RecordId>, inherited_block: bool) -> Vec<CommentNode> {
        let positions = self.index.children(parent.as_ref()).to_vec();
        let mut nodes = Vec::with_capacity(positions.len());

        for position in positions {
            let Some(candidate) = self.slots[position].as_ref() else {
                continue;
            };
            if self.path.contains(&candidate.id) {
                continue;
            }
            if self.drop_blocked_threads && candidate.blocked_thread {
                continue;
            }
            let Some(mut comment) = self.slots[position].take() else {
                continue;
            };

            if inherited_block {
                comment.blocked = true;
                comment.blocked_thread = true;
            }
            let thread_blocked = comment.blocked_thread;

            self.path.insert(comment.id.clone());
            let children = self.nest(Some(comment.id.clone()), thread_blocked);
            self.path.remove(&comment.id);

            nodes.push(CommentNode { comment, children });
        }
        nodes
    }
}
