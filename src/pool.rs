// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use std::collections::HashMap;

use crate::node::{Node, NodeKind};

/// Hook surface a [`crate::Context`] uses to source and recycle [`Node`]
/// values. `get`/`put` move ownership in and out; `add` is borrow-only
/// bookkeeping for nodes the context still owns, so a pool implementation
/// never needs to hold a live node behind a back-reference.
pub trait NodePool {
    /// Hands back a previously recycled node of `kind`, if one is on hand.
    fn get(&mut self, kind: NodeKind) -> Option<Node>;

    /// Notes that `node` has just been handed out, for bookkeeping only.
    /// The pool does not retain a handle to it.
    fn add(&mut self, node: &Node);

    /// Offers `node` back to the pool for future reuse. A pool that
    /// declines simply drops it, which runs `Node`'s own teardown.
    fn put(&mut self, node: Node);
}

/// Reference [`NodePool`] that recycles torn-down nodes by kind instead of
/// letting the transport reallocate a ZeroMQ socket from scratch each time.
#[derive(Default)]
pub struct StdNodePool {
    recycle: HashMap<u8, Vec<Node>>,
    outstanding: usize,
}

impl StdNodePool {
    pub fn new() -> StdNodePool {
        StdNodePool::default()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    fn key(kind: NodeKind) -> u8 {
        kind as u8
    }
}

impl NodePool for StdNodePool {
    fn get(&mut self, kind: NodeKind) -> Option<Node> {
        let node = self.recycle.get_mut(&Self::key(kind)).and_then(Vec::pop);
        if node.is_some() {
            self.outstanding += 1;
        }
        node
    }

    fn add(&mut self, _node: &Node) {
        self.outstanding += 1;
    }

    fn put(&mut self, node: Node) {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.recycle.entry(Self::key(node.kind())).or_default().push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_returns_none() {
        let mut pool = StdNodePool::new();
        assert!(pool.get(NodeKind::Sub).is_none());
    }

    #[test]
    fn put_then_get_recycles_by_kind() {
        let ctx = zmq::Context::new();
        let mut pool = StdNodePool::new();

        let node = Node::raw(&ctx, NodeKind::Sub).unwrap();
        pool.add(&node);
        pool.put(node);

        assert!(pool.get(NodeKind::Pub).is_none());
        assert!(pool.get(NodeKind::Sub).is_some());
        assert_eq!(pool.outstanding(), 1);
    }
}
