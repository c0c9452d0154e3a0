// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use std::cell::RefCell;

use crate::error::Result;
use crate::node::{Node, NodeKind};
use crate::pool::{NodePool, StdNodePool};

/// Top-level handle a process holds: one ZeroMQ context (cheap to clone,
/// shared internally) plus whichever [`NodePool`] is sourcing and
/// recycling [`Node`] values. All node creation and teardown goes through
/// here, so `Node` itself never needs a back-reference to its pool.
pub struct Context {
    zmq_ctx: zmq::Context,
    pool: RefCell<Box<dyn NodePool>>,
}

impl Context {
    /// A context backed by the default [`StdNodePool`].
    pub fn new() -> Context {
        Context::with_pool(Box::new(StdNodePool::new()))
    }

    pub fn with_pool(pool: Box<dyn NodePool>) -> Context {
        Context {
            zmq_ctx: zmq::Context::new(),
            pool: RefCell::new(pool),
        }
    }

    pub fn zmq_context(&self) -> &zmq::Context {
        &self.zmq_ctx
    }

    /// Produces a node of `kind`, recycled from the pool if one is
    /// available, or freshly allocated otherwise.
    pub fn new_node(&self, kind: NodeKind) -> Result<Node> {
        let mut pool = self.pool.borrow_mut();
        if let Some(mut node) = pool.get(kind) {
            node.used = true;
            pool.add(&node);
            return Ok(node);
        }
        drop(pool);

        let mut node = Node::raw(&self.zmq_ctx, kind)?;
        node.used = true;
        self.pool.borrow_mut().add(&node);
        Ok(node)
    }

    /// Tears down `node` and offers it back to the pool for reuse. The
    /// node is reset to a pristine, unbound/unconnected state first, so a
    /// recycled `Node` handed back by `new_node` never carries stale
    /// connection state into the caller's hands.
    pub fn destroy_node(&self, mut node: Node) {
        node.used = false;
        if let Err(e) = node.reset_for_pool() {
            log::warn!("[{:?}] reset before recycling failed: {}", node.id(), e);
        }
        self.pool.borrow_mut().put(node);
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_then_destroy_recycles_into_the_pool() {
        let ctx = Context::new();
        let node = ctx.new_node(NodeKind::Sub).unwrap();
        ctx.destroy_node(node);

        let recycled = ctx.new_node(NodeKind::Sub).unwrap();
        assert_eq!(recycled.kind(), NodeKind::Sub);
    }
}
