// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

//! Node-to-node messaging over a brokerless ZeroMQ transport.
//!
//! A [`Context`] produces identity-addressed [`Node`]s that bind, connect,
//! and exchange framed [`Message`]s following one of five roles
//! ([`NodeKind`]): a `Node` carries a keepalive and a small register/expose
//! control vocabulary on top of plain request/reply, while `Sub`/`Pub` and
//! `Router`/`Dealer` are thin passthrough wrappers around the matching
//! ZeroMQ socket kinds. Routing, queueing, and transport security are left
//! entirely to the underlying ZeroMQ transport.

pub mod constants;
mod context;
mod error;
mod message;
mod node;
mod pool;
mod transport;
mod util;

pub use context::Context;
pub use error::{Error, Result};
pub use message::{Meta, Message, Part};
pub use node::{Node, NodeKind, PoolLinks, RecvOutcome};
pub use pool::{NodePool, StdNodePool};
pub use util::NodeId;
