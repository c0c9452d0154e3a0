// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use std::any::Any;
use std::time::{Duration, Instant};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::transport;
use crate::util::{IdSequence, NodeId};

/// The socket role assigned to a node at creation. Only `Node` carries the
/// leading type-byte envelope frame, the keepalive timer, and the
/// REGISTER/UNREGISTER/EXPOSE/ALIVE control chatter; the others are plain
/// passthrough ZeroMQ socket kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeKind {
    Node = 1,
    Sub = 2,
    Pub = 3,
    Router = 4,
    Dealer = 5,
}

impl NodeKind {
    fn zmq_type(self) -> zmq::SocketType {
        match self {
            NodeKind::Node => zmq::DEALER,
            NodeKind::Sub => zmq::SUB,
            NodeKind::Pub => zmq::PUB,
            NodeKind::Router => zmq::ROUTER,
            NodeKind::Dealer => zmq::DEALER,
        }
    }

    fn wire_byte(self) -> u8 {
        self as u8
    }
}

static ID_SEQUENCE: std::sync::OnceLock<IdSequence> = std::sync::OnceLock::new();

fn next_node_id() -> NodeId {
    NodeId(ID_SEQUENCE.get_or_init(IdSequence::new).next())
}

/// The five roles a pool-driven poll loop buckets a node into while
/// building its wait lists. Kept as bit flags directly on the node
/// instead of pool-owned intrusive lists, so there is no ownership cycle
/// between `Node` and whatever pool manages it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolLinks(u8);

impl PoolLinks {
    pub const ALL: PoolLinks = PoolLinks(0b0000_0001);
    pub const POLLIN: PoolLinks = PoolLinks(0b0000_0010);
    pub const POLLOUT: PoolLinks = PoolLinks(0b0000_0100);
    pub const POLLERR: PoolLinks = PoolLinks(0b0000_1000);
    pub const RECVMSG_TIMEOUT: PoolLinks = PoolLinks(0b0001_0000);

    pub fn contains(self, mask: PoolLinks) -> bool {
        self.0 & mask.0 != 0
    }

    pub fn insert(&mut self, mask: PoolLinks) {
        self.0 |= mask.0;
    }

    pub fn remove(&mut self, mask: PoolLinks) {
        self.0 &= !mask.0;
    }
}

/// Outcome delivered to an asynchronous-receive callback.
pub enum RecvOutcome {
    Message(Message),
    TimedOut,
}

struct AsyncRecv {
    callback: Box<dyn FnMut(&mut Node, RecvOutcome)>,
    deadline: Option<Instant>,
}

/// A stateful endpoint combining one ZeroMQ socket, an identity, bind and
/// connect state, a keepalive timer (for [`NodeKind::Node`] only), an
/// optional asynchronous-receive registration, and a user-data slot.
///
/// A `Node` is single-threaded per instance: every operation is expected
/// to be serialized by the thread that owns it, matching libzmq's own
/// socket-affinity contract.
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    socket: zmq::Socket,
    sockid: Vec<u8>,
    is_bind: bool,
    bind_addr: Option<String>,
    is_connect: bool,
    connect_addr: Option<String>,
    alive_interval: Option<Duration>,
    alive_deadline: Option<Instant>,
    user_data: Option<Box<dyn Any>>,
    pub(crate) used: bool,
    recv_async: Option<AsyncRecv>,
    links: PoolLinks,
}

impl Node {
    /// Allocates a fresh node directly from the transport context,
    /// bypassing any pool. `used` starts `false`: dropping (or
    /// explicitly tearing down) a node created this way always releases
    /// its resources rather than attempting to recycle it.
    pub fn raw(ctx: &zmq::Context, kind: NodeKind) -> Result<Node> {
        let socket = ctx.socket(kind.zmq_type())?;
        socket.set_linger(LINGER_MS)?;

        Ok(Node {
            id: next_node_id(),
            kind,
            socket,
            sockid: Vec::new(),
            is_bind: false,
            bind_addr: None,
            is_connect: false,
            connect_addr: None,
            alive_interval: None,
            alive_deadline: None,
            user_data: None,
            used: false,
            recv_async: None,
            links: PoolLinks::default(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn socket(&self) -> &zmq::Socket {
        &self.socket
    }

    pub fn links(&self) -> PoolLinks {
        self.links
    }

    pub fn links_mut(&mut self) -> &mut PoolLinks {
        &mut self.links
    }

    pub fn is_bound(&self) -> bool {
        self.is_bind
    }

    pub fn is_connected(&self) -> bool {
        self.is_connect
    }

    pub fn get_id(&self) -> &[u8] {
        &self.sockid
    }

    /// # Panics
    /// Panics if `id.len() > SOCKID_SIZE` — a precondition violation.
    pub fn set_id(&mut self, id: &[u8]) -> Result<()> {
        assert!(id.len() <= SOCKID_SIZE, "set_id: identity too long");
        self.socket.set_identity(id)?;
        self.sockid = id.to_vec();
        Ok(())
    }

    /// # Panics
    /// Panics if this node is not of kind `Sub`.
    pub fn set_filter(&mut self, prefix: &[u8]) -> Result<()> {
        assert_eq!(self.kind, NodeKind::Sub, "set_filter: not a Sub node");
        self.socket.set_subscribe(prefix).map_err(Error::from)
    }

    pub fn get_user_data(&self) -> Option<&(dyn Any)> {
        self.user_data.as_deref()
    }

    pub fn set_user_data(&mut self, data: Box<dyn Any>) {
        self.user_data = Some(data);
    }

    /// # Panics
    /// Panics if this node is not of kind `Node`.
    pub fn set_alive(&mut self, interval_secs: u64) {
        assert_eq!(self.kind, NodeKind::Node, "set_alive: not a Node");
        let floored = interval_secs.max(MIN_ALIVE_INTERVAL_SECS);
        self.alive_interval = Some(Duration::from_secs(floored));
        self.alive_deadline = Some(Instant::now() + Duration::from_secs(floored));
    }

    /// Whether a keepalive ALIVE is due right now. Always `false` for
    /// non-`Node` kinds or an unconnected `Node`.
    pub fn alive_due(&self) -> bool {
        match self.alive_deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    fn rearm_alive(&mut self) {
        if let Some(interval) = self.alive_interval {
            self.alive_deadline = Some(Instant::now() + interval);
        }
    }

    // ---- bind / unbind -------------------------------------------------

    /// # Panics
    /// Panics if already bound.
    pub fn bind(&mut self, addr: &str) -> Result<()> {
        assert!(!self.is_bind, "bind: already bound");
        self.socket.bind(addr)?;
        self.bind_addr = Some(addr.to_string());
        self.is_bind = true;
        log::debug!("[{:?}] bound to '{}'", self.id, addr);
        Ok(())
    }

    /// # Panics
    /// Panics if not currently bound.
    pub fn unbind(&mut self) -> Result<()> {
        assert!(self.is_bind, "unbind: not bound");
        let addr = self.bind_addr.take().expect("bind_addr set while is_bind");
        self.socket.unbind(&addr)?;
        self.is_bind = false;
        log::debug!("[{:?}] unbound from '{}'", self.id, addr);
        Ok(())
    }

    // ---- connect / disconnect ------------------------------------------

    /// # Panics
    /// Panics if already connected.
    pub fn connect(&mut self, addr: &str) -> Result<()> {
        assert!(!self.is_connect, "connect: already connected");
        self.socket.connect(addr)?;

        if self.kind == NodeKind::Node {
            if let Err(e) = self.register() {
                // roll back the transport connect before reporting failure
                let _ = self.socket.disconnect(addr);
                return Err(e);
            }
            self.alive_interval = Some(Duration::from_secs(DEFAULT_ALIVE_INTERVAL_SECS));
            self.alive_deadline =
                Some(Instant::now() + Duration::from_secs(DEFAULT_ALIVE_INTERVAL_SECS));
        }

        self.connect_addr = Some(addr.to_string());
        self.is_connect = true;
        log::debug!("[{:?}] connected to '{}'", self.id, addr);
        Ok(())
    }

    /// # Panics
    /// Panics if not currently connected.
    pub fn disconnect(&mut self) -> Result<()> {
        assert!(self.is_connect, "disconnect: not connected");

        if self.kind == NodeKind::Node {
            if let Err(e) = self.unregister() {
                log::warn!("[{:?}] unregister on disconnect failed: {}", self.id, e);
            }
            self.alive_interval = None;
            self.alive_deadline = None;
        }

        let addr = self
            .connect_addr
            .take()
            .expect("connect_addr set while is_connect");
        self.socket.disconnect(&addr)?;
        self.is_connect = false;
        log::debug!("[{:?}] disconnected from '{}'", self.id, addr);
        Ok(())
    }

    // ---- control messages ------------------------------------------------

    fn send_control(&mut self, verb: &'static [u8]) -> Result<()> {
        let mut msg = Message::init_data(Some(SOCKID_NONE), Some(verb), None);
        self.sendmsg(&mut msg)
    }

    pub fn register(&mut self) -> Result<()> {
        self.send_control(REGISTER_VERB)
    }

    pub fn unregister(&mut self) -> Result<()> {
        self.send_control(UNREGISTER_VERB)
    }

    /// # Panics
    /// Panics if this node has no identity set.
    pub fn expose(&mut self) -> Result<()> {
        assert!(!self.sockid.is_empty(), "expose: identity is empty");
        self.send_control(EXPOSE_VERB)
    }

    /// # Panics
    /// Panics if this node is not of kind `Node`.
    pub fn alive(&mut self) -> Result<()> {
        assert_eq!(self.kind, NodeKind::Node, "alive: not a Node");
        let r = self.send_control(ALIVE_VERB);
        self.rearm_alive();
        r
    }

    // ---- raw byte I/O ------------------------------------------------------

    pub fn send_raw(&self, buf: &[u8], flags: i32) -> Result<()> {
        self.socket.send(buf, flags).map_err(Error::from)
    }

    pub fn recv_raw(&self, flags: i32) -> Result<Vec<u8>> {
        self.socket.recv_bytes(flags).map_err(Error::from)
    }

    // ---- framed message I/O -------------------------------------------------

    /// Frames `msg` onto the wire: `[type?] [sockid] ["" header] ["" content]
    /// ["" meta]`, only the last frame sent without the "more" flag.
    pub fn sendmsg(&mut self, msg: &mut Message) -> Result<()> {
        #[cfg(feature = "zmq-bug-workaround")]
        std::thread::sleep(Duration::from_millis(10));

        if self.kind == NodeKind::Node {
            self.socket
                .send(vec![self.kind.wire_byte()], zmq::SNDMORE | zmq::DONTWAIT)?;
        }

        if self.kind == NodeKind::Router {
            // libzmq consumes this leading frame to pick the destination
            // peer and strips it before delivery, so the body below still
            // arrives at the peer with its usual frame count.
            transport::send_more(&self.socket, msg.get(crate::message::Part::Sockid))?;
        }

        transport::send_more(&self.socket, msg.get(crate::message::Part::Sockid))?;

        transport::send_more(&self.socket, b"")?;
        transport::send_more(&self.socket, msg.get(crate::message::Part::Header))?;

        transport::send_more(&self.socket, b"")?;
        transport::send_more(&self.socket, msg.get(crate::message::Part::Content))?;

        transport::send_more(&self.socket, b"")?;
        let meta = crate::message::Meta::new(self.kind.wire_byte(), DEFAULT_TTL);
        msg.set_meta(meta);
        transport::send_last(&self.socket, &meta.to_bytes())?;

        Ok(())
    }

    /// Reads a frame group back into `msg`, replacing any meta it already
    /// carried. `flags` propagates straight to the underlying transport
    /// receive, same as the C original's `flags` parameter. On a framing
    /// error the in-flight message is drained so a subsequent `recvmsg`
    /// starts clean.
    pub fn recvmsg(&mut self, msg: &mut Message, flags: i32) -> Result<()> {
        let sockid = match self.kind {
            // On a Node-typed socket, an envelope frame precedes the real
            // sockid frame; it is read then discarded, overwritten by the
            // next read. Preserved for wire compatibility.
            NodeKind::Node => {
                let _envelope = transport::recv_expect_more(&self.socket, flags)?;
                transport::recv_expect_more(&self.socket, flags)?
            }
            // A ROUTER socket has libzmq prepend the sending peer's own
            // identity ahead of its application frames; that's the one
            // worth keeping as the addressing sockid, so the peer's own
            // (usually empty) sockid frame is discarded instead.
            NodeKind::Router => {
                let identity = transport::recv_expect_more(&self.socket, flags)?;
                let _peer_sockid = transport::recv_expect_more(&self.socket, flags)?;
                identity
            }
            NodeKind::Sub | NodeKind::Pub | NodeKind::Dealer => {
                transport::recv_expect_more(&self.socket, flags)?
            }
        };

        let _sep = transport::recv_expect_more(&self.socket, flags)?;
        let header = transport::recv_expect_more(&self.socket, flags)?;

        let _sep = transport::recv_expect_more(&self.socket, flags)?;
        let content = transport::recv_expect_more(&self.socket, flags)?;

        let _sep = transport::recv_expect_more(&self.socket, flags)?;
        let meta_bytes = transport::recv_expect_last(&self.socket, flags)?;
        let meta = crate::message::Meta::from_bytes(&meta_bytes)?;

        *msg.get_mut(crate::message::Part::Sockid) = sockid;
        *msg.get_mut(crate::message::Part::Header) = header;
        *msg.get_mut(crate::message::Part::Content) = content;
        msg.set_meta(meta);

        Ok(())
    }

    /// Polls for readability with `timeout_ms` before delegating to
    /// [`Node::recvmsg`]; returns [`Error::Timeout`] if nothing arrives.
    pub fn recvmsg_timeout(
        &mut self,
        msg: &mut Message,
        flags: i32,
        timeout_ms: i64,
    ) -> Result<()> {
        if !transport::poll_one(&self.socket, zmq::POLLIN, timeout_ms)? {
            return Err(Error::Timeout);
        }
        self.recvmsg(msg, flags)
    }

    /// Registers a single one-shot asynchronous-receive callback. A
    /// `timeout_ms` of `0` means wait forever; otherwise the deadline is
    /// `now + timeout_ms / 1000` seconds, integer division, matching the
    /// original's `time(NULL) + timeout/1000`. [`Node::drive_async`] is
    /// the unit of work an external poll loop would call to service this
    /// registration; there is no background thread here.
    pub fn recvmsg_async<F>(&mut self, timeout_ms: u64, cb: F)
    where
        F: FnMut(&mut Node, RecvOutcome) + 'static,
    {
        let deadline = if timeout_ms == 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_secs(timeout_ms / 1000))
        };
        self.recv_async = Some(AsyncRecv {
            callback: Box::new(cb),
            deadline,
        });
    }

    /// Services one tick of the asynchronous-receive registration, if
    /// any: fires the callback with a timeout indication if the deadline
    /// has passed, or with the message if one is ready. Clears the
    /// registration in either case. Returns `true` if the callback fired.
    pub fn drive_async(&mut self) -> Result<bool> {
        let has_deadline_passed = self
            .recv_async
            .as_ref()
            .and_then(|r| r.deadline)
            .is_some_and(|d| Instant::now() >= d);

        if has_deadline_passed {
            let mut reg = self.recv_async.take().expect("checked above");
            (reg.callback)(self, RecvOutcome::TimedOut);
            return Ok(true);
        }

        if self.recv_async.is_none() {
            return Ok(false);
        }

        if !transport::poll_one(&self.socket, zmq::POLLIN, 0)? {
            return Ok(false);
        }

        let mut msg = Message::init();
        self.recvmsg(&mut msg, 0)?;
        let mut reg = self.recv_async.take().expect("checked above");
        (reg.callback)(self, RecvOutcome::Message(msg));
        Ok(true)
    }

    /// Returns the node to a pristine, `(is_bind=false, is_connect=false)`
    /// state before a pool caches it for reuse: disconnects if connected
    /// (emitting UNREGISTER for a `Node`-kind socket), unbinds if bound,
    /// and clears identity, keepalive, user data, and the async-receive
    /// registration. Mirrors the original's pool-may-reset branch.
    pub(crate) fn reset_for_pool(&mut self) -> Result<()> {
        if self.is_connect {
            self.disconnect()?;
        }
        if self.is_bind {
            self.unbind()?;
        }
        self.sockid.clear();
        self.alive_interval = None;
        self.alive_deadline = None;
        self.user_data = None;
        self.recv_async = None;
        self.links = PoolLinks::default();
        Ok(())
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if self.is_connect {
            if let Err(e) = self.disconnect() {
                log::warn!("[{:?}] disconnect on drop failed: {}", self.id, e);
            }
        }
        if self.is_bind {
            if let Err(e) = self.unbind() {
                log::warn!("[{:?}] unbind on drop failed: {}", self.id, e);
            }
        }
    }
}
