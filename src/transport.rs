// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

//! Thin wrapper over [`zmq::Socket`]'s multi-part send/recv primitives.
//! Only [`crate::Node`] calls these directly.

use crate::error::{Error, Result};

/// Sends `data` as one frame of a larger group, with more frames to follow.
pub(crate) fn send_more(socket: &zmq::Socket, data: &[u8]) -> Result<()> {
    socket.send(data, zmq::SNDMORE).map_err(Error::from)
}

/// Sends `data` as the final frame of a group.
pub(crate) fn send_last(socket: &zmq::Socket, data: &[u8]) -> Result<()> {
    socket.send(data, 0).map_err(Error::from)
}

/// Reads one frame and asserts more frames are expected to follow. A
/// frame group that ends early is a framing error; unlike
/// [`recv_expect_last`], this does *not* drain the socket — the C
/// original only drains on the final-frame check, and this shape is kept
/// for wire compatibility. `flags` propagates straight to the underlying
/// `recv`, same as the C original's `z_recv_more`.
pub(crate) fn recv_expect_more(socket: &zmq::Socket, flags: i32) -> Result<Vec<u8>> {
    let msg = socket.recv_msg(flags)?;
    if !socket.get_rcvmore()? {
        return Err(Error::Framing("expected more frames, but group ended"));
    }
    Ok(msg.to_vec())
}

/// Reads one frame and asserts it is the last of the group. If the peer
/// sent a frame beyond this one (the "more" flag is still set), the
/// remainder of the group is drained before returning the error.
pub(crate) fn recv_expect_last(socket: &zmq::Socket, flags: i32) -> Result<Vec<u8>> {
    let msg = socket.recv_msg(flags)?;
    if socket.get_rcvmore()? {
        drain(socket);
        return Err(Error::Framing("expected last frame, but group continued"));
    }
    Ok(msg.to_vec())
}

/// Discards every remaining frame of the message currently in flight.
/// Used to recover from a partial/mismatched multi-frame receive.
pub(crate) fn drain(socket: &zmq::Socket) {
    while socket.get_rcvmore().unwrap_or(false) {
        if socket.recv_msg(0).is_err() {
            break;
        }
    }
}

/// Polls a single socket for the given event mask, returning whether it
/// became ready within `timeout_ms` (`-1` blocks forever, `0` never
/// blocks).
pub(crate) fn poll_one(socket: &zmq::Socket, events: i16, timeout_ms: i64) -> Result<bool> {
    let mut items = [socket.as_poll_item(events)];
    let n = zmq::poll(&mut items, timeout_ms)?;
    Ok(n == 1)
}
