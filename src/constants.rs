// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

//! Wire-level constants. The verb byte strings and frame sizes here are
//! part of the on-the-wire contract: changing them breaks compatibility
//! with any peer built against an earlier version of this crate.

/// Maximum length, in bytes, of a node identity / sockid frame.
pub const SOCKID_SIZE: usize = 64;

/// Addressing frame used by control messages, which have no destination.
pub const SOCKID_NONE: &[u8] = b"NONE";

/// Lower bound on the keepalive interval a caller may request via
/// [`crate::Node::set_alive`].
pub const MIN_ALIVE_INTERVAL_SECS: u64 = 5;

/// Keepalive interval applied automatically when a `Node` of kind
/// [`crate::NodeKind::Node`] connects, before any explicit `set_alive` call.
pub const DEFAULT_ALIVE_INTERVAL_SECS: u64 = 30;

/// Fixed size of the `name` field inside the meta trailer.
pub const META_NAME_SIZE: usize = 32;

/// Total wire size of the meta trailer: `node_type` (1) + `ttl` (1) + name.
pub const META_SIZE: usize = 2 + META_NAME_SIZE;

/// TTL stamped into every meta trailer on send.
pub const DEFAULT_TTL: u8 = 10;

pub const REGISTER_VERB: &[u8] = b"snd\0rgstr";
pub const UNREGISTER_VERB: &[u8] = b"snd\0urgstr";
pub const EXPOSE_VERB: &[u8] = b"snd\0expose";
pub const ALIVE_VERB: &[u8] = b"snd\0alive";

/// linger applied to every socket at creation, in milliseconds.
pub const LINGER_MS: i32 = 1000;
