// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use std::mem;

use crate::constants::META_NAME_SIZE;
use crate::error::{Error, Result};

/// Names the three buffers a caller can reach through [`Message::get`].
/// Replaces a string-dispatched accessor with a tagged one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Sockid,
    Header,
    Content,
}

/// The fixed trailer appended to every sent message and populated by every
/// successful receive. Never constructed by application code directly —
/// callers read it via [`Message::meta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub node_type: u8,
    pub ttl: u8,
    name: [u8; META_NAME_SIZE],
}

impl Meta {
    pub(crate) fn new(node_type: u8, ttl: u8) -> Meta {
        Meta {
            node_type,
            ttl,
            name: [0u8; META_NAME_SIZE],
        }
    }

    /// The `name` field, trimmed at the first zero byte.
    pub fn name(&self) -> &str {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(META_NAME_SIZE);
        std::str::from_utf8(&self.name[..end]).unwrap_or("")
    }

    pub(crate) fn to_bytes(self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(crate::constants::META_SIZE);
        buf.push(self.node_type);
        buf.push(self.ttl);
        buf.extend_from_slice(&self.name);
        buf
    }

    pub(crate) fn from_bytes(buf: &[u8]) -> Result<Meta> {
        if buf.len() != crate::constants::META_SIZE {
            return Err(Error::MetaSize { got: buf.len() });
        }
        let mut name = [0u8; META_NAME_SIZE];
        name.copy_from_slice(&buf[2..]);
        Ok(Meta {
            node_type: buf[0],
            ttl: buf[1],
            name,
        })
    }
}

/// Four owned buffers: an addressing frame, an opaque header, an opaque
/// payload, and a fixed meta trailer that is absent until a receive
/// populates it (or a send synthesizes one).
#[derive(Debug, Clone, Default)]
pub struct Message {
    sockid: Vec<u8>,
    header: Vec<u8>,
    content: Vec<u8>,
    meta: Option<Meta>,
}

impl Message {
    /// Zeroes the message: three empty buffers, no meta.
    pub fn init() -> Message {
        Message::default()
    }

    /// Populates the three main buffers from the given sources. A `None`
    /// source is treated as empty, same as a null source in the C
    /// original — Rust slices always carry an explicit length, so there is
    /// no `-1`-means-strlen sentinel to preserve.
    pub fn init_data(
        sockid: Option<&[u8]>,
        header: Option<&[u8]>,
        content: Option<&[u8]>,
    ) -> Message {
        Message {
            sockid: sockid.map(|b| b.to_vec()).unwrap_or_default(),
            header: header.map(|b| b.to_vec()).unwrap_or_default(),
            content: content.map(|b| b.to_vec()).unwrap_or_default(),
            meta: None,
        }
    }

    /// Releases the three buffers and drops any meta. Idempotent: after
    /// `close`, `meta()` is `None`.
    pub fn close(&mut self) {
        self.sockid.clear();
        self.header.clear();
        self.content.clear();
        self.meta = None;
    }

    /// Transfers all four parts from `src` into `self` without copying.
    /// `src` is left as three empty buffers with no meta.
    ///
    /// # Panics
    /// Panics if `self` already carries a meta trailer — matching the
    /// precondition of the original `spdnet_msg_move`.
    pub fn move_from(&mut self, src: &mut Message) {
        assert!(self.meta.is_none(), "move_from: destination already has meta");
        *self = mem::take(src);
    }

    /// Deep-copies every part of `src` into `self`.
    pub fn copy_from(&mut self, src: &Message) {
        *self = src.clone();
    }

    /// Borrows one of the three main buffers.
    pub fn get(&self, part: Part) -> &[u8] {
        match part {
            Part::Sockid => &self.sockid,
            Part::Header => &self.header,
            Part::Content => &self.content,
        }
    }

    /// Mutably borrows one of the three main buffers.
    pub fn get_mut(&mut self, part: Part) -> &mut Vec<u8> {
        match part {
            Part::Sockid => &mut self.sockid,
            Part::Header => &mut self.header,
            Part::Content => &mut self.content,
        }
    }

    pub fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    pub(crate) fn set_meta(&mut self, meta: Meta) {
        self.meta = Some(meta);
    }

    /// The meta trailer's `name` field.
    ///
    /// # Panics
    /// Panics if no meta is present — a message only carries one after a
    /// successful receive, or once a send has synthesized one.
    pub fn name(&self) -> &str {
        self.meta
            .as_ref()
            .expect("Message::name: no meta present")
            .name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_gives_three_empty_buffers_and_no_meta() {
        let msg = Message::init();
        assert!(msg.get(Part::Sockid).is_empty());
        assert!(msg.get(Part::Header).is_empty());
        assert!(msg.get(Part::Content).is_empty());
        assert!(msg.meta().is_none());
    }

    #[test]
    fn init_data_treats_none_as_empty() {
        let msg = Message::init_data(Some(b"id"), None, Some(b"body"));
        assert_eq!(msg.get(Part::Sockid), b"id");
        assert!(msg.get(Part::Header).is_empty());
        assert_eq!(msg.get(Part::Content), b"body");
    }

    #[test]
    fn close_drops_meta() {
        let mut msg = Message::init_data(Some(b"id"), Some(b"h"), Some(b"c"));
        msg.set_meta(Meta::new(1, 10));
        msg.close();
        assert!(msg.meta().is_none());
        assert!(msg.get(Part::Sockid).is_empty());
    }

    #[test]
    fn move_from_empties_the_source() {
        let mut src = Message::init_data(Some(b"id"), Some(b"h"), Some(b"c"));
        src.set_meta(Meta::new(1, 10));
        let mut dst = Message::init();

        dst.move_from(&mut src);

        assert_eq!(dst.get(Part::Sockid), b"id");
        assert_eq!(dst.meta().unwrap().node_type, 1);
        assert!(src.get(Part::Sockid).is_empty());
        assert!(src.get(Part::Header).is_empty());
        assert!(src.get(Part::Content).is_empty());
        assert!(src.meta().is_none());
    }

    #[test]
    #[should_panic]
    fn move_from_panics_if_destination_has_meta() {
        let mut src = Message::init();
        let mut dst = Message::init();
        dst.set_meta(Meta::new(1, 10));

        dst.move_from(&mut src);
    }

    #[test]
    fn copy_from_is_a_deep_copy() {
        let mut src = Message::init_data(Some(b"id"), Some(b"h"), Some(b"c"));
        src.set_meta(Meta::new(2, 10));
        let mut dst = Message::init();

        dst.copy_from(&src);

        assert_eq!(dst.get(Part::Sockid), src.get(Part::Sockid));
        assert_eq!(dst.get(Part::Header), src.get(Part::Header));
        assert_eq!(dst.get(Part::Content), src.get(Part::Content));
        assert_eq!(dst.meta().unwrap().node_type, src.meta().unwrap().node_type);

        // and it really is a copy, not a shared buffer
        dst.get_mut(Part::Sockid).push(b'!');
        assert_ne!(dst.get(Part::Sockid), src.get(Part::Sockid));
    }

    #[test]
    fn meta_round_trips_through_bytes() {
        let mut meta = Meta::new(3, 10);
        meta.ttl = 9;
        let bytes = meta.to_bytes();
        let back = Meta::from_bytes(&bytes).unwrap();
        assert_eq!(back.node_type, 3);
        assert_eq!(back.ttl, 9);
    }

    #[test]
    fn meta_from_bytes_rejects_wrong_size() {
        let err = Meta::from_bytes(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, Error::MetaSize { got: 4 }));
    }

    #[test]
    #[should_panic]
    fn name_panics_without_meta() {
        let msg = Message::init();
        let _ = msg.name();
    }
}
