// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use crate::constants::META_SIZE;

/// Errors a caller can recover from. Precondition violations (bind while
/// bound, `set_filter` on a non-`Sub` node, `expose` with no identity) are
/// programmer errors and are asserted at the call site instead of being
/// represented here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame group ended early, or the final frame unexpectedly carried
    /// the "more" flag. The remainder of the in-flight message has already
    /// been drained from the socket.
    #[error("framing error: {0}")]
    Framing(&'static str),

    /// The meta trailer did not carry exactly [`META_SIZE`] bytes.
    #[error("meta frame was {got} bytes, expected {META_SIZE}")]
    MetaSize { got: usize },

    /// `recvmsg_timeout` found nothing readable within the deadline.
    #[error("receive timed out")]
    Timeout,

    /// Passed through from the underlying transport.
    #[error(transparent)]
    Transport(#[from] zmq::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Renders the library message for library-defined variants, or
    /// delegates to the transport's own renderer otherwise. Mirrors the
    /// `strerror` entry in the embedding API surface.
    pub fn strerror(&self) -> String {
        self.to_string()
    }
}
