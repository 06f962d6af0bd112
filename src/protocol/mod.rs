//! Wire protocol of the ANN index server.
//!
//! One ASCII command line per request, one newline-terminated response
//! frame per command. There is no length prefix, no request id and no
//! version handshake, so a connection carries exactly one request at a time.

pub mod command;
pub mod frame;
pub mod response;

pub use command::Command;
pub use frame::{frame_text, LineCodec};
pub use response::{classify, decode_batch, decode_ids, decode_memory, expect_ok, Reply};
