use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ClientError, Result};

/// Codec for the line protocol: command lines out, response frames in.
///
/// There is no length prefix: a frame ends at the first `\n`, and the
/// payload never contains one. A frame may arrive split across any number
/// of reads. Frames are yielded as raw bytes with only the `\n` removed.
#[derive(Debug)]
pub struct LineCodec {
    max_frame_bytes: usize,
    /// Bytes of the buffer already searched for a newline.
    next_index: usize,
}

impl LineCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            next_index: 0,
        }
    }
}

impl Decoder for LineCodec {
    type Item = BytesMut;
    type Error = ClientError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<BytesMut>> {
        let found = buf[self.next_index..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| self.next_index + i);
        let frame_len = found.unwrap_or(buf.len());
        if frame_len > self.max_frame_bytes {
            buf.clear();
            self.next_index = 0;
            return Err(ClientError::FrameTooLarge {
                size: frame_len,
                max: self.max_frame_bytes,
            });
        }

        match found {
            Some(newline) => {
                self.next_index = 0;
                let mut frame = buf.split_to(newline + 1);
                frame.truncate(newline);
                Ok(Some(frame))
            }
            None => {
                self.next_index = buf.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<BytesMut>> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() => Ok(None),
            None => Err(ClientError::ConnectionClosed {
                buffered: buf.len(),
            }),
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ClientError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(line.len());
        dst.put_slice(line.as_bytes());
        Ok(())
    }
}

/// Text of a decoded frame. Bytes that are not UTF-8 are a protocol error
/// carrying the lossy text.
pub fn frame_text(frame: BytesMut) -> Result<String> {
    String::from_utf8(frame.to_vec())
        .map_err(|e| ClientError::protocol(&String::from_utf8_lossy(e.as_bytes())))
}
