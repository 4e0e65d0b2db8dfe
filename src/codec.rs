use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::frame::{self, Frame};
use crate::Error;

/// Largest request buffered while waiting for a frame to complete.
pub const MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Splits a byte stream into RESP frames and writes replies back.
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new() -> FrameCodec {
        FrameCodec {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> FrameCodec {
        FrameCodec { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => {
                if src.len() > self.max_frame_size {
                    return Err(format!(
                        "protocol error; frame larger than {} bytes",
                        self.max_frame_size
                    )
                    .into());
                }
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let position = cursor.position() as usize;
        trace!(bytes = position, "decoded frame");

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}
