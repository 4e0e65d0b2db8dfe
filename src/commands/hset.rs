use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// `HSET` and the older `HMSET`: sets every `field value` pair of the hash stored at `key`.
/// `HSET` replies with the number of fields that were added, `HMSET` with OK.
///
/// Ref: <https://redis.io/docs/latest/commands/hset/>
#[derive(Debug, PartialEq)]
pub struct Hset {
    pub key: Bytes,
    pub pairs: Vec<(Bytes, Bytes)>,
    pub reply_ok: bool,
}

impl Hset {
    pub(crate) fn parse(parser: &mut CommandParser, reply_ok: bool) -> Result<Self, Error> {
        let key = parser.next_bytes()?;
        let pairs = parser.next_pairs()?;
        Ok(Self {
            key,
            pairs,
            reply_ok,
        })
    }
}

impl Executable for Hset {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let added = store.hash(&self.key)?.set(&self.pairs)?;
        if self.reply_ok {
            return Ok(Frame::ok());
        }
        Ok(Frame::Integer(added))
    }
}
