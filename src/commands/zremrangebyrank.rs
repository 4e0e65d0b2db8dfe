use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{resolve_range, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes the members at positions `start..=stop` in ascending score order. Returns how many
/// were removed.
///
/// Ref: <https://redis.io/docs/latest/commands/zremrangebyrank/>
#[derive(Debug, PartialEq)]
pub struct ZremRangeByRank {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl Executable for ZremRangeByRank {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let zset = store.sorted_set(&self.key)?;
        let removed = match resolve_range(self.start, self.stop, zset.len()) {
            Some((start, stop)) => zset.remove_by_index(start, stop)?,
            None => 0,
        };
        Ok(Frame::Integer(removed))
    }
}

impl TryFrom<&mut CommandParser> for ZremRangeByRank {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;
        Ok(Self { key, start, stop })
    }
}
