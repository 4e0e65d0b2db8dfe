use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{score_window, CommandParser, ScoreBound};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes every member whose score lies between `min` and `max`, with the bound syntax of
/// `ZRANGEBYSCORE`. Returns how many were removed.
///
/// Ref: <https://redis.io/docs/latest/commands/zremrangebyscore/>
#[derive(Debug, PartialEq)]
pub struct ZremRangeByScore {
    pub key: Bytes,
    pub min: ScoreBound,
    pub max: ScoreBound,
}

impl Executable for ZremRangeByScore {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let zset = store.sorted_set(&self.key)?;
        let removed = match score_window(self.min, self.max) {
            Some((min, max)) => zset.remove_by_score(min, max)?,
            None => 0,
        };
        Ok(Frame::Integer(removed))
    }
}

impl TryFrom<&mut CommandParser> for ZremRangeByScore {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let min = parser.next_score_bound()?;
        let max = parser.next_score_bound()?;
        Ok(Self { key, min, max })
    }
}
