use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{resolve_range, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Trims the list so that it only contains the elements between `start` and `stop`, with the
/// same position rules as `LRANGE`. An empty window removes the key.
///
/// Ref: <https://redis.io/docs/latest/commands/ltrim/>
#[derive(Debug, PartialEq)]
pub struct Ltrim {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl Executable for Ltrim {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let list = store.list(&self.key)?;
        match resolve_range(self.start, self.stop, list.len()) {
            Some((start, stop)) => {
                list.trim(start, stop)?;
            }
            None => {
                list.clear()?;
            }
        }
        Ok(Frame::ok())
    }
}

impl TryFrom<&mut CommandParser> for Ltrim {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;
        Ok(Self { key, start, stop })
    }
}
