use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes the given members. Returns how many were present.
///
/// Ref: <https://redis.io/docs/latest/commands/zrem/>
#[derive(Debug, PartialEq)]
pub struct Zrem {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl Executable for Zrem {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let removed = store.sorted_set(&self.key)?.remove(&self.members)?;
        Ok(Frame::Integer(removed))
    }
}

impl TryFrom<&mut CommandParser> for Zrem {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let members = parser.next_bytes_list()?;
        Ok(Self { key, members })
    }
}
