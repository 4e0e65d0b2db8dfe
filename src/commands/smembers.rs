use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns every member of the set, in byte order.
///
/// Ref: <https://redis.io/docs/latest/commands/smembers/>
#[derive(Debug, PartialEq)]
pub struct Smembers {
    pub key: Bytes,
}

impl Executable for Smembers {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let members = store.set(&self.key)?.members()?;
        Ok(Frame::Array(members.into_iter().map(Frame::Bulk).collect()))
    }
}

impl TryFrom<&mut CommandParser> for Smembers {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
