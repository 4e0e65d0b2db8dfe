use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes the members from the set. Returns how many were present.
///
/// Ref: <https://redis.io/docs/latest/commands/srem/>
#[derive(Debug, PartialEq)]
pub struct Srem {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl Executable for Srem {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.set(&self.key)?.remove(&self.members)?))
    }
}

impl TryFrom<&mut CommandParser> for Srem {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let members = parser.next_bytes_list()?;
        Ok(Self { key, members })
    }
}
