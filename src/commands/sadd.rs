use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Adds the members to the set stored at `key`. Returns how many were not already present.
///
/// Ref: <https://redis.io/docs/latest/commands/sadd/>
#[derive(Debug, PartialEq)]
pub struct Sadd {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl Executable for Sadd {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.set(&self.key)?.add(&self.members)?))
    }
}

impl TryFrom<&mut CommandParser> for Sadd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let members = parser.next_bytes_list()?;
        Ok(Self { key, members })
    }
}
