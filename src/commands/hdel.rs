use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes the given fields. Returns how many existed.
///
/// Ref: <https://redis.io/docs/latest/commands/hdel/>
#[derive(Debug, PartialEq)]
pub struct Hdel {
    pub key: Bytes,
    pub fields: Vec<Bytes>,
}

impl Executable for Hdel {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.hash(&self.key)?.remove(&self.fields)?))
    }
}

impl TryFrom<&mut CommandParser> for Hdel {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let fields = parser.next_bytes_list()?;
        Ok(Self { key, fields })
    }
}
