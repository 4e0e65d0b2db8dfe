use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the number of members of the sorted set, 0 when it does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/zcard/>
#[derive(Debug, PartialEq)]
pub struct Zcard {
    pub key: Bytes,
}

impl Executable for Zcard {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.sorted_set(&self.key)?.len()))
    }
}

impl TryFrom<&mut CommandParser> for Zcard {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
