use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the length of the list stored at `key`, 0 when it does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/llen/>
#[derive(Debug, PartialEq)]
pub struct Llen {
    pub key: Bytes,
}

impl Executable for Llen {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.list(&self.key)?.len()))
    }
}

impl TryFrom<&mut CommandParser> for Llen {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
