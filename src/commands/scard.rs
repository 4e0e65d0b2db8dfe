use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the number of members of the set stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/scard/>
#[derive(Debug, PartialEq)]
pub struct Scard {
    pub key: Bytes,
}

impl Executable for Scard {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.set(&self.key)?.len()))
    }
}

impl TryFrom<&mut CommandParser> for Scard {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
