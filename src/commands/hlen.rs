use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the number of fields in the hash stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/hlen/>
#[derive(Debug, PartialEq)]
pub struct Hlen {
    pub key: Bytes,
}

impl Executable for Hlen {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.hash(&self.key)?.len()))
    }
}

impl TryFrom<&mut CommandParser> for Hlen {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
