use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns 1 when `member` belongs to the set stored at `key`, 0 otherwise.
///
/// Ref: <https://redis.io/docs/latest/commands/sismember/>
#[derive(Debug, PartialEq)]
pub struct Sismember {
    pub key: Bytes,
    pub member: Bytes,
}

impl Executable for Sismember {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let contains = store.set(&self.key)?.contains(&self.member)?;
        Ok(Frame::Integer(contains as i64))
    }
}

impl TryFrom<&mut CommandParser> for Sismember {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let member = parser.next_bytes()?;
        Ok(Self { key, member })
    }
}
