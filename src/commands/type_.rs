use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the string representation of the type of the value stored at `key`: `string`,
/// `list`, `zset`, `hash` or `set`. If the key does not exist, `none` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/type/>
#[derive(Debug, PartialEq)]
pub struct Type {
    pub key: Bytes,
}

impl Executable for Type {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let type_ = store
            .key_type(&self.key)?
            .map_or("none", |key_type| key_type.as_str());

        Ok(Frame::Simple(type_.to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Type {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
