use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the values of the given fields, nil for every field that does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/hmget/>
#[derive(Debug, PartialEq)]
pub struct Hmget {
    pub key: Bytes,
    pub fields: Vec<Bytes>,
}

impl Executable for Hmget {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let values = store.hash(&self.key)?.get_many(&self.fields)?;
        Ok(Frame::Array(values.into_iter().map(Frame::optional).collect()))
    }
}

impl TryFrom<&mut CommandParser> for Hmget {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let fields = parser.next_bytes_list()?;
        Ok(Self { key, fields })
    }
}
