use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns how many of the given keys exist. A key mentioned twice is counted twice.
///
/// Ref: <https://redis.io/commands/exists>
#[derive(Debug, PartialEq)]
pub struct Exists {
    pub keys: Vec<Bytes>,
}

impl Executable for Exists {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut count = 0;
        for key in &self.keys {
            if store.exists(key)? {
                count += 1;
            }
        }
        Ok(Frame::Integer(count))
    }
}

impl TryFrom<&mut CommandParser> for Exists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.next_bytes_list()?;
        Ok(Self { keys })
    }
}
