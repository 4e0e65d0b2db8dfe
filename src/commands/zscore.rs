use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the score of `member`, or nil when the member or the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/zscore/>
#[derive(Debug, PartialEq)]
pub struct Zscore {
    pub key: Bytes,
    pub member: Bytes,
}

impl Executable for Zscore {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let score = store.sorted_set(&self.key)?.score(&self.member)?;
        Ok(Frame::optional(score.map(|score| Bytes::from(score.to_string()))))
    }
}

impl TryFrom<&mut CommandParser> for Zscore {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let member = parser.next_bytes()?;
        Ok(Self { key, member })
    }
}
