use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns 1 when `field` exists in the hash stored at `key`, 0 otherwise.
///
/// Ref: <https://redis.io/docs/latest/commands/hexists/>
#[derive(Debug, PartialEq)]
pub struct Hexists {
    pub key: Bytes,
    pub field: Bytes,
}

impl Executable for Hexists {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let exists = store.hash(&self.key)?.exists(&self.field)?;
        Ok(Frame::Integer(exists as i64))
    }
}

impl TryFrom<&mut CommandParser> for Hexists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let field = parser.next_bytes()?;
        Ok(Self { key, field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;

    #[test]
    fn reports_presence() {
        let store = Store::default();
        run(&store, &["HSET", "h", "a", "1"]);

        assert_eq!(run(&store, &["HEXISTS", "h", "a"]), Frame::Integer(1));
        assert_eq!(run(&store, &["HEXISTS", "h", "b"]), Frame::Integer(0));
    }
}
