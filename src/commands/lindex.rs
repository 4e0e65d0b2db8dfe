use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the element at `index`. Negative indices count back from the tail, so `-1` is the
/// last element.
///
/// Ref: <https://redis.io/docs/latest/commands/lindex/>
#[derive(Debug, PartialEq)]
pub struct Lindex {
    pub key: Bytes,
    pub index: i64,
}

impl Executable for Lindex {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let list = store.list(&self.key)?;
        let index = match self.index {
            i if i < 0 => list.len() + i,
            i => i,
        };
        Ok(Frame::optional(list.index(index)?))
    }
}

impl TryFrom<&mut CommandParser> for Lindex {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let index = parser.next_integer()?;
        Ok(Self { key, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{bulk, run};

    #[test]
    fn positive_and_negative_indices() {
        let store = Store::default();
        run(&store, &["RPUSH", "l", "a", "b", "c"]);

        assert_eq!(run(&store, &["LINDEX", "l", "0"]), bulk("a"));
        assert_eq!(run(&store, &["LINDEX", "l", "-1"]), bulk("c"));
        assert_eq!(run(&store, &["LINDEX", "l", "3"]), Frame::Null);
        assert_eq!(run(&store, &["LINDEX", "l", "-4"]), Frame::Null);
    }
}
