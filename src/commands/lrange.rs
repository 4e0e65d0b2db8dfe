use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{resolve_range, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the elements between `start` and `stop`, both inclusive. Negative positions count
/// back from the tail. Out of range positions are clamped rather than reported.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Debug, PartialEq)]
pub struct Lrange {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl Executable for Lrange {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let list = store.list(&self.key)?;
        let Some((start, stop)) = resolve_range(self.start, self.stop, list.len()) else {
            return Ok(Frame::Array(vec![]));
        };

        let values = list.range(start, stop)?;
        Ok(Frame::Array(values.into_iter().map(Frame::Bulk).collect()))
    }
}

impl TryFrom<&mut CommandParser> for Lrange {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;
        Ok(Self { key, start, stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{bulks, run};

    #[test]
    fn push_pop_scenario() {
        let store = Store::default();

        run(&store, &["RPUSH", "L", "a", "b", "c"]);
        run(&store, &["LPOP", "L"]);
        assert_eq!(run(&store, &["LLEN", "L"]), Frame::Integer(2));
        run(&store, &["LPUSH", "L", "z"]);

        assert_eq!(
            run(&store, &["LRANGE", "L", "0", "-1"]),
            bulks(&["z", "b", "c"])
        );
    }

    #[test]
    fn windows() {
        let store = Store::default();
        run(&store, &["RPUSH", "l", "a", "b", "c", "d"]);

        assert_eq!(run(&store, &["LRANGE", "l", "1", "2"]), bulks(&["b", "c"]));
        assert_eq!(run(&store, &["LRANGE", "l", "-2", "100"]), bulks(&["c", "d"]));
        assert_eq!(run(&store, &["LRANGE", "l", "3", "1"]), bulks(&[]));
        assert_eq!(run(&store, &["LRANGE", "missing", "0", "-1"]), bulks(&[]));
    }
}
