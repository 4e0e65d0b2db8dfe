use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::structures::list::Side;
use crate::Error;

/// `LPOP` and `RPOP`: remove and return the first (or last) element of the list. With a
/// `count`, up to `count` elements are returned as an array.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct Pop {
    pub key: Bytes,
    pub count: Option<i64>,
    pub side: Side,
}

impl Pop {
    pub(crate) fn parse(parser: &mut CommandParser, side: Side) -> Result<Self, Error> {
        let key = parser.next_bytes()?;
        let count = match parser.has_next() {
            true => {
                let count = parser.next_integer()?;
                if count < 0 {
                    return Err(parser.invalid_argument(count.to_string()).into());
                }
                Some(count)
            }
            false => None,
        };

        Ok(Self { key, count, side })
    }
}

impl Executable for Pop {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let list = store.list(&self.key)?;

        let Some(count) = self.count else {
            return Ok(Frame::optional(list.pop(self.side)?));
        };

        if list.is_empty() {
            return Ok(Frame::Null);
        }
        let mut values = vec![];
        for _ in 0..count {
            match list.pop(self.side)? {
                Some(value) => values.push(Frame::Bulk(value)),
                None => break,
            }
        }
        Ok(Frame::Array(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{bulk, bulks, run};

    #[test]
    fn pops_from_both_ends() {
        let store = Store::default();
        run(&store, &["RPUSH", "l", "a", "b", "c"]);

        assert_eq!(run(&store, &["LPOP", "l"]), bulk("a"));
        assert_eq!(run(&store, &["RPOP", "l"]), bulk("c"));
        assert_eq!(run(&store, &["LLEN", "l"]), Frame::Integer(1));
    }

    #[test]
    fn missing_list() {
        let store = Store::default();

        assert_eq!(run(&store, &["LPOP", "l"]), Frame::Null);
        assert_eq!(run(&store, &["LPOP", "l", "2"]), Frame::Null);
    }

    #[test]
    fn with_count() {
        let store = Store::default();
        run(&store, &["RPUSH", "l", "a", "b", "c"]);

        assert_eq!(run(&store, &["RPOP", "l", "2"]), bulks(&["c", "b"]));
        assert_eq!(run(&store, &["LPOP", "l", "5"]), bulks(&["a"]));
        assert_eq!(run(&store, &["EXISTS", "l"]), Frame::Integer(0));
    }
}
