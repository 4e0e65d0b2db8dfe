use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{resolve_range, scored_reply, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// `ZRANGE` and `ZREVRANGE`: the members at positions `start..=stop`, ordered by score
/// ascending (or descending). Negative positions count back from the end.
///
/// Ref: <https://redis.io/docs/latest/commands/zrange/>
#[derive(Debug, PartialEq)]
pub struct Zrange {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
    pub descending: bool,
    pub with_scores: bool,
}

impl Zrange {
    pub(crate) fn parse(parser: &mut CommandParser, descending: bool) -> Result<Self, Error> {
        let key = parser.next_bytes()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;

        let with_scores = match parser.next_keyword()?.as_deref() {
            None => false,
            Some("withscores") => true,
            Some(_) => return Err(CommandParserError::Syntax.into()),
        };

        Ok(Self {
            key,
            start,
            stop,
            descending,
            with_scores,
        })
    }
}

impl Executable for Zrange {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let zset = store.sorted_set(&self.key)?;
        let Some((start, stop)) = resolve_range(self.start, self.stop, zset.len()) else {
            return Ok(Frame::Array(vec![]));
        };

        let members = zset.range_by_index(self.descending, start, stop)?;
        Ok(scored_reply(members, self.with_scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{bulks, parse, request, run};
    use crate::commands::Command;

    #[test]
    fn parse_options() {
        assert_eq!(
            parse(&["ZREVRANGE", "z", "0", "-1", "WithScores"]),
            Command::Zrange(Zrange {
                key: Bytes::from("z"),
                start: 0,
                stop: -1,
                descending: true,
                with_scores: true,
            })
        );
        assert!(Command::try_from(request(&["ZRANGE", "z", "0", "1", "LIMIT"])).is_err());
    }

    #[test]
    fn ordered_by_score() {
        let store = Store::default();
        run(&store, &["ZADD", "z", "10", "x", "5", "y"]);

        assert_eq!(run(&store, &["ZRANGE", "z", "0", "-1"]), bulks(&["y", "x"]));
        assert_eq!(
            run(&store, &["ZRANGE", "z", "0", "-1", "WITHSCORES"]),
            bulks(&["y", "5", "x", "10"])
        );
        assert_eq!(run(&store, &["ZREVRANGE", "z", "0", "0"]), bulks(&["x"]));
        assert_eq!(run(&store, &["ZRANGE", "z", "5", "9"]), bulks(&[]));
    }
}
