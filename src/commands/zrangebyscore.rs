use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{
    score_window, scored_reply, CommandParser, CommandParserError, ScoreBound,
};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// `ZRANGEBYSCORE key min max` and `ZREVRANGEBYSCORE key max min`: the members whose score lies
/// between the bounds, which are inclusive unless prefixed with `(`. `-inf` and `+inf` stand
/// for the lowest and highest scores. `LIMIT offset count` pages through the result, a
/// negative count meaning no limit.
///
/// Ref: <https://redis.io/docs/latest/commands/zrangebyscore/>
#[derive(Debug, PartialEq)]
pub struct ZrangeByScore {
    pub key: Bytes,
    pub min: ScoreBound,
    pub max: ScoreBound,
    pub descending: bool,
    pub with_scores: bool,
    pub limit: Option<(i64, i64)>,
}

impl ZrangeByScore {
    pub(crate) fn parse(parser: &mut CommandParser, descending: bool) -> Result<Self, Error> {
        let key = parser.next_bytes()?;
        let (min, max) = if descending {
            let max = parser.next_score_bound()?;
            (parser.next_score_bound()?, max)
        } else {
            let min = parser.next_score_bound()?;
            (min, parser.next_score_bound()?)
        };

        let mut with_scores = false;
        let mut limit = None;
        while let Some(option) = parser.next_keyword()? {
            match option.as_str() {
                "withscores" => with_scores = true,
                "limit" => {
                    let offset = parser.next_integer()?;
                    let count = parser.next_integer()?;
                    limit = Some((offset, count));
                }
                _ => return Err(CommandParserError::Syntax.into()),
            }
        }

        Ok(Self {
            key,
            min,
            max,
            descending,
            with_scores,
            limit,
        })
    }
}

impl Executable for ZrangeByScore {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let zset = store.sorted_set(&self.key)?;
        let Some((min, max)) = score_window(self.min, self.max) else {
            return Ok(Frame::Array(vec![]));
        };

        let (offset, count) = match self.limit {
            Some((offset, _)) if offset < 0 => return Ok(Frame::Array(vec![])),
            Some((offset, count)) if count < 0 => (offset, -1),
            Some((offset, count)) => (offset, count),
            None => (0, -1),
        };

        let members = zset.range_by_score(self.descending, min, max, offset, count)?;
        Ok(scored_reply(members, self.with_scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{bulks, parse, request, run};
    use crate::commands::Command;

    fn store() -> Store {
        let store = Store::default();
        run(&store, &["ZADD", "z", "1", "a", "2", "b", "3", "c", "4", "d"]);
        store
    }

    #[test]
    fn parse_reverse_bounds() {
        assert_eq!(
            parse(&["ZREVRANGEBYSCORE", "z", "+inf", "(2", "LIMIT", "0", "1"]),
            Command::ZrangeByScore(ZrangeByScore {
                key: Bytes::from("z"),
                min: ScoreBound::Exclusive(2),
                max: ScoreBound::PositiveInfinity,
                descending: true,
                with_scores: false,
                limit: Some((0, 1)),
            })
        );
        assert!(Command::try_from(request(&["ZRANGEBYSCORE", "z", "a", "2"])).is_err());
    }

    #[test]
    fn inclusive_and_exclusive_bounds() {
        let store = store();

        assert_eq!(
            run(&store, &["ZRANGEBYSCORE", "z", "2", "3"]),
            bulks(&["b", "c"])
        );
        assert_eq!(
            run(&store, &["ZRANGEBYSCORE", "z", "(2", "+inf"]),
            bulks(&["c", "d"])
        );
        assert_eq!(
            run(&store, &["ZRANGEBYSCORE", "z", "-inf", "(2", "WITHSCORES"]),
            bulks(&["a", "1"])
        );
        assert_eq!(run(&store, &["ZRANGEBYSCORE", "z", "(3", "(4"]), bulks(&[]));
    }

    #[test]
    fn descending_with_limit() {
        let store = store();

        assert_eq!(
            run(&store, &["ZREVRANGEBYSCORE", "z", "+inf", "-inf", "LIMIT", "1", "2"]),
            bulks(&["c", "b"])
        );
        assert_eq!(
            run(&store, &["ZRANGEBYSCORE", "z", "-inf", "+inf", "LIMIT", "2", "-1"]),
            bulks(&["c", "d"])
        );
    }
}
