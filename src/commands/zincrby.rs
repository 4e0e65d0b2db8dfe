use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Increments the score of `member` by `increment`, adding the member with that score when it
/// is missing. Returns the new score.
///
/// Ref: <https://redis.io/docs/latest/commands/zincrby/>
#[derive(Debug, PartialEq)]
pub struct ZincrBy {
    pub key: Bytes,
    pub increment: i64,
    pub member: Bytes,
}

impl Executable for ZincrBy {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let score = store
            .sorted_set(&self.key)?
            .incr_by(&self.member, self.increment)?;
        Ok(Frame::bulk(score.to_string()))
    }
}

impl TryFrom<&mut CommandParser> for ZincrBy {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let increment = parser.next_integer()?;
        let member = parser.next_bytes()?;
        Ok(Self {
            key,
            increment,
            member,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{bulk, run};
    use crate::structures::StructureError;

    #[test]
    fn increments_existing_member() {
        let store = Store::default();
        run(&store, &["ZADD", "z", "10", "x", "5", "y"]);

        assert_eq!(run(&store, &["ZINCRBY", "z", "3", "x"]), bulk("13"));
        assert_eq!(run(&store, &["ZSCORE", "z", "x"]), bulk("13"));
        assert_eq!(run(&store, &["ZCARD", "z"]), Frame::Integer(2));
    }

    #[test]
    fn missing_member_starts_at_zero() {
        let store = Store::default();

        assert_eq!(run(&store, &["ZINCRBY", "z", "-4", "m"]), bulk("-4"));
        assert_eq!(run(&store, &["ZCARD", "z"]), Frame::Integer(1));
    }

    #[test]
    fn overflow_is_an_error() {
        let store = Store::default();
        run(&store, &["ZADD", "z", &i64::MAX.to_string(), "m"]);

        let err = crate::commands::testing::parse(&["ZINCRBY", "z", "1", "m"])
            .exec(store.clone())
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<StructureError>(),
            Some(&StructureError::Overflow)
        );
    }
}
