use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// `ZRANK` and `ZREVRANK`: the zero based position of `member` ordered by score (and member
/// for equal scores), ascending or descending. Nil when the member is missing.
///
/// Ref: <https://redis.io/docs/latest/commands/zrank/>
#[derive(Debug, PartialEq)]
pub struct Zrank {
    pub key: Bytes,
    pub member: Bytes,
    pub descending: bool,
}

impl Zrank {
    pub(crate) fn parse(parser: &mut CommandParser, descending: bool) -> Result<Self, Error> {
        let key = parser.next_bytes()?;
        let member = parser.next_bytes()?;
        Ok(Self {
            key,
            member,
            descending,
        })
    }
}

impl Executable for Zrank {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let rank = store
            .sorted_set(&self.key)?
            .rank(self.descending, &self.member)?;
        Ok(rank.map_or(Frame::Null, Frame::Integer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;

    #[test]
    fn ascending_and_descending() {
        let store = Store::default();
        run(&store, &["ZADD", "z", "10", "x", "5", "y", "7", "w"]);

        assert_eq!(run(&store, &["ZRANK", "z", "x"]), Frame::Integer(2));
        assert_eq!(run(&store, &["ZRANK", "z", "y"]), Frame::Integer(0));
        assert_eq!(run(&store, &["ZREVRANK", "z", "x"]), Frame::Integer(0));
        assert_eq!(run(&store, &["ZREVRANK", "z", "y"]), Frame::Integer(2));
        assert_eq!(run(&store, &["ZRANK", "z", "nope"]), Frame::Null);
    }
}
