use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Adds all the `score member` pairs to the sorted set stored at `key`. Scores are 64 bit
/// integers. Returns the number of members that were newly added; members whose score was only
/// updated are not counted.
///
/// Ref: <https://redis.io/docs/latest/commands/zadd/>
#[derive(Debug, PartialEq)]
pub struct Zadd {
    pub key: Bytes,
    pub members: Vec<(i64, Bytes)>,
}

impl Executable for Zadd {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let added = store.sorted_set(&self.key)?.add(&self.members)?;
        Ok(Frame::Integer(added))
    }
}

impl TryFrom<&mut CommandParser> for Zadd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;

        let mut members = vec![];
        loop {
            let score = parser.next_integer()?;
            let member = parser.next_bytes()?;
            members.push((score, member));
            if !parser.has_next() {
                break;
            }
        }

        Ok(Self { key, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{parse, request, run};
    use crate::commands::Command;

    #[test]
    fn parse_pairs() {
        assert_eq!(
            parse(&["ZADD", "z", "10", "x", "-5", "y"]),
            Command::Zadd(Zadd {
                key: Bytes::from("z"),
                members: vec![(10, Bytes::from("x")), (-5, Bytes::from("y"))],
            })
        );
        assert!(Command::try_from(request(&["ZADD", "z", "1"])).is_err());
        assert!(Command::try_from(request(&["ZADD", "z", "1.5", "x"])).is_err());
    }

    #[test]
    fn counts_new_members_only() {
        let store = Store::default();

        assert_eq!(run(&store, &["ZADD", "z", "10", "x", "5", "y"]), Frame::Integer(2));
        assert_eq!(run(&store, &["ZADD", "z", "1", "x", "2", "w"]), Frame::Integer(1));
        assert_eq!(run(&store, &["ZCARD", "z"]), Frame::Integer(3));
    }
}
