use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes the specified keys, whatever they hold. Returns how many existed.
///
/// Ref: <https://redis.io/commands/del>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<Bytes>,
}

impl Executable for Del {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut count = 0;
        for key in &self.keys {
            if store.del(key)? {
                count += 1;
            }
        }
        Ok(Frame::Integer(count))
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.next_bytes_list()?;
        Ok(Self { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{parse, request, run};
    use crate::commands::{Command, CommandParserError};

    #[test]
    fn multiple_keys() {
        assert_eq!(
            parse(&["DEL", "foo", "bar", "baz"]),
            Command::Del(Del {
                keys: vec![Bytes::from("foo"), Bytes::from("bar"), Bytes::from("baz")]
            })
        );
    }

    #[test]
    fn zero_keys() {
        let err = Command::try_from(request(&["DEL"])).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(*err, CommandParserError::EndOfStream);
    }

    #[test]
    fn invalid_frame() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("DEL")),
            Frame::Integer(42),
            Frame::Bulk(Bytes::from("foo")),
        ]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: Frame::Integer(42)
            }
        );
    }

    #[test]
    fn deletes_every_type() {
        let store = Store::default();
        run(&store, &["SET", "s", "1"]);
        run(&store, &["RPUSH", "l", "a", "b"]);
        run(&store, &["HSET", "h", "f", "v"]);

        assert_eq!(
            run(&store, &["DEL", "s", "l", "h", "missing"]),
            Frame::Integer(3)
        );
        assert_eq!(run(&store, &["EXISTS", "s", "l", "h"]), Frame::Integer(0));
    }
}
