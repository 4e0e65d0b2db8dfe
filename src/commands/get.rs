use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Get the value of `key`. If the key does not exist the special value `nil` is returned.
/// An error is returned if the value stored at `key` is not a string.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: Bytes,
}

impl Executable for Get {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::optional(store.get(&self.key)?))
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{bulk, parse, run};
    use crate::commands::Command;
    use crate::store::StoreError;

    #[test]
    fn existing_key() {
        assert_eq!(
            parse(&["GET", "key1"]),
            Command::Get(Get {
                key: Bytes::from("key1")
            })
        );

        let store = Store::default();
        store
            .set_string(&Bytes::from("key1"), Bytes::from("1"))
            .unwrap();

        assert_eq!(run(&store, &["GET", "key1"]), bulk("1"));
    }

    #[test]
    fn missing_key() {
        let store = Store::default();

        assert_eq!(run(&store, &["GET", "key1"]), Frame::Null);
    }

    #[test]
    fn wrong_type() {
        let store = Store::default();
        run(&store, &["RPUSH", "list", "a"]);

        let err = parse(&["GET", "list"]).exec(store.clone()).unwrap_err();

        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::WrongType)
        );
    }
}
