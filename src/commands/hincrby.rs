use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Increments the integer stored in `field` by `increment`, starting from 0 when the field is
/// missing. Returns the new value.
///
/// Ref: <https://redis.io/docs/latest/commands/hincrby/>
#[derive(Debug, PartialEq)]
pub struct HincrBy {
    pub key: Bytes,
    pub field: Bytes,
    pub increment: i64,
}

impl Executable for HincrBy {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let value = store
            .hash(&self.key)?
            .incr_by(&self.field, self.increment)?;
        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for HincrBy {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let field = parser.next_bytes()?;
        let increment = parser.next_integer()?;
        Ok(Self {
            key,
            field,
            increment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{parse, run};
    use crate::structures::StructureError;

    #[test]
    fn increments() {
        let store = Store::default();

        assert_eq!(run(&store, &["HINCRBY", "h", "n", "5"]), Frame::Integer(5));
        assert_eq!(run(&store, &["HINCRBY", "h", "n", "-7"]), Frame::Integer(-2));
    }

    #[test]
    fn not_an_integer() {
        let store = Store::default();
        run(&store, &["HSET", "h", "s", "text"]);

        let err = parse(&["HINCRBY", "h", "s", "1"])
            .exec(store.clone())
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<StructureError>(),
            Some(&StructureError::NotAnInteger)
        );
    }
}
