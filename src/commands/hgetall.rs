use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns every field and value of the hash, as a flat `field value ...` array ordered by
/// field.
///
/// Ref: <https://redis.io/docs/latest/commands/hgetall/>
#[derive(Debug, PartialEq)]
pub struct Hgetall {
    pub key: Bytes,
}

impl Executable for Hgetall {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let pairs = store.hash(&self.key)?.get_all()?;
        let frames = pairs
            .into_iter()
            .flat_map(|(field, value)| [Frame::Bulk(field), Frame::Bulk(value)])
            .collect();
        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for Hgetall {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{bulks, run};

    #[test]
    fn flat_pairs_in_field_order() {
        let store = Store::default();
        run(&store, &["HSET", "h", "b", "2", "a", "1"]);

        assert_eq!(run(&store, &["HGETALL", "h"]), bulks(&["a", "1", "b", "2"]));
        assert_eq!(run(&store, &["HGETALL", "missing"]), bulks(&[]));
    }
}
