use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::structures::list::Side;
use crate::Error;

/// `LPUSH` and `RPUSH`: insert all the values at the head (or tail) of the list stored at
/// `key`, creating it when missing. Returns the length of the list after the push.
///
/// `LPUSH key a b c` leaves `c` at the head.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Push {
    pub key: Bytes,
    pub values: Vec<Bytes>,
    pub side: Side,
}

impl Push {
    pub(crate) fn parse(parser: &mut CommandParser, side: Side) -> Result<Self, Error> {
        let key = parser.next_bytes()?;
        let values = parser.next_bytes_list()?;

        Ok(Self { key, values, side })
    }
}

impl Executable for Push {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let list = store.list(&self.key)?;
        let len = list.push(self.side, &self.values)?;
        Ok(Frame::Integer(len))
    }
}
