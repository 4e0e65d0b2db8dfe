use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Connection management subcommands (`SETNAME`, `SETINFO`, ...). Clients send them during
/// the handshake; they are accepted and ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/client>
#[derive(Debug, PartialEq)]
pub struct Client {
    pub subcommand: String,
}

impl Executable for Client {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        Ok(Frame::ok())
    }
}

impl TryFrom<&mut CommandParser> for Client {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?.to_lowercase();
        while parser.has_next() {
            parser.next_bytes()?;
        }
        Ok(Self { subcommand })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{parse, run};
    use crate::commands::Command;

    #[test]
    fn accepts_any_subcommand() {
        let store = Store::default();

        assert_eq!(
            parse(&["CLIENT", "SETNAME", "worker"]),
            Command::Client(Client {
                subcommand: "setname".to_string()
            })
        );
        assert_eq!(run(&store, &["CLIENT", "SETINFO", "lib-name", "x"]), Frame::ok());
    }
}
