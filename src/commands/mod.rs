pub mod client;
pub mod del;
pub mod echo;
pub mod executable;
pub mod exists;
pub mod get;
pub mod hdel;
pub mod hexists;
pub mod hget;
pub mod hgetall;
pub mod hincrby;
pub mod hlen;
pub mod hmget;
pub mod hset;
pub mod info;
pub mod keys;
pub mod lindex;
pub mod llen;
pub mod lrange;
pub mod ltrim;
pub mod ping;
pub mod pop;
pub mod push;
pub mod sadd;
pub mod scard;
pub mod set;
pub mod sismember;
pub mod smembers;
pub mod srem;
pub mod type_;
pub mod zadd;
pub mod zcard;
pub mod zincrby;
pub mod zrange;
pub mod zrangebyscore;
pub mod zrank;
pub mod zrem;
pub mod zremrangebyrank;
pub mod zremrangebyscore;
pub mod zscore;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::metrics::Category;
use crate::store::Store;
use crate::structures::list::Side;
use crate::Error;

use client::Client;
use del::Del;
use echo::Echo;
use exists::Exists;
use get::Get;
use hdel::Hdel;
use hexists::Hexists;
use hget::Hget;
use hgetall::Hgetall;
use hincrby::HincrBy;
use hlen::Hlen;
use hmget::Hmget;
use hset::Hset;
use info::Info;
use keys::Keys;
use lindex::Lindex;
use llen::Llen;
use lrange::Lrange;
use ltrim::Ltrim;
use ping::Ping;
use pop::Pop;
use push::Push;
use sadd::Sadd;
use scard::Scard;
use set::Set;
use sismember::Sismember;
use smembers::Smembers;
use srem::Srem;
use type_::Type;
use zadd::Zadd;
use zcard::Zcard;
use zincrby::ZincrBy;
use zrange::Zrange;
use zrangebyscore::ZrangeByScore;
use zrank::Zrank;
use zrem::Zrem;
use zremrangebyrank::ZremRangeByRank;
use zremrangebyscore::ZremRangeByScore;
use zscore::Zscore;

#[derive(Debug, PartialEq)]
pub enum Command {
    Del(Del),
    Exists(Exists),
    Get(Get),
    Keys(Keys),
    Set(Set),
    Type(Type),

    Lindex(Lindex),
    Llen(Llen),
    Lrange(Lrange),
    Ltrim(Ltrim),
    Pop(Pop),
    Push(Push),

    Zadd(Zadd),
    Zcard(Zcard),
    ZincrBy(ZincrBy),
    Zrange(Zrange),
    ZrangeByScore(ZrangeByScore),
    Zrank(Zrank),
    Zrem(Zrem),
    ZremRangeByRank(ZremRangeByRank),
    ZremRangeByScore(ZremRangeByScore),
    Zscore(Zscore),

    Hdel(Hdel),
    Hexists(Hexists),
    Hget(Hget),
    Hgetall(Hgetall),
    HincrBy(HincrBy),
    Hlen(Hlen),
    Hmget(Hmget),
    Hset(Hset),

    Sadd(Sadd),
    Scard(Scard),
    Sismember(Sismember),
    Smembers(Smembers),
    Srem(Srem),

    Client(Client),
    Echo(Echo),
    Info(Info),
    Ping(Ping),
}

impl Command {
    pub fn category(&self) -> Category {
        match self {
            Command::Get(_) | Command::Set(_) => Category::String,
            Command::Del(_) | Command::Exists(_) | Command::Keys(_) | Command::Type(_) => {
                Category::Key
            }
            Command::Lindex(_)
            | Command::Llen(_)
            | Command::Lrange(_)
            | Command::Ltrim(_)
            | Command::Pop(_)
            | Command::Push(_) => Category::List,
            Command::Zadd(_)
            | Command::Zcard(_)
            | Command::ZincrBy(_)
            | Command::Zrange(_)
            | Command::ZrangeByScore(_)
            | Command::Zrank(_)
            | Command::Zrem(_)
            | Command::ZremRangeByRank(_)
            | Command::ZremRangeByScore(_)
            | Command::Zscore(_) => Category::SortedSet,
            Command::Hdel(_)
            | Command::Hexists(_)
            | Command::Hget(_)
            | Command::Hgetall(_)
            | Command::HincrBy(_)
            | Command::Hlen(_)
            | Command::Hmget(_)
            | Command::Hset(_) => Category::Hash,
            Command::Sadd(_)
            | Command::Scard(_)
            | Command::Sismember(_)
            | Command::Smembers(_)
            | Command::Srem(_) => Category::Set,
            Command::Client(_) | Command::Echo(_) | Command::Info(_) | Command::Ping(_) => {
                Category::Server
            }
        }
    }
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Client(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Echo(cmd) => cmd.exec(store),
            Command::Exists(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Hdel(cmd) => cmd.exec(store),
            Command::Hexists(cmd) => cmd.exec(store),
            Command::Hget(cmd) => cmd.exec(store),
            Command::Hgetall(cmd) => cmd.exec(store),
            Command::HincrBy(cmd) => cmd.exec(store),
            Command::Hlen(cmd) => cmd.exec(store),
            Command::Hmget(cmd) => cmd.exec(store),
            Command::Hset(cmd) => cmd.exec(store),
            Command::Info(cmd) => cmd.exec(store),
            Command::Keys(cmd) => cmd.exec(store),
            Command::Lindex(cmd) => cmd.exec(store),
            Command::Llen(cmd) => cmd.exec(store),
            Command::Lrange(cmd) => cmd.exec(store),
            Command::Ltrim(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Pop(cmd) => cmd.exec(store),
            Command::Push(cmd) => cmd.exec(store),
            Command::Sadd(cmd) => cmd.exec(store),
            Command::Scard(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Sismember(cmd) => cmd.exec(store),
            Command::Smembers(cmd) => cmd.exec(store),
            Command::Srem(cmd) => cmd.exec(store),
            Command::Type(cmd) => cmd.exec(store),
            Command::Zadd(cmd) => cmd.exec(store),
            Command::Zcard(cmd) => cmd.exec(store),
            Command::ZincrBy(cmd) => cmd.exec(store),
            Command::Zrange(cmd) => cmd.exec(store),
            Command::ZrangeByScore(cmd) => cmd.exec(store),
            Command::Zrank(cmd) => cmd.exec(store),
            Command::Zrem(cmd) => cmd.exec(store),
            Command::ZremRangeByRank(cmd) => cmd.exec(store),
            Command::ZremRangeByScore(cmd) => cmd.exec(store),
            Command::Zscore(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
            command: String::new(),
        };

        let command_name = parser.parse_command_name()?;
        let command = parse_command(command_name, parser)?;

        parser.finish()?;
        Ok(command)
    }
}

fn parse_command(command_name: String, parser: &mut CommandParser) -> Result<Command, Error> {
    match &command_name[..] {
        "client" => Client::try_from(parser).map(Command::Client),
        "del" => Del::try_from(parser).map(Command::Del),
        "echo" => Echo::try_from(parser).map(Command::Echo),
        "exists" => Exists::try_from(parser).map(Command::Exists),
        "get" => Get::try_from(parser).map(Command::Get),
        "hdel" => Hdel::try_from(parser).map(Command::Hdel),
        "hexists" => Hexists::try_from(parser).map(Command::Hexists),
        "hget" => Hget::try_from(parser).map(Command::Hget),
        "hgetall" => Hgetall::try_from(parser).map(Command::Hgetall),
        "hincrby" => HincrBy::try_from(parser).map(Command::HincrBy),
        "hlen" => Hlen::try_from(parser).map(Command::Hlen),
        "hmget" => Hmget::try_from(parser).map(Command::Hmget),
        "hmset" => Hset::parse(parser, true).map(Command::Hset),
        "hset" => Hset::parse(parser, false).map(Command::Hset),
        "info" => Info::try_from(parser).map(Command::Info),
        "keys" => Keys::try_from(parser).map(Command::Keys),
        "lindex" => Lindex::try_from(parser).map(Command::Lindex),
        "llen" => Llen::try_from(parser).map(Command::Llen),
        "lpop" => Pop::parse(parser, Side::Left).map(Command::Pop),
        "lpush" => Push::parse(parser, Side::Left).map(Command::Push),
        "lrange" => Lrange::try_from(parser).map(Command::Lrange),
        "ltrim" => Ltrim::try_from(parser).map(Command::Ltrim),
        "ping" => Ping::try_from(parser).map(Command::Ping),
        "rpop" => Pop::parse(parser, Side::Right).map(Command::Pop),
        "rpush" => Push::parse(parser, Side::Right).map(Command::Push),
        "sadd" => Sadd::try_from(parser).map(Command::Sadd),
        "scard" => Scard::try_from(parser).map(Command::Scard),
        "set" => Set::try_from(parser).map(Command::Set),
        "sismember" => Sismember::try_from(parser).map(Command::Sismember),
        "smembers" => Smembers::try_from(parser).map(Command::Smembers),
        "srem" => Srem::try_from(parser).map(Command::Srem),
        "type" => Type::try_from(parser).map(Command::Type),
        "zadd" => Zadd::try_from(parser).map(Command::Zadd),
        "zcard" => Zcard::try_from(parser).map(Command::Zcard),
        "zincrby" => ZincrBy::try_from(parser).map(Command::ZincrBy),
        "zrange" => Zrange::parse(parser, false).map(Command::Zrange),
        "zrangebyscore" => ZrangeByScore::parse(parser, false).map(Command::ZrangeByScore),
        "zrank" => Zrank::parse(parser, false).map(Command::Zrank),
        "zrem" => Zrem::try_from(parser).map(Command::Zrem),
        "zremrangebyrank" => ZremRangeByRank::try_from(parser).map(Command::ZremRangeByRank),
        "zremrangebyscore" => ZremRangeByScore::try_from(parser).map(Command::ZremRangeByScore),
        "zrevrange" => Zrange::parse(parser, true).map(Command::Zrange),
        "zrevrangebyscore" => ZrangeByScore::parse(parser, true).map(Command::ZrangeByScore),
        "zrevrank" => Zrank::parse(parser, true).map(Command::Zrank),
        "zscore" => Zscore::try_from(parser).map(Command::Zscore),
        _ => Err(CommandParserError::UnknownCommand {
            command: command_name,
        }
        .into()),
    }
}

pub(crate) struct CommandParser {
    parts: vec::IntoIter<Frame>,
    command: String,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self
            .parts
            .next()
            .ok_or(CommandParserError::EndOfStream)?;

        let name = match command_name {
            Frame::Simple(s) => s.to_lowercase(),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String)?,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "simple string".to_string(),
                    actual: frame,
                })
            }
        };
        self.command.clone_from(&name);
        Ok(name)
    }

    pub(crate) fn has_next(&self) -> bool {
        self.parts.len() > 0
    }

    pub(crate) fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    pub(crate) fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => {
                string
                    .parse::<i64>()
                    .map_err(|_| CommandParserError::InvalidFrame {
                        expected: "parseable i64 frame".to_string(),
                        actual: Frame::Simple(string),
                    })
            }
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map_err(CommandParserError::InvalidUTF8String)?
                .parse::<i64>()
                .map_err(|_| CommandParserError::InvalidFrame {
                    expected: "parseable i64 frame".to_string(),
                    actual: Frame::Bulk(bytes),
                }),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    pub(crate) fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Consumes every remaining argument. At least one is required.
    pub(crate) fn next_bytes_list(&mut self) -> Result<Vec<Bytes>, CommandParserError> {
        let mut values = vec![self.next_bytes()?];
        while self.has_next() {
            values.push(self.next_bytes()?);
        }
        Ok(values)
    }

    /// Consumes the remaining arguments as `field value` pairs. At least one pair is required.
    pub(crate) fn next_pairs(&mut self) -> Result<Vec<(Bytes, Bytes)>, CommandParserError> {
        let mut pairs = vec![];
        loop {
            let field = self.next_bytes()?;
            let value = self.next_bytes()?;
            pairs.push((field, value));
            if !self.has_next() {
                return Ok(pairs);
            }
        }
    }

    /// Reads an optional keyword, such as `WITHSCORES`, matched case-insensitively.
    pub(crate) fn next_keyword(&mut self) -> Result<Option<String>, CommandParserError> {
        if !self.has_next() {
            return Ok(None);
        }
        Ok(Some(self.next_string()?.to_lowercase()))
    }

    /// A sorted set score bound: `-inf`, `+inf`, `n` or the exclusive `(n`.
    pub(crate) fn next_score_bound(&mut self) -> Result<ScoreBound, CommandParserError> {
        let raw = self.next_string()?;
        let bound = match raw.to_lowercase().as_str() {
            "-inf" => Some(ScoreBound::NegativeInfinity),
            "+inf" | "inf" => Some(ScoreBound::PositiveInfinity),
            s => match s.strip_prefix('(') {
                Some(rest) => rest.parse().ok().map(ScoreBound::Exclusive),
                None => s.parse().ok().map(ScoreBound::Inclusive),
            },
        };
        bound.ok_or_else(|| self.invalid_argument(raw))
    }

    pub(crate) fn invalid_argument(&self, argument: String) -> CommandParserError {
        CommandParserError::InvalidCommandArgument {
            command: self.command.clone(),
            argument,
        }
    }

    /// Fails when arguments are left over after a command was parsed.
    fn finish(&mut self) -> Result<(), CommandParserError> {
        if self.has_next() {
            return Err(CommandParserError::Syntax);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    NegativeInfinity,
    PositiveInfinity,
    Inclusive(i64),
    Exclusive(i64),
}

impl ScoreBound {
    fn as_min(self) -> Option<i64> {
        match self {
            ScoreBound::NegativeInfinity => Some(i64::MIN),
            ScoreBound::PositiveInfinity => None,
            ScoreBound::Inclusive(score) => Some(score),
            ScoreBound::Exclusive(score) => score.checked_add(1),
        }
    }

    fn as_max(self) -> Option<i64> {
        match self {
            ScoreBound::NegativeInfinity => None,
            ScoreBound::PositiveInfinity => Some(i64::MAX),
            ScoreBound::Inclusive(score) => Some(score),
            ScoreBound::Exclusive(score) => score.checked_sub(1),
        }
    }
}

/// Turns a pair of bounds into the inclusive `[min, max]` window they describe, or `None` when
/// no integer score can fall inside it.
pub(crate) fn score_window(min: ScoreBound, max: ScoreBound) -> Option<(i64, i64)> {
    let (min, max) = (min.as_min()?, max.as_max()?);
    (min <= max).then_some((min, max))
}

/// Resolves Redis style positions, where negative values count back from the tail, into a
/// non-empty `[start, stop]` window over `len` elements.
pub(crate) fn resolve_range(start: i64, stop: i64, len: i64) -> Option<(i64, i64)> {
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start, stop))
}

/// Flattens `(score, member)` pairs into a reply, interleaving the scores when asked to.
pub(crate) fn scored_reply(members: Vec<(i64, Bytes)>, with_scores: bool) -> Frame {
    let mut frames = Vec::with_capacity(members.len() * if with_scores { 2 } else { 1 });
    for (score, member) in members {
        frames.push(Frame::Bulk(member));
        if with_scores {
            frames.push(Frame::bulk(score.to_string()));
        }
    }
    Frame::Array(frames)
}


#[derive(Debug, ThisError, PartialEq)]
pub(crate) enum CommandParserError {
    #[error("protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("invalid argument '{argument}' for '{command}' command")]
    InvalidCommandArgument { command: String, argument: String },
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("syntax error")]
    Syntax,
    #[error("wrong number of arguments")]
    EndOfStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get_command_with_simple_string() {
        let get_frame = Frame::Array(vec![
            Frame::Simple(String::from("GET")),
            Frame::Simple(String::from("foo")),
        ]);

        let get_command = Command::try_from(get_frame).unwrap();

        assert_eq!(
            get_command,
            Command::Get(Get {
                key: Bytes::from("foo")
            })
        );
    }

    #[test]
    fn parse_command_name_is_case_insensitive() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("lLeN")),
            Frame::Bulk(Bytes::from("queue")),
        ]);

        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(cmd.category(), Category::List);
    }

    #[test]
    fn unknown_command() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("FLUSHALL"))]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::UnknownCommand {
                command: "flushall".to_string()
            }
        );
    }

    #[test]
    fn trailing_arguments_are_rejected() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("GET")),
            Frame::Bulk(Bytes::from("a")),
            Frame::Bulk(Bytes::from("b")),
        ]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(*err, CommandParserError::Syntax);
    }

    #[test]
    fn non_array_frame() {
        let err = Command::try_from(Frame::Integer(1)).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert!(matches!(err, CommandParserError::InvalidFrame { .. }));
    }

    #[test]
    fn resolve_negative_positions() {
        assert_eq!(resolve_range(0, -1, 3), Some((0, 2)));
        assert_eq!(resolve_range(-2, -1, 3), Some((1, 2)));
        assert_eq!(resolve_range(-10, 1, 3), Some((0, 1)));
        assert_eq!(resolve_range(1, 100, 3), Some((1, 2)));
        assert_eq!(resolve_range(2, 1, 3), None);
        assert_eq!(resolve_range(5, 10, 3), None);
        assert_eq!(resolve_range(0, -1, 0), None);
    }

    #[test]
    fn score_windows() {
        use ScoreBound::*;

        assert_eq!(
            score_window(NegativeInfinity, PositiveInfinity),
            Some((i64::MIN, i64::MAX))
        );
        assert_eq!(score_window(Exclusive(1), Inclusive(5)), Some((2, 5)));
        assert_eq!(score_window(Exclusive(1), Exclusive(2)), None);
        assert_eq!(score_window(PositiveInfinity, PositiveInfinity), None);
        assert_eq!(score_window(Exclusive(i64::MAX), PositiveInfinity), None);
    }
}
