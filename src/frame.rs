// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::{Buf, Bytes};
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("protocol error; invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("protocol error; {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    pub fn ok() -> Frame {
        Frame::Simple("OK".to_string())
    }

    pub fn bulk(data: impl Into<Bytes>) -> Frame {
        Frame::Bulk(data.into())
    }

    /// A bulk reply, or the null bulk reply when there is nothing to return.
    pub fn optional(data: Option<Bytes>) -> Frame {
        data.map_or(Frame::Null, Frame::Bulk)
    }

    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => Ok(Frame::Simple(get_line_string(src)?)),
            DataType::SimpleError => Ok(Frame::Error(get_line_string(src)?)),
            DataType::Integer => Ok(Frame::Integer(get_integer(src)?)),
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => Ok(Frame::Bulk(get_exact(src, length)?)),
            },
            // !<length>\r\n<error>\r\n
            DataType::BulkError => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => {
                    let msg = get_exact(src, length)?;
                    Ok(Frame::Error(String::from_utf8(msg.to_vec())?))
                }
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => {
                    // The length is attacker controlled, so it does not size the allocation.
                    let mut frames = Vec::with_capacity(length.min(64));
                    for _ in 0..length {
                        frames.push(Self::parse(src)?);
                    }
                    Ok(Frame::Array(frames))
                }
            },
            DataType::Null => {
                get_line(src)?;
                Ok(Frame::Null)
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![];
        self.write_to(&mut bytes);
        bytes
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => {
                out.push(u8::from(DataType::SimpleString));
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(CRLF);
            }
            Frame::Error(s) => {
                out.push(u8::from(DataType::SimpleError));
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(CRLF);
            }
            Frame::Integer(i) => {
                out.push(u8::from(DataType::Integer));
                out.extend_from_slice(i.to_string().as_bytes());
                out.extend_from_slice(CRLF);
            }
            Frame::Bulk(data) => {
                out.push(u8::from(DataType::BulkString));
                out.extend_from_slice(data.len().to_string().as_bytes());
                out.extend_from_slice(CRLF);
                out.extend_from_slice(data);
                out.extend_from_slice(CRLF);
            }
            // RESP2 clients only understand the null bulk string.
            Frame::Null => out.extend_from_slice(b"$-1\r\n"),
            Frame::Array(frames) => {
                out.push(u8::from(DataType::Array));
                out.extend_from_slice(frames.len().to_string().as_bytes());
                out.extend_from_slice(CRLF);
                for frame in frames {
                    frame.write_to(out);
                }
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

/// Returns the bytes up to the next CRLF and moves the cursor past it.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    let end = buf[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((end + CRLF.len()) as u64);
    Ok(&buf[start..end])
}

fn get_line_string(src: &mut Cursor<&[u8]>) -> Result<String, Error> {
    Ok(String::from_utf8(get_line(src)?.to_vec())?)
}

fn get_integer(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line_string(src)?;
    line.parse::<i64>()
        .map_err(|_| Error::Invalid(format!("invalid integer {:?}", line)))
}

/// Reads a length header. `-1` is the RESP2 null marker.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    match get_integer(src)? {
        -1 => Ok(None),
        length => usize::try_from(length)
            .map(Some)
            .map_err(|_| Error::Invalid(format!("invalid length {}", length))),
    }
}

/// Reads exactly `length` payload bytes followed by CRLF. The payload may itself contain CRLF.
fn get_exact(src: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, Error> {
    let start = src.position() as usize;
    let end = start.checked_add(length).ok_or(Error::Incomplete)?;
    if src.get_ref().len() < end + CRLF.len() {
        return Err(Error::Incomplete);
    }
    if &src.get_ref()[end..end + CRLF.len()] != CRLF {
        return Err(Error::Invalid("bulk payload is not terminated by CRLF".to_string()));
    }

    let data = Bytes::copy_from_slice(&src.get_ref()[start..end]);
    src.set_position((end + CRLF.len()) as u64);
    Ok(data)
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    BulkError,    // '!'
    Array,        // '*'
    Null,         // '_'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'!' => Ok(Self::BulkError),
            b'*' => Ok(Self::Array),
            b'_' => Ok(Self::Null),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::BulkError => b'!',
            DataType::Array => b'*',
            DataType::Null => b'_',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        Error::Invalid("invalid UTF-8 in frame".to_string())
    }
}
