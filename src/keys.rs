//! Row key layout.
//!
//! Every logical key `K` is framed as `tag · u32_be(len(K)) · K`, so the rows of one key can
//! never share a prefix with the rows of another key. On top of that frame:
//!
//! - info:        `k · len · K · # · <type>`                       -> metadata or string value
//! - list entry:  `l · len · K · # · sign · be64(index)`           -> element
//! - zset member: `z · len · K · # · m · # · member`               -> be64(score)
//! - zset score:  `z · len · K · # · s · # · sign · be64(score) · # · member` -> empty
//! - hash field:  `h · len · K · # · field`                         -> value
//! - set member:  `s · len · K · # · member`                        -> empty
//!
//! Signed integers are written as a sign digit followed by their big-endian two's complement
//! bytes. Without the digit every negative number would sort after every positive one.

use bytes::Bytes;
use strum_macros::{Display, EnumString, IntoStaticStr};

pub const SEP: u8 = b'#';
pub const MAX_BYTE: u8 = 0xff;

const NEGATIVE: u8 = b'0';
const NON_NEGATIVE: u8 = b'1';

const INFO_TAG: u8 = b'k';
const LIST_TAG: u8 = b'l';
const ZSET_TAG: u8 = b'z';
const HASH_TAG: u8 = b'h';
const SET_TAG: u8 = b's';

const MEMBER_MARK: u8 = b'm';
const SCORE_MARK: u8 = b's';

/// Length of an encoded index or score: one sign digit plus eight bytes.
pub const ENCODED_INT_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum KeyType {
    String,
    List,
    #[strum(serialize = "zset")]
    SortedSet,
    Hash,
    Set,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

pub fn encode_index(i: i64) -> [u8; ENCODED_INT_LEN] {
    let mut buf = [0u8; ENCODED_INT_LEN];
    buf[0] = if i < 0 { NEGATIVE } else { NON_NEGATIVE };
    buf[1..].copy_from_slice(&i.to_be_bytes());
    buf
}

/// Reads the index from the trailing eight bytes of an entry key.
pub fn decode_index(row: &[u8]) -> Option<i64> {
    if row.len() < ENCODED_INT_LEN {
        return None;
    }
    let tail: [u8; 8] = row[row.len() - 8..].try_into().ok()?;
    Some(i64::from_be_bytes(tail))
}

/// Score value stored in a member row.
pub fn score_bytes(score: i64) -> [u8; 8] {
    score.to_be_bytes()
}

pub fn parse_score(value: &[u8]) -> Option<i64> {
    let raw: [u8; 8] = value.try_into().ok()?;
    Some(i64::from_be_bytes(raw))
}

fn key_space(tag: u8, key: &[u8], extra: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + 4 + key.len() + 1 + extra);
    buf.push(tag);
    buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
    buf.extend_from_slice(key);
    buf.push(SEP);
    buf
}

/// First byte shared by every info row, used to enumerate all logical keys.
pub fn info_space() -> [u8; 1] {
    [INFO_TAG]
}

pub fn info_prefix(key: &[u8]) -> Vec<u8> {
    key_space(INFO_TAG, key, 6)
}

pub fn info_key(key: &[u8], key_type: KeyType) -> Vec<u8> {
    let mut buf = info_prefix(key);
    buf.extend_from_slice(key_type.as_str().as_bytes());
    buf
}

/// Recovers the logical key and its type from an info row.
pub fn parse_info_key(row: &[u8]) -> Option<(Bytes, KeyType)> {
    let (&tag, rest) = row.split_first()?;
    if tag != INFO_TAG || rest.len() < 4 {
        return None;
    }
    let (len, rest) = rest.split_at(4);
    let len = u32::from_be_bytes(len.try_into().ok()?) as usize;
    if rest.len() < len + 1 || rest[len] != SEP {
        return None;
    }
    let key = Bytes::copy_from_slice(&rest[..len]);
    let key_type = std::str::from_utf8(&rest[len + 1..]).ok()?.parse().ok()?;
    Some((key, key_type))
}

pub fn list_prefix(key: &[u8]) -> Vec<u8> {
    key_space(LIST_TAG, key, ENCODED_INT_LEN)
}

pub fn list_entry_key(prefix: &[u8], index: i64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(prefix.len() + ENCODED_INT_LEN);
    buf.extend_from_slice(prefix);
    buf.extend_from_slice(&encode_index(index));
    buf
}

/// Prefix of every row of a sorted set, members and scores alike.
pub fn zset_prefix(key: &[u8]) -> Vec<u8> {
    key_space(ZSET_TAG, key, 2)
}

pub fn member_key(key: &[u8], member: &[u8]) -> Vec<u8> {
    let mut buf = zset_prefix(key);
    buf.reserve(member.len());
    buf.push(MEMBER_MARK);
    buf.push(SEP);
    buf.extend_from_slice(member);
    buf
}

pub fn score_prefix(key: &[u8]) -> Vec<u8> {
    let mut buf = zset_prefix(key);
    buf.push(SCORE_MARK);
    buf.push(SEP);
    buf
}

/// `score_prefix · sign · be64(score)`. Appending [`MAX_BYTE`] turns it into an inclusive upper
/// bound for every member holding `score`.
pub fn score_prefix_with(key: &[u8], score: i64) -> Vec<u8> {
    let mut buf = score_prefix(key);
    buf.extend_from_slice(&encode_index(score));
    buf
}

pub fn score_key(key: &[u8], score: i64, member: &[u8]) -> Vec<u8> {
    let mut buf = score_prefix_with(key, score);
    buf.reserve(1 + member.len());
    buf.push(SEP);
    buf.extend_from_slice(member);
    buf
}

/// Splits a score row into its score and member. `prefix` is the set's [`score_prefix`].
pub fn split_score_key<'a>(prefix: &[u8], row: &'a [u8]) -> Option<(i64, &'a [u8])> {
    let rest = row.strip_prefix(prefix)?;
    if rest.len() < ENCODED_INT_LEN + 1 || rest[ENCODED_INT_LEN] != SEP {
        return None;
    }
    let score = decode_index(&rest[..ENCODED_INT_LEN])?;
    Some((score, &rest[ENCODED_INT_LEN + 1..]))
}

/// Prefix of the field rows of a hash, or the member rows of a set.
pub fn field_prefix(key_type: KeyType, key: &[u8]) -> Vec<u8> {
    let tag = match key_type {
        KeyType::Set => SET_TAG,
        _ => HASH_TAG,
    };
    key_space(tag, key, 16)
}

pub fn field_key(prefix: &[u8], field: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(prefix.len() + field.len());
    buf.extend_from_slice(prefix);
    buf.extend_from_slice(field);
    buf
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn index_order_crosses_sign_boundary() {
        let values = [i64::MIN, -256, -2, -1, 0, 1, 2, 255, 256, i64::MAX];
        for pair in values.windows(2) {
            assert!(
                encode_index(pair[0]) < encode_index(pair[1]),
                "{} should sort before {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn index_order_holds_for_random_pairs() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let a: i64 = rng.gen();
            let b: i64 = rng.gen();
            assert_eq!(a.cmp(&b), encode_index(a).cmp(&encode_index(b)));
            assert_eq!(
                a.cmp(&b),
                score_prefix_with(b"z", a).cmp(&score_prefix_with(b"z", b))
            );
        }
    }

    #[test]
    fn decode_reads_trailing_index() {
        let prefix = list_prefix(b"mylist");
        for i in [-5, 0, 42] {
            assert_eq!(decode_index(&list_entry_key(&prefix, i)), Some(i));
        }
        assert_eq!(decode_index(b"short"), None);
    }

    #[test]
    fn score_key_orders_by_score_then_member() {
        let keys = [
            score_key(b"z", -1, b"b"),
            score_key(b"z", 0, b"a"),
            score_key(b"z", 0, b"b"),
            score_key(b"z", 10, b"a"),
        ];
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));

        let upper = [score_prefix_with(b"z", 0), vec![MAX_BYTE]].concat();
        assert!(keys[2] < upper);
        assert!(upper < keys[3]);
    }

    #[test]
    fn split_score_key_allows_separator_in_member() {
        let prefix = score_prefix(b"z");
        let row = score_key(b"z", -42, b"a#b");

        assert_eq!(split_score_key(&prefix, &row), Some((-42, &b"a#b"[..])));
        assert_eq!(split_score_key(&prefix, &member_key(b"z", b"x")), None);
    }

    #[test]
    fn key_space_is_not_shared_between_keys() {
        let short = list_prefix(b"a");
        let long = list_prefix(b"a#b");

        assert!(!long.starts_with(&short));
        assert!(!member_key(b"a#m#x", b"y").starts_with(&zset_prefix(b"a")));
    }

    #[test]
    fn info_key_round_trip() {
        let row = info_key(b"user:1", KeyType::SortedSet);

        assert!(row.starts_with(&info_space()));
        assert_eq!(
            parse_info_key(&row),
            Some((Bytes::from("user:1"), KeyType::SortedSet))
        );
        assert_eq!(parse_info_key(&list_prefix(b"user:1")), None);
    }

    #[test]
    fn key_type_names() {
        assert_eq!(KeyType::SortedSet.as_str(), "zset");
        assert_eq!(KeyType::String.to_string(), "string");
        assert_eq!("hash".parse::<KeyType>(), Ok(KeyType::Hash));
    }
}
