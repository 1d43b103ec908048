//! The `hstore` composite scalar.
//!
//! An [`Hstore`] is a string-keyed map whose values may be SQL `NULL`. It is
//! stored in a single column using PostgreSQL's hstore literal syntax:
//!
//! ```text
//! "color"=>"red", "size"=>NULL
//! ```
//!
//! Encoding and decoding are deliberately asymmetric. An empty map is written
//! as SQL `NULL`, while reading `NULL` (or an empty literal) leaves the
//! destination untouched.

use std::collections::BTreeMap;
use std::ops::Deref;

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::PgHstore;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type};

/// Errors raised while parsing an hstore literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HstoreError {
    /// The literal ended in the middle of an entry.
    #[error("unexpected end of hstore literal at byte {0}")]
    UnexpectedEnd(usize),

    /// A character appeared where something else was expected.
    #[error("unexpected '{found}' at byte {position} in hstore literal, expected {expected}")]
    Unexpected {
        /// Byte offset of the character.
        position: usize,
        /// The character found.
        found: char,
        /// What the parser was looking for.
        expected: &'static str,
    },
}

/// A map of string keys to optional string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hstore(BTreeMap<String, Option<String>>);

impl Hstore {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an entry. `None` stores SQL `NULL` for the key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Option<Option<String>> {
        self.0.insert(key.into(), value)
    }

    /// Returns the inner map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Option<String>> {
        self.0
    }

    /// Encodes the map as an hstore literal, or `None` (SQL `NULL`) when the
    /// map is empty.
    #[must_use]
    pub fn to_storage(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }

        let entries: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| {
                let value = value.as_deref().map_or_else(|| "NULL".to_string(), quote);
                format!("{}=>{}", quote(key), value)
            })
            .collect();
        Some(entries.join(", "))
    }

    /// Decodes an hstore literal into this map.
    ///
    /// `None` (SQL `NULL`) and literals without entries leave the map as it
    /// was. Otherwise the map is replaced by the decoded entries. On a parse
    /// error the map is not modified.
    pub fn from_storage(&mut self, raw: Option<&str>) -> Result<(), HstoreError> {
        let Some(raw) = raw else {
            return Ok(());
        };

        let parsed = parse(raw)?;
        if !parsed.is_empty() {
            self.0 = parsed;
        }
        Ok(())
    }

    /// Same as [`from_storage`](Self::from_storage), for a value already
    /// decoded by the driver.
    pub fn absorb(&mut self, value: Option<PgHstore>) {
        if let Some(value) = value {
            if !value.0.is_empty() {
                self.0 = value.0;
            }
        }
    }

    /// Converts to the driver representation, `None` for an empty map.
    #[must_use]
    pub fn to_pg_hstore(&self) -> Option<PgHstore> {
        if self.0.is_empty() {
            None
        } else {
            Some(PgHstore(self.0.clone()))
        }
    }
}

impl Deref for Hstore {
    type Target = BTreeMap<String, Option<String>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<BTreeMap<String, Option<String>>> for Hstore {
    fn from(map: BTreeMap<String, Option<String>>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Option<String>>> FromIterator<(K, V)> for Hstore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Type<Postgres> for Hstore {
    fn type_info() -> PgTypeInfo {
        <PgHstore as Type<Postgres>>::type_info()
    }
}

impl<'q> Encode<'q, Postgres> for Hstore {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        match self.to_pg_hstore() {
            Some(value) => <PgHstore as Encode<'q, Postgres>>::encode_by_ref(&value, buf),
            None => Ok(IsNull::Yes),
        }
    }
}

impl<'r> Decode<'r, Postgres> for Hstore {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let decoded = <PgHstore as Decode<'r, Postgres>>::decode(value)?;
        Ok(Self(decoded.0))
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Parses an hstore literal.
fn parse(raw: &str) -> Result<BTreeMap<String, Option<String>>, HstoreError> {
    let mut parser = Parser {
        input: raw,
        pos: 0,
    };
    let mut map = BTreeMap::new();

    parser.skip_whitespace();
    if parser.at_end() {
        return Ok(map);
    }

    loop {
        let key = parser.token("key")?;
        parser.skip_whitespace();
        parser.expect('=', "'=>'")?;
        parser.expect('>', "'=>'")?;
        parser.skip_whitespace();

        let value = if parser.peek() == Some('"') {
            Some(parser.quoted()?)
        } else {
            let bare = parser.bare("value")?;
            if bare.eq_ignore_ascii_case("NULL") {
                None
            } else {
                Some(bare)
            }
        };
        map.insert(key, value);

        parser.skip_whitespace();
        match parser.bump() {
            None => break,
            Some((_, ',')) => parser.skip_whitespace(),
            Some((position, found)) => {
                return Err(HstoreError::Unexpected {
                    position,
                    found,
                    expected: "',' or end of input",
                });
            }
        }
    }

    Ok(map)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let c = self.peek()?;
        let position = self.pos;
        self.pos += c.len_utf8();
        Some((position, c))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, wanted: char, expected: &'static str) -> Result<(), HstoreError> {
        match self.bump() {
            Some((_, c)) if c == wanted => Ok(()),
            Some((position, found)) => Err(HstoreError::Unexpected {
                position,
                found,
                expected,
            }),
            None => Err(HstoreError::UnexpectedEnd(self.pos)),
        }
    }

    fn token(&mut self, expected: &'static str) -> Result<String, HstoreError> {
        if self.peek() == Some('"') {
            self.quoted()
        } else {
            self.bare(expected)
        }
    }

    fn quoted(&mut self) -> Result<String, HstoreError> {
        self.expect('"', "'\"'")?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(HstoreError::UnexpectedEnd(self.pos)),
                Some((_, '"')) => return Ok(out),
                Some((_, '\\')) => match self.bump() {
                    Some((_, escaped)) => out.push(escaped),
                    None => return Err(HstoreError::UnexpectedEnd(self.pos)),
                },
                Some((_, c)) => out.push(c),
            }
        }
    }

    /// Reads an unquoted token, ending at whitespace, `,` or `=>`.
    fn bare(&mut self, expected: &'static str) -> Result<String, HstoreError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let arrow = c == '=' && self.input[self.pos..].starts_with("=>");
            if c.is_whitespace() || c == ',' || arrow {
                break;
            }
            self.pos += c.len_utf8();
        }

        if self.pos == start {
            return match self.peek() {
                Some(found) => Err(HstoreError::Unexpected {
                    position: self.pos,
                    found,
                    expected,
                }),
                None => Err(HstoreError::UnexpectedEnd(self.pos)),
            };
        }
        Ok(self.input[start..self.pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Hstore {
        [
            ("color", Some("red".to_string())),
            ("size", None),
            ("quote \"me\"", Some("back\\slash".to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_empty_encodes_as_null() {
        assert_eq!(Hstore::new().to_storage(), None);
        assert!(Hstore::new().to_pg_hstore().is_none());
    }

    #[test]
    fn test_encode_literal() {
        let h: Hstore = [("a", Some("1".to_string())), ("b", None)]
            .into_iter()
            .collect();
        assert_eq!(h.to_storage().as_deref(), Some(r#""a"=>"1", "b"=>NULL"#));
    }

    #[test]
    fn test_round_trip_keeps_null_entries() {
        let original = sample();
        let literal = original.to_storage().unwrap();

        let mut decoded = Hstore::new();
        decoded.from_storage(Some(&literal)).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.get("size"), Some(&None));
    }

    #[test]
    fn test_decode_null_leaves_destination() {
        let mut h = sample();
        h.from_storage(None).unwrap();
        assert_eq!(h, sample());
    }

    #[test]
    fn test_decode_empty_literal_leaves_destination() {
        let mut h = sample();
        h.from_storage(Some("  ")).unwrap();
        assert_eq!(h, sample());
    }

    #[test]
    fn test_decode_replaces_existing_entries() {
        let mut h = sample();
        h.from_storage(Some(r#""x"=>"y""#)).unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h.get("x"), Some(&Some("y".to_string())));
    }

    #[test]
    fn test_decode_server_output() {
        let mut h = Hstore::new();
        h.from_storage(Some(r#""a"=>"1", "b"=>NULL, "c"=>"NULL""#))
            .unwrap();
        assert_eq!(h.get("a"), Some(&Some("1".to_string())));
        assert_eq!(h.get("b"), Some(&None));
        assert_eq!(h.get("c"), Some(&Some("NULL".to_string())));
    }

    #[test]
    fn test_decode_unquoted_tokens() {
        let mut h = Hstore::new();
        h.from_storage(Some("a=>1,b => null")).unwrap();
        assert_eq!(h.get("a"), Some(&Some("1".to_string())));
        assert_eq!(h.get("b"), Some(&None));
    }

    #[test]
    fn test_decode_error_keeps_destination() {
        let mut h = sample();
        let err = h.from_storage(Some(r#""a"=>"1" "b""#)).unwrap_err();
        assert!(matches!(err, HstoreError::Unexpected { found: '"', .. }));
        assert_eq!(h, sample());
    }

    #[test]
    fn test_decode_unterminated() {
        let mut h = Hstore::new();
        assert!(matches!(
            h.from_storage(Some(r#""a"=>"1"#)),
            Err(HstoreError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            h.from_storage(Some(r#""a"=>"#)),
            Err(HstoreError::UnexpectedEnd(_))
        ));
    }

    #[test]
    fn test_absorb() {
        let mut h = sample();
        h.absorb(None);
        assert_eq!(h, sample());

        h.absorb(Some(PgHstore(BTreeMap::new())));
        assert_eq!(h, sample());

        let mut incoming = BTreeMap::new();
        incoming.insert("k".to_string(), None);
        h.absorb(Some(PgHstore(incoming)));
        assert_eq!(h.len(), 1);
        assert_eq!(h.get("k"), Some(&None));
    }
}
