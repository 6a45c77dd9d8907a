//! Field selectors expressed as JSON pointers.
//!
//! A pointer is a `/` separated list of member names. A leading slash is
//! optional so that both `name/first` and `/name/first` select the same
//! member, and the empty string (or `/`) addresses the whole value.
//! Reference tokens use the RFC 6901 escapes: `~1` for `/` and `~0` for `~`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Most selectors are one or two members deep.
const INLINE_TOKENS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    tokens: SmallVec<[String; INLINE_TOKENS]>,
}

impl JsonPointer {
    /// Pointer to the whole value
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a pointer. Empty reference tokens are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let tokens = text
            .split('/')
            .filter(|t| !t.is_empty())
            .map(unescape)
            .collect();
        Self { tokens }
    }

    /// Build a pointer from already unescaped tokens
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the pointer addresses the whole value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// First reference token, i.e. the top-level member this pointer descends into
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Last reference token, used as the member name when a selection is projected
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    #[must_use]
    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    /// Resolve against `value`, descending through object members only.
    ///
    /// Array elements are not addressable: a numeric token is looked up as an
    /// object member name and therefore misses when the parent is an array.
    #[must_use]
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.tokens
            .iter()
            .try_fold(value, |current, token| current.as_object()?.get(token))
    }
}

fn unescape(token: &str) -> String {
    if token.contains('~') {
        token.replace("~1", "/").replace("~0", "~")
    } else {
        token.to_string()
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tokens.is_empty() {
            return f.write_str("/");
        }
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for JsonPointer {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Parse a comma separated selector list such as `name,address/city`
#[must_use]
pub fn parse_fields(list: &str) -> Vec<JsonPointer> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(JsonPointer::parse)
        .collect()
}
