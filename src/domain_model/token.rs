use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a bearer token. Transmitted as an integer claim (0 = access, 1 = refresh).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TokenType {
    Access = 0,
    Refresh = 1,
}

impl From<TokenType> for u8 {
    fn from(token_type: TokenType) -> u8 {
        token_type as u8
    }
}

impl TryFrom<u8> for TokenType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TokenType::Access),
            1 => Ok(TokenType::Refresh),
            other => Err(format!("unknown token type {other}")),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Unique token identifier (`jti`). The only key under which cache state is indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn generate() -> Self {
        TokenId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        TokenId(s.to_string())
    }
}

/// Scalar claim value carried in a token subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for SubjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectValue::Int(v) => write!(f, "{v}"),
            SubjectValue::Float(v) => write!(f, "{v}"),
            SubjectValue::Str(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for SubjectValue {
    fn from(v: i64) -> Self {
        SubjectValue::Int(v)
    }
}

impl From<i32> for SubjectValue {
    fn from(v: i32) -> Self {
        SubjectValue::Int(v.into())
    }
}

impl From<f64> for SubjectValue {
    fn from(v: f64) -> Self {
        SubjectValue::Float(v)
    }
}

impl From<&str> for SubjectValue {
    fn from(v: &str) -> Self {
        SubjectValue::Str(v.to_string())
    }
}

impl From<String> for SubjectValue {
    fn from(v: String) -> Self {
        SubjectValue::Str(v)
    }
}

/// Opaque application claims, e.g. `{"user_id": 679, "role": "admin"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(BTreeMap<String, SubjectValue>);

impl Subject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<SubjectValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&SubjectValue> {
        self.0.get(key)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// Decoded token payload. Field names are the wire claim names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    subject: Subject,
    token_type: TokenType,
    exp: i64,
    nbf: i64,
    jti: TokenId,
}

impl Credential {
    pub fn new(
        subject: Subject,
        token_type: TokenType,
        nbf: i64,
        exp: i64,
        jti: TokenId,
    ) -> Self {
        Self {
            subject,
            token_type,
            exp,
            nbf,
            jti,
        }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Expiration, seconds since epoch.
    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    /// Issue time and validity start, seconds since epoch.
    pub fn not_before(&self) -> i64 {
        self.nbf
    }

    pub fn id(&self) -> &TokenId {
        &self.jti
    }

    /// Shorthand for `subject().get(key)`.
    pub fn get(&self, key: &str) -> Option<&SubjectValue> {
        self.subject.get(key)
    }
}
