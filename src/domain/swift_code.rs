use crate::utils::error::{BankError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Branch suffix that marks a headquarter.
pub const HEADQUARTER_SUFFIX: &str = "XXX";

const PREFIX_LEN: usize = 8;

fn swift_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{8}([A-Z0-9]{3})?$").expect("valid SWIFT regex"))
}

fn country_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}$").expect("valid country regex"))
}

/// A validated 8 or 11 character SWIFT/BIC code.
///
/// The first 8 characters are the institution+location prefix shared by a headquarter and all of
/// its branches. An 8 character code has an implicit `XXX` branch suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SwiftCode(String);

impl SwiftCode {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != 8 && raw.len() != 11 {
            return Err(BankError::invalid_format(
                "SWIFT code",
                raw,
                format!("length must be 8 or 11 characters, but is {}", raw.len()),
            ));
        }
        if !swift_code_regex().is_match(raw) {
            return Err(BankError::invalid_format(
                "SWIFT code",
                raw,
                "only uppercase letters A-Z and digits 0-9 are allowed",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Institution+country+location code, always the first 8 characters.
    pub fn parent_prefix(&self) -> &str {
        &self.0[..PREFIX_LEN]
    }

    /// Branch code, `XXX` when the code is only 8 characters long.
    pub fn branch_code(&self) -> &str {
        self.0.get(PREFIX_LEN..).filter(|s| !s.is_empty()).unwrap_or(HEADQUARTER_SUFFIX)
    }

    pub fn is_headquarter(&self) -> bool {
        self.branch_code() == HEADQUARTER_SUFFIX
    }

    /// Key of the headquarter owning this code: prefix + `XXX`.
    pub fn parent_key(&self) -> SwiftCode {
        SwiftCode(format!("{}{}", self.parent_prefix(), HEADQUARTER_SUFFIX))
    }

    /// The 11 character form. Headquarters are always persisted under it.
    pub fn expanded(&self) -> SwiftCode {
        if self.0.len() == PREFIX_LEN {
            self.parent_key()
        } else {
            self.clone()
        }
    }
}

impl fmt::Display for SwiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SwiftCode {
    type Error = BankError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SwiftCode> for String {
    fn from(code: SwiftCode) -> Self {
        code.0
    }
}

impl AsRef<str> for SwiftCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// ISO 3166 alpha-2 country code: exactly two uppercase letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn parse(raw: &str) -> Result<Self> {
        if !country_code_regex().is_match(raw) {
            return Err(BankError::invalid_format(
                "country code",
                raw,
                "must be exactly 2 uppercase letters",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = BankError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}
