//! Station code type.

use std::fmt;

use serde::Serialize;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code {input:?}: {reason}")]
pub struct InvalidStationCode {
    input: String,
    reason: &'static str,
}

/// An NS station code (e.g. `ASD`, `UT`, `RTD`, `SHL`).
///
/// Codes are short ASCII alphanumerics. The upstream API is not consistent
/// about case, so codes are normalised to uppercase on parse.
///
/// # Examples
///
/// ```
/// use ns_board::domain::StationCode;
///
/// let ut = StationCode::parse("ut").unwrap();
/// assert_eq!(ut.as_str(), "UT");
///
/// assert!(StationCode::parse("").is_err());
/// assert!(StationCode::parse("A-B").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StationCode(String);

impl StationCode {
    /// Longest code accepted. NS codes are at most 5 characters; foreign
    /// stations in the catalog occasionally use longer ones.
    const MAX_LEN: usize = 8;

    /// Parse a station code, trimming whitespace and uppercasing.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidStationCode {
                input: s.to_string(),
                reason: "must not be empty",
            });
        }

        if trimmed.len() > Self::MAX_LEN {
            return Err(InvalidStationCode {
                input: s.to_string(),
                reason: "too long",
            });
        }

        if !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(InvalidStationCode {
                input: s.to_string(),
                reason: "must be ASCII letters or digits",
            });
        }

        Ok(StationCode(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.0)
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
