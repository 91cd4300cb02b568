// ── Core identity types ──
//
// MacAddress is the only key used anywhere in the engine. Text from
// outside the process enters through `MacAddress::parse`; addresses from
// the radio arrive as raw octets and go through `from_octets`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const HEX_DIGITS: usize = 12;

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to uppercase colon-separated format (AA:BB:CC:DD:EE:FF).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Validate and canonicalize address text.
    ///
    /// Whitespace and separator punctuation are dropped and hex digits are
    /// uppercased. Exactly twelve hex digits must remain; letters outside
    /// `A-F` are rejected rather than skipped.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, CoreError> {
        let raw = raw.as_ref();
        let invalid = || CoreError::InvalidFormat {
            input: raw.to_owned(),
        };

        let mut digits = String::with_capacity(HEX_DIGITS);
        for c in raw.chars() {
            if c.is_ascii_hexdigit() {
                digits.push(c.to_ascii_uppercase());
            } else if c.is_alphanumeric() {
                return Err(invalid());
            }
        }

        if digits.len() != HEX_DIGITS {
            return Err(invalid());
        }

        let mut canonical = String::with_capacity(HEX_DIGITS + 5);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && i % 2 == 0 {
                canonical.push(':');
            }
            canonical.push(c);
        }
        Ok(Self(canonical))
    }

    /// Format six raw octets as reported by the radio driver.
    pub fn from_octets(octets: [u8; 6]) -> Self {
        let [a, b, c, d, e, f] = octets;
        Self(format!("{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{f:02X}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-function form of [`MacAddress::parse`].
pub fn normalize(text: &str) -> Result<MacAddress, CoreError> {
    MacAddress::parse(text)
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

// ── LinkId ──────────────────────────────────────────────────────────

/// Radio-assigned identifier for a live association (the AP's AID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u16);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for LinkId {
    fn from(aid: u16) -> Self {
        Self(aid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_case_normalize_to_one_form() {
        let dashed = normalize("aa-bb-cc-dd-ee-ff").unwrap();
        let bare = normalize("AABBCCDDEEFF").unwrap();
        let colons = normalize("AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(dashed, bare);
        assert_eq!(bare, colons);
        assert_eq!(colons.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let mac = normalize("  d0:39:57:e4:fb:65\n").unwrap();
        assert_eq!(mac.as_str(), "D0:39:57:E4:FB:65");
    }

    #[test]
    fn mixed_separators_are_accepted() {
        let mac = normalize("D0:39:57-E4-FB-65").unwrap();
        assert_eq!(mac.as_str(), "D0:39:57:E4:FB:65");
    }

    #[test]
    fn short_address_is_rejected() {
        let err = normalize("AA:BB:CC").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { ref input } if input == "AA:BB:CC"));
    }

    #[test]
    fn too_many_digits_are_rejected() {
        assert!(normalize("AA:BB:CC:DD:EE:FF:00").is_err());
    }

    #[test]
    fn non_hex_letters_are_rejected() {
        assert!(normalize("AA:BB:CC:DD:EE:GG").is_err());
        assert!(normalize("ZZAABBCCDDEEFF").is_err());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
    }

    #[test]
    fn octets_format_uppercase() {
        let mac = MacAddress::from_octets([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        assert_eq!(mac.to_string(), "DE:AD:BE:EF:00:01");
    }

    #[test]
    fn parse_via_from_str() {
        let mac: MacAddress = "aabb.ccdd.eeff".parse().unwrap();
        assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn serde_round_trips_through_canonical_text() {
        let mac: MacAddress = serde_json::from_str("\"aa-bb-cc-dd-ee-ff\"").unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"AA:BB:CC:DD:EE:FF\"");
        assert!(serde_json::from_str::<MacAddress>("\"nope\"").is_err());
    }
}
