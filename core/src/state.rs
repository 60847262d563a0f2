//! Legacy request state codes.
//!
//! NRO tracks request status as an append-only history of single-letter
//! state codes. The set of codes is closed but owned by the legacy system,
//! so this type names only the codes the adapter itself reads or writes and
//! round-trips everything else untouched.

use std::fmt;

/// A single-letter legacy state code.
///
/// The "current" state of a request is the one state-history row whose
/// `end_event_id` is still null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateCode(char);

impl StateCode {
    /// Draft — submitted, not yet picked up for examination.
    pub const DRAFT: Self = Self('D');

    /// Held for examination — the code written by the examine transition.
    pub const EXAMINED: Self = Self('H');

    /// Cancelled.
    pub const CANCELLED: Self = Self('C');

    /// Wrap a raw legacy code.
    #[must_use]
    pub const fn new(code: char) -> Self {
        Self(code)
    }

    /// Parse a legacy code column value.
    ///
    /// Returns `None` for an empty value; extra characters beyond the first
    /// are rejected rather than silently truncated.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => Some(Self(code)),
            _ => None,
        }
    }

    /// The raw single-letter code.
    #[must_use]
    pub const fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_codes() {
        assert_eq!(StateCode::DRAFT.as_char(), 'D');
        assert_eq!(StateCode::EXAMINED.as_char(), 'H');
        assert_eq!(StateCode::CANCELLED.as_char(), 'C');
    }

    #[test]
    fn test_parse_round_trip() {
        let parsed = StateCode::parse("H");
        assert_eq!(parsed, Some(StateCode::EXAMINED));
        assert_eq!(parsed.map(|c| c.to_string()), Some("H".to_string()));
    }

    #[test]
    fn test_parse_unknown_code_is_preserved() {
        // The code set is closed but not enumerated here; unknown codes
        // must round-trip untouched.
        let parsed = StateCode::parse("Z");
        assert_eq!(parsed, Some(StateCode::new('Z')));
    }

    #[test]
    fn test_parse_rejects_empty_and_multichar() {
        assert_eq!(StateCode::parse(""), None);
        assert_eq!(StateCode::parse("HH"), None);
    }
}
