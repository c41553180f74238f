//! RegExp flag parsing and canonicalization (C6).
//!
//! Grounded on `third_party/yarr/YarrFlags.cpp`: a single left-to-right scan
//! rejecting unknown letters and duplicates, plus the `u`/`v` exclusivity
//! rule.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    HasIndices,
    Global,
    IgnoreCase,
    Multiline,
    DotAll,
    Unicode,
    UnicodeSets,
    Sticky,
}

impl Flag {
    const fn letter(self) -> char {
        match self {
            Flag::HasIndices => 'd',
            Flag::Global => 'g',
            Flag::IgnoreCase => 'i',
            Flag::Multiline => 'm',
            Flag::DotAll => 's',
            Flag::Unicode => 'u',
            Flag::UnicodeSets => 'v',
            Flag::Sticky => 'y',
        }
    }

    const fn from_letter(c: char) -> Option<Flag> {
        Some(match c {
            'd' => Flag::HasIndices,
            'g' => Flag::Global,
            'i' => Flag::IgnoreCase,
            'm' => Flag::Multiline,
            's' => Flag::DotAll,
            'u' => Flag::Unicode,
            'v' => Flag::UnicodeSets,
            'y' => Flag::Sticky,
            _ => return None,
        })
    }

    /// Canonical serialization order: `d g i m s u v y`.
    const CANONICAL_ORDER: [Flag; 8] = [
        Flag::HasIndices,
        Flag::Global,
        Flag::IgnoreCase,
        Flag::Multiline,
        Flag::DotAll,
        Flag::Unicode,
        Flag::UnicodeSets,
        Flag::Sticky,
    ];
}

/// The parsed, canonicalized set of flags for one RegExp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagSet(u8);

impl FlagSet {
    pub const EMPTY: FlagSet = FlagSet(0);

    fn bit(flag: Flag) -> u8 {
        1 << (flag as u8)
    }

    pub fn contains(self, flag: Flag) -> bool {
        self.0 & Self::bit(flag) != 0
    }

    fn insert(&mut self, flag: Flag) {
        self.0 |= Self::bit(flag);
    }

    pub fn has_indices(self) -> bool {
        self.contains(Flag::HasIndices)
    }
    pub fn global(self) -> bool {
        self.contains(Flag::Global)
    }
    pub fn ignore_case(self) -> bool {
        self.contains(Flag::IgnoreCase)
    }
    pub fn multiline(self) -> bool {
        self.contains(Flag::Multiline)
    }
    pub fn dot_all(self) -> bool {
        self.contains(Flag::DotAll)
    }
    pub fn unicode(self) -> bool {
        self.contains(Flag::Unicode)
    }
    pub fn unicode_sets(self) -> bool {
        self.contains(Flag::UnicodeSets)
    }
    pub fn sticky(self) -> bool {
        self.contains(Flag::Sticky)
    }

    /// True when the pattern is parsed in Unicode or UnicodeSets mode;
    /// these two modes share most parser behavior (spec §4.2).
    pub fn unicode_mode(self) -> bool {
        self.unicode() || self.unicode_sets()
    }

    /// Parses a flags string per spec §4.6: only `dgimsuvy`, no duplicates,
    /// `u` and `v` mutually exclusive. Returns `None` (not an `ErrorCode`
    /// directly - the caller maps this to `InvalidRegularExpressionFlags`).
    pub fn parse(source: &str) -> Option<FlagSet> {
        let mut flags = FlagSet::EMPTY;
        for c in source.chars() {
            let flag = Flag::from_letter(c)?;
            if flags.contains(flag) {
                return None;
            }
            flags.insert(flag);
        }
        if flags.unicode() && flags.unicode_sets() {
            return None;
        }
        Some(flags)
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in Flag::CANONICAL_ORDER {
            if self.contains(flag) {
                f.write_char_helper(flag.letter())?;
            }
        }
        Ok(())
    }
}

trait WriteCharHelper {
    fn write_char_helper(&mut self, c: char) -> fmt::Result;
}

impl WriteCharHelper for fmt::Formatter<'_> {
    fn write_char_helper(&mut self, c: char) -> fmt::Result {
        use fmt::Write;
        self.write_char(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_canonical_order() {
        let flags = FlagSet::parse("ymgi").unwrap();
        assert_eq!(flags.to_string(), "gimy");
    }

    #[test]
    fn rejects_duplicate_letters() {
        assert!(FlagSet::parse("gg").is_none());
    }

    #[test]
    fn rejects_unknown_letters() {
        assert!(FlagSet::parse("x").is_none());
    }

    #[test]
    fn rejects_u_and_v_together() {
        assert!(FlagSet::parse("uv").is_none());
    }

    #[test]
    fn empty_flags_parse_to_empty_set() {
        let flags = FlagSet::parse("").unwrap();
        assert_eq!(flags, FlagSet::EMPTY);
        assert_eq!(flags.to_string(), "");
    }
}
