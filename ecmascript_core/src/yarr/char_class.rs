//! Character-class builder (C1).
//!
//! Builds canonical code-point sets: sorted, merged, non-overlapping ranges
//! split at the BMP boundary (`ranges` vs `rangesUnicode`) plus isolated
//! `matches`/`matchesUnicode` code points, per spec §3/§4.1. Also tracks
//! `mayContainStrings` and the actual multi-code-point string alternatives
//! it represents (supplemented from the original's class-string-disjunction
//! handling, spec §9 Open Question + SPEC_FULL §C.2), since a flag alone
//! isn't enough to compute set operations against a string-bearing operand.

use std::collections::BTreeSet;

const BMP_MAX: u32 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CodeRange {
    pub lo: u32,
    pub hi: u32,
}

/// A finalized, canonical code-point set.
///
/// Invariant (spec §3): for any code point `c`, membership is decidable in
/// `O(log n)` over `ranges`/`rangesUnicode` (binary search; see
/// [`CharacterClass::contains`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterClass {
    pub ranges: Vec<CodeRange>,
    pub ranges_unicode: Vec<CodeRange>,
    pub matches: Vec<u32>,
    pub matches_unicode: Vec<u32>,
    /// `\q{...}` string alternatives this class additionally matches
    /// (UnicodeSets mode only). Non-empty implies `may_contain_strings`.
    pub strings: BTreeSet<Vec<u32>>,
}

impl CharacterClass {
    pub fn may_contain_strings(&self) -> bool {
        !self.strings.is_empty()
    }

    /// `O(log n)` membership test via binary search over the merged ranges,
    /// falling back to the isolated singleton lists.
    pub fn contains(&self, c: u32) -> bool {
        let (ranges, singles) = if c <= BMP_MAX {
            (&self.ranges, &self.matches)
        } else {
            (&self.ranges_unicode, &self.matches_unicode)
        };
        if ranges
            .binary_search_by(|r| {
                if c < r.lo {
                    std::cmp::Ordering::Greater
                } else if c > r.hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
        {
            return true;
        }
        singles.contains(&c)
    }
}

/// Accumulates ranges/code points/strings before canonicalization.
#[derive(Debug, Clone, Default)]
pub struct CharacterClassBuilder {
    invert: bool,
    raw: Vec<CodeRange>,
    strings: BTreeSet<Vec<u32>>,
}

impl CharacterClassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invert(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    pub fn add_code_point(&mut self, c: u32) {
        self.raw.push(CodeRange { lo: c, hi: c });
    }

    pub fn add_range(&mut self, lo: u32, hi: u32) {
        debug_assert!(lo <= hi);
        self.raw.push(CodeRange { lo, hi });
    }

    pub fn add_string(&mut self, s: Vec<u32>) {
        if s.len() == 1 {
            self.add_code_point(s[0]);
        } else {
            self.strings.insert(s);
        }
    }

    /// Applies ASCII (legacy) or Unicode simple case folding to every
    /// accumulated range/code point in place, per spec §4.1's case-folding
    /// policy. Must run before `finalize` when `ignoreCase` is set.
    pub fn case_fold(&mut self, unicode_mode: bool) {
        let originals = std::mem::take(&mut self.raw);
        for r in originals {
            self.raw.push(r);
            for c in r.lo..=r.hi {
                for folded in fold_code_point(c, unicode_mode) {
                    if folded != c {
                        self.raw.push(CodeRange {
                            lo: folded,
                            hi: folded,
                        });
                    }
                }
            }
        }
    }

    pub fn union_class(&mut self, other: &CharacterClass) {
        self.raw.extend(other.ranges.iter().copied());
        self.raw.extend(other.ranges_unicode.iter().copied());
        self.raw
            .extend(other.matches.iter().map(|&c| CodeRange { lo: c, hi: c }));
        self.raw.extend(
            other
                .matches_unicode
                .iter()
                .map(|&c| CodeRange { lo: c, hi: c }),
        );
        self.strings.extend(other.strings.iter().cloned());
    }

    /// Canonicalizes the accumulated ranges: sorts, merges
    /// overlapping/adjacent spans, splits at the BMP boundary, and applies
    /// the pending `invert` (over the full Unicode scalar range,
    /// 0..=0x10FFFF excluding surrogates implicitly via range math on the
    /// caller's intent — inversion of a class with strings is rejected by
    /// the parser before reaching here per `NegatedClassSetMayContainStrings`).
    pub fn finalize(mut self) -> CharacterClass {
        self.raw.sort();
        let mut merged: Vec<CodeRange> = Vec::with_capacity(self.raw.len());
        for r in self.raw {
            if let Some(last) = merged.last_mut() {
                if r.lo <= last.hi.saturating_add(1) {
                    last.hi = last.hi.max(r.hi);
                    continue;
                }
            }
            merged.push(r);
        }

        if self.invert {
            merged = invert_ranges(&merged, 0x10FFFF);
        }

        let mut ranges = Vec::new();
        let mut ranges_unicode = Vec::new();
        for r in merged {
            if r.hi <= BMP_MAX {
                ranges.push(r);
            } else if r.lo > BMP_MAX {
                ranges_unicode.push(r);
            } else {
                ranges.push(CodeRange {
                    lo: r.lo,
                    hi: BMP_MAX,
                });
                ranges_unicode.push(CodeRange {
                    lo: BMP_MAX + 1,
                    hi: r.hi,
                });
            }
        }

        CharacterClass {
            ranges,
            ranges_unicode,
            matches: Vec::new(),
            matches_unicode: Vec::new(),
            strings: self.strings,
        }
    }
}

fn invert_ranges(sorted_merged: &[CodeRange], max: u32) -> Vec<CodeRange> {
    let mut out = Vec::new();
    let mut cursor = 0u32;
    for r in sorted_merged {
        if r.lo > cursor {
            out.push(CodeRange {
                lo: cursor,
                hi: r.lo - 1,
            });
        }
        cursor = r.hi.saturating_add(1);
        if cursor == 0 {
            // overflowed past u32::MAX; nothing more to invert.
            return out;
        }
    }
    if cursor <= max {
        out.push(CodeRange { lo: cursor, hi: max });
    }
    out
}

/// ASCII or Unicode simple case-fold of a single scalar value, matching
/// spec §4.1: under `/u` or `/v`, Unicode simple case folding; otherwise
/// ASCII case folding on A-Z/a-z only. Returns the set of code points `c`
/// is equivalent to (excluding `c` itself when there is none).
fn fold_code_point(c: u32, unicode_mode: bool) -> Vec<u32> {
    let Some(ch) = char::from_u32(c) else {
        return Vec::new();
    };
    if !unicode_mode {
        if ch.is_ascii_uppercase() {
            return vec![ch.to_ascii_lowercase() as u32];
        }
        if ch.is_ascii_lowercase() {
            return vec![ch.to_ascii_uppercase() as u32];
        }
        return Vec::new();
    }
    // Unicode simple case folding: approximate via `to_uppercase`/
    // `to_lowercase` single-scalar results, matching the common case of
    // simple (not full, multi-character) folding used by RegExp ignoreCase.
    let mut out = Vec::new();
    for folded in ch.to_lowercase().chain(ch.to_uppercase()) {
        if folded as u32 != c {
            out.push(folded as u32);
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_adjacent_and_overlapping_ranges() {
        let mut b = CharacterClassBuilder::new();
        b.add_range('a' as u32, 'c' as u32);
        b.add_range('d' as u32, 'f' as u32);
        b.add_range('b' as u32, 'e' as u32);
        let class = b.finalize();
        assert_eq!(class.ranges, vec![CodeRange { lo: 97, hi: 102 }]);
    }

    #[test]
    fn canonical_form_is_unique_for_equivalent_descriptions() {
        let mut a = CharacterClassBuilder::new();
        a.add_range('a' as u32, 'z' as u32);
        a.add_code_point('m' as u32);

        let mut b = CharacterClassBuilder::new();
        b.add_code_point('m' as u32);
        b.add_range('a' as u32, 'z' as u32);

        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn splits_at_bmp_boundary() {
        let mut b = CharacterClassBuilder::new();
        b.add_range(0xFFF0, 0x10010);
        let class = b.finalize();
        assert_eq!(class.ranges, vec![CodeRange { lo: 0xFFF0, hi: 0xFFFF }]);
        assert_eq!(
            class.ranges_unicode,
            vec![CodeRange {
                lo: 0x10000,
                hi: 0x10010
            }]
        );
    }

    #[test]
    fn contains_is_log_n_binary_search() {
        let mut b = CharacterClassBuilder::new();
        for i in 0..50u32 {
            b.add_range(i * 10, i * 10 + 3);
        }
        let class = b.finalize();
        assert!(class.contains(205));
        assert!(!class.contains(207));
    }

    #[test]
    fn invert_covers_the_complement() {
        let mut b = CharacterClassBuilder::new();
        b.add_range('a' as u32, 'z' as u32);
        let class = b.invert().finalize();
        assert!(!class.contains('m' as u32));
        assert!(class.contains('0' as u32));
    }

    #[test]
    fn ascii_ignore_case_folds_only_az() {
        let mut b = CharacterClassBuilder::new();
        b.add_code_point('k' as u32);
        b.case_fold(false);
        let class = b.finalize();
        assert!(class.contains('k' as u32));
        assert!(class.contains('K' as u32));
    }
}
