//! Pattern analyzer (C3).
//!
//! A bottom-up walk over the parsed tree that fills in the fields the
//! parser leaves at their defaults: each [`PatternTerm`]'s
//! `frame_location` (its slot in the interpreter's backtrack frame) and
//! `input_position` (code units guaranteed consumed before it), each
//! [`PatternAlternative`]'s `minimum_size` and `once_through`, and each
//! capturing [`ParenthesesSubpattern`]'s [`ParenKind`] (Capturing /
//! Once / Terminal). Grounded on `YarrPattern.h`'s own two-pass
//! `WorkQueue`-based analysis (`resetForReparsing`, `matchesAtEndOfPattern`);
//! we don't need call-out-to-fixup reparsing, so this is implemented as a
//! direct recursive walk instead of a work queue.

use super::pattern::*;

/// Total backtrack-frame slots required to execute the analyzed pattern;
/// handed to the byte compiler (C4) to size the interpreter's frame vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameLayout {
    pub frame_size: u32,
}

pub fn analyze(pattern: &mut YarrPattern) -> FrameLayout {
    let mut next_slot = 0u32;
    let mut next_input_position = 0u32;
    analyze_disjunction(&mut pattern.body, &mut next_slot, &mut next_input_position, true);
    FrameLayout {
        frame_size: next_slot,
    }
}

fn analyze_disjunction(
    disjunction: &mut PatternDisjunction,
    next_slot: &mut u32,
    next_input_position: &mut u32,
    is_body: bool,
) -> u32 {
    // A disjunction needs one frame slot of its own (to record which
    // alternative is currently active, for backtracking into the next one)
    // whenever it has more than one alternative, or is nested (the body
    // disjunction's top-level alternatives reuse the caller's frame).
    if disjunction.alternatives.len() > 1 || !is_body {
        *next_slot += 1;
    }

    let mut min_of_min = u32::MAX;
    for alt in &mut disjunction.alternatives {
        let start_position = *next_input_position;
        let min_size = analyze_alternative(alt, next_slot, next_input_position);
        *next_input_position = start_position;
        min_of_min = min_of_min.min(min_size);
    }
    if min_of_min == u32::MAX {
        min_of_min = 0;
    }
    *next_input_position += min_of_min;
    min_of_min
}

fn analyze_alternative(
    alt: &mut PatternAlternative,
    next_slot: &mut u32,
    next_input_position: &mut u32,
) -> u32 {
    let mut minimum_size = 0u32;
    let mut once_through = true;
    let term_count = alt.terms.len();

    for (index, term) in alt.terms.iter_mut().enumerate() {
        term.input_position = *next_input_position;
        let is_last = index + 1 == term_count;

        if !term.quantifier.is_fixed_one() {
            once_through = false;
        }

        match &mut term.kind {
            TermKind::Character(_) | TermKind::CasedCharacter { .. } | TermKind::CharacterClass { .. } => {
                if term.quantifier.min > 0 {
                    minimum_size = minimum_size.saturating_add(term.quantifier.min);
                    *next_input_position += term.quantifier.min;
                }
                if !term.quantifier.is_fixed_one() {
                    term.frame_location = Some(*next_slot);
                    *next_slot += 1;
                }
            }
            TermKind::BackReference(_) | TermKind::ForwardReference(_) => {
                // A backreference to an unmatched or empty group matches the
                // empty string, so it contributes nothing to the guaranteed
                // minimum (spec §4.3).
                term.frame_location = Some(*next_slot);
                *next_slot += 1;
            }
            TermKind::Anchor(_) => {
                // zero-width; no frame slot, no size contribution.
            }
            TermKind::ParenthesesSubpattern(sub) => {
                term.frame_location = Some(*next_slot);
                *next_slot += 1;
                let inner_start = *next_input_position;
                let inner_min =
                    analyze_disjunction(&mut sub.disjunction, next_slot, next_input_position, false);
                *next_input_position = inner_start;

                sub.kind = if term.quantifier.max == 1 {
                    ParenKind::Once
                } else if is_last
                    && term.quantifier.kind == QuantifierKind::Greedy
                    && term.quantifier.max == QUANTIFY_INFINITE
                {
                    ParenKind::Terminal
                } else if sub.capturing {
                    ParenKind::Capturing
                } else {
                    ParenKind::NonCapturing
                };

                if term.quantifier.min > 0 {
                    let contributed = inner_min.saturating_mul(term.quantifier.min);
                    minimum_size = minimum_size.saturating_add(contributed);
                    *next_input_position += contributed;
                }
            }
            TermKind::ParentheticalAssertion(assertion) => {
                term.frame_location = Some(*next_slot);
                *next_slot += 1;
                let mut scratch_input_position = *next_input_position;
                analyze_disjunction(
                    &mut assertion.disjunction,
                    next_slot,
                    &mut scratch_input_position,
                    false,
                );
                // zero-width: a lookaround never advances the guaranteed
                // minimum, regardless of what it matches internally.
            }
            TermKind::DotStarEnclosure => {}
        }
    }

    alt.minimum_size = minimum_size;
    alt.once_through = once_through;
    minimum_size
}

#[cfg(test)]
mod tests {
    use super::super::flags::FlagSet;
    use super::super::parser;
    use super::*;

    fn analyzed(source: &str, flags: &str) -> YarrPattern {
        let mut pattern = parser::parse(source, FlagSet::parse(flags).unwrap()).unwrap();
        analyze(&mut pattern);
        pattern
    }

    #[test]
    fn minimum_size_counts_fixed_literals() {
        let pattern = analyzed("abc", "");
        assert_eq!(pattern.body.alternatives[0].minimum_size, 3);
    }

    #[test]
    fn minimum_size_ignores_optional_quantifiers() {
        let pattern = analyzed("ab?c", "");
        assert_eq!(pattern.body.alternatives[0].minimum_size, 2);
    }

    #[test]
    fn quantified_terms_receive_frame_slots() {
        let pattern = analyzed("a*b", "");
        let term = &pattern.body.alternatives[0].terms[0];
        assert!(term.frame_location.is_some());
    }

    #[test]
    fn fixed_single_terms_need_no_frame_slot() {
        let pattern = analyzed("ab", "");
        for term in &pattern.body.alternatives[0].terms {
            assert!(term.frame_location.is_none());
        }
    }

    #[test]
    fn once_quantified_capturing_group_is_marked_once() {
        let pattern = analyzed("(a)?", "");
        let TermKind::ParenthesesSubpattern(sub) = &pattern.body.alternatives[0].terms[0].kind else {
            panic!("expected a parentheses subpattern");
        };
        assert_eq!(sub.kind, ParenKind::Once);
    }

    #[test]
    fn minimum_size_accounts_for_required_subpattern_repeats() {
        let pattern = analyzed("(ab){2}", "");
        assert_eq!(pattern.body.alternatives[0].minimum_size, 4);
    }

    #[test]
    fn lookaround_does_not_contribute_to_minimum_size() {
        let pattern = analyzed("(?=abc)x", "u");
        assert_eq!(pattern.body.alternatives[0].minimum_size, 1);
    }
}
