//! Bytecode interpreter (C5).
//!
//! A backtracking matcher over the tree-shaped [`BytecodePattern`] from
//! `bytecode.rs`. In place of `YarrInterpreter.cpp`'s explicit frame stack
//! indexed by `frameLocation`, backtracking state here lives on the native
//! call stack via a continuation represented as a borrowed, stack-allocated
//! cons-list (`Cont`): each choice point (quantifier repetition count,
//! alternative-in-a-disjunction) is one recursive call, and failure
//! (`None`) pops back to the nearest untried choice exactly the way a
//! frame-stack pop would. This trades the frame vector's reuse for
//! recursion depth bounded by match complexity; see [`DEPTH_LIMIT`].
//!
//! A parenthesized subpattern is not special-cased structurally: matching
//! its body is just another `run` call whose continuation records the
//! subpattern's captured span and then resumes whatever continuation the
//! subpattern itself was matched under. That uniformity is what lets
//! arbitrarily nested groups, alternations and quantifiers compose without
//! a parallel family of functions per nesting level.

use super::bytecode::*;
use super::char_class::CharacterClass;
use super::flags::FlagSet;
use super::pattern::{MatchDirection, Quantifier, QuantifierKind};
use super::stack_check::StackCheck;
use crate::text::StringView;

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub start: usize,
    pub end: usize,
    /// Index `i` (0-based) holds capturing group `i + 1`'s span.
    pub captures: Vec<Option<(usize, usize)>>,
}

/// Raised in place of an ordinary no-match when the backtracking recursion
/// bound is hit (spec §5's "pattern too complicated" signal), so a caller
/// can tell "this input doesn't match" from "this pattern can't be run
/// safely" apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooComplicated;

pub type ExecOutcome = Result<Option<MatchResult>, TooComplicated>;

/// Tries the pattern starting exactly at `start` (sticky semantics); on
/// success returns the match. Does not scan forward.
pub fn execute_at(program: &BytecodePattern, input: StringView<'_>, start: usize) -> ExecOutcome {
    let mut matcher = Matcher::new(program, input);
    let end = matcher.run_disjunction(&program.body, start, MatchDirection::Forward, &Cont::Done);
    if matcher.too_complicated {
        return Err(TooComplicated);
    }
    Ok(end.map(|end| MatchResult {
        start,
        end,
        captures: matcher.captures,
    }))
}

/// Scans forward from `start` (inclusive) for the first position at which
/// the pattern matches (non-sticky `exec`/`match` semantics).
pub fn search(program: &BytecodePattern, input: StringView<'_>, start: usize) -> ExecOutcome {
    if program.flags.sticky() {
        return execute_at(program, input, start);
    }
    for pos in start..=input.len() {
        let mut matcher = Matcher::new(program, input);
        let end = matcher.run_disjunction(&program.body, pos, MatchDirection::Forward, &Cont::Done);
        if matcher.too_complicated {
            return Err(TooComplicated);
        }
        if let Some(end) = end {
            return Ok(Some(MatchResult {
                start: pos,
                end,
                captures: matcher.captures,
            }));
        }
    }
    Ok(None)
}

/// A stack-allocated, borrowed continuation: "what remains to be matched
/// after the current point succeeds." Each variant is exactly one kind of
/// choice point that can be backtracked into.
#[derive(Clone, Copy)]
enum Cont<'c> {
    Done,
    /// Remaining terms of an alternative, matched in `direction`.
    TermSeq(&'c [ByteCompiledTerm], usize, MatchDirection, &'c Cont<'c>),
    /// One more attempt at repeating a quantified subpattern, plus the
    /// zero-width-iteration guard's `entry_pos`.
    RepeatSubpattern {
        sub: &'c ByteSubpattern,
        quantifier: Quantifier,
        count: u32,
        entry_pos: usize,
        direction: MatchDirection,
        next: &'c Cont<'c>,
    },
    /// One more attempt at repeating a quantified atomic term.
    RepeatAtom {
        term: &'c ByteTerm,
        quantifier: Quantifier,
        count: u32,
        direction: MatchDirection,
        next: &'c Cont<'c>,
    },
    /// Reached when a subpattern's body has fully matched: records its
    /// capture span, then resumes whatever the subpattern's own
    /// continuation was.
    RecordCapture {
        subpattern_id: u32,
        capturing: bool,
        entry_pos: usize,
        direction: MatchDirection,
        next: &'c Cont<'c>,
    },
}

struct Matcher<'m> {
    program: &'m BytecodePattern,
    input: StringView<'m>,
    flags: FlagSet,
    captures: Vec<Option<(usize, usize)>>,
    stack: StackCheck,
    /// Set once and never cleared: the recursion bound was hit somewhere
    /// in this attempt, so any `None` bubbling out of it means "too
    /// complicated to run," not "didn't match."
    too_complicated: bool,
}

const DEPTH_LIMIT: u32 = 200_000;

impl<'m> Matcher<'m> {
    fn new(program: &'m BytecodePattern, input: StringView<'m>) -> Self {
        Matcher {
            program,
            input,
            flags: program.flags,
            captures: vec![None; program.num_subpatterns as usize],
            stack: StackCheck::new(DEPTH_LIMIT),
            too_complicated: false,
        }
    }

    /// Runs the given continuation, guarding against pathological
    /// recursion depth.
    fn run(&mut self, cont: &Cont<'_>, pos: usize) -> Option<usize> {
        if !self.stack.enter() {
            self.too_complicated = true;
            return None;
        }
        let result = self.run_inner(cont, pos);
        self.stack.exit();
        result
    }

    /// Matches on `*cont` (`Cont` is `Copy`) rather than `cont` so every
    /// bound field comes out as a plain value or single reference — binding
    /// through `&Cont` directly would double up each already-reference-typed
    /// field under match ergonomics.
    fn run_inner(&mut self, cont: &Cont<'_>, pos: usize) -> Option<usize> {
        match *cont {
            Cont::Done => Some(pos),
            Cont::TermSeq(terms, index, direction, next) => {
                if index == terms.len() {
                    self.run(next, pos)
                } else {
                    self.match_term(terms, index, pos, direction, next)
                }
            }
            Cont::RepeatSubpattern {
                sub,
                quantifier,
                count,
                entry_pos,
                direction,
                next,
            } => {
                if pos == entry_pos && count >= quantifier.min {
                    None
                } else {
                    self.match_repeat_subpattern(sub, quantifier, count + 1, pos, direction, next)
                }
            }
            Cont::RepeatAtom {
                term,
                quantifier,
                count,
                direction,
                next,
            } => self.repeat_atom_from(term, quantifier, pos, count, direction, next),
            Cont::RecordCapture {
                subpattern_id,
                capturing,
                entry_pos,
                direction,
                next,
            } => {
                if capturing {
                    let (start, end) = match direction {
                        MatchDirection::Forward => (entry_pos, pos),
                        MatchDirection::Backward => (pos, entry_pos),
                    };
                    self.captures[(subpattern_id - 1) as usize] = Some((start, end));
                }
                self.run(next, pos)
            }
        }
    }

    /// A disjunction is "try alternative 0, or on failure alternative 1,
    /// ...". Matching one alternative means matching its term sequence
    /// with `next` as the eventual continuation once all its terms
    /// succeed.
    fn try_alternatives(
        &mut self,
        alternatives: &[ByteAlternative],
        index: usize,
        pos: usize,
        direction: MatchDirection,
        next: &Cont<'_>,
    ) -> Option<usize> {
        if index >= alternatives.len() {
            return None;
        }
        let term_seq = Cont::TermSeq(&alternatives[index].terms, 0, direction, next);
        if let Some(end) = self.run(&term_seq, pos) {
            return Some(end);
        }
        self.try_alternatives(alternatives, index + 1, pos, direction, next)
    }

    fn run_disjunction(
        &mut self,
        disjunction: &ByteDisjunction,
        pos: usize,
        direction: MatchDirection,
        next: &Cont<'_>,
    ) -> Option<usize> {
        self.try_alternatives(&disjunction.alternatives, 0, pos, direction, next)
    }

    fn match_term(
        &mut self,
        terms: &[ByteCompiledTerm],
        index: usize,
        pos: usize,
        direction: MatchDirection,
        next: &Cont<'_>,
    ) -> Option<usize> {
        let ct = &terms[index];
        let rest = Cont::TermSeq(terms, index + 1, direction, next);
        match &ct.term {
            ByteTerm::Character(_)
            | ByteTerm::CasedCharacter { .. }
            | ByteTerm::CharacterClass { .. }
            | ByteTerm::BackReference(_)
            | ByteTerm::Anchor(_) => self.match_quantified_atom(&ct.term, ct.quantifier, pos, direction, &rest),
            ByteTerm::Subpattern(sub) => {
                if ct.quantifier.is_fixed_one() {
                    self.match_subpattern_once(sub, pos, direction, &rest)
                } else {
                    self.match_repeat_subpattern(sub, ct.quantifier, 0, pos, direction, &rest)
                }
            }
            ByteTerm::Assertion(assertion) => {
                if self.check_assertion(assertion, pos) {
                    self.run(&rest, pos)
                } else {
                    None
                }
            }
            ByteTerm::DotStarEnclosure { .. } => self.run(&rest, pos),
        }
    }

    /// Matches a subpattern's body exactly once, recording its capture
    /// span before resuming `next`.
    fn match_subpattern_once(
        &mut self,
        sub: &ByteSubpattern,
        pos: usize,
        direction: MatchDirection,
        next: &Cont<'_>,
    ) -> Option<usize> {
        let saved = sub.capturing.then(|| self.captures[(sub.subpattern_id - 1) as usize]);
        let record = Cont::RecordCapture {
            subpattern_id: sub.subpattern_id,
            capturing: sub.capturing,
            entry_pos: pos,
            direction,
            next,
        };
        if let Some(end) = self.run_disjunction(&sub.disjunction, pos, direction, &record) {
            return Some(end);
        }
        if let (true, Some(saved)) = (sub.capturing, saved) {
            self.captures[(sub.subpattern_id - 1) as usize] = saved;
        }
        None
    }

    fn match_repeat_subpattern(
        &mut self,
        sub: &ByteSubpattern,
        quantifier: Quantifier,
        count: u32,
        pos: usize,
        direction: MatchDirection,
        next: &Cont<'_>,
    ) -> Option<usize> {
        let greedy = !matches!(quantifier.kind, QuantifierKind::NonGreedy);

        if greedy {
            if count < quantifier.max {
                if let Some(end) = self.try_one_more_repetition(sub, quantifier, count, pos, direction, next) {
                    return Some(end);
                }
            }
            if count >= quantifier.min {
                return self.run(next, pos);
            }
            None
        } else {
            if count >= quantifier.min {
                if let Some(end) = self.run(next, pos) {
                    return Some(end);
                }
            }
            if count < quantifier.max {
                return self.try_one_more_repetition(sub, quantifier, count, pos, direction, next);
            }
            None
        }
    }

    fn try_one_more_repetition(
        &mut self,
        sub: &ByteSubpattern,
        quantifier: Quantifier,
        count: u32,
        pos: usize,
        direction: MatchDirection,
        next: &Cont<'_>,
    ) -> Option<usize> {
        let saved = sub.capturing.then(|| self.captures[(sub.subpattern_id - 1) as usize]);
        let continuation = Cont::RepeatSubpattern {
            sub,
            quantifier,
            count,
            entry_pos: pos,
            direction,
            next,
        };
        let record = Cont::RecordCapture {
            subpattern_id: sub.subpattern_id,
            capturing: sub.capturing,
            entry_pos: pos,
            direction,
            next: &continuation,
        };
        let result = self.run_disjunction(&sub.disjunction, pos, direction, &record);
        if result.is_none() {
            if let (true, Some(saved)) = (sub.capturing, saved) {
                self.captures[(sub.subpattern_id - 1) as usize] = saved;
            }
        }
        result
    }

    // ---- quantified atomic terms --------------------------------------

    fn match_quantified_atom(
        &mut self,
        term: &ByteTerm,
        quantifier: Quantifier,
        pos: usize,
        direction: MatchDirection,
        rest: &Cont<'_>,
    ) -> Option<usize> {
        if quantifier.is_fixed_one() {
            let next_pos = self.match_atom_once(term, pos, direction)?;
            return self.run(rest, next_pos);
        }
        self.repeat_atom_from(term, quantifier, pos, 0, direction, rest)
    }

    fn repeat_atom_from(
        &mut self,
        term: &ByteTerm,
        quantifier: Quantifier,
        pos: usize,
        count: u32,
        direction: MatchDirection,
        rest: &Cont<'_>,
    ) -> Option<usize> {
        let greedy = !matches!(quantifier.kind, QuantifierKind::NonGreedy);

        if greedy {
            if count < quantifier.max {
                if let Some(end) = self.try_one_more_atom(term, quantifier, count, pos, direction, rest) {
                    return Some(end);
                }
            }
            if count >= quantifier.min {
                return self.run(rest, pos);
            }
            None
        } else {
            if count >= quantifier.min {
                if let Some(end) = self.run(rest, pos) {
                    return Some(end);
                }
            }
            if count < quantifier.max {
                return self.try_one_more_atom(term, quantifier, count, pos, direction, rest);
            }
            None
        }
    }

    fn try_one_more_atom(
        &mut self,
        term: &ByteTerm,
        quantifier: Quantifier,
        count: u32,
        pos: usize,
        direction: MatchDirection,
        rest: &Cont<'_>,
    ) -> Option<usize> {
        let next_pos = self.match_atom_once(term, pos, direction)?;
        if next_pos == pos {
            // Zero-width atom: one more repetition can never help.
            return None;
        }
        let continuation = Cont::RepeatAtom {
            term,
            quantifier,
            count: count + 1,
            direction,
            next: rest,
        };
        self.run(&continuation, next_pos)
    }

    /// Matches one occurrence of a non-subpattern atom, returning the
    /// resulting position (moved forward or backward one unit/scalar per
    /// `direction`), or `None` if it doesn't match at `pos`.
    fn match_atom_once(&self, term: &ByteTerm, pos: usize, direction: MatchDirection) -> Option<usize> {
        match term {
            ByteTerm::Character(c) => self.match_scalar(pos, direction, |scalar| scalar == *c),
            ByteTerm::CasedCharacter { lo, hi } => {
                self.match_scalar(pos, direction, |scalar| scalar == *lo || scalar == *hi)
            }
            ByteTerm::CharacterClass { class, invert } => {
                let invert = *invert;
                self.match_scalar(pos, direction, |scalar| {
                    class_contains_ignoring_case(class, scalar, self.flags.ignore_case(), self.flags.unicode_mode())
                        != invert
                })
            }
            ByteTerm::BackReference(id) => self.match_backreference(*id, pos, direction),
            ByteTerm::Anchor(anchor) => self.match_anchor(anchor, pos).then_some(pos),
            ByteTerm::Subpattern(_) | ByteTerm::Assertion(_) | ByteTerm::DotStarEnclosure { .. } => {
                unreachable!("not an atomic term")
            }
        }
    }

    fn match_scalar(&self, pos: usize, direction: MatchDirection, pred: impl Fn(u32) -> bool) -> Option<usize> {
        match direction {
            MatchDirection::Forward => {
                if pos >= self.input.len() {
                    return None;
                }
                let (scalar, consumed) = if self.flags.unicode_mode() {
                    self.input.code_point_at(pos)
                } else {
                    (self.input.code_unit_at(pos) as u32, 1)
                };
                pred(scalar).then_some(pos + consumed)
            }
            MatchDirection::Backward => {
                if pos == 0 {
                    return None;
                }
                let (scalar, consumed) = if self.flags.unicode_mode() {
                    self.input.code_point_before(pos)
                } else {
                    (self.input.code_unit_at(pos - 1) as u32, 1)
                };
                pred(scalar).then_some(pos - consumed)
            }
        }
    }

    fn match_anchor(&self, anchor: &ByteAnchor, pos: usize) -> bool {
        match anchor {
            ByteAnchor::BeginningOfLine => {
                pos == 0 || (self.flags.multiline() && is_line_terminator(self.code_unit_before(pos)))
            }
            ByteAnchor::EndOfLine => {
                pos == self.input.len() || (self.flags.multiline() && is_line_terminator(self.code_unit_at(pos)))
            }
            ByteAnchor::WordBoundary { invert } => {
                let before = is_word_char(self.code_unit_before(pos));
                let after = is_word_char(self.code_unit_at(pos));
                (before != after) != *invert
            }
        }
    }

    fn code_unit_at(&self, pos: usize) -> Option<u16> {
        (pos < self.input.len()).then(|| self.input.code_unit_at(pos))
    }

    fn code_unit_before(&self, pos: usize) -> Option<u16> {
        (pos > 0).then(|| self.input.code_unit_at(pos - 1))
    }

    fn match_backreference(&self, id: u32, pos: usize, direction: MatchDirection) -> Option<usize> {
        let Some((start, end)) = self.resolve_capture(id) else {
            // Legacy mode: an unmatched group's backreference matches the
            // empty string. Unicode/UnicodeSets modes: it fails to match.
            return if self.flags.unicode_mode() { None } else { Some(pos) };
        };
        let len = end - start;
        match direction {
            MatchDirection::Forward => {
                if pos + len > self.input.len() {
                    return None;
                }
                for i in 0..len {
                    if !self.units_equal(start + i, pos + i) {
                        return None;
                    }
                }
                Some(pos + len)
            }
            MatchDirection::Backward => {
                if len > pos {
                    return None;
                }
                for i in 0..len {
                    if !self.units_equal(start + i, pos - len + i) {
                        return None;
                    }
                }
                Some(pos - len)
            }
        }
    }

    fn units_equal(&self, captured_index: usize, input_index: usize) -> bool {
        let a = self.input.code_unit_at(captured_index);
        let b = self.input.code_unit_at(input_index);
        a == b || (self.flags.ignore_case() && ascii_fold(a) == ascii_fold(b))
    }

    /// A plain numeric backreference (`\1`) always means the group at that
    /// exact textual position, so its own slot is authoritative. `\k<name>`
    /// compiles to the lowest id sharing that name (see parser.rs), and only
    /// one of the alternatives sharing a duplicate name can have matched in
    /// a given attempt — so if the referenced id's own slot is unset, we
    /// fall back to whichever sibling id shares its canonical group identity
    /// and is set. This is the "duplicate-group resolution happens at match
    /// time" the parser defers here.
    fn resolve_capture(&self, id: u32) -> Option<(usize, usize)> {
        if let Some(span) = self.captures.get((id - 1) as usize).copied().flatten() {
            return Some(span);
        }
        let canonical = self
            .program
            .duplicate_named_group_for_subpattern_id
            .get(&id)
            .copied()
            .unwrap_or(id);
        self.program
            .duplicate_named_group_for_subpattern_id
            .iter()
            .filter(|&(&other_id, &other_canonical)| other_id != id && other_canonical == canonical)
            .find_map(|(&other_id, _)| self.captures.get((other_id - 1) as usize).copied().flatten())
    }

    // ---- lookaround assertions ------------------------------------------

    /// Lookaround bodies are matched to completion (`Cont::Done`) rather
    /// than threaded into the enclosing continuation: ECMAScript only
    /// needs to know whether *some* path through the assertion's body
    /// succeeds. A successful, non-inverted lookaround keeps the capture
    /// groups that path set (they become visible to the rest of the
    /// pattern and the final result); a failed or inverted match rolls
    /// capture state back to what it was before the attempt.
    fn check_assertion(&mut self, assertion: &ByteAssertion, pos: usize) -> bool {
        let saved_captures = self.captures.clone();
        let matched = self
            .run_disjunction(&assertion.disjunction, pos, assertion.direction, &Cont::Done)
            .is_some();
        let success = matched != assertion.invert;
        if !success || assertion.invert {
            self.captures = saved_captures;
        }
        success
    }
}

fn is_line_terminator(unit: Option<u16>) -> bool {
    matches!(unit, Some(0x000A) | Some(0x000D) | Some(0x2028) | Some(0x2029))
}

fn is_word_char(unit: Option<u16>) -> bool {
    match unit {
        Some(u) => {
            let c = u as u32;
            (b'a' as u32..=b'z' as u32).contains(&c)
                || (b'A' as u32..=b'Z' as u32).contains(&c)
                || (b'0' as u32..=b'9' as u32).contains(&c)
                || c == b'_' as u32
        }
        None => false,
    }
}

fn ascii_fold(unit: u16) -> u16 {
    if (b'A' as u16..=b'Z' as u16).contains(&unit) {
        unit + 32
    } else {
        unit
    }
}

fn class_contains_ignoring_case(class: &CharacterClass, scalar: u32, ignore_case: bool, unicode_mode: bool) -> bool {
    if class.contains(scalar) {
        return true;
    }
    if !ignore_case {
        return false;
    }
    let Some(ch) = char::from_u32(scalar) else {
        return false;
    };
    if !unicode_mode {
        if ch.is_ascii_uppercase() && class.contains(ch.to_ascii_lowercase() as u32) {
            return true;
        }
        if ch.is_ascii_lowercase() && class.contains(ch.to_ascii_uppercase() as u32) {
            return true;
        }
        return false;
    }
    ch.to_lowercase()
        .chain(ch.to_uppercase())
        .any(|folded| folded as u32 != scalar && class.contains(folded as u32))
}

#[cfg(test)]
mod tests {
    use super::super::flags::FlagSet;
    use super::super::{analyzer, bytecode, parser};
    use super::*;

    fn run(source: &str, flags: &str, input: &str, start: usize) -> Option<MatchResult> {
        let mut pattern = parser::parse(source, FlagSet::parse(flags).unwrap()).unwrap();
        analyzer::analyze(&mut pattern);
        let program = bytecode::compile(&pattern);
        let units: Vec<u16> = input.encode_utf16().collect();
        let view = StringView::Utf16(&units);
        search(&program, view, start).expect("pattern should not be too complicated")
    }

    #[test]
    fn matches_plain_literal() {
        let m = run("abc", "", "xxabcxx", 0).unwrap();
        assert_eq!((m.start, m.end), (2, 5));
    }

    #[test]
    fn greedy_star_consumes_maximally() {
        let m = run("a*", "", "aaab", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 3));
    }

    #[test]
    fn lazy_star_consumes_minimally() {
        let m = run("a*?b", "", "aaab", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 4));
    }

    #[test]
    fn alternation_picks_first_matching_branch() {
        let m = run("a|ab", "", "ab", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 1));
    }

    #[test]
    fn capturing_group_records_span() {
        let m = run("a(b+)c", "", "abbbc", 0).unwrap();
        assert_eq!(m.captures[0], Some((1, 4)));
    }

    #[test]
    fn backreference_matches_prior_capture() {
        let m = run(r"(ab)\1", "", "abab", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 4));
    }

    #[test]
    fn unmatched_backreference_in_alternation_matches_empty() {
        let m = run(r"(a)|\1b", "", "b", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 1));
    }

    #[test]
    fn unmatched_backreference_fails_under_unicode_mode() {
        let mut pattern = parser::parse(r"(a)|\1b", FlagSet::parse("u").unwrap()).unwrap();
        analyzer::analyze(&mut pattern);
        let program = bytecode::compile(&pattern);
        let units: Vec<u16> = "b".encode_utf16().collect();
        let view = StringView::Utf16(&units);
        assert!(search(&program, view, 0).unwrap().is_none());
    }

    #[test]
    fn named_backreference_resolves_whichever_duplicate_alternative_matched() {
        // `\k<y>` compiles to the lowest id sharing the name `y` (subpattern
        // 1), but only the second alternative's group (subpattern 2) can
        // ever match here; resolve_capture must fall back to its slot.
        let m = run(r"(?<y>a)|(?<y>b)\k<y>", "u", "bb", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 2));
        assert_eq!(m.captures[0], None);
        assert_eq!(m.captures[1], Some((0, 1)));
    }

    #[test]
    fn lookahead_does_not_consume_input() {
        let m = run("a(?=b)", "", "ab", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 1));
    }

    #[test]
    fn negative_lookahead_rejects_match() {
        assert!(run("a(?!b)", "", "ab", 0).is_none());
        assert!(run("a(?!b)", "", "ac", 0).is_some());
    }

    #[test]
    fn lookbehind_matches_backward() {
        let m = run("(?<=a)b", "", "ab", 0).unwrap();
        assert_eq!((m.start, m.end), (1, 2));
    }

    #[test]
    fn word_boundary_anchors() {
        let m = run(r"\bcat\b", "", "a cat sat", 0).unwrap();
        assert_eq!((m.start, m.end), (2, 5));
    }

    #[test]
    fn sticky_flag_rejects_non_prefix_match() {
        assert!(run("b", "y", "ab", 0).is_none());
        assert!(run("b", "y", "ab", 1).is_some());
    }

    #[test]
    fn ignore_case_matches_ascii_letters() {
        let m = run("ABC", "i", "xabcx", 0).unwrap();
        assert_eq!((m.start, m.end), (1, 4));
    }

    #[test]
    fn character_class_matches_digit() {
        let m = run(r"\d+", "", "x42y", 0).unwrap();
        assert_eq!((m.start, m.end), (1, 3));
    }

    #[test]
    fn nested_quantified_group_backtracks() {
        let m = run("(a+)+b", "", "aaab", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 4));
        assert_eq!(m.captures[0], Some((2, 3)));
    }

    #[test]
    fn non_sticky_search_scans_forward() {
        let m = run("b", "", "aab", 0).unwrap();
        assert_eq!((m.start, m.end), (2, 3));
    }
}
