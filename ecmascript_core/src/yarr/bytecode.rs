//! Bytecode compiler (C4): lowers an analyzed [`YarrPattern`] into the
//! matcher-ready form the interpreter (C5) executes.
//!
//! `YarrInterpreter.h`'s `ByteTerm`/`ByteDisjunction`/`BytecodePattern` are a
//! flat `Vec<ByteTerm>` addressed by jump offsets computed during
//! compilation. We lower to an equivalent but tree-shaped form instead —
//! `ByteDisjunction` owns `Vec<ByteAlternative>` owns `Vec<ByteTerm>`, with
//! parenthesized/asserted subpatterns nesting their own `ByteDisjunction`
//! directly rather than through a jump target — so every compiled node's
//! shape is checked by the type system instead of by hand-verified offset
//! arithmetic. Recorded as a deliberate simplification in DESIGN.md.

use std::rc::Rc;

use hashbrown::HashMap;

use super::char_class::CharacterClass;
use super::flags::FlagSet;
use super::pattern::*;
use super::stack_check::StackCheck;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteAnchor {
    BeginningOfLine,
    EndOfLine,
    WordBoundary { invert: bool },
}

#[derive(Debug, Clone)]
pub enum ByteTerm {
    Character(u32),
    CasedCharacter { lo: u32, hi: u32 },
    CharacterClass { class: Rc<CharacterClass>, invert: bool },
    BackReference(u32),
    Anchor(ByteAnchor),
    /// A (possibly capturing) parenthesized subpattern.
    Subpattern(ByteSubpattern),
    /// A `(?=...)`/`(?!...)`/lookbehind equivalents.
    Assertion(ByteAssertion),
    DotStarEnclosure { bol: bool, eol: bool },
}

#[derive(Debug, Clone)]
pub struct ByteSubpattern {
    pub kind: ParenKind,
    pub capturing: bool,
    pub subpattern_id: u32,
    pub disjunction: Box<ByteDisjunction>,
}

#[derive(Debug, Clone)]
pub struct ByteAssertion {
    pub invert: bool,
    pub direction: MatchDirection,
    pub disjunction: Box<ByteDisjunction>,
}

#[derive(Debug, Clone)]
pub struct ByteCompiledTerm {
    pub term: ByteTerm,
    pub quantifier: Quantifier,
}

#[derive(Debug, Clone, Default)]
pub struct ByteAlternative {
    pub terms: Vec<ByteCompiledTerm>,
    pub minimum_size: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ByteDisjunction {
    pub alternatives: Vec<ByteAlternative>,
}

/// The compiled, executable form of one pattern (spec §3's `BytecodePattern`).
#[derive(Debug, Clone)]
pub struct BytecodePattern {
    pub body: ByteDisjunction,
    pub flags: FlagSet,
    pub num_subpatterns: u32,
    pub duplicate_named_group_for_subpattern_id: HashMap<u32, u32>,
    pub named_groups: HashMap<Rc<str>, Vec<u32>>,
}

pub fn compile(pattern: &YarrPattern) -> BytecodePattern {
    let mut stack = StackCheck::for_parser();
    let body = compile_disjunction(&pattern.body, &mut stack);
    BytecodePattern {
        body,
        flags: pattern.flags,
        num_subpatterns: pattern.num_subpatterns,
        duplicate_named_group_for_subpattern_id: pattern.duplicate_named_group_for_subpattern_id.clone(),
        named_groups: pattern.named_groups.clone(),
    }
}

fn compile_disjunction(disjunction: &PatternDisjunction, stack: &mut StackCheck) -> ByteDisjunction {
    stack.enter();
    let result = ByteDisjunction {
        alternatives: disjunction
            .alternatives
            .iter()
            .map(|alt| compile_alternative(alt, stack))
            .collect(),
    };
    stack.exit();
    result
}

fn compile_alternative(alt: &PatternAlternative, stack: &mut StackCheck) -> ByteAlternative {
    ByteAlternative {
        terms: alt
            .terms
            .iter()
            .map(|term| compile_term(term, stack))
            .collect(),
        minimum_size: alt.minimum_size,
    }
}

fn compile_term(term: &PatternTerm, stack: &mut StackCheck) -> ByteCompiledTerm {
    let compiled = match &term.kind {
        TermKind::Character(c) => ByteTerm::Character(*c),
        TermKind::CasedCharacter { lo, hi } => ByteTerm::CasedCharacter { lo: *lo, hi: *hi },
        TermKind::CharacterClass { class, invert } => ByteTerm::CharacterClass {
            class: class.clone(),
            invert: *invert,
        },
        TermKind::BackReference(id) | TermKind::ForwardReference(id) => ByteTerm::BackReference(*id),
        TermKind::Anchor(AnchorKind::BeginningOfLine) => ByteTerm::Anchor(ByteAnchor::BeginningOfLine),
        TermKind::Anchor(AnchorKind::EndOfLine) => ByteTerm::Anchor(ByteAnchor::EndOfLine),
        TermKind::Anchor(AnchorKind::WordBoundary { invert }) => {
            ByteTerm::Anchor(ByteAnchor::WordBoundary { invert: *invert })
        }
        TermKind::ParenthesesSubpattern(sub) => ByteTerm::Subpattern(ByteSubpattern {
            kind: sub.kind,
            capturing: sub.capturing,
            subpattern_id: sub.subpattern_id,
            disjunction: Box::new(compile_disjunction(&sub.disjunction, stack)),
        }),
        TermKind::ParentheticalAssertion(assertion) => ByteTerm::Assertion(ByteAssertion {
            invert: assertion.invert,
            direction: assertion.direction,
            disjunction: Box::new(compile_disjunction(&assertion.disjunction, stack)),
        }),
        TermKind::DotStarEnclosure => ByteTerm::DotStarEnclosure {
            bol: false,
            eol: false,
        },
    };
    ByteCompiledTerm {
        term: compiled,
        quantifier: term.quantifier,
    }
}

#[cfg(test)]
mod tests {
    use super::super::flags::FlagSet;
    use super::super::{analyzer, parser};
    use super::*;

    fn compiled(source: &str, flags: &str) -> BytecodePattern {
        let mut pattern = parser::parse(source, FlagSet::parse(flags).unwrap()).unwrap();
        analyzer::analyze(&mut pattern);
        compile(&pattern)
    }

    #[test]
    fn compiles_literal_characters() {
        let program = compiled("abc", "");
        assert_eq!(program.body.alternatives[0].terms.len(), 3);
    }

    #[test]
    fn compiles_nested_capturing_group() {
        let program = compiled("(a)(b)", "");
        assert_eq!(program.num_subpatterns, 2);
        let ByteTerm::Subpattern(sub) = &program.body.alternatives[0].terms[0].term else {
            panic!("expected a subpattern");
        };
        assert_eq!(sub.subpattern_id, 1);
    }

    #[test]
    fn compiles_lookaround_assertion() {
        let program = compiled("(?=a)b", "u");
        let ByteTerm::Assertion(assertion) = &program.body.alternatives[0].terms[0].term else {
            panic!("expected an assertion");
        };
        assert!(!assertion.invert);
    }
}
