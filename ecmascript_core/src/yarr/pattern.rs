//! Pattern-tree data model shared by the parser (C2), analyzer (C3) and
//! bytecode compiler (C4). Mirrors spec §3's `PatternTerm`/
//! `PatternAlternative`/`PatternDisjunction`/`YarrPattern` shapes directly.

use std::rc::Rc;

use hashbrown::HashMap;

use super::char_class::CharacterClass;
use super::flags::FlagSet;

pub const QUANTIFY_INFINITE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    FixedCount,
    Greedy,
    NonGreedy,
}

/// `(min, max, type)` triple named in spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub min: u32,
    pub max: u32,
    pub kind: QuantifierKind,
}

impl Quantifier {
    pub const ONE: Quantifier = Quantifier {
        min: 1,
        max: 1,
        kind: QuantifierKind::FixedCount,
    };

    pub fn fixed(count: u32) -> Self {
        Quantifier {
            min: count,
            max: count,
            kind: QuantifierKind::FixedCount,
        }
    }

    pub fn is_fixed_one(self) -> bool {
        self.min == 1 && self.max == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    BeginningOfLine,
    EndOfLine,
    WordBoundary { invert: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenKind {
    Capturing,
    NonCapturing,
    /// quantifier has `max == 1`: compiled to `ParenthesesSubpatternOnce*`.
    Once,
    /// last atom of its alternative, greedy, `max == infinite`: compiled to
    /// `ParenthesesSubpatternTerminal*` (tail-call-shaped execution).
    Terminal,
}

#[derive(Debug, Clone)]
pub struct ParenthesesSubpattern {
    pub kind: ParenKind,
    pub capturing: bool,
    pub subpattern_id: u32,
    pub name: Option<Rc<str>>,
    pub disjunction: Box<PatternDisjunction>,
}

#[derive(Debug, Clone)]
pub struct ParentheticalAssertion {
    pub invert: bool,
    pub direction: MatchDirection,
    pub disjunction: Box<PatternDisjunction>,
}

#[derive(Debug, Clone)]
pub enum TermKind {
    Character(u32),
    /// Two-code-point alternation emitted for an ignoreCase literal, e.g.
    /// `/a/i` over a character whose fold pair is `(a, A)` (spec §4.4).
    CasedCharacter { lo: u32, hi: u32 },
    CharacterClass { class: Rc<CharacterClass>, invert: bool },
    BackReference(u32),
    /// A `\k<name>` or `\N` reference to a group not yet closed when
    /// encountered; legal in ECMAScript, resolved once parsing completes.
    ForwardReference(u32),
    Anchor(AnchorKind),
    ParenthesesSubpattern(ParenthesesSubpattern),
    ParentheticalAssertion(ParentheticalAssertion),
    /// Compiler-synthesized `.*`-enclosure summary term (spec §4.3's
    /// analyzer optimization); never produced by the parser.
    DotStarEnclosure,
}

#[derive(Debug, Clone)]
pub struct PatternTerm {
    pub kind: TermKind,
    pub quantifier: Quantifier,
    /// Guaranteed input-unit offset consumed before this term, filled in by
    /// the analyzer (C3).
    pub input_position: u32,
    /// Backtrack-frame slot assigned by the analyzer; `None` until then.
    pub frame_location: Option<u32>,
}

impl PatternTerm {
    pub fn new(kind: TermKind, quantifier: Quantifier) -> Self {
        PatternTerm {
            kind,
            quantifier,
            input_position: 0,
            frame_location: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternAlternative {
    pub terms: Vec<PatternTerm>,
    /// Greatest lower bound on code units this alternative consumes
    /// (spec §4.3); 0 until the analyzer runs.
    pub minimum_size: u32,
    /// Set when every term quantifier is fixed and the alternative can be
    /// executed without pushing backtrack frames for it as a whole.
    pub once_through: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PatternDisjunction {
    pub alternatives: Vec<PatternAlternative>,
    pub first_subpattern_id: u32,
    pub last_subpattern_id: u32,
}

impl PatternDisjunction {
    pub fn new_alternative(&mut self) -> &mut PatternAlternative {
        self.alternatives.push(PatternAlternative::default());
        self.alternatives.last_mut().unwrap()
    }
}

/// Root of a parsed, validated pattern (spec §3's `YarrPattern`).
#[derive(Debug, Clone)]
pub struct YarrPattern {
    pub body: PatternDisjunction,
    pub flags: FlagSet,
    pub num_subpatterns: u32,
    /// Reused-name capture groups collapse onto one slot: maps every
    /// subpattern id sharing a name (other than the canonical, lowest id)
    /// to the shared `groupId` (spec §3/§4.2).
    pub duplicate_named_group_for_subpattern_id: HashMap<u32, u32>,
    /// Name -> all subpattern ids using that name, in authoring order.
    pub named_groups: HashMap<Rc<str>, Vec<u32>>,
    pub contains_bol: bool,
    pub contains_eol: bool,
}

impl YarrPattern {
    pub fn num_duplicate_named_capture_groups(&self) -> u32 {
        self.duplicate_named_group_for_subpattern_id
            .values()
            .copied()
            .collect::<std::collections::HashSet<_>>()
            .len() as u32
    }
}
