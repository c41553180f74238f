//! Pattern parser (C2).
//!
//! Recursive-descent over the pattern source as a sequence of Unicode
//! scalar values (spec §3 notes `u`/`v` iterate by scalar value; under
//! Legacy mode real engines walk 16-bit code units, but since an unpaired
//! surrogate round-trips through `char::from_u32` as `None` only for
//! surrogate values themselves, we parse all three modes over `Vec<char>`
//! and treat lone surrogates in the source as a won't-happen case for
//! pattern *syntax* — they can still appear in *matched input*, which is
//! `text::StringView`'s job, not the parser's. Recorded as a simplification
//! in DESIGN.md.).

use std::rc::Rc;

use hashbrown::HashMap;

use super::char_class::CharacterClassBuilder;
use super::error_code::ErrorCode;
use super::flags::{Flag, FlagSet};
use super::pattern::*;
use super::stack_check::StackCheck;
use super::unicode_properties;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Legacy,
    Unicode,
    UnicodeSets,
}

impl Mode {
    fn from_flags(flags: FlagSet) -> Mode {
        if flags.unicode_sets() {
            Mode::UnicodeSets
        } else if flags.unicode() {
            Mode::Unicode
        } else {
            Mode::Legacy
        }
    }

    fn is_unicode(self) -> bool {
        !matches!(self, Mode::Legacy)
    }
}

pub fn parse(source: &str, flags: FlagSet) -> Result<YarrPattern, ErrorCode> {
    let mode = Mode::from_flags(flags);
    let chars: Vec<char> = source.chars().collect();
    let total_capturing = prescan_capturing_groups(&chars, mode)?;

    let mut parser = Parser {
        chars: &chars,
        pos: 0,
        mode,
        flags,
        next_subpattern_id: 1,
        total_capturing,
        named_groups: HashMap::new(),
        named_group_paths: HashMap::new(),
        next_disjunction_id: 0,
        alt_path: Vec::new(),
        stack: StackCheck::for_parser(),
        contains_bol: false,
        contains_eol: false,
    };

    let body = parser.parse_disjunction()?;
    if parser.pos != chars.len() {
        // Only reachable via a stray, unmatched ')'.
        return Err(ErrorCode::ParenthesesUnmatched);
    }

    let duplicate_named_group_for_subpattern_id = build_duplicate_group_table(&parser.named_groups);

    Ok(YarrPattern {
        body,
        flags,
        num_subpatterns: parser.next_subpattern_id - 1,
        duplicate_named_group_for_subpattern_id,
        named_groups: parser.named_groups,
        contains_bol: parser.contains_bol,
        contains_eol: parser.contains_eol,
    })
}

/// Named captures that repeat a name collapse onto one shared group id: the
/// *first* occurrence of each name keeps its own subpattern id as the
/// canonical `groupId`; every later occurrence maps to it (spec §3/§4.2).
fn build_duplicate_group_table(named_groups: &HashMap<Rc<str>, Vec<u32>>) -> HashMap<u32, u32> {
    let mut table = HashMap::new();
    for ids in named_groups.values() {
        if ids.len() <= 1 {
            continue;
        }
        let canonical = ids[0];
        for &id in &ids[1..] {
            table.insert(id, canonical);
        }
    }
    table
}

/// True iff two named-capture locations, expressed as the chain of
/// (disjunction id, alternative index) pairs leading to each, sit in
/// different alternatives of the same disjunction: equal ancestry and, at
/// the final step, the same disjunction but a different branch. Same
/// alternative (identical path) or one nested inside the other (one path a
/// prefix of the other) both return `false`.
fn reuse_allowed(a: &[(u32, u32)], b: &[(u32, u32)]) -> bool {
    if a.len() != b.len() || a.is_empty() {
        return false;
    }
    let last = a.len() - 1;
    a[..last] == b[..last] && a[last].0 == b[last].0 && a[last].1 != b[last].1
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
    mode: Mode,
    flags: FlagSet,
    next_subpattern_id: u32,
    total_capturing: u32,
    named_groups: HashMap<Rc<str>, Vec<u32>>,
    /// Per-name location of every occurrence already recorded in
    /// `named_groups`, as the chain of (disjunction id, alternative index)
    /// leading to it. Used to tell "different alternatives of the same
    /// disjunction" apart from same-alternative or nested reuse of a name.
    named_group_paths: HashMap<Rc<str>, Vec<Vec<(u32, u32)>>>,
    next_disjunction_id: u32,
    alt_path: Vec<(u32, u32)>,
    stack: StackCheck,
    contains_bol: bool,
    contains_eol: bool,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn unicode_mode(&self) -> bool {
        self.mode.is_unicode()
    }

    // ---- disjunction / alternative -----------------------------------

    fn parse_disjunction(&mut self) -> Result<PatternDisjunction, ErrorCode> {
        if !self.stack.enter() {
            return Err(ErrorCode::TooManyDisjunctions);
        }
        let result = self.parse_disjunction_inner();
        self.stack.exit();
        result
    }

    fn parse_disjunction_inner(&mut self) -> Result<PatternDisjunction, ErrorCode> {
        let disjunction_id = self.next_disjunction_id;
        self.next_disjunction_id += 1;
        let start_id = self.next_subpattern_id;
        let mut disjunction = PatternDisjunction::default();
        let mut alt_index = 0u32;
        loop {
            self.alt_path.push((disjunction_id, alt_index));
            let alt = self.parse_alternative();
            self.alt_path.pop();
            disjunction.alternatives.push(alt?);
            alt_index += 1;
            if self.eat('|') {
                continue;
            }
            break;
        }
        disjunction.first_subpattern_id = start_id;
        disjunction.last_subpattern_id = self.next_subpattern_id.saturating_sub(1);
        Ok(disjunction)
    }

    fn parse_alternative(&mut self) -> Result<PatternAlternative, ErrorCode> {
        let mut alt = PatternAlternative::default();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let term = self.parse_term()?;
            alt.terms.push(term);
        }
        Ok(alt)
    }

    // ---- terms ---------------------------------------------------------

    fn parse_term(&mut self) -> Result<PatternTerm, ErrorCode> {
        let kind = self.parse_atom()?;
        let quantifiable = is_quantifiable(&kind, self.unicode_mode());
        let quantifier = self.parse_quantifier()?;
        if let Some(q) = quantifier {
            if !quantifiable {
                return Err(ErrorCode::QuantifierWithoutAtom);
            }
            Ok(PatternTerm::new(kind, q))
        } else {
            Ok(PatternTerm::new(kind, Quantifier::ONE))
        }
    }

    fn parse_quantifier(&mut self) -> Result<Option<Quantifier>, ErrorCode> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let (min, max) = match c {
            '*' => {
                self.advance();
                (0, QUANTIFY_INFINITE)
            }
            '+' => {
                self.advance();
                (1, QUANTIFY_INFINITE)
            }
            '?' => {
                self.advance();
                (0, 1)
            }
            '{' => match self.try_parse_brace_quantifier()? {
                Some(bounds) => bounds,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        if min > max {
            return Err(ErrorCode::QuantifierOutOfOrder);
        }
        let non_greedy = self.eat('?');
        Ok(Some(Quantifier {
            min,
            max,
            kind: if non_greedy {
                QuantifierKind::NonGreedy
            } else if min == max {
                QuantifierKind::FixedCount
            } else {
                QuantifierKind::Greedy
            },
        }))
    }

    /// Attempts `{n}`, `{n,}`, `{n,m}`. On a shape that isn't a valid
    /// quantifier: Unicode modes treat it as `QuantifierIncomplete`; Legacy
    /// mode backtracks and treats `{` as a literal (Annex B tolerance).
    fn try_parse_brace_quantifier(&mut self) -> Result<Option<(u32, u32)>, ErrorCode> {
        let save = self.pos;
        self.advance(); // '{'
        let Some(min) = self.parse_decimal() else {
            self.pos = save;
            return self.incomplete_brace_quantifier();
        };
        if self.eat('}') {
            return Ok(Some((min, min)));
        }
        if !self.eat(',') {
            self.pos = save;
            return self.incomplete_brace_quantifier();
        }
        if self.eat('}') {
            return Ok(Some((min, QUANTIFY_INFINITE)));
        }
        let Some(max) = self.parse_decimal() else {
            self.pos = save;
            return self.incomplete_brace_quantifier();
        };
        if !self.eat('}') {
            self.pos = save;
            return self.incomplete_brace_quantifier();
        }
        Ok(Some((min, max)))
    }

    fn incomplete_brace_quantifier(&mut self) -> Result<Option<(u32, u32)>, ErrorCode> {
        if self.unicode_mode() {
            Err(ErrorCode::QuantifierIncomplete)
        } else {
            Ok(None)
        }
    }

    fn parse_decimal(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<u64>()
            .ok()
            .map(|v| v.min(QUANTIFY_INFINITE as u64 - 1) as u32)
    }

    fn parse_atom(&mut self) -> Result<TermKind, ErrorCode> {
        let c = self.advance().ok_or(ErrorCode::MissingParentheses)?;
        match c {
            '^' => {
                self.contains_bol = true;
                Ok(TermKind::Anchor(AnchorKind::BeginningOfLine))
            }
            '$' => {
                self.contains_eol = true;
                Ok(TermKind::Anchor(AnchorKind::EndOfLine))
            }
            '.' => Ok(TermKind::CharacterClass {
                class: Rc::new(dot_class(self.flags.dot_all())),
                invert: false,
            }),
            '(' => self.parse_group(),
            '[' => self.parse_character_class(),
            '\\' => self.parse_escape_atom(),
            '*' | '+' | '?' => Err(ErrorCode::QuantifierWithoutAtom),
            ')' => Err(ErrorCode::ParenthesesUnmatched),
            _ => Ok(self.literal_character_term(c)),
        }
    }

    fn literal_character_term(&mut self, c: char) -> TermKind {
        let scalar = c as u32;
        if self.flags.ignore_case() {
            if let Some((lo, hi)) = fold_pair(scalar, self.unicode_mode()) {
                return TermKind::CasedCharacter { lo, hi };
            }
        }
        TermKind::Character(scalar)
    }

    // ---- groups ----------------------------------------------------------

    fn parse_group(&mut self) -> Result<TermKind, ErrorCode> {
        if self.eat('?') {
            self.parse_special_group()
        } else {
            self.parse_capturing_group(None)
        }
    }

    fn parse_special_group(&mut self) -> Result<TermKind, ErrorCode> {
        match self.peek() {
            Some(':') => {
                self.advance();
                let disjunction = self.parse_disjunction()?;
                self.expect_close_paren()?;
                Ok(TermKind::ParenthesesSubpattern(ParenthesesSubpattern {
                    kind: ParenKind::NonCapturing,
                    capturing: false,
                    subpattern_id: 0,
                    name: None,
                    disjunction: Box::new(disjunction),
                }))
            }
            Some('=') => {
                self.advance();
                self.parse_assertion(false, MatchDirection::Forward)
            }
            Some('!') => {
                self.advance();
                self.parse_assertion(true, MatchDirection::Forward)
            }
            Some('<') => {
                if self.peek_at(1) == Some('=') {
                    self.pos += 2;
                    self.parse_assertion(false, MatchDirection::Backward)
                } else if self.peek_at(1) == Some('!') {
                    self.pos += 2;
                    self.parse_assertion(true, MatchDirection::Backward)
                } else {
                    self.advance(); // '<'
                    let name = self.parse_group_name()?;
                    self.parse_capturing_group(Some(name))
                }
            }
            Some(c) if is_flag_letter(c) || c == '-' => self.parse_flag_modifier_group(),
            _ => Err(ErrorCode::ParenthesesTypeInvalid),
        }
    }

    fn parse_assertion(
        &mut self,
        invert: bool,
        direction: MatchDirection,
    ) -> Result<TermKind, ErrorCode> {
        let disjunction = self.parse_disjunction()?;
        self.expect_close_paren()?;
        Ok(TermKind::ParentheticalAssertion(ParentheticalAssertion {
            invert,
            direction,
            disjunction: Box::new(disjunction),
        }))
    }

    /// `(?i-m:...)` / `(?-s:...)` flag-modifier groups: flags before `-` are
    /// enabled, flags after are disabled, for the scope of the nested
    /// disjunction only.
    fn parse_flag_modifier_group(&mut self) -> Result<TermKind, ErrorCode> {
        let mut enable = FlagSet::EMPTY;
        let mut disable = FlagSet::EMPTY;
        let mut disabling = false;
        loop {
            match self.peek() {
                Some('-') if !disabling => {
                    self.advance();
                    disabling = true;
                }
                Some(c) if is_flag_letter(c) => {
                    self.advance();
                    let flag = flag_modifier_letter(c).ok_or(ErrorCode::ParenthesesTypeInvalid)?;
                    let target = if disabling { &mut disable } else { &mut enable };
                    *target = set_flag(*target, flag);
                }
                Some(':') => {
                    self.advance();
                    break;
                }
                _ => return Err(ErrorCode::ParenthesesTypeInvalid),
            }
        }
        let saved_flags = self.flags;
        self.flags = apply_flag_modifiers(self.flags, enable, disable);
        let disjunction = self.parse_disjunction()?;
        self.expect_close_paren()?;
        self.flags = saved_flags;
        Ok(TermKind::ParenthesesSubpattern(ParenthesesSubpattern {
            kind: ParenKind::NonCapturing,
            capturing: false,
            subpattern_id: 0,
            name: None,
            disjunction: Box::new(disjunction),
        }))
    }

    fn parse_capturing_group(&mut self, name: Option<Rc<str>>) -> Result<TermKind, ErrorCode> {
        let id = self.next_subpattern_id;
        self.next_subpattern_id += 1;
        if let Some(name) = name.clone() {
            let path = self.alt_path.clone();
            if self.mode == Mode::Legacy {
                if self.named_groups.contains_key(&name) {
                    return Err(ErrorCode::DuplicateGroupName);
                }
            } else if let Some(paths) = self.named_group_paths.get(&name)
                && !paths.iter().all(|prior| reuse_allowed(prior, &path))
            {
                return Err(ErrorCode::DuplicateGroupName);
            }
            self.named_groups.entry(name.clone()).or_default().push(id);
            self.named_group_paths.entry(name).or_default().push(path);
        }
        let disjunction = self.parse_disjunction()?;
        self.expect_close_paren()?;
        Ok(TermKind::ParenthesesSubpattern(ParenthesesSubpattern {
            kind: ParenKind::Capturing,
            capturing: true,
            subpattern_id: id,
            name,
            disjunction: Box::new(disjunction),
        }))
    }

    fn parse_group_name(&mut self) -> Result<Rc<str>, ErrorCode> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '>' {
                break;
            }
            self.advance();
        }
        if !self.eat('>') {
            return Err(ErrorCode::InvalidGroupName);
        }
        let name: String = self.chars[start..self.pos - 1].iter().collect();
        if !is_identifier_name(&name) {
            return Err(ErrorCode::InvalidGroupName);
        }
        Ok(Rc::from(name))
    }

    fn expect_close_paren(&mut self) -> Result<(), ErrorCode> {
        if self.eat(')') {
            Ok(())
        } else {
            Err(ErrorCode::MissingParentheses)
        }
    }

    // ---- escapes -----------------------------------------------------

    fn parse_escape_atom(&mut self) -> Result<TermKind, ErrorCode> {
        let c = self.peek().ok_or(ErrorCode::EscapeUnterminated)?;
        match c {
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
                self.advance();
                Ok(TermKind::CharacterClass {
                    class: Rc::new(predefined_class(c)),
                    invert: false,
                })
            }
            'b' => {
                self.advance();
                Ok(TermKind::Anchor(AnchorKind::WordBoundary { invert: false }))
            }
            'B' => {
                self.advance();
                Ok(TermKind::Anchor(AnchorKind::WordBoundary { invert: true }))
            }
            'k' if self.peek_at(1) == Some('<') => {
                self.pos += 2;
                let name = self.parse_group_name().map_err(|_| ErrorCode::InvalidNamedBackReference)?;
                let ids = self
                    .named_groups
                    .get(&name)
                    .cloned()
                    .ok_or(ErrorCode::InvalidNamedBackReference)?;
                // Backreference targets the first-declared id sharing the
                // name; duplicate-group resolution happens at match time.
                Ok(TermKind::BackReference(ids[0]))
            }
            'p' | 'P' => {
                let negate_escape = c == 'P';
                if !self.unicode_mode() {
                    return Err(ErrorCode::InvalidIdentityEscape);
                }
                self.advance();
                let (name, value) = self.parse_property_expression()?;
                let class = unicode_properties::resolve_property(&name, value.as_deref())
                    .ok_or(ErrorCode::InvalidUnicodePropertyExpression)?;
                Ok(TermKind::CharacterClass {
                    class: Rc::new(class),
                    invert: negate_escape,
                })
            }
            '1'..='9' => self.parse_numeric_backreference(),
            _ => self.parse_character_escape().map(|scalar| {
                if self.flags.ignore_case() {
                    if let Some((lo, hi)) = fold_pair(scalar, self.unicode_mode()) {
                        return TermKind::CasedCharacter { lo, hi };
                    }
                }
                TermKind::Character(scalar)
            }),
        }
    }

    fn parse_numeric_backreference(&mut self) -> Result<TermKind, ErrorCode> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let n: u32 = text.parse().map_err(|_| ErrorCode::InvalidBackreference)?;
        if n >= 1 && n <= self.total_capturing {
            if n < self.next_subpattern_id {
                Ok(TermKind::BackReference(n))
            } else {
                Ok(TermKind::ForwardReference(n))
            }
        } else if self.unicode_mode() {
            Err(ErrorCode::InvalidBackreference)
        } else {
            // Legacy: an out-of-range numeric escape is an octal/identity
            // escape instead (Annex B tolerance).
            self.pos = start;
            let scalar = self.parse_character_escape()?;
            Ok(TermKind::Character(scalar))
        }
    }

    /// Parses `\n`, `\r`, `\t`, `\f`, `\v`, `\0`, `\xHH`, `\uHHHH`,
    /// `\u{H...}`, `\cX`, octal escapes, and identity escapes.
    fn parse_character_escape(&mut self) -> Result<u32, ErrorCode> {
        let c = self.advance().ok_or(ErrorCode::EscapeUnterminated)?;
        Ok(match c {
            'n' => '\n' as u32,
            'r' => '\r' as u32,
            't' => '\t' as u32,
            'f' => 0x0C,
            'v' => 0x0B,
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => 0,
            'x' => self.parse_hex_escape(2)?,
            'u' => self.parse_unicode_escape()?,
            'c' => self.parse_control_letter_escape()?,
            '0'..='7' => {
                if self.unicode_mode() {
                    return Err(ErrorCode::InvalidOctalEscape);
                }
                self.parse_legacy_octal_escape(c)
            }
            other => {
                if self.unicode_mode() && !is_syntax_character(other) {
                    return Err(ErrorCode::InvalidIdentityEscape);
                }
                other as u32
            }
        })
    }

    fn parse_hex_escape(&mut self, digits: usize) -> Result<u32, ErrorCode> {
        let start = self.pos;
        for _ in 0..digits {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos = start;
                return if self.unicode_mode() {
                    Err(ErrorCode::InvalidUnicodeEscape)
                } else {
                    Ok('x' as u32)
                };
            }
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        u32::from_str_radix(&text, 16).map_err(|_| ErrorCode::InvalidUnicodeEscape)
    }

    fn parse_unicode_escape(&mut self) -> Result<u32, ErrorCode> {
        if self.eat('{') {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let text: String = self.chars[start..self.pos].iter().collect();
            if !self.eat('}') || text.is_empty() {
                return Err(ErrorCode::InvalidUnicodeCodePointEscape);
            }
            let value = u32::from_str_radix(&text, 16)
                .map_err(|_| ErrorCode::InvalidUnicodeCodePointEscape)?;
            if value > 0x10FFFF {
                return Err(ErrorCode::InvalidUnicodeCodePointEscape);
            }
            Ok(value)
        } else {
            self.parse_hex_escape(4)
        }
    }

    fn parse_control_letter_escape(&mut self) -> Result<u32, ErrorCode> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.advance();
                Ok((c.to_ascii_uppercase() as u32) & 0x1F)
            }
            _ => {
                if self.unicode_mode() {
                    Err(ErrorCode::InvalidControlLetterEscape)
                } else {
                    Ok('\\' as u32) // Annex B: `\c` followed by non-letter is literal
                }
            }
        }
    }

    fn parse_legacy_octal_escape(&mut self, first: char) -> u32 {
        let mut value = first as u32 - '0' as u32;
        for _ in 0..2 {
            if self.peek().is_some_and(|c| ('0'..='7').contains(&c)) && value <= 0o37 {
                value = value * 8 + (self.advance().unwrap() as u32 - '0' as u32);
            } else {
                break;
            }
        }
        value
    }

    fn parse_property_expression(&mut self) -> Result<(String, Option<String>), ErrorCode> {
        if !self.eat('{') {
            return Err(ErrorCode::InvalidUnicodePropertyExpression);
        }
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '}' && c != '=') {
            self.advance();
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        let value = if self.eat('=') {
            let vstart = self.pos;
            while self.peek().is_some_and(|c| c != '}') {
                self.advance();
            }
            Some(self.chars[vstart..self.pos].iter().collect::<String>())
        } else {
            None
        };
        if !self.eat('}') || name.is_empty() {
            return Err(ErrorCode::InvalidUnicodePropertyExpression);
        }
        Ok((name, value))
    }

    // ---- character classes --------------------------------------------

    fn parse_character_class(&mut self) -> Result<TermKind, ErrorCode> {
        let invert = self.eat('^');
        let class = self.parse_class_set_disjunction()?;
        if !self.eat(']') {
            return Err(ErrorCode::CharacterClassUnmatched);
        }
        if invert && class.may_contain_strings() {
            return Err(ErrorCode::NegatedClassSetMayContainStrings);
        }
        let class = if invert {
            rebuild_inverted(class)
        } else {
            class
        };
        Ok(TermKind::CharacterClass {
            class: Rc::new(class),
            invert: false,
        })
    }

    /// Parses the body of `[...]` up to (not including) the closing `]`.
    /// Under UnicodeSets mode also handles `&&`/`--` class-set operators and
    /// `\q{...}` string disjunctions (spec §4.2).
    fn parse_class_set_disjunction(
        &mut self,
    ) -> Result<super::char_class::CharacterClass, ErrorCode> {
        let mut builder = CharacterClassBuilder::new();
        let mut have_operand = false;

        while let Some(c) = self.peek() {
            if c == ']' {
                break;
            }
            if self.mode == Mode::UnicodeSets && (c == '&' || c == '-') && self.peek_at(1) == Some(c)
            {
                if !have_operand {
                    return Err(ErrorCode::InvalidClassSetOperation);
                }
                self.pos += 2;
                let op = if c == '&' { ClassSetOp::And } else { ClassSetOp::Subtract };
                let rhs = self.parse_class_set_operand()?;
                builder = apply_class_set_op(builder, rhs, op);
                continue;
            }
            self.parse_class_atom_or_range(&mut builder)?;
            have_operand = true;
        }
        Ok(builder.finalize())
    }

    fn parse_class_set_operand(&mut self) -> Result<super::char_class::CharacterClass, ErrorCode> {
        let mut builder = CharacterClassBuilder::new();
        if self.eat('[') {
            let inner = self.parse_class_set_disjunction()?;
            if !self.eat(']') {
                return Err(ErrorCode::CharacterClassUnmatched);
            }
            return Ok(inner);
        }
        self.parse_class_atom_or_range(&mut builder)?;
        Ok(builder.finalize())
    }

    /// Parses one class member into `builder` directly: a single code point,
    /// an `a-z` range, a `\d`-style shorthand, a `\p{...}` property, or
    /// (UnicodeSets only) a `\q{alt1|alt2}` string disjunction.
    fn parse_class_atom_or_range(
        &mut self,
        builder: &mut CharacterClassBuilder,
    ) -> Result<(), ErrorCode> {
        if self.eat('\\') {
            if self.peek() == Some('q') && self.mode == Mode::UnicodeSets {
                self.advance();
                return self.parse_string_disjunction(builder);
            }
            if matches!(self.peek(), Some('d' | 'D' | 'w' | 'W' | 's' | 'S')) {
                let kind = self.advance().unwrap();
                builder.union_class(&predefined_class(kind));
                return Ok(());
            }
            if matches!(self.peek(), Some('p' | 'P')) && self.unicode_mode() {
                let negate = self.advance() == Some('P');
                let (name, value) = self.parse_property_expression()?;
                let class = unicode_properties::resolve_property(&name, value.as_deref())
                    .ok_or(ErrorCode::InvalidUnicodePropertyExpression)?;
                if negate {
                    builder.union_class(&invert_for_negation(class)?);
                } else {
                    builder.union_class(&class);
                }
                return Ok(());
            }
            if matches!(self.peek(), Some('b')) {
                self.advance();
                builder.add_code_point(0x08); // \b inside a class means backspace
                return Ok(());
            }
            let lo = self.parse_character_escape()?;
            return self.maybe_range(builder, lo);
        }
        let c = self.advance().ok_or(ErrorCode::CharacterClassUnmatched)?;
        if self.mode == Mode::UnicodeSets && c == '[' {
            // nested class subtraction/intersection operand handled by caller;
            // reaching here means a bare nested class used as a plain member.
            let inner = self.parse_class_set_disjunction()?;
            if !self.eat(']') {
                return Err(ErrorCode::CharacterClassUnmatched);
            }
            builder.union_class(&inner);
            return Ok(());
        }
        self.maybe_range(builder, c as u32)
    }

    fn maybe_range(&mut self, builder: &mut CharacterClassBuilder, lo: u32) -> Result<(), ErrorCode> {
        if self.peek() == Some('-') && self.peek_at(1).is_some_and(|c| c != ']') {
            let save = self.pos;
            self.advance(); // '-'
            let hi = if self.eat('\\') {
                if matches!(self.peek(), Some('d' | 'D' | 'w' | 'W' | 's' | 'S' | 'p' | 'P')) {
                    // a shorthand class can't be a range endpoint.
                    self.pos = save;
                    builder.add_code_point(lo);
                    return Ok(());
                }
                self.parse_character_escape()?
            } else {
                self.advance().ok_or(ErrorCode::CharacterClassUnmatched)? as u32
            };
            if hi < lo {
                return Err(ErrorCode::CharacterClassRangeOutOfOrder);
            }
            builder.add_range(lo, hi);
        } else {
            builder.add_code_point(lo);
        }
        Ok(())
    }

    /// `\q{abc|de|...}`: each `|`-separated alternative is a literal string
    /// member of the class (spec §4.2's UnicodeSets string disjunctions).
    fn parse_string_disjunction(
        &mut self,
        builder: &mut CharacterClassBuilder,
    ) -> Result<(), ErrorCode> {
        if !self.eat('{') {
            return Err(ErrorCode::ClassStringDisjunctionUnmatched);
        }
        loop {
            let mut scalars = Vec::new();
            loop {
                match self.peek() {
                    Some('|') | Some('}') | None => break,
                    Some('\\') => {
                        self.advance();
                        scalars.push(self.parse_character_escape()?);
                    }
                    Some(c) => {
                        self.advance();
                        scalars.push(c as u32);
                    }
                }
            }
            builder.add_string(scalars);
            match self.peek() {
                Some('|') => {
                    self.advance();
                    continue;
                }
                Some('}') => {
                    self.advance();
                    break;
                }
                _ => return Err(ErrorCode::ClassStringDisjunctionUnmatched),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassSetOp {
    And,
    Subtract,
}

fn apply_class_set_op(
    lhs: CharacterClassBuilder,
    rhs: super::char_class::CharacterClass,
    op: ClassSetOp,
) -> CharacterClassBuilder {
    let lhs_class = lhs.finalize();
    let mut result = CharacterClassBuilder::new();
    match op {
        ClassSetOp::And => {
            for c in 0..=0x10FFFFu32 {
                if lhs_class.contains(c) && rhs.contains(c) {
                    result.add_code_point(c);
                }
            }
        }
        ClassSetOp::Subtract => {
            for c in 0..=0x10FFFFu32 {
                if lhs_class.contains(c) && !rhs.contains(c) {
                    result.add_code_point(c);
                }
            }
        }
    }
    result
}

fn invert_for_negation(
    class: super::char_class::CharacterClass,
) -> Result<super::char_class::CharacterClass, ErrorCode> {
    if class.may_contain_strings() {
        return Err(ErrorCode::NegatedClassSetMayContainStrings);
    }
    let mut builder = CharacterClassBuilder::new().invert();
    builder.union_class(&class);
    Ok(builder.finalize())
}

fn rebuild_inverted(class: super::char_class::CharacterClass) -> super::char_class::CharacterClass {
    let mut builder = CharacterClassBuilder::new().invert();
    builder.union_class(&class);
    builder.finalize()
}

// ---- helpers not tied to parser state ---------------------------------

fn is_quantifiable(kind: &TermKind, unicode_mode: bool) -> bool {
    match kind {
        TermKind::Anchor(_) => !unicode_mode,
        TermKind::ParentheticalAssertion(a) => !unicode_mode || a.direction == MatchDirection::Backward,
        _ => true,
    }
}

fn predefined_class(letter: char) -> super::char_class::CharacterClass {
    let mut builder = CharacterClassBuilder::new();
    match letter.to_ascii_lowercase() {
        'd' => builder.add_range('0' as u32, '9' as u32),
        'w' => {
            builder.add_range('a' as u32, 'z' as u32);
            builder.add_range('A' as u32, 'Z' as u32);
            builder.add_range('0' as u32, '9' as u32);
            builder.add_code_point('_' as u32);
        }
        's' => {
            for c in [' ', '\t', '\n', '\r', '\u{0B}', '\u{0C}', '\u{A0}', '\u{FEFF}'] {
                builder.add_code_point(c as u32);
            }
            builder.add_range(0x2000, 0x200A);
            builder.add_code_point(0x2028);
            builder.add_code_point(0x2029);
            builder.add_code_point(0x202F);
            builder.add_code_point(0x205F);
            builder.add_code_point(0x3000);
        }
        _ => unreachable!("predefined_class only called for d/w/s letters"),
    }
    let class = builder.finalize();
    if letter.is_ascii_uppercase() {
        rebuild_inverted(class)
    } else {
        class
    }
}

fn dot_class(dot_all: bool) -> super::char_class::CharacterClass {
    let mut builder = CharacterClassBuilder::new().invert();
    if !dot_all {
        for c in ['\n', '\r', '\u{2028}', '\u{2029}'] {
            builder.add_code_point(c as u32);
        }
    }
    builder.finalize()
}

fn is_syntax_character(c: char) -> bool {
    matches!(
        c,
        '^' | '$' | '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '/'
    )
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_flag_letter(c: char) -> bool {
    matches!(c, 'i' | 'm' | 's')
}

fn flag_modifier_letter(c: char) -> Option<Flag> {
    match c {
        'i' => Some(Flag::IgnoreCase),
        'm' => Some(Flag::Multiline),
        's' => Some(Flag::DotAll),
        _ => None,
    }
}

fn set_flag(mut set: FlagSet, flag: Flag) -> FlagSet {
    // FlagSet has no public inserter; round-trip through Display/parse of a
    // single letter to keep `flags.rs`'s bit layout private.
    let mut s = set.to_string();
    let letter = match flag {
        Flag::IgnoreCase => 'i',
        Flag::Multiline => 'm',
        Flag::DotAll => 's',
        _ => unreachable!(),
    };
    if !s.contains(letter) {
        s.push(letter);
    }
    set = FlagSet::parse(&s).unwrap_or(set);
    set
}

fn apply_flag_modifiers(base: FlagSet, enable: FlagSet, disable: FlagSet) -> FlagSet {
    let mut s = String::new();
    for (flag, letter) in [
        (Flag::IgnoreCase, 'i'),
        (Flag::Multiline, 'm'),
        (Flag::DotAll, 's'),
    ] {
        let enabled = (base.contains(flag) || enable.contains(flag)) && !disable.contains(flag);
        if enabled {
            s.push(letter);
        }
    }
    // Preserve the flags a modifier group cannot touch.
    for (flag, letter) in [
        (Flag::HasIndices, 'd'),
        (Flag::Global, 'g'),
        (Flag::Unicode, 'u'),
        (Flag::UnicodeSets, 'v'),
        (Flag::Sticky, 'y'),
    ] {
        if base.contains(flag) {
            s.push(letter);
        }
    }
    FlagSet::parse(&s).unwrap_or(base)
}

fn fold_pair(scalar: u32, unicode_mode: bool) -> Option<(u32, u32)> {
    let ch = char::from_u32(scalar)?;
    if !unicode_mode {
        if ch.is_ascii_uppercase() {
            return Some((ch.to_ascii_lowercase() as u32, scalar));
        }
        if ch.is_ascii_lowercase() {
            return Some((scalar, ch.to_ascii_uppercase() as u32));
        }
        return None;
    }
    let folded: Vec<char> = ch.to_lowercase().collect();
    if folded.len() == 1 && folded[0] != ch {
        let lower = folded[0] as u32;
        Some((lower.min(scalar), lower.max(scalar)))
    } else {
        None
    }
}

/// Pre-scans the source once to count total capturing groups, so forward
/// back-references (`\2` naming a group defined later) can be distinguished
/// from invalid ones without a second full parse pass.
fn prescan_capturing_groups(chars: &[char], mode: Mode) -> Result<u32, ErrorCode> {
    let mut count = 0u32;
    let mut i = 0usize;
    let mut in_class = false;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => {
                if chars.get(i + 1) == Some(&'?') {
                    match chars.get(i + 2) {
                        Some('<') if !matches!(chars.get(i + 3), Some('=') | Some('!')) => {
                            count += 1;
                        }
                        _ => {}
                    }
                } else {
                    count += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    if mode != Mode::Legacy && count > 0x7FFF_FFFF {
        return Err(ErrorCode::PatternTooLarge);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str, flags: &str) -> YarrPattern {
        parse(source, FlagSet::parse(flags).unwrap()).expect("expected parse to succeed")
    }

    #[test]
    fn simple_literal_pattern() {
        let pattern = parse_ok("abc", "");
        assert_eq!(pattern.body.alternatives.len(), 1);
        assert_eq!(pattern.body.alternatives[0].terms.len(), 3);
    }

    #[test]
    fn alternation_produces_multiple_alternatives() {
        let pattern = parse_ok("a|b|c", "");
        assert_eq!(pattern.body.alternatives.len(), 3);
    }

    #[test]
    fn duplicate_named_groups_across_alternatives_are_allowed_under_unicode() {
        let pattern = parse_ok("(?<y>a)|(?<y>b)", "u");
        assert_eq!(pattern.num_subpatterns, 2);
        assert_eq!(pattern.duplicate_named_group_for_subpattern_id.get(&2), Some(&1));
    }

    #[test]
    fn duplicate_named_groups_rejected_under_legacy() {
        let err = parse("(?<y>a)|(?<y>b)", FlagSet::EMPTY).unwrap_err();
        assert_eq!(err, ErrorCode::DuplicateGroupName);
    }

    #[test]
    fn duplicate_named_groups_in_same_alternative_rejected_under_unicode() {
        let err = parse("(?<y>a)(?<y>b)", FlagSet::parse("u").unwrap()).unwrap_err();
        assert_eq!(err, ErrorCode::DuplicateGroupName);
    }

    #[test]
    fn nested_duplicate_named_group_rejected_under_unicode() {
        let err = parse("(?<y>(?<y>b))", FlagSet::parse("u").unwrap()).unwrap_err();
        assert_eq!(err, ErrorCode::DuplicateGroupName);
    }

    #[test]
    fn out_of_order_quantifier_is_rejected() {
        let err = parse("a{3,1}", FlagSet::EMPTY).unwrap_err();
        assert_eq!(err, ErrorCode::QuantifierOutOfOrder);
    }

    #[test]
    fn unmatched_parenthesis_is_rejected() {
        let err = parse("(abc", FlagSet::EMPTY).unwrap_err();
        assert_eq!(err, ErrorCode::MissingParentheses);
    }

    #[test]
    fn identity_escape_of_ordinary_letter_rejected_under_unicode() {
        let err = parse(r"\q", FlagSet::parse("u").unwrap()).unwrap_err();
        assert_eq!(err, ErrorCode::InvalidIdentityEscape);
    }

    #[test]
    fn identity_escape_of_ordinary_letter_allowed_under_legacy() {
        let pattern = parse_ok(r"\q", "");
        assert_eq!(pattern.body.alternatives[0].terms.len(), 1);
    }

    #[test]
    fn lookbehind_with_backreference_parses() {
        let pattern = parse_ok(r"(?<=(\w)\1)x", "u");
        assert_eq!(pattern.num_subpatterns, 1);
    }

    #[test]
    fn unicode_property_escape_parses() {
        let pattern = parse_ok(r"\p{Letter}+", "u");
        assert_eq!(pattern.body.alternatives[0].terms.len(), 1);
    }

    #[test]
    fn negated_class_with_strings_is_rejected() {
        let err = parse(r"[^\q{abc}]", FlagSet::parse("v").unwrap()).unwrap_err();
        assert_eq!(err, ErrorCode::NegatedClassSetMayContainStrings);
    }
}
