//! Free-standing helpers the facade (C7) builds result values and drives
//! iteration with, kept apart from `RegExpObject`'s own state the way
//! `nova_vm`'s `abstract_operations.rs` modules sit beside their object's
//! `mod.rs`. Grounded on ECMA-262 22.2.7 `RegExpExec` and 22.2.6.18
//! `AdvanceStringIndex`.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::realm::LegacyFeatures;
use crate::text::JsString;
use crate::yarr::interpreter::MatchResult;
use crate::yarr::{BytecodePattern, FlagSet};

/// [22.2.6.18 AdvanceStringIndex](https://tc39.es/ecma262/#sec-advancestringindex):
/// after an empty match, `exec`'s global/sticky iteration must still make
/// progress. Under Unicode modes a surrogate pair counts as one step.
pub fn advance_string_index(input: &JsString, index: usize, unicode: bool) -> usize {
    if !unicode || index + 1 >= input.len() {
        return index + 1;
    }
    let view = input.as_view();
    let (_, consumed) = view.code_point_at(index);
    index + consumed
}

/// The materialized result of one successful match: the matched substring
/// plus every capturing group's substring (`None` for unmatched groups),
/// the start index, a snapshot of the input, the `.groups` object (`None`
/// when the pattern has no named groups at all, per spec §6), and the
/// `.indices` array when the pattern was compiled with the `d` flag.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub matched: Vec<Option<JsString>>,
    pub index: usize,
    pub input: JsString,
    pub groups: Option<HashMap<Rc<str>, Option<JsString>>>,
    pub indices: Option<Vec<Option<(usize, usize)>>>,
}

/// Resolves a named group's JS-visible value: whichever of the (possibly
/// several, under duplicate names) subpattern ids sharing that name matched,
/// or `None` if none did (spec §4.2: "at most one is matched per execution").
fn resolve_named_group(program: &BytecodePattern, ids: &[u32], m: &MatchResult) -> Option<(usize, usize)> {
    ids.iter().find_map(|&id| {
        let canonical = program
            .duplicate_named_group_for_subpattern_id
            .get(&id)
            .copied()
            .unwrap_or(id);
        m.captures.get((canonical - 1) as usize).copied().flatten()
    })
}

pub fn build_exec_result(program: &BytecodePattern, input: &JsString, m: &MatchResult) -> ExecResult {
    let mut matched = Vec::with_capacity(program.num_subpatterns as usize + 1);
    matched.push(Some(input.slice(m.start, m.end)));
    for capture in &m.captures {
        matched.push(capture.map(|(s, e)| input.slice(s, e)));
    }

    let groups = (!program.named_groups.is_empty()).then(|| {
        program
            .named_groups
            .iter()
            .map(|(name, ids)| {
                let value = resolve_named_group(program, ids, m).map(|(s, e)| input.slice(s, e));
                (name.clone(), value)
            })
            .collect()
    });

    let indices = program.flags.has_indices().then(|| {
        let mut indices = Vec::with_capacity(program.num_subpatterns as usize + 1);
        indices.push(Some((m.start, m.end)));
        indices.extend(m.captures.iter().copied());
        indices
    });

    ExecResult {
        matched,
        index: m.start,
        input: input.clone(),
        groups,
        indices,
    }
}

/// Builds the realm's `RegExp.$1..$9`/`.lastMatch`/etc. snapshot (spec
/// §4.7) from a successful match; the caller only writes this into the
/// realm when the originating regex still has legacy features enabled.
pub fn build_legacy_features(input: &JsString, m: &MatchResult) -> LegacyFeatures {
    let mut groups: [Option<JsString>; 9] = Default::default();
    for (slot, capture) in groups.iter_mut().zip(m.captures.iter()) {
        *slot = capture.map(|(s, e)| input.slice(s, e));
    }
    LegacyFeatures {
        input: Some(input.clone()),
        last_match: Some(input.slice(m.start, m.end)),
        last_paren: m
            .captures
            .iter()
            .rev()
            .find_map(|c| c.map(|(s, e)| input.slice(s, e))),
        left_context: Some(input.slice(0, m.start)),
        right_context: Some(input.slice(m.end, input.len())),
        groups,
    }
}

/// Canonical `(source, flags)` cache key. `Rc<str>` instead of `String` to
/// match `bytecode.rs`'s choice of cheaply-clonable string storage for
/// values shared across many `RegExpObject`s compiled from the same
/// literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub source: Rc<str>,
    pub flags: FlagSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_string_index_steps_over_a_surrogate_pair() {
        let input = JsString::from_str("\u{1F600}x");
        assert_eq!(advance_string_index(&input, 0, true), 2);
        assert_eq!(advance_string_index(&input, 0, false), 1);
    }
}
