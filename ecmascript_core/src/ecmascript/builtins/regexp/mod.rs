//! Regex facade (C7): spec §4.7. Caches compiled programs by `(source,
//! flags)`, owns a `RegExpObject`'s `lastIndex`, drives C5 through sticky /
//! global iteration, and builds the result shapes §6 describes. This is the
//! only part of the crate that ever constructs a [`JsError`] out of a
//! structural [`crate::yarr::ErrorCode`] (spec §7 category 1).

pub mod abstract_operations;

use std::rc::Rc;

use hashbrown::HashMap;

use crate::error::{JsError, JsResult};
use crate::realm::JsRealm;
use crate::text::JsString;
use crate::yarr::{self, BytecodePattern, ErrorCode, FlagSet};

use abstract_operations::{build_exec_result, build_legacy_features, ExecResult, PatternKey};

/// A process-wide cache entry: either a ready-to-run program or the
/// `ErrorCode` a prior compile attempt with these exact arguments produced
/// (spec §4.7: "on parse error the entry stores the `ErrorCode` so
/// subsequent identical requests fail fast").
enum CacheEntry {
    Compiled(Rc<BytecodePattern>),
    Error(ErrorCode),
}

/// `compile(source, flags)`'s cache, keyed by `(source, flagSet)` (spec
/// §3's "Compiled patterns are deterministic-function-of-input and may be
/// shared across `RegExpObject`s").
#[derive(Default)]
pub struct RegExpCache {
    entries: HashMap<PatternKey, CacheEntry>,
}

impl RegExpCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&mut self, source: &str, flags: FlagSet) -> Result<Rc<BytecodePattern>, ErrorCode> {
        let key = PatternKey {
            source: Rc::from(source),
            flags,
        };
        if let Some(entry) = self.entries.get(&key) {
            return match entry {
                CacheEntry::Compiled(program) => Ok(program.clone()),
                CacheEntry::Error(code) => Err(*code),
            };
        }
        crate::probes::regex_compile_start(source);
        let result = yarr::compile(source, flags);
        crate::probes::regex_compile_end(source, result.is_ok());
        match result {
            Ok(program) => {
                let program = Rc::new(program);
                self.entries.insert(key, CacheEntry::Compiled(program.clone()));
                Ok(program)
            }
            Err(code) => {
                self.entries.insert(key, CacheEntry::Error(code));
                Err(code)
            }
        }
    }
}

/// The user-visible `RegExp` instance (spec §3's `RegExpObject`). Owns no
/// heap object slot (the property-map runtime is out of scope per spec
/// §1); an embedder wraps this in whatever host object it uses.
pub struct RegExpObject {
    pub source: Rc<str>,
    pub flags: FlagSet,
    pub last_index: usize,
    pub last_index_writable: bool,
    pub legacy_features_enabled: bool,
    program: Rc<BytecodePattern>,
}

impl RegExpObject {
    pub fn new(cache: &mut RegExpCache, source: &str, flags: &str) -> JsResult<Self> {
        let flags = FlagSet::parse(flags)
            .ok_or_else(|| JsError::syntax_error(ErrorCode::InvalidRegularExpressionFlags.message()))?;
        let program = cache
            .compile(source, flags)
            .map_err(|code| JsError::syntax_error(code.message()))?;
        Ok(RegExpObject {
            source: Rc::from(source),
            flags,
            last_index: 0,
            last_index_writable: true,
            legacy_features_enabled: true,
            program,
        })
    }

    pub fn global(&self) -> bool {
        self.flags.global()
    }

    pub fn sticky(&self) -> bool {
        self.flags.sticky()
    }

    /// [22.2.7.2 RegExpExec](https://tc39.es/ecma262/#sec-regexpexec) /
    /// [22.2.7.1 RegExpBuiltinExec](https://tc39.es/ecma262/#sec-regexpbuiltinexec),
    /// restricted to this slice's built-in (non-subclassed) RegExp objects.
    pub fn exec(&mut self, realm: &mut JsRealm, input: &JsString) -> JsResult<Option<ExecResult>> {
        let global_or_sticky = self.global() || self.sticky();
        let start = if global_or_sticky { self.last_index } else { 0 };

        if start > input.len() {
            if global_or_sticky {
                self.set_last_index(0)?;
            }
            return Ok(None);
        }

        let view = input.as_view();
        let matched = if self.sticky() {
            yarr::interpreter::execute_at(&self.program, view, start)
        } else {
            yarr::interpreter::search(&self.program, view, start)
        };

        let matched = matched
            .map_err(|_| JsError::type_error("got too complicated RegExp pattern to process"))?;

        let Some(m) = matched else {
            if global_or_sticky {
                self.set_last_index(0)?;
            }
            return Ok(None);
        };

        if global_or_sticky {
            let next = if m.end == m.start {
                abstract_operations::advance_string_index(input, m.end, self.flags.unicode_mode())
            } else {
                m.end
            };
            self.set_last_index(next)?;
        }

        let result = build_exec_result(&self.program, input, &m);
        if self.legacy_features_enabled {
            realm.update_legacy_features(build_legacy_features(input, &m));
        }
        Ok(Some(result))
    }

    /// [22.2.7.3 RegExpExec's `test`](https://tc39.es/ecma262/#sec-regexp.prototype.test):
    /// same as `exec` for state advancement, but never materializes captures.
    pub fn test(&mut self, realm: &mut JsRealm, input: &JsString) -> JsResult<bool> {
        Ok(self.exec(realm, input)?.is_some())
    }

    /// `@@matchAll`'s driving loop (spec §4.7 point 2.d / §8's "Global
    /// progress" invariant): repeatedly `exec` from the current
    /// `lastIndex`, advancing past empty matches so iteration always
    /// terminates.
    pub fn match_all<'a>(&'a mut self, realm: &'a mut JsRealm, input: &'a JsString) -> MatchAllIter<'a> {
        self.last_index = 0;
        MatchAllIter {
            regexp: self,
            realm,
            input,
            done: false,
        }
    }

    fn set_last_index(&mut self, index: usize) -> JsResult<()> {
        if !self.last_index_writable {
            return Err(JsError::type_error("Cannot write to non-writable lastIndex"));
        }
        self.last_index = index;
        Ok(())
    }
}

pub struct MatchAllIter<'a> {
    regexp: &'a mut RegExpObject,
    realm: &'a mut JsRealm,
    input: &'a JsString,
    done: bool,
}

impl Iterator for MatchAllIter<'_> {
    type Item = JsResult<ExecResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.regexp.exec(self.realm, self.input) {
            Ok(Some(result)) => {
                if !self.regexp.global() {
                    self.done = true;
                }
                Some(Ok(result))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_finds_first_match_and_reports_index() {
        let mut cache = RegExpCache::new();
        let mut realm = JsRealm::new();
        let mut re = RegExpObject::new(&mut cache, "a(b+)c", "").unwrap();
        let input = JsString::from_str("xxabbbcxx");
        let result = re.exec(&mut realm, &input).unwrap().unwrap();
        assert_eq!(result.index, 2);
        assert_eq!(result.matched[0].as_ref().unwrap().to_string_lossy(), "abbbc");
        assert_eq!(result.matched[1].as_ref().unwrap().to_string_lossy(), "bbb");
    }

    #[test]
    fn sticky_exec_advances_last_index_and_then_fails_and_resets() {
        let mut cache = RegExpCache::new();
        let mut realm = JsRealm::new();
        let mut re = RegExpObject::new(&mut cache, "a", "y").unwrap();
        re.last_index = 1;
        let input = JsString::from_str("aab");
        let first = re.exec(&mut realm, &input).unwrap();
        assert!(first.is_some());
        assert_eq!(re.last_index, 2);

        let second = re.exec(&mut realm, &input).unwrap();
        assert!(second.is_none());
        assert_eq!(re.last_index, 0);
    }

    #[test]
    fn match_all_visits_every_match_exactly_once_for_empty_matches() {
        let mut cache = RegExpCache::new();
        let mut realm = JsRealm::new();
        let mut re = RegExpObject::new(&mut cache, "a*", "g").unwrap();
        let input = JsString::from_str("aab");
        let matches: Vec<_> = re
            .match_all(&mut realm, &input)
            .map(|r| r.unwrap().matched[0].as_ref().map(|s| s.to_string_lossy()))
            .collect();
        // "aa", "" (at b), "" (at end) - matches ECMAScript's @@matchAll
        // empty-match-after-nonempty-match behavior.
        assert_eq!(
            matches,
            vec![Some("aa".to_string()), Some(String::new()), Some(String::new())]
        );
    }

    #[test]
    fn invalid_source_surfaces_as_a_syntax_error() {
        let mut cache = RegExpCache::new();
        let err = RegExpObject::new(&mut cache, "(abc", "").unwrap_err();
        assert!(matches!(err, JsError::Simple { kind, .. } if kind == crate::error::ExceptionType::SyntaxError));
    }

    #[test]
    fn cache_returns_the_same_program_for_repeated_identical_requests() {
        let mut cache = RegExpCache::new();
        let a = cache.compile("abc", FlagSet::EMPTY).unwrap();
        let b = cache.compile("abc", FlagSet::EMPTY).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }
}
