//! The Yarr regular-expression engine (spec §3-§6): parse a pattern source
//! plus flags into a [`pattern::YarrPattern`] (C2), run the analyzer (C3)
//! and bytecode compiler (C4) over it to get an executable
//! [`bytecode::BytecodePattern`], then execute it against a
//! [`crate::text::StringView`] with the interpreter (C5). [`flags::FlagSet`]
//! (C6) and [`error_code::ErrorCode`] are shared across every stage.
//!
//! [`compile`] is the one entry point the façade (C7) needs: it runs C2-C4
//! in sequence and hands back a ready-to-execute program plus the
//! structural metadata (`named_groups`, duplicate-name resolution) the
//! facade's `exec`/`match`/`matchAll` surface needs for `.groups` exposure.

pub mod analyzer;
pub mod bytecode;
pub mod char_class;
pub mod error_code;
pub mod flags;
pub mod interpreter;
pub mod parser;
pub mod pattern;
pub mod stack_check;
pub mod unicode_properties;

pub use bytecode::BytecodePattern;
pub use error_code::ErrorCode;
pub use flags::FlagSet;
pub use interpreter::MatchResult;

/// Parses, analyzes and compiles `source`/`flags` into an executable
/// program (spec §3's `compilePattern`). A `RegExp` constructor call does
/// this once per distinct `(source, flags)` pair; the façade (C7) caches
/// the result.
pub fn compile(source: &str, flags: FlagSet) -> Result<BytecodePattern, ErrorCode> {
    let mut pattern = parser::parse(source, flags)?;
    analyzer::analyze(&mut pattern);
    Ok(bytecode::compile(&pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::StringView;

    #[test]
    fn compiles_and_executes_a_simple_pattern() {
        let program = compile("a(b+)c", FlagSet::parse("").unwrap()).unwrap();
        let units: Vec<u16> = "xabbbcx".encode_utf16().collect();
        let result = interpreter::search(&program, StringView::Utf16(&units), 0).unwrap().unwrap();
        assert_eq!((result.start, result.end), (1, 6));
        assert_eq!(result.captures[0], Some((2, 5)));
    }

    #[test]
    fn invalid_source_surfaces_the_parser_error_code() {
        let err = compile("(abc", FlagSet::EMPTY).unwrap_err();
        assert_eq!(err, ErrorCode::MissingParentheses);
    }
}
