//! The closed value shape that flows through the promise core (C8),
//! disposable stacks (C10) and pause/resume engine (C9).
//!
//! Spec §1 names the property-map/shape runtime and the general bytecode
//! interpreter as external collaborators the core never reaches into: a
//! real engine's `Value` is an open union reaching into every builtin, but
//! the pieces built here only ever produce or consume a small closed set of
//! shapes (settled values, combinator result records, thrown errors,
//! chained promises). `JsValue` models exactly that set instead of
//! reintroducing the object runtime it would take to model an arbitrary
//! host value, mirroring `error.rs`'s choice to leave `Value` generic
//! rather than pull in `nova_vm::ecmascript::types::Value`.

use std::rc::Rc;

use crate::ecmascript::builtins::promise::Promise;
use crate::error::JsError;
use crate::text::JsString;

#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Array(Vec<JsValue>),
    /// A plain-data record (`{status, value}`, `{status, reason}`, `.groups`
    /// and similar object literals this slice needs to hand back).
    Record(Vec<(Rc<str>, JsValue)>),
    Error(JsError),
    Promise(Promise),
}

impl JsValue {
    pub fn string(s: impl Into<String>) -> Self {
        JsValue::String(JsString::from_str(&s.into()))
    }

    pub fn record(fields: impl IntoIterator<Item = (&'static str, JsValue)>) -> Self {
        JsValue::Record(fields.into_iter().map(|(k, v)| (Rc::from(k), v)).collect())
    }
}
