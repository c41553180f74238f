//! A regular-expression engine plus the suspendable-execution substrate
//! (Promises, generators, async functions, disposable stacks) that
//! compose around it, independent of the property-map/object runtime and
//! general bytecode interpreter a hosting engine would supply.
//!
//! Leaf-first: [`yarr`] (C1-C6) and [`ecmascript`] (C7) are the regex half;
//! [`ecmascript::builtins::promise`] (C8), [`engine`] (C9) and
//! [`disposable`] (C10) are the suspendable-execution half. [`host`] and
//! [`error`] are the narrow contracts both halves lean on; [`text`] and
//! [`value`] are the data shapes that flow through them; [`realm`] is the
//! one piece of ambient per-realm state (legacy `RegExp.$1..$9`).

pub mod disposable;
pub mod ecmascript;
pub mod engine;
pub mod error;
pub mod host;
pub mod probes;
pub mod realm;
pub mod text;
pub mod value;
pub mod yarr;
