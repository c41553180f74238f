//! Host-visible exception surface.
//!
//! The engine core never panics on malformed input; every fallible path
//! threads a [`JsResult`] and only the outermost façade (C7) converts a
//! structural regex [`crate::yarr::error_code::ErrorCode`] into a
//! [`JsError`]. Mirrors `nova_vm`'s `Agent`/`ExceptionType` split: a small
//! closed enum for the exception's "class" plus a payload value, rather than
//! a `thiserror` derive tree (the teacher carries neither `thiserror` nor
//! `anyhow`, so we don't introduce them here).

use std::fmt;

/// The host error-raising primitive named in spec §1 as collaborator (d).
///
/// Every pending exception surfaced to a user belongs to exactly one of
/// these kinds; [`ExceptionType::AggregateError`] and
/// [`ExceptionType::SuppressedError`] additionally carry list/chain payloads
/// (see [`JsError::Aggregate`] and [`JsError::Suppressed`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    Error,
    TypeError,
    RangeError,
    SyntaxError,
    ReferenceError,
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExceptionType::Error => "Error",
            ExceptionType::TypeError => "TypeError",
            ExceptionType::RangeError => "RangeError",
            ExceptionType::SyntaxError => "SyntaxError",
            ExceptionType::ReferenceError => "ReferenceError",
        };
        f.write_str(name)
    }
}

/// A value thrown through the engine's pending-exception mechanism.
///
/// `Value` here is left generic over the host's value representation
/// instead of pulling in the (out-of-scope) property-map/object runtime:
/// regex and promise code only ever throws these specific shapes, so the
/// core itself only needs to model them, not an open `Value` union.
#[derive(Debug, Clone, PartialEq)]
pub enum JsError {
    /// A plain `new ExceptionType(message)`.
    Simple {
        kind: ExceptionType,
        message: String,
    },
    /// `AggregateError`, thrown by `Promise.any` when every input rejects.
    Aggregate { errors: Vec<JsError> },
    /// `SuppressedError`, thrown by disposal when more than one dispose
    /// callback fails; `suppressed` chains back through earlier failures.
    Suppressed {
        error: Box<JsError>,
        suppressed: Box<JsError>,
    },
}

impl JsError {
    pub fn simple(kind: ExceptionType, message: impl Into<String>) -> Self {
        JsError::Simple {
            kind,
            message: message.into(),
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::simple(ExceptionType::SyntaxError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::simple(ExceptionType::TypeError, message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::simple(ExceptionType::RangeError, message)
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::simple(ExceptionType::ReferenceError, message)
    }

    /// [`JsError::Suppressed`] chain builder used by dispose sequences:
    /// the first failure becomes `error`, each later failure wraps the
    /// running chain as its `suppressed` field (spec §4.10, §8).
    pub fn chain_suppressed(accumulated: Option<JsError>, next: JsError) -> JsError {
        match accumulated {
            None => next,
            Some(prior) => JsError::Suppressed {
                error: Box::new(next),
                suppressed: Box::new(prior),
            },
        }
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsError::Simple { kind, message } => write!(f, "{kind}: {message}"),
            JsError::Aggregate { errors } => {
                write!(f, "AggregateError: {} errors", errors.len())
            }
            JsError::Suppressed { error, .. } => write!(f, "SuppressedError: {error}"),
        }
    }
}

impl std::error::Error for JsError {}

pub type JsResult<T> = Result<T, JsError>;
