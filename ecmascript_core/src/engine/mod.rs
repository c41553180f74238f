//! Pause/resume engine (C9): the suspend/resume substrate shared by
//! generators, async functions and async generators, built around
//! [`pauser::ExecutionPauser`] and the host-supplied [`pauser::Resumable`].

pub mod async_function;
pub mod async_generator;
pub mod generator;
pub mod pauser;

pub use async_generator::AsyncGenerator;
pub use generator::{Generator, IteratorResult};
pub use pauser::{ExecutionPauser, ExecutionResult, ResumeCompletion, Resumable, StartOutcome};
