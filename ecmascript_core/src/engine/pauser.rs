//! [4.9 Pause/resume engine](none) substrate: captures a suspended
//! execution frame and drives it forward one suspension point at a time.
//! Grounded on `nova_vm`'s `engine::{SuspendedVm, ExecutionResult}` split
//! between `generator_objects.rs`'s `GeneratorResume` and
//! `async_function_objects.rs`'s await-loop, but the actual bytecode
//! dispatch (the teacher's `Vm::resume`) is the general bytecode
//! interpreter spec §1 names as an external collaborator - what we own is
//! the pause/resume state machine around it, parameterized over a
//! [`Resumable`] trait object the host's interpreter implements.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::JsError;
use crate::value::JsValue;

/// The three ways a suspended frame can be driven forward (spec §4.9's
/// `resumeState`): a plain `next(value)`, a `throw(value)`, or a
/// `return(value)`.
#[derive(Debug, Clone)]
pub enum ResumeCompletion {
    Normal(JsValue),
    Throw(JsValue),
    Return(JsValue),
}

/// What one resumption step produced. `Yield` and `Await` are both
/// suspension points but mean different things to the owner: a plain
/// generator only ever produces `Yield` (a value for the consumer to see),
/// a plain async function only ever produces `Await` (resume automatically
/// once the awaited promise settles), and an async generator can produce
/// either, alternating between them across one run.
#[derive(Debug)]
pub enum ExecutionResult {
    Yield(JsValue),
    Await(JsValue),
    Return(JsValue),
    Throw(JsError),
}

/// A resumable computation: whatever actually runs the function body
/// between suspension points. The bytecode interpreter that would
/// implement this for real JS source is out of scope (spec §1); tests in
/// this module provide toy `Resumable`s to exercise the state machine.
pub trait Resumable {
    fn resume(&mut self, completion: ResumeCompletion) -> ExecutionResult;
}

enum PauserState {
    SuspendedStart(Box<dyn Resumable>),
    SuspendedYield(Box<dyn Resumable>),
    Executing,
    Completed,
}

/// Outcome of driving a paused frame forward one step (spec §4.9's
/// `start`).
#[derive(Debug)]
pub enum StartOutcome {
    /// The frame is already executing (re-entrant resume attempt).
    AlreadyRunning,
    /// The frame had already run to completion; further resumes are
    /// no-ops (spec's `GeneratorResume` step 2).
    AlreadyCompleted,
    Yielded(JsValue),
    Awaited(JsValue),
    Returned(JsValue),
    Threw(JsError),
}

/// [`ExecutionPauser`](spec §3) - a shared handle since the owning
/// generator/async-function/async-generator object and the microtask that
/// eventually resumes it both need to reach the same frame.
#[derive(Clone)]
pub struct ExecutionPauser(Rc<RefCell<PauserState>>);

impl ExecutionPauser {
    pub fn new(resumable: Box<dyn Resumable>) -> Self {
        ExecutionPauser(Rc::new(RefCell::new(PauserState::SuspendedStart(resumable))))
    }

    pub fn is_completed(&self) -> bool {
        matches!(*self.0.borrow(), PauserState::Completed)
    }

    /// Drives the frame forward by one suspend-point step.
    pub fn start(&self, completion: ResumeCompletion) -> StartOutcome {
        let prior = {
            let mut state = self.0.borrow_mut();
            match &*state {
                PauserState::Executing => return StartOutcome::AlreadyRunning,
                PauserState::Completed => return StartOutcome::AlreadyCompleted,
                _ => {}
            }
            std::mem::replace(&mut *state, PauserState::Executing)
        };
        let mut resumable = match prior {
            PauserState::SuspendedStart(r) | PauserState::SuspendedYield(r) => r,
            PauserState::Executing | PauserState::Completed => unreachable!(),
        };

        match resumable.resume(completion) {
            ExecutionResult::Yield(value) => {
                *self.0.borrow_mut() = PauserState::SuspendedYield(resumable);
                StartOutcome::Yielded(value)
            }
            ExecutionResult::Await(value) => {
                *self.0.borrow_mut() = PauserState::SuspendedYield(resumable);
                StartOutcome::Awaited(value)
            }
            ExecutionResult::Return(value) => {
                *self.0.borrow_mut() = PauserState::Completed;
                StartOutcome::Returned(value)
            }
            ExecutionResult::Throw(error) => {
                *self.0.borrow_mut() = PauserState::Completed;
                StartOutcome::Threw(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pauses once at `yield`, then returns whatever it's resumed with.
    struct YieldOnce {
        yielded: bool,
    }
    impl Resumable for YieldOnce {
        fn resume(&mut self, completion: ResumeCompletion) -> ExecutionResult {
            if !self.yielded {
                self.yielded = true;
                return ExecutionResult::Yield(JsValue::Number(1.0));
            }
            match completion {
                ResumeCompletion::Normal(value) => ExecutionResult::Return(value),
                ResumeCompletion::Throw(value) => {
                    ExecutionResult::Throw(JsError::simple(crate::error::ExceptionType::Error, format!("{value:?}")))
                }
                ResumeCompletion::Return(value) => ExecutionResult::Return(value),
            }
        }
    }

    #[test]
    fn drives_through_a_single_yield_to_completion() {
        let pauser = ExecutionPauser::new(Box::new(YieldOnce { yielded: false }));
        match pauser.start(ResumeCompletion::Normal(JsValue::Undefined)) {
            StartOutcome::Yielded(JsValue::Number(n)) => assert_eq!(n, 1.0),
            other => panic!("expected a yield, got {other:?}"),
        }
        match pauser.start(ResumeCompletion::Normal(JsValue::Number(2.0))) {
            StartOutcome::Returned(JsValue::Number(n)) => assert_eq!(n, 2.0),
            other => panic!("expected a return, got {other:?}"),
        }
        assert!(pauser.is_completed());
    }

    #[test]
    fn resuming_a_completed_frame_is_a_no_op_outcome() {
        let pauser = ExecutionPauser::new(Box::new(YieldOnce { yielded: true }));
        pauser.start(ResumeCompletion::Normal(JsValue::Undefined));
        assert!(matches!(
            pauser.start(ResumeCompletion::Normal(JsValue::Undefined)),
            StartOutcome::AlreadyCompleted
        ));
    }
}
