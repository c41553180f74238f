//! [27.5 GeneratorFunction Objects](https://tc39.es/ecma262/#sec-generator-objects),
//! grounded on `nova_vm`'s `generator_objects.rs` `GeneratorResume`/
//! `GeneratorResumeAbrupt`. A generator owns one [`ExecutionPauser`] and
//! exposes the three driving operations `.next()`/`.return()`/`.throw()`
//! as `IteratorResult`s instead of host-visible `Object`s (spec §1's
//! property-map runtime is out of scope; callers get the plain record).

use crate::error::{ExceptionType, JsError, JsResult};
use crate::value::JsValue;

use super::pauser::{ExecutionPauser, ResumeCompletion, Resumable, StartOutcome};

/// [27.5.3.2 CreateIterResultObject](https://tc39.es/ecma262/#sec-createiterresultobject).
#[derive(Debug, Clone, PartialEq)]
pub struct IteratorResult {
    pub value: JsValue,
    pub done: bool,
}

impl IteratorResult {
    fn done(value: JsValue) -> Self {
        IteratorResult { value, done: true }
    }

    fn not_done(value: JsValue) -> Self {
        IteratorResult { value, done: false }
    }
}

pub struct Generator {
    pauser: ExecutionPauser,
}

impl Generator {
    pub fn new(resumable: Box<dyn Resumable>) -> Self {
        Generator {
            pauser: ExecutionPauser::new(resumable),
        }
    }

    fn drive(&self, completion: ResumeCompletion) -> JsResult<IteratorResult> {
        match self.pauser.start(completion) {
            StartOutcome::AlreadyRunning => Err(JsError::simple(
                ExceptionType::TypeError,
                "the generator is currently running",
            )),
            StartOutcome::AlreadyCompleted => Ok(IteratorResult::done(JsValue::Undefined)),
            StartOutcome::Yielded(value) => Ok(IteratorResult::not_done(value)),
            StartOutcome::Awaited(_) => Err(JsError::simple(
                ExceptionType::TypeError,
                "unexpected await in a non-async generator",
            )),
            StartOutcome::Returned(value) => Ok(IteratorResult::done(value)),
            StartOutcome::Threw(error) => Err(error),
        }
    }

    /// [27.5.3.3 GeneratorResume](https://tc39.es/ecma262/#sec-generatorresume).
    pub fn next(&self, value: JsValue) -> JsResult<IteratorResult> {
        self.drive(ResumeCompletion::Normal(value))
    }

    /// [27.5.3.4 GeneratorResumeAbrupt](https://tc39.es/ecma262/#sec-generatorresumeabrupt)
    /// with a return completion: a generator already suspended-start or
    /// completed simply yields a done result carrying `value` back out,
    /// matching the spec's "not yet executing" early return.
    pub fn return_(&self, value: JsValue) -> JsResult<IteratorResult> {
        if self.pauser.is_completed() {
            return Ok(IteratorResult::done(value));
        }
        self.drive(ResumeCompletion::Return(value))
    }

    /// [27.5.3.4 GeneratorResumeAbrupt](https://tc39.es/ecma262/#sec-generatorresumeabrupt)
    /// with a throw completion.
    pub fn throw(&self, reason: JsValue) -> JsResult<IteratorResult> {
        if self.pauser.is_completed() {
            return Err(JsError::simple(ExceptionType::Error, format!("{reason:?}")));
        }
        self.drive(ResumeCompletion::Throw(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pauser::ExecutionResult;

    /// Yields 1, then 2, then returns 3.
    struct CountToThree {
        step: u8,
    }
    impl Resumable for CountToThree {
        fn resume(&mut self, _completion: ResumeCompletion) -> ExecutionResult {
            self.step += 1;
            match self.step {
                1 => ExecutionResult::Yield(JsValue::Number(1.0)),
                2 => ExecutionResult::Yield(JsValue::Number(2.0)),
                _ => ExecutionResult::Return(JsValue::Number(3.0)),
            }
        }
    }

    #[test]
    fn iterates_through_every_yield_and_a_final_return() {
        let generator = Generator::new(Box::new(CountToThree { step: 0 }));
        assert_eq!(
            generator.next(JsValue::Undefined).unwrap(),
            IteratorResult::not_done(JsValue::Number(1.0))
        );
        assert_eq!(
            generator.next(JsValue::Undefined).unwrap(),
            IteratorResult::not_done(JsValue::Number(2.0))
        );
        assert_eq!(
            generator.next(JsValue::Undefined).unwrap(),
            IteratorResult::done(JsValue::Number(3.0))
        );
        assert_eq!(
            generator.next(JsValue::Undefined).unwrap(),
            IteratorResult::done(JsValue::Undefined)
        );
    }

    #[test]
    fn returning_early_completes_the_generator_with_the_given_value() {
        let generator = Generator::new(Box::new(CountToThree { step: 0 }));
        generator.next(JsValue::Undefined).unwrap();
        assert_eq!(
            generator.return_(JsValue::Number(9.0)).unwrap(),
            IteratorResult::done(JsValue::Number(9.0))
        );
        assert!(generator.next(JsValue::Undefined).unwrap().done);
    }

    #[test]
    fn returning_after_completion_is_a_no_op_that_echoes_the_value() {
        let generator = Generator::new(Box::new(CountToThree { step: 3 }));
        generator.next(JsValue::Undefined).unwrap();
        assert_eq!(
            generator.return_(JsValue::string("bye")).unwrap(),
            IteratorResult::done(JsValue::string("bye"))
        );
    }

    #[test]
    fn resuming_a_running_frame_reentrantly_reports_already_running() {
        use std::cell::RefCell;
        use std::rc::Rc;

        use crate::engine::pauser::ExecutionPauser;

        struct ReentersSelf {
            pauser: Rc<RefCell<Option<ExecutionPauser>>>,
        }
        impl Resumable for ReentersSelf {
            fn resume(&mut self, _completion: ResumeCompletion) -> ExecutionResult {
                let pauser = self.pauser.borrow().clone().unwrap();
                let reentrant = pauser.start(ResumeCompletion::Normal(JsValue::Undefined));
                ExecutionResult::Return(JsValue::Boolean(matches!(
                    reentrant,
                    super::super::pauser::StartOutcome::AlreadyRunning
                )))
            }
        }

        let handle = Rc::new(RefCell::new(None));
        let pauser = ExecutionPauser::new(Box::new(ReentersSelf { pauser: handle.clone() }));
        *handle.borrow_mut() = Some(pauser.clone());

        match pauser.start(ResumeCompletion::Normal(JsValue::Undefined)) {
            StartOutcome::Returned(JsValue::Boolean(true)) => {}
            other => panic!("expected the reentrant resume to report AlreadyRunning, got {other:?}"),
        }
    }
}
