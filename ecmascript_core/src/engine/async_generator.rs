//! [27.6 AsyncGenerator Objects](https://tc39.es/ecma262/#sec-asyncgenerator-objects),
//! grounded on `nova_vm`'s `async_generator_abstract_operations.rs`
//! (`AsyncGeneratorEnqueue`, `AsyncGeneratorResumeNext`). An async
//! generator multiplexes both suspension kinds the pause engine knows
//! about: a `yield` settles the in-flight request and waits for the next
//! one; an `await` resumes automatically, with the in-flight request
//! still unsettled while it waits. Calls made while one request is still
//! being driven queue up exactly as `[[AsyncGeneratorQueue]]` does.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::host::{HostHooks, MicrotaskQueue};
use crate::value::JsValue;

use super::pauser::{ExecutionPauser, ResumeCompletion, Resumable, StartOutcome};
use crate::ecmascript::builtins::promise::{Promise, PromiseCapability};

struct AsyncGeneratorRequest {
    completion: ResumeCompletion,
    capability: PromiseCapability,
}

fn iter_result_value(value: JsValue, done: bool) -> JsValue {
    JsValue::record([("value", value), ("done", JsValue::Boolean(done))])
}

#[derive(Clone)]
pub struct AsyncGenerator {
    pauser: ExecutionPauser,
    queue: Rc<RefCell<VecDeque<AsyncGeneratorRequest>>>,
    /// True while a request is being driven, including while it's
    /// suspended mid-`await` - distinct from the pauser's own `Executing`
    /// state, which only covers the synchronous portion of one step.
    running: Rc<Cell<bool>>,
}

impl AsyncGenerator {
    pub fn new(resumable: Box<dyn Resumable>) -> Self {
        AsyncGenerator {
            pauser: ExecutionPauser::new(resumable),
            queue: Rc::new(RefCell::new(VecDeque::new())),
            running: Rc::new(Cell::new(false)),
        }
    }

    /// [27.6.3.8 AsyncGeneratorNext](https://tc39.es/ecma262/#sec-asyncgeneratornext).
    pub fn next(&self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, value: JsValue) -> Promise {
        self.enqueue(queue, hooks, ResumeCompletion::Normal(value))
    }

    /// [27.6.3.9 AsyncGeneratorReturn](https://tc39.es/ecma262/#sec-asyncgeneratorreturn).
    pub fn return_(&self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, value: JsValue) -> Promise {
        self.enqueue(queue, hooks, ResumeCompletion::Return(value))
    }

    /// [27.6.3.10 AsyncGeneratorThrow](https://tc39.es/ecma262/#sec-asyncgeneratorthrow).
    pub fn throw(&self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, reason: JsValue) -> Promise {
        self.enqueue(queue, hooks, ResumeCompletion::Throw(reason))
    }

    fn enqueue(&self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, completion: ResumeCompletion) -> Promise {
        let capability = PromiseCapability::new();
        self.queue.borrow_mut().push_back(AsyncGeneratorRequest {
            completion,
            capability: capability.clone(),
        });
        self.resume_next(queue, hooks);
        capability.promise()
    }

    /// [27.6.3.11 AsyncGeneratorResumeNext](https://tc39.es/ecma262/#sec-asyncgeneratorresumenext):
    /// pulls the next queued request through the pauser, if nothing else
    /// is already in flight.
    fn resume_next(&self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks) {
        if self.running.get() {
            return;
        }
        let request = match self.queue.borrow_mut().pop_front() {
            Some(request) => request,
            None => return,
        };
        self.running.set(true);
        self.drive(queue, hooks, request);
    }

    fn drive(&self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, request: AsyncGeneratorRequest) {
        let AsyncGeneratorRequest { completion, capability } = request;

        // What an already-completed generator should settle this request
        // with, computed up front since `completion` is consumed below -
        // a throw rejects with its reason, anything else resolves done.
        let already_completed_result = match &completion {
            ResumeCompletion::Throw(reason) => Err(reason.clone()),
            ResumeCompletion::Return(value) => Ok((value.clone(), true)),
            ResumeCompletion::Normal(_) => Ok((JsValue::Undefined, true)),
        };

        match self.pauser.start(completion) {
            StartOutcome::AlreadyRunning => unreachable!("guarded by the `running` flag"),
            StartOutcome::AlreadyCompleted => {
                match already_completed_result {
                    Ok((value, done)) => capability.resolve(queue, hooks, iter_result_value(value, done)),
                    Err(reason) => capability.reject(queue, hooks, reason),
                }
                self.running.set(false);
                self.resume_next(queue, hooks);
            }
            StartOutcome::Yielded(value) => {
                capability.resolve(queue, hooks, iter_result_value(value, false));
                self.running.set(false);
                self.resume_next(queue, hooks);
            }
            StartOutcome::Returned(value) => {
                capability.resolve(queue, hooks, iter_result_value(value, true));
                self.running.set(false);
                self.resume_next(queue, hooks);
            }
            StartOutcome::Threw(error) => {
                capability.reject(queue, hooks, JsValue::Error(error));
                self.running.set(false);
                self.resume_next(queue, hooks);
            }
            StartOutcome::Awaited(awaited) => {
                let awaited_promise = match awaited {
                    JsValue::Promise(promise) => promise,
                    other => Promise::resolved(queue, hooks, other),
                };
                let fulfill_self = self.clone();
                let fulfill_capability = capability.clone();
                let reject_self = self.clone();
                let reject_capability = capability;
                awaited_promise.then(
                    queue,
                    hooks,
                    Some(Box::new(move |queue, hooks, value| {
                        fulfill_self.drive(
                            queue,
                            hooks,
                            AsyncGeneratorRequest {
                                completion: ResumeCompletion::Normal(value),
                                capability: fulfill_capability,
                            },
                        );
                        Ok(JsValue::Undefined)
                    })),
                    Some(Box::new(move |queue, hooks, reason| {
                        reject_self.drive(
                            queue,
                            hooks,
                            AsyncGeneratorRequest {
                                completion: ResumeCompletion::Throw(reason),
                                capability: reject_capability,
                            },
                        );
                        Ok(JsValue::Undefined)
                    })),
                );
            }
        }
    }
}
