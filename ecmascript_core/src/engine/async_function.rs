//! [27.7 AsyncFunction Objects](https://tc39.es/ecma262/#sec-async-function-objects)'s
//! evaluation driver, grounded on `nova_vm`'s `async_function_objects.rs`
//! await-loop. Unlike a generator, nothing outside the engine ever calls
//! `.next()` on an async function: starting it immediately drives it
//! through every `await` until it returns or throws, each `await`
//! re-entering via a promise reaction microtask.

use crate::error::JsError;
use crate::host::{HostHooks, MicrotaskQueue};
use crate::value::JsValue;

use super::pauser::{ExecutionPauser, ResumeCompletion, Resumable, StartOutcome};
use crate::ecmascript::builtins::promise::{Promise, PromiseCapability};

/// [27.7.5.1 AsyncFunctionStart](https://tc39.es/ecma262/#sec-async-functions-abstract-operations-async-function-start),
/// folded together with the AsyncBlockStart await-loop: drives `resumable`
/// to its first suspension, then keeps re-entering through `.then()` on
/// whatever it awaited until the function returns or throws, settling
/// `capability` at that point.
pub fn start(queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, resumable: Box<dyn Resumable>) -> Promise {
    let capability = PromiseCapability::new();
    let pauser = ExecutionPauser::new(resumable);
    drive(queue, hooks, pauser, capability.clone(), ResumeCompletion::Normal(JsValue::Undefined));
    capability.promise()
}

fn drive(
    queue: &mut MicrotaskQueue,
    hooks: &mut dyn HostHooks,
    pauser: ExecutionPauser,
    capability: PromiseCapability,
    completion: ResumeCompletion,
) {
    match pauser.start(completion) {
        StartOutcome::AlreadyRunning | StartOutcome::AlreadyCompleted => {
            // Can't happen from this driver's own re-entry discipline: each
            // `drive` call only fires once per suspension, from the
            // reaction job of the promise that suspension awaited.
        }
        StartOutcome::Returned(value) => capability.resolve(queue, hooks, value),
        StartOutcome::Threw(error) => capability.reject(queue, hooks, JsValue::Error(error)),
        StartOutcome::Yielded(_) => capability.reject(
            queue,
            hooks,
            JsValue::Error(JsError::simple(
                crate::error::ExceptionType::TypeError,
                "unexpected yield in a non-generator async function",
            )),
        ),
        StartOutcome::Awaited(awaited) => {
            // [27.7.5.3 Await](https://tc39.es/ecma262/#await): coerce the
            // awaited value to a promise, then resume with its fulfillment
            // value or rethrow its rejection reason.
            let awaited_promise = match awaited {
                JsValue::Promise(promise) => promise,
                other => Promise::resolved(queue, hooks, other),
            };
            let fulfill_pauser = pauser.clone();
            let fulfill_capability = capability.clone();
            let reject_pauser = pauser;
            let reject_capability = capability;
            awaited_promise.then(
                queue,
                hooks,
                Some(Box::new(move |queue, hooks, value| {
                    drive(queue, hooks, fulfill_pauser, fulfill_capability, ResumeCompletion::Normal(value));
                    Ok(JsValue::Undefined)
                })),
                Some(Box::new(move |queue, hooks, reason| {
                    drive(queue, hooks, reject_pauser, reject_capability, ResumeCompletion::Throw(reason));
                    Ok(JsValue::Undefined)
                })),
            );
        }
    }
}
