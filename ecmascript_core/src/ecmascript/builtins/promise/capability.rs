//! [27.2.1.1 PromiseCapability Records](https://tc39.es/ecma262/#sec-promisecapability-records)
//! and the `FulfillPromise`/`RejectPromise`/`TriggerPromiseReactions`
//! operations, grounded on `nova_vm`'s `promise_capability_records.rs`. The
//! teacher splits capability creation from the executor-calling
//! `NewPromiseCapability` abstract operation because it must support
//! subclassing `Promise`; we have no class/constructor object model here
//! (spec §1's property-map runtime is out of scope), so a capability is
//! always backed by a fresh [`Promise`].

use std::cell::Cell;
use std::rc::Rc;

use crate::error::JsError;
use crate::host::{HostHooks, MicrotaskQueue, PromiseRejectionTrackerOperation};
use crate::value::JsValue;

use super::data::{Promise, PromiseState};
use super::jobs;
use super::reaction::{PromiseReaction, PromiseReactionType};

/// A fulfill or reject handler attached via `.then()`. The error side is a
/// plain [`JsValue`] rather than a [`JsError`] because JS lets `.then()`
/// handlers throw (or a `.catch()` rethrow) any value at all, not just the
/// host's closed exception shapes - mirrors how `reject()` below already
/// takes an arbitrary `JsValue` reason. Handlers get the queue and host
/// hooks directly (rather than only a return value the reaction job
/// auto-dispatches) so combinators (`combinators.rs`) can settle their own
/// result capability from inside a handler instead of through whatever
/// capability the reaction happens to carry.
pub type Handler =
    Box<dyn FnOnce(&mut MicrotaskQueue, &mut dyn HostHooks, JsValue) -> Result<JsValue, JsValue>>;

#[derive(Clone)]
pub struct PromiseCapability {
    promise: Promise,
    /// Spec §3's "AlreadyResolved" record. `Rc<Cell<bool>>` rather than a
    /// plain `bool` field because the resolve/reject functions handed out
    /// by `NewPromiseCapability` must share one flag between them even
    /// though each is invoked through its own cloned handle.
    already_resolved: Rc<Cell<bool>>,
}

impl PromiseCapability {
    pub fn new() -> Self {
        PromiseCapability {
            promise: Promise::new(),
            already_resolved: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn from_promise(promise: Promise) -> Self {
        PromiseCapability {
            promise,
            already_resolved: Rc::new(Cell::new(false)),
        }
    }

    pub fn promise(&self) -> Promise {
        self.promise.clone()
    }

    /// Gate for the resolve/reject *functions* themselves (spec §3's
    /// "AlreadyResolved" check) - distinct from whether `[[PromiseState]]`
    /// is still pending, which `internal_fulfill`/`internal_reject` check
    /// on their own since a thenable job can call back into them well
    /// after `resolve`/`reject` already flipped this flag.
    fn is_settleable(&self) -> bool {
        !self.already_resolved.get() && self.promise.is_pending()
    }

    /// [27.2.1.4 FulfillPromise](https://tc39.es/ecma262/#sec-fulfillpromise).
    pub(crate) fn internal_fulfill(&self, queue: &mut MicrotaskQueue, value: JsValue) {
        if !self.promise.is_pending() {
            return;
        }
        let reactions = {
            let mut data = self.promise.0.borrow_mut();
            match std::mem::take(&mut data.state) {
                PromiseState::Pending {
                    fulfill_reactions, ..
                } => fulfill_reactions,
                other => {
                    data.state = other;
                    return;
                }
            }
        };
        self.promise.0.borrow_mut().state = PromiseState::Fulfilled { value: value.clone() };
        trigger(queue, reactions, value);
    }

    /// [27.2.1.7 RejectPromise](https://tc39.es/ecma262/#sec-rejectpromise).
    pub(crate) fn internal_reject(
        &self,
        queue: &mut MicrotaskQueue,
        hooks: &mut dyn HostHooks,
        reason: JsValue,
    ) {
        if !self.promise.is_pending() {
            return;
        }
        let reactions = {
            let mut data = self.promise.0.borrow_mut();
            match std::mem::take(&mut data.state) {
                PromiseState::Pending {
                    reject_reactions, ..
                } => reject_reactions,
                other => {
                    data.state = other;
                    return;
                }
            }
        };
        let is_handled = !reactions.is_empty();
        self.promise.0.borrow_mut().state = PromiseState::Rejected {
            reason: reason.clone(),
            is_handled,
        };
        trigger(queue, reactions, reason);
        if !is_handled {
            hooks.promise_rejection_tracker(self.promise.clone(), PromiseRejectionTrackerOperation::Reject);
        }
    }

    /// [27.2.1.3.2 Promise Resolve Functions](https://tc39.es/ecma262/#sec-promise-resolve-functions).
    /// Thenable-chaining is reduced to "resolution is one of our own
    /// promises", since the closed [`JsValue`] model has no generic
    /// "object with a callable `then`" shape to detect (spec §1's property
    /// map/shape runtime that would carry arbitrary `then` methods is out
    /// of scope).
    pub fn resolve(&self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, resolution: JsValue) {
        if !self.is_settleable() {
            return;
        }
        if let JsValue::Promise(thenable) = &resolution {
            if *thenable == self.promise {
                self.mark_resolved();
                self.internal_reject(
                    queue,
                    hooks,
                    JsValue::Error(JsError::type_error("cannot resolve a promise with itself")),
                );
                return;
            }
            self.mark_resolved();
            let capability = self.clone();
            queue.enqueue(jobs::new_promise_resolve_thenable_job(capability, thenable.clone()));
            return;
        }
        self.mark_resolved();
        self.internal_fulfill(queue, resolution);
    }

    pub fn reject(&self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, reason: JsValue) {
        if !self.is_settleable() {
            return;
        }
        self.mark_resolved();
        self.internal_reject(queue, hooks, reason);
    }

    /// Marks the capability's "AlreadyResolved" flag without touching
    /// `[[PromiseState]]` itself - the resolve/reject *functions* can only
    /// fire once even though the promise's state transition itself happens
    /// later (e.g. after a thenable job settles).
    fn mark_resolved(&self) {
        self.already_resolved.set(true);
    }

    /// Attaches a fulfill/reject pair (spec §3 `PerformPromiseThen`),
    /// returning the capability the derived promise settles through.
    pub(crate) fn perform_then(
        &self,
        queue: &mut MicrotaskQueue,
        hooks: &mut dyn HostHooks,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
        result_capability: PromiseCapability,
    ) {
        let fulfill_reaction = PromiseReaction {
            capability: result_capability.clone(),
            reaction_type: PromiseReactionType::Fulfill,
            handler: on_fulfilled,
        };
        let reject_reaction = PromiseReaction {
            capability: result_capability,
            reaction_type: PromiseReactionType::Reject,
            handler: on_rejected,
        };

        let mut data = self.promise.0.borrow_mut();
        match &mut data.state {
            PromiseState::Pending {
                fulfill_reactions,
                reject_reactions,
                ..
            } => {
                fulfill_reactions.push(fulfill_reaction);
                reject_reactions.push(reject_reaction);
            }
            PromiseState::Fulfilled { value } => {
                let value = value.clone();
                drop(data);
                queue.enqueue(jobs::new_promise_reaction_job(fulfill_reaction, value));
            }
            PromiseState::Rejected { reason, is_handled } => {
                let reason = reason.clone();
                let was_handled = *is_handled;
                *is_handled = true;
                drop(data);
                if !was_handled {
                    hooks.promise_rejection_tracker(
                        self.promise.clone(),
                        PromiseRejectionTrackerOperation::Handle,
                    );
                }
                queue.enqueue(jobs::new_promise_reaction_job(reject_reaction, reason));
            }
        }
    }
}

impl Default for PromiseCapability {
    fn default() -> Self {
        Self::new()
    }
}

/// [27.2.1.8 TriggerPromiseReactions](https://tc39.es/ecma262/#sec-triggerpromisereactions).
fn trigger(queue: &mut MicrotaskQueue, reactions: Vec<PromiseReaction>, argument: JsValue) {
    for reaction in reactions {
        queue.enqueue(jobs::new_promise_reaction_job(reaction, argument.clone()));
    }
}
