//! [27.2 Promise Objects](https://tc39.es/ecma262/#sec-promise-objects),
//! grounded on `nova_vm`'s `promise/` module tree. `data.rs` holds the
//! state and handle, `reaction.rs`/`capability.rs` the
//! fulfill/reject/trigger machinery, `jobs.rs` the two job kinds the
//! microtask queue actually runs, and `combinators.rs` the `Promise.all`
//! family.

mod capability;
mod combinators;
mod data;
mod jobs;
mod reaction;

pub use capability::{Handler, PromiseCapability};
pub use combinators::{all, all_settled, any, race};
pub use data::Promise;

use crate::host::{HostHooks, MicrotaskQueue};
use crate::value::JsValue;

impl Promise {
    /// [27.2.3.1 Promise ( executor )](https://tc39.es/ecma262/#sec-promise-executor).
    /// The executor takes the resolve/reject capability directly instead of
    /// two separate `FunctionObject`s built by `CreateResolvingFunctions`;
    /// we have no function-object/property-map runtime to allocate them on
    /// (spec §1's collaborator (b)).
    pub fn new(
        queue: &mut MicrotaskQueue,
        hooks: &mut dyn HostHooks,
        executor: impl FnOnce(&mut MicrotaskQueue, &mut dyn HostHooks, &PromiseCapability),
    ) -> Self {
        let capability = PromiseCapability::new();
        executor(queue, hooks, &capability);
        capability.promise()
    }

    /// [27.2.4.7 Promise.resolve](https://tc39.es/ecma262/#sec-promise.resolve).
    pub fn resolved(queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, value: JsValue) -> Self {
        let capability = PromiseCapability::new();
        capability.resolve(queue, hooks, value);
        capability.promise()
    }

    /// [27.2.4.6 Promise.reject](https://tc39.es/ecma262/#sec-promise.reject).
    pub fn rejected(queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, reason: JsValue) -> Self {
        let capability = PromiseCapability::new();
        capability.reject(queue, hooks, reason);
        capability.promise()
    }

    /// [27.2.5.4 Promise.prototype.then](https://tc39.es/ecma262/#sec-promise.prototype.then).
    pub fn then(
        &self,
        queue: &mut MicrotaskQueue,
        hooks: &mut dyn HostHooks,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
    ) -> Promise {
        let capability = PromiseCapability::from_promise(self.clone());
        let result_capability = PromiseCapability::new();
        let result = result_capability.promise();
        capability.perform_then(queue, hooks, on_fulfilled, on_rejected, result_capability);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsError;
    use crate::host::{NullHostHooks, PromiseRejectionTrackerOperation};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn resolve_then_drain_fulfills_and_runs_then_handler() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;
        let seen = Rc::new(RefCell::new(None));

        let promise = Promise::resolved(&mut queue, &mut hooks, JsValue::Number(42.0));
        let seen2 = seen.clone();
        promise.then(
            &mut queue,
            &mut hooks,
            Some(Box::new(move |_q, _h, value| {
                *seen2.borrow_mut() = Some(value.clone());
                Ok(value)
            })),
            None,
        );

        assert!(seen.borrow().is_none(), "handler must not run synchronously");
        queue.drain();
        assert!(matches!(seen.borrow().as_ref(), Some(JsValue::Number(n)) if *n == 42.0));
    }

    #[test]
    fn then_chaining_propagates_the_handlers_return_value() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        let promise = Promise::resolved(&mut queue, &mut hooks, JsValue::Number(1.0));
        let doubled = promise.then(
            &mut queue,
            &mut hooks,
            Some(Box::new(|_q, _h, value| match value {
                JsValue::Number(n) => Ok(JsValue::Number(n * 2.0)),
                other => Ok(other),
            })),
            None,
        );
        queue.drain();

        match doubled.settled_value() {
            Some(JsValue::Number(n)) => assert_eq!(n, 2.0),
            other => panic!("expected a settled number, got {other:?}"),
        }
    }

    #[test]
    fn rejecting_with_no_handler_reports_unhandled_rejection() {
        struct TrackingHooks {
            ops: Rc<RefCell<Vec<PromiseRejectionTrackerOperation>>>,
        }
        impl HostHooks for TrackingHooks {
            fn promise_rejection_tracker(&mut self, _promise: Promise, operation: PromiseRejectionTrackerOperation) {
                self.ops.borrow_mut().push(operation);
            }
        }

        let mut queue = MicrotaskQueue::new();
        let ops = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = TrackingHooks { ops: ops.clone() };

        let capability = PromiseCapability::new();
        capability.reject(&mut queue, &mut hooks, JsValue::string("boom"));

        assert_eq!(*ops.borrow(), vec![PromiseRejectionTrackerOperation::Reject]);
    }

    #[test]
    fn attaching_a_handler_after_rejection_reports_it_as_handled() {
        struct TrackingHooks {
            ops: Rc<RefCell<Vec<PromiseRejectionTrackerOperation>>>,
        }
        impl HostHooks for TrackingHooks {
            fn promise_rejection_tracker(&mut self, _promise: Promise, operation: PromiseRejectionTrackerOperation) {
                self.ops.borrow_mut().push(operation);
            }
        }

        let mut queue = MicrotaskQueue::new();
        let ops = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = TrackingHooks { ops: ops.clone() };

        let promise = Promise::rejected(&mut queue, &mut hooks, JsValue::string("boom"));
        assert_eq!(*ops.borrow(), vec![PromiseRejectionTrackerOperation::Reject]);

        promise.then(&mut queue, &mut hooks, None, Some(Box::new(|_q, _h, reason| Ok(reason))));
        assert_eq!(
            *ops.borrow(),
            vec![
                PromiseRejectionTrackerOperation::Reject,
                PromiseRejectionTrackerOperation::Handle
            ]
        );
    }

    #[test]
    fn resolving_with_a_promise_chains_its_eventual_settlement() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        let inner_capability = PromiseCapability::new();
        let inner = inner_capability.promise();

        let outer_capability = PromiseCapability::new();
        let outer = outer_capability.promise();
        outer_capability.resolve(&mut queue, &mut hooks, JsValue::Promise(inner));
        queue.drain();
        assert!(outer.is_pending(), "outer must wait on the inner promise");

        inner_capability.resolve(&mut queue, &mut hooks, JsValue::string("done"));
        queue.drain();

        match outer.settled_value() {
            Some(JsValue::String(s)) => assert_eq!(s.to_string_lossy(), "done"),
            other => panic!("expected outer to adopt the inner value, got {other:?}"),
        }
    }

    #[test]
    fn resolving_a_promise_with_itself_rejects_with_a_type_error() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        let capability = PromiseCapability::new();
        let promise = capability.promise();
        capability.resolve(&mut queue, &mut hooks, JsValue::Promise(promise.clone()));
        queue.drain();

        assert!(promise.is_rejected());
        match promise.settled_value() {
            Some(JsValue::Error(JsError::Simple { kind, .. })) => {
                assert_eq!(kind, crate::error::ExceptionType::TypeError)
            }
            other => panic!("expected a TypeError, got {other:?}"),
        }
    }

    #[test]
    fn all_resolves_with_every_value_in_order() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        let a = Promise::resolved(&mut queue, &mut hooks, JsValue::Number(1.0));
        let b = Promise::resolved(&mut queue, &mut hooks, JsValue::Number(2.0));
        let combined = all(&mut queue, &mut hooks, vec![a, b]);
        queue.drain();

        match combined.settled_value() {
            Some(JsValue::Array(values)) => {
                assert!(matches!(values[0], JsValue::Number(n) if n == 1.0));
                assert!(matches!(values[1], JsValue::Number(n) if n == 2.0));
            }
            other => panic!("expected a settled array, got {other:?}"),
        }
    }

    #[test]
    fn all_rejects_as_soon_as_any_input_rejects() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        let ok = PromiseCapability::new();
        let fails = Promise::rejected(&mut queue, &mut hooks, JsValue::string("nope"));
        let combined = all(&mut queue, &mut hooks, vec![ok.promise(), fails]);
        queue.drain();

        assert!(combined.is_rejected());
    }

    #[test]
    fn race_settles_with_whichever_input_settles_first() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        let pending = PromiseCapability::new();
        let fast = Promise::resolved(&mut queue, &mut hooks, JsValue::string("fast"));
        let combined = race(&mut queue, &mut hooks, vec![pending.promise(), fast]);
        queue.drain();

        match combined.settled_value() {
            Some(JsValue::String(s)) => assert_eq!(s.to_string_lossy(), "fast"),
            other => panic!("expected the fast promise's value, got {other:?}"),
        }
    }

    #[test]
    fn all_settled_never_rejects_and_records_every_outcome() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        let ok = Promise::resolved(&mut queue, &mut hooks, JsValue::Number(1.0));
        let fails = Promise::rejected(&mut queue, &mut hooks, JsValue::string("no"));
        let combined = all_settled(&mut queue, &mut hooks, vec![ok, fails]);
        queue.drain();

        match combined.settled_value() {
            Some(JsValue::Array(records)) => assert_eq!(records.len(), 2),
            other => panic!("expected a settled array of outcome records, got {other:?}"),
        }
        assert!(combined.is_fulfilled());
    }

    #[test]
    fn any_rejects_with_an_aggregate_error_when_everything_rejects() {
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        let a = Promise::rejected(&mut queue, &mut hooks, JsValue::string("a"));
        let b = Promise::rejected(&mut queue, &mut hooks, JsValue::string("b"));
        let combined = any(&mut queue, &mut hooks, vec![a, b]);
        queue.drain();

        match combined.settled_value() {
            Some(JsValue::Error(JsError::Aggregate { errors })) => assert_eq!(errors.len(), 2),
            other => panic!("expected an AggregateError, got {other:?}"),
        }
    }
}
