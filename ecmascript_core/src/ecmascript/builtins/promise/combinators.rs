//! [27.2.4 Properties of the Promise Constructor](https://tc39.es/ecma262/#sec-promise.all)
//! combinators - `all`, `allSettled`, `any`, `race` - grounded on `nova_vm`'s
//! combinator implementations but taking a pre-materialized `Vec<Promise>`
//! instead of driving the general iterator protocol, since iterables with
//! arbitrary `Symbol.iterator` objects belong to the property-map/object
//! runtime named out of scope in spec §1.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::JsError;
use crate::host::{HostHooks, MicrotaskQueue};
use crate::value::JsValue;

use super::capability::PromiseCapability;
use super::data::Promise;

/// Attaches a fulfill/reject pair to `promise` via a throwaway result
/// capability, exactly as spec combinators do: `PerformPromiseThen` always
/// needs *some* `resultCapability` to dispatch through, but the handlers
/// below settle the real result capability themselves (using the queue
/// access `Handler` carries) and the throwaway promise is never observed.
fn subscribe(
    queue: &mut MicrotaskQueue,
    hooks: &mut dyn HostHooks,
    promise: &Promise,
    on_fulfilled: super::capability::Handler,
    on_rejected: super::capability::Handler,
) {
    let capability = PromiseCapability::from_promise(promise.clone());
    capability.perform_then(
        queue,
        hooks,
        Some(on_fulfilled),
        Some(on_rejected),
        PromiseCapability::new(),
    );
}

/// [27.2.4.1 Promise.all](https://tc39.es/ecma262/#sec-promise.all).
pub fn all(queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, promises: Vec<Promise>) -> Promise {
    let result = PromiseCapability::new();
    if promises.is_empty() {
        result.resolve(queue, hooks, JsValue::Array(Vec::new()));
        return result.promise();
    }

    let values: Rc<RefCell<Vec<JsValue>>> = Rc::new(RefCell::new(vec![JsValue::Undefined; promises.len()]));
    let remaining = Rc::new(Cell::new(promises.len()));

    for (index, promise) in promises.into_iter().enumerate() {
        let result = result.clone();
        let values = values.clone();
        let remaining = remaining.clone();
        subscribe(
            queue,
            hooks,
            &promise,
            Box::new(move |queue, hooks, value| {
                values.borrow_mut()[index] = value;
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    let collected = values.borrow().clone();
                    result.resolve(queue, hooks, JsValue::Array(collected));
                }
                Ok(JsValue::Undefined)
            }),
            Box::new(move |queue, hooks, reason| {
                result.reject(queue, hooks, reason);
                Ok(JsValue::Undefined)
            }),
        );
    }

    result.promise()
}

/// [27.2.4.3 Promise.race](https://tc39.es/ecma262/#sec-promise.race).
pub fn race(queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, promises: Vec<Promise>) -> Promise {
    let result = PromiseCapability::new();
    for promise in promises {
        let fulfill_result = result.clone();
        let reject_result = result.clone();
        subscribe(
            queue,
            hooks,
            &promise,
            Box::new(move |queue, hooks, value| {
                fulfill_result.resolve(queue, hooks, value);
                Ok(JsValue::Undefined)
            }),
            Box::new(move |queue, hooks, reason| {
                reject_result.reject(queue, hooks, reason);
                Ok(JsValue::Undefined)
            }),
        );
    }
    result.promise()
}

#[derive(Debug, Clone)]
enum Settlement {
    Pending,
    Fulfilled(JsValue),
    Rejected(JsValue),
}

fn settlement_record(settlement: Settlement) -> JsValue {
    match settlement {
        Settlement::Pending => unreachable!("settlement recorded before settling"),
        Settlement::Fulfilled(value) => {
            JsValue::record([("status", JsValue::string("fulfilled")), ("value", value)])
        }
        Settlement::Rejected(reason) => {
            JsValue::record([("status", JsValue::string("rejected")), ("reason", reason)])
        }
    }
}

/// [27.2.4.2 Promise.allSettled](https://tc39.es/ecma262/#sec-promise.allsettled).
pub fn all_settled(queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, promises: Vec<Promise>) -> Promise {
    let result = PromiseCapability::new();
    if promises.is_empty() {
        result.resolve(queue, hooks, JsValue::Array(Vec::new()));
        return result.promise();
    }

    let settlements: Rc<RefCell<Vec<Settlement>>> =
        Rc::new(RefCell::new(promises.iter().map(|_| Settlement::Pending).collect()));
    let remaining = Rc::new(Cell::new(promises.len()));

    for (index, promise) in promises.into_iter().enumerate() {
        let fulfill_result = result.clone();
        let fulfill_settlements = settlements.clone();
        let fulfill_remaining = remaining.clone();
        let reject_result = result.clone();
        let reject_settlements = settlements.clone();
        let reject_remaining = remaining.clone();
        subscribe(
            queue,
            hooks,
            &promise,
            Box::new(move |queue, hooks, value| {
                fulfill_settlements.borrow_mut()[index] = Settlement::Fulfilled(value);
                fulfill_remaining.set(fulfill_remaining.get() - 1);
                if fulfill_remaining.get() == 0 {
                    let records = std::mem::take(&mut *fulfill_settlements.borrow_mut())
                        .into_iter()
                        .map(settlement_record)
                        .collect();
                    fulfill_result.resolve(queue, hooks, JsValue::Array(records));
                }
                Ok(JsValue::Undefined)
            }),
            Box::new(move |queue, hooks, reason| {
                reject_settlements.borrow_mut()[index] = Settlement::Rejected(reason);
                reject_remaining.set(reject_remaining.get() - 1);
                if reject_remaining.get() == 0 {
                    let records = std::mem::take(&mut *reject_settlements.borrow_mut())
                        .into_iter()
                        .map(settlement_record)
                        .collect();
                    reject_result.resolve(queue, hooks, JsValue::Array(records));
                }
                Ok(JsValue::Undefined)
            }),
        );
    }

    result.promise()
}

/// [27.2.4.4 Promise.any](https://tc39.es/ecma262/#sec-promise.any).
pub fn any(queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks, promises: Vec<Promise>) -> Promise {
    let result = PromiseCapability::new();
    if promises.is_empty() {
        result.reject(queue, hooks, JsValue::Error(JsError::Aggregate { errors: Vec::new() }));
        return result.promise();
    }

    let errors: Rc<RefCell<Vec<JsValue>>> = Rc::new(RefCell::new(vec![JsValue::Undefined; promises.len()]));
    let remaining = Rc::new(Cell::new(promises.len()));

    for (index, promise) in promises.into_iter().enumerate() {
        let fulfill_result = result.clone();
        let reject_result = result.clone();
        let errors = errors.clone();
        let remaining = remaining.clone();
        subscribe(
            queue,
            hooks,
            &promise,
            Box::new(move |queue, hooks, value| {
                fulfill_result.resolve(queue, hooks, value);
                Ok(JsValue::Undefined)
            }),
            Box::new(move |queue, hooks, reason| {
                errors.borrow_mut()[index] = reason;
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    let errors = errors.borrow().clone();
                    reject_result.reject(
                        queue,
                        hooks,
                        JsValue::Error(JsError::Aggregate {
                            errors: errors.into_iter().map(error_from_reason).collect(),
                        }),
                    );
                }
                Ok(JsValue::Undefined)
            }),
        );
    }

    result.promise()
}

/// `AggregateError`'s `errors` list is a list of arbitrary rejection
/// reasons in the spec; our [`JsError::Aggregate`] narrows that to a list
/// of [`JsError`]s, so a non-error rejection reason is wrapped rather than
/// dropped.
fn error_from_reason(reason: JsValue) -> JsError {
    match reason {
        JsValue::Error(error) => error,
        other => JsError::simple(crate::error::ExceptionType::Error, format!("{other:?}")),
    }
}
