//! [4.10 Disposable stacks](none) (C10): explicit-resource-management
//! cleanup stacks, grounded on `examples/original_source/`'s
//! `DisposableObject.h`/`.cpp` `DisposableResourceRecord`/
//! `DisposableStackObject`/`AsyncDisposableStackObject` shape. Resolving a
//! resource's `[Symbol.dispose]`/`[Symbol.asyncDispose]` method is property
//! lookup on an opaque object (spec §1's collaborator (a)), so callers pass
//! the dispose action directly instead of it being derived from `value`
//! here - mirroring how `Promise::new`'s executor takes a capability
//! directly rather than this core synthesizing `FunctionObject`s.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{JsError, JsResult};
use crate::host::{HostHooks, MicrotaskQueue};
use crate::value::JsValue;

use crate::ecmascript::builtins::promise::{Promise, PromiseCapability};

/// A synchronous dispose callback. Takes queue/hooks so a callback that
/// wraps an async disposer (see [`wrap_async_as_sync`]) can still create
/// the promise it then swallows.
pub type DisposeAction = Box<dyn FnOnce(&mut MicrotaskQueue, &mut dyn HostHooks) -> JsResult<()>>;

/// An asynchronous dispose callback, producing the promise that settles
/// once the resource has finished disposing.
pub type AsyncDisposeAction = Box<dyn FnOnce(&mut MicrotaskQueue, &mut dyn HostHooks) -> Promise>;

/// Wraps an async dispose action into a sync one for
/// `DisposableStack.prototype.use`: the resulting promise is created but
/// never awaited, matching the spec's "swallow the returned promise for
/// sync stacks" rule.
pub fn wrap_async_as_sync(dispose_async: AsyncDisposeAction) -> DisposeAction {
    Box::new(move |queue, hooks| {
        dispose_async(queue, hooks);
        Ok(())
    })
}

fn is_disposable_resource(value: &JsValue) -> Result<bool, JsError> {
    match value {
        JsValue::Undefined | JsValue::Null => Ok(false),
        JsValue::Boolean(_) | JsValue::Number(_) | JsValue::String(_) => Err(JsError::type_error(
            "DisposableStack.prototype.use called with a non-object, non-null value",
        )),
        JsValue::Array(_) | JsValue::Record(_) | JsValue::Error(_) | JsValue::Promise(_) => Ok(true),
    }
}

fn run_lifo_sync(mut records: Vec<DisposeAction>, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks) -> JsResult<()> {
    let mut accumulated: Option<JsError> = None;
    while let Some(dispose) = records.pop() {
        if let Err(error) = dispose(queue, hooks) {
            accumulated = Some(JsError::chain_suppressed(accumulated, error));
        }
    }
    match accumulated {
        None => Ok(()),
        Some(error) => Err(error),
    }
}

/// [27.3 DisposableStack Objects](https://tc39.es/ecma262/#sec-disposablestack-objects).
pub struct DisposableStack {
    records: Vec<DisposeAction>,
    disposed: bool,
}

impl DisposableStack {
    pub fn new() -> Self {
        DisposableStack {
            records: Vec::new(),
            disposed: false,
        }
    }

    pub fn disposed(&self) -> bool {
        self.disposed
    }

    fn check_not_disposed(&self) -> JsResult<()> {
        if self.disposed {
            Err(JsError::reference_error(
                "the disposable stack has already been disposed",
            ))
        } else {
            Ok(())
        }
    }

    /// [27.3.3.2 DisposableStack.prototype.use](https://tc39.es/ecma262/#sec-disposablestack.prototype.use).
    pub fn use_value(&mut self, value: JsValue, dispose: DisposeAction) -> JsResult<JsValue> {
        self.check_not_disposed()?;
        if is_disposable_resource(&value)? {
            self.records.push(dispose);
        }
        Ok(value)
    }

    /// [27.3.3.1 DisposableStack.prototype.adopt](https://tc39.es/ecma262/#sec-disposablestack.prototype.adopt).
    pub fn adopt(
        &mut self,
        value: JsValue,
        on_dispose: impl FnOnce(JsValue) -> JsResult<()> + 'static,
    ) -> JsResult<JsValue> {
        self.check_not_disposed()?;
        let captured = value.clone();
        self.records.push(Box::new(move |_queue, _hooks| on_dispose(captured)));
        Ok(value)
    }

    /// [27.3.3.3 DisposableStack.prototype.defer](https://tc39.es/ecma262/#sec-disposablestack.prototype.defer).
    pub fn defer(&mut self, on_dispose: impl FnOnce() -> JsResult<()> + 'static) -> JsResult<()> {
        self.check_not_disposed()?;
        self.records.push(Box::new(move |_queue, _hooks| on_dispose()));
        Ok(())
    }

    /// [27.3.3.4 DisposableStack.prototype.dispose](https://tc39.es/ecma262/#sec-disposablestack.prototype.dispose).
    /// Idempotent: a stack already disposed is a no-op, not an error.
    pub fn dispose(&mut self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks) -> JsResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        run_lifo_sync(std::mem::take(&mut self.records), queue, hooks)
    }

    /// [27.3.3.5 DisposableStack.prototype.move](https://tc39.es/ecma262/#sec-disposablestack.prototype.move).
    pub fn move_out(&mut self) -> JsResult<DisposableStack> {
        self.check_not_disposed()?;
        self.disposed = true;
        Ok(DisposableStack {
            records: std::mem::take(&mut self.records),
            disposed: false,
        })
    }
}

impl Default for DisposableStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DisposableStack {
    /// A stack dropped without an explicit `dispose()` still runs its
    /// cleanup - the closest this headless core gets to `using`
    /// declarations driving disposal at scope exit, since we have no
    /// parser/binding-form collaborator to do it for us.
    fn drop(&mut self) {
        if !self.disposed && !self.records.is_empty() {
            let mut queue = MicrotaskQueue::new();
            let mut hooks = crate::host::NullHostHooks;
            let _ = run_lifo_sync(std::mem::take(&mut self.records), &mut queue, &mut hooks);
        }
    }
}

/// Shared, independently-poppable state for [`AsyncDisposableStack::dispose_async`]'s
/// await-chain driver - `Rc<RefCell<_>>` since each step's `.then()`
/// handlers need to reach into it from whichever microtask runs next.
struct AsyncDisposeState {
    records: Vec<AsyncDisposeAction>,
    accumulated: Option<JsError>,
}

/// `AggregateError`/`SuppressedError` payloads narrow a rejection reason to
/// a [`JsError`]; a non-error rejection is wrapped rather than dropped.
fn error_from_reason(reason: JsValue) -> JsError {
    match reason {
        JsValue::Error(error) => error,
        other => JsError::simple(crate::error::ExceptionType::Error, format!("{other:?}")),
    }
}

fn drive_dispose_async(
    queue: &mut MicrotaskQueue,
    hooks: &mut dyn HostHooks,
    state: Rc<RefCell<AsyncDisposeState>>,
    capability: PromiseCapability,
) {
    let next = state.borrow_mut().records.pop();
    let next = match next {
        Some(dispose) => dispose,
        None => {
            match state.borrow_mut().accumulated.take() {
                None => capability.resolve(queue, hooks, JsValue::Undefined),
                Some(error) => capability.reject(queue, hooks, JsValue::Error(error)),
            }
            return;
        }
    };

    let promise = next(queue, hooks);
    let fulfill_state = state.clone();
    let fulfill_capability = capability.clone();
    let reject_state = state;
    let reject_capability = capability;
    promise.then(
        queue,
        hooks,
        Some(Box::new(move |queue, hooks, _value| {
            drive_dispose_async(queue, hooks, fulfill_state, fulfill_capability);
            Ok(JsValue::Undefined)
        })),
        Some(Box::new(move |queue, hooks, reason| {
            let mut state_ref = reject_state.borrow_mut();
            let accumulated = state_ref.accumulated.take();
            state_ref.accumulated = Some(JsError::chain_suppressed(accumulated, error_from_reason(reason)));
            drop(state_ref);
            drive_dispose_async(queue, hooks, reject_state, reject_capability);
            Ok(JsValue::Undefined)
        })),
    );
}

/// [27.4 AsyncDisposableStack Objects](https://tc39.es/ecma262/#sec-asyncdisposablestack-objects).
pub struct AsyncDisposableStack {
    records: Vec<AsyncDisposeAction>,
    disposed: bool,
}

impl AsyncDisposableStack {
    pub fn new() -> Self {
        AsyncDisposableStack {
            records: Vec::new(),
            disposed: false,
        }
    }

    pub fn disposed(&self) -> bool {
        self.disposed
    }

    fn check_not_disposed(&self) -> JsResult<()> {
        if self.disposed {
            Err(JsError::reference_error(
                "the async disposable stack has already been disposed",
            ))
        } else {
            Ok(())
        }
    }

    /// [27.4.3.2 AsyncDisposableStack.prototype.use](https://tc39.es/ecma262/#sec-asyncdisposablestack.prototype.use).
    pub fn use_value(&mut self, value: JsValue, dispose: AsyncDisposeAction) -> JsResult<JsValue> {
        self.check_not_disposed()?;
        if is_disposable_resource(&value)? {
            self.records.push(dispose);
        }
        Ok(value)
    }

    /// [27.4.3.1 AsyncDisposableStack.prototype.adopt](https://tc39.es/ecma262/#sec-asyncdisposablestack.prototype.adopt).
    pub fn adopt(
        &mut self,
        value: JsValue,
        on_dispose_async: impl FnOnce(JsValue, &mut MicrotaskQueue, &mut dyn HostHooks) -> Promise + 'static,
    ) -> JsResult<JsValue> {
        self.check_not_disposed()?;
        let captured = value.clone();
        self.records
            .push(Box::new(move |queue, hooks| on_dispose_async(captured, queue, hooks)));
        Ok(value)
    }

    /// [27.4.3.3 AsyncDisposableStack.prototype.defer](https://tc39.es/ecma262/#sec-asyncdisposablestack.prototype.defer).
    pub fn defer(&mut self, on_dispose_async: AsyncDisposeAction) -> JsResult<()> {
        self.check_not_disposed()?;
        self.records.push(on_dispose_async);
        Ok(())
    }

    /// [27.4.3.4 AsyncDisposableStack.prototype.disposeAsync](https://tc39.es/ecma262/#sec-asyncdisposablestack.prototype.disposeasync):
    /// each record's dispose runs one at a time, awaiting its promise before
    /// moving to the next - the await-point the spec's `awaitResumeStage`
    /// discriminator drives, here expressed directly as a `.then()` chain
    /// rather than through the generic [`crate::engine::Resumable`] (the
    /// loop body here is fixed, not arbitrary host bytecode, so there's
    /// nothing for that abstraction to buy us).
    pub fn dispose_async(&mut self, queue: &mut MicrotaskQueue, hooks: &mut dyn HostHooks) -> Promise {
        let capability = PromiseCapability::new();
        if self.disposed {
            capability.resolve(queue, hooks, JsValue::Undefined);
            return capability.promise();
        }
        self.disposed = true;
        let state = Rc::new(RefCell::new(AsyncDisposeState {
            records: std::mem::take(&mut self.records),
            accumulated: None,
        }));
        drive_dispose_async(queue, hooks, state, capability.clone());
        capability.promise()
    }

    /// [27.4.3.5 AsyncDisposableStack.prototype.move](https://tc39.es/ecma262/#sec-asyncdisposablestack.prototype.move).
    pub fn move_out(&mut self) -> JsResult<AsyncDisposableStack> {
        self.check_not_disposed()?;
        self.disposed = true;
        Ok(AsyncDisposableStack {
            records: std::mem::take(&mut self.records),
            disposed: false,
        })
    }
}

impl Default for AsyncDisposableStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHostHooks;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispose_runs_resources_in_lifo_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = DisposableStack::new();

        for label in ["r1", "r2", "r3"] {
            let log = log.clone();
            stack
                .defer(move || {
                    log.borrow_mut().push(label);
                    Ok(())
                })
                .unwrap();
        }

        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;
        stack.dispose(&mut queue, &mut hooks).unwrap();

        assert_eq!(*log.borrow(), vec!["r3", "r2", "r1"]);
    }

    #[test]
    fn dispose_chains_every_failure_as_a_suppressed_error() {
        let mut stack = DisposableStack::new();
        stack.defer(|| Err(JsError::type_error("first"))).unwrap();
        stack.defer(|| Err(JsError::range_error("second"))).unwrap();

        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;
        let error = stack.dispose(&mut queue, &mut hooks).unwrap_err();

        match error {
            JsError::Suppressed { error, suppressed } => {
                // LIFO: "second" is disposed first and becomes the running
                // accumulator, then "first" disposes and wraps it.
                assert!(matches!(*error, JsError::Simple { ref message, .. } if message == "first"));
                assert!(matches!(*suppressed, JsError::Simple { ref message, .. } if message == "second"));
            }
            other => panic!("expected a chained SuppressedError, got {other:?}"),
        }
    }

    #[test]
    fn disposing_twice_is_a_no_op_but_using_after_dispose_is_a_reference_error() {
        let mut stack = DisposableStack::new();
        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;

        stack.dispose(&mut queue, &mut hooks).unwrap();
        stack.dispose(&mut queue, &mut hooks).unwrap();

        let error = stack.defer(|| Ok(())).unwrap_err();
        assert!(matches!(error, JsError::Simple { kind: crate::error::ExceptionType::ReferenceError, .. }));
    }

    #[test]
    fn using_a_primitive_value_is_a_type_error() {
        let mut stack = DisposableStack::new();
        let error = stack
            .use_value(JsValue::Number(1.0), Box::new(|_q, _h| Ok(())))
            .unwrap_err();
        assert!(matches!(error, JsError::Simple { kind: crate::error::ExceptionType::TypeError, .. }));
    }

    #[test]
    fn using_undefined_or_null_passes_through_without_registering_a_resource() {
        let mut stack = DisposableStack::new();
        let value = stack.use_value(JsValue::Undefined, Box::new(|_q, _h| Ok(()))).unwrap();
        assert_eq!(value, JsValue::Undefined);

        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;
        stack.dispose(&mut queue, &mut hooks).unwrap();
    }

    #[test]
    fn moving_a_stack_transfers_its_resources_and_disposes_the_source() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut source = DisposableStack::new();
        let log2 = log.clone();
        source.defer(move || {
            log2.borrow_mut().push("moved");
            Ok(())
        }).unwrap();

        let mut moved = source.move_out().unwrap();
        assert!(source.disposed());
        assert!(!moved.disposed());

        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;
        moved.dispose(&mut queue, &mut hooks).unwrap();
        assert_eq!(*log.borrow(), vec!["moved"]);
    }

    #[test]
    fn dispose_async_awaits_each_resource_before_the_next() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = AsyncDisposableStack::new();

        for label in ["a1", "a2"] {
            let log = log.clone();
            stack
                .defer(Box::new(move |queue, hooks| {
                    log.borrow_mut().push(label);
                    Promise::resolved(queue, hooks, JsValue::Undefined)
                }))
                .unwrap();
        }

        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;
        let settled = stack.dispose_async(&mut queue, &mut hooks);
        queue.drain();

        assert!(settled.is_fulfilled());
        assert_eq!(*log.borrow(), vec!["a2", "a1"]);
    }

    #[test]
    fn dispose_async_rejects_with_the_chained_error_once_every_resource_has_run() {
        let mut stack = AsyncDisposableStack::new();
        stack
            .defer(Box::new(|queue, hooks| {
                Promise::rejected(queue, hooks, JsValue::Error(JsError::type_error("first")))
            }))
            .unwrap();
        stack
            .defer(Box::new(|queue, hooks| {
                Promise::rejected(queue, hooks, JsValue::Error(JsError::range_error("second")))
            }))
            .unwrap();

        let mut queue = MicrotaskQueue::new();
        let mut hooks = NullHostHooks;
        let settled = stack.dispose_async(&mut queue, &mut hooks);
        queue.drain();

        assert!(settled.is_rejected());
        match settled.settled_value() {
            Some(JsValue::Error(JsError::Suppressed { .. })) => {}
            other => panic!("expected a chained SuppressedError, got {other:?}"),
        }
    }
}
