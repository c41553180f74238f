//! End-to-end scenarios exercising the regex engine, promise core and
//! disposable stacks together the way an embedder actually calls them,
//! rather than through one component's own unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use ecmascript_core::disposable::AsyncDisposableStack;
use ecmascript_core::ecmascript::builtins::promise::Promise;
use ecmascript_core::ecmascript::builtins::regexp::{RegExpCache, RegExpObject};
use ecmascript_core::error::JsError;
use ecmascript_core::host::{MicrotaskQueue, NullHostHooks};
use ecmascript_core::realm::JsRealm;
use ecmascript_core::text::JsString;
use ecmascript_core::value::JsValue;

#[test]
fn named_capture_and_duplicate_group() {
    let mut cache = RegExpCache::new();
    let mut realm = JsRealm::new();
    let mut re = RegExpObject::new(&mut cache, "(?<y>a)|(?<y>b)", "u").unwrap();
    let input = JsString::from_str("b");

    let result = re.exec(&mut realm, &input).unwrap().unwrap();
    assert_eq!(result.index, 0);
    assert_eq!(result.matched[0].as_ref().unwrap().to_string_lossy(), "b");
    assert!(result.matched[1].is_none(), "the first alternative's group never matched");
    assert_eq!(result.matched[2].as_ref().unwrap().to_string_lossy(), "b");

    let groups = result.groups.expect("named groups present");
    assert_eq!(groups.get("y").unwrap().as_ref().unwrap().to_string_lossy(), "b");
}

#[test]
fn lookbehind_with_a_backreference() {
    let mut cache = RegExpCache::new();
    let mut realm = JsRealm::new();
    let mut re = RegExpObject::new(&mut cache, r"(?<=(\w)\1)x", "u").unwrap();
    let input = JsString::from_str("ggx");

    let result = re.exec(&mut realm, &input).unwrap().unwrap();
    assert_eq!(result.index, 2);
    assert_eq!(result.matched[0].as_ref().unwrap().to_string_lossy(), "x");
    assert_eq!(result.matched[1].as_ref().unwrap().to_string_lossy(), "g");
}

#[test]
fn unicode_property_escape_under_ignore_case() {
    let mut cache = RegExpCache::new();
    let mut realm = JsRealm::new();

    let mut matches = RegExpObject::new(&mut cache, r"^\p{Letter}+$", "iu").unwrap();
    assert!(matches.test(&mut realm, &JsString::from_str("\u{e1}b\u{e7}")).unwrap());

    let mut rejects = RegExpObject::new(&mut cache, r"^\p{Letter}+$", "iu").unwrap();
    assert!(!rejects.test(&mut realm, &JsString::from_str("\u{e1}b\u{e7}1")).unwrap());
}

#[test]
fn sticky_iteration_advances_then_fails_and_resets_last_index() {
    let mut cache = RegExpCache::new();
    let mut realm = JsRealm::new();
    let mut re = RegExpObject::new(&mut cache, "a", "y").unwrap();
    re.last_index = 1;
    let input = JsString::from_str("aab");

    let first = re.exec(&mut realm, &input).unwrap();
    assert!(first.is_some());
    assert_eq!(re.last_index, 2);

    let second = re.exec(&mut realm, &input).unwrap();
    assert!(second.is_none());
    assert_eq!(re.last_index, 0);
}

#[test]
fn then_handlers_run_in_the_order_they_were_attached() {
    let mut queue = MicrotaskQueue::new();
    let mut hooks = NullHostHooks;
    let log = Rc::new(RefCell::new(Vec::new()));

    let p = Promise::resolved(&mut queue, &mut hooks, JsValue::Number(1.0));

    let log_a = log.clone();
    p.then(
        &mut queue,
        &mut hooks,
        Some(Box::new(move |_queue, _hooks, value| {
            if let JsValue::Number(n) = value {
                log_a.borrow_mut().push(format!("A:{n}"));
            }
            Ok(value)
        })),
        None,
    );
    let log_b = log.clone();
    p.then(
        &mut queue,
        &mut hooks,
        Some(Box::new(move |_queue, _hooks, value| {
            if let JsValue::Number(n) = value {
                log_b.borrow_mut().push(format!("B:{n}"));
            }
            Ok(value)
        })),
        None,
    );

    queue.drain();
    assert_eq!(*log.borrow(), vec!["A:1".to_string(), "B:1".to_string()]);
}

#[test]
fn async_disposable_stack_chains_suppressed_errors_across_await_points() {
    let mut queue = MicrotaskQueue::new();
    let mut hooks = NullHostHooks;
    let mut stack = AsyncDisposableStack::new();

    // Pushed r1, r2, r3; LIFO teardown runs r3 first, then r2, then r1.
    stack
        .defer(Box::new(|queue, hooks| {
            Promise::rejected(queue, hooks, JsValue::Error(JsError::type_error("e1")))
        }))
        .unwrap();
    stack
        .defer(Box::new(|queue, hooks| {
            Promise::rejected(queue, hooks, JsValue::Error(JsError::type_error("e2")))
        }))
        .unwrap();
    stack
        .defer(Box::new(|queue, hooks| Promise::resolved(queue, hooks, JsValue::Undefined)))
        .unwrap();

    let settled = stack.dispose_async(&mut queue, &mut hooks);
    queue.drain();

    assert!(settled.is_rejected());
    match settled.settled_value() {
        Some(JsValue::Error(JsError::Suppressed { error, suppressed })) => {
            assert!(matches!(*error, JsError::Simple { ref message, .. } if message == "e1"));
            match *suppressed {
                JsError::Simple { ref message, .. } => assert_eq!(message, "e2"),
                other => panic!("expected e2 to be the innermost link, got {other:?}"),
            }
        }
        other => panic!("expected a chained SuppressedError, got {other:?}"),
    }
}
