//! Unit tests for the resolution procedure

use crate::support::{call_arg, thenable, Log};
use async_runtime::{CycleDetection, EventLoop, PromiseState, RuntimeConfig};
use core_types::{JsError, JsFunction, JsObject, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn error_of(value: Option<Value>) -> JsError {
    match value {
        Some(Value::Error(err)) => (*err).clone(),
        other => panic!("expected an error reason, got {:?}", other),
    }
}

#[test]
fn deferred_resolved_with_own_promise_rejects_with_type_error() {
    let event_loop = EventLoop::new();
    let deferred = event_loop.deferred();
    deferred.resolve(deferred.promise().to_value());
    assert!(error_of(deferred.promise().reason()).is_self_resolution());
}

#[test]
fn handler_returning_its_own_derived_promise_rejects() {
    let mut event_loop = EventLoop::new();
    let slot: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
    let s = slot.clone();
    let derived = event_loop.resolved(1).then(
        Some(Value::function(move |_, _| {
            Ok(s.borrow().clone().unwrap_or(Value::Undefined))
        })),
        None,
    );
    *slot.borrow_mut() = Some(derived.to_value());

    event_loop.run_until_done().unwrap();
    assert!(error_of(derived.reason()).is_self_resolution());
}

#[test]
fn thenable_fulfilling_synchronously_is_adopted() {
    let event_loop = EventLoop::new();
    let deferred = event_loop.deferred();
    deferred.resolve(thenable(|_, args| call_arg(args, 0, Value::Smi(5))));
    assert_eq!(deferred.promise().value(), Some(Value::Smi(5)));
}

#[test]
fn thenable_rejecting_rejects() {
    let event_loop = EventLoop::new();
    let deferred = event_loop.deferred();
    deferred.resolve(thenable(|_, args| call_arg(args, 1, Value::from("denied"))));
    assert_eq!(deferred.promise().reason(), Some(Value::from("denied")));
}

#[test]
fn thenable_rejection_reason_is_not_resolved() {
    let event_loop = EventLoop::new();
    let deferred = event_loop.deferred();
    let reason = thenable(|_, args| call_arg(args, 0, Value::Smi(1)));
    let r = reason.clone();
    deferred.resolve(thenable(move |_, args| call_arg(args, 1, r.clone())));
    assert_eq!(deferred.promise().reason(), Some(reason));
}

#[test]
fn then_is_called_with_thenable_as_receiver() {
    let event_loop = EventLoop::new();
    let receiver = Rc::new(RefCell::new(Value::Undefined));
    let r = receiver.clone();
    let x = thenable(move |this, _| {
        *r.borrow_mut() = this.clone();
        Ok(Value::Undefined)
    });
    event_loop.resolved(x.clone());
    assert_eq!(*receiver.borrow(), x);
}

#[test]
fn then_is_read_exactly_once() {
    let event_loop = EventLoop::new();
    let reads = Rc::new(Cell::new(0));
    let r = reads.clone();
    let object = JsObject::new();
    object.define_getter(
        "then",
        JsFunction::new(move |_, _| {
            r.set(r.get() + 1);
            Ok(Value::function(|_, args| call_arg(args, 0, Value::Smi(1))))
        }),
    );
    let promise = event_loop.resolved(Value::Object(object));
    assert_eq!(promise.value(), Some(Value::Smi(1)));
    assert_eq!(reads.get(), 1);
}

#[test]
fn throwing_then_getter_rejects() {
    let event_loop = EventLoop::new();
    let object = JsObject::new();
    object.define_getter(
        "then",
        JsFunction::new(|_, _| Err(Value::from("getter threw"))),
    );
    let promise = event_loop.resolved(Value::Object(object));
    assert_eq!(promise.reason(), Some(Value::from("getter threw")));
}

#[test]
fn throwing_then_rejects_when_no_callback_fired() {
    let event_loop = EventLoop::new();
    let promise = event_loop.resolved(thenable(|_, _| Err(Value::from("then threw"))));
    assert_eq!(promise.reason(), Some(Value::from("then threw")));
}

#[test]
fn throwing_then_after_fulfill_is_ignored() {
    let event_loop = EventLoop::new();
    let promise = event_loop.resolved(thenable(|_, args| {
        call_arg(args, 0, Value::Smi(1))?;
        Err(Value::from("too late"))
    }));
    assert_eq!(promise.value(), Some(Value::Smi(1)));
}

#[test]
fn only_first_callback_invocation_counts() {
    let event_loop = EventLoop::new();
    let promise = event_loop.resolved(thenable(|_, args| {
        call_arg(args, 0, Value::Smi(2))?;
        call_arg(args, 0, Value::Smi(3))?;
        call_arg(args, 1, Value::from("ignored"))?;
        Ok(Value::Undefined)
    }));
    assert_eq!(promise.value(), Some(Value::Smi(2)));
}

#[test]
fn reject_then_fulfill_keeps_rejection() {
    let event_loop = EventLoop::new();
    let promise = event_loop.resolved(thenable(|_, args| {
        call_arg(args, 1, Value::from("first"))?;
        call_arg(args, 0, Value::Smi(3))?;
        Ok(Value::Undefined)
    }));
    assert_eq!(promise.reason(), Some(Value::from("first")));
}

#[test]
fn asynchronous_thenable_is_adopted_later() {
    let mut event_loop = EventLoop::new();
    let stash: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
    let s = stash.clone();
    let promise = event_loop.resolved(thenable(move |_, args| {
        *s.borrow_mut() = args.first().cloned();
        Ok(Value::Undefined)
    }));
    assert!(promise.is_pending());

    let callback = stash.borrow().clone();
    if let Some(Value::Function(on_fulfilled)) = callback {
        on_fulfilled
            .call(&Value::Undefined, &[Value::from("later")])
            .unwrap();
        // A second late call is ignored.
        on_fulfilled
            .call(&Value::Undefined, &[Value::from("again")])
            .unwrap();
    }
    event_loop.run_until_done().unwrap();
    assert_eq!(promise.value(), Some(Value::from("later")));
}

#[test]
fn non_callable_then_fulfills_with_object() {
    let event_loop = EventLoop::new();
    let object = Value::Object(JsObject::new().with("then", Value::from("not a function")));
    let promise = event_loop.resolved(object.clone());
    assert_eq!(promise.value(), Some(object));
}

#[test]
fn callable_with_then_property_is_a_thenable() {
    let event_loop = EventLoop::new();
    let func = JsFunction::new(|_, _| Ok(Value::Undefined));
    func.set("then", Value::function(|_, args| call_arg(args, 0, Value::Smi(11))));
    let promise = event_loop.resolved(Value::Function(func));
    assert_eq!(promise.value(), Some(Value::Smi(11)));
}

#[test]
fn plain_function_fulfills_with_itself() {
    let event_loop = EventLoop::new();
    let func = Value::function(|_, _| Ok(Value::Undefined));
    let promise = event_loop.resolved(func.clone());
    assert_eq!(promise.value(), Some(func));
}

#[test]
fn mutually_referential_thenables_reject_with_cycle_error() {
    let event_loop = EventLoop::new();
    let a = JsObject::new();
    let b = JsObject::new();
    let b_for_a = b.clone();
    a.set(
        "then",
        Value::function(move |_, args| call_arg(args, 0, Value::Object(b_for_a.clone()))),
    );
    let a_for_b = a.clone();
    b.set(
        "then",
        Value::function(move |_, args| call_arg(args, 0, Value::Object(a_for_b.clone()))),
    );

    let promise = event_loop.resolved(Value::Object(a));
    assert!(error_of(promise.reason()).is_thenable_cycle());
}

#[test]
fn chain_of_distinct_thenables_is_not_a_cycle() {
    let event_loop = EventLoop::new();
    let inner = thenable(|_, args| call_arg(args, 0, Value::Smi(3)));
    let outer = thenable(move |_, args| call_arg(args, 0, inner.clone()));
    let promise = event_loop.resolved(outer);
    assert_eq!(promise.value(), Some(Value::Smi(3)));
}

#[test]
fn thenable_fulfilling_with_itself_is_a_cycle() {
    let event_loop = EventLoop::new();
    let a = JsObject::new();
    let me = a.clone();
    a.set(
        "then",
        Value::function(move |_, args| call_arg(args, 0, Value::Object(me.clone()))),
    );
    let promise = event_loop.resolved(Value::Object(a));
    assert!(error_of(promise.reason()).is_thenable_cycle());
}

#[test]
fn disabled_cycle_detection_falls_back_to_step_limit() {
    let event_loop = EventLoop::with_config(RuntimeConfig {
        cycle_detection: CycleDetection::Disabled,
        max_adoption_steps: Some(25),
        trace_settlements: false,
    });
    let a = JsObject::new();
    let me = a.clone();
    a.set(
        "then",
        Value::function(move |_, args| call_arg(args, 0, Value::Object(me.clone()))),
    );
    let promise = event_loop.resolved(Value::Object(a));
    let err = error_of(promise.reason());
    assert_eq!(err, JsError::adoption_limit(25));
}

#[test]
fn pending_promise_adoption_follows_rejection() {
    let mut event_loop = EventLoop::new();
    let inner = event_loop.deferred();
    let outer = event_loop.resolved(inner.promise().to_value());
    let log = Log::default();
    let l = log.clone();
    outer.catch(move |reason| {
        l.push(format!("caught:{}", reason));
        Ok(Value::Undefined)
    });

    inner.reject(Value::from("x"));
    event_loop.run_until_done().unwrap();
    assert_eq!(outer.state(), PromiseState::Rejected);
    assert_eq!(log.entries(), vec!["caught:x"]);
}

#[test]
fn adoption_and_chaining_resolve_independently() {
    let mut event_loop = EventLoop::new();
    let inner = event_loop.deferred();
    let outer = event_loop.resolved(inner.promise().to_value());

    // `inner` itself fulfills with a plain object; a handler's thenable
    // result is unwrapped on the chained promise instead.
    let chained = inner.promise().then(
        Some(Value::function(|_, _| {
            Ok(thenable(|_, args| call_arg(args, 0, Value::from("deep"))))
        })),
        None,
    );
    inner.resolve(Value::from("shallow"));
    event_loop.run_until_done().unwrap();
    assert_eq!(outer.value(), Some(Value::from("shallow")));
    assert_eq!(chained.value(), Some(Value::from("deep")));
}
