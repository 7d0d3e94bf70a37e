//! The promise resolution procedure.
//!
//! Given a promise and an arbitrary value `x`, decides how the promise
//! settles:
//!
//! 1. `x` is the promise itself: reject with a `TypeError`.
//! 2. `x` is a promise of this runtime: adopt its state, now or when it settles.
//! 3. `x` is an object or callable: read `x.then`; if callable, call it with
//!    one-shot resolve/reject callbacks, otherwise fulfill with `x`.
//! 4. Anything else fulfills the promise with `x`.
//!
//! Thenables may call back synchronously from inside `then`, and a value
//! they fulfill with can be another thenable. Instead of recursing, each
//! top-level resolution owns an [`AdoptionChain`] whose work-list is drained
//! by a single loop, so adversarial nesting cannot grow the native stack.

use crate::config::CycleDetection;
use crate::promise::Promise;
use crate::scheduler::PromiseHost;
use core_types::{JsError, JsFunction, Value};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, warn};

/// Runs the resolution procedure for `promise` with `x`.
pub(crate) fn resolve_promise(promise: &Promise, x: Value) {
    let chain = Rc::new(AdoptionChain::new(promise.clone()));
    chain.feed(x);
}

/// State for resolving one promise through a sequence of adoptions.
struct AdoptionChain {
    promise: Promise,
    host: PromiseHost,
    /// Values thenables have fulfilled with so far.
    seen: RefCell<Vec<Value>>,
    work: RefCell<VecDeque<Value>>,
    draining: Cell<bool>,
    steps: Cell<usize>,
}

impl AdoptionChain {
    fn new(promise: Promise) -> Self {
        let host = promise.host();
        Self {
            promise,
            host,
            seen: RefCell::new(Vec::new()),
            work: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
            steps: Cell::new(0),
        }
    }

    /// Queues `x` for resolution and drains the work-list unless a drain for
    /// this chain is already running further up the stack.
    fn feed(self: &Rc<Self>, x: Value) {
        self.work.borrow_mut().push_back(x);
        if self.draining.replace(true) {
            return;
        }
        loop {
            let next = self.work.borrow_mut().pop_front();
            match next {
                Some(x) => self.step(x),
                None => break,
            }
        }
        self.draining.set(false);
    }

    fn step(self: &Rc<Self>, x: Value) {
        if !self.within_step_limit() {
            return;
        }

        if let Some(other) = Promise::from_value(&x) {
            if other.ptr_eq(&self.promise) {
                debug!(promise = self.promise.id(), "promise resolved with itself");
                self.promise.reject(JsError::self_resolution().into());
                return;
            }
            match other.outcome() {
                Some((state, outcome)) => self.promise.settle(state, outcome),
                None => self.observe(&other),
            }
            return;
        }

        if !x.is_object_like() {
            self.promise.fulfill(x);
            return;
        }

        let then = match x.get("then") {
            Ok(then) => then,
            Err(thrown) => {
                self.promise.reject(thrown);
                return;
            }
        };
        match then.as_function() {
            Some(then) => self.call_then(then, &x),
            None => self.promise.fulfill(x),
        }
    }

    /// Waits on a pending promise of this runtime.
    fn observe(self: &Rc<Self>, other: &Promise) {
        let chain = Rc::clone(self);
        let on_fulfilled = JsFunction::unary(move |value| {
            chain.feed(value);
            Ok(Value::Undefined)
        });
        let target = self.promise.clone();
        let on_rejected = JsFunction::unary(move |reason| {
            target.reject(reason);
            Ok(Value::Undefined)
        });
        other.then(Some(on_fulfilled.into()), Some(on_rejected.into()));
    }

    /// Calls a foreign `then` with `thenable` as receiver.
    ///
    /// Only the first call to either callback counts, and an exception from
    /// `then` is ignored once a callback has fired.
    fn call_then(self: &Rc<Self>, then: &JsFunction, thenable: &Value) {
        let invoked = Rc::new(Cell::new(false));

        let chain = Rc::clone(self);
        let once = invoked.clone();
        let resolve = JsFunction::named("resolvePromise", move |_this, args| {
            if !once.replace(true) {
                chain.adopt(args.first().cloned().unwrap_or(Value::Undefined));
            }
            Ok(Value::Undefined)
        });

        let target = self.promise.clone();
        let once = invoked.clone();
        let reject = JsFunction::named("rejectPromise", move |_this, args| {
            if !once.replace(true) {
                target.reject(args.first().cloned().unwrap_or(Value::Undefined));
            }
            Ok(Value::Undefined)
        });

        if let Err(thrown) = then.call(thenable, &[resolve.into(), reject.into()]) {
            if !invoked.replace(true) {
                self.promise.reject(thrown);
            }
        }
    }

    /// A thenable fulfilled with `value`; continue resolving with it.
    fn adopt(self: &Rc<Self>, value: Value) {
        if self.host.config().cycle_detection == CycleDetection::SeenValues {
            let repeated = self.seen.borrow().contains(&value);
            if repeated {
                debug!(promise = self.promise.id(), "thenable cycle detected");
                self.promise.reject(JsError::thenable_cycle().into());
                return;
            }
            self.seen.borrow_mut().push(value.clone());
        }
        self.feed(value);
    }

    fn within_step_limit(&self) -> bool {
        let steps = self.steps.get() + 1;
        self.steps.set(steps);
        match self.host.config().max_adoption_steps {
            Some(limit) if steps > limit => {
                warn!(
                    promise = self.promise.id(),
                    limit, "thenable adoption chain exceeded step limit"
                );
                self.promise.reject(JsError::adoption_limit(limit).into());
                false
            }
            _ => true,
        }
    }
}
