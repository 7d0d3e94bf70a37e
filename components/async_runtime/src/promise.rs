//! Promise implementation following the Promise/A+ specification.
//!
//! This module owns promise state and the once-only settlement transition,
//! the `then` chaining operation and the factory helpers. Deciding *how* a
//! promise settles for an arbitrary value lives in [`crate::resolution`].

use crate::resolution;
use crate::scheduler::PromiseHost;
use core_types::{HostObject, JsFunction, JsResult, Value};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// The state of a Promise.
///
/// Promises transition through states according to the Promise/A+ specification.
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been fulfilled with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

/// A reaction to be triggered when a Promise settles.
///
/// Pairs the handler registered via `then` with the promise `then` returned.
/// A missing handler passes the outcome through unchanged.
#[derive(Debug)]
pub(crate) struct PromiseReaction {
    handler: Option<JsFunction>,
    derived: Promise,
}

impl PromiseReaction {
    fn run(self, state: PromiseState, outcome: Value) {
        match self.handler {
            Some(handler) => match handler.call(&Value::Undefined, &[outcome]) {
                Ok(x) => resolution::resolve_promise(&self.derived, x),
                Err(thrown) => self.derived.reject(thrown),
            },
            None => self.derived.settle(state, outcome),
        }
    }
}

enum Settlement {
    Pending {
        fulfill_reactions: Vec<PromiseReaction>,
        reject_reactions: Vec<PromiseReaction>,
    },
    Fulfilled(Value),
    Rejected(Value),
}

struct PromiseRecord {
    id: u64,
    settlement: Settlement,
    host: PromiseHost,
}

/// Shared storage behind a [`Promise`] handle; also what a promise value
/// points at.
struct PromiseCell(RefCell<PromiseRecord>);

impl Deref for PromiseCell {
    type Target = RefCell<PromiseRecord>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// As a value, a promise is a thenable: reading `then` yields a callable
/// that chains on it and returns the derived promise as a value.
impl HostObject for PromiseCell {
    fn get(self: Rc<Self>, key: &str) -> JsResult {
        if key != "then" {
            return Ok(Value::Undefined);
        }
        let promise = Promise { record: self };
        let then = JsFunction::named("then", move |_this, args| {
            let derived = promise.then(args.first().cloned(), args.get(1).cloned());
            Ok(derived.to_value())
        });
        Ok(then.into())
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// A JavaScript Promise.
///
/// `Promise` is a handle: clones refer to the same promise. State only
/// changes through settlement, which happens at most once.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, PromiseState};
/// use core_types::Value;
///
/// let mut event_loop = EventLoop::new();
/// let promise = event_loop.resolved(Value::Smi(5));
/// let next = promise.on_fulfilled(|v| match v {
///     Value::Smi(n) => Ok(Value::Smi(n + 1)),
///     other => Ok(other),
/// });
///
/// assert_eq!(next.state(), PromiseState::Pending);
/// event_loop.run_until_done().unwrap();
/// assert_eq!(next.value(), Some(Value::Smi(6)));
/// ```
#[derive(Clone)]
pub struct Promise {
    record: Rc<PromiseCell>,
}

impl Promise {
    /// Creates a pending promise and runs `executor` synchronously with its
    /// resolving functions.
    ///
    /// If the executor throws, the promise is rejected with the thrown value
    /// (a no-op when it already settled).
    pub fn new<F>(host: PromiseHost, executor: F) -> Promise
    where
        F: FnOnce(ResolvingFunctions) -> JsResult<()>,
    {
        let promise = Promise::pending(host);
        if let Err(thrown) = executor(ResolvingFunctions::for_promise(&promise)) {
            promise.reject(thrown);
        }
        promise
    }

    /// Creates a pending promise with no executor.
    pub fn pending(host: PromiseHost) -> Promise {
        Promise {
            record: Rc::new(PromiseCell(RefCell::new(PromiseRecord {
                id: NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed),
                settlement: Settlement::Pending {
                    fulfill_reactions: Vec::new(),
                    reject_reactions: Vec::new(),
                },
                host,
            }))),
        }
    }

    /// Returns a promise resolved with `value`.
    ///
    /// Promises and thenables are adopted rather than wrapped.
    pub fn resolved(host: PromiseHost, value: impl Into<Value>) -> Promise {
        let promise = Promise::pending(host);
        resolution::resolve_promise(&promise, value.into());
        promise
    }

    /// Returns a promise rejected with `reason`. The reason is never unwrapped.
    pub fn rejected(host: PromiseHost, reason: impl Into<Value>) -> Promise {
        let promise = Promise::pending(host);
        promise.reject(reason.into());
        promise
    }

    /// Returns a pending promise together with its resolving functions.
    pub fn deferred(host: PromiseHost) -> Deferred {
        let promise = Promise::pending(host);
        let functions = ResolvingFunctions::for_promise(&promise);
        Deferred { promise, functions }
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns a new pending promise synchronously. Handlers always run as
    /// deferred tasks, even when this promise has already settled. A missing
    /// or non-callable handler passes the outcome through to the returned
    /// promise.
    ///
    /// # Arguments
    ///
    /// * `on_fulfilled` - Optional handler called when Promise fulfills
    /// * `on_rejected` - Optional handler called when Promise rejects
    pub fn then(&self, on_fulfilled: Option<Value>, on_rejected: Option<Value>) -> Promise {
        let on_fulfilled = on_fulfilled.as_ref().and_then(Value::as_function).cloned();
        let on_rejected = on_rejected.as_ref().and_then(Value::as_function).cloned();
        let derived = Promise::pending(self.host());

        let mut record = self.record.borrow_mut();
        let (handler, state, outcome) = match &mut record.settlement {
            Settlement::Pending {
                fulfill_reactions,
                reject_reactions,
            } => {
                fulfill_reactions.push(PromiseReaction {
                    handler: on_fulfilled,
                    derived: derived.clone(),
                });
                reject_reactions.push(PromiseReaction {
                    handler: on_rejected,
                    derived: derived.clone(),
                });
                return derived;
            }
            Settlement::Fulfilled(value) => (on_fulfilled, PromiseState::Fulfilled, value.clone()),
            Settlement::Rejected(reason) => (on_rejected, PromiseState::Rejected, reason.clone()),
        };
        let host = record.host.clone();
        drop(record);

        let reaction = PromiseReaction {
            handler,
            derived: derived.clone(),
        };
        host.defer(move || reaction.run(state, outcome));
        derived
    }

    /// Chains a Rust closure as the fulfillment handler.
    pub fn on_fulfilled<F>(&self, f: F) -> Promise
    where
        F: Fn(Value) -> JsResult + 'static,
    {
        self.then(Some(JsFunction::unary(f).into()), None)
    }

    /// Chains a Rust closure as the rejection handler.
    pub fn catch<F>(&self, f: F) -> Promise
    where
        F: Fn(Value) -> JsResult + 'static,
    {
        self.then(None, Some(JsFunction::unary(f).into()))
    }

    /// Transitions a pending promise to `state` with `outcome`.
    ///
    /// No-op unless the promise is pending and `state` is terminal. The
    /// reactions queued for `state` move out of the promise and run together
    /// in one deferred task; the other queue is dropped.
    pub(crate) fn settle(&self, state: PromiseState, outcome: Value) {
        let settled = match state {
            PromiseState::Pending => return,
            PromiseState::Fulfilled => Settlement::Fulfilled(outcome.clone()),
            PromiseState::Rejected => Settlement::Rejected(outcome.clone()),
        };

        let (id, reactions, host) = {
            let mut record = self.record.borrow_mut();
            let reactions = match &mut record.settlement {
                Settlement::Pending {
                    fulfill_reactions,
                    reject_reactions,
                } => {
                    if state == PromiseState::Fulfilled {
                        std::mem::take(fulfill_reactions)
                    } else {
                        std::mem::take(reject_reactions)
                    }
                }
                _ => return,
            };
            record.settlement = settled;
            (record.id, reactions, record.host.clone())
        };

        if host.config().trace_settlements {
            debug!(promise = id, ?state, reactions = reactions.len(), "promise settled");
        } else {
            trace!(promise = id, ?state, reactions = reactions.len(), "promise settled");
        }

        if reactions.is_empty() {
            return;
        }
        host.defer(move || {
            for reaction in reactions {
                reaction.run(state, outcome.clone());
            }
        });
    }

    pub(crate) fn fulfill(&self, value: Value) {
        self.settle(PromiseState::Fulfilled, value);
    }

    pub(crate) fn reject(&self, reason: Value) {
        self.settle(PromiseState::Rejected, reason);
    }

    /// The terminal state and its value or reason, if settled.
    pub(crate) fn outcome(&self) -> Option<(PromiseState, Value)> {
        match &self.record.borrow().settlement {
            Settlement::Pending { .. } => None,
            Settlement::Fulfilled(value) => Some((PromiseState::Fulfilled, value.clone())),
            Settlement::Rejected(reason) => Some((PromiseState::Rejected, reason.clone())),
        }
    }

    /// Current state.
    pub fn state(&self) -> PromiseState {
        match self.record.borrow().settlement {
            Settlement::Pending { .. } => PromiseState::Pending,
            Settlement::Fulfilled(_) => PromiseState::Fulfilled,
            Settlement::Rejected(_) => PromiseState::Rejected,
        }
    }

    /// Returns true while the promise has not settled.
    pub fn is_pending(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    /// The fulfillment value, if fulfilled.
    pub fn value(&self) -> Option<Value> {
        match &self.record.borrow().settlement {
            Settlement::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The rejection reason, if rejected.
    pub fn reason(&self) -> Option<Value> {
        match &self.record.borrow().settlement {
            Settlement::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Number of `then` registrations waiting for settlement.
    pub fn reaction_count(&self) -> usize {
        match &self.record.borrow().settlement {
            Settlement::Pending {
                fulfill_reactions, ..
            } => fulfill_reactions.len(),
            _ => 0,
        }
    }

    /// Process-unique id, used in log output.
    pub fn id(&self) -> u64 {
        self.record.borrow().id
    }

    /// The host this promise defers reactions to.
    pub fn host(&self) -> PromiseHost {
        self.record.borrow().host.clone()
    }

    /// Returns true if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
    }

    /// Wraps the promise as a native object value.
    ///
    /// The value keeps the promise's identity and exposes a callable `then`,
    /// so code that only sees values can adopt it like any thenable.
    pub fn to_value(&self) -> Value {
        let object: Rc<dyn HostObject> = self.record.clone();
        Value::NativeObject(object)
    }

    /// Recovers a promise of this runtime from a value.
    pub fn from_value(value: &Value) -> Option<Promise> {
        match value {
            Value::NativeObject(object) => Rc::clone(object)
                .into_any()
                .downcast::<PromiseCell>()
                .ok()
                .map(|record| Promise { record }),
            _ => None,
        }
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        promise.to_value()
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record.try_borrow() {
            Ok(record) => {
                let state = match &record.settlement {
                    Settlement::Pending { .. } => PromiseState::Pending,
                    Settlement::Fulfilled(_) => PromiseState::Fulfilled,
                    Settlement::Rejected(_) => PromiseState::Rejected,
                };
                f.debug_struct("Promise")
                    .field("id", &record.id)
                    .field("state", &state)
                    .finish()
            }
            Err(_) => f.write_str("Promise { <borrowed> }"),
        }
    }
}

/// The `resolve` / `reject` pair bound to one promise.
///
/// Both are ordinary callables, so they can be handed to foreign code.
#[derive(Debug, Clone)]
pub struct ResolvingFunctions {
    /// Runs the resolution procedure on the promise with the first argument
    pub resolve: JsFunction,
    /// Rejects the promise with the first argument
    pub reject: JsFunction,
}

impl ResolvingFunctions {
    fn for_promise(promise: &Promise) -> Self {
        let target = promise.clone();
        let resolve = JsFunction::named("resolve", move |_this, args| {
            resolution::resolve_promise(&target, first_argument(args));
            Ok(Value::Undefined)
        });
        let target = promise.clone();
        let reject = JsFunction::named("reject", move |_this, args| {
            target.reject(first_argument(args));
            Ok(Value::Undefined)
        });
        Self { resolve, reject }
    }
}

/// A pending promise plus the means to settle it from outside.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, PromiseState};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let deferred = event_loop.deferred();
/// deferred.resolve(Value::from("done"));
/// assert_eq!(deferred.promise().state(), PromiseState::Fulfilled);
/// ```
#[derive(Debug, Clone)]
pub struct Deferred {
    promise: Promise,
    functions: ResolvingFunctions,
}

impl Deferred {
    /// The promise controlled by this handle.
    pub fn promise(&self) -> &Promise {
        &self.promise
    }

    /// Resolves the promise with `value` (thenables are adopted).
    pub fn resolve(&self, value: impl Into<Value>) {
        resolution::resolve_promise(&self.promise, value.into());
    }

    /// Rejects the promise with `reason`.
    pub fn reject(&self, reason: impl Into<Value>) {
        self.promise.reject(reason.into());
    }

    /// The resolving functions as callables.
    pub fn resolving_functions(&self) -> &ResolvingFunctions {
        &self.functions
    }
}

fn first_argument(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or(Value::Undefined)
}
