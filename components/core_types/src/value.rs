//! JavaScript value representation.
//!
//! This module provides the `Value` enum that the promise machinery works
//! over. Values coming back from handlers or foreign thenables are untrusted,
//! so everything the resolution procedure needs (property reads that can
//! throw, calls with a receiver, reference identity) is expressed on `Value`
//! itself rather than through static interfaces.

use crate::error::JsError;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Result of running JavaScript-level code: `Err` carries the thrown value.
pub type JsResult<T = Value> = Result<T, Value>;

type Callback = dyn Fn(&Value, &[Value]) -> JsResult;

/// An object owned by the embedder and exposed through [`Value::NativeObject`].
///
/// Property reads go through [`HostObject::get`], so a host object can look
/// like an ordinary object (for instance a thenable) to code that only sees
/// values.
pub trait HostObject: Any {
    /// Reads property `key`; unknown keys should yield `undefined`.
    fn get(self: Rc<Self>, key: &str) -> JsResult;

    /// Upcast used to recover the concrete type.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Represents any JavaScript value.
///
/// Primitives are stored inline. Objects, functions, native objects and
/// errors are reference types: clones share identity and equality compares
/// pointers, matching JavaScript strict equality.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let float = Value::Double(3.14);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(number.type_of(), "number");
/// assert!(float.is_truthy());
/// ```
#[derive(Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(std::string::String),
    /// Plain object with properties
    Object(JsObject),
    /// Callable object
    Function(JsFunction),
    /// Host-owned object (promises of this runtime live here)
    NativeObject(Rc<dyn HostObject>),
    /// Error object created by the runtime
    Error(Rc<JsError>),
}

/// A single property slot.
#[derive(Clone, Debug)]
pub enum Property {
    /// Plain data property
    Data(Value),
    /// Accessor property; reading it calls the getter with the owner as `this`
    Getter(JsFunction),
}

#[derive(Default)]
struct PropertyMap {
    slots: RefCell<HashMap<String, Property>>,
}

impl PropertyMap {
    fn get(&self, receiver: &Value, key: &str) -> JsResult {
        // Clone the slot out so a getter can touch this object again.
        let slot = self.slots.borrow().get(key).cloned();
        match slot {
            None => Ok(Value::Undefined),
            Some(Property::Data(value)) => Ok(value),
            Some(Property::Getter(getter)) => getter.call(receiver, &[]),
        }
    }

    fn define(&self, key: &str, property: Property) {
        self.slots.borrow_mut().insert(key.to_string(), property);
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// A reference-identity property bag.
///
/// # Examples
///
/// ```
/// use core_types::{JsObject, Value};
///
/// let obj = JsObject::new().with("answer", Value::Smi(42));
/// assert_eq!(obj.get("answer"), Ok(Value::Smi(42)));
/// assert_eq!(obj.get("missing"), Ok(Value::Undefined));
/// ```
#[derive(Clone, Default)]
pub struct JsObject {
    properties: Rc<PropertyMap>,
}

impl JsObject {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style data property definition.
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Defines or overwrites a data property.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.properties.define(key, Property::Data(value.into()));
    }

    /// Defines an accessor property. The getter may throw.
    pub fn define_getter(&self, key: &str, getter: JsFunction) {
        self.properties.define(key, Property::Getter(getter));
    }

    /// Reads a property, running its getter if it has one.
    pub fn get(&self, key: &str) -> JsResult {
        self.properties.get(&Value::Object(self.clone()), key)
    }

    /// Own property names, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.properties.keys()
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Rc::ptr_eq(&self.properties, &other.properties)
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object {{ {} }}", self.keys().join(", "))
    }
}

struct FunctionData {
    name: String,
    callback: Box<Callback>,
    properties: PropertyMap,
}

/// A callable JavaScript value.
///
/// The callback is `Fn` rather than `FnMut` because a function may be
/// re-entered while it is running (a thenable calling back into itself);
/// callers keep their mutable state in `Cell`/`RefCell` captures.
///
/// # Examples
///
/// ```
/// use core_types::{JsFunction, Value};
///
/// let add_one = JsFunction::new(|_this, args| match args.first() {
///     Some(Value::Smi(n)) => Ok(Value::Smi(n + 1)),
///     _ => Err(Value::from("expected a number")),
/// });
///
/// assert_eq!(add_one.call(&Value::Undefined, &[Value::Smi(1)]), Ok(Value::Smi(2)));
/// ```
#[derive(Clone)]
pub struct JsFunction {
    inner: Rc<FunctionData>,
}

impl JsFunction {
    /// Creates an anonymous function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> JsResult + 'static,
    {
        Self::named("", f)
    }

    /// Creates a named function.
    pub fn named<F>(name: &str, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> JsResult + 'static,
    {
        Self {
            inner: Rc::new(FunctionData {
                name: name.to_string(),
                callback: Box::new(f),
                properties: PropertyMap::default(),
            }),
        }
    }

    /// Creates a one-argument function from a closure over the first argument.
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(Value) -> JsResult + 'static,
    {
        Self::new(move |_this, args| f(args.first().cloned().unwrap_or(Value::Undefined)))
    }

    /// Calls the function with the given receiver and arguments.
    pub fn call(&self, this: &Value, args: &[Value]) -> JsResult {
        (self.inner.callback)(this, args)
    }

    /// The function name (empty for anonymous functions).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Defines or overwrites a data property on the function object.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.inner.properties.define(key, Property::Data(value.into()));
    }

    /// Defines an accessor property on the function object.
    pub fn define_getter(&self, key: &str, getter: JsFunction) {
        self.inner.properties.define(key, Property::Getter(getter));
    }

    /// Reads a property of the function object.
    pub fn get(&self, key: &str) -> JsResult {
        self.inner
            .properties
            .get(&Value::Function(self.clone()), key)
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &JsFunction) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ name: {:?} }}", self.inner.name)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Object(obj) => fmt::Debug::fmt(obj, f),
            Value::Function(func) => fmt::Debug::fmt(func, f),
            Value::NativeObject(_) => write!(f, "NativeObject(...)"),
            Value::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}

/// Strict equality (`===`).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Smi(a), Value::Double(b)) | (Value::Double(b), Value::Smi(a)) => {
                f64::from(*a) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::NativeObject(a), Value::NativeObject(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Wraps a closure into a function value.
    pub fn function<F>(f: F) -> Value
    where
        F: Fn(&Value, &[Value]) -> JsResult + 'static,
    {
        Value::Function(JsFunction::new(f))
    }

    /// Returns whether this value is truthy in JavaScript semantics.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(!Value::Undefined.is_truthy());
    /// assert!(!Value::Null.is_truthy());
    /// assert!(!Value::Boolean(false).is_truthy());
    /// assert!(!Value::Smi(0).is_truthy());
    /// assert!(!Value::Double(f64::NAN).is_truthy());
    ///
    /// assert!(Value::Boolean(true).is_truthy());
    /// assert!(Value::Smi(42).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_)
            | Value::Function(_)
            | Value::NativeObject(_)
            | Value::Error(_) => true,
        }
    }

    /// Returns the JavaScript typeof result for this value.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::Undefined.type_of(), "undefined");
    /// assert_eq!(Value::Null.type_of(), "object");
    /// assert_eq!(Value::Boolean(true).type_of(), "boolean");
    /// assert_eq!(Value::Smi(42).type_of(), "number");
    /// assert_eq!(Value::function(|_, _| Ok(Value::Undefined)).type_of(), "function");
    /// ```
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // JavaScript quirk
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Object(_) | Value::NativeObject(_) | Value::Error(_) => "object",
        }
    }

    /// True for objects and callables, the values that may carry a `then`.
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            Value::Object(_) | Value::Function(_) | Value::NativeObject(_) | Value::Error(_)
        )
    }

    /// Returns the function if this value is callable.
    pub fn as_function(&self) -> Option<&JsFunction> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Returns the runtime error if this value wraps one.
    pub fn as_error(&self) -> Option<&JsError> {
        match self {
            Value::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Reads a property.
    ///
    /// Primitives expose no properties here, so reading from them yields
    /// `undefined`. Getters and host objects may throw.
    pub fn get(&self, key: &str) -> JsResult {
        match self {
            Value::Object(obj) => obj.get(key),
            Value::Function(func) => func.get(key),
            Value::NativeObject(host) => HostObject::get(Rc::clone(host), key),
            _ => Ok(Value::Undefined),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<JsObject> for Value {
    fn from(obj: JsObject) -> Self {
        Value::Object(obj)
    }
}

impl From<JsFunction> for Value {
    fn from(func: JsFunction) -> Self {
        Value::Function(func)
    }
}

impl From<JsError> for Value {
    fn from(err: JsError) -> Self {
        Value::Error(Rc::new(err))
    }
}

/// Implementation of Display trait for JavaScript string conversion.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Null.to_string(), "null");
/// assert_eq!(Value::Boolean(true).to_string(), "true");
/// assert_eq!(Value::Smi(42).to_string(), "42");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Object(_) | Value::NativeObject(_) => write!(f, "[object Object]"),
            Value::Function(func) => {
                write!(f, "function {}() {{ [native code] }}", func.name())
            }
            Value::Error(err) => write!(f, "{}", err),
        }
    }
}
