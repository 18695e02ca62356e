//! Argument sanitization for invocation logging.
//!
//! Turns arbitrary values into a redacted JSON tree before they reach a log
//! line. Types opt in by implementing [`Sanitize`]; structured types describe
//! their fields through [`Sanitizer::object`] (or [`sanitize_struct!`]) and
//! mark secrets there, so masking is decided by the type that owns the data
//! and cannot be switched off by a caller.
//!
//! Rendering rules:
//! - absent values (`None`, `()`) → `"<null>"`
//! - a composite value reached a second time within one call → `"<recursion>"`
//! - text longer than [`MAX_STRING_LENGTH`] characters is cut and gets `"..."`
//! - booleans and numbers stay as they are
//! - enums render their symbolic name
//! - arrays, slices and collections → lists in iteration order
//! - maps → objects, keys kept verbatim, values sanitized
//! - std/library value types (addresses, paths, durations, UUIDs, timestamps) → text
//! - structs → their declared fields, sensitive ones as `"***"`, unreadable ones as `"<error>"`

use std::any::type_name;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

/// Output of sanitization: a JSON tree with no ties to the input.
pub type SanitizedValue = Value;

/// Longest text rendered untouched, counted in characters.
pub const MAX_STRING_LENGTH: usize = 200;

/// Appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Replaces the value of every sensitive field.
pub const MASK: &str = "***";

pub const NULL_TOKEN: &str = "<null>";
pub const RECURSION_TOKEN: &str = "<recursion>";
pub const ERROR_TOKEN: &str = "<error>";

/// A value that can be rendered into a log line.
pub trait Sanitize {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue;
}

/// Traversal state of a single top-level sanitize call.
///
/// Remembers every composite value already rendered, identified by address
/// and concrete type, so shared or cyclic structures terminate.
///
/// An address only identifies a value while that value is alive. Values
/// owned by the traversal itself (see [`Sanitizer::owned`]) are forgotten
/// once rendered, because their stack slot is reused by the next one.
#[derive(Debug, Default)]
pub struct Sanitizer {
    visited: HashSet<(usize, &'static str)>,
    entered: Vec<(usize, &'static str)>,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize a nested value.
    pub fn value<T: Sanitize + ?Sized>(&mut self, value: &T) -> SanitizedValue {
        value.sanitize(self)
    }

    /// Record `value` as visited. Returns `false` if it was seen before.
    ///
    /// Zero-sized values share addresses and are never treated as seen.
    pub fn enter<T: ?Sized>(&mut self, value: &T) -> bool {
        if mem::size_of_val(value) == 0 {
            return true;
        }
        let key = (value as *const T as *const () as usize, type_name::<T>());
        if !self.visited.insert(key) {
            return false;
        }
        self.entered.push(key);
        true
    }

    /// Sanitize a value that lives only for the duration of this call.
    pub fn owned<T: Sanitize>(&mut self, value: T) -> SanitizedValue {
        let mark = self.entered.len();
        let rendered = value.sanitize(self);
        for key in self.entered.drain(mark..) {
            self.visited.remove(&key);
        }
        rendered
    }

    /// Render `items` as a list owned by `owner`.
    pub fn list<'a, O, T, I>(&mut self, owner: &O, items: I) -> SanitizedValue
    where
        O: ?Sized,
        T: Sanitize + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        if !self.enter(owner) {
            return Value::from(RECURSION_TOKEN);
        }
        Value::Array(items.into_iter().map(|item| item.sanitize(self)).collect())
    }

    /// Render `entries` as an object owned by `owner`. Keys are not sanitized.
    pub fn map<'a, O, K, V, I>(&mut self, owner: &O, entries: I) -> SanitizedValue
    where
        O: ?Sized,
        K: fmt::Display + ?Sized + 'a,
        V: Sanitize + ?Sized + 'a,
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        if !self.enter(owner) {
            return Value::from(RECURSION_TOKEN);
        }
        let mut out = Map::new();
        for (key, value) in entries {
            let value = value.sanitize(self);
            out.insert(key.to_string(), value);
        }
        Value::Object(out)
    }

    /// Render a structured value through its field descriptor.
    ///
    /// Field values are borrowed for as long as `owner`; computed values go
    /// through [`Fields::computed`] or [`Fields::try_field`].
    ///
    /// ```
    /// use user_service::observability::sanitize::{sanitize_value, Sanitize, SanitizedValue, Sanitizer};
    ///
    /// struct Login { user: String, secret: String }
    ///
    /// impl Sanitize for Login {
    ///     fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
    ///         cx.object(self, |o| {
    ///             o.field("user", &self.user).sensitive("secret");
    ///         })
    ///     }
    /// }
    ///
    /// let login = Login { user: "ann".into(), secret: "hunter2".into() };
    /// assert_eq!(sanitize_value(&login).to_string(), r#"{"user":"ann","secret":"***"}"#);
    /// ```
    pub fn object<'v, O, F>(&mut self, owner: &'v O, describe: F) -> SanitizedValue
    where
        O: ?Sized,
        F: FnOnce(&mut Fields<'_, 'v>),
    {
        if !self.enter(owner) {
            return Value::from(RECURSION_TOKEN);
        }
        let mut fields = Fields {
            cx: self,
            out: Map::new(),
            owner: PhantomData,
        };
        describe(&mut fields);
        Value::Object(fields.out)
    }
}

/// Field-by-field builder handed out by [`Sanitizer::object`].
pub struct Fields<'a, 'v> {
    cx: &'a mut Sanitizer,
    out: Map<String, Value>,
    owner: PhantomData<&'v ()>,
}

impl<'v> Fields<'_, 'v> {
    /// A regular field, sanitized recursively.
    pub fn field<V: Sanitize + ?Sized>(&mut self, name: &str, value: &'v V) -> &mut Self {
        let value = value.sanitize(self.cx);
        self.out.insert(name.to_string(), value);
        self
    }

    /// A sensitive field. Its value is never looked at.
    pub fn sensitive(&mut self, name: &str) -> &mut Self {
        self.out.insert(name.to_string(), Value::from(MASK));
        self
    }

    /// A field derived from the owner rather than stored in it.
    pub fn computed<V: Sanitize>(&mut self, name: &str, value: V) -> &mut Self {
        let value = self.cx.owned(value);
        self.out.insert(name.to_string(), value);
        self
    }

    /// A field whose value has to be read first; a failed read renders `"<error>"`.
    pub fn try_field<V, E>(&mut self, name: &str, read: Result<V, E>) -> &mut Self
    where
        V: Sanitize,
    {
        let value = match read {
            Ok(value) => self.cx.owned(value),
            Err(_) => Value::from(ERROR_TOKEN),
        };
        self.out.insert(name.to_string(), value);
        self
    }
}

/// Sanitize positional arguments into `{"arg0": .., "arg1": ..}` JSON text.
///
/// Never fails: if serialization breaks, a debug rendering is returned.
pub fn sanitize(args: &[&dyn Sanitize]) -> String {
    if args.is_empty() {
        return "[]".to_string();
    }

    let mut cx = Sanitizer::new();
    let mut out = Map::new();
    for (i, arg) in args.iter().enumerate() {
        let value = arg.sanitize(&mut cx);
        out.insert(format!("arg{i}"), value);
    }

    let rendered = Value::Object(out);
    serde_json::to_string(&rendered).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Failed to serialize sanitized args");
        format!("{rendered:?}")
    })
}

/// Sanitize a single value with a fresh traversal state.
pub fn sanitize_value<T: Sanitize + ?Sized>(value: &T) -> SanitizedValue {
    value.sanitize(&mut Sanitizer::new())
}

/// Implement [`Sanitize`] for a struct by listing its fields.
///
/// Fields preceded by `#[sensitive]` are always masked.
///
/// ```
/// use user_service::sanitize_struct;
/// use user_service::observability::sanitize::sanitize_value;
///
/// struct Credentials { login: String, password: String }
/// sanitize_struct!(Credentials { login, #[sensitive] password });
///
/// let creds = Credentials { login: "ann".into(), password: "pw".into() };
/// assert_eq!(sanitize_value(&creds)["password"], "***");
/// ```
#[macro_export]
macro_rules! sanitize_struct {
    ($ty:ty { $($(#[$marker:ident])? $field:ident),* $(,)? }) => {
        impl $crate::observability::sanitize::Sanitize for $ty {
            fn sanitize(
                &self,
                cx: &mut $crate::observability::sanitize::Sanitizer,
            ) -> $crate::observability::sanitize::SanitizedValue {
                cx.object(self, |fields| {
                    $( $crate::sanitize_struct!(@field fields, self, $($marker)? $field); )*
                })
            }
        }
    };
    (@field $fields:ident, $this:ident, sensitive $field:ident) => {
        let _ = &$this.$field;
        $fields.sensitive(stringify!($field));
    };
    (@field $fields:ident, $this:ident, $field:ident) => {
        $fields.field(stringify!($field), &$this.$field);
    };
}

fn truncate(text: &str) -> SanitizedValue {
    match text.char_indices().nth(MAX_STRING_LENGTH) {
        Some((cut, _)) => Value::String(format!("{}{}", &text[..cut], ELLIPSIS)),
        None => Value::String(text.to_string()),
    }
}

impl Sanitize for str {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        truncate(self)
    }
}

impl Sanitize for String {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        truncate(self)
    }
}

impl Sanitize for Cow<'_, str> {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        truncate(self)
    }
}

impl Sanitize for char {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::String(self.to_string())
    }
}

impl Sanitize for bool {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::Bool(*self)
    }
}

macro_rules! impl_integer {
    ($($t:ty),*) => {
        $(
            impl Sanitize for $t {
                fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
                    Value::from(*self)
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_float {
    ($($t:ty),*) => {
        $(
            impl Sanitize for $t {
                fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
                    // JSON has no NaN or infinities.
                    Number::from_f64(f64::from(*self))
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(self.to_string()))
                }
            }
        )*
    };
}

impl_float!(f32, f64);

impl Sanitize for () {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::from(NULL_TOKEN)
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        match self {
            Some(value) => value.sanitize(cx),
            None => Value::from(NULL_TOKEN),
        }
    }
}

impl<T: Sanitize + ?Sized> Sanitize for &T {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        (**self).sanitize(cx)
    }
}

impl<T: Sanitize + ?Sized> Sanitize for &mut T {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        (**self).sanitize(cx)
    }
}

impl<T: Sanitize + ?Sized> Sanitize for Box<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        (**self).sanitize(cx)
    }
}

impl<T: Sanitize + ?Sized> Sanitize for Rc<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        (**self).sanitize(cx)
    }
}

impl<T: Sanitize + ?Sized> Sanitize for Arc<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        (**self).sanitize(cx)
    }
}

impl<T: Sanitize> Sanitize for Weak<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        match self.upgrade() {
            Some(value) => (*value).sanitize(cx),
            None => Value::from(NULL_TOKEN),
        }
    }
}

impl<T: Sanitize + ?Sized> Sanitize for RefCell<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        match self.try_borrow() {
            Ok(value) => (*value).sanitize(cx),
            Err(_) => Value::from(ERROR_TOKEN),
        }
    }
}

impl<T: Sanitize + ?Sized> Sanitize for Mutex<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        match self.try_lock() {
            Ok(value) => (*value).sanitize(cx),
            Err(_) => Value::from(ERROR_TOKEN),
        }
    }
}

impl<T: Sanitize + ?Sized> Sanitize for RwLock<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        match self.try_read() {
            Ok(value) => (*value).sanitize(cx),
            Err(_) => Value::from(ERROR_TOKEN),
        }
    }
}

impl<T: Sanitize, const N: usize> Sanitize for [T; N] {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.list(self, self.iter())
    }
}

impl<T: Sanitize> Sanitize for [T] {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.list(self, self.iter())
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.list(self, self.iter())
    }
}

impl<T: Sanitize> Sanitize for VecDeque<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.list(self, self.iter())
    }
}

impl<T: Sanitize, S> Sanitize for HashSet<T, S> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.list(self, self.iter())
    }
}

impl<T: Sanitize> Sanitize for BTreeSet<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.list(self, self.iter())
    }
}

impl<K: fmt::Display, V: Sanitize, S> Sanitize for HashMap<K, V, S> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.map(self, self.iter())
    }
}

impl<K: fmt::Display, V: Sanitize> Sanitize for BTreeMap<K, V> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.map(self, self.iter())
    }
}

impl Sanitize for Value {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        match self {
            Value::Null => Value::from(NULL_TOKEN),
            Value::Bool(_) | Value::Number(_) => self.clone(),
            Value::String(text) => truncate(text),
            Value::Array(items) => cx.list(self, items.iter()),
            Value::Object(entries) => cx.map(self, entries.iter()),
        }
    }
}

macro_rules! impl_display {
    ($($t:ty),*) => {
        $(
            impl Sanitize for $t {
                fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
                    Value::String(self.to_string())
                }
            }
        )*
    };
}

impl_display!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, Uuid);

impl Sanitize for Path {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::String(self.display().to_string())
    }
}

impl Sanitize for PathBuf {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::String(self.display().to_string())
    }
}

impl Sanitize for Duration {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::String(format!("{self:?}"))
    }
}

impl Sanitize for SystemTime {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::String(DateTime::<Utc>::from(*self).to_rfc3339())
    }
}

impl<Tz: TimeZone> Sanitize for DateTime<Tz>
where
    Tz::Offset: fmt::Display,
{
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::String(self.to_rfc3339())
    }
}
