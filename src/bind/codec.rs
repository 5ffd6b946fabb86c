//! Type codec registry.
//!
//! A codec is a pair of functions converting between property text and one
//! concrete Rust type. Codecs are looked up by [`ValueType`], a [`TypeId`]
//! paired with the type's name, so the binding engine can convert values
//! without knowing the concrete types in advance.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by decode functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A decoded value whose concrete type is only known to the codec.
pub(crate) type AnyValue = Box<dyn Any>;

type DecodeFn = dyn Fn(&str) -> Result<AnyValue, BoxError> + Send + Sync;
type EncodeFn = dyn Fn(&dyn Any) -> Option<String> + Send + Sync;

/// Separator between the elements of array, list and set values.
pub const LIST_SEPARATOR: char = ',';

/// Collection kinds the engine handles structurally rather than via a codec.
const COLLECTION_KINDS: [&str; 3] = ["HashMap<_, _>", "HashSet<_>", "Vec<_>"];

/// Runtime descriptor of a bindable value type.
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
    render: fn(&dyn Any) -> String,
}

impl ValueType {
    /// Returns the descriptor for `T`.
    pub fn of<T: Any + fmt::Debug>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            render: render_debug::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `alloc::vec::Vec<i32>`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths removed, e.g. `Vec<i32>`.
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    /// Default textual representation of a value of this type (its `Debug` output).
    pub(crate) fn render(&self, value: &dyn Any) -> String {
        (self.render)(value)
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl Hash for ValueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType").field(&self.name).finish()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

fn render_debug<T: Any + fmt::Debug>(value: &dyn Any) -> String {
    value
        .downcast_ref::<T>()
        .map(|value| format!("{value:?}"))
        .unwrap_or_default()
}

fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();

    fn flush(segment: &mut String, out: &mut String) {
        out.push_str(segment.rsplit("::").next().unwrap_or_default());
        segment.clear();
    }

    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            flush(&mut segment, &mut out);
            out.push(ch);
        }
    }
    flush(&mut segment, &mut out);
    out
}

/// A codec produced a value of a type other than the one it was registered for.
#[derive(Debug, Error)]
#[error("codec for {expected} produced a value of another type")]
pub struct TypeMismatch {
    pub expected: ValueType,
}

#[derive(Clone)]
struct Codec {
    ty: ValueType,
    decode: Arc<DecodeFn>,
    encode: Arc<EncodeFn>,
}

/// Mapping from value types to their decode/encode function pairs.
///
/// [`CodecRegistry::default`] seeds codecs for `String`, `i32`, `i64`, `f32`,
/// `f64`, `bool` and `Vec` arrays of each. Registering a type again replaces
/// its previous codec; there is no deregistration.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<TypeId, Codec>,
}

impl CodecRegistry {
    /// Creates a registry without any codecs.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Registers (or replaces) the codec for `T`.
    pub fn register<T, E, D, En>(&mut self, decode: D, encode: En)
    where
        T: Any + fmt::Debug,
        E: Into<BoxError>,
        D: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        En: Fn(&T) -> String + Send + Sync + 'static,
    {
        let ty = ValueType::of::<T>();
        let decode = move |text: &str| -> Result<AnyValue, BoxError> {
            let value = decode(text).map_err(|err| -> BoxError { err.into() })?;
            Ok(Box::new(value))
        };
        let encode = move |value: &dyn Any| value.downcast_ref::<T>().map(&encode);

        tracing::trace!(ty = %ty, "registering codec");
        self.codecs.insert(
            ty.id,
            Codec {
                ty,
                decode: Arc::new(decode),
                encode: Arc::new(encode),
            },
        );
    }

    /// Returns true if a codec is registered for `ty`.
    pub fn contains(&self, ty: &ValueType) -> bool {
        self.codecs.contains_key(&ty.id)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Decodes `text` as `T`, or returns `None` when `T` has no codec.
    pub fn decode_as<T: Any + fmt::Debug>(&self, text: &str) -> Option<Result<T, BoxError>> {
        let ty = ValueType::of::<T>();
        self.decode(&ty, text).map(|decoded| {
            decoded.and_then(|value| {
                value
                    .downcast::<T>()
                    .map(|value| *value)
                    .map_err(|_| TypeMismatch { expected: ty }.into())
            })
        })
    }

    /// Encodes `value`, or returns `None` when `T` has no codec.
    pub fn encode_as<T: Any + fmt::Debug>(&self, value: &T) -> Option<String> {
        self.encode(&ValueType::of::<T>(), value)
    }

    pub(crate) fn decode(&self, ty: &ValueType, text: &str) -> Option<Result<AnyValue, BoxError>> {
        self.codecs.get(&ty.id).map(|codec| (codec.decode)(text))
    }

    pub(crate) fn encode(&self, ty: &ValueType, value: &dyn Any) -> Option<String> {
        self.codecs.get(&ty.id).and_then(|codec| (codec.encode)(value))
    }

    /// Sorted names of every supported type, including the collection kinds.
    pub fn supported_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .codecs
            .values()
            .map(|codec| codec.ty.short_name())
            .chain(COLLECTION_KINDS.iter().map(|kind| kind.to_string()))
            .collect();
        names.sort();
        names
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();

        registry.register(str::parse::<String>, String::clone);
        registry.register(str::parse::<i32>, i32::to_string);
        registry.register(str::parse::<i64>, i64::to_string);
        registry.register(str::parse::<f32>, f32::to_string);
        registry.register(str::parse::<f64>, f64::to_string);
        registry.register(parse_bool, bool::to_string);

        registry.register(parse_array::<String>, join_array::<String>);
        registry.register(parse_array::<i32>, join_array::<i32>);
        registry.register(parse_array::<i64>, join_array::<i64>);
        registry.register(parse_array::<f32>, join_array::<f32>);
        registry.register(parse_array::<f64>, join_array::<f64>);
        registry.register(parse_bools, join_array::<bool>);

        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("types", &self.supported_types())
            .finish()
    }
}

/// Splits a list value on [`LIST_SEPARATOR`]. Empty text is an empty list.
///
/// There is no escaping: an element containing a comma cannot round-trip.
/// Neither can a list holding a single empty string, which encodes as empty
/// text and so reads back as an empty list.
pub fn split_list(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split(LIST_SEPARATOR).collect()
    }
}

/// Permissive boolean parsing: `true` in any ASCII case, everything else is `false`.
fn parse_bool(text: &str) -> Result<bool, Infallible> {
    Ok(text.eq_ignore_ascii_case("true"))
}

fn parse_bools(text: &str) -> Result<Vec<bool>, Infallible> {
    split_list(text).into_iter().map(parse_bool).collect()
}

fn parse_array<T: FromStr>(text: &str) -> Result<Vec<T>, T::Err> {
    split_list(text).into_iter().map(str::parse).collect()
}

#[allow(clippy::ptr_arg)]
fn join_array<T: ToString>(values: &Vec<T>) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
