//! The binding engine.
//!
//! [`Binder`] reads records from a [`Properties`] store and writes them back.
//! It owns a [`CodecRegistry`]; register codecs for additional value types on
//! the binder before reading or writing records that use them.

mod codec;
mod decode;
mod encode;
mod error;
mod field;
mod key;

#[cfg(test)]
mod fixtures;

use std::any::Any;
use std::cell::RefCell;
use std::fmt::Debug;
use std::path::Path;

pub use codec::{split_list, BoxError, CodecRegistry, TypeMismatch, ValueType, LIST_SEPARATOR};
pub use error::BindError;
pub use field::{Access, Configuration, Field, FieldKind, Fields, Namespace, TypeInfo};
pub use key::{namespace_prefix, resolve_key, KeyStrategy, SEPARATOR};

use crate::store::{load_properties_file, Properties};
use crate::Error;

/// Binds records to and from flat property stores.
///
/// ## Example
///
/// ```no_run
/// use dragon_props::bind::{Binder, Configuration, Fields, TypeInfo};
///
/// #[derive(Debug, Default)]
/// struct Limits {
///     max_connections: Option<i32>,
///     ratio: Option<f64>,
/// }
///
/// static LIMITS: TypeInfo = TypeInfo::new("Limits");
///
/// impl Configuration for Limits {
///     fn type_info() -> &'static TypeInfo {
///         &LIMITS
///     }
///
///     fn describe(fields: &mut Fields<Self>) {
///         fields
///             .value("maxConnections", |l| l.max_connections.as_ref(), |l, v| l.max_connections = Some(v))
///             .key("max.connections");
///         fields
///             .value("ratio", |l| l.ratio.as_ref(), |l, v| l.ratio = Some(v))
///             .optional();
///     }
/// }
///
/// let limits: Limits = Binder::new().read_file("config/limits.properties")?;
/// # Ok::<(), dragon_props::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Binder {
    codecs: CodecRegistry,
    strategy: KeyStrategy,
}

impl Binder {
    /// Creates a binder with the default codecs and namespaced keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a binder using `codecs` as its registry.
    pub fn with_codecs(codecs: CodecRegistry) -> Self {
        Self {
            codecs,
            strategy: KeyStrategy::default(),
        }
    }

    #[must_use]
    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.strategy
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    /// Registers (or replaces) the codec used for every field of type `T`.
    pub fn register<T, E, D, En>(&mut self, decode: D, encode: En) -> &mut Self
    where
        T: Any + Debug,
        E: Into<BoxError>,
        D: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        En: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.codecs.register(decode, encode);
        self
    }

    /// Property key of `field` under this binder's key strategy.
    pub fn key_for<R>(&self, field: &Field<R>) -> String {
        resolve_key(field, self.strategy)
    }

    /// Creates a new `R` populated from `props`.
    ///
    /// Fields without a property keep the value `R::default()` gave them;
    /// required fields that are still absent fail the read.
    pub fn read<R: Configuration>(&self, props: &Properties) -> Result<R, BindError> {
        decode::decode(self, props)
    }

    /// Loads a `.properties` file and reads `R` from it.
    pub fn read_file<R: Configuration>(&self, path: impl AsRef<Path>) -> Result<R, Error> {
        let props = load_properties_file(path)?;
        Ok(self.read(&props)?)
    }

    /// Writes every present field of `record` into `props`.
    pub fn write<R: Configuration>(&self, props: &mut Properties, record: &R) -> Result<(), BindError> {
        encode::encode(self, record, props)
    }

    /// Writes `record` into a new store.
    pub fn to_properties<R: Configuration>(&self, record: &R) -> Result<Properties, BindError> {
        let mut props = Properties::new();
        self.write(&mut props, record)?;
        Ok(props)
    }
}

thread_local! {
    static DEFAULT_BINDER: RefCell<Binder> = RefCell::new(Binder::new());
}

/// Runs `f` with this thread's shared default binder.
///
/// Each thread gets its own binder, so codecs registered here are only seen
/// by later calls on the same thread. Calling it again from inside `f` fails
/// with [`BindError::DefaultBinderBusy`].
pub fn with_default<T>(f: impl FnOnce(&mut Binder) -> T) -> Result<T, BindError> {
    DEFAULT_BINDER.with(|binder| {
        let mut binder = binder
            .try_borrow_mut()
            .map_err(|_| BindError::DefaultBinderBusy)?;
        Ok(f(&mut binder))
    })
}
