//! Binds plain Rust records to flat `key=value` property stores.
//!
//! A record describes its fields once through [`Configuration`]; a
//! [`Binder`] then reads it from a [`Properties`] store or writes it back.
//! Stores are loaded from `.properties` or TOML files, optionally layered
//! with [`PropertiesBuilder`].

pub mod bind;
mod error;
pub mod store;

pub use bind::{with_default, BindError, Binder, Configuration, Field, Fields, KeyStrategy, Namespace, TypeInfo};
pub use error::Error;
pub use store::{LoadError, Properties, PropertiesBuilder};
