use thiserror::Error;

use super::codec::BoxError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("field {field} in {owner} {reason}")]
    IllegalField {
        field: String,
        owner: String,
        reason: &'static str,
    },

    #[error("property {key} for {owner} is not set")]
    MissingProperty { key: String, owner: String },

    #[error(
        "field {field} in {owner} has an unsupported type {ty}; supported types are: {}",
        .supported.join(", ")
    )]
    UnsupportedType {
        field: String,
        owner: String,
        ty: String,
        supported: Vec<String>,
    },

    #[error("unable to map property {key} (field {field}) with value '{value}' to {ty}: {source}")]
    Conversion {
        field: String,
        key: String,
        value: String,
        ty: String,
        source: BoxError,
    },

    #[error("key of map {field} in {owner} has unsupported type {key_type}")]
    MissingKeyCodec {
        field: String,
        owner: String,
        key_type: String,
    },

    #[error("map {key} needs an entry key")]
    EmptyMapKey { key: String },

    #[error("default binder is already in use on this thread")]
    DefaultBinderBusy,
}
