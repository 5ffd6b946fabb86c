//! Property key resolution.
//!
//! A field's key is the namespace prefix of its declaring type followed by the
//! field's key override or, without one, its name. The prefix is built from
//! the most-base parent type down to the declaring type:
//!
//! - a parent's namespace contributes only when it is [inherited];
//! - the declaring type's own namespace always contributes;
//! - an [overriding] namespace replaces the prefix accumulated so far.
//!
//! A non-empty prefix always ends with exactly one [`SEPARATOR`].
//!
//! [inherited]: super::Namespace::inherited
//! [overriding]: super::Namespace::overriding

use super::field::{Field, TypeInfo};

/// Separator between key segments.
pub const SEPARATOR: char = '.';

/// How field keys are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStrategy {
    /// Namespace chain of the declaring type, then the field segment.
    #[default]
    Namespaced,
    /// The field segment alone; namespaces are ignored.
    FieldOnly,
}

/// Returns the namespace prefix for fields declared in `info`.
pub fn namespace_prefix(info: &TypeInfo) -> String {
    prefix_of(info, true)
}

fn prefix_of(info: &TypeInfo, declaring: bool) -> String {
    let mut prefix = info
        .parent()
        .map(|parent| prefix_of(parent, false))
        .unwrap_or_default();

    let Some(namespace) = info.namespace() else {
        return prefix;
    };

    if declaring || namespace.is_inherited() {
        if namespace.is_overriding() {
            prefix = namespace.value().to_string();
        } else {
            prefix.push_str(namespace.value());
        }
    }

    if !prefix.is_empty() && !prefix.ends_with(SEPARATOR) {
        prefix.push(SEPARATOR);
    }
    prefix
}

/// Resolves the property key of `field`.
pub fn resolve_key<R>(field: &Field<R>, strategy: KeyStrategy) -> String {
    let segment = field.key_override().unwrap_or(field.name());
    match strategy {
        KeyStrategy::Namespaced => {
            let mut key = namespace_prefix(field.owner());
            key.push_str(segment);
            key
        }
        KeyStrategy::FieldOnly => segment.to_string(),
    }
}
