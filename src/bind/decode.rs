//! Read path: flat property store to record.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::codec::{split_list, AnyValue, TypeMismatch, ValueType};
use super::field::{CollectionSlot, Configuration, Field, Fields, MapSlot, Slot, ValueSlot};
use super::key::SEPARATOR;
use super::{BindError, Binder};
use crate::store::Properties;

pub(crate) fn decode<R: Configuration>(binder: &Binder, props: &Properties) -> Result<R, BindError> {
    let fields = Fields::<R>::of();
    fields.check_access()?;

    debug!(
        record = R::type_info().name(),
        fields = fields.len(),
        properties = props.len(),
        "reading record"
    );

    let mut record = R::default();
    for field in &fields {
        let key = binder.key_for(field);
        trace!(field = field.name(), key = %key, "resolved property key");

        match &field.slot {
            Slot::Value(slot) => decode_value(binder, field, slot.as_ref(), &key, props, &mut record)?,
            Slot::Collection(slot) => {
                decode_collection(binder, field, slot.as_ref(), &key, props, &mut record)?
            }
            Slot::Map(slot) => decode_map(binder, field, slot.as_ref(), &key, props, &mut record)?,
        }
    }

    Ok(record)
}

fn decode_value<R>(
    binder: &Binder,
    field: &Field<R>,
    slot: &dyn ValueSlot<R>,
    key: &str,
    props: &Properties,
    record: &mut R,
) -> Result<(), BindError> {
    let Some(text) = props.get(key) else {
        if field.is_required() && slot.get(record).is_none() {
            return Err(missing(field, key));
        }
        return Ok(());
    };

    let value = convert(binder, field, key, &slot.value_type(), text)?;
    slot.assign(record, value)
        .map_err(|err| mismatch(field, key, text, err))
}

fn decode_collection<R>(
    binder: &Binder,
    field: &Field<R>,
    slot: &dyn CollectionSlot<R>,
    key: &str,
    props: &Properties,
    record: &mut R,
) -> Result<(), BindError> {
    let Some(text) = props.get(key) else {
        if slot.get(record).is_none() {
            if field.is_required() {
                return Err(missing(field, key));
            }
            slot.assign(record, Vec::new())
                .map_err(|err| mismatch(field, key, "", err))?;
        }
        return Ok(());
    };

    let element = slot.element_type();
    if !binder.codecs().contains(&element) {
        return Err(unsupported(binder, field, &element));
    }

    let items = split_list(text)
        .into_iter()
        .map(|piece| convert(binder, field, key, &element, piece))
        .collect::<Result<Vec<_>, _>>()?;
    slot.assign(record, items)
        .map_err(|err| mismatch(field, key, text, err))
}

fn decode_map<R>(
    binder: &Binder,
    field: &Field<R>,
    slot: &dyn MapSlot<R>,
    key: &str,
    props: &Properties,
    record: &mut R,
) -> Result<(), BindError> {
    let prefix = format!("{key}{SEPARATOR}");
    let matching: Vec<(&str, &str)> = props.strip_prefix(&prefix).collect();

    if matching.is_empty() {
        if slot.get(record).is_none() {
            if field.is_required() {
                return Err(missing(field, key));
            }
            slot.assign(record, Vec::new())
                .map_err(|err| mismatch(field, key, "", err))?;
        }
        return Ok(());
    }

    let key_type = slot.key_type();
    let value_type = slot.value_type();
    if !binder.codecs().contains(&key_type) {
        return Err(unsupported(binder, field, &key_type));
    }

    let mut entries: Vec<(AnyValue, AnyValue)> = Vec::with_capacity(matching.len());

    if binder.codecs().contains(&value_type) {
        for (entry, text) in matching {
            let entry_key = format!("{prefix}{entry}");
            entries.push((
                convert(binder, field, &entry_key, &key_type, entry)?,
                convert(binder, field, &entry_key, &value_type, text)?,
            ));
        }
    } else if let Some(nested) = slot.nested() {
        for (entry, sub) in partition(key, &matching)? {
            let entry_key = format!("{prefix}{entry}");
            trace!(key = %entry_key, properties = sub.len(), "reading nested record");
            entries.push((
                convert(binder, field, &entry_key, &key_type, entry)?,
                (nested.decode)(binder, &sub)?,
            ));
        }
    } else {
        return Err(unsupported(binder, field, &value_type));
    }

    slot.assign(record, entries)
        .map_err(|err| mismatch(field, key, "", err))
}

/// Groups map properties by entry key, stripping `entry.` from each sub-key.
///
/// `m.1.a` and `m.1.b` both land in entry `1` as `a` and `b`; a bare `m.1`
/// yields an entry with an empty store.
fn partition<'a>(
    key: &str,
    matching: &[(&'a str, &'a str)],
) -> Result<BTreeMap<&'a str, Properties>, BindError> {
    let mut groups: BTreeMap<&str, Properties> = BTreeMap::new();

    for &(relative, text) in matching {
        let (entry, rest) = match relative.split_once(SEPARATOR) {
            Some((entry, rest)) => (entry, Some(rest)),
            None => (relative, None),
        };
        if entry.is_empty() {
            return Err(BindError::EmptyMapKey {
                key: key.to_string(),
            });
        }

        let sub = groups.entry(entry).or_default();
        if let Some(rest) = rest {
            sub.insert(rest, text);
        }
    }

    Ok(groups)
}

fn convert<R>(
    binder: &Binder,
    field: &Field<R>,
    key: &str,
    ty: &ValueType,
    text: &str,
) -> Result<AnyValue, BindError> {
    match binder.codecs().decode(ty, text) {
        Some(Ok(value)) => Ok(value),
        Some(Err(source)) => Err(BindError::Conversion {
            field: field.name().to_string(),
            key: key.to_string(),
            value: text.to_string(),
            ty: ty.short_name(),
            source,
        }),
        None => Err(unsupported(binder, field, ty)),
    }
}

fn missing<R>(field: &Field<R>, key: &str) -> BindError {
    BindError::MissingProperty {
        key: key.to_string(),
        owner: field.owner().name().to_string(),
    }
}

fn unsupported<R>(binder: &Binder, field: &Field<R>, ty: &ValueType) -> BindError {
    BindError::UnsupportedType {
        field: field.name().to_string(),
        owner: field.owner().name().to_string(),
        ty: ty.short_name(),
        supported: binder.codecs().supported_types(),
    }
}

fn mismatch<R>(field: &Field<R>, key: &str, text: &str, err: TypeMismatch) -> BindError {
    BindError::Conversion {
        field: field.name().to_string(),
        key: key.to_string(),
        value: text.to_string(),
        ty: err.expected.short_name(),
        source: Box::new(err),
    }
}
