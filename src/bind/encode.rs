//! Write path: record to flat property store.
//!
//! Absent fields are skipped. Field access is checked as on the read path;
//! required flags are a read-time concern only.

use std::any::Any;

use tracing::{debug, trace};

use super::codec::{ValueType, LIST_SEPARATOR};
use super::field::{CollectionSlot, Configuration, Field, Fields, MapSlot, Slot};
use super::key::SEPARATOR;
use super::{BindError, Binder};
use crate::store::Properties;

pub(crate) fn encode<R: Configuration>(
    binder: &Binder,
    record: &R,
    out: &mut Properties,
) -> Result<(), BindError> {
    let fields = Fields::<R>::of();
    fields.check_access()?;
    debug!(record = R::type_info().name(), fields = fields.len(), "writing record");

    for field in &fields {
        let key = binder.key_for(field);

        match &field.slot {
            Slot::Value(slot) => {
                if let Some(value) = slot.get(record) {
                    trace!(field = field.name(), key = %key, "writing value");
                    out.insert(key, render(binder, &slot.value_type(), value));
                }
            }
            Slot::Collection(slot) => {
                if let Some(text) = encode_collection(binder, slot.as_ref(), record) {
                    trace!(field = field.name(), key = %key, "writing collection");
                    out.insert(key, text);
                }
            }
            Slot::Map(slot) => encode_map(binder, field, slot.as_ref(), &key, record, out)?,
        }
    }

    Ok(())
}

/// Codec text for `value`, falling back to its `Debug` rendering.
fn render(binder: &Binder, ty: &ValueType, value: &dyn Any) -> String {
    binder
        .codecs()
        .encode(ty, value)
        .unwrap_or_else(|| ty.render(value))
}

fn encode_collection<R>(binder: &Binder, slot: &dyn CollectionSlot<R>, record: &R) -> Option<String> {
    let whole = slot.get(record)?;
    if let Some(text) = binder.codecs().encode(&slot.declared_type(), whole) {
        return Some(text);
    }

    let element = slot.element_type();
    let items = slot.items(record)?;
    let parts: Vec<String> = items
        .into_iter()
        .map(|item| render(binder, &element, item))
        .collect();
    Some(parts.join(&LIST_SEPARATOR.to_string()))
}

fn encode_map<R>(
    binder: &Binder,
    field: &Field<R>,
    slot: &dyn MapSlot<R>,
    key: &str,
    record: &R,
    out: &mut Properties,
) -> Result<(), BindError> {
    let Some(whole) = slot.get(record) else {
        return Ok(());
    };
    if let Some(text) = binder.codecs().encode(&slot.declared_type(), whole) {
        out.insert(key, text);
        return Ok(());
    }

    let key_type = slot.key_type();
    if !binder.codecs().contains(&key_type) {
        return Err(BindError::MissingKeyCodec {
            field: field.name().to_string(),
            owner: field.owner().name().to_string(),
            key_type: key_type.short_name(),
        });
    }

    let value_type = slot.value_type();
    for (entry, value) in slot.entries(record).unwrap_or_default() {
        let entry = render(binder, &key_type, entry);
        let entry_key = format!("{key}{SEPARATOR}{entry}");

        if let Some(text) = binder.codecs().encode(&value_type, value) {
            out.insert(entry_key, text);
            continue;
        }

        match slot.nested().and_then(|nested| (nested.encode)(binder, value)) {
            Some(flattened) => {
                for (sub_key, text) in flattened? {
                    out.insert(format!("{entry_key}{SEPARATOR}{sub_key}"), text);
                }
            }
            None => {
                out.insert(entry_key, value_type.render(value));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::bind::fixtures::{
        AdvancedSubConfiguration, CollectionConfiguration, Decimal, MapSubConfiguration,
        GuardedConfiguration, OpaqueConfiguration, Point, PointKeyedConfiguration,
    };

    #[test]
    fn test_write_namespaced_fields() {
        let config = AdvancedSubConfiguration {
            a: Some("a".into()),
            b: Some("b".into()),
            dec: Some(Decimal::parse("123.123").unwrap()),
            c: "c".into(),
        };
        let mut binder = Binder::new();
        binder.register(Decimal::parse, Decimal::to_string);

        let props = binder.to_properties(&config).unwrap();

        assert_eq!(props.get("base.sub.a"), Some("a"));
        assert_eq!(props.get("base.sub.string.name"), Some("b"));
        assert_eq!(props.get("base.sub.dec"), Some("123.123"));
        assert_eq!(props.get("base.sub.c"), Some("c"));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_absent_fields_are_skipped() {
        let config = AdvancedSubConfiguration::default();

        let props = Binder::new().to_properties(&config).unwrap();

        assert_eq!(props.len(), 1);
        assert_eq!(props.get("base.sub.c"), Some("xyz"));
    }

    #[test]
    fn test_value_without_codec_uses_debug_text() {
        let config = AdvancedSubConfiguration {
            dec: Some(Decimal::parse("1.5").unwrap()),
            ..Default::default()
        };

        let props = Binder::new().to_properties(&config).unwrap();

        assert_eq!(props.get("base.sub.dec"), Some(r#"Decimal("1.5")"#));
    }

    #[test]
    fn test_write_collections() {
        let config = CollectionConfiguration {
            map: Some(HashMap::from([(
                "a".to_string(),
                MapSubConfiguration::new(Some("x"), Some("y")),
            )])),
            simple_map: Some(HashMap::from([(1, 1.5f32)])),
            list: Some(vec!["abc".into(), "def".into(), "ghi".into(), "ghi".into()]),
            set: Some(HashSet::from([7])),
            default_list: None,
        };

        let props = Binder::new().to_properties(&config).unwrap();

        assert_eq!(props.get("map.a.a"), Some("x"));
        assert_eq!(props.get("map.a.b"), Some("y"));
        assert_eq!(props.get("map1.1"), Some("1.5"));
        assert_eq!(props.get("list"), Some("abc,def,ghi,ghi"));
        assert_eq!(props.get("set"), Some("7"));
        assert_eq!(props.get("defaultList"), None);
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn test_nested_record_skips_absent_fields() {
        let config = CollectionConfiguration {
            map: Some(HashMap::from([(
                "only".to_string(),
                MapSubConfiguration::new(Some("x"), None),
            )])),
            ..Default::default()
        };

        let props = Binder::new().to_properties(&config).unwrap();

        assert_eq!(props.get("map.only.a"), Some("x"));
        assert!(!props.contains_key("map.only.b"));
    }

    #[test]
    fn test_list_elements_without_codec_use_debug_text() {
        let config = OpaqueConfiguration {
            points: Some(vec![Point(1, 2), Point(3, 4)]),
            by_name: None,
        };

        let props = Binder::new().to_properties(&config).unwrap();

        assert_eq!(props.get("points"), Some("Point(1, 2),Point(3, 4)"));
    }

    #[test]
    fn test_scalar_map_values_without_codec_use_debug_text() {
        let config = OpaqueConfiguration {
            points: None,
            by_name: Some(HashMap::from([("origin".to_string(), Point(0, 0))])),
        };

        let props = Binder::new().to_properties(&config).unwrap();

        assert_eq!(props.get("byName.origin"), Some("Point(0, 0)"));
    }

    #[test]
    fn test_missing_key_codec() {
        let config = PointKeyedConfiguration {
            labels: Some(HashMap::from([(Point(1, 1), "one".to_string())])),
        };

        let result = Binder::new().to_properties(&config);

        match result {
            Err(BindError::MissingKeyCodec {
                field, key_type, ..
            }) => {
                assert_eq!(field, "labels");
                assert_eq!(key_type, "Point");
            }
            other => panic!("expected missing key codec, got {other:?}"),
        }
    }

    #[test]
    fn test_write_keeps_existing_properties() {
        let mut props: Properties = [("unrelated", "1"), ("base.sub.c", "old")]
            .into_iter()
            .collect();

        Binder::new()
            .write(&mut props, &AdvancedSubConfiguration::default())
            .unwrap();

        assert_eq!(props.get("unrelated"), Some("1"));
        assert_eq!(props.get("base.sub.c"), Some("xyz"));
    }

    #[test]
    fn test_illegal_field_rejected_before_writing() {
        let config = GuardedConfiguration {
            name: Some("n".into()),
            secret: Some("s".into()),
        };
        let mut props: Properties = [("unrelated", "1")].into_iter().collect();

        let result = Binder::new().write(&mut props, &config);

        match result {
            Err(BindError::IllegalField { field, reason, .. }) => {
                assert_eq!(field, "secret");
                assert_eq!(reason, "must be public");
            }
            other => panic!("expected illegal field, got {other:?}"),
        }
        assert_eq!(props.len(), 1);
        assert!(!props.contains_key("name"));
    }
}
