//! Record types shared by the binding tests.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::{Access, Configuration, Fields, Namespace, TypeInfo};

/// Decimal number kept in its textual form; only a custom codec can read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal(String);

impl Decimal {
    pub fn parse(text: &str) -> Result<Self, String> {
        let (whole, fraction) = text.split_once('.').unwrap_or((text, "0"));
        let digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
        let whole_digits = whole.strip_prefix('-').unwrap_or(whole);

        if digits(whole_digits) && digits(fraction) {
            Ok(Self(text.to_string()))
        } else {
            Err(format!("invalid decimal: {text}"))
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value type without a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point(pub i32, pub i32);

static SIMPLE: TypeInfo = TypeInfo::new("SimpleConfiguration");

#[derive(Debug, Default, PartialEq)]
pub struct SimpleConfiguration {
    pub string: Option<String>,
    pub int: Option<i32>,
    pub long: Option<i64>,
    pub float: Option<f32>,
    pub double: Option<f64>,
    pub boolean: Option<bool>,
    pub strings: Option<Vec<String>>,
    pub ints: Option<Vec<i32>>,
    pub longs: Option<Vec<i64>>,
    pub floats: Option<Vec<f32>>,
    pub doubles: Option<Vec<f64>>,
    pub booleans: Option<Vec<bool>>,
}

impl Configuration for SimpleConfiguration {
    fn type_info() -> &'static TypeInfo {
        &SIMPLE
    }

    fn describe(fields: &mut Fields<Self>) {
        fields
            .value("string", |c| c.string.as_ref(), |c, v| c.string = Some(v))
            .key("_string")
            .optional();
        fields
            .value("int", |c| c.int.as_ref(), |c, v| c.int = Some(v))
            .key("_int")
            .optional();
        fields
            .value("long", |c| c.long.as_ref(), |c, v| c.long = Some(v))
            .key("_long")
            .optional();
        fields
            .value("float", |c| c.float.as_ref(), |c, v| c.float = Some(v))
            .key("_float")
            .optional();
        fields
            .value("double", |c| c.double.as_ref(), |c, v| c.double = Some(v))
            .key("_double")
            .optional();
        fields
            .value("boolean", |c| c.boolean.as_ref(), |c, v| c.boolean = Some(v))
            .key("_boolean")
            .optional();
        fields
            .value("strings", |c| c.strings.as_ref(), |c, v| c.strings = Some(v))
            .key("_strings")
            .optional();
        fields
            .value("ints", |c| c.ints.as_ref(), |c, v| c.ints = Some(v))
            .key("_ints")
            .optional();
        fields
            .value("longs", |c| c.longs.as_ref(), |c, v| c.longs = Some(v))
            .key("_longs")
            .optional();
        fields
            .value("floats", |c| c.floats.as_ref(), |c, v| c.floats = Some(v))
            .key("_floats")
            .optional();
        fields
            .value("doubles", |c| c.doubles.as_ref(), |c, v| c.doubles = Some(v))
            .key("_doubles")
            .optional();
        fields
            .value("booleans", |c| c.booleans.as_ref(), |c, v| c.booleans = Some(v))
            .key("_booleans")
            .optional();
    }
}

pub static ADVANCED_SUPER: TypeInfo =
    TypeInfo::new("AdvancedSuperConfiguration").with_namespace(Namespace::new("base").inherited());

pub static ADVANCED_SUB: TypeInfo = TypeInfo::new("AdvancedSubConfiguration")
    .with_namespace(Namespace::new("sub"))
    .extends(&ADVANCED_SUPER);

/// Record whose namespace extends its parent type's inherited namespace.
#[derive(Debug, PartialEq)]
pub struct AdvancedSubConfiguration {
    pub a: Option<String>,
    pub b: Option<String>,
    pub dec: Option<Decimal>,
    pub c: String,
}

impl Default for AdvancedSubConfiguration {
    fn default() -> Self {
        Self {
            a: None,
            b: None,
            dec: None,
            c: "xyz".to_string(),
        }
    }
}

impl Configuration for AdvancedSubConfiguration {
    fn type_info() -> &'static TypeInfo {
        &ADVANCED_SUB
    }

    fn describe(fields: &mut Fields<Self>) {
        fields.value("a", |c| c.a.as_ref(), |c, v| c.a = Some(v));
        fields
            .value("b", |c| c.b.as_ref(), |c, v| c.b = Some(v))
            .key("string.name");
        fields
            .value("dec", |c| c.dec.as_ref(), |c, v| c.dec = Some(v))
            .optional();
        fields.value("c", |c| Some(&c.c), |c, v| c.c = v);
    }
}

static MAP_SUB: TypeInfo = TypeInfo::new("MapSubConfiguration");

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MapSubConfiguration {
    pub a: Option<String>,
    pub b: Option<String>,
}

impl MapSubConfiguration {
    pub fn new(a: Option<&str>, b: Option<&str>) -> Self {
        Self {
            a: a.map(str::to_string),
            b: b.map(str::to_string),
        }
    }
}

impl Configuration for MapSubConfiguration {
    fn type_info() -> &'static TypeInfo {
        &MAP_SUB
    }

    fn describe(fields: &mut Fields<Self>) {
        fields
            .value("a", |c| c.a.as_ref(), |c, v| c.a = Some(v))
            .optional();
        fields
            .value("b", |c| c.b.as_ref(), |c, v| c.b = Some(v))
            .optional();
    }
}

static COLLECTION: TypeInfo = TypeInfo::new("CollectionConfiguration");

#[derive(Debug, PartialEq)]
pub struct CollectionConfiguration {
    pub map: Option<HashMap<String, MapSubConfiguration>>,
    pub simple_map: Option<HashMap<i32, f32>>,
    pub list: Option<Vec<String>>,
    pub set: Option<HashSet<i32>>,
    pub default_list: Option<Vec<String>>,
}

impl Default for CollectionConfiguration {
    fn default() -> Self {
        Self {
            map: Some(HashMap::new()),
            simple_map: Some(HashMap::new()),
            list: None,
            set: None,
            default_list: Some(vec!["a".to_string(), "b".to_string()]),
        }
    }
}

impl Configuration for CollectionConfiguration {
    fn type_info() -> &'static TypeInfo {
        &COLLECTION
    }

    fn describe(fields: &mut Fields<Self>) {
        fields.record_map("map", |c| c.map.as_ref(), |c, v| c.map = Some(v));
        fields
            .map("simpleMap", |c| c.simple_map.as_ref(), |c, v| c.simple_map = Some(v))
            .key("map1");
        fields.list("list", |c| c.list.as_ref(), |c, v| c.list = Some(v));
        fields.set("set", |c| c.set.as_ref(), |c, v| c.set = Some(v));
        fields.list(
            "defaultList",
            |c| c.default_list.as_ref(),
            |c, v| c.default_list = Some(v),
        );
    }
}

static OVERRIDE: TypeInfo = TypeInfo::new("OverrideConfiguration")
    .with_namespace(Namespace::new("own").overriding())
    .extends(&ADVANCED_SUPER);

#[derive(Debug, Default, PartialEq)]
pub struct OverrideConfiguration {
    pub value: Option<i32>,
}

impl Configuration for OverrideConfiguration {
    fn type_info() -> &'static TypeInfo {
        &OVERRIDE
    }

    fn describe(fields: &mut Fields<Self>) {
        fields.value("value", |c| c.value.as_ref(), |c, v| c.value = Some(v));
    }
}

static NAMESPACED_ENTRY: TypeInfo =
    TypeInfo::new("NamespacedEntry").with_namespace(Namespace::new("entry"));

#[derive(Debug, Default, PartialEq)]
pub struct NamespacedEntry {
    pub label: Option<String>,
}

impl Configuration for NamespacedEntry {
    fn type_info() -> &'static TypeInfo {
        &NAMESPACED_ENTRY
    }

    fn describe(fields: &mut Fields<Self>) {
        fields.value("label", |c| c.label.as_ref(), |c, v| c.label = Some(v));
    }
}

static NAMESPACED_MAP: TypeInfo =
    TypeInfo::new("NamespacedMapConfiguration").with_namespace(Namespace::new("app"));

#[derive(Debug, Default, PartialEq)]
pub struct NamespacedMapConfiguration {
    pub entries: Option<HashMap<i32, NamespacedEntry>>,
}

impl Configuration for NamespacedMapConfiguration {
    fn type_info() -> &'static TypeInfo {
        &NAMESPACED_MAP
    }

    fn describe(fields: &mut Fields<Self>) {
        fields.record_map("entries", |c| c.entries.as_ref(), |c, v| c.entries = Some(v));
    }
}

static GUARDED: TypeInfo = TypeInfo::new("GuardedConfiguration");

/// Record with a field that may not be bound.
#[derive(Debug, Default)]
pub struct GuardedConfiguration {
    pub name: Option<String>,
    pub secret: Option<String>,
}

impl Configuration for GuardedConfiguration {
    fn type_info() -> &'static TypeInfo {
        &GUARDED
    }

    fn describe(fields: &mut Fields<Self>) {
        fields
            .value("name", |c| c.name.as_ref(), |c, v| c.name = Some(v))
            .optional();
        fields
            .value("secret", |c| c.secret.as_ref(), |c, v| c.secret = Some(v))
            .access(Access::Private);
    }
}

static OPAQUE: TypeInfo = TypeInfo::new("OpaqueConfiguration");

#[derive(Debug, Default)]
pub struct OpaqueConfiguration {
    pub points: Option<Vec<Point>>,
    pub by_name: Option<HashMap<String, Point>>,
}

impl Configuration for OpaqueConfiguration {
    fn type_info() -> &'static TypeInfo {
        &OPAQUE
    }

    fn describe(fields: &mut Fields<Self>) {
        fields.list("points", |c| c.points.as_ref(), |c, v| c.points = Some(v));
        fields.map("byName", |c| c.by_name.as_ref(), |c, v| c.by_name = Some(v));
    }
}

static POINT_KEYED: TypeInfo = TypeInfo::new("PointKeyedConfiguration");

#[derive(Debug, Default)]
pub struct PointKeyedConfiguration {
    pub labels: Option<HashMap<Point, String>>,
}

impl Configuration for PointKeyedConfiguration {
    fn type_info() -> &'static TypeInfo {
        &POINT_KEYED
    }

    fn describe(fields: &mut Fields<Self>) {
        fields.map("labels", |c| c.labels.as_ref(), |c, v| c.labels = Some(v));
    }
}

static INHERITING: TypeInfo = TypeInfo::new("InheritingConfiguration")
    .with_namespace(Namespace::new("sub"))
    .extends(&ADVANCED_SUPER);

/// Record whose `x` field is declared in its parent type.
#[derive(Debug, Default, PartialEq)]
pub struct InheritingConfiguration {
    pub x: Option<i32>,
    pub y: Option<i32>,
}

impl Configuration for InheritingConfiguration {
    fn type_info() -> &'static TypeInfo {
        &INHERITING
    }

    fn describe(fields: &mut Fields<Self>) {
        fields
            .value("x", |c| c.x.as_ref(), |c, v| c.x = Some(v))
            .declared_in(&ADVANCED_SUPER);
        fields.value("y", |c| c.y.as_ref(), |c, v| c.y = Some(v));
    }
}

static PRESET: TypeInfo = TypeInfo::new("PresetConfiguration");

#[derive(Debug, PartialEq)]
pub struct PresetConfiguration {
    pub name: Option<String>,
    pub retries: Option<i32>,
}

impl Default for PresetConfiguration {
    fn default() -> Self {
        Self {
            name: None,
            retries: Some(3),
        }
    }
}

impl Configuration for PresetConfiguration {
    fn type_info() -> &'static TypeInfo {
        &PRESET
    }

    fn describe(fields: &mut Fields<Self>) {
        fields.value("name", |c| c.name.as_ref(), |c, v| c.name = Some(v));
        fields
            .value("retries", |c| c.retries.as_ref(), |c, v| c.retries = Some(v))
            .optional();
    }
}
