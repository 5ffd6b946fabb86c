//! Record descriptors.
//!
//! A bindable record implements [`Configuration`]: it names its [`TypeInfo`]
//! (type name, namespace and parent type) and lists its fields into a
//! [`Fields`] collection. Each [`Field`] carries the per-field metadata (key
//! override, required flag, access level, declaring type) together with plain
//! `fn` accessors, which are type-erased here so the engine can walk any record
//! without knowing its concrete field types.
//!
//! ```
//! use dragon_props::bind::{Configuration, Fields, Namespace, TypeInfo};
//!
//! #[derive(Debug, Default)]
//! struct Server {
//!     host: Option<String>,
//!     port: Option<i32>,
//! }
//!
//! static SERVER: TypeInfo = TypeInfo::new("Server").with_namespace(Namespace::new("server"));
//!
//! impl Configuration for Server {
//!     fn type_info() -> &'static TypeInfo {
//!         &SERVER
//!     }
//!
//!     fn describe(fields: &mut Fields<Self>) {
//!         fields.value("host", |s| s.host.as_ref(), |s, v| s.host = Some(v));
//!         fields
//!             .value("port", |s| s.port.as_ref(), |s, v| s.port = Some(v))
//!             .optional();
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use super::codec::{AnyValue, TypeMismatch, ValueType};
use super::{BindError, Binder};
use crate::store::Properties;

/// A record type that can be bound to and from a flat property store.
///
/// `Default` provides the instance the decoder fills in; values set by it count
/// as pre-existing defaults for required fields.
pub trait Configuration: Default + fmt::Debug + 'static {
    /// Name, namespace and parent type of this record.
    fn type_info() -> &'static TypeInfo;

    /// Lists the bindable fields in binding order.
    fn describe(fields: &mut Fields<Self>);
}

/// Key prefix declared by a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    value: &'static str,
    inherit: bool,
    overrides: bool,
}

impl Namespace {
    pub const fn new(value: &'static str) -> Self {
        Self {
            value,
            inherit: false,
            overrides: false,
        }
    }

    /// Makes the namespace apply to the fields of types extending this one.
    pub const fn inherited(mut self) -> Self {
        self.inherit = true;
        self
    }

    /// Discards the prefix accumulated from parent types instead of appending to it.
    pub const fn overriding(mut self) -> Self {
        self.overrides = true;
        self
    }

    pub fn value(&self) -> &'static str {
        self.value
    }

    pub fn is_inherited(&self) -> bool {
        self.inherit
    }

    pub fn is_overriding(&self) -> bool {
        self.overrides
    }
}

/// Static description of a record type and its ancestry.
#[derive(Debug)]
pub struct TypeInfo {
    name: &'static str,
    namespace: Option<Namespace>,
    parent: Option<&'static TypeInfo>,
}

impl TypeInfo {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            namespace: None,
            parent: None,
        }
    }

    pub const fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub const fn extends(mut self, parent: &'static TypeInfo) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    pub fn parent(&self) -> Option<&'static TypeInfo> {
        self.parent
    }
}

/// Visibility of a field to external configuration.
///
/// Only `Public` fields may be bound; any other level is rejected before a
/// record is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Public,
    Private,
    ReadOnly,
    TypeLevel,
}

impl Access {
    pub(crate) fn violation(self) -> Option<&'static str> {
        match self {
            Access::Public => None,
            Access::Private => Some("must be public"),
            Access::ReadOnly => Some("may not be read-only"),
            Access::TypeLevel => Some("may not be type-level"),
        }
    }
}

/// Shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A scalar or array converted by a single codec.
    Value(ValueType),
    /// An ordered `Vec` of elements.
    List(ValueType),
    /// A `HashSet` of elements.
    Set(ValueType),
    /// A `HashMap` spread over `key.entry` properties.
    Map { key: ValueType, value: ValueType },
}

pub(crate) trait ValueSlot<R> {
    fn value_type(&self) -> ValueType;
    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn Any>;
    fn assign(&self, record: &mut R, value: AnyValue) -> Result<(), TypeMismatch>;
}

pub(crate) trait CollectionSlot<R> {
    fn declared_type(&self) -> ValueType;
    fn element_type(&self) -> ValueType;
    fn is_set(&self) -> bool;
    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn Any>;
    fn items<'a>(&self, record: &'a R) -> Option<Vec<&'a dyn Any>>;
    fn assign(&self, record: &mut R, items: Vec<AnyValue>) -> Result<(), TypeMismatch>;
}

pub(crate) trait MapSlot<R> {
    fn declared_type(&self) -> ValueType;
    fn key_type(&self) -> ValueType;
    fn value_type(&self) -> ValueType;
    fn nested(&self) -> Option<&NestedRecord>;
    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn Any>;
    #[allow(clippy::type_complexity)]
    fn entries<'a>(&self, record: &'a R) -> Option<Vec<(&'a dyn Any, &'a dyn Any)>>;
    fn assign(&self, record: &mut R, entries: Vec<(AnyValue, AnyValue)>)
        -> Result<(), TypeMismatch>;
}

/// Recursive read/write of a record used as a map value.
pub(crate) struct NestedRecord {
    pub(crate) decode: fn(&Binder, &Properties) -> Result<AnyValue, BindError>,
    pub(crate) encode: fn(&Binder, &dyn Any) -> Option<Result<Properties, BindError>>,
}

fn decode_record<V: Configuration>(binder: &Binder, props: &Properties) -> Result<AnyValue, BindError> {
    let record: V = binder.read(props)?;
    Ok(Box::new(record))
}

fn encode_record<V: Configuration>(
    binder: &Binder,
    value: &dyn Any,
) -> Option<Result<Properties, BindError>> {
    value
        .downcast_ref::<V>()
        .map(|record| binder.to_properties(record))
}

pub(crate) enum Slot<R> {
    Value(Box<dyn ValueSlot<R>>),
    Collection(Box<dyn CollectionSlot<R>>),
    Map(Box<dyn MapSlot<R>>),
}

fn unbox<T: Any + fmt::Debug>(value: AnyValue) -> Result<T, TypeMismatch> {
    value
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| TypeMismatch {
            expected: ValueType::of::<T>(),
        })
}

struct ValueAccess<R, T> {
    get: fn(&R) -> Option<&T>,
    set: fn(&mut R, T),
}

impl<R, T: Any + fmt::Debug> ValueSlot<R> for ValueAccess<R, T> {
    fn value_type(&self) -> ValueType {
        ValueType::of::<T>()
    }

    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn Any> {
        (self.get)(record).map(|value| value as &dyn Any)
    }

    fn assign(&self, record: &mut R, value: AnyValue) -> Result<(), TypeMismatch> {
        (self.set)(record, unbox(value)?);
        Ok(())
    }
}

struct ListAccess<R, T> {
    get: fn(&R) -> Option<&Vec<T>>,
    set: fn(&mut R, Vec<T>),
}

impl<R, T: Any + fmt::Debug> CollectionSlot<R> for ListAccess<R, T> {
    fn declared_type(&self) -> ValueType {
        ValueType::of::<Vec<T>>()
    }

    fn element_type(&self) -> ValueType {
        ValueType::of::<T>()
    }

    fn is_set(&self) -> bool {
        false
    }

    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn Any> {
        (self.get)(record).map(|list| list as &dyn Any)
    }

    fn items<'a>(&self, record: &'a R) -> Option<Vec<&'a dyn Any>> {
        (self.get)(record).map(|list| list.iter().map(|item| item as &dyn Any).collect())
    }

    fn assign(&self, record: &mut R, items: Vec<AnyValue>) -> Result<(), TypeMismatch> {
        let list = items.into_iter().map(unbox).collect::<Result<Vec<T>, _>>()?;
        (self.set)(record, list);
        Ok(())
    }
}

struct SetAccess<R, T> {
    get: fn(&R) -> Option<&HashSet<T>>,
    set: fn(&mut R, HashSet<T>),
}

impl<R, T: Any + fmt::Debug + Eq + Hash> CollectionSlot<R> for SetAccess<R, T> {
    fn declared_type(&self) -> ValueType {
        ValueType::of::<HashSet<T>>()
    }

    fn element_type(&self) -> ValueType {
        ValueType::of::<T>()
    }

    fn is_set(&self) -> bool {
        true
    }

    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn Any> {
        (self.get)(record).map(|set| set as &dyn Any)
    }

    fn items<'a>(&self, record: &'a R) -> Option<Vec<&'a dyn Any>> {
        (self.get)(record).map(|set| set.iter().map(|item| item as &dyn Any).collect())
    }

    fn assign(&self, record: &mut R, items: Vec<AnyValue>) -> Result<(), TypeMismatch> {
        let set = items
            .into_iter()
            .map(unbox)
            .collect::<Result<HashSet<T>, _>>()?;
        (self.set)(record, set);
        Ok(())
    }
}

struct MapAccess<R, K, V> {
    get: fn(&R) -> Option<&HashMap<K, V>>,
    set: fn(&mut R, HashMap<K, V>),
    nested: Option<NestedRecord>,
}

impl<R, K, V> MapSlot<R> for MapAccess<R, K, V>
where
    K: Any + fmt::Debug + Eq + Hash,
    V: Any + fmt::Debug,
{
    fn declared_type(&self) -> ValueType {
        ValueType::of::<HashMap<K, V>>()
    }

    fn key_type(&self) -> ValueType {
        ValueType::of::<K>()
    }

    fn value_type(&self) -> ValueType {
        ValueType::of::<V>()
    }

    fn nested(&self) -> Option<&NestedRecord> {
        self.nested.as_ref()
    }

    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn Any> {
        (self.get)(record).map(|map| map as &dyn Any)
    }

    fn entries<'a>(&self, record: &'a R) -> Option<Vec<(&'a dyn Any, &'a dyn Any)>> {
        (self.get)(record).map(|map| {
            map.iter()
                .map(|(key, value)| (key as &dyn Any, value as &dyn Any))
                .collect()
        })
    }

    fn assign(
        &self,
        record: &mut R,
        entries: Vec<(AnyValue, AnyValue)>,
    ) -> Result<(), TypeMismatch> {
        let map = entries
            .into_iter()
            .map(|(key, value)| -> Result<(K, V), TypeMismatch> {
                Ok((unbox(key)?, unbox(value)?))
            })
            .collect::<Result<HashMap<K, V>, _>>()?;
        (self.set)(record, map);
        Ok(())
    }
}

/// Descriptor of one bindable member of a record.
///
/// Fields are required unless marked [`optional`](Self::optional). A getter
/// returning `None` means the field is absent; a required absent field with no
/// property text fails the read.
pub struct Field<R> {
    name: &'static str,
    key: Option<&'static str>,
    required: bool,
    access: Access,
    owner: &'static TypeInfo,
    pub(crate) slot: Slot<R>,
}

impl<R> Field<R> {
    /// Replaces the field name as the last key segment.
    pub fn key(&mut self, key: &'static str) -> &mut Self {
        self.key = Some(key);
        self
    }

    pub fn optional(&mut self) -> &mut Self {
        self.required = false;
        self
    }

    pub fn required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    pub fn access(&mut self, access: Access) -> &mut Self {
        self.access = access;
        self
    }

    /// Resolves the key against `owner`'s namespace chain instead of the bound record's.
    pub fn declared_in(&mut self, owner: &'static TypeInfo) -> &mut Self {
        self.owner = owner;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The key override, if one is set and non-empty.
    pub fn key_override(&self) -> Option<&'static str> {
        self.key.filter(|key| !key.is_empty())
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn access_level(&self) -> Access {
        self.access
    }

    pub fn owner(&self) -> &'static TypeInfo {
        self.owner
    }

    pub fn kind(&self) -> FieldKind {
        match &self.slot {
            Slot::Value(slot) => FieldKind::Value(slot.value_type()),
            Slot::Collection(slot) if slot.is_set() => FieldKind::Set(slot.element_type()),
            Slot::Collection(slot) => FieldKind::List(slot.element_type()),
            Slot::Map(slot) => FieldKind::Map {
                key: slot.key_type(),
                value: slot.value_type(),
            },
        }
    }
}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("key", &self.key)
            .field("required", &self.required)
            .field("access", &self.access)
            .field("owner", &self.owner.name)
            .finish()
    }
}

/// Ordered field descriptors of a record type.
///
/// Built fresh from [`Configuration::describe`] on every read and write.
pub struct Fields<R> {
    fields: Vec<Field<R>>,
}

impl<R: Configuration> Fields<R> {
    /// Collects the fields `R` describes.
    pub fn of() -> Self {
        let mut fields = Self { fields: Vec::new() };
        R::describe(&mut fields);
        fields
    }

    fn push(&mut self, name: &'static str, slot: Slot<R>) -> &mut Field<R> {
        let index = self.fields.len();
        self.fields.push(Field {
            name,
            key: None,
            required: true,
            access: Access::Public,
            owner: R::type_info(),
            slot,
        });
        &mut self.fields[index]
    }

    /// A scalar or array field converted by the codec registered for `T`.
    pub fn value<T: Any + fmt::Debug>(
        &mut self,
        name: &'static str,
        get: fn(&R) -> Option<&T>,
        set: fn(&mut R, T),
    ) -> &mut Field<R> {
        self.push(name, Slot::Value(Box::new(ValueAccess { get, set })))
    }

    /// An ordered list whose elements are converted by the codec for `T`.
    pub fn list<T: Any + fmt::Debug>(
        &mut self,
        name: &'static str,
        get: fn(&R) -> Option<&Vec<T>>,
        set: fn(&mut R, Vec<T>),
    ) -> &mut Field<R> {
        self.push(name, Slot::Collection(Box::new(ListAccess { get, set })))
    }

    /// A set whose elements are converted by the codec for `T`.
    pub fn set<T: Any + fmt::Debug + Eq + Hash>(
        &mut self,
        name: &'static str,
        get: fn(&R) -> Option<&HashSet<T>>,
        set: fn(&mut R, HashSet<T>),
    ) -> &mut Field<R> {
        self.push(name, Slot::Collection(Box::new(SetAccess { get, set })))
    }

    /// A map whose values are converted by the codec for `V`.
    pub fn map<K, V>(
        &mut self,
        name: &'static str,
        get: fn(&R) -> Option<&HashMap<K, V>>,
        set: fn(&mut R, HashMap<K, V>),
    ) -> &mut Field<R>
    where
        K: Any + fmt::Debug + Eq + Hash,
        V: Any + fmt::Debug,
    {
        let access = MapAccess {
            get,
            set,
            nested: None,
        };
        self.push(name, Slot::Map(Box::new(access)))
    }

    /// A map whose values are records bound from `key.entry.field` properties.
    ///
    /// A codec registered for `V` still takes precedence over the record binding.
    pub fn record_map<K, V>(
        &mut self,
        name: &'static str,
        get: fn(&R) -> Option<&HashMap<K, V>>,
        set: fn(&mut R, HashMap<K, V>),
    ) -> &mut Field<R>
    where
        K: Any + fmt::Debug + Eq + Hash,
        V: Configuration,
    {
        let access = MapAccess {
            get,
            set,
            nested: Some(NestedRecord {
                decode: decode_record::<V>,
                encode: encode_record::<V>,
            }),
        };
        self.push(name, Slot::Map(Box::new(access)))
    }
}

impl<R> Fields<R> {
    /// Rejects fields that may not take part in binding.
    pub(crate) fn check_access(&self) -> Result<(), BindError> {
        for field in &self.fields {
            if let Some(reason) = field.access.violation() {
                return Err(BindError::IllegalField {
                    field: field.name.to_string(),
                    owner: field.owner.name.to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field<R>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a, R> IntoIterator for &'a Fields<R> {
    type Item = &'a Field<R>;
    type IntoIter = std::slice::Iter<'a, Field<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<R> fmt::Debug for Fields<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}
