//! Entity schemas: the capability probe and typed property access.

use crate::database::Database;
use crate::entity::store::{RawRecord, StoredEntity};
use crate::entity::{Entity, EntityId};
use crate::error::{CoreError, CoreResult};
use crate::record::{EntityRecord, ID_FIELD};
use crate::report::ErrorReporter;
use linedb_codec::{decode_value, encode_value, CodecError, CodecResult, FieldValue, Kind, Value};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

/// Characters that may not appear in type or property names.
const RESERVED_CHARS: [char; 6] = ['#', ':', ';', ',', '\n', '\r'];

/// Typed access to one property of `T`.
pub(crate) trait PropertyOps<T>: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> Kind;

    /// `None` if the property is omitted from the record.
    fn encode(&self, entity: &T) -> Option<Value>;

    fn decode(&self, entity: &mut T, value: Value) -> CodecResult<()>;

    /// Saves nested entities that are not persistent yet.
    fn cascade(&self, _entity: &mut T, _db: &Database) {}
}

struct ValueProperty<T, F> {
    name: &'static str,
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T: Entity, F: FieldValue + 'static> PropertyOps<T> for ValueProperty<T, F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> Kind {
        F::kind()
    }

    fn encode(&self, entity: &T) -> Option<Value> {
        (self.get)(entity).to_value()
    }

    fn decode(&self, entity: &mut T, value: Value) -> CodecResult<()> {
        *(self.get_mut)(entity) = F::from_value(value)?;
        Ok(())
    }
}

struct EntityProperty<T, E> {
    name: &'static str,
    get: fn(&T) -> &Option<E>,
    get_mut: fn(&mut T) -> &mut Option<E>,
}

impl<T: Entity, E: Entity> PropertyOps<T> for EntityProperty<T, E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> Kind {
        Kind::Entity(E::TYPE_NAME)
    }

    fn encode(&self, entity: &T) -> Option<Value> {
        (self.get)(entity)
            .as_ref()
            .map(Entity::id)
            .filter(|id| id.is_assigned())
            .map(|id| Value::Ref(id.get()))
    }

    fn decode(&self, entity: &mut T, value: Value) -> CodecResult<()> {
        let id = value
            .as_ref_id()
            .ok_or_else(|| CodecError::type_mismatch("reference", value.kind_name()))?;
        *(self.get_mut)(entity) = Some(shallow::<E>(id));
        Ok(())
    }

    fn cascade(&self, entity: &mut T, db: &Database) {
        if let Some(child) = (self.get_mut)(entity) {
            db.cascade_child(child);
        }
    }
}

struct EntityListProperty<T, E> {
    name: &'static str,
    get: fn(&T) -> &Vec<E>,
    get_mut: fn(&mut T) -> &mut Vec<E>,
}

impl<T: Entity, E: Entity> PropertyOps<T> for EntityListProperty<T, E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> Kind {
        Kind::List(Box::new(Kind::Entity(E::TYPE_NAME)))
    }

    fn encode(&self, entity: &T) -> Option<Value> {
        let items: Vec<Value> = (self.get)(entity)
            .iter()
            .map(Entity::id)
            .filter(|id| id.is_assigned())
            .map(|id| Value::Ref(id.get()))
            .collect();
        if items.is_empty() {
            return None;
        }
        Some(Value::List {
            element_type: E::TYPE_NAME.to_string(),
            items,
        })
    }

    fn decode(&self, entity: &mut T, value: Value) -> CodecResult<()> {
        let Value::List { items, .. } = value else {
            return Err(CodecError::type_mismatch("list", value.kind_name()));
        };
        let children = items
            .iter()
            .map(|item| {
                item.as_ref_id()
                    .map(shallow::<E>)
                    .ok_or_else(|| CodecError::type_mismatch("reference", item.kind_name()))
            })
            .collect::<CodecResult<Vec<E>>>()?;
        *(self.get_mut)(entity) = children;
        Ok(())
    }

    fn cascade(&self, entity: &mut T, db: &Database) {
        for child in (self.get_mut)(entity).iter_mut() {
            db.cascade_child(child);
        }
    }
}

/// An entity carrying only its identity.
fn shallow<E: Entity>(id: u64) -> E {
    let mut entity = E::default();
    entity.set_id(EntityId::new(id));
    entity
}

/// Collects the property declarations of an entity type.
///
/// Passed to [`Entity::describe`]. Every method takes a reader and a
/// writer for the property; both are plain functions, usually
/// non-capturing closures.
pub struct SchemaBuilder<T> {
    properties: Vec<Box<dyn PropertyOps<T>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> SchemaBuilder<T> {
    fn new() -> Self {
        Self {
            properties: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declares a property holding a plain value: a scalar, a symbol, an
    /// `Option` of one, or a `Vec` of them.
    pub fn value<F: FieldValue + 'static>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        self.properties
            .push(Box::new(ValueProperty { name, get, get_mut }));
        self
    }

    /// Declares a property holding another entity.
    ///
    /// The child is stored by identity. Saving the parent first saves a
    /// child that is not persistent yet.
    pub fn entity<E: Entity>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &Option<E>,
        get_mut: fn(&mut T) -> &mut Option<E>,
    ) -> &mut Self {
        self.properties
            .push(Box::new(EntityProperty { name, get, get_mut }));
        self
    }

    /// Declares a property holding a list of entities.
    pub fn entities<E: Entity>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &Vec<E>,
        get_mut: fn(&mut T) -> &mut Vec<E>,
    ) -> &mut Self {
        self.properties
            .push(Box::new(EntityListProperty { name, get, get_mut }));
        self
    }
}

/// The validated property layout of an entity type.
pub struct Schema<T> {
    properties: Vec<Box<dyn PropertyOps<T>>>,
}

impl<T: Entity> Schema<T> {
    /// Decides whether `T` can be persisted.
    ///
    /// Runs [`Entity::describe`] and checks that the type name and every
    /// property name are usable in a record, and that no property name is
    /// declared twice or collides with `Id`. Has no side effects.
    pub fn probe() -> CoreResult<Self> {
        check_name(T::TYPE_NAME, "type name").map_err(|reason| not_persistable::<T>(reason))?;

        let mut builder = SchemaBuilder::new();
        T::describe(&mut builder);

        let mut seen = HashSet::new();
        for property in &builder.properties {
            let name = property.name();
            check_name(name, "property name").map_err(|reason| not_persistable::<T>(reason))?;
            if name == ID_FIELD {
                return Err(not_persistable::<T>(format!(
                    "property name {ID_FIELD:?} is reserved"
                )));
            }
            if !seen.insert(name) {
                return Err(not_persistable::<T>(format!(
                    "property {name:?} is declared twice"
                )));
            }
        }

        Ok(Self {
            properties: builder.properties,
        })
    }

    /// The entity type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    /// Declared property names, in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(|p| p.name())
    }

    /// Semantic kind of a property.
    #[must_use]
    pub fn property_kind(&self, name: &str) -> Option<Kind> {
        self.property(name).map(|p| p.kind())
    }

    fn property(&self, name: &str) -> Option<&dyn PropertyOps<T>> {
        self.properties
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Encodes every present property as `(name, token)` fields.
    #[must_use]
    pub fn encode(&self, entity: &T) -> Vec<(String, String)> {
        self.properties
            .iter()
            .filter_map(|p| {
                let token = encode_value(&p.encode(entity)?)?;
                Some((p.name().to_string(), token))
            })
            .collect()
    }

    /// Builds an entity from a record.
    ///
    /// Nested entities come back shallow. Fields with no matching property
    /// are ignored. A field that fails to decode is reported and leaves its
    /// property at the default value.
    pub fn decode(&self, record: &EntityRecord, reporter: &dyn ErrorReporter) -> T {
        let mut entity = T::default();
        entity.set_id(record.id);
        for (name, token) in &record.fields {
            let Some(property) = self.property(name) else {
                continue;
            };
            let decoded = decode_value(token, &property.kind())
                .and_then(|value| property.decode(&mut entity, value));
            if let Err(source) = decoded {
                reporter.report(&CoreError::decode(T::TYPE_NAME, name.as_str(), source));
            }
        }
        entity
    }

    pub(crate) fn cascade(&self, entity: &mut T, db: &Database) {
        for property in &self.properties {
            property.cascade(entity, db);
        }
    }
}

impl<T> std::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field(
                "properties",
                &self.properties.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn check_name(name: &str, what: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{what} is empty"));
    }
    if let Some(c) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(format!("{what} {name:?} contains {c:?}"));
    }
    Ok(())
}

fn not_persistable<T: Entity>(reason: String) -> CoreError {
    CoreError::not_persistable(T::TYPE_NAME, reason)
}

/// A typed row of the entity store.
pub(crate) struct TypedRow<T> {
    pub(crate) entity: T,
    schema: Arc<Schema<T>>,
}

impl<T: Entity> TypedRow<T> {
    pub(crate) fn new(entity: T, schema: Arc<Schema<T>>) -> Self {
        Self { entity, schema }
    }
}

impl<T: Entity> StoredEntity for TypedRow<T> {
    fn id(&self) -> EntityId {
        self.entity.id()
    }

    fn fields(&self) -> Vec<(String, String)> {
        self.schema.encode(&self.entity)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Turns a record of a known type into a typed row.
pub(crate) type RecordDecoder =
    Arc<dyn Fn(&EntityRecord, &dyn ErrorReporter) -> Box<dyn StoredEntity> + Send + Sync>;

/// Probe results cached per Rust type.
#[derive(Default)]
pub(crate) struct Registry {
    schemas: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    rejected: HashMap<TypeId, String>,
    names: HashMap<&'static str, TypeId>,
    decoders: HashMap<&'static str, RecordDecoder>,
}

impl Registry {
    /// Cached probe result for `T`, if `T` has been probed.
    pub(crate) fn lookup<T: Entity>(&self) -> Option<CoreResult<Arc<Schema<T>>>> {
        let type_id = TypeId::of::<T>();
        if let Some(reason) = self.rejected.get(&type_id) {
            return Some(Err(not_persistable::<T>(reason.clone())));
        }
        let schema = self.schemas.get(&type_id)?.clone();
        schema.downcast::<Schema<T>>().ok().map(Ok)
    }

    /// Probes `T` and caches the result.
    pub(crate) fn register<T: Entity>(&mut self) -> CoreResult<Arc<Schema<T>>> {
        let type_id = TypeId::of::<T>();
        let probed = match self.names.get(T::TYPE_NAME) {
            Some(other) if *other != type_id => Err(not_persistable::<T>(
                "type name is already used by another type".to_string(),
            )),
            _ => Schema::<T>::probe(),
        };

        match probed {
            Ok(schema) => {
                let schema = Arc::new(schema);
                self.schemas.insert(type_id, schema.clone());
                self.names.insert(T::TYPE_NAME, type_id);
                let for_decoder = Arc::clone(&schema);
                let decoder: RecordDecoder = Arc::new(
                    move |record: &EntityRecord,
                          reporter: &dyn ErrorReporter|
                          -> Box<dyn StoredEntity> {
                        let entity = for_decoder.decode(record, reporter);
                        Box::new(TypedRow::new(entity, Arc::clone(&for_decoder)))
                    },
                );
                self.decoders.insert(T::TYPE_NAME, decoder);
                Ok(schema)
            }
            Err(error) => {
                if let CoreError::NotPersistable { reason, .. } = &error {
                    self.rejected.insert(type_id, reason.clone());
                }
                Err(error)
            }
        }
    }

    /// Decoder for records of a registered type name.
    pub(crate) fn decoder(&self, type_name: &str) -> Option<&RecordDecoder> {
        self.decoders.get(type_name)
    }
}

/// Decodes a raw row with `schema`, or `None` if the row is already typed.
pub(crate) fn hydrate_raw<T: Entity>(
    row: &dyn StoredEntity,
    schema: &Arc<Schema<T>>,
    reporter: &dyn ErrorReporter,
) -> Option<Box<dyn StoredEntity>> {
    let raw = row.as_any().downcast_ref::<RawRecord>()?;
    let entity = schema.decode(&raw.0, reporter);
    Some(Box::new(TypedRow::new(entity, Arc::clone(schema))))
}
