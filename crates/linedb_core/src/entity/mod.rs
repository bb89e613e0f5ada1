//! Entities: identity, schema and storage.

mod id;
mod schema;
mod store;

pub use id::EntityId;
pub use schema::{Schema, SchemaBuilder};
pub use store::{EntityStore, RawRecord, StoredEntity};

pub(crate) use schema::{hydrate_raw, Registry, TypedRow};

/// A type that can be persisted by a [`Database`](crate::Database).
///
/// An entity has an integer identity that it can both report and accept,
/// and a set of properties described once per type by [`Entity::describe`].
/// Each property is declared with a reader and a writer, so a property that
/// cannot be written back is never persisted.
///
/// # Example
///
/// ```
/// use linedb_core::{Entity, EntityId, SchemaBuilder};
///
/// #[derive(Debug, Clone, Default)]
/// struct Apple {
///     id: EntityId,
///     color: String,
///     weight: u32,
/// }
///
/// impl Entity for Apple {
///     const TYPE_NAME: &'static str = "Apple";
///
///     fn id(&self) -> EntityId {
///         self.id
///     }
///
///     fn set_id(&mut self, id: EntityId) {
///         self.id = id;
///     }
///
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema
///             .value("color", |a| &a.color, |a| &mut a.color)
///             .value("weight", |a| &a.weight, |a| &mut a.weight);
///     }
/// }
/// ```
pub trait Entity: Clone + Default + Send + Sync + 'static {
    /// Name of the type in the data file.
    ///
    /// Must be unique among the entity types used with one database and
    /// must not contain `#`, `:`, `;`, `,` or line breaks.
    const TYPE_NAME: &'static str;

    /// Returns the entity's identity. [`EntityId::UNASSIGNED`] before the
    /// first save.
    fn id(&self) -> EntityId;

    /// Sets the entity's identity. Called by the database only.
    fn set_id(&mut self, id: EntityId);

    /// Declares the entity's properties.
    fn describe(schema: &mut SchemaBuilder<Self>);
}
