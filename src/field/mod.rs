//! Field model
//!
//! Fields are split in two:
//! - [`FieldConfig`]: immutable configuration (key, view, dependencies,
//!   callbacks, rules), shared behind an `Arc` across requests and workers
//! - [`FieldDescriptor`]: a config handle plus a private value slot, created
//!   per resolution unit
//!
//! Change callbacks produce [`FieldUpdate`]s; resolution produces
//! [`SerializedField`]s.

mod config;
mod descriptor;
mod schema;
mod update;
mod view;

pub use config::{
    CallbackScope, ChangeCallback, CompositeDisplay, DisplayCallback, DisplayValue, FieldConfig,
    FieldConfigBuilder, ResolveCallback, VisibilityPredicate,
};
pub use descriptor::{FieldDescriptor, FieldMetadata, RelationshipMetadata, SerializedField, ValueHolder};
pub use schema::ResourceSchema;
pub use update::FieldUpdate;
pub use view::{Cardinality, CustomView, FieldView, RelationshipView};
