//! # Semble Schema
//!
//! Versioned registry of resource field schemas.
//!
//! - [`SchemaRegistry`] - Stores every version of every resource schema
//! - [`validate_schema`] - Structural checks with errors and warnings
//! - [`analyze_schema_changes`] - Added, removed and modified fields between versions
//! - [`generate_node_properties`] - Projects a schema into UI property descriptors
//!
//! ## Example
//!
//! ```rust
//! use semble_schema::{FieldSchema, ResourceSchema, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new();
//! registry
//!     .register_schema(
//!         ResourceSchema::new("Patient", "patient", "1.0.0")
//!             .with_field(FieldSchema::new("id", "string"))
//!             .with_field(FieldSchema::new("firstName", "string").required()),
//!     )
//!     .unwrap();
//!
//! let props = registry
//!     .generate_node_properties("patient", None, Some("create"))
//!     .unwrap();
//! assert_eq!(props[0].display_name, "First Name");
//! ```

#![doc(html_root_url = "https://docs.rs/semble-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod analysis;
mod error;
mod properties;
mod registry;
mod types;

pub use analysis::{analyze_schema_changes, validate_schema};
pub use error::{RegistryError, RegistryResult};
pub use properties::{generate_node_properties, humanize, NodeProperty, PropertyOption, PropertyType};
pub use registry::SchemaRegistry;
pub use types::{
    ConditionalDisplay, FieldSchema, ResourceSchema, RuleType, SchemaChangeAnalysis,
    SchemaValidation, SchemaVersion, ValidationRule,
};
