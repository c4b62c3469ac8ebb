//! Versioned schema store.

use crate::analysis::{analyze_schema_changes, validate_schema};
use crate::error::{RegistryError, RegistryResult};
use crate::properties::{generate_node_properties, NodeProperty};
use crate::types::ResourceSchema;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct TypeEntry {
    /// Versions in registration order.
    versions: IndexMap<String, ResourceSchema>,
    latest: String,
    dependencies: BTreeMap<String, Vec<String>>,
}

impl TypeEntry {
    fn latest(&self) -> Option<&ResourceSchema> {
        self.versions.get(&self.latest)
    }

    fn refresh_dependencies(&mut self) {
        self.dependencies = self
            .latest()
            .map(|schema| {
                schema
                    .fields
                    .iter()
                    .filter(|f| !f.dependencies.is_empty())
                    .map(|f| (f.name.clone(), f.dependencies.clone()))
                    .collect()
            })
            .unwrap_or_default();
    }
}

/// Stores every registered version of every resource schema.
///
/// Resource types are matched case-insensitively. The latest version of a
/// type is the one registered most recently, not the highest version
/// number.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: RwLock<HashMap<String, TypeEntry>>,
}

fn key(resource_type: &str) -> String {
    resource_type.to_lowercase()
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a schema.
    ///
    /// Validation warnings are logged. When the new version breaks the
    /// previous latest without being flagged `breaking`, a warning is logged
    /// and registration still succeeds.
    pub fn register_schema(&self, schema: ResourceSchema) -> RegistryResult<()> {
        let report = validate_schema(&schema);
        if !report.is_valid() {
            return Err(RegistryError::InvalidSchema {
                resource_type: schema.resource_type,
                errors: report.errors,
            });
        }
        for warning in &report.warnings {
            warn!(resource_type = %schema.resource_type, version = %schema.version.version, "{warning}");
        }

        let mut entries = self.entries.write();
        let entry = entries.entry(key(&schema.resource_type)).or_default();
        let version = schema.version.version.clone();
        if entry.versions.contains_key(&version) {
            return Err(RegistryError::DuplicateVersion {
                resource_type: schema.resource_type,
                version,
            });
        }

        if let Some(previous) = entry.latest() {
            let analysis = analyze_schema_changes(previous, &schema);
            if analysis.breaking && !schema.version.breaking {
                warn!(
                    resource_type = %schema.resource_type,
                    from = %previous.version.version,
                    to = %version,
                    issues = ?analysis.compatibility_issues,
                    "schema introduces breaking changes but is not flagged as breaking"
                );
            }
        }

        info!(resource_type = %schema.resource_type, version = %version, fields = schema.fields.len(), "schema registered");
        entry.versions.insert(version.clone(), schema);
        entry.latest = version;
        entry.refresh_dependencies();
        Ok(())
    }

    /// Returns one version of a schema.
    pub fn get_schema(&self, resource_type: &str, version: &str) -> Option<ResourceSchema> {
        self.entries
            .read()
            .get(&key(resource_type))
            .and_then(|entry| entry.versions.get(version))
            .cloned()
    }

    /// Returns the most recently registered version of a schema.
    pub fn get_latest_schema(&self, resource_type: &str) -> Option<ResourceSchema> {
        self.entries
            .read()
            .get(&key(resource_type))
            .and_then(TypeEntry::latest)
            .cloned()
    }

    /// Returns the registered versions of a type in registration order.
    pub fn get_versions(&self, resource_type: &str) -> Vec<String> {
        self.entries
            .read()
            .get(&key(resource_type))
            .map(|entry| entry.versions.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the registered resource types, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        let mut types: Vec<_> = self.entries.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Returns the field dependencies of the latest version of a type.
    pub fn field_dependencies(&self, resource_type: &str) -> BTreeMap<String, Vec<String>> {
        self.entries
            .read()
            .get(&key(resource_type))
            .map(|entry| entry.dependencies.clone())
            .unwrap_or_default()
    }

    /// Returns `true` when moving from `from` to `to` breaks nothing.
    pub fn is_compatible(&self, resource_type: &str, from: &str, to: &str) -> RegistryResult<bool> {
        let entries = self.entries.read();
        let entry = entries
            .get(&key(resource_type))
            .ok_or_else(|| RegistryError::not_found(resource_type, None))?;
        let old = entry
            .versions
            .get(from)
            .ok_or_else(|| RegistryError::not_found(resource_type, Some(from)))?;
        let new = entry
            .versions
            .get(to)
            .ok_or_else(|| RegistryError::not_found(resource_type, Some(to)))?;
        Ok(!analyze_schema_changes(old, new).breaking)
    }

    /// Generates UI descriptors for the latest or a given version.
    pub fn generate_node_properties(
        &self,
        resource_type: &str,
        version: Option<&str>,
        action: Option<&str>,
    ) -> RegistryResult<Vec<NodeProperty>> {
        let schema = self.lookup(resource_type, version)?;
        Ok(generate_node_properties(&schema, action))
    }

    /// Removes one version. Returns `false` if it was not registered.
    ///
    /// Removing the latest version makes the most recently registered
    /// remaining version the latest.
    pub fn unregister_schema(&self, resource_type: &str, version: &str) -> bool {
        let mut entries = self.entries.write();
        let type_key = key(resource_type);
        let Some(entry) = entries.get_mut(&type_key) else {
            return false;
        };
        if entry.versions.shift_remove(version).is_none() {
            return false;
        }

        let remaining_last = entry.versions.keys().last().cloned();
        match remaining_last {
            Some(last) => {
                if entry.latest == version {
                    entry.latest = last;
                }
                entry.refresh_dependencies();
            }
            None => {
                entries.remove(&type_key);
            }
        }
        debug!(resource_type, version, "schema unregistered");
        true
    }

    /// Removes every schema.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Renders a schema as pretty JSON.
    pub fn export_schema(&self, resource_type: &str, version: Option<&str>) -> RegistryResult<String> {
        let schema = self.lookup(resource_type, version)?;
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Parses and registers a schema from JSON.
    pub fn import_schema(&self, json: &str) -> RegistryResult<ResourceSchema> {
        let schema: ResourceSchema = serde_json::from_str(json)?;
        self.register_schema(schema.clone())?;
        Ok(schema)
    }

    fn lookup(&self, resource_type: &str, version: Option<&str>) -> RegistryResult<ResourceSchema> {
        let schema = match version {
            Some(version) => self.get_schema(resource_type, version),
            None => self.get_latest_schema(resource_type),
        };
        schema.ok_or_else(|| RegistryError::not_found(resource_type, version))
    }
}
