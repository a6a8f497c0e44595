//! Process-wide cache of exportable field sets, keyed by entity type.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, RwLock};

use crate::entity::Entity;
use crate::error::{MarshalError, MarshalResult};
use crate::field::FieldDef;

/// Exportable (non read-only) field names of one entity type, in declaration
/// order.
pub type ExportableFields = Arc<[&'static str]>;

/// Registry of per-type exportable field sets.
///
/// Entries are computed on first request from the entity's static field table
/// and never change afterwards. Concurrent first requests may compute the same
/// entry twice; the first write wins and both callers observe equal sets.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    exportable: RwLock<HashMap<TypeId, ExportableFields>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by [`Entity::encode_value`].
    pub fn global() -> &'static MetadataRegistry {
        static GLOBAL: OnceLock<MetadataRegistry> = OnceLock::new();
        GLOBAL.get_or_init(MetadataRegistry::new)
    }

    /// Exportable field names of `E`, cached after the first call.
    pub fn exportable_fields<E: Entity>(&self) -> ExportableFields {
        let type_id = TypeId::of::<E>();

        if let Ok(map) = self.exportable.read() {
            if let Some(fields) = map.get(&type_id) {
                return Arc::clone(fields);
            }
        }

        let computed: ExportableFields = E::FIELDS
            .iter()
            .filter(|def| !def.read_only)
            .map(|def| def.name)
            .collect();

        tracing::debug!(
            entity = E::TYPE_NAME,
            declared = E::FIELDS.len(),
            exportable = computed.len(),
            "caching exportable field set"
        );

        match self.exportable.write() {
            Ok(mut map) => Arc::clone(map.entry(type_id).or_insert(computed)),
            // A poisoned cache still yields a correct answer, just uncached.
            Err(_) => computed,
        }
    }

    /// Validate `E`'s field table.
    ///
    /// Empty or duplicate JSON keys make lookups ambiguous and are reported as
    /// configuration errors.
    pub fn check<E: Entity>(&self) -> MarshalResult<()> {
        check_fields(E::TYPE_NAME, E::FIELDS)
    }

    pub fn is_cached<E: Entity>(&self) -> bool {
        self.exportable
            .read()
            .map(|map| map.contains_key(&TypeId::of::<E>()))
            .unwrap_or(false)
    }

    /// Number of entity types with a cached entry.
    pub fn len(&self) -> usize {
        self.exportable.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_fields(type_name: &str, fields: &[FieldDef]) -> MarshalResult<()> {
    let mut seen = HashSet::with_capacity(fields.len());
    for def in fields {
        if def.name.is_empty() {
            return Err(MarshalError::configuration(format!(
                "{type_name} declares a field with an empty key"
            )));
        }
        if !seen.insert(def.name) {
            return Err(MarshalError::configuration(format!(
                "{type_name} declares key '{}' more than once",
                def.name
            )));
        }
    }
    Ok(())
}
