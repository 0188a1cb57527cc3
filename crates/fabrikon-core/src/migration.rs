//! Plan format migration: backfills fields added to the factory record
//! since an older plan was serialized.
//!
//! Each factory carries a `data_version` marker. On load, the stored JSON
//! is stepped through the registered migration functions one version at a
//! time before deserialization, so re-loading older plans triggers a
//! one-time backfill. Migrating a current-version plan is a no-op.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::factory::CURRENT_DATA_VERSION;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("no migration path from version {from} to version {to}")]
    NoMigrationPath { from: u32, to: u32 },
    #[error("factory record is not a JSON object")]
    NotAnObject,
    #[error("migration from version {from} failed: {reason}")]
    StepFailed { from: u32, reason: String },
}

/// A function that transforms a factory JSON object from one version to
/// the next.
pub type MigrationFn = fn(&mut serde_json::Map<String, Value>) -> Result<(), MigrationError>;

/// Registry of migration steps keyed by source version. Each registered
/// function migrates `version N` to `version N + 1`; the registry chains
/// them to cross multiple versions.
pub struct PlanMigrator {
    steps: BTreeMap<u32, MigrationFn>,
}

impl PlanMigrator {
    pub fn new() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// Register a migration from `from_version` to `from_version + 1`.
    pub fn register(&mut self, from_version: u32, step: MigrationFn) {
        self.steps.insert(from_version, step);
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Whether a complete path exists from `from` to `to`.
    pub fn can_migrate(&self, from: u32, to: u32) -> bool {
        if from >= to {
            return from == to;
        }
        (from..to).all(|v| self.steps.contains_key(&v))
    }

    /// Migrate one factory record in place up to `CURRENT_DATA_VERSION`,
    /// reading the starting point from its `data_version` field (absent
    /// means version 0). Returns the version reached.
    pub fn migrate_factory(&self, value: &mut Value) -> Result<u32, MigrationError> {
        let object = value.as_object_mut().ok_or(MigrationError::NotAnObject)?;
        let from = object
            .get("data_version")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        let to = CURRENT_DATA_VERSION;
        if from == to {
            return Ok(to);
        }
        if from > to || !self.can_migrate(from, to) {
            return Err(MigrationError::NoMigrationPath { from, to });
        }
        for version in from..to {
            let step = self.steps[&version];
            step(object)?;
        }
        object.insert("data_version".into(), Value::from(to));
        Ok(to)
    }

    /// Migrate every factory in a serialized plan (the `factories` slotmap
    /// payload as produced by serde).
    pub fn migrate_plan(&self, plan: &mut Value) -> Result<(), MigrationError> {
        // slotmap serializes as an array of slots with vacancy markers;
        // only occupied slots hold a factory object under "value".
        let Some(slots) = plan
            .pointer_mut("/factories")
            .and_then(Value::as_array_mut)
        else {
            return Ok(());
        };
        for slot in slots {
            if let Some(value) = slot.pointer_mut("/value")
                && value.is_object()
            {
                self.migrate_factory(value)?;
            }
        }
        Ok(())
    }
}

impl Default for PlanMigrator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Built-in steps
// ---------------------------------------------------------------------------

/// The standard migrator carrying every step shipped so far.
pub fn standard_migrator() -> PlanMigrator {
    let mut migrator = PlanMigrator::new();
    migrator.register(0, migrate_v0_group_fields);
    migrator.register(1, migrate_v1_dependencies);
    migrator.register(2, migrate_v2_sync_state);
    migrator
}

/// v0 → v1: products and producers gained building groups and the
/// per-item flags around them. Groups are left empty; the next settle
/// reseeds one group per item from the aggregate.
fn migrate_v0_group_fields(
    factory: &mut serde_json::Map<String, Value>,
) -> Result<(), MigrationError> {
    for key in ["products", "power_producers"] {
        if let Some(items) = factory.get_mut(key).and_then(Value::as_array_mut) {
            for item in items {
                if let Some(object) = item.as_object_mut() {
                    object.entry("groups").or_insert_with(|| Value::Array(vec![]));
                    object.entry("next_group_id").or_insert(Value::from(0));
                    object.entry("group_sync").or_insert(Value::Bool(true));
                    object
                        .entry("groups_have_problem")
                        .or_insert(Value::Bool(false));
                }
            }
        }
    }
    Ok(())
}

/// v1 → v2: factories gained the dependency request/metric maps.
fn migrate_v1_dependencies(
    factory: &mut serde_json::Map<String, Value>,
) -> Result<(), MigrationError> {
    factory.entry("dependencies").or_insert_with(|| {
        serde_json::json!({
            "requests": [],
            "metrics": {},
        })
    });
    Ok(())
}

/// v2 → v3: factories gained sync tracking (`sync`, `in_sync`).
fn migrate_v2_sync_state(
    factory: &mut serde_json::Map<String, Value>,
) -> Result<(), MigrationError> {
    factory.entry("sync").or_insert(Value::Null);
    factory.entry("in_sync").or_insert(Value::Null);
    Ok(())
}
