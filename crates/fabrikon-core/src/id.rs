use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a factory within a plan. Input links between factories
    /// carry this key, never a direct reference, so factories can refer to
    /// each other without ownership cycles.
    pub struct FactoryId;
}

/// Identifies a building group within a product or power producer.
/// Allocated from a per-item counter; unique within its parent item only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);
