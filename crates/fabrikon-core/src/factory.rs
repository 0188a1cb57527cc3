//! Plan data model: factories, products, power producers, building groups,
//! and the cross-factory input links between them.
//!
//! All entities are owned by their [`Factory`]; factories are owned by the
//! [`Plan`]. Cross-factory references are by [`FactoryId`] only, never by
//! direct reference. Everything here is a plain serializable record — the
//! persistence boundary hands a `Plan` in, the engine mutates it in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::id::{FactoryId, GroupId};
use crate::part::PartMetrics;
use crate::power::ProducerDrive;
use crate::sync::SyncSnapshot;

/// Serialization format version for factory records. Bumped whenever a
/// migration step is added in [`crate::migration`].
pub const CURRENT_DATA_VERSION: u32 = 3;

// ---------------------------------------------------------------------------
// Building groups
// ---------------------------------------------------------------------------

/// A batch of identical buildings sharing one overclock percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingGroup {
    pub id: GroupId,
    /// Number of buildings in the batch. Generally whole; fractional values
    /// can appear transiently before a rebalance.
    pub count: f64,
    /// Overclock percentage, 1–250, at most 4 fractional digits.
    pub clock: f64,
    /// This group's share of every part the item consumes or produces.
    pub parts: BTreeMap<String, f64>,
    /// Power drawn (or produced) by this group in megawatts.
    pub power_mw: f64,
}

impl BuildingGroup {
    pub fn new(id: GroupId, count: f64) -> Self {
        Self {
            id,
            count,
            clock: 100.0,
            parts: BTreeMap::new(),
            power_mw: 0.0,
        }
    }

    /// Buildings-worth of throughput this group contributes:
    /// `count × clock / 100`.
    pub fn effective(&self) -> f64 {
        self.count * self.clock / 100.0
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// The building demand derived for one product or power producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRequirement {
    pub building: String,
    pub count: f64,
    pub power_mw: f64,
}

/// A chosen output of a factory: a part, an optional recipe, and a
/// requested per-minute amount, with everything else derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub part: String,
    /// Recipe id in the catalogue. A product without a recipe is inert.
    pub recipe: Option<String>,
    /// Requested units per minute. Always > 0; the solver clamps.
    pub amount: f64,

    /// Derived ingredient demand, part → units/min.
    pub requirements: BTreeMap<String, f64>,
    /// Derived secondary outputs, part → units/min.
    pub byproducts: BTreeMap<String, f64>,
    /// Derived building demand.
    pub building: Option<BuildingRequirement>,

    pub groups: Vec<BuildingGroup>,
    /// While a single group exists, edits to it mirror onto the aggregate.
    /// Adding a second group turns this off.
    pub group_sync: bool,
    pub groups_have_problem: bool,
    pub(crate) next_group_id: u32,
}

impl Product {
    pub fn new(part: impl Into<String>, recipe: Option<&str>, amount: f64) -> Self {
        let mut product = Self {
            part: part.into(),
            recipe: recipe.map(str::to_string),
            amount,
            requirements: BTreeMap::new(),
            byproducts: BTreeMap::new(),
            building: None,
            groups: Vec::new(),
            group_sync: true,
            groups_have_problem: false,
            next_group_id: 0,
        };
        let id = product.alloc_group_id();
        product.groups.push(BuildingGroup::new(id, 0.0));
        product
    }

    pub(crate) fn alloc_group_id(&mut self) -> GroupId {
        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Power producers
// ---------------------------------------------------------------------------

/// One derived ingredient demand of a power producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerIngredient {
    pub part: String,
    pub amount: f64,
}

/// One derived byproduct output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Byproduct {
    pub part: String,
    pub amount: f64,
}

/// A power-generating entry in a factory. One of `buildings`, `power_mw`,
/// `fuel_rate`, or `supplemental_rate` is the source of truth at any time,
/// tagged by `drive`; the other three are re-derived on recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerProducer {
    /// Power recipe id in the catalogue.
    pub recipe: String,
    /// Generator building id, mirrored from the recipe.
    pub building: String,

    pub buildings: f64,
    pub power_mw: f64,
    pub fuel_rate: f64,
    pub supplemental_rate: f64,
    /// Which of the four quantities was last edited.
    pub drive: ProducerDrive,

    /// Derived ingredient demand (fuel plus optional supplemental).
    pub ingredients: Vec<ProducerIngredient>,
    /// Derived byproduct output, if the recipe has one.
    pub byproduct: Option<Byproduct>,

    pub groups: Vec<BuildingGroup>,
    pub group_sync: bool,
    pub groups_have_problem: bool,
    pub(crate) next_group_id: u32,
}

impl PowerProducer {
    pub fn new(recipe: impl Into<String>, building: impl Into<String>, buildings: f64) -> Self {
        let mut producer = Self {
            recipe: recipe.into(),
            building: building.into(),
            buildings,
            power_mw: 0.0,
            fuel_rate: 0.0,
            supplemental_rate: 0.0,
            drive: ProducerDrive::Buildings,
            ingredients: Vec::new(),
            byproduct: None,
            groups: Vec::new(),
            group_sync: true,
            groups_have_problem: false,
            next_group_id: 0,
        };
        let id = producer.alloc_group_id();
        producer.groups.push(BuildingGroup::new(id, 0.0));
        producer
    }

    pub(crate) fn alloc_group_id(&mut self) -> GroupId {
        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Cross-factory links and dependency state
// ---------------------------------------------------------------------------

/// A directed declaration that `source` supplies `amount`/min of `part` to
/// the factory owning this link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputLink {
    pub source: FactoryId,
    pub part: String,
    pub amount: f64,
}

/// One part request carried by an input link, as seen from the supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRequest {
    pub part: String,
    pub amount: f64,
}

/// All requests one consuming factory places on this factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryRequests {
    pub from: FactoryId,
    pub requests: Vec<DependencyRequest>,
}

/// Supply/demand verdict for one requested part on the supplying factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyMetrics {
    pub requested: f64,
    pub supplied: f64,
    pub satisfied: bool,
    /// `supplied - requested`; negative is a shortfall.
    pub difference: f64,
}

/// Dependency bookkeeping recorded on each supplying factory by the
/// resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyState {
    pub requests: Vec<FactoryRequests>,
    pub metrics: BTreeMap<String, DependencyMetrics>,
}

impl DependencyState {
    pub fn clear(&mut self) {
        self.requests.clear();
        self.metrics.clear();
    }

    pub fn requests_from(&self, from: FactoryId) -> Option<&FactoryRequests> {
        self.requests.iter().find(|r| r.from == from)
    }
}

// ---------------------------------------------------------------------------
// Factory and plan
// ---------------------------------------------------------------------------

/// Aggregated per-building-type totals for one factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingTotals {
    pub count: f64,
    pub power_mw: f64,
}

/// Factory-wide power balance in megawatts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerSummary {
    pub consumed: f64,
    pub produced: f64,
    /// `produced - consumed`.
    pub difference: f64,
}

/// One factory in a plan: its chosen outputs, generators, links to other
/// factories, and every quantity derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factory {
    pub name: String,
    pub products: Vec<Product>,
    pub power_producers: Vec<PowerProducer>,

    /// Merged byproduct output across all products, part → units/min.
    pub byproducts: BTreeMap<String, f64>,
    /// The part ledger, rebuilt on every calculation pass.
    pub parts: BTreeMap<String, PartMetrics>,
    /// Aggregated building demand by building type.
    pub buildings: BTreeMap<String, BuildingTotals>,
    pub power: PowerSummary,

    pub inputs: Vec<InputLink>,
    pub dependencies: DependencyState,

    /// Baseline for external-edit detection; `None` until a snapshot is
    /// taken.
    pub sync: Option<SyncSnapshot>,
    /// `None` = sync tracking never opted into; the checker never promotes
    /// it to a boolean on its own.
    pub in_sync: Option<bool>,

    pub has_problem: bool,
    pub data_version: u32,
}

impl Factory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            products: Vec::new(),
            power_producers: Vec::new(),
            byproducts: BTreeMap::new(),
            parts: BTreeMap::new(),
            buildings: BTreeMap::new(),
            power: PowerSummary::default(),
            inputs: Vec::new(),
            dependencies: DependencyState::default(),
            sync: None,
            in_sync: None,
            has_problem: false,
            data_version: CURRENT_DATA_VERSION,
        }
    }

    pub fn add_product(&mut self, part: &str, recipe: Option<&str>, amount: f64) -> &mut Product {
        self.products.push(Product::new(part, recipe, amount));
        self.products.last_mut().expect("just pushed")
    }

    pub fn add_power_producer(
        &mut self,
        recipe: &str,
        building: &str,
        buildings: f64,
    ) -> &mut PowerProducer {
        self.power_producers
            .push(PowerProducer::new(recipe, building, buildings));
        self.power_producers.last_mut().expect("just pushed")
    }

    pub fn product(&self, part: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.part == part)
    }

    pub fn product_mut(&mut self, part: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.part == part)
    }

    /// Add or update the input link for `(source, part)`. At most one link
    /// per pair exists; a second call replaces the amount.
    pub fn set_input(&mut self, source: FactoryId, part: &str, amount: f64) {
        if let Some(existing) = self
            .inputs
            .iter_mut()
            .find(|link| link.source == source && link.part == part)
        {
            existing.amount = amount;
        } else {
            self.inputs.push(InputLink {
                source,
                part: part.to_string(),
                amount,
            });
        }
    }

    pub fn remove_input(&mut self, source: FactoryId, part: &str) {
        self.inputs
            .retain(|link| !(link.source == source && link.part == part));
    }
}

/// The top-level collection of factories. Keys are stable across removal of
/// other factories, so input links stay valid until their target is
/// actually deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub factories: SlotMap<FactoryId, Factory>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_factory(&mut self, factory: Factory) -> FactoryId {
        self.factories.insert(factory)
    }

    pub fn remove_factory(&mut self, id: FactoryId) -> Option<Factory> {
        self.factories.remove(id)
    }

    pub fn factory(&self, id: FactoryId) -> Option<&Factory> {
        self.factories.get(id)
    }

    pub fn factory_mut(&mut self, id: FactoryId) -> Option<&mut Factory> {
        self.factories.get_mut(id)
    }

    /// Factory ids in deterministic iteration order.
    pub fn ids(&self) -> Vec<FactoryId> {
        self.factories.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_seeds_one_group() {
        let product = Product::new("iron_ingot", Some("iron_ingot"), 30.0);
        assert_eq!(product.groups.len(), 1);
        assert_eq!(product.groups[0].count, 0.0);
        assert_eq!(product.groups[0].clock, 100.0);
        assert!(product.group_sync);
    }

    #[test]
    fn group_ids_are_unique_per_item() {
        let mut product = Product::new("iron_ingot", None, 1.0);
        let a = product.alloc_group_id();
        let b = product.alloc_group_id();
        assert_ne!(a, b);
        assert_ne!(product.groups[0].id, a);
    }

    #[test]
    fn effective_count_scales_with_clock() {
        let mut group = BuildingGroup::new(GroupId(0), 3.0);
        group.clock = 83.3333;
        assert!((group.effective() - 2.499999).abs() < 1e-4);
    }

    #[test]
    fn set_input_enforces_one_link_per_source_part() {
        let mut plan = Plan::new();
        let source = plan.add_factory(Factory::new("Source"));
        let mut factory = Factory::new("Sink");
        factory.set_input(source, "iron_ingot", 100.0);
        factory.set_input(source, "iron_ingot", 250.0);
        assert_eq!(factory.inputs.len(), 1);
        assert_eq!(factory.inputs[0].amount, 250.0);

        factory.set_input(source, "iron_plate", 10.0);
        assert_eq!(factory.inputs.len(), 2);

        factory.remove_input(source, "iron_ingot");
        assert_eq!(factory.inputs.len(), 1);
        assert_eq!(factory.inputs[0].part, "iron_plate");
    }

    #[test]
    fn plan_keys_stay_valid_after_removal() {
        let mut plan = Plan::new();
        let a = plan.add_factory(Factory::new("A"));
        let b = plan.add_factory(Factory::new("B"));
        plan.remove_factory(a);
        assert!(plan.factory(a).is_none());
        assert!(plan.factory(b).is_some());
    }

    #[test]
    fn factory_serde_round_trip() {
        let mut factory = Factory::new("Round Trip");
        factory.add_product("iron_ingot", Some("iron_ingot"), 30.0);
        factory.add_power_producer("coal_power", "coal_generator", 2.0);
        let json = serde_json::to_string(&factory).unwrap();
        let back: Factory = serde_json::from_str(&json).unwrap();
        assert_eq!(factory, back);
    }
}
