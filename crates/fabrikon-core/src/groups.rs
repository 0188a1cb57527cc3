//! Building group allocation: splitting an item's building requirement
//! across one or more clocked batches and keeping them self-consistent.
//!
//! Products and power producers share this logic through the
//! [`GroupedItem`] capability trait; the allocator never touches the
//! concrete item types beyond it.
//!
//! The allocation rules, in order of preference:
//! - With one group ("simple mode"), the group mirrors the aggregate and is
//!   rebalanced automatically on every recompute.
//! - An even rebalance underclocks every group uniformly rather than
//!   running one group at a different clock, which spreads the super-linear
//!   power penalty evenly.
//! - Remainder distribution prefers adding whole buildings near 100% clock
//!   over aggressive overclocking; overclocking consumes power shards,
//!   extra buildings are free.

use std::collections::BTreeMap;

use crate::factory::{BuildingGroup, PowerProducer, Product};
use crate::id::GroupId;
use crate::notify::Notifications;
use crate::round::{
    mod_remainder, round3, round4, CLOCK_EXPONENT, CLOCK_MAX, CLOCK_MIN, GROUP_TOLERANCE,
};

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("an item must keep at least one building group")]
    LastGroup,
    #[error("unknown building group {0:?}")]
    UnknownGroup(GroupId),
    #[error("item has no production rate; cannot derive a building count")]
    ZeroRate,
}

// ---------------------------------------------------------------------------
// GroupedItem capability
// ---------------------------------------------------------------------------

/// What the allocator needs from an item that owns building groups.
pub trait GroupedItem {
    /// Identifier used in notifications.
    fn label(&self) -> &str;
    /// The aggregate building requirement the groups must add up to.
    fn building_target(&self) -> f64;
    fn groups(&self) -> &[BuildingGroup];
    fn groups_mut(&mut self) -> &mut Vec<BuildingGroup>;
    fn alloc_group_id(&mut self) -> GroupId;
    fn sync_enabled(&self) -> bool;
    fn set_sync_enabled(&mut self, enabled: bool);
    fn set_group_problem(&mut self, flag: bool);
}

impl GroupedItem for Product {
    fn label(&self) -> &str {
        &self.part
    }

    fn building_target(&self) -> f64 {
        self.building.as_ref().map_or(0.0, |b| b.count)
    }

    fn groups(&self) -> &[BuildingGroup] {
        &self.groups
    }

    fn groups_mut(&mut self) -> &mut Vec<BuildingGroup> {
        &mut self.groups
    }

    fn alloc_group_id(&mut self) -> GroupId {
        Product::alloc_group_id(self)
    }

    fn sync_enabled(&self) -> bool {
        self.group_sync
    }

    fn set_sync_enabled(&mut self, enabled: bool) {
        self.group_sync = enabled;
    }

    fn set_group_problem(&mut self, flag: bool) {
        self.groups_have_problem = flag;
    }
}

impl GroupedItem for PowerProducer {
    fn label(&self) -> &str {
        &self.recipe
    }

    fn building_target(&self) -> f64 {
        self.buildings
    }

    fn groups(&self) -> &[BuildingGroup] {
        &self.groups
    }

    fn groups_mut(&mut self) -> &mut Vec<BuildingGroup> {
        &mut self.groups
    }

    fn alloc_group_id(&mut self) -> GroupId {
        PowerProducer::alloc_group_id(self)
    }

    fn sync_enabled(&self) -> bool {
        self.group_sync
    }

    fn set_sync_enabled(&mut self, enabled: bool) {
        self.group_sync = enabled;
    }

    fn set_group_problem(&mut self, flag: bool) {
        self.groups_have_problem = flag;
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Summed effective building count across groups, computed fresh on every
/// call — never cached across a group mutation.
pub fn effective_count(groups: &[BuildingGroup]) -> f64 {
    round3(groups.iter().map(BuildingGroup::effective).sum())
}

/// Whether the groups have drifted out of tolerance from the target.
pub fn out_of_tolerance(groups: &[BuildingGroup], target: f64) -> bool {
    (target - effective_count(groups)).abs() > GROUP_TOLERANCE
}

fn clamp_clock(clock: f64, label: &str, notes: &mut Notifications) -> f64 {
    let rounded = round4(clock);
    if rounded < CLOCK_MIN {
        notes.warn(format!(
            "{label}: clock {rounded}% is below {CLOCK_MIN}% and has been raised"
        ));
        CLOCK_MIN
    } else if rounded > CLOCK_MAX {
        notes.warn(format!(
            "{label}: clock {rounded}% exceeds {CLOCK_MAX}% and has been capped"
        ));
        CLOCK_MAX
    } else {
        rounded
    }
}

// ---------------------------------------------------------------------------
// Group lifecycle
// ---------------------------------------------------------------------------

/// Add a building group. The first group absorbs the item's full aggregate
/// requirement via a rebalance; later groups start empty and permanently
/// disable the single-group sync convenience, since multiple groups imply
/// manual control.
pub fn add_group(item: &mut dyn GroupedItem, notes: &mut Notifications) -> GroupId {
    let first = item.groups().is_empty();
    let id = item.alloc_group_id();
    item.groups_mut().push(BuildingGroup::new(id, 0.0));
    if first {
        rebalance(item, notes);
    } else {
        item.set_sync_enabled(false);
        update_problem_flag(item);
    }
    id
}

/// Delete a group. The last group is undeletable. No implicit rebalance is
/// performed: the remaining groups keep their values, which may leave the
/// item out of effective count and flagged.
pub fn delete_group(item: &mut dyn GroupedItem, id: GroupId) -> Result<(), GroupError> {
    if item.groups().len() <= 1 {
        return Err(GroupError::LastGroup);
    }
    let index = item
        .groups()
        .iter()
        .position(|g| g.id == id)
        .ok_or(GroupError::UnknownGroup(id))?;
    item.groups_mut().remove(index);
    update_problem_flag(item);
    Ok(())
}

// ---------------------------------------------------------------------------
// Rebalance
// ---------------------------------------------------------------------------

/// Evenly split the item's aggregate requirement across its groups.
///
/// Whole splits get `target/n` buildings at 100%. Fractional splits give
/// every group `ceil(target/n)` buildings at the uniform underclock that
/// makes `count × clock/100` land exactly on `target/n`.
pub fn rebalance(item: &mut dyn GroupedItem, notes: &mut Notifications) {
    let target = item.building_target();
    let label = item.label().to_string();
    rebalance_groups(item.groups_mut(), target, &label, notes);
    update_problem_flag(item);
}

fn rebalance_groups(
    groups: &mut [BuildingGroup],
    target: f64,
    label: &str,
    notes: &mut Notifications,
) {
    if groups.is_empty() {
        return;
    }
    let n = groups.len() as f64;
    let per_group = target / n;
    if mod_remainder(target, n) == 0.0 {
        // A zero remainder means per_group is whole up to float noise.
        for group in groups.iter_mut() {
            group.count = per_group.round();
            group.clock = 100.0;
        }
    } else {
        let count = per_group.ceil();
        let clock = clamp_clock(per_group / count * 100.0, label, notes);
        for group in groups.iter_mut() {
            group.count = count;
            group.clock = clock;
        }
    }
}

// ---------------------------------------------------------------------------
// Remainder distribution
// ---------------------------------------------------------------------------

/// Point the last group at whatever gap remains between the target and the
/// effective output of every other group.
///
/// A negative gap (overallocation) forces the last group to one building at
/// `(1 + gap) × 100` percent. A positive gap searches building counts
/// `1..=ceil(gap)+1` for the candidate whose clock lands closest to 100%,
/// ties broken toward fewer buildings; candidates above 250% are rejected.
pub fn remainder_to_last(item: &mut dyn GroupedItem, notes: &mut Notifications) {
    let target = item.building_target();
    let label = item.label().to_string();
    remainder_to_last_groups(item.groups_mut(), target, &label, notes);
    update_problem_flag(item);
}

fn remainder_to_last_groups(
    groups: &mut [BuildingGroup],
    target: f64,
    label: &str,
    notes: &mut Notifications,
) {
    let Some((last, rest)) = groups.split_last_mut() else {
        return;
    };
    let allocated: f64 = rest.iter().map(BuildingGroup::effective).sum();
    let gap = round3(target - allocated);

    if gap < 0.0 {
        last.count = 1.0;
        last.clock = clamp_clock((1.0 + gap) * 100.0, label, notes);
    } else if gap == 0.0 {
        last.count = 0.0;
        last.clock = 100.0;
    } else {
        let mut best: Option<(i64, u32)> = None;
        let limit = gap.ceil() as u32 + 1;
        for n in 1..=limit {
            let clock = gap / f64::from(n) * 100.0;
            if clock > CLOCK_MAX {
                continue;
            }
            let score = (clock.ceil() as i64 - 100).abs();
            if best.is_none_or(|(s, _)| score < s) {
                best = Some((score, n));
            }
        }
        if let Some((_, n)) = best {
            last.count = f64::from(n);
            last.clock = clamp_clock(gap / f64::from(n) * 100.0, label, notes);
        }
    }
}

/// Append a fresh group to absorb a shortfall, leaving existing groups
/// untouched. Does nothing when the groups already meet the target.
pub fn remainder_to_new_group(item: &mut dyn GroupedItem, notes: &mut Notifications) {
    let target = item.building_target();
    if effective_count(item.groups()) >= target {
        return;
    }
    let id = item.alloc_group_id();
    item.groups_mut().push(BuildingGroup::new(id, 0.0));
    item.set_sync_enabled(false);
    remainder_to_last(item, notes);
}

// ---------------------------------------------------------------------------
// Reconciliation and part distribution
// ---------------------------------------------------------------------------

fn update_problem_flag(item: &mut dyn GroupedItem) {
    let flag = out_of_tolerance(item.groups(), item.building_target());
    item.set_group_problem(flag);
}

/// Per-recompute reconciliation: re-seed an item that lost all groups,
/// normalize hand-edited clocks, auto-rebalance in simple mode, refresh
/// the problem flag, and redistribute parts and power across groups.
pub fn reconcile(
    item: &mut dyn GroupedItem,
    part_totals: &BTreeMap<String, f64>,
    base_power_mw: f64,
    notes: &mut Notifications,
) {
    if item.groups().is_empty() {
        let id = item.alloc_group_id();
        item.groups_mut().push(BuildingGroup::new(id, 0.0));
    }

    // Hand-edited groups may carry anything; pin clocks into range and
    // counts to display precision before anything reads them.
    let label = item.label().to_string();
    for group in item.groups_mut().iter_mut() {
        group.count = round3(group.count);
        group.clock = clamp_clock(group.clock, &label, notes);
    }

    if item.groups().len() == 1 && item.sync_enabled() {
        rebalance(item, notes);
    } else {
        update_problem_flag(item);
    }
    let total = item.building_target();
    distribute_parts(item.groups_mut(), part_totals, total, base_power_mw);
}

/// Distribute the item's part totals across groups in proportion to each
/// group's effective building share, so overclocked groups correctly carry
/// more. Group power pays the clock curve per building.
pub fn distribute_parts(
    groups: &mut [BuildingGroup],
    part_totals: &BTreeMap<String, f64>,
    total_buildings: f64,
    base_power_mw: f64,
) {
    for group in groups {
        group.parts.clear();
        let share = if total_buildings > 0.0 {
            group.effective() / total_buildings
        } else {
            0.0
        };
        for (part, amount) in part_totals {
            group.parts.insert(part.clone(), round3(amount * share));
        }
        group.power_mw = round3(
            base_power_mw * group.count * (group.clock / 100.0).powf(CLOCK_EXPONENT),
        );
    }
}

/// Everything a product consumes and produces, merged into one map for
/// per-group distribution.
pub fn product_part_totals(product: &Product) -> BTreeMap<String, f64> {
    let mut totals = product.requirements.clone();
    *totals.entry(product.part.clone()).or_insert(0.0) += product.amount;
    for (part, amount) in &product.byproducts {
        *totals.entry(part.clone()).or_insert(0.0) += amount;
    }
    totals
}

/// Producer equivalent of [`product_part_totals`].
pub fn producer_part_totals(producer: &PowerProducer) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for ingredient in &producer.ingredients {
        *totals.entry(ingredient.part.clone()).or_insert(0.0) += ingredient.amount;
    }
    if let Some(byproduct) = &producer.byproduct {
        *totals.entry(byproduct.part.clone()).or_insert(0.0) += byproduct.amount;
    }
    totals
}

// ---------------------------------------------------------------------------
// Reverse (part-driven) edits
// ---------------------------------------------------------------------------

/// Outcome of a part-driven group edit; tells the caller how to fold the
/// change back into the item aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReverseEditOutcome {
    /// Single-group item: set the item amount to this value and re-run a
    /// full recompute, which rebalances the group.
    PropagateAmount(f64),
    /// Multi-group item: only the edited group changed; the item amount is
    /// the new summed effective output.
    Recomputed(f64),
}

/// Edit a group's output of the item's primary part directly ("make this
/// group produce exactly 45"). Inverts the recipe ratio to solve for the
/// building count at the group's current clock.
///
/// `per_building_per_min` is the primary output rate of one building at
/// 100% clock.
pub fn set_group_part_amount(
    item: &mut dyn GroupedItem,
    group: GroupId,
    per_building_per_min: f64,
    desired: f64,
    notes: &mut Notifications,
) -> Result<ReverseEditOutcome, GroupError> {
    if per_building_per_min <= 0.0 || !per_building_per_min.is_finite() {
        return Err(GroupError::ZeroRate);
    }
    let label = item.label().to_string();
    let groups = item.groups_mut();
    let index = groups
        .iter()
        .position(|g| g.id == group)
        .ok_or(GroupError::UnknownGroup(group))?;

    let mut desired = desired;
    if !desired.is_finite() || desired < 0.0 {
        notes.warn(format!(
            "{label}: group amount was invalid and has been set to 0"
        ));
        desired = 0.0;
    }

    let edited = &mut groups[index];
    let count = desired / (per_building_per_min * edited.clock / 100.0);
    edited.count = round3(count);

    if groups.len() == 1 {
        Ok(ReverseEditOutcome::PropagateAmount(round3(desired)))
    } else {
        let amount = round3(effective_count(groups) * per_building_per_min);
        update_problem_flag(item);
        Ok(ReverseEditOutcome::Recomputed(amount))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
