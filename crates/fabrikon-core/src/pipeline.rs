//! The settle pipeline: the one entry point that brings a whole plan to a
//! consistent state.
//!
//! # Two-pass contract
//!
//! Each call to [`settle`] runs:
//!
//! 1. **Solve all** — every factory: production solver, building/power
//!    aggregation, part ledger rebuild.
//! 2. **Resolve dependencies** — validate and prune input links, record
//!    requests on suppliers, score satisfaction against pass-1 supply.
//! 3. **Solve all again** — export demand and the pruned link set are now
//!    known; ledgers and aggregates are rebuilt from scratch.
//! 4. **Refresh dependencies** — metrics now reflect the final supply.
//! 5. **Reconcile building groups** — simple-mode items rebalance, manual
//!    items get their problem flags refreshed, parts and power are
//!    redistributed across groups.
//! 6. **Final flags** — per-factory problem flag and sync check.
//!
//! The double pass exists because dependency satisfiability depends on
//! supply, which depends on aggregated parts, which can depend on inputs
//! removed only after the first satisfiability check. Order is
//! deterministic (full list, insertion order) and the whole pipeline is
//! idempotent: settling a settled plan is a no-op.

use crate::aggregate::aggregate_factory;
use crate::catalogue::GameCatalogue;
use crate::dependency::{resolve_dependencies, PrunedLink};
use crate::factory::{Factory, Plan};
use crate::groups::{
    self, producer_part_totals, product_part_totals, GroupError, ReverseEditOutcome,
};
use crate::id::{FactoryId, GroupId};
use crate::notify::{Notification, Notifications};
use crate::part::build_part_ledger;
use crate::solver::solve_factory;
use crate::sync::check_sync;

/// Everything a settle surfaced to the user: clamp warnings, clock
/// truncations, and the links removed during validation.
#[derive(Debug, Default)]
pub struct SettleReport {
    pub notifications: Vec<Notification>,
    pub pruned_links: Vec<PrunedLink>,
}

/// Solve, aggregate, and rebuild the ledger for one factory.
pub fn calculate_factory(
    factory: &mut Factory,
    catalogue: &GameCatalogue,
    notes: &mut Notifications,
) {
    solve_factory(factory, catalogue, notes);
    aggregate_factory(factory, catalogue, notes);
    build_part_ledger(factory, catalogue);
}

/// Bring the whole plan to a settled state. See the module docs for the
/// phase list.
pub fn settle(plan: &mut Plan, catalogue: &GameCatalogue) -> SettleReport {
    let mut notes = Notifications::new();
    let ids = plan.ids();

    tracing::debug!(factories = ids.len(), "settle: first solve pass");
    for &id in &ids {
        calculate_factory(&mut plan.factories[id], catalogue, &mut notes);
    }

    tracing::debug!("settle: dependency resolution");
    let mut pruned_links = resolve_dependencies(plan);

    tracing::debug!("settle: second solve pass");
    for &id in &ids {
        calculate_factory(&mut plan.factories[id], catalogue, &mut notes);
    }

    tracing::debug!("settle: dependency refresh");
    pruned_links.extend(resolve_dependencies(plan));

    tracing::debug!("settle: group reconciliation");
    for &id in &ids {
        reconcile_factory_groups(&mut plan.factories[id], catalogue, &mut notes);
    }

    for &id in &ids {
        let factory = &mut plan.factories[id];
        factory.has_problem = factory_has_problem(factory);
        check_sync(factory);
    }

    if !pruned_links.is_empty() {
        notes.warn(format!(
            "{} invalid input link(s) were removed during validation",
            pruned_links.len()
        ));
    }

    SettleReport {
        notifications: notes.drain(),
        pruned_links,
    }
}

fn reconcile_factory_groups(
    factory: &mut Factory,
    catalogue: &GameCatalogue,
    notes: &mut Notifications,
) {
    for product in &mut factory.products {
        let base_power = product
            .building
            .as_ref()
            .and_then(|b| catalogue.building_power(&b.building).ok())
            .unwrap_or(0.0);
        let totals = product_part_totals(product);
        groups::reconcile(product, &totals, base_power, notes);
    }
    for producer in &mut factory.power_producers {
        // Producer groups report the power they generate, which follows
        // the same clock curve as consumption.
        let base_power = catalogue
            .power_recipe(&producer.recipe)
            .map(|r| r.rated_power())
            .unwrap_or(0.0);
        let totals = producer_part_totals(producer);
        groups::reconcile(producer, &totals, base_power, notes);
    }
}

fn factory_has_problem(factory: &Factory) -> bool {
    factory.parts.values().any(|metrics| !metrics.satisfied)
        || factory.products.iter().any(|p| p.groups_have_problem)
        || factory
            .power_producers
            .iter()
            .any(|p| p.groups_have_problem)
        || factory
            .dependencies
            .metrics
            .values()
            .any(|metrics| !metrics.satisfied)
}

/// Edit one building group's output of a product's primary part directly.
///
/// This is the one partial, group-level recompute in the engine; it brings
/// the owning factory back to a consistent state, but cross-factory
/// dependency numbers are only trustworthy after the next full [`settle`].
pub fn edit_product_group_amount(
    factory: &mut Factory,
    part: &str,
    group: GroupId,
    desired: f64,
    catalogue: &GameCatalogue,
    notes: &mut Notifications,
) -> Result<(), EditError> {
    let product = factory
        .product_mut(part)
        .ok_or_else(|| EditError::UnknownProduct(part.to_string()))?;
    let recipe_id = product
        .recipe
        .clone()
        .ok_or_else(|| EditError::NoRecipe(part.to_string()))?;
    let recipe = catalogue
        .recipe(&recipe_id)
        .ok_or(EditError::NoRecipe(recipe_id))?;
    let per_building = recipe.primary().per_min;

    let outcome = groups::set_group_part_amount(product, group, per_building, desired, notes)?;
    match outcome {
        ReverseEditOutcome::PropagateAmount(amount) | ReverseEditOutcome::Recomputed(amount) => {
            let product = factory
                .product_mut(part)
                .ok_or_else(|| EditError::UnknownProduct(part.to_string()))?;
            product.amount = amount;
        }
    }
    calculate_factory(factory, catalogue, notes);
    reconcile_factory_groups(factory, catalogue, notes);
    factory.has_problem = factory_has_problem(factory);
    Ok(())
}

/// Hard errors from group-level edit operations.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("factory not found in plan")]
    UnknownFactory,
    #[error("factory has no product '{0}'")]
    UnknownProduct(String),
    #[error("product '{0}' has no usable recipe")]
    NoRecipe(String),
    #[error(transparent)]
    Group(#[from] GroupError),
}

/// Convenience: forward a `FactoryId`-addressed edit to the factory.
pub fn edit_group_amount_in_plan(
    plan: &mut Plan,
    factory: FactoryId,
    part: &str,
    group: GroupId,
    desired: f64,
    catalogue: &GameCatalogue,
    notes: &mut Notifications,
) -> Result<(), EditError> {
    let target = plan.factory_mut(factory).ok_or(EditError::UnknownFactory)?;
    edit_product_group_amount(target, part, group, desired, catalogue, notes)
}
