//! The part ledger: per-part demand/supply metrics for one factory.
//!
//! Rebuilt from scratch on every calculation pass; nothing in the ledger is
//! incrementally patched, which keeps repeated recomputation idempotent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalogue::GameCatalogue;
use crate::factory::Factory;
use crate::round::round3;

/// Demand/supply record for one part in one factory.
///
/// Invariants after [`build_part_ledger`]:
/// - `required_total = required_production + required_export + required_power`
/// - `supplied_total = supplied_via_input + supplied_via_raw + supplied_via_production`
/// - `remaining = supplied_total - required_total`
/// - `satisfied ⇔ is_raw ∨ remaining ≥ 0`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartMetrics {
    pub required_production: f64,
    pub required_export: f64,
    pub required_power: f64,
    pub required_total: f64,

    pub supplied_via_input: f64,
    pub supplied_via_raw: f64,
    pub supplied_via_production: f64,
    pub supplied_total: f64,

    /// Signed surplus: positive means over-supplied.
    pub remaining: f64,

    pub is_raw: bool,
    pub satisfied: bool,
    pub exportable: bool,
}

/// Rebuild `factory.parts` from the factory's current products, power
/// producers, input links, and recorded export requests.
pub fn build_part_ledger(factory: &mut Factory, catalogue: &GameCatalogue) {
    let mut parts: BTreeMap<String, PartMetrics> = BTreeMap::new();

    for product in &factory.products {
        // Inert or unresolvable products contribute nothing; the solver
        // already skipped them.
        let Some(recipe_id) = &product.recipe else {
            continue;
        };
        if catalogue.recipe(recipe_id).is_none() {
            continue;
        }
        for (part, amount) in &product.requirements {
            parts.entry(part.clone()).or_default().required_production += amount;
        }
        parts
            .entry(product.part.clone())
            .or_default()
            .supplied_via_production += product.amount;
        for (part, amount) in &product.byproducts {
            parts.entry(part.clone()).or_default().supplied_via_production += amount;
        }
    }

    for producer in &factory.power_producers {
        for ingredient in &producer.ingredients {
            parts
                .entry(ingredient.part.clone())
                .or_default()
                .required_power += ingredient.amount;
        }
        if let Some(byproduct) = &producer.byproduct {
            parts
                .entry(byproduct.part.clone())
                .or_default()
                .supplied_via_production += byproduct.amount;
        }
    }

    for input in &factory.inputs {
        parts
            .entry(input.part.clone())
            .or_default()
            .supplied_via_input += input.amount;
    }

    // Export demand recorded on this factory by the dependency resolver.
    // Empty until the first resolver pass has run; that gap is exactly why
    // the settle pipeline is two-pass.
    for request_set in &factory.dependencies.requests {
        for request in &request_set.requests {
            parts
                .entry(request.part.clone())
                .or_default()
                .required_export += request.amount;
        }
    }

    for (id, metrics) in parts.iter_mut() {
        metrics.is_raw = catalogue.is_raw(id);
        metrics.required_production = round3(metrics.required_production);
        metrics.required_export = round3(metrics.required_export);
        metrics.required_power = round3(metrics.required_power);
        metrics.required_total = round3(
            metrics.required_production + metrics.required_export + metrics.required_power,
        );

        if metrics.is_raw {
            // Raw parts cover whatever demand the other supply channels
            // leave open; they can never run a deficit.
            let open = metrics.required_total
                - metrics.supplied_via_input
                - metrics.supplied_via_production;
            metrics.supplied_via_raw = round3(open.max(0.0));
        }
        metrics.supplied_via_input = round3(metrics.supplied_via_input);
        metrics.supplied_via_production = round3(metrics.supplied_via_production);
        metrics.supplied_total = round3(
            metrics.supplied_via_input + metrics.supplied_via_raw + metrics.supplied_via_production,
        );

        metrics.remaining = round3(metrics.supplied_total - metrics.required_total);
        metrics.satisfied = metrics.is_raw || metrics.remaining >= 0.0;
        metrics.exportable = metrics.supplied_via_production > 0.0;
    }

    factory.parts = parts;
}

/// The surplus of a part this factory could ship to other factories:
/// production-side supply minus internal production and power demand,
/// floored at zero. Imported amounts are never re-exported.
pub fn exportable_surplus(factory: &Factory, part: &str) -> f64 {
    factory.parts.get(part).map_or(0.0, |metrics| {
        round3(
            (metrics.supplied_via_production
                - metrics.required_production
                - metrics.required_power)
                .max(0.0),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Factory;
    use crate::test_utils::fixture_catalogue;

    fn ledger_factory() -> Factory {
        let mut factory = Factory::new("Smelting");
        factory.add_product("iron_ingot", Some("iron_ingot"), 30.0);
        factory
    }

    #[test]
    fn single_product_conservation() {
        let catalogue = fixture_catalogue();
        let mut factory = ledger_factory();
        crate::solver::solve_factory(&mut factory, &catalogue, &mut Default::default());
        build_part_ledger(&mut factory, &catalogue);

        let ingot = &factory.parts["iron_ingot"];
        assert_eq!(ingot.supplied_via_production, 30.0);
        assert_eq!(ingot.required_total, 0.0);
        assert_eq!(ingot.remaining, 30.0);
        assert!(ingot.satisfied);
        assert!(ingot.exportable);

        let ore = &factory.parts["iron_ore"];
        assert!(ore.is_raw);
        assert_eq!(ore.required_production, 30.0);
        assert_eq!(ore.supplied_via_raw, 30.0);
        assert_eq!(ore.remaining, 0.0);
        assert!(ore.satisfied);
        assert!(!ore.exportable);
    }

    #[test]
    fn unsatisfied_intermediate_shows_deficit() {
        let catalogue = fixture_catalogue();
        let mut factory = Factory::new("Plates");
        // Plates need ingots, which nothing here produces or imports.
        factory.add_product("iron_plate", Some("iron_plate"), 20.0);
        crate::solver::solve_factory(&mut factory, &catalogue, &mut Default::default());
        build_part_ledger(&mut factory, &catalogue);

        let ingot = &factory.parts["iron_ingot"];
        assert!(!ingot.is_raw);
        assert_eq!(ingot.required_production, 30.0);
        assert_eq!(ingot.remaining, -30.0);
        assert!(!ingot.satisfied);
    }

    #[test]
    fn imports_count_as_supply_but_not_export_surplus() {
        let catalogue = fixture_catalogue();
        let mut factory = Factory::new("Plates");
        factory.add_product("iron_plate", Some("iron_plate"), 20.0);
        factory.set_input(crate::id::FactoryId::default(), "iron_ingot", 30.0);
        crate::solver::solve_factory(&mut factory, &catalogue, &mut Default::default());
        build_part_ledger(&mut factory, &catalogue);

        let ingot = &factory.parts["iron_ingot"];
        assert_eq!(ingot.supplied_via_input, 30.0);
        assert_eq!(ingot.remaining, 0.0);
        assert!(ingot.satisfied);
        // Imported ingots are not available for re-export.
        assert_eq!(exportable_surplus(&factory, "iron_ingot"), 0.0);
    }

    #[test]
    fn export_requests_create_demand() {
        let catalogue = fixture_catalogue();
        let mut factory = ledger_factory();
        factory.dependencies.requests.push(crate::factory::FactoryRequests {
            from: crate::id::FactoryId::default(),
            requests: vec![crate::factory::DependencyRequest {
                part: "iron_ingot".into(),
                amount: 50.0,
            }],
        });
        crate::solver::solve_factory(&mut factory, &catalogue, &mut Default::default());
        build_part_ledger(&mut factory, &catalogue);

        let ingot = &factory.parts["iron_ingot"];
        assert_eq!(ingot.required_export, 50.0);
        assert_eq!(ingot.remaining, -20.0);
        assert!(!ingot.satisfied);
        // Surplus for export ignores the export demand itself.
        assert_eq!(exportable_surplus(&factory, "iron_ingot"), 30.0);
    }
}
