//! Property-based tests for the Fabrikon engine.
//!
//! Uses proptest to generate random targets, group layouts, and small
//! plans, then verify the allocator and pipeline invariants hold.

use fabrikon_core::factory::{BuildingRequirement, Factory, Plan, Product};
use fabrikon_core::groups::{self, effective_count};
use fabrikon_core::notify::Notifications;
use fabrikon_core::pipeline::settle;
use fabrikon_core::round::{round_to, CLOCK_MAX, CLOCK_MIN, GROUP_TOLERANCE};
use fabrikon_core::test_utils::fixture_catalogue;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// A product with a precomputed aggregate building requirement and `n`
/// groups, ready for allocator calls.
fn item_with_groups(target: f64, n: usize) -> Product {
    let mut product = Product::new("iron_ingot", Some("iron_ingot"), target * 30.0);
    product.building = Some(BuildingRequirement {
        building: "smelter".into(),
        count: target,
        power_mw: 0.0,
    });
    for _ in 1..n {
        groups::add_group(&mut product, &mut Notifications::new());
    }
    product
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After a rebalance, the summed effective count always lands within
    /// the 0.1 tolerance of the target, for any target and group count.
    #[test]
    fn rebalance_lands_within_tolerance(
        target in 0.2f64..500.0,
        n in 1usize..6,
    ) {
        let target = round_to(target, 3);
        let mut item = item_with_groups(target, n);
        groups::rebalance(&mut item, &mut Notifications::new());

        let effective = effective_count(&item.groups);
        prop_assert!(
            (target - effective).abs() <= GROUP_TOLERANCE,
            "target {target}, effective {effective}"
        );
        prop_assert!(!item.groups_have_problem);
    }

    /// Every clock a rebalance assigns stays inside the legal range and
    /// carries at most 4 fractional digits.
    #[test]
    fn rebalance_clocks_stay_legal(
        target in 0.2f64..500.0,
        n in 1usize..6,
    ) {
        let target = round_to(target, 3);
        let mut item = item_with_groups(target, n);
        groups::rebalance(&mut item, &mut Notifications::new());

        for group in &item.groups {
            prop_assert!(group.clock >= CLOCK_MIN && group.clock <= CLOCK_MAX);
            prop_assert_eq!(round_to(group.clock, 4), group.clock);
        }
    }

    /// Remainder-to-last with a positive gap closes the gap exactly
    /// (within display precision) and never overclocks past the cap.
    #[test]
    fn remainder_to_last_closes_positive_gaps(
        allocated in 0.0f64..100.0,
        gap in 0.05f64..20.0,
    ) {
        let allocated = round_to(allocated, 3);
        let gap = round_to(gap, 3);
        let mut item = item_with_groups(allocated + gap, 2);
        item.groups[0].count = allocated;
        item.groups[0].clock = 100.0;

        groups::remainder_to_last(&mut item, &mut Notifications::new());

        let last = &item.groups[1];
        prop_assert!(last.clock <= CLOCK_MAX);
        // The chosen count/clock pair reproduces the gap to within the
        // clock's 4-decimal resolution spread across the buildings.
        let achieved = last.count * last.clock / 100.0;
        prop_assert!(
            (achieved - gap).abs() < 0.01 + last.count * 1e-4,
            "gap {gap}, achieved {achieved}"
        );
    }

    /// Half-up rounding is idempotent and monotone.
    #[test]
    fn rounding_is_idempotent_and_monotone(
        a in -1000.0f64..1000.0,
        b in -1000.0f64..1000.0,
        decimals in 0u32..5,
    ) {
        let ra = round_to(a, decimals);
        prop_assert_eq!(round_to(ra, decimals), ra);
        if a <= b {
            prop_assert!(ra <= round_to(b, decimals));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Settling a settled plan changes nothing, for random two-factory
    /// plans with an import link between them.
    #[test]
    fn settle_is_idempotent_on_random_plans(
        supply in 1.0f64..2000.0,
        demand in 1.0f64..2000.0,
        plates in 1.0f64..200.0,
    ) {
        let catalogue = fixture_catalogue();
        let mut plan = Plan::new();

        let mut supplier = Factory::new("Supplier");
        supplier.add_product("iron_ingot", Some("iron_ingot"), round_to(supply, 3));
        let supplier_id = plan.add_factory(supplier);

        let mut consumer = Factory::new("Consumer");
        consumer.add_product("iron_plate", Some("iron_plate"), round_to(plates, 3));
        consumer.set_input(supplier_id, "iron_ingot", round_to(demand, 3));
        let consumer_id = plan.add_factory(consumer);

        settle(&mut plan, &catalogue);
        let supplier_once = plan.factory(supplier_id).unwrap().clone();
        let consumer_once = plan.factory(consumer_id).unwrap().clone();

        settle(&mut plan, &catalogue);
        prop_assert_eq!(plan.factory(supplier_id).unwrap(), &supplier_once);
        prop_assert_eq!(plan.factory(consumer_id).unwrap(), &consumer_once);
    }

    /// The ledger invariant `remaining = supplied - required` holds for
    /// every part of every factory after a settle.
    #[test]
    fn ledger_invariant_holds_after_settle(
        amount in 1.0f64..1000.0,
    ) {
        let catalogue = fixture_catalogue();
        let mut plan = Plan::new();
        let mut factory = Factory::new("Checked");
        factory.add_product("iron_plate", Some("iron_plate"), round_to(amount, 3));
        factory.add_product("alumina", Some("alumina"), round_to(amount, 3));
        factory.add_power_producer("coal_power", "coal_generator", 2.0);
        let id = plan.add_factory(factory);

        settle(&mut plan, &catalogue);

        for (part, metrics) in &plan.factory(id).unwrap().parts {
            let expected = round_to(metrics.supplied_total - metrics.required_total, 3);
            prop_assert!(
                (metrics.remaining - expected).abs() < 1e-9,
                "part {part}: remaining {} vs {}",
                metrics.remaining,
                expected
            );
            if metrics.is_raw {
                prop_assert!(metrics.satisfied, "raw part {part} must be satisfied");
            }
        }
    }
}
