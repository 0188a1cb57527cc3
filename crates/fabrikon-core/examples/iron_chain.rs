//! Minimal plan example: two factories linked by an ingot export.
//!
//! Builds a small catalogue, a smelting factory feeding a plate factory,
//! settles the plan, and prints the part ledgers and power balance.
//!
//! Run with: `cargo run -p fabrikon-core --example iron_chain`

use fabrikon_core::catalogue::{
    CatalogueBuilder, FuelIngredient, PowerRecipeDef, RecipeDef, RecipeIngredient, RecipeProduct,
    SupplementalIngredient,
};
use fabrikon_core::factory::{Factory, Plan};
use fabrikon_core::pipeline::settle;

fn main() {
    // --- Step 1: Build the catalogue ---

    let mut builder = CatalogueBuilder::new();
    builder
        .add_part("iron_ore", "Iron Ore")
        .add_part("iron_ingot", "Iron Ingot")
        .add_part("iron_plate", "Iron Plate")
        .add_part("coal", "Coal")
        .add_part("water", "Water")
        .add_building("smelter", "Smelter", 4.0)
        .add_building("constructor", "Constructor", 4.0)
        .add_building("coal_generator", "Coal Generator", 0.0);
    builder.add_recipe(RecipeDef {
        id: "iron_ingot".into(),
        display_name: "Iron Ingot".into(),
        building: "smelter".into(),
        ingredients: vec![RecipeIngredient {
            part: "iron_ore".into(),
            per_min: 30.0,
        }],
        products: vec![RecipeProduct {
            part: "iron_ingot".into(),
            per_min: 30.0,
        }],
    });
    builder.add_recipe(RecipeDef {
        id: "iron_plate".into(),
        display_name: "Iron Plate".into(),
        building: "constructor".into(),
        ingredients: vec![RecipeIngredient {
            part: "iron_ingot".into(),
            per_min: 30.0,
        }],
        products: vec![RecipeProduct {
            part: "iron_plate".into(),
            per_min: 20.0,
        }],
    });
    builder.add_power_recipe(PowerRecipeDef {
        id: "coal_power".into(),
        display_name: "Coal Power".into(),
        building: "coal_generator".into(),
        fuel: FuelIngredient {
            part: "coal".into(),
            per_min: 15.0,
            mw_per_item: 5.0,
        },
        supplemental: Some(SupplementalIngredient {
            part: "water".into(),
            per_min_per_mw: 0.6,
        }),
        byproduct: None,
    });
    let catalogue = builder.build().expect("catalogue is valid");

    // --- Step 2: Build the plan ---

    let mut plan = Plan::new();

    let mut smelting = Factory::new("Smelting Works");
    smelting.add_product("iron_ingot", Some("iron_ingot"), 90.0);
    smelting.add_power_producer("coal_power", "coal_generator", 1.0);
    let smelting_id = plan.add_factory(smelting);

    let mut plates = Factory::new("Plate Shop");
    plates.add_product("iron_plate", Some("iron_plate"), 40.0);
    plates.set_input(smelting_id, "iron_ingot", 60.0);
    let plates_id = plan.add_factory(plates);

    // --- Step 3: Settle and inspect ---

    let report = settle(&mut plan, &catalogue);
    for note in &report.notifications {
        println!("[{:?}] {}", note.severity, note.message);
    }

    for id in [smelting_id, plates_id] {
        let factory = plan.factory(id).expect("factory exists");
        println!("\n=== {} ===", factory.name);
        println!(
            "  power: {:.1} MW consumed, {:.1} MW produced",
            factory.power.consumed, factory.power.produced
        );
        for (building, totals) in &factory.buildings {
            println!("  {building}: {:.3} buildings", totals.count);
        }
        for (part, metrics) in &factory.parts {
            println!(
                "  {:<12} required {:>8.3}  supplied {:>8.3}  remaining {:>8.3}  {}",
                part,
                metrics.required_total,
                metrics.supplied_total,
                metrics.remaining,
                if metrics.satisfied { "ok" } else { "SHORT" },
            );
        }
        for (part, metrics) in &factory.dependencies.metrics {
            println!(
                "  export {part}: requested {:.3}, supplied {:.3}, satisfied: {}",
                metrics.requested, metrics.supplied, metrics.satisfied
            );
        }
    }
}
