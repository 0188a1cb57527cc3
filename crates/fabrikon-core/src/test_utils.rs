//! Shared fixtures for tests: a small but complete catalogue and plan
//! helpers. Compiled for tests and for downstream crates via the
//! `test-utils` feature.

use crate::catalogue::{
    CatalogueBuilder, FuelIngredient, GameCatalogue, PowerRecipeDef, RecipeDef, RecipeIngredient,
    RecipeProduct, SupplementalIngredient,
};

fn ingredient(part: &str, per_min: f64) -> RecipeIngredient {
    RecipeIngredient {
        part: part.into(),
        per_min,
    }
}

fn output(part: &str, per_min: f64) -> RecipeProduct {
    RecipeProduct {
        part: part.into(),
        per_min,
    }
}

/// An iron chain, a byproduct refinery, and two generators:
///
/// - `iron_ingot`: 30 ore → 30 ingot, smelter (4 MW)
/// - `iron_plate`: 30 ingot → 20 plate, constructor (4 MW)
/// - `iron_rod`:   15 ingot → 15 rod, constructor (4 MW)
/// - `alumina`:    120 bauxite + 180 water → 120 alumina + 60 silica,
///   refinery (30 MW)
/// - `coal_power`: 15 coal/min at 5 MW each (75 MW rated), 0.6 water/MW
/// - `nuclear_power`: 0.2 rod/min at 12,500 MW each (2,500 MW rated),
///   0.2 waste/min byproduct
pub fn fixture_catalogue() -> GameCatalogue {
    let mut b = CatalogueBuilder::new();
    b.add_part("iron_ore", "Iron Ore")
        .add_part("iron_ingot", "Iron Ingot")
        .add_part("iron_plate", "Iron Plate")
        .add_part("iron_rod", "Iron Rod")
        .add_part("bauxite", "Bauxite")
        .add_part("alumina", "Alumina Solution")
        .add_part("silica", "Silica")
        .add_part("water", "Water")
        .add_part("coal", "Coal")
        .add_part("uranium_rod", "Uranium Fuel Rod")
        .add_part("uranium_waste", "Uranium Waste");

    b.add_building("smelter", "Smelter", 4.0)
        .add_building("constructor", "Constructor", 4.0)
        .add_building("refinery", "Refinery", 30.0)
        .add_building("coal_generator", "Coal Generator", 0.0)
        .add_building("nuclear_plant", "Nuclear Plant", 0.0);

    b.add_recipe(RecipeDef {
        id: "iron_ingot".into(),
        display_name: "Iron Ingot".into(),
        building: "smelter".into(),
        ingredients: vec![ingredient("iron_ore", 30.0)],
        products: vec![output("iron_ingot", 30.0)],
    });
    b.add_recipe(RecipeDef {
        id: "iron_plate".into(),
        display_name: "Iron Plate".into(),
        building: "constructor".into(),
        ingredients: vec![ingredient("iron_ingot", 30.0)],
        products: vec![output("iron_plate", 20.0)],
    });
    b.add_recipe(RecipeDef {
        id: "iron_rod".into(),
        display_name: "Iron Rod".into(),
        building: "constructor".into(),
        ingredients: vec![ingredient("iron_ingot", 15.0)],
        products: vec![output("iron_rod", 15.0)],
    });
    b.add_recipe(RecipeDef {
        id: "alumina".into(),
        display_name: "Alumina Solution".into(),
        building: "refinery".into(),
        ingredients: vec![ingredient("bauxite", 120.0), ingredient("water", 180.0)],
        products: vec![output("alumina", 120.0), output("silica", 60.0)],
    });

    b.add_power_recipe(PowerRecipeDef {
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
    b.add_power_recipe(PowerRecipeDef {
        id: "nuclear_power".into(),
        display_name: "Nuclear Power".into(),
        building: "nuclear_plant".into(),
        fuel: FuelIngredient {
            part: "uranium_rod".into(),
            per_min: 0.2,
            mw_per_item: 12_500.0,
        },
        supplemental: None,
        byproduct: Some(output("uranium_waste", 0.2)),
    });

    b.build().expect("fixture catalogue is valid")
}
