//! Building and power aggregation: converts production amounts into
//! building counts and power draw, and rolls both up per building type.
//!
//! Power draw follows the documented clock curve: whole buildings cost
//! their base power linearly; the fractional remainder runs as one building
//! at a partial clock and pays `base × frac^1.321928`.

use crate::catalogue::GameCatalogue;
use crate::factory::{BuildingRequirement, Factory};
use crate::notify::Notifications;
use crate::power::recompute_producer;
use crate::round::{power_curve, round1, round3};

/// Rebuild `factory.buildings` and `factory.power` from the current
/// products and power producers. Producers are re-derived from their drive
/// here, since the power-recipe shape belongs to this stage.
pub fn aggregate_factory(
    factory: &mut Factory,
    catalogue: &GameCatalogue,
    notes: &mut Notifications,
) {
    factory.buildings.clear();
    let mut consumed = 0.0;
    let mut produced = 0.0;

    let factory_name = factory.name.clone();
    for product in &mut factory.products {
        product.building = None;
        let Some(recipe_id) = &product.recipe else {
            continue;
        };
        let Some(recipe) = catalogue.recipe(recipe_id) else {
            // Already reported by the solver pass.
            continue;
        };
        let base_power = match catalogue.building_power(&recipe.building) {
            Ok(power) => power,
            Err(err) => {
                tracing::error!(
                    factory = %factory_name,
                    recipe = %recipe_id,
                    %err,
                    "building missing from catalogue; skipping product"
                );
                continue;
            }
        };

        let count = product.amount / recipe.primary().per_min;
        let power = base_power * power_curve(count);
        product.building = Some(BuildingRequirement {
            building: recipe.building.clone(),
            count: round3(count),
            power_mw: round3(power),
        });

        let totals = factory.buildings.entry(recipe.building.clone()).or_default();
        totals.count += count;
        totals.power_mw += power;
        consumed += power;
    }

    for producer in &mut factory.power_producers {
        let Some(recipe) = catalogue.power_recipe(&producer.recipe) else {
            tracing::warn!(
                factory = %factory_name,
                recipe = %producer.recipe,
                "power recipe missing from catalogue; skipping producer"
            );
            producer.ingredients.clear();
            producer.byproduct = None;
            continue;
        };
        producer.building = recipe.building.clone();
        recompute_producer(producer, recipe, notes);

        let totals = factory.buildings.entry(producer.building.clone()).or_default();
        totals.count += producer.buildings;
        produced += producer.power_mw;
    }

    for totals in factory.buildings.values_mut() {
        totals.count = round3(totals.count);
        totals.power_mw = round3(totals.power_mw);
    }
    factory.power.consumed = round1(consumed);
    factory.power.produced = round1(produced);
    factory.power.difference = round1(produced - consumed);
}
