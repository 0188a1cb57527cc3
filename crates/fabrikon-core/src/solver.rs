//! Production solver: expands each product's recipe into per-minute
//! ingredient demand and byproduct output.
//!
//! Solver-level problems degrade per item — a product with a missing or
//! unselected recipe is skipped with a log line and the loop continues, so
//! one bad product never blocks the rest of the factory. Power producers
//! are expanded by the aggregator, which owns the power-recipe shape.

use crate::catalogue::GameCatalogue;
use crate::factory::Factory;
use crate::notify::Notifications;
use crate::round::round3;

/// Floor applied to illegal requested amounts (≤ 0, NaN). Keeps every
/// ratio in the pipeline defined.
pub const AMOUNT_FLOOR: f64 = 1.0;

/// Expand every product in the factory, rebuilding `product.requirements`,
/// `product.byproducts`, and the factory-level merged byproduct list.
pub fn solve_factory(
    factory: &mut Factory,
    catalogue: &GameCatalogue,
    notes: &mut Notifications,
) {
    factory.byproducts.clear();

    let factory_name = factory.name.clone();
    for product in &mut factory.products {
        product.requirements.clear();
        product.byproducts.clear();

        if !product.amount.is_finite() || product.amount <= 0.0 {
            notes.warn(format!(
                "{factory_name}: amount for '{}' was invalid and has been set to {AMOUNT_FLOOR}",
                product.part
            ));
            product.amount = AMOUNT_FLOOR;
        }

        let Some(recipe_id) = &product.recipe else {
            // No recipe selected: the product is inert.
            continue;
        };
        let Some(recipe) = catalogue.recipe(recipe_id) else {
            tracing::warn!(
                factory = %factory_name,
                recipe = %recipe_id,
                "recipe missing from catalogue; skipping product"
            );
            continue;
        };

        // Ratio of requested output to one building's output per minute.
        let ratio = product.amount / recipe.primary().per_min;

        for ingredient in &recipe.ingredients {
            let amount = round3(ingredient.per_min * ratio);
            *product
                .requirements
                .entry(ingredient.part.clone())
                .or_insert(0.0) += amount;
        }

        for byproduct in recipe.byproducts() {
            let byproduct_ratio = byproduct.per_min / recipe.primary().per_min;
            let amount = round3(product.amount * byproduct_ratio);
            *product
                .byproducts
                .entry(byproduct.part.clone())
                .or_insert(0.0) += amount;
            *factory
                .byproducts
                .entry(byproduct.part.clone())
                .or_insert(0.0) += amount;
        }

        // Normalize accumulated entries so repeated solves are idempotent.
        for amount in product.requirements.values_mut() {
            *amount = round3(*amount);
        }
    }

    for amount in factory.byproducts.values_mut() {
        *amount = round3(*amount);
    }
}
