//! Drift detection between a factory's recorded baseline and its live
//! values, used to warn about external edits (collaborative or imported
//! plans).
//!
//! `in_sync` is tri-state: `None` means the factory never opted into
//! tracking and stays `None` forever unless a snapshot is taken;
//! `Some(true)`/`Some(false)` mean tracked-and-clean / tracked-and-drifted.

use serde::{Deserialize, Serialize};

use crate::factory::Factory;

/// Recorded baseline of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub part: String,
    pub recipe: Option<String>,
    pub amount: f64,
}

/// Recorded baseline of one power producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerSnapshot {
    pub recipe: String,
    pub buildings: f64,
    pub power_mw: f64,
}

/// The full baseline for a factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub products: Vec<ProductSnapshot>,
    pub producers: Vec<ProducerSnapshot>,
}

/// Record the factory's current products and producers as the baseline and
/// mark it in sync.
pub fn snapshot(factory: &mut Factory) {
    factory.sync = Some(SyncSnapshot {
        products: factory
            .products
            .iter()
            .map(|p| ProductSnapshot {
                part: p.part.clone(),
                recipe: p.recipe.clone(),
                amount: p.amount,
            })
            .collect(),
        producers: factory
            .power_producers
            .iter()
            .map(|p| ProducerSnapshot {
                recipe: p.recipe.clone(),
                buildings: p.buildings,
                power_mw: p.power_mw,
            })
            .collect(),
    });
    factory.in_sync = Some(true);
}

/// Compare live values against the baseline and flip `in_sync` to
/// `Some(false)` on any drift. Untracked factories (`sync == None`) are
/// left untouched — the checker never promotes `None` to a boolean.
pub fn check_sync(factory: &mut Factory) {
    let Some(baseline) = &factory.sync else {
        return;
    };

    let products_match = factory.products.len() == baseline.products.len()
        && factory
            .products
            .iter()
            .zip(&baseline.products)
            .all(|(live, snap)| {
                live.part == snap.part && live.recipe == snap.recipe && live.amount == snap.amount
            });
    let producers_match = factory.power_producers.len() == baseline.producers.len()
        && factory
            .power_producers
            .iter()
            .zip(&baseline.producers)
            .all(|(live, snap)| {
                live.recipe == snap.recipe
                    && live.buildings == snap.buildings
                    && live.power_mw == snap.power_mw
            });

    if !(products_match && producers_match) {
        factory.in_sync = Some(false);
    }
}
