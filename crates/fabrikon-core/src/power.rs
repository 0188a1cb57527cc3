//! Power-producer math: the "last edited wins" drive and its re-derivation.
//!
//! A producer can be driven by any one of four quantities — building count,
//! power output, fuel burn rate, or supplemental ingredient rate. The drive
//! tag records which one the user touched last; [`recompute_producer`]
//! re-derives the other three from it through the clock curve, so the four
//! numbers are always mutually consistent after a recompute.

use serde::{Deserialize, Serialize};

use crate::catalogue::PowerRecipeDef;
use crate::factory::{Byproduct, PowerProducer, ProducerIngredient};
use crate::notify::Notifications;
use crate::round::{power_curve, power_curve_inverse, round1, round3};

/// Which quantity is the current source of truth on a power producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProducerDrive {
    Buildings,
    Power,
    Fuel,
    Supplemental,
}

/// Re-derive every producer quantity from the drive's source value.
///
/// The throughput multiplier `m` is "buildings-worth of output": the power
/// curve of the building count. All four quantities map through it:
///
/// ```text
/// power = rated × m      fuel = fuel.per_min × m
/// supplemental = power × per_min_per_mw      buildings = curve⁻¹(m)
/// ```
pub fn recompute_producer(
    producer: &mut PowerProducer,
    recipe: &PowerRecipeDef,
    notes: &mut Notifications,
) {
    let rated = recipe.rated_power();

    let mut drive = producer.drive;
    if drive == ProducerDrive::Supplemental && recipe.supplemental.is_none() {
        notes.warn(format!(
            "'{}' has no supplemental ingredient; deriving from fuel instead",
            recipe.id
        ));
        drive = ProducerDrive::Fuel;
        producer.drive = drive;
    }

    let source = match drive {
        ProducerDrive::Buildings => &mut producer.buildings,
        ProducerDrive::Power => &mut producer.power_mw,
        ProducerDrive::Fuel => &mut producer.fuel_rate,
        ProducerDrive::Supplemental => &mut producer.supplemental_rate,
    };
    if !source.is_finite() || *source < 0.0 {
        notes.warn(format!(
            "'{}' had an invalid quantity and has been reset to 0",
            recipe.id
        ));
        *source = 0.0;
    }

    let multiplier = match drive {
        ProducerDrive::Buildings => power_curve(producer.buildings),
        ProducerDrive::Power => producer.power_mw / rated,
        ProducerDrive::Fuel => producer.fuel_rate / recipe.fuel.per_min,
        ProducerDrive::Supplemental => {
            // per_min_per_mw is validated positive at catalogue build.
            let per_mw = recipe
                .supplemental
                .as_ref()
                .map(|s| s.per_min_per_mw)
                .unwrap_or(1.0);
            producer.supplemental_rate / per_mw / rated
        }
    };

    let power = rated * multiplier;
    producer.buildings = match drive {
        ProducerDrive::Buildings => round3(producer.buildings),
        _ => round3(power_curve_inverse(multiplier)),
    };
    producer.power_mw = round1(power);
    producer.fuel_rate = round3(recipe.fuel.per_min * multiplier);
    producer.supplemental_rate = recipe
        .supplemental
        .as_ref()
        .map(|s| round3(power * s.per_min_per_mw))
        .unwrap_or(0.0);

    producer.ingredients = {
        let mut ingredients = vec![ProducerIngredient {
            part: recipe.fuel.part.clone(),
            amount: producer.fuel_rate,
        }];
        if let Some(supplemental) = &recipe.supplemental {
            ingredients.push(ProducerIngredient {
                part: supplemental.part.clone(),
                amount: producer.supplemental_rate,
            });
        }
        ingredients
    };
    producer.byproduct = recipe.byproduct.as_ref().map(|byproduct| Byproduct {
        part: byproduct.part.clone(),
        amount: round3(byproduct.per_min * multiplier),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::PowerProducer;
    use crate::test_utils::fixture_catalogue;

    fn coal_producer(buildings: f64) -> PowerProducer {
        PowerProducer::new("coal_power", "coal_generator", buildings)
    }

    #[test]
    fn derive_from_buildings() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("coal_power").unwrap();
        let mut producer = coal_producer(2.0);
        recompute_producer(&mut producer, recipe, &mut Notifications::new());

        // Coal: 15/min at 5 MW each -> 75 MW rated.
        assert_eq!(producer.power_mw, 150.0);
        assert_eq!(producer.fuel_rate, 30.0);
        // Water at 0.6/min per MW.
        assert_eq!(producer.supplemental_rate, 90.0);
        assert_eq!(producer.ingredients.len(), 2);
    }

    #[test]
    fn derive_from_power() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("coal_power").unwrap();
        let mut producer = coal_producer(0.0);
        producer.power_mw = 75.0;
        producer.drive = ProducerDrive::Power;
        recompute_producer(&mut producer, recipe, &mut Notifications::new());

        assert_eq!(producer.buildings, 1.0);
        assert_eq!(producer.fuel_rate, 15.0);
    }

    #[test]
    fn derive_from_fuel() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("coal_power").unwrap();
        let mut producer = coal_producer(0.0);
        producer.fuel_rate = 30.0;
        producer.drive = ProducerDrive::Fuel;
        recompute_producer(&mut producer, recipe, &mut Notifications::new());

        assert_eq!(producer.buildings, 2.0);
        assert_eq!(producer.power_mw, 150.0);
    }

    #[test]
    fn derive_from_supplemental() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("coal_power").unwrap();
        let mut producer = coal_producer(0.0);
        producer.supplemental_rate = 90.0;
        producer.drive = ProducerDrive::Supplemental;
        recompute_producer(&mut producer, recipe, &mut Notifications::new());

        // 90 water / 0.6 per MW = 150 MW = 2 buildings.
        assert_eq!(producer.power_mw, 150.0);
        assert_eq!(producer.buildings, 2.0);
        assert_eq!(producer.fuel_rate, 30.0);
    }

    #[test]
    fn fractional_buildings_pay_the_curve() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("coal_power").unwrap();
        let mut producer = coal_producer(1.5);
        recompute_producer(&mut producer, recipe, &mut Notifications::new());

        // multiplier = 1 + 0.5^1.321928 ≈ 1.4 -> 105 MW.
        assert_eq!(producer.power_mw, 105.0);
        assert_eq!(producer.fuel_rate, 21.0);
    }

    #[test]
    fn power_round_trips_through_the_inverse_curve() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("coal_power").unwrap();
        let mut producer = coal_producer(0.0);
        producer.power_mw = 105.0;
        producer.drive = ProducerDrive::Power;
        recompute_producer(&mut producer, recipe, &mut Notifications::new());

        assert_eq!(producer.buildings, 1.5);
        assert_eq!(producer.power_mw, 105.0);
    }

    #[test]
    fn supplemental_drive_without_supplemental_degrades_to_fuel() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("nuclear_power").unwrap();
        let mut producer = PowerProducer::new("nuclear_power", "nuclear_plant", 0.0);
        producer.supplemental_rate = 10.0;
        producer.fuel_rate = 0.2;
        producer.drive = ProducerDrive::Supplemental;

        let mut notes = Notifications::new();
        recompute_producer(&mut producer, recipe, &mut notes);

        assert_eq!(producer.drive, ProducerDrive::Fuel);
        assert_eq!(producer.buildings, 1.0);
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn byproduct_scales_with_throughput() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("nuclear_power").unwrap();
        let mut producer = PowerProducer::new("nuclear_power", "nuclear_plant", 2.0);
        recompute_producer(&mut producer, recipe, &mut Notifications::new());

        let waste = producer.byproduct.as_ref().unwrap();
        assert_eq!(waste.part, "uranium_waste");
        assert_eq!(waste.amount, 0.4);
    }

    #[test]
    fn negative_source_resets_to_zero_with_warning() {
        let catalogue = fixture_catalogue();
        let recipe = catalogue.power_recipe("coal_power").unwrap();
        let mut producer = coal_producer(-3.0);

        let mut notes = Notifications::new();
        recompute_producer(&mut producer, recipe, &mut notes);

        assert_eq!(producer.buildings, 0.0);
        assert_eq!(producer.power_mw, 0.0);
        assert_eq!(notes.len(), 1);
    }
}
