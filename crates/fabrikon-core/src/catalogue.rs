//! The game-data catalogue: parts, recipes, power recipes, and buildings.
//!
//! Built once via [`CatalogueBuilder`], frozen into an immutable
//! [`GameCatalogue`], and injected into every solver call. The engine never
//! mutates it; a given data version always answers lookups the same way.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A part definition. Parts are identified by a stable string id; the
/// display name is what the presentation layer shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDef {
    pub id: String,
    pub display_name: String,
}

/// One ingredient of a production recipe, expressed per minute per building
/// at 100% clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub part: String,
    pub per_min: f64,
}

/// One output of a production recipe, expressed per minute per building at
/// 100% clock. The first output of a recipe is its primary product; the
/// rest are byproducts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeProduct {
    pub part: String,
    pub per_min: f64,
}

/// A production recipe: fixed ingredient and output rates tied to one
/// building type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDef {
    pub id: String,
    pub display_name: String,
    pub building: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub products: Vec<RecipeProduct>,
}

impl RecipeDef {
    /// The primary product (first output). Guaranteed present after
    /// [`CatalogueBuilder::build`] validation.
    pub fn primary(&self) -> &RecipeProduct {
        &self.products[0]
    }

    /// Secondary outputs, if any.
    pub fn byproducts(&self) -> &[RecipeProduct] {
        &self.products[1..]
    }
}

/// The fuel burned by a power recipe: a per-building burn rate and the
/// power yield per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelIngredient {
    pub part: String,
    /// Items per minute per building at 100% clock.
    pub per_min: f64,
    /// Megawatts produced per item burned.
    pub mw_per_item: f64,
}

/// An optional secondary ingredient consumed at a fixed ratio to power
/// produced (e.g. water per megawatt).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementalIngredient {
    pub part: String,
    /// Items per minute per megawatt produced.
    pub per_min_per_mw: f64,
}

/// A power-generation recipe: one fuel, an optional supplemental
/// ingredient, an optional byproduct, tied to one generator building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerRecipeDef {
    pub id: String,
    pub display_name: String,
    pub building: String,
    pub fuel: FuelIngredient,
    pub supplemental: Option<SupplementalIngredient>,
    /// Byproduct output per minute per building at 100% clock.
    pub byproduct: Option<RecipeProduct>,
}

impl PowerRecipeDef {
    /// Megawatts produced by one building at 100% clock.
    pub fn rated_power(&self) -> f64 {
        self.fuel.per_min * self.fuel.mw_per_item
    }
}

/// A building definition. `power_mw` is the base power draw per building at
/// 100% clock; generators draw nothing and carry 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDef {
    pub id: String,
    pub display_name: String,
    pub power_mw: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("recipe '{recipe}' references unknown part '{part}'")]
    UnknownPartRef { recipe: String, part: String },
    #[error("recipe '{recipe}' references unknown building '{building}'")]
    UnknownBuildingRef { recipe: String, building: String },
    #[error("recipe '{recipe}' has no products")]
    NoProducts { recipe: String },
    #[error("recipe '{recipe}' has a non-positive rate for '{part}'")]
    NonPositiveRate { recipe: String, part: String },
}

/// Builder for constructing an immutable [`GameCatalogue`].
/// Register definitions, then freeze with [`build`](Self::build), which
/// validates every cross-reference.
#[derive(Debug, Default)]
pub struct CatalogueBuilder {
    parts: Vec<PartDef>,
    recipes: Vec<RecipeDef>,
    power_recipes: Vec<PowerRecipeDef>,
    buildings: Vec<BuildingDef>,
}

impl CatalogueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_part(&mut self, id: &str, display_name: &str) -> &mut Self {
        self.parts.push(PartDef {
            id: id.to_string(),
            display_name: display_name.to_string(),
        });
        self
    }

    pub fn add_recipe(&mut self, recipe: RecipeDef) -> &mut Self {
        self.recipes.push(recipe);
        self
    }

    pub fn add_power_recipe(&mut self, recipe: PowerRecipeDef) -> &mut Self {
        self.power_recipes.push(recipe);
        self
    }

    pub fn add_building(&mut self, id: &str, display_name: &str, power_mw: f64) -> &mut Self {
        self.buildings.push(BuildingDef {
            id: id.to_string(),
            display_name: display_name.to_string(),
            power_mw,
        });
        self
    }

    /// Validate all cross-references and freeze the catalogue.
    ///
    /// A part is classified raw when no recipe or power byproduct outputs
    /// it; raw parts are always considered satisfied by the ledger.
    pub fn build(self) -> Result<GameCatalogue, CatalogueError> {
        let mut parts = HashMap::new();
        for part in self.parts {
            let id = part.id.clone();
            if parts.insert(id.clone(), part).is_some() {
                return Err(CatalogueError::Duplicate { kind: "part", id });
            }
        }

        let mut buildings = HashMap::new();
        for building in self.buildings {
            let id = building.id.clone();
            if buildings.insert(id.clone(), building).is_some() {
                return Err(CatalogueError::Duplicate { kind: "building", id });
            }
        }

        let mut recipes: HashMap<String, RecipeDef> = HashMap::new();
        for recipe in self.recipes {
            if recipe.products.is_empty() {
                return Err(CatalogueError::NoProducts {
                    recipe: recipe.id.clone(),
                });
            }
            if !buildings.contains_key(&recipe.building) {
                return Err(CatalogueError::UnknownBuildingRef {
                    recipe: recipe.id.clone(),
                    building: recipe.building.clone(),
                });
            }
            for entry in recipe
                .ingredients
                .iter()
                .map(|i| (&i.part, i.per_min))
                .chain(recipe.products.iter().map(|p| (&p.part, p.per_min)))
            {
                if !parts.contains_key(entry.0) {
                    return Err(CatalogueError::UnknownPartRef {
                        recipe: recipe.id.clone(),
                        part: entry.0.clone(),
                    });
                }
                if entry.1 <= 0.0 || !entry.1.is_finite() {
                    return Err(CatalogueError::NonPositiveRate {
                        recipe: recipe.id.clone(),
                        part: entry.0.clone(),
                    });
                }
            }
            let id = recipe.id.clone();
            if recipes.insert(id.clone(), recipe).is_some() {
                return Err(CatalogueError::Duplicate { kind: "recipe", id });
            }
        }

        let mut power_recipes: HashMap<String, PowerRecipeDef> = HashMap::new();
        for recipe in self.power_recipes {
            if !buildings.contains_key(&recipe.building) {
                return Err(CatalogueError::UnknownBuildingRef {
                    recipe: recipe.id.clone(),
                    building: recipe.building.clone(),
                });
            }
            if recipe.fuel.mw_per_item <= 0.0 || !recipe.fuel.mw_per_item.is_finite() {
                return Err(CatalogueError::NonPositiveRate {
                    recipe: recipe.id.clone(),
                    part: recipe.fuel.part.clone(),
                });
            }
            let fuel_refs = std::iter::once((&recipe.fuel.part, recipe.fuel.per_min))
                .chain(recipe.supplemental.iter().map(|s| (&s.part, s.per_min_per_mw)))
                .chain(recipe.byproduct.iter().map(|b| (&b.part, b.per_min)));
            for (part, rate) in fuel_refs {
                if !parts.contains_key(part) {
                    return Err(CatalogueError::UnknownPartRef {
                        recipe: recipe.id.clone(),
                        part: part.clone(),
                    });
                }
                if rate <= 0.0 || !rate.is_finite() {
                    return Err(CatalogueError::NonPositiveRate {
                        recipe: recipe.id.clone(),
                        part: part.clone(),
                    });
                }
            }
            let id = recipe.id.clone();
            if power_recipes.insert(id.clone(), recipe).is_some() {
                return Err(CatalogueError::Duplicate {
                    kind: "power recipe",
                    id,
                });
            }
        }

        // Raw classification: nothing in the catalogue produces the part.
        let mut produced: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for recipe in recipes.values() {
            for product in &recipe.products {
                produced.insert(&product.part);
            }
        }
        for recipe in power_recipes.values() {
            if let Some(bp) = &recipe.byproduct {
                produced.insert(&bp.part);
            }
        }
        let raw_parts = parts
            .keys()
            .filter(|id| !produced.contains(id.as_str()))
            .cloned()
            .collect();

        Ok(GameCatalogue {
            parts,
            recipes,
            power_recipes,
            buildings,
            raw_parts,
        })
    }
}

/// Immutable game-data catalogue. Read-only and deterministic for a given
/// data version; safe to share behind a reference.
#[derive(Debug)]
pub struct GameCatalogue {
    parts: HashMap<String, PartDef>,
    recipes: HashMap<String, RecipeDef>,
    power_recipes: HashMap<String, PowerRecipeDef>,
    buildings: HashMap<String, BuildingDef>,
    raw_parts: std::collections::HashSet<String>,
}

impl GameCatalogue {
    pub fn recipe(&self, id: &str) -> Option<&RecipeDef> {
        self.recipes.get(id)
    }

    pub fn power_recipe(&self, id: &str) -> Option<&PowerRecipeDef> {
        self.power_recipes.get(id)
    }

    pub fn building(&self, id: &str) -> Option<&BuildingDef> {
        self.buildings.get(id)
    }

    /// Base power draw for a building id. Missing buildings are a hard
    /// error: the engine only asks about ids the catalogue itself handed
    /// out, so a miss means a data-version mismatch.
    pub fn building_power(&self, id: &str) -> Result<f64, CatalogueError> {
        self.buildings
            .get(id)
            .map(|b| b.power_mw)
            .ok_or_else(|| CatalogueError::NotFound {
                kind: "building",
                id: id.to_string(),
            })
    }

    pub fn part(&self, id: &str) -> Option<&PartDef> {
        self.parts.get(id)
    }

    /// Display name for a part, falling back to the raw id for unknown
    /// parts so callers never render an empty label.
    pub fn part_display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.parts.get(id).map_or(id, |p| p.display_name.as_str())
    }

    /// Whether the part has no producing recipe anywhere in the catalogue.
    pub fn is_raw(&self, id: &str) -> bool {
        self.raw_parts.contains(id)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}
