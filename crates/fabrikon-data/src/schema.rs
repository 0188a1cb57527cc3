//! Serde data-file structs for game content definitions.
//!
//! These structs define the on-disk format for parts, recipes, power
//! recipes, and buildings. They are deserialized from RON, JSON, or TOML
//! data files and then resolved into catalogue types by the loader.

use serde::Deserialize;

// ===========================================================================
// Parts
// ===========================================================================

/// A part definition in a data file. Raw classification is derived by the
/// catalogue, not declared here.
#[derive(Debug, Clone, Deserialize)]
pub struct PartData {
    pub id: String,
    /// Defaults to the id when omitted.
    #[serde(default)]
    pub display_name: Option<String>,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe entry, supporting both a short tuple form and a full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeEntryData {
    /// Short form: `("part_id", per_min)`.
    Short(String, f64),
    /// Full form with explicit fields.
    Full { part: String, per_min: f64 },
}

impl RecipeEntryData {
    pub fn part(&self) -> &str {
        match self {
            RecipeEntryData::Short(part, _) => part,
            RecipeEntryData::Full { part, .. } => part,
        }
    }

    pub fn per_min(&self) -> f64 {
        match self {
            RecipeEntryData::Short(_, per_min) => *per_min,
            RecipeEntryData::Full { per_min, .. } => *per_min,
        }
    }
}

/// A production recipe in a data file. The first product is primary.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub building: String,
    #[serde(default)]
    pub ingredients: Vec<RecipeEntryData>,
    pub products: Vec<RecipeEntryData>,
}

// ===========================================================================
// Power recipes
// ===========================================================================

/// The fuel entry of a power recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct FuelData {
    pub part: String,
    pub per_min: f64,
    pub mw_per_item: f64,
}

/// The optional supplemental entry of a power recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplementalData {
    pub part: String,
    pub per_min_per_mw: f64,
}

/// A power-generation recipe in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct PowerRecipeData {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub building: String,
    pub fuel: FuelData,
    #[serde(default)]
    pub supplemental: Option<SupplementalData>,
    #[serde(default)]
    pub byproduct: Option<RecipeEntryData>,
}

// ===========================================================================
// Buildings
// ===========================================================================

/// A building definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Base power draw per building at 100% clock; generators use 0.
    #[serde(default)]
    pub power_mw: f64,
}
