//! Resolution pipeline: reads data files, resolves cross-references, and
//! builds the immutable catalogue.
//!
//! A content directory holds one file per collection — `parts`,
//! `buildings`, `recipes`, and optionally `power_recipes` — in RON, JSON,
//! or TOML (detected by extension). TOML files wrap the list in a
//! top-level table keyed by the collection name.

use std::path::{Path, PathBuf};

use fabrikon_core::catalogue::{
    CatalogueBuilder, CatalogueError, FuelIngredient, GameCatalogue, PowerRecipeDef, RecipeDef,
    RecipeIngredient, RecipeProduct, SupplementalIngredient,
};
use serde::de::DeserializeOwned;

use crate::schema::{BuildingData, PartData, PowerRecipeData, RecipeData, RecipeEntryData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The resolved content failed catalogue validation.
    #[error("catalogue validation failed: {0}")]
    Invalid(#[from] CatalogueError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection and discovery
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Scan a directory for a data file with the given base name. Returns
/// `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize a list from a file. For TOML, extracts the array at
/// `toml_key` from a top-level table; RON and JSON deserialize directly
/// as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    let parse_err = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => {
            let table: toml::Value =
                toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?;
            let list = table
                .get(toml_key)
                .cloned()
                .ok_or_else(|| parse_err(format!("missing top-level key '{toml_key}'")))?;
            list.try_into().map_err(|e: toml::de::Error| parse_err(e.to_string()))
        }
    }
}

fn load_list<T: DeserializeOwned>(
    dir: &Path,
    base_name: &'static str,
    required: bool,
) -> Result<Vec<T>, DataLoadError> {
    match find_data_file(dir, base_name)? {
        Some(path) => deserialize_list(&path, base_name),
        None if required => Err(DataLoadError::MissingRequired {
            file: base_name,
            dir: dir.to_path_buf(),
        }),
        None => Ok(Vec::new()),
    }
}

// ===========================================================================
// Resolution
// ===========================================================================

fn resolve_entry(entry: &RecipeEntryData) -> RecipeIngredient {
    RecipeIngredient {
        part: entry.part().to_string(),
        per_min: entry.per_min(),
    }
}

fn resolve_output(entry: &RecipeEntryData) -> RecipeProduct {
    RecipeProduct {
        part: entry.part().to_string(),
        per_min: entry.per_min(),
    }
}

/// Load a content directory and build the catalogue. `parts`,
/// `buildings`, and `recipes` files are required; `power_recipes` is
/// optional. Cross-reference validation happens in the catalogue builder.
pub fn load_catalogue(dir: &Path) -> Result<GameCatalogue, DataLoadError> {
    let parts: Vec<PartData> = load_list(dir, "parts", true)?;
    let buildings: Vec<BuildingData> = load_list(dir, "buildings", true)?;
    let recipes: Vec<RecipeData> = load_list(dir, "recipes", true)?;
    let power_recipes: Vec<PowerRecipeData> = load_list(dir, "power_recipes", false)?;

    let mut builder = CatalogueBuilder::new();

    for part in &parts {
        let display = part.display_name.as_deref().unwrap_or(&part.id);
        builder.add_part(&part.id, display);
    }
    for building in &buildings {
        let display = building.display_name.as_deref().unwrap_or(&building.id);
        builder.add_building(&building.id, display, building.power_mw);
    }
    for recipe in recipes {
        let display = recipe
            .display_name
            .clone()
            .unwrap_or_else(|| recipe.id.clone());
        builder.add_recipe(RecipeDef {
            id: recipe.id,
            display_name: display,
            building: recipe.building,
            ingredients: recipe.ingredients.iter().map(resolve_entry).collect(),
            products: recipe.products.iter().map(resolve_output).collect(),
        });
    }
    for recipe in power_recipes {
        let display = recipe
            .display_name
            .clone()
            .unwrap_or_else(|| recipe.id.clone());
        builder.add_power_recipe(PowerRecipeDef {
            id: recipe.id,
            display_name: display,
            building: recipe.building,
            fuel: FuelIngredient {
                part: recipe.fuel.part,
                per_min: recipe.fuel.per_min,
                mw_per_item: recipe.fuel.mw_per_item,
            },
            supplemental: recipe.supplemental.map(|s| SupplementalIngredient {
                part: s.part,
                per_min_per_mw: s.per_min_per_mw,
            }),
            byproduct: recipe.byproduct.as_ref().map(resolve_output),
        });
    }

    Ok(builder.build()?)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "fabrikon-data-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_minimal_content(dir: &Path) {
        write(
            dir,
            "parts.ron",
            r#"[
                (id: "iron_ore", display_name: Some("Iron Ore")),
                (id: "iron_ingot", display_name: Some("Iron Ingot")),
                (id: "coal"),
                (id: "water"),
            ]"#,
        );
        write(
            dir,
            "buildings.ron",
            r#"[
                (id: "smelter", display_name: Some("Smelter"), power_mw: 4.0),
                (id: "coal_generator", display_name: Some("Coal Generator")),
            ]"#,
        );
        write(
            dir,
            "recipes.ron",
            r#"[
                (
                    id: "iron_ingot",
                    building: "smelter",
                    ingredients: [("iron_ore", 30.0)],
                    products: [("iron_ingot", 30.0)],
                ),
            ]"#,
        );
        write(
            dir,
            "power_recipes.ron",
            r#"[
                (
                    id: "coal_power",
                    building: "coal_generator",
                    fuel: (part: "coal", per_min: 15.0, mw_per_item: 5.0),
                    supplemental: Some((part: "water", per_min_per_mw: 0.6)),
                ),
            ]"#,
        );
    }

    #[test]
    fn loads_a_complete_ron_directory() {
        let dir = temp_dir("full");
        write_minimal_content(&dir);

        let catalogue = load_catalogue(&dir).unwrap();
        assert_eq!(catalogue.part_count(), 4);
        assert!(catalogue.recipe("iron_ingot").is_some());
        assert_eq!(
            catalogue.power_recipe("coal_power").unwrap().rated_power(),
            75.0
        );
        assert!(catalogue.is_raw("iron_ore"));
        assert_eq!(catalogue.part_display_name("coal"), "coal");
    }

    #[test]
    fn power_recipes_are_optional() {
        let dir = temp_dir("nopower");
        write_minimal_content(&dir);
        std::fs::remove_file(dir.join("power_recipes.ron")).unwrap();

        let catalogue = load_catalogue(&dir).unwrap();
        assert!(catalogue.power_recipe("coal_power").is_none());
    }

    #[test]
    fn missing_required_file_fails() {
        let dir = temp_dir("missing");
        write_minimal_content(&dir);
        std::fs::remove_file(dir.join("parts.ron")).unwrap();

        assert!(matches!(
            load_catalogue(&dir),
            Err(DataLoadError::MissingRequired { file: "parts", .. })
        ));
    }

    #[test]
    fn conflicting_formats_fail() {
        let dir = temp_dir("conflict");
        write_minimal_content(&dir);
        write(&dir, "parts.json", r#"[{"id": "iron_ore"}]"#);

        assert!(matches!(
            load_catalogue(&dir),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
    }

    #[test]
    fn toml_lists_live_under_the_collection_key() {
        let dir = temp_dir("toml");
        write_minimal_content(&dir);
        std::fs::remove_file(dir.join("buildings.ron")).unwrap();
        write(
            &dir,
            "buildings.toml",
            r#"
                [[buildings]]
                id = "smelter"
                display_name = "Smelter"
                power_mw = 4.0

                [[buildings]]
                id = "coal_generator"
            "#,
        );

        let catalogue = load_catalogue(&dir).unwrap();
        assert_eq!(catalogue.building_power("smelter").unwrap(), 4.0);
    }

    #[test]
    fn unresolved_references_fail_validation() {
        let dir = temp_dir("badref");
        write_minimal_content(&dir);
        write(
            &dir,
            "recipes.ron",
            r#"[
                (
                    id: "bad",
                    building: "smelter",
                    ingredients: [("unobtainium", 1.0)],
                    products: [("iron_ingot", 1.0)],
                ),
            ]"#,
        );

        assert!(matches!(
            load_catalogue(&dir),
            Err(DataLoadError::Invalid(_))
        ));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = temp_dir("parse");
        write_minimal_content(&dir);
        write(&dir, "recipes.ron", "this is not ron");

        match load_catalogue(&dir) {
            Err(DataLoadError::Parse { file, .. }) => {
                assert!(file.ends_with("recipes.ron"));
            }
            other => panic!("expected Parse error, got: {other:?}"),
        }
    }
}
