/// Catalog Linter — validates the memory catalog JSON files.
///
/// Usage: catalog_linter <characters.json> <themes.json>

use inkframe::schema::memory::{CharacterId, MemoryCatalog};
use rustc_hash::FxHashSet;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: catalog_linter <characters.json> <themes.json>");
        process::exit(0);
    }

    let catalog = match MemoryCatalog::load_from_json(Path::new(&args[1]), Path::new(&args[2])) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: Failed to load catalog: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} characters, {} themes",
        catalog.characters.len(),
        catalog.themes.len()
    );

    let (errors, warnings) = lint_catalog(&catalog);

    println!("\n=== Catalog Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_catalog(catalog: &MemoryCatalog) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut seen_character_ids = FxHashSet::default();
    for character in &catalog.characters {
        if !seen_character_ids.insert(character.id.as_str()) {
            errors.push(format!("Duplicate character id '{}'", character.id.as_str()));
        }
        if character.name.trim().is_empty() {
            errors.push(format!(
                "Character '{}' has an empty name",
                character.id.as_str()
            ));
        }
        if character.traits.is_empty() {
            warnings.push(format!(
                "Character '{}' has no trait labels",
                character.id.as_str()
            ));
        }
        if character.description.trim().is_empty() {
            warnings.push(format!(
                "Character '{}' has an empty description",
                character.id.as_str()
            ));
        }
    }

    let mut seen_theme_ids = FxHashSet::default();
    for theme in &catalog.themes {
        if !seen_theme_ids.insert(theme.id.as_str()) {
            errors.push(format!("Duplicate theme id '{}'", theme.id.as_str()));
        }
        if theme.name.trim().is_empty() {
            errors.push(format!("Theme '{}' has an empty name", theme.id.as_str()));
        }
        if theme.keywords.is_empty() {
            warnings.push(format!(
                "Theme '{}' has no keyword labels",
                theme.id.as_str()
            ));
        }
    }

    // Cross-file id collisions would make selection lists ambiguous
    for theme in &catalog.themes {
        if catalog
            .character(&CharacterId::from(theme.id.as_str()))
            .is_some()
        {
            errors.push(format!(
                "Id '{}' is used by both a character and a theme",
                theme.id.as_str()
            ));
        }
    }

    (errors, warnings)
}
