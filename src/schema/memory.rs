/// Memory catalog — static character and theme reference data.
///
/// Loaded once at application start from JSON files and treated as
/// read-only for the rest of the session.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Newtype wrapper for character IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

/// Newtype wrapper for theme IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeId(pub String);

impl CharacterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ThemeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CharacterId {
    fn from(s: &str) -> Self {
        CharacterId(s.to_string())
    }
}

impl From<&str> for ThemeId {
    fn from(s: &str) -> Self {
        ThemeId(s.to_string())
    }
}

/// A reusable character the writer can pull into a scene.
/// Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub description: String,
    pub arc: String,
    pub tone: String,
    pub traits: Vec<String>,
    pub background: String,
}

/// A thematic thread with its associated keyword labels.
/// Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub id: ThemeId,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
}

// The on-disk catalog files wrap their lists in a single named field,
// so intermediate structs are needed for deserialization.

#[derive(Debug, Deserialize)]
struct CharacterFile {
    characters: Vec<Character>,
}

#[derive(Debug, Deserialize)]
struct ThemeFile {
    themes: Vec<Theme>,
}

/// The full read-only catalog: ordered character and theme lists.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    pub characters: Vec<Character>,
    pub themes: Vec<Theme>,
}

impl MemoryCatalog {
    /// Load the catalog from a characters file and a themes file.
    pub fn load_from_json(
        characters_path: &Path,
        themes_path: &Path,
    ) -> Result<MemoryCatalog, CatalogError> {
        let characters_json = std::fs::read_to_string(characters_path)?;
        let themes_json = std::fs::read_to_string(themes_path)?;
        Self::parse_json(&characters_json, &themes_json)
    }

    /// Parse the catalog from in-memory JSON strings.
    pub fn parse_json(
        characters_json: &str,
        themes_json: &str,
    ) -> Result<MemoryCatalog, CatalogError> {
        let character_file: CharacterFile = serde_json::from_str(characters_json)?;
        let theme_file: ThemeFile = serde_json::from_str(themes_json)?;
        Ok(MemoryCatalog {
            characters: character_file.characters,
            themes: theme_file.themes,
        })
    }

    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| &c.id == id)
    }

    pub fn theme(&self, id: &ThemeId) -> Option<&Theme> {
        self.themes.iter().find(|t| &t.id == id)
    }
}
