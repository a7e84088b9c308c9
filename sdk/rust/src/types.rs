//! Wire types for the Go Botany REST resources

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// FILTER DEFINITIONS
// ============================================================================

/// Server metadata describing a character before any values are loaded
///
/// This is the shape of a pile's `default_filters` entries and the input to
/// [`crate::FilterManager::build_filter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub character_short_name: String,
    #[serde(default)]
    pub character_friendly_name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub key_characteristics: Option<String>,
    #[serde(default)]
    pub notable_exceptions: Option<String>,
}

impl FilterDefinition {
    pub fn new(character_short_name: impl Into<String>, value_type: Option<&str>) -> Self {
        Self {
            character_short_name: character_short_name.into(),
            value_type: value_type.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Entry of the pile characters listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CharacterDefinition {
    pub short_name: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub filter: CharacterFilterInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CharacterFilterInfo {
    #[serde(default)]
    pub key_characteristics: Option<String>,
    #[serde(default)]
    pub notable_exceptions: Option<String>,
}

impl From<CharacterDefinition> for FilterDefinition {
    fn from(def: CharacterDefinition) -> Self {
        Self {
            character_short_name: def.short_name,
            character_friendly_name: def.friendly_name,
            order: 0,
            value_type: def.value_type,
            unit: def.unit,
            key_characteristics: def.filter.key_characteristics,
            notable_exceptions: def.filter.notable_exceptions,
        }
    }
}

// ============================================================================
// PILE INFO
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PileInfo {
    #[serde(default)]
    pub character_groups: Vec<CharacterGroup>,
    #[serde(default)]
    pub plant_preview_characters: Vec<Value>,
    #[serde(default)]
    pub default_filters: Vec<FilterDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterGroup {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

// ============================================================================
// CHARACTER VALUES
// ============================================================================

/// Raw character-value record from the per-character resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterValue {
    #[serde(default)]
    pub value: Value,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CharacterValue {
    /// `[vmin, vmax]` of a numeric record; `None` when the pair is missing
    pub fn bounds(&self) -> Option<(Option<f64>, Option<f64>)> {
        match &self.value {
            Value::Array(pair) => Some((
                pair.first().and_then(Value::as_f64),
                pair.get(1).and_then(Value::as_f64),
            )),
            _ => None,
        }
    }
}

// ============================================================================
// SPECIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesItem {
    pub id: u64,
    #[serde(default)]
    pub scientific_name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl SpeciesItem {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// String attribute, `None` for missing or non-string values
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// Taxon search response: the `items` list plus whatever else the server sends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesResults {
    #[serde(default)]
    pub items: Vec<SpeciesItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
