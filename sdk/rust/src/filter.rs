//! Filters and their value domains
//!
//! A [`Filter`] is one filterable plant character. Its value domain is a
//! tagged [`FilterKind`]:
//! - `Plain` - no value enumeration, nothing to fetch
//! - `MultipleChoice` - the raw value records, in arrival order
//! - `NumericRange` - running `{min, max}` over the `[vmin, vmax]` records

use std::fmt;
use std::sync::Arc;

use crate::config::Endpoints;
use crate::error::ClientError;
use crate::transport::{QueryParams, Transport};
use crate::types::{CharacterValue, FilterDefinition, SpeciesItem};

/// Client-side inclusion test of a special filter. Returns `true` to keep
/// the item.
pub type FilterPredicate = Arc<dyn Fn(&Filter, &SpeciesItem) -> bool + Send + Sync>;

// ============================================================================
// VALUE TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Length,
    Text,
    Other(String),
}

impl ValueType {
    pub fn parse(value_type: &str) -> Self {
        match value_type {
            "LENGTH" => Self::Length,
            "TEXT" => Self::Text,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Length => "LENGTH",
            Self::Text => "TEXT",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VALUE DOMAINS
// ============================================================================

/// Bounds over all non-null numeric value pairs seen so far
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    /// Fold one record into the bounds. Order of arrival does not matter.
    pub fn process_value(&mut self, value: &CharacterValue) {
        let Some((vmin, vmax)) = value.bounds() else {
            return;
        };
        if let Some(vmin) = vmin
            && self.min.is_none_or(|min| min > vmin)
        {
            self.min = Some(vmin);
        }
        if let Some(vmax) = vmax
            && self.max.is_none_or(|max| max < vmax)
        {
            self.max = Some(vmax);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    Plain,
    MultipleChoice(Vec<CharacterValue>),
    NumericRange(NumericRange),
}

impl FilterKind {
    /// `LENGTH` -> numeric range, `TEXT` -> multiple choice, anything else plain
    pub fn for_value_type(value_type: Option<&ValueType>) -> Self {
        match value_type {
            Some(ValueType::Length) => Self::NumericRange(NumericRange::default()),
            Some(ValueType::Text) => Self::MultipleChoice(Vec::new()),
            _ => Self::Plain,
        }
    }

    pub fn process_value(&mut self, value: CharacterValue) {
        match self {
            Self::Plain => {}
            Self::MultipleChoice(values) => values.push(value),
            Self::NumericRange(range) => range.process_value(&value),
        }
    }

    /// Whether the kind has a remote value listing to load
    pub fn has_remote_values(&self) -> bool {
        !matches!(self, Self::Plain)
    }
}

// ============================================================================
// FILTER
// ============================================================================

#[derive(Clone)]
pub struct Filter {
    pub character_short_name: String,
    pub friendly_name: String,
    pub order: i64,
    pub pile_slug: String,
    pub value_type: Option<ValueType>,
    pub unit: Option<String>,
    pub key_characteristics: Option<String>,
    pub notable_exceptions: Option<String>,
    selected_value: Option<String>,
    filter_callback: Option<FilterPredicate>,
    kind: FilterKind,
    values_path: String,
}

impl Filter {
    pub fn from_definition(
        definition: &FilterDefinition,
        pile_slug: &str,
        endpoints: &Endpoints,
    ) -> Self {
        let value_type = definition.value_type.as_deref().map(ValueType::parse);
        let kind = FilterKind::for_value_type(value_type.as_ref());
        Self {
            character_short_name: definition.character_short_name.clone(),
            friendly_name: definition.character_friendly_name.clone(),
            order: definition.order,
            pile_slug: pile_slug.to_string(),
            value_type,
            unit: definition.unit.clone(),
            key_characteristics: definition.key_characteristics.clone(),
            notable_exceptions: definition.notable_exceptions.clone(),
            selected_value: None,
            filter_callback: None,
            kind,
            values_path: endpoints.character_values(pile_slug, &definition.character_short_name),
        }
    }

    /// Plain filter applied client-side through `predicate`
    pub fn special(
        character_short_name: &str,
        pile_slug: &str,
        endpoints: &Endpoints,
        predicate: FilterPredicate,
    ) -> Self {
        let mut filter = Self::from_definition(
            &FilterDefinition::new(character_short_name, None),
            pile_slug,
            endpoints,
        );
        filter.filter_callback = Some(predicate);
        filter
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub fn values_path(&self) -> &str {
        &self.values_path
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected_value.as_deref()
    }

    pub(crate) fn set_selected_value(&mut self, value: Option<String>) {
        self.selected_value = value;
    }

    /// Non-empty selected value, the only kind that reaches a server query
    pub fn active_value(&self) -> Option<&str> {
        self.selected_value().filter(|v| !v.is_empty())
    }

    pub fn is_special(&self) -> bool {
        self.filter_callback.is_some()
    }

    /// Run the special-filter predicate; non-special filters keep everything
    pub fn accepts(&self, item: &SpeciesItem) -> bool {
        match &self.filter_callback {
            Some(callback) => callback(self, item),
            None => true,
        }
    }

    pub fn process_value(&mut self, value: CharacterValue) {
        self.kind.process_value(value);
    }

    pub(crate) fn absorb_values(&mut self, values: Vec<CharacterValue>) {
        for value in values {
            self.process_value(value);
        }
    }

    /// Fetch and fold the character's value listing. Plain filters have
    /// nothing to load and return immediately.
    pub async fn load_values(&mut self, transport: &dyn Transport) -> Result<(), ClientError> {
        if !self.kind.has_remote_values() {
            return Ok(());
        }
        let values = fetch_character_values(transport, &self.values_path).await?;
        tracing::debug!(
            filter = %self.character_short_name,
            count = values.len(),
            "Loaded filter values"
        );
        self.absorb_values(values);
        Ok(())
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("character_short_name", &self.character_short_name)
            .field("friendly_name", &self.friendly_name)
            .field("order", &self.order)
            .field("pile_slug", &self.pile_slug)
            .field("value_type", &self.value_type)
            .field("unit", &self.unit)
            .field("selected_value", &self.selected_value)
            .field("special", &self.is_special())
            .field("kind", &self.kind)
            .finish()
    }
}

pub(crate) async fn fetch_character_values(
    transport: &dyn Transport,
    path: &str,
) -> Result<Vec<CharacterValue>, ClientError> {
    let body = transport.get_json(path, &QueryParams::new()).await?;
    serde_json::from_value(body).map_err(|e| ClientError::decode(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn numeric(vmin: Option<f64>, vmax: Option<f64>) -> CharacterValue {
        serde_json::from_value(json!({ "value": [vmin, vmax] })).unwrap()
    }

    fn definition(name: &str, value_type: Option<&str>) -> FilterDefinition {
        FilterDefinition::new(name, value_type)
    }

    #[test]
    fn test_kind_by_value_type() {
        let endpoints = Endpoints::default();
        let length = Filter::from_definition(&definition("height", Some("LENGTH")), "p", &endpoints);
        let text = Filter::from_definition(&definition("shape", Some("TEXT")), "p", &endpoints);
        let other = Filter::from_definition(&definition("habitat", Some("BOOL")), "p", &endpoints);
        let none = Filter::from_definition(&definition("misc", None), "p", &endpoints);

        assert!(matches!(length.kind(), FilterKind::NumericRange(_)));
        assert!(matches!(text.kind(), FilterKind::MultipleChoice(v) if v.is_empty()));
        assert!(matches!(other.kind(), FilterKind::Plain));
        assert_eq!(other.value_type, Some(ValueType::Other("BOOL".to_string())));
        assert!(matches!(none.kind(), FilterKind::Plain));
    }

    #[test]
    fn test_values_path() {
        let filter = Filter::from_definition(
            &definition("leaf_length", Some("LENGTH")),
            "woody-plants",
            &Endpoints::default(),
        );
        assert_eq!(filter.values_path(), "/piles/woody-plants/leaf_length/");
    }

    #[test]
    fn test_multiple_choice_appends_in_order() {
        let mut kind = FilterKind::MultipleChoice(Vec::new());
        kind.process_value(serde_json::from_value(json!({"value": "oval"})).unwrap());
        kind.process_value(serde_json::from_value(json!({"value": "round"})).unwrap());
        let FilterKind::MultipleChoice(values) = kind else {
            panic!("kind changed");
        };
        assert_eq!(values[0].value, json!("oval"));
        assert_eq!(values[1].value, json!("round"));
    }

    #[test]
    fn test_numeric_range_skips_nulls() {
        let mut range = NumericRange::default();
        range.process_value(&serde_json::from_value(json!({"value": null})).unwrap());
        assert!(range.is_empty());

        range.process_value(&numeric(None, Some(8.0)));
        assert_eq!(range.min, None);
        assert_eq!(range.max, Some(8.0));

        range.process_value(&numeric(Some(2.0), Some(5.0)));
        assert_eq!(range, NumericRange { min: Some(2.0), max: Some(8.0) });
    }

    #[test]
    fn test_plain_ignores_values() {
        let mut kind = FilterKind::Plain;
        kind.process_value(numeric(Some(1.0), Some(2.0)));
        assert_eq!(kind, FilterKind::Plain);
        assert!(!kind.has_remote_values());
    }

    #[test]
    fn test_special_filter_predicate() {
        let filter = Filter::special(
            "color",
            "p",
            &Endpoints::default(),
            Arc::new(|_, item| item.get_str("color") == Some("red")),
        );
        let red: SpeciesItem =
            serde_json::from_value(json!({"id": 1, "color": "red"})).unwrap();
        let blue: SpeciesItem =
            serde_json::from_value(json!({"id": 2, "color": "blue"})).unwrap();

        assert!(filter.is_special());
        assert!(filter.accepts(&red));
        assert!(!filter.accepts(&blue));
        assert!(matches!(filter.kind(), FilterKind::Plain));
    }

    #[test]
    fn test_active_value_ignores_empty() {
        let mut filter =
            Filter::from_definition(&definition("shape", Some("TEXT")), "p", &Endpoints::default());
        assert_eq!(filter.active_value(), None);
        filter.set_selected_value(Some(String::new()));
        assert_eq!(filter.active_value(), None);
        filter.set_selected_value(Some("oval".to_string()));
        assert_eq!(filter.active_value(), Some("oval"));
    }

    fn bound() -> impl Strategy<Value = Option<f64>> {
        prop::option::of(-1000i32..1000).prop_map(|v| v.map(f64::from))
    }

    proptest! {
        #[test]
        fn prop_numeric_range_order_independent(
            pairs in prop::collection::vec(prop::option::of((bound(), bound())), 0..24),
            seed in any::<u64>(),
        ) {
            let records: Vec<CharacterValue> = pairs
                .iter()
                .map(|pair| match pair {
                    Some((lo, hi)) => numeric(*lo, *hi),
                    None => serde_json::from_value(json!({"value": null})).unwrap(),
                })
                .collect();

            let expected_min = pairs.iter().flatten().filter_map(|(lo, _)| *lo).reduce(f64::min);
            let expected_max = pairs.iter().flatten().filter_map(|(_, hi)| *hi).reduce(f64::max);

            let mut forward = NumericRange::default();
            records.iter().for_each(|r| forward.process_value(r));

            // Deterministic shuffle driven by the seed
            let mut shuffled = records.clone();
            let mut state = seed;
            for i in (1..shuffled.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
            let mut permuted = NumericRange::default();
            shuffled.iter().for_each(|r| permuted.process_value(r));

            prop_assert_eq!(forward, permuted);
            prop_assert_eq!(forward.min, expected_min);
            prop_assert_eq!(forward.max, expected_max);
        }
    }
}
