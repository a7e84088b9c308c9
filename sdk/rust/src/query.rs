//! Query builders for the characters and taxon resources

use url::form_urlencoded::byte_serialize;

use crate::config::DEFAULT_CHOOSE_BEST;
use crate::filter::Filter;
use crate::transport::QueryParams;

/// Marker key listing the active filter names
pub const FILTERS_KEY: &str = "_filters";

/// Form-encode with spaces as `%20`. A literal `+` is already `%2B`.
fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `_filters=<n1,n2,...>&n1=v1&n2=v2...` in filter order
///
/// Every filter contributes a pair; filters without a selected value
/// serialize as `name=`.
pub fn filters_query_string(filters: &[Filter]) -> String {
    let names: Vec<String> = filters
        .iter()
        .map(|f| encode(&f.character_short_name))
        .collect();

    let mut out = format!("{}={}", FILTERS_KEY, names.join(","));
    for (filter, name) in filters.iter().zip(&names) {
        out.push('&');
        out.push_str(name);
        out.push('=');
        out.push_str(&encode(filter.selected_value().unwrap_or_default()));
    }
    out
}

/// Parameters of the taxon search: the pile plus every normal filter with a
/// non-empty value. Special filters never reach the server.
pub fn species_query_params(pile_slug: &str, filters: &[Filter]) -> QueryParams {
    let mut params = QueryParams::new();
    params.push("pile", pile_slug);
    for filter in filters.iter().filter(|f| !f.is_special()) {
        if let Some(value) = filter.active_value() {
            params.push(filter.character_short_name.as_str(), value);
        }
    }
    params
}

/// Server-side "best N filters" selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BestFiltersQuery {
    pub choose_best: Option<u32>,
    pub character_group_ids: Vec<u64>,
    /// Short names the caller already shows
    pub existing_characters: Vec<String>,
}

impl BestFiltersQuery {
    pub fn new(choose_best: u32) -> Self {
        Self {
            choose_best: Some(choose_best),
            ..Self::default()
        }
    }

    pub fn with_character_groups(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.character_group_ids.extend(ids);
        self
    }

    pub fn excluding<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.existing_characters
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// `choose_best`, `species_id`, `character_group_id`, `exclude`,
    /// `include_filter=1`
    pub fn to_params(&self, species_ids: &[u64]) -> QueryParams {
        let mut params = QueryParams::new();
        params.push(
            "choose_best",
            self.choose_best
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_CHOOSE_BEST)
                .to_string(),
        );
        params
            .push_all("species_id", species_ids)
            .push_all("character_group_id", &self.character_group_ids)
            .push_all("exclude", &self.existing_characters)
            .push("include_filter", "1");
        params
    }
}

/// Explicit inclusion by short name
pub fn include_filters_params<S: AsRef<str>>(short_names: &[S]) -> QueryParams {
    let mut params = QueryParams::new();
    for name in short_names {
        params.push("include", AsRef::<str>::as_ref(name));
    }
    params.push("include_filter", "1");
    params
}
