//! Filter manager
//!
//! Owns a pile's active filters and turns them into species queries.
//!
//! - Filter definitions come from the pile resource (defaults) or the pile
//!   characters resource (best-N or explicit inclusion)
//! - Normal filters become taxon query parameters; special filters run as
//!   client-side predicates over the server's answer
//! - Lifecycle changes are reported to registered listeners

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ClientConfig, Endpoints};
use crate::error::ClientError;
use crate::events::{FilterEvent, Listeners};
use crate::filter::{Filter, fetch_character_values};
use crate::loading::PendingLoads;
use crate::query::{
    BestFiltersQuery, filters_query_string, include_filters_params, species_query_params,
};
use crate::transport::{HttpTransport, QueryParams, Transport};
use crate::types::{
    CharacterDefinition, CharacterGroup, FilterDefinition, PileInfo, SpeciesItem, SpeciesResults,
};

/// Outcome of [`FilterManager::load_pile_info`]
#[derive(Debug, Default)]
pub struct PileLoadReport {
    /// Default filters added to the manager
    pub default_filters: usize,
    /// Value fetches that failed, by filter short name. Those filters stay
    /// in place with an empty value domain.
    pub failed: Vec<(String, ClientError)>,
}

impl PileLoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct FilterManager {
    pile_slug: String,
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    filters: Vec<Filter>,
    species_ids: Vec<u64>,
    species_count: usize,
    character_groups: Vec<CharacterGroup>,
    plant_preview_characters: Vec<Value>,
    filters_loading: PendingLoads,
    listeners: Listeners,
}

impl FilterManager {
    pub fn new(pile_slug: &str, transport: Arc<dyn Transport>, endpoints: Endpoints) -> Self {
        tracing::debug!(pile = %pile_slug, "Filter manager created");
        Self {
            pile_slug: pile_slug.to_string(),
            transport,
            endpoints,
            filters: Vec::new(),
            species_ids: Vec::new(),
            species_count: 0,
            character_groups: Vec::new(),
            plant_preview_characters: Vec::new(),
            filters_loading: PendingLoads::default(),
            listeners: Listeners::new(),
        }
    }

    /// Manager over an HTTP transport built from `config`
    pub fn from_config(pile_slug: &str, config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(pile_slug, Arc::new(transport), config.endpoints()))
    }

    // ==================== Accessors ====================

    pub fn pile_slug(&self) -> &str {
        &self.pile_slug
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn filter(&self, short_name: &str) -> Option<&Filter> {
        self.filters
            .iter()
            .find(|f| f.character_short_name == short_name)
    }

    fn filter_mut(&mut self, short_name: &str) -> Option<&mut Filter> {
        self.filters
            .iter_mut()
            .find(|f| f.character_short_name == short_name)
    }

    /// Ids matched by the last successful species query, before special filters
    pub fn species_ids(&self) -> &[u64] {
        &self.species_ids
    }

    pub fn species_count(&self) -> usize {
        self.species_count
    }

    pub fn character_groups(&self) -> &[CharacterGroup] {
        &self.character_groups
    }

    pub fn plant_preview_characters(&self) -> &[Value] {
        &self.plant_preview_characters
    }

    /// Default-filter value loads still outstanding
    pub fn filters_loading(&self) -> usize {
        self.filters_loading.remaining()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&FilterEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener);
    }

    // ==================== Remote Access ====================

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, ClientError> {
        let body = match self.transport.get_json(path, params).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Request failed");
                return Err(e);
            }
        };
        serde_json::from_value(body).map_err(|e| {
            tracing::warn!(path = %path, error = %e, "Unexpected response shape");
            ClientError::decode(path, e)
        })
    }

    // ==================== Filter Definitions ====================

    /// Ask the server for the best `choose_best` filters for the current
    /// species and character-group selection. Nothing is added.
    pub async fn query_best_filters(
        &self,
        query: &BestFiltersQuery,
    ) -> Result<Vec<FilterDefinition>, ClientError> {
        let params = query.to_params(&self.species_ids);
        self.query_characters(params).await
    }

    /// Definitions for explicitly named characters. Nothing is added.
    pub async fn query_filters<S: AsRef<str>>(
        &self,
        short_names: &[S],
    ) -> Result<Vec<FilterDefinition>, ClientError> {
        self.query_characters(include_filters_params(short_names))
            .await
    }

    async fn query_characters(
        &self,
        params: QueryParams,
    ) -> Result<Vec<FilterDefinition>, ClientError> {
        let path = self.endpoints.characters(&self.pile_slug);
        let characters: Vec<CharacterDefinition> = self.fetch(&path, &params).await?;
        tracing::debug!(
            pile = %self.pile_slug,
            count = characters.len(),
            "Received filter definitions"
        );
        Ok(characters.into_iter().map(FilterDefinition::from).collect())
    }

    // ==================== Pile Info ====================

    /// Fetch pile metadata and optionally install the pile's default filters.
    ///
    /// With defaults, every default filter is added immediately and their
    /// value listings are fetched concurrently. The call resolves, and
    /// `PileInfoLoaded` / `DefaultFiltersLoaded` fire, once every fetch has
    /// finished. A failed fetch counts as finished and is reported; a fetch
    /// that never finishes keeps this future pending.
    pub async fn load_pile_info(
        &mut self,
        load_default_filters: bool,
    ) -> Result<PileLoadReport, ClientError> {
        let path = self.endpoints.pile(&self.pile_slug);
        let info: PileInfo = self.fetch(&path, &QueryParams::new()).await?;

        self.character_groups = info.character_groups;
        self.plant_preview_characters = info.plant_preview_characters;
        self.listeners.emit(FilterEvent::CharacterGroupsChanged);

        let mut report = PileLoadReport::default();
        if !load_default_filters {
            self.listeners.emit(FilterEvent::PileInfoLoaded);
            return Ok(report);
        }

        let transport = Arc::clone(&self.transport);
        let mut loads = FuturesUnordered::new();
        for definition in &info.default_filters {
            let filter = Filter::from_definition(definition, &self.pile_slug, &self.endpoints);
            let short_name = filter.character_short_name.clone();
            let remote = filter.kind().has_remote_values();
            let values_path = filter.values_path().to_string();
            if !self.insert_filter(filter) {
                continue;
            }

            let transport = Arc::clone(&transport);
            loads.push(async move {
                if !remote {
                    return (short_name, Ok(Vec::new()));
                }
                let result = fetch_character_values(transport.as_ref(), &values_path).await;
                (short_name, result)
            });
        }

        report.default_filters = loads.len();
        self.filters_loading = PendingLoads::new(loads.len());
        tracing::debug!(
            pile = %self.pile_slug,
            filters = report.default_filters,
            "Loading default filter values"
        );

        while let Some((short_name, result)) = loads.next().await {
            match result {
                Ok(values) => {
                    if let Some(filter) = self.filter_mut(&short_name) {
                        filter.absorb_values(values);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        filter = %short_name,
                        error = %e,
                        "Failed to load default filter values"
                    );
                    report.failed.push((short_name, e));
                }
            }
            self.filters_loading.complete();
        }

        self.listeners.emit(FilterEvent::PileInfoLoaded);
        self.listeners.emit(FilterEvent::DefaultFiltersLoaded);
        Ok(report)
    }

    // ==================== Filter Collection ====================

    /// Construct the filter for `definition` and load its values
    pub async fn build_filter(
        &self,
        definition: &FilterDefinition,
    ) -> Result<Filter, ClientError> {
        let mut filter = Filter::from_definition(definition, &self.pile_slug, &self.endpoints);
        if let Err(e) = filter.load_values(self.transport.as_ref()).await {
            tracing::warn!(
                filter = %filter.character_short_name,
                error = %e,
                "Failed to load filter values"
            );
            return Err(e);
        }
        Ok(filter)
    }

    /// Append a filter, then load its values. An already present short
    /// name is kept as-is and returned.
    ///
    /// The filter stays in place when the value fetch fails; the error is
    /// returned and its value domain is left empty.
    pub async fn add_filter(
        &mut self,
        definition: &FilterDefinition,
    ) -> Result<&Filter, ClientError> {
        if let Some(index) = self.position(&definition.character_short_name) {
            tracing::debug!(
                filter = %definition.character_short_name,
                "Filter already present"
            );
            return Ok(&self.filters[index]);
        }
        let filter = Filter::from_definition(definition, &self.pile_slug, &self.endpoints);
        self.insert_filter(filter);

        let index = self.filters.len() - 1;
        let transport = Arc::clone(&self.transport);
        let filter = &mut self.filters[index];
        if let Err(e) = filter.load_values(transport.as_ref()).await {
            tracing::warn!(
                filter = %filter.character_short_name,
                error = %e,
                "Failed to load filter values"
            );
            return Err(e);
        }
        Ok(&self.filters[index])
    }

    /// Append a client-side filter. `predicate` returns `true` for items to
    /// keep. Returns `false` if the short name is already taken.
    pub fn add_special_filter<F>(&mut self, short_name: &str, predicate: F) -> bool
    where
        F: Fn(&Filter, &SpeciesItem) -> bool + Send + Sync + 'static,
    {
        let filter = Filter::special(
            short_name,
            &self.pile_slug,
            &self.endpoints,
            Arc::new(predicate),
        );
        self.insert_filter(filter)
    }

    fn insert_filter(&mut self, filter: Filter) -> bool {
        if self.has_filter(&filter.character_short_name) {
            tracing::warn!(
                filter = %filter.character_short_name,
                "Filter already present, not adding"
            );
            return false;
        }
        tracing::debug!(
            filter = %filter.character_short_name,
            special = filter.is_special(),
            "Filter added"
        );
        let short_name = filter.character_short_name.clone();
        self.filters.push(filter);
        self.listeners.emit(FilterEvent::FilterAdded { short_name });
        true
    }

    fn position(&self, short_name: &str) -> Option<usize> {
        self.filters
            .iter()
            .position(|f| f.character_short_name == short_name)
    }

    pub fn has_filter(&self, short_name: &str) -> bool {
        self.position(short_name).is_some()
    }

    pub fn remove_filter(&mut self, short_name: &str) -> Option<Filter> {
        let Some(index) = self.position(short_name) else {
            tracing::debug!(filter = %short_name, "No filter to remove");
            return None;
        };
        let filter = self.filters.remove(index);
        self.listeners.emit(FilterEvent::FilterRemoved {
            short_name: short_name.to_string(),
        });
        Some(filter)
    }

    /// Drop every filter. Unlike `remove_filter`, no `FilterRemoved`
    /// events are emitted.
    pub fn empty_filters(&mut self) {
        tracing::debug!(count = self.filters.len(), "Emptying filters");
        self.filters.clear();
    }

    // ==================== Selected Values ====================

    /// Select a value for a filter. Values are stored in their string form,
    /// which is what queries compare and transmit. Returns `false` for an
    /// unknown filter.
    pub fn set_selected_value<V: ToString>(&mut self, short_name: &str, value: Option<V>) -> bool {
        let value = value.map(|v| v.to_string());
        let Some(filter) = self.filter_mut(short_name) else {
            tracing::warn!(filter = %short_name, "Cannot set a value for unknown filter");
            return false;
        };
        filter.set_selected_value(value.clone());
        self.listeners.emit(FilterEvent::FilterChanged {
            short_name: short_name.to_string(),
            selected_value: value,
        });
        true
    }

    pub fn clear_selected_value(&mut self, short_name: &str) -> bool {
        self.set_selected_value::<String>(short_name, None)
    }

    /// Non-empty selected value of a filter
    pub fn get_selected_value(&self, short_name: &str) -> Option<&str> {
        self.filter(short_name).and_then(Filter::active_value)
    }

    pub fn as_query_string(&self) -> String {
        filters_query_string(&self.filters)
    }

    // ==================== Species Query ====================

    /// Query the taxon resource with every normal filter's value, then keep
    /// only the items every special filter accepts.
    ///
    /// `species_ids` / `species_count` reflect the server's answer before
    /// special filtering. On failure they keep their previous values.
    pub async fn run_filtered_query(&mut self) -> Result<SpeciesResults, ClientError> {
        let params = species_query_params(&self.pile_slug, &self.filters);
        tracing::debug!(pile = %self.pile_slug, params = ?params, "Running filtered query");

        let path = self.endpoints.taxon().to_string();
        let mut results: SpeciesResults = self.fetch(&path, &params).await?;

        self.species_count = results.items.len();
        self.species_ids = results.items.iter().map(|item| item.id).collect();

        let special: Vec<&Filter> = self.filters.iter().filter(|f| f.is_special()).collect();
        if !special.is_empty() {
            results
                .items
                .retain(|item| special.iter().all(|filter| filter.accepts(item)));
            tracing::debug!(
                matched = self.species_count,
                kept = results.items.len(),
                special = special.len(),
                "Applied special filters"
            );
        }

        Ok(results)
    }
}

impl fmt::Debug for FilterManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterManager")
            .field("pile_slug", &self.pile_slug)
            .field("endpoints", &self.endpoints)
            .field("filters", &self.filters)
            .field("species_count", &self.species_count)
            .field("filters_loading", &self.filters_loading.remaining())
            .field("listeners", &self.listeners)
            .finish()
    }
}
