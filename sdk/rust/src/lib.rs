//! # gobotany
//!
//! Filter and query state for the Go Botany plant identification API.
//!
//! A [`FilterManager`] tracks the active filters of one pile, loads filter
//! definitions and value domains from the REST API, serializes the current
//! selection as a query string and runs the combined species query:
//! server-side filtering by selected values, then client-side "special"
//! filter predicates.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gobotany::{ClientConfig, FilterManager};
//!
//! # async fn run() -> Result<(), gobotany::ClientError> {
//! let config = ClientConfig::new("https://gobotany.nativeplanttrust.org")?;
//! let mut manager = FilterManager::from_config("woody-plants", &config)?;
//!
//! manager.load_pile_info(true).await?;
//! manager.set_selected_value("leaf_type", Some("simple"));
//! manager.add_special_filter("evergreen", |_, item| {
//!     item.get("evergreen").and_then(|v| v.as_bool()).unwrap_or(false)
//! });
//!
//! let results = manager.run_filtered_query().await?;
//! println!("{} of {} species", results.items.len(), manager.species_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod loading;
pub mod manager;
pub mod query;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, Endpoints};
pub use error::ClientError;
pub use events::{FilterEvent, Listeners};
pub use filter::{Filter, FilterKind, FilterPredicate, NumericRange, ValueType};
pub use loading::PendingLoads;
pub use manager::{FilterManager, PileLoadReport};
pub use query::BestFiltersQuery;
pub use transport::{HttpTransport, QueryParams, Transport};
pub use types::{
    CharacterDefinition, CharacterGroup, CharacterValue, FilterDefinition, PileInfo, SpeciesItem,
    SpeciesResults,
};
