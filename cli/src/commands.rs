//! Subcommand handlers

use anyhow::{Context, Result};
use gobotany::{
    BestFiltersQuery, Filter, FilterDefinition, FilterKind, FilterManager, SpeciesItem,
    SpeciesResults,
};
use serde_json::Value;

use crate::core::config::AppConfig;
use crate::core::constants::MAX_CHOOSE_BEST;
use crate::core::Commands;

pub async fn run(config: &AppConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Info { pile, defaults } => info(config, &pile, defaults).await,
        Commands::Values {
            pile,
            character,
            value_type,
        } => values(config, &pile, &character, &value_type).await,
        Commands::Best {
            pile,
            count,
            groups,
            exclude,
        } => best(config, &pile, count, groups, exclude).await,
        Commands::Query {
            pile,
            filters,
            require,
            defaults,
            json,
        } => query(config, &pile, filters, require, defaults, json).await,
    }
}

fn manager_for(config: &AppConfig, pile: &str) -> Result<FilterManager> {
    FilterManager::from_config(pile, &config.api)
        .with_context(|| format!("Failed to create client for pile '{}'", pile))
}

// ==================== info ====================

async fn info(config: &AppConfig, pile: &str, defaults: bool) -> Result<()> {
    let mut manager = manager_for(config, pile)?;
    let report = manager
        .load_pile_info(defaults)
        .await
        .with_context(|| format!("Failed to load pile '{}'", pile))?;

    println!("Pile: {}", manager.pile_slug());
    println!("Character groups:");
    for group in manager.character_groups() {
        println!("  {:>4}  {}", group.id, group.name);
    }
    println!(
        "Plant preview characters: {}",
        manager.plant_preview_characters().len()
    );

    if defaults {
        println!("Default filters ({}):", report.default_filters);
        for filter in manager.filters() {
            println!("  {}", describe_filter(filter));
        }
        for (name, err) in &report.failed {
            eprintln!("  warning: values for '{}' not loaded: {}", name, err);
        }
    }
    Ok(())
}

// ==================== values ====================

async fn values(config: &AppConfig, pile: &str, character: &str, value_type: &str) -> Result<()> {
    let manager = manager_for(config, pile)?;
    let value_type = value_type.to_uppercase();
    let definition = FilterDefinition::new(character, Some(value_type.as_str()));
    let filter = manager
        .build_filter(&definition)
        .await
        .with_context(|| format!("Failed to load values for '{}'", character))?;

    println!("{}", describe_filter(&filter));
    if let FilterKind::MultipleChoice(values) = filter.kind() {
        for value in values {
            println!("  {}", display_value(&value.value));
        }
    }
    Ok(())
}

// ==================== best ====================

async fn best(
    config: &AppConfig,
    pile: &str,
    count: Option<u32>,
    groups: Vec<u64>,
    exclude: Vec<String>,
) -> Result<()> {
    let count = count.unwrap_or(config.choose_best);
    if count == 0 || count > MAX_CHOOSE_BEST {
        anyhow::bail!("--count must be between 1 and {}", MAX_CHOOSE_BEST);
    }

    let mut manager = manager_for(config, pile)?;
    // Best filters are ranked against the current species set
    manager
        .run_filtered_query()
        .await
        .with_context(|| format!("Failed to query species for '{}'", pile))?;

    let query = BestFiltersQuery::new(count)
        .with_character_groups(groups)
        .excluding(exclude);
    let definitions = manager
        .query_best_filters(&query)
        .await
        .context("Failed to query best filters")?;

    println!(
        "Best {} of {} species in '{}':",
        definitions.len(),
        manager.species_count(),
        pile
    );
    for definition in &definitions {
        println!("  {}", describe_definition(definition));
    }
    Ok(())
}

// ==================== query ====================

async fn query(
    config: &AppConfig,
    pile: &str,
    filters: Vec<(String, String)>,
    require: Vec<(String, String)>,
    defaults: bool,
    json: bool,
) -> Result<()> {
    let mut manager = manager_for(config, pile)?;

    if defaults {
        let report = manager
            .load_pile_info(true)
            .await
            .with_context(|| format!("Failed to load pile '{}'", pile))?;
        for (name, err) in &report.failed {
            tracing::warn!(filter = %name, error = %err, "Default filter values not loaded");
        }
    }

    let missing: Vec<&str> = filters
        .iter()
        .map(|(name, _)| name.as_str())
        .filter(|name| !manager.has_filter(name))
        .collect();
    if !missing.is_empty() {
        let definitions = manager
            .query_filters(missing.as_slice())
            .await
            .context("Failed to look up filters")?;
        for definition in &definitions {
            // The filter is kept even when its values fail to load
            if let Err(e) = manager.add_filter(definition).await {
                tracing::warn!(
                    filter = %definition.character_short_name,
                    error = %e,
                    "Filter values not loaded"
                );
            }
        }
    }

    for (name, value) in &filters {
        if !manager.set_selected_value(name, Some(value)) {
            anyhow::bail!("Unknown filter '{}' for pile '{}'", name, pile);
        }
    }

    for (attribute, expected) in require {
        let name = attribute.clone();
        let added = manager.add_special_filter(&name, move |_, item| {
            attribute_matches(item, &attribute, &expected)
        });
        if !added {
            anyhow::bail!("'{}' is already a filter for pile '{}'", name, pile);
        }
    }

    let results = manager
        .run_filtered_query()
        .await
        .context("Species query failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("Query: {}", manager.as_query_string());
        print!("{}", render_results(&results, manager.species_count()));
    }
    Ok(())
}

// ==================== rendering ====================

/// Whether `item[attribute]` equals `expected`. Arrays match if any element does.
pub fn attribute_matches(item: &SpeciesItem, attribute: &str, expected: &str) -> bool {
    if attribute == "scientific_name" {
        return item.scientific_name == expected;
    }
    match item.get(attribute) {
        Some(Value::Array(values)) => values.iter().any(|v| display_value(v) == expected),
        Some(v) => display_value(v) == expected,
        None => false,
    }
}

/// Render a JSON value without quoting strings
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn describe_filter(filter: &Filter) -> String {
    let domain = match filter.kind() {
        FilterKind::Plain => String::new(),
        FilterKind::MultipleChoice(values) => format!(" [{} values]", values.len()),
        FilterKind::NumericRange(range) => match (range.min, range.max) {
            (Some(min), Some(max)) => format!(" [{}..{}]", min, max),
            (Some(min), None) => format!(" [{}..]", min),
            (None, Some(max)) => format!(" [..{}]", max),
            (None, None) => " [no range]".to_string(),
        },
    };
    let unit = filter
        .unit
        .as_deref()
        .map(|u| format!(" ({})", u))
        .unwrap_or_default();
    format!(
        "{} - {}{}{}",
        filter.character_short_name, filter.friendly_name, unit, domain
    )
}

pub fn describe_definition(definition: &FilterDefinition) -> String {
    let value_type = definition.value_type.as_deref().unwrap_or("-");
    format!(
        "{} - {} <{}>",
        definition.character_short_name, definition.character_friendly_name, value_type
    )
}

pub fn render_results(results: &SpeciesResults, total: usize) -> String {
    let mut out = format!("Matched {} of {} species\n", results.items.len(), total);
    for item in &results.items {
        out.push_str(&format!("  {:>6}  {}\n", item.id, item.scientific_name));
    }
    out
}
