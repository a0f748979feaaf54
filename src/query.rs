//! `query`: public lookup of stored records.
//!
//! A record matches when its identity column equals the requested identity
//! (both trimmed) and its date column denotes the same day as the requested
//! date. Both sides of the date comparison go through
//! [`parse_input_date`], so `15/03/2019`, `2019-03-15` and a stored
//! `2019-03-15` all agree. Matches are projected onto the visible columns.

use anyhow::{Context, Result};
use log::info;
use serde_json::{Map, Value, json};

use crate::{
    cli::QueryArgs,
    config::LookupConfig,
    data::{Cell, Dataset, parse_input_date},
    error::LookupError,
    store::Store,
    table,
};

pub const NOT_FOUND_MESSAGE: &str = "No record found for that identity and date";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl LookupResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let results: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| {
                        let value = cell.clone().map(Value::String).unwrap_or(Value::Null);
                        (column.clone(), value)
                    })
                    .collect();
                Value::Object(object)
            })
            .collect();
        if results.is_empty() {
            json!({ "found": false, "message": NOT_FOUND_MESSAGE })
        } else {
            json!({ "found": true, "results": results })
        }
    }
}

pub fn lookup(
    dataset: &Dataset,
    config: &LookupConfig,
    identity: &str,
    date: &str,
) -> Result<LookupResult, LookupError> {
    config.validate_against(dataset.headers())?;
    let column = |name: &str| dataset.column_index(name).unwrap_or_default();
    let identity_idx = column(&config.identity_column);
    let date_idx = column(&config.date_column);
    let visible: Vec<usize> = config
        .visible_columns
        .iter()
        .map(|name| column(name))
        .collect();

    let wanted_identity = identity.trim();
    let wanted_date = parse_input_date(date);
    let rows = dataset
        .rows()
        .iter()
        .filter(|row| {
            let identity_matches = row[identity_idx]
                .as_deref()
                .is_some_and(|value| value.trim() == wanted_identity);
            identity_matches
                && row[date_idx]
                    .as_deref()
                    .is_some_and(|value| parse_input_date(value) == wanted_date)
        })
        .map(|row| visible.iter().map(|&idx| row[idx].clone()).collect())
        .collect();

    Ok(LookupResult {
        columns: config.visible_columns.clone(),
        rows,
    })
}

pub fn execute(args: &QueryArgs) -> Result<()> {
    let store = Store::open(&args.store);
    let config = store.load_config()?.ok_or(LookupError::NotConfigured)?;
    let available = store.available_columns()?;
    config.validate_against(&available)?;
    let dataset = store.load_dataset()?;
    let result = lookup(&dataset, &config, &args.identity, &args.date)
        .context("Looking up stored records")?;
    info!(
        "Lookup for identity '{}' on {} matched {} record(s)",
        args.identity.trim(),
        parse_input_date(&args.date),
        result.rows.len()
    );

    if args.json {
        let rendered = serde_json::to_string_pretty(&result.to_json())
            .context("Serializing lookup result to JSON")?;
        println!("{rendered}");
    } else if result.is_empty() {
        println!("{NOT_FOUND_MESSAGE}");
    } else {
        let rows: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.clone().unwrap_or_default()).collect())
            .collect();
        table::print_table(&result.columns, &rows);
    }
    Ok(())
}
