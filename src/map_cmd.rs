//! `map`: dry run of header resolution for a sheet.
//!
//! Only the header row is read. The result lists every header in sheet
//! order with the canonical field it resolved to and how, followed by
//! overrides for headers the sheet does not contain.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    cli::{MapArgs, SheetArgs},
    io_utils,
    resolver::{HeaderResolver, Overrides, Resolution, ResolvedHeader},
    table,
    vocabulary::Vocabulary,
};

#[derive(Debug, Serialize)]
struct MapReport<'a> {
    entries: &'a [ResolvedHeader],
    unmapped: Vec<&'a str>,
    resolved_fields: Vec<&'a str>,
}

pub fn execute(args: &MapArgs) -> Result<()> {
    let vocabulary = Vocabulary::load_or_builtin(args.sheet.vocabulary.as_deref())?;
    let headers = read_sheet_headers(&args.sheet)?;
    let overrides = sheet_overrides(&args.sheet);
    let resolution = HeaderResolver::new(&vocabulary)
        .resolve(&headers, overrides.as_ref())
        .with_context(|| format!("Resolving headers of {:?}", args.sheet.input))?;

    if args.json {
        let report = MapReport {
            entries: resolution.entries(),
            unmapped: resolution.unmapped(),
            resolved_fields: resolution.resolved_fields().into_iter().collect(),
        };
        let rendered =
            serde_json::to_string_pretty(&report).context("Serializing mapping to JSON")?;
        println!("{rendered}");
    } else {
        let table_headers = ["#", "header", "field", "match", "score"]
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        table::print_table(&table_headers, &mapping_rows(&resolution));
    }
    info!(
        "Mapped {} of {} header(s); {} left unmapped",
        resolution.mapping().len(),
        headers.len(),
        resolution.unmapped().len()
    );
    Ok(())
}

pub(crate) fn read_sheet_headers(sheet: &SheetArgs) -> Result<Vec<String>> {
    let delimiter = io_utils::resolve_input_delimiter(&sheet.input, sheet.delimiter);
    let encoding = io_utils::resolve_encoding(sheet.input_encoding.as_deref())?;
    io_utils::read_headers(&sheet.input, delimiter, encoding)
        .with_context(|| format!("Reading headers from {:?}", sheet.input))
}

/// Overrides given on the command line, or `None` when there are none.
pub(crate) fn sheet_overrides(sheet: &SheetArgs) -> Option<Overrides> {
    if sheet.overrides.is_empty() {
        return None;
    }
    Some(sheet.overrides.iter().cloned().collect())
}

fn mapping_rows(resolution: &Resolution) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut listed = std::collections::HashSet::new();
    for raw in resolution.found() {
        if !listed.insert(raw.as_str()) {
            continue;
        }
        let row = match resolution.entries().iter().find(|e| &e.raw == raw) {
            Some(entry) => entry_row(entry),
            None => vec![raw.clone(), String::new(), "unmapped".to_string(), String::new()],
        };
        rows.push(row);
    }
    for entry in resolution.entries() {
        if !listed.contains(entry.raw.as_str()) {
            rows.push(entry_row(entry));
        }
    }
    rows.into_iter()
        .enumerate()
        .map(|(idx, mut row)| {
            row.insert(0, (idx + 1).to_string());
            row
        })
        .collect()
}

fn entry_row(entry: &ResolvedHeader) -> Vec<String> {
    vec![
        entry.raw.clone(),
        entry.field.clone(),
        entry.kind.label().to_string(),
        entry
            .kind
            .score()
            .map(|score| format!("{score:.2}"))
            .unwrap_or_default(),
    ]
}
