use anyhow::Result;
use log::{info, warn};

use crate::{
    cli::StatusArgs,
    store::{Store, StoreMeta},
    table,
};

pub fn execute(args: &StatusArgs) -> Result<()> {
    let store = Store::open(&args.store);
    let Some(meta) = store.load_meta()? else {
        println!("Store {:?} is empty; ingest a sheet first", store.root());
        return Ok(());
    };
    let config = store.load_config()?;

    let summary_headers = vec!["property".to_string(), "value".to_string()];
    let mut summary = summary_rows(&meta);
    match &config {
        Some(config) => {
            summary.push(pair("identity column", &config.identity_column));
            summary.push(pair("date column", &config.date_column));
            summary.push(pair("visible columns", &config.visible_columns.join(", ")));
            if let Err(err) = config.validate_against(&meta.columns) {
                warn!("{err}");
                summary.push(pair("lookup", "invalid for stored columns"));
            }
        }
        None => summary.push(pair("lookup", "not configured")),
    }
    table::print_table(&summary_headers, &summary);

    if !meta.header_mapping.is_empty() {
        println!();
        let mapping_headers = vec!["header".to_string(), "field".to_string()];
        let mapping: Vec<Vec<String>> = meta
            .header_mapping
            .iter()
            .map(|(raw, field)| vec![raw.clone(), field.clone()])
            .collect();
        table::print_table(&mapping_headers, &mapping);
    }
    info!(
        "Store {:?} holds {} row(s) across {} column(s)",
        store.root(),
        meta.rows,
        meta.columns.len()
    );
    Ok(())
}

fn pair(key: &str, value: &str) -> Vec<String> {
    vec![key.to_string(), value.to_string()]
}

fn summary_rows(meta: &StoreMeta) -> Vec<Vec<String>> {
    let mut rows = vec![
        pair("rows", &meta.rows.to_string()),
        pair("columns", &meta.columns.len().to_string()),
        pair(
            "ingested at",
            &meta.ingested_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
    ];
    if let Some(source) = &meta.source {
        rows.push(pair("source", source));
    }
    if let Some(digest) = &meta.source_sha256 {
        rows.push(pair("source sha256", digest));
    }
    if !meta.unmapped_headers.is_empty() {
        rows.push(pair("unmapped headers", &meta.unmapped_headers.join(", ")));
    }
    rows
}
