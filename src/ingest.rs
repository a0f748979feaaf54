//! `ingest`: resolve a sheet's headers, normalize its rows, and replace the
//! store's dataset. A sheet missing a mandatory field is rejected before
//! anything in the store changes.

use std::{fs::File, io, path::Path};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use sha2::{Digest, Sha256};

use crate::{
    adjust,
    cli::IngestArgs,
    data::Dataset,
    io_utils,
    map_cmd::sheet_overrides,
    printable_delimiter,
    resolver::{HeaderResolver, Overrides},
    store::{Store, StoreMeta},
    vocabulary::Vocabulary,
};

#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub dataset: Dataset,
    pub meta: StoreMeta,
    pub report: adjust::AdjustReport,
}

pub fn execute(args: &IngestArgs) -> Result<()> {
    let vocabulary = Vocabulary::load_or_builtin(args.sheet.vocabulary.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.sheet.input, args.sheet.delimiter);
    let encoding = io_utils::resolve_encoding(args.sheet.input_encoding.as_deref())?;
    info!(
        "Ingesting '{}' with delimiter '{}' into store {:?}",
        args.sheet.input.display(),
        printable_delimiter(delimiter),
        args.store
    );
    let dataset = io_utils::read_dataset(&args.sheet.input, delimiter, encoding)
        .with_context(|| format!("Reading sheet {:?}", args.sheet.input))?;
    let overrides = sheet_overrides(&args.sheet);
    let mut outcome = prepare(dataset, &vocabulary, overrides.as_ref())
        .with_context(|| format!("Resolving headers of {:?}", args.sheet.input))?;

    if !io_utils::is_dash(&args.sheet.input) {
        outcome.meta.source = args
            .sheet
            .input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        outcome.meta.source_sha256 = Some(file_sha256(&args.sheet.input)?);
    }

    let store = Store::open(&args.store);
    store.replace_dataset(&outcome.dataset, &outcome.meta)?;
    if let Some(config) = store.load_config()?
        && let Err(err) = config.validate_against(&outcome.meta.columns)
    {
        warn!("Saved lookup configuration no longer matches the stored columns: {err}");
    }

    info!(
        "Stored {} row(s) with {} column(s); {} header(s) mapped, {} unmapped, {} canonical column(s) filled with null",
        outcome.meta.rows,
        outcome.meta.columns.len(),
        outcome.meta.header_mapping.len(),
        outcome.meta.unmapped_headers.len(),
        outcome.report.added_columns.len()
    );
    Ok(())
}

/// Resolves the headers of `dataset`, renames and completes it, and builds
/// the store metadata. Fails only when the mapping is rejected.
pub fn prepare(
    mut dataset: Dataset,
    vocabulary: &Vocabulary,
    overrides: Option<&Overrides>,
) -> Result<IngestOutcome> {
    let resolution = HeaderResolver::new(vocabulary).resolve(dataset.headers(), overrides)?;
    let unmapped_headers = resolution
        .unmapped()
        .into_iter()
        .map(str::to_string)
        .collect();
    let header_mapping = resolution.into_mapping();
    let report = adjust::adjust_dataset(&mut dataset, &header_mapping, vocabulary);
    let meta = StoreMeta {
        columns: dataset.headers().to_vec(),
        rows: dataset.len(),
        header_mapping,
        unmapped_headers,
        source: None,
        source_sha256: None,
        ingested_at: Utc::now(),
    };
    Ok(IngestOutcome {
        dataset,
        meta,
        report,
    })
}

fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Opening {path:?} for hashing"))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_context(|| format!("Hashing {path:?}"))?;
    Ok(format!("{:x}", hasher.finalize()))
}
