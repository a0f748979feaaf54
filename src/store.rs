//! Directory-backed record store.
//!
//! A store holds exactly one dataset, the last one ingested:
//!
//! - `records.csv`: canonical rows as written by `ingest`
//! - `meta.yaml`: columns, header mapping, row count, and source details
//! - `config.yaml`: the lookup configuration, if one was saved
//!
//! Ingesting replaces the previous records and metadata wholesale. The
//! configuration survives re-ingestion and is re-validated on every lookup.

use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use encoding_rs::UTF_8;
use serde::{Deserialize, Serialize};

use crate::{
    config::LookupConfig,
    data::Dataset,
    io_utils::{self, DEFAULT_CSV_DELIMITER},
    resolver::HeaderMapping,
};

pub const RECORDS_FILE: &str = "records.csv";
pub const META_FILE: &str = "meta.yaml";
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreMeta {
    pub columns: Vec<String>,
    pub rows: usize,
    pub header_mapping: HeaderMapping,
    #[serde(default)]
    pub unmapped_headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Replaces the stored dataset and its metadata.
    pub fn replace_dataset(&self, dataset: &Dataset, meta: &StoreMeta) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Creating store directory {:?}", self.root))?;
        let staged = self.file(&format!("{RECORDS_FILE}.tmp"));
        io_utils::write_dataset(&staged, dataset, DEFAULT_CSV_DELIMITER)
            .with_context(|| format!("Writing records to {staged:?}"))?;
        let records = self.file(RECORDS_FILE);
        fs::rename(&staged, &records)
            .with_context(|| format!("Moving {staged:?} into place at {records:?}"))?;

        let staged_meta = self.file(&format!("{META_FILE}.tmp"));
        let file = File::create(&staged_meta)
            .with_context(|| format!("Creating metadata file {staged_meta:?}"))?;
        serde_yaml::to_writer(file, meta).context("Writing store metadata YAML")?;
        let meta_path = self.file(META_FILE);
        fs::rename(&staged_meta, &meta_path)
            .with_context(|| format!("Moving {staged_meta:?} into place at {meta_path:?}"))
    }

    pub fn load_dataset(&self) -> Result<Dataset> {
        let records = self.file(RECORDS_FILE);
        if !records.is_file() {
            bail!("No records in store {:?}; ingest a sheet first", self.root);
        }
        io_utils::read_dataset(&records, DEFAULT_CSV_DELIMITER, UTF_8)
            .with_context(|| format!("Loading records from {records:?}"))
    }

    pub fn load_meta(&self) -> Result<Option<StoreMeta>> {
        let path = self.file(META_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let file = File::open(&path).with_context(|| format!("Opening metadata {path:?}"))?;
        let meta = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing metadata {path:?}"))?;
        Ok(Some(meta))
    }

    /// Columns of the stored dataset: taken from the metadata, falling back
    /// to the header row of the records file. Empty when nothing is stored.
    pub fn available_columns(&self) -> Result<Vec<String>> {
        if let Some(meta) = self.load_meta()? {
            return Ok(meta.columns);
        }
        let records = self.file(RECORDS_FILE);
        if records.is_file() {
            return io_utils::read_headers(&records, DEFAULT_CSV_DELIMITER, UTF_8);
        }
        Ok(Vec::new())
    }

    pub fn load_config(&self) -> Result<Option<LookupConfig>> {
        let path = self.file(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        LookupConfig::load(&path).map(Some)
    }

    pub fn save_config(&self, config: &LookupConfig) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Creating store directory {:?}", self.root))?;
        config.save(&self.file(CONFIG_FILE))
    }
}
