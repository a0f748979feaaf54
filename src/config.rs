//! Lookup configuration chosen by the administrator: which column identifies
//! a worker, which column holds the date the public lookup filters on, and
//! which columns a lookup returns.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupConfig {
    pub identity_column: String,
    pub date_column: String,
    pub visible_columns: Vec<String>,
}

impl LookupConfig {
    /// Trims the column names and rejects empty selections.
    pub fn new(
        identity_column: &str,
        date_column: &str,
        visible_columns: &[String],
    ) -> Result<Self, LookupError> {
        let identity_column = identity_column.trim().to_string();
        let date_column = date_column.trim().to_string();
        let visible_columns: Vec<String> = visible_columns
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if identity_column.is_empty() || date_column.is_empty() || visible_columns.is_empty() {
            return Err(LookupError::IncompleteConfig);
        }
        Ok(Self {
            identity_column,
            date_column,
            visible_columns,
        })
    }

    /// Every column this configuration refers to, identity and date first.
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        [self.identity_column.as_str(), self.date_column.as_str()]
            .into_iter()
            .chain(self.visible_columns.iter().map(String::as_str))
    }

    /// Checks that every referenced column exists among `available`.
    pub fn validate_against(&self, available: &[String]) -> Result<(), LookupError> {
        if available.is_empty() {
            return Err(LookupError::NoColumnsLoaded);
        }
        let mut missing: Vec<String> = Vec::new();
        for column in self.referenced_columns() {
            if !available.iter().any(|a| a == column) && !missing.iter().any(|m| m == column) {
                missing.push(column.to_string());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LookupError::ColumnsNotFound {
                missing,
                available: available.to_vec(),
            })
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context("Parsing lookup config YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing lookup config YAML")
    }
}
