use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Map spreadsheet roster headers to canonical fields, store them, and look records up",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the canonical fields, their aliases, and which are required
    Fields(FieldsArgs),
    /// Show how the headers of a CSV file resolve to canonical fields
    Map(MapArgs),
    /// Resolve, normalize, and store a CSV file, replacing the previous upload
    Ingest(IngestArgs),
    /// Choose the identity, date, and visible columns used by lookups
    Configure(ConfigureArgs),
    /// Report stored record count, header mapping, and lookup configuration
    Status(StatusArgs),
    /// Look up stored records by identity value and date
    Query(QueryArgs),
}

#[derive(Debug, Args)]
pub struct FieldsArgs {
    /// YAML vocabulary replacing the built-in canonical fields and aliases
    #[arg(long)]
    pub vocabulary: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SheetArgs {
    /// Input CSV file exported from the spreadsheet ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Force a mapping as `HEADER=FIELD` (repeatable)
    #[arg(long = "override", value_parser = parse_override, action = clap::ArgAction::Append)]
    pub overrides: Vec<(String, String)>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML vocabulary replacing the built-in canonical fields and aliases
    #[arg(long)]
    pub vocabulary: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub sheet: SheetArgs,
    /// Emit the mapping as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub sheet: SheetArgs,
    /// Store directory receiving the records
    #[arg(short, long)]
    pub store: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConfigureArgs {
    /// Store directory holding the ingested records
    #[arg(short, long)]
    pub store: PathBuf,
    /// Column holding the worker identity number
    #[arg(long)]
    pub identity: String,
    /// Column holding the date lookups filter on
    #[arg(long)]
    pub date: String,
    /// Columns returned by lookups (comma-separated or repeated); defaults to
    /// the vocabulary's visible columns present in the store
    #[arg(long = "visible", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub visible: Vec<String>,
    /// YAML vocabulary providing the default visible columns
    #[arg(long)]
    pub vocabulary: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Store directory to inspect
    #[arg(short, long)]
    pub store: PathBuf,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Store directory holding the ingested records
    #[arg(short, long)]
    pub store: PathBuf,
    /// Identity value to look up
    #[arg(long = "id")]
    pub identity: String,
    /// Date to match (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long)]
    pub date: String,
    /// Emit matches as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Parses `HEADER=FIELD`, splitting on the last `=` so headers may contain
/// one. The header is kept verbatim; the field is trimmed.
pub fn parse_override(value: &str) -> Result<(String, String), String> {
    let (header, field) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("Override '{value}' must use the form HEADER=FIELD"))?;
    let field = field.trim();
    if header.trim().is_empty() || field.is_empty() {
        return Err(format!(
            "Override '{value}' must name both a header and a field"
        ));
    }
    Ok((header.to_string(), field.to_string()))
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_override_splits_on_last_equals() {
        assert_eq!(
            parse_override("DNI=TRABAJADOR"),
            Ok(("DNI".to_string(), "TRABAJADOR".to_string()))
        );
        assert_eq!(
            parse_override("A=B = FECHA_CESE"),
            Ok(("A=B ".to_string(), "FECHA_CESE".to_string()))
        );
        assert!(parse_override("DNI").is_err());
        assert!(parse_override("DNI=").is_err());
        assert!(parse_override("=TRABAJADOR").is_err());
    }

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("ab").is_err());
    }
}
