use itertools::Itertools;
use thiserror::Error;

use crate::resolver::HeaderMapping;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MappingError {
    /// A mandatory canonical field is absent from the resolved mapping. The
    /// whole upload must be rejected.
    #[error(
        "Missing required columns after mapping: {missing:?}. Found: {found:?}. Mapping applied: {}",
        describe_mapping(.mapping)
    )]
    MissingRequiredColumns {
        missing: Vec<String>,
        found: Vec<String>,
        mapping: HeaderMapping,
    },
    #[error("Override for header '{header}' targets unknown canonical field '{field}'")]
    UnknownCanonicalField { header: String, field: String },
}

fn describe_mapping(mapping: &HeaderMapping) -> String {
    let pairs = mapping
        .iter()
        .map(|(raw, field)| format!("{raw:?}: {field:?}"))
        .join(", ");
    format!("{{{pairs}}}")
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Identity column, date column and at least one visible column are required")]
    IncompleteConfig,
    #[error("No columns loaded yet; ingest a sheet first")]
    NoColumnsLoaded,
    #[error("Lookup is not configured; run `configure` first")]
    NotConfigured,
    #[error("Columns not found in the loaded sheet: {missing:?}. Available: {available:?}")]
    ColumnsNotFound {
        missing: Vec<String>,
        available: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_columns_message_lists_mapping() {
        let mapping: HeaderMapping = [("DNI", "TRABAJADOR"), ("Area", "DESCRIPCION_UNIDAD")]
            .iter()
            .map(|(raw, field)| (raw.to_string(), field.to_string()))
            .collect();
        let err = MappingError::MissingRequiredColumns {
            missing: vec!["FECHA_INGRESO".to_string()],
            found: vec!["DNI".to_string(), "Area".to_string()],
            mapping,
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns after mapping: [\"FECHA_INGRESO\"]. \
             Found: [\"DNI\", \"Area\"]. \
             Mapping applied: {\"Area\": \"DESCRIPCION_UNIDAD\", \"DNI\": \"TRABAJADOR\"}"
        );
        assert_eq!(describe_mapping(&HeaderMapping::new()), "{}");
    }
}
