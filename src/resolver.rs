//! Header resolution engine.
//!
//! [`HeaderResolver`] maps the raw headers of an uploaded sheet onto the
//! canonical vocabulary. Resolution runs as an ordered list of passes; each
//! pass walks the whole header list and tries its strategies in priority
//! order on every header that is still unresolved. The default pipeline is:
//!
//! 1. exact pass: raw alias, normalized alias, normalized canonical name
//! 2. fuzzy pass: best similarity against the canonical fields (>= 0.78)
//!
//! Caller overrides are merged on top of the automatic result, after which
//! the mandatory fields are checked. Headers that no strategy resolves are
//! left out of the mapping.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::Serialize;

use crate::{
    error::MappingError,
    matcher::FuzzyMatcher,
    normalize::normalize_header,
    vocabulary::Vocabulary,
};

/// Original header -> canonical field.
pub type HeaderMapping = BTreeMap<String, String>;

/// Caller-supplied forced mappings, original header -> canonical field.
pub type Overrides = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    Alias,
    NormalizedAlias,
    Canonical,
    Fuzzy { score: f32 },
    Override,
}

impl MatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            MatchKind::Alias => "alias",
            MatchKind::NormalizedAlias => "normalized-alias",
            MatchKind::Canonical => "canonical",
            MatchKind::Fuzzy { .. } => "fuzzy",
            MatchKind::Override => "override",
        }
    }

    pub fn score(&self) -> Option<f32> {
        match self {
            MatchKind::Fuzzy { score } => Some(*score),
            _ => None,
        }
    }
}

/// A raw header together with its normalized token, as seen by strategies.
#[derive(Debug, Clone)]
pub struct HeaderCandidate<'h> {
    pub raw: &'h str,
    pub normalized: String,
}

impl<'h> HeaderCandidate<'h> {
    pub fn new(raw: &'h str) -> Self {
        Self {
            raw,
            normalized: normalize_header(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyMatch {
    pub field: String,
    pub kind: MatchKind,
}

/// One way of turning a header into a canonical field.
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, header: &HeaderCandidate<'_>, vocabulary: &Vocabulary)
    -> Option<StrategyMatch>;
}

/// Looks the raw header up in the alias table as typed.
#[derive(Debug, Default)]
pub struct RawAlias;

impl ResolutionStrategy for RawAlias {
    fn name(&self) -> &'static str {
        "raw-alias"
    }

    fn resolve(
        &self,
        header: &HeaderCandidate<'_>,
        vocabulary: &Vocabulary,
    ) -> Option<StrategyMatch> {
        vocabulary.alias(header.raw).map(|field| StrategyMatch {
            field: field.to_string(),
            kind: MatchKind::Alias,
        })
    }
}

/// Looks the normalized header up in the alias table.
#[derive(Debug, Default)]
pub struct NormalizedAlias;

impl ResolutionStrategy for NormalizedAlias {
    fn name(&self) -> &'static str {
        "normalized-alias"
    }

    fn resolve(
        &self,
        header: &HeaderCandidate<'_>,
        vocabulary: &Vocabulary,
    ) -> Option<StrategyMatch> {
        vocabulary
            .alias(&header.normalized)
            .map(|field| StrategyMatch {
                field: field.to_string(),
                kind: MatchKind::NormalizedAlias,
            })
    }
}

/// Accepts headers whose normalized form already is a canonical field.
#[derive(Debug, Default)]
pub struct CanonicalName;

impl ResolutionStrategy for CanonicalName {
    fn name(&self) -> &'static str {
        "canonical"
    }

    fn resolve(
        &self,
        header: &HeaderCandidate<'_>,
        vocabulary: &Vocabulary,
    ) -> Option<StrategyMatch> {
        vocabulary
            .is_canonical(&header.normalized)
            .then(|| StrategyMatch {
                field: header.normalized.clone(),
                kind: MatchKind::Canonical,
            })
    }
}

/// Approximate match of the normalized header against every canonical field.
#[derive(Debug, Default)]
pub struct FuzzyCanonical {
    matcher: FuzzyMatcher,
}

impl ResolutionStrategy for FuzzyCanonical {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn resolve(
        &self,
        header: &HeaderCandidate<'_>,
        vocabulary: &Vocabulary,
    ) -> Option<StrategyMatch> {
        self.matcher
            .best_match(
                &header.normalized,
                vocabulary.fields().iter().map(String::as_str),
            )
            .map(|found| StrategyMatch {
                field: found.candidate.to_string(),
                kind: MatchKind::Fuzzy { score: found.score },
            })
    }
}

pub type Pass = Vec<Box<dyn ResolutionStrategy>>;

pub fn default_passes() -> Vec<Pass> {
    let exact: Pass = vec![
        Box::new(RawAlias),
        Box::new(NormalizedAlias),
        Box::new(CanonicalName),
    ];
    let fuzzy: Pass = vec![Box::new(FuzzyCanonical::default())];
    vec![exact, fuzzy]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedHeader {
    pub raw: String,
    pub field: String,
    #[serde(flatten)]
    pub kind: MatchKind,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    found: Vec<String>,
    entries: Vec<ResolvedHeader>,
    mapping: HeaderMapping,
}

impl Resolution {
    pub fn mapping(&self) -> &HeaderMapping {
        &self.mapping
    }

    pub fn into_mapping(self) -> HeaderMapping {
        self.mapping
    }

    /// Resolved headers in sheet order, followed by overrides for headers the
    /// sheet does not contain.
    pub fn entries(&self) -> &[ResolvedHeader] {
        &self.entries
    }

    /// Raw headers as they appeared in the sheet.
    pub fn found(&self) -> &[String] {
        &self.found
    }

    /// Headers that neither automatic resolution nor overrides mapped.
    pub fn unmapped(&self) -> Vec<&str> {
        self.found
            .iter()
            .filter(|raw| !self.mapping.contains_key(raw.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn resolved_fields(&self) -> BTreeSet<&str> {
        self.mapping.values().map(String::as_str).collect()
    }
}

pub struct HeaderResolver<'v> {
    vocabulary: &'v Vocabulary,
    passes: Vec<Pass>,
}

impl<'v> HeaderResolver<'v> {
    pub fn new(vocabulary: &'v Vocabulary) -> Self {
        Self::with_passes(vocabulary, default_passes())
    }

    pub fn with_passes(vocabulary: &'v Vocabulary, passes: Vec<Pass>) -> Self {
        Self { vocabulary, passes }
    }

    /// Resolves `raw_headers`, merges `overrides`, and checks the mandatory
    /// fields.
    pub fn resolve(
        &self,
        raw_headers: &[String],
        overrides: Option<&Overrides>,
    ) -> Result<Resolution, MappingError> {
        if let Some(overrides) = overrides {
            self.check_overrides(overrides)?;
        }
        let mut entries = self.resolve_automatic(raw_headers);
        if let Some(overrides) = overrides {
            apply_overrides(&mut entries, raw_headers, overrides);
        }
        let mapping: HeaderMapping = entries
            .iter()
            .map(|entry| (entry.raw.clone(), entry.field.clone()))
            .collect();

        let resolved: BTreeSet<&str> = mapping.values().map(String::as_str).collect();
        let missing: Vec<String> = self
            .vocabulary
            .required()
            .iter()
            .filter(|field| !resolved.contains(field.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(MappingError::MissingRequiredColumns {
                missing,
                found: raw_headers.to_vec(),
                mapping,
            });
        }

        Ok(Resolution {
            found: raw_headers.to_vec(),
            entries,
            mapping,
        })
    }

    fn check_overrides(&self, overrides: &Overrides) -> Result<(), MappingError> {
        for (header, field) in overrides {
            if !self.vocabulary.is_canonical(field) {
                return Err(MappingError::UnknownCanonicalField {
                    header: header.clone(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }

    fn resolve_automatic(&self, raw_headers: &[String]) -> Vec<ResolvedHeader> {
        let candidates: Vec<HeaderCandidate<'_>> = raw_headers
            .iter()
            .map(|raw| HeaderCandidate::new(raw))
            .collect();
        let mut slots: Vec<Option<StrategyMatch>> = vec![None; candidates.len()];
        let mut seen: BTreeSet<&str> = BTreeSet::new();

        for pass in &self.passes {
            for (idx, candidate) in candidates.iter().enumerate() {
                if slots[idx].is_some() || seen.contains(candidate.raw) {
                    continue;
                }
                if let Some(found) = pass
                    .iter()
                    .find_map(|strategy| self.try_strategy(strategy.as_ref(), candidate))
                {
                    seen.insert(candidate.raw);
                    slots[idx] = Some(found);
                }
            }
        }

        candidates
            .iter()
            .zip(slots)
            .filter_map(|(candidate, slot)| match slot {
                Some(found) => Some(ResolvedHeader {
                    raw: candidate.raw.to_string(),
                    field: found.field,
                    kind: found.kind,
                }),
                None => {
                    if !seen.contains(candidate.raw) {
                        debug!(
                            "Header '{}' (normalized '{}') left unmapped",
                            candidate.raw, candidate.normalized
                        );
                    }
                    None
                }
            })
            .collect()
    }

    fn try_strategy(
        &self,
        strategy: &dyn ResolutionStrategy,
        candidate: &HeaderCandidate<'_>,
    ) -> Option<StrategyMatch> {
        let found = strategy.resolve(candidate, self.vocabulary)?;
        debug!(
            "Header '{}' -> {} via {}",
            candidate.raw,
            found.field,
            strategy.name()
        );
        Some(found)
    }
}

fn apply_overrides(
    entries: &mut Vec<ResolvedHeader>,
    raw_headers: &[String],
    overrides: &Overrides,
) {
    for (header, field) in overrides {
        if let Some(entry) = entries.iter_mut().find(|entry| &entry.raw == header) {
            entry.field = field.clone();
            entry.kind = MatchKind::Override;
            continue;
        }
        let position = raw_headers.iter().position(|raw| raw == header);
        if position.is_none() {
            warn!("Override for '{header}' does not match any header in the sheet");
        }
        let entry = ResolvedHeader {
            raw: header.clone(),
            field: field.clone(),
            kind: MatchKind::Override,
        };
        match position {
            Some(pos) => {
                let insert_at = entries
                    .iter()
                    .position(|existing| {
                        raw_headers
                            .iter()
                            .position(|raw| raw == &existing.raw)
                            .is_none_or(|existing_pos| existing_pos > pos)
                    })
                    .unwrap_or(entries.len());
                entries.insert(insert_at, entry);
            }
            None => entries.push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{
        APELLIDOS_NOMBRES, FECHA_CESE, FECHA_INGRESO, NOMBRE, SALDO_IND_DIAS, TRABAJADOR,
    };

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_aliases_canonical_names_and_fuzzy_matches() {
        let vocabulary = Vocabulary::builtin();
        let resolver = HeaderResolver::new(&vocabulary);
        let resolution = resolver
            .resolve(
                &headers(&["dni", "Fecha Ingreso", "Fecha de Cese", "Apellidos y Nombres"]),
                None,
            )
            .expect("resolved");
        let mapping = resolution.mapping();
        assert_eq!(mapping["dni"], TRABAJADOR);
        assert_eq!(mapping["Fecha Ingreso"], FECHA_INGRESO);
        assert_eq!(mapping["Fecha de Cese"], FECHA_CESE);
        assert_eq!(mapping["Apellidos y Nombres"], APELLIDOS_NOMBRES);

        let kinds: Vec<&str> = resolution.entries().iter().map(|e| e.kind.label()).collect();
        assert_eq!(
            kinds,
            vec!["normalized-alias", "normalized-alias", "normalized-alias", "normalized-alias"]
        );
    }

    #[test]
    fn exact_pass_runs_before_fuzzy_pass() {
        let vocabulary = Vocabulary::builtin();
        let resolver = HeaderResolver::new(&vocabulary);
        let resolution = resolver
            .resolve(&headers(&["FECHA_INGRSO", "DNI", "Fecha Ingreso"]), None)
            .expect("resolved");
        let entries = resolution.entries();
        assert_eq!(entries[0].raw, "FECHA_INGRSO");
        assert!(matches!(entries[0].kind, MatchKind::Fuzzy { .. }));
        assert_eq!(entries[1].kind, MatchKind::Alias);
        assert_eq!(entries[2].kind, MatchKind::NormalizedAlias);
    }

    #[test]
    fn unresolved_headers_are_dropped_silently() {
        let vocabulary = Vocabulary::builtin();
        let resolver = HeaderResolver::new(&vocabulary);
        let resolution = resolver
            .resolve(&headers(&["DNI", "FEC_INGRESO", "Area", "Sexo"]), None)
            .expect("resolved");
        assert_eq!(resolution.mapping().len(), 2);
        assert_eq!(resolution.unmapped(), vec!["Area", "Sexo"]);
    }

    #[test]
    fn overrides_replace_automatic_matches() {
        let vocabulary = Vocabulary::builtin();
        let resolver = HeaderResolver::new(&vocabulary);
        let mut overrides = Overrides::new();
        overrides.insert("Nombres".to_string(), APELLIDOS_NOMBRES.to_string());
        overrides.insert("Documento".to_string(), TRABAJADOR.to_string());
        let resolution = resolver
            .resolve(
                &headers(&["Documento", "Fecha Ingreso", "Nombres"]),
                Some(&overrides),
            )
            .expect("resolved");
        assert_eq!(resolution.mapping()["Nombres"], APELLIDOS_NOMBRES);
        assert_eq!(resolution.mapping()["Documento"], TRABAJADOR);
        let order: Vec<&str> = resolution.entries().iter().map(|e| e.raw.as_str()).collect();
        assert_eq!(order, vec!["Documento", "Fecha Ingreso", "Nombres"]);
        assert!(resolution.unmapped().is_empty());
    }

    #[test]
    fn override_with_unknown_target_is_rejected() {
        let vocabulary = Vocabulary::builtin();
        let resolver = HeaderResolver::new(&vocabulary);
        let mut overrides = Overrides::new();
        overrides.insert("DNI".to_string(), "DOCUMENTO".to_string());
        let err = resolver
            .resolve(&headers(&["DNI", "Fecha Ingreso"]), Some(&overrides))
            .unwrap_err();
        assert_eq!(
            err,
            MappingError::UnknownCanonicalField {
                header: "DNI".to_string(),
                field: "DOCUMENTO".to_string(),
            }
        );
    }

    #[test]
    fn missing_identity_reports_only_that_field() {
        let vocabulary = Vocabulary::builtin();
        let resolver = HeaderResolver::new(&vocabulary);
        let err = resolver
            .resolve(&headers(&["Nombres", "Fecha Ingreso"]), None)
            .unwrap_err();
        match err {
            MappingError::MissingRequiredColumns {
                missing,
                found,
                mapping,
            } => {
                assert_eq!(missing, vec![TRABAJADOR.to_string()]);
                assert_eq!(found, headers(&["Nombres", "Fecha Ingreso"]));
                assert_eq!(mapping["Nombres"], NOMBRE);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn duplicate_headers_produce_a_single_entry() {
        let vocabulary = Vocabulary::builtin();
        let resolver = HeaderResolver::new(&vocabulary);
        let resolution = resolver
            .resolve(&headers(&["DNI", "DNI", "Fecha Ingreso"]), None)
            .expect("resolved");
        assert_eq!(resolution.entries().len(), 2);
        assert_eq!(resolution.mapping().len(), 2);
        assert!(resolution.unmapped().is_empty());
    }

    #[test]
    fn custom_passes_extend_the_pipeline() {
        struct Prefix;
        impl ResolutionStrategy for Prefix {
            fn name(&self) -> &'static str {
                "prefix"
            }
            fn resolve(
                &self,
                header: &HeaderCandidate<'_>,
                _vocabulary: &Vocabulary,
            ) -> Option<StrategyMatch> {
                header.normalized.starts_with("SALDO").then(|| StrategyMatch {
                    field: SALDO_IND_DIAS.to_string(),
                    kind: MatchKind::Canonical,
                })
            }
        }

        let vocabulary = Vocabulary::builtin();
        let mut passes = default_passes();
        let fallback: Pass = vec![Box::new(Prefix)];
        passes.push(fallback);
        let resolver = HeaderResolver::with_passes(&vocabulary, passes);
        let resolution = resolver
            .resolve(&headers(&["DNI", "Fecha Ingreso", "Saldo"]), None)
            .expect("resolved");
        assert_eq!(resolution.mapping()["Saldo"], SALDO_IND_DIAS);
    }
}
