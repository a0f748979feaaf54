//! Canonical field vocabulary and alias table.
//!
//! A [`Vocabulary`] is the immutable configuration the resolver works
//! against: the ordered canonical field set, the alias table, the mandatory
//! subset, the two date-typed fields, and the columns shown by default in
//! lookups. The built-in roster vocabulary is available through
//! [`Vocabulary::builtin`]; deployments can extend it with a YAML file loaded
//! through [`Vocabulary::load`].

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_header;

pub const DESCRIPCION_EMPRESA: &str = "DESCRIPCION_EMPRESA";
pub const CODIGO_UNIDAD: &str = "CODIGO_UNIDAD";
pub const DESCRIPCION_UNIDAD: &str = "DESCRIPCION_UNIDAD";
pub const NOMBRE: &str = "NOMBRE";
/// Identity number (DNI) of the worker.
pub const TRABAJADOR: &str = "TRABAJADOR";
pub const APELLIDOS_NOMBRES: &str = "APELLIDOS_NOMBRES";
pub const FECHA_INGRESO: &str = "FECHA_INGRESO";
pub const FECHA_CESE: &str = "FECHA_CESE";
pub const SITUACION_TRABAJADOR: &str = "SITUACION_TRABAJADOR";
pub const PERIODO_VACACIONAL: &str = "PERIODO_VACACIONAL";
pub const DIAS_PENDIENTES: &str = "DIAS_PENDIENTES";
pub const IND_DIAS: &str = "IND_DIAS";
pub const SALDO_IND_DIAS: &str = "SALDO_IND_DIAS";
pub const VALORIZACION: &str = "VALORIZACION";
pub const VALORIZACION_IND: &str = "VALORIZACION_IND";
pub const OBSERVACION: &str = "OBSERVACION";

pub const CANONICAL_FIELDS: &[&str] = &[
    DESCRIPCION_EMPRESA,
    CODIGO_UNIDAD,
    DESCRIPCION_UNIDAD,
    NOMBRE,
    TRABAJADOR,
    APELLIDOS_NOMBRES,
    FECHA_INGRESO,
    FECHA_CESE,
    SITUACION_TRABAJADOR,
    PERIODO_VACACIONAL,
    DIAS_PENDIENTES,
    IND_DIAS,
    SALDO_IND_DIAS,
    VALORIZACION,
    VALORIZACION_IND,
    OBSERVACION,
];

pub const REQUIRED_FIELDS: &[&str] = &[TRABAJADOR, FECHA_INGRESO];

pub const DATE_FIELDS: &[&str] = &[FECHA_INGRESO, FECHA_CESE];

pub const VISIBLE_DEFAULT: &[&str] = &[
    DESCRIPCION_EMPRESA,
    NOMBRE,
    APELLIDOS_NOMBRES,
    FECHA_INGRESO,
    FECHA_CESE,
    SITUACION_TRABAJADOR,
    PERIODO_VACACIONAL,
    DIAS_PENDIENTES,
    SALDO_IND_DIAS,
    VALORIZACION,
    VALORIZACION_IND,
    OBSERVACION,
];

pub const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("EMPRESA", DESCRIPCION_EMPRESA),
    ("DESCRIPCION EMPRESA", DESCRIPCION_EMPRESA),
    ("COD_EMPRESA", CODIGO_UNIDAD),
    ("CODIGO UNIDAD", CODIGO_UNIDAD),
    ("DESCRIPCION UNIDAD", DESCRIPCION_UNIDAD),
    ("NOMBRES", NOMBRE),
    ("APELLIDOS Y NOMBRES", APELLIDOS_NOMBRES),
    ("APELLIDOS_NOMBRES", APELLIDOS_NOMBRES),
    ("DNI", TRABAJADOR),
    ("TRABAJADOR", TRABAJADOR),
    ("FECHA INGRESO", FECHA_INGRESO),
    ("FEC_INGRESO", FECHA_INGRESO),
    ("FECHA DE CESE", FECHA_CESE),
    ("FEC_CESE", FECHA_CESE),
    ("SITUACIÓN TRABAJADOR", SITUACION_TRABAJADOR),
    ("SITUACION_TRABAJADOR", SITUACION_TRABAJADOR),
    ("PERIODO VACACIONAL", PERIODO_VACACIONAL),
    ("PERIODO_VACACIONAL", PERIODO_VACACIONAL),
    ("DIAS_PENDIENTES", DIAS_PENDIENTES),
    ("SALDO IND. DIAS", SALDO_IND_DIAS),
    ("SALDO IND DIAS", SALDO_IND_DIAS),
    ("VALORIZACION", VALORIZACION),
    ("VALORIZACION IND.", VALORIZACION_IND),
    ("VALORIZACION IND", VALORIZACION_IND),
    ("OBSERVACION", OBSERVACION),
];

/// On-disk shape of a vocabulary file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabularyFile {
    pub fields: Vec<String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub date_fields: Vec<String>,
    #[serde(default)]
    pub visible_default: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    fields: Vec<String>,
    field_set: HashSet<String>,
    aliases: HashMap<String, String>,
    declared_aliases: Vec<(String, String)>,
    required: Vec<String>,
    date_fields: Vec<String>,
    visible_default: Vec<String>,
}

impl Vocabulary {
    pub fn builtin() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let aliases = COLUMN_ALIASES
            .iter()
            .map(|(alias, field)| (alias.to_string(), field.to_string()))
            .collect();
        match Self::new(
            owned(CANONICAL_FIELDS),
            aliases,
            owned(REQUIRED_FIELDS),
            owned(DATE_FIELDS),
            owned(VISIBLE_DEFAULT),
        ) {
            Ok(vocabulary) => vocabulary,
            Err(err) => panic!("built-in vocabulary is inconsistent: {err}"),
        }
    }

    /// Builds a vocabulary, checking that every alias target, required field,
    /// date field and visible column names a canonical field. Alias keys are
    /// indexed verbatim and in normalized form.
    pub fn new(
        fields: Vec<String>,
        aliases: Vec<(String, String)>,
        required: Vec<String>,
        date_fields: Vec<String>,
        visible_default: Vec<String>,
    ) -> Result<Self> {
        ensure!(!fields.is_empty(), "Vocabulary must declare at least one field");
        let mut field_set = HashSet::with_capacity(fields.len());
        for field in &fields {
            ensure!(
                !field.trim().is_empty(),
                "Canonical field names cannot be empty"
            );
            ensure!(
                field_set.insert(field.clone()),
                "Duplicate canonical field '{field}'"
            );
        }

        let known = |kind: &str, name: &str| -> Result<()> {
            ensure!(
                field_set.contains(name),
                "{kind} '{name}' is not a canonical field"
            );
            Ok(())
        };
        for field in &required {
            known("Required field", field)?;
        }
        for field in &date_fields {
            known("Date field", field)?;
        }
        for field in &visible_default {
            known("Visible column", field)?;
        }

        let mut index: HashMap<String, String> = HashMap::new();
        for (alias, target) in &aliases {
            known(&format!("Alias target for '{alias}'"), target)?;
            for key in [alias.clone(), normalize_header(alias)] {
                if key.is_empty() {
                    continue;
                }
                if let Some(existing) = index.get(&key)
                    && existing != target
                {
                    return Err(anyhow!(
                        "Alias '{alias}' collides with an existing alias for '{existing}' (key '{key}')"
                    ));
                }
                index.insert(key, target.clone());
            }
        }

        Ok(Self {
            fields,
            field_set,
            aliases: index,
            declared_aliases: aliases,
            required,
            date_fields,
            visible_default,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening vocabulary file {path:?}"))?;
        let reader = BufReader::new(file);
        let raw: VocabularyFile =
            serde_yaml::from_reader(reader).context("Parsing vocabulary YAML")?;
        Self::from_file(raw).with_context(|| format!("Validating vocabulary {path:?}"))
    }

    /// Loads `path` when given, otherwise the built-in vocabulary.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn from_file(raw: VocabularyFile) -> Result<Self> {
        Self::new(
            raw.fields,
            raw.aliases.into_iter().collect(),
            raw.required,
            raw.date_fields,
            raw.visible_default,
        )
    }

    #[cfg(test)]
    fn to_file(&self) -> VocabularyFile {
        VocabularyFile {
            fields: self.fields.clone(),
            aliases: self.declared_aliases.iter().cloned().collect(),
            required: self.required.clone(),
            date_fields: self.date_fields.clone(),
            visible_default: self.visible_default.clone(),
        }
    }

    /// Canonical fields in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_canonical(&self, name: &str) -> bool {
        self.field_set.contains(name)
    }

    pub fn alias(&self, key: &str) -> Option<&str> {
        self.aliases.get(key).map(String::as_str)
    }

    pub fn aliases_for(&self, field: &str) -> Vec<&str> {
        self.declared_aliases
            .iter()
            .filter(|(_, target)| target == field)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required.iter().any(|f| f == field)
    }

    pub fn date_fields(&self) -> &[String] {
        &self.date_fields
    }

    pub fn is_date_field(&self, field: &str) -> bool {
        self.date_fields.iter().any(|f| f == field)
    }

    pub fn visible_default(&self) -> &[String] {
        &self.visible_default
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}
