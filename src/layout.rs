//! Column layouts mapping export columns to record fields.
//!
//! Every record kind has a fixed table of `field -> column` entries matching
//! the Zoho CRM exports of July 2024. A YAML layout file can override any
//! entry, either with a zero-based column index or with a header name that is
//! looked up in the file's header row when the layout is resolved.

use std::{collections::BTreeMap, fmt, path::Path};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::MappingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Deal,
    Account,
    Contact,
    Lead,
    Task,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Deal,
        SourceKind::Account,
        SourceKind::Contact,
        SourceKind::Lead,
        SourceKind::Task,
    ];

    fn as_str(self) -> &'static str {
        match self {
            SourceKind::Deal => "deal",
            SourceKind::Account => "account",
            SourceKind::Contact => "contact",
            SourceKind::Lead => "lead",
            SourceKind::Task => "task",
        }
    }

    /// Default `field -> column` table for this kind.
    pub fn zoho_columns(self) -> &'static [(&'static str, usize)] {
        match self {
            SourceKind::Deal => DEAL_COLUMNS,
            SourceKind::Account => ACCOUNT_COLUMNS,
            SourceKind::Contact => CONTACT_COLUMNS,
            SourceKind::Lead => LEAD_COLUMNS,
            SourceKind::Task => TASK_COLUMNS,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const DEAL_COLUMNS: &[(&str, usize)] = &[
    ("account_id", 5),
    ("stage", 7),
    ("probability", 9),
    ("contact_id", 15),
];

const ACCOUNT_COLUMNS: &[(&str, usize)] = &[
    ("id", 0),
    ("name", 3),
    ("website", 8),
    ("annual_revenue", 12),
    ("sic_code", 13),
];

const CONTACT_COLUMNS: &[(&str, usize)] = &[
    ("id", 0),
    ("owner_id", 1),
    ("owner_name", 2),
    ("first_name", 3),
    ("last_name", 4),
    ("email", 9),
    ("phone_number", 12),
    ("alt_phone_number", 13),
    ("tags", 38),
];

const LEAD_COLUMNS: &[(&str, usize)] = &[
    ("id", 0),
    ("owner_id", 1),
    ("company", 3),
    ("first_name", 4),
    ("last_name", 5),
    ("email", 6),
    ("phone_number", 7),
    ("website", 8),
    ("status", 9),
    ("annual_revenue", 10),
    ("street", 12),
    ("city", 13),
    ("state", 14),
    ("zip", 15),
    ("tags", 19),
    ("alt_phone_number", 32),
    ("mailing_zip", 37),
    ("mailing_state", 38),
    ("mailing_street", 41),
    ("mailing_city", 42),
];

const TASK_COLUMNS: &[(&str, usize)] = &[
    ("id", 0),
    ("owner_id", 1),
    ("subject", 3),
    ("due_date", 4),
    ("related_to_id", 7),
    ("related_to", 8),
    ("status", 9),
    ("priority", 10),
    ("description", 17),
    ("tags", 21),
];

/// Where a field's value lives in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Header(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    kind: SourceKind,
    columns: BTreeMap<String, ColumnRef>,
}

impl RecordLayout {
    pub fn zoho(kind: SourceKind) -> Self {
        let columns = kind
            .zoho_columns()
            .iter()
            .map(|(field, idx)| (field.to_string(), ColumnRef::Index(*idx)))
            .collect();
        RecordLayout { kind, columns }
    }

    /// Remaps `field`; only fields of the default table can be remapped.
    pub fn set(&mut self, field: &str, column: ColumnRef) -> Result<(), MappingError> {
        match self.columns.get_mut(field) {
            Some(slot) => {
                *slot = column;
                Ok(())
            }
            None => Err(MappingError::UnknownField {
                kind: self.kind,
                field: field.to_string(),
            }),
        }
    }

    /// Pins every header reference to a column index using `headers`.
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedLayout, MappingError> {
        let mut indices = BTreeMap::new();
        for (field, column) in &self.columns {
            let idx = match column {
                ColumnRef::Index(idx) => *idx,
                ColumnRef::Header(name) => headers
                    .iter()
                    .position(|h| h.trim() == name.trim())
                    .ok_or_else(|| MappingError::UnknownHeader {
                        kind: self.kind,
                        field: field.clone(),
                        header: name.clone(),
                    })?,
            };
            indices.insert(field.clone(), idx);
        }
        Ok(ResolvedLayout {
            kind: self.kind,
            indices,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedLayout {
    kind: SourceKind,
    indices: BTreeMap<String, usize>,
}

impl ResolvedLayout {
    pub fn index(&self, field: &str) -> Option<usize> {
        self.indices.get(field).copied()
    }

    /// Wraps a data row; `row` is the 1-based line number including the header.
    pub fn row<'a>(&'a self, record: &'a [String], row: usize) -> MappedRow<'a> {
        MappedRow {
            layout: self,
            record,
            row,
        }
    }
}

pub struct MappedRow<'a> {
    layout: &'a ResolvedLayout,
    record: &'a [String],
    row: usize,
}

impl<'a> MappedRow<'a> {
    pub fn str(&self, field: &str) -> Result<&'a str, MappingError> {
        let index = self
            .layout
            .index(field)
            .ok_or_else(|| MappingError::UnknownField {
                kind: self.layout.kind,
                field: field.to_string(),
            })?;
        self.record
            .get(index)
            .map(|s| s.as_str())
            .ok_or_else(|| MappingError::MissingColumn {
                kind: self.layout.kind,
                field: field.to_string(),
                index,
                row: self.row,
                width: self.record.len(),
            })
    }

    pub fn get(&self, field: &str) -> Result<String, MappingError> {
        self.str(field).map(|s| s.to_string())
    }
}

/// Per-kind overrides as written in a layout YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutOverrides {
    pub deals: BTreeMap<String, ColumnRef>,
    pub accounts: BTreeMap<String, ColumnRef>,
    pub contacts: BTreeMap<String, ColumnRef>,
    pub leads: BTreeMap<String, ColumnRef>,
    pub tasks: BTreeMap<String, ColumnRef>,
}

impl LayoutOverrides {
    fn for_kind(&self, kind: SourceKind) -> &BTreeMap<String, ColumnRef> {
        match kind {
            SourceKind::Deal => &self.deals,
            SourceKind::Account => &self.accounts,
            SourceKind::Contact => &self.contacts,
            SourceKind::Lead => &self.leads,
            SourceKind::Task => &self.tasks,
        }
    }
}

/// Layouts for every record kind of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    layouts: BTreeMap<SourceKind, RecordLayout>,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            layouts: SourceKind::ALL
                .iter()
                .map(|kind| (*kind, RecordLayout::zoho(*kind)))
                .collect(),
        }
    }
}

impl Layout {
    pub fn get(&self, kind: SourceKind) -> &RecordLayout {
        // every kind is populated by `Default`
        &self.layouts[&kind]
    }

    pub fn apply(&mut self, overrides: &LayoutOverrides) -> Result<(), MappingError> {
        for kind in SourceKind::ALL {
            let layout = self
                .layouts
                .entry(kind)
                .or_insert_with(|| RecordLayout::zoho(kind));
            for (field, column) in overrides.for_kind(kind) {
                debug!("Remapping {kind} field '{field}' to {column:?}");
                layout.set(field, column.clone())?;
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let overrides: LayoutOverrides =
            serde_yaml::from_str(input).context("Parsing layout YAML")?;
        let mut layout = Layout::default();
        layout.apply(&overrides)?;
        Ok(layout)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Opening layout file {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Loading layout from {path:?}"))
    }
}
