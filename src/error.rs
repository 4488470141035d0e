use thiserror::Error;

use crate::layout::SourceKind;

/// Failures raised while turning raw CSV rows into records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("{kind} layout has no field named '{field}'")]
    UnknownField { kind: SourceKind, field: String },
    #[error("{kind} layout maps '{field}' to header '{header}', which is not present in the file")]
    UnknownHeader {
        kind: SourceKind,
        field: String,
        header: String,
    },
    #[error("Row {row} has {width} column(s); {kind} field '{field}' expects column {index}")]
    MissingColumn {
        kind: SourceKind,
        field: String,
        index: usize,
        row: usize,
        width: usize,
    },
}
