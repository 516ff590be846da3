use ccc_common::value::ValueParseError;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CccDataError {
    #[error("Unknown dimension: `{0}`")]
    UnknownDimension(String),

    #[error("Dimension `{0}` is already defined")]
    DuplicateDimension(String),

    #[error("Dimension `{dimension}`: {source}")]
    Parse {
        dimension: String,
        source: ValueParseError,
    },

    #[error("Crosstab input needs at least {needed} columns, found {found}")]
    CrosstabTooNarrow { needed: usize, found: usize },

    #[error("Metadata column index {0} is out of range for the result set")]
    ColumnIndexOutOfRange(usize),

    #[error("Interpolation requires the value dimension `{0}` to be numeric")]
    NonNumericValueDimension(String),
}
