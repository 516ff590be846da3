//! The tabular data layer of CCC: typed dimensions with atom interning,
//! datum collections, the hierarchical grouping engine, translation of
//! relational/crosstab input, and null-value interpolation.

pub mod atom;
pub mod complex;
pub mod data;
pub mod dimension;
pub mod error;
pub mod interpolate;
pub mod translate;

pub use atom::Atom;
pub use complex::{ComplexType, Datum, KEY_SEPARATOR};
pub use data::{Data, DataGroup, DatumFilter, GroupingArgs};
pub use dimension::{dimension_group_prefix, Dimension, DimensionType, ParseErrorPolicy};
pub use error::CccDataError;
pub use interpolate::{interpolate, InterpolationConfig, NullInterpolationMode};
pub use translate::{
    ColumnBinding, ColumnMetadata, ColumnType, CrosstabTranslator, MeasureSlot,
    RelationalTranslator, TableSource, TranslationRequest,
};
