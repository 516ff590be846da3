use crate::complex::ComplexType;
use crate::data::Data;
use crate::dimension::DimensionType;
use crate::error::CccDataError;
use ccc_common::value::ValueKind;
use serde::Deserialize;
use std::collections::HashMap;

/// Declared type of an input column, as carried by the metadata
/// envelope. Legacy producers capitalize these, so both spellings are
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "string", alias = "String")]
    String,
    #[serde(rename = "numeric", alias = "Numeric", alias = "number", alias = "Number")]
    Numeric,
    #[serde(rename = "datetime", alias = "Datetime", alias = "DateTime")]
    Datetime,
    #[serde(rename = "boolean", alias = "Boolean")]
    Boolean,
}

impl ColumnType {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            ColumnType::String => ValueKind::String,
            ColumnType::Numeric => ValueKind::Number,
            ColumnType::Datetime => ValueKind::Date,
            ColumnType::Boolean => ValueKind::Boolean,
        }
    }

    fn is_continuous(&self) -> bool {
        matches!(self, ColumnType::Numeric | ColumnType::Datetime)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMetadata {
    #[serde(rename = "colIndex")]
    pub col_index: usize,
    #[serde(rename = "colType")]
    pub col_type: ColumnType,
    #[serde(rename = "colName")]
    pub col_name: String,
}

/// The tabular input envelope: a matrix of cells plus per-column
/// metadata. Both relational and crosstab inputs arrive in this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSource {
    pub resultset: Vec<Vec<serde_json::Value>>,
    pub metadata: Vec<ColumnMetadata>,
}

impl TableSource {
    /// Effective classification of a column: the metadata type, unless
    /// it claims `string` while every cell reads as a number (legacy
    /// producers routinely mislabel measure columns).
    fn column_is_continuous(&self, col: usize) -> bool {
        let meta = &self.metadata[col];
        if meta.col_type.is_continuous() {
            return true;
        }
        if meta.col_type != ColumnType::String {
            return false;
        }
        // First non-null cell votes.
        self.resultset
            .iter()
            .filter_map(|row| row.get(meta.col_index))
            .find(|cell| !cell.is_null())
            .map(|cell| cell.is_number())
            .unwrap_or(false)
    }

    fn column_kind(&self, col: usize) -> ValueKind {
        if self.column_is_continuous(col) {
            match self.metadata[col].col_type {
                ColumnType::Datetime => ValueKind::Date,
                _ => ValueKind::Number,
            }
        } else {
            self.metadata[col].col_type.value_kind()
        }
    }
}

/// One unbound measure role, in role-declaration order, with the
/// dimension group it defaults into.
#[derive(Debug, Clone)]
pub struct MeasureSlot {
    pub role: String,
    pub dimension_group: String,
}

/// What role resolution asks of a translator: which measure roles are
/// still unbound, where leftover discrete columns should go, and any
/// explicit column-to-dimension bindings from the chart spec.
#[derive(Debug, Clone, Default)]
pub struct TranslationRequest {
    pub measure_slots: Vec<MeasureSlot>,
    /// Dimension group receiving the remaining free discrete columns
    /// (`category` or `series`, chart-type specific).
    pub discrete_group: String,
    /// Explicit user bindings: column index → dimension name.
    pub explicit: HashMap<usize, String>,
}

/// A resolved column → dimension assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    pub col_index: usize,
    pub dimension: String,
    pub kind: ValueKind,
}

/// Translates relational rows: one input row per datum, one bound
/// column per dimension.
///
/// Free (unbound) columns are auto-assigned deterministically: measure
/// slots consume continuous columns in column order, then the discrete
/// target group consumes the remaining discrete columns in column
/// order. Changing the column order changes the assignment.
#[derive(Debug)]
pub struct RelationalTranslator {
    source: TableSource,
}

impl RelationalTranslator {
    pub fn new(source: TableSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &TableSource {
        &self.source
    }

    /// Classifies free columns and mutates the complex type with the
    /// auto-created dimensions. Returns the full set of column
    /// bindings, in column order.
    pub fn configure_type(
        &self,
        request: &TranslationRequest,
        ctype: &mut ComplexType,
    ) -> Result<Vec<ColumnBinding>, CccDataError> {
        let ncols = self.source.metadata.len();
        let mut bindings: Vec<ColumnBinding> = Vec::with_capacity(ncols);
        let mut bound: Vec<bool> = vec![false; ncols];

        // A column index no row can satisfy is a malformed envelope,
        // not a short row.
        let width = self.source.resultset.iter().map(Vec::len).max();
        if let Some(width) = width {
            for meta in &self.source.metadata {
                if meta.col_index >= width {
                    return Err(CccDataError::ColumnIndexOutOfRange(meta.col_index));
                }
            }
        }

        // Pass 1: explicit bindings win.
        for col in 0..ncols {
            if let Some(dim_name) = request.explicit.get(&col) {
                if bindings.iter().any(|b| b.dimension == *dim_name) {
                    log::warn!(
                        "dimension `{}` bound to more than one column; ignoring column {}",
                        dim_name,
                        col
                    );
                    continue;
                }
                let kind = match ctype.dimension(dim_name) {
                    Some(t) => t.value_kind(),
                    None => {
                        let kind = self.source.column_kind(col);
                        ctype.add(DimensionType::new(dim_name.clone(), kind))?;
                        kind
                    }
                };
                bindings.push(ColumnBinding {
                    col_index: self.source.metadata[col].col_index,
                    dimension: dim_name.clone(),
                    kind,
                });
                bound[col] = true;
            }
        }

        // Pass 2: unbound measure roles consume free continuous
        // columns, in role-declaration order then column order.
        let free_continuous: Vec<usize> = (0..ncols)
            .filter(|&c| !bound[c] && self.source.column_is_continuous(c))
            .collect();
        let mut free_continuous = free_continuous.into_iter();
        for slot in &request.measure_slots {
            let Some(col) = free_continuous.next() else {
                break;
            };
            let kind = self.source.column_kind(col);
            let name = ctype.next_group_name(&slot.dimension_group);
            ctype.add(DimensionType::new(name.clone(), kind))?;
            bindings.push(ColumnBinding {
                col_index: self.source.metadata[col].col_index,
                dimension: name,
                kind,
            });
            bound[col] = true;
        }

        // Pass 3: remaining free discrete columns feed the discrete
        // target group, in column order. Leftover continuous columns
        // stay unbound.
        if !request.discrete_group.is_empty() {
            for col in 0..ncols {
                if bound[col] || self.source.column_is_continuous(col) {
                    continue;
                }
                let kind = self.source.column_kind(col);
                let name = ctype.next_group_name(&request.discrete_group);
                ctype.add(DimensionType::new(name.clone(), kind))?;
                bindings.push(ColumnBinding {
                    col_index: self.source.metadata[col].col_index,
                    dimension: name,
                    kind,
                });
                bound[col] = true;
            }
        }

        for col in 0..ncols {
            if !bound[col] {
                log::debug!(
                    "input column {} (`{}`) left unbound",
                    col,
                    self.source.metadata[col].col_name
                );
            }
        }

        bindings.sort_by_key(|b| b.col_index);
        Ok(bindings)
    }

    /// Reads every row through the bindings and loads the datums into
    /// the owner. Cells beyond a short row read as null.
    pub fn load(
        &self,
        bindings: &[ColumnBinding],
        data: &mut Data,
    ) -> Result<usize, CccDataError> {
        let null = serde_json::Value::Null;
        for row in &self.source.resultset {
            let cells = bindings.iter().map(|b| {
                let raw = row.get(b.col_index).unwrap_or(&null);
                (b.dimension.as_str(), raw)
            });
            data.add_row(cells)?;
        }
        Ok(self.source.resultset.len())
    }
}

/// Translates crosstab matrices by first pivoting them into relational
/// rows: the leading `data_categories_count` columns stay as row
/// categories, every remaining column header becomes a `series` value
/// and its cells become the `value` measure.
#[derive(Debug)]
pub struct CrosstabTranslator {
    source: TableSource,
    data_categories_count: usize,
}

impl CrosstabTranslator {
    pub fn new(source: TableSource, data_categories_count: usize) -> Self {
        Self {
            source,
            data_categories_count,
        }
    }

    /// Pivots into the relational shape understood by
    /// `RelationalTranslator`.
    pub fn pivot(&self) -> Result<TableSource, CccDataError> {
        let ncols = self.source.metadata.len();
        let cat_count = self.data_categories_count;
        if ncols < cat_count + 1 {
            return Err(CccDataError::CrosstabTooNarrow {
                needed: cat_count + 1,
                found: ncols,
            });
        }

        let mut metadata: Vec<ColumnMetadata> = Vec::with_capacity(cat_count + 2);
        for meta in &self.source.metadata[..cat_count] {
            metadata.push(ColumnMetadata {
                col_index: metadata.len(),
                col_type: meta.col_type,
                col_name: meta.col_name.clone(),
            });
        }
        metadata.push(ColumnMetadata {
            col_index: cat_count,
            col_type: ColumnType::String,
            col_name: "series".to_string(),
        });
        metadata.push(ColumnMetadata {
            col_index: cat_count + 1,
            col_type: ColumnType::Numeric,
            col_name: "value".to_string(),
        });

        let null = serde_json::Value::Null;
        let mut resultset = Vec::new();
        for row in &self.source.resultset {
            for (col, meta) in self.source.metadata.iter().enumerate().skip(cat_count) {
                let mut out: Vec<serde_json::Value> = Vec::with_capacity(cat_count + 2);
                for cat_meta in &self.source.metadata[..cat_count] {
                    out.push(row.get(cat_meta.col_index).unwrap_or(&null).clone());
                }
                out.push(serde_json::Value::String(meta.col_name.clone()));
                out.push(row.get(self.source.metadata[col].col_index).unwrap_or(&null).clone());
                resultset.push(out);
            }
        }

        Ok(TableSource {
            resultset,
            metadata,
        })
    }

    pub fn into_relational(self) -> Result<RelationalTranslator, CccDataError> {
        Ok(RelationalTranslator::new(self.pivot()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(cols: &[(&str, ColumnType)]) -> Vec<ColumnMetadata> {
        cols.iter()
            .enumerate()
            .map(|(i, (name, t))| ColumnMetadata {
                col_index: i,
                col_type: *t,
                col_name: name.to_string(),
            })
            .collect()
    }

    fn value_slots(roles: &[&str]) -> Vec<MeasureSlot> {
        roles
            .iter()
            .map(|r| MeasureSlot {
                role: r.to_string(),
                dimension_group: "value".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_measure_binding_is_deterministic_and_order_sensitive() {
        // Four free numeric columns, three unbound measure roles: the
        // first three columns bind in role-declaration order, the
        // fourth stays unbound.
        let source = TableSource {
            resultset: vec![vec![json!(1), json!(2), json!(3), json!(4)]],
            metadata: meta(&[
                ("m1", ColumnType::Numeric),
                ("m2", ColumnType::Numeric),
                ("m3", ColumnType::Numeric),
                ("m4", ColumnType::Numeric),
            ]),
        };
        let translator = RelationalTranslator::new(source);
        let request = TranslationRequest {
            measure_slots: value_slots(&["value", "value2", "value3"]),
            discrete_group: "category".to_string(),
            explicit: HashMap::new(),
        };
        let mut ctype = ComplexType::new();
        let bindings = translator.configure_type(&request, &mut ctype).unwrap();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].dimension, "value");
        assert_eq!(bindings[1].dimension, "value2");
        assert_eq!(bindings[2].dimension, "value3");
        assert!(!ctype.has("value4"));
    }

    #[test]
    fn test_discrete_columns_feed_target_group() {
        let source = TableSource {
            resultset: vec![
                vec![json!("Jan"), json!("US"), json!(10)],
                vec![json!("Feb"), json!("EU"), json!(20)],
            ],
            metadata: meta(&[
                ("month", ColumnType::String),
                ("region", ColumnType::String),
                ("sales", ColumnType::Numeric),
            ]),
        };
        let translator = RelationalTranslator::new(source);
        let request = TranslationRequest {
            measure_slots: value_slots(&["value"]),
            discrete_group: "category".to_string(),
            explicit: HashMap::new(),
        };
        let mut ctype = ComplexType::new();
        let bindings = translator.configure_type(&request, &mut ctype).unwrap();
        let dims: Vec<&str> = bindings.iter().map(|b| b.dimension.as_str()).collect();
        // Column order: month → category, region → category2, sales → value.
        assert_eq!(dims, vec!["category", "category2", "value"]);

        let mut data = Data::new(ctype);
        let loaded = translator.load(&bindings, &mut data).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(data.datums()[0].atom("category").unwrap().key(), "Jan");
        assert_eq!(data.datums()[1].atom("value").unwrap().number(), Some(20.0));
    }

    #[test]
    fn test_numeric_looking_string_column_is_continuous() {
        let source = TableSource {
            resultset: vec![vec![json!("Jan"), json!(3.5)]],
            metadata: meta(&[("c", ColumnType::String), ("v", ColumnType::String)]),
        };
        // Second column is typed string but its cells are numbers.
        assert!(!source.column_is_continuous(0));
        assert!(source.column_is_continuous(1));
    }

    #[test]
    fn test_explicit_binding_wins() {
        let source = TableSource {
            resultset: vec![vec![json!("Jan"), json!(1)]],
            metadata: meta(&[("c", ColumnType::String), ("v", ColumnType::Numeric)]),
        };
        let translator = RelationalTranslator::new(source);
        let mut explicit = HashMap::new();
        explicit.insert(1usize, "profit".to_string());
        let request = TranslationRequest {
            measure_slots: value_slots(&["value"]),
            discrete_group: "category".to_string(),
            explicit,
        };
        let mut ctype = ComplexType::new();
        let bindings = translator.configure_type(&request, &mut ctype).unwrap();
        let dims: Vec<&str> = bindings.iter().map(|b| b.dimension.as_str()).collect();
        assert_eq!(dims, vec!["category", "profit"]);
        assert!(!ctype.has("value"));
    }

    #[test]
    fn test_metadata_column_index_past_every_row_is_rejected() {
        let mut metadata = meta(&[("c", ColumnType::String), ("v", ColumnType::Numeric)]);
        metadata[1].col_index = 5;
        let source = TableSource {
            resultset: vec![vec![json!("Jan"), json!(1)]],
            metadata,
        };
        let translator = RelationalTranslator::new(source);
        let request = TranslationRequest {
            measure_slots: value_slots(&["value"]),
            discrete_group: "category".to_string(),
            explicit: HashMap::new(),
        };
        let mut ctype = ComplexType::new();
        assert_eq!(
            translator.configure_type(&request, &mut ctype).unwrap_err(),
            CccDataError::ColumnIndexOutOfRange(5)
        );
    }

    #[test]
    fn test_crosstab_pivot() {
        // category | apples | pears
        let source = TableSource {
            resultset: vec![
                vec![json!("Jan"), json!(10), json!(20)],
                vec![json!("Feb"), json!(30), json!(40)],
            ],
            metadata: meta(&[
                ("category", ColumnType::String),
                ("apples", ColumnType::Numeric),
                ("pears", ColumnType::Numeric),
            ]),
        };
        let pivoted = CrosstabTranslator::new(source, 1).pivot().unwrap();
        assert_eq!(pivoted.metadata.len(), 3);
        assert_eq!(pivoted.resultset.len(), 4);
        assert_eq!(
            pivoted.resultset[0],
            vec![json!("Jan"), json!("apples"), json!(10)]
        );
        assert_eq!(
            pivoted.resultset[3],
            vec![json!("Feb"), json!("pears"), json!(40)]
        );
    }

    #[test]
    fn test_crosstab_too_narrow() {
        let source = TableSource {
            resultset: vec![],
            metadata: meta(&[("category", ColumnType::String)]),
        };
        assert!(matches!(
            CrosstabTranslator::new(source, 1).pivot(),
            Err(CccDataError::CrosstabTooNarrow { .. })
        ));
    }
}
