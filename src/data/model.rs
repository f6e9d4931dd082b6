use std::collections::HashMap;

use log::debug;

use super::dtype::{parse_record, DType, Scalar};
use super::header::{parse_literal, PyValue};
use crate::error::CsError;

// ---------------------------------------------------------------------------
// Field – one named column of the record layout
// ---------------------------------------------------------------------------

/// A column: name, declared type and byte offset inside each row.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub dtype: DType,
    pub offset: usize,
    /// Numeric element type and elements per row, classified once at load.
    numeric: Option<(Scalar, usize)>,
}

impl Field {
    pub fn new(name: String, dtype: DType, offset: usize) -> Self {
        let numeric = dtype.numeric_layout();
        Field {
            name,
            dtype,
            offset,
            numeric,
        }
    }

    /// Whether the column supports mean / median / min / max.
    pub fn is_numeric(&self) -> bool {
        self.numeric.is_some()
    }

    /// Element type of a numeric column.
    pub fn numeric_scalar(&self) -> Option<&Scalar> {
        self.numeric.as_ref().map(|(scalar, _)| scalar)
    }
}

// ---------------------------------------------------------------------------
// Schema – ordered fields plus a by-name index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    itemsize: usize,
    /// The `descr` literal as read, written back unchanged on save.
    descr: PyValue,
}

impl Schema {
    /// Build the schema from a list-form `descr` literal.
    pub fn from_descr(descr: PyValue) -> Result<Self, CsError> {
        let record = parse_record(&descr)?;
        let fields: Vec<Field> = record
            .fields
            .into_iter()
            .map(|f| Field::new(f.name, f.dtype, f.offset))
            .collect();
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Ok(Schema {
            fields,
            index,
            itemsize: record.itemsize,
            descr,
        })
    }

    /// Convenience for literal text such as `"[('score', '<f8')]"`.
    pub fn parse(descr: &str) -> Result<Self, CsError> {
        Self::from_descr(parse_literal(descr)?)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Result<&Field, CsError> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| CsError::UnknownColumn(name.to_string()))
    }

    /// Bytes per row.
    pub fn itemsize(&self) -> usize {
        self.itemsize
    }

    pub fn descr(&self) -> &PyValue {
        &self.descr
    }
}

// ---------------------------------------------------------------------------
// StructuredArray – the complete loaded table
// ---------------------------------------------------------------------------

/// A table of fixed-width rows sharing one schema, held fully in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredArray {
    schema: Schema,
    rows: usize,
    data: Vec<u8>,
}

impl StructuredArray {
    /// Wrap raw row bytes. `data` must hold exactly `rows * itemsize` bytes.
    pub fn new(schema: Schema, rows: usize, data: Vec<u8>) -> Result<Self, CsError> {
        let expected = rows
            .checked_mul(schema.itemsize())
            .ok_or_else(|| CsError::Header(format!("{rows} rows overflow the data size")))?;
        if data.len() != expected {
            return Err(CsError::Truncated {
                expected,
                actual: data.len(),
            });
        }
        Ok(StructuredArray { schema, rows, data })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Raw row bytes, `len() * itemsize` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Fields that support statistics, in declaration order.
    pub fn numeric_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.schema.fields().iter().filter(|f| {
            if !f.is_numeric() {
                debug!("skipping non-numeric column {}", f.name);
            }
            f.is_numeric()
        })
    }

    /// Every element of a numeric column as `f64`, row-major.
    /// Sub-array columns contribute all of their elements.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>, CsError> {
        let field = self.schema.field(name)?;
        let (scalar, count) = field
            .numeric
            .as_ref()
            .ok_or_else(|| CsError::NotNumeric(name.to_string()))?;

        // zero-length sub-arrays, possibly in zero-byte rows
        if *count == 0 {
            return Ok(Vec::new());
        }
        let itemsize = self.schema.itemsize();
        let mut values = Vec::with_capacity(self.rows * count);
        for row in 0..self.rows {
            let base = row * itemsize + field.offset;
            for k in 0..*count {
                let start = base + k * scalar.size;
                let value = scalar
                    .read_f64(&self.data[start..start + scalar.size])
                    .unwrap_or(f64::NAN);
                values.push(value);
            }
        }
        Ok(values)
    }

    /// One `f64` per row; rejects sub-array columns.
    pub fn scalar_values(&self, name: &str) -> Result<Vec<f64>, CsError> {
        let field = self.schema.field(name)?;
        match &field.numeric {
            None => Err(CsError::NotNumeric(name.to_string())),
            Some((_, count)) if *count != 1 => Err(CsError::NotScalar(name.to_string())),
            Some(_) => self.numeric_values(name),
        }
    }

    /// A new array holding the given rows, in the order given.
    pub fn take_rows(&self, indices: &[usize]) -> StructuredArray {
        let itemsize = self.schema.itemsize();
        let mut data = Vec::with_capacity(indices.len() * itemsize);
        for &i in indices {
            data.extend_from_slice(&self.data[i * itemsize..(i + 1) * itemsize]);
        }
        StructuredArray {
            schema: self.schema.clone(),
            rows: indices.len(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StructuredArray {
        let schema = Schema::parse("[('score', '<f8'), ('tag', '|S2'), ('shift', '<i2', (2,))]").unwrap();
        let mut data = Vec::new();
        for (score, tag, shift) in [(1.5f64, b"ab", [1i16, -1]), (-2.0, b"cd", [3, 4])] {
            data.extend_from_slice(&score.to_le_bytes());
            data.extend_from_slice(tag);
            for s in shift {
                data.extend_from_slice(&s.to_le_bytes());
            }
        }
        StructuredArray::new(schema, 2, data).unwrap()
    }

    #[test]
    fn schema_keeps_declaration_order_and_offsets() {
        let array = sample();
        let fields = array.schema().fields();
        let layout: Vec<(&str, usize)> = fields.iter().map(|f| (f.name.as_str(), f.offset)).collect();
        assert_eq!(layout, [("score", 0), ("tag", 8), ("shift", 10)]);
        assert_eq!(array.schema().itemsize(), 14);
        let numeric: Vec<&str> = array.numeric_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(numeric, ["score", "shift"]);
    }

    #[test]
    fn reads_columns() {
        let array = sample();
        assert_eq!(array.scalar_values("score").unwrap(), [1.5, -2.0]);
        assert_eq!(array.numeric_values("shift").unwrap(), [1.0, -1.0, 3.0, 4.0]);
    }

    #[test]
    fn column_errors_are_typed() {
        let array = sample();
        assert!(matches!(array.numeric_values("tag"), Err(CsError::NotNumeric(_))));
        assert!(matches!(array.scalar_values("shift"), Err(CsError::NotScalar(_))));
        assert!(matches!(array.numeric_values("nope"), Err(CsError::UnknownColumn(_))));
    }

    #[test]
    fn take_rows_copies_selected_records() {
        let array = sample();
        let subset = array.take_rows(&[1]);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.schema(), array.schema());
        assert_eq!(subset.scalar_values("score").unwrap(), [-2.0]);
    }

    #[test]
    fn empty_sub_array_column_yields_no_values() {
        let schema = Schema::parse("[('a', '<f4', (0,))]").unwrap();
        let array = StructuredArray::new(schema, 3, vec![]).unwrap();
        assert_eq!(array.len(), 3);
        assert!(array.schema().fields()[0].is_numeric());
        assert!(array.numeric_values("a").unwrap().is_empty());
        assert!(matches!(array.scalar_values("a"), Err(CsError::NotScalar(_))));
    }

    #[test]
    fn rejects_wrong_data_length() {
        let schema = Schema::parse("[('score', '<f8')]").unwrap();
        assert!(matches!(
            StructuredArray::new(schema, 2, vec![0; 15]),
            Err(CsError::Truncated { expected: 16, actual: 15 })
        ));
        let schema = Schema::parse("[('score', '<f8')]").unwrap();
        assert!(matches!(
            StructuredArray::new(schema, usize::MAX / 4, vec![]),
            Err(CsError::Header(_))
        ));
    }
}
