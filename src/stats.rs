use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::data::dtype::{Scalar, ScalarKind};
use crate::data::model::StructuredArray;
use crate::error::CsError;

// ---------------------------------------------------------------------------
// Summary – one row of query output
// ---------------------------------------------------------------------------

/// Mean, median, min and max of a numeric column, NaN values excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Width of the source elements, which decides how values print.
    pub precision: Precision,
}

impl Summary {
    /// Reduce `values`. With nothing left after dropping NaN, every
    /// statistic is NaN.
    pub fn from_values(column: &str, values: &[f64]) -> Self {
        let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            warn!("column {column} has no non-NaN values");
            return Summary {
                column: column.to_string(),
                mean: f64::NAN,
                median: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                precision: Precision::Double,
            };
        }

        present.sort_by(f64::total_cmp);
        let n = present.len();
        let mean = present.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            present[n / 2]
        } else {
            (present[n / 2 - 1] + present[n / 2]) / 2.0
        };
        Summary {
            column: column.to_string(),
            mean,
            median,
            min: present[0],
            max: present[n - 1],
            precision: Precision::Double,
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column: {}, mean: {}, median: {}, min: {}, max: {}",
            self.column,
            Repr(self.mean, self.precision),
            Repr(self.median, self.precision),
            Repr(self.min, self.precision),
            Repr(self.max, self.precision)
        )
    }
}

/// Floating-point width used when printing results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// `float32` columns print the shortest text that round-trips as `f32`.
    Single,
    #[default]
    Double,
}

impl Precision {
    pub fn of(scalar: &Scalar) -> Self {
        match (&scalar.kind, scalar.size) {
            (ScalarKind::Float, 4) => Precision::Single,
            _ => Precision::Double,
        }
    }
}

/// Shortest round-trip float text that always shows a decimal point:
/// `3.0`, `0.1`, `1e+20`, `nan`, `inf`.
pub struct Repr(pub f64, pub Precision);

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            return f.write_str("nan");
        }
        if v.is_infinite() {
            return f.write_str(if v > 0.0 { "inf" } else { "-inf" });
        }
        let (plain, scientific) = match self.1 {
            Precision::Single => (format!("{}", v as f32), format!("{:e}", v as f32)),
            Precision::Double => (format!("{v}"), format!("{v:e}")),
        };
        if v != 0.0 && !(1e-4..1e16).contains(&v.abs()) {
            match scientific.split_once('e') {
                Some((mantissa, exp)) if !exp.starts_with('-') => write!(f, "{mantissa}e+{exp:0>2}"),
                Some((mantissa, exp)) => write!(f, "{mantissa}e-{:0>2}", &exp[1..]),
                None => f.write_str(&scientific),
            }
        } else if plain.contains('.') {
            f.write_str(&plain)
        } else {
            write!(f, "{plain}.0")
        }
    }
}

// ---------------------------------------------------------------------------
// Column reductions
// ---------------------------------------------------------------------------

/// Summarise one named column; fails if it is missing or not numeric.
pub fn summarize_column(array: &StructuredArray, column: &str) -> Result<Summary, CsError> {
    let values = array.numeric_values(column)?;
    let precision = array
        .schema()
        .field(column)?
        .numeric_scalar()
        .map_or(Precision::Double, Precision::of);
    Ok(Summary::from_values(column, &values).with_precision(precision))
}

/// Summarise every numeric column in declaration order, skipping the rest.
pub fn summarize_numeric(array: &StructuredArray) -> Result<Vec<Summary>, CsError> {
    array
        .numeric_fields()
        .map(|field| summarize_column(array, &field.name))
        .collect()
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Serialized CSV row, values in the same text as stdout. NaN becomes an
/// empty field.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryRow<'a> {
    column: &'a str,
    mean: Option<String>,
    median: Option<String>,
    min: Option<String>,
    max: Option<String>,
}

impl<'a> From<&'a Summary> for SummaryRow<'a> {
    fn from(s: &'a Summary) -> Self {
        let present = |v: f64| (!v.is_nan()).then(|| Repr(v, s.precision).to_string());
        SummaryRow {
            column: &s.column,
            mean: present(s.mean),
            median: present(s.median),
            min: present(s.min),
            max: present(s.max),
        }
    }
}

/// Write `Column,Mean,Median,Min,Max` rows to any writer.
pub fn write_csv<W: Write>(writer: W, summaries: &[Summary]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if summaries.is_empty() {
        csv.write_record(["Column", "Mean", "Median", "Min", "Max"])?;
    }
    for summary in summaries {
        csv.serialize(SummaryRow::from(summary))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the summaries to `path`, replacing any existing file.
pub fn save_csv(path: &Path, summaries: &[Summary]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(file, summaries).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} summary rows to {}", summaries.len(), path.display());
    Ok(())
}
