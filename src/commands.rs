//! The four operations and their dispatch from parsed arguments.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::cli::{Command, SelectArgs};
use crate::data::filter::{filter_rows, RangeFilter};
use crate::data::loader::{load_file, save_file};
use crate::data::model::StructuredArray;
use crate::error::CsError;
use crate::plot::{save_histogram, HistogramOptions};
use crate::stats::{save_csv, summarize_column, summarize_numeric, Summary};

// ---------------------------------------------------------------------------
// Column selection
// ---------------------------------------------------------------------------

/// Which columns `query` and `histogram` operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    /// One named column; a non-numeric column is an error.
    Single(String),
    /// Every numeric column; non-numeric columns are skipped.
    AllNumeric,
}

impl TryFrom<&SelectArgs> for ColumnSelection {
    type Error = CsError;

    fn try_from(args: &SelectArgs) -> Result<Self, Self::Error> {
        match (&args.column, args.all) {
            (Some(column), false) => Ok(ColumnSelection::Single(column.clone())),
            (None, true) => Ok(ColumnSelection::AllNumeric),
            (None, false) => Err(CsError::Selection("Must specify a column name or all".into())),
            (Some(_), true) => Err(CsError::Selection(
                "Please specify either a column name or all, not both".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Print `Name  Type  Offset` rows, tab-separated, in declaration order.
pub fn list_columns<W: Write>(array: &StructuredArray, out: &mut W) -> io::Result<()> {
    writeln!(out, "Name\tType\tOffset")?;
    for field in array.schema().fields() {
        writeln!(out, "{}\t{}\t{}", field.name, field.dtype, field.offset)?;
    }
    Ok(())
}

/// Compute summaries for the selection. Nothing is returned, and so
/// nothing printed, if a named column fails.
pub fn query(array: &StructuredArray, selection: &ColumnSelection) -> Result<Vec<Summary>, CsError> {
    match selection {
        ColumnSelection::Single(column) => Ok(vec![summarize_column(array, column)?]),
        ColumnSelection::AllNumeric => summarize_numeric(array),
    }
}

/// Save one PNG per selected column into `dir`.
pub fn histograms(
    array: &StructuredArray,
    selection: &ColumnSelection,
    dir: &Path,
    options: &HistogramOptions,
) -> Result<Vec<PathBuf>> {
    match selection {
        ColumnSelection::Single(column) => {
            Ok(vec![save_histogram(array, column, dir, options)?])
        }
        ColumnSelection::AllNumeric => array
            .numeric_fields()
            .map(|field| save_histogram(array, &field.name, dir, options))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run one parsed subcommand to completion.
pub fn execute(command: &Command) -> Result<()> {
    match command {
        Command::List { file } => {
            let array = load_file(file)?;
            list_columns(&array, &mut io::stdout().lock())?;
        }

        Command::Query { file, select, csv } => {
            let selection = ColumnSelection::try_from(select)?;
            let array = load_file(file)?;
            let summaries = query(&array, &selection)?;
            let mut stdout = io::stdout().lock();
            for summary in &summaries {
                writeln!(stdout, "{summary}")?;
            }
            if let Some(path) = csv {
                save_csv(path, &summaries)?;
            }
        }

        Command::Filter {
            file,
            column,
            min,
            max,
            output,
        } => {
            let array = load_file(file)?;
            let filter = RangeFilter::new(*min, *max);
            let filtered = filter_rows(&array, column, &filter)?;
            if filter.is_unbounded() {
                info!("no cutoff given, copying all rows");
            }
            info!("kept {} of {} rows", filtered.len(), array.len());
            save_file(output, &filtered)?;
        }

        Command::Histogram { file, select, bins } => {
            let selection = ColumnSelection::try_from(select)?;
            let array = load_file(file)?;
            let options = HistogramOptions {
                bins: *bins as usize,
                ..HistogramOptions::default()
            };
            let dir = std::env::current_dir().context("resolving the working directory")?;
            histograms(&array, &selection, &dir, &options)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Schema;
    use crate::plot::histogram::Histogram;
    use crate::plot::render;

    fn mixed() -> StructuredArray {
        let schema = Schema::parse(
            "[('uid', '<u8'), ('blob/path', '|S4'), ('score', '<f4'), ('flag', '|b1')]",
        )
        .unwrap();
        let mut data = Vec::new();
        for (uid, score) in [(1u64, 1.0f32), (2, 2.0), (3, f32::NAN), (4, 4.0), (5, 5.0)] {
            data.extend_from_slice(&uid.to_le_bytes());
            data.extend_from_slice(b"a.mr");
            data.extend_from_slice(&score.to_le_bytes());
            data.push(1);
        }
        StructuredArray::new(schema, 5, data).unwrap()
    }

    #[test]
    fn selection_requires_exactly_one_choice() {
        let both = SelectArgs {
            column: Some("score".into()),
            all: true,
        };
        assert!(matches!(ColumnSelection::try_from(&both), Err(CsError::Selection(_))));
        assert!(matches!(
            ColumnSelection::try_from(&SelectArgs::default()),
            Err(CsError::Selection(_))
        ));
        let one = SelectArgs {
            column: Some("score".into()),
            all: false,
        };
        assert_eq!(
            ColumnSelection::try_from(&one).unwrap(),
            ColumnSelection::Single("score".into())
        );
    }

    #[test]
    fn list_prints_one_row_per_field() {
        let mut out = Vec::new();
        list_columns(&mixed(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Name\tType\tOffset");
        assert_eq!(lines[2], "blob/path\t|S4\t8");
        assert_eq!(lines[4], "flag\tbool\t16");
    }

    #[test]
    fn query_all_skips_non_numeric_columns() {
        let summaries = query(&mixed(), &ColumnSelection::AllNumeric).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, ["uid", "score"]);
        let score = &summaries[1];
        assert_eq!((score.mean, score.median, score.min, score.max), (3.0, 3.0, 1.0, 5.0));
    }

    #[test]
    fn query_named_non_numeric_column_fails() {
        let err = query(&mixed(), &ColumnSelection::Single("flag".into())).unwrap_err();
        assert!(matches!(err, CsError::NotNumeric(_)));
        let err = query(&mixed(), &ColumnSelection::Single("missing".into())).unwrap_err();
        assert!(matches!(err, CsError::UnknownColumn(_)));
    }

    #[test]
    fn histograms_for_all_numeric_columns() {
        let dir = tempfile::tempdir().unwrap();
        let written = histograms(
            &mixed(),
            &ColumnSelection::AllNumeric,
            dir.path(),
            &HistogramOptions::default(),
        )
        .unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["uid_histogram.png", "score_histogram.png"]);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn each_histogram_matches_its_column_drawn_alone() {
        let array = mixed();
        let options = HistogramOptions::default();
        let dir = tempfile::tempdir().unwrap();
        let written = histograms(&array, &ColumnSelection::AllNumeric, dir.path(), &options).unwrap();
        assert_eq!(written.len(), 2);

        for (path, column) in written.iter().zip(["uid", "score"]) {
            let saved = image::open(path).unwrap().to_rgb8();
            let values = array.numeric_values(column).unwrap();
            let alone = render(&Histogram::compute(&values, options.bins), &options);
            assert!(saved == alone, "{column} histogram differs from a standalone render");
        }

        let uid = image::open(&written[0]).unwrap().to_rgb8();
        let score = image::open(&written[1]).unwrap().to_rgb8();
        assert!(uid != score);
    }

    #[test]
    fn histogram_of_named_text_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = histograms(
            &mixed(),
            &ColumnSelection::Single("blob/path".into()),
            dir.path(),
            &HistogramOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<CsError>(), Some(CsError::NotNumeric(_))));
        assert!(!dir.path().join("blob_path_histogram.png").exists());
    }
}
