//! Command-line definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

const EXAMPLES: &str = "\
Examples:
  csprobe list -f particles.cs
  csprobe query -f particles.cs -c alignments3D/pose_ess
  csprobe query -f particles.cs --all
  csprobe query -f particles.cs --all --csv columns_stats.csv
  csprobe histogram -f particles.cs -c alignments3D/pose_ess
  csprobe histogram -f particles.cs --all
  csprobe filter -f particles.cs -c alignments3D/pose_ess --min 2.1 -o filtered.cs
  csprobe filter -f particles.cs -c alignments3D/pose_ess --max 3.2 -o filtered.cs
  csprobe filter -f particles.cs -c alignments3D/pose_ess --min 2.1 --max 3.2 -o filtered.cs";

/// Query or filter a cs file.
#[derive(Parser, Debug)]
#[command(name = "csprobe")]
#[command(version, long_about = None, after_help = EXAMPLES)]
pub struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the columns in the cs file
    List {
        /// Path to the cs file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Get summary statistics for a column
    Query {
        /// Path to the cs file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        select: SelectArgs,

        /// Write column stats to csv
        #[arg(long, value_hint = ValueHint::FilePath)]
        csv: Option<PathBuf>,
    },

    /// Filter by column values
    Filter {
        /// Path to the cs file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Filter on this column
        #[arg(short, long)]
        column: String,

        /// Remove rows with values equal or lesser than this value
        #[arg(long, allow_negative_numbers = true)]
        min: Option<f64>,

        /// Remove rows with values equal or greater than this value
        #[arg(long, allow_negative_numbers = true)]
        max: Option<f64>,

        /// Name of file to write filter output
        #[arg(short, long, visible_alias = "out", value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },

    /// Save a histogram(s) for a column(s)
    Histogram {
        /// Path to the cs file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        select: SelectArgs,

        /// Number of equal-width bins
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
        bins: u32,
    },
}

/// Either one named column or every numeric column, never both.
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct SelectArgs {
    /// Use this column
    #[arg(short, long)]
    pub column: Option<String>,

    /// Use all numeric columns
    #[arg(short, long)]
    pub all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn column_and_all_are_exclusive_and_required() {
        let err = Cli::try_parse_from(["csprobe", "query", "-f", "a.cs"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["csprobe", "histogram", "-f", "a.cs", "-c", "x", "--all"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_filter_with_negative_and_zero_cutoffs() {
        let cli = Cli::try_parse_from([
            "csprobe", "filter", "-f", "a.cs", "-c", "x", "--min", "-1.5", "--max", "0", "--out", "b.cs",
        ])
        .unwrap();
        let Command::Filter { min, max, output, .. } = cli.command else {
            panic!("expected filter");
        };
        assert_eq!((min, max), (Some(-1.5), Some(0.0)));
        assert_eq!(output, PathBuf::from("b.cs"));
    }

    #[test]
    fn histogram_bins_default_to_ten() {
        let cli = Cli::try_parse_from(["csprobe", "-v", "histogram", "-f", "a.cs", "-a"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Histogram { bins, select, .. } = cli.command else {
            panic!("expected histogram");
        };
        assert_eq!(bins, 10);
        assert!(select.all);
        assert!(Cli::try_parse_from(["csprobe", "histogram", "-f", "a.cs", "-a", "--bins", "0"]).is_err());
    }
}
