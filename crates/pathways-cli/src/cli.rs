//! Command-line arguments

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pathways_core::{DatabaseKind, Dimension, DimensionInputs, RunId, RunOptions};
use std::path::PathBuf;

/// Message printed when `--regions` is missing
pub const MISSING_REGIONS: &str =
    "Missing --regions argument. Use --regions ALLREGIONS to run all available regions.";

/// Usage errors detected after clap parsing
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("{}", MISSING_REGIONS)]
    MissingRegions,
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub regions: String,
    pub keys_design: Option<String>,
    pub keys_future: Option<String>,
    pub keys_primary: Option<String>,
    pub keys_strategy: Option<String>,
    pub models: String,
    pub id: Option<RunId>,
    pub n_trials: Option<u32>,
    pub random_seed: Option<i64>,
    pub max_solve_attempts: u32,
    pub database_type: String,
    pub exclude_fuel_production: bool,
    pub save_inputs: bool,
    pub config: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub log_json: bool,
}

fn key_arg(dimension: Dimension, help: &'static str) -> Arg {
    let long = match dimension {
        Dimension::Design => "keys-design",
        Dimension::Future => "keys-future",
        Dimension::Primary => "keys-primary",
        Dimension::Strategy => "keys-strategy",
    };
    Arg::new(dimension.cli_key())
        .long(long)
        .value_name("LIST|FILE")
        .help(help)
}

/// Build the command definition
#[must_use]
pub fn command() -> Command {
    Command::new("pathways")
        .version(pathways_core::VERSION)
        .about("Resolve scenario selections and run sectoral pathway batches")
        .arg(
            Arg::new("regions")
                .long("regions")
                .value_name("LIST")
                .help("Comma-delimited regions or ISO codes to run; ALLREGIONS runs every region"),
        )
        .arg(key_arg(
            Dimension::Design,
            "Comma-delimited design ids, or a table with a design_id column",
        ))
        .arg(key_arg(
            Dimension::Future,
            "Comma-delimited future ids, or a table with a future_id column; ids must be <= n_trials",
        ))
        .arg(key_arg(
            Dimension::Primary,
            "Comma-delimited primary ids, or a table with a primary_id column; overrides the other keys",
        ))
        .arg(key_arg(
            Dimension::Strategy,
            "Comma-delimited strategy ids, or a table with a strategy_id column",
        ))
        .arg(
            Arg::new("models")
                .long("models")
                .default_value("All")
                .help("Models to run: All, or any of AFOLU/af, CircularEconomy/ce, Energy/en, IPPU/ip"),
        )
        .arg(
            Arg::new("id")
                .long("id")
                .value_parser(|s: &str| s.parse::<RunId>())
                .help("Run identifier; names the run directory under the output root"),
        )
        .arg(
            Arg::new("n-trials")
                .long("n-trials")
                .value_parser(value_parser!(u32))
                .help("Number of uncertainty trials (futures)"),
        )
        .arg(
            Arg::new("random-seed")
                .long("random-seed")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true)
                .help("Random seed; a negative value draws one at random"),
        )
        .arg(
            Arg::new("max-solve-attempts")
                .long("max-solve-attempts")
                .default_value("2")
                .value_parser(value_parser!(u32))
                .help("Attempts per unit on numerical or solver instability"),
        )
        .arg(
            Arg::new("database-type")
                .long("database-type")
                .default_value("sqlite")
                .help("Output database type: sqlite or csv"),
        )
        .arg(
            Arg::new("exclude-fuel-production")
                .long("exclude-fuel-production")
                .action(ArgAction::SetTrue)
                .help("Exclude the fuel production model"),
        )
        .arg(
            Arg::new("save-inputs")
                .long("save-inputs")
                .action(ArgAction::SetTrue)
                .help("Save model inputs with the outputs"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .value_parser(value_parser!(usize))
                .help("Work units per chunk (overrides configuration)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
}

impl CliArgs {
    /// Extract arguments from clap matches
    ///
    /// # Errors
    /// `UsageError::MissingRegions` when `--regions` was not given
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, UsageError> {
        let string = |name: &str| matches.get_one::<String>(name).cloned();
        let regions = string("regions").ok_or(UsageError::MissingRegions)?;

        Ok(Self {
            regions,
            keys_design: string(Dimension::Design.cli_key()),
            keys_future: string(Dimension::Future.cli_key()),
            keys_primary: string(Dimension::Primary.cli_key()),
            keys_strategy: string(Dimension::Strategy.cli_key()),
            models: string("models").unwrap_or_else(|| "All".to_string()),
            id: matches.get_one::<RunId>("id").cloned(),
            n_trials: matches.get_one::<u32>("n-trials").copied(),
            random_seed: matches.get_one::<i64>("random-seed").copied(),
            max_solve_attempts: matches
                .get_one::<u32>("max-solve-attempts")
                .copied()
                .unwrap_or(pathways_core::options::DEFAULT_MAX_SOLVE_ATTEMPTS),
            database_type: string("database-type").unwrap_or_else(|| "sqlite".to_string()),
            exclude_fuel_production: matches.get_flag("exclude-fuel-production"),
            save_inputs: matches.get_flag("save-inputs"),
            config: matches.get_one::<PathBuf>("config").cloned(),
            chunk_size: matches.get_one::<usize>("chunk-size").copied(),
            log_json: matches.get_flag("log-json"),
        })
    }

    /// Parse from an argument iterator
    ///
    /// # Errors
    /// clap errors for malformed arguments; missing regions as a usage error
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches)?)
    }

    /// Raw dimension inputs keyed by dimension
    #[must_use]
    pub fn dimension_inputs(&self) -> DimensionInputs {
        DimensionInputs::new()
            .with_optional(Dimension::Design, self.keys_design.as_deref())
            .with_optional(Dimension::Future, self.keys_future.as_deref())
            .with_optional(Dimension::Primary, self.keys_primary.as_deref())
            .with_optional(Dimension::Strategy, self.keys_strategy.as_deref())
    }

    /// Apply command-line overrides to configured run options
    #[must_use]
    pub fn apply(&self, mut options: RunOptions) -> RunOptions {
        options = options
            .with_max_solve_attempts(self.max_solve_attempts)
            .with_database_kind(DatabaseKind::parse_lenient(&self.database_type))
            .with_include_fuel_production(!self.exclude_fuel_production)
            .with_save_inputs(self.save_inputs);
        if let Some(chunk_size) = self.chunk_size {
            options = options.with_chunk_size(chunk_size);
        }
        if let Some(n) = self.n_trials {
            options = options.with_n_trials(n);
        }
        if let Some(seed) = self.random_seed {
            options = options.with_random_seed(seed);
        }
        if let Some(id) = &self.id {
            options = options.with_run_id(id.clone());
        }
        options
    }
}
