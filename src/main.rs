//! @ai:module:intent CLI entry point for forward merges, strips and tree runs
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on forward, strip, tree, output, config

use clap::{Args, Parser, Subcommand, ValueEnum};
use extremedoc::{
    annotation, forward, output, strip, textfile, tree, Error, MergeConfig, NewAnnotationPolicy,
    OutputFormat, WhitespaceMode,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "extremedoc")]
#[command(author, version, about = "Carry annotation comments forward onto updated source files")]
struct Cli {
    /// Log pipeline stages to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PatternArgs {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Regex recognizing annotation lines (overrides the config file)
    #[arg(long)]
    pattern: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge an annotated file forward onto a newer clean file
    Merge {
        /// Current annotated file
        old_file: PathBuf,

        /// New clean (or partially annotated) file
        new_file: PathBuf,

        /// Write the merged file here instead of stdout
        #[arg(long, short, conflicts_with = "in_place")]
        output: Option<PathBuf>,

        /// Replace OLD_FILE with the merged result
        #[arg(long)]
        in_place: bool,

        /// Surface every new-side annotation, not only unseen ones
        #[arg(long)]
        all_new_annotations: bool,

        /// Ignore trailing whitespace when matching lines
        #[arg(long)]
        ignore_trailing_whitespace: bool,

        /// Exit with code 1 if the merge needs review
        #[arg(long)]
        check: bool,

        /// Output format on stdout; a written file always holds the merged text
        #[arg(long, short, value_enum, default_value = "text", conflicts_with_all = ["output", "in_place"])]
        format: Format,

        #[command(flatten)]
        pattern: PatternArgs,
    },

    /// Remove annotation lines from a file
    Strip {
        /// Annotated file
        input: PathBuf,

        /// Write here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[command(flatten)]
        pattern: PatternArgs,
    },

    /// Show how a file groups into annotation units
    Parse {
        /// Path to file
        path: PathBuf,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,

        #[command(flatten)]
        pattern: PatternArgs,
    },

    /// Run merges or strips over a whole directory tree
    Tree {
        #[command(subcommand)]
        command: TreeCommands,
    },
}

#[derive(Subcommand)]
enum TreeCommands {
    /// Merge every clean file onto its annotated counterpart
    Forward {
        clean_dir: PathBuf,
        annotated_dir: PathBuf,

        /// Write merged files (default is a dry run)
        #[arg(long)]
        write: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,

        #[command(flatten)]
        pattern: PatternArgs,
    },

    /// Strip every annotated file into the clean tree
    Strip {
        annotated_dir: PathBuf,
        clean_dir: PathBuf,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,

        #[command(flatten)]
        pattern: PatternArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

impl PatternArgs {
    fn load(&self) -> Result<MergeConfig, Error> {
        let mut config = match &self.config {
            Some(path) => MergeConfig::from_file(path)?,
            None => MergeConfig::default(),
        };
        if let Some(pattern) = &self.pattern {
            config.annotation_pattern = pattern.clone();
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, Error> {
    match command {
        Commands::Merge {
            old_file,
            new_file,
            output: out_path,
            in_place,
            all_new_annotations,
            ignore_trailing_whitespace,
            check,
            format,
            pattern,
        } => {
            let mut config = pattern.load()?;
            if all_new_annotations {
                config.new_annotations = NewAnnotationPolicy::All;
            }
            if ignore_trailing_whitespace {
                config.whitespace = WhitespaceMode::IgnoreTrailing;
            }

            let report = forward::merge_files(&old_file, &new_file, &config)?;
            let target = if in_place { Some(old_file) } else { out_path };

            match target {
                Some(path) => {
                    forward::write_report(&report, &path)?;
                    eprint!(
                        "{}",
                        output::format_summary(&report, &path.display().to_string())
                    );
                }
                None => print!("{}", output::format_report(&report, format.into())?),
            }

            if check && !report.is_clean() {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }

        Commands::Strip {
            input,
            output: out_path,
            pattern,
        } => {
            let marker = pattern.load()?.marker()?;

            match out_path {
                Some(path) => {
                    strip::strip_file(&input, &path, &marker)?;
                }
                None => {
                    for line in strip::strip_lines(textfile::read_lines(&input)?, &marker) {
                        println!("{}", line);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Parse {
            path,
            format,
            pattern,
        } => {
            let marker = pattern.load()?.marker()?;
            let seq = annotation::parse_lines(textfile::read_lines(&path)?, &marker);

            print!("{}", output::format_units(&seq, format.into())?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Tree { command } => {
            let (summary, format) = match command {
                TreeCommands::Forward {
                    clean_dir,
                    annotated_dir,
                    write,
                    format,
                    pattern,
                } => (
                    tree::forward_tree(&clean_dir, &annotated_dir, &pattern.load()?, write)?,
                    format,
                ),
                TreeCommands::Strip {
                    annotated_dir,
                    clean_dir,
                    format,
                    pattern,
                } => (
                    tree::strip_tree(&annotated_dir, &clean_dir, &pattern.load()?)?,
                    format,
                ),
            };

            print!("{}", output::format_tree_summary(&summary, format.into())?);

            if summary.failed() > 0 {
                Ok(ExitCode::from(2))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
