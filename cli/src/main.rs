mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use field_usage::ExportError;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "field-usage")]
#[command(about = "Report which model fields Power BI reports use")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Analyse one or more reports and print a usage view")]
    Analyse {
        #[arg(
            required = true,
            help = "Report inputs: .pbix/.pbit files, zipped PBIP packages, PBIP report folders or Layout JSON"
        )]
        paths: Vec<String>,
        #[arg(long, short, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,
        #[arg(long, value_enum, default_value = "summary", help = "Which view to print")]
        view: View,
        #[arg(long, short, value_name = "FILE", help = "Write output to FILE instead of stdout")]
        output: Option<String>,
        #[arg(long, value_name = "FILE", help = "Load analysis settings from a JSON file")]
        config: Option<String>,
        #[arg(long, value_name = "N", help = "Maximum number of reports analysed in parallel")]
        workers: Option<usize>,
        #[arg(long, short, help = "Verbose logging on stderr")]
        verbose: bool,
    },
    #[command(about = "Show information about a report")]
    Info {
        #[arg(help = "Path to the report")]
        path: String,
        #[arg(long, short, help = "Verbose logging on stderr")]
        verbose: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum View {
    Summary,
    Details,
    Usages,
    Raw,
    Aggregate,
    Pivot,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyse {
            paths,
            format,
            view,
            output,
            config,
            workers,
            verbose,
        } => {
            init_logging(verbose);
            commands::analyse::run(&paths, format, view, output, config, workers)
        }
        Commands::Info { path, verbose } => {
            init_logging(verbose);
            commands::info::run(&path)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for_error(&e)
        }
    }
}

fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    if is_internal_error(err) {
        ExitCode::from(3)
    } else {
        ExitCode::from(2)
    }
}

// Input problems (missing files, bad archives, bad config) are the user's to fix;
// failing to serialise or write our own output is not.
fn is_internal_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<ExportError>())
}
