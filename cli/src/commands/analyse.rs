use anyhow::{bail, Context, Result};
use field_usage::output::{write_details_csv, write_json, write_summary_csv, write_usages_csv};
use field_usage::{
    aggregate_usages, analyse_batch, canonical_rows, detail_usages, pivot_from_usages,
    summarize_usages, AnalysisConfig, BatchAnalysis, BatchInput, ExportError,
};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::output::open_sink;
use crate::{OutputFormat, View};

pub fn run(
    paths: &[String],
    format: OutputFormat,
    view: View,
    output: Option<String>,
    config_path: Option<String>,
    workers: Option<usize>,
) -> Result<ExitCode> {
    if format == OutputFormat::Csv && matches!(view, View::Raw | View::Aggregate | View::Pivot) {
        bail!("The {:?} view is only available as JSON", view);
    }

    let config = load_config(config_path.as_deref(), workers)?;

    let inputs: Vec<BatchInput> = paths
        .iter()
        .map(|path| {
            let path = PathBuf::from(path);
            if path.exists() {
                Ok(BatchInput::Path(path))
            } else {
                bail!("Input not found: {}", path.display())
            }
        })
        .collect::<Result<_>>()?;

    let batch = analyse_batch(&inputs, &config);
    for failure in &batch.failures {
        eprintln!(
            "Error: {}: {} [{}]",
            failure.name,
            failure.error,
            failure.error.code()
        );
    }
    if batch.reports.is_empty() {
        bail!("No report could be analysed");
    }
    info!(
        "writing {:?} view as {:?} for {} report(s)",
        view,
        format,
        batch.reports.len()
    );

    let mut sink = open_sink(output.as_deref())?;
    write_view(&mut sink, &batch, format, view)?;
    sink.flush().map_err(ExportError::from)?;

    if batch.failures.is_empty() {
        Ok(ExitCode::from(0))
    } else {
        Ok(ExitCode::from(2))
    }
}

fn load_config(path: Option<&str>, workers: Option<usize>) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(Path::new(path))
                .with_context(|| format!("Failed to read config file: {}", path))?;
            serde_json::from_str::<AnalysisConfig>(&text)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(workers) = workers {
        config.max_workers = workers;
    }
    config.validate().context("Invalid analysis settings")?;
    Ok(config)
}

fn write_view<W: Write>(
    w: &mut W,
    batch: &BatchAnalysis,
    format: OutputFormat,
    view: View,
) -> Result<(), ExportError> {
    let usages = batch.normalised();
    match (view, format) {
        (View::Summary, OutputFormat::Json) => write_json(w, &summarize_usages(&usages)),
        (View::Summary, OutputFormat::Csv) => write_summary_csv(w, &summarize_usages(&usages)),
        (View::Details, OutputFormat::Json) => write_json(w, &detail_usages(&usages)),
        (View::Details, OutputFormat::Csv) => write_details_csv(w, &detail_usages(&usages)),
        (View::Usages, OutputFormat::Json) => write_json(w, &canonical_rows(&usages)),
        (View::Usages, OutputFormat::Csv) => write_usages_csv(w, &canonical_rows(&usages)),
        (View::Raw, _) => write_json(w, &batch.merged()),
        (View::Aggregate, _) => write_json(w, &aggregate_usages(&usages)),
        (View::Pivot, _) => write_json(w, &pivot_from_usages(&usages)),
    }
}
