//! End-to-end orchestration: source → extraction → normalisation.

use std::path::Path;

use log::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::container::LoadError;
use crate::extract::{DirectoryExtractor, LegacyLayoutExtractor, ReportExtractor};
use crate::normalize::normalise_extraction;
use crate::source::{ReportSource, SchemaKind};
use crate::types::{AnalysisResult, ExtractionResult, NormalisedFieldUsage, RawFieldReference};

/// Runs the extractor matching the source schema.
pub fn extract_report(source: &ReportSource, report_name: &str) -> ExtractionResult {
    match source {
        ReportSource::Legacy(layout) => LegacyLayoutExtractor.extract(layout, report_name),
        ReportSource::Directory(docs) => DirectoryExtractor.extract(docs, report_name),
    }
}

/// Extracts, then normalises every reference.
pub fn analyse_report(source: &ReportSource, report_name: &str) -> AnalysisResult {
    let extraction = extract_report(source, report_name);
    let normalised = normalise_extraction(&extraction, report_name);
    debug!(
        "analysed '{report_name}' ({}): {} references",
        source.schema().as_str(),
        normalised.len()
    );
    AnalysisResult {
        raw: extraction.references,
        normalised,
    }
}

/// Display name for a report file or folder.
///
/// `Sales.pbix` → `Sales`, `Sales.Report/` → `Sales`, `Sales.Report/definition` → `Sales`.
pub fn report_name_from_path(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.eq_ignore_ascii_case("definition") {
        if let Some(parent) = path.parent().and_then(|p| p.file_name()) {
            name = parent.to_string_lossy().into_owned();
        }
    }

    for suffix in [".pbix", ".pbit", ".zip", ".json", ".report"] {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(suffix) && lower.len() > suffix.len() {
            name.truncate(name.len() - suffix.len());
        }
    }

    if name.is_empty() {
        path.to_string_lossy().into_owned()
    } else {
        name
    }
}

/// One unit of work for [`analyse_batch`].
#[derive(Debug)]
pub enum BatchInput {
    /// An already decoded source.
    Source { name: String, source: ReportSource },
    /// A file or folder, loaded inside the worker.
    #[cfg(feature = "std-fs")]
    Path(std::path::PathBuf),
}

impl BatchInput {
    pub fn name(&self) -> String {
        match self {
            BatchInput::Source { name, .. } => name.clone(),
            #[cfg(feature = "std-fs")]
            BatchInput::Path(path) => report_name_from_path(path),
        }
    }

    #[cfg_attr(not(feature = "std-fs"), allow(unused_variables))]
    fn run(&self, config: &AnalysisConfig) -> Result<ReportAnalysis, LoadError> {
        let name = self.name();
        match self {
            BatchInput::Source { source, .. } => Ok(ReportAnalysis::new(name, source)),
            #[cfg(feature = "std-fs")]
            BatchInput::Path(path) => {
                let source = crate::loader::load_report_path(path, config)?;
                Ok(ReportAnalysis::new(name, &source))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportAnalysis {
    pub name: String,
    pub schema: SchemaKind,
    pub result: AnalysisResult,
}

impl ReportAnalysis {
    fn new(name: String, source: &ReportSource) -> Self {
        let result = analyse_report(source, &name);
        Self {
            name,
            schema: source.schema(),
            result,
        }
    }
}

#[derive(Debug)]
pub struct BatchFailure {
    pub name: String,
    pub error: LoadError,
}

/// Per-report results in input order, plus the inputs that failed to load.
#[derive(Debug, Default)]
pub struct BatchAnalysis {
    pub reports: Vec<ReportAnalysis>,
    pub failures: Vec<BatchFailure>,
}

impl BatchAnalysis {
    /// Normalised usages of every report, concatenated in input order.
    pub fn normalised(&self) -> Vec<NormalisedFieldUsage> {
        self.reports
            .iter()
            .flat_map(|report| report.result.normalised.iter().cloned())
            .collect()
    }

    pub fn raw(&self) -> Vec<RawFieldReference> {
        self.reports
            .iter()
            .flat_map(|report| report.result.raw.iter().cloned())
            .collect()
    }

    /// Both lists merged into one result.
    pub fn merged(&self) -> AnalysisResult {
        AnalysisResult {
            raw: self.raw(),
            normalised: self.normalised(),
        }
    }
}

/// Analyses independent reports on a worker pool bounded by `config.max_workers`.
///
/// Output order follows input order regardless of scheduling.
pub fn analyse_batch(inputs: &[BatchInput], config: &AnalysisConfig) -> BatchAnalysis {
    let outcomes = run_all(inputs, config);

    let mut batch = BatchAnalysis::default();
    for (input, outcome) in inputs.iter().zip(outcomes) {
        match outcome {
            Ok(report) => batch.reports.push(report),
            Err(error) => {
                let name = input.name();
                warn!("failed to load '{name}': {error}");
                batch.failures.push(BatchFailure { name, error });
            }
        }
    }
    info!(
        "analysed {} report(s), {} failure(s)",
        batch.reports.len(),
        batch.failures.len()
    );
    batch
}

#[cfg(feature = "parallel")]
fn run_all(
    inputs: &[BatchInput],
    config: &AnalysisConfig,
) -> Vec<Result<ReportAnalysis, LoadError>> {
    use rayon::prelude::*;

    let workers = config.max_workers.max(1).min(inputs.len().max(1));
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| inputs.par_iter().map(|input| input.run(config)).collect()),
        Err(err) => {
            warn!("could not start worker pool ({err}); analysing sequentially");
            inputs.iter().map(|input| input.run(config)).collect()
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn run_all(
    inputs: &[BatchInput],
    config: &AnalysisConfig,
) -> Vec<Result<ReportAnalysis, LoadError>> {
    inputs.iter().map(|input| input.run(config)).collect()
}
