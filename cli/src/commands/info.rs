use anyhow::{Context, Result};
use field_usage::{
    extract_report, load_report_path, normalise_extraction, report_name_from_path,
    summarize_usages, AnalysisConfig, FieldKind,
};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

pub fn run(path: &str) -> Result<ExitCode> {
    let path = Path::new(path);
    let source = load_report_path(path, &AnalysisConfig::default())
        .with_context(|| format!("Failed to load report: {}", path.display()))?;

    let name = report_name_from_path(path);
    let extraction = extract_report(&source, &name);
    let usages = normalise_extraction(&extraction, &name);
    let fields = summarize_usages(&usages);

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    writeln!(handle, "Report: {}", name)?;
    writeln!(handle, "Schema: {}", source.schema().as_str())?;

    let pages = extraction.context.pages_in_order();
    writeln!(handle, "Pages: {}", pages.len())?;
    for (page, index) in &pages {
        let count = usages.iter().filter(|u| u.page == *page).count();
        writeln!(handle, "  {}. \"{}\" ({} usages)", index + 1, page, count)?;
    }

    let hidden = usages.iter().filter(|u| u.is_hidden()).count();
    writeln!(handle, "Usages: {} ({} hidden)", usages.len(), hidden)?;

    let mut by_kind: BTreeMap<FieldKind, usize> = BTreeMap::new();
    for row in &fields {
        *by_kind.entry(row.field_kind).or_insert(0) += 1;
    }
    let kinds = by_kind
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind))
        .collect::<Vec<_>>()
        .join(", ");
    if kinds.is_empty() {
        writeln!(handle, "Distinct fields: 0")?;
    } else {
        writeln!(handle, "Distinct fields: {} ({})", fields.len(), kinds)?;
    }

    Ok(ExitCode::from(0))
}
