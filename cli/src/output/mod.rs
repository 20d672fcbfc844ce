use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Output target: the named file, or stdout.
pub fn open_sink(path: Option<&str>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
