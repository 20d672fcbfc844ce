use std::io::Write;

use serde::Serialize;

use super::ExportError;

/// Pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut w: W, value: &T) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut w, value)?;
    writeln!(w)?;
    Ok(())
}

pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, ExportError> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}
