//! Plain-text domain lists: one domain per line.

use std::path::Path;

use tracing::debug;

use crate::error::InputError;

/// Split `text` into domains, one per line, with surrounding whitespace removed.
///
/// Lines end at `\n`, `\r\n` or a lone `\r`. Blank lines are kept as empty
/// domains so the result lines up with the file. A trailing line ending does
/// not produce an extra entry.
pub fn parse_domains(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    text.lines().map(|line| line.trim().to_string()).collect()
}

/// Read a whole domain file into memory.
pub fn read_domains(path: &Path) -> Result<Vec<String>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|e| InputError::from_io(path, e))?;
    let domains = parse_domains(&text);
    debug!(path = %path.display(), count = domains.len(), "read domain file");
    Ok(domains)
}
