use crate::document::CorpusEntry;
use crate::error::{Result, SearchError};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Load corpus records from a file.
///
/// Accepts a plain JSON array or the site's `var store = [...]` script, optionally gzip-compressed
/// (`.gz`).
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusEntry>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SearchError::Corpus(format!("{}: {}", path.display(), e)))?;

    let mut text = String::new();
    if path.extension().is_some_and(|ext| ext == "gz") {
        GzDecoder::new(file).read_to_string(&mut text)?;
    } else {
        BufReader::new(file).read_to_string(&mut text)?;
    }

    let records = parse_corpus(&text)?;
    tracing::debug!(path = %path.display(), records = records.len(), "Loaded corpus");
    Ok(records)
}

/// Parse corpus text. Anything before the first `[` (such as `var store =`) and a trailing `;`
/// are ignored.
///
/// Only the array itself has to be valid JSON. Elements that are not records come back as
/// [`CorpusEntry::Unreadable`] and are rejected at build time.
pub fn parse_corpus(text: &str) -> Result<Vec<CorpusEntry>> {
    let start = text
        .find('[')
        .ok_or_else(|| SearchError::Corpus("no record array found".to_string()))?;
    let body = text[start..].trim_end().trim_end_matches(';');
    Ok(serde_json::from_str(body)?)
}
