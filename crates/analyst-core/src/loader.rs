use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// Read a plain-text document from disk.
///
/// Only `.txt`, `.md` and `.text` files are accepted. Bytes that are not valid
/// UTF-8 are decoded as Latin-1.
pub fn load_document(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::NotFound(format!("Document not found: {}", path.display())));
    }
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ext == "pdf" {
        return Err(Error::UnsupportedFormat(format!("PDF documents are not supported yet: {}", path.display())));
    }
    if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::UnsupportedFormat(format!("Unsupported document extension '.{ext}': {}", path.display())));
    }

    let bytes = fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), "document is not valid UTF-8, decoding as Latin-1");
            decode_latin1(e.as_bytes())
        }
    };
    debug!(path = %path.display(), chars = text.chars().count(), "loaded document");
    Ok(text)
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_maps_bytes_to_code_points() {
        assert_eq!(decode_latin1(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }
}
