/// Raw content retrieval for source readers.
///
/// A source location is either a filesystem path or an `http(s)://` URL
/// (e.g. a published occurrence download). Readers only ever see the text.

use std::path::Path;
use std::time::Duration;

use crate::model::LoadError;

const HTTP_TIMEOUT_SECS: u64 = 30;

/// Returns true when `location` names a remote resource.
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reads the full text of a source location.
pub fn read_source(location: &str) -> Result<String, LoadError> {
    if location.trim().is_empty() {
        return Err(LoadError::Io {
            location: String::new(),
            message: "no source location configured".to_string(),
        });
    }
    if is_remote(location) {
        fetch_remote(location)
    } else {
        read_local(Path::new(location))
    }
}

fn read_local(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io {
        location: path.display().to_string(),
        message: if e.kind() == std::io::ErrorKind::NotFound {
            "file not found".to_string()
        } else {
            e.to_string()
        },
    })?;
    // Spreadsheet exports often carry a UTF-8 BOM in front of the header.
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn fetch_remote(url: &str) -> Result<String, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| LoadError::Io {
            location: url.to_string(),
            message: format!("Failed to create HTTP client: {}", e),
        })?;

    let response = client.get(url).send().map_err(|e| LoadError::Io {
        location: url.to_string(),
        message: format!("Request failed: {}", e),
    })?;

    if !response.status().is_success() {
        return Err(LoadError::Http(response.status().as_u16()));
    }

    response.text().map_err(|e| LoadError::Io {
        location: url.to_string(),
        message: format!("Failed to read response: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://api.gbif.org/v1/occurrence/download/x.geojson"));
        assert!(is_remote("HTTP://example.org/grid.geojson"));
        assert!(!is_remote("data/dataset_CSsources_mod.csv"));
        assert!(!is_remote("/srv/data/http_mirror/grid.geojson"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_source("/definitely/not/here.csv").unwrap_err();
        match err {
            LoadError::Io { message, .. } => assert_eq!(message, "file not found"),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_location_is_rejected() {
        assert!(matches!(read_source("  "), Err(LoadError::Io { .. })));
    }
}
