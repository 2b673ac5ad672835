//! Download of shared CSV files from Google Drive links.

use std::time::Duration;

use thiserror::Error;

use super::loader::{decode_text, parse_csv};
use super::model::RawTable;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("link format not recognised (expected '...?id=<ID>' or '.../d/<ID>/...')")]
    UnrecognizedLink,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}")]
    Status { status: u16 },
    #[error("downloaded content is an HTML page, not a CSV (is the file shared publicly?)")]
    NotCsv,
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("downloaded file is empty")]
    Empty,
}

/// Extract the file id from a Drive share link.
///
/// Accepts `...?id=<ID>&...` and `.../d/<ID>/...` forms.
pub fn extract_file_id(link: &str) -> Result<String, IngestError> {
    let link = link.trim();
    let id = if let Some((_, rest)) = link.split_once("id=") {
        rest.split('&').next()
    } else if let Some((_, rest)) = link.split_once("/d/") {
        rest.split(['/', '?']).next()
    } else {
        None
    };

    match id {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(IngestError::UnrecognizedLink),
    }
}

/// Direct-download URL for a file id.
pub fn download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?id={file_id}&export=download")
}

/// Blocking client that turns share links into raw tables.
pub struct DriveClient {
    client: reqwest::blocking::Client,
}

impl DriveClient {
    pub fn new(timeout: Duration) -> Result<Self, IngestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Download the file behind `link` and parse it as CSV.
    pub fn fetch_table(&self, link: &str) -> Result<RawTable, IngestError> {
        let file_id = extract_file_id(link)?;
        let url = download_url(&file_id);
        log::info!("Downloading file {file_id} from {url}");

        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                status: status.as_u16(),
            });
        }
        let bytes = resp.bytes()?;
        log::debug!("Downloaded {} bytes", bytes.len());

        table_from_bytes(&bytes)
    }
}

/// Decode and parse a downloaded body.
pub fn table_from_bytes(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let text = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }
    if looks_like_html(&text) {
        return Err(IngestError::NotCsv);
    }

    let table = parse_csv(&text)?;
    log::info!(
        "CSV loaded: {} rows, {} columns {:?}",
        table.len(),
        table.columns.len(),
        table.columns
    );
    Ok(table)
}

fn looks_like_html(text: &str) -> bool {
    let head: String = text.trim_start().chars().take(64).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_query_form() {
        let id = extract_file_id(
            "https://drive.google.com/uc?id=1R5JxWJZK_OvFYdGmE2mG3wUhFRb7StdD&export=download",
        )
        .unwrap();
        assert_eq!(id, "1R5JxWJZK_OvFYdGmE2mG3wUhFRb7StdD");
        assert_eq!(extract_file_id("https://drive.google.com/open?id=abc").unwrap(), "abc");
    }

    #[test]
    fn extracts_id_from_path_form() {
        let id = extract_file_id("https://drive.google.com/file/d/XYZ123/view?usp=sharing").unwrap();
        assert_eq!(id, "XYZ123");
        assert_eq!(extract_file_id("https://drive.google.com/file/d/XYZ123").unwrap(), "XYZ123");
    }

    #[test]
    fn rejects_unknown_links() {
        assert!(matches!(
            extract_file_id("https://example.com/data.csv"),
            Err(IngestError::UnrecognizedLink)
        ));
        assert!(matches!(
            extract_file_id("https://drive.google.com/uc?id=&export=download"),
            Err(IngestError::UnrecognizedLink)
        ));
    }

    #[test]
    fn download_url_uses_the_given_id() {
        assert_eq!(
            download_url("my-file"),
            "https://drive.google.com/uc?id=my-file&export=download"
        );
    }

    #[test]
    fn html_bodies_are_not_csv() {
        let body = b"  <!DOCTYPE html><html><body>Virus scan warning</body></html>";
        assert!(matches!(table_from_bytes(body), Err(IngestError::NotCsv)));
        assert!(matches!(table_from_bytes(b"   \n"), Err(IngestError::Empty)));
    }

    #[test]
    fn csv_bodies_parse() {
        let table = table_from_bytes(b"LOCATION\n\"[-75.58, 6.25]\"\n").unwrap();
        assert_eq!(table.columns, vec!["LOCATION"]);
        assert_eq!(table.len(), 1);
    }
}
