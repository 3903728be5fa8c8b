use crate::domain::ports::BankSource;
use crate::utils::error::{BankError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

const GOOGLE_SHEETS_EXPORT: &str = "https://docs.google.com/spreadsheets/d";

/// Downloads the CSV export of a spreadsheet over HTTP.
pub struct SpreadsheetSource {
    url: String,
    client: Client,
}

impl SpreadsheetSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Source for a Google Sheets document, exported as CSV.
    pub fn google_sheet(spreadsheet_id: &str, timeout: Duration) -> Result<Self> {
        Self::new(export_url(spreadsheet_id), timeout)
    }
}

pub fn export_url(spreadsheet_id: &str) -> String {
    format!("{}/{}/export?format=csv", GOOGLE_SHEETS_EXPORT, spreadsheet_id)
}

#[async_trait]
impl BankSource for SpreadsheetSource {
    fn describe(&self) -> String {
        format!("spreadsheet {}", self.url)
    }

    async fn fetch_csv(&self) -> Result<String> {
        tracing::debug!("Making spreadsheet request to: {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        tracing::debug!("Spreadsheet response status: {}", response.status());
        let response = response.error_for_status()?;
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Err(BankError::ImportError {
                message: format!("spreadsheet {} returned an empty body", self.url),
            });
        }
        Ok(body)
    }
}

/// Reads a CSV export from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BankSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch_csv(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_export_url() {
        assert_eq!(
            export_url("abc123"),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
    }

    #[tokio::test]
    async fn test_fetch_csv() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/export");
                then.status(200)
                    .header("Content-Type", "text/csv")
                    .body("h\nrow\n");
            })
            .await;

        let source = SpreadsheetSource::new(server.url("/export"), Duration::from_secs(5)).unwrap();
        let body = source.fetch_csv().await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, "h\nrow\n");
    }

    #[tokio::test]
    async fn test_fetch_csv_http_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;

        let source = SpreadsheetSource::new(server.url("/missing"), Duration::from_secs(5)).unwrap();
        let result = source.fetch_csv().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(BankError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_file_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("banks.csv");
        tokio::fs::write(&path, "h\nrow\n").await.unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.fetch_csv().await.unwrap(), "h\nrow\n");
        assert!(source.describe().contains("banks.csv"));
    }
}
