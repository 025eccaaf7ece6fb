use super::{SheetCatalog, SpreadsheetReader};
use crate::errors::SheetAccessError;
use crate::grid::Grid;
use crate::model::SheetEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use google_sheets4::{Sheets, hyper_rustls, yup_oauth2};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Read-only Google Sheets v4 client bound to one spreadsheet, authenticated
/// with a service-account key.
pub struct GoogleSheetsClient {
    hub: Sheets<hyper_rustls::HttpsConnector<HttpConnector>>,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    pub async fn connect(credentials_json: &str, spreadsheet_id: String) -> Result<Self> {
        let mut key: yup_oauth2::ServiceAccountKey =
            serde_json::from_str(credentials_json).context("invalid service account key JSON")?;
        // Keys pasted through environment variables often arrive with the
        // private-key newlines escaped a second time.
        key.private_key = key.private_key.replace("\\n", "\n");

        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("failed to build service account authenticator")?;

        let client = hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .context("failed to load native TLS roots")?
                .https_or_http()
                .enable_http1()
                .build(),
        );

        Ok(Self {
            hub: Sheets::new(client, auth),
            spreadsheet_id,
        })
    }

    async fn read_range(&self, range: &str) -> Result<Grid, SheetAccessError> {
        let result = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, range)
            .add_scope(READONLY_SCOPE)
            .doit()
            .await;
        match result {
            Ok((_, value_range)) => Ok(Grid::from_values(value_range.values.unwrap_or_default())),
            Err(err) => Err(SheetAccessError::classify(err.to_string())),
        }
    }
}

#[async_trait]
impl SpreadsheetReader for GoogleSheetsClient {
    /// Worksheet names with spaces need single quotes in A1 notation, but
    /// some uploaded documents only accept the unquoted form, so a failed
    /// quoted read retries unquoted before giving up.
    async fn get_range(&self, sheet: &str, range: &str) -> Result<Grid, SheetAccessError> {
        let sheet = sheet.trim();
        match self.read_range(&format!("'{sheet}'!{range}")).await {
            Ok(grid) => Ok(grid),
            Err(err) if err.suggests_unquoted_retry() => {
                tracing::debug!(sheet, error = %err, "quoted range read failed, retrying unquoted");
                self.read_range(&format!("{sheet}!{range}")).await
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl SheetCatalog for GoogleSheetsClient {
    async fn list_sheets(&self) -> Result<Vec<SheetEntry>, SheetAccessError> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .add_scope(READONLY_SCOPE)
            .doit()
            .await
            .map_err(|err| SheetAccessError::classify(err.to_string()))?;

        Ok(spreadsheet
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sheet| {
                let properties = sheet.properties?;
                let title = properties.title.unwrap_or_default();
                if title.trim().is_empty() {
                    return None;
                }
                Some(SheetEntry {
                    title,
                    sheet_id: properties.sheet_id.unwrap_or(0),
                })
            })
            .collect())
    }
}
