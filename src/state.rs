use crate::config::ServerConfig;
use crate::errors::LookupError;
use crate::sheets::SheetsApi;
use crate::sheets::google::GoogleSheetsClient;
use std::sync::Arc;

/// Shared handler state. The grid is fetched fresh per request, so the state
/// carries only the configuration (and, for tests, an injected client).
pub struct AppState {
    config: Arc<ServerConfig>,
    injected_client: Option<Arc<dyn SheetsApi>>,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            config,
            injected_client: None,
        }
    }

    /// Route every team to the given client instead of connecting to Google
    /// Sheets. Used by endpoint tests.
    pub fn new_with_client(config: Arc<ServerConfig>, client: Arc<dyn SheetsApi>) -> Self {
        Self {
            config,
            injected_client: Some(client),
        }
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }

    /// Resolve the team routing key to its spreadsheet and build a client
    /// for it. Missing team configuration is fatal to the request.
    pub async fn sheets_client(&self, team: &str) -> Result<Arc<dyn SheetsApi>, LookupError> {
        let spreadsheet_id = self.config.spreadsheet_id_for(team).ok_or_else(|| {
            LookupError::Configuration(format!(
                "Cấu hình Google Sheets cho Tổ KT {team} chưa được thiết lập. \
                 Vui lòng kiểm tra cấu hình team '{team}'"
            ))
        })?;

        if let Some(client) = &self.injected_client {
            return Ok(client.clone());
        }

        let client =
            GoogleSheetsClient::connect(&self.config.credentials_json, spreadsheet_id.to_string())
                .await
                .map_err(|err| {
                    if err.to_string().contains("service account key JSON") {
                        LookupError::CredentialFormat(
                            "Định dạng Google Service Account Key không hợp lệ".to_string(),
                        )
                    } else {
                        LookupError::Upstream(format!("{err:#}"))
                    }
                })?;
        Ok(Arc::new(client))
    }
}
