use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Upstream spreadsheet access failures, classified from the Google API
/// error message so callers can branch on the condition rather than the
/// raw text.
#[derive(Debug, Clone, Error)]
pub enum SheetAccessError {
    #[error("sheet or spreadsheet not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("operation not supported for this document: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Upstream(String),
}

impl SheetAccessError {
    /// Message-substring classification. The Sheets API reports these
    /// conditions only through its error text.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("not supported for this document") {
            Self::Unsupported(message)
        } else if lower.contains("permission_denied") || lower.contains("permission") {
            Self::PermissionDenied(message)
        } else if lower.contains("not_found")
            || lower.contains("requested entity was not found")
            // the API reports a missing worksheet as a range parse failure
            || lower.contains("unable to parse range")
        {
            Self::NotFound(message)
        } else {
            Self::Upstream(message)
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// True when the error also covers "the range itself did not parse",
    /// which the quoted-range read path treats as a cue to retry unquoted.
    pub fn suggests_unquoted_retry(&self) -> bool {
        match self {
            Self::Unsupported(_) => true,
            Self::Upstream(m) | Self::NotFound(m) | Self::PermissionDenied(m) => {
                let lower = m.to_lowercase();
                lower.contains("unable to parse range") || lower.contains("not supported")
            }
        }
    }
}

/// Request-level error taxonomy surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    CredentialFormat(String),
    #[error("{0}")]
    Access(String),
    #[error("{0}")]
    Upstream(String),
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_)
            | Self::CredentialFormat(_)
            | Self::Access(_)
            | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translate an upstream access failure into a user-facing message.
    /// `service_account` names the principal to grant read access to.
    pub fn from_access(err: SheetAccessError, service_account: Option<&str>) -> Self {
        match err {
            SheetAccessError::PermissionDenied(_) => {
                let principal = service_account.unwrap_or("Service Account");
                Self::Access(format!(
                    "Không có quyền truy cập Google Sheet. Vui lòng chia sẻ Sheet với Service Account: {principal}"
                ))
            }
            SheetAccessError::NotFound(_) => Self::Access(
                "Không tìm thấy Google Sheet. Vui lòng kiểm tra Sheet ID.".to_string(),
            ),
            SheetAccessError::Unsupported(_) => Self::Access(
                "File Excel được upload không hỗ trợ đọc qua Google Sheets API. \
                 Vui lòng chuyển đổi file sang Google Sheets format thực sự."
                    .to_string(),
            ),
            SheetAccessError::Upstream(message) => Self::Upstream(message),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
