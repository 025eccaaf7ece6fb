use crate::matcher::FallbackColumns;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8070";
const DEFAULT_FETCH_RANGE: &str = "A:J";
const DEFAULT_STATUS_FALLBACK_COLUMN: usize = 10;
const DEFAULT_SPLITTER_NAME_FALLBACK_COLUMN: usize = 8;

/// Worksheet names probed one by one when the spreadsheet metadata endpoint
/// is unavailable (uploaded .xlsx documents). Superset of the known list,
/// including historical rename variants.
const DEFAULT_CANDIDATE_SHEETS: &[&str] = &[
    "Lạc Vân",
    "Quảng Lạc",
    "Phùng Thượng",
    "Thạch Bình 2",
    "Trại Ngọc",
    "Phú Sơn",
    "Văn Phú 1",
    "Đức Long",
    "Xích Thổ",
    "Yên Quang",
    "Rịa",
    "Rịa XGS",
    "Rịa nhu",
    "Rịa XG",
    "Rịa XG S",
    "Ria XGS",
    "Ria XG",
    "Ỷ Na",
    "Nho Quan XGS",
    "Ỷ Na XGS",
    "Nho Quan GX",
    "Nho Quan XG",
    "Quỳnh Sơn",
    "Thanh Lạc",
    "Nho Quan 1",
    "Nho Quan 2",
    "Phú Long",
    "Thôn Ngải",
    "Thạch Bình 1",
    "Cúc Phương",
    "Sơn Lai",
    "Đồng Phong",
    "Trung Đông",
    "Gia Thủy",
    "Kỳ Phú",
    "Văn Phú 2",
    "Quỳnh Lưu",
    "Sheet1",
    "Sheet2",
    "Sheet3",
    "Data",
    "Data1",
    "Data2",
];

/// Last-resort static worksheet list returned when neither the metadata
/// endpoint nor probing yields anything.
const DEFAULT_FALLBACK_SHEETS: &[&str] = &[
    "Lạc Vân",
    "Quảng Lạc",
    "Phùng Thượng",
    "Thạch Bình 2",
    "Trại Ngọc",
    "Phú Sơn",
    "Văn Phú 1",
    "Đức Long",
    "Xích Thổ",
    "Yên Quang",
    "Rịa",
    "Rịa XGS",
    "Rịa nhu",
    "Ỷ Na",
    "Nho Quan XGS",
    "Ỷ Na XGS",
    "Quỳnh Sơn",
    "Thanh Lạc",
    "Nho Quan 1",
    "Phú Long",
    "Nho Quan 2",
    "Thôn Ngải",
    "Thạch Bình 1",
    "Cúc Phương",
    "Sơn Lai",
    "Đồng Phong",
    "Trung Đông",
    "Gia Thủy",
    "Kỳ Phú",
    "Văn Phú 2",
    "Quỳnh Lưu",
];

/// Maps a technical team ("Tổ kỹ thuật") routing key to its spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMapping {
    pub name: String,
    pub spreadsheet_id: String,
}

impl TeamMapping {
    fn parse(spec: &str) -> Result<Self> {
        let (name, spreadsheet_id) = spec.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("invalid team mapping '{spec}' (expected NAME=SPREADSHEET_ID)")
        })?;

        let name = name.trim().to_string();
        let spreadsheet_id = spreadsheet_id.trim().to_string();

        anyhow::ensure!(
            !name.is_empty() && !spreadsheet_id.is_empty(),
            "invalid team mapping '{spec}' (empty name or spreadsheet id)"
        );

        Ok(Self {
            name,
            spreadsheet_id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    /// Ordered team mappings; the first entry is the default team.
    pub teams: Vec<TeamMapping>,
    /// Service-account key JSON, verbatim.
    pub credentials_json: String,
    pub fetch_range: String,
    pub fallback_columns: FallbackColumns,
    pub candidate_sheet_names: Vec<String>,
    pub fallback_sheet_names: Vec<String>,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            team: cli_teams,
            credentials: cli_credentials,
            credentials_file: cli_credentials_file,
            fetch_range: cli_fetch_range,
            status_fallback_column: cli_status_fallback,
            splitter_name_fallback_column: cli_name_fallback,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            http_bind: file_http_bind,
            teams: file_teams,
            credentials: file_credentials,
            credentials_file: file_credentials_file,
            fetch_range: file_fetch_range,
            status_fallback_column: file_status_fallback,
            splitter_name_fallback_column: file_name_fallback,
            candidate_sheet_names: file_candidates,
            fallback_sheet_names: file_fallbacks,
        } = file_config;

        let http_bind_address = cli_http_bind.or(file_http_bind).unwrap_or_else(|| {
            DEFAULT_HTTP_BIND.parse().expect("default bind address valid")
        });

        let team_specs = if cli_teams.is_empty() {
            file_teams.unwrap_or_default()
        } else {
            cli_teams
        };
        let mut teams = Vec::new();
        for spec in team_specs.iter().filter(|s| !s.trim().is_empty()) {
            teams.push(TeamMapping::parse(spec)?);
        }
        anyhow::ensure!(
            !teams.is_empty(),
            "at least one team mapping must be provided (--team 'NAME=SPREADSHEET_ID')"
        );

        let credentials_json = match (
            cli_credentials.or(file_credentials),
            cli_credentials_file.or(file_credentials_file),
        ) {
            (Some(inline), _) if !inline.trim().is_empty() => inline,
            (_, Some(path)) => fs::read_to_string(&path).with_context(|| {
                format!("failed to read credentials file {}", path.display())
            })?,
            _ => anyhow::bail!(
                "service account credentials missing (set GOOGLE_SERVICE_ACCOUNT_KEY or --credentials-file)"
            ),
        };

        let fetch_range = cli_fetch_range
            .or(file_fetch_range)
            .unwrap_or_else(|| DEFAULT_FETCH_RANGE.to_string());

        let fallback_columns = FallbackColumns {
            status: cli_status_fallback
                .or(file_status_fallback)
                .unwrap_or(DEFAULT_STATUS_FALLBACK_COLUMN),
            splitter_name: cli_name_fallback
                .or(file_name_fallback)
                .unwrap_or(DEFAULT_SPLITTER_NAME_FALLBACK_COLUMN),
        };

        let candidate_sheet_names = file_candidates
            .filter(|names| !names.is_empty())
            .unwrap_or_else(|| default_names(DEFAULT_CANDIDATE_SHEETS));
        let fallback_sheet_names = file_fallbacks
            .filter(|names| !names.is_empty())
            .unwrap_or_else(|| default_names(DEFAULT_FALLBACK_SHEETS));

        Ok(Self {
            http_bind_address,
            teams,
            credentials_json,
            fetch_range,
            fallback_columns,
            candidate_sheet_names,
            fallback_sheet_names,
        })
    }

    pub fn default_team(&self) -> Option<&TeamMapping> {
        self.teams.first()
    }

    pub fn spreadsheet_id_for(&self, team: &str) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.name == team.trim())
            .map(|t| t.spreadsheet_id.as_str())
    }

    /// The credential principal named in permission-denied remediation
    /// hints. None when the key JSON does not parse; the caller falls back
    /// to a generic wording.
    pub fn service_account_email(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.credentials_json).ok()?;
        value
            .get("client_email")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

fn default_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    teams: Option<Vec<String>>,
    credentials: Option<String>,
    credentials_file: Option<PathBuf>,
    fetch_range: Option<String>,
    status_fallback_column: Option<usize>,
    splitter_name_fallback_column: Option<usize>,
    candidate_sheet_names: Option<Vec<String>>,
    fallback_sheet_names: Option<Vec<String>>,
}

#[derive(Debug, Parser)]
#[command(
    name = "splitter-lookup",
    version,
    about = "Lookup service for second-stage splitters behind an OLT slot/port"
)]
pub struct CliArgs {
    /// Optional YAML config file; CLI flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub http_bind: Option<SocketAddr>,

    /// Team mapping as NAME=SPREADSHEET_ID; repeat for multiple teams.
    #[arg(long = "team", value_name = "NAME=SPREADSHEET_ID")]
    pub team: Vec<String>,

    /// Service-account key JSON, inline.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_KEY", hide_env_values = true)]
    pub credentials: Option<String>,

    /// Path to a service-account key JSON file.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_KEY_FILE")]
    pub credentials_file: Option<PathBuf>,

    /// A1 range fetched from each worksheet.
    #[arg(long)]
    pub fetch_range: Option<String>,

    /// Zero-based column used for "Trạng thái" when the header lookup fails.
    #[arg(long)]
    pub status_fallback_column: Option<usize>,

    /// Zero-based column used for the splitter name when the header lookup fails.
    #[arg(long)]
    pub splitter_name_fallback_column: Option<usize>,
}
