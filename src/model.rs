use serde::{Deserialize, Serialize};

/// One matching row, projected after merged-cell resolution. Field names
/// follow the wire format the client form expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub olt: String,
    pub slot: String,
    pub port: String,
    pub hop: String,
    pub day_nhay: String,
    pub spliter_cap1: String,
    pub cap: String,
    pub spliter_cap2: String,
    pub spliter_cap2_name: String,
    pub trang_thai: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetEntry {
    pub title: String,
    pub sheet_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub olt: String,
    #[serde(default)]
    pub slot: String,
    #[serde(default)]
    pub port: String,
    /// Technical team routing key; the first configured team when absent.
    #[serde(default)]
    pub to_ky_thuat: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<MatchRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetsQuery {
    #[serde(default)]
    pub to_ky_thuat: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SheetsResponse {
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsPortsRequest {
    #[serde(default)]
    pub olt: String,
    #[serde(default)]
    pub to_ky_thuat: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotsPortsResponse {
    pub slots: Vec<String>,
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
