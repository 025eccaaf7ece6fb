use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use splitter_lookup::config::{ServerConfig, TeamMapping};
use splitter_lookup::errors::SheetAccessError;
use splitter_lookup::grid::Grid;
use splitter_lookup::matcher::FallbackColumns;
use splitter_lookup::model::SheetEntry;
use splitter_lookup::server::router;
use splitter_lookup::sheets::{SheetCatalog, SpreadsheetReader};
use splitter_lookup::state::AppState;
use tower::ServiceExt;

#[derive(Default)]
struct MockSheets {
    grids: HashMap<String, Grid>,
    catalog: Option<Result<Vec<SheetEntry>, SheetAccessError>>,
    fail_reads_with: Option<SheetAccessError>,
}

#[async_trait]
impl SpreadsheetReader for MockSheets {
    async fn get_range(&self, sheet: &str, _range: &str) -> Result<Grid, SheetAccessError> {
        if let Some(err) = &self.fail_reads_with {
            return Err(err.clone());
        }
        self.grids.get(sheet.trim()).cloned().ok_or_else(|| {
            SheetAccessError::classify(format!("Unable to parse range: '{sheet}'!A:J"))
        })
    }
}

#[async_trait]
impl SheetCatalog for MockSheets {
    async fn list_sheets(&self) -> Result<Vec<SheetEntry>, SheetAccessError> {
        match &self.catalog {
            Some(result) => result.clone(),
            None => Ok(Vec::new()),
        }
    }
}

fn test_config() -> Arc<ServerConfig> {
    Arc::new(ServerConfig {
        http_bind_address: "127.0.0.1:0".parse().expect("bind addr"),
        teams: vec![TeamMapping {
            name: "Nho Quan".to_string(),
            spreadsheet_id: "sheet-nq".to_string(),
        }],
        credentials_json: r#"{"client_email":"svc@example.iam.gserviceaccount.com"}"#.to_string(),
        fetch_range: "A:J".to_string(),
        fallback_columns: FallbackColumns::default(),
        candidate_sheet_names: vec!["Lạc Vân".to_string(), "Rịa".to_string()],
        fallback_sheet_names: vec!["Known 1".to_string(), "Known 2".to_string()],
    })
}

fn app(mock: MockSheets) -> Router {
    router(Arc::new(AppState::new_with_client(
        test_config(),
        Arc::new(mock),
    )))
}

fn standard_grid() -> Grid {
    let rows: Vec<Vec<&str>> = vec![
        vec![
            "OLT",
            "Slot",
            "Port",
            "Hộp",
            "Dây nhảy",
            "Spliter cấp 1",
            "Cáp",
            "Spliter cấp 2",
            "Spliter cấp 2",
            "Trạng thái",
        ],
        vec![
            "OLT1", "3", "0", "H1", "D1", "S1-A", "C1", "REF1", "S2-NAME-1", "Đã vẽ",
        ],
        vec!["", "", "", "H2", "D2", "S1-B", "C2", "REF2", "S2-NAME-2", "Chưa vẽ"],
    ];
    Grid::new(
        rows.into_iter()
            .map(|r| r.into_iter().map(str::to_string).collect())
            .collect(),
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn search_returns_drawn_splitters_only() {
    let mut mock = MockSheets::default();
    mock.grids.insert("OLT1".to_string(), standard_grid());

    let (status, body) = send(
        app(mock),
        post_json("/api/search", json!({"olt": "OLT1", "slot": "3", "port": "0"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().expect("results array");
    // the second row key-matches via fill-down but its status is not drawn
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["spliterCap2"], "REF1");
    assert_eq!(results[0]["spliterCap2Name"], "S2-NAME-1");
    assert_eq!(results[0]["trangThai"], "Đã vẽ");
    assert_eq!(results[0]["hop"], "H1");
}

#[tokio::test]
async fn search_key_is_case_and_whitespace_insensitive() {
    let mut mock = MockSheets::default();
    mock.grids.insert("OLT1".to_string(), standard_grid());

    let (status, body) = send(
        app(mock),
        post_json(
            "/api/search",
            json!({"olt": " olt1 ", "slot": "3 ", "port": " 0"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().expect("results").len(), 1);
}

#[tokio::test]
async fn search_rejects_missing_fields() {
    let (status, body) = send(
        app(MockSheets::default()),
        post_json("/api/search", json!({"olt": "OLT1", "slot": " "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("OLT"));
}

#[tokio::test]
async fn search_on_missing_worksheet_yields_empty_results() {
    let (status, body) = send(
        app(MockSheets::default()),
        post_json(
            "/api/search",
            json!({"olt": "NoSuchOlt", "slot": "1", "port": "1"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().expect("results").len(), 0);
}

#[tokio::test]
async fn search_with_unknown_team_is_a_configuration_error() {
    let (status, body) = send(
        app(MockSheets::default()),
        post_json(
            "/api/search",
            json!({"olt": "OLT1", "slot": "3", "port": "0", "toKyThuat": "Gia Viễn"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().expect("error").contains("Gia Viễn"));
}

#[tokio::test]
async fn search_surfaces_permission_denied_with_principal() {
    let mock = MockSheets {
        fail_reads_with: Some(SheetAccessError::classify("PERMISSION_DENIED: no access")),
        ..MockSheets::default()
    };

    let (status, body) = send(
        app(mock),
        post_json("/api/search", json!({"olt": "OLT1", "slot": "3", "port": "0"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .expect("error")
        .contains("svc@example.iam.gserviceaccount.com"));
}

#[tokio::test]
async fn slots_ports_enumerates_distinct_values() {
    let rows: Vec<Vec<&str>> = vec![
        vec!["OLT", "Slot", "Port"],
        vec!["OLT1", "10", "4"],
        vec!["", "", ""],
        vec!["", "2", "4"],
        vec!["", "_", "12"],
        vec!["", "2", ""],
    ];
    let grid = Grid::new(
        rows.into_iter()
            .map(|r| r.into_iter().map(str::to_string).collect())
            .collect(),
    );
    let mut mock = MockSheets::default();
    mock.grids.insert("OLT1".to_string(), grid);

    let (status, body) = send(
        app(mock),
        post_json(
            "/api/slots-ports",
            json!({"olt": "OLT1", "toKyThuat": "Nho Quan"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"], json!(["2", "10"]));
    assert_eq!(body["ports"], json!(["4", "12"]));
    assert!(body.get("warning").is_none());
}

#[tokio::test]
async fn slots_ports_requires_team() {
    let (status, body) = send(
        app(MockSheets::default()),
        post_json("/api/slots-ports", json!({"olt": "OLT1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("Tổ kỹ thuật"));
}

#[tokio::test]
async fn slots_ports_degrades_on_unsupported_document() {
    let mock = MockSheets {
        fail_reads_with: Some(SheetAccessError::classify(
            "This operation is not supported for this document",
        )),
        ..MockSheets::default()
    };

    let (status, body) = send(
        app(mock),
        post_json(
            "/api/slots-ports",
            json!({"olt": "OLT1", "toKyThuat": "Nho Quan"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"], json!([]));
    assert_eq!(body["ports"], json!([]));
    assert!(body["warning"].as_str().expect("warning").contains("Excel"));
}

#[tokio::test]
async fn sheets_come_from_catalog_when_available() {
    let mock = MockSheets {
        catalog: Some(Ok(vec![
            SheetEntry {
                title: "Lạc Vân".to_string(),
                sheet_id: 7,
            },
            SheetEntry {
                title: "  ".to_string(),
                sheet_id: 8,
            },
        ])),
        ..MockSheets::default()
    };

    let (status, body) = send(app(mock), get("/api/sheets?toKyThuat=Nho%20Quan")).await;

    assert_eq!(status, StatusCode::OK);
    // blank titles are dropped
    assert_eq!(body["sheets"], json!([{"title": "Lạc Vân", "sheetId": 7}]));
}

#[tokio::test]
async fn sheets_fall_back_to_probing_when_metadata_unsupported() {
    let mut mock = MockSheets {
        catalog: Some(Err(SheetAccessError::classify(
            "This operation is not supported for this document",
        ))),
        ..MockSheets::default()
    };
    // only "Rịa" exists out of the candidate list ["Lạc Vân", "Rịa"]
    mock.grids.insert("Rịa".to_string(), standard_grid());

    let (status, body) = send(app(mock), get("/api/sheets?toKyThuat=Nho%20Quan")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sheets"], json!([{"title": "Rịa", "sheetId": 1}]));
}

#[tokio::test]
async fn sheets_fall_back_to_static_list_when_probing_finds_nothing() {
    let mock = MockSheets {
        catalog: Some(Err(SheetAccessError::classify(
            "This operation is not supported for this document",
        ))),
        ..MockSheets::default()
    };

    let (status, body) = send(app(mock), get("/api/sheets?toKyThuat=Nho%20Quan")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["sheets"],
        json!([
            {"title": "Known 1", "sheetId": 0},
            {"title": "Known 2", "sheetId": 1},
        ])
    );
}

#[tokio::test]
async fn sheets_require_team_parameter() {
    let (status, body) = send(app(MockSheets::default()), get("/api/sheets")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("Tổ kỹ thuật"));
}

#[tokio::test]
async fn sheets_response_disables_caching() {
    let mock = MockSheets {
        catalog: Some(Ok(vec![SheetEntry {
            title: "Lạc Vân".to_string(),
            sheet_id: 0,
        }])),
        ..MockSheets::default()
    };

    let response = app(mock)
        .oneshot(get("/api/sheets?toKyThuat=Nho%20Quan"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .expect("cache-control")
        .to_str()
        .expect("ascii");
    assert!(cache_control.contains("no-store"));
}
