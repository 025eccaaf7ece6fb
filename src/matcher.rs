//! Row matching over a worksheet grid: locate semantically-named columns,
//! reconstruct values hidden by merged cells, and project rows matching an
//! OLT/slot/port key down to the drawn second-stage splitters.

use crate::grid::Grid;
use crate::model::MatchRecord;

/// Semantic column meanings located by case-insensitive substring match on
/// the header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Olt,
    Slot,
    Port,
    Hop,
    DayNhay,
    SpliterCap1,
    Cap,
    SpliterCap2,
    TrangThai,
}

impl ColumnRole {
    /// Accepted lower-cased header substrings, diacritic-tolerant where the
    /// source data is known to drop them.
    fn accepted_substrings(self) -> &'static [&'static str] {
        match self {
            Self::Olt => &["olt"],
            Self::Slot => &["slot"],
            Self::Port => &["port"],
            Self::Hop => &["hộp"],
            Self::DayNhay => &["dây nhảy", "daynhay", "nhảy"],
            Self::SpliterCap1 => &["spliter cấp 1", "spliter cap 1"],
            Self::Cap => &["cáp", "cap"],
            Self::SpliterCap2 => &["spliter cấp 2", "spliter cap 2"],
            Self::TrangThai => &["trạng thái", "trang thai"],
        }
    }
}

/// Fixed-index fallback tier beneath the name lookup. The source sheets have
/// a stable physical layout; these defaults point at column K (status) and
/// column I (splitter name) but stay configurable because historical sheet
/// revisions disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackColumns {
    pub status: usize,
    pub splitter_name: usize,
}

impl Default for FallbackColumns {
    fn default() -> Self {
        Self {
            status: 10,
            splitter_name: 8,
        }
    }
}

/// Resolved column indices for one grid; `None` means the column is absent
/// and every read from it yields an empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub olt: Option<usize>,
    pub slot: Option<usize>,
    pub port: Option<usize>,
    pub hop: Option<usize>,
    pub day_nhay: Option<usize>,
    pub spliter_cap1: Option<usize>,
    pub cap: Option<usize>,
    pub spliter_cap2: Option<usize>,
    pub spliter_cap2_name: Option<usize>,
    pub trang_thai: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    pub olt: String,
    pub slot: String,
    pub port: String,
}

impl SearchKey {
    pub fn new(olt: impl Into<String>, slot: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            olt: olt.into(),
            slot: slot.into(),
            port: port.into(),
        }
    }
}

fn find_by_name(header: &[String], role: ColumnRole) -> Option<usize> {
    find_from(header, role, 0)
}

fn find_from(header: &[String], role: ColumnRole, start: usize) -> Option<usize> {
    let needles = role.accepted_substrings();
    header.iter().enumerate().skip(start).find_map(|(i, h)| {
        let lower = h.to_lowercase();
        needles.iter().any(|n| lower.contains(n)).then_some(i)
    })
}

/// Two-tier column resolution: by header name first, then by fixed index for
/// the roles that have a fallback. "Spliter cấp 2" legitimately appears as
/// two columns (reference id, then human-readable name); the name column is
/// the second occurrence when one exists.
pub fn resolve_columns(header: &[String], fallbacks: &FallbackColumns) -> ColumnLayout {
    let spliter_cap2 = find_by_name(header, ColumnRole::SpliterCap2);
    let mut spliter_cap2_name = spliter_cap2
        .map(|first| find_from(header, ColumnRole::SpliterCap2, first + 1).unwrap_or(first));
    if spliter_cap2_name.is_none() && header.len() > fallbacks.splitter_name + 1 {
        spliter_cap2_name = Some(fallbacks.splitter_name);
    }

    let mut trang_thai = find_by_name(header, ColumnRole::TrangThai);
    if trang_thai.is_none() && header.len() > fallbacks.status + 1 {
        trang_thai = Some(fallbacks.status);
    }

    ColumnLayout {
        olt: find_by_name(header, ColumnRole::Olt),
        slot: find_by_name(header, ColumnRole::Slot),
        port: find_by_name(header, ColumnRole::Port),
        hop: find_by_name(header, ColumnRole::Hop),
        day_nhay: find_by_name(header, ColumnRole::DayNhay),
        spliter_cap1: find_by_name(header, ColumnRole::SpliterCap1),
        cap: find_by_name(header, ColumnRole::Cap),
        spliter_cap2,
        spliter_cap2_name,
        trang_thai,
    }
}

/// Merged-cell fill-down: a value spanning several rows is stored only at
/// the top of the span, so an empty key cell takes the nearest non-empty
/// value above it (never the header).
fn fill_down<'a>(grid: &'a Grid, row: usize, col: usize) -> &'a str {
    let own = grid.cell(row, col);
    if !own.trim().is_empty() {
        return own;
    }
    for above in (1..row).rev() {
        let value = grid.cell(above, col);
        if !value.trim().is_empty() {
            return value;
        }
    }
    ""
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn status_is_drawn(status: &str) -> bool {
    let lower = status.to_lowercase();
    lower.contains("đã vẽ") || lower.contains("da ve")
}

fn cell_at(grid: &Grid, row: usize, col: Option<usize>) -> String {
    col.map(|c| grid.cell(row, c).to_string()).unwrap_or_default()
}

/// Scan the grid for rows whose filled-down OLT/slot/port equal `key`
/// (trimmed, case-insensitive, exact) and whose status reads "Đã vẽ" with a
/// non-empty splitter name. Missing columns degrade to empty results; the
/// matcher itself never fails.
pub fn match_records(grid: &Grid, key: &SearchKey, fallbacks: &FallbackColumns) -> Vec<MatchRecord> {
    if grid.is_empty() {
        return Vec::new();
    }
    let layout = resolve_columns(grid.header(), fallbacks);
    let (Some(olt_col), Some(slot_col), Some(port_col)) = (layout.olt, layout.slot, layout.port)
    else {
        return Vec::new();
    };

    let want_olt = normalize(&key.olt);
    let want_slot = normalize(&key.slot);
    let want_port = normalize(&key.port);

    let mut results = Vec::new();
    for row in 1..grid.row_count() {
        let olt = fill_down(grid, row, olt_col);
        let slot = fill_down(grid, row, slot_col);
        let port = fill_down(grid, row, port_col);

        if normalize(olt) != want_olt
            || normalize(slot) != want_slot
            || normalize(port) != want_port
        {
            continue;
        }

        let trang_thai = layout
            .trang_thai
            .map(|c| grid.cell(row, c).trim().to_string())
            .unwrap_or_default();

        // First non-empty wins: named column, then the reference column,
        // then the fixed fallback index.
        let spliter_cap2_name = [
            layout.spliter_cap2_name,
            layout.spliter_cap2,
            Some(fallbacks.splitter_name),
        ]
        .into_iter()
        .flatten()
        .map(|c| grid.cell(row, c).trim())
        .find(|v| !v.is_empty())
        .unwrap_or("")
        .to_string();

        if !status_is_drawn(&trang_thai) || spliter_cap2_name.is_empty() {
            continue;
        }

        results.push(MatchRecord {
            olt: olt.to_string(),
            slot: slot.to_string(),
            port: port.to_string(),
            hop: cell_at(grid, row, layout.hop),
            day_nhay: cell_at(grid, row, layout.day_nhay),
            spliter_cap1: cell_at(grid, row, layout.spliter_cap1),
            cap: cell_at(grid, row, layout.cap),
            spliter_cap2: cell_at(grid, row, layout.spliter_cap2),
            spliter_cap2_name,
            trang_thai,
        });
    }
    results
}
