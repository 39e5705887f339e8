use crate::error::GpaError;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xls, Xlsx};
use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const SHEET_NAME_MAX: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    Xlsx,
    Xls,
}

pub fn sniff_format(bytes: &[u8]) -> Option<WorkbookFormat> {
    if bytes.starts_with(&ZIP_SIGNATURE) {
        Some(WorkbookFormat::Xlsx)
    } else if bytes.starts_with(&OLE_SIGNATURE) {
        Some(WorkbookFormat::Xls)
    } else {
        None
    }
}

/// First worksheet split into its header row and the data rows beneath it.
/// Fully blank rows are dropped.
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone)]
pub struct TableRow {
    /// 1-based row number as shown in a spreadsheet application.
    pub line_no: usize,
    pub cells: Vec<Data>,
}

impl TableRow {
    pub fn cell(&self, col: usize) -> &Data {
        self.cells.get(col).unwrap_or(&Data::Empty)
    }
}

pub fn read_first_sheet(bytes: &[u8]) -> Result<SheetTable, GpaError> {
    let cursor = Cursor::new(bytes);
    let range = match sniff_format(bytes) {
        Some(WorkbookFormat::Xlsx) => {
            let wb = open_workbook_from_rs::<Xlsx<_>, _>(cursor)
                .map_err(|e| GpaError::UnreadableWorkbook(e.to_string()))?;
            first_range::<Cursor<&[u8]>, _>(wb)?
        }
        Some(WorkbookFormat::Xls) => {
            let wb = open_workbook_from_rs::<Xls<_>, _>(cursor)
                .map_err(|e| GpaError::UnreadableWorkbook(e.to_string()))?;
            first_range::<Cursor<&[u8]>, _>(wb)?
        }
        None => {
            return Err(GpaError::UnreadableWorkbook(
                "not an xlsx or xls workbook".to_string(),
            ))
        }
    };
    Ok(table_from_range(&range))
}

fn first_range<RS, R>(mut workbook: R) -> Result<Range<Data>, GpaError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let Some(name) = workbook.sheet_names().first().cloned() else {
        return Ok(Range::empty());
    };
    workbook
        .worksheet_range(&name)
        .map_err(|e| GpaError::UnreadableWorkbook(e.to_string()))
}

fn table_from_range(range: &Range<Data>) -> SheetTable {
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return SheetTable::default();
    };
    let headers = header_row.iter().map(cell_text).collect();
    let rows = rows
        .enumerate()
        .filter(|(_, cells)| !cells.iter().all(cell_is_blank))
        .map(|(idx, cells)| TableRow {
            line_no: first_row + idx + 2,
            cells: cells.to_vec(),
        })
        .collect();
    SheetTable { headers, rows }
}

/// Display text of a cell; whole floats render without a fraction so numeric
/// register numbers survive.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

pub fn cell_is_blank(cell: &Data) -> bool {
    cell_text(cell).trim().is_empty()
}

/// Numeric value of a cell. Blank or non-numeric cells have none.
pub fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Makes `raw` usable as a worksheet name: forbidden characters become `_`,
/// the length is capped, and clashes with names in `used` get a `~n` suffix.
pub fn sheet_name(raw: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let base: String = if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("history") {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(SHEET_NAME_MAX).collect()
    };

    let mut candidate = base.clone();
    let mut n = 1;
    while used.contains(&candidate.to_lowercase()) {
        n += 1;
        let suffix = format!("~{}", n);
        let keep = SHEET_NAME_MAX - suffix.chars().count();
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
    }
    used.insert(candidate.to_lowercase());
    candidate
}
