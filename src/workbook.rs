//! Spreadsheet loading.
//!
//! [`read_workbook`] turns an xlsx/xls/ods/csv file into a [`Workbook`]: an
//! ordered list of [`Sheet`]s, each holding the raw cell matrix (blank cells
//! kept, so row indices match the sheet as the operator sees it), a
//! header-keyed view of the rows, and some cheap statistics.

use std::collections::BTreeMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{BursarError, Result};

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetStatistics {
    pub total_rows: usize,
    pub used_rows: usize,
    pub column_count: usize,
    pub has_header: bool,
    pub header_row: Option<usize>,
    pub header_values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(skip)]
    pub name: String,
    pub statistics: SheetStatistics,
    pub raw_data: Vec<Vec<String>>,
    pub formatted_data: Vec<BTreeMap<String, String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, raw_data: Vec<Vec<String>>) -> Self {
        let header_row = raw_data.iter().position(|r| !is_blank_row(r));
        let header_values: Vec<String> = header_row
            .map(|i| {
                raw_data[i]
                    .iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let formatted_data = match header_row {
            Some(h) => {
                let headers: Vec<String> = raw_data[h]
                    .iter()
                    .enumerate()
                    .map(|(i, c)| {
                        let c = c.trim();
                        if c.is_empty() {
                            format!("COLUMN_{}", i + 1)
                        } else {
                            c.to_string()
                        }
                    })
                    .collect();
                raw_data[h + 1..]
                    .iter()
                    .filter(|r| !is_blank_row(r))
                    .map(|r| {
                        let mut record = BTreeMap::new();
                        for (i, cell) in r.iter().enumerate() {
                            let cell = cell.trim();
                            if cell.is_empty() {
                                continue;
                            }
                            let key = headers
                                .get(i)
                                .cloned()
                                .unwrap_or_else(|| format!("COLUMN_{}", i + 1));
                            record.entry(key).or_insert_with(|| cell.to_string());
                        }
                        record
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        let statistics = SheetStatistics {
            total_rows: raw_data.len(),
            used_rows: raw_data.iter().filter(|r| !is_blank_row(r)).count(),
            column_count: raw_data.iter().map(Vec::len).max().unwrap_or(0),
            has_header: header_row.is_some(),
            header_row,
            header_values,
        };

        Self {
            name: name.into(),
            statistics,
            raw_data,
            formatted_data,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Serializes as `{ "<sheet>": { statistics, rawData, formattedData }, ... }`
/// in workbook order.
impl Serialize for Workbook {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for sheet in &self.sheets {
            map.serialize_entry(&sheet.name, sheet)?;
        }
        map.end()
    }
}

pub fn read_workbook(path: &Path) -> Result<Workbook> {
    if !path.is_file() {
        return Err(BursarError::FileNotFound(path.to_path_buf()));
    }
    let is_csv = path
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        read_csv(path)
    } else {
        read_spreadsheet(path)
    }
}

fn read_csv(path: &Path) -> Result<Workbook> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut raw = Vec::new();
    for result in rdr.records() {
        let record = result?;
        raw.push(record.iter().map(|f| f.to_string()).collect());
    }
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Sheet1".to_string());
    Ok(Workbook::from_sheets(vec![Sheet::new(name, raw)]))
}

fn read_spreadsheet(path: &Path) -> Result<Workbook> {
    let mut workbook = open_workbook_auto(path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!("skipping unreadable sheet {name}: {e}");
                continue;
            }
        };
        // calamine trims leading empty rows/columns; put them back so row
        // indices line up with the sheet.
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let mut raw: Vec<Vec<String>> = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![String::new(); col_offset];
            cells.extend(row.iter().map(cell_to_string));
            raw.push(cells);
        }
        sheets.push(Sheet::new(name, raw));
    }
    Ok(Workbook::from_sheets(sheets))
}
