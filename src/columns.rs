//! Column mapping for fee spreadsheets.
//!
//! Spreadsheets arrive with no fixed layout: the header row may sit a few
//! rows down and the same logical column goes by several names. Everything
//! the parser needs to know about that lives in [`ColumnMapping`], which is
//! plain data and can be overridden from `settings.json`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One data row keyed by upper-cased header text.
pub type RowFields = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Sequence,
    Name,
    Status,
    TotalExpected,
    TotalPaid,
    Debt,
    ParentContact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// How many leading rows are searched for the header row.
    pub header_scan_rows: usize,
    /// A row is a header if any cell equals one of these...
    pub header_exact: Vec<String>,
    /// ...or contains one of these.
    pub header_contains: Vec<String>,
    pub sequence: Vec<String>,
    pub name: Vec<String>,
    pub status: Vec<String>,
    pub total_expected: Vec<String>,
    pub total_paid: Vec<String>,
    pub debt: Vec<String>,
    pub parent_contact: Vec<String>,
}

fn owned(aliases: &[&str]) -> Vec<String> {
    aliases.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            header_scan_rows: 5,
            header_exact: owned(&["SN"]),
            header_contains: owned(&["NAME"]),
            sequence: owned(&["SN", "S/N", "NO"]),
            name: owned(&["NAME", "STUDENT NAME"]),
            status: owned(&["STATUS"]),
            total_expected: owned(&["TOTAL EXPECTED"]),
            total_paid: owned(&["TOTAL PAID"]),
            debt: owned(&["DEBTH 1ST INST", "DEBT"]),
            parent_contact: owned(&["PARENT CONTACT", "STATUS"]),
        }
    }
}

impl ColumnMapping {
    /// Candidate header names for `field`, in priority order.
    pub fn aliases(&self, field: Field) -> &[String] {
        match field {
            Field::Sequence => &self.sequence,
            Field::Name => &self.name,
            Field::Status => &self.status,
            Field::TotalExpected => &self.total_expected,
            Field::TotalPaid => &self.total_paid,
            Field::Debt => &self.debt,
            Field::ParentContact => &self.parent_contact,
        }
    }

    pub fn is_header_row(&self, row: &[String]) -> bool {
        row.iter().any(|cell| {
            let cell = cell.trim().to_uppercase();
            if cell.is_empty() {
                return false;
            }
            self.header_exact.iter().any(|h| cell == h.to_uppercase())
                || self.header_contains.iter().any(|h| cell.contains(&h.to_uppercase()))
        })
    }

    /// Index of the first header row within the scan window.
    pub fn find_header_row(&self, rows: &[Vec<String>]) -> Option<usize> {
        rows.iter()
            .take(self.header_scan_rows)
            .position(|row| self.is_header_row(row))
    }

    /// First non-blank value among `field`'s aliases.
    pub fn first_non_empty<'a>(&self, fields: &'a RowFields, field: Field) -> Option<&'a str> {
        self.aliases(field).iter().find_map(|alias| {
            fields
                .get(&alias.to_uppercase())
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        })
    }
}

/// Builds a field map from a header row and a data row. Blank header cells
/// are dropped; later duplicates of a header do not overwrite earlier ones.
pub fn row_fields(header: &[String], row: &[String]) -> RowFields {
    let mut fields = RowFields::new();
    for (i, key) in header.iter().enumerate() {
        let key = key.trim().to_uppercase();
        if key.is_empty() {
            continue;
        }
        let value = row.get(i).map(|v| v.trim().to_string()).unwrap_or_default();
        fields.entry(key).or_insert(value);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_header_detected_by_exact_sn() {
        let m = ColumnMapping::default();
        assert!(m.is_header_row(&row(&["sn", "Pupil", "Fees"])));
        assert!(!m.is_header_row(&row(&["SNACKS", "Fees"])));
    }

    #[test]
    fn test_header_detected_by_name_substring() {
        let m = ColumnMapping::default();
        assert!(m.is_header_row(&row(&["", "Student Name", "Total Paid"])));
        assert!(!m.is_header_row(&row(&["", "", ""])));
    }

    #[test]
    fn test_find_header_row_respects_scan_limit() {
        let m = ColumnMapping::default();
        let mut rows: Vec<Vec<String>> = (0..5).map(|_| row(&["GBHS", "2025"])).collect();
        rows.push(row(&["SN", "NAME"]));
        assert_eq!(m.find_header_row(&rows), None);

        rows.remove(0);
        assert_eq!(m.find_header_row(&rows), Some(4));
    }

    #[test]
    fn test_find_header_row_index_two() {
        let m = ColumnMapping::default();
        let rows = vec![
            row(&["GOVERNMENT BILINGUAL HIGH SCHOOL"]),
            row(&[""]),
            row(&["SN", "NAME", "TOTAL PAID"]),
            row(&["1", "Ann", "0"]),
        ];
        assert_eq!(m.find_header_row(&rows), Some(2));
    }

    #[test]
    fn test_first_non_empty_follows_alias_order() {
        let m = ColumnMapping::default();
        let fields = row_fields(
            &row(&["Name", "Student Name", "Debt", "Debth 1st Inst"]),
            &row(&["  ", "Paul", "5000", ""]),
        );
        assert_eq!(m.first_non_empty(&fields, Field::Name), Some("Paul"));
        assert_eq!(m.first_non_empty(&fields, Field::Debt), Some("5000"));
        assert_eq!(m.first_non_empty(&fields, Field::TotalPaid), None);
    }

    #[test]
    fn test_row_fields_pads_short_rows() {
        let fields = row_fields(&row(&["SN", "NAME", "STATUS"]), &row(&["1", "Ann"]));
        assert_eq!(fields.get("STATUS").map(String::as_str), Some(""));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_mapping_deserializes_partial_override() {
        let json = r#"{"name": ["PUPIL"], "header_scan_rows": 8}"#;
        let m: ColumnMapping = serde_json::from_str(json).unwrap();
        assert_eq!(m.name, vec!["PUPIL".to_string()]);
        assert_eq!(m.header_scan_rows, 8);
        assert_eq!(m.total_paid, vec!["TOTAL PAID".to_string()]);
    }
}
