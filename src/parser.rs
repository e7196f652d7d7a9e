use std::sync::OnceLock;

use regex::Regex;

use crate::columns::{row_fields, ColumnMapping, Field};
use crate::models::ParsedStudentRecord;

/// Parser configuration beyond the column layout.
#[derive(Debug, Clone)]
pub struct ParseOptions<'a> {
    pub columns: &'a ColumnMapping,
    pub default_expected_fee: f64,
    pub placeholder_phone: &'a str,
}

/// No row in the scan window looked like a header. Non-fatal: the sheet
/// simply yields no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderNotFound {
    pub scanned_rows: usize,
}

#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub header_row: usize,
    pub records: Vec<ParsedStudentRecord>,
    /// Data rows dropped because the name was blank.
    pub discarded: usize,
}

/// Strips thousands separators, spaces and currency markers, then parses.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_uppercase();
    for marker in ["FCFA", "XAF", "F"] {
        if let Some(stripped) = s.strip_suffix(marker) {
            s = stripped.to_string();
            break;
        }
    }
    let s: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '"'))
        .collect();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"\d{9,}").expect("valid phone regex"))
}

/// First run of nine or more digits in `contact`.
pub fn extract_phone(contact: &str) -> Option<&str> {
    phone_pattern().find(contact).map(|m| m.as_str())
}

pub fn parse_sheet(raw: &[Vec<String>], opts: &ParseOptions) -> Result<ParsedSheet, HeaderNotFound> {
    let columns = opts.columns;
    let header_row = columns.find_header_row(raw).ok_or(HeaderNotFound {
        scanned_rows: raw.len().min(columns.header_scan_rows),
    })?;
    let header = &raw[header_row];

    let mut records = Vec::new();
    let mut discarded = 0usize;
    for (ordinal, row) in raw[header_row + 1..].iter().enumerate() {
        let fields = row_fields(header, row);
        let Some(name) = columns.first_non_empty(&fields, Field::Name) else {
            if row.iter().any(|c| !c.trim().is_empty()) {
                discarded += 1;
            }
            continue;
        };

        let amount = |field| columns.first_non_empty(&fields, field).and_then(parse_amount);
        let parent_contact = columns
            .first_non_empty(&fields, Field::ParentContact)
            .map(str::to_string);
        let phone = parent_contact
            .as_deref()
            .and_then(extract_phone)
            .unwrap_or(opts.placeholder_phone)
            .to_string();

        records.push(ParsedStudentRecord {
            sequence: amount(Field::Sequence)
                .map(|v| v as i64)
                .unwrap_or(ordinal as i64 + 1),
            name: name.to_string(),
            status: columns.first_non_empty(&fields, Field::Status).map(str::to_string),
            total_expected: amount(Field::TotalExpected).unwrap_or(opts.default_expected_fee),
            total_paid: amount(Field::TotalPaid).unwrap_or(0.0),
            debt: amount(Field::Debt).unwrap_or(0.0),
            parent_contact,
            phone,
        });
    }

    Ok(ParsedSheet {
        header_row,
        records,
        discarded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn parse(raw: &[Vec<String>]) -> Result<ParsedSheet, HeaderNotFound> {
        let columns = ColumnMapping::default();
        let opts = ParseOptions {
            columns: &columns,
            default_expected_fee: 175_000.0,
            placeholder_phone: "000000000",
        };
        parse_sheet(raw, &opts)
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("175,000"), Some(175000.0));
        assert_eq!(parse_amount(" 50 000 FCFA"), Some(50000.0));
        assert_eq!(parse_amount("25000f"), Some(25000.0));
        assert_eq!(parse_amount("12500.5"), Some(12500.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_extract_phone() {
        assert_eq!(extract_phone("Father - 677123456"), Some("677123456"));
        assert_eq!(extract_phone("no phone"), None);
        assert_eq!(extract_phone("call 67712 3456"), None);
        assert_eq!(extract_phone("+237 690000111 / 677000222"), Some("690000111"));
    }

    #[test]
    fn test_header_at_row_two() {
        let raw = rows(&[
            &["GOVERNMENT BILINGUAL HIGH SCHOOL", ""],
            &["FEES 2025/2026", ""],
            &["SN", "NAME"],
            &["1", "Ann Mbah"],
        ]);
        let parsed = parse(&raw).unwrap();
        assert_eq!(parsed.header_row, 2);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].name, "Ann Mbah");
    }

    #[test]
    fn test_header_not_found() {
        let raw = rows(&[&["a"], &["b"], &["c"], &["d"], &["e"], &["SN", "NAME"], &["1", "X"]]);
        let err = parse(&raw).unwrap_err();
        assert_eq!(err.scanned_rows, 5);
    }

    #[test]
    fn test_defaults_applied() {
        let raw = rows(&[&["SN", "NAME", "STATUS"], &["1", "Ann", "Father - 677123456"]]);
        let rec = &parse(&raw).unwrap().records[0];
        assert_eq!(rec.total_expected, 175000.0);
        assert_eq!(rec.total_paid, 0.0);
        assert_eq!(rec.debt, 0.0);
        assert_eq!(rec.parent_contact.as_deref(), Some("Father - 677123456"));
        assert_eq!(rec.phone, "677123456");
    }

    #[test]
    fn test_unparseable_expected_falls_back() {
        let raw = rows(&[&["NAME", "TOTAL EXPECTED"], &["Ann", "TBD"]]);
        let rec = &parse(&raw).unwrap().records[0];
        assert_eq!(rec.total_expected, 175000.0);
        assert_eq!(rec.sequence, 1);
    }

    #[test]
    fn test_blank_names_discarded() {
        let raw = rows(&[
            &["SN", "NAME", "TOTAL PAID"],
            &["1", "   ", "1000"],
            &["", "", ""],
            &["3", "Bob", "2000"],
        ]);
        let parsed = parse(&raw).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].name, "Bob");
        assert_eq!(parsed.records[0].sequence, 3);
        assert_eq!(parsed.discarded, 1);
    }

    #[test]
    fn test_alternate_columns() {
        let raw = rows(&[
            &["S/N", "STUDENT NAME", "DEBT", "PARENT CONTACT", "STATUS"],
            &["4", "Cy", "30,000", "no phone", "Mother 690000111"],
        ]);
        let rec = &parse(&raw).unwrap().records[0];
        assert_eq!(rec.name, "Cy");
        assert_eq!(rec.debt, 30000.0);
        assert_eq!(rec.parent_contact.as_deref(), Some("no phone"));
        assert_eq!(rec.phone, "000000000");
        assert_eq!(rec.status.as_deref(), Some("Mother 690000111"));
    }

    #[test]
    fn test_debth_preferred_over_debt() {
        let raw = rows(&[&["NAME", "DEBT", "DEBTH 1ST INST"], &["Di", "10", "20"]]);
        assert_eq!(parse(&raw).unwrap().records[0].debt, 20.0);
    }
}
