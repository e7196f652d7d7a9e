/// Format a fee amount with thousands separators: 175,000 FCFA
///
/// Amounts are whole francs; fractions are rounded.
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let whole = format!("{:.0}", val.abs());

    let mut with_commas = String::new();
    for (i, c) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative && whole != "0" {
        format!("-{with_commas} FCFA")
    } else {
        format!("{with_commas} FCFA")
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
