use std::path::Path;

use comfy_table::{Cell, Table};

use super::Context;
use crate::classmap::ClassMap;
use crate::error::{BursarError, Result};
use crate::workbook::read_workbook;

pub fn run(ctx: &Context, file: &str, json: bool) -> Result<()> {
    let workbook = read_workbook(Path::new(file))?;

    if json {
        let out = serde_json::to_string_pretty(&workbook)
            .map_err(|e| BursarError::Other(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    let map = ClassMap::with_overrides(&ctx.settings.class_map);
    let mut table = Table::new();
    table.set_header(vec!["Sheet", "Maps to", "Rows", "Used", "Columns", "Header row", "Headers"]);
    for sheet in workbook.sheets() {
        let stats = &sheet.statistics;
        table.add_row(vec![
            Cell::new(&sheet.name),
            Cell::new(map.lookup(&sheet.name).map(|t| t.section.as_str()).unwrap_or("-")),
            Cell::new(stats.total_rows),
            Cell::new(stats.used_rows),
            Cell::new(stats.column_count),
            Cell::new(stats.header_row.map(|r| (r + 1).to_string()).unwrap_or_default()),
            Cell::new(stats.header_values.join(", ")),
        ]);
    }
    println!("{} sheet(s) in {file}\n{table}", workbook.sheets().len());
    Ok(())
}
