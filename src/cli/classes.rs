use comfy_table::{Cell, Table};

use super::Context;
use crate::classmap::ClassMap;
use crate::db::{ensure_sub_class, sub_class_by_name};
use crate::error::{BursarError, Result};

pub fn add(ctx: &Context, name: &str, class: &str) -> Result<()> {
    let conn = ctx.open()?;
    if sub_class_by_name(&conn, name)?.is_some() {
        return Err(BursarError::Other(format!("class-section already exists: {name}")));
    }
    ensure_sub_class(&conn, class, name)?;
    println!("Added class-section: {name} ({class})");
    Ok(())
}

pub fn seed(ctx: &Context) -> Result<()> {
    let conn = ctx.open()?;
    let map = ClassMap::with_overrides(&ctx.settings.class_map);
    let mut added = 0usize;
    for target in map.entries() {
        if sub_class_by_name(&conn, &target.section)?.is_none() {
            ensure_sub_class(&conn, &target.class_name, &target.section)?;
            added += 1;
        }
    }
    println!("{added} class-section(s) added, {} already present", map.entries().len() - added);
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let conn = ctx.open()?;
    let mut stmt = conn.prepare(
        "SELECT c.name, sc.name, sc.student_count FROM sub_classes sc \
         JOIN classes c ON c.id = sc.class_id ORDER BY c.name, sc.name",
    )?;
    let rows: Vec<(String, String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["Class", "Section", "Students"]);
    for (class, section, count) in rows {
        table.add_row(vec![Cell::new(class), Cell::new(section), Cell::new(count)]);
    }
    println!("Class-sections\n{table}");
    Ok(())
}
