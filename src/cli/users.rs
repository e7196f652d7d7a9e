use comfy_table::{Cell, Table};

use super::Context;
use crate::error::Result;

pub fn add(ctx: &Context, matricule: &str, name: &str, role: &str) -> Result<()> {
    let conn = ctx.open()?;
    conn.execute(
        "INSERT INTO users (matricule, name, role) VALUES (?1, ?2, ?3)",
        rusqlite::params![matricule, name, role],
    )?;
    println!("Added user: {matricule} ({name})");
    if matricule != ctx.settings.admin_matricule {
        println!(
            "Note: imported payments are attributed to {}, not this user.",
            ctx.settings.admin_matricule
        );
    }
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let conn = ctx.open()?;
    let mut stmt = conn.prepare("SELECT matricule, name, role FROM users ORDER BY matricule")?;
    let rows: Vec<(String, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["Matricule", "Name", "Role"]);
    for (matricule, name, role) in rows {
        table.add_row(vec![Cell::new(matricule), Cell::new(name), Cell::new(role)]);
    }
    println!("Users\n{table}");
    Ok(())
}
