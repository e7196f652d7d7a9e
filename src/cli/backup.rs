use std::path::{Path, PathBuf};

use rusqlite::backup::Backup;
use rusqlite::Connection;

use super::Context;
use crate::error::Result;
use crate::fmt::format_bytes;

fn backup_to(conn: &Connection, dest_path: &Path) -> Result<()> {
    if let Some(parent) = dest_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut dest_conn = Connection::open(dest_path)?;
    let backup = Backup::new(conn, &mut dest_conn)?;
    backup.run_to_completion(100, std::time::Duration::from_millis(10), None)?;
    Ok(())
}

fn default_backup_path(ctx: &Context, label: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    ctx.data_dir().join("backups").join(format!("bursar-{label}{stamp}.db"))
}

/// Backup taken before destructive operations.
pub fn snapshot(conn: &Connection, ctx: &Context) -> Result<PathBuf> {
    let dest_path = default_backup_path(ctx, "pre-cleanup-");
    backup_to(conn, &dest_path)?;
    tracing::info!("pre-cleanup backup saved to {}", dest_path.display());
    Ok(dest_path)
}

pub fn run(ctx: &Context, output: Option<String>) -> Result<()> {
    let conn = ctx.open()?;
    let dest_path = match output {
        Some(p) => PathBuf::from(p),
        None => default_backup_path(ctx, ""),
    };
    backup_to(&conn, &dest_path)?;

    let size = std::fs::metadata(&dest_path)?.len();
    println!("Backup saved to {}", dest_path.display());
    println!("Size: {}", format_bytes(size));
    Ok(())
}
