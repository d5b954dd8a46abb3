use crate::columns::Field;
use crate::error::Result;
use crate::settings::{settings_file_exists, settings_path};
use crate::source::Source;

use super::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let settings = &ctx.settings;

    println!("User:       {}", if settings.user_name.is_empty() { "(not set)" } else { &settings.user_name });
    println!(
        "Settings:   {}{}",
        settings_path().display(),
        if settings_file_exists() { "" } else { " (defaults, run `finanzas init`)" }
    );
    let mode = match ctx.source {
        Source::Local(_) => "local",
        Source::Published(_) => "published, read-only",
    };
    println!("Source:     {} ({mode})", ctx.source);

    if let Source::Local(path) = &ctx.source {
        if !path.exists() {
            println!();
            println!("Ledger not found. Run `finanzas init` or `finanzas add` to create it.");
            return Ok(());
        }
    }

    let ledger = ctx.load()?;
    let entries = ledger.entries();
    let pending = entries.iter().filter(|e| e.movement.is_pending_expense()).count();
    let first = entries.iter().map(|e| e.movement.date).min();
    let last = entries.iter().map(|e| e.movement.date).max();

    println!();
    println!("Rows:       {}", ledger.row_count());
    println!("Movements:  {}", entries.len());
    println!("Skipped:    {}", ledger.skipped());
    println!("Pending:    {pending}");
    if let (Some(first), Some(last)) = (first, last) {
        println!("Dates:      {first} to {last}");
    }

    println!();
    println!("Columns:");
    let headers = ledger.headers();
    for field in Field::ALL {
        let found = match ledger.layout().get(field) {
            Some(idx) => headers.get(idx).cloned().unwrap_or_default(),
            None => "(missing)".to_string(),
        };
        println!("  {:<12} {found}", field.key());
    }
    for idx in &ledger.layout().extra_categories {
        if let Some(h) = headers.get(*idx) {
            println!("  {:<12} {h} (coalesced)", "category");
        }
    }
    Ok(())
}
