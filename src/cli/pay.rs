use colored::Colorize;

use super::Context;
use crate::error::{FinanzasError, Result};
use crate::fmt::money;
use crate::ledger::{Ledger, PaySelector};

pub fn run(ctx: &Context, row: Option<usize>, method: Option<&str>) -> Result<()> {
    let selector = match (row, method) {
        (Some(n), None) => PaySelector::Row(n),
        (None, Some(m)) => PaySelector::Method(m.to_string()),
        _ => {
            return Err(FinanzasError::Other(
                "pass exactly one of --row or --method".to_string(),
            ))
        }
    };

    let path = ctx.source.writable_path()?;
    let mut ledger = Ledger::open(path)?;
    let before: f64 = pending_total(&ledger);
    let changed = ledger.mark_paid(&selector)?;
    ledger.save(path)?;
    let settled = before - pending_total(&ledger);

    println!(
        "{} {changed} movement(s), {} settled ({selector}).",
        "Paid".green().bold(),
        money(settled)
    );
    Ok(())
}

fn pending_total(ledger: &Ledger) -> f64 {
    ledger
        .entries()
        .iter()
        .filter(|e| e.movement.is_pending_expense())
        .map(|e| e.movement.amount)
        .sum()
}
