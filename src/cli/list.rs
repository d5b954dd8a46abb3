use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{Context, KindArg, PeriodArgs};
use crate::error::Result;
use crate::fmt::money;
use crate::models::{Kind, Status};
use crate::reports;

pub fn run(ctx: &Context, period: &PeriodArgs, kind: Option<KindArg>, pending: bool) -> Result<()> {
    let ledger = ctx.load()?;
    let filter = period.to_filter()?.with_kind(kind.map(Kind::from));
    let rows = reports::register(ledger.entries(), &filter, pending);

    if rows.is_empty() {
        println!("No movements for {}.", filter.label());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Row", "Date", "Type", "Status", "Category", "Method", "Amount", "Description",
    ]);
    for entry in &rows {
        let m = &entry.movement;
        let kind_cell = match m.kind {
            Kind::Income => Cell::new(m.kind.label().green()),
            Kind::Expense => Cell::new(m.kind.label().red()),
        };
        let status_cell = match m.status {
            Status::Pending => Cell::new(m.status.label().yellow()),
            Status::Realized => Cell::new(m.status.label()),
        };
        table.add_row(vec![
            Cell::new(entry.row),
            Cell::new(m.date.format("%Y-%m-%d")),
            kind_cell,
            status_cell,
            Cell::new(m.category_or_default()),
            Cell::new(m.method_or_default()),
            Cell::new(money(m.amount)).set_alignment(CellAlignment::Right),
            Cell::new(&m.description),
        ]);
    }

    let title = if pending { "Pending payments" } else { "Movements" };
    println!("{title} ({}, {} rows)\n{table}", filter.label(), rows.len());
    Ok(())
}
