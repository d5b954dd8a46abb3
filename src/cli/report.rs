use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{Context, KindArg, PeriodArgs};
use crate::error::Result;
use crate::fmt::{money, share_bar};
use crate::models::Kind;
use crate::reports::{self, Filter, Share};

fn amount_cell(val: f64) -> Cell {
    Cell::new(money(val)).set_alignment(CellAlignment::Right)
}

pub fn summary(ctx: &Context, period: &PeriodArgs) -> Result<()> {
    let ledger = ctx.load()?;
    let filter = period.to_filter()?;
    let s = reports::summary(ledger.entries(), &filter);

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Amount"]);
    table.add_row(vec![Cell::new("Income".green().bold()), amount_cell(s.income)]);
    table.add_row(vec![
        Cell::new("Expenses (paid)".red().bold()),
        amount_cell(s.realized_expense),
    ]);
    table.add_row(vec![
        Cell::new("Expenses (pending)".yellow().bold()),
        amount_cell(s.pending_expense),
    ]);
    table.add_row(vec![Cell::new(""), Cell::new("")]);

    let balance_label = if s.balance >= 0.0 {
        "Balance".green().bold()
    } else {
        "Balance".red().bold()
    };
    table.add_row(vec![Cell::new(balance_label), amount_cell(s.balance)]);
    table.add_row(vec![
        Cell::new("Balance after pending".bold()),
        amount_cell(s.projected_balance),
    ]);

    println!(
        "Summary ({}, {} movements)\n{table}",
        filter.label(),
        s.count
    );
    Ok(())
}

fn share_table(title: &str, label: &str, filter: &Filter, shares: &[Share]) {
    if shares.is_empty() {
        println!("{title}: no movements for {}.", filter.label());
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![label, "Amount", "%", "", "Count"]);
    for item in shares {
        table.add_row(vec![
            Cell::new(&item.name),
            amount_cell(item.total),
            Cell::new(format!("{:.1}%", item.pct)).set_alignment(CellAlignment::Right),
            Cell::new(share_bar(item.pct, 20).as_str().cyan()),
            Cell::new(item.count),
        ]);
    }
    let total: f64 = shares.iter().map(|s| s.total).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        amount_cell(total),
        Cell::new(""),
        Cell::new(""),
        Cell::new(shares.iter().map(|s| s.count).sum::<usize>()),
    ]);
    println!("{title} ({})\n{table}", filter.label());
}

fn kind_title(kind: Kind) -> &'static str {
    match kind {
        Kind::Income => "Income",
        Kind::Expense => "Expenses",
    }
}

pub fn categories(ctx: &Context, period: &PeriodArgs, kind: KindArg) -> Result<()> {
    let ledger = ctx.load()?;
    let filter = period.to_filter()?;
    let kind = Kind::from(kind);
    let shares = reports::by_category(ledger.entries(), &filter, kind);
    share_table(
        &format!("{} by category", kind_title(kind)),
        "Category",
        &filter,
        &shares,
    );
    Ok(())
}

pub fn methods(ctx: &Context, period: &PeriodArgs, kind: KindArg) -> Result<()> {
    let ledger = ctx.load()?;
    let filter = period.to_filter()?;
    let kind = Kind::from(kind);
    let shares = reports::by_method(ledger.entries(), &filter, kind);
    share_table(
        &format!("{} by payment method", kind_title(kind)),
        "Method",
        &filter,
        &shares,
    );
    Ok(())
}

pub fn monthly(ctx: &Context, year: Option<i32>) -> Result<()> {
    let ledger = ctx.load()?;
    let filter = Filter::new(year, None, None, None)?;
    let months = reports::monthly(ledger.entries(), &filter);

    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expenses", "Net", "Running"]);
    for m in &months {
        let net = if m.net >= 0.0 {
            money(m.net).as_str().green()
        } else {
            money(m.net).as_str().red()
        };
        table.add_row(vec![
            Cell::new(&m.month),
            amount_cell(m.income),
            amount_cell(m.expense),
            Cell::new(net).set_alignment(CellAlignment::Right),
            amount_cell(m.running),
        ]);
    }
    println!("Monthly flow ({})\n{table}", filter.label());
    Ok(())
}
