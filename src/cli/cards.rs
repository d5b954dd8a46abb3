use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::Context;
use crate::error::Result;
use crate::fmt::money;
use crate::reports::{self, Filter};

pub fn pending(ctx: &Context) -> Result<()> {
    let ledger = ctx.load()?;
    let rows = reports::register(ledger.entries(), &Filter::default(), true);
    if rows.is_empty() {
        println!("{}", "Nothing pending.".green());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Row", "Date", "Category", "Method", "Amount", "Description"]);
    for entry in &rows {
        let m = &entry.movement;
        let method = if reports::is_credit_card(&m.method, &ctx.settings.credit_cards) {
            format!("{} (card)", m.method_or_default())
        } else {
            m.method_or_default().to_string()
        };
        table.add_row(vec![
            Cell::new(entry.row),
            Cell::new(m.date.format("%Y-%m-%d")),
            Cell::new(m.category_or_default()),
            Cell::new(method),
            Cell::new(money(m.amount)).set_alignment(CellAlignment::Right),
            Cell::new(&m.description),
        ]);
    }
    let total: f64 = rows.iter().map(|e| e.movement.amount).sum();
    table.add_row(vec![
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new("Total".bold()),
        Cell::new(money(total).yellow().bold()).set_alignment(CellAlignment::Right),
        Cell::new(""),
    ]);
    println!("Pending payments\n{table}");
    println!("Settle with `finanzas pay --row N` or `finanzas pay --method NAME`.");
    Ok(())
}

pub fn cards(ctx: &Context) -> Result<()> {
    let ledger = ctx.load()?;
    let debt = reports::card_debt(ledger.entries(), &ctx.settings.credit_cards);
    if debt.cards.is_empty() {
        println!("{}", "No pending credit card charges.".green());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Card", "Charges", "Oldest", "Debt"]);
    for card in &debt.cards {
        table.add_row(vec![
            Cell::new(&card.method),
            Cell::new(card.count),
            Cell::new(card.oldest.format("%Y-%m-%d")),
            Cell::new(money(card.pending)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(debt.cards.iter().map(|c| c.count).sum::<usize>()),
        Cell::new(""),
        Cell::new(money(debt.total).red().bold()).set_alignment(CellAlignment::Right),
    ]);
    println!("Projected credit card debt\n{table}");
    Ok(())
}
