use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::error::{FinanzasError, Result};
use crate::models::{Kind, LedgerEntry, Movement, Status};
use crate::parsing::{fold, parse_date};

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Period and type restriction applied before aggregating.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Filter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<Kind>,
}

impl Filter {
    pub fn new(
        year: Option<i32>,
        month: Option<u32>,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Result<Self> {
        let (from, to) = match (from_date, to_date) {
            (Some(from), Some(to)) => {
                let f = parse_date(from).ok_or_else(|| FinanzasError::InvalidDate(from.to_string()))?;
                let t = parse_date(to).ok_or_else(|| FinanzasError::InvalidDate(to.to_string()))?;
                (Some(f), Some(t))
            }
            (Some(_), None) => {
                return Err(FinanzasError::Other(
                    "--from requires --to (both date boundaries must be specified)".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(FinanzasError::Other(
                    "--to requires --from (both date boundaries must be specified)".to_string(),
                ));
            }
            (None, None) => (None, None),
        };
        if month.is_some() && year.is_none() {
            return Err(FinanzasError::Other("a month filter needs a year".to_string()));
        }
        Ok(Self {
            year,
            month,
            from,
            to,
            kind: None,
        })
    }

    pub fn month_of(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: Option<Kind>) -> Self {
        self.kind = kind;
        self
    }

    pub fn matches(&self, m: &Movement) -> bool {
        if let Some(kind) = self.kind {
            if m.kind != kind {
                return false;
            }
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if m.date < from || m.date > to {
                return false;
            }
        }
        if let Some(y) = self.year {
            if m.date.year() != y {
                return false;
            }
        }
        if let Some(mo) = self.month {
            if m.date.month() != mo {
                return false;
            }
        }
        true
    }

    pub fn label(&self) -> String {
        match (self.from, self.to, self.year, self.month) {
            (Some(f), Some(t), _, _) => format!("{f} to {t}"),
            (_, _, Some(y), Some(m)) => format!("{y:04}-{m:02}"),
            (_, _, Some(y), None) => format!("{y}"),
            _ => "All time".to_string(),
        }
    }
}

fn selected(entries: &[LedgerEntry], filter: Filter) -> impl Iterator<Item = &LedgerEntry> {
    entries.iter().filter(move |e| filter.matches(&e.movement))
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// Movements in date order, optionally only pending expenses.
pub fn register<'a>(
    entries: &'a [LedgerEntry],
    filter: &Filter,
    pending_only: bool,
) -> Vec<&'a LedgerEntry> {
    let mut rows: Vec<&LedgerEntry> = selected(entries, *filter)
        .filter(|e| !pending_only || e.movement.is_pending_expense())
        .collect();
    rows.sort_by_key(|e| (e.movement.date, e.row));
    rows
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub income: f64,
    pub realized_expense: f64,
    pub pending_expense: f64,
    /// income - realized_expense
    pub balance: f64,
    /// balance - pending_expense
    pub projected_balance: f64,
    pub count: usize,
}

pub fn summary(entries: &[LedgerEntry], filter: &Filter) -> Summary {
    let mut s = Summary::default();
    for e in selected(entries, *filter) {
        let m = &e.movement;
        s.count += 1;
        match (m.kind, m.status) {
            (Kind::Income, _) => s.income += m.amount,
            (Kind::Expense, Status::Realized) => s.realized_expense += m.amount,
            (Kind::Expense, Status::Pending) => s.pending_expense += m.amount,
        }
    }
    s.balance = s.income - s.realized_expense;
    s.projected_balance = s.balance - s.pending_expense;
    s
}

// ---------------------------------------------------------------------------
// Breakdowns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub name: String,
    pub total: f64,
    pub count: usize,
    pub pct: f64,
}

fn group_by<F>(entries: &[LedgerEntry], filter: &Filter, key: F) -> Vec<Share>
where
    F: Fn(&Movement) -> &str,
{
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for e in selected(entries, *filter) {
        let slot = groups.entry(key(&e.movement).to_string()).or_default();
        slot.0 += e.movement.amount;
        slot.1 += 1;
    }
    let grand: f64 = groups.values().map(|(t, _)| t).sum();
    let mut shares: Vec<Share> = groups
        .into_iter()
        .map(|(name, (total, count))| Share {
            name,
            total,
            count,
            pct: if grand != 0.0 { total / grand * 100.0 } else { 0.0 },
        })
        .collect();
    shares.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    shares
}

/// Totals per category for one kind, largest first. Pending rows count.
pub fn by_category(entries: &[LedgerEntry], filter: &Filter, kind: Kind) -> Vec<Share> {
    group_by(entries, &filter.with_kind(Some(kind)), |m| m.category_or_default())
}

/// Totals per payment method for one kind, largest first.
pub fn by_method(entries: &[LedgerEntry], filter: &Filter, kind: Kind) -> Vec<Share> {
    group_by(entries, &filter.with_kind(Some(kind)), |m| m.method_or_default())
}

// ---------------------------------------------------------------------------
// Monthly flow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthFlow {
    pub month: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    pub running: f64,
}

/// Income and realized expense per month, oldest first, with a running balance.
pub fn monthly(entries: &[LedgerEntry], filter: &Filter) -> Vec<MonthFlow> {
    let mut by_month: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for e in selected(entries, *filter) {
        let m = &e.movement;
        let key = m.date.format("%Y-%m").to_string();
        let slot = by_month.entry(key).or_default();
        match (m.kind, m.status) {
            (Kind::Income, _) => slot.0 += m.amount,
            (Kind::Expense, Status::Realized) => slot.1 += m.amount,
            (Kind::Expense, Status::Pending) => {}
        }
    }
    let mut running = 0.0;
    by_month
        .into_iter()
        .map(|(month, (income, expense))| {
            let net = income - expense;
            running += net;
            MonthFlow {
                month,
                income,
                expense,
                net,
                running,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Credit cards
// ---------------------------------------------------------------------------

const CARD_KEYWORDS: &[&str] = &["visa", "master", "amex", "american express", "credito"];

/// Whether a payment method accrues debt instead of paying immediately.
pub fn is_credit_card(method: &str, cards: &[String]) -> bool {
    let folded = fold(method);
    if folded.is_empty() || folded.contains("debito") {
        return false;
    }
    cards.iter().any(|c| fold(c) == folded) || CARD_KEYWORDS.iter().any(|k| folded.contains(k))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardBalance {
    pub method: String,
    pub pending: f64,
    pub count: usize,
    /// Earliest pending charge.
    pub oldest: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardDebt {
    pub cards: Vec<CardBalance>,
    pub total: f64,
}

/// Projected debt per credit card: the pending expenses charged to it.
pub fn card_debt(entries: &[LedgerEntry], cards: &[String]) -> CardDebt {
    let mut by_card: BTreeMap<String, CardBalance> = BTreeMap::new();
    for e in entries {
        let m = &e.movement;
        if !m.is_pending_expense() || !is_credit_card(&m.method, cards) {
            continue;
        }
        by_card
            .entry(fold(&m.method))
            .and_modify(|b| {
                b.pending += m.amount;
                b.count += 1;
                b.oldest = b.oldest.min(m.date);
            })
            .or_insert_with(|| CardBalance {
                method: m.method.clone(),
                pending: m.amount,
                count: 1,
                oldest: m.date,
            });
    }
    let mut balances: Vec<CardBalance> = by_card.into_values().collect();
    balances.sort_by(|a, b| b.pending.total_cmp(&a.pending));
    let total = balances.iter().map(|b| b.pending).sum();
    CardDebt {
        cards: balances,
        total,
    }
}
