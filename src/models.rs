use std::fmt;

use chrono::NaiveDate;

pub const NO_CATEGORY: &str = "Sin categoría";
pub const NO_METHOD: &str = "Sin método";

/// Header row written to a fresh ledger, in column order.
pub const CANONICAL_HEADERS: &[&str] = &[
    "Fecha",
    "Tipo",
    "Estado",
    "Categoría",
    "Monto",
    "Metodo",
    "Descripción",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    /// Label stored in the spreadsheet.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Ingreso",
            Self::Expense => "Gasto",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Income => Self::Expense,
            Self::Expense => Self::Income,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Realized,
    Pending,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Realized => "Realizado",
            Self::Pending => "Pendiente",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single income or expense row.
#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    pub date: NaiveDate,
    pub kind: Kind,
    pub status: Status,
    pub category: String,
    pub amount: f64,
    pub method: String,
    pub description: String,
}

impl Movement {
    pub fn is_pending_expense(&self) -> bool {
        self.kind == Kind::Expense && self.status == Status::Pending
    }

    pub fn category_or_default(&self) -> &str {
        if self.category.trim().is_empty() {
            NO_CATEGORY
        } else {
            &self.category
        }
    }

    pub fn method_or_default(&self) -> &str {
        if self.method.trim().is_empty() {
            NO_METHOD
        } else {
            &self.method
        }
    }
}

/// A movement loaded from a sheet, with its 1-based data row number.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub row: usize,
    pub movement: Movement,
}
