use crate::error::{FinanzasError, Result};
use crate::parsing::fold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Kind,
    Status,
    Category,
    Amount,
    Method,
    Description,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Date,
        Field::Kind,
        Field::Status,
        Field::Category,
        Field::Amount,
        Field::Method,
        Field::Description,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Kind => "type",
            Self::Status => "status",
            Self::Category => "category",
            Self::Amount => "amount",
            Self::Method => "method",
            Self::Description => "description",
        }
    }

    /// Folded header names that claim the field outright.
    fn exact_names(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &["fecha", "date"],
            Self::Kind => &["tipo", "type"],
            Self::Status => &["estado", "status"],
            Self::Category => &["categoria", "category"],
            Self::Amount => &["monto", "amount"],
            Self::Method => &["metodo", "method", "medio"],
            Self::Description => &["descripcion", "description"],
        }
    }

    /// Folded substrings that claim the field when no exact header exists.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &["fecha", "date", "dia"],
            Self::Kind => &["tipo", "type", "movimiento"],
            Self::Status => &["estado", "status", "situacion"],
            Self::Category => &["categor", "rubro", "concepto"],
            Self::Amount => &["monto", "importe", "amount", "valor", "total"],
            Self::Method => &[
                "metodo",
                "medio",
                "method",
                "forma de pago",
                "pago",
                "tarjeta",
                "cuenta",
            ],
            Self::Description => &["descrip", "detalle", "nota", "comentario", "observ"],
        }
    }
}

/// Column index of every field found in a header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    pub date: Option<usize>,
    pub kind: Option<usize>,
    pub status: Option<usize>,
    pub category: Option<usize>,
    /// Additional category columns, coalesced after the primary one.
    pub extra_categories: Vec<usize>,
    pub amount: Option<usize>,
    pub method: Option<usize>,
    pub description: Option<usize>,
}

impl ColumnLayout {
    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::Date => self.date,
            Field::Kind => self.kind,
            Field::Status => self.status,
            Field::Category => self.category,
            Field::Amount => self.amount,
            Field::Method => self.method,
            Field::Description => self.description,
        }
    }

    fn slot(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Date => &mut self.date,
            Field::Kind => &mut self.kind,
            Field::Status => &mut self.status,
            Field::Category => &mut self.category,
            Field::Amount => &mut self.amount,
            Field::Method => &mut self.method,
            Field::Description => &mut self.description,
        }
    }

    pub fn set(&mut self, field: Field, idx: usize) {
        *self.slot(field) = Some(idx);
    }

    /// Category columns in coalescing order: primary first.
    pub fn category_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.category.into_iter().chain(self.extra_categories.iter().copied())
    }

    /// Fail unless the columns every movement needs were found.
    pub fn require_core(&self) -> Result<()> {
        for field in [Field::Date, Field::Kind, Field::Amount] {
            if self.get(field).is_none() {
                return Err(FinanzasError::MissingColumn(field.key()));
            }
        }
        Ok(())
    }
}

/// Map header names to fields: exact names first, then keyword matching
/// over the headers left unclaimed.
pub fn detect_columns<S: AsRef<str>>(headers: &[S]) -> ColumnLayout {
    let folded: Vec<String> = headers.iter().map(|h| fold(h.as_ref())).collect();
    let mut claimed = vec![false; folded.len()];
    let mut layout = ColumnLayout::default();

    for field in Field::ALL {
        if let Some(idx) = folded
            .iter()
            .enumerate()
            .position(|(i, h)| !claimed[i] && field.exact_names().contains(&h.as_str()))
        {
            claimed[idx] = true;
            layout.set(field, idx);
        }
    }

    for field in Field::ALL {
        if layout.get(field).is_some() {
            continue;
        }
        if let Some(idx) = folded
            .iter()
            .enumerate()
            .position(|(i, h)| !claimed[i] && field.keywords().iter().any(|k| h.contains(k)))
        {
            claimed[idx] = true;
            layout.set(field, idx);
        }
    }

    for (i, h) in folded.iter().enumerate() {
        if !claimed[i] && Field::Category.keywords().iter().any(|k| h.contains(k)) {
            claimed[i] = true;
            if layout.category.is_none() {
                layout.category = Some(i);
            } else {
                layout.extra_categories.push(i);
            }
        }
    }

    for field in Field::ALL {
        match layout.get(field) {
            Some(idx) => log::debug!("column '{}' -> {}", headers[idx].as_ref(), field.key()),
            None => log::debug!("no column for {}", field.key()),
        }
    }
    layout
}
