use std::io::Read;
use std::path::Path;

use crate::columns::{detect_columns, ColumnLayout, Field};
use crate::error::{FinanzasError, Result};
use crate::models::{LedgerEntry, Movement, Status, CANONICAL_HEADERS};
use crate::parsing::{fold, parse_amount, parse_date, parse_kind, parse_status};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| {
            SPREADSHEET_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e))
        })
}

/// Which pending movements `mark_paid` settles.
#[derive(Debug, Clone)]
pub enum PaySelector {
    /// 1-based data row number, as shown by `finanzas list`.
    Row(usize),
    /// Every pending expense paid with this method.
    Method(String),
}

impl std::fmt::Display for PaySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Row(n) => write!(f, "row {n}"),
            Self::Method(m) => write!(f, "method '{m}'"),
        }
    }
}

/// The sheet as loaded: raw cells plus the movements parsed from them.
/// Raw rows are kept so saving preserves columns this tool does not know.
#[derive(Debug, Clone)]
pub struct Ledger {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    layout: ColumnLayout,
    entries: Vec<LedgerEntry>,
    skipped: usize,
}

impl Ledger {
    pub fn empty() -> Self {
        let headers: Vec<String> = CANONICAL_HEADERS.iter().map(|h| h.to_string()).collect();
        let layout = detect_columns(&headers);
        Self {
            headers,
            rows: Vec::new(),
            layout,
            entries: Vec::new(),
            skipped: 0,
        }
    }

    /// Build a ledger from a header row and data rows.
    pub fn from_table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let layout = detect_columns(&headers);
        layout.require_core()?;

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for (i, row) in rows.iter().enumerate() {
            match parse_row(&layout, row) {
                Ok(movement) => entries.push(LedgerEntry {
                    row: i + 1,
                    movement,
                }),
                Err(reason) => {
                    log::warn!("skipping row {}: {reason}", i + 1);
                    skipped += 1;
                }
            }
        }

        Ok(Self {
            headers,
            rows,
            layout,
            entries,
            skipped,
        })
    }

    /// Parse CSV text. The first non-blank record is the header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let cells: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            if headers.is_none() {
                let cleaned = cells
                    .into_iter()
                    .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
                    .collect();
                headers = Some(cleaned);
            } else {
                rows.push(cells);
            }
        }

        match headers {
            Some(headers) => Self::from_table(headers, rows),
            None => Ok(Self::empty()),
        }
    }

    /// Open a local ledger. A CSV that does not exist yet is an empty ledger.
    pub fn open(path: &Path) -> Result<Self> {
        if is_spreadsheet(path) {
            return read_workbook(path);
        }
        if !path.exists() {
            log::info!("{} does not exist yet, starting empty", path.display());
            return Ok(Self::empty());
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Rows that could not be read as a movement.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Append a movement as a new row aligned to the sheet's columns.
    /// Returns the new row number.
    pub fn push(&mut self, movement: Movement) -> Result<usize> {
        if !movement.amount.is_finite() || movement.amount < 0.0 {
            return Err(FinanzasError::InvalidAmount(movement.amount.to_string()));
        }

        if movement.status == Status::Pending {
            self.ensure_column(Field::Status);
        }
        if !movement.category.is_empty() {
            self.ensure_column(Field::Category);
        }
        if !movement.method.is_empty() {
            self.ensure_column(Field::Method);
        }
        if !movement.description.is_empty() {
            self.ensure_column(Field::Description);
        }

        let mut row = vec![String::new(); self.headers.len()];
        let values = [
            (Field::Date, movement.date.format("%Y-%m-%d").to_string()),
            (Field::Kind, movement.kind.label().to_string()),
            (Field::Status, movement.status.label().to_string()),
            (Field::Category, movement.category.clone()),
            (Field::Amount, format!("{:.2}", movement.amount)),
            (Field::Method, movement.method.clone()),
            (Field::Description, movement.description.clone()),
        ];
        for (field, value) in values {
            if let Some(idx) = self.layout.get(field) {
                row[idx] = value;
            }
        }

        self.rows.push(row);
        let row_number = self.rows.len();
        self.entries.push(LedgerEntry {
            row: row_number,
            movement,
        });
        Ok(row_number)
    }

    /// Mark the selected pending expenses as realized. Returns how many changed.
    pub fn mark_paid(&mut self, selector: &PaySelector) -> Result<usize> {
        let targets: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.movement.is_pending_expense())
            .filter(|(_, e)| match selector {
                PaySelector::Row(n) => e.row == *n,
                PaySelector::Method(m) => fold(&e.movement.method) == fold(m),
            })
            .map(|(i, _)| i)
            .collect();

        if targets.is_empty() {
            return Err(FinanzasError::NothingToPay(selector.to_string()));
        }

        let status_col = self.ensure_column(Field::Status);
        for &i in &targets {
            let entry = &mut self.entries[i];
            entry.movement.status = Status::Realized;
            if let Some(row) = self.rows.get_mut(entry.row - 1) {
                if row.len() <= status_col {
                    row.resize(status_col + 1, String::new());
                }
                row[status_col] = Status::Realized.label().to_string();
            }
        }
        log::info!("marked {} movement(s) paid ({selector})", targets.len());
        Ok(targets.len())
    }

    /// Write the sheet back as CSV, preserving unknown columns.
    pub fn save(&self, path: &Path) -> Result<()> {
        if is_spreadsheet(path) {
            return Err(FinanzasError::ReadOnlySource(path.display().to_string()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("csv.tmp");
        {
            let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(&tmp)?;
            wtr.write_record(&self.headers)?;
            for row in &self.rows {
                let mut padded = row.clone();
                if padded.len() < self.headers.len() {
                    padded.resize(self.headers.len(), String::new());
                }
                wtr.write_record(&padded)?;
            }
            wtr.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Column index for a field, adding a canonical header if the sheet lacks it.
    fn ensure_column(&mut self, field: Field) -> usize {
        if let Some(idx) = self.layout.get(field) {
            return idx;
        }
        let name = match field {
            Field::Date => CANONICAL_HEADERS[0],
            Field::Kind => CANONICAL_HEADERS[1],
            Field::Status => CANONICAL_HEADERS[2],
            Field::Category => CANONICAL_HEADERS[3],
            Field::Amount => CANONICAL_HEADERS[4],
            Field::Method => CANONICAL_HEADERS[5],
            Field::Description => CANONICAL_HEADERS[6],
        };
        let idx = self.headers.len();
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.resize(idx + 1, String::new());
        }
        self.layout.set(field, idx);
        log::info!("added missing column '{name}'");
        idx
    }
}

/// Open, append one movement, and save.
pub fn append_movement(path: &Path, movement: Movement) -> Result<usize> {
    let mut ledger = Ledger::open(path)?;
    let row = ledger.push(movement)?;
    ledger.save(path)?;
    Ok(row)
}

fn cell<'a>(row: &'a [String], idx: Option<usize>) -> &'a str {
    idx.and_then(|i| row.get(i)).map_or("", |s| s.trim())
}

fn parse_row(layout: &ColumnLayout, row: &[String]) -> std::result::Result<Movement, String> {
    if row.iter().all(|c| c.trim().is_empty()) {
        return Err("blank row".to_string());
    }

    let raw_kind = cell(row, layout.kind);
    let kind = parse_kind(raw_kind).ok_or_else(|| format!("unknown type '{raw_kind}'"))?;

    let raw_date = cell(row, layout.date);
    let date = parse_date(raw_date).ok_or_else(|| format!("unreadable date '{raw_date}'"))?;

    let raw_amount = cell(row, layout.amount);
    let amount = parse_amount(raw_amount)
        .ok_or_else(|| format!("unreadable amount '{raw_amount}'"))?
        .abs();

    let status = layout
        .status
        .map_or(Status::Realized, |_| parse_status(cell(row, layout.status)));

    let category = layout
        .category_columns()
        .map(|i| cell(row, Some(i)))
        .find(|c| !c.is_empty())
        .unwrap_or("")
        .to_string();

    Ok(Movement {
        date,
        kind,
        status,
        category,
        amount,
        method: cell(row, layout.method).to_string(),
        description: cell(row, layout.description).to_string(),
    })
}

#[cfg(feature = "xlsx")]
fn read_workbook(path: &Path) -> Result<Ledger> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FinanzasError::Other(format!("{} has no worksheets", path.display())))??;

    let mut table: Vec<Vec<String>> = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|c| match c {
                    Data::String(s) => s.trim().to_string(),
                    Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
                    Data::Float(f) => format!("{f:.2}"),
                    Data::Int(i) => i.to_string(),
                    Data::Bool(b) => b.to_string(),
                    Data::DateTime(dt) => crate::parsing::excel_serial_to_date(dt.as_f64())
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    Data::DateTimeIso(s) => s.clone(),
                    _ => String::new(),
                })
                .collect()
        })
        .filter(|cells: &Vec<String>| cells.iter().any(|c| !c.is_empty()))
        .collect();

    if table.is_empty() {
        return Ok(Ledger::empty());
    }
    let headers = table.remove(0);
    Ledger::from_table(headers, table)
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(path: &Path) -> Result<Ledger> {
    Err(FinanzasError::UnsupportedFormat(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Kind;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Fecha,Tipo,Estado,Categoría,Monto,Metodo,Descripción
2025-01-05,Ingreso,Realizado,Sueldo,\"850.000,00\",Cuenta Bancaria,
2025-01-10,Gasto,Realizado,Comida,\"45.300,50\",Efectivo,Super
2025-01-12,Gasto,Pendiente,Colegio,120000,Visa Nación,Cuota
";

    fn expense(amount: f64, method: &str, status: Status) -> Movement {
        Movement {
            date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            kind: Kind::Expense,
            status,
            category: "Hogar".to_string(),
            amount,
            method: method.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_from_reader_parses_movements() {
        let ledger = Ledger::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ledger.entries().len(), 3);
        assert_eq!(ledger.skipped(), 0);
        let m = &ledger.entries()[0].movement;
        assert_eq!(m.kind, Kind::Income);
        assert_eq!(m.amount, 850_000.0);
        assert_eq!(m.category, "Sueldo");
        let pending = &ledger.entries()[2].movement;
        assert_eq!(pending.status, Status::Pending);
        assert_eq!(pending.method, "Visa Nación");
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let csv = "\
Fecha,Tipo,Monto
2025-01-05,Ingreso,100
not a date,Gasto,50
2025-01-06,Transferencia,20
2025-01-07,Gasto,

2025-01-08,Gasto,30
";
        let ledger = Ledger::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.skipped(), 3);
        assert_eq!(ledger.entries()[1].row, 5);
    }

    #[test]
    fn test_missing_status_defaults_to_realized() {
        let csv = "Fecha,Tipo,Monto\n2025-01-05,Gasto,100\n";
        let ledger = Ledger::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(ledger.entries()[0].movement.status, Status::Realized);
    }

    #[test]
    fn test_category_coalesces_two_columns() {
        let csv = "\
Fecha,Tipo,Categoría Gasto,Categoría Ingreso,Monto
2025-01-05,Ingreso,,Sueldo,100
2025-01-06,Gasto,Comida,,50
2025-01-07,Gasto,,,20
";
        let ledger = Ledger::from_reader(csv.as_bytes()).unwrap();
        let cats: Vec<&str> = ledger
            .entries()
            .iter()
            .map(|e| e.movement.category_or_default())
            .collect();
        assert_eq!(cats, vec!["Sueldo", "Comida", "Sin categoría"]);
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let ledger = Ledger::from_reader("\u{feff}Fecha,Tipo,Monto\n".as_bytes()).unwrap();
        assert!(ledger.entries().is_empty());
        assert_eq!(ledger.headers()[0], "Fecha");
    }

    #[test]
    fn test_unrecognized_headers_fail() {
        let err = Ledger::from_reader("a,b,c\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FinanzasError::MissingColumn(_)));
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::open(&dir.path().join("nope.csv")).unwrap();
        assert!(ledger.entries().is_empty());
        assert_eq!(ledger.headers().len(), CANONICAL_HEADERS.len());
    }

    #[test]
    fn test_append_creates_file_with_canonical_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("movimientos.csv");
        append_movement(&path, expense(1500.0, "Efectivo", Status::Realized)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Fecha,Tipo,Estado,Categoría,Monto,Metodo,Descripción"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2025-02-01,Gasto,Realizado,Hogar,1500.00,Efectivo,"
        );
    }

    #[test]
    fn test_append_preserves_existing_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        std::fs::write(&path, "Monto,Notas extra,Tipo,Fecha\n10,keep me,Gasto,2025-01-01\n").unwrap();
        let row = append_movement(&path, expense(20.0, "", Status::Realized)).unwrap();
        assert_eq!(row, 2);

        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.entries()[1].movement.amount, 20.0);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("keep me"));
        // Category was not in the sheet, so it was added at the end.
        assert!(content.lines().next().unwrap().ends_with("Categoría"));
    }

    #[test]
    fn test_push_rejects_negative_amount() {
        let mut ledger = Ledger::empty();
        let err = ledger.push(expense(-1.0, "Efectivo", Status::Realized)).unwrap_err();
        assert!(matches!(err, FinanzasError::InvalidAmount(_)));
    }

    #[test]
    fn test_mark_paid_by_method() {
        let mut ledger = Ledger::from_reader(SAMPLE.as_bytes()).unwrap();
        ledger.push(expense(10.0, "visa nacion", Status::Pending)).unwrap();
        ledger.push(expense(10.0, "MasterCard", Status::Pending)).unwrap();
        let changed = ledger
            .mark_paid(&PaySelector::Method("Visa Nación".to_string()))
            .unwrap();
        assert_eq!(changed, 2);
        let still_pending = ledger
            .entries()
            .iter()
            .filter(|e| e.movement.is_pending_expense())
            .count();
        assert_eq!(still_pending, 1);
    }

    #[test]
    fn test_mark_paid_adds_status_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        std::fs::write(&path, "Fecha,Tipo,Monto\n2025-01-01,Gasto,10\n").unwrap();
        let mut ledger = Ledger::open(&path).unwrap();
        ledger.push(expense(5.0, "", Status::Pending)).unwrap();
        assert_eq!(ledger.mark_paid(&PaySelector::Row(2)).unwrap(), 1);
        ledger.save(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Fecha,Tipo,Monto,Estado"));
        assert!(content.contains("Realizado"));
    }

    #[test]
    fn test_mark_paid_nothing_pending() {
        let mut ledger = Ledger::from_reader(SAMPLE.as_bytes()).unwrap();
        let err = ledger.mark_paid(&PaySelector::Row(1)).unwrap_err();
        assert!(matches!(err, FinanzasError::NothingToPay(_)));
    }

    #[test]
    fn test_save_refuses_spreadsheets() {
        let ledger = Ledger::empty();
        let err = ledger.save(Path::new("/tmp/book.xlsx")).unwrap_err();
        assert!(matches!(err, FinanzasError::ReadOnlySource(_)));
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_open_reads_first_worksheet() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/movimientos.xlsx");
        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.skipped(), 0);
        let entries = ledger.entries();
        assert_eq!(entries.len(), 2);

        let income = &entries[0].movement;
        assert_eq!(income.date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(income.kind, Kind::Income);
        assert_eq!(income.amount, 1500.5);
        assert_eq!(income.category, "Sueldo");

        let expense = &entries[1].movement;
        assert_eq!(expense.date, NaiveDate::from_ymd_opt(2025, 1, 11).unwrap());
        assert_eq!(expense.amount, 320.0);
        assert_eq!(expense.method, "Visa Ctes");
        assert_eq!(expense.status, Status::Realized);
    }
}
