use colored::Colorize;

use super::{AddArgs, Context};
use crate::error::{FinanzasError, Result};
use crate::fmt::money;
use crate::ledger::append_movement;
use crate::models::{Kind, Movement, Status};
use crate::parsing::{fold, parse_amount, parse_date};

/// Pick the configured spelling of `value`, or the first option when absent.
/// Values outside the list are kept as typed.
fn pick_option(value: Option<&str>, options: &[String], what: &str) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => match options.iter().find(|o| fold(o) == fold(v)) {
            Some(known) => known.clone(),
            None => {
                eprintln!(
                    "{}",
                    format!("Note: '{v}' is not a configured {what}; saving it anyway.").yellow()
                );
                v.to_string()
            }
        },
        None => options.first().cloned().unwrap_or_default(),
    }
}

/// Validate the form fields into a movement.
pub fn build_movement(args: &AddArgs, ctx: &Context) -> Result<Movement> {
    let kind = Kind::from(args.kind);

    let amount = parse_amount(&args.amount)
        .ok_or_else(|| FinanzasError::InvalidAmount(args.amount.clone()))?;
    if amount < 0.0 {
        return Err(FinanzasError::InvalidAmount(args.amount.clone()));
    }

    let date = match args.date.as_deref() {
        Some(raw) => parse_date(raw).ok_or_else(|| FinanzasError::InvalidDate(raw.to_string()))?,
        None => chrono::Local::now().date_naive(),
    };

    if args.pending && kind == Kind::Income {
        return Err(FinanzasError::Other(
            "only expenses can be recorded as pending".to_string(),
        ));
    }

    Ok(Movement {
        date,
        kind,
        status: if args.pending {
            Status::Pending
        } else {
            Status::Realized
        },
        category: pick_option(args.category.as_deref(), ctx.settings.categories(kind), "category"),
        amount,
        method: pick_option(args.method.as_deref(), ctx.settings.methods(kind), "method"),
        description: args.description.clone().unwrap_or_default().trim().to_string(),
    })
}

pub fn run(ctx: &Context, args: &AddArgs) -> Result<()> {
    let path = ctx.source.writable_path()?;
    let movement = build_movement(args, ctx)?;
    let row = append_movement(path, movement.clone())?;

    let label = match movement.kind {
        Kind::Income => movement.kind.label().green().bold(),
        Kind::Expense => movement.kind.label().red().bold(),
    };
    let pending = if movement.status == Status::Pending {
        format!(" [{}]", movement.status.label().yellow())
    } else {
        String::new()
    };
    println!(
        "Saved {label} {} {} / {} on {}{pending} (row {row})",
        money(movement.amount),
        movement.category_or_default(),
        movement.method_or_default(),
        movement.date.format("%Y-%m-%d"),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::KindArg;
    use crate::settings::Settings;
    use crate::source::Source;

    fn ctx() -> Context {
        Context {
            settings: Settings::default(),
            source: Source::Local("/tmp/unused.csv".into()),
        }
    }

    fn args(kind: KindArg, amount: &str) -> AddArgs {
        AddArgs {
            kind,
            amount: amount.to_string(),
            date: Some("2025-03-01".to_string()),
            category: None,
            method: None,
            pending: false,
            description: None,
        }
    }

    #[test]
    fn test_defaults_come_from_settings() {
        let m = build_movement(&args(KindArg::Ingreso, "850.000"), &ctx()).unwrap();
        assert_eq!(m.kind, Kind::Income);
        assert_eq!(m.amount, 850_000.0);
        assert_eq!(m.category, "Sueldo");
        assert_eq!(m.method, "Cuenta Bancaria");
        assert_eq!(m.status, Status::Realized);
    }

    #[test]
    fn test_known_option_uses_configured_spelling() {
        let mut a = args(KindArg::Gasto, "100");
        a.method = Some("visa nacion".to_string());
        a.category = Some("Mascotas".to_string());
        let m = build_movement(&a, &ctx()).unwrap();
        assert_eq!(m.method, "Visa Nación");
        assert_eq!(m.category, "Mascotas");
    }

    #[test]
    fn test_rejects_negative_and_garbage_amounts() {
        assert!(matches!(
            build_movement(&args(KindArg::Gasto, "-5"), &ctx()),
            Err(FinanzasError::InvalidAmount(_))
        ));
        assert!(matches!(
            build_movement(&args(KindArg::Gasto, "mucho"), &ctx()),
            Err(FinanzasError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_rejects_bad_date() {
        let mut a = args(KindArg::Gasto, "10");
        a.date = Some("31/02/2025".to_string());
        assert!(matches!(
            build_movement(&a, &ctx()),
            Err(FinanzasError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_pending_income_rejected() {
        let mut a = args(KindArg::Ingreso, "10");
        a.pending = true;
        assert!(build_movement(&a, &ctx()).is_err());
    }

    #[test]
    fn test_pending_expense() {
        let mut a = args(KindArg::Gasto, "10");
        a.pending = true;
        let m = build_movement(&a, &ctx()).unwrap();
        assert!(m.is_pending_expense());
    }
}
