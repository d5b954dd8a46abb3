/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative && abs >= 0.005 {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Compact "$Xk" / "$X.XM" for chart labels.
pub fn money_compact(val: f64) -> String {
    let abs = val.abs();
    let sign = if val < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        let m = abs / 1_000_000.0;
        if m == m.floor() {
            format!("{sign}${}M", m as u64)
        } else {
            format!("{sign}${:.1}M", m)
        }
    } else if abs >= 1000.0 {
        let k = abs / 1000.0;
        if k == k.floor() {
            format!("{sign}${}k", k as u64)
        } else {
            format!("{sign}${:.1}k", k)
        }
    } else {
        format!("{sign}${}", abs.round() as u64)
    }
}

/// Horizontal bar for a percentage share, `width` cells at 100%.
pub fn share_bar(pct: f64, width: usize) -> String {
    let cells = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    "\u{2588}".repeat(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(-0.001), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
        assert_eq!(money(42.10), "$42.10");
    }

    #[test]
    fn test_money_compact() {
        assert_eq!(money_compact(950.0), "$950");
        assert_eq!(money_compact(2000.0), "$2k");
        assert_eq!(money_compact(2500.0), "$2.5k");
        assert_eq!(money_compact(1_500_000.0), "$1.5M");
        assert_eq!(money_compact(-3000.0), "-$3k");
    }

    #[test]
    fn test_share_bar() {
        assert_eq!(share_bar(100.0, 10).chars().count(), 10);
        assert_eq!(share_bar(50.0, 10).chars().count(), 5);
        assert_eq!(share_bar(0.0, 10), "");
        assert_eq!(share_bar(250.0, 4).chars().count(), 4);
    }
}
