use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);
pub const PENDING_STYLE: Style = Style::new().fg(Color::Rgb(240, 180, 60));

/// Colored amount span: green when non-negative, red otherwise.
/// Shows the absolute value; color conveys the sign.
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount.abs()), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Shorten a label to `max` characters with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max <= 1 {
        s.chars().take(max).collect()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('\u{2026}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Comida", 10), "Comida");
        assert_eq!(truncate("Transporte", 6), "Trans\u{2026}");
        assert_eq!(truncate("Categoría", 4), "Cat\u{2026}");
    }

    #[test]
    fn test_wrap_text_counts_lines() {
        let (wrapped, lines) = wrap_text("cuota colegio marzo abril", 10);
        assert_eq!(lines, wrapped.lines().count() as u16);
        assert!(lines >= 3);
        assert_eq!(wrap_text("x", 0).1, 1);
    }
}
