//! Integer euro-cent amounts. Storage is always `i64` cents; the euro string
//! form is presentation-only and round-trips exactly for two-decimal values.

/// Parse a statement amount like "1.234,56" into cents.
///
/// Statement exports write amounts with `.` as the grouping separator and `,`
/// as the decimal separator, always with two fractional digits. Stripping both
/// separators therefore yields the cent count directly. This is a precondition
/// of the statement formats, not a general decimal parser.
pub fn parse_statement_cents(raw: &str) -> Option<i64> {
    let s = raw.trim().trim_end_matches('€').trim();
    if s.is_empty() {
        return None;
    }
    let (s, negative) = match s.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (s, false),
    };
    let digits: String = s.chars().filter(|c| *c != '.' && *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let cents: i64 = digits.parse().ok()?;
    Some(if negative { -cents } else { cents })
}

/// Format cents as a euro amount with thousands separators: 1.234,56 €
pub fn euros(cents: i64) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let int_part = (abs / 100).to_string();
    let dec_part = abs % 100;

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped},{dec_part:02} €")
    } else {
        format!("{grouped},{dec_part:02} €")
    }
}
