//! Number formatting for the text report.

/// Brazilian-real amount with comma thousands and two decimals: `R$ 1,234.56`.
pub fn format_brl(value: f64) -> String {
    format!("R$ {}", group_thousands(value, 2))
}

/// Percentage with two decimals: `12.34%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// Optional percentage; `n/a` when there was nothing to average.
pub fn format_rate(value: Option<f64>) -> String {
    value.map(format_percent).unwrap_or_else(|| "n/a".to_string())
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // Only show a sign when the rounded value is non-zero.
    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
