/// Formats a money amount with `,` thousands separators and two decimals.
///
/// ```text
/// format_currency(120250.0, "LKR") == "LKR 120,250.00"
/// format_currency(-1234.5, "") == "-1,234.50"
/// ```
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (i, ch) in integer_part.chars().enumerate() {
        if i > 0 && (integer_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.004 rounds to 0.00 and should not keep its sign
    let sign = if amount < 0.0 && formatted != "0.00" { "-" } else { "" };

    if symbol.is_empty() {
        format!("{sign}{grouped}.{decimal_part}")
    } else {
        format!("{symbol} {sign}{grouped}.{decimal_part}")
    }
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0, "LKR"), "LKR 0.00");
        assert_eq!(format_currency(999.999, "LKR"), "LKR 1,000.00");
        assert_eq!(format_currency(120250.0, "LKR"), "LKR 120,250.00");
        assert_eq!(format_currency(1234567.891, "Rs."), "Rs. 1,234,567.89");
        assert_eq!(format_currency(-1234.5, ""), "-1,234.50");
        assert_eq!(format_currency(-0.001, ""), "0.00");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(12.5), "12.50%");
        assert_eq!(format_percentage(-3.14159), "-3.14%");
    }
}
