//! Fixed-point rendering for averages, GPA and percentages.
//!
//! Values are rounded half-up on their shortest round-trip decimal form, so
//! `8.125` renders as `8.13` and `1.005` as `1.01`, matching how the numbers
//! read to a person rather than their binary expansion.

/// Render `value` with exactly `places` decimals.
pub fn fixed(value: f64, places: usize) -> String {
    if !value.is_finite() {
        return format!("{value:.places$}");
    }

    let negative = value < 0.0;
    let repr = format!("{}", value.abs());
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let mut digits: Vec<u8> = int_part.bytes().collect();
    let frac = frac_part.as_bytes();
    digits.extend((0..places).map(|i| frac.get(i).copied().unwrap_or(b'0')));

    if frac.get(places).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let split = digits.len() - places;
    let mut output = String::with_capacity(digits.len() + 2);
    if negative && digits.iter().any(|d| *d != b'0') {
        output.push('-');
    }
    output.extend(digits[..split].iter().map(|d| *d as char));
    if places > 0 {
        output.push('.');
        output.extend(digits[split..].iter().map(|d| *d as char));
    }
    output
}

/// Percentage text with one decimal and a trailing `%`.
pub fn percent(value: f64) -> String {
    format!("{}%", fixed(value, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_requested_places() {
        assert_eq!(fixed(8.5, 2), "8.50");
        assert_eq!(fixed(0.0, 2), "0.00");
        assert_eq!(fixed(50.0, 1), "50.0");
        assert_eq!(fixed(10.0, 2), "10.00");
    }

    #[test]
    fn rounds_half_up_on_decimal_form() {
        assert_eq!(fixed(8.125, 2), "8.13");
        assert_eq!(fixed(1.005, 2), "1.01");
        assert_eq!(fixed(7.85, 2), "7.85");
        assert_eq!(fixed(8.124, 2), "8.12");
    }

    #[test]
    fn carries_into_integer_part() {
        assert_eq!(fixed(9.999, 2), "10.00");
        assert_eq!(fixed(99.96, 1), "100.0");
        assert_eq!(fixed(0.995, 2), "1.00");
    }

    #[test]
    fn repeating_fractions() {
        assert_eq!(fixed(100.0 / 3.0, 1), "33.3");
        assert_eq!(fixed(200.0 / 3.0, 1), "66.7");
        assert_eq!(fixed(20.0 / 3.0, 2), "6.67");
    }

    #[test]
    fn zero_places_drops_the_point() {
        assert_eq!(fixed(3.0, 0), "3");
        assert_eq!(fixed(2.5, 0), "3");
    }

    #[test]
    fn negative_values_keep_sign() {
        assert_eq!(fixed(-1.25, 1), "-1.3");
        assert_eq!(fixed(-0.001, 2), "0.00");
    }

    #[test]
    fn percent_appends_sign() {
        assert_eq!(percent(50.0), "50.0%");
        assert_eq!(percent(0.0), "0.0%");
    }
}
