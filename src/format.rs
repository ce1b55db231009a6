//! Numeric formatter: large f64 values to display text in the player's
//! chosen notation, plus the hh:mm:ss run clock.

use crate::state::Notation;

/// Myriad (10^4) unit ladder for the Kanji notation.
const KANJI_UNITS: &[&str] = &[
    "万", "億", "兆", "京", "垓", "𥝱", "穣", "溝", "澗", "正", "載", "極",
];

/// Format `value` in the given notation. Non-finite values render as a
/// fixed marker instead of propagating NaN text into the UI.
pub fn format(value: f64, notation: Notation) -> String {
    if value.is_nan() {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞".to_string() } else { "-∞".to_string() };
    }
    match notation {
        Notation::Scientific => scientific(value),
        Notation::Grouped => grouped(value),
        Notation::Kanji => kanji(value),
    }
}

/// `1.23e45`; integers below 1000 are floored with no exponent.
fn scientific(value: f64) -> String {
    if value < 0.0 {
        return format!("-{}", scientific(-value));
    }
    if value < 1000.0 {
        return format!("{}", value.floor() as u64);
    }
    let exponent = value.log10().floor() as i32;
    let mantissa = value / 10f64.powi(exponent);
    format!("{:.2}e{}", mantissa, exponent)
}

/// Comma-grouped digits (`1,234,567`), one decimal when the fraction is
/// visible. Above 1e15 commas stop being readable; fall back to
/// scientific.
fn grouped(value: f64) -> String {
    if value < 0.0 {
        return format!("-{}", grouped(-value));
    }
    if value >= 1e15 {
        return scientific(value);
    }
    // Round to tenths first so 12.96 carries into the integer part.
    let tenths = (value * 10.0).round() as u64;
    let int_part = tenths / 10;
    let tenth = tenths % 10;

    let digits = int_part.to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if tenth > 0 {
        format!("{}.{}", with_commas, tenth)
    } else {
        with_commas
    }
}

/// Japanese myriad units (`1.23兆`). Below 1万 plain floored digits;
/// beyond the ladder top, scientific.
fn kanji(value: f64) -> String {
    if value < 0.0 {
        return format!("-{}", kanji(-value));
    }
    if value < 1e4 {
        return format!("{}", value.floor() as u64);
    }
    let unit_index = (value.log10().floor() as i32 / 4 - 1) as usize;
    if unit_index >= KANJI_UNITS.len() {
        return scientific(value);
    }
    let exponent = (unit_index as i32 + 1) * 4;
    let mantissa = value / 10f64.powi(exponent);
    format!("{:.2}{}", mantissa, KANJI_UNITS[unit_index])
}

/// `hh:mm:ss` with zero padding; negative inputs clamp to zero.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total = total as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scientific_small_values_floored() {
        assert_eq!(format(0.0, Notation::Scientific), "0");
        assert_eq!(format(7.9, Notation::Scientific), "7");
        assert_eq!(format(999.99, Notation::Scientific), "999");
    }

    #[test]
    fn scientific_mantissa_and_exponent() {
        assert_eq!(format(1000.0, Notation::Scientific), "1.00e3");
        assert_eq!(format(1234.0, Notation::Scientific), "1.23e3");
        assert_eq!(format(5.67e20, Notation::Scientific), "5.67e20");
    }

    #[test]
    fn scientific_handles_f64_max() {
        assert_eq!(format(f64::MAX, Notation::Scientific), "1.80e308");
    }

    #[test]
    fn grouped_commas() {
        assert_eq!(format(0.0, Notation::Grouped), "0");
        assert_eq!(format(123.0, Notation::Grouped), "123");
        assert_eq!(format(1234.0, Notation::Grouped), "1,234");
        assert_eq!(format(1234567.0, Notation::Grouped), "1,234,567");
    }

    #[test]
    fn grouped_shows_visible_fraction() {
        assert_eq!(format(12.5, Notation::Grouped), "12.5");
        assert_eq!(format(12.01, Notation::Grouped), "12");
    }

    #[test]
    fn grouped_rounding_carries_over() {
        assert_eq!(format(12.94, Notation::Grouped), "12.9");
        assert_eq!(format(12.96, Notation::Grouped), "13");
        assert_eq!(format(999.96, Notation::Grouped), "1,000");
    }

    #[test]
    fn grouped_falls_back_to_scientific() {
        assert_eq!(format(1e18, Notation::Grouped), "1.00e18");
    }

    #[test]
    fn kanji_below_ladder() {
        assert_eq!(format(9999.0, Notation::Kanji), "9999");
    }

    #[test]
    fn kanji_units() {
        assert_eq!(format(12_345.0, Notation::Kanji), "1.23万");
        assert_eq!(format(1e8, Notation::Kanji), "1.00億");
        assert_eq!(format(1.5e12, Notation::Kanji), "1.50兆");
        assert_eq!(format(2e20, Notation::Kanji), "2.00垓");
    }

    #[test]
    fn kanji_far_beyond_ladder_is_scientific() {
        let s = format(1e120, Notation::Kanji);
        assert!(s.contains('e'), "got: {}", s);
    }

    #[test]
    fn non_finite_markers() {
        assert_eq!(format(f64::NAN, Notation::Scientific), "0");
        assert_eq!(format(f64::INFINITY, Notation::Grouped), "∞");
        assert_eq!(format(f64::NEG_INFINITY, Notation::Kanji), "-∞");
    }

    #[test]
    fn time_basic() {
        assert_eq!(format_time(0.0), "00:00:00");
        assert_eq!(format_time(61.0), "00:01:01");
        assert_eq!(format_time(3600.0 + 23.0 * 60.0 + 45.0), "01:23:45");
    }

    #[test]
    fn time_negative_clamped() {
        assert_eq!(format_time(-5.0), "00:00:00");
    }

    #[test]
    fn time_large_hours() {
        assert_eq!(format_time(100.0 * 3600.0), "100:00:00");
    }
}
