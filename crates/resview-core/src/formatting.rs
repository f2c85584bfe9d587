//! Display formatting applied to every category view.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_NUMERIC_PRECISION, DIGIT_GROUP_SEPARATOR, MAX_NUMERIC_PRECISION};

/// Formatting options shared by all categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingOptions {
    pub number_formatting_enabled: bool,
    pub numeric_precision: u32,
    pub show_network_names: bool,
    pub color_network_names: bool,
    pub color_result_suffixes: bool,
    pub color_number_separators: bool,
    pub color_measurement_units: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            number_formatting_enabled: true,
            numeric_precision: DEFAULT_NUMERIC_PRECISION,
            show_network_names: true,
            color_network_names: true,
            color_result_suffixes: true,
            color_number_separators: true,
            color_measurement_units: true,
        }
    }
}

impl FormattingOptions {
    /// Copy with `numeric_precision` clamped to the supported range.
    pub fn with_precision(self, precision: u32) -> Self {
        Self {
            numeric_precision: precision.min(MAX_NUMERIC_PRECISION),
            ..self
        }
    }

    pub fn with_number_formatting(self, enabled: bool) -> Self {
        Self {
            number_formatting_enabled: enabled,
            ..self
        }
    }

    pub fn with_network_names(self, show: bool) -> Self {
        Self {
            show_network_names: show,
            ..self
        }
    }

    pub fn can_increase_precision(&self) -> bool {
        self.numeric_precision < MAX_NUMERIC_PRECISION
    }

    pub fn can_decrease_precision(&self) -> bool {
        self.numeric_precision > 0
    }
}

/// Format a numeric value (and optional unit) according to `opts`.
pub fn format_quantity(value: f64, unit: Option<&str>, opts: &FormattingOptions) -> String {
    let number = if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if !opts.number_formatting_enabled {
        value.to_string()
    } else {
        format_number(value, opts.numeric_precision as usize)
    };
    match unit {
        Some(unit) if !unit.is_empty() => format!("{number} {unit}"),
        _ => number,
    }
}

fn format_number(value: f64, precision: usize) -> String {
    let magnitude = value.abs();
    let tiny = magnitude != 0.0 && magnitude < 10f64.powi(-(precision as i32));
    if tiny || magnitude >= 1e15 {
        let text = format!("{:.*e}", precision, value);
        return match text.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{}", trim_fraction(mantissa), exponent),
            None => text,
        };
    }

    let text = format!("{:.*}", precision, value);
    let text = trim_fraction(&text);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    // "-0" after rounding away the fraction
    let sign = if int_part == "0" && frac_part.is_none() { "" } else { sign };

    let mut out = String::with_capacity(text.len() + int_part.len() / 3 * 3);
    out.push_str(sign);
    out.push_str(&group_digits(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn group_digits(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3 * DIGIT_GROUP_SEPARATOR.len_utf8());
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(DIGIT_GROUP_SEPARATOR);
        }
        out.push(c);
    }
    out
}

/// Module path as displayed: without the leading network name when
/// network names are hidden.
pub fn module_display<'a>(module: &'a str, opts: &FormattingOptions) -> &'a str {
    if opts.show_network_names {
        return module;
    }
    match module.split_once('.') {
        Some((_, rest)) => rest,
        None => module,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEP: char = DIGIT_GROUP_SEPARATOR;

    #[test]
    fn groups_thousands_and_trims_zeros() {
        let opts = FormattingOptions::default();
        assert_eq!(
            format_quantity(1234567.891, None, &opts),
            format!("1{SEP}234{SEP}567.891")
        );
        assert_eq!(format_quantity(-1234.0, None, &opts), format!("-1{SEP}234"));
        assert_eq!(format_quantity(12.0, Some("s"), &opts), "12 s");
    }

    #[test]
    fn precision_rounds() {
        let opts = FormattingOptions::default().with_precision(2);
        assert_eq!(format_quantity(3.14159, None, &opts), "3.14");
        assert_eq!(format_quantity(-0.001, None, &opts), "-1e-3");
    }

    #[test]
    fn disabled_formatting_prints_plain_value() {
        let opts = FormattingOptions::default().with_number_formatting(false);
        assert_eq!(format_quantity(1234567.891, None, &opts), "1234567.891");
    }

    #[test]
    fn tiny_and_huge_values_use_exponent() {
        let opts = FormattingOptions::default();
        assert_eq!(format_quantity(0.0000001, None, &opts), "1e-7");
        assert_eq!(format_quantity(2.5e20, None, &opts), "2.5e20");
        assert_eq!(format_quantity(0.0, None, &opts), "0");
    }

    #[test]
    fn non_finite_values() {
        let opts = FormattingOptions::default();
        assert_eq!(format_quantity(f64::NAN, None, &opts), "nan");
        assert_eq!(format_quantity(f64::NEG_INFINITY, None, &opts), "-inf");
    }

    #[test]
    fn non_finite_values_ignore_the_formatting_switch() {
        let plain = FormattingOptions::default().with_number_formatting(false);
        assert_eq!(format_quantity(f64::NAN, None, &plain), "nan");
        assert_eq!(format_quantity(f64::INFINITY, Some("s"), &plain), "inf s");
        assert_eq!(format_quantity(f64::NEG_INFINITY, None, &plain), "-inf");
    }

    #[test]
    fn precision_is_clamped() {
        let opts = FormattingOptions::default().with_precision(99);
        assert_eq!(opts.numeric_precision, MAX_NUMERIC_PRECISION);
        assert!(!opts.can_increase_precision());
        assert!(!FormattingOptions::default().with_precision(0).can_decrease_precision());
    }

    #[test]
    fn hidden_network_names_drop_first_segment() {
        let opts = FormattingOptions::default().with_network_names(false);
        assert_eq!(module_display("Net.host[0].app", &opts), "host[0].app");
        assert_eq!(module_display("Net", &opts), "Net");
        assert_eq!(
            module_display("Net.host", &FormattingOptions::default()),
            "Net.host"
        );
    }
}
