// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

// Locale-aware cell parsing for the German numeric convention: comma as
// decimal separator, dot or space as thousands grouping. Anything that does
// not parse becomes missing, never an error.

pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    let lowered = s.to_lowercase();
    if lowered == "nan" || lowered == "none" {
        return None;
    }
    let cleaned = s
        .replace('\u{a0}', " ")
        .replace(['%', '‰'], "");
    let cleaned = cleaned
        .trim()
        .replace(' ', "")
        .replace('.', "")
        .replace(',', ".");
    cleaned.parse::<f64>().ok()
}

// Sheets mix 0-1 and 0-100 percentage conventions: |v| <= 1.0 is taken as a
// fraction and rescaled x100. Known precision risk, kept for compatibility:
// a genuine 0,8 (meaning 0.8%) is indistinguishable from the fraction 0.8
// and comes out as 80.
pub fn as_percent_0_100(raw: Option<&str>) -> Option<f64> {
    let value = parse_number(raw)?;
    if value.abs() <= 1.0 {
        Some(value * 100.0)
    } else {
        Some(value)
    }
}

// Overlay series are displayed at two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_german_grouping_and_decimal() {
        assert_eq!(parse_number(Some("1.234,56")), Some(1234.56));
        assert_eq!(parse_number(Some("1 234,5")), Some(1234.5));
        assert_eq!(parse_number(Some("0,5")), Some(0.5));
        assert_eq!(parse_number(Some("-3,2")), Some(-3.2));
    }

    #[test]
    fn strips_percent_signs() {
        assert_eq!(parse_number(Some("12%")), Some(12.0));
        assert_eq!(parse_number(Some("8,5 ‰")), Some(8.5));
    }

    #[test]
    fn missing_tokens_become_missing() {
        assert_eq!(parse_number(None), None);
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("   ")), None);
        assert_eq!(parse_number(Some("nan")), None);
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(Some("None")), None);
    }

    #[test]
    fn garbage_becomes_missing() {
        assert_eq!(parse_number(Some("k.A.")), None);
        assert_eq!(parse_number(Some("12,3,4")), None);
    }

    #[test]
    fn non_breaking_spaces_are_grouping() {
        assert_eq!(parse_number(Some("1\u{a0}234,5")), Some(1234.5));
    }

    #[test]
    fn percent_rescales_fractions_only() {
        assert_eq!(as_percent_0_100(Some("0,5")), Some(50.0));
        assert_eq!(as_percent_0_100(Some("75")), Some(75.0));
        assert_eq!(as_percent_0_100(Some("-0,25")), Some(-25.0));
        assert_eq!(as_percent_0_100(Some("1")), Some(100.0));
        assert_eq!(as_percent_0_100(Some("1,5")), Some(1.5));
        assert_eq!(as_percent_0_100(None), None);
        assert_eq!(as_percent_0_100(Some("nan")), None);
    }

    #[test]
    fn round2_trims_to_display_precision() {
        assert_eq!(round2(7.123_456), 7.12);
        assert_eq!(round2(-3.256), -3.26);
        assert_eq!(round2(0.600_000_000_000_000_5), 0.6);
    }

    proptest! {
        #[test]
        fn comma_formatted_floats_round_trip(v in -1_000_000.0f64..1_000_000.0) {
            let formatted = format!("{v:.2}").replace('.', ",");
            let parsed = parse_number(Some(&formatted)).unwrap();
            let expected = format!("{v:.2}").parse::<f64>().unwrap();
            prop_assert!((parsed - expected).abs() < 1e-9);
        }

        #[test]
        fn values_above_one_pass_through_percent_normalisation(v in 1.01f64..10_000.0) {
            let formatted = format!("{v:.3}").replace('.', ",");
            let normalised = as_percent_0_100(Some(&formatted)).unwrap();
            let expected = format!("{v:.3}").parse::<f64>().unwrap();
            prop_assert!((normalised - expected).abs() < 1e-9);
        }
    }
}
