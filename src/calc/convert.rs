use serde::Deserialize;
use std::collections::BTreeMap;

use super::rounding::RoundingMethod;

/// Obtained mark per part code ("CQ", "MCQ", "Practical", ...) for one
/// student and subject paper. Missing parts count as 0.
pub type PartMarks = BTreeMap<String, f64>;

/// Conversion setup for one exam part within a subject. `rounding_method`
/// overrides the subject-level policy when present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartConfig {
    pub part_code: String,
    pub total_mark: f64,
    pub pass_mark: f64,
    pub conversion_percent: f64,
    pub rounding_method: Option<RoundingMethod>,
}

impl Default for PartConfig {
    fn default() -> Self {
        Self {
            part_code: String::new(),
            total_mark: 100.0,
            pass_mark: 0.0,
            conversion_percent: 100.0,
            rounding_method: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertedMarks {
    pub converted: f64,
    pub converted_max: f64,
}

/// Scales every obtained part mark by its conversion percentage. Rounding
/// applies per part before summation; for every method except `At Actual`
/// this yields different totals than rounding the sum once.
pub fn convert_parts(
    marks: &PartMarks,
    parts: &[PartConfig],
    method: RoundingMethod,
) -> ConvertedMarks {
    let mut converted = 0.0;
    let mut converted_max = 0.0;
    for part in parts {
        let obtained = marks.get(&part.part_code).copied().unwrap_or(0.0);
        let part_method = part.rounding_method.unwrap_or(method);
        converted += part_method.apply(obtained * part.conversion_percent / 100.0);
        converted_max += part.total_mark * part.conversion_percent / 100.0;
    }
    ConvertedMarks {
        converted,
        converted_max,
    }
}

/// Final mark = rounding(converted + grace), clamped to the attainable
/// ceiling (converted max + grace) and floored at zero.
pub fn graced_final(conv: ConvertedMarks, grace_mark: f64, method: RoundingMethod) -> f64 {
    let raw = method.apply(conv.converted + grace_mark);
    raw.min(conv.converted_max + grace_mark).max(0.0)
}

pub fn percentage(final_mark: f64, converted_max: f64) -> f64 {
    if converted_max > 0.0 {
        final_mark / converted_max * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_half_parts() -> Vec<PartConfig> {
        vec![
            PartConfig {
                part_code: "CQ".to_string(),
                total_mark: 100.0,
                conversion_percent: 50.0,
                ..PartConfig::default()
            },
            PartConfig {
                part_code: "MCQ".to_string(),
                total_mark: 100.0,
                conversion_percent: 50.0,
                ..PartConfig::default()
            },
        ]
    }

    fn marks(pairs: &[(&str, f64)]) -> PartMarks {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn rounds_each_part_before_summation() {
        let parts = two_half_parts();
        let m = marks(&[("CQ", 33.0), ("MCQ", 33.0)]);
        // Per part: ceil(16.5) = 17, summed = 34. Rounding the sum once
        // would give ceil(33.0) = 33.
        let conv = convert_parts(&m, &parts, RoundingMethod::AlwaysUp);
        assert_eq!(conv.converted, 34.0);
        assert_eq!(conv.converted_max, 100.0);
    }

    #[test]
    fn at_actual_keeps_fractions() {
        let parts = two_half_parts();
        let m = marks(&[("CQ", 33.0), ("MCQ", 33.0)]);
        let conv = convert_parts(&m, &parts, RoundingMethod::AtActual);
        assert_eq!(conv.converted, 33.0);
    }

    #[test]
    fn missing_part_marks_default_to_zero() {
        let parts = two_half_parts();
        let conv = convert_parts(&marks(&[("CQ", 40.0)]), &parts, RoundingMethod::AtActual);
        assert_eq!(conv.converted, 20.0);
    }

    #[test]
    fn per_part_override_beats_subject_method() {
        let mut parts = two_half_parts();
        parts[0].rounding_method = Some(RoundingMethod::AlwaysDown);
        let m = marks(&[("CQ", 33.0), ("MCQ", 33.0)]);
        // CQ floors to 16, MCQ keeps 16.5 under the subject-level At Actual.
        let conv = convert_parts(&m, &parts, RoundingMethod::AtActual);
        assert_eq!(conv.converted, 32.5);
    }

    #[test]
    fn final_mark_rerounds_and_clamps() {
        let conv = ConvertedMarks {
            converted: 33.4,
            converted_max: 34.0,
        };
        assert_eq!(graced_final(conv, 0.0, RoundingMethod::AlwaysUp), 34.0);
        // Grace pushes past the ceiling; clamp to max + grace.
        let conv = ConvertedMarks {
            converted: 34.0,
            converted_max: 34.0,
        };
        assert_eq!(graced_final(conv, 2.0, RoundingMethod::AlwaysUp), 36.0);
        let conv = ConvertedMarks {
            converted: 35.9,
            converted_max: 34.0,
        };
        assert_eq!(graced_final(conv, 0.0, RoundingMethod::AtActual), 34.0);
    }

    #[test]
    fn percentage_handles_zero_max() {
        assert_eq!(percentage(50.0, 0.0), 0.0);
        assert_eq!(percentage(50.0, 200.0), 25.0);
    }
}
