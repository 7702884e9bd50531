use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::convert::{convert_parts, graced_final, percentage, PartConfig, PartMarks};
use super::grade_scale::GradeScale;
use super::round2;
use super::rounding::RoundingMethod;

/// Whether a subject's grade point participates in the GPA average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubjectType {
    #[default]
    Countable,
    Uncountable,
}

impl<'de> Deserialize<'de> for SubjectType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("uncountable") => SubjectType::Uncountable,
            _ => SubjectType::Countable,
        })
    }
}

/// Grading setup for one subject paper. Papers that belong to a combined
/// (merged multi-paper) subject share a `combined_group_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectConfig {
    pub subject_id: String,
    pub subject_name: String,
    pub parts: Vec<PartConfig>,
    pub rounding_method: RoundingMethod,
    pub grace_mark: f64,
    pub is_combined: bool,
    pub combined_group_id: Option<String>,
    pub overall_required_percent: f64,
    pub subject_type: SubjectType,
    pub is_optional: bool,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            subject_id: String::new(),
            subject_name: String::new(),
            parts: Vec::new(),
            rounding_method: RoundingMethod::AtActual,
            grace_mark: 0.0,
            is_combined: false,
            combined_group_id: None,
            overall_required_percent: 0.0,
            subject_type: SubjectType::Countable,
            is_optional: false,
        }
    }
}

/// Graded figures for one subject paper, or for the merged totals of a
/// combined subject.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMarks {
    pub subject_id: String,
    pub subject_name: String,
    pub converted_mark: f64,
    pub converted_max: f64,
    pub grace_mark: f64,
    pub final_mark: f64,
    pub percentage: f64,
    pub grade: String,
    pub grade_point: f64,
    pub pass_status: bool,
    pub is_uncountable: bool,
    pub is_optional: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedSubject {
    pub combined_id: String,
    #[serde(flatten)]
    pub summary: SubjectMarks,
    pub papers: Vec<SubjectMarks>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubjectResult {
    Single(SubjectMarks),
    Combined(CombinedSubject),
}

impl SubjectResult {
    pub fn marks(&self) -> &SubjectMarks {
        match self {
            SubjectResult::Single(m) => m,
            SubjectResult::Combined(c) => &c.summary,
        }
    }
}

pub fn grade_single(config: &SubjectConfig, marks: &PartMarks, scale: &GradeScale) -> SubjectMarks {
    let conv = convert_parts(marks, &config.parts, config.rounding_method);
    let final_mark = graced_final(conv, config.grace_mark, config.rounding_method);
    let pct = percentage(final_mark, conv.converted_max);
    let grading = scale.grade_of(pct);
    SubjectMarks {
        subject_id: config.subject_id.clone(),
        subject_name: config.subject_name.clone(),
        converted_mark: round2(conv.converted),
        converted_max: conv.converted_max,
        grace_mark: config.grace_mark,
        final_mark: round2(final_mark),
        percentage: round2(pct),
        pass_status: grading.grade != "F",
        grade: grading.grade,
        grade_point: grading.grade_point,
        is_uncountable: config.subject_type == SubjectType::Uncountable,
        is_optional: config.is_optional,
    }
}

/// Grades a combined group of N papers as one logical subject. Two gates must
/// both hold for a pass:
/// - the grade from the combined percentage (sum of graced finals over sum of
///   converted maxima) is not F and meets `overall_required_percent`;
/// - for every part code, the obtained marks summed across papers reach the
///   summed pass marks for that code.
pub fn grade_combined(
    group_id: &str,
    papers: &[(&SubjectConfig, &PartMarks)],
    scale: &GradeScale,
) -> CombinedSubject {
    let graded: Vec<SubjectMarks> = papers
        .iter()
        .map(|(config, marks)| grade_single(config, marks, scale))
        .collect();

    let combined_final: f64 = graded.iter().map(|p| p.final_mark).sum();
    let combined_max: f64 = graded.iter().map(|p| p.converted_max).sum();
    let combined_converted: f64 = graded.iter().map(|p| p.converted_mark).sum();
    let combined_grace: f64 = graded.iter().map(|p| p.grace_mark).sum();
    let pct = percentage(combined_final, combined_max);
    let grading = scale.grade_of(pct);

    // Per-code aggregate floor across all papers.
    let mut by_code: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for (config, marks) in papers {
        for part in &config.parts {
            let entry = by_code.entry(part.part_code.as_str()).or_insert((0.0, 0.0));
            entry.0 += marks.get(&part.part_code).copied().unwrap_or(0.0);
            entry.1 += part.pass_mark;
        }
    }
    let code_floor_ok = by_code
        .values()
        .all(|(obtained, required)| *required <= 0.0 || obtained >= required);

    let required_pct = papers
        .iter()
        .map(|(config, _)| config.overall_required_percent)
        .fold(0.0, f64::max);
    let pct_ok = required_pct <= 0.0 || pct >= required_pct;

    let pass = grading.grade != "F" && code_floor_ok && pct_ok;
    let (grade, grade_point) = if pass {
        (grading.grade, grading.grade_point)
    } else {
        ("F".to_string(), 0.0)
    };

    let subject_id = papers
        .iter()
        .map(|(config, _)| config.subject_id.as_str())
        .collect::<Vec<_>>()
        .join("_");
    let subject_name = papers
        .iter()
        .map(|(config, _)| config.subject_name.as_str())
        .collect::<Vec<_>>()
        .join(" + ");

    CombinedSubject {
        combined_id: group_id.to_string(),
        summary: SubjectMarks {
            subject_id,
            subject_name,
            converted_mark: round2(combined_converted),
            converted_max: combined_max,
            grace_mark: combined_grace,
            final_mark: round2(combined_final),
            percentage: round2(pct),
            grade,
            grade_point,
            pass_status: pass,
            is_uncountable: graded.iter().all(|p| p.is_uncountable),
            is_optional: graded.iter().all(|p| p.is_optional),
        },
        papers: graded,
    }
}
