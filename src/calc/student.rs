use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::convert::PartMarks;
use super::grade_scale::{GradeBand, GradeScale};
use super::subject::{grade_combined, grade_single, SubjectConfig, SubjectResult};
use super::{round2, ResultStatus};

/// Raw marks for one student across all subject papers, keyed by subject id
/// and part code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentMarks {
    pub student_id: String,
    pub student_name: String,
    pub roll: i64,
    pub optional_subject_id: Option<String>,
    pub marks: BTreeMap<String, PartMarks>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultPayload {
    pub exam_name: String,
    pub has_combined: bool,
    pub mark_configs: Vec<SubjectConfig>,
    pub grade_rules: Vec<GradeBand>,
    pub students: Vec<StudentMarks>,
}

impl Default for ResultPayload {
    fn default() -> Self {
        Self {
            exam_name: String::new(),
            has_combined: false,
            mark_configs: Vec::new(),
            grade_rules: Vec::new(),
            students: Vec::new(),
        }
    }
}

/// Everything computed for one student. Created fresh per request and never
/// mutated after it is returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    pub student_id: String,
    pub student_name: String,
    pub roll: i64,
    pub subjects: Vec<SubjectResult>,
    pub gpa_without_optional: f64,
    pub gpa_with_optional: f64,
    pub total_mark_without_optional: f64,
    pub total_mark_with_optional: f64,
    pub letter_grade: String,
    pub result_status: ResultStatus,
    pub failed_subject_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultOutcome {
    pub exam_name: String,
    pub has_combined: bool,
    pub results: Vec<StudentResult>,
    pub highest_marks: BTreeMap<String, f64>,
    pub total_students: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Grades every student of the cohort. A missing grade scale is a defined
/// outcome carried in `error`, not a failure; a failed subject never aborts
/// the rest of the batch.
pub fn compute_result(payload: &ResultPayload) -> ResultOutcome {
    let scale = GradeScale::new(payload.grade_rules.clone());
    if scale.is_empty() {
        return ResultOutcome {
            exam_name: payload.exam_name.clone(),
            has_combined: payload.has_combined,
            results: Vec::new(),
            highest_marks: BTreeMap::new(),
            total_students: 0,
            error: Some("Grade rules missing".to_string()),
        };
    }

    let mut results = Vec::with_capacity(payload.students.len());
    let mut highest_marks: BTreeMap<String, f64> = BTreeMap::new();
    for student in &payload.students {
        let result = aggregate_student(student, &payload.mark_configs, &scale);
        for subject in &result.subjects {
            record_highest(&mut highest_marks, subject);
        }
        results.push(result);
    }

    ResultOutcome {
        exam_name: payload.exam_name.clone(),
        has_combined: payload.has_combined,
        total_students: results.len(),
        results,
        highest_marks,
        error: None,
    }
}

fn record_highest(highest: &mut BTreeMap<String, f64>, subject: &SubjectResult) {
    let summary = subject.marks();
    let entry = highest.entry(summary.subject_id.clone()).or_insert(0.0);
    if summary.final_mark > *entry {
        *entry = summary.final_mark;
    }
    if let SubjectResult::Combined(combined) = subject {
        for paper in &combined.papers {
            let entry = highest.entry(paper.subject_id.clone()).or_insert(0.0);
            if paper.final_mark > *entry {
                *entry = paper.final_mark;
            }
        }
    }
}

/// Combines a student's subject results into GPA, totals and pass/fail.
/// Optional (4th) subject bonus: only when the optional grade is not F; the
/// first 40% of the optional subject's max mark is free, only the excess
/// counts toward the total, and grade points above 2.00 count toward the GPA.
fn aggregate_student(
    student: &StudentMarks,
    configs: &[SubjectConfig],
    scale: &GradeScale,
) -> StudentResult {
    let empty = PartMarks::new();
    let subjects: Vec<SubjectResult> = group_configs(configs)
        .into_iter()
        .map(|group| match group {
            ConfigGroup::Single(config) => {
                let marks = student.marks.get(&config.subject_id).unwrap_or(&empty);
                let mut graded = grade_single(config, marks, scale);
                graded.is_optional = is_optional(config, student);
                SubjectResult::Single(graded)
            }
            ConfigGroup::Combined(group_id, papers) => {
                let pairs: Vec<(&SubjectConfig, &PartMarks)> = papers
                    .iter()
                    .map(|config| {
                        (
                            *config,
                            student.marks.get(&config.subject_id).unwrap_or(&empty),
                        )
                    })
                    .collect();
                let mut graded = grade_combined(group_id, &pairs, scale);
                // The per-student designation may name the group or any of
                // its papers; either marks the whole group optional.
                graded.summary.is_optional = graded.summary.is_optional
                    || student.optional_subject_id.as_deref().is_some_and(|id| {
                        id == group_id || papers.iter().any(|c| c.subject_id == id)
                    });
                SubjectResult::Combined(graded)
            }
        })
        .collect();

    let mut grade_point_sum = 0.0;
    let mut countable = 0usize;
    let mut failed_subject_count = 0usize;
    let mut total_without = 0.0;
    let mut optional_bonus: Option<(f64, f64)> = None; // (grade point, mark)

    for subject in &subjects {
        let marks = subject.marks();
        if marks.is_optional {
            if optional_bonus.is_none() && marks.grade != "F" {
                let bonus_gp = (marks.grade_point - 2.0).max(0.0);
                let bonus_mark = (marks.final_mark - 0.40 * marks.converted_max).max(0.0);
                optional_bonus = Some((bonus_gp, bonus_mark));
            }
            continue;
        }
        if marks.is_uncountable {
            // Reported for display only; cannot fail the student.
            continue;
        }
        grade_point_sum += marks.grade_point;
        countable += 1;
        total_without += marks.final_mark;
        if !marks.pass_status {
            failed_subject_count += 1;
        }
    }

    let failed = failed_subject_count > 0;
    let max_grade_point = scale.max_grade_point();
    let (bonus_gp, bonus_mark) = optional_bonus.unwrap_or((0.0, 0.0));

    let gpa_without_optional = if failed || countable == 0 {
        0.0
    } else {
        (grade_point_sum / countable as f64).clamp(0.0, max_grade_point)
    };
    let gpa_with_optional = if failed {
        0.0
    } else {
        (gpa_without_optional + bonus_gp).min(max_grade_point)
    };
    let letter_grade = if failed {
        "F".to_string()
    } else {
        scale.grade_of_point(gpa_with_optional).grade
    };

    StudentResult {
        student_id: student.student_id.clone(),
        student_name: student.student_name.clone(),
        roll: student.roll,
        subjects,
        gpa_without_optional: round2(gpa_without_optional),
        gpa_with_optional: round2(gpa_with_optional),
        total_mark_without_optional: round2(total_without),
        total_mark_with_optional: round2(total_without + bonus_mark),
        letter_grade,
        result_status: if failed {
            ResultStatus::Fail
        } else {
            ResultStatus::Pass
        },
        failed_subject_count,
    }
}

fn is_optional(config: &SubjectConfig, student: &StudentMarks) -> bool {
    config.is_optional
        || student
            .optional_subject_id
            .as_deref()
            .is_some_and(|id| id == config.subject_id)
}

enum ConfigGroup<'a> {
    Single(&'a SubjectConfig),
    Combined(&'a str, Vec<&'a SubjectConfig>),
}

/// Groups subject configs into grading units, preserving payload order.
/// A combined group only materializes with two or more papers; a lone paper
/// flagged combined falls back to single grading.
fn group_configs(configs: &[SubjectConfig]) -> Vec<ConfigGroup<'_>> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_group: BTreeMap<&str, Vec<&SubjectConfig>> = BTreeMap::new();
    let mut singles: Vec<(usize, &SubjectConfig)> = Vec::new();

    for (index, config) in configs.iter().enumerate() {
        match (config.is_combined, config.combined_group_id.as_deref()) {
            (true, Some(group_id)) => {
                if !by_group.contains_key(group_id) {
                    order.push(group_id);
                }
                by_group.entry(group_id).or_default().push(config);
            }
            _ => singles.push((index, config)),
        }
    }

    let mut groups: Vec<(usize, ConfigGroup<'_>)> = Vec::new();
    for group_id in order {
        let papers = by_group.remove(group_id).unwrap_or_default();
        let first_index = configs
            .iter()
            .position(|c| c.combined_group_id.as_deref() == Some(group_id))
            .unwrap_or(0);
        if papers.len() >= 2 {
            groups.push((first_index, ConfigGroup::Combined(group_id, papers)));
        } else if let Some(paper) = papers.into_iter().next() {
            groups.push((first_index, ConfigGroup::Single(paper)));
        }
    }
    for (index, config) in singles {
        groups.push((index, ConfigGroup::Single(config)));
    }
    groups.sort_by_key(|(index, _)| *index);
    groups.into_iter().map(|(_, group)| group).collect()
}
