use serde::{Deserialize, Serialize};

use super::convert::PartMarks;
use super::grade_scale::{GradeBand, GradeScale};
use super::{round2, ResultStatus};

/// Pass/fail rules for one directly-scored subject (the single-subject
/// semester flow: no per-part conversion tables, one pass mark per part).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartRule {
    pub part_code: String,
    pub total_mark: f64,
    pub pass_mark: f64,
    pub conversion_percent: f64,
    pub is_overall: bool,
    pub overall_mark: f64,
}

impl Default for PartRule {
    fn default() -> Self {
        Self {
            part_code: String::new(),
            total_mark: 100.0,
            pass_mark: 0.0,
            conversion_percent: 100.0,
            is_overall: false,
            overall_mark: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemesterSubject {
    pub subject_name: Option<String>,
    pub exam_name: String,
    pub grace_mark: f64,
    pub highest_fail_mark: f64,
    pub attendance_required: bool,
    pub exam_config: Vec<PartRule>,
}

impl Default for SemesterSubject {
    fn default() -> Self {
        Self {
            subject_name: None,
            exam_name: "Semester Exam".to_string(),
            grace_mark: 0.0,
            highest_fail_mark: 0.0,
            attendance_required: false,
            exam_config: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemesterStudent {
    pub student_id: String,
    pub part_marks: PartMarks,
    pub attendance_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamMarksPayload {
    pub institute_id: String,
    pub subjects: Vec<SemesterSubject>,
    pub grade_points: Vec<GradeBand>,
    pub students: Vec<SemesterStudent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentExamMark {
    pub student_id: String,
    pub obtained_mark: f64,
    pub final_mark: f64,
    pub grace_mark: f64,
    pub result_status: ResultStatus,
    pub remark: String,
    pub percentage: f64,
    pub part_marks: PartMarks,
    pub grade: String,
    pub grade_point: f64,
    pub attendance_status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamMarksOutcome {
    pub results: Vec<StudentExamMark>,
    pub institute_id: String,
    pub exam_type: String,
    pub exam_name: String,
    pub subject_name: Option<String>,
}

/// Evaluates a batch of students against the first configured subject.
pub fn compute_exam_marks(payload: &ExamMarksPayload) -> ExamMarksOutcome {
    let subject = payload.subjects.first().cloned().unwrap_or_default();
    let scale = GradeScale::new(payload.grade_points.clone());
    let results = payload
        .students
        .iter()
        .map(|student| evaluate_student(student, &subject, &scale))
        .collect();

    ExamMarksOutcome {
        results,
        institute_id: payload.institute_id.clone(),
        exam_type: "semester".to_string(),
        exam_name: subject.exam_name.clone(),
        subject_name: subject.subject_name.clone(),
    }
}

/// The grace-mark pass resolver. Checks run in order: attendance, individual
/// per-part pass, overall conversion-weighted pass, fail threshold
/// (`highest_fail_mark + 0.01`). Grace applies only when it fully closes the
/// threshold gap; a partial top-up is never granted.
pub fn evaluate_student(
    student: &SemesterStudent,
    subject: &SemesterSubject,
    scale: &GradeScale,
) -> StudentExamMark {
    let attendance = student.attendance_status.clone();
    let is_absent = subject.attendance_required
        && attendance
            .as_deref()
            .unwrap_or("absent")
            .eq_ignore_ascii_case("absent");
    if is_absent {
        return absent_result(student);
    }

    let obtained_mark: f64 = subject
        .exam_config
        .iter()
        .map(|rule| student.part_marks.get(&rule.part_code).copied().unwrap_or(0.0))
        .sum();
    let total_max: f64 = subject
        .exam_config
        .iter()
        .map(|rule| rule.total_mark * rule.conversion_percent / 100.0)
        .sum();

    // 1. Individual pass: every part with a positive pass mark must reach it.
    let mut individual_pass = true;
    let mut failed_parts: Vec<String> = Vec::new();
    for rule in subject.exam_config.iter().filter(|r| r.pass_mark > 0.0) {
        let got = student.part_marks.get(&rule.part_code).copied().unwrap_or(0.0);
        if got < rule.pass_mark {
            individual_pass = false;
            failed_parts.push(format!("{} ({} < {})", rule.part_code, got, rule.pass_mark));
        }
    }

    // 2. Overall pass: conversion-weighted sum across all parts against the
    //    declared overall requirement, when one exists.
    let overall_required = subject
        .exam_config
        .iter()
        .find(|r| r.is_overall && r.overall_mark > 0.0)
        .map(|r| r.overall_mark);
    let overall_pass = match overall_required {
        Some(required) => {
            let weighted: f64 = subject
                .exam_config
                .iter()
                .map(|rule| {
                    let got = student.part_marks.get(&rule.part_code).copied().unwrap_or(0.0);
                    got * rule.conversion_percent / 100.0
                })
                .sum();
            weighted >= required
        }
        None => true,
    };

    // 3. Threshold pass: trivially satisfied when no fail mark is configured.
    let fail_threshold = if subject.highest_fail_mark > 0.0 {
        Some(subject.highest_fail_mark + 0.01)
    } else {
        None
    };
    let threshold_pass = fail_threshold.map(|t| obtained_mark >= t).unwrap_or(true);

    let pass_before_grace = individual_pass && overall_pass && threshold_pass;

    let mut final_mark = obtained_mark;
    let mut applied_grace = 0.0;
    let mut pass = pass_before_grace;
    let mut remark = String::new();

    if !pass_before_grace {
        let mut reasons: Vec<String> = Vec::new();
        if !individual_pass {
            reasons.push(format!("Failed Individual: {}", failed_parts.join(", ")));
        }
        if !overall_pass {
            reasons.push("Overall".to_string());
        }
        if !threshold_pass {
            reasons.push("Below threshold".to_string());
        }
        remark = reasons.join(" | ");
    }

    // 4. Grace top-up, only when it closes the whole gap to the threshold.
    if let Some(threshold) = fail_threshold {
        if !pass_before_grace && subject.grace_mark > 0.0 && obtained_mark < threshold {
            let needed = (threshold - obtained_mark).ceil();
            let granted = needed.min(subject.grace_mark);
            if obtained_mark + granted >= threshold {
                applied_grace = granted;
                final_mark = obtained_mark + granted;
                pass = true;
                remark = format!("Pass by Grace (+{} marks)", granted);
            }
        }
    }

    let pct = if total_max > 0.0 {
        final_mark / total_max * 100.0
    } else {
        0.0
    };
    let grading = scale.grade_of(pct);

    StudentExamMark {
        student_id: student.student_id.clone(),
        obtained_mark,
        final_mark,
        grace_mark: applied_grace,
        result_status: if pass {
            ResultStatus::Pass
        } else {
            ResultStatus::Fail
        },
        remark,
        percentage: round2(pct),
        part_marks: student.part_marks.clone(),
        grade: grading.grade,
        grade_point: grading.grade_point,
        attendance_status: attendance,
    }
}

fn absent_result(student: &SemesterStudent) -> StudentExamMark {
    StudentExamMark {
        student_id: student.student_id.clone(),
        obtained_mark: 0.0,
        final_mark: 0.0,
        grace_mark: 0.0,
        result_status: ResultStatus::Fail,
        remark: "Absent".to_string(),
        percentage: 0.0,
        part_marks: student.part_marks.clone(),
        grade: "F".to_string(),
        grade_point: 0.0,
        attendance_status: Some("absent".to_string()),
    }
}
