use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::ResultStatus;

/// Which metric leads the merit ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeritMetric {
    TotalMark,
    Gpa,
}

/// Sequential hands out strictly increasing positions; non-sequential is
/// competition ranking (ties share a position, later positions skip).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDiscipline {
    Sequential,
    NonSequential,
}

/// The configured merit process type, parsed once at the boundary. The wire
/// value stays free-form ("total_mark_sequential", "Grade Point Sequential",
/// ...); the engine only ever sees the two explicit axes.
#[derive(Debug, Clone)]
pub struct MeritType {
    pub metric: MeritMetric,
    pub discipline: RankDiscipline,
    pub raw: String,
}

impl MeritType {
    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        let metric = if lower.contains("gpa")
            || lower.contains("grade point")
            || lower.contains("grade_point")
        {
            MeritMetric::Gpa
        } else {
            MeritMetric::TotalMark
        };
        let non_sequential = lower.contains("non_sequential")
            || lower.contains("non-sequential")
            || lower.contains("non sequential")
            || lower.contains("nonsequential");
        let discipline = if non_sequential {
            RankDiscipline::NonSequential
        } else if lower.contains("sequential") {
            RankDiscipline::Sequential
        } else {
            RankDiscipline::NonSequential
        };
        Self {
            metric,
            discipline,
            raw: raw.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeritConfig {
    pub merit_process_type: String,
    pub group_by_shift: bool,
    pub group_by_section: bool,
    pub group_by_group: bool,
    pub group_by_gender: bool,
    pub group_by_religion: bool,
}

impl Default for MeritConfig {
    fn default() -> Self {
        Self {
            merit_process_type: "total_mark_sequential".to_string(),
            group_by_shift: false,
            group_by_section: false,
            group_by_group: false,
            group_by_gender: false,
            group_by_religion: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcademicDetail {
    pub class_roll: Option<i64>,
    pub shift: Option<String>,
    pub section: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentDetail {
    pub gender: Option<String>,
    pub religion: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeritPayload {
    pub exam_name: String,
    pub exam_config: MeritConfig,
    /// Either a plain array of result rows or a `{ "results": [...] }`
    /// wrapper; callers forward the result-process output verbatim.
    pub results: serde_json::Value,
    pub academic_details: BTreeMap<String, AcademicDetail>,
    pub student_details: BTreeMap<String, StudentDetail>,
}

/// One normalized result row. Field pairs like `gpaWithOptional`/`gpa` exist
/// because older callers send the short names; the richer figure wins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeritResultRow {
    pub student_id: String,
    pub student_name: String,
    pub result_status: ResultStatus,
    pub gpa_with_optional: Option<f64>,
    pub gpa: Option<f64>,
    pub gpa_without_optional: f64,
    pub letter_grade: String,
    pub total_mark_with_optional: Option<f64>,
    pub total_mark: Option<f64>,
    pub subjects: Vec<SubjectMarkRow>,
    pub optional_bonus: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectMarkRow {
    pub final_mark: f64,
}

impl MeritResultRow {
    fn gpa_value(&self) -> f64 {
        self.gpa_with_optional.or(self.gpa).unwrap_or(0.0)
    }

    fn total_mark_value(&self) -> f64 {
        self.total_mark_with_optional
            .or(self.total_mark)
            .unwrap_or_else(|| {
                self.optional_bonus + self.subjects.iter().map(|s| s.final_mark).sum::<f64>()
            })
    }
}

/// A ranked cohort entry. `merit_position` is owned exclusively by this
/// engine; no other component assigns it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritRecord {
    pub student_id: String,
    pub student_name: String,
    pub roll: i64,
    pub total_mark: f64,
    pub gpa: f64,
    pub gpa_without_optional: f64,
    pub letter_grade: String,
    pub result_status: ResultStatus,
    pub merit_position: usize,
    pub shift: Option<String>,
    pub section: Option<String>,
    pub group: Option<String>,
    pub gender: Option<String>,
    pub religion: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritViews {
    pub all_students: Vec<MeritRecord>,
    pub section_wise: BTreeMap<String, Vec<MeritRecord>>,
    pub shift_wise: BTreeMap<String, Vec<MeritRecord>>,
    pub group_wise: BTreeMap<String, Vec<MeritRecord>>,
    pub gender_wise: BTreeMap<String, Vec<MeritRecord>>,
    pub religion_wise: BTreeMap<String, Vec<MeritRecord>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritOutcome {
    pub total_students: usize,
    pub merit_type: String,
    pub grouped_by: Vec<String>,
    pub data: MeritViews,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct MeritInput {
    student_id: String,
    student_name: String,
    roll: Option<i64>,
    total_mark: f64,
    gpa: f64,
    gpa_without_optional: f64,
    letter_grade: String,
    result_status: ResultStatus,
    primary: f64,
    secondary: f64,
    shift: Option<String>,
    section: Option<String>,
    group: Option<String>,
    gender: Option<String>,
    religion: Option<String>,
}

impl MeritInput {
    /// Missing rolls sort after every real roll but must not leak the
    /// sentinel into the output record.
    fn sort_roll(&self) -> i64 {
        self.roll.unwrap_or(i64::MAX)
    }

    fn into_record(self, merit_position: usize) -> MeritRecord {
        MeritRecord {
            student_id: self.student_id,
            student_name: self.student_name,
            roll: self.roll.unwrap_or(0),
            total_mark: self.total_mark,
            gpa: self.gpa,
            gpa_without_optional: self.gpa_without_optional,
            letter_grade: self.letter_grade,
            result_status: self.result_status,
            merit_position,
            shift: self.shift,
            section: self.section,
            group: self.group,
            gender: self.gender,
            religion: self.religion,
        }
    }
}

/// Sorts and ranks the whole cohort once, then derives every grouped view as
/// a partition of that single ranked list. Grouped views never re-rank:
/// students keep their class-wide position.
pub fn compute_merit(payload: &MeritPayload) -> MeritOutcome {
    let merit_type = MeritType::parse(&payload.exam_config.merit_process_type);
    let grouped_by = grouped_by_fields(&payload.exam_config);

    let rows = normalize_results(&payload.results);
    if rows.is_empty() {
        return MeritOutcome {
            total_students: 0,
            merit_type: merit_type.raw,
            grouped_by,
            data: MeritViews::default(),
            error: Some("No results found".to_string()),
        };
    }

    let mut inputs: Vec<MeritInput> = rows
        .into_iter()
        .map(|row| build_input(row, &merit_type, payload))
        .collect();

    // Stable total order: Pass first, primary metric descending, secondary
    // metric descending, roll ascending.
    inputs.sort_by(|a, b| {
        status_rank(a.result_status)
            .cmp(&status_rank(b.result_status))
            .then_with(|| cmp_desc(a.primary, b.primary))
            .then_with(|| cmp_desc(a.secondary, b.secondary))
            .then_with(|| a.sort_roll().cmp(&b.sort_roll()))
    });

    let ranked = assign_ranks(inputs, merit_type.discipline);

    let data = MeritViews {
        section_wise: group_view(&ranked, |r| r.section.as_deref()),
        shift_wise: group_view(&ranked, |r| r.shift.as_deref()),
        group_wise: group_view(&ranked, |r| r.group.as_deref()),
        gender_wise: group_view(&ranked, |r| r.gender.as_deref()),
        religion_wise: group_view(&ranked, |r| r.religion.as_deref()),
        all_students: ranked,
    };

    MeritOutcome {
        total_students: data.all_students.len(),
        merit_type: merit_type.raw,
        grouped_by,
        data,
        error: None,
    }
}

fn normalize_results(raw: &serde_json::Value) -> Vec<MeritResultRow> {
    let rows = if let Some(inner) = raw.get("results").and_then(|v| v.as_array()) {
        inner
    } else if let Some(arr) = raw.as_array() {
        arr
    } else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| serde_json::from_value(row.clone()).ok())
        .collect()
}

fn grouped_by_fields(config: &MeritConfig) -> Vec<String> {
    let mut fields = Vec::new();
    if config.group_by_shift {
        fields.push("shift".to_string());
    }
    if config.group_by_section {
        fields.push("section".to_string());
    }
    if config.group_by_group {
        fields.push("group".to_string());
    }
    if config.group_by_gender {
        fields.push("gender".to_string());
    }
    if config.group_by_religion {
        fields.push("religion".to_string());
    }
    fields
}

fn build_input(row: MeritResultRow, merit_type: &MeritType, payload: &MeritPayload) -> MeritInput {
    let academic = payload.academic_details.get(&row.student_id);
    let details = payload.student_details.get(&row.student_id);

    let total_mark = row.total_mark_value();
    let gpa = row.gpa_value();
    let (primary, secondary) = match merit_type.metric {
        MeritMetric::Gpa => (gpa, total_mark),
        MeritMetric::TotalMark => (total_mark, gpa),
    };

    MeritInput {
        roll: academic.and_then(|a| a.class_roll),
        shift: academic.and_then(|a| a.shift.clone()),
        section: academic.and_then(|a| a.section.clone()),
        group: academic.and_then(|a| a.group.clone()),
        gender: details.and_then(|d| d.gender.clone()),
        religion: details.and_then(|d| d.religion.clone()),
        letter_grade: if row.letter_grade.is_empty() {
            "F".to_string()
        } else {
            row.letter_grade
        },
        student_id: row.student_id,
        student_name: row.student_name,
        total_mark,
        gpa,
        gpa_without_optional: row.gpa_without_optional,
        result_status: row.result_status,
        primary,
        secondary,
    }
}

fn status_rank(status: ResultStatus) -> u8 {
    match status {
        ResultStatus::Pass => 0,
        ResultStatus::Fail => 1,
    }
}

fn cmp_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Rank assignment as a fold over the sorted sequence, carrying the previous
/// primary metric and rank instead of mutable loop trackers.
fn assign_ranks(sorted: Vec<MeritInput>, discipline: RankDiscipline) -> Vec<MeritRecord> {
    let mut previous: Option<(f64, usize)> = None;
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let position = match discipline {
                RankDiscipline::Sequential => index + 1,
                RankDiscipline::NonSequential => match previous {
                    Some((prev_primary, prev_rank)) if input.primary == prev_primary => prev_rank,
                    _ => index + 1,
                },
            };
            previous = Some((input.primary, position));
            input.into_record(position)
        })
        .collect()
}

fn group_view<F>(records: &[MeritRecord], key: F) -> BTreeMap<String, Vec<MeritRecord>>
where
    F: Fn(&MeritRecord) -> Option<&str>,
{
    let mut out: BTreeMap<String, Vec<MeritRecord>> = BTreeMap::new();
    for record in records {
        out.entry(key(record).unwrap_or("unknown").to_string())
            .or_default()
            .push(record.clone());
    }
    out
}
