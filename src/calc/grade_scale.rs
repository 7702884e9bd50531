use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One row of a grading table. Scales arrive with every request and are never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeBand {
    pub from_mark: f64,
    pub to_mark: f64,
    pub grade: String,
    pub grade_point: f64,
}

impl Default for GradeBand {
    fn default() -> Self {
        Self {
            from_mark: 0.0,
            to_mark: 0.0,
            grade: "F".to_string(),
            grade_point: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeInfo {
    pub grade: String,
    pub grade_point: f64,
}

impl GradeInfo {
    fn fail() -> Self {
        Self {
            grade: "F".to_string(),
            grade_point: 0.0,
        }
    }
}

/// An ordered grading table. Bands are sorted highest `from_mark` first once
/// at construction; a value outside every band resolves to `F`/`0.0` rather
/// than an error.
#[derive(Debug, Clone)]
pub struct GradeScale {
    bands: Vec<GradeBand>,
}

impl GradeScale {
    pub fn new(mut bands: Vec<GradeBand>) -> Self {
        bands.sort_by(|a, b| {
            b.from_mark
                .partial_cmp(&a.from_mark)
                .unwrap_or(Ordering::Equal)
        });
        Self { bands }
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn max_grade_point(&self) -> f64 {
        self.bands
            .iter()
            .map(|b| b.grade_point)
            .fold(0.0, f64::max)
    }

    /// Forward lookup by percentage or mark: the first band containing the
    /// value wins.
    pub fn grade_of(&self, value: f64) -> GradeInfo {
        self.bands
            .iter()
            .find(|b| value >= b.from_mark && value <= b.to_mark)
            .map(|b| GradeInfo {
                grade: b.grade.clone(),
                grade_point: b.grade_point,
            })
            .unwrap_or_else(GradeInfo::fail)
    }

    /// Reverse lookup by grade-point magnitude, used for a student's letter
    /// grade: the band whose grade point is the largest value <= `gpa`.
    pub fn grade_of_point(&self, gpa: f64) -> GradeInfo {
        let mut best: Option<&GradeBand> = None;
        for band in &self.bands {
            if band.grade_point > gpa {
                continue;
            }
            let better = match best {
                Some(b) => band.grade_point > b.grade_point,
                None => true,
            };
            if better {
                best = Some(band);
            }
        }
        best.map(|b| GradeInfo {
            grade: b.grade.clone(),
            grade_point: b.grade_point,
        })
        .unwrap_or_else(GradeInfo::fail)
    }
}
