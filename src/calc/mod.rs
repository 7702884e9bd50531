pub mod convert;
pub mod grace;
pub mod grade_scale;
pub mod merit;
pub mod rounding;
pub mod student;
pub mod subject;

use serde::{Deserialize, Serialize};

/// Two-decimal rounding applied to every reported mark, percentage and GPA
/// figure. Internal arithmetic stays unrounded.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResultStatus {
    Pass,
    #[default]
    Fail,
}

impl ResultStatus {
    pub fn is_pass(self) -> bool {
        matches!(self, ResultStatus::Pass)
    }
}
