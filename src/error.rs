use serde_json::json;

/// Typed outcome of every engine operation. Validation failures carry the
/// values a caller needs to correct and retry with different input;
/// `Store`/`Maintenance` are the only kinds eligible for automatic retry.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("section not found")]
    SectionNotFound,
    #[error("student not found")]
    StudentNotFound,
    #[error("student is already enrolled in this section")]
    AlreadyEnrolledSection,
    #[error("student already holds a section of course {course_code}")]
    AlreadyEnrolledCourse { course_code: String },
    #[error("section is full (capacity {capacity})")]
    SectionFull { capacity: i64 },
    #[error("capacity out of allowed range: min {min}, max {max:?}")]
    InvalidCapacity { min: i64, max: Option<i64> },
    #[error("requester may not modify this record")]
    Unauthorized,
    #[error("component weights sum to {actual_sum}, expected exactly 100")]
    WeightSumInvalid { actual_sum: i64 },
    #[error("score must be a finite non-negative number, got {value}")]
    InvalidScore { value: f64 },
    #[error("store is in maintenance mode")]
    Maintenance,
    #[error("store unavailable: {0}")]
    Store(#[from] rusqlite::Error),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::SectionNotFound => "section_not_found",
            EngineError::StudentNotFound => "student_not_found",
            EngineError::AlreadyEnrolledSection => "already_enrolled_section",
            EngineError::AlreadyEnrolledCourse { .. } => "already_enrolled_course",
            EngineError::SectionFull { .. } => "section_full",
            EngineError::InvalidCapacity { .. } => "invalid_capacity",
            EngineError::Unauthorized => "unauthorized",
            EngineError::WeightSumInvalid { .. } => "weight_sum_invalid",
            EngineError::InvalidScore { .. } => "invalid_score",
            EngineError::Maintenance | EngineError::Store(_) => "store_unavailable",
        }
    }

    /// Only the store-unavailable class may be retried without changing the
    /// request; every other kind is permanent for the given inputs.
    pub fn retryable(&self) -> bool {
        matches!(self, EngineError::Maintenance | EngineError::Store(_))
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            EngineError::AlreadyEnrolledCourse { course_code } => {
                Some(json!({ "courseCode": course_code }))
            }
            EngineError::SectionFull { capacity } => Some(json!({ "capacity": capacity })),
            EngineError::InvalidCapacity { min, max } => {
                Some(json!({ "min": min, "max": max }))
            }
            EngineError::WeightSumInvalid { actual_sum } => {
                Some(json!({ "actualSum": actual_sum }))
            }
            EngineError::InvalidScore { value } => Some(json!({ "value": value })),
            EngineError::Maintenance => Some(json!({ "maintenance": true })),
            _ => None,
        }
    }
}

/// Maps a constraint violation raised by the (student, section) primary key
/// back to the typed duplicate-enrollment outcome.
pub fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
