use serde::Serialize;

use crate::error::GradeError;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// One scored subject for a student. Only constructible through
/// [`GradeRecord::new`], so every record the engine sees is on the 0-10 scale
/// with a positive coefficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRecord {
    subject: String,
    score: f64,
    coefficient: f64,
    semester: String,
    year: i32,
}

impl GradeRecord {
    pub fn new(
        subject: impl Into<String>,
        score: f64,
        coefficient: f64,
        semester: impl Into<String>,
        year: i32,
    ) -> Result<Self, GradeError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(GradeError::EmptySubject);
        }
        if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(GradeError::ScoreOutOfRange(score));
        }
        if !coefficient.is_finite() || coefficient <= 0.0 {
            return Err(GradeError::InvalidCoefficient(coefficient));
        }

        Ok(Self {
            subject,
            score,
            coefficient,
            semester: semester.into(),
            year,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn semester(&self) -> &str {
        &self.semester
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn weighted_score(&self) -> f64 {
        self.score * self.coefficient
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub student_id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub major: Option<String>,
    pub grades: Vec<GradeRecord>,
}

impl Student {
    pub fn new(student_id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            full_name: full_name.into(),
            email: None,
            phone_number: None,
            major: None,
            grades: Vec::new(),
        }
    }

    pub fn with_grades(mut self, grades: Vec<GradeRecord>) -> Self {
        self.grades = grades;
        self
    }

    pub fn has_grades(&self) -> bool {
        !self.grades.is_empty()
    }
}
