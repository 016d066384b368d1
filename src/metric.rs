//! Summary metrics derived from a student's grade records.
//!
//! Every metric is a pure function of the records and has a defined result
//! for an empty collection, so callers never need to special-case students
//! without grades.

use clap::ValueEnum;
use serde::Serialize;

use crate::bands::{Band, UNCLASSIFIED_LABEL};
use crate::format;
use crate::models::GradeRecord;

/// Weighted average reported when the coefficient sum is zero.
pub const EMPTY_AVERAGE: &str = "0.0";
/// GPA reported when the coefficient sum is zero.
pub const EMPTY_GPA: &str = "0.00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Coefficient-weighted average on the 0-10 scale
    #[default]
    Average,
    /// Letter grade A-F of the weighted average
    Letter,
    /// Performance classification of the weighted average
    Classification,
    /// Credit-weighted GPA on the 4.0 scale
    Gpa,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Average,
        Metric::Letter,
        Metric::Classification,
        Metric::Gpa,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Average => "Điểm Trung Bình",
            Metric::Letter => "Điểm Chữ",
            Metric::Classification => "Xếp Loại",
            Metric::Gpa => "GPA (4.0 Scale)",
        }
    }

    pub fn compute(self, grades: &[GradeRecord]) -> String {
        match self {
            Metric::Average => weighted_average(grades),
            Metric::Letter => letter_grade(grades),
            Metric::Classification => classification(grades),
            Metric::Gpa => gpa(grades),
        }
    }
}

/// `(score, coefficient)` pairs sorted by value. Float addition is not
/// associative, so summing in this order keeps results independent of how
/// the grades were listed.
pub(crate) fn canonical_pairs(grades: &[GradeRecord]) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = grades
        .iter()
        .map(|grade| (grade.score(), grade.coefficient()))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    pairs
}

/// `Σ(score × coefficient) / Σ coefficient` to two decimals, or `"0.0"` when
/// there is nothing to divide by.
pub fn weighted_average(grades: &[GradeRecord]) -> String {
    let (weighted, coefficients) = canonical_pairs(grades)
        .into_iter()
        .fold((0.0, 0.0), |(w, c), (score, coefficient)| {
            (w + score * coefficient, c + coefficient)
        });

    if coefficients == 0.0 {
        return EMPTY_AVERAGE.to_string();
    }

    format::fixed(weighted / coefficients, 2)
}

/// Band of the rounded weighted average, exactly as [`weighted_average`]
/// renders it. `None` for an empty collection.
pub fn average_band(grades: &[GradeRecord]) -> Option<Band> {
    if grades.is_empty() {
        return None;
    }

    weighted_average(grades)
        .parse::<f64>()
        .ok()
        .map(Band::classify)
}

pub fn letter_grade(grades: &[GradeRecord]) -> String {
    average_band(grades)
        .unwrap_or(Band::Poor)
        .letter()
        .to_string()
}

pub fn classification(grades: &[GradeRecord]) -> String {
    average_band(grades)
        .map(Band::label)
        .unwrap_or(UNCLASSIFIED_LABEL)
        .to_string()
}

/// Each grade is discretized to its own GPA point first, then the points are
/// averaged by coefficient. This is not the GPA point of the overall average.
pub fn gpa(grades: &[GradeRecord]) -> String {
    let (points, credits) = canonical_pairs(grades)
        .into_iter()
        .fold((0.0, 0.0), |(p, c), (score, coefficient)| {
            let point = Band::classify(score).gpa_point();
            (p + point * coefficient, c + coefficient)
        });

    if credits == 0.0 {
        return EMPTY_GPA.to_string();
    }

    format::fixed(points / credits, 2)
}
