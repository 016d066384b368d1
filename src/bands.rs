//! Classification bands on the 0-10 scale.
//!
//! | Lower bound | Band       | Label        | Letter | GPA |
//! |-------------|------------|--------------|--------|-----|
//! | >= 8.5      | Excellent  | Xuất sắc     | A      | 4.0 |
//! | >= 7.0      | Good       | Giỏi         | B      | 3.0 |
//! | >= 5.5      | Fair       | Khá          | C      | 2.0 |
//! | >= 4.0      | Average    | Trung bình   | D      | 1.0 |
//! | otherwise   | Poor       | Yếu          | F      | 0.0 |
//!
//! [`BAND_TABLE`] is the only place these thresholds live; letter grades,
//! classifications, GPA points and cohort statistics all read it.

use serde::Serialize;

/// Label used when a student has no grades to classify.
pub const UNCLASSIFIED_LABEL: &str = "Không xếp loại";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Excellent,
    Good,
    Fair,
    Average,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSpec {
    pub band: Band,
    pub lower_bound: f64,
    pub label: &'static str,
    pub letter: &'static str,
    pub gpa_point: f64,
}

/// Ordered from the highest threshold down. The last row is the catch-all.
pub static BAND_TABLE: [BandSpec; 5] = [
    BandSpec {
        band: Band::Excellent,
        lower_bound: 8.5,
        label: "Xuất sắc",
        letter: "A",
        gpa_point: 4.0,
    },
    BandSpec {
        band: Band::Good,
        lower_bound: 7.0,
        label: "Giỏi",
        letter: "B",
        gpa_point: 3.0,
    },
    BandSpec {
        band: Band::Fair,
        lower_bound: 5.5,
        label: "Khá",
        letter: "C",
        gpa_point: 2.0,
    },
    BandSpec {
        band: Band::Average,
        lower_bound: 4.0,
        label: "Trung bình",
        letter: "D",
        gpa_point: 1.0,
    },
    BandSpec {
        band: Band::Poor,
        lower_bound: 0.0,
        label: "Yếu",
        letter: "F",
        gpa_point: 0.0,
    },
];

impl Band {
    pub const ALL: [Band; 5] = [
        Band::Excellent,
        Band::Good,
        Band::Fair,
        Band::Average,
        Band::Poor,
    ];

    /// First band (highest first) whose lower bound is `<= score`.
    /// A score sitting exactly on a threshold belongs to the higher band.
    pub fn classify(score: f64) -> Band {
        BAND_TABLE
            .iter()
            .find(|spec| score >= spec.lower_bound)
            .map(|spec| spec.band)
            .unwrap_or(Band::Poor)
    }

    pub fn spec(self) -> &'static BandSpec {
        &BAND_TABLE[self.index()]
    }

    /// Position in [`BAND_TABLE`] and [`Band::ALL`].
    pub fn index(self) -> usize {
        match self {
            Band::Excellent => 0,
            Band::Good => 1,
            Band::Fair => 2,
            Band::Average => 3,
            Band::Poor => 4,
        }
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn letter(self) -> &'static str {
        self.spec().letter
    }

    pub fn gpa_point(self) -> f64 {
        self.spec().gpa_point
    }

    pub fn lower_bound(self) -> f64 {
        self.spec().lower_bound
    }

    /// Threshold text for reports, e.g. `≥ 8.5` or `< 4.0` for the catch-all.
    pub fn threshold_label(self) -> String {
        match self {
            Band::Poor => format!("< {:.1}", Band::Average.lower_bound()),
            _ => format!("≥ {:.1}", self.lower_bound()),
        }
    }
}
