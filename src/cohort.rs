use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::bands::Band;
use crate::format;
use crate::metric;
use crate::models::Student;

/// Populations above this size are tallied on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub average: usize,
    pub poor: usize,
}

impl BandCounts {
    pub fn get(&self, band: Band) -> usize {
        match band {
            Band::Excellent => self.excellent,
            Band::Good => self.good,
            Band::Fair => self.fair,
            Band::Average => self.average,
            Band::Poor => self.poor,
        }
    }

    fn slot(&mut self, band: Band) -> &mut usize {
        match band {
            Band::Excellent => &mut self.excellent,
            Band::Good => &mut self.good,
            Band::Fair => &mut self.fair,
            Band::Average => &mut self.average,
            Band::Poor => &mut self.poor,
        }
    }

    pub fn add(&mut self, band: Band) {
        *self.slot(band) += 1;
    }

    pub fn total(&self) -> usize {
        Band::ALL.iter().map(|band| self.get(*band)).sum()
    }

    fn merge(&mut self, other: &BandCounts) {
        for band in Band::ALL {
            *self.slot(band) += other.get(band);
        }
    }
}

/// Share of graded students per band, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandPercentages {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
    pub average: f64,
    pub poor: f64,
}

impl BandPercentages {
    fn from_counts(counts: &BandCounts, graded: usize) -> Option<Self> {
        if graded == 0 {
            return None;
        }
        let share = |band: Band| counts.get(band) as f64 / graded as f64 * 100.0;
        Some(Self {
            excellent: share(Band::Excellent),
            good: share(Band::Good),
            fair: share(Band::Fair),
            average: share(Band::Average),
            poor: share(Band::Poor),
        })
    }

    pub fn get(&self, band: Band) -> f64 {
        match band {
            Band::Excellent => self.excellent,
            Band::Good => self.good,
            Band::Fair => self.fair,
            Band::Average => self.average,
            Band::Poor => self.poor,
        }
    }

    /// One-decimal text with a trailing `%`, e.g. `50.0%`.
    pub fn formatted(&self, band: Band) -> String {
        format::percent(self.get(band))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortStats {
    pub total_students: usize,
    pub students_with_grades: usize,
    pub total_grades: usize,
    /// Unweighted mean of every raw score, when any grade exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
    pub counts: BandCounts,
    /// Absent when no student has grades.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentages: Option<BandPercentages>,
}

/// Partial statistics over part of a population. Tallies over disjoint
/// slices merge into the tally of their union.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortTally {
    total_students: usize,
    students_with_grades: usize,
    total_grades: usize,
    score_sum: f64,
    counts: BandCounts,
}

impl CohortTally {
    pub fn record(&mut self, student: &Student) {
        if !student.has_grades() {
            self.total_students += 1;
            return;
        }

        let average = metric::weighted_average(&student.grades);
        self.record_with_average(student, &average);
    }

    /// Count a graded student whose rendered weighted average is `average`.
    fn record_with_average(&mut self, student: &Student, average: &str) {
        self.total_students += 1;
        self.students_with_grades += 1;
        self.total_grades += student.grades.len();
        self.score_sum += metric::canonical_pairs(&student.grades)
            .into_iter()
            .map(|(score, _)| score)
            .sum::<f64>();

        match average.trim().parse::<f64>() {
            Ok(value) => self.counts.add(Band::classify(value)),
            Err(err) => {
                warn!(
                    student_id = %student.student_id,
                    average,
                    %err,
                    "skipping student with unreadable average"
                );
            }
        }
    }

    pub fn merge(mut self, other: CohortTally) -> CohortTally {
        self.total_students += other.total_students;
        self.students_with_grades += other.students_with_grades;
        self.total_grades += other.total_grades;
        self.score_sum += other.score_sum;
        self.counts.merge(&other.counts);
        self
    }

    pub fn finish(self) -> CohortStats {
        debug!(
            total = self.total_students,
            graded = self.students_with_grades,
            "cohort tally complete"
        );
        CohortStats {
            total_students: self.total_students,
            students_with_grades: self.students_with_grades,
            total_grades: self.total_grades,
            mean_score: (self.total_grades > 0)
                .then(|| self.score_sum / self.total_grades as f64),
            percentages: BandPercentages::from_counts(&self.counts, self.students_with_grades),
            counts: self.counts,
        }
    }
}

/// Classify a population into bands, going parallel for large populations.
pub fn aggregate(students: &[Student]) -> CohortStats {
    if students.len() > PARALLEL_THRESHOLD {
        aggregate_parallel(students)
    } else {
        aggregate_sequential(students)
    }
}

pub fn aggregate_sequential(students: &[Student]) -> CohortStats {
    students
        .iter()
        .fold(CohortTally::default(), |mut tally, student| {
            tally.record(student);
            tally
        })
        .finish()
}

pub fn aggregate_parallel(students: &[Student]) -> CohortStats {
    students
        .par_iter()
        .fold(CohortTally::default, |mut tally, student| {
            tally.record(student);
            tally
        })
        .reduce(CohortTally::default, CohortTally::merge)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GradeRecord;

    fn student(id: &str, scores: &[f64]) -> Student {
        let grades = scores
            .iter()
            .map(|score| GradeRecord::new("Math", *score, 1.0, "HK1", 2024).unwrap())
            .collect();
        Student::new(id, format!("Student {id}")).with_grades(grades)
    }

    #[test]
    fn counts_graded_students_and_bands() {
        let population = vec![
            student("SV001", &[9.0, 9.0]),
            student("SV002", &[6.0, 6.0]),
            student("SV003", &[]),
        ];

        let stats = aggregate(&population);
        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.students_with_grades, 2);
        assert_eq!(stats.counts.excellent, 1);
        assert_eq!(stats.counts.fair, 1);
        assert_eq!(stats.counts.good, 0);
        assert_eq!(stats.counts.average, 0);
        assert_eq!(stats.counts.poor, 0);

        let percentages = stats.percentages.expect("graded students present");
        assert_eq!(percentages.formatted(Band::Excellent), "50.0%");
        assert_eq!(percentages.formatted(Band::Fair), "50.0%");
        assert_eq!(percentages.formatted(Band::Poor), "0.0%");
    }

    #[test]
    fn no_percentages_without_graded_students() {
        let population = vec![student("SV001", &[]), student("SV002", &[])];
        let stats = aggregate(&population);
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.students_with_grades, 0);
        assert!(stats.percentages.is_none());
        assert!(stats.mean_score.is_none());
        assert_eq!(stats.counts.total(), 0);
    }

    #[test]
    fn empty_population() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_students, 0);
        assert!(stats.percentages.is_none());
    }

    #[test]
    fn band_counts_sum_to_graded_students() {
        let population = vec![
            student("A", &[10.0]),
            student("B", &[7.0]),
            student("C", &[5.5]),
            student("D", &[4.0]),
            student("E", &[3.9]),
            student("F", &[]),
        ];
        let stats = aggregate(&population);
        assert_eq!(stats.counts.total(), stats.students_with_grades);
        for band in Band::ALL {
            assert_eq!(stats.counts.get(band), 1, "{band:?}");
        }
    }

    #[test]
    fn unreadable_average_is_skipped() {
        let mut tally = CohortTally::default();
        tally.record(&student("SV001", &[9.0]));
        tally.record_with_average(&student("SV002", &[6.0]), "not-a-number");
        tally.record(&student("SV003", &[]));
        let stats = tally.finish();

        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.students_with_grades, 2);
        assert_eq!(stats.total_grades, 2);
        assert_eq!(stats.counts.total(), 1);
        assert_eq!(stats.counts.excellent, 1);
    }

    #[test]
    fn banding_ignores_grade_order() {
        let pairs = [(8.51, 4.0), (6.13, 3.0), (5.84, 3.0)];
        let grades: Vec<GradeRecord> = pairs
            .iter()
            .map(|(score, coefficient)| {
                GradeRecord::new("Math", *score, *coefficient, "HK1", 2024).unwrap()
            })
            .collect();
        let mut reversed = grades.clone();
        reversed.reverse();

        let forward = aggregate(&[Student::new("SV001", "A").with_grades(grades)]);
        let backward = aggregate(&[Student::new("SV001", "A").with_grades(reversed)]);
        assert_eq!(forward, backward);
        assert_eq!(forward.counts.total(), 1);
    }

    #[test]
    fn mean_score_is_unweighted() {
        let grades = vec![
            GradeRecord::new("Math", 10.0, 3.0, "HK1", 2024).unwrap(),
            GradeRecord::new("Art", 4.0, 1.0, "HK1", 2024).unwrap(),
        ];
        let population = vec![Student::new("SV001", "A").with_grades(grades)];
        let stats = aggregate(&population);
        assert_eq!(stats.total_grades, 2);
        assert!((stats.mean_score.unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_matches_sequential() {
        let population: Vec<Student> = (0..500)
            .map(|i| {
                let score = (i % 11) as f64 * 0.95;
                if i % 7 == 0 {
                    student(&format!("SV{i:04}"), &[])
                } else {
                    student(&format!("SV{i:04}"), &[score, 10.0 - score / 2.0])
                }
            })
            .collect();

        let sequential = aggregate_sequential(&population);
        let parallel = aggregate_parallel(&population);
        assert_eq!(sequential.total_students, parallel.total_students);
        assert_eq!(sequential.students_with_grades, parallel.students_with_grades);
        assert_eq!(sequential.total_grades, parallel.total_grades);
        assert_eq!(sequential.counts, parallel.counts);
        assert_eq!(sequential.percentages, parallel.percentages);
        let diff = sequential.mean_score.unwrap() - parallel.mean_score.unwrap();
        assert!(diff.abs() < 1e-9);
    }

    #[test]
    fn merge_combines_disjoint_tallies() {
        let population = vec![
            student("A", &[9.0]),
            student("B", &[2.0]),
            student("C", &[]),
        ];
        let mut left = CohortTally::default();
        left.record(&population[0]);
        let mut right = CohortTally::default();
        right.record(&population[1]);
        right.record(&population[2]);

        let merged = left.merge(right).finish();
        assert_eq!(merged, aggregate_sequential(&population));
    }
}
