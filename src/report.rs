use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::bands::Band;
use crate::cohort::CohortStats;
use crate::format;
use crate::metric::Metric;
use crate::models::Student;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

pub fn build_statistics_report(stats: &CohortStats, generated_at: NaiveDateTime) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Grade Statistics Report");
    let _ = writeln!(output, "Generated {}", generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Total students: {}", stats.total_students);
    let _ = writeln!(output, "- Students with grades: {}", stats.students_with_grades);
    let _ = writeln!(output, "- Total grades recorded: {}", stats.total_grades);
    if let Some(mean) = stats.mean_score {
        let _ = writeln!(output, "- Mean score: {}", format::fixed(mean, 2));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## By Classification");
    for band in Band::ALL {
        let _ = writeln!(
            output,
            "- {} ({}): {} students",
            band.label(),
            band.threshold_label(),
            stats.counts.get(band)
        );
    }

    if let Some(percentages) = &stats.percentages {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Percentages");
        for band in Band::ALL {
            let _ = writeln!(output, "- {}: {}", band.label(), percentages.formatted(band));
        }
    }

    output
}

pub fn build_summary_report(students: &[Student], generated_at: NaiveDateTime) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Summary");
    let _ = writeln!(output, "Generated {}", generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(output, "Total students: {}", students.len());
    let _ = writeln!(output);

    if students.is_empty() {
        let _ = writeln!(output, "No students on the roster.");
        return output;
    }

    let _ = writeln!(
        output,
        "| Student | Name | Major | Subjects | {} | {} | {} | {} |",
        Metric::Average.name(),
        Metric::Letter.name(),
        Metric::Classification.name(),
        Metric::Gpa.name()
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");
    for student in students {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            student.student_id,
            student.full_name,
            or_na(student.major.as_deref()),
            student.grades.len(),
            Metric::Average.compute(&student.grades),
            Metric::Letter.compute(&student.grades),
            Metric::Classification.compute(&student.grades),
            Metric::Gpa.compute(&student.grades)
        );
    }

    output
}

pub fn build_transcript(student: &Student, generated_at: NaiveDateTime) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Transcript: {}", student.full_name);
    let _ = writeln!(output, "Generated {}", generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Student");
    let _ = writeln!(output, "- Student ID: {}", student.student_id);
    let _ = writeln!(output, "- Full name: {}", student.full_name);
    let _ = writeln!(output, "- Email: {}", or_na(student.email.as_deref()));
    let _ = writeln!(output, "- Phone: {}", or_na(student.phone_number.as_deref()));
    let _ = writeln!(output, "- Major: {}", or_na(student.major.as_deref()));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Grades");

    if student.grades.is_empty() {
        let _ = writeln!(output, "No grades recorded yet.");
    } else {
        let _ = writeln!(output, "| Subject | Score | Coefficient | Semester | Year |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for grade in &student.grades {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                grade.subject(),
                format::fixed(grade.score(), 2),
                format::fixed(grade.coefficient(), 1),
                grade.semester(),
                grade.year()
            );
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "Total subjects: {}", student.grades.len());
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Results");
    for metric in Metric::ALL {
        let _ = writeln!(output, "- {}: {}", metric.name(), metric.compute(&student.grades));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort;
    use crate::models::GradeRecord;
    use chrono::NaiveDate;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    fn graded_student() -> Student {
        let mut student = Student::new("SV001", "Nguyen Van A").with_grades(vec![
            GradeRecord::new("Math", 9.0, 2.0, "HK1", 2024).unwrap(),
            GradeRecord::new("History", 6.0, 1.0, "HK1", 2024).unwrap(),
        ]);
        student.major = Some("Computer Science".to_string());
        student
    }

    #[test]
    fn statistics_report_lists_every_band() {
        let population = vec![graded_student(), Student::new("SV002", "Tran Thi B")];
        let stats = cohort::aggregate(&population);
        let report = build_statistics_report(&stats, generated_at());

        assert!(report.contains("Generated 17/05/2024 14:30:05"));
        assert!(report.contains("- Total students: 2"));
        assert!(report.contains("- Students with grades: 1"));
        assert!(report.contains("- Mean score: 7.50"));
        assert!(report.contains("- Giỏi (≥ 7.0): 1 students"));
        assert!(report.contains("- Yếu (< 4.0): 0 students"));
        assert!(report.contains("- Giỏi: 100.0%"));
    }

    #[test]
    fn statistics_report_omits_percentages_without_grades() {
        let stats = cohort::aggregate(&[Student::new("SV002", "Tran Thi B")]);
        let report = build_statistics_report(&stats, generated_at());
        assert!(!report.contains("## Percentages"));
        assert!(!report.contains("Mean score"));
    }

    #[test]
    fn summary_report_has_a_row_per_student() {
        let students = vec![graded_student(), Student::new("SV002", "Tran Thi B")];
        let report = build_summary_report(&students, generated_at());
        assert!(report.contains("| SV001 | Nguyen Van A | Computer Science | 2 | 8.00 | B | Giỏi | 3.33 |"));
        assert!(report.contains("| SV002 | Tran Thi B | N/A | 0 | 0.0 | F | Không xếp loại | 0.00 |"));
    }

    #[test]
    fn summary_report_for_empty_roster() {
        let report = build_summary_report(&[], generated_at());
        assert!(report.contains("No students on the roster."));
    }

    #[test]
    fn transcript_lists_grades_and_results() {
        let report = build_transcript(&graded_student(), generated_at());
        assert!(report.contains("- Email: N/A"));
        assert!(report.contains("| Math | 9.00 | 2.0 | HK1 | 2024 |"));
        assert!(report.contains("Total subjects: 2"));
        assert!(report.contains("- GPA (4.0 Scale): 3.33"));
    }

    #[test]
    fn transcript_without_grades() {
        let report = build_transcript(&Student::new("SV009", "Le Van C"), generated_at());
        assert!(report.contains("No grades recorded yet."));
        assert!(report.contains("- Xếp Loại: Không xếp loại"));
    }
}
