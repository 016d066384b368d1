use std::collections::HashMap;

use anyhow::Context;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::GradeError;
use crate::models::{GradeRecord, Student};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_student(
    conn: &mut PgConnection,
    student_code: &str,
    full_name: &str,
    email: Option<&str>,
    major: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO student_grades.students (id, student_code, full_name, email, major)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_code) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            email = COALESCE(EXCLUDED.email, student_grades.students.email),
            major = COALESCE(EXCLUDED.major, student_grades.students.major)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_code)
    .bind(full_name)
    .bind(email)
    .bind(major)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("failed to upsert student {student_code}"))?
    .get("id");

    Ok(id)
}

async fn insert_grade(
    conn: &mut PgConnection,
    student_id: Uuid,
    grade: &GradeRecord,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO student_grades.grades
        (id, student_id, subject, score, coefficient, semester, year, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(grade.subject())
    .bind(grade.score())
    .bind(grade.coefficient())
    .bind(grade.semester())
    .bind(grade.year())
    .bind(source_key)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        ("SV001", "Nguyễn Văn An", "an.nguyen@example.edu", "Computer Science"),
        ("SV002", "Trần Thị Bình", "binh.tran@example.edu", "Mathematics"),
        ("SV003", "Lê Minh Châu", "chau.le@example.edu", "Physics"),
        ("SV004", "Phạm Quốc Dũng", "dung.pham@example.edu", "Economics"),
    ];

    let mut tx = pool.begin().await?;

    let mut ids = HashMap::new();
    for (code, name, email, major) in students {
        let id = upsert_student(&mut tx, code, name, Some(email), Some(major)).await?;
        ids.insert(code, id);
    }

    // SV004 is left without grades on purpose.
    let grades = vec![
        ("seed-001", "SV001", "Lập trình C", 9.0, 3.0, "HK1", 2024),
        ("seed-002", "SV001", "Toán rời rạc", 8.5, 2.0, "HK1", 2024),
        ("seed-003", "SV001", "Tiếng Anh", 7.5, 1.0, "HK2", 2024),
        ("seed-004", "SV002", "Giải tích", 6.0, 3.0, "HK1", 2024),
        ("seed-005", "SV002", "Đại số", 7.1, 2.0, "HK1", 2024),
        ("seed-006", "SV002", "Xác suất", 5.0, 2.0, "HK2", 2024),
        ("seed-007", "SV003", "Cơ học", 3.5, 3.0, "HK1", 2024),
        ("seed-008", "SV003", "Điện từ", 4.5, 3.0, "HK2", 2024),
    ];

    for (source_key, code, subject, score, coefficient, semester, year) in grades {
        let student_id = *ids.get(code).context("seed grade for unknown student")?;
        let grade = GradeRecord::new(subject, score, coefficient, semester, year)?;
        insert_grade(&mut tx, student_id, &grade, source_key).await?;
    }

    tx.commit().await?;
    Ok(())
}

#[derive(serde::Deserialize)]
struct CsvRow {
    student_id: String,
    full_name: String,
    email: Option<String>,
    major: Option<String>,
    subject: String,
    score: f64,
    coefficient: f64,
    semester: String,
    year: i32,
    source_key: Option<String>,
}

/// A CSV row that passed parsing and grade validation.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub line: u64,
    pub student_id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub major: Option<String>,
    pub grade: GradeRecord,
    pub source_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub rows: Vec<ImportRow>,
    pub rejected: usize,
}

/// Read grade rows, rejecting any row that is malformed, fails to parse or
/// fails grade validation. Only unreadable input aborts the batch.
pub fn read_import_rows<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<ImportBatch> {
    let headers = reader.headers().context("failed to read csv header")?.clone();
    let mut record = csv::StringRecord::new();
    let mut batch = ImportBatch::default();

    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                if let csv::ErrorKind::UnequalLengths { pos, .. } = err.kind() {
                    let line = pos.as_ref().map(|p| p.line());
                    warn!(?line, %err, "rejecting malformed csv row");
                    batch.rejected += 1;
                    continue;
                }
                return Err(err).context("failed to read csv row");
            }
        }

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: CsvRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(err) => {
                warn!(line, %err, "rejecting unparsable grade row");
                batch.rejected += 1;
                continue;
            }
        };

        match GradeRecord::new(
            row.subject.as_str(),
            row.score,
            row.coefficient,
            row.semester.as_str(),
            row.year,
        ) {
            Ok(grade) => batch.rows.push(ImportRow {
                line,
                student_id: row.student_id,
                full_name: row.full_name,
                email: row.email,
                major: row.major,
                grade,
                source_key: row.source_key,
            }),
            Err(err) => {
                warn!(line, student = %row.student_id, %err, "rejecting grade row");
                batch.rejected += 1;
            }
        }
    }

    Ok(batch)
}

/// Import every valid row in one transaction; a database failure leaves
/// nothing written.
pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportOutcome> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let batch = read_import_rows(reader)?;
    let mut outcome = ImportOutcome {
        rejected: batch.rejected,
        ..ImportOutcome::default()
    };

    let mut tx = pool.begin().await?;
    for row in batch.rows {
        let student_id = upsert_student(
            &mut tx,
            &row.student_id,
            &row.full_name,
            row.email.as_deref(),
            row.major.as_deref(),
        )
        .await
        .with_context(|| format!("line {}", row.line))?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_grade(&mut tx, student_id, &row.grade, &source_key).await? {
            outcome.inserted += 1;
        } else {
            outcome.duplicates += 1;
        }
    }
    tx.commit().await?;

    info!(
        inserted = outcome.inserted,
        duplicates = outcome.duplicates,
        rejected = outcome.rejected,
        "csv import finished"
    );
    Ok(outcome)
}

fn student_from_row(row: &PgRow) -> Student {
    Student {
        student_id: row.get("student_code"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
        major: row.get("major"),
        grades: Vec::new(),
    }
}

fn grade_from_row(row: &PgRow) -> Result<GradeRecord, GradeError> {
    GradeRecord::new(
        row.get::<String, _>("subject"),
        row.get("score"),
        row.get("coefficient"),
        row.get::<String, _>("semester"),
        row.get("year"),
    )
}

/// Every student with grades preloaded, ordered by student code.
pub async fn fetch_students(pool: &PgPool) -> anyhow::Result<Vec<Student>> {
    let student_rows = sqlx::query(
        "SELECT id, student_code, full_name, email, phone_number, major \
         FROM student_grades.students \
         ORDER BY student_code",
    )
    .fetch_all(pool)
    .await
    .context("failed to load students")?;

    let grade_rows = sqlx::query(
        "SELECT student_id, subject, score, coefficient, semester, year \
         FROM student_grades.grades \
         ORDER BY year, semester, subject",
    )
    .fetch_all(pool)
    .await
    .context("failed to load grades")?;

    let mut grades_by_student: HashMap<Uuid, Vec<GradeRecord>> = HashMap::new();
    for row in grade_rows {
        let student_id: Uuid = row.get("student_id");
        match grade_from_row(&row) {
            Ok(grade) => grades_by_student.entry(student_id).or_default().push(grade),
            Err(err) => warn!(%student_id, %err, "skipping stored grade"),
        }
    }

    let students = student_rows
        .iter()
        .map(|row| {
            let id: Uuid = row.get("id");
            let mut student = student_from_row(row);
            student.grades = grades_by_student.remove(&id).unwrap_or_default();
            student
        })
        .collect();

    Ok(students)
}

pub async fn fetch_student(pool: &PgPool, student_code: &str) -> anyhow::Result<Option<Student>> {
    let Some(row) = sqlx::query(
        "SELECT id, student_code, full_name, email, phone_number, major \
         FROM student_grades.students \
         WHERE student_code = $1",
    )
    .bind(student_code)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let id: Uuid = row.get("id");
    let mut student = student_from_row(&row);

    let grade_rows = sqlx::query(
        "SELECT subject, score, coefficient, semester, year \
         FROM student_grades.grades \
         WHERE student_id = $1 \
         ORDER BY year, semester, subject",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    for row in grade_rows {
        match grade_from_row(&row) {
            Ok(grade) => student.grades.push(grade),
            Err(err) => warn!(student = student_code, %err, "skipping stored grade"),
        }
    }

    Ok(Some(student))
}
