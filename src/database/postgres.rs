use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::info;
use uuid::Uuid;

use super::models::{
    Course, Enrollment, EnrollmentWithCourse, GradeFilter, GradeRecord, Page, RosterEntry,
    Subject, UserIdentity,
};
use super::store::{SchoolStore, StoreError};
use crate::grading::{GradeEdit, GradingPolicy};
use crate::types::Period;

const GRADE_COLUMNS: &str = "id, student_id, subject_id, course_id, period, cycle, classwork, \
     exam, total, remarks, recorded_by, active, created_at, updated_at";

const COURSE_COLUMNS: &str = "id, stage, grade_level, section, shift, cycle, active";

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Statements that do not depend on the grading policy. All idempotent.
const TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        surname TEXT NOT NULL,
        role TEXT NOT NULL,
        student_code TEXT UNIQUE,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS courses (
        id UUID PRIMARY KEY,
        stage TEXT NOT NULL,
        grade_level TEXT NOT NULL,
        section TEXT NOT NULL,
        shift TEXT NOT NULL,
        cycle INTEGER NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS subjects (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        course_id UUID NOT NULL REFERENCES courses(id),
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (name, course_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS enrollments (
        id UUID PRIMARY KEY,
        student_id UUID NOT NULL REFERENCES users(id),
        course_id UUID NOT NULL REFERENCES courses(id),
        cycle INTEGER NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (student_id, course_id, cycle)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS grades (
        id UUID PRIMARY KEY,
        student_id UUID NOT NULL REFERENCES users(id),
        subject_id UUID NOT NULL REFERENCES subjects(id),
        course_id UUID NOT NULL REFERENCES courses(id),
        period SMALLINT NOT NULL CHECK (period BETWEEN 1 AND 4),
        cycle INTEGER NOT NULL,
        classwork DOUBLE PRECISION NOT NULL,
        exam DOUBLE PRECISION NOT NULL,
        total DOUBLE PRECISION NOT NULL,
        remarks TEXT NOT NULL DEFAULT '',
        recorded_by UUID NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS grades_active_unique
        ON grades (student_id, subject_id, period, cycle) WHERE active"#,
    r#"CREATE INDEX IF NOT EXISTS grades_student_cycle
        ON grades (student_id, cycle) WHERE active"#,
];

/// Full schema, applied in order by `PgStore::migrate`. The component range
/// constraint is dropped and re-added on every run so it follows the
/// configured policy even on an existing table.
fn schema(policy: &GradingPolicy) -> Vec<String> {
    let mut statements: Vec<String> = TABLES.iter().map(|s| s.to_string()).collect();
    statements.push("ALTER TABLE grades DROP CONSTRAINT IF EXISTS grades_component_range".to_string());
    statements.push(format!(
        "ALTER TABLE grades ADD CONSTRAINT grades_component_range \
         CHECK (classwork BETWEEN 0 AND {} AND exam BETWEEN 0 AND {})",
        policy.classwork_max, policy.exam_max
    ));
    statements
}

/// SchoolStore over a Postgres pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self, policy: &GradingPolicy) -> Result<(), StoreError> {
        let statements = schema(policy);
        let mut tx = self.pool.begin().await?;
        for statement in &statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!("Schema ready ({} statements)", statements.len());
        Ok(())
    }
}

fn grade_from_row(row: &PgRow) -> Result<GradeRecord, StoreError> {
    let period: i16 = row.try_get("period")?;
    let period = Period::new(period as i64)
        .ok_or_else(|| StoreError::Corrupt(format!("grade period {}", period)))?;

    Ok(GradeRecord {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        subject_id: row.try_get("subject_id")?,
        course_id: row.try_get("course_id")?,
        period,
        cycle: row.try_get("cycle")?,
        classwork: row.try_get("classwork")?,
        exam: row.try_get("exam")?,
        total: row.try_get("total")?,
        remarks: row.try_get("remarks")?,
        recorded_by: row.try_get("recorded_by")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn course_from_row(row: &PgRow) -> Result<Course, StoreError> {
    let stage: String = row.try_get("stage")?;
    Ok(Course {
        id: row.try_get("id")?,
        stage: stage.parse().map_err(StoreError::Corrupt)?,
        grade_level: row.try_get("grade_level")?,
        section: row.try_get("section")?,
        shift: row.try_get("shift")?,
        cycle: row.try_get("cycle")?,
        active: row.try_get("active")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<UserIdentity, StoreError> {
    let role: String = row.try_get("role")?;
    Ok(UserIdentity {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        surname: row.try_get("surname")?,
        role: role.parse().map_err(StoreError::Corrupt)?,
        student_code: row.try_get("student_code")?,
        active: row.try_get("active")?,
    })
}

fn subject_from_row(row: &PgRow) -> Result<Subject, StoreError> {
    Ok(Subject {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        course_id: row.try_get("course_id")?,
        active: row.try_get("active")?,
    })
}

fn enrollment_from_row(row: &PgRow) -> Result<Enrollment, StoreError> {
    Ok(Enrollment {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        course_id: row.try_get("course_id")?,
        cycle: row.try_get("cycle")?,
        active: row.try_get("active")?,
    })
}

fn push_grade_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &GradeFilter) {
    if let Some(id) = filter.student_id {
        qb.push(" AND student_id = ").push_bind(id);
    }
    if let Some(id) = filter.subject_id {
        qb.push(" AND subject_id = ").push_bind(id);
    }
    if let Some(id) = filter.course_id {
        qb.push(" AND course_id = ").push_bind(id);
    }
    if let Some(period) = filter.period {
        qb.push(" AND period = ").push_bind(period.number() as i16);
    }
    if let Some(cycle) = filter.cycle {
        qb.push(" AND cycle = ").push_bind(cycle);
    }
}

#[async_trait]
impl SchoolStore for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_grade(&self, grade: GradeRecord) -> Result<GradeRecord, StoreError> {
        let sql = format!(
            "INSERT INTO grades ({GRADE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {GRADE_COLUMNS}"
        );
        let result = sqlx::query(&sql)
            .bind(grade.id)
            .bind(grade.student_id)
            .bind(grade.subject_id)
            .bind(grade.course_id)
            .bind(grade.period.number() as i16)
            .bind(grade.cycle)
            .bind(grade.classwork)
            .bind(grade.exam)
            .bind(grade.total)
            .bind(&grade.remarks)
            .bind(grade.recorded_by)
            .bind(grade.active)
            .bind(grade.created_at)
            .bind(grade.updated_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => grade_from_row(&row),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_grade(&self, id: Uuid) -> Result<Option<GradeRecord>, StoreError> {
        let sql = format!("SELECT {GRADE_COLUMNS} FROM grades WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(grade_from_row).transpose()
    }

    async fn find_active_grade(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        period: Period,
        cycle: i32,
    ) -> Result<Option<GradeRecord>, StoreError> {
        let sql = format!(
            "SELECT {GRADE_COLUMNS} FROM grades \
             WHERE student_id = $1 AND subject_id = $2 AND period = $3 AND cycle = $4 AND active"
        );
        let row = sqlx::query(&sql)
            .bind(student_id)
            .bind(subject_id)
            .bind(period.number() as i16)
            .bind(cycle)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(grade_from_row).transpose()
    }

    async fn edit_active_grade(
        &self,
        id: Uuid,
        edit: &GradeEdit,
        now: DateTime<Utc>,
    ) -> Result<Option<GradeRecord>, StoreError> {
        // Unset components fall back to the row's current value inside the
        // same statement, so concurrent partial edits both land.
        let sql = format!(
            "UPDATE grades SET \
                classwork = COALESCE($2, classwork), \
                exam = COALESCE($3, exam), \
                total = COALESCE($2, classwork) + COALESCE($3, exam), \
                remarks = COALESCE($4, remarks), \
                updated_at = $5 \
             WHERE id = $1 AND active RETURNING {GRADE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(edit.classwork)
            .bind(edit.exam)
            .bind(edit.remarks.as_deref())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(grade_from_row).transpose()
    }

    async fn deactivate_grade(&self, id: Uuid) -> Result<Option<GradeRecord>, StoreError> {
        let sql = format!(
            "UPDATE grades SET active = FALSE, updated_at = $2 WHERE id = $1 RETURNING {GRADE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(grade_from_row).transpose()
    }

    async fn count_grades(&self, filter: &GradeFilter) -> Result<i64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS count FROM grades WHERE active");
        push_grade_filter(&mut qb, filter);
        let row = qb.build().fetch_one(&self.pool).await?;
        Ok(row.try_get("count")?)
    }

    async fn list_grades(
        &self,
        filter: &GradeFilter,
        page: Option<Page>,
    ) -> Result<Vec<GradeRecord>, StoreError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {GRADE_COLUMNS} FROM grades WHERE active"));
        push_grade_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC");
        if let Some(page) = page {
            qb.push(" LIMIT ").push_bind(page.limit);
            qb.push(" OFFSET ").push_bind(page.offset);
        }
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(grade_from_row).collect()
    }

    async fn find_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        cycle: i32,
    ) -> Result<Option<Enrollment>, StoreError> {
        let row = sqlx::query(
            "SELECT id, student_id, course_id, cycle, active FROM enrollments \
             WHERE student_id = $1 AND course_id = $2 AND cycle = $3 AND active",
        )
        .bind(student_id)
        .bind(course_id)
        .bind(cycle)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(enrollment_from_row).transpose()
    }

    async fn find_student_enrollment(
        &self,
        student_id: Uuid,
        cycle: i32,
    ) -> Result<Option<EnrollmentWithCourse>, StoreError> {
        let Some(row) = sqlx::query(
            "SELECT id, student_id, course_id, cycle, active FROM enrollments \
             WHERE student_id = $1 AND cycle = $2 AND active \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(student_id)
        .bind(cycle)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };
        let enrollment = enrollment_from_row(&row)?;

        let Some(course) = self.find_course(enrollment.course_id).await? else {
            return Ok(None);
        };
        Ok(Some(EnrollmentWithCourse { enrollment, course }))
    }

    async fn roster(&self, course_id: Uuid, cycle: i32) -> Result<Vec<RosterEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT e.id AS enrollment_id, u.id, u.name, u.surname, u.role, u.student_code, u.active \
             FROM enrollments e JOIN users u ON u.id = e.student_id \
             WHERE e.course_id = $1 AND e.cycle = $2 AND e.active",
        )
        .bind(course_id)
        .bind(cycle)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<RosterEntry, StoreError> {
                Ok(RosterEntry {
                    enrollment_id: row.try_get("enrollment_id")?,
                    student: user_from_row(row)?,
                })
            })
            .collect()
    }

    async fn course_subjects(&self, course_id: Uuid) -> Result<Vec<Subject>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, course_id, active FROM subjects \
             WHERE course_id = $1 AND active ORDER BY name ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(subject_from_row).collect()
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserIdentity>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, surname, role, student_code, active FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>, StoreError> {
        let row = sqlx::query("SELECT id, name, course_id, active FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(subject_from_row).transpose()
    }
}
