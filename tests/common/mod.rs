#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gradebook_api::app::{router, AppState};
use gradebook_api::auth::{generate_jwt, Claims};
use gradebook_api::database::models::{
    Course, Enrollment, EnrollmentWithCourse, GradeFilter, GradeRecord, Page, RosterEntry,
    Subject, UserIdentity,
};
use gradebook_api::database::{MemoryStore, SchoolStore, StoreError};
use gradebook_api::grading::GradeEdit;
use gradebook_api::services::{GradeService, GradeServiceConfig, RegisterGrade};
use gradebook_api::types::{EducationStage, Period, Role};

pub const CYCLE: i64 = 2024;

/// A small school: a BASICO course with two subjects and two enrolled
/// students, a DIVERSIFICADO course with one subject and one student, and a
/// student enrolled nowhere.
pub struct School {
    pub store: Arc<MemoryStore>,
    pub course_id: Uuid,
    pub math_id: Uuid,
    pub art_id: Uuid,
    pub upper_course_id: Uuid,
    pub physics_id: Uuid,
    pub ana: Uuid,
    pub luis: Uuid,
    pub carla: Uuid,
    pub outsider: Uuid,
    pub teacher: Uuid,
}

fn user(name: &str, surname: &str, role: Role, code: Option<&str>) -> UserIdentity {
    UserIdentity {
        id: Uuid::new_v4(),
        name: name.to_string(),
        surname: surname.to_string(),
        role,
        student_code: code.map(str::to_string),
        active: true,
    }
}

pub async fn seed() -> School {
    let store = Arc::new(MemoryStore::new());

    let course = Course {
        id: Uuid::new_v4(),
        stage: EducationStage::Basico,
        grade_level: "PRIMERO_BASICO".to_string(),
        section: "A".to_string(),
        shift: "MATUTINA".to_string(),
        cycle: CYCLE as i32,
        active: true,
    };
    let math = Subject {
        id: Uuid::new_v4(),
        name: "Matemáticas".to_string(),
        course_id: course.id,
        active: true,
    };
    let art = Subject {
        id: Uuid::new_v4(),
        name: "Artes".to_string(),
        course_id: course.id,
        active: true,
    };

    let upper = Course {
        id: Uuid::new_v4(),
        stage: EducationStage::Diversificado,
        grade_level: "CUARTO_BACHILLERATO".to_string(),
        section: "B".to_string(),
        shift: "VESPERTINA".to_string(),
        cycle: CYCLE as i32,
        active: true,
    };
    let physics = Subject {
        id: Uuid::new_v4(),
        name: "Física".to_string(),
        course_id: upper.id,
        active: true,
    };

    let ana = user("Ana", "Pérez", Role::Student, Some("EST-001"));
    let luis = user("Luis", "Álvarez", Role::Student, None);
    let carla = user("Carla", "Méndez", Role::Student, Some("EST-040"));
    let outsider = user("Eva", "Soto", Role::Student, Some("EST-099"));
    let teacher = user("Marta", "García", Role::Teacher, None);

    for (student, course_id) in [(&ana, course.id), (&luis, course.id), (&carla, upper.id)] {
        store
            .add_enrollment(Enrollment {
                id: Uuid::new_v4(),
                student_id: student.id,
                course_id,
                cycle: CYCLE as i32,
                active: true,
            })
            .await;
    }

    let school = School {
        store: store.clone(),
        course_id: course.id,
        math_id: math.id,
        art_id: art.id,
        upper_course_id: upper.id,
        physics_id: physics.id,
        ana: ana.id,
        luis: luis.id,
        carla: carla.id,
        outsider: outsider.id,
        teacher: teacher.id,
    };

    store.add_course(course).await;
    store.add_course(upper).await;
    store.add_subject(math).await;
    store.add_subject(art).await;
    store.add_subject(physics).await;
    for u in [ana, luis, carla, outsider, teacher] {
        store.add_user(u).await;
    }
    school
}

impl School {
    pub fn service(&self) -> GradeService {
        GradeService::new(self.store.clone(), GradeServiceConfig::default())
    }

    pub fn grade(&self, student: Uuid, subject: Uuid, period: i64, classwork: f64, exam: f64) -> RegisterGrade {
        self.grade_in(self.course_id, student, subject, period, classwork, exam)
    }

    pub fn grade_in(
        &self,
        course: Uuid,
        student: Uuid,
        subject: Uuid,
        period: i64,
        classwork: f64,
        exam: f64,
    ) -> RegisterGrade {
        RegisterGrade {
            student_id: student,
            subject_id: subject,
            course_id: course,
            period: Some(period),
            cycle: Some(CYCLE),
            classwork: Some(classwork),
            exam: Some(exam),
            remarks: None,
        }
    }
}

/// Router served on an ephemeral local port for the lifetime of the test runtime
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn(school: &School) -> Result<Self> {
        Self::spawn_with(school.store.clone()).await
    }

    pub async fn spawn_with(store: Arc<dyn SchoolStore>) -> Result<Self> {
        let state = AppState::new(store, GradeServiceConfig::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router(state)).await {
                eprintln!("test server stopped: {}", e);
            }
        });

        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn token(user: Uuid, role: Role) -> Result<String> {
    Ok(generate_jwt(&Claims::new(user, role))?)
}

/// Delegates to a `MemoryStore`, sleeping before grade reads and edits so
/// that callers racing each other overlap deterministically. Can also report
/// itself unhealthy.
pub struct ThrottledStore {
    pub inner: Arc<MemoryStore>,
    pub delay: Duration,
    pub healthy: bool,
}

impl ThrottledStore {
    pub fn new(inner: Arc<MemoryStore>, delay: Duration) -> Self {
        Self { inner, delay, healthy: true }
    }

    pub fn unhealthy(inner: Arc<MemoryStore>) -> Self {
        Self { inner, delay: Duration::ZERO, healthy: false }
    }
}

#[async_trait]
impl SchoolStore for ThrottledStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        if self.healthy {
            self.inner.health_check().await
        } else {
            Err(StoreError::Corrupt("connection refused".to_string()))
        }
    }

    async fn insert_grade(&self, grade: GradeRecord) -> Result<GradeRecord, StoreError> {
        self.inner.insert_grade(grade).await
    }

    async fn find_grade(&self, id: Uuid) -> Result<Option<GradeRecord>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_grade(id).await
    }

    async fn find_active_grade(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        period: Period,
        cycle: i32,
    ) -> Result<Option<GradeRecord>, StoreError> {
        self.inner.find_active_grade(student_id, subject_id, period, cycle).await
    }

    async fn edit_active_grade(
        &self,
        id: Uuid,
        edit: &GradeEdit,
        now: DateTime<Utc>,
    ) -> Result<Option<GradeRecord>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.edit_active_grade(id, edit, now).await
    }

    async fn deactivate_grade(&self, id: Uuid) -> Result<Option<GradeRecord>, StoreError> {
        self.inner.deactivate_grade(id).await
    }

    async fn count_grades(&self, filter: &GradeFilter) -> Result<i64, StoreError> {
        self.inner.count_grades(filter).await
    }

    async fn list_grades(
        &self,
        filter: &GradeFilter,
        page: Option<Page>,
    ) -> Result<Vec<GradeRecord>, StoreError> {
        self.inner.list_grades(filter, page).await
    }

    async fn find_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        cycle: i32,
    ) -> Result<Option<Enrollment>, StoreError> {
        self.inner.find_enrollment(student_id, course_id, cycle).await
    }

    async fn find_student_enrollment(
        &self,
        student_id: Uuid,
        cycle: i32,
    ) -> Result<Option<EnrollmentWithCourse>, StoreError> {
        self.inner.find_student_enrollment(student_id, cycle).await
    }

    async fn roster(&self, course_id: Uuid, cycle: i32) -> Result<Vec<RosterEntry>, StoreError> {
        self.inner.roster(course_id, cycle).await
    }

    async fn course_subjects(&self, course_id: Uuid) -> Result<Vec<Subject>, StoreError> {
        self.inner.course_subjects(course_id).await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserIdentity>, StoreError> {
        self.inner.find_user(id).await
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        self.inner.find_course(id).await
    }

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>, StoreError> {
        self.inner.find_subject(id).await
    }
}
