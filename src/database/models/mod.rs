pub mod course;
pub mod enrollment;
pub mod grade;
pub mod subject;
pub mod user;

pub use course::Course;
pub use enrollment::{Enrollment, EnrollmentWithCourse, RosterEntry};
pub use grade::{GradeFilter, GradeRecord, Page};
pub use subject::Subject;
pub use user::UserIdentity;
