pub mod record;
pub mod report;
pub mod utils;

// Re-export handler functions for use in routing
pub use record::{deactivate as grade_deactivate, edit as grade_edit, get as grade_get};
pub use record::{list as grade_list, register as grade_register};
pub use report::{roster as grade_roster, student_summary as grade_student_summary};
pub use report::transcript as grade_transcript;
