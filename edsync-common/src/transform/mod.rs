//! Transformation orchestrators
//!
//! One module per entity family. Each composes custom-field resolution,
//! type coercion and reshaping into a `transform_*` function that yields a
//! destination-shaped record (or a list of them). Transforms are pure
//! except for the cohort parent-type input, which callers resolve through
//! whichever lookup source their mode uses.

pub mod attendance;
pub mod cohort;
pub mod mapping;
pub mod project;
pub mod registration;
pub mod tracking;
pub mod user;

pub use attendance::{group_attendance, transform_attendance};
pub use cohort::{classify_cohort_type, normalize_parent_type, transform_cohort};
pub use project::{
    transform_project, transform_task_trackings, transform_task_update, transform_template_tasks,
};
pub use registration::transform_registrations;
pub use tracking::{
    transform_assessment, transform_content_tracker, transform_course_status,
    transform_course_tracker,
};
pub use user::{transform_cohort_members, transform_user};
