pub mod assessments;
pub mod catalog;
pub mod core;
pub mod enrollment;
pub mod grades;
pub mod schemes;
