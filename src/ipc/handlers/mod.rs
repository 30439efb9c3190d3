pub mod backup;
pub mod core;
pub mod grading;
pub mod records;
pub mod stats;
