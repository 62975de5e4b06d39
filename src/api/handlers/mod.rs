pub mod core;
pub mod maintenance;
pub mod registration;
pub mod reports;
pub mod scan;
pub mod subjects;
