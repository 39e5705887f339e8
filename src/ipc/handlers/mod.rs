pub mod catalog;
pub mod core;
pub mod gpa;
mod params;
