//! Report writing and console presentation.

pub mod console;
pub mod generator;
pub mod tables;

pub use generator::{generate_json_report, generate_markdown_report, write_report_atomic};
