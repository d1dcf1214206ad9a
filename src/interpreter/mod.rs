pub mod interpreter;
pub mod report_model;
