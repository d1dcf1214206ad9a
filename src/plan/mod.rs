pub mod client;
pub mod plan_model;
