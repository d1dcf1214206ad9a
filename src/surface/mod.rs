pub mod extractor;
pub mod memory;
pub mod surface_model;
