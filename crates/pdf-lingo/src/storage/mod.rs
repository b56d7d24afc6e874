//! Storage for generated output files

mod output_store;

pub use output_store::{secure_filename, OutputStore};
