pub mod json_writer;
pub mod metadata;
pub mod plot;
pub mod summary;
pub mod volume;
