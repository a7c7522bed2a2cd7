pub mod cli;
pub mod ctx;
pub mod dims;
pub mod error;
pub mod input;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod schema;
pub mod scores;
