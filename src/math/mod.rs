pub mod dice;
pub mod stats;
