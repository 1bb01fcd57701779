pub mod fetch_chain;
pub mod predictor;
pub mod scheduler;
pub mod sources;

pub use fetch_chain::*;
pub use predictor::*;
pub use scheduler::*;
