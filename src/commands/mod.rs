pub mod analyze;
pub mod monitor;
