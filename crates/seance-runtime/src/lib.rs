pub mod controller;
pub mod scheduler;

pub use controller::*;
pub use scheduler::*;
