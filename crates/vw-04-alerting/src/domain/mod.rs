//! Alert rules

pub mod debounce;
pub mod messages;
pub mod missed;
pub mod stagnation;
pub mod window;
