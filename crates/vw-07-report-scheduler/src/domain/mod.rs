pub mod report;
pub mod time;
