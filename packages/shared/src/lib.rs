//! Utilities shared by the Tsudoi packages: logging setup and the clock abstraction.

pub mod logger;
pub mod time;
