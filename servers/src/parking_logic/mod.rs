pub mod config;
pub mod console;
pub mod display;
pub mod logger;
