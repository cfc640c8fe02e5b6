pub mod alarm;
pub mod config;
pub mod puzzle;
pub mod stats;
