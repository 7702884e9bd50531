pub mod config;
pub mod core;
pub mod marks;
pub mod merit;
pub mod results;
