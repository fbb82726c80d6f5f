pub mod agent;
pub mod errors;
pub mod files;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod tools;
