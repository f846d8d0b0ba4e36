pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod matching;
pub mod mentions;
pub mod query;
pub mod resolver;
pub mod store;
pub mod types;
