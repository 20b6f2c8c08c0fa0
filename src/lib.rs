pub mod catalog;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod input;
pub mod metadata;
pub mod output;
pub mod probe;
pub mod registry;
pub mod schema;
pub mod table;
