pub mod api_types;
pub mod catalog_store;
pub mod client;
pub mod config;
pub mod feed;
pub mod importer;
pub mod resolver;
pub mod server;
pub mod service;
pub mod sqlite_persistence;
