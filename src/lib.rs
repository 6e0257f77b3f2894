pub mod bot;
pub mod browse;
pub mod client;
pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod fetch;
pub mod image;
pub mod loader;
pub mod logging;
pub mod view;
