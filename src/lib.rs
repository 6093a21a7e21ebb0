pub mod analysis;
pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod repositories;
pub mod services;
