pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod form;
pub mod handlers;
pub mod models;
pub mod validate;
