//! Presale admin server library.
//!
//! HTTP backend for a presale website's administrative data: the presale end
//! date, the progress bar percentage, registered wallet addresses, and a
//! single-admin password gate issuing short-lived session tokens.
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod server;
