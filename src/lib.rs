//! # Keeper Bot
//!
//! A Telegram bot that keeps small named records per user in SQLite.
//!
//! ## Features
//! - `/set`, `/get`, `/del` and `/list` for records made of plain text or `key=value` fields
//! - Inline menu with an add-record conversation
//! - Per-chat ordered update dispatch with an explicit handler registry
//! - Health endpoints and periodic cleanup of abandoned conversations

/// Startup and graceful shutdown
pub mod app;
/// Update routing, handlers, keyboards and the reply outbox
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, migrations and the record store
pub mod database;
/// Background services: health server and maintenance jobs
pub mod services;
/// Utility functions for datetime, validation, logging and formatting
pub mod utils;
