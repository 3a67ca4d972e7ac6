pub mod commands;
pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod keyboard;
pub mod registry;
pub mod reply;
pub mod update;
