pub mod callback;
pub mod general_message;
pub mod message;

use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::bot::commands::{admin, records, start};
use crate::bot::dispatcher::UpdateDispatcher;
use crate::bot::registry::{HandlerRegistry, RegistryError};
use crate::bot::update::InboundUpdate;

pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every command, button and text route the bot answers.
pub fn default_registry() -> Result<HandlerRegistry, RegistryError> {
    HandlerRegistry::builder()
        .command("start", start::handle_start)
        .command("help", start::handle_help)
        .command("menu", start::handle_menu)
        .command("cancel", start::handle_cancel)
        .command("set", records::handle_set)
        .command("get", records::handle_get)
        .command("del", records::handle_del)
        .command("list", records::handle_list)
        .command("forget", admin::handle_forget)
        .command("stats", admin::handle_stats)
        .callback(callback::MENU_PREFIX, callback::handle_menu_callback)
        .callback(callback::RECORD_PREFIX, callback::handle_record_callback)
        .message("pending_input", message::is_pending_input, message::handle_pending_input)
        .message("idle_hint", general_message::is_hint_text, general_message::handle_general_message)
        .build()
}

/// teloxide handler tree: every update goes through [`route_update`].
pub fn schema() -> UpdateHandler<TransportError> {
    dptree::endpoint(route_update)
}

pub async fn route_update(update: Update, dispatcher: Arc<UpdateDispatcher>) -> Result<(), TransportError> {
    match InboundUpdate::from_telegram(&update, dispatcher.bot_username()) {
        Some(inbound) => {
            dispatcher.dispatch(inbound).await;
        }
        None => tracing::debug!("Ignoring update {} of an unhandled kind", update.id),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::commands::Command;

    #[test]
    fn test_default_registry_covers_commands() {
        let registry = default_registry().unwrap();
        let mut expected = Command::NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(registry.command_names(), expected);
        assert_eq!(registry.callback_prefixes(), vec!["menu:", "record:"]);
        assert_eq!(registry.message_routes(), vec!["pending_input", "idle_hint"]);
    }
}
