//! Routing tables from update keys to handlers.
//!
//! The registry is filled once at startup through [`RegistryBuilder`] and is
//! read-only afterwards, so the dispatcher shares it behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

use crate::bot::context::HandlerContext;
use crate::database::models::UserMode;

pub type HandlerResult = anyhow::Result<()>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;
pub type Handler = Arc<dyn Fn(HandlerContext) -> HandlerFuture + Send + Sync>;
pub type MessagePredicate = Arc<dyn Fn(&str, &UserMode) -> bool + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command '/{0}' is registered twice")]
    DuplicateCommand(String),
    #[error("callback prefix '{0}' is registered twice")]
    DuplicateCallbackPrefix(String),
    #[error("invalid command name '{0}'")]
    InvalidCommand(String),
    #[error("invalid callback prefix '{0}': use 'word:' or a bare token without ':'")]
    InvalidCallbackPrefix(String),
}

struct MessageRoute {
    name: String,
    predicate: MessagePredicate,
    handler: Handler,
}

pub struct HandlerRegistry {
    commands: HashMap<String, Handler>,
    callbacks: HashMap<String, Handler>,
    messages: Vec<MessageRoute>,
}

/// Lookup key of a callback token: everything up to and including the first
/// `:`, or the whole token when it has none. `menu:item:3` → `menu:`.
pub fn callback_key(data: &str) -> &str {
    match data.find(':') {
        Some(i) => &data[..=i],
        None => data,
    }
}

fn boxed<F, Fut>(handler: F) -> Handler
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(handler(ctx)) as HandlerFuture)
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            registry: HandlerRegistry {
                commands: HashMap::new(),
                callbacks: HashMap::new(),
                messages: Vec::new(),
            },
            errors: Vec::new(),
        }
    }

    pub fn command(&self, name: &str) -> Option<&Handler> {
        self.commands.get(&name.to_lowercase())
    }

    pub fn callback(&self, data: &str) -> Option<&Handler> {
        self.callbacks.get(callback_key(data))
    }

    /// First message route whose predicate accepts the text, in registration order.
    pub fn message(&self, text: &str, mode: &UserMode) -> Option<(&str, &Handler)> {
        self.messages
            .iter()
            .find(|route| (route.predicate)(text, mode))
            .map(|route| (route.name.as_str(), &route.handler))
    }

    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn callback_prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.callbacks.keys().map(String::as_str).collect();
        prefixes.sort_unstable();
        prefixes
    }

    pub fn message_routes(&self) -> Vec<&str> {
        self.messages.iter().map(|route| route.name.as_str()).collect()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("commands", &self.command_names())
            .field("callbacks", &self.callback_prefixes())
            .field("messages", &self.message_routes())
            .finish()
    }
}

/// One-shot registration. Mistakes are collected and reported by [`build`](Self::build).
pub struct RegistryBuilder {
    registry: HandlerRegistry,
    errors: Vec<RegistryError>,
}

impl RegistryBuilder {
    pub fn command<F, Fut>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let name = name.trim_start_matches('/').to_lowercase();
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '@') {
            self.errors.push(RegistryError::InvalidCommand(name));
            return self;
        }
        if self.registry.commands.insert(name.clone(), boxed(handler)).is_some() {
            self.errors.push(RegistryError::DuplicateCommand(name));
        }
        self
    }

    pub fn callback<F, Fut>(mut self, prefix: &str, handler: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        if prefix.is_empty() || callback_key(prefix) != prefix {
            self.errors.push(RegistryError::InvalidCallbackPrefix(prefix.to_string()));
            return self;
        }
        if self.registry.callbacks.insert(prefix.to_string(), boxed(handler)).is_some() {
            self.errors.push(RegistryError::DuplicateCallbackPrefix(prefix.to_string()));
        }
        self
    }

    pub fn message<P, F, Fut>(mut self, name: &str, predicate: P, handler: F) -> Self
    where
        P: Fn(&str, &UserMode) -> bool + Send + Sync + 'static,
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.messages.push(MessageRoute {
            name: name.to_string(),
            predicate: Arc::new(predicate),
            handler: boxed(handler),
        });
        self
    }

    pub fn build(mut self) -> Result<HandlerRegistry, RegistryError> {
        if self.errors.is_empty() {
            Ok(self.registry)
        } else {
            Err(self.errors.remove(0))
        }
    }
}
