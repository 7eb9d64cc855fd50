//! Webhook target resolution
//!
//! Picks the registration webhook from the configured candidates
//! (injected override, primary endpoint, fallback endpoint) and
//! completes host-only targets with the known `/webhook/{id}` path.

mod resolver;

pub use resolver::{ConfigurationError, ResolvedWebhook, WebhookResolver, WebhookSource};
