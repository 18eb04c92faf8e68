//! Collaborator ports for confirmation dialogs, toasts, and navigation.
//!
//! The core decides *when* to confirm or navigate, never *how*; the
//! presentation layer supplies these at construction. No service locator.

use async_trait::async_trait;
use serde_json::Value;

/// Confirmation/toast collaborator.
#[async_trait]
pub trait InteractionPort: Send + Sync {
    /// Destructive-confirmation round trip; `true` means accepted.
    async fn confirm(&self, title: &str, message: &str, accept: &str, cancel: &str) -> bool;

    async fn notify_success(&self, message: &str);

    async fn notify_error(&self, message: &str);
}

/// Navigation collaborator. Routes are opaque strings to the core.
#[async_trait]
pub trait NavigatorPort: Send + Sync {
    async fn go_to(&self, route: &str, params: Option<Value>);

    async fn go_back(&self);
}
