//! Engine configuration.

use std::time::Duration;
use tether_std::callbacks::RemovalPolicy;

/// Defaults applied by the [`Interactions`](crate::Interactions) engine.
///
/// Every timeout here is a default: a wait, callback set or paginator that
/// carries its own [`Expiry`](tether_std::callbacks::Expiry) overrides it.
///
/// # Example
///
/// ```rust,ignore
/// let config = EngineConfig::new()
///     .with_wait_timeout(Some(Duration::from_secs(30)))
///     .with_removal_policy(RemovalPolicy::Remove)
///     .with_handler_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Default deadline for `wait_for_next_*`. `None` waits forever.
    pub wait_timeout: Option<Duration>,
    /// Default deadline for callback sets. `None` never expires.
    pub callback_timeout: Option<Duration>,
    /// Default deadline for paginators. `None` never expires.
    pub paginator_timeout: Option<Duration>,
    /// Removal policy for sets that do not choose one.
    pub removal: RemovalPolicy,
    /// Time limit for reaction handlers of sets that do not set one.
    ///
    /// Paginators get it too. When a paginator offers jump, its limit is
    /// extended by [`jump_timeout`](Self::jump_timeout) so the prompt can be
    /// answered.
    pub handler_timeout: Option<Duration>,
    /// How long a paginator's jump prompt waits for a page number.
    pub jump_timeout: Duration,
    /// Text posted by a paginator's info action.
    pub info_text: String,
    /// How long the info text stays up.
    pub info_display: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self {
            wait_timeout: Some(Duration::from_secs(15)),
            callback_timeout: Some(Duration::from_secs(60)),
            paginator_timeout: Some(Duration::from_secs(120)),
            removal: RemovalPolicy::Keep,
            handler_timeout: None,
            jump_timeout: Duration::from_secs(30),
            info_text: "React with the arrows to turn pages, or stop to close this message."
                .to_string(),
            info_display: Duration::from_secs(10),
        }
    }

    /// Set the default wait deadline.
    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Set the default callback set deadline.
    pub fn with_callback_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Set the default paginator deadline.
    pub fn with_paginator_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.paginator_timeout = timeout;
        self
    }

    /// Set the default removal policy.
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal = policy;
        self
    }

    /// Set the default handler time limit.
    pub fn with_handler_timeout(mut self, limit: Duration) -> Self {
        self.handler_timeout = Some(limit);
        self
    }

    /// Set how long a jump prompt waits.
    pub fn with_jump_timeout(mut self, timeout: Duration) -> Self {
        self.jump_timeout = timeout;
        self
    }

    /// Set the paginator info text and how long it stays up.
    pub fn with_info(mut self, text: impl Into<String>, display: Duration) -> Self {
        self.info_text = text.into();
        self.info_display = display;
        self
    }
}
