//! The interaction engine.
//!
//! [`Interactions`] owns the two pending registries, the callback registry,
//! the timeout scheduler and the outbound platform. Inbound events enter
//! through [`Interactions::run`] (or the `handle_*` methods), command code
//! calls the `wait_for_*` and `send_*` operations.

use crate::config::EngineConfig;
use futures::{Stream, StreamExt, stream};
use std::{
    fmt,
    pin::pin,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tether_core::{
    AllOf, Context, Criterion, MessageEvent, MessageId, Platform, ReactionEvent, Sourced,
    TetherError, UserId,
};
use tether_std::{
    callbacks::{CallbackRegistry, CallbackSet, Expiry, Generation, ReactionDispatch},
    criteria::{FromSourceUser, InSourceChannel},
    paginator::{PageAction, PageServices, Paginator},
    pending::{PendingRegistry, WaitHandle, WaitId, WaitOutcome},
    scheduler::{ExpirySink, TimeoutKey, TimeoutScheduler},
};
use tokio::{sync::watch, task::JoinHandle, time::Instant};
use tracing::{debug, info, trace, warn};

/// Where an inbound reaction ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionRoute {
    /// The callback set attached to the message took it.
    Callback(ReactionDispatch),
    /// It resolved a pending reaction wait.
    Wait(WaitId),
    /// Nothing was waiting for it.
    Unclaimed,
    /// The bot authored it.
    Ignored,
}

/// Routes due deadlines to the registry that owns the target.
struct Expirer {
    messages: PendingRegistry<MessageEvent>,
    reactions: PendingRegistry<ReactionEvent>,
    callbacks: CallbackRegistry,
}

impl ExpirySink for Expirer {
    fn expire(&self, key: TimeoutKey) -> bool {
        match key {
            TimeoutKey::MessageWait(id) => self.messages.expire(id),
            TimeoutKey::ReactionWait(id) => self.reactions.expire(id),
            TimeoutKey::Callbacks {
                message,
                generation,
            } => self.callbacks.expire(message, generation),
            TimeoutKey::DeleteMessage(message) => {
                let platform = self.callbacks.platform();
                tokio::spawn(async move {
                    if let Err(err) = platform.delete_message(message).await {
                        warn!(%message, error = %err, "could not delete expired message");
                    }
                });
                true
            }
        }
    }
}

enum Inbound {
    Message(MessageEvent),
    Reaction(ReactionEvent),
}

struct Inner {
    platform: Arc<dyn Platform>,
    bot: UserId,
    config: EngineConfig,
    messages: PendingRegistry<MessageEvent>,
    reactions: PendingRegistry<ReactionEvent>,
    callbacks: CallbackRegistry,
    scheduler: TimeoutScheduler,
    scheduler_task: Mutex<Option<JoinHandle<()>>>,
    stopped: watch::Sender<bool>,
}

/// The interactive reply engine.
///
/// Cheap to clone; clones share all state. Must be created inside a tokio
/// runtime, since it spawns the timeout scheduler.
///
/// # Example
///
/// ```rust,ignore
/// let engine = Interactions::new(platform, EngineConfig::new());
/// tokio::spawn({
///     let engine = engine.clone();
///     async move { engine.run(gateway.messages(), gateway.reactions()).await }
/// });
///
/// // In a command handler:
/// let ctx = Context::from_message(&command);
/// engine.reply_and_expire(ctx, "What is your name?", Duration::from_secs(15)).await?;
/// match engine.wait_for_next_message_from(ctx, true, true, Expiry::Default).await? {
///     WaitOutcome::Matched(answer) => { /* ... */ }
///     _ => { /* timed out */ }
/// }
/// ```
#[derive(Clone)]
pub struct Interactions {
    inner: Arc<Inner>,
}

impl Interactions {
    /// Create an engine that talks to `platform`.
    pub fn new(platform: Arc<dyn Platform>, config: EngineConfig) -> Self {
        let messages = PendingRegistry::new();
        let reactions = PendingRegistry::new();
        let callbacks = CallbackRegistry::new(Arc::clone(&platform), config.removal);
        let (scheduler, task) = TimeoutScheduler::spawn(Expirer {
            messages: messages.clone(),
            reactions: reactions.clone(),
            callbacks: callbacks.clone(),
        });
        let (stopped, _) = watch::channel(false);
        let bot = platform.current_user();

        Self {
            inner: Arc::new(Inner {
                bot,
                platform,
                config,
                messages,
                reactions,
                callbacks,
                scheduler,
                scheduler_task: Mutex::new(Some(task)),
                stopped,
            }),
        }
    }

    /// The outbound platform.
    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.inner.platform
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Waits for messages.
    pub fn message_waits(&self) -> &PendingRegistry<MessageEvent> {
        &self.inner.messages
    }

    /// Waits for reactions.
    pub fn reaction_waits(&self) -> &PendingRegistry<ReactionEvent> {
        &self.inner.reactions
    }

    /// Attached callback sets and paginators.
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.inner.callbacks
    }

    // ------------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------------

    /// Consume both inbound streams until they end or the engine shuts down.
    ///
    /// Every event is dispatched on its own task, so a slow handler never
    /// holds up the streams.
    pub async fn run<M, R>(&self, messages: M, reactions: R)
    where
        M: Stream<Item = MessageEvent>,
        R: Stream<Item = ReactionEvent>,
    {
        let mut stopped = self.inner.stopped.subscribe();
        if *stopped.borrow_and_update() {
            return;
        }
        let mut inbound = pin!(stream::select(
            messages.map(Inbound::Message),
            reactions.map(Inbound::Reaction),
        ));
        info!("interaction engine running");

        loop {
            tokio::select! {
                biased;

                _ = stopped.changed() => break,
                next = inbound.next() => match next {
                    Some(Inbound::Message(event)) => {
                        let engine = self.clone();
                        tokio::spawn(async move {
                            engine.handle_message(event);
                        });
                    }
                    Some(Inbound::Reaction(event)) => {
                        let engine = self.clone();
                        tokio::spawn(async move {
                            engine.handle_reaction(event).await;
                        });
                    }
                    None => break,
                },
            }
        }

        info!("interaction engine stopped");
    }

    /// Offer a message to the pending message waits.
    pub fn handle_message(&self, event: MessageEvent) -> Option<WaitId> {
        if self.is_own(&event) {
            return None;
        }
        let resolved = self.inner.messages.on_event(&event);
        trace!(message = %event.id, ?resolved, "message routed");
        resolved
    }

    /// Route a reaction: first to the callback set on its message, then to
    /// the pending reaction waits.
    pub async fn handle_reaction(&self, event: ReactionEvent) -> ReactionRoute {
        if self.is_own(&event) {
            return ReactionRoute::Ignored;
        }
        let dispatch = self.inner.callbacks.on_reaction(&event).await;
        let route = if dispatch.is_handled() {
            ReactionRoute::Callback(dispatch)
        } else {
            match self.inner.reactions.on_event(&event) {
                Some(id) => ReactionRoute::Wait(id),
                None => ReactionRoute::Unclaimed,
            }
        };
        trace!(message = %event.message_id, ?route, "reaction routed");
        route
    }

    fn is_own<E: Sourced>(&self, event: &E) -> bool {
        event.author_id() == self.inner.bot
    }

    // ------------------------------------------------------------------------
    // Waits
    // ------------------------------------------------------------------------

    /// Register a wait for the next message satisfying `criterion`.
    ///
    /// Dropping the returned handle cancels the wait.
    pub fn message_wait<C>(
        &self,
        ctx: Context,
        criterion: C,
        expiry: impl Into<Expiry>,
    ) -> Result<WaitHandle<MessageEvent>, TetherError>
    where
        C: Criterion<MessageEvent>,
    {
        let deadline = self.deadline(expiry.into(), self.inner.config.wait_timeout);
        let wait = self.inner.messages.register(ctx, criterion, deadline);
        if let Some(deadline) = deadline {
            self.inner
                .scheduler
                .schedule(deadline, TimeoutKey::MessageWait(wait.id()))?;
        }
        Ok(wait)
    }

    /// Register a wait for the next reaction satisfying `criterion` that no
    /// callback set consumed.
    pub fn reaction_wait<C>(
        &self,
        ctx: Context,
        criterion: C,
        expiry: impl Into<Expiry>,
    ) -> Result<WaitHandle<ReactionEvent>, TetherError>
    where
        C: Criterion<ReactionEvent>,
    {
        let deadline = self.deadline(expiry.into(), self.inner.config.wait_timeout);
        let wait = self.inner.reactions.register(ctx, criterion, deadline);
        if let Some(deadline) = deadline {
            self.inner
                .scheduler
                .schedule(deadline, TimeoutKey::ReactionWait(wait.id()))?;
        }
        Ok(wait)
    }

    /// Suspend until the next message satisfying `criterion`, or until the
    /// wait expires.
    pub async fn wait_for_next_message<C>(
        &self,
        ctx: Context,
        criterion: C,
        expiry: impl Into<Expiry>,
    ) -> Result<WaitOutcome<MessageEvent>, TetherError>
    where
        C: Criterion<MessageEvent>,
    {
        Ok(self.message_wait(ctx, criterion, expiry)?.outcome().await)
    }

    /// [`wait_for_next_message`](Self::wait_for_next_message) with the two
    /// common source restrictions.
    pub async fn wait_for_next_message_from(
        &self,
        ctx: Context,
        from_source_user: bool,
        in_source_channel: bool,
        expiry: impl Into<Expiry>,
    ) -> Result<WaitOutcome<MessageEvent>, TetherError> {
        let mut criterion = AllOf::<MessageEvent>::new();
        if from_source_user {
            criterion.push(FromSourceUser);
        }
        if in_source_channel {
            criterion.push(InSourceChannel);
        }
        self.wait_for_next_message(ctx, criterion, expiry).await
    }

    /// Suspend until the next unclaimed reaction satisfying `criterion`, or
    /// until the wait expires.
    pub async fn wait_for_next_reaction<C>(
        &self,
        ctx: Context,
        criterion: C,
        expiry: impl Into<Expiry>,
    ) -> Result<WaitOutcome<ReactionEvent>, TetherError>
    where
        C: Criterion<ReactionEvent>,
    {
        Ok(self.reaction_wait(ctx, criterion, expiry)?.outcome().await)
    }

    // ------------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------------

    /// Send `content`, seed it with the set's emotes and attach the set.
    pub async fn send_with_reaction_callbacks(
        &self,
        ctx: Context,
        content: &str,
        set: CallbackSet,
        from_source_user: bool,
    ) -> Result<MessageId, TetherError> {
        let mut set = if from_source_user {
            set.require(FromSourceUser)
        } else {
            set
        };
        if let (None, Some(limit)) = (set.handler_timeout(), self.inner.config.handler_timeout) {
            set = set.with_handler_timeout(limit);
        }

        let message = self
            .inner
            .platform
            .send_message(ctx.channel_id, content)
            .await?;
        self.install(ctx, message, set, self.inner.config.callback_timeout)
            .await?;
        Ok(message)
    }

    /// Send the first page of `paginator` and attach its navigation.
    ///
    /// `criterion` applies on top of the paginator's own source restriction.
    pub async fn send_paginated<C>(
        &self,
        ctx: Context,
        paginator: Paginator,
        criterion: C,
    ) -> Result<MessageId, TetherError>
    where
        C: Criterion<ReactionEvent>,
    {
        paginator.validate()?;
        let jumps = paginator.navigation().contains(PageAction::Jump);
        let message = self
            .inner
            .platform
            .send_message(ctx.channel_id, paginator.first_page()?)
            .await?;
        let mut set = paginator
            .with_criterion(criterion)
            .into_callback_set(message, self.page_services())?;
        if let Some(limit) = self.inner.config.handler_timeout {
            // A jump handler also waits for the page number.
            let limit = if jumps {
                limit + self.inner.config.jump_timeout
            } else {
                limit
            };
            set = set.with_handler_timeout(limit);
        }
        self.install(ctx, message, set, self.inner.config.paginator_timeout)
            .await?;
        Ok(message)
    }

    /// Send `content` and delete it once `timeout` has passed.
    pub async fn reply_and_expire(
        &self,
        ctx: Context,
        content: &str,
        timeout: Duration,
    ) -> Result<MessageId, TetherError> {
        let message = self
            .inner
            .platform
            .send_message(ctx.channel_id, content)
            .await?;
        self.inner
            .scheduler
            .schedule(Instant::now() + timeout, TimeoutKey::DeleteMessage(message))?;
        debug!(%message, ?timeout, "reply scheduled for deletion");
        Ok(message)
    }

    /// Detach whatever callback set or paginator is attached to `message`.
    pub fn detach(&self, message: MessageId) -> bool {
        self.inner.callbacks.detach(message)
    }

    async fn install(
        &self,
        ctx: Context,
        message: MessageId,
        set: CallbackSet,
        default_timeout: Option<Duration>,
    ) -> Result<Generation, TetherError> {
        for emote in set.emotes() {
            if let Err(err) = self.inner.platform.add_reaction(message, &emote).await {
                warn!(%message, %emote, error = %err, "could not seed reaction");
            }
        }

        let deadline = self.deadline(set.expiry(), default_timeout);
        let generation = self.inner.callbacks.attach(message, ctx, set, deadline);
        if let Some(deadline) = deadline {
            let key = TimeoutKey::Callbacks {
                message,
                generation,
            };
            if let Err(err) = self.inner.scheduler.schedule(deadline, key) {
                self.inner.callbacks.detach(message);
                return Err(err.into());
            }
        }
        Ok(generation)
    }

    fn page_services(&self) -> PageServices {
        let config = &self.inner.config;
        PageServices {
            messages: self.inner.messages.clone(),
            scheduler: self.inner.scheduler.clone(),
            jump_timeout: config.jump_timeout,
            info_text: config.info_text.clone(),
            info_display: config.info_display,
        }
    }

    fn deadline(&self, expiry: Expiry, default: Option<Duration>) -> Option<Instant> {
        expiry.or(default).map(|timeout| Instant::now() + timeout)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Whether the engine still accepts deadlines.
    pub fn is_running(&self) -> bool {
        self.inner.scheduler.is_running()
    }

    /// Stop the scheduler and any [`run`](Self::run) loop.
    ///
    /// Outstanding waits resolve as cancelled. Attached callback sets stay
    /// attached but no longer expire.
    pub async fn shutdown(&self) {
        self.inner.stopped.send_replace(true);
        self.inner.scheduler.shutdown();
        let cancelled = self.inner.messages.cancel_all() + self.inner.reactions.cancel_all();

        let task = self
            .inner
            .scheduler_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(error = %err, "timeout scheduler task failed");
            }
        }
        info!(cancelled, "interaction engine shut down");
    }
}

impl fmt::Debug for Interactions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interactions")
            .field("config", &self.inner.config)
            .field("message_waits", &self.inner.messages.len())
            .field("reaction_waits", &self.inner.reactions.len())
            .field("callbacks", &self.inner.callbacks)
            .finish_non_exhaustive()
    }
}
