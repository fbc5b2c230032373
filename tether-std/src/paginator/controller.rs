//! Paginator construction and the page-turn handler.

use super::{
    navigation::{NavigationReactions, PageAction},
    state::{PaginatorState, Transition},
};
use crate::{
    callbacks::{CallbackSet, Expiry, RemovalPolicy},
    criteria::{FromSourceUser, FromUser, InSourceChannel, IsInteger},
    pending::PendingRegistry,
    scheduler::{TimeoutKey, TimeoutScheduler},
};
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tether_core::{
    AllOf, CallbackAction, Criterion, MessageEvent, MessageId, PaginatorError,
    Platform, PlatformError, ReactionEvent, ReactionHandler, ReactionInput, TetherError,
};
use tokio::time::Instant;
use tracing::{debug, warn};

/// What the paginator handlers need besides the platform: the message wait
/// registry and scheduler for `jump`, and the help text for `info`.
#[derive(Clone)]
pub struct PageServices {
    /// Registry the jump prompt waits on.
    pub messages: PendingRegistry<MessageEvent>,
    /// Scheduler for the jump deadline and the info self-deletion.
    pub scheduler: TimeoutScheduler,
    /// How long the jump prompt waits for a page number.
    pub jump_timeout: Duration,
    /// Text posted by the info action.
    pub info_text: String,
    /// How long the info text stays before it is deleted.
    pub info_display: Duration,
}

impl fmt::Debug for PageServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageServices")
            .field("jump_timeout", &self.jump_timeout)
            .field("info_text", &self.info_text)
            .field("info_display", &self.info_display)
            .finish_non_exhaustive()
    }
}

/// A multi-page message navigated by reactions.
///
/// # Example
///
/// ```rust,ignore
/// let paginator = Paginator::new(["one", "two", "three"])
///     .wrap_around(true)
///     .with_navigation(NavigationReactions::default().with_default(PageAction::Jump))
///     .expires_after(Duration::from_secs(120));
///
/// let message = engine.send_paginated(ctx, paginator, Always).await?;
/// ```
pub struct Paginator {
    pages: Vec<String>,
    navigation: NavigationReactions,
    restrict_to_source: bool,
    wrap_around: bool,
    expiry: Expiry,
    removal: Option<RemovalPolicy>,
    criterion: AllOf<ReactionEvent>,
}

impl Paginator {
    /// A paginator over `pages` with the default navigation, restricted to
    /// the requester.
    pub fn new<I, T>(pages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            navigation: NavigationReactions::default(),
            restrict_to_source: true,
            wrap_around: false,
            expiry: Expiry::Default,
            removal: None,
            criterion: AllOf::new(),
        }
    }

    /// Use `navigation` instead of the default vocabulary.
    pub fn with_navigation(mut self, navigation: NavigationReactions) -> Self {
        self.navigation = navigation;
        self
    }

    /// Only accept navigation from the user who requested the pages.
    pub fn restrict_to_source(mut self, enabled: bool) -> Self {
        self.restrict_to_source = enabled;
        self
    }

    /// Wrap from the last page to the first and back.
    pub fn wrap_around(mut self, enabled: bool) -> Self {
        self.wrap_around = enabled;
        self
    }

    /// Stop accepting navigation `timeout` after the message is sent.
    pub fn expires_after(mut self, timeout: Duration) -> Self {
        self.expiry = Expiry::After(timeout);
        self
    }

    /// Set the expiry explicitly.
    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    /// Override the engine's removal policy.
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal = Some(policy);
        self
    }

    /// Additionally require `criterion` for every navigation reaction.
    pub fn with_criterion<C: Criterion<ReactionEvent>>(mut self, criterion: C) -> Self {
        self.criterion.push(criterion);
        self
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The navigation vocabulary.
    pub fn navigation(&self) -> &NavigationReactions {
        &self.navigation
    }

    /// The configured expiry.
    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    /// Check that the paginator can be sent.
    pub fn validate(&self) -> Result<(), PaginatorError> {
        if self.pages.is_empty() {
            return Err(PaginatorError::NoPages);
        }
        if self.navigation.is_empty() {
            return Err(PaginatorError::NoNavigation);
        }
        Ok(())
    }

    /// The content sent when the paginator is created.
    pub fn first_page(&self) -> Result<&str, PaginatorError> {
        self.pages
            .first()
            .map(String::as_str)
            .ok_or(PaginatorError::NoPages)
    }

    /// Turn the paginator into the callback set for `message`, which must
    /// already show the first page.
    pub fn into_callback_set(
        self,
        message: MessageId,
        services: PageServices,
    ) -> Result<CallbackSet, PaginatorError> {
        self.validate()?;
        let state = PaginatorState::new(Arc::from(self.pages), message, self.wrap_around)
            .ok_or(PaginatorError::NoPages)?;
        let state = Arc::new(Mutex::new(state));

        let mut criterion = self.criterion;
        if self.restrict_to_source {
            criterion.push(FromSourceUser);
        }

        let mut set = self
            .navigation
            .iter()
            .fold(CallbackSet::new(), |set, (action, emote)| {
                set.bind(
                    emote.clone(),
                    PageTurn {
                        action,
                        state: Arc::clone(&state),
                        services: services.clone(),
                    },
                )
            })
            .with_criterion(criterion)
            .with_expiry(self.expiry);
        if let Some(policy) = self.removal {
            set = set.with_removal_policy(policy);
        }
        Ok(set)
    }
}

impl fmt::Debug for Paginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("pages", &self.pages.len())
            .field("navigation", &self.navigation)
            .field("restrict_to_source", &self.restrict_to_source)
            .field("wrap_around", &self.wrap_around)
            .field("expiry", &self.expiry)
            .field("removal", &self.removal)
            .finish_non_exhaustive()
    }
}

/// Handler bound to one navigation emote.
struct PageTurn {
    action: PageAction,
    state: Arc<Mutex<PaginatorState>>,
    services: PageServices,
}

impl PageTurn {
    fn state(&self) -> MutexGuard<'_, PaginatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a transition under the lock and return what to show, if anything.
    fn step(&self, f: impl FnOnce(&mut PaginatorState) -> Transition) -> Step {
        let mut state = self.state();
        match f(&mut *state) {
            Transition::Moved { from, to } => {
                debug!(message = %state.message_id(), from, to, "page turned");
                Step::Show(state.message_id(), state.current().to_owned())
            }
            Transition::Unchanged => Step::Stay,
            Transition::Stop => Step::Stop,
        }
    }

    async fn show(&self, platform: &dyn Platform, step: Step) -> Result<CallbackAction, TetherError> {
        match step {
            Step::Stay => Ok(CallbackAction::Continue),
            Step::Stop => {
                debug!(message = %self.state().message_id(), "paginator stopped");
                Ok(CallbackAction::Detach)
            }
            Step::Show(message, content) => match platform.edit_message(message, &content).await {
                Ok(()) => Ok(CallbackAction::Continue),
                // Nothing left to paginate.
                Err(PlatformError::UnknownMessage(_)) => Ok(CallbackAction::Detach),
                Err(err) => Err(err.into()),
            },
        }
    }

    async fn jump(&self, input: &ReactionInput) -> Result<CallbackAction, TetherError> {
        let platform = input.platform.as_ref();
        let ctx = input.context;
        let count = self.state().page_count();

        let prompt = platform
            .send_message(ctx.channel_id, &format!("Which page? (1-{count})"))
            .await?;
        let deadline = Instant::now() + self.services.jump_timeout;
        let criterion = AllOf::<MessageEvent>::new()
            .with(FromUser(input.reaction.author_id))
            .with(InSourceChannel)
            .with(IsInteger);
        let wait = self.services.messages.register(ctx, criterion, Some(deadline));
        if let Err(err) = self
            .services
            .scheduler
            .schedule(deadline, TimeoutKey::MessageWait(wait.id()))
        {
            wait.cancel();
            discard(platform, prompt).await;
            return Err(err.into());
        }

        let outcome = wait.outcome().await;
        discard(platform, prompt).await;
        let Some(reply) = outcome.matched() else {
            debug!(message = %input.reaction.message_id, "jump prompt got no page number");
            return Ok(CallbackAction::Continue);
        };
        discard(platform, reply.id).await;

        let Ok(page) = reply.content.trim().parse::<i64>() else {
            return Ok(CallbackAction::Continue);
        };
        let step = self.step(|state| state.jump_to(page));
        self.show(platform, step).await
    }

    async fn info(&self, input: &ReactionInput) -> Result<CallbackAction, TetherError> {
        let notice = input
            .platform
            .send_message(input.context.channel_id, &self.services.info_text)
            .await?;
        self.services.scheduler.schedule(
            Instant::now() + self.services.info_display,
            TimeoutKey::DeleteMessage(notice),
        )?;
        Ok(CallbackAction::Continue)
    }
}

enum Step {
    Show(MessageId, String),
    Stay,
    Stop,
}

impl ReactionHandler for PageTurn {
    type Output = Result<CallbackAction, TetherError>;

    async fn call(&self, input: ReactionInput) -> Self::Output {
        match self.action {
            PageAction::Jump => self.jump(&input).await,
            PageAction::Info => self.info(&input).await,
            action => {
                let step = self.step(|state| state.apply(action));
                self.show(input.platform.as_ref(), step).await
            }
        }
    }
}

async fn discard(platform: &dyn Platform, message: MessageId) {
    if let Err(err) = platform.delete_message(message).await {
        warn!(%message, error = %err, "could not delete message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        callbacks::{CallbackRegistry, ReactionDispatch},
        testing::{PlatformCall, RecordingPlatform},
    };
    use tether_core::{ChannelId, Context, Emote, UserId};

    const OWNER: UserId = UserId(1);
    const CHANNEL: ChannelId = ChannelId(10);
    const MESSAGE: MessageId = MessageId(500);

    fn ctx() -> Context {
        Context::new(OWNER, CHANNEL)
    }

    fn services() -> PageServices {
        let (scheduler, _task) = TimeoutScheduler::spawn(|_key: TimeoutKey| true);
        PageServices {
            messages: PendingRegistry::new(),
            scheduler,
            jump_timeout: Duration::from_secs(30),
            info_text: "react to turn pages".into(),
            info_display: Duration::from_secs(10),
        }
    }

    fn react(user: UserId, emote: &str) -> ReactionEvent {
        ReactionEvent {
            message_id: MESSAGE,
            author_id: user,
            channel_id: CHANNEL,
            emote: Emote::new(emote),
        }
    }

    fn attach(paginator: Paginator, services: PageServices) -> (RecordingPlatform, CallbackRegistry) {
        let platform = RecordingPlatform::new();
        let registry = CallbackRegistry::new(Arc::new(platform.clone()), RemovalPolicy::Keep);
        let set = paginator.into_callback_set(MESSAGE, services).unwrap();
        registry.attach(MESSAGE, ctx(), set, None);
        (platform, registry)
    }

    #[test]
    fn construction_is_validated() {
        let empty = Paginator::new(Vec::<String>::new());
        assert_eq!(empty.validate(), Err(PaginatorError::NoPages));
        assert_eq!(empty.first_page(), Err(PaginatorError::NoPages));

        let frozen = Paginator::new(["a"]).with_navigation(NavigationReactions::empty());
        assert_eq!(frozen.validate(), Err(PaginatorError::NoNavigation));
    }

    #[tokio::test]
    async fn only_permitted_actions_are_bound() {
        let navigation = NavigationReactions::empty()
            .with_default(PageAction::Next)
            .with_default(PageAction::Stop);
        let set = Paginator::new(["a", "b"])
            .with_navigation(navigation)
            .into_callback_set(MESSAGE, services())
            .unwrap();
        assert_eq!(set.emotes(), vec![Emote::new("▶"), Emote::new("⏹")]);
    }

    #[tokio::test]
    async fn next_next_previous_edits_three_times() {
        let (platform, registry) = attach(Paginator::new(["p1", "p2", "p3"]), services());

        registry.on_reaction(&react(OWNER, "▶")).await;
        registry.on_reaction(&react(OWNER, "▶")).await;
        registry.on_reaction(&react(OWNER, "◀")).await;

        assert_eq!(platform.edits_of(MESSAGE), vec!["p2", "p3", "p2"]);
    }

    #[tokio::test]
    async fn saturated_moves_send_nothing() {
        let (platform, registry) = attach(Paginator::new(["p1", "p2"]), services());

        registry.on_reaction(&react(OWNER, "◀")).await;
        registry.on_reaction(&react(OWNER, "⏮")).await;
        registry.on_reaction(&react(OWNER, "⏭")).await;
        registry.on_reaction(&react(OWNER, "▶")).await;

        assert_eq!(platform.edits_of(MESSAGE), vec!["p2"]);
    }

    #[tokio::test]
    async fn wrap_around_goes_to_the_last_page() {
        let (platform, registry) =
            attach(Paginator::new(["p1", "p2", "p3"]).wrap_around(true), services());

        registry.on_reaction(&react(OWNER, "◀")).await;
        assert_eq!(platform.edits_of(MESSAGE), vec!["p3"]);
    }

    #[tokio::test]
    async fn stop_detaches() {
        let (platform, registry) = attach(Paginator::new(["p1", "p2"]), services());

        let outcome = registry.on_reaction(&react(OWNER, "⏹")).await;
        assert_eq!(outcome, ReactionDispatch::Handled(CallbackAction::Detach));
        assert_eq!(
            registry.on_reaction(&react(OWNER, "▶")).await,
            ReactionDispatch::NotHandled
        );
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn other_users_cannot_turn_restricted_pages() {
        let (platform, registry) = attach(Paginator::new(["p1", "p2"]), services());

        let outcome = registry.on_reaction(&react(UserId(2), "▶")).await;
        assert_eq!(outcome, ReactionDispatch::Rejected);
        assert!(platform.edits_of(MESSAGE).is_empty());
    }

    #[tokio::test]
    async fn unrestricted_pages_accept_anyone() {
        let (platform, registry) =
            attach(Paginator::new(["p1", "p2"]).restrict_to_source(false), services());

        registry.on_reaction(&react(UserId(2), "▶")).await;
        assert_eq!(platform.edits_of(MESSAGE), vec!["p2"]);
    }

    #[tokio::test]
    async fn failed_edit_faults_and_detaches() {
        let (platform, registry) = attach(Paginator::new(["p1", "p2"]), services());
        platform.set_failing(true);

        let outcome = registry.on_reaction(&react(OWNER, "▶")).await;
        assert_eq!(outcome, ReactionDispatch::Faulted);
        assert!(!registry.contains(MESSAGE));
    }

    #[tokio::test]
    async fn jump_moves_to_the_typed_page_and_cleans_up() {
        let services = services();
        let messages = services.messages.clone();
        let paginator = Paginator::new(["p1", "p2", "p3", "p4"])
            .with_navigation(NavigationReactions::default().with_default(PageAction::Jump));
        let (platform, registry) = attach(paginator, services);

        let pressed = tokio::spawn({
            let registry = registry.clone();
            async move { registry.on_reaction(&react(OWNER, "🔢")).await }
        });
        while messages.is_empty() {
            tokio::task::yield_now().await;
        }

        let typed = |id: u64, author: UserId, content: &str| MessageEvent {
            id: MessageId(id),
            author_id: author,
            channel_id: CHANNEL,
            content: content.into(),
        };
        assert!(messages.on_event(&typed(900, UserId(2), "2")).is_none());
        assert!(messages.on_event(&typed(901, OWNER, "three")).is_none());
        assert!(messages.on_event(&typed(902, OWNER, "3")).is_some());

        let outcome = pressed.await.unwrap();
        assert_eq!(outcome, ReactionDispatch::Handled(CallbackAction::Continue));

        let prompt = platform.sent()[0].0;
        assert_eq!(platform.sent()[0].1, "Which page? (1-4)");
        assert_eq!(platform.edits_of(MESSAGE), vec!["p3"]);
        assert_eq!(platform.deleted(), vec![prompt, MessageId(902)]);
    }

    #[tokio::test(start_paused = true)]
    async fn info_posts_a_notice_and_schedules_its_deletion() {
        let platform = RecordingPlatform::new();
        let deletions = Arc::new(Mutex::new(Vec::new()));
        let (scheduler, _task) = TimeoutScheduler::spawn({
            let deletions = deletions.clone();
            move |key: TimeoutKey| {
                deletions.lock().unwrap().push((key, Instant::now()));
                true
            }
        });
        let services = PageServices {
            scheduler,
            ..services()
        };
        let registry = CallbackRegistry::new(Arc::new(platform.clone()), RemovalPolicy::Keep);
        let set = Paginator::new(["p1"])
            .with_navigation(NavigationReactions::empty().with_default(PageAction::Info))
            .into_callback_set(MESSAGE, services)
            .unwrap();
        registry.attach(MESSAGE, ctx(), set, None);

        let start = Instant::now();
        registry.on_reaction(&react(OWNER, "ℹ")).await;
        let notice = platform.sent()[0].0;
        assert_eq!(
            platform.calls()[0],
            PlatformCall::Send {
                channel: CHANNEL,
                content: "react to turn pages".into(),
                id: notice,
            }
        );

        tokio::time::sleep(Duration::from_secs(11)).await;
        let deletions = deletions.lock().unwrap().clone();
        assert_eq!(deletions.len(), 1);
        assert_eq!(deletions[0].0, TimeoutKey::DeleteMessage(notice));
        assert_eq!(deletions[0].1 - start, Duration::from_secs(10));
    }
}
