use std::time::Duration;
use tether::{
    AllOf, CallbackSet, EngineConfig, Expiry, MessageEvent, MessageId, ReactionDispatch, ReactionRoute,
    WaitOutcome,
    criteria::{EmoteIn, FromSourceUser, InSourceChannel, IsInteger},
    testing::CountingHandler,
};
use tokio::time::Instant;

mod common;
use common::{BOT, CHANNEL, ELSEWHERE, OWNER, STRANGER, ctx, engine, message, reaction, until};

#[tokio::test(start_paused = true)]
async fn unmatched_wait_expires_at_its_deadline() {
    let (engine, _platform) = engine(EngineConfig::new());
    let start = Instant::now();

    let outcome = engine
        .wait_for_next_message(ctx(), FromSourceUser, Duration::from_secs(5))
        .await
        .unwrap();

    assert!(outcome.is_expired());
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert!(engine.message_waits().is_empty());
}

#[tokio::test(start_paused = true)]
async fn default_wait_timeout_applies() {
    let config = EngineConfig::new().with_wait_timeout(Some(Duration::from_secs(7)));
    let (engine, _platform) = engine(config);
    let start = Instant::now();

    let outcome = engine
        .wait_for_next_message(ctx(), FromSourceUser, Expiry::Default)
        .await
        .unwrap();

    assert!(outcome.is_expired());
    assert_eq!(start.elapsed(), Duration::from_secs(7));
}

#[tokio::test]
async fn first_matching_message_resolves_the_wait() {
    let (engine, _platform) = engine(EngineConfig::new());
    let waiting = tokio::spawn({
        let engine = engine.clone();
        async move {
            engine
                .wait_for_next_message_from(ctx(), true, true, Duration::from_secs(15))
                .await
        }
    });
    until(|| !engine.message_waits().is_empty()).await;

    assert_eq!(engine.handle_message(message(1, STRANGER, "me!")), None);
    let mut elsewhere = message(2, OWNER, "wrong room");
    elsewhere.channel_id = ELSEWHERE;
    assert_eq!(engine.handle_message(elsewhere), None);
    assert!(engine.handle_message(message(3, OWNER, "Ada")).is_some());

    let answer = waiting.await.unwrap().unwrap().matched().unwrap();
    assert_eq!(answer.content, "Ada");
    assert!(engine.message_waits().is_empty());

    // Already resolved: later messages find nothing.
    assert_eq!(engine.handle_message(message(4, OWNER, "again")), None);
}

#[tokio::test]
async fn earliest_wait_gets_the_shared_message() {
    let (engine, _platform) = engine(EngineConfig::new());
    let criterion = || AllOf::<MessageEvent>::new().with(FromSourceUser).with(IsInteger);

    let first = engine.message_wait(ctx(), criterion(), Expiry::Never).unwrap();
    let second = engine.message_wait(ctx(), criterion(), Expiry::Never).unwrap();

    assert_eq!(engine.handle_message(message(1, OWNER, "1")), Some(first.id()));
    assert_eq!(engine.handle_message(message(2, OWNER, "2")), Some(second.id()));
    assert_eq!(first.outcome().await.matched().unwrap().content, "1");
    assert_eq!(second.outcome().await.matched().unwrap().content, "2");
}

#[tokio::test(start_paused = true)]
async fn dropping_a_wait_cancels_it_and_its_deadline_is_stale() {
    let (engine, _platform) = engine(EngineConfig::new());
    let wait = engine
        .message_wait(ctx(), InSourceChannel, Duration::from_secs(3))
        .unwrap();
    let id = wait.id();
    assert!(engine.message_waits().contains(id));

    drop(wait);
    assert!(!engine.message_waits().contains(id));

    // The scheduler still fires at 3s and finds nothing to expire.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(engine.handle_message(message(1, OWNER, "late")), None);
}

#[tokio::test]
async fn unbounded_wait_outlives_unrelated_traffic() {
    let (engine, _platform) = engine(EngineConfig::new().with_wait_timeout(None));
    let wait = engine
        .message_wait(ctx(), FromSourceUser, Expiry::Default)
        .unwrap();
    assert_eq!(wait.deadline(), None);

    for id in 0..10 {
        engine.handle_message(message(id, STRANGER, "noise"));
    }
    assert!(engine.message_waits().contains(wait.id()));

    wait.cancel();
    assert!(engine.message_waits().is_empty());
}

#[tokio::test]
async fn reaction_wait_sees_only_unclaimed_reactions() {
    let (engine, _platform) = engine(EngineConfig::new());
    let counter = CountingHandler::new();
    let claimed = engine
        .send_with_reaction_callbacks(
            ctx(),
            "vote",
            CallbackSet::new().bind("👍", counter.clone()),
            false,
        )
        .await
        .unwrap();

    let waiting = tokio::spawn({
        let engine = engine.clone();
        async move {
            engine
                .wait_for_next_reaction(ctx(), EmoteIn::new(["👍"]), Expiry::Never)
                .await
        }
    });
    until(|| !engine.reaction_waits().is_empty()).await;

    let route = engine.handle_reaction(reaction(claimed, OWNER, "👍")).await;
    assert!(matches!(route, ReactionRoute::Callback(ReactionDispatch::Handled(_))));
    assert_eq!(counter.count(), 1);

    let loose = MessageId(77);
    assert_eq!(
        engine.handle_reaction(reaction(loose, OWNER, "👎")).await,
        ReactionRoute::Unclaimed
    );
    assert!(matches!(
        engine.handle_reaction(reaction(loose, OWNER, "👍")).await,
        ReactionRoute::Wait(_)
    ));

    let seen = waiting.await.unwrap().unwrap().matched().unwrap();
    assert_eq!(seen.message_id, loose);
    assert_eq!(seen.channel_id, CHANNEL);
}

#[tokio::test]
async fn bot_events_are_never_routed() {
    let (engine, _platform) = engine(EngineConfig::new());
    let wait = engine
        .message_wait(ctx(), tether::Always, Expiry::Never)
        .unwrap();

    assert_eq!(engine.handle_message(message(1, BOT, "echo")), None);
    assert_eq!(
        engine.handle_reaction(reaction(MessageId(5), BOT, "👍")).await,
        ReactionRoute::Ignored
    );
    assert!(engine.message_waits().contains(wait.id()));

    assert_eq!(engine.handle_message(message(2, STRANGER, "hi")), Some(wait.id()));
    assert!(matches!(wait.outcome().await, WaitOutcome::Matched(_)));
}
