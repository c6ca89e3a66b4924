//! Routing behavior tests for the envelope router.

use doppler_router::{
    encode, Envelope, Filter, PayloadEncoding, RandomSource, Router, RouterConfig, Sink,
    SubscriptionHandle, SubscriptionRequest,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct MockSink {
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl MockSink {
    fn calls(&self) -> usize {
        self.payloads.lock().len()
    }

    fn received(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().clone()
    }
}

impl Sink for MockSink {
    fn accept(&self, payload: &[u8]) {
        self.payloads.lock().push(payload.to_vec());
    }
}

fn subscribe(
    router: &Router,
    request: SubscriptionRequest,
) -> (Arc<MockSink>, SubscriptionHandle) {
    let sink = Arc::new(MockSink::default());
    let handle = router.register(request, sink.clone()).unwrap();
    (sink, handle)
}

fn counter_envelope() -> Envelope {
    Envelope::counter("some-origin", "requests", 1)
}

fn log_envelope() -> Envelope {
    Envelope::log("some-origin", "some log line")
}

fn bytes(envelope: &Envelope) -> Vec<u8> {
    encode(envelope, PayloadEncoding::default()).unwrap()
}

/// The mix of subscriptions used by most tests below.
struct Fixture {
    router: Router,
    // Streams without a kind filter
    a: (Arc<MockSink>, SubscriptionHandle),
    b: (Arc<MockSink>, SubscriptionHandle),
    c: (Arc<MockSink>, SubscriptionHandle),
    // Firehoses
    d: (Arc<MockSink>, SubscriptionHandle),
    e: (Arc<MockSink>, SubscriptionHandle),
    f: (Arc<MockSink>, SubscriptionHandle),
    // Streams with a kind filter
    g: (Arc<MockSink>, SubscriptionHandle),
    h: (Arc<MockSink>, SubscriptionHandle),
}

impl Fixture {
    fn new() -> Self {
        let router = Router::new();
        Self {
            a: subscribe(&router, SubscriptionRequest::app("some-app-id")),
            b: subscribe(&router, SubscriptionRequest::app("some-app-id")),
            c: subscribe(&router, SubscriptionRequest::app("some-other-app-id")),
            d: subscribe(&router, SubscriptionRequest::firehose("some-sub-id")),
            e: subscribe(&router, SubscriptionRequest::firehose("some-sub-id")),
            f: subscribe(&router, SubscriptionRequest::firehose("some-other-sub-id")),
            g: subscribe(
                &router,
                SubscriptionRequest::app("some-app-id").with_filter(Filter::logs()),
            ),
            h: subscribe(
                &router,
                SubscriptionRequest::app("some-app-id").with_filter(Filter::metrics()),
            ),
            router,
        }
    }
}

// --- Fan-out ---

#[test]
fn test_sends_data_to_registered_sinks() {
    let fx = Fixture::new();
    let envelope = log_envelope();

    fx.router.send_to("some-app-id", &envelope);

    let expected = vec![bytes(&envelope)];
    assert_eq!(fx.a.0.received(), expected);
    assert_eq!(fx.b.0.received(), expected);
    assert_eq!(fx.g.0.received(), expected);
    assert_eq!(fx.c.0.calls(), 0);
    assert_eq!(fx.h.0.calls(), 0);
}

#[test]
fn test_sends_envelope_to_subscription_once() {
    let fx = Fixture::new();

    fx.router.send_to("some-app-id", &counter_envelope());

    assert_eq!(fx.a.0.calls(), 1);
    assert_eq!(fx.h.0.calls(), 1);
}

#[test]
fn test_does_not_send_to_wrong_sink() {
    let fx = Fixture::new();

    fx.router.send_to("some-app-id", &counter_envelope());

    assert_eq!(fx.c.0.calls(), 0);
    assert_eq!(fx.g.0.calls(), 0);
}

#[test]
fn test_log_filter_rejects_metric() {
    let router = Router::new();
    let (sink, _handle) = subscribe(
        &router,
        SubscriptionRequest::app("app-1").with_filter(Filter::logs()),
    );

    router.send_to("app-1", &counter_envelope());

    assert_eq!(sink.calls(), 0);
}

#[test]
fn test_unknown_app_is_a_noop() {
    let fx = Fixture::new();

    fx.router.send_to("nobody-listens", &log_envelope());

    for sink in [&fx.a.0, &fx.b.0, &fx.c.0, &fx.g.0, &fx.h.0] {
        assert_eq!(sink.calls(), 0);
    }
    // Firehoses are not app-scoped
    assert_eq!(fx.d.0.calls() + fx.e.0.calls(), 1);
    assert_eq!(fx.f.0.calls(), 1);
}

// --- Firehose ---

#[test]
fn test_sends_to_random_firehose_member() {
    let fx = Fixture::new();
    let envelope = counter_envelope();

    fx.router.send_to("some-app-id", &envelope);

    assert_eq!(fx.d.0.calls() + fx.e.0.calls(), 1);
    assert_eq!(fx.f.0.received(), vec![bytes(&envelope)]);
}

#[test]
fn test_three_member_group_delivers_exactly_once() {
    let router = Router::new();
    let members: Vec<_> = (0..3)
        .map(|_| subscribe(&router, SubscriptionRequest::firehose("s1")))
        .collect();

    for (i, app_id) in ["app-1", "app-2", "app-3", "any"].iter().enumerate() {
        router.send_to(app_id, &counter_envelope());
        let total: usize = members.iter().map(|(sink, _)| sink.calls()).sum();
        assert_eq!(total, i + 1);
    }
}

#[test]
fn test_firehose_selection_is_roughly_uniform() {
    let router = Router::new();
    let members: Vec<_> = (0..3)
        .map(|_| subscribe(&router, SubscriptionRequest::firehose("s1")))
        .collect();

    for _ in 0..3000 {
        router.send_to("app-1", &counter_envelope());
    }

    for (sink, _) in &members {
        let calls = sink.calls();
        assert!(calls > 800 && calls < 1200, "member received {}", calls);
    }
}

#[test]
fn test_filtered_firehose_members() {
    let router = Router::new();
    let (logs, _l) = subscribe(
        &router,
        SubscriptionRequest::firehose("s1").with_filter(Filter::logs()),
    );
    let (metrics, _m) = subscribe(
        &router,
        SubscriptionRequest::firehose("s1").with_filter(Filter::metrics()),
    );

    for _ in 0..20 {
        router.send_to("app-1", &counter_envelope());
    }

    // Only one member of the group matches, so it is always the pick.
    assert_eq!(logs.calls(), 0);
    assert_eq!(metrics.calls(), 20);
}

#[test]
fn test_injected_random_source_decides_member() {
    struct Last;

    impl RandomSource for Last {
        fn draw(&self, bound: usize) -> usize {
            bound - 1
        }
    }

    let router = Router::with_random_source(RouterConfig::default(), Arc::new(Last));
    let members: Vec<_> = (0..3)
        .map(|_| subscribe(&router, SubscriptionRequest::firehose("s1")))
        .collect();

    router.send_to("app-1", &counter_envelope());
    router.send_to("app-1", &counter_envelope());

    let calls: Vec<usize> = members.iter().map(|(sink, _)| sink.calls()).collect();
    assert_eq!(calls, vec![0, 0, 2]);
}

#[test]
fn test_seeded_routers_pick_the_same_members() {
    let run = || {
        let router = Router::with_config(RouterConfig {
            shard_seed: Some(7),
            ..Default::default()
        });
        let members: Vec<_> = (0..4)
            .map(|_| subscribe(&router, SubscriptionRequest::firehose("s1")))
            .collect();
        for _ in 0..50 {
            router.send_to("app-1", &counter_envelope());
        }
        members.iter().map(|(sink, _)| sink.calls()).collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

// --- Bad envelopes ---

#[test]
fn test_does_not_send_data_for_bad_envelope() {
    let fx = Fixture::new();

    fx.router.send_to("some-app-id", &Envelope::default());

    for sink in [
        &fx.a.0, &fx.b.0, &fx.c.0, &fx.d.0, &fx.e.0, &fx.f.0, &fx.g.0, &fx.h.0,
    ] {
        assert_eq!(sink.calls(), 0);
    }
}

// --- Unregistering ---

#[test]
fn test_unregistered_stream_receives_nothing() {
    let fx = Fixture::new();
    fx.a.1.release();

    fx.router.send_to("some-app-id", &counter_envelope());

    assert_eq!(fx.a.0.calls(), 0);
    assert_eq!(fx.b.0.received(), vec![bytes(&counter_envelope())]);
}

#[test]
fn test_unregistered_firehose_member_receives_nothing() {
    let fx = Fixture::new();
    fx.d.1.release();

    for _ in 0..10 {
        fx.router.send_to("some-app-id", &counter_envelope());
    }

    assert_eq!(fx.d.0.calls(), 0);
    assert_eq!(fx.e.0.calls(), 10);
}

#[test]
fn test_last_firehose_member_unregistered() {
    let fx = Fixture::new();
    fx.f.1.release();

    fx.router.send_to("some-app-id", &counter_envelope());

    assert_eq!(fx.f.0.calls(), 0);
}

#[test]
fn test_double_release_has_no_extra_effect() {
    let fx = Fixture::new();
    assert_eq!(fx.router.subscription_count(), 8);

    fx.a.1.release();
    fx.a.1.release();

    assert_eq!(fx.router.subscription_count(), 7);
    fx.router.send_to("some-app-id", &log_envelope());
    assert_eq!(fx.a.0.calls(), 0);
    assert_eq!(fx.b.0.calls(), 1);
}

#[test]
fn test_json_encoding_reaches_sinks() {
    let router = Router::with_config(RouterConfig {
        encoding: PayloadEncoding::Json,
        ..Default::default()
    });
    let (sink, _handle) = subscribe(&router, SubscriptionRequest::app("app-1"));

    router.send_to("app-1", &log_envelope());

    let received = sink.received();
    let value: serde_json::Value = serde_json::from_slice(&received[0]).unwrap();
    assert_eq!(value["event_type"], "log_message");
    assert_eq!(value["origin"], "some-origin");
}
