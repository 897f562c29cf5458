//! Test harness for integration testing.
//!
//! Every test gets a fresh kernel over in-memory storage and cache, with
//! recording fakes for the external reviewer and the notifier. Every handler
//! on the bus is wrapped so tests can read the messages it received.

use std::collections::HashMap;
use std::sync::Arc;

use blog_core::common::{ContentId, PublicationId};
use blog_core::config::Config;
use blog_core::domains::blog::models::{Comment, Post};
use blog_core::domains::moderation::commands::SetModerationResult;
use blog_core::domains::moderation::models::{ModerationCode, Verdict};
use blog_core::kernel::{
    build_bus, BaseModerationCache, MemoryCache, ServerKernel, TestDependencies,
};
use blog_core::messages::{SystemKind, SystemMessage};
use relay::testing::RecordingHandler;
use relay::{BusError, Dispatch};
use test_context::AsyncTestContext;

/// Test harness that owns the kernel and its fakes.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     ctx.kernel.handle(cmd).await.unwrap();
/// }
/// ```
pub struct TestHarness {
    pub deps: TestDependencies,
    pub kernel: Arc<ServerKernel>,
    taps: HashMap<SystemKind, Arc<RecordingHandler<SystemMessage>>>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // Everything is in memory and dropped with the harness
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, |cache| cache)
    }

    /// Kernel whose handlers see the cache through `wrap`. The harness keeps
    /// inspecting the underlying [`MemoryCache`].
    pub fn with_cache(
        wrap: impl FnOnce(Arc<MemoryCache>) -> Arc<dyn BaseModerationCache>,
    ) -> Self {
        Self::build(Config::default(), wrap)
    }

    fn build(
        config: Config,
        wrap: impl FnOnce(Arc<MemoryCache>) -> Arc<dyn BaseModerationCache>,
    ) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let deps = TestDependencies::new().with_config(config);
        let mut server_deps = deps.server_deps();
        server_deps.cache = wrap(deps.cache.clone());

        let mut bus = build_bus(&server_deps);
        let mut taps = HashMap::new();
        for kind in SystemKind::ALL {
            if let Some(inner) = bus.unsubscribe(*kind) {
                let tap = RecordingHandler::wrapping(inner);
                bus.subscribe(*kind, tap.clone());
                taps.insert(*kind, tap);
            }
        }

        let kernel = Arc::new(ServerKernel {
            deps: Arc::new(server_deps),
            bus: Arc::new(bus),
        });
        Self { deps, kernel, taps }
    }

    /// Every message of `kind` the bus handled so far, in order.
    pub fn received(&self, kind: SystemKind) -> Vec<SystemMessage> {
        self.taps
            .get(&kind)
            .map(|tap| tap.received())
            .unwrap_or_default()
    }

    pub fn post(&self, pub_id: &str) -> Post {
        self.deps
            .storage
            .post(&PublicationId::from(pub_id))
            .unwrap_or_else(|| panic!("post {} not stored", pub_id))
    }

    pub fn comment(&self, pub_id: &str) -> Comment {
        self.deps
            .storage
            .comment(&PublicationId::from(pub_id))
            .unwrap_or_else(|| panic!("comment {} not stored", pub_id))
    }

    /// Whether the moderation record of `pub_id` is still cached.
    pub fn has_record(&self, pub_id: &str) -> bool {
        self.deps.cache.contains_key(&format!("mcr:{}", pub_id))
    }

    /// Moderation codes handed to the reviewer for `pub_id`, by content id.
    pub fn codes(&self, pub_id: &str) -> HashMap<ContentId, ModerationCode> {
        self.deps
            .moderation_api
            .requests_for(&PublicationId::from(pub_id))
            .into_iter()
            .map(|r| (r.content_id, r.moderation_code))
            .collect()
    }

    pub fn code(&self, pub_id: &str, content_id: &str) -> ModerationCode {
        self.codes(pub_id)
            .remove(&ContentId::from(content_id))
            .unwrap_or_else(|| panic!("{} of {} was never sent for review", content_id, pub_id))
    }

    /// Deliver a reviewer callback the way the external service would.
    pub async fn verdict(
        &self,
        pub_id: &str,
        content_id: &str,
        state: Verdict,
        report: &str,
    ) -> Result<Dispatch<SystemKind>, BusError> {
        self.kernel
            .handle(SetModerationResult {
                mcr_id: pub_id.into(),
                block_id: self.code(pub_id, content_id),
                state,
                report: report.to_string(),
            })
            .await
    }
}
