//! Moderation simulator
//!
//! Creates a post, submits it for moderation and answers every review
//! request with a local keyword reviewer. Verdicts come back as independent
//! top-level `handle()` calls on spawned tasks, the same way the external
//! service calls back in production.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use blog_core::common::{AuthorId, ContentId, PublicationId};
use blog_core::config::Config;
use blog_core::domains::blog::commands::{AddContentBlock, CreatePost, PublishPost, SaveDraft};
use blog_core::domains::blog::models::{ContentType, PostState};
use blog_core::domains::moderation::commands::{SetModerationResult, StartModeration};
use blog_core::domains::moderation::models::Verdict;
use blog_core::kernel::{
    BaseModerationApi, BaseNotifier, MemoryCache, MemoryStorage, Notification, ReviewRequest,
    ServerDeps, ServerKernel,
};
use clap::Parser;
use indexmap::IndexMap;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "moderation_sim")]
#[command(about = "Run one post through moderation with a local keyword reviewer")]
struct Cli {
    /// Post title
    #[arg(long, default_value = "Hello, moderation")]
    title: String,

    /// Header block text
    #[arg(long, default_value = "A short introduction")]
    header: String,

    /// Body block text
    #[arg(long, default_value = "Nothing to see here, just a friendly post.")]
    body: String,

    /// Words that make the reviewer decline a block
    #[arg(long, value_delimiter = ',', default_value = "profanity,spam")]
    banned: Vec<String>,

    /// Upper bound of the random reviewer latency
    #[arg(long, default_value_t = 50)]
    max_delay_ms: u64,

    /// Publish this many seconds after acceptance instead of immediately
    #[arg(long)]
    activate_in_secs: Option<i64>,
}

/// Declines any block containing a banned word. Each verdict is delivered
/// from its own task after a random delay.
struct KeywordReviewer {
    kernel: OnceLock<Weak<ServerKernel>>,
    banned: Vec<String>,
    max_delay_ms: u64,
    callbacks: Mutex<Vec<JoinHandle<()>>>,
}

impl KeywordReviewer {
    fn new(banned: Vec<String>, max_delay_ms: u64) -> Self {
        Self {
            kernel: OnceLock::new(),
            banned: banned.into_iter().map(|w| w.to_lowercase()).collect(),
            max_delay_ms,
            callbacks: Mutex::new(Vec::new()),
        }
    }

    fn judge(&self, payload: &str) -> (Verdict, String) {
        let text = payload.to_lowercase();
        match self.banned.iter().find(|word| text.contains(word.as_str())) {
            Some(word) => (Verdict::Declined, word.clone()),
            None => (Verdict::Accepted, String::new()),
        }
    }

    /// Wait until every verdict callback has run.
    async fn settle(&self) {
        loop {
            let pending: Vec<_> = self.callbacks.lock().await.drain(..).collect();
            if pending.is_empty() {
                return;
            }
            for result in futures::future::join_all(pending).await {
                if let Err(err) = result {
                    warn!(error = %err, "verdict callback task panicked");
                }
            }
        }
    }
}

#[async_trait]
impl BaseModerationApi for KeywordReviewer {
    async fn submit(&self, request: ReviewRequest) -> Result<()> {
        let kernel = self
            .kernel
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| anyhow!("reviewer is not attached to a kernel"))?;

        let (verdict, report) = self.judge(&request.payload);
        let delay = Duration::from_millis(rand::thread_rng().gen_range(0..=self.max_delay_ms));
        info!(pub_id = %request.pub_id, content_id = %request.content_id, %verdict, ?delay, "review scheduled");

        let callback = SetModerationResult {
            mcr_id: request.pub_id,
            block_id: request.moderation_code,
            state: verdict,
            report,
        };
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = kernel.handle(callback).await {
                warn!(error = %err, "verdict callback failed");
            }
        });
        self.callbacks.lock().await.push(handle);
        Ok(())
    }
}

/// Prints notifications instead of mailing them.
struct ConsoleNotifier;

#[async_trait]
impl BaseNotifier for ConsoleNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        println!(
            "  mail to {}: {}{}",
            notification.recipient,
            notification.subject,
            if notification.body.is_empty() {
                String::new()
            } else {
                format!(" ({})", notification.body.replace('\n', " "))
            }
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,blog_core=info,moderation_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let storage = MemoryStorage::new();
    let reviewer = Arc::new(KeywordReviewer::new(cli.banned.clone(), cli.max_delay_ms));
    let kernel = Arc::new(ServerKernel::new(ServerDeps::new(
        Arc::new(storage.clone()),
        Arc::new(MemoryCache::new()),
        reviewer.clone(),
        Arc::new(ConsoleNotifier),
        config,
    )));
    reviewer
        .kernel
        .set(Arc::downgrade(&kernel))
        .map_err(|_| anyhow!("reviewer already attached"))?;

    let pub_id = PublicationId::generate();
    let author_id = AuthorId::from("sim-author");
    let header_id = ContentId::generate();
    let body_id = ContentId::generate();

    kernel
        .handle(CreatePost {
            pub_id: pub_id.clone(),
            author_id: author_id.clone(),
            title: cli.title.clone(),
        })
        .await?;
    for (content_id, text) in [(&header_id, &cli.header), (&body_id, &cli.body)] {
        kernel
            .handle(AddContentBlock {
                pub_id: pub_id.clone(),
                content_id: content_id.clone(),
                kind: ContentType::Text,
                body: text.clone(),
            })
            .await?;
    }
    kernel.handle(SaveDraft { pub_id: pub_id.clone() }).await?;

    println!("submitting post {} for moderation", pub_id);
    kernel
        .handle(
            StartModeration::builder()
                .pub_id(pub_id.clone())
                .author_id(author_id)
                .blocks(IndexMap::from([
                    (header_id, ContentType::Text),
                    (body_id, ContentType::Text),
                ]))
                .build(),
        )
        .await?;

    reviewer.settle().await;

    let post = storage
        .post(&pub_id)
        .with_context(|| format!("post {} disappeared", pub_id))?;
    if post.state() == PostState::Accepted {
        let activate_at = cli
            .activate_in_secs
            .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs));
        kernel
            .handle(PublishPost {
                pub_id: pub_id.clone(),
                activate_at,
            })
            .await?;
    }

    let post = storage
        .post(&pub_id)
        .with_context(|| format!("post {} disappeared", pub_id))?;
    println!("post {} finished in state {:?}", pub_id, post.state());
    for record in storage.content_for(&pub_id) {
        println!(
            "  block {} locked={} {:?}",
            record.content_id, record.locked, record.body
        );
    }
    Ok(())
}
