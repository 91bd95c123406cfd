//! Deferload CLI - demonstration harness for the lazy-loading core.
//!
//! Simulates a page of images scrolling through a viewport: each image is
//! bound lazily, intersection events fire as the "scroll" advances, a few
//! upcoming images are prefetched in the background, and the run ends with
//! an aggregate load report.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::Rng;
use tracing::{debug, info};

use deferload::loader::shared_loader;
use deferload::prefetch::DelayPacer;
use deferload::telemetry::LoadMetrics;
use deferload::{
    LazyBinding, LazyConfig, LoadError, ManualDriver, ObservationTarget, PrefetchQueue,
    ResourceFetcher, ResponsiveSource,
};

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};

/// Simulate a scrolling viewport full of lazily loaded images.
#[derive(Parser, Debug)]
#[command(name = "deferload", version, about)]
struct Cli {
    /// Number of images on the simulated page.
    #[arg(long, default_value_t = 12)]
    images: usize,

    /// Viewport width in pixels (drives responsive variant selection).
    #[arg(long, default_value_t = 1280)]
    viewport_width: u32,

    /// One in N simulated loads fails (0 disables failures).
    #[arg(long, default_value_t = 6)]
    failure_every: usize,

    /// Milliseconds between simulated scroll steps.
    #[arg(long, default_value_t = 30)]
    scroll_interval_ms: u64,

    /// Print the final report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Fetcher that simulates a network round trip.
struct SimulatedFetcher;

impl ResourceFetcher for SimulatedFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Bytes, LoadError>> {
        let url = url.to_string();
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            debug!(%url, "simulated fetch complete");
            Ok(Bytes::from(url.into_bytes()))
        }
        .boxed()
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// A simulated load: a short delay, then the resolved source or a failure.
fn simulated_loader(
    src: String,
    delay_ms: u64,
    fails: bool,
) -> deferload::SharedLoader<String> {
    shared_loader(move || {
        let src = src.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            if fails {
                Err(LoadError::loader("simulated network failure"))
            } else {
                Ok(src)
            }
        }
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    info!(
        images = cli.images,
        viewport_width = cli.viewport_width,
        "starting simulated scroll"
    );

    let driver = Arc::new(ManualDriver::new());
    let metrics = Arc::new(LoadMetrics::new());
    let queue = PrefetchQueue::builder()
        .pacer(DelayPacer::new(Duration::from_millis(5)))
        .fetcher(Arc::new(SimulatedFetcher))
        .build();

    let mut rng = rand::rng();
    let mut bindings = Vec::with_capacity(cli.images);
    let mut targets = Vec::with_capacity(cli.images);

    for index in 0..cli.images {
        let source = ResponsiveSource::new(format!("cdn/photo-{index}.jpg"));
        let src = source.current_src(cli.viewport_width).to_string();
        let delay_ms = rng.random_range(20..=120);
        let fails = cli.failure_every != 0 && index % cli.failure_every == cli.failure_every - 1;

        let binding = LazyBinding::builder()
            .config(LazyConfig::new().with_fallback("placeholder.png"))
            .driver(driver.clone())
            .metrics(Arc::clone(&metrics))
            .loader(simulated_loader(src, delay_ms, fails))
            .build();

        let target = ObservationTarget::new(format!("img-{index}"));
        binding.observe(&target);
        bindings.push(binding);
        targets.push(target);
    }

    // Scroll: each step brings one image into view and prefetches the one
    // two positions ahead.
    for (index, target) in targets.iter().enumerate() {
        driver.fire(target.id(), true);
        if index + 2 < cli.images {
            let upcoming = ResponsiveSource::new(format!("cdn/photo-{}.jpg", index + 2));
            queue.prefetch_image(upcoming.current_src(cli.viewport_width));
        }
        tokio::time::sleep(Duration::from_millis(cli.scroll_interval_ms)).await;
    }

    // Let in-flight loads and the drain cycle settle.
    let settled = tokio::time::timeout(Duration::from_secs(10), async {
        while bindings.iter().any(|b| !b.state().is_terminal()) || queue.is_prefetching() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if settled.is_err() {
        tracing::warn!("simulation did not settle within 10s; reporting anyway");
    }

    if let Some(cache) = queue.cache() {
        let stats = cache.stats();
        info!(
            entries = stats.entry_count,
            bytes = stats.weighted_size,
            "prefetch cache populated"
        );
    }

    let report = metrics.report();
    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to serialize report: {e}"),
        }
    } else {
        println!("{report}");
    }

    for binding in &bindings {
        binding.disconnect();
    }
    queue.shutdown();
}
