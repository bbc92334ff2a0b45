//! Soak command - concurrent load against a live session cache.
//!
//! Writers put, replace, and delete sessions while readers look them up and
//! check that both indexes agree. The cleanup scheduler sweeps throughout
//! unless disabled in the config.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use chrono::Utc;
use clap::Args;
use console::Style;
use tracing::{debug, info};
use uuid::Uuid;
use warden_session::{CleanupScheduler, SessionCache, SessionRecord};

use super::Context;

/// Arguments for the soak command.
#[derive(Args, Debug)]
pub struct SoakArgs {
    /// Concurrent writer tasks
    #[arg(long, default_value_t = 4)]
    pub writers: usize,

    /// Concurrent reader tasks
    #[arg(long, default_value_t = 4)]
    pub readers: usize,

    /// How long to run, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub duration_ms: u64,

    /// Override the configured cache capacity
    #[arg(long)]
    pub max_size: Option<usize>,

    /// Override the configured cleanup period, in milliseconds
    #[arg(long)]
    pub cleanup_period_ms: Option<u64>,

    /// Number of distinct identities writers log in as
    #[arg(long, default_value_t = 500)]
    pub identities: u64,

    /// Percentage of written sessions that are already expired
    #[arg(long, default_value_t = 20)]
    pub expired_percent: u64,
}

#[derive(Debug, Default)]
struct Counters {
    puts: AtomicU64,
    deletes: AtomicU64,
    reads: AtomicU64,
    hits: AtomicU64,
    violations: AtomicU64,
}

/// Run the soak command.
pub async fn run(args: SoakArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.cache.to_cache_config();
    if let Some(max_size) = args.max_size {
        config = config.with_max_size(max_size);
    }
    if let Some(period_ms) = args.cleanup_period_ms {
        config = config.with_cleanup_period(Duration::from_millis(period_ms));
    }

    let cache = SessionCache::new(&config);
    let scheduler = CleanupScheduler::new(cache.clone(), &config);
    let cleanup_running = config.enable_cleanup_task && scheduler.start();

    let identities = args.identities.max(1);
    let expired_percent = args.expired_percent.min(100);
    let capacity = config.effective_capacity();
    let stop = Arc::new(AtomicBool::new(false));
    let counters = Arc::new(Counters::default());
    let mut handles = Vec::with_capacity(args.writers + args.readers);

    info!(
        writers = args.writers,
        readers = args.readers,
        capacity,
        cleanup = cleanup_running,
        "Starting soak run"
    );

    for writer in 0..args.writers as u64 {
        let cache = cache.clone();
        let stop = Arc::clone(&stop);
        let counters = Arc::clone(&counters);
        handles.push(tokio::spawn(async move {
            let mut n: u64 = 0;
            while !stop.load(Ordering::Relaxed) {
                let id = Uuid::from_u128(u128::from((writer * 7919 + n) % identities));
                if n % 10 == 9 {
                    cache.delete_by_user_id(&id).await;
                    counters.deletes.fetch_add(1, Ordering::Relaxed);
                } else {
                    let ttl = if n % 100 < expired_percent {
                        chrono::Duration::seconds(-1)
                    } else {
                        chrono::Duration::minutes(5)
                    };
                    let token = format!("soak-{writer}-{n}");
                    let record =
                        SessionRecord::new(id, token.as_str(), "refresh", Utc::now() + ttl);
                    cache.put(token, record).await;
                    counters.puts.fetch_add(1, Ordering::Relaxed);
                }
                n += 1;
                tokio::task::yield_now().await;
            }
        }));
    }

    for _ in 0..args.readers {
        let cache = cache.clone();
        let stop = Arc::clone(&stop);
        let counters = Arc::clone(&counters);
        handles.push(tokio::spawn(async move {
            let mut n: u64 = 0;
            while !stop.load(Ordering::Relaxed) {
                let id = Uuid::from_u128(u128::from(n % identities));
                if let Some(record) = cache.get_by_user_id(&id).await {
                    counters.hits.fetch_add(1, Ordering::Relaxed);
                    if record.identity_id != id {
                        counters.violations.fetch_add(1, Ordering::Relaxed);
                    }
                }
                if cache.count().await > capacity || !cache.is_consistent().await {
                    counters.violations.fetch_add(1, Ordering::Relaxed);
                }
                counters.reads.fetch_add(1, Ordering::Relaxed);
                n += 1;
                tokio::task::yield_now().await;
            }
        }));
    }

    let started = Instant::now();
    tokio::time::sleep(Duration::from_millis(args.duration_ms)).await;
    stop.store(true, Ordering::Relaxed);

    for handle in handles {
        tokio::time::timeout(Duration::from_secs(10), handle).await??;
    }
    scheduler.stop();
    let elapsed = started.elapsed();

    let stats = cache.stats().await;
    debug!(?stats, "Soak run finished");

    let dim = Style::new().dim();
    let violations = counters.violations.load(Ordering::Relaxed);
    println!();
    println!("Soak run ({:.1}s)", elapsed.as_secs_f64());
    println!("  {} {}", dim.apply_to("puts:      "), counters.puts.load(Ordering::Relaxed));
    println!("  {} {}", dim.apply_to("deletes:   "), counters.deletes.load(Ordering::Relaxed));
    println!("  {} {}", dim.apply_to("reads:     "), counters.reads.load(Ordering::Relaxed));
    println!("  {} {}", dim.apply_to("hits:      "), counters.hits.load(Ordering::Relaxed));
    println!("  {} {}/{}", dim.apply_to("final size:"), stats.size, stats.capacity);
    println!("  {} {}", dim.apply_to("unswept:   "), stats.expired);
    if cleanup_running {
        println!(
            "  {} every {}ms",
            dim.apply_to("cleanup:   "),
            scheduler.period().as_millis()
        );
    } else {
        println!("  {} disabled", dim.apply_to("cleanup:   "));
    }

    if violations > 0 {
        let red = Style::new().red();
        println!("  {} {}", red.apply_to("violations:"), violations);
        println!();
        bail!("{violations} invariant violations observed");
    }

    let green = Style::new().green();
    println!("  {} 0", green.apply_to("violations:"));
    println!();
    Ok(())
}
