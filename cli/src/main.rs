//! settle CLI - runs one demo scenario against the tokio host.
//!
//! ```text
//! main() -> SettleConfig::load() -> init_tracing() -> LocalSet::block_on(run(scenario))
//! ```
//!
//! Everything runs on a current-thread runtime inside a `LocalSet`, which is
//! what [`TokioHost`] needs to post jobs and arm timers.

use std::env;
use std::fmt;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Error, Result, bail};
use settle_config::SettleConfig;
use settle_core::{
    Outcome, Promise, SharedHost, TokioHost, any, race, retry_with_timeout, schedule, sleep,
};
use tokio::runtime::Builder;
use tokio::task::LocalSet;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    Schedule,
    Retry,
    Race,
    Any,
}

impl Scenario {
    const ALL: [Scenario; 4] = [
        Scenario::Schedule,
        Scenario::Retry,
        Scenario::Race,
        Scenario::Any,
    ];

    fn parse(arg: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scenario| scenario.as_str() == arg)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Scenario::Schedule => "schedule",
            Scenario::Retry => "retry",
            Scenario::Race => "race",
            Scenario::Any => "any",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn usage() -> String {
    let names: Vec<&str> = Scenario::ALL.into_iter().map(Scenario::as_str).collect();
    format!("usage: settle <{}>", names.join("|"))
}

fn init_tracing(configured: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or("info")))
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(log_fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    let loaded = SettleConfig::load();
    let filter = match &loaded {
        Ok(Some(config)) => config.log_filter(),
        Ok(None) | Err(_) => None,
    };
    init_tracing(filter);

    let config = match loaded {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(%err, "Ignoring config; using defaults");
            SettleConfig::default()
        }
    };

    let Some(arg) = env::args().nth(1) else {
        bail!("{}", usage());
    };
    let Some(scenario) = Scenario::parse(&arg) else {
        bail!("unknown scenario {arg:?}\n{}", usage());
    };

    let runtime = Builder::new_current_thread().enable_time().build()?;
    LocalSet::new().block_on(&runtime, run(scenario, &config))
}

async fn run(scenario: Scenario, config: &SettleConfig) -> Result<()> {
    let host: SharedHost = TokioHost::shared();
    tracing::info!(%scenario, "Running scenario");
    match scenario {
        Scenario::Schedule => run_schedule(&host, config).await,
        Scenario::Retry => run_retry(&host, config).await,
        Scenario::Race => run_race(&host).await,
        Scenario::Any => run_any(&host).await,
    }
}

/// A named task that takes `ms` to complete.
fn simulated(host: &SharedHost, name: &'static str, ms: u64) -> Promise<String, String> {
    sleep(host, Duration::from_millis(ms))
        .widen_err()
        .map(move |()| format!("{name} finished after {ms}ms"))
}

async fn run_schedule(host: &SharedHost, config: &SettleConfig) -> Result<()> {
    let limit = config.schedule_limit()?;
    println!("running 3 tasks, at most {limit} at a time");

    let tasks = [("A", 300), ("B", 100), ("C", 200)].map(|(name, ms)| {
        let host = Rc::clone(host);
        move || {
            println!("start {name}");
            simulated(&host, name, ms)
        }
    });
    let results = schedule(host, tasks, limit).await.map_err(Error::msg)?;
    for line in results {
        println!("{line}");
    }
    Ok(())
}

async fn run_retry(host: &SharedHost, config: &SettleConfig) -> Result<()> {
    let policy = config.retry_policy()?;
    println!(
        "retries={} timeout={}ms delay={}ms",
        policy.retries(),
        policy.timeout().as_millis(),
        policy.delay().as_millis()
    );

    let op_host = Rc::clone(host);
    let mut attempt = 0;
    let operation = move || {
        attempt += 1;
        let n = attempt;
        println!("attempt {n}");
        sleep(&op_host, Duration::from_millis(50))
            .widen_err()
            .then(move |()| {
                if n < 3 {
                    Outcome::Reject(format!("attempt {n}: network error"))
                } else {
                    Outcome::Fulfill(format!("succeeded on attempt {n}"))
                }
            })
    };

    let value = retry_with_timeout(host, operation, policy).await?;
    println!("{value}");
    Ok(())
}

async fn run_race(host: &SharedHost) -> Result<()> {
    let winner = race(
        host,
        [simulated(host, "slow", 200), simulated(host, "fast", 100)],
    )
    .await
    .map_err(Error::msg)?;
    println!("{winner}");
    Ok(())
}

async fn run_any(host: &SharedHost) -> Result<()> {
    let first = any(
        host,
        [
            Outcome::Reject("refused".to_string()),
            Outcome::Adopt(simulated(host, "mirror", 150)),
            Outcome::Adopt(simulated(host, "origin", 50)),
        ],
    )
    .await?;
    println!("{first}");

    let failures = any::<String, String, _, _>(
        host,
        [Err("dns".to_string()), Err("tls".to_string())],
    )
    .await;
    if let Err(err) = failures {
        println!("{err}: {}", err.errors().join(", "));
    }
    Ok(())
}
