// uranai_server/src/scheduler.rs

//! Periodic pipeline driving: the batch worker and the commerce-order
//! checker.
//!
//! Scheduler state is an explicit value owned by the server. `start` builds
//! it, `stop` consumes it; status is derived from the value itself, never
//! from globals. Restarting is stop + start on the slot in `AppState`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use uranai::{IntakeAdapter, Orchestrator, OrderIntake};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::services::{CommerceClient, OrderQuery};

pub const FORTUNE_WORKER_JOB: &str = "fortune_worker";
pub const ORDER_CHECKER_JOB: &str = "order_checker";

/// Everything the periodic jobs need, bundled so `start` has one argument.
#[derive(Clone)]
pub struct SchedulerDeps {
  pub config: Arc<AppConfig>,
  pub orchestrator: Arc<Orchestrator>,
  pub intake: Arc<IntakeAdapter>,
  pub commerce: Arc<dyn CommerceClient>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
  pub name: String,
  pub schedule: String,
  pub running: bool,
}

struct Job {
  name: &'static str,
  schedule: String,
  handle: JoinHandle<()>,
}

pub struct SchedulerState {
  jobs: Vec<Job>,
}

impl SchedulerState {
  /// Spawns the jobs enabled by configuration. An empty state (no flags set)
  /// is valid and reports no running jobs.
  pub fn start(deps: SchedulerDeps) -> Result<SchedulerState> {
    let mut jobs = Vec::new();

    if deps.config.enable_scheduler {
      let period = parse_cron_interval(&deps.config.fortune_scheduler_cron)
        .map_err(|e| AppError::Config(format!("Invalid FORTUNE_SCHEDULER_CRON: {}", e)))?;
      info!(schedule = %deps.config.fortune_scheduler_cron, ?period, "starting fortune worker job");
      let worker_deps = deps.clone();
      let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
          ticker.tick().await;
          match worker_deps.orchestrator.run_batch(worker_deps.config.batch_max_orders).await {
            Ok(summary) => {
              info!(
                processed = summary.processed(),
                succeeded = summary.succeeded(),
                failed = summary.failed(),
                "scheduled batch run finished"
              );
            }
            Err(err) => error!(error = %err, "scheduled batch run failed"),
          }
        }
      });
      jobs.push(Job { name: FORTUNE_WORKER_JOB, schedule: deps.config.fortune_scheduler_cron.clone(), handle });
    } else {
      info!("fortune worker job disabled by configuration");
    }

    if deps.config.enable_order_checker {
      let period = parse_cron_interval(&deps.config.order_checker_cron)
        .map_err(|e| AppError::Config(format!("Invalid ORDER_CHECKER_CRON: {}", e)))?;
      info!(schedule = %deps.config.order_checker_cron, ?period, "starting order checker job");
      let checker_deps = deps.clone();
      let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
          ticker.tick().await;
          match check_new_orders(&checker_deps).await {
            Ok(ingested) => info!(ingested, "order check finished"),
            Err(err) => error!(error = %err, "order check failed"),
          }
        }
      });
      jobs.push(Job { name: ORDER_CHECKER_JOB, schedule: deps.config.order_checker_cron.clone(), handle });
    } else {
      info!("order checker job disabled by configuration");
    }

    Ok(SchedulerState { jobs })
  }

  pub fn stop(self) {
    for job in self.jobs {
      job.handle.abort();
      info!(job = job.name, "scheduler job stopped");
    }
  }

  pub fn status(&self) -> Vec<JobStatus> {
    self
      .jobs
      .iter()
      .map(|job| JobStatus {
        name: job.name.to_string(),
        schedule: job.schedule.clone(),
        running: !job.handle.is_finished(),
      })
      .collect()
  }

  pub fn job_running(&self, name: &str) -> bool {
    self.jobs.iter().any(|job| job.name == name && !job.handle.is_finished())
  }
}

/// Polls the commerce platform and ingests orders not yet known to the
/// store. Intake is idempotent, so re-seeing recent orders every cycle is
/// harmless; only actual creations are counted.
async fn check_new_orders(deps: &SchedulerDeps) -> anyhow::Result<usize> {
  let page = deps.commerce.list_orders(&OrderQuery { offset: 0, limit: 50, ..Default::default() }).await?;

  let mut ingested = 0;
  for order in page.orders {
    let email = match order.customer_email {
      Some(email) if !email.is_empty() => email,
      _ => {
        warn!(order_id = %order.id, "commerce order has no customer email, skipping");
        continue;
      }
    };
    let intake = OrderIntake {
      order_id: order.id,
      email,
      product_name: order.product_name,
      created_at: order.ordered_at,
      name: order.customer_name,
      ..Default::default()
    };
    match deps.intake.ingest(intake).await {
      Ok((_, true)) => ingested += 1,
      Ok((_, false)) => {}
      Err(err) => warn!(error = %err, "failed to ingest polled order"),
    }
  }
  Ok(ingested)
}

/// Maps the cron subset the product actually uses onto a polling interval.
///
/// Supported forms: `*/N * * * *` (every N minutes), `N * * * *` (hourly),
/// `* * * * *` (every minute). Anything else is a configuration error; the
/// caller fails fast at startup rather than running at a surprise cadence.
pub fn parse_cron_interval(expr: &str) -> std::result::Result<Duration, String> {
  let fields: Vec<&str> = expr.split_whitespace().collect();
  if fields.len() != 5 {
    return Err(format!("expected 5 cron fields, got {}", fields.len()));
  }
  if fields[1..].iter().any(|f| *f != "*") {
    return Err("only minute-level schedules are supported".to_string());
  }

  let minute = fields[0];
  if minute == "*" {
    return Ok(Duration::from_secs(60));
  }
  if let Some(step) = minute.strip_prefix("*/") {
    let n: u64 = step.parse().map_err(|_| format!("invalid minute step '{}'", step))?;
    if n == 0 || n > 59 {
      return Err(format!("minute step {} out of range", n));
    }
    return Ok(Duration::from_secs(n * 60));
  }
  if let Ok(fixed) = minute.parse::<u64>() {
    if fixed > 59 {
      return Err(format!("minute {} out of range", fixed));
    }
    // A fixed minute means once an hour; the exact phase is not preserved.
    return Ok(Duration::from_secs(60 * 60));
  }
  Err(format!("unsupported minute field '{}'", minute))
}
