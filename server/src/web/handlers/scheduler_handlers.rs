// uranai_server/src/web/handlers/scheduler_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::scheduler::{SchedulerDeps, SchedulerState, FORTUNE_WORKER_JOB, ORDER_CHECKER_JOB};
use crate::state::AppState;

fn running_label(running: bool) -> &'static str {
  if running {
    "running"
  } else {
    "stopped"
  }
}

#[instrument(name = "handler::scheduler_status", skip(app_state))]
pub async fn status_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let slot = app_state.scheduler.lock().expect("scheduler slot poisoned");
  let (worker_running, checker_running) = match slot.as_ref() {
    Some(state) => (state.job_running(FORTUNE_WORKER_JOB), state.job_running(ORDER_CHECKER_JOB)),
    None => (false, false),
  };

  let config = &app_state.config;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "status": {
      "fortuneGenerator": running_label(worker_running),
      "fortuneSchedule": config.fortune_scheduler_cron,
      "orderChecker": running_label(checker_running),
      "orderCheckerSchedule": config.order_checker_cron,
      "enableScheduler": config.enable_scheduler,
      "enableOrderChecker": config.enable_order_checker,
    }
  })))
}

/// Stop-then-start on the scheduler slot. The old state's tasks are aborted
/// before the new one is built so two workers never poll concurrently.
#[instrument(name = "handler::scheduler_restart", skip(app_state))]
pub async fn restart_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let deps = SchedulerDeps {
    config: app_state.config.clone(),
    orchestrator: app_state.orchestrator.clone(),
    intake: app_state.intake.clone(),
    commerce: app_state.commerce.clone(),
  };

  let previous = {
    let mut slot = app_state.scheduler.lock().expect("scheduler slot poisoned");
    slot.take()
  };
  if let Some(state) = previous {
    state.stop();
    info!("previous scheduler state stopped");
  }

  let new_state = SchedulerState::start(deps)?;
  let jobs = new_state.status();
  {
    let mut slot = app_state.scheduler.lock().expect("scheduler slot poisoned");
    *slot = Some(new_state);
  }

  Ok(HttpResponse::Ok().json(json!({ "success": true, "result": { "jobs": jobs } })))
}
