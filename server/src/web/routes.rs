// uranai_server/src/web/routes.rs

use actix_web::web;

// Liveness only; pipeline health is visible through the scheduler status and
// the order records themselves.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// This function is called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    // Health Check Route
    .route("/health", web::get().to(health_check_handler))
    // Webhook Routes (commerce platform posts here, outside the API scope)
    .service(web::scope("/webhook").route(
      "/stores",
      web::post().to(crate::web::handlers::webhook_handlers::stores_webhook_handler),
    ))
    .service(
      web::scope("/api/v1")
        // Consultation form intake
        .service(web::scope("/forms").route(
          "/response",
          web::post().to(crate::web::handlers::form_handlers::form_response_handler),
        ))
        // Admin Routes (bearer token)
        .service(
          web::scope("/admin")
            .route(
              "/fortune/edit",
              web::post().to(crate::web::handlers::admin_handlers::edit_fortune_handler),
            )
            .route(
              "/fortune/regenerate",
              web::post().to(crate::web::handlers::admin_handlers::regenerate_fortune_handler),
            )
            .route(
              "/fortunes",
              web::get().to(crate::web::handlers::admin_handlers::list_fortunes_handler),
            )
            .route(
              "/fortunes/{order_id}",
              web::get().to(crate::web::handlers::admin_handlers::get_fortune_handler),
            )
            .route(
              "/orders",
              web::get().to(crate::web::handlers::order_handlers::list_orders_handler),
            ),
        )
        // Worker Routes (x-api-token)
        .service(
          web::scope("/worker")
            .route("/run", web::post().to(crate::web::handlers::worker_handlers::run_worker_handler))
            .route(
              "/process/{order_id}",
              web::post().to(crate::web::handlers::worker_handlers::process_order_handler),
            ),
        )
        // Scheduler Routes
        .service(
          web::scope("/scheduler")
            .route(
              "/status",
              web::get().to(crate::web::handlers::scheduler_handlers::status_handler),
            )
            .route(
              "/restart",
              web::post().to(crate::web::handlers::scheduler_handlers::restart_handler),
            ),
        ),
    );
}
