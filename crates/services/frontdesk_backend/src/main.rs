// File: services/frontdesk_backend/src/main.rs
use axum::{routing::get, Router};
use frontdesk_common::error::{config_error, FrontdeskError};
use frontdesk_common::logging;
use frontdesk_config::load_config;
use frontdesk_db::repositories::{
    AppointmentRepository, BusinessRepository, SqlAppointmentRepository, SqlBusinessRepository,
    SqlTaskRepository, TaskRepository,
};
use frontdesk_db::DbClient;
#[cfg(feature = "gcal")]
use frontdesk_gcal::routes as gcal_routes;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), FrontdeskError> {
    logging::init();

    let config = Arc::new(load_config().map_err(config_error)?);

    let db = DbClient::new(&config)
        .await
        .map_err(|e| FrontdeskError::DatabaseError(e.to_string()))?;

    SqlBusinessRepository::new(db.clone())
        .init_schema()
        .await
        .map_err(|e| FrontdeskError::DatabaseError(e.to_string()))?;
    SqlAppointmentRepository::new(db.clone())
        .init_schema()
        .await
        .map_err(|e| FrontdeskError::DatabaseError(e.to_string()))?;
    SqlTaskRepository::new(db.clone())
        .init_schema()
        .await
        .map_err(|e| FrontdeskError::DatabaseError(e.to_string()))?;

    let api_router = Router::new().route("/", get(|| async { "Welcome to Frontdesk API!" }));

    #[cfg(feature = "gcal")]
    let api_router = if config.use_gcal {
        api_router.merge(gcal_routes::routes(config.clone(), db.clone()))
    } else {
        info!("Calendar feature disabled by configuration");
        api_router
    };

    #[allow(unused_mut)] // mutated only when the openapi feature is on
    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(all(feature = "openapi", feature = "gcal"))]
    {
        use frontdesk_gcal::doc::FrontdeskApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        info!("Adding Swagger UI at /api/docs");
        let swagger_ui =
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", FrontdeskApiDoc::openapi());
        app = app.merge(swagger_ui);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
