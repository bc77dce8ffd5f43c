pub mod error;
pub mod extract;
pub mod routes;
pub mod telemetry;

use core::time::Duration;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{delete, get, post, put};
use axum::Router;
use hostel_desk_allocation::{AssignmentStore, Reconciler};
use hostel_desk_config::Config;
use hostel_desk_database::{get_database_connection, PgAssignmentBackend, Pool};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info};

use crate::error::AppError;

/// The reconciler every request shares, together with its store.
pub type Desk = Arc<Reconciler<PgAssignmentBackend>>;

#[derive(Clone, FromRef)]
pub struct MyState {
    pool: Pool,
    desk: Desk,
}

impl MyState {
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        let backend = PgAssignmentBackend::new(pool.clone());
        Self {
            pool,
            desk: Arc::new(Reconciler::new(backend, AssignmentStore::new().shared())),
        }
    }
}

pub fn router() -> Router<MyState> {
    Router::new()
        .route("/hostels", get(routes::hostels::list).post(routes::hostels::create))
        .route(
            "/hostels/:id",
            get(routes::hostels::get)
                .put(routes::hostels::update)
                .delete(routes::hostels::delete),
        )
        .route("/hostels/:id/rooms", get(routes::hostels::rooms))
        .route("/rooms", post(routes::rooms::create))
        .route(
            "/rooms/:id",
            put(routes::rooms::update).delete(routes::rooms::delete),
        )
        .route("/rooms/:id/capacity", get(routes::rooms::capacity))
        .route(
            "/partners",
            get(routes::partners::list).post(routes::partners::create),
        )
        .route(
            "/partners/:id",
            get(routes::partners::get)
                .put(routes::partners::update)
                .delete(routes::partners::delete),
        )
        .route("/partners/:id/groups", get(routes::partners::groups))
        .route("/partners/:id/persons", get(routes::partners::persons))
        .route("/groups", post(routes::groups::create))
        .route(
            "/groups/:id",
            put(routes::groups::update).delete(routes::groups::delete),
        )
        .route("/persons", post(routes::persons::create))
        .route(
            "/persons/:id",
            put(routes::persons::update).delete(routes::persons::delete),
        )
        .route(
            "/assignments",
            get(routes::assignments::list).post(routes::assignments::create),
        )
        .route("/assignments/:id", delete(routes::assignments::delete))
        .route("/assignments/refresh", post(routes::assignments::refresh))
        .route("/board", get(routes::board::show))
}

fn layers(app: Router<MyState>, state: MyState, timeout: Duration) -> Router<()> {
    // layers are in reverse order
    let app: Router<()> = app.with_state(state);
    let app = app.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::default().include_headers(true))
                    .on_response(DefaultOnResponse::default().include_headers(true)),
            )
            .layer(CatchPanicLayer::new())
            .layer(TimeoutLayer::new(timeout)),
    );
    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

pub fn setup_server(config: &Config) -> Result<Router<()>, AppError> {
    let pool = get_database_connection(&config.database_url)?;
    Ok(layers(router(), MyState::new(pool), config.action_timeout()))
}

pub async fn run_server(config: Config) -> Result<(), AppError> {
    let app = setup_server(&config)?;
    let listener = TcpListener::bind(config.listen_address).await?;
    info!(address = %config.listen_address, "listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                error!(%error, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutting down");
}
