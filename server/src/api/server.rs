//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::auth::{AuthManager, AuthState, require_auth};
use super::middleware::{self, AllowedOrigins};
use super::openapi::openapi_json;
use super::routes::{account, actions, health, login};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::data::TransactionalService;
use crate::data::identity::IdentityProvider;

pub struct ApiServer {
    app: CoreApp,
    auth_manager: Arc<AuthManager>,
    allowed_origins: AllowedOrigins,
}

/// Everything the router needs, independent of the listening socket
pub struct RouterDeps {
    pub database: Arc<TransactionalService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth_manager: Arc<AuthManager>,
    pub allowed_origins: AllowedOrigins,
    pub public_url: String,
    pub avatar_max_bytes: usize,
}

/// Build the full HTTP router
pub fn build_router(deps: RouterDeps) -> Router<()> {
    let RouterDeps {
        database,
        identity,
        auth_manager,
        allowed_origins,
        public_url,
        avatar_max_bytes,
    } = deps;

    let auth_state = AuthState {
        auth_manager: auth_manager.clone(),
        allowed_origins: allowed_origins.clone(),
        database: database.clone(),
    };

    // Session required
    let account_routes = account::routes(database.clone(), identity.clone()).layer(
        axum::middleware::from_fn_with_state(auth_state.clone(), require_auth),
    );
    let action_routes = actions::routes(
        database.clone(),
        identity.clone(),
        auth_manager.clone(),
        avatar_max_bytes,
    )
    .layer(axum::middleware::from_fn_with_state(
        auth_state,
        require_auth,
    ));

    // No session
    let login_routes = login::routes(auth_manager, identity, database, &public_url);

    Router::new()
        .route("/", get(|| async { Redirect::to("/account/dashboard") }))
        .route("/api/health", get(health::health))
        .route("/api/openapi.json", get(openapi_json))
        .merge(login_routes)
        .nest("/account", account_routes)
        .nest("/account-actions", action_routes)
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(middleware::cors(&allowed_origins))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let auth_manager = app.auth.clone();
        let allowed_origins = AllowedOrigins::new(
            &app.config.server.host,
            app.config.server.port,
            &app.config.server.public_url,
        );

        Self {
            app,
            auth_manager,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            auth_manager,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(host.parse()?, port);

        let router = build_router(RouterDeps {
            database: app.database.clone(),
            identity: app.identity.clone(),
            auth_manager,
            allowed_origins,
            public_url: app.config.server.public_url.clone(),
            avatar_max_bytes: app.config.uploads.avatar_max_bytes,
        });

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "Listening");
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}
