use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{
    AdminUserConfig, AppConfig, ConfigError, CookieConfig, JwtConfig, MongoConfig, PaymentConfig,
};
use crate::handler::auth_handler::AuthHandlerState;
use crate::middlewares::auth_middleware::AuthState;
use crate::repository::mongo::MongoStore;
use crate::repository::parcel_repo::{MongoParcelRepository, ParcelRepository};
use crate::repository::review_repo::{MongoReviewRepository, ReviewRepository};
use crate::repository::user_repo::{MongoUserRepository, UserRepository};
use crate::router::auth_router::auth_router;
use crate::router::parcel_router::parcel_router;
use crate::router::payment_router::payment_router;
use crate::router::review_router::review_router;
use crate::router::user_router::user_router;
use crate::service::auth_guard::AuthGuard;
use crate::service::parcel_service::ParcelServiceImpl;
use crate::service::payment_service::{
    PaymentError, PaymentGateway, PaymentServiceImpl, StripePaymentGateway,
};
use crate::service::review_service::ReviewServiceImpl;
use crate::service::user_service::UserServiceImpl;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("payment provider setup failed: {0}")]
    Payment(#[from] PaymentError),
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Every service and middleware state, wired to one set of stores.
#[derive(Clone)]
pub struct AppServices {
    pub user_service: Arc<UserServiceImpl>,
    pub parcel_service: Arc<ParcelServiceImpl>,
    pub review_service: Arc<ReviewServiceImpl>,
    pub payment_service: Arc<PaymentServiceImpl>,
    pub auth_state: Arc<AuthState>,
    pub auth_handler_state: Arc<AuthHandlerState>,
}

impl AppServices {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        parcel_repo: Arc<dyn ParcelRepository>,
        review_repo: Arc<dyn ReviewRepository>,
        gateway: Arc<dyn PaymentGateway>,
        jwt_utils: Arc<dyn JwtTokenUtils>,
        cookie_config: CookieConfig,
        default_currency: String,
    ) -> Self {
        AppServices {
            user_service: Arc::new(UserServiceImpl::new(user_repo.clone())),
            parcel_service: Arc::new(ParcelServiceImpl::new(parcel_repo, user_repo.clone())),
            review_service: Arc::new(ReviewServiceImpl::new(review_repo, user_repo.clone())),
            payment_service: Arc::new(PaymentServiceImpl::new(gateway, default_currency)),
            auth_state: Arc::new(AuthState {
                jwt_utils: jwt_utils.clone(),
                guard: AuthGuard::new(user_repo),
            }),
            auth_handler_state: Arc::new(AuthHandlerState { jwt_utils, cookie_config }),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // Credentials are required for the identity cookie, so origins must be listed explicitly.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// The full HTTP surface.
pub fn create_router(services: &AppServices, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(|| async { "Parcel Management is running" }))
        .route("/health", get(|| async { "OK" }))
        .merge(auth_router(services.auth_handler_state.clone()))
        .merge(user_router(services.user_service.clone(), services.auth_state.clone()))
        .merge(parcel_router(services.parcel_service.clone(), services.auth_state.clone()))
        .merge(review_router(services.review_service.clone(), services.auth_state.clone()))
        .merge(payment_router(services.payment_service.clone(), services.auth_state.clone()))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

pub struct App {
    config: AppConfig,
    router: Router,
    store: MongoStore,
    pub services: AppServices,
}

impl App {
    pub async fn new() -> Result<Self, StartupError> {
        let config = AppConfig::from_env()?;
        let mongo_config = MongoConfig::from_env()?;
        let jwt_config = JwtConfig::from_env()?;
        let cookie_config = CookieConfig::from_env()?;
        let payment_config = PaymentConfig::from_env()?;

        let store = MongoStore::connect(&mongo_config).await?;
        store.ensure_indexes().await?;

        let default_currency = payment_config.default_currency.clone();
        let services = AppServices::new(
            Arc::new(MongoUserRepository::new(&store)),
            Arc::new(MongoParcelRepository::new(&store)),
            Arc::new(MongoReviewRepository::new(&store)),
            Arc::new(StripePaymentGateway::new(payment_config)?),
            Arc::new(JwtTokenUtilsImpl::new(jwt_config)),
            cookie_config,
            default_currency,
        );
        let router = create_router(&services, &config.cors_origins);

        let app = App { config, router, store, services };
        app.create_first_admin_user().await;
        Ok(app)
    }

    pub async fn start(self) -> Result<(), StartupError> {
        let host = self
            .config
            .host
            .parse()
            .map_err(|_| StartupError::InvalidAddress(self.config.host.clone()))?;
        let addr = SocketAddr::new(host, self.config.port);
        info!("🚀 Server running at http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped");
        self.store.shutdown().await;
        Ok(())
    }

    async fn create_first_admin_user(&self) {
        let admin_conf = match AdminUserConfig::from_env() {
            Ok(c) => c,
            Err(e) => {
                warn!("Admin user config not loaded: {e}");
                return;
            }
        };
        if let Err(e) = self
            .services
            .user_service
            .seed_admin(&admin_conf.email, admin_conf.name)
            .await
        {
            error!("Failed to create admin user: {e}");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
