use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use booksearch_engine::SearchContext;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_search;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Process-wide search dependencies (providers, cache, dispatcher)
    pub search: SearchContext,
}

impl AppContext {
    pub fn new(config: Config, search: SearchContext) -> Self {
        Self {
            config: Arc::new(config),
            search,
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/b", routes_search::search_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Start the HTTP server and serve until Ctrl+C or SIGTERM.
pub async fn start_server(ctx: AppContext) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use booksearch_common::{Book, FetchError};
    use booksearch_engine::{Dispatcher, Listing, Payload, Request, ResponseCache, Source};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Catalogue that echoes the filter value back as a single book.
    struct EchoCatalog;

    #[async_trait]
    impl Source for EchoCatalog {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn fetch(&self, request: &Request) -> Result<Payload, FetchError> {
            match request {
                Request::Books { filter, page } => Ok(Payload::Books(Listing {
                    items: vec![Book {
                        book_id: Some(filter.value().to_string()),
                        title: Some(format!("{} by {}", filter.value(), filter.index())),
                        ..Default::default()
                    }],
                    total_results: 25,
                    page_number: *page,
                })),
                _ => Err(FetchError::transport("catalog offline")),
            }
        }
    }

    fn app() -> Router {
        let search = SearchContext::new(
            Arc::new(EchoCatalog),
            None,
            Dispatcher::new(Arc::new(ResponseCache::default()), None),
        );
        create_router(AppContext::new(Config::default(), search))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(HttpRequest::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn slug_route_searches_by_book_id() {
        let (status, body) = get_json("/b/law_and_disorder").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filter"], "book_id");
        assert_eq!(body["items"][0]["book_id"], "law_and_disorder");
        assert_eq!(body["items"][0]["title"], "law_and_disorder by book_id");
    }

    #[tokio::test]
    async fn paged_route_passes_page_through() {
        let (status, body) = get_json("/b/title/Nostromo/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_page"], 3);
        assert_eq!(body["total_pages"], 3);
    }

    #[tokio::test]
    async fn non_numeric_page_is_json_bad_request() {
        let (status, body) = get_json("/b/title/Nostromo/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert!(body["error"].as_str().unwrap().contains("'abc'"));
    }

    #[tokio::test]
    async fn unknown_filter_is_bad_request() {
        let (status, body) = get_json("/b/colour/blue").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert!(body["error"].as_str().unwrap().contains("colour"));
    }

    #[tokio::test]
    async fn first_tier_failure_is_bad_gateway() {
        let (status, body) = get_json("/b/author/conrad").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "upstream_error");
    }
}
