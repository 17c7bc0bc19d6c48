use crate::server::error::ApiError;
use crate::server::AppContext;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use booksearch_common::{FilterKind, SearchError, SearchResult, ValidationError};

pub fn search_routes() -> Router<AppContext> {
    Router::new()
        .route("/:slug", get(get_book))
        .route("/:by/:query", get(search_first_page))
        .route("/:by/:query/:page", get(search_page))
}

/// Direct lookup by book id.
async fn get_book(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
) -> Result<Json<SearchResult>, ApiError> {
    run(&ctx, FilterKind::BookId.as_str(), &slug, 1).await
}

async fn search_first_page(
    State(ctx): State<AppContext>,
    Path((by, query)): Path<(String, String)>,
) -> Result<Json<SearchResult>, ApiError> {
    run(&ctx, &by, &query, 1).await
}

async fn search_page(
    State(ctx): State<AppContext>,
    Path((by, query, page)): Path<(String, String, String)>,
) -> Result<Json<SearchResult>, ApiError> {
    let page: u32 = page
        .trim()
        .parse()
        .map_err(|_| SearchError::from(ValidationError::MalformedPage(page.clone())))?;
    run(&ctx, &by, &query, page).await
}

async fn run(
    ctx: &AppContext,
    by: &str,
    query: &str,
    page: u32,
) -> Result<Json<SearchResult>, ApiError> {
    let result = ctx.search.search(by, query, page).await?;
    Ok(Json(result))
}
