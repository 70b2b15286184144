//! HTTP handlers for `/api/v1/book`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use library_http::error::AppError;
use library_kernel::{module_path, settings::PaginationSettings, Page, PageQuery};
use serde::Deserialize;

use super::models::{BookId, BookView, CreateBookRequest, UpdateBookRequest};
use super::service::BookService;
use super::MODULE_NAME;

/// Shared handler state.
#[derive(Clone)]
pub struct BookState {
    pub service: Arc<BookService>,
    pub pagination: PaginationSettings,
}

/// `GET /book` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    pub author: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

pub fn router(state: BookState) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(state)
}

fn book_location(id: BookId) -> String {
    format!("{}/{}", module_path(MODULE_NAME), id)
}

fn book_id(path: Result<Path<BookId>, PathRejection>) -> Result<BookId, AppError> {
    let Path(id) = path.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    Ok(id)
}

async fn list_books(
    State(state): State<BookState>,
    query: Result<Query<ListBooksQuery>, QueryRejection>,
) -> Result<Json<Page<BookView>>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let page_request = PageQuery {
        page: query.page,
        size: query.size,
        sort: query.sort,
    }
    .into_request(&state.pagination)
    .map_err(|err| AppError::bad_request(err.to_string()))?;

    let page = state
        .service
        .list_books(query.author.as_deref(), &page_request)
        .await?;
    Ok(Json(page))
}

async fn get_book(
    State(state): State<BookState>,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<Json<BookView>, AppError> {
    let id = book_id(path)?;
    let book = state.service.get_book_by_id(id).await?;
    Ok(Json(book))
}

async fn create_book(
    State(state): State<BookState>,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let created = state.service.create_book(request).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, book_location(created.book_id))],
    )
        .into_response())
}

async fn update_book(
    State(state): State<BookState>,
    path: Result<Path<BookId>, PathRejection>,
    body: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = book_id(path)?;
    let Json(request) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let updated = state.service.update_book(id, request).await?;
    Ok((
        StatusCode::OK,
        [(header::LOCATION, book_location(updated.book_id))],
    )
        .into_response())
}

async fn delete_book(
    State(state): State<BookState>,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = book_id(path)?;
    state.service.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
