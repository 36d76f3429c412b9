use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    AppState, access,
    auth::AuthUser,
    db,
    error::{AppError, AppResult},
    models::{
        AddMovieRequest, LoginRequest, LoginResponse, MovieDetails, MovieSummary, RatingRow,
        RegisterRequest, RouteInfo, SubmitRatingRequest, UpdateRatingRequest,
    },
    registry,
};

/// The route table served at `GET /routes`. Kept in sync with the router
/// in `main` by hand; axum has no runtime route introspection.
pub fn route_table() -> Vec<RouteInfo> {
    vec![
        RouteInfo { method: "GET", path: "/routes", auth: false },
        RouteInfo { method: "GET", path: "/test_db_connection", auth: false },
        RouteInfo { method: "POST", path: "/register", auth: false },
        RouteInfo { method: "POST", path: "/login", auth: false },
        RouteInfo { method: "GET", path: "/movies", auth: true },
        RouteInfo { method: "GET", path: "/movies/{id}", auth: true },
        RouteInfo { method: "POST", path: "/add_movie", auth: true },
        RouteInfo { method: "POST", path: "/submit_rating", auth: true },
        RouteInfo { method: "GET", path: "/ratings", auth: true },
        RouteInfo { method: "PUT", path: "/ratings/{movie_id}", auth: true },
        RouteInfo { method: "DELETE", path: "/ratings/{rating_id}", auth: true },
        RouteInfo { method: "POST", path: "/upload", auth: true },
    ]
}

pub async fn list_routes() -> Json<Vec<RouteInfo>> {
    Json(route_table())
}

pub async fn test_db_connection(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<serde_json::Value>> {
    let tables = db::list_tables(&state.db).await?;
    Ok(Json(json!({ "status": "success", "tables": tables })))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let role = access::parse_role(&req.role)?;
    state.credentials.register(req.username.trim(), &req.password, role).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "User registered successfully" }))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = state.credentials.verify_login(req.username.trim(), &req.password).await?;
    let access_token = state.tokens.issue(&user.username)?;

    Ok(Json(LoginResponse { access_token }))
}

pub async fn list_movies(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    let movies = state.catalog.list().await?;
    Ok(Json(movies.into_iter().map(MovieSummary::from).collect()))
}

pub async fn add_movie(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddMovieRequest>,
) -> AppResult<impl IntoResponse> {
    state.catalog.add(&req.title, &req.director, req.release_year).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "Movie added successfully" }))))
}

pub async fn submit_rating(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRatingRequest>,
) -> AppResult<impl IntoResponse> {
    state.ledger.submit(&auth.username, req.movie_id, req.rating).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "Rating submitted successfully" }))))
}

pub async fn list_ratings(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<RatingRow>>> {
    let rows = state.ledger.list().await?;
    Ok(Json(rows.into_iter().map(RatingRow::from).collect()))
}

pub async fn movie_details(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<MovieDetails>> {
    let movie = state.catalog.get(movie_id).await?;
    let ratings = state.ledger.for_movie(movie_id).await?;

    Ok(Json(MovieDetails {
        id: movie.id,
        title: movie.title,
        description: movie.description,
        ratings: ratings.into_iter().map(Into::into).collect(),
    }))
}

pub async fn update_rating(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i32>,
    Json(req): Json<UpdateRatingRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let new_rating =
        req.rating.ok_or_else(|| AppError::Validation("New rating is required".into()))?;

    state.ledger.update(&auth.username, movie_id, new_rating).await?;
    Ok(Json(json!({ "message": "Rating updated successfully" })))
}

pub async fn delete_rating(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(rating_id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    state.ledger.delete(rating_id, &auth.username).await?;
    Ok(Json(json!({ "message": "Rating deleted successfully" })))
}

pub async fn upload(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
            file = Some((filename, data));
        }
    }

    let (filename, data) = file.ok_or_else(|| AppError::Validation("No file part".into()))?;

    if filename.is_empty() {
        return Err(AppError::Validation("No file selected".into()));
    }

    if !registry::allowed_file(&filename) {
        return Err(AppError::Validation(format!(
            "File type not allowed. Allowed types: {}",
            registry::ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let record = state.registry.store(&auth.username, &filename, &data).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "File uploaded successfully", "filename": record.filename })),
    ))
}
