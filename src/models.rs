use serde::{Deserialize, Serialize};

use crate::entities::{movie, rating};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    pub title: String,
    pub director: String,
    pub release_year: i32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub movie_id: i32,
    pub rating: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    // Optional so a missing field is a 400, not a deserialization reject.
    pub rating: Option<i32>,
}

/// Movie listing entry: metadata only, no description.
#[derive(Debug, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub director: String,
    pub release_year: i32,
}

impl From<movie::Model> for MovieSummary {
    fn from(m: movie::Model) -> Self {
        Self { id: m.id, title: m.title, director: m.director, release_year: m.release_year }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieRatingEntry {
    pub username: String,
    pub rating: i32,
}

impl From<rating::Model> for MovieRatingEntry {
    fn from(r: rating::Model) -> Self {
        Self { username: r.username, rating: r.rating }
    }
}

/// Detail view: movie fields plus every rating submitted for it.
#[derive(Debug, Serialize)]
pub struct MovieDetails {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub ratings: Vec<MovieRatingEntry>,
}

/// Ledger listing entry, one per rating row, joined with its movie.
#[derive(Debug, Serialize)]
pub struct RatingRow {
    pub rating_id: i32,
    pub username: String,
    pub rating: i32,
    pub movie_title: String,
    pub director: String,
    pub release_year: i32,
}

impl From<(rating::Model, movie::Model)> for RatingRow {
    fn from((r, m): (rating::Model, movie::Model)) -> Self {
        Self {
            rating_id: r.id,
            username: r.username,
            rating: r.rating,
            movie_title: m.title,
            director: m.director,
            release_year: m.release_year,
        }
    }
}

/// One entry in the static route listing served at `GET /routes`.
#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub auth: bool,
}
