//! Cached trip drafts
//!
//! Drafts live only in the cache under `trip:{id}`. Every change is
//! announced on the `trips` channel so other instances can react.

use axum::Extension;
use axum::extract::State;
use axum::routing::{delete, get};
use axum::{Json, Router};
use http::StatusCode;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use wayfarer_core::{AppError, ValidationErrors, Validator};

use crate::AppState;
use crate::auth::Principal;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};

/// Pub/sub channel carrying [`TripEvent`]s
pub const TRIPS_CHANNEL: &str = "trips";

const KEY_PREFIX: &str = "trip:";
const MAX_ID_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccommodationType {
    Hotel,
    Hostel,
    Airbnb,
    Camping,
    Other,
}

/// Trip being planned, before it is persisted anywhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub destination: String,
    pub start_date: Date,
    pub end_date: Date,
    pub budget: f64,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation_type: Option<AccommodationType>,
    #[serde(default)]
    pub is_public: bool,
}

impl TripDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .non_blank(&self.title, "title")
            .non_blank(&self.destination, "destination")
            .check(
                self.end_date >= self.start_date,
                "endDate",
                "must not be before startDate",
            )
            .check(
                self.budget.is_finite() && self.budget >= 0.0,
                "budget",
                "must be a non-negative number",
            )
            .check(
                self.interests.iter().all(|i| !i.trim().is_empty()),
                "interests",
                "must not contain empty entries",
            )
            .finish()
    }
}

/// Draft as cached, with the caller that last saved it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTrip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(flatten)]
    draft: TripDraft,
}

/// Draft as returned to clients
#[derive(Debug, Serialize)]
pub struct TripRecord {
    id: String,
    #[serde(flatten)]
    trip: StoredTrip,
}

/// Change announced on [`TRIPS_CHANNEL`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TripEvent {
    Updated { id: String },
    Deleted { id: String },
    Cleared,
}

pub fn trip_routes() -> Router<AppState> {
    Router::new()
        .route("/trips", delete(clear_trips))
        .route("/trips/{id}", get(get_trip).put(put_trip).delete(delete_trip))
}

fn trip_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Ids become cache keys, so glob metacharacters are not allowed
fn validate_id(id: &str) -> Result<(), ValidationErrors> {
    Validator::new()
        .check(
            !id.is_empty()
                && id.len() <= MAX_ID_LEN
                && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "id",
            "must be 1-64 letters, digits, '-' or '_'",
        )
        .finish()
}

async fn get_trip(State(state): State<AppState>, ApiPath(id): ApiPath<String>) -> ApiResult<Json<TripRecord>> {
    validate_id(&id)?;

    let trip = state
        .cache
        .get::<StoredTrip>(&trip_key(&id))
        .await
        .ok_or_else(|| AppError::not_found("Trip"))?;

    Ok(Json(TripRecord { id, trip }))
}

/// Save a draft, recording the authenticated caller when there is one
async fn put_trip(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(draft): ApiJson<TripDraft>,
) -> ApiResult<Json<TripRecord>> {
    validate_id(&id)?;
    draft.validate()?;

    let trip = StoredTrip {
        user_id: principal.and_then(|Extension(principal)| principal.subject),
        draft,
    };

    state.cache.set(&trip_key(&id), &trip, None).await;
    state
        .cache
        .publish(TRIPS_CHANNEL, &TripEvent::Updated { id: id.clone() })
        .await;

    tracing::debug!(%id, user_id = ?trip.user_id, "trip draft saved");

    Ok(Json(TripRecord { id, trip }))
}

async fn delete_trip(State(state): State<AppState>, ApiPath(id): ApiPath<String>) -> ApiResult<StatusCode> {
    validate_id(&id)?;

    state.cache.delete(&trip_key(&id)).await;
    state.cache.publish(TRIPS_CHANNEL, &TripEvent::Deleted { id }).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn clear_trips(State(state): State<AppState>) -> StatusCode {
    state.cache.delete_by_pattern(&format!("{KEY_PREFIX}*")).await;
    state.cache.publish(TRIPS_CHANNEL, &TripEvent::Cleared).await;

    StatusCode::NO_CONTENT
}
