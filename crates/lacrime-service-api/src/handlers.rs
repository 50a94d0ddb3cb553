//! Request handlers for the dashboard API.
//!
//! Incident queries and boundary reads are synchronous, so each handler moves
//! its work onto the blocking pool and carries the request span with it.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::Uri,
    response::{IntoResponse, Response},
    Json,
};
use tokio::task;
use tracing::{error, info, warn, Span};

use lacrime_lib::{load_feature_collection, Error as LibError, GeoAsset, IncidentRecord};
use lacrime_service_shared::{
    from_lib_error, record_features_served, record_geo_asset_failed, record_incidents_returned,
    record_query_failed, AppState, ProblemDetails, RequestId,
};

/// Plain-text body served at `/`.
pub const WELCOME_MESSAGE: &str = "Welcome! This is the LA Crime Data Dashboard API homepage.";

/// Handle `GET /`.
pub async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

/// Handle `GET /crimedata`: every incident row in load order.
pub async fn all_incidents(State(state): State<AppState>, request_id: RequestId) -> Response {
    run_incident_query(state, request_id, "all", |state: &AppState| {
        state.incidents().all()
    })
    .await
}

/// Handle `GET /crimedata/{keyword}`: rows whose description contains the
/// upper-cased keyword.
pub async fn incidents_by_keyword(
    State(state): State<AppState>,
    request_id: RequestId,
    keyword: Result<Path<String>, PathRejection>,
) -> Response {
    let keyword = match keyword {
        Ok(Path(keyword)) => keyword,
        Err(rejection) => {
            warn!(request_id = %request_id, error = %rejection, "rejected keyword segment");
            record_query_failed("keyword");
            return ProblemDetails::bad_request(rejection.body_text(), request_id.as_str())
                .into_response();
        }
    };

    info!(request_id = %request_id, keyword = %keyword, "keyword query");
    run_incident_query(state, request_id, "keyword", move |state: &AppState| {
        state.incidents().by_keyword(&keyword)
    })
    .await
}

/// Handle `GET /crimedata/other/all`: rows outside every dashboard category.
pub async fn other_incidents(State(state): State<AppState>, request_id: RequestId) -> Response {
    run_incident_query(state, request_id, "other", |state: &AppState| {
        state.incidents().other()
    })
    .await
}

/// Handle `GET /stations`.
pub async fn stations(State(state): State<AppState>, request_id: RequestId) -> Response {
    serve_geo_asset(state, GeoAsset::Stations, request_id).await
}

/// Handle `GET /cityareas`.
pub async fn city_areas(State(state): State<AppState>, request_id: RequestId) -> Response {
    serve_geo_asset(state, GeoAsset::CityAreas, request_id).await
}

/// Fallback for paths that match no route.
pub async fn not_found(request_id: RequestId, uri: Uri) -> Response {
    ProblemDetails::not_found(uri.path(), request_id.as_str()).into_response()
}

async fn run_incident_query<F>(
    state: AppState,
    request_id: RequestId,
    query: &'static str,
    run: F,
) -> Response
where
    F: FnOnce(&AppState) -> lacrime_lib::Result<Vec<IncidentRecord>> + Send + 'static,
{
    let span = Span::current();
    let outcome = task::spawn_blocking(move || span.in_scope(|| run(&state))).await;

    match outcome {
        Ok(Ok(records)) => {
            info!(
                request_id = %request_id,
                query = query,
                count = records.len(),
                "incidents returned"
            );
            record_incidents_returned(records.len(), query);
            Json(records).into_response()
        }
        Ok(Err(e)) => {
            error!(request_id = %request_id, query = query, error = %e, "incident query failed");
            record_query_failed(query);
            from_lib_error(&e, request_id.as_str()).into_response()
        }
        Err(e) => {
            error!(request_id = %request_id, query = query, error = %e, "incident query task aborted");
            record_query_failed(query);
            ProblemDetails::internal_error("incident query did not complete", request_id.as_str())
                .into_response()
        }
    }
}

async fn serve_geo_asset(state: AppState, asset: GeoAsset, request_id: RequestId) -> Response {
    let path = state.geo_asset_path(asset).to_path_buf();
    let span = Span::current();
    let read_path = path.clone();
    let outcome =
        task::spawn_blocking(move || span.in_scope(|| load_feature_collection(&read_path))).await;

    match outcome {
        Ok(Ok(collection)) => {
            info!(
                request_id = %request_id,
                asset = asset.label(),
                features = collection.len(),
                "boundary features served"
            );
            record_features_served(collection.len(), asset.label());
            Json(collection).into_response()
        }
        Ok(Err(e)) => {
            error!(
                request_id = %request_id,
                asset = asset.label(),
                path = %path.display(),
                error = %e,
                "boundary file unusable"
            );
            record_geo_asset_failed(asset.label(), failure_reason(&e));
            from_lib_error(&e, request_id.as_str()).into_response()
        }
        Err(e) => {
            error!(request_id = %request_id, asset = asset.label(), error = %e, "boundary read task aborted");
            record_geo_asset_failed(asset.label(), "aborted");
            ProblemDetails::internal_error("boundary read did not complete", request_id.as_str())
                .into_response()
        }
    }
}

fn failure_reason(error: &LibError) -> &'static str {
    match error {
        LibError::DatasetNotFound { .. } => "missing",
        LibError::InvalidGeoJson { .. } | LibError::GeoJson(_) => "invalid",
        _ => "io",
    }
}
