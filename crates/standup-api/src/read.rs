use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use tokio::task;
use tracing::error;

use standup_db::Database;
use standup_db::queries::OVERVIEW_LIMIT;
use standup_types::api::{ContactHistory, OverviewGroup, StatusEntry};
use standup_types::models::ContactId;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(overview))
        .route("/{contact}", get(contact_detail))
        .with_state(state)
}

fn epoch_to_utc(epoch: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch, 0).unwrap_or_default()
}

/// GET / - recent messages from mutual contacts, grouped per contact.
async fn overview(
    State(state): State<AppState>,
) -> Result<Json<Vec<OverviewGroup>>, StatusCode> {
    let now = Utc::now().timestamp();
    let db = state.db.clone();

    let rows = task::spawn_blocking(move || db.overview(now))
        .await
        .map_err(|e| {
            error!("overview task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("overview query failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // Rows arrive ordered by contact, then newest first, so grouping is a
    // single pass. Each contact keeps at most OVERVIEW_LIMIT entries.
    let mut groups: Vec<OverviewGroup> = Vec::new();
    for row in rows {
        let entry = StatusEntry {
            received_at: epoch_to_utc(row.received_at),
            body: row.body,
        };
        match groups.last_mut() {
            Some(group) if group.contact.as_str() == row.contact_id => {
                if group.messages.len() < OVERVIEW_LIMIT {
                    group.messages.push(entry);
                }
            }
            _ => groups.push(OverviewGroup {
                contact: ContactId::new(&row.contact_id),
                messages: vec![entry],
            }),
        }
    }

    Ok(Json(groups))
}

/// GET /{contact} - full history for one contact, newest first.
/// 404 for an identifier the service has never seen.
async fn contact_detail(
    State(state): State<AppState>,
    Path(contact): Path<String>,
) -> Result<Json<ContactHistory>, StatusCode> {
    let contact = ContactId::new(&contact);
    let db = state.db.clone();
    let id = contact.as_str().to_owned();

    let rows = task::spawn_blocking(move || {
        let known = db.contact_exists(&id)? || db.has_history(&id)?;
        if !known {
            return Ok(None);
        }
        db.history(&id).map(Some)
    })
    .await
    .map_err(|e| {
        error!("history task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e: anyhow::Error| {
        error!("history query failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let Some(rows) = rows else {
        return Err(StatusCode::NOT_FOUND);
    };

    let messages = rows
        .into_iter()
        .map(|row| StatusEntry {
            received_at: epoch_to_utc(row.received_at),
            body: row.body,
        })
        .collect();

    Ok(Json(ContactHistory { contact, messages }))
}
