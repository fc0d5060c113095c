use std::fmt::Write;
use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::sync::watch;
use shared::protocol::MOUNT_ID;
use crate::bridge;
use crate::config::ProtoRangeChoice;
use crate::loader::assets::{Asset, AssetKind, AssetStore};
use crate::session::{SessionHandle, SessionStatus};
use crate::view::digest::Fragment;
use crate::view::format::escape_html;

#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub mount: watch::Receiver<Fragment>,
    pub assets: AssetStore,
    pub proto_ranges: Arc<Vec<ProtoRangeChoice>>,
}

#[derive(Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub proto_range: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_page))
        .route("/fragment", get(get_fragment))
        .route("/assets/:id", get(get_asset))
        .route("/filter", get(change_filter))
        .route("/show_all", get(show_all))
        .with_state(state)
}

async fn get_page(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let status = state.session.status().await.map_err(|e| {
        tracing::error!("Failed to query session: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    let fragment = state.mount.borrow().clone();

    Ok(Html(page(&state.assets.loaded(), &state.proto_ranges, &status, &fragment)))
}

async fn get_fragment(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let fragment = state.mount.borrow().clone();
    let etag = format!("\"{}\"", fragment.etag);

    let cached = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == etag);
    if cached {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    (
        [(header::ETAG, etag), (header::CACHE_CONTROL, "no-cache".to_string())],
        Html(fragment.html),
    )
        .into_response()
}

async fn get_asset(State(state): State<AppState>, Path(id): Path<usize>) -> Response {
    match state.assets.body(id) {
        Some((kind, body)) => {
            ([(header::CONTENT_TYPE, kind.content_type())], body.to_string()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn change_filter(
    State(state): State<AppState>,
    Query(params): Query<FilterQuery>,
) -> Result<Redirect, (StatusCode, String)> {
    bridge::on_proto_range_change(&state.session, &params.proto_range)
        .await
        .map_err(|e| {
            tracing::debug!("Rejected filter change: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;

    Ok(Redirect::to("/"))
}

async fn show_all(State(state): State<AppState>) -> Result<Redirect, StatusCode> {
    state.session.show_all().await.map_err(|e| {
        tracing::error!("Failed to clear filters: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Redirect::to("/"))
}

/// The page shell: asset links, filter controls and the mount.
fn page(
    assets: &[Asset],
    proto_ranges: &[ProtoRangeChoice],
    status: &SessionStatus,
    fragment: &Fragment,
) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Server list</title>",
    );
    for asset in assets {
        let _ = match asset.kind {
            AssetKind::Style => write!(
                html,
                r#"<link rel="stylesheet" href="/assets/{}" data-origin="{}">"#,
                asset.id,
                escape_html(&asset.url)
            ),
            AssetKind::Script => write!(
                html,
                r#"<script src="/assets/{}" data-origin="{}"></script>"#,
                asset.id,
                escape_html(&asset.url)
            ),
        };
    }
    html.push_str("</head><body>");

    if !proto_ranges.is_empty() {
        html.push_str(
            r#"<form action="/filter" method="get"><select class="proto_select" name="proto_range" onchange="this.form.submit()"><option value="">All versions</option>"#,
        );
        for choice in proto_ranges {
            let value = format!("[{},{}]", choice.range.low, choice.range.high);
            let selected = if status.filter.proto_range == Some(choice.range) {
                " selected"
            } else {
                ""
            };
            let _ = write!(
                html,
                r#"<option value="{}"{}>{}</option>"#,
                escape_html(&value),
                selected,
                escape_html(&choice.label)
            );
        }
        html.push_str("</select><noscript><button>Apply</button></noscript></form>");
    }

    if status.filter.min_clients.is_some() || status.filter.limit.is_some() {
        html.push_str(r#"<a class="show_all" href="/show_all">Show all servers</a>"#);
    }

    let _ = write!(html, r#"<div id="{}">{}</div>"#, MOUNT_ID, fragment.html);

    if let Some(fetched_at) = status.fetched_at {
        let _ = write!(
            html,
            r#"<p class="updated">Updated {}, {} servers listed</p>"#,
            fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
            status.servers
        );
    }
    html.push_str("</body></html>");
    html
}
