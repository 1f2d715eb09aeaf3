//! `POST /list-tracks` (§6).
//!
//! A series title_id returns the `{episodes: [...]}` shape (the episode
//! list, from `get_titles`); a movie or a specific episode returns the
//! `{title, video, audio, subtitles}` breakdown from `get_tracks`.

use axum::Json;
use axum::extract::State;
use media_core::error::{ApiError, ErrorCode};
use media_core::ports::{Title, Track};
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTracksRequest {
    pub service: String,
    pub title_id: String,
    pub wanted: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub proxy: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListTracksResponse {
    Episodes { episodes: Vec<Title> },
    Breakdown {
        title: String,
        video: Vec<Track>,
        audio: Vec<Track>,
        subtitles: Vec<Track>,
    },
}

pub async fn list_tracks(
    State(state): State<AppState>,
    Json(req): Json<ListTracksRequest>,
) -> Result<Json<ListTracksResponse>, HttpError> {
    let adapter = state
        .services
        .get(&req.service)
        .ok_or_else(|| ApiError::new(ErrorCode::InvalidService, format!("unknown service {}", req.service)))?;

    let titles = adapter.get_titles(&req.title_id).await?;
    let resolved = titles
        .first()
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, format!("title {} not found", req.title_id)))?;

    let selecting_episode = req.season.is_some() || req.episode.is_some() || req.wanted.is_some();
    if resolved.is_series && !selecting_episode {
        return Ok(Json(ListTracksResponse::Episodes { episodes: titles }));
    }

    let tracks = adapter.get_tracks(&req.title_id).await?;
    let video = tracks.iter().filter(|t| t.kind == "video").cloned().collect();
    let audio = tracks.iter().filter(|t| t.kind == "audio").cloned().collect();
    let subtitles = tracks.iter().filter(|t| t.kind == "subtitle").cloned().collect();

    Ok(Json(ListTracksResponse::Breakdown {
        title: resolved.name.clone(),
        video,
        audio,
        subtitles,
    }))
}
