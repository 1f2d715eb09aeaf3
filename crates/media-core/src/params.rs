//! Download request parameters (§6) and their validation.
//!
//! Validation happens once, at the HTTP boundary, before a `Job` is ever
//! created (§7 "Validation errors are surfaced as 4xx immediately; no job
//! is created").

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recognized video codecs (§6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoCodec {
    H264,
    H265,
    Vp9,
    Av1,
}

/// Recognized audio codecs (§6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioCodec {
    Aac,
    Ac3,
    Ec3,
    Eac3,
    Dd,
    #[serde(rename = "DD+")]
    DdPlus,
    Ac4,
    Opus,
    Flac,
    Alac,
    Vorbis,
    Ogg,
    Dts,
}

/// Recognized dynamic-range tags (§6). Defaults to `[Sdr]` when unset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DynamicRange {
    Sdr,
    Hdr10,
    #[serde(rename = "HDR10+")]
    Hdr10Plus,
    Dv,
    Hlg,
}

/// Recognized subtitle container formats (§6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubtitleFormat {
    Srt,
    Vtt,
    Ass,
    Ssa,
}

/// Download request parameters, as accepted by `POST /download` (§6).
///
/// All fields are optional except `service` and `title_id`; `validate`
/// enforces the remaining structural rules (ranges, mutual exclusivity).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadParameters {
    pub service: String,
    pub title_id: String,
    pub profile: Option<String>,

    pub quality: Vec<u32>,
    pub vcodec: Option<VideoCodec>,
    pub acodec: Vec<AudioCodec>,
    pub vbitrate: Option<u32>,
    pub abitrate: Option<u32>,
    pub range: Vec<DynamicRange>,
    pub channels: Option<f64>,
    pub no_atmos: bool,

    pub wanted: Option<String>,
    pub latest_episode: bool,
    pub lang: Vec<String>,
    pub v_lang: Vec<String>,
    pub a_lang: Vec<String>,
    pub s_lang: Vec<String>,
    pub require_subs: Vec<String>,
    pub forced_subs: bool,
    pub exact_lang: bool,
    pub sub_format: Option<SubtitleFormat>,

    pub video_only: bool,
    pub audio_only: bool,
    pub subs_only: bool,
    pub chapters_only: bool,

    pub no_subs: bool,
    pub no_audio: bool,
    pub no_chapters: bool,
    pub audio_description: bool,
    pub skip_dl: bool,
    pub export: Option<String>,
    pub cdm_only: bool,
    pub no_folder: bool,
    pub no_source: bool,
    pub no_mux: bool,
    pub workers: Option<u32>,
    pub downloads: Option<u32>,
    pub best_available: bool,

    pub proxy: Option<String>,
    pub no_proxy: bool,
    pub slow: bool,
    pub tag: Option<String>,
    pub tmdb_id: Option<String>,
    pub tmdb_name: Option<String>,
    pub tmdb_year: Option<u32>,
}

/// Validation failures for `DownloadParameters` (§4.1 `INVALID_PARAMETERS`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("service is required")]
    MissingService,
    #[error("title_id is required")]
    MissingTitleId,
    #[error("vbitrate must be a positive number of kbps")]
    InvalidBitrate,
    #[error("abitrate must be a positive number of kbps")]
    InvalidBitrate2,
    #[error("workers must be a positive integer")]
    InvalidWorkers,
    #[error("downloads must be a positive integer")]
    InvalidDownloads,
    #[error("at most one of video_only, audio_only, subs_only, chapters_only may be set")]
    ConflictingOnlyFlags,
    #[error("no_subs is incompatible with subs_only")]
    NoSubsConflictsWithSubsOnly,
    #[error("no_audio is incompatible with audio_only")]
    NoAudioConflictsWithAudioOnly,
    #[error("s_lang is incompatible with require_subs")]
    SLangConflictsWithRequireSubs,
}

/// Validate structural invariants of `DownloadParameters` (§6).
pub fn validate_parameters(params: &DownloadParameters) -> Result<(), ParameterError> {
    if params.service.trim().is_empty() {
        return Err(ParameterError::MissingService);
    }
    if params.title_id.trim().is_empty() {
        return Err(ParameterError::MissingTitleId);
    }
    if let Some(0) = params.vbitrate {
        return Err(ParameterError::InvalidBitrate);
    }
    if let Some(0) = params.abitrate {
        return Err(ParameterError::InvalidBitrate2);
    }
    if let Some(0) = params.workers {
        return Err(ParameterError::InvalidWorkers);
    }
    if let Some(0) = params.downloads {
        return Err(ParameterError::InvalidDownloads);
    }

    let exclusive_count = [
        params.video_only,
        params.audio_only,
        params.subs_only,
        params.chapters_only,
    ]
    .into_iter()
    .filter(|v| *v)
    .count();
    if exclusive_count > 1 {
        return Err(ParameterError::ConflictingOnlyFlags);
    }
    if params.no_subs && params.subs_only {
        return Err(ParameterError::NoSubsConflictsWithSubsOnly);
    }
    if params.no_audio && params.audio_only {
        return Err(ParameterError::NoAudioConflictsWithAudioOnly);
    }
    if !params.s_lang.is_empty() && !params.require_subs.is_empty() {
        return Err(ParameterError::SLangConflictsWithRequireSubs);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DownloadParameters {
        DownloadParameters {
            service: "EX".into(),
            title_id: "TT001".into(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_request_is_valid() {
        assert!(validate_parameters(&base()).is_ok());
    }

    #[test]
    fn missing_service_is_rejected() {
        let params = DownloadParameters {
            service: String::new(),
            ..base()
        };
        assert_eq!(validate_parameters(&params), Err(ParameterError::MissingService));
    }

    #[test]
    fn conflicting_only_flags_are_rejected() {
        let params = DownloadParameters {
            video_only: true,
            audio_only: true,
            ..base()
        };
        assert_eq!(
            validate_parameters(&params),
            Err(ParameterError::ConflictingOnlyFlags)
        );
    }

    #[test]
    fn no_subs_with_subs_only_is_rejected() {
        let params = DownloadParameters {
            no_subs: true,
            subs_only: true,
            ..base()
        };
        assert_eq!(
            validate_parameters(&params),
            Err(ParameterError::NoSubsConflictsWithSubsOnly)
        );
    }

    #[test]
    fn zero_workers_is_rejected() {
        let params = DownloadParameters {
            workers: Some(0),
            ..base()
        };
        assert_eq!(validate_parameters(&params), Err(ParameterError::InvalidWorkers));
    }
}
