// Player and battle-log endpoints backed by the Clash Royale API.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::{data_response, ApiError, AppState, ValidationErrors};
use crate::battle;
use crate::locale::Locale;

/// Battle logs hold at most this many entries.
pub const MAX_BATTLE_INDEX: i64 = 24;

lazy_static! {
    static ref TAG_PATTERN: Regex = Regex::new(r"^#?[A-Za-z0-9]+$").unwrap();
}

/// Check the `tag` query parameter, recording problems in `errors`.
fn validate_tag(params: &HashMap<String, String>, errors: &mut ValidationErrors) -> Option<String> {
    match params.get("tag").map(|t| t.trim()) {
        None | Some("") => {
            errors.add("tag", "The tag field is required.");
            None
        }
        Some(tag) if !TAG_PATTERN.is_match(tag) => {
            errors.add("tag", "The tag field format is invalid.");
            None
        }
        Some(tag) => Some(tag.to_string()),
    }
}

/// Check the optional `battle_index` query parameter (0 when absent).
fn validate_battle_index(
    params: &HashMap<String, String>,
    errors: &mut ValidationErrors,
) -> Option<usize> {
    let raw = match params.get("battle_index").map(|v| v.trim()) {
        None | Some("") => return Some(0),
        Some(raw) => raw,
    };
    let Ok(index) = raw.parse::<i64>() else {
        errors.add("battle_index", "The battle index field must be an integer.");
        return None;
    };
    if index < 0 {
        errors.add("battle_index", "The battle index field must be at least 0.");
        return None;
    }
    if index > MAX_BATTLE_INDEX {
        errors.add(
            "battle_index",
            format!("The battle index field must not be greater than {MAX_BATTLE_INDEX}."),
        );
        return None;
    }
    usize::try_from(index).ok()
}

fn required_tag(params: &HashMap<String, String>) -> Result<String, ApiError> {
    let mut errors = ValidationErrors::new();
    let tag = validate_tag(params, &mut errors);
    match tag {
        Some(tag) => Ok(tag),
        None => Err(ApiError::Validation(errors)),
    }
}

pub(super) async fn get_player(
    State(state): State<AppState>,
    Extension(locale): Extension<Locale>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Failed to fetch player data";
    let tag = required_tag(&params)?;
    let debug = state.config.debug;

    let client = state
        .clash()
        .map_err(|e| ApiError::upstream(FAILED, e, locale, debug))?;
    let player = client
        .get_player(&tag)
        .await
        .map_err(|e| ApiError::upstream(FAILED, e, locale, debug))?;

    Ok(data_response(player, "Player data retrieved successfully."))
}

pub(super) async fn get_battles(
    State(state): State<AppState>,
    Extension(locale): Extension<Locale>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Failed to fetch battle log";
    let tag = required_tag(&params)?;
    let debug = state.config.debug;

    let client = state
        .clash()
        .map_err(|e| ApiError::upstream(FAILED, e, locale, debug))?;
    let battles = client
        .get_player_battles(&tag)
        .await
        .map_err(|e| ApiError::upstream(FAILED, e, locale, debug))?;

    tracing::debug!(tag = %tag, count = battles.len(), "Fetched battle log");
    Ok(data_response(
        battle::format_battle_log(battles),
        "Battle log retrieved successfully.",
    ))
}

pub(super) async fn get_battle_for_analysis(
    State(state): State<AppState>,
    Extension(locale): Extension<Locale>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let mut errors = ValidationErrors::new();
    let tag = validate_tag(&params, &mut errors);
    let index = validate_battle_index(&params, &mut errors);
    let (Some(tag), Some(index)) = (tag, index) else {
        return Err(ApiError::Validation(errors));
    };

    let generic_failure = |source| ApiError::Upstream {
        summary: "Failed to fetch battle data",
        source,
        locale,
        debug: state.config.debug,
        generic: true,
    };
    let client = state.clash().map_err(generic_failure)?;
    let battle = client
        .get_battle_by_index(&tag, index)
        .await
        .map_err(generic_failure)?
        .ok_or(ApiError::NotFound("Battle not found"))?;

    Ok(data_response(
        battle::format_for_analysis(battle),
        "Battle data retrieved successfully. Ready for analysis.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tag_pattern() {
        for ok in ["#2PP", "2PP", "#abc123", "Q0LV"] {
            assert!(TAG_PATTERN.is_match(ok), "{ok}");
        }
        for bad in ["", "#", "##ABC", "AB-C", "AB C", "#ABC#", "タグ"] {
            assert!(!TAG_PATTERN.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn test_validate_tag_messages() {
        let mut errors = ValidationErrors::new();
        assert!(validate_tag(&params(&[]), &mut errors).is_none());
        assert!(validate_tag(&params(&[("tag", "bad tag")]), &mut errors).is_none());
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"tag": [
                "The tag field is required.",
                "The tag field format is invalid."
            ]})
        );

        let mut errors = ValidationErrors::new();
        assert_eq!(
            validate_tag(&params(&[("tag", "#2PP")]), &mut errors).as_deref(),
            Some("#2PP")
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_validate_battle_index() {
        let mut errors = ValidationErrors::new();
        assert_eq!(validate_battle_index(&params(&[]), &mut errors), Some(0));
        assert_eq!(
            validate_battle_index(&params(&[("battle_index", "")]), &mut errors),
            Some(0)
        );
        assert_eq!(
            validate_battle_index(&params(&[("battle_index", "24")]), &mut errors),
            Some(24)
        );
        assert!(errors.is_empty());

        for bad in ["25", "-1", "one", "1.5"] {
            let mut errors = ValidationErrors::new();
            assert_eq!(
                validate_battle_index(&params(&[("battle_index", bad)]), &mut errors),
                None,
                "{bad}"
            );
            assert!(!errors.is_empty());
        }
    }
}
