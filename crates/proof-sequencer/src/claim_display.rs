//! Human-readable summaries of attached identity claims.
//!
//! `claim_data_params` is a JSON document whose shape depends on the
//! provider. Values that are themselves JSON objects encoded as strings are
//! decoded one level deep before the provider-specific extraction runs.

use crate::ProviderRegistry;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Display fields extracted from a claim. Empty values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedClaimData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub display_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
}

impl ParsedClaimData {
    fn display(value: impl Into<String>) -> Self {
        Self {
            display_value: value.into(),
            ..Default::default()
        }
    }
}

/// Summarize `claim_data_params` for the provider with external id `provider_id`.
pub fn parse_claim_data(
    registry: &ProviderRegistry,
    provider_id: &str,
    claim_data_params: &str,
) -> ParsedClaimData {
    let Some(provider) = registry.by_provider_id(provider_id) else {
        warn!(provider_id = %provider_id, "Unknown provider in claim data");
        return ParsedClaimData::display("Unknown");
    };

    let data = match serde_json::from_str::<Value>(claim_data_params) {
        Ok(Value::Object(map)) => expand_nested(map),
        Ok(_) => Map::new(),
        Err(_) => {
            warn!(provider = %provider.id, "claim_data_params is not valid JSON");
            return ParsedClaimData::display("Invalid data");
        }
    };

    match provider.id.as_str() {
        "twitter" => twitter(&data),
        "google" => google(&data),
        "linkedin" => linkedin(&data),
        "github" => github(&data),
        "facebook" => facebook(&data),
        "binance" => binance(&data),
        "coinbase" => coinbase(&data),
        "instagram" => instagram(&data),
        _ => ParsedClaimData::display("Unknown provider"),
    }
}

fn expand_nested(mut map: Map<String, Value>) -> Map<String, Value> {
    for value in map.values_mut() {
        let decoded = match value {
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.starts_with('{') && trimmed.ends_with('}') {
                    serde_json::from_str::<Value>(trimmed).ok()
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(decoded) = decoded {
            *value = decoded;
        }
    }
    map
}

/// Non-empty scalar at `key`, as text.
fn text(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn param_values(data: &Map<String, Value>) -> Option<&Map<String, Value>> {
    data.get("paramValues").and_then(Value::as_object)
}

fn twitter(data: &Map<String, Value>) -> ParsedClaimData {
    if let Some(params) = param_values(data) {
        let username = text(params, "screen_name");
        let followers = text(params, "followers_count");
        let display_value = match (&username, &followers) {
            (Some(user), Some(count)) => format!("@{} · {} followers", user, count),
            (Some(user), None) => format!("@{}", user),
            (None, _) => "Twitter User".to_string(),
        };
        return ParsedClaimData {
            profile_url: username.as_ref().map(|u| format!("https://twitter.com/{}", u)),
            button_text: username.clone(),
            username,
            display_value,
            created_at: text(params, "created_at"),
            followers_count: followers,
            ..Default::default()
        };
    }

    let username = text(data, "username").or_else(|| text(data, "screen_name"));
    ParsedClaimData {
        profile_url: username.as_ref().map(|u| format!("https://twitter.com/{}", u)),
        display_value: username
            .as_ref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "Twitter User".to_string()),
        username,
        full_name: text(data, "name"),
        avatar_url: text(data, "profile_image_url"),
        ..Default::default()
    }
}

fn google(data: &Map<String, Value>) -> ParsedClaimData {
    if let Some(params) = param_values(data) {
        let email = text(params, "email")
            .map(|raw| strip_quotes(&raw).to_string())
            .filter(|email| !email.is_empty());
        return ParsedClaimData {
            display_value: email.clone().unwrap_or_else(|| "Google User".to_string()),
            button_text: email.clone(),
            email,
            ..Default::default()
        };
    }

    let email = text(data, "email");
    ParsedClaimData {
        display_value: email.clone().unwrap_or_else(|| "Google User".to_string()),
        email,
        full_name: text(data, "name"),
        avatar_url: text(data, "picture"),
        ..Default::default()
    }
}

/// Strip one leading and one trailing double quote.
fn strip_quotes(raw: &str) -> &str {
    let raw = raw.strip_prefix('"').unwrap_or(raw);
    raw.strip_suffix('"').unwrap_or(raw)
}

fn linkedin(data: &Map<String, Value>) -> ParsedClaimData {
    let username = text(data, "vanity_name").or_else(|| text(data, "id"));
    let full_name = text(data, "name");
    ParsedClaimData {
        profile_url: username.as_ref().map(|u| format!("https://linkedin.com/in/{}", u)),
        display_value: full_name
            .clone()
            .or_else(|| username.clone())
            .unwrap_or_else(|| "LinkedIn User".to_string()),
        username,
        full_name,
        ..Default::default()
    }
}

fn github(data: &Map<String, Value>) -> ParsedClaimData {
    let username = text(data, "login");
    ParsedClaimData {
        profile_url: username.as_ref().map(|u| format!("https://github.com/{}", u)),
        display_value: username.clone().unwrap_or_else(|| "GitHub User".to_string()),
        username,
        full_name: text(data, "name"),
        avatar_url: text(data, "avatar_url"),
        ..Default::default()
    }
}

fn facebook(data: &Map<String, Value>) -> ParsedClaimData {
    let username = text(data, "username");
    let full_name = text(data, "name");
    ParsedClaimData {
        profile_url: text(data, "id").map(|id| format!("https://facebook.com/{}", id)),
        display_value: full_name
            .clone()
            .or_else(|| username.clone())
            .unwrap_or_else(|| "Facebook User".to_string()),
        username,
        full_name,
        ..Default::default()
    }
}

fn binance(data: &Map<String, Value>) -> ParsedClaimData {
    let username = text(data, "user_id");
    let full_name = text(data, "name");
    ParsedClaimData {
        display_value: full_name
            .clone()
            .or_else(|| username.clone())
            .unwrap_or_else(|| "Binance User".to_string()),
        username,
        full_name,
        ..Default::default()
    }
}

fn coinbase(data: &Map<String, Value>) -> ParsedClaimData {
    let username = text(data, "user_id");
    let email = text(data, "email");
    ParsedClaimData {
        display_value: email
            .clone()
            .or_else(|| username.clone())
            .unwrap_or_else(|| "Coinbase User".to_string()),
        username,
        email,
        ..Default::default()
    }
}

fn instagram(data: &Map<String, Value>) -> ParsedClaimData {
    let username = text(data, "username");
    ParsedClaimData {
        profile_url: username
            .as_ref()
            .map(|u| format!("https://instagram.com/{}", u)),
        display_value: username
            .as_ref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "Instagram User".to_string()),
        username,
        full_name: text(data, "full_name"),
        avatar_url: text(data, "profile_picture"),
        ..Default::default()
    }
}
