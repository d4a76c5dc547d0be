//! Out-of-band invitation URL parsing.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use didi_core::error::{DidiError, Result};
use serde::Deserialize;

/// Query parameters that may carry an encoded invitation.
const INVITATION_PARAMS: [&str; 3] = ["oob", "c_i", "d_m"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub label: Option<String>,
    /// Whether accepting the invitation starts a connection handshake.
    pub handshake: bool,
}

#[derive(Deserialize)]
struct InvitationBody {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    handshake_protocols: Option<Vec<String>>,
}

/// Parses an invitation URL such as `https://agent.example/?oob=eyJ...`.
pub fn parse_invitation_url(url: &str) -> Result<Invitation> {
    let query = url
        .split_once('?')
        .map(|(_, query)| query)
        .ok_or_else(|| DidiError::runtime(format!("Invitation URL has no query: {url}")))?;

    let (param, encoded) = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| INVITATION_PARAMS.contains(key))
        .ok_or_else(|| DidiError::runtime("Invitation URL carries no oob, c_i or d_m parameter"))?;

    let json = decode_param(encoded)?;
    let body: InvitationBody = serde_json::from_slice(&json)?;

    // Legacy connection invitations always imply a handshake.
    let handshake = match param {
        "oob" => body.handshake_protocols.is_some_and(|p| !p.is_empty()),
        _ => true,
    };

    Ok(Invitation {
        label: body.label,
        handshake,
    })
}

fn decode_param(encoded: &str) -> Result<Vec<u8>> {
    let unescaped = encoded.replace("%3D", "=").replace("%3d", "=");
    let trimmed = unescaped.trim_end_matches('=');

    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD.decode(&unescaped))
        .map_err(DidiError::from)
}
