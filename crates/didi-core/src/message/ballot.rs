//! Vote ballot payload.
//!
//! Ballots come from an external voting service whose candidate rows carry
//! more than the agent renders. Every field is optional and loosely typed so
//! that a null image or a database-style timestamp never drops the ballot.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A room ballot delivered over the basic-message channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ballot {
    pub room_num: Option<Value>,
    pub room_name: Option<Value>,
    #[serde(deserialize_with = "lenient_candidates")]
    pub candidate_info: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Candidate {
    pub id: Option<Value>,
    pub num: Option<Value>,
    pub name: Option<Value>,
    pub gender: Option<Value>,
    pub age: Option<Value>,
    pub img: Option<Value>,
    pub desc: Option<Value>,
    pub created_at: Option<Value>,
    pub updated_at: Option<Value>,
    #[serde(rename = "RoomId")]
    pub room_id: Option<Value>,
}

/// Keeps the object entries of `candidateInfo` and skips anything else.
fn lenient_candidates<'de, D>(deserializer: D) -> Result<Vec<Candidate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| Candidate::deserialize(item).ok())
        .collect())
}

/// Renders a loosely typed field: strings without quotes, missing or null as empty.
fn text(field: &Option<Value>) -> String {
    match field {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl Ballot {
    pub fn header(&self) -> String {
        format!("[Room {}] {}", text(&self.room_num), text(&self.room_name))
    }

    /// One line per candidate, in ballot order.
    pub fn candidate_lines(&self) -> Vec<String> {
        self.candidate_info.iter().map(Candidate::ballot_line).collect()
    }
}

impl Candidate {
    pub fn ballot_line(&self) -> String {
        format!("{}  {}. {}", text(&self.img), text(&self.num), text(&self.name))
    }
}
