use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A player profile as returned by `/players/{tag}`.
///
/// Only the fields the backend reads are typed; everything else the API sends
/// is kept in `extra` so the profile can be handed back to clients unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophies: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_trophies: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wins: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub losses: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battle_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_crown_wins: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arena: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clan: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single battle from a player's battle log.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battle {
    #[serde(default)]
    pub battle_time: Option<String>,
    #[serde(default, rename = "type")]
    pub battle_type: Option<String>,
    #[serde(default)]
    pub game_mode: Option<GameMode>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub team: Vec<Participant>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub opponent: Vec<Participant>,
    /// The battle exactly as the API sent it.
    #[serde(skip)]
    pub raw: Value,
}

impl Battle {
    /// Parse a battle, keeping the untouched document alongside the typed view.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut battle: Battle = serde_json::from_value(value.clone())?;
        battle.raw = value;
        Ok(battle)
    }

    /// Name of the game mode, if the API reported one.
    pub fn game_mode_name(&self) -> Option<&str> {
        self.game_mode.as_ref().and_then(|m| m.name.as_deref())
    }
}

/// Treat an explicit `null` list the same as a missing one.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameMode {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One side's player in a battle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub crowns: Option<u32>,
    #[serde(default)]
    pub cards: Option<Vec<ApiCard>>,
    #[serde(default)]
    pub starting_trophies: Option<i32>,
    #[serde(default)]
    pub trophy_change: Option<i32>,
    #[serde(default)]
    pub king_tower_hit_points: Option<u32>,
}

/// A card as it appears inside a battle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCard {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default, alias = "elixir")]
    pub elixir_cost: Option<u32>,
}
