// Battle formatting: decks, average elixir cost and match outcome.

use serde::Serialize;
use serde_json::Value;

use crate::clash_api::{ApiCard, Battle};

/// Which side of a battle to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The player whose battle log was requested (`team`).
    Player,
    /// Their opponent (`opponent`).
    Opponent,
}

/// A card in a deck, with `null` for anything the API left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Card {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub level: Option<u32>,
    pub elixir_cost: Option<u32>,
}

impl From<&ApiCard> for Card {
    fn from(card: &ApiCard) -> Self {
        Card {
            id: card.id,
            name: card.name.clone(),
            level: card.level,
            elixir_cost: card.elixir_cost,
        }
    }
}

pub type Deck = Vec<Card>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
    Unknown,
}

/// The deck used by one side of a battle. Empty if that side has no
/// first participant or no cards.
pub fn extract_deck(battle: &Battle, side: Side) -> Deck {
    let participants = match side {
        Side::Player => &battle.team,
        Side::Opponent => &battle.opponent,
    };
    participants
        .first()
        .and_then(|p| p.cards.as_ref())
        .map(|cards| cards.iter().map(Card::from).collect())
        .unwrap_or_default()
}

/// Average elixir cost of a deck, rounded to two decimals. Cards without a
/// cost count as 0; an empty deck costs 0.
pub fn calculate_deck_cost(deck: &[Card]) -> f64 {
    if deck.is_empty() {
        return 0.0;
    }
    let total: u64 = deck
        .iter()
        .map(|card| u64::from(card.elixir_cost.unwrap_or(0)))
        .sum();
    let average = total as f64 / deck.len() as f64;
    (average * 100.0).round() / 100.0
}

/// Outcome from the player's point of view, decided by crowns.
pub fn determine_result(battle: &Battle) -> MatchResult {
    let (Some(player), Some(opponent)) = (battle.team.first(), battle.opponent.first()) else {
        return MatchResult::Unknown;
    };
    let player_crowns = player.crowns.unwrap_or(0);
    let opponent_crowns = opponent.crowns.unwrap_or(0);
    match player_crowns.cmp(&opponent_crowns) {
        std::cmp::Ordering::Greater => MatchResult::Win,
        std::cmp::Ordering::Less => MatchResult::Loss,
        std::cmp::Ordering::Equal => MatchResult::Draw,
    }
}

/// The derived view of a battle shared by every battle endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BattleSummary {
    pub battle_time: Option<String>,
    pub game_mode: Option<String>,
    #[serde(rename = "type")]
    pub battle_type: Option<String>,
    pub result: MatchResult,
    pub player_deck: Deck,
    pub player_deck_cost: f64,
    pub opponent_deck: Deck,
    pub opponent_deck_cost: f64,
}

pub fn summarize(battle: &Battle) -> BattleSummary {
    let player_deck = extract_deck(battle, Side::Player);
    let opponent_deck = extract_deck(battle, Side::Opponent);
    BattleSummary {
        battle_time: battle.battle_time.clone(),
        game_mode: battle.game_mode_name().map(str::to_string),
        battle_type: battle.battle_type.clone(),
        result: determine_result(battle),
        player_deck_cost: calculate_deck_cost(&player_deck),
        player_deck,
        opponent_deck_cost: calculate_deck_cost(&opponent_deck),
        opponent_deck,
    }
}

/// A battle-log entry with its position in the log.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedBattle {
    pub index: usize,
    #[serde(flatten)]
    pub summary: BattleSummary,
    pub raw_data: Value,
}

/// A single battle prepared for analysis.
#[derive(Debug, Clone, Serialize)]
pub struct BattleAnalysis {
    #[serde(flatten)]
    pub summary: BattleSummary,
    pub battle_raw_data: Value,
}

/// Enrich a whole battle log, keeping its order.
pub fn format_battle_log(battles: Vec<Battle>) -> Vec<IndexedBattle> {
    battles
        .into_iter()
        .enumerate()
        .map(|(index, battle)| IndexedBattle {
            index,
            summary: summarize(&battle),
            raw_data: battle.raw,
        })
        .collect()
}

pub fn format_for_analysis(battle: Battle) -> BattleAnalysis {
    BattleAnalysis {
        summary: summarize(&battle),
        battle_raw_data: battle.raw,
    }
}
