//! Wire messages exchanged between arena peers
use super::{Mode, Outcome, PlayerId};
use crate::game::direction::Direction;
use crate::game::grid::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub(crate) enum NetMessage {
    /// Authoritative state, host to everyone
    Snapshot(Snapshot),
    /// A player changed direction
    Move {
        player: PlayerId,
        direction: Direction,
    },
    /// A player wants another round
    RematchRequest { player: PlayerId },
    /// A player agrees to another round
    RematchAccept { player: PlayerId },
}

impl NetMessage {
    pub(crate) fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }

    pub(crate) fn decode(src: &str) -> Result<NetMessage, CodecError> {
        serde_json::from_str(src).map_err(CodecError::Decode)
    }
}

/// Everything a client needs to replace its replica of the arena
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Snapshot {
    pub(crate) mode: Mode,
    pub(crate) players: BTreeMap<PlayerId, PlayerState>,
    pub(crate) food: Cell,
    pub(crate) tick_ms: u64,
    pub(crate) round: u32,
    /// Time left in a points round
    pub(crate) remaining_ms: Option<u64>,
    pub(crate) outcome: Option<Outcome>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    /// Head first
    pub(crate) snake: Vec<Cell>,
    pub(crate) direction: Direction,
    pub(crate) score: u32,
    pub(crate) is_alive: bool,
    pub(crate) round_wins: u32,
}

#[derive(Debug, Error)]
pub(crate) enum CodecError {
    #[error("failed to encode arena message")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode arena message")]
    Decode(#[source] serde_json::Error),
}
