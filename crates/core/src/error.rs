// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Typed errors returned by the table server.
//!
//! Every validation failure surfaces to the RPC caller as one of these kinds
//! with a stable description, the caller is expected to correct the request
//! and retry.
use serde::{Deserialize, Serialize};

/// A table server error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    /// Create player with an empty name.
    #[error("can not create player with empty name")]
    EmptyPlayerName,
    /// Create game with an empty name.
    #[error("can not create game with empty name")]
    EmptyGameName,
    /// Create player with a name already in use.
    #[error("player with that name already exists")]
    PlayerNameExists,
    /// Create game with a name already in use.
    #[error("game with that name already exists")]
    GameNameExists,
    /// Player id lookup failed.
    #[error("player not found")]
    PlayerNotFound,
    /// Game id lookup failed.
    #[error("game not found")]
    GameNotFound,
    /// Round id lookup failed.
    #[error("round not found")]
    RoundNotFound,
    /// Fewer than 2 or more than 8 players.
    #[error("can not create game with supplied count of players")]
    InvalidPlayerCount,
    /// A seat outside the 1 to 8 range.
    #[error("invalid slot number")]
    InvalidSlotNumber,
    /// Seats do not form a contiguous 1..N sequence.
    #[error("game slots are not allocated from 1 to the number of players")]
    InvalidSlotMinMax,
    /// Dealer seat not set at pre game validation.
    #[error("invalid button allocation")]
    InvalidButtonAllocation,
    /// The game minimum bet is not set.
    #[error("no minimum bet set")]
    NoBetSet,
    /// The operation requires the game not to be in a round.
    #[error("game is in a round")]
    GameInRound,
    /// The operation requires the game to be in a round.
    #[error("game is not in a round")]
    GameIsNotInRound,
    /// Dealt hole cards from a deck that is not full.
    #[error("deck is not full")]
    DeckNotFull,
    /// Dealt from a deck with no cards left.
    #[error("deck is exhausted")]
    DeckExhausted,
    /// Dealt hole cards over existing cards.
    #[error("players have existing cards")]
    ExistingCards,
    /// Dealt community cards before the hole cards.
    #[error("players have no cards")]
    NoExistingCards,
    /// The betting player is not the player on action.
    #[error("player is not on action")]
    PlayerNotOnAction,
    /// The betting player has folded.
    #[error("player is not in hand")]
    PlayerNotInHand,
    /// The round status does not allow betting.
    #[error("no bets allowed")]
    NoBetsAllowed,
    /// The bet status differs from the round status.
    #[error("bet status does not match round status")]
    WrongBetStatus,
    /// The player does not have the chips for the bet.
    #[error("insufficient chips")]
    InsufficientChips,
    /// The bet does not cover the amount to call.
    #[error("insufficient bet")]
    InsufficientBet,
    /// A call that is not exactly the amount to call.
    #[error("incorrect bet for bet type")]
    IncorrectBetForBetType,
    /// A raise that does not exceed the amount to call.
    #[error("wrong bet type")]
    WrongBetType,
    /// A bet with no type.
    #[error("no bet type set")]
    NoBetTypeSet,
    /// No seated player matches the game dealer seat.
    #[error("dealer not set")]
    DealerNotSet,
    /// A seat ring built with an empty slot.
    #[error("ring has an empty slot")]
    RingHasEmptySlot,
    /// The client supplied deadline expired.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// An unexpected store failure.
    #[error("store error: {0}")]
    Store(String),
}
