// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Type definitions for the RPC messages between a client and the server.
//!
//! A client sends a [Request] carrying an operation and a deadline, the
//! server answers with a [Response] carrying the operation result or a typed
//! [Error]. Requests on a connection are answered in order.
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    types::{AmountToCall, Bet, Chips, Game, Player, Round, RoundStatus},
};

/// An RPC request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Client chosen id echoed in the response.
    pub id: u64,
    /// Deadline for the call in milliseconds, 0 for the server default.
    pub deadline_ms: u32,
    /// The operation to perform.
    pub op: Op,
}

/// An RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The id of the request this response answers.
    pub id: u64,
    /// The operation result.
    pub result: Result<Reply, Error>,
}

/// An operation on the table server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    // Player operations.
    /// Creates a player with a unique name.
    CreatePlayer(Player),
    /// Creates a batch of players.
    CreatePlayers(Vec<Player>),
    /// Deletes players by id.
    DeletePlayers(Vec<i64>),
    /// Reads a player by id.
    GetPlayer(i64),
    /// Reads a batch of players by id.
    GetPlayers(Vec<i64>),
    /// Reads a player by name.
    GetPlayerByName(String),
    /// Reads a batch of players by name.
    GetPlayersByName(Vec<String>),
    /// Updates the chips of each given player.
    UpdatePlayersChips(Vec<Player>),
    /// Updates the hole cards of each given player.
    UpdatePlayersCards(Vec<Player>),
    /// Updates a player seat.
    SetPlayerSlot {
        /// The player id.
        player: i64,
        /// The seat to assign.
        seat: i64,
    },

    // Game operations.
    /// Creates a game with a unique name.
    CreateGame(Game),
    /// Reads a game and its players by id.
    GetGame(i64),
    /// Reads a game by name.
    GetGameByName(String),
    /// Deletes games by id.
    DeleteGames(Vec<i64>),
    /// Seats the joined players in the slots 1 to N.
    AllocateGameSlots(i64),
    /// Picks a random seat as the dealer.
    SetButtonPositions(i64),
    /// Sets the game small blind amount.
    SetMin {
        /// The game id.
        game: i64,
        /// The small blind amount.
        min: Chips,
    },
    /// Validates the game is ready to start a round.
    ValidatePreGame(i64),
    /// Rotates the dealer to the small blind seat.
    NextDealer(i64),
    /// Sets the game in round flag.
    UpdateGameInRound {
        /// The game id.
        game: i64,
        /// The new flag value.
        in_round: bool,
    },
    /// Persists the game dealer, minimum bet, and in round flag.
    UpdateGameStatus(Game),

    // Game players operations.
    /// Reads the players joined to a game.
    GetGamePlayersByGameId(i64),
    /// Joins the named players to a game.
    SetGamePlayers {
        /// The game id.
        game: i64,
        /// The names of the players to join.
        players: Vec<String>,
    },
    /// Removes a player from its game.
    RemovePlayerFromGame {
        /// The player id.
        player: i64,
    },

    // Round operations.
    /// Creates a round from a validated game.
    CreateRoundFromGame(i64),
    /// Reads a round and its players by id.
    GetRound(i64),
    /// Validates every round player can post the big blind.
    ValidatePreRound(i64),
    /// Shuffles, deals, posts the blinds, and opens pre flop betting.
    StartRound(i64),
    /// Burns one card and deals the three flop cards.
    DealFlop(i64),
    /// Burns one card and deals the river card.
    DealRiver(i64),
    /// Burns one card and deals the turn card.
    DealTurn(i64),
    /// Burns one card and deals two hole cards to every round player.
    DealCards(i64),
    /// Replaces the round deck with a freshly shuffled one.
    CreateDeck(i64),
    /// Persists the round deck.
    UpdateDeck {
        /// The round id.
        round: i64,
        /// The encoded deck.
        deck: String,
    },
    /// Sets the seat on action.
    SetAction {
        /// The round id.
        round: i64,
        /// The seat on action.
        seat: i64,
    },
    /// Persists the round status.
    UpdateRoundStatus {
        /// The round id.
        round: i64,
        /// The new status.
        status: RoundStatus,
    },
    /// Moves the action to the next player in hand.
    SetNextOnBet(i64),
    /// Advances the round to the next street.
    SetNextRound(i64),
    /// Persists the round flop cards.
    UpdateRoundFlop {
        /// The round id.
        round: i64,
        /// The encoded flop cards.
        cards: String,
    },
    /// Persists the round river card.
    UpdateRoundRiver {
        /// The round id.
        round: i64,
        /// The encoded river card.
        cards: String,
    },
    /// Persists the round turn card.
    UpdateRoundTurn {
        /// The round id.
        round: i64,
        /// The encoded turn card.
        cards: String,
    },
    /// Reads all the bets of a round.
    GetRoundBets(i64),
    /// Reads the bets of a round placed in its current street.
    GetRoundBetsForStatus(i64),
    /// Places a bet for the player on action.
    MakeBet(Bet),
    /// Evaluates the cards of the given round players.
    EvaluateHands(Round),
    /// Reads the player whose seat is on action.
    GetPlayerOnBet(i64),
    /// Reads the players snapshotted into a round.
    GetRoundPlayersByRoundId(i64),
    /// Snapshots the game players into a round.
    CreateRoundPlayers(i64),
    /// Clears a player in hand flag.
    UpdatePlayerNotInHand {
        /// The player id.
        player: i64,
    },
    /// Computes the chips a player must add to call on this street.
    GetAmountToCallForPlayer {
        /// The round id.
        round: i64,
        /// The player id.
        player: i64,
    },
    /// Checks if the current betting street is closed.
    IsBettingOver(i64),
}

/// An operation result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    /// A player record.
    Player(Player),
    /// A list of player records.
    Players(Vec<Player>),
    /// A game record.
    Game(Game),
    /// A list of game records.
    Games(Vec<Game>),
    /// A round record.
    Round(Round),
    /// A bet record.
    Bet(Bet),
    /// A list of bet records.
    Bets(Vec<Bet>),
    /// An amount to call.
    AmountToCall(AmountToCall),
    /// A betting street closure check.
    BettingOver(bool),
    /// The operation returns no payload.
    Unit,
}
