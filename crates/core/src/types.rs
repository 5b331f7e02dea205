// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Records exchanged over the RPC surface and persisted by the store.
use serde::{Deserialize, Serialize};
use std::{fmt, ops};

/// Chips amount.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Chips(i64);

impl Chips {
    /// The zero chips.
    pub const ZERO: Chips = Chips(0);

    /// Creates chips with the given value.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The integer amount.
    pub fn amount(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Chips {
    fn from(val: i64) -> Self {
        Chips(val)
    }
}

impl From<Chips> for i64 {
    fn from(val: Chips) -> Self {
        val.0
    }
}

impl ops::Add for Chips {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Chips(self.0 + rhs.0)
    }
}

impl ops::AddAssign for Chips {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl ops::Sub for Chips {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Chips(self.0 - rhs.0)
    }
}

impl ops::SubAssign for Chips {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl ops::Mul<i64> for Chips {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl fmt::Display for Chips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The street a round is in.
///
/// The order is frozen for wire compatibility, in particular `River`
/// precedes `Turn`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RoundStatus {
    /// The round has been created but not started.
    #[default]
    NotStarted = 0,
    /// First betting street, hole cards dealt.
    PreFlop = 1,
    /// Second betting street, three community cards.
    Flop = 2,
    /// Third betting street, fourth community card.
    River = 3,
    /// Fourth betting street, fifth community card.
    Turn = 4,
    /// Last betting street before hands are shown.
    Show = 5,
    /// The round is over and a winner recorded.
    Over = 6,
}

impl RoundStatus {
    /// The next status in the round progression.
    ///
    /// This mapping is the only definition of the street order, `Over` maps
    /// to itself.
    pub fn next(self) -> RoundStatus {
        match self {
            RoundStatus::NotStarted => RoundStatus::PreFlop,
            RoundStatus::PreFlop => RoundStatus::Flop,
            RoundStatus::Flop => RoundStatus::River,
            RoundStatus::River => RoundStatus::Turn,
            RoundStatus::Turn => RoundStatus::Show,
            RoundStatus::Show | RoundStatus::Over => RoundStatus::Over,
        }
    }

    /// Checks if the status is a street that accepts bets.
    pub fn betting_allowed(self) -> bool {
        !matches!(self, RoundStatus::NotStarted | RoundStatus::Over)
    }

    /// The stable name stored by the store.
    pub fn as_str(self) -> &'static str {
        match self {
            RoundStatus::NotStarted => "NOT_STARTED",
            RoundStatus::PreFlop => "PRE_FLOP",
            RoundStatus::Flop => "FLOP",
            RoundStatus::River => "RIVER",
            RoundStatus::Turn => "TURN",
            RoundStatus::Show => "SHOW",
            RoundStatus::Over => "OVER",
        }
    }

    /// Parses a stable name back to a status.
    pub fn parse(s: &str) -> Option<RoundStatus> {
        let status = match s {
            "NOT_STARTED" => RoundStatus::NotStarted,
            "PRE_FLOP" => RoundStatus::PreFlop,
            "FLOP" => RoundStatus::Flop,
            "RIVER" => RoundStatus::River,
            "TURN" => RoundStatus::Turn,
            "SHOW" => RoundStatus::Show,
            "OVER" => RoundStatus::Over,
            _ => return None,
        };

        Some(status)
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The type of a bet.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BetType {
    /// Missing bet type.
    #[default]
    None = 0,
    /// The player leaves the hand.
    Fold = 1,
    /// The player matches the amount to call.
    Call = 2,
    /// The player bets over the amount to call.
    Raise = 3,
    /// The posted small blind.
    Small = 4,
    /// The posted big blind.
    Big = 5,
}

impl BetType {
    /// Checks if the type counts towards a player street commitment.
    pub fn is_commitment(self) -> bool {
        matches!(
            self,
            BetType::Call | BetType::Raise | BetType::Small | BetType::Big
        )
    }

    /// The stable name stored by the store.
    pub fn as_str(self) -> &'static str {
        match self {
            BetType::None => "NONE",
            BetType::Fold => "FOLD",
            BetType::Call => "CALL",
            BetType::Raise => "RAISE",
            BetType::Small => "SMALL",
            BetType::Big => "BIG",
        }
    }

    /// Parses a stable name back to a bet type.
    pub fn parse(s: &str) -> Option<BetType> {
        let bet_type = match s {
            "NONE" => BetType::None,
            "FOLD" => BetType::Fold,
            "CALL" => BetType::Call,
            "RAISE" => BetType::Raise,
            "SMALL" => BetType::Small,
            "BIG" => BetType::Big,
            _ => return None,
        };

        Some(bet_type)
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A player record.
///
/// The `score` field is the transient evaluator output attached by hand
/// evaluation, it is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// The player id.
    pub id: i64,
    /// The unique player name.
    pub name: String,
    /// The player chips.
    pub chips: Chips,
    /// The seat at the table, 0 when unseated.
    pub seat: i64,
    /// The player is still in the current hand.
    pub in_hand: bool,
    /// The encoded hole cards, empty when not dealt.
    pub cards: String,
    /// Transient evaluator score, 0 when not evaluated.
    pub score: u32,
}

/// A table record with its seated players.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// The game id.
    pub id: i64,
    /// The unique game name.
    pub name: String,
    /// The dealer seat, 0 when not set.
    pub dealer: i64,
    /// The small blind amount, the big blind is twice this.
    pub min: Chips,
    /// A hand is in progress.
    pub in_round: bool,
    /// The players joined to this game.
    pub players: Vec<Player>,
}

/// A round record, one hand played at a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// The round id.
    pub id: i64,
    /// The game this round belongs to.
    pub game: i64,
    /// The street the round is in.
    pub status: RoundStatus,
    /// The undealt cards.
    pub deck: String,
    /// The three flop cards.
    pub flop: String,
    /// The turn card.
    pub turn: String,
    /// The river card.
    pub river: String,
    /// The seat on action, 0 when no action is pending.
    pub action: i64,
    /// The winner player id, 0 until showdown.
    pub winning_player: i64,
    /// The winner evaluator score, 0 until showdown.
    pub winning_score: u32,
    /// The winner seven cards, hole cards plus community cards.
    pub winning_hand: String,
    /// Snapshot of the players in this round.
    pub players: Vec<Player>,
}

/// A bet record, appended to a round bet log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    /// The bet id.
    pub id: i64,
    /// The street the bet was placed in.
    pub status: RoundStatus,
    /// The round this bet belongs to.
    pub round: i64,
    /// The game this bet belongs to.
    pub game: i64,
    /// The betting player id.
    pub player: i64,
    /// The chips committed by this bet.
    pub chips: Chips,
    /// The bet type.
    pub kind: BetType,
}

/// The chips a player must add on the current street to stay in the hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AmountToCall {
    /// The player id.
    pub player: i64,
    /// The chips to add to match the street high commitment.
    pub chips: Chips,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_progression() {
        let mut status = RoundStatus::NotStarted;
        let order = [
            RoundStatus::PreFlop,
            RoundStatus::Flop,
            RoundStatus::River,
            RoundStatus::Turn,
            RoundStatus::Show,
            RoundStatus::Over,
        ];

        for next in order {
            status = status.next();
            assert_eq!(status, next);
        }

        // Over is terminal.
        assert_eq!(RoundStatus::Over.next(), RoundStatus::Over);
    }

    #[test]
    fn status_betting() {
        assert!(!RoundStatus::NotStarted.betting_allowed());
        assert!(RoundStatus::PreFlop.betting_allowed());
        assert!(RoundStatus::Show.betting_allowed());
        assert!(!RoundStatus::Over.betting_allowed());
    }

    #[test]
    fn status_names_round_trip() {
        for status in [
            RoundStatus::NotStarted,
            RoundStatus::PreFlop,
            RoundStatus::Flop,
            RoundStatus::River,
            RoundStatus::Turn,
            RoundStatus::Show,
            RoundStatus::Over,
        ] {
            assert_eq!(RoundStatus::parse(status.as_str()), Some(status));
        }

        assert_eq!(RoundStatus::parse("PRE_RIVER"), None);
    }

    #[test]
    fn bet_type_names_round_trip() {
        for kind in [
            BetType::None,
            BetType::Fold,
            BetType::Call,
            BetType::Raise,
            BetType::Small,
            BetType::Big,
        ] {
            assert_eq!(BetType::parse(kind.as_str()), Some(kind));
        }

        assert!(!BetType::Fold.is_commitment());
        assert!(!BetType::None.is_commitment());
        assert!(BetType::Small.is_commitment());
        assert!(BetType::Raise.is_commitment());
    }

    #[test]
    fn chips_arithmetic() {
        let mut chips = Chips::new(1000);
        chips -= Chips::new(10);
        assert_eq!(chips, Chips::new(990));
        chips += Chips::new(30);
        assert_eq!(chips.amount(), 1020);
        assert_eq!(Chips::new(10) * 2, Chips::new(20));
        assert!(Chips::new(10) < Chips::new(20));
    }
}
