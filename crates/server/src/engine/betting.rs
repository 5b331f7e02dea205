// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Betting loop validation and street closure detection.
use ahash::AHashMap;

use holdem_core::{
    types::{AmountToCall, Bet, BetType, Chips, Round},
    Error,
};

use super::Engine;
use crate::ring::SeatRing;

impl Engine {
    /// Places a bet for the player on action.
    ///
    /// The single action endpoint for fold, call, and raise. The first
    /// failing check short circuits and leaves state untouched. After an
    /// accepted bet the action advances to the next player in hand, and when
    /// the street closes the round moves on.
    pub async fn make_bet(&self, bet: Bet) -> Result<Bet, Error> {
        let round = self.get_round(bet.round).await?;
        let game = self.db().game(round.game).await?;
        if !game.in_round {
            return Err(Error::GameIsNotInRound);
        }

        if !round.status.betting_allowed() {
            return Err(Error::NoBetsAllowed);
        }

        if round.status != bet.status {
            return Err(Error::WrongBetStatus);
        }

        let player = self.db().player(bet.player).await?;
        if player.seat != round.action {
            return Err(Error::PlayerNotOnAction);
        }

        if !player.in_hand {
            return Err(Error::PlayerNotInHand);
        }

        let to_call = self.amount_to_call(&round, player.id).await?;

        let stamped = Bet {
            id: 0,
            status: round.status,
            round: round.id,
            game: game.id,
            player: player.id,
            chips: bet.chips,
            kind: bet.kind,
        };

        let accepted = match bet.kind {
            BetType::Fold => {
                // No chip movement, the fold row only records the action.
                self.db().update_player_in_hand(player.id, false).await?;
                self.db()
                    .insert_bet(Bet {
                        chips: Chips::ZERO,
                        ..stamped
                    })
                    .await?
            }
            BetType::Call => {
                if player.chips < bet.chips {
                    return Err(Error::InsufficientChips);
                }

                if bet.chips < to_call {
                    return Err(Error::InsufficientBet);
                }

                if bet.chips != to_call {
                    return Err(Error::IncorrectBetForBetType);
                }

                let accepted = self.db().insert_bet(stamped).await?;
                self.db()
                    .update_player_chips(player.id, player.chips - bet.chips)
                    .await?;
                accepted
            }
            BetType::Raise => {
                if player.chips < bet.chips {
                    return Err(Error::InsufficientChips);
                }

                if bet.chips < to_call {
                    return Err(Error::InsufficientBet);
                }

                if bet.chips == to_call {
                    return Err(Error::WrongBetType);
                }

                let accepted = self.db().insert_bet(stamped).await?;
                self.db()
                    .update_player_chips(player.id, player.chips - bet.chips)
                    .await?;
                accepted
            }
            BetType::None => return Err(Error::NoBetTypeSet),
            // The blinds are posted by the round start, not by clients.
            BetType::Small | BetType::Big => return Err(Error::WrongBetType),
        };

        // Advance the action past the bet, then close the street if every
        // live player has matched the high commitment.
        let players = self.db().round_players(round.id).await?;
        let mut ring = SeatRing::new(game.dealer, players)?;
        let next = ring.next_in_hand(round.action)?.seat;
        self.db().update_round_action(round.id, next).await?;

        if self.is_betting_over(round.id).await? {
            self.set_next_round(round.id).await?;
        }

        Ok(accepted)
    }

    /// Computes the chips a player must add to call on this street.
    pub async fn get_amount_to_call(
        &self,
        round: i64,
        player: i64,
    ) -> Result<AmountToCall, Error> {
        let round = self.db().round(round).await?;
        self.db().player(player).await?;

        let chips = self.amount_to_call(&round, player).await?;
        Ok(AmountToCall { player, chips })
    }

    /// Checks if the current betting street is closed.
    ///
    /// A street is closed when a single live player remains, or when every
    /// live player has posted on this street and all live commitments match
    /// the street high commitment.
    pub async fn is_betting_over(&self, round: i64) -> Result<bool, Error> {
        let round = self.get_round(round).await?;

        let live = round
            .players
            .iter()
            .filter(|p| p.in_hand)
            .collect::<Vec<_>>();
        if live.len() <= 1 {
            return Ok(true);
        }

        let totals = self.street_totals(&round).await?;
        if live.iter().any(|p| !totals.contains_key(&p.id)) {
            return Ok(false);
        }

        let high = totals.values().copied().max().unwrap_or_default();
        Ok(live.iter().all(|p| totals[&p.id] == high))
    }

    /// Reads all bets of a round.
    pub async fn get_round_bets(&self, round: i64) -> Result<Vec<Bet>, Error> {
        self.db().round(round).await?;
        self.db().round_bets(round).await
    }

    /// Reads the bets of a round placed in its current street.
    pub async fn get_round_bets_for_status(&self, round: i64) -> Result<Vec<Bet>, Error> {
        let round = self.db().round(round).await?;
        self.db().round_bets_for_status(round.id, round.status).await
    }

    /// The chips the player must add to match the street high commitment.
    pub(crate) async fn amount_to_call(
        &self,
        round: &Round,
        player: i64,
    ) -> Result<Chips, Error> {
        let totals = self.street_totals(round).await?;

        let high = totals.values().copied().max().unwrap_or_default();
        let mine = totals.get(&player).copied().unwrap_or_default();

        Ok(if high > mine {
            high - mine
        } else {
            Chips::ZERO
        })
    }

    /// Per player committed chips on the round current street.
    async fn street_totals(&self, round: &Round) -> Result<AHashMap<i64, Chips>, Error> {
        let bets = self
            .db()
            .round_bets_for_status(round.id, round.status)
            .await?;

        let mut totals = AHashMap::new();
        for bet in bets.iter().filter(|b| b.kind.is_commitment()) {
            *totals.entry(bet.player).or_insert(Chips::ZERO) += bet.chips;
        }

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use super::*;
    use holdem_core::types::{Chips, Player, RoundStatus};

    #[tokio::test]
    async fn preflop_legality() {
        let (engine, _, round) = setup_round(5, 1000, 10).await;

        // The small blind acts first and owes the other half of the big
        // blind.
        let to_call = {
            let on_bet = engine.get_player_on_bet(round.id).await.unwrap();
            engine
                .get_amount_to_call(round.id, on_bet.id)
                .await
                .unwrap()
                .chips
        };
        assert_eq!(to_call, Chips::new(10));

        let err = bet_on_action(&engine, round.id, BetType::Call, 1)
            .await
            .unwrap_err();
        assert_eq!(err, Error::InsufficientBet);

        let err = bet_on_action(&engine, round.id, BetType::Call, 100_000)
            .await
            .unwrap_err();
        assert_eq!(err, Error::InsufficientChips);

        let err = bet_on_action(&engine, round.id, BetType::Call, 21)
            .await
            .unwrap_err();
        assert_eq!(err, Error::IncorrectBetForBetType);

        // A raise of exactly the amount to call is not a raise.
        let err = bet_on_action(&engine, round.id, BetType::Raise, 10)
            .await
            .unwrap_err();
        assert_eq!(err, Error::WrongBetType);

        let err = bet_on_action(&engine, round.id, BetType::Raise, 1)
            .await
            .unwrap_err();
        assert_eq!(err, Error::InsufficientBet);

        // A bet must carry a type.
        let err = bet_on_action(&engine, round.id, BetType::None, 0)
            .await
            .unwrap_err();
        assert_eq!(err, Error::NoBetTypeSet);

        // Blinds are not client bets.
        let err = bet_on_action(&engine, round.id, BetType::Small, 10)
            .await
            .unwrap_err();
        assert_eq!(err, Error::WrongBetType);

        // The exact amount to call succeeds.
        let bet = bet_on_action(&engine, round.id, BetType::Call, 10)
            .await
            .unwrap();
        assert_eq!(bet.chips, Chips::new(10));
        assert_eq!(bet.status, RoundStatus::PreFlop);

        // A raise strictly over the amount to call succeeds.
        let bet = bet_on_action(&engine, round.id, BetType::Raise, 15)
            .await
            .unwrap();
        assert_eq!(bet.kind, BetType::Raise);
    }

    #[tokio::test]
    async fn betting_out_of_turn() {
        let (engine, game, round) = setup_round(4, 1000, 10).await;

        let off_turn = round
            .players
            .iter()
            .find(|p| p.seat != round.action)
            .unwrap();

        let err = engine
            .make_bet(Bet {
                status: RoundStatus::PreFlop,
                round: round.id,
                game: game.id,
                player: off_turn.id,
                chips: Chips::new(20),
                kind: BetType::Call,
                ..Bet::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, Error::PlayerNotOnAction);
    }

    #[tokio::test]
    async fn betting_wrong_status() {
        let (engine, _, round) = setup_round(4, 1000, 10).await;

        let err = bet_on_action_with_status(&engine, round.id, RoundStatus::Flop)
            .await
            .unwrap_err();
        assert_eq!(err, Error::WrongBetStatus);
    }

    async fn bet_on_action_with_status(
        engine: &Engine,
        round: i64,
        status: RoundStatus,
    ) -> Result<Bet, Error> {
        let current = engine.get_round(round).await?;
        let player = engine.get_player_on_bet(round).await?;

        engine
            .make_bet(Bet {
                status,
                round: current.id,
                game: current.game,
                player: player.id,
                chips: Chips::ZERO,
                kind: BetType::Fold,
                ..Bet::default()
            })
            .await
    }

    #[tokio::test]
    async fn betting_requires_round_in_progress() {
        let (engine, game) = setup_game(3, 1000, 10).await;
        let round = engine.create_round_from_game(game.id).await.unwrap();
        let players = engine.get_game_players(game.id).await.unwrap();

        let err = engine
            .make_bet(Bet {
                status: RoundStatus::PreFlop,
                round: round.id,
                game: game.id,
                player: players[0].id,
                chips: Chips::new(20),
                kind: BetType::Call,
                ..Bet::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, Error::GameIsNotInRound);
    }

    #[tokio::test]
    async fn folded_player_cannot_bet() {
        let (engine, game, round) = setup_round(4, 1000, 10).await;

        let folder = engine.get_player_on_bet(round.id).await.unwrap();
        bet_on_action(&engine, round.id, BetType::Fold, 0)
            .await
            .unwrap();

        // Force the action back onto the folded player.
        engine.set_action(round.id, folder.seat).await.unwrap();

        let err = engine
            .make_bet(Bet {
                status: RoundStatus::PreFlop,
                round: round.id,
                game: game.id,
                player: folder.id,
                chips: Chips::new(20),
                kind: BetType::Call,
                ..Bet::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, Error::PlayerNotInHand);
    }

    #[tokio::test]
    async fn fold_advances_and_keeps_street_open() {
        let (engine, _, round) = setup_round(4, 1000, 10).await;

        let before = round.action;
        bet_on_action(&engine, round.id, BetType::Fold, 0)
            .await
            .unwrap();

        let round = engine.get_round(round.id).await.unwrap();
        assert_ne!(round.action, before);
        assert_eq!(round.status, RoundStatus::PreFlop);
        assert!(!engine.is_betting_over(round.id).await.unwrap());
    }

    #[tokio::test]
    async fn heads_up_fold_ends_the_hand() {
        let (engine, game, round) = setup_round(2, 1000, 10).await;

        // Heads up the dealer is the small blind and acts first, folding
        // hands the round to the big blind without further dealing.
        let big_blind = round
            .players
            .iter()
            .find(|p| p.seat != round.action)
            .cloned()
            .unwrap();

        bet_on_action(&engine, round.id, BetType::Fold, 0)
            .await
            .unwrap();

        let round = engine.get_round(round.id).await.unwrap();
        assert_eq!(round.status, RoundStatus::Over);
        assert_eq!(round.winning_player, big_blind.id);
        assert_eq!(round.action, 0);
        // Folded out pre flop there is no five card hand to score.
        assert_eq!(round.winning_score, 0);
        assert!(round.flop.is_empty());

        let game = engine.get_game(game.id).await.unwrap();
        assert!(!game.in_round);
    }

    #[tokio::test]
    async fn lone_contender_after_folds() {
        let (engine, _, round) = setup_round(3, 1000, 10).await;

        bet_on_action(&engine, round.id, BetType::Fold, 0)
            .await
            .unwrap();
        bet_on_action(&engine, round.id, BetType::Fold, 0)
            .await
            .unwrap();

        let round = engine.get_round(round.id).await.unwrap();
        assert_eq!(round.status, RoundStatus::Over);
        assert_ne!(round.winning_player, 0);
        assert!(round.flop.is_empty());
    }

    #[tokio::test]
    async fn amount_to_call_tracks_raises() {
        let (engine, _, round) = setup_round(4, 1000, 10).await;
        let n = 4;

        // Small blind completes, big blind raises 10 over.
        bet_on_action(&engine, round.id, BetType::Call, 10)
            .await
            .unwrap();
        bet_on_action(&engine, round.id, BetType::Raise, 10)
            .await
            .unwrap();

        // Next to act has nothing committed and owes the full 30.
        let on_bet = engine.get_player_on_bet(round.id).await.unwrap();
        let to_call = engine
            .get_amount_to_call(round.id, on_bet.id)
            .await
            .unwrap();
        assert_eq!(to_call.chips, Chips::new(30));

        // The small blind already holds 20 and owes the 10 raise.
        let round = engine.get_round(round.id).await.unwrap();
        let game = engine.get_game(round.game).await.unwrap();
        let small = small_blind_seat(game.dealer, n);
        let small = round.players.iter().find(|p| p.seat == small).unwrap();
        let to_call = engine
            .get_amount_to_call(round.id, small.id)
            .await
            .unwrap();
        assert_eq!(to_call.chips, Chips::new(10));
    }

    #[tokio::test]
    async fn full_hand_with_eight_players() {
        let min = 10;
        let (engine, game, round) = setup_round(8, 1000, min).await;

        // Capture the acting order of the eight players over the pre flop
        // street, starting from the small blind.
        let mut actors: Vec<Player> = Vec::new();
        for _ in 0..8 {
            let player = engine.get_player_on_bet(round.id).await.unwrap();
            actors.push(player);

            // Pre flop script: the small blind completes, the big blind
            // raises 10, the first caller folds, everyone else calls 30.
            let bet = match actors.len() {
                1 => (BetType::Call, 10),
                2 => (BetType::Raise, 10),
                3 => (BetType::Fold, 0),
                _ => (BetType::Call, 30),
            };
            bet_on_action(&engine, round.id, bet.0, bet.1).await.unwrap();
        }

        let n = 8;
        assert_eq!(actors[0].seat, small_blind_seat(game.dealer, n));
        assert_eq!(actors[1].seat, big_blind_seat(game.dealer, n));

        // The small blind still owes the raise to close the street.
        let current = engine.get_round(round.id).await.unwrap();
        assert_eq!(current.status, RoundStatus::PreFlop);
        assert_eq!(current.action, actors[0].seat);
        bet_on_action(&engine, round.id, BetType::Call, 10)
            .await
            .unwrap();

        // The street closed, the flop is out, the action reopens on the
        // first live seat after the dealer.
        let current = engine.get_round(round.id).await.unwrap();
        assert_eq!(current.status, RoundStatus::Flop);
        assert_eq!(current.flop.len(), 6);
        assert_eq!(current.deck.len(), (52 - 17 - 4) * 2);
        assert_eq!(current.action, actors[0].seat);

        // Flop: the small blind bets 20, one caller folds, the rest call.
        bet_on_action(&engine, round.id, BetType::Raise, 20)
            .await
            .unwrap();
        bet_on_action(&engine, round.id, BetType::Call, 20)
            .await
            .unwrap();
        bet_on_action(&engine, round.id, BetType::Fold, 0)
            .await
            .unwrap();
        for _ in 0..4 {
            bet_on_action(&engine, round.id, BetType::Call, 20)
                .await
                .unwrap();
        }

        let current = engine.get_round(round.id).await.unwrap();
        assert_eq!(current.status, RoundStatus::River);
        assert_eq!(current.river.len(), 2);
        assert_eq!(current.deck.len(), (52 - 17 - 6) * 2);

        // River: checked around, one fold.
        bet_on_action(&engine, round.id, BetType::Call, 0)
            .await
            .unwrap();
        bet_on_action(&engine, round.id, BetType::Call, 0)
            .await
            .unwrap();
        bet_on_action(&engine, round.id, BetType::Fold, 0)
            .await
            .unwrap();
        for _ in 0..3 {
            bet_on_action(&engine, round.id, BetType::Call, 0)
                .await
                .unwrap();
        }

        let current = engine.get_round(round.id).await.unwrap();
        assert_eq!(current.status, RoundStatus::Turn);
        assert_eq!(current.turn.len(), 2);
        assert_eq!(current.deck.len(), (52 - 17 - 8) * 2);

        // Turn: a 50 bet, one fold, three callers.
        bet_on_action(&engine, round.id, BetType::Raise, 50)
            .await
            .unwrap();
        bet_on_action(&engine, round.id, BetType::Call, 50)
            .await
            .unwrap();
        bet_on_action(&engine, round.id, BetType::Fold, 0)
            .await
            .unwrap();
        for _ in 0..2 {
            bet_on_action(&engine, round.id, BetType::Call, 50)
                .await
                .unwrap();
        }

        let current = engine.get_round(round.id).await.unwrap();
        assert_eq!(current.status, RoundStatus::Show);

        // Show: the four remaining players check it down.
        for _ in 0..4 {
            bet_on_action(&engine, round.id, BetType::Call, 0)
                .await
                .unwrap();
        }

        // The hand is over with a recorded winner and the table released.
        let over = engine.get_round(round.id).await.unwrap();
        assert_eq!(over.status, RoundStatus::Over);
        assert_ne!(over.winning_player, 0);
        assert_ne!(over.winning_score, 0);
        assert_eq!(over.winning_hand.len(), 14);
        assert_eq!(over.action, 0);

        let game = engine.get_game(game.id).await.unwrap();
        assert!(!game.in_round);

        // Chips follow the streets each actor survived: the blinds and the
        // last two callers paid every street, the folders only what they
        // had committed.
        let expected = [900, 900, 1000, 970, 950, 950, 900, 900];
        for (actor, expected) in actors.iter().zip(expected) {
            let player = engine.get_player(actor.id).await.unwrap();
            assert_eq!(
                player.chips,
                Chips::new(expected),
                "unexpected chips for {}",
                player.name
            );
        }

        // Every chip that left a stack is in the bet log.
        let bets = engine.get_round_bets(round.id).await.unwrap();
        let committed = bets
            .iter()
            .fold(Chips::ZERO, |acc, b| acc + b.chips);
        assert_eq!(committed, Chips::new(530));

        // The winner holds the best evaluated hand among the showdown
        // players.
        let winner = engine.get_player(over.winning_player).await.unwrap();
        assert!(winner.in_hand);
        let winner_cards = format!(
            "{}{}{}{}",
            winner.cards, over.flop, over.river, over.turn
        );
        assert_eq!(winner_cards, over.winning_hand);
    }

    #[tokio::test]
    async fn show_street_closes_with_zero_calls() {
        let (engine, _, round) = setup_round(2, 1000, 10).await;

        // Heads up the small blind completing the big blind closes pre flop
        // on its own, the big blind commitment is already matched.
        bet_on_action(&engine, round.id, BetType::Call, 10)
            .await
            .unwrap();

        let current = engine.get_round(round.id).await.unwrap();
        assert_eq!(current.status, RoundStatus::Flop);

        // Both players check down the flop, river, turn, and show streets.
        for _ in 0..4 {
            let current = engine.get_round(round.id).await.unwrap();
            assert!(current.status.betting_allowed());
            bet_on_action(&engine, round.id, BetType::Call, 0)
                .await
                .unwrap();
            bet_on_action(&engine, round.id, BetType::Call, 0)
                .await
                .unwrap();
        }

        let over = engine.get_round(round.id).await.unwrap();
        assert_eq!(over.status, RoundStatus::Over);
        assert_ne!(over.winning_player, 0);
        assert_ne!(over.winning_score, 0);
        assert_eq!(over.winning_hand.len(), 14);

        // Chip conservation: only the blinds moved.
        let players = engine.get_round_players(round.id).await.unwrap();
        let total = players
            .iter()
            .fold(Chips::ZERO, |acc, p| acc + p.chips);
        assert_eq!(total, Chips::new(2000 - 40));
    }
}
