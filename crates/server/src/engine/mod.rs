// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Hand lifecycle engine.
//!
//! The engine owns the state machine that drives a table from ready to deal
//! through the betting streets to showdown and settlement. It reads and
//! writes through the [Db], resolves positions with the [SeatRing], and
//! scores hands with the evaluator at showdown.
//!
//! Every validation failure leaves state untouched, the only writes are the
//! row updates of a successfully validated operation.
use log::info;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

use holdem_core::{
    types::{Bet, BetType, Chips, Game, Player, Round, RoundStatus},
    Error,
};
use holdem_eval::{cards::CardsError, eval, Deck};

use crate::{db::Db, ring::SeatRing};

mod betting;

/// The slots community cards are dealt into.
enum CommunitySlot {
    Flop,
    River,
    Turn,
}

/// The table engine.
///
/// The engine is cheap to clone and shares the store handle and the process
/// wide random source.
#[derive(Clone)]
pub struct Engine {
    db: Db,
    rng: Arc<Mutex<StdRng>>,
}

impl Engine {
    /// Creates an engine seeded from the system entropy.
    pub fn new(db: Db) -> Self {
        Self::with_rng(db, StdRng::from_entropy())
    }

    /// Creates an engine with user initialized randomness.
    pub fn with_rng(db: Db, rng: StdRng) -> Self {
        Self {
            db,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// The store this engine reads and writes through.
    pub fn db(&self) -> &Db {
        &self.db
    }

    // Player operations.

    /// Creates a player with a unique non empty name.
    pub async fn create_player(&self, player: Player) -> Result<Player, Error> {
        if player.name.is_empty() {
            return Err(Error::EmptyPlayerName);
        }

        self.db.insert_player(player.name, player.chips).await
    }

    /// Creates a batch of players.
    pub async fn create_players(&self, players: Vec<Player>) -> Result<Vec<Player>, Error> {
        let mut out = Vec::with_capacity(players.len());
        for player in players {
            out.push(self.create_player(player).await?);
        }

        Ok(out)
    }

    /// Deletes players by id.
    pub async fn delete_players(&self, ids: Vec<i64>) -> Result<(), Error> {
        self.db.delete_players(ids).await
    }

    /// Reads a player by id.
    pub async fn get_player(&self, id: i64) -> Result<Player, Error> {
        self.db.player(id).await
    }

    /// Reads a batch of players by id.
    pub async fn get_players(&self, ids: Vec<i64>) -> Result<Vec<Player>, Error> {
        self.db.players(ids).await
    }

    /// Reads a player by name.
    pub async fn get_player_by_name(&self, name: String) -> Result<Player, Error> {
        if name.is_empty() {
            return Err(Error::EmptyPlayerName);
        }

        self.db
            .player_by_name(name)
            .await?
            .ok_or(Error::PlayerNotFound)
    }

    /// Reads a batch of players by name, missing names are skipped.
    pub async fn get_players_by_name(&self, names: Vec<String>) -> Result<Vec<Player>, Error> {
        self.db.players_by_name(names).await
    }

    /// Updates the chips of each given player.
    pub async fn update_players_chips(&self, players: Vec<Player>) -> Result<Vec<Player>, Error> {
        for player in &players {
            self.db.update_player_chips(player.id, player.chips).await?;
        }

        self.db
            .players(players.iter().map(|p| p.id).collect())
            .await
    }

    /// Updates the hole cards of each given player.
    pub async fn update_players_cards(&self, players: Vec<Player>) -> Result<Vec<Player>, Error> {
        for player in &players {
            self.db
                .update_player_cards(player.id, player.cards.clone())
                .await?;
        }

        self.db
            .players(players.iter().map(|p| p.id).collect())
            .await
    }

    /// Updates a player seat.
    pub async fn set_player_slot(&self, player: i64, seat: i64) -> Result<Player, Error> {
        if !(0..=8).contains(&seat) {
            return Err(Error::InvalidSlotNumber);
        }

        self.db.update_player_seat(player, seat).await?;
        self.db.player(player).await
    }

    /// Clears a player in hand flag.
    pub async fn update_player_not_in_hand(&self, player: i64) -> Result<Player, Error> {
        self.db.update_player_in_hand(player, false).await?;
        self.db.player(player).await
    }

    // Game operations.

    /// Creates a game with a unique non empty name.
    pub async fn create_game(&self, game: Game) -> Result<Game, Error> {
        if game.name.is_empty() {
            return Err(Error::EmptyGameName);
        }

        self.db.insert_game(game.name, game.min).await
    }

    /// Reads a game and its players by id.
    pub async fn get_game(&self, id: i64) -> Result<Game, Error> {
        self.db.game(id).await
    }

    /// Reads a game and its players by name.
    pub async fn get_game_by_name(&self, name: String) -> Result<Game, Error> {
        if name.is_empty() {
            return Err(Error::EmptyGameName);
        }

        self.db.game_by_name(name).await?.ok_or(Error::GameNotFound)
    }

    /// Deletes games by id.
    pub async fn delete_games(&self, ids: Vec<i64>) -> Result<(), Error> {
        self.db.delete_games(ids).await
    }

    /// Seats the joined players in the slots 1 to N in join order.
    pub async fn allocate_game_slots(&self, game: i64) -> Result<Game, Error> {
        let players = self.db.game_players(game).await?;
        if !(2..=8).contains(&players.len()) {
            return Err(Error::InvalidPlayerCount);
        }

        self.seat_players(&players).await?;
        self.db.game(game).await
    }

    /// Picks a random seat as the dealer.
    pub async fn set_button_positions(&self, game: i64) -> Result<Game, Error> {
        let players = self.db.game_players(game).await?;
        if !(2..=8).contains(&players.len()) {
            return Err(Error::InvalidPlayerCount);
        }

        let dealer = self.rng.lock().gen_range(1..=players.len() as i64);
        self.db.update_game_dealer(game, dealer).await?;
        self.db.game(game).await
    }

    /// Sets the game small blind amount, the big blind is twice this.
    pub async fn set_min(&self, game: i64, min: Chips) -> Result<Game, Error> {
        if min.amount() < 1 {
            return Err(Error::NoBetSet);
        }

        self.db.update_game_min(game, min).await?;
        self.db.game(game).await
    }

    /// Validates the game is ready to start a round.
    pub async fn validate_pre_game(&self, game: i64) -> Result<Game, Error> {
        let game = self.db.game(game).await?;
        if game.in_round {
            return Err(Error::GameInRound);
        }

        let n = game.players.len();
        if !(2..=8).contains(&n) {
            return Err(Error::InvalidPlayerCount);
        }

        let mut seats = game.players.iter().map(|p| p.seat).collect::<Vec<_>>();
        seats.sort_unstable();
        if seats.iter().any(|s| !(1..=8).contains(s)) {
            return Err(Error::InvalidSlotNumber);
        }

        if seats.iter().enumerate().any(|(i, &s)| s != (i + 1) as i64) {
            return Err(Error::InvalidSlotMinMax);
        }

        if !(1..=n as i64).contains(&game.dealer) {
            return Err(Error::InvalidButtonAllocation);
        }

        if game.min.amount() < 1 {
            return Err(Error::NoBetSet);
        }

        Ok(game)
    }

    /// Rotates the dealer to the current small blind seat.
    pub async fn next_dealer(&self, game: i64) -> Result<Game, Error> {
        let game = self.db.game(game).await?;
        let mut ring = SeatRing::new(game.dealer, game.players.clone())?;
        let seat = ring.next_dealer_seat()?;

        self.db.update_game_dealer(game.id, seat).await?;
        self.db.game(game.id).await
    }

    /// Sets the game in round flag.
    pub async fn update_game_in_round(&self, game: i64, in_round: bool) -> Result<Game, Error> {
        self.db.update_game_in_round(game, in_round).await?;
        self.db.game(game).await
    }

    /// Persists the game dealer, minimum bet, and in round flag.
    pub async fn update_game_status(&self, game: Game) -> Result<Game, Error> {
        self.db
            .update_game_status(game.id, game.dealer, game.min, game.in_round)
            .await?;
        self.db.game(game.id).await
    }

    /// Reads the players joined to a game.
    pub async fn get_game_players(&self, game: i64) -> Result<Vec<Player>, Error> {
        self.db.game(game).await.map(|g| g.players)
    }

    /// Joins the named players to a game, players already joined are kept.
    pub async fn set_game_players(
        &self,
        game: i64,
        names: Vec<String>,
    ) -> Result<Vec<Player>, Error> {
        let game = self.db.game(game).await?;
        for name in names {
            let player = self
                .db
                .player_by_name(name)
                .await?
                .ok_or(Error::PlayerNotFound)?;
            self.db.join_game(player.id, game.id).await?;
        }

        self.db.game_players(game.id).await
    }

    /// Removes a player from the game it is joined to.
    pub async fn remove_player_from_game(&self, player: i64) -> Result<(), Error> {
        let game = self
            .db
            .player_game(player)
            .await?
            .ok_or(Error::PlayerNotFound)?;

        if self.db.game(game).await?.in_round {
            return Err(Error::GameInRound);
        }

        self.db.leave_game(player).await?;
        self.db.update_player_seat(player, 0).await
    }

    // Round operations.

    /// Creates a round from a validated game with a snapshot of its players.
    pub async fn create_round_from_game(&self, game: i64) -> Result<Round, Error> {
        let game = self.validate_pre_game(game).await?;

        let round = self
            .db
            .insert_round(game.id, RoundStatus::NotStarted, Deck::new().to_string())
            .await?;

        for player in &game.players {
            self.db
                .insert_round_player(round.id, player.id, game.id)
                .await?;
        }

        self.get_round(round.id).await
    }

    /// Reads a round and its players by id.
    pub async fn get_round(&self, id: i64) -> Result<Round, Error> {
        let mut round = self.db.round(id).await?;
        round.players = self.db.round_players(id).await?;
        Ok(round)
    }

    /// Snapshots the game players into a round, players already snapshotted
    /// are kept.
    pub async fn create_round_players(&self, round: i64) -> Result<Vec<Player>, Error> {
        let round = self.db.round(round).await?;
        let players = self.db.game_players(round.game).await?;
        for player in &players {
            self.db
                .insert_round_player(round.id, player.id, round.game)
                .await?;
        }

        self.db.round_players(round.id).await
    }

    /// Reads the players snapshotted into a round.
    pub async fn get_round_players(&self, round: i64) -> Result<Vec<Player>, Error> {
        self.db.round(round).await?;
        self.db.round_players(round).await
    }

    /// Validates every round player can post the big blind.
    pub async fn validate_pre_round(&self, round: i64) -> Result<Round, Error> {
        let round = self.get_round(round).await?;
        let game = self.db.game(round.game).await?;

        let big_blind = game.min * 2;
        if round.players.iter().any(|p| p.chips < big_blind) {
            return Err(Error::InsufficientChips);
        }

        Ok(round)
    }

    /// Replaces the round deck with a freshly shuffled one.
    pub async fn create_deck(&self, round: i64) -> Result<Round, Error> {
        let round = self.db.round(round).await?;

        let mut deck = Deck::new();
        {
            let mut rng = self.rng.lock();
            deck.shuffle(&mut *rng);
        }

        self.db.update_round_deck(round.id, deck.to_string()).await?;
        self.get_round(round.id).await
    }

    /// Persists the round deck.
    pub async fn update_deck(&self, round: i64, deck: String) -> Result<Round, Error> {
        self.db.update_round_deck(round, deck).await?;
        self.get_round(round).await
    }

    /// Burns one card then deals two hole cards to every round player in
    /// seat order.
    pub async fn deal_cards(&self, round: i64) -> Result<Round, Error> {
        let round = self.get_round(round).await?;
        if round.players.iter().any(|p| !p.cards.is_empty()) {
            return Err(Error::ExistingCards);
        }

        let mut deck: Deck = round.deck.parse().map_err(cards_err)?;
        if !deck.is_full() {
            return Err(Error::DeckNotFull);
        }

        deck.deal().map_err(cards_err)?;

        for player in &round.players {
            let c1 = deck.deal().map_err(cards_err)?;
            let c2 = deck.deal().map_err(cards_err)?;
            self.db
                .update_player_cards(player.id, format!("{c1}{c2}"))
                .await?;
            self.db.update_player_in_hand(player.id, true).await?;
        }

        self.db.update_round_deck(round.id, deck.to_string()).await?;
        self.get_round(round.id).await
    }

    /// Starts a round.
    ///
    /// Shuffles a new deck, deals the hole cards, posts the blinds, and puts
    /// the action on the small blind with the round in pre flop.
    pub async fn start_round(&self, round: i64) -> Result<Round, Error> {
        let round = self.db.round(round).await?;
        let game = self.db.game(round.game).await?;

        self.create_deck(round.id).await?;
        self.deal_cards(round.id).await?;

        self.db
            .update_round_status(round.id, RoundStatus::PreFlop)
            .await?;
        self.db.update_game_in_round(game.id, true).await?;

        // Re-seat in join order, a no-op when the slots are already
        // allocated.
        let players = self.db.game_players(game.id).await?;
        self.seat_players(&players).await?;

        let players = self.db.round_players(round.id).await?;
        let mut ring = SeatRing::new(game.dealer, players)?;
        let (big, small) = ring.big_and_small()?;

        self.post_blind(&round, &game, &small, BetType::Small, game.min)
            .await?;
        self.post_blind(&round, &game, &big, BetType::Big, game.min * 2)
            .await?;

        self.db.update_round_action(round.id, small.seat).await?;

        info!("Round {} started for game {}", round.id, game.id);

        self.get_round(round.id).await
    }

    /// Burns one card and deals the three flop cards.
    pub async fn deal_flop(&self, round: i64) -> Result<Round, Error> {
        self.deal_community(round, 3, CommunitySlot::Flop).await
    }

    /// Burns one card and deals the river card.
    pub async fn deal_river(&self, round: i64) -> Result<Round, Error> {
        self.deal_community(round, 1, CommunitySlot::River).await
    }

    /// Burns one card and deals the turn card.
    pub async fn deal_turn(&self, round: i64) -> Result<Round, Error> {
        self.deal_community(round, 1, CommunitySlot::Turn).await
    }

    async fn deal_community(
        &self,
        round: i64,
        count: usize,
        slot: CommunitySlot,
    ) -> Result<Round, Error> {
        let round = self.get_round(round).await?;
        if round.players.iter().all(|p| p.cards.is_empty()) {
            return Err(Error::NoExistingCards);
        }

        let existing = match slot {
            CommunitySlot::Flop => &round.flop,
            CommunitySlot::River => &round.river,
            CommunitySlot::Turn => &round.turn,
        };
        if !existing.is_empty() {
            return Err(Error::ExistingCards);
        }

        let mut deck: Deck = round.deck.parse().map_err(cards_err)?;
        deck.deal().map_err(cards_err)?;

        let mut cards = String::with_capacity(count * 2);
        for _ in 0..count {
            let card = deck.deal().map_err(cards_err)?;
            cards.push_str(&card.to_string());
        }

        match slot {
            CommunitySlot::Flop => self.db.update_round_flop(round.id, cards).await?,
            CommunitySlot::River => self.db.update_round_river(round.id, cards).await?,
            CommunitySlot::Turn => self.db.update_round_turn(round.id, cards).await?,
        }

        self.db.update_round_deck(round.id, deck.to_string()).await?;
        self.get_round(round.id).await
    }

    /// Sets the seat on action.
    pub async fn set_action(&self, round: i64, seat: i64) -> Result<Round, Error> {
        self.db.update_round_action(round, seat).await?;
        self.get_round(round).await
    }

    /// Persists the round status.
    pub async fn update_round_status(
        &self,
        round: i64,
        status: RoundStatus,
    ) -> Result<Round, Error> {
        self.db.update_round_status(round, status).await?;
        self.get_round(round).await
    }

    /// Persists the round flop cards.
    pub async fn update_round_flop(&self, round: i64, cards: String) -> Result<Round, Error> {
        self.db.update_round_flop(round, cards).await?;
        self.get_round(round).await
    }

    /// Persists the round river card.
    pub async fn update_round_river(&self, round: i64, cards: String) -> Result<Round, Error> {
        self.db.update_round_river(round, cards).await?;
        self.get_round(round).await
    }

    /// Persists the round turn card.
    pub async fn update_round_turn(&self, round: i64, cards: String) -> Result<Round, Error> {
        self.db.update_round_turn(round, cards).await?;
        self.get_round(round).await
    }

    /// Moves the action to the next player in hand.
    pub async fn set_next_on_bet(&self, round: i64) -> Result<Round, Error> {
        let round = self.get_round(round).await?;
        let game = self.db.game(round.game).await?;

        let mut ring = SeatRing::new(game.dealer, round.players.clone())?;
        let next = ring.next_in_hand(round.action)?.seat;

        self.db.update_round_action(round.id, next).await?;
        self.get_round(round.id).await
    }

    /// Advances the round to the next street.
    ///
    /// Community cards are dealt for the new street and the action is reset
    /// to the first player in hand after the dealer. When a single live
    /// player remains the round jumps straight to over, and the transition
    /// to over runs the showdown.
    pub async fn set_next_round(&self, round: i64) -> Result<Round, Error> {
        let round = self.get_round(round).await?;

        let live = round.players.iter().filter(|p| p.in_hand).count();
        let next = if live <= 1 {
            RoundStatus::Over
        } else {
            round.status.next()
        };

        match next {
            RoundStatus::Flop => {
                self.deal_flop(round.id).await?;
            }
            RoundStatus::River => {
                self.deal_river(round.id).await?;
            }
            RoundStatus::Turn => {
                self.deal_turn(round.id).await?;
            }
            RoundStatus::Show => {}
            RoundStatus::Over => return self.showdown(round).await,
            RoundStatus::NotStarted | RoundStatus::PreFlop => {
                return Err(Error::NoBetsAllowed);
            }
        }

        self.db.update_round_status(round.id, next).await?;

        let game = self.db.game(round.game).await?;
        let mut ring = SeatRing::new(game.dealer, round.players.clone())?;
        let first = ring.next_in_hand(game.dealer)?.seat;
        self.db.update_round_action(round.id, first).await?;

        info!("Round {} moved to {next}", round.id);

        self.get_round(round.id).await
    }

    /// Evaluates the cards of the given round players.
    ///
    /// Attaches the evaluator score to each player and sorts them best hand
    /// first. The round is evaluated as passed, nothing is read or written.
    pub async fn evaluate_hands(&self, mut round: Round) -> Result<Round, Error> {
        for player in &mut round.players {
            player.score = eval::eval_encoded(&player.cards).map_err(cards_err)?;
        }

        round.players.sort_by_key(|p| p.score);
        Ok(round)
    }

    /// Reads the player whose seat is on action.
    pub async fn get_player_on_bet(&self, round: i64) -> Result<Player, Error> {
        let round = self.get_round(round).await?;
        round
            .players
            .into_iter()
            .find(|p| p.seat == round.action)
            .ok_or(Error::PlayerNotFound)
    }

    /// Scores the in hand players and records the winner, then closes the
    /// round and releases the table.
    async fn showdown(&self, round: Round) -> Result<Round, Error> {
        let live = round
            .players
            .iter()
            .filter(|p| p.in_hand)
            .collect::<Vec<_>>();

        let (winner, score, hand) = if live.len() == 1 {
            // A lone contender wins without showing a full hand, community
            // cards may be missing when the hand folded out early.
            let player = live[0];
            let hand = format!("{}{}{}{}", player.cards, round.flop, round.river, round.turn);
            let score = eval::eval_encoded(&hand).unwrap_or(0);
            (player.id, score, hand)
        } else {
            let mut best: Option<(i64, u32, String)> = None;
            for player in &live {
                let hand =
                    format!("{}{}{}{}", player.cards, round.flop, round.river, round.turn);
                let score = eval::eval_encoded(&hand).map_err(cards_err)?;
                if best.as_ref().map_or(true, |(_, s, _)| score < *s) {
                    best = Some((player.id, score, hand));
                }
            }

            best.ok_or(Error::PlayerNotInHand)?
        };

        self.db
            .update_round_winner(round.id, winner, score, hand)
            .await?;
        self.db.update_round_action(round.id, 0).await?;
        self.db
            .update_round_status(round.id, RoundStatus::Over)
            .await?;
        self.db.update_game_in_round(round.game, false).await?;

        info!("Round {} over, winning player {winner}", round.id);

        self.get_round(round.id).await
    }

    async fn seat_players(&self, players: &[Player]) -> Result<(), Error> {
        for (i, player) in players.iter().enumerate() {
            self.db.update_player_seat(player.id, (i + 1) as i64).await?;
        }

        Ok(())
    }

    async fn post_blind(
        &self,
        round: &Round,
        game: &Game,
        player: &Player,
        kind: BetType,
        chips: Chips,
    ) -> Result<(), Error> {
        if player.chips < chips {
            return Err(Error::InsufficientChips);
        }

        self.db
            .insert_bet(Bet {
                status: RoundStatus::PreFlop,
                round: round.id,
                game: game.id,
                player: player.id,
                chips,
                kind,
                ..Bet::default()
            })
            .await?;

        self.db
            .update_player_chips(player.id, player.chips - chips)
            .await
    }
}

fn cards_err(e: CardsError) -> Error {
    match e {
        CardsError::DeckExhausted => Error::DeckExhausted,
        CardsError::InvalidEncoding(s) => Error::Store(format!("invalid cards {s}")),
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Creates an engine over an in memory store with a seeded rng, and a
    /// game with `n` players ready to start a round.
    pub(crate) async fn setup_game(n: usize, chips: i64, min: i64) -> (Engine, Game) {
        let db = Db::open_in_memory().unwrap();
        let engine = Engine::with_rng(db, StdRng::seed_from_u64(121));

        let names = (1..=n).map(|i| format!("player{i}")).collect::<Vec<_>>();
        let players = names
            .iter()
            .map(|name| Player {
                name: name.clone(),
                chips: Chips::new(chips),
                ..Player::default()
            })
            .collect();
        engine.create_players(players).await.unwrap();

        let game = engine
            .create_game(Game {
                name: "test table".to_string(),
                ..Game::default()
            })
            .await
            .unwrap();

        engine.set_game_players(game.id, names).await.unwrap();
        engine.allocate_game_slots(game.id).await.unwrap();
        engine.set_button_positions(game.id).await.unwrap();
        let game = engine.set_min(game.id, Chips::new(min)).await.unwrap();

        (engine, game)
    }

    /// Sets up a game and starts a round on it.
    pub(crate) async fn setup_round(n: usize, chips: i64, min: i64) -> (Engine, Game, Round) {
        let (engine, game) = setup_game(n, chips, min).await;

        let round = engine.create_round_from_game(game.id).await.unwrap();
        engine.validate_pre_round(round.id).await.unwrap();
        let round = engine.start_round(round.id).await.unwrap();
        let game = engine.get_game(game.id).await.unwrap();

        (engine, game, round)
    }

    /// The seat after the given one on a table with `n` seats.
    pub(crate) fn seat_after(seat: i64, n: i64) -> i64 {
        seat % n + 1
    }

    /// The small blind seat for the given dealer.
    pub(crate) fn small_blind_seat(dealer: i64, n: i64) -> i64 {
        if n == 2 {
            dealer
        } else {
            seat_after(dealer, n)
        }
    }

    /// The big blind seat for the given dealer.
    pub(crate) fn big_blind_seat(dealer: i64, n: i64) -> i64 {
        if n == 2 {
            seat_after(dealer, n)
        } else {
            seat_after(small_blind_seat(dealer, n), n)
        }
    }

    /// Makes a bet for the player on action in the round current street.
    pub(crate) async fn bet_on_action(
        engine: &Engine,
        round: i64,
        kind: BetType,
        chips: i64,
    ) -> Result<Bet, Error> {
        let current = engine.get_round(round).await?;
        let player = engine.get_player_on_bet(round).await?;

        engine
            .make_bet(Bet {
                status: current.status,
                round: current.id,
                game: current.game,
                player: player.id,
                chips: Chips::new(chips),
                kind,
                ..Bet::default()
            })
            .await
    }
}
