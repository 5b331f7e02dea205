// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Seat ring used to resolve table positions.
//!
//! The ring is a cyclic view of the seated players in increasing seat order
//! with a cursor, built from a table snapshot. It resolves the dealer, the
//! blinds, and the next player to act, it never writes back to the table.
//!
//! Heads up tables follow the two players exception, the dealer posts the
//! small blind and the other player the big blind.
use holdem_core::{types::Player, Error};

/// A cyclic view over the players seated at a table.
#[derive(Debug)]
pub struct SeatRing {
    dealer_seat: i64,
    players: Vec<Player>,
    cursor: usize,
}

impl SeatRing {
    /// Creates a ring from a dealer seat and a players snapshot.
    pub fn new(dealer_seat: i64, mut players: Vec<Player>) -> Result<Self, Error> {
        if players.is_empty() || players.iter().any(|p| p.seat == 0) {
            return Err(Error::RingHasEmptySlot);
        }

        players.sort_by_key(|p| p.seat);

        Ok(Self {
            dealer_seat,
            players,
            cursor: 0,
        })
    }

    /// The number of players in the ring.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// The ring is never empty, this only exists to pair with [SeatRing::len].
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The player under the cursor.
    pub fn current(&self) -> &Player {
        &self.players[self.cursor]
    }

    /// Moves the cursor to the dealer and returns the dealer.
    pub fn current_dealer(&mut self) -> Result<&Player, Error> {
        let pos = self
            .players
            .iter()
            .position(|p| p.seat == self.dealer_seat)
            .ok_or(Error::DealerNotSet)?;

        self.cursor = pos;
        Ok(self.current())
    }

    /// Moves the cursor to the small blind and returns the player.
    ///
    /// With two players the dealer posts the small blind, otherwise it is
    /// the seat after the dealer.
    pub fn small_blind(&mut self) -> Result<&Player, Error> {
        self.current_dealer()?;
        if !self.heads_up() {
            self.advance();
        }

        Ok(self.current())
    }

    /// Moves the cursor to the big blind and returns the player.
    pub fn big_blind(&mut self) -> Result<&Player, Error> {
        self.small_blind()?;
        self.advance();
        Ok(self.current())
    }

    /// Returns the big and small blind players.
    pub fn big_and_small(&mut self) -> Result<(Player, Player), Error> {
        let small = self.small_blind()?.clone();
        let big = self.big_blind()?.clone();
        Ok((big, small))
    }

    /// Moves the cursor to the player with the given seat and returns it.
    pub fn player_from_seat(&mut self, seat: i64) -> Result<&Player, Error> {
        let pos = self
            .players
            .iter()
            .position(|p| p.seat == seat)
            .ok_or(Error::PlayerNotFound)?;

        self.cursor = pos;
        Ok(self.current())
    }

    /// Returns the first player still in hand strictly after the given seat,
    /// wrapping around the ring.
    pub fn next_in_hand(&mut self, from_seat: i64) -> Result<&Player, Error> {
        self.player_from_seat(from_seat)?;

        for _ in 0..self.len() {
            self.advance();
            if self.current().in_hand {
                return Ok(self.current());
            }
        }

        Err(Error::PlayerNotFound)
    }

    /// The seat the dealer moves to for the next hand, the current small
    /// blind seat.
    pub fn next_dealer_seat(&mut self) -> Result<i64, Error> {
        Ok(self.small_blind()?.seat)
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.players.len();
    }

    fn heads_up(&self) -> bool {
        self.players.len() == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seated(n: usize) -> Vec<Player> {
        (1..=n)
            .map(|i| Player {
                id: i as i64,
                name: format!("p{i}"),
                seat: i as i64,
                in_hand: true,
                ..Player::default()
            })
            .collect()
    }

    #[test]
    fn ring_orders_by_seat() {
        let mut players = seated(4);
        players.reverse();

        let mut ring = SeatRing::new(1, players).unwrap();
        let dealer = ring.current_dealer().unwrap();
        assert_eq!(dealer.seat, 1);
    }

    #[test]
    fn ring_rejects_empty_slots() {
        assert_eq!(
            SeatRing::new(1, Vec::new()).unwrap_err(),
            Error::RingHasEmptySlot
        );

        let mut players = seated(3);
        players[1].seat = 0;
        assert_eq!(
            SeatRing::new(1, players).unwrap_err(),
            Error::RingHasEmptySlot
        );
    }

    #[test]
    fn dealer_not_seated() {
        let mut ring = SeatRing::new(7, seated(3)).unwrap();
        assert_eq!(ring.current_dealer().unwrap_err(), Error::DealerNotSet);
    }

    #[test]
    fn blinds_with_three_or_more() {
        let mut ring = SeatRing::new(2, seated(5)).unwrap();

        assert_eq!(ring.small_blind().unwrap().seat, 3);
        assert_eq!(ring.big_blind().unwrap().seat, 4);

        let (big, small) = ring.big_and_small().unwrap();
        assert_eq!(small.seat, 3);
        assert_eq!(big.seat, 4);

        // Blinds wrap around the ring.
        let mut ring = SeatRing::new(5, seated(5)).unwrap();
        assert_eq!(ring.small_blind().unwrap().seat, 1);
        assert_eq!(ring.big_blind().unwrap().seat, 2);
    }

    #[test]
    fn blinds_heads_up() {
        let mut ring = SeatRing::new(2, seated(2)).unwrap();

        // The dealer posts the small blind.
        assert_eq!(ring.small_blind().unwrap().seat, 2);
        assert_eq!(ring.big_blind().unwrap().seat, 1);
        assert_ne!(ring.big_blind().unwrap().seat, 2);
    }

    #[test]
    fn player_from_seat() {
        let mut ring = SeatRing::new(1, seated(3)).unwrap();
        assert_eq!(ring.player_from_seat(3).unwrap().id, 3);
        assert_eq!(ring.player_from_seat(4).unwrap_err(), Error::PlayerNotFound);
    }

    #[test]
    fn next_in_hand_skips_folded() {
        let mut players = seated(4);
        players[1].in_hand = false;
        players[2].in_hand = false;

        let mut ring = SeatRing::new(1, players).unwrap();
        // Seats 2 and 3 are folded, from seat 1 the next in hand is seat 4.
        assert_eq!(ring.next_in_hand(1).unwrap().seat, 4);
        // And from seat 4 it wraps back to seat 1.
        assert_eq!(ring.next_in_hand(4).unwrap().seat, 1);
    }

    #[test]
    fn next_in_hand_lone_player() {
        let mut players = seated(3);
        players[0].in_hand = false;
        players[1].in_hand = false;

        let mut ring = SeatRing::new(1, players).unwrap();
        // Only seat 3 is in hand, a full wrap lands back on it.
        assert_eq!(ring.next_in_hand(3).unwrap().seat, 3);
    }

    #[test]
    fn next_in_hand_none_left() {
        let mut players = seated(2);
        players[0].in_hand = false;
        players[1].in_hand = false;

        let mut ring = SeatRing::new(1, players).unwrap();
        assert_eq!(ring.next_in_hand(1).unwrap_err(), Error::PlayerNotFound);
    }

    #[test]
    fn dealer_rotates_to_small_blind() {
        let mut ring = SeatRing::new(2, seated(4)).unwrap();
        assert_eq!(ring.next_dealer_seat().unwrap(), 3);

        let mut ring = SeatRing::new(1, seated(2)).unwrap();
        // Heads up the dealer is the small blind, the button stays.
        assert_eq!(ring.next_dealer_seat().unwrap(), 1);
    }
}
