// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Poker cards definitions.
//!
//! Cards use a two character wire encoding with the rank first and the suit
//! second, so the ace of spades is `"As"` and the ten of hearts `"Th"`. A
//! [Deck] serializes to the concatenation of its cards encodings and parses
//! back from the same string.
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Cards and deck errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardsError {
    /// Dealt from a deck with no cards left.
    #[error("deck is exhausted")]
    DeckExhausted,
    /// A card or cards string that doesn't follow the two characters encoding.
    #[error("invalid cards encoding {0:?}")]
    InvalidEncoding(String),
}

/// Card rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Deuce
    Deuce = 0,
    /// Trey
    Trey,
    /// Four
    Four,
    /// Five
    Five,
    /// Six
    Six,
    /// Seven
    Seven,
    /// Eight
    Eight,
    /// Nine
    Nine,
    /// Ten
    Ten,
    /// Jack
    Jack,
    /// Queen
    Queen,
    /// King
    King,
    /// Ace
    Ace,
}

impl Rank {
    /// Returns all ranks in deck building order.
    pub fn ranks() -> impl DoubleEndedIterator<Item = Rank> {
        use Rank::*;
        [
            Deuce, Trey, Four, Five, Six, Seven, Eight, Nine, Ten, Jack, Queen, King, Ace,
        ]
        .into_iter()
    }

    fn from_char(c: char) -> Option<Rank> {
        let rank = match c {
            '2' => Rank::Deuce,
            '3' => Rank::Trey,
            '4' => Rank::Four,
            '5' => Rank::Five,
            '6' => Rank::Six,
            '7' => Rank::Seven,
            '8' => Rank::Eight,
            '9' => Rank::Nine,
            'T' => Rank::Ten,
            'J' => Rank::Jack,
            'Q' => Rank::Queen,
            'K' => Rank::King,
            'A' => Rank::Ace,
            _ => return None,
        };

        Some(rank)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank = match self {
            Rank::Deuce => '2',
            Rank::Trey => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        };

        write!(f, "{rank}")
    }
}

/// Card suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    /// Hearts suit.
    Hearts,
    /// Diamonds suit.
    Diamonds,
    /// Clubs suit.
    Clubs,
    /// Spades suit.
    Spades,
}

impl Suit {
    /// Returns all suits in deck building order.
    pub fn suits() -> impl DoubleEndedIterator<Item = Suit> {
        [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades].into_iter()
    }

    fn from_char(c: char) -> Option<Suit> {
        let suit = match c {
            'h' => Suit::Hearts,
            'd' => Suit::Diamonds,
            'c' => Suit::Clubs,
            's' => Suit::Spades,
            _ => return None,
        };

        Some(suit)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suit = match self {
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
            Suit::Spades => 's',
        };

        write!(f, "{suit}")
    }
}

/// A Poker card.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    /// Create a card given a rank and suit.
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Self { rank, suit }
    }

    /// Returns the card rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Returns the card suit.
    pub fn suit(&self) -> Suit {
        self.suit
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Card({}{})", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = CardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(r), Some(c), None) => {
                let rank = Rank::from_char(r);
                let suit = Suit::from_char(c);
                match (rank, suit) {
                    (Some(rank), Some(suit)) => Ok(Card::new(rank, suit)),
                    _ => Err(CardsError::InvalidEncoding(s.to_string())),
                }
            }
            _ => Err(CardsError::InvalidEncoding(s.to_string())),
        }
    }
}

/// Parses a concatenation of two character card encodings.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, CardsError> {
    if s.len() % 2 != 0 {
        return Err(CardsError::InvalidEncoding(s.to_string()));
    }

    s.as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).unwrap_or_default().parse())
        .collect()
}

/// A cards deck.
///
/// A new deck holds the 52 cards in rank major order, `2h 2d 2c 2s 3h ...`,
/// and deals from the back so the first card dealt from an unshuffled deck is
/// the ace of spades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// The number of cards in a full deck.
    pub const SIZE: usize = 52;

    /// Creates a new deck with the cards in the canonical order.
    pub fn new() -> Self {
        let cards = Rank::ranks()
            .flat_map(|r| Suit::suits().map(move |s| Card::new(r, s)))
            .collect::<Vec<_>>();
        Self { cards }
    }

    /// Shuffles the deck in place.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Deals the top card from the deck.
    pub fn deal(&mut self) -> Result<Card, CardsError> {
        self.cards.pop().ok_or(CardsError::DeckExhausted)
    }

    /// Checks if the deck holds all 52 cards.
    pub fn is_full(&self) -> bool {
        self.cards.len() == Self::SIZE
    }

    /// Checks if the deck is empty.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Number of cards left in the deck.
    pub fn count(&self) -> usize {
        self.cards.len()
    }

    /// Returns the deck cards in order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in &self.cards {
            write!(f, "{card}")?;
        }

        Ok(())
    }
}

impl FromStr for Deck {
    type Err = CardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            cards: parse_cards(s)?,
        })
    }
}
