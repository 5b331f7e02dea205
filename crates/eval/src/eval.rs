// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Poker hand evaluator.
//!
//! The evaluator scores 5, 6, or 7 cards hands on the 7462 equivalence
//! classes scale popularized by the [Cactus Kev's][kevlink] evaluator, where
//! 1 is a royal flush and 7462 the 7-5-4-3-2 offsuit high card. Lower is
//! better and ties are exact score equality.
//!
//! Instead of carrying the classic precomputed tables the score is computed
//! in closed form from the category and the tie break ranks, using the
//! combinatorial number system to order kickers within a category.
//!
//! [kevlink]: http://suffe.cool/poker/evaluator.html
use std::fmt;

use crate::cards::{parse_cards, Card, CardsError};

/// The best possible score, a royal flush.
pub const BEST_SCORE: u32 = 1;

/// The worst possible score, 7-5-4-3-2 offsuit.
pub const WORST_SCORE: u32 = 7462;

/// Category bases on the 1..=7462 scale, each category starts right after
/// the previous one ends.
const QUADS_BASE: u32 = 11;
const FULL_HOUSE_BASE: u32 = 167;
const FLUSH_BASE: u32 = 323;
const STRAIGHT_BASE: u32 = 1600;
const TRIPS_BASE: u32 = 1610;
const TWO_PAIR_BASE: u32 = 2468;
const PAIR_BASE: u32 = 3326;
const HIGH_CARD_BASE: u32 = 6186;

/// Combinatorial index of the ten straight rank sets, A high first down to
/// the 6 high straight, wheel last.
const STRAIGHT_IDX: [u32; 10] = [1286, 791, 461, 251, 125, 55, 20, 5, 0, 792];

/// A hand category, ordered from the weakest to the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandRank {
    /// No pair, high card only.
    HighCard,
    /// One pair.
    OnePair,
    /// Two pairs.
    TwoPair,
    /// Three of a kind.
    ThreeOfAKind,
    /// Five cards in rank sequence.
    Straight,
    /// Five cards of the same suit.
    Flush,
    /// Three of a kind plus a pair.
    FullHouse,
    /// Four of a kind.
    FourOfAKind,
    /// A straight all of the same suit.
    StraightFlush,
}

impl HandRank {
    /// The category of a 1..=7462 score.
    pub fn from_score(score: u32) -> HandRank {
        match score {
            1..=10 => HandRank::StraightFlush,
            11..=166 => HandRank::FourOfAKind,
            167..=322 => HandRank::FullHouse,
            323..=1599 => HandRank::Flush,
            1600..=1609 => HandRank::Straight,
            1610..=2467 => HandRank::ThreeOfAKind,
            2468..=3325 => HandRank::TwoPair,
            3326..=6185 => HandRank::OnePair,
            _ => HandRank::HighCard,
        }
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandRank::HighCard => "High Card",
            HandRank::OnePair => "One Pair",
            HandRank::TwoPair => "Two Pair",
            HandRank::ThreeOfAKind => "Three of a Kind",
            HandRank::Straight => "Straight",
            HandRank::Flush => "Flush",
            HandRank::FullHouse => "Full House",
            HandRank::FourOfAKind => "Four of a Kind",
            HandRank::StraightFlush => "Straight Flush",
        };

        write!(f, "{name}")
    }
}

/// Evaluates a 5, 6, or 7 cards hand.
///
/// For 6 and 7 cards hands the score is the best score over all the 5 cards
/// subsets.
///
/// Panics if the number of cards is not between 5 and 7.
pub fn eval(cards: &[Card]) -> u32 {
    let n = cards.len();
    assert!((5..=7).contains(&n), "eval requires 5 to 7 cards");

    let mut best = u32::MAX;
    for a in 0..(n - 4) {
        for b in (a + 1)..(n - 3) {
            for c in (b + 1)..(n - 2) {
                for d in (c + 1)..(n - 1) {
                    for e in (d + 1)..n {
                        let hand = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                        best = best.min(eval5(&hand));
                    }
                }
            }
        }
    }

    best
}

/// Evaluates a hand in the two character cards encoding.
pub fn eval_encoded(cards: &str) -> Result<u32, CardsError> {
    let cards = parse_cards(cards)?;
    if !(5..=7).contains(&cards.len()) {
        return Err(CardsError::InvalidEncoding(format!(
            "expected 5 to 7 cards got {}",
            cards.len()
        )));
    }

    Ok(eval(&cards))
}

/// Scores exactly 5 cards.
fn eval5(cards: &[Card; 5]) -> u32 {
    let mut counts = [0u8; 13];
    for card in cards {
        counts[card.rank() as usize] += 1;
    }

    let flush = cards.iter().all(|c| c.suit() == cards[0].suit());

    // Rank values present sorted by count then rank, both descending, so
    // groups[0] is the largest group with the highest rank.
    let mut groups: Vec<(u8, u32)> = Vec::with_capacity(5);
    for (rank, &count) in counts.iter().enumerate().rev() {
        if count > 0 {
            groups.push((count, rank as u32));
        }
    }
    groups.sort_by(|a, b| b.cmp(a));

    match groups.len() {
        2 => {
            // 4+1 quads or 3+2 full house.
            let (hi, lo) = (groups[0], groups[1]);
            if hi.0 == 4 {
                quads_score(hi.1, lo.1)
            } else {
                full_house_score(hi.1, lo.1)
            }
        }
        3 => {
            // 3+1+1 trips or 2+2+1 two pair.
            if groups[0].0 == 3 {
                trips_score(groups[0].1, groups[1].1, groups[2].1)
            } else {
                two_pair_score(groups[0].1, groups[1].1, groups[2].1)
            }
        }
        4 => pair_score(groups[0].1, groups[1].1, groups[2].1, groups[3].1),
        _ => {
            // Five distinct ranks: straight, flush, or high card.
            let ranks = [
                groups[0].1,
                groups[1].1,
                groups[2].1,
                groups[3].1,
                groups[4].1,
            ];
            no_pair_score(&ranks, flush)
        }
    }
}

/// Scores four of a kind with the given quads and kicker ranks.
fn quads_score(quads: u32, kicker: u32) -> u32 {
    QUADS_BASE + (12 - quads) * 12 + (12 - kicker) - u32::from(quads > kicker)
}

/// Scores a full house with the given trips and pair ranks.
fn full_house_score(trips: u32, pair: u32) -> u32 {
    FULL_HOUSE_BASE + (12 - trips) * 12 + (12 - pair) - u32::from(trips > pair)
}

/// Scores three of a kind, kickers in descending order.
fn trips_score(trips: u32, k1: u32, k2: u32) -> u32 {
    // Kicker ordinals among the 12 ranks left once the trips rank is out.
    let m1 = k1 - u32::from(k1 > trips);
    let m2 = k2 - u32::from(k2 > trips);
    let inner = comb(m1, 2) + comb(m2, 1);
    TRIPS_BASE + (12 - trips) * 66 + (65 - inner)
}

/// Scores two pair with the pairs in descending order.
fn two_pair_score(hi_pair: u32, lo_pair: u32, kicker: u32) -> u32 {
    let pairs_pos = 77 - (comb(hi_pair, 2) + comb(lo_pair, 1));
    let kicker_pos =
        (12 - kicker) - u32::from(hi_pair > kicker) - u32::from(lo_pair > kicker);
    TWO_PAIR_BASE + pairs_pos * 11 + kicker_pos
}

/// Scores one pair, kickers in descending order.
fn pair_score(pair: u32, k1: u32, k2: u32, k3: u32) -> u32 {
    let m1 = k1 - u32::from(k1 > pair);
    let m2 = k2 - u32::from(k2 > pair);
    let m3 = k3 - u32::from(k3 > pair);
    let inner = comb(m1, 3) + comb(m2, 2) + comb(m3, 1);
    PAIR_BASE + (12 - pair) * 220 + (219 - inner)
}

/// Scores five distinct ranks given in descending order.
fn no_pair_score(ranks: &[u32; 5], flush: bool) -> u32 {
    // The wheel straight ranks below every other straight.
    let wheel = *ranks == [12, 3, 2, 1, 0];
    let straight = wheel || ranks[0] - ranks[4] == 4;

    if straight {
        let high = if wheel { 3 } else { ranks[0] };
        let base = if flush { BEST_SCORE } else { STRAIGHT_BASE };
        return base + (12 - high);
    }

    // Lexicographic position of the rank set from the top, skipping the
    // straight sets that rank in their own category.
    let idx = comb(ranks[0], 5)
        + comb(ranks[1], 4)
        + comb(ranks[2], 3)
        + comb(ranks[3], 2)
        + comb(ranks[4], 1);
    let above = STRAIGHT_IDX.iter().filter(|&&s| s > idx).count() as u32;
    let base = if flush { FLUSH_BASE } else { HIGH_CARD_BASE };
    base + (1286 - idx) - above
}

/// Binomial coefficient for the small values used by the scoring.
fn comb(n: u32, k: u32) -> u32 {
    if n < k {
        return 0;
    }

    match k {
        1 => n,
        2 => n * (n - 1) / 2,
        3 => n * (n - 1) * (n - 2) / 6,
        4 => n * (n - 1) * (n - 2) * (n - 3) / 24,
        5 => n * (n - 1) * (n - 2) * (n - 3) * (n - 4) / 120,
        _ => 1,
    }
}
