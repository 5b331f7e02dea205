// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Holdem core types shared by the server and its clients.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod connection;
pub mod error;
pub mod message;
pub mod types;

pub use error::Error;
