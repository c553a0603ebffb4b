// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]

pub mod consume;
pub mod encoding;
pub mod error;
pub mod events;
pub mod host;
pub mod input_buffer;
pub mod reading_mode;
pub mod session;
pub mod span;

#[macro_use]
extern crate tracing;
