// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integration tests of `rasterpipe_cpu`.
//!
//! - The `util` module holds helpers shared by the other modules.
//! - Tests comparing the synchronous and the band-parallel pipeline go into
//!   `batching.rs`, everything else into the module of its topic.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

automod::dir!("tests");
