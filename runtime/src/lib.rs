// Copyright 2026 Tenant Scout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tenant Scout: tenant directory discovery and enrichment for UK retail
//! locations.
//!
//! For each shopping centre, retail park or outlet centre the pipeline
//! finds the page (or sitemap section) that lists its tenants, turns it
//! into classified tenant records through a chat-completions model and
//! stores them with derived stats. Batch runs are checkpointed so they can
//! be interrupted and resumed.

#![allow(clippy::new_without_default)]

pub mod acquisition;
pub mod batch;
pub mod cartography;
pub mod cli;
pub mod config;
pub mod enrichment;
pub mod extraction;
pub mod progress;
pub mod renderer;
pub mod store;
pub mod taxonomy;
pub mod types;
