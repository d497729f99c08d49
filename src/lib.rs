//! NFL betting-odds ingestion.
//!
//! One request covers one (season, week) slate: scrape the event listing
//! page for game/team identifiers, issue a single batched query to the
//! odds service for opening/current/consensus lines, pivot the long-format
//! records into one wide row per (event, participant), and reconcile the
//! two sources into a CSV-ready table. Persistence is the caller's job;
//! the pipeline only ever returns a fully built in-memory table.

pub mod config;
pub mod csv;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod merge;
pub mod pipeline;
pub mod reshape;
pub mod schedule;
pub mod teams;
