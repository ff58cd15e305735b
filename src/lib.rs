//! # vsearch
//!
//! "Ask a Question" search for a small-business site, backed by the
//! Vectara query API.
//!
//! A query is submitted, its per-query state moves through
//! `idle → loading → loaded | error`, and the returned summary is split
//! into plain text and `[n]` reference links at render time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐ submit ┌──────────────┐  spawn  ┌──────────────┐
//! │ CLI/HTTP │───────▶│QuerySubmitter│────────▶│SearchBackend │
//! └────┬─────┘        └──────┬───────┘         │  (Vectara)   │
//!      │ observe             │ mark_loading    └──────┬───────┘
//!      ▼                     ▼                        │ loaded/error
//! ┌──────────────────────────────────────┐            │
//! │     ResultStore (query → result)     │◀───────────┘
//! └──────────────────────────────────────┘
//!      │ summary
//!      ▼
//!  annotate() → [Segment] → render
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export VECTARA_API_KEY=...
//! vsearch ask "chicago spas"
//! vsearch annotate "See [12] and [7] for details."
//! vsearch serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Result records, statuses, and segments |
//! | [`error`] | Submission error kinds |
//! | [`annotate`] | `[n]` marker annotation |
//! | [`render`] | HTML / terminal rendering and citation lookup |
//! | [`backend`] | Search backend trait and Vectara client |
//! | [`store`] | Keyed result state |
//! | [`submitter`] | Query submission and background fetch |
//! | [`ask`] | `ask` / `annotate` commands |
//! | [`server`] | JSON HTTP server |

pub mod annotate;
pub mod ask;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod server;
pub mod store;
pub mod submitter;
