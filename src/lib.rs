//! # smart-grep
//!
//! Hybrid code search over a single repository: clone it, split it into code
//! units, index them lexically and in one or more vector spaces, then rank
//! units against free-text queries.
//!
//! ## Architecture
//!
//! ```text
//!   repo id ──► clone (git2) ──► walk ──► extract units (rayon)
//!                                              │
//!                     ┌────────────────────────┼──────────────────────┐
//!                     ▼                        ▼                      ▼
//!             ┌──────────────┐        ┌─────────────────┐    ┌─────────────────┐
//!             │ lexical view │        │ semantic view   │    │ code view       │
//!             │ tantivy BM25 │        │ embed → FlatL2  │    │ embed → FlatL2  │
//!             └──────┬───────┘        └────────┬────────┘    └────────┬────────┘
//!                    └─────────────┬───────────┴──────────────────────┘
//!                                  ▼
//!                     Session (Arc, swapped whole on rebuild)
//!                                  │
//!             query ──► normalize ─┴─► bm25 | vector | hybrid (RRF) ──► results
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration: data dir, thresholds, embedding modalities
//! - [`models`] - `CodeUnit`, its text views, results and request/response types
//! - [`error`] - Typed engine errors
//! - [`git`] - Repository identifiers, cloning, checkout guard, file walking and file tree
//! - [`chunking`] - Python functions via tree-sitter, heuristic declarations, paragraph chunks
//! - [`search::bm25`] - In-memory BM25 index powered by tantivy
//! - [`search::vector`] - Exact flat L2 vector index
//! - [`search::hybrid`] - Reciprocal Rank Fusion across modalities
//! - [`search::query`] - Query normalization, modality dispatch and scoring
//! - [`llm::embeddings`] - Embedding providers: Ollama, OpenAI-compatible, offline hashing
//! - [`engine`] - Ingest, reindex and search over the live session
//! - [`state`] - Session store and shared application state
//! - [`api`] - Axum HTTP handlers

pub mod api;
pub mod chunking;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
