//! Symbol filtering, identification and cross-reference resolution for API
//! documentation.
//!
//! ```text
//! TypeGraph ──▶ api_filter ──▶ namer ──▶ harvest ─┐
//!                                                 ├─▶ TargetDictionary ──▶ resolver ──▶ LinkText
//! source units (XML) ──▶ source_unit ─────────────┘          ▲
//!                                                            │
//! identifier text ──▶ reference_parser ──▶ Reference ────────┘
//! ```

pub mod api_filter;
pub mod config;
pub mod diagnostics;
pub mod dictionary;
pub mod error;
pub mod filter;
pub mod grammar;
pub mod graph;
pub mod harvest;
pub mod link_text;
pub mod namer;
pub mod reference;
pub mod reference_builder;
pub mod reference_parser;
pub mod resolver;
pub mod snapshot;
pub mod source_unit;
pub mod target;
pub mod visibility;
