// Copyright 2026 Prodex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prodex: product page acquisition and JSON relevance for LLM-backed extraction.
//!
//! A [`cascade::Cascade`] tries extraction strategies in order until one
//! produces a [`PageRecord`]. Embedded JSON found on the page is ranked,
//! sanitized, and fitted to a token budget by [`relevance`], and
//! [`prompt::PromptAssembler`] turns the result into the text handed to a
//! [`pipeline::StructuredExtractor`].

pub mod acquisition;
pub mod cascade;
pub mod config;
pub mod error;
pub mod ip;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod relevance;
pub mod renderer;
pub mod types;

pub use acquisition::{BrowserSimulation, ExtractionStrategy, HeaderSpoofedFetch, PlainFetch};
pub use cascade::{Cascade, CascadeOutcome, CascadeState, DEFAULT_CASCADE};
pub use config::Settings;
pub use error::{
    AcquisitionError, CascadeError, ConfigurationError, ExtractorError, MalformedDataError,
    ScrapeError,
};
pub use ip::{DirectIp, IpStrategy, ProxiedIp, RequestOptions};
pub use pipeline::{Pipeline, ScrapeReport, ScrapeRequest, StructuredExtractor};
pub use prompt::{AssembledPrompt, Framing, PromptAssembler};
pub use registry::{Capabilities, StrategyDescriptor, StrategyRegistry};
pub use relevance::JsonSection;
pub use types::PageRecord;
