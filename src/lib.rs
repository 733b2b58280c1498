//! Converts legacy media and embed markup in HTML fragments into AMP
//! custom elements, then validates the result against a strict
//! tag/attribute allowlist.
//!
//! The pipeline per call: parse the fragment into an arena tree, run
//! the configured converters in order, run the allowlist validator,
//! serialize. Domain problems surface as [`ValidationError`]s resolved
//! by the caller's policy; the only hard failures are unreadable or
//! non-HTML payloads.

#![warn(clippy::all)]
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate html5ever;
#[macro_use]
extern crate maplit;

use std::cell::Cell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::str;

pub mod actions;
pub mod arena_dom;
pub mod collaborators;
pub mod config;
pub mod converters;
pub mod css_parser;
pub mod errors;
pub mod layout;
pub mod validator;

use arena_dom::{fragment_root, parse_html_fragment, serialize_fragment, Node};
use converters::Pass;

pub use collaborators::{DimensionLookup, EmbedFetcher, EmbedMetadata, PixelDimensions};
pub use config::amp::AMP_ALLOWLIST;
pub use config::{AllowlistSpec, AttrRule, TagSpec};
pub use converters::{ConverterKind, EmbedKind};
pub use errors::{ConvertError, ErrorKind, NodeType, ReportedError, ValidationError};
pub use layout::{Dimension, Layout};

use errors::ErrorSink;

/// Per-call configuration. Passed by reference into every converter
/// invocation; there is no process-wide state.
#[derive(Default)]
pub struct ConversionPolicy {
    pub add_noscript_fallback: bool,
    pub add_placeholder: bool,
    pub require_https_src: bool,
    pub content_max_width: Option<u32>,
    pub current_origin: Option<String>,
    pub alias_origin: Option<String>,
    pub align_wide_support: bool,
    pub validation_error_callback: Option<Box<dyn Fn(&ValidationError) -> bool>>,
}

/// What a transformation produced besides the serialized fragment:
/// the ordered findings with their final verdicts, and the census of
/// AMP custom elements now present (the caller picks companion
/// scripts from it).
#[derive(Debug)]
pub struct Conversion {
    pub errors: Vec<ReportedError>,
    pub custom_elements: HashMap<String, bool>,
}

/// The embed converters go first so raw third-party markup is already
/// rewritten when the generic passes run.
pub fn default_converters() -> Vec<ConverterKind> {
    vec![
        ConverterKind::Embed(EmbedKind::Facebook),
        ConverterKind::Embed(EmbedKind::Twitter),
        ConverterKind::Image,
        ConverterKind::Iframe,
        ConverterKind::Video,
    ]
}

pub struct Converter<'arena> {
    arena: typed_arena::Arena<Node<'arena>>,
    policy: &'arena ConversionPolicy,
    converters: Vec<ConverterKind>,
    allowlist: &'arena AllowlistSpec,
    dimensions: Option<&'arena dyn DimensionLookup>,
    embeds: Option<&'arena dyn EmbedFetcher>,
    force_sanitize: Cell<Option<bool>>,
}

impl<'arena> Converter<'arena> {
    pub fn new(
        policy: &'arena ConversionPolicy,
        converters: Vec<ConverterKind>,
        allowlist: &'arena AllowlistSpec,
    ) -> Converter<'arena> {
        Converter {
            arena: typed_arena::Arena::new(),
            policy,
            converters,
            allowlist,
            dimensions: None,
            embeds: None,
            force_sanitize: Cell::new(None),
        }
    }

    pub fn with_dimension_lookup(mut self, lookup: &'arena dyn DimensionLookup) -> Self {
        self.dimensions = Some(lookup);
        self
    }

    pub fn with_embed_fetcher(mut self, fetcher: &'arena dyn EmbedFetcher) -> Self {
        self.embeds = Some(fetcher);
        self
    }

    /// Overrides every sanitize-vs-report decision for exactly the
    /// next top-level call: `Some(true)` removes everything flagged,
    /// `Some(false)` keeps everything flagged. Consumed and cleared by
    /// that call.
    pub fn force_sanitize(&self, force: Option<bool>) {
        self.force_sanitize.set(force);
    }

    /// Parses `input`, runs the configured converters in order, runs
    /// the allowlist validator, and writes the serialized fragment to
    /// `output`.
    pub fn convert_fragment(
        &'arena self,
        input: &mut impl Read,
        output: &mut impl Write,
    ) -> Result<Conversion, ConvertError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        str::from_utf8(&bytes)?;

        let document = parse_html_fragment(&self.arena, &bytes);
        let root = fragment_root(document);

        let sink = ErrorSink::new(self.policy, self.force_sanitize.take());
        let pass = Pass {
            arena: &self.arena,
            root,
            policy: self.policy,
            errors: &sink,
            dimensions: self.dimensions,
            embeds: self.embeds,
        };
        for converter in &self.converters {
            converter.run(&pass);
        }
        let custom_elements = validator::validate(root, self.allowlist, &sink);

        serialize_fragment(root, output)?;
        Ok(Conversion {
            errors: sink.into_reported(),
            custom_elements,
        })
    }
}
