// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named sink registry.
//!
//! The registry is a plain map from type name to constructor, populated by
//! an explicit [`register_default_sinks`] call at process start. No
//! side-effecting module initialization, no hidden ordering.

use std::collections::HashMap;

use warden_config::SinkConfig;

use crate::sink::{ConfiguredSink, Sink, SinkError};
use crate::sinks;

/// Builds a sink instance from its `meta` table.
pub type SinkConstructor = fn(&HashMap<String, String>) -> Result<Box<dyn Sink>, SinkError>;

#[derive(Default)]
pub struct SinkRegistry {
	constructors: HashMap<String, SinkConstructor>,
}

impl SinkRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, name: impl Into<String>, constructor: SinkConstructor) {
		self.constructors.insert(name.into(), constructor);
	}

	pub fn names(&self) -> Vec<&str> {
		self.constructors.keys().map(String::as_str).collect()
	}

	/// Instantiates and configures the sink a [`SinkConfig`] declares.
	pub fn build(&self, config: &SinkConfig) -> Result<ConfiguredSink, SinkError> {
		let constructor = self
			.constructors
			.get(&config.kind)
			.ok_or_else(|| SinkError::UnknownType(config.kind.clone()))?;

		let sink = constructor(&config.meta)?;
		Ok(ConfiguredSink::new(sink, config))
	}
}

/// Registers the sinks shipped with the pump.
pub fn register_default_sinks(registry: &mut SinkRegistry) {
	registry.register("tracing", sinks::tracing::construct);
	registry.register("file", sinks::file::construct);
	registry.register("http", sinks::http::construct);
}
