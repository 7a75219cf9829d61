// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Snapshot RPC configuration.
//!
//! Two sections share this module: `[rpc]` configures the server side on the
//! control plane, `[upstream]` configures the client side on the
//! authorization servers. Both ends authenticate with mutual TLS; the TLS
//! paths are optional so local development can run in the clear.

use serde::{Deserialize, Serialize};

const DEFAULT_RPC_ADDR: &str = "0.0.0.0:8071";
const DEFAULT_UPSTREAM_ENDPOINT: &str = "http://127.0.0.1:8071";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RpcConfigLayer {
	pub addr: Option<String>,
	pub cert: Option<String>,
	pub key: Option<String>,
	pub client_ca: Option<String>,
}

impl RpcConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.addr.is_some() {
			self.addr = other.addr;
		}
		if other.cert.is_some() {
			self.cert = other.cert;
		}
		if other.key.is_some() {
			self.key = other.key;
		}
		if other.client_ca.is_some() {
			self.client_ca = other.client_ca;
		}
	}

	pub fn finalize(self) -> RpcConfig {
		RpcConfig {
			addr: self.addr.unwrap_or_else(|| DEFAULT_RPC_ADDR.to_string()),
			cert: self.cert,
			key: self.key,
			client_ca: self.client_ca,
		}
	}
}

/// Server-side snapshot RPC settings (control plane).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcConfig {
	pub addr: String,
	pub cert: Option<String>,
	pub key: Option<String>,
	pub client_ca: Option<String>,
}

impl Default for RpcConfig {
	fn default() -> Self {
		RpcConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfigLayer {
	pub endpoint: Option<String>,
	pub ca: Option<String>,
	pub cert: Option<String>,
	pub key: Option<String>,
	pub tls_domain: Option<String>,
}

impl UpstreamConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.ca.is_some() {
			self.ca = other.ca;
		}
		if other.cert.is_some() {
			self.cert = other.cert;
		}
		if other.key.is_some() {
			self.key = other.key;
		}
		if other.tls_domain.is_some() {
			self.tls_domain = other.tls_domain;
		}
	}

	pub fn finalize(self) -> UpstreamConfig {
		UpstreamConfig {
			endpoint: self
				.endpoint
				.unwrap_or_else(|| DEFAULT_UPSTREAM_ENDPOINT.to_string()),
			ca: self.ca,
			cert: self.cert,
			key: self.key,
			tls_domain: self.tls_domain,
		}
	}
}

/// Client-side snapshot RPC settings (authorization servers).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfig {
	pub endpoint: String,
	pub ca: Option<String>,
	pub cert: Option<String>,
	pub key: Option<String>,
	pub tls_domain: Option<String>,
}

impl Default for UpstreamConfig {
	fn default() -> Self {
		UpstreamConfigLayer::default().finalize()
	}
}
