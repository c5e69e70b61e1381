// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Data source names: where envelopes are delivered and with which key.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::BeaconError;

/// A parsed DSN of the form `{scheme}://{public_key}@{host}[:port]/{path/}{project_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
	scheme: String,
	public_key: String,
	host: String,
	port: Option<u16>,
	path: String,
	project_id: String,
	raw: String,
}

impl Dsn {
	pub fn public_key(&self) -> &str {
		&self.public_key
	}

	pub fn project_id(&self) -> &str {
		&self.project_id
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	/// The endpoint envelopes are posted to.
	pub fn envelope_url(&self) -> String {
		let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
		format!(
			"{}://{}{}{}api/{}/envelope/",
			self.scheme, self.host, port, self.path, self.project_id
		)
	}

	/// Value for the `X-Beacon-Auth` request header.
	pub fn auth_header(&self, client: &str) -> String {
		format!(
			"Beacon beacon_version=7, beacon_key={}, beacon_client={}",
			self.public_key, client
		)
	}
}

impl FromStr for Dsn {
	type Err = BeaconError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let url = Url::parse(s).map_err(|e| BeaconError::InvalidDsn(e.to_string()))?;

		let scheme = url.scheme().to_string();
		if scheme != "http" && scheme != "https" {
			return Err(BeaconError::InvalidDsn(format!("unsupported scheme: {scheme}")));
		}

		let public_key = url.username().to_string();
		if public_key.is_empty() {
			return Err(BeaconError::InvalidDsn("missing public key".to_string()));
		}

		let host = url
			.host_str()
			.ok_or_else(|| BeaconError::InvalidDsn("missing host".to_string()))?
			.to_string();

		let full_path = url.path().trim_end_matches('/');
		let (path, project_id) = match full_path.rfind('/') {
			Some(idx) => (&full_path[..=idx], &full_path[idx + 1..]),
			None => ("/", full_path),
		};
		if project_id.is_empty() {
			return Err(BeaconError::InvalidDsn("missing project id".to_string()));
		}

		Ok(Self {
			scheme,
			public_key,
			host,
			port: url.port(),
			path: path.to_string(),
			project_id: project_id.to_string(),
			raw: s.to_string(),
		})
	}
}

impl fmt::Display for Dsn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.raw)
	}
}
