// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// Well-known pub/sub channel carrying cache invalidation notifications.
///
/// The control plane publishes here after every successful mutation of
/// secrets or policies; every authorization replica subscribes.
pub const NOTIFICATIONS_CHANNEL: &str = "warden.cluster.notifications";

/// The kind of control-plane mutation a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationCommand {
	PolicyChanged,
	SecretChanged,
	NoOp,
}

/// Cache invalidation message, JSON-encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
	pub command: NotificationCommand,
}

impl Notification {
	pub fn new(command: NotificationCommand) -> Self {
		Self { command }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_format_uses_bare_command_names() {
		let n = Notification::new(NotificationCommand::PolicyChanged);
		assert_eq!(
			serde_json::to_string(&n).unwrap(),
			r#"{"command":"PolicyChanged"}"#
		);

		let parsed: Notification = serde_json::from_str(r#"{"command":"SecretChanged"}"#).unwrap();
		assert_eq!(parsed.command, NotificationCommand::SecretChanged);
	}
}
