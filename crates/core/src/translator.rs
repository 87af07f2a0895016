//! Event translation from engine hooks to host callbacks.
//!
//! [`Translator`] is what a session hands to its view as [`ViewHooks`] and
//! [`SchemeHandler`]. It holds only a weak reference to the session and
//! checks the detached flag before doing anything, so hooks that fire during
//! or after teardown are dropped.

use std::sync::{Arc, Weak};

use wv_protocol::{NavigationStatus, NavigationType, PermissionVerdict, SchemeRequest, SchemeResponse};

use crate::callbacks::{
	DownloadStarted, NavigationCompleted, PermissionRequested, PolicyRequest, WebMessage,
};
use crate::engine::{
	DownloadInfo, EngineError, ErrorKind, PermissionRequest, PolicyAction, PolicyDecision,
	PolicyKind, SchemeHandler, SchemeReply, ViewHooks,
};
use crate::session::SessionInner;

/// Address reported when the engine gives none.
const BLANK: &str = "about:blank";

pub(crate) struct Translator {
	session: Weak<SessionInner>,
}

impl Translator {
	pub(crate) fn new(session: Weak<SessionInner>) -> Self {
		Self { session }
	}

	/// The session, unless it is gone or detached.
	fn live(&self) -> Option<Arc<SessionInner>> {
		self.session
			.upgrade()
			.filter(|session| !session.is_detached())
	}
}

impl ViewHooks for Translator {
	fn decide_policy(&self, action: &PolicyAction, decision: Box<dyn PolicyDecision>) -> bool {
		let Some(session) = self.live() else {
			decision.deny();
			return true;
		};

		let (is_main_frame, is_new_window, navigation_type) = match &action.kind {
			PolicyKind::NewWindow => (false, true, NavigationType::LinkClicked),
			PolicyKind::Navigation {
				frame_name,
				navigation_type,
			} => (frame_name.is_none(), false, *navigation_type),
			PolicyKind::Response => return false,
		};

		if !session.callbacks.has_policy_handler() {
			if is_new_window {
				tracing::debug!(uri = %action.uri, "denying new window without policy handler");
				decision.deny();
			} else {
				decision.allow();
			}
			return true;
		}

		let id = session.policies.register(decision);
		tracing::debug!(%id, uri = %action.uri, is_new_window, "policy request");
		session.callbacks.policy_request(&PolicyRequest {
			id,
			uri: action.uri.clone(),
			is_main_frame,
			is_new_window,
			navigation_type,
		});
		true
	}

	fn load_finished(&self) {
		let Some(session) = self.live() else {
			return;
		};
		let uri = session.current_uri().unwrap_or_else(|| BLANK.to_string());
		session.callbacks.navigation_completed(&NavigationCompleted {
			uri,
			status: NavigationStatus::Success,
			error_code: 0,
			message: String::new(),
		});
	}

	fn load_failed(&self, failing_uri: Option<&str>, error: Option<&EngineError>) {
		let Some(session) = self.live() else {
			return;
		};
		let event = NavigationCompleted {
			uri: failing_uri.unwrap_or(BLANK).to_string(),
			status: classify_error(error),
			error_code: error.map_or(0, |err| err.code),
			message: error.map_or_else(|| "Unknown error".to_string(), |err| err.message.clone()),
		};
		tracing::debug!(uri = %event.uri, status = ?event.status, "load failed");
		session.callbacks.navigation_completed(&event);
	}

	fn load_failed_tls(&self, failing_uri: Option<&str>, errors: u32) {
		let Some(session) = self.live() else {
			return;
		};
		session.callbacks.navigation_completed(&NavigationCompleted {
			uri: failing_uri.unwrap_or(BLANK).to_string(),
			status: NavigationStatus::Ssl,
			error_code: i64::from(errors),
			message: "TLS certificate error".to_string(),
		});
	}

	fn script_message(&self, body: &str) {
		let Some(session) = self.live() else {
			return;
		};
		let origin = session
			.current_uri()
			.map(|uri| origin_of(&uri).to_string())
			.unwrap_or_default();
		session.callbacks.message(&WebMessage {
			body: body.to_string(),
			origin,
		});
	}

	fn download_started(&self, download: &DownloadInfo) {
		let Some(session) = self.live() else {
			return;
		};
		session.callbacks.download(&DownloadStarted {
			uri: download.uri.clone(),
			suggested_filename: download.suggested_filename.clone().unwrap_or_default(),
			mime_type: download.mime_type.clone().unwrap_or_default(),
			content_length: download.content_length.filter(|len| *len > 0).unwrap_or(-1),
		});
	}

	fn permission_requested(&self, request: Box<dyn PermissionRequest>) -> bool {
		let Some(session) = self.live() else {
			return false;
		};
		let event = PermissionRequested {
			kind: request.kind(),
			origin: session.current_uri().unwrap_or_default(),
		};
		match session.callbacks.permission(&event) {
			Some(PermissionVerdict::Allow) => {
				request.allow();
				true
			}
			Some(PermissionVerdict::Deny) => {
				request.deny();
				true
			}
			Some(PermissionVerdict::Default) | None => false,
		}
	}
}

impl SchemeHandler for Translator {
	fn handle(&self, request: &SchemeRequest) -> SchemeReply {
		let Some(session) = self.live() else {
			return SchemeReply::not_found();
		};
		match session.callbacks.scheme_request(request) {
			Some(SchemeResponse {
				data: Some(body),
				mime_type,
				status,
			}) => SchemeReply::Data {
				body,
				mime_type: mime_type
					.filter(|mime| !mime.is_empty())
					.unwrap_or_else(|| SchemeResponse::DEFAULT_MIME_TYPE.to_string()),
				status: if status > 0 { status } else { 200 },
			},
			_ => {
				tracing::debug!(uri = %request.uri, "custom scheme request not handled");
				SchemeReply::not_found()
			}
		}
	}
}

/// Maps an engine load error to a navigation status.
///
/// Never produces `Success` or `Timeout`.
pub fn classify_error(error: Option<&EngineError>) -> NavigationStatus {
	let Some(error) = error else {
		return NavigationStatus::Failure;
	};
	match error.kind {
		ErrorKind::Cancelled => NavigationStatus::Canceled,
		ErrorKind::Transport | ErrorKind::UnknownProtocol | ErrorKind::NetworkFailed => {
			NavigationStatus::Network
		}
		ErrorKind::Policy => NavigationStatus::Canceled,
		ErrorKind::TlsBadCertificate | ErrorKind::TlsNotTls | ErrorKind::TlsCertificateRequired => {
			NavigationStatus::Ssl
		}
		ErrorKind::Other => NavigationStatus::Failure,
	}
}

/// Returns `scheme://host[:port]` of `uri`.
///
/// The whole address when it has no path; empty when it has no `://`.
pub fn origin_of(uri: &str) -> &str {
	let Some(separator) = uri.find("://") else {
		return "";
	};
	let host_start = separator + 3;
	match uri[host_start..].find('/') {
		Some(path_start) => &uri[..host_start + path_start],
		None => uri,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_origin_of() {
		assert_eq!(origin_of("https://example.com/a/b?c"), "https://example.com");
		assert_eq!(origin_of("http://localhost:8080/"), "http://localhost:8080");
		assert_eq!(origin_of("app://bundle"), "app://bundle");
		assert_eq!(origin_of("about:blank"), "");
		assert_eq!(origin_of(""), "");
	}

	#[test]
	fn test_classify_precedence() {
		let err = |kind| EngineError::new(kind, 7, "x");
		assert_eq!(classify_error(None), NavigationStatus::Failure);
		assert_eq!(classify_error(Some(&err(ErrorKind::Cancelled))), NavigationStatus::Canceled);
		assert_eq!(classify_error(Some(&err(ErrorKind::Transport))), NavigationStatus::Network);
		assert_eq!(
			classify_error(Some(&err(ErrorKind::UnknownProtocol))),
			NavigationStatus::Network
		);
		assert_eq!(classify_error(Some(&err(ErrorKind::NetworkFailed))), NavigationStatus::Network);
		assert_eq!(classify_error(Some(&err(ErrorKind::Policy))), NavigationStatus::Canceled);
		assert_eq!(
			classify_error(Some(&err(ErrorKind::TlsBadCertificate))),
			NavigationStatus::Ssl
		);
		assert_eq!(classify_error(Some(&err(ErrorKind::TlsNotTls))), NavigationStatus::Ssl);
		assert_eq!(
			classify_error(Some(&err(ErrorKind::TlsCertificateRequired))),
			NavigationStatus::Ssl
		);
		assert_eq!(classify_error(Some(&err(ErrorKind::Other))), NavigationStatus::Failure);
	}

	#[test]
	fn test_classify_never_success_or_timeout() {
		let kinds = [
			ErrorKind::Cancelled,
			ErrorKind::Transport,
			ErrorKind::UnknownProtocol,
			ErrorKind::NetworkFailed,
			ErrorKind::Policy,
			ErrorKind::TlsBadCertificate,
			ErrorKind::TlsNotTls,
			ErrorKind::TlsCertificateRequired,
			ErrorKind::Other,
		];
		for kind in kinds {
			let status = classify_error(Some(&EngineError::new(kind, 0, "")));
			assert!(matches!(
				status,
				NavigationStatus::Failure
					| NavigationStatus::Canceled
					| NavigationStatus::Network
					| NavigationStatus::Ssl
			));
		}
	}
}
