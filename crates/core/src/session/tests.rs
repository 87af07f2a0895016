use std::sync::Arc;

use wv_protocol::{SessionOptions, SurfaceId};

use super::*;
use crate::callbacks::Callbacks;
use crate::testing::{Call, HeadlessEngine};

fn engine() -> Arc<HeadlessEngine> {
	HeadlessEngine::new().unwrap()
}

#[test]
fn test_config_from_options() {
	let options = SessionOptions::new()
		.user_agent("wv/1")
		.custom_scheme("App")
		.custom_scheme("app")
		.custom_scheme("1bad")
		.custom_scheme("res");
	let config = SessionConfig::from_options(&options);

	assert_eq!(config.user_agent.as_deref(), Some("wv/1"));
	let schemes: Vec<&str> = config.custom_schemes.iter().map(String::as_str).collect();
	assert_eq!(schemes, vec!["app", "res"]);
}

#[test]
fn test_attach_builds_view_in_order() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());
	assert_eq!(session.state(), SessionState::Created);

	assert!(session.attach(SurfaceId(9)));
	assert_eq!(session.state(), SessionState::Attached);
	assert_eq!(
		engine.calls(),
		vec![
			Call::CreateHost(SurfaceId(9)),
			Call::CreateContentManager,
			Call::RegisterMessageHandler(MESSAGE_HANDLER_NAME.to_string()),
			Call::CreateView { ephemeral: false },
			Call::SetDeveloperExtras(false),
			Call::SetJavascriptEnabled(true),
			Call::Connect,
			Call::Embed,
			Call::Show,
		]
	);
	let host = engine.host().unwrap();
	assert!(host.is_embedded());
	assert!(host.is_shown());
	assert!(engine.thread_violations().is_empty());
}

#[test]
fn test_attach_applies_config() {
	let engine = engine();
	let options = SessionOptions::new()
		.enable_dev_tools(true)
		.ephemeral(true)
		.user_agent("wv-test/1.0")
		.custom_scheme("app");
	let session = Session::with_options(engine.clone(), Callbacks::new(), options);
	assert!(session.attach(SurfaceId(1)));

	let view = engine.view().unwrap();
	assert!(view.is_ephemeral());
	assert_eq!(view.schemes(), vec!["app".to_string()]);
	let settings = view.settings();
	assert!(settings.developer_extras);
	assert!(settings.javascript_enabled);
	assert_eq!(settings.user_agent.as_deref(), Some("wv-test/1.0"));
}

#[test]
fn test_failed_view_creation_cleans_up() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());

	engine.fail_next_view();
	assert!(!session.attach(SurfaceId(1)));
	assert_eq!(session.state(), SessionState::Created);
	assert!(engine.host().unwrap().is_destroyed());
	assert!(engine.content().unwrap().message_handlers().is_empty());

	assert!(session.attach(SurfaceId(1)));
	assert_eq!(session.state(), SessionState::Attached);
}

#[test]
fn test_failed_embed_cleans_up() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());

	engine.fail_next_embed();
	assert!(!session.attach(SurfaceId(1)));
	assert_eq!(session.state(), SessionState::Created);
	assert_eq!(engine.count_calls(|call| *call == Call::DestroyHost), 1);
	assert!(engine.content().unwrap().message_handlers().is_empty());
}

#[test]
fn test_failed_host_leaves_created() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());

	engine.fail_next_host();
	assert!(!session.attach(SurfaceId(1)));
	assert_eq!(session.state(), SessionState::Created);
	assert_eq!(engine.count_calls(|call| *call == Call::CreateContentManager), 0);
}

#[test]
fn test_attach_rejects_null_surface_and_reattach() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());

	assert!(!session.attach(SurfaceId(0)));
	assert!(engine.calls().is_empty());

	assert!(session.attach(SurfaceId(1)));
	assert!(!session.attach(SurfaceId(2)));
	assert_eq!(engine.count_calls(|call| matches!(call, Call::CreateHost(_))), 1);
}

#[test]
fn test_detach_is_idempotent() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());
	assert!(session.attach(SurfaceId(1)));

	session.detach();
	session.detach();
	assert_eq!(session.state(), SessionState::Detached);
	assert_eq!(engine.count_calls(|call| *call == Call::DestroyHost), 1);
	assert_eq!(
		engine.count_calls(|call| matches!(call, Call::UnregisterMessageHandler(_))),
		1
	);
	assert!(!session.attach(SurfaceId(1)));
	assert!(engine.thread_violations().is_empty());
}

#[test]
fn test_detach_before_attach_is_terminal() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());

	session.detach();
	assert_eq!(session.state(), SessionState::Detached);
	assert!(!session.attach(SurfaceId(1)));
	assert!(engine.calls().is_empty());
}

#[test]
fn test_destroy_clears_config() {
	let engine = engine();
	let session = Session::with_options(
		engine.clone(),
		Callbacks::new(),
		SessionOptions::new().user_agent("ua").custom_scheme("app"),
	);
	let inner = Arc::clone(&session.inner);

	session.destroy();
	assert!(inner.is_detached());
	assert_eq!(*inner.config.lock(), SessionConfig::default());
}

#[test]
fn test_attach_time_settings_locked_after_attach() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());

	assert!(session.set_ephemeral(true));
	assert!(session.register_custom_scheme("App"));
	assert!(session.register_custom_scheme("app"));
	assert!(!session.register_custom_scheme("not a scheme"));
	assert_eq!(session.config().custom_schemes.len(), 1);

	assert!(session.attach(SurfaceId(1)));
	assert!(!session.set_ephemeral(false));
	assert!(!session.register_custom_scheme("res"));
	assert!(session.config().ephemeral);
}

#[test]
fn test_live_settings_reach_view() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());
	assert!(session.attach(SurfaceId(1)));

	session.set_user_agent(Some("live/2"));
	session.set_developer_tools_enabled(true);
	engine.flush().unwrap();

	let settings = engine.view().unwrap().settings();
	assert_eq!(settings.user_agent.as_deref(), Some("live/2"));
	assert!(settings.developer_extras);
	assert!(session.config().enable_dev_tools);
}

#[test]
fn test_session_is_send_and_sync() {
	fn assert_send_sync<T: Send + Sync>() {}
	assert_send_sync::<Session>();
}
