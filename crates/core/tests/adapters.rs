// Integration tests for the asynchronous operation adapters and commands.

mod common;

use std::sync::Arc;
use std::thread;

use common::{Inbox, attached, attached_with, engine};
use wv::testing::Call;
use wv::{
	Callbacks, Cookie, CookieRecord, EngineError, Error, FindOptions, FindResult, ScriptRequestId,
	ScriptResult, Session, SessionOptions, SurfaceId,
};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn script_callbacks(inbox: &Inbox<ScriptResult>) -> Callbacks {
	let tx = inbox.sender();
	Callbacks::new().on_script_result(move |result| {
		let _ = tx.send(result.clone());
	})
}

#[test]
fn test_script_results_echo_id() {
	let engine = engine();
	let inbox = Inbox::new();
	let session = attached(&engine, script_callbacks(&inbox));
	engine.set_script_result(
		"missing()",
		Err(EngineError::other("ReferenceError: missing is not defined")),
	);

	session.evaluate_script(ScriptRequestId(7), "6 * 7").unwrap();
	let value = inbox.recv();
	assert_eq!(value.id, ScriptRequestId(7));
	assert_eq!(value.value.as_deref(), Some("6 * 7"));
	assert_eq!(value.error, None);

	session.evaluate_script(ScriptRequestId(8), "undefined").unwrap();
	let empty = inbox.recv();
	assert_eq!(empty.id, ScriptRequestId(8));
	assert_eq!((empty.value, empty.error), (None, None));

	session.evaluate_script(ScriptRequestId(9), "missing()").unwrap();
	let failed = inbox.recv();
	assert_eq!(failed.value, None);
	assert_eq!(
		failed.error.as_deref(),
		Some("ReferenceError: missing is not defined")
	);
	assert_eq!(session.pending_operation_count(), 0);
}

#[test]
fn test_script_preconditions() {
	let engine = engine();
	let inbox = Inbox::new();
	let session = Session::new(engine.clone(), script_callbacks(&inbox));

	assert!(matches!(
		session.evaluate_script(ScriptRequestId(1), "1"),
		Err(Error::NotAttached)
	));
	assert!(session.attach(SurfaceId(1)));
	assert!(matches!(
		session.evaluate_script(ScriptRequestId(0), "1"),
		Err(Error::InvalidArgument(_))
	));
	session.detach();
	let err = session.evaluate_script(ScriptRequestId(2), "1").unwrap_err();
	assert!(err.is_detached());

	engine.flush().unwrap();
	assert!(inbox.drain().is_empty());
	assert_eq!(engine.count_calls(|call| matches!(call, Call::EvaluateScript(_))), 0);
}

#[test]
fn test_script_detached_mid_flight() {
	let engine = engine();
	let inbox = Inbox::new();
	let session = attached(&engine, script_callbacks(&inbox));

	engine.hold_completions(true);
	session.evaluate_script(ScriptRequestId(3), "1 + 1").unwrap();
	assert_eq!(session.pending_operation_count(), 1);

	session.detach();
	let result = inbox.recv();
	assert_eq!(result.id, ScriptRequestId(3));
	assert_eq!(result.value, None);
	assert_eq!(result.error.as_deref(), Some("Detached"));

	assert_eq!(engine.release_held(), 1);
	engine.flush().unwrap();
	assert!(inbox.drain().is_empty());
}

#[test]
fn test_cookie_round_trip() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	let done = Inbox::new();

	let cookie = Cookie::new("sid", "abc", "example.com")
		.path("/app")
		.expires(1_900_000_000.5)
		.secure(true)
		.http_only(true);
	session.set_cookie(cookie, done.once());
	assert_eq!(done.recv(), Ok(()));

	let fetched = Inbox::new();
	session.cookies("https://www.example.com/app/page", fetched.once());
	let records = CookieRecord::parse_array(&fetched.recv()).unwrap();
	assert_eq!(records.len(), 1);
	let record = &records[0];
	assert_eq!(record.name, "sid");
	assert_eq!(record.value, "abc");
	assert_eq!(record.path, "/app");
	assert!((record.expires - 1_900_000_000.5).abs() < 1e-3);
	assert!(record.is_secure);
	assert!(record.is_http_only);

	session.cookies("https://other.example.org/", fetched.once());
	assert_eq!(fetched.recv(), CookieRecord::EMPTY_ARRAY);
}

#[test]
fn test_cookie_session_expiry_and_default_path() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	let done = Inbox::new();

	session.set_cookie(
		Cookie::new("tmp", "1", "example.com").path("").expires(-5.0),
		done.once(),
	);
	assert_eq!(done.recv(), Ok(()));

	let fetched = Inbox::new();
	session.cookies("https://example.com/", fetched.once());
	let records = CookieRecord::parse_array(&fetched.recv()).unwrap();
	assert_eq!(records[0].expires, CookieRecord::SESSION_EXPIRY);
	assert_eq!(records[0].path, "/");
}

#[test]
fn test_cookie_non_finite_expiry_stored_as_session() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	let done = Inbox::new();

	session.set_cookie(Cookie::new("nan", "1", "example.com").expires(f64::NAN), done.once());
	session.set_cookie(
		Cookie::new("inf", "1", "example.com").expires(f64::INFINITY),
		done.once(),
	);
	session.set_cookie(
		Cookie::new("ninf", "1", "example.com").expires(f64::NEG_INFINITY),
		done.once(),
	);
	for _ in 0..3 {
		assert_eq!(done.recv(), Ok(()));
	}
	assert!(engine.persistent_cookies().iter().all(|cookie| cookie.is_session()));

	let fetched = Inbox::new();
	session.cookies("https://example.com/", fetched.once());
	let records = CookieRecord::parse_array(&fetched.recv()).unwrap();
	assert_eq!(records.len(), 3);
	assert!(records.iter().all(|record| record.expires == CookieRecord::SESSION_EXPIRY));
}

#[test]
fn test_cookie_delete_and_clear() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	let done = Inbox::new();

	session.set_cookie(Cookie::new("a", "1", "example.com"), done.once());
	session.set_cookie(Cookie::new("b", "2", "example.com"), done.once());
	session.delete_cookie("a", "example.com", "/", done.once());
	for _ in 0..3 {
		assert_eq!(done.recv(), Ok(()));
	}
	let names: Vec<String> = engine
		.persistent_cookies()
		.into_iter()
		.map(|cookie| cookie.name)
		.collect();
	assert_eq!(names, vec!["b".to_string()]);

	session.clear_cookies(done.once());
	assert_eq!(done.recv(), Ok(()));
	assert!(engine.persistent_cookies().is_empty());
	assert!(engine.calls().contains(&Call::ClearCookies));
}

#[test]
fn test_cookies_without_view() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());
	let fetched = Inbox::new();
	let done = Inbox::new();

	session.cookies("https://example.com/", fetched.once());
	session.set_cookie(Cookie::new("a", "1", "example.com"), done.once());
	session.clear_cookies(done.once());

	assert_eq!(fetched.recv(), CookieRecord::EMPTY_ARRAY);
	assert_eq!(done.recv(), Err("Detached".to_string()));
	assert_eq!(done.recv(), Err("Detached".to_string()));
	engine.flush().unwrap();
	assert!(fetched.drain().is_empty());
	assert!(done.drain().is_empty());
}

#[test]
fn test_cookie_fetch_error_reports_empty_array() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	engine.fail_cookies(true);

	let fetched = Inbox::new();
	session.cookies("https://example.com/", fetched.once());
	assert_eq!(fetched.recv(), CookieRecord::EMPTY_ARRAY);
}

#[test]
fn test_ephemeral_session_has_own_jar() {
	let engine = engine();
	let session = attached_with(&engine, Callbacks::new(), SessionOptions::new().ephemeral(true));
	let done = Inbox::new();

	session.set_cookie(Cookie::new("private", "1", "example.com"), done.once());
	assert_eq!(done.recv(), Ok(()));
	assert!(engine.persistent_cookies().is_empty());
	assert_eq!(engine.view().unwrap().cookies().len(), 1);
}

#[test]
fn test_cookie_fetch_detached_mid_flight() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	let fetched = Inbox::new();

	engine.hold_completions(true);
	session.cookies("https://example.com/", fetched.once());
	engine.flush().unwrap();
	assert_eq!(engine.held_count(), 1);

	session.detach();
	assert_eq!(fetched.recv(), CookieRecord::EMPTY_ARRAY);
	engine.release_held();
	engine.flush().unwrap();
	assert!(fetched.drain().is_empty());
}

#[test]
fn test_screenshot_encodes_png() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	let shots = Inbox::new();

	session.capture_screenshot(shots.once());
	let png = shots.recv().unwrap();
	assert_eq!(&png[..8], &PNG_SIGNATURE);

	let decoded = image::load_from_memory(&png).unwrap();
	assert_eq!((decoded.width(), decoded.height()), (4, 3));
}

#[test]
fn test_screenshot_failure_reports_none() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	engine.set_snapshot(None);

	let shots = Inbox::new();
	session.capture_screenshot(shots.once());
	assert_eq!(shots.recv(), None);

	engine.set_snapshot(Some(image::RgbaImage::new(0, 0)));
	session.capture_screenshot(shots.once());
	assert_eq!(shots.recv(), None);
}

#[test]
fn test_screenshot_unattached_resolves_once() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());
	let shots = Inbox::new();

	session.capture_screenshot(shots.once());
	assert_eq!(shots.recv(), None);
	engine.flush().unwrap();
	assert!(shots.drain().is_empty());
	assert_eq!(engine.count_calls(|call| *call == Call::Snapshot), 0);
}

#[test]
fn test_detach_resolves_every_in_flight_operation() {
	let engine = engine();
	let scripts = Inbox::new();
	let session = attached(&engine, script_callbacks(&scripts));
	engine.set_page_text("needle");

	let shots = Inbox::new();
	let cookies = Inbox::new();
	let finds = Inbox::new();

	engine.hold_completions(true);
	session.evaluate_script(ScriptRequestId(1), "1").unwrap();
	session.capture_screenshot(shots.once());
	session.cookies("https://example.com/", cookies.once());
	session.find_text("needle", false, true, finds.once());
	engine.flush().unwrap();
	assert_eq!(session.pending_operation_count(), 4);

	session.detach();
	assert_eq!(session.pending_operation_count(), 0);
	assert_eq!(scripts.recv().error.as_deref(), Some("Detached"));
	assert_eq!(shots.recv(), None);
	assert_eq!(cookies.recv(), CookieRecord::EMPTY_ARRAY);
	assert_eq!(finds.recv(), FindResult::NOT_FOUND);

	engine.release_held();
	engine.flush().unwrap();
	assert!(scripts.drain().is_empty());
	assert!(shots.drain().is_empty());
	assert!(cookies.drain().is_empty());
	assert!(finds.drain().is_empty());
}

#[test]
fn test_find_counts_matches() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	engine.set_page_text("Rust is fast. rust is safe. RUST!");
	let finds = Inbox::new();

	session.find_text("rust", false, true, finds.once());
	assert_eq!(
		finds.recv(),
		FindResult {
			active_index: 0,
			total_matches: 3
		}
	);

	session.find_text("rust", true, false, finds.once());
	assert_eq!(finds.recv().total_matches, 1);

	session.find_text("go", false, true, finds.once());
	assert_eq!(finds.recv(), FindResult::NOT_FOUND);

	engine.flush().unwrap();
	assert!(finds.drain().is_empty());
	assert_eq!(engine.view().unwrap().find_listener_count(), 0);
	assert!(
		engine
			.calls()
			.contains(&Call::Search("rust".to_string(), FindOptions::new(true, false)))
	);
}

#[test]
fn test_overlapping_finds_resolve_separately() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	engine.set_page_text("rust rust rust");
	let first = Inbox::new();
	let second = Inbox::new();

	engine.hold_completions(true);
	session.find_text("rust", false, true, first.once());
	session.find_text("go", false, true, second.once());
	engine.flush().unwrap();

	assert_eq!(first.recv(), FindResult::NOT_FOUND);
	assert_eq!(engine.view().unwrap().find_listener_count(), 1);

	engine.hold_completions(false);
	engine.release_held();
	engine.flush().unwrap();
	assert_eq!(second.recv(), FindResult::NOT_FOUND);

	session.find_text("rust", false, true, second.once());
	assert_eq!(
		second.recv(),
		FindResult {
			active_index: 0,
			total_matches: 3
		}
	);

	engine.flush().unwrap();
	assert!(first.drain().is_empty());
	assert!(second.drain().is_empty());
	assert_eq!(engine.view().unwrap().find_listener_count(), 0);
}

#[test]
fn test_stop_find_resolves_pending_search() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	engine.set_page_text("needle in a haystack");
	let finds = Inbox::new();

	engine.hold_completions(true);
	session.find_text("needle", false, true, finds.once());
	engine.flush().unwrap();
	assert_eq!(engine.held_count(), 1);
	assert_eq!(session.pending_operation_count(), 1);

	session.stop_find();
	assert_eq!(finds.recv(), FindResult::NOT_FOUND);
	assert_eq!(session.pending_operation_count(), 0);

	engine.hold_completions(false);
	engine.release_held();
	engine.flush().unwrap();
	assert!(finds.drain().is_empty());
	assert_eq!(engine.view().unwrap().find_listener_count(), 0);
	assert!(engine.calls().contains(&Call::FinishFind));
}

#[test]
fn test_find_edge_cases() {
	let engine = engine();
	let finds = Inbox::new();

	let unattached = Session::new(engine.clone(), Callbacks::new());
	unattached.find_text("x", false, true, finds.once());
	assert_eq!(finds.recv(), FindResult::NOT_FOUND);

	let session = attached(&engine, Callbacks::new());
	session.find_text("", false, true, finds.once());
	assert_eq!(finds.recv(), FindResult::NOT_FOUND);
	assert_eq!(engine.count_calls(|call| matches!(call, Call::Search(..))), 0);

	session.stop_find();
	engine.flush().unwrap();
	assert!(engine.calls().contains(&Call::FinishFind));
}

#[test]
fn test_print_to_file_is_unsupported() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());
	let prints = Inbox::new();

	session.print_to_file(prints.once());
	assert_eq!(prints.recv(), None);
	assert!(prints.drain().is_empty());
}

#[test]
fn test_navigation_commands() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());

	assert!(!session.can_go_back());
	assert!(!session.go_back());
	assert!(matches!(session.navigate(""), Err(Error::InvalidArgument(_))));

	session.navigate("https://a.example/").unwrap();
	session.navigate("https://b.example/").unwrap();
	assert!(session.can_go_back());
	assert!(session.go_back());
	assert_eq!(session.current_uri().as_deref(), Some("https://a.example/"));
	assert!(session.can_go_forward());
	assert!(session.go_forward());
	assert_eq!(session.current_uri().as_deref(), Some("https://b.example/"));

	session
		.load_html("<p>hi</p>", Some("https://base.example/"))
		.unwrap();
	assert_eq!(session.current_uri().as_deref(), Some("https://base.example/"));
	assert!(session.reload());
	session.stop().unwrap();
	assert!(session.native_handle().is_some_and(|handle| handle != 0));

	let calls = engine.calls();
	assert!(calls.contains(&Call::Reload));
	assert!(calls.contains(&Call::StopLoading));
	assert!(calls.contains(&Call::LoadHtml {
		html: "<p>hi</p>".to_string(),
		base_uri: Some("https://base.example/".to_string()),
	}));
}

#[test]
fn test_commands_without_view() {
	let engine = engine();
	let session = Session::new(engine.clone(), Callbacks::new());

	assert!(matches!(session.navigate("https://a.example/"), Err(Error::NotAttached)));
	assert!(!session.reload());
	assert_eq!(session.native_handle(), None);
	assert_eq!(session.current_uri(), None);
	assert_eq!(session.zoom(), 1.0);

	assert!(session.attach(SurfaceId(1)));
	session.detach();
	let err = session.navigate("https://a.example/").unwrap_err();
	assert!(matches!(err, Error::Detached));
	assert_eq!(err.to_string(), "Detached");
	assert!(!session.go_forward());
}

#[test]
fn test_zoom() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());

	assert_eq!(session.zoom(), 1.0);
	session.set_zoom(1.5).unwrap();
	assert_eq!(session.zoom(), 1.5);
	assert!(matches!(session.set_zoom(0.0), Err(Error::InvalidArgument(_))));
	assert!(session.set_zoom(f64::NAN).is_err());
	assert_eq!(session.zoom(), 1.5);
}

#[test]
fn test_user_scripts() {
	let engine = engine();
	let session = attached(&engine, Callbacks::new());

	let first = session.add_user_script("window.a = 1;").unwrap();
	let second = session.add_user_script("window.b = 2;").unwrap();
	assert_ne!(first, second);
	assert_eq!(
		engine.content().unwrap().user_scripts(),
		vec!["window.a = 1;".to_string(), "window.b = 2;".to_string()]
	);

	session.remove_all_user_scripts().unwrap();
	assert!(engine.content().unwrap().user_scripts().is_empty());

	session.detach();
	assert!(session.add_user_script("x").unwrap_err().is_detached());
}

#[test]
fn test_dev_tools() {
	let engine = engine();
	let disabled = attached(&engine, Callbacks::new());
	assert!(!disabled.open_dev_tools());
	assert!(!disabled.is_dev_tools_open());
	disabled.detach();

	let session = attached_with(
		&engine,
		Callbacks::new(),
		SessionOptions::new().enable_dev_tools(true),
	);
	let view = engine.view().unwrap();
	assert!(session.open_dev_tools());
	assert!(session.is_dev_tools_open());
	assert!(view.is_inspector_open());

	session.close_dev_tools();
	assert!(!session.is_dev_tools_open());
	assert!(!view.is_inspector_open());

	assert!(session.open_dev_tools());
	session.detach();
	assert!(!session.is_dev_tools_open());
}

#[test]
fn test_calls_from_many_threads_stay_on_owner() {
	let engine = engine();
	let session = Arc::new(attached(&engine, Callbacks::new()));
	engine.set_page_text("abc abc");

	let handles: Vec<_> = (0..8)
		.map(|n| {
			let session = Arc::clone(&session);
			thread::spawn(move || {
				session.navigate(&format!("https://example.com/{n}")).unwrap();
				session.set_zoom(1.0 + f64::from(n) / 10.0).unwrap();
				let _ = session.can_go_back();
				let _ = session.current_uri();
				let (tx, rx) = std::sync::mpsc::channel();
				session.find_text("abc", false, true, move |result| {
					let _ = tx.send(result);
				});
				rx.recv().unwrap()
			})
		})
		.collect();

	for handle in handles {
		assert_eq!(handle.join().unwrap().total_matches, 2);
	}
	assert!(engine.thread_violations().is_empty());
	assert_eq!(engine.count_calls(|call| matches!(call, Call::LoadUri(_))), 8);
}
