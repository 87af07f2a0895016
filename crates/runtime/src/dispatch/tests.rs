use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use super::*;

fn spawn_dispatcher() -> (Dispatcher, LoopHandle) {
	let handle = MainLoop::spawn("wv-test-owner").unwrap();
	(Dispatcher::new(Arc::new(handle.clone())), handle)
}

fn wait_closed(handle: &LoopHandle) {
	for _ in 0..200 {
		if handle.is_closed() {
			return;
		}
		thread::sleep(Duration::from_millis(5));
	}
	panic!("owner loop did not close");
}

#[test]
fn test_sync_dispatch_runs_on_owner() {
	let (dispatcher, handle) = spawn_dispatcher();

	let owner = dispatcher.run_on_owner_thread(|| thread::current().id()).unwrap();
	assert_eq!(owner, handle.owner());
	assert_ne!(owner, thread::current().id());
	assert!(!dispatcher.is_owner_thread());

	handle.quit();
}

#[test]
fn test_sync_dispatch_returns_value() {
	let (dispatcher, handle) = spawn_dispatcher();

	let value = dispatcher.run_on_owner_thread(|| 40 + 2).unwrap();
	assert_eq!(value, 42);

	handle.quit();
}

#[test]
fn test_reentrant_dispatch_runs_inline() {
	let (dispatcher, handle) = spawn_dispatcher();

	let inner = dispatcher.clone();
	let value = dispatcher
		.run_on_owner_thread(move || {
			assert!(inner.is_owner_thread());
			inner.run_on_owner_thread(|| "nested").unwrap()
		})
		.unwrap();
	assert_eq!(value, "nested");

	handle.quit();
}

#[test]
fn test_concurrent_callers() {
	let (dispatcher, handle) = spawn_dispatcher();
	let counter = Arc::new(AtomicUsize::new(0));

	let workers: Vec<_> = (0..8)
		.map(|i| {
			let dispatcher = dispatcher.clone();
			let counter = Arc::clone(&counter);
			thread::spawn(move || {
				dispatcher
					.run_on_owner_thread(move || {
						counter.fetch_add(1, Ordering::SeqCst);
						i * 2
					})
					.unwrap()
			})
		})
		.collect();

	let mut results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
	results.sort();
	assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14]);
	assert_eq!(counter.load(Ordering::SeqCst), 8);

	handle.quit();
}

#[test]
fn test_dispatch_after_quit_fails() {
	let (dispatcher, handle) = spawn_dispatcher();
	assert!(handle.quit());
	wait_closed(&handle);

	let err = dispatcher.run_on_owner_thread(|| ()).unwrap_err();
	assert!(err.is_loop_closed());
	assert!(dispatcher.invoke(|| ()).is_err());
}

#[test]
fn test_panicking_task_aborts_caller_and_loop_survives() {
	let (dispatcher, handle) = spawn_dispatcher();

	let err = dispatcher
		.run_on_owner_thread(|| -> u32 { panic!("boom") })
		.unwrap_err();
	assert!(matches!(err, Error::DispatchAborted));

	assert_eq!(dispatcher.run_on_owner_thread(|| 7).unwrap(), 7);

	handle.quit();
}

#[test]
fn test_invoke_from_owner_is_deferred() {
	let (dispatcher, handle) = spawn_dispatcher();
	let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

	let inner = dispatcher.clone();
	let log = Arc::clone(&order);
	dispatcher
		.run_on_owner_thread(move || {
			let deferred = Arc::clone(&log);
			inner.invoke(move || deferred.lock().push("queued")).unwrap();
			log.lock().push("inline");
		})
		.unwrap();

	// Flush: this runs after the queued task.
	dispatcher.run_on_owner_thread(|| ()).unwrap();
	assert_eq!(*order.lock(), vec!["inline", "queued"]);

	handle.quit();
}

#[test]
fn test_run_pending_on_current_thread() {
	let mut main_loop = MainLoop::new();
	let handle = main_loop.handle();
	assert!(handle.is_owner());

	let hits = Arc::new(AtomicUsize::new(0));
	for _ in 0..3 {
		let hits = Arc::clone(&hits);
		assert!(handle.post(Box::new(move || {
			hits.fetch_add(1, Ordering::SeqCst);
		})));
	}

	assert_eq!(main_loop.run_pending(), 3);
	assert_eq!(hits.load(Ordering::SeqCst), 3);
	assert_eq!(main_loop.run_pending(), 0);
}

#[test]
fn test_run_pending_stops_at_quit() {
	let mut main_loop = MainLoop::new();
	let handle = main_loop.handle();

	handle.post(Box::new(|| {}));
	handle.quit();
	handle.post(Box::new(|| {}));

	assert_eq!(main_loop.run_pending(), 1);
	assert!(handle.is_closed());
	assert!(!handle.post(Box::new(|| {})));
}
