//! An in-process headless engine.
//!
//! [`HeadlessEngine`] implements the engine boundary without rendering
//! anything. It runs its own owner loop, records every engine call, and lets
//! tests (and embedders smoke-testing their host integration) fire engine
//! events and control when asynchronous completions are delivered.
//!
//! Calls made off the owner thread are recorded as
//! [thread violations](HeadlessEngine::thread_violations).
//!
//! ```ignore
//! let engine = HeadlessEngine::new()?;
//! let session = Session::new(engine.clone(), callbacks);
//! assert!(session.attach(SurfaceId(1)));
//! session.navigate("https://example.com/x")?;
//! engine.view().unwrap().finish_load()?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use image::{Rgba, RgbaImage};
use indexmap::IndexMap;
use parking_lot::Mutex;
use wv_protocol::{Cookie, FindOptions, PermissionKind, SchemeRequest, SurfaceId};
use wv_runtime::{Dispatcher, LoopHandle, MainLoop, Result, RunLoop, Task};

use crate::engine::{
	ContentManager, CookieManager, CookiesCompletion, DownloadInfo, Engine, EngineError,
	FindController, FindListener, FindSignal, HostSurface, PermissionRequest, PolicyAction,
	PolicyDecision, SchemeHandler, SchemeReply, ScriptCompletion, SignalHandlerId,
	SnapshotCompletion, UserScriptId, ViewConfig, ViewHooks, WebView,
};
use crate::session::MESSAGE_HANDLER_NAME;

/// Rounds [`HeadlessEngine::flush`] waits for chained completions.
const FLUSH_ROUNDS: usize = 64;

/// Native handles are offsets from this base, so they are never zero.
const HANDLE_BASE: usize = 0x1000;

/// An engine call recorded by [`HeadlessEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
	CreateHost(SurfaceId),
	Embed,
	Show,
	DestroyHost,
	CreateContentManager,
	RegisterMessageHandler(String),
	UnregisterMessageHandler(String),
	AddUserScript(String),
	RemoveAllUserScripts,
	CreateView { ephemeral: bool },
	Connect,
	SetDeveloperExtras(bool),
	SetUserAgent(Option<String>),
	SetJavascriptEnabled(bool),
	RegisterScheme(String),
	LoadUri(String),
	LoadHtml { html: String, base_uri: Option<String> },
	Reload,
	StopLoading,
	GoBack,
	GoForward,
	EvaluateScript(String),
	Snapshot,
	GetCookies(String),
	AddCookie(Cookie),
	DeleteCookie(Cookie),
	ClearCookies,
	Search(String, FindOptions),
	CountMatches(String, FindOptions),
	FinishFind,
	SetZoom(f64),
	ShowInspector,
	CloseInspector,
}

/// State shared by the engine and every object it creates.
struct Shared {
	main_loop: LoopHandle,
	dispatcher: Dispatcher,
	calls: Mutex<Vec<Call>>,
	violations: Mutex<Vec<&'static str>>,
	hold: AtomicBool,
	held: Mutex<Vec<Task>>,
	in_flight: AtomicUsize,
	next_id: AtomicU64,
	snapshot: Mutex<Option<RgbaImage>>,
	scripts: Mutex<HashMap<String, std::result::Result<Option<String>, EngineError>>>,
	page_text: Mutex<String>,
	fail_cookies: AtomicBool,
}

impl Shared {
	fn check_owner(&self, method: &'static str) {
		if !self.main_loop.is_owner() {
			tracing::error!(method, "engine touched off the owner thread");
			self.violations.lock().push(method);
		}
	}

	fn record(&self, method: &'static str, call: Call) {
		self.check_owner(method);
		self.calls.lock().push(call);
	}

	fn next_id(&self) -> u64 {
		self.next_id.fetch_add(1, Ordering::SeqCst)
	}

	/// Delivers a completion on a later loop iteration, or parks it while
	/// completions are held.
	fn complete(self: &Arc<Self>, completion: impl FnOnce() + Send + 'static) {
		if self.hold.load(Ordering::SeqCst) {
			self.held.lock().push(Box::new(completion));
			return;
		}
		self.schedule(Box::new(completion));
	}

	fn schedule(self: &Arc<Self>, task: Task) {
		self.in_flight.fetch_add(1, Ordering::SeqCst);
		let shared = Arc::clone(self);
		let posted = self.main_loop.post(Box::new(move || {
			task();
			shared.in_flight.fetch_sub(1, Ordering::SeqCst);
		}));
		if !posted {
			self.in_flight.fetch_sub(1, Ordering::SeqCst);
		}
	}

	fn count_in_page(&self, needle: &str, case_sensitive: bool) -> u32 {
		if needle.is_empty() {
			return 0;
		}
		let text = self.page_text.lock();
		let count = if case_sensitive {
			text.matches(needle).count()
		} else {
			text.to_lowercase().matches(&needle.to_lowercase()).count()
		};
		u32::try_from(count).unwrap_or(u32::MAX)
	}
}

/// A scriptable engine with its own owner thread.
pub struct HeadlessEngine {
	shared: Arc<Shared>,
	cookies: Arc<HeadlessCookies>,
	hosts: Mutex<Vec<Arc<HeadlessHost>>>,
	contents: Mutex<Vec<Arc<HeadlessContent>>>,
	views: Mutex<Vec<Arc<HeadlessView>>>,
	initialize_calls: AtomicUsize,
	fail_next_host: AtomicBool,
	fail_next_view: AtomicBool,
	fail_next_embed: AtomicBool,
}

impl std::fmt::Debug for HeadlessEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HeadlessEngine")
			.field("views", &self.views.lock().len())
			.field("calls", &self.shared.calls.lock().len())
			.finish()
	}
}

impl HeadlessEngine {
	/// Starts an engine on a dedicated owner thread.
	pub fn new() -> Result<Arc<Self>> {
		let main_loop = MainLoop::spawn("wv-headless")?;
		let shared = Arc::new(Shared {
			dispatcher: Dispatcher::new(Arc::new(main_loop.clone())),
			main_loop,
			calls: Mutex::new(Vec::new()),
			violations: Mutex::new(Vec::new()),
			hold: AtomicBool::new(false),
			held: Mutex::new(Vec::new()),
			in_flight: AtomicUsize::new(0),
			next_id: AtomicU64::new(1),
			snapshot: Mutex::new(Some(RgbaImage::from_pixel(4, 3, Rgba([32, 64, 128, 255])))),
			scripts: Mutex::new(HashMap::new()),
			page_text: Mutex::new(String::new()),
			fail_cookies: AtomicBool::new(false),
		});
		Ok(Arc::new(Self {
			cookies: Arc::new(HeadlessCookies::new(Arc::clone(&shared))),
			shared,
			hosts: Mutex::new(Vec::new()),
			contents: Mutex::new(Vec::new()),
			views: Mutex::new(Vec::new()),
			initialize_calls: AtomicUsize::new(0),
			fail_next_host: AtomicBool::new(false),
			fail_next_view: AtomicBool::new(false),
			fail_next_embed: AtomicBool::new(false),
		}))
	}

	/// Every engine call so far, in order.
	pub fn calls(&self) -> Vec<Call> {
		self.shared.calls.lock().clone()
	}

	/// Number of recorded calls matching `predicate`.
	pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
		self.shared.calls.lock().iter().filter(|call| predicate(call)).count()
	}

	pub fn clear_calls(&self) {
		self.shared.calls.lock().clear();
	}

	/// Names of engine methods that were called off the owner thread.
	pub fn thread_violations(&self) -> Vec<&'static str> {
		self.shared.violations.lock().clone()
	}

	/// How often [`Engine::initialize`] ran on this engine.
	pub fn initialize_calls(&self) -> usize {
		self.initialize_calls.load(Ordering::SeqCst)
	}

	/// While holding, asynchronous completions are parked instead of
	/// delivered. Release them with [`release_held`](Self::release_held).
	pub fn hold_completions(&self, hold: bool) {
		self.shared.hold.store(hold, Ordering::SeqCst);
	}

	/// Delivers every parked completion. Returns how many were released.
	pub fn release_held(&self) -> usize {
		let held: Vec<Task> = std::mem::take(&mut *self.shared.held.lock());
		let count = held.len();
		for task in held {
			self.shared.schedule(task);
		}
		count
	}

	/// Number of parked completions.
	pub fn held_count(&self) -> usize {
		self.shared.held.lock().len()
	}

	/// Waits until the owner loop has run everything queued so far,
	/// including completions scheduled by those tasks.
	pub fn flush(&self) -> Result<()> {
		for _ in 0..FLUSH_ROUNDS {
			self.shared.dispatcher.run_on_owner_thread(|| ())?;
			if self.shared.in_flight.load(Ordering::SeqCst) == 0 {
				break;
			}
		}
		Ok(())
	}

	/// Runs `action` on the owner thread.
	pub fn run_on_owner<R, F>(&self, action: F) -> Result<R>
	where
		F: FnOnce() -> R + Send + 'static,
		R: Send + 'static,
	{
		self.shared.dispatcher.run_on_owner_thread(action)
	}

	/// Image returned by snapshots. `None` makes snapshots fail.
	pub fn set_snapshot(&self, image: Option<RgbaImage>) {
		*self.shared.snapshot.lock() = image;
	}

	/// Scripted result for evaluating exactly `source`.
	///
	/// Unscripted sources evaluate to themselves, except `null` and
	/// `undefined`, which evaluate to nothing.
	pub fn set_script_result(
		&self,
		source: impl Into<String>,
		result: std::result::Result<Option<String>, EngineError>,
	) {
		self.shared.scripts.lock().insert(source.into(), result);
	}

	/// Text searched by find-in-page.
	pub fn set_page_text(&self, text: impl Into<String>) {
		*self.shared.page_text.lock() = text.into();
	}

	/// Makes cookie queries fail.
	pub fn fail_cookies(&self, fail: bool) {
		self.shared.fail_cookies.store(fail, Ordering::SeqCst);
	}

	/// Makes the next host creation fail.
	pub fn fail_next_host(&self) {
		self.fail_next_host.store(true, Ordering::SeqCst);
	}

	/// Makes the next view creation fail.
	pub fn fail_next_view(&self) {
		self.fail_next_view.store(true, Ordering::SeqCst);
	}

	/// Makes the next embed fail.
	pub fn fail_next_embed(&self) {
		self.fail_next_embed.store(true, Ordering::SeqCst);
	}

	/// The most recently created view.
	pub fn view(&self) -> Option<Arc<HeadlessView>> {
		self.views.lock().last().cloned()
	}

	pub fn views(&self) -> Vec<Arc<HeadlessView>> {
		self.views.lock().clone()
	}

	/// The view whose native handle is `handle`.
	pub fn view_by_handle(&self, handle: usize) -> Option<Arc<HeadlessView>> {
		self.views
			.lock()
			.iter()
			.find(|view| view.handle() == handle)
			.cloned()
	}

	/// The most recently created host surface.
	pub fn host(&self) -> Option<Arc<HeadlessHost>> {
		self.hosts.lock().last().cloned()
	}

	/// The most recently created content manager.
	pub fn content(&self) -> Option<Arc<HeadlessContent>> {
		self.contents.lock().last().cloned()
	}

	/// Cookies in the persistent jar.
	pub fn persistent_cookies(&self) -> Vec<Cookie> {
		self.cookies.jar.lock().clone()
	}
}

impl Drop for HeadlessEngine {
	fn drop(&mut self) {
		self.shared.main_loop.quit();
	}
}

impl Engine for HeadlessEngine {
	fn initialize(&self) -> bool {
		self.initialize_calls.fetch_add(1, Ordering::SeqCst);
		true
	}

	fn run_loop(&self) -> Arc<dyn RunLoop> {
		Arc::new(self.shared.main_loop.clone())
	}

	fn create_host(&self, surface: SurfaceId) -> std::result::Result<Arc<dyn HostSurface>, EngineError> {
		self.shared.record("create_host", Call::CreateHost(surface));
		if self.fail_next_host.swap(false, Ordering::SeqCst) {
			return Err(EngineError::other("host surface unavailable"));
		}
		let host = Arc::new(HeadlessHost {
			surface,
			shared: Arc::clone(&self.shared),
			fail_embed: self.fail_next_embed.swap(false, Ordering::SeqCst),
			embedded: Mutex::new(None),
			shown: AtomicBool::new(false),
			destroyed: AtomicBool::new(false),
		});
		self.hosts.lock().push(Arc::clone(&host));
		Ok(host)
	}

	fn create_content_manager(&self) -> std::result::Result<Arc<dyn ContentManager>, EngineError> {
		self.shared.record("create_content_manager", Call::CreateContentManager);
		let content = Arc::new(HeadlessContent {
			shared: Arc::clone(&self.shared),
			handlers: Mutex::new(IndexMap::new()),
			scripts: Mutex::new(Vec::new()),
		});
		self.contents.lock().push(Arc::clone(&content));
		Ok(content)
	}

	fn create_view(
		&self,
		config: &ViewConfig,
		content: &Arc<dyn ContentManager>,
	) -> std::result::Result<Arc<dyn WebView>, EngineError> {
		self.shared.record(
			"create_view",
			Call::CreateView {
				ephemeral: config.ephemeral,
			},
		);
		if self.fail_next_view.swap(false, Ordering::SeqCst) {
			return Err(EngineError::other("view creation failed"));
		}
		let content = Arc::clone(content)
			.downcast_arc::<HeadlessContent>()
			.map_err(|_| EngineError::other("content manager from another engine"))?;
		let cookies = if config.ephemeral {
			Arc::new(HeadlessCookies::new(Arc::clone(&self.shared)))
		} else {
			Arc::clone(&self.cookies)
		};

		let view = Arc::new(HeadlessView {
			id: self.shared.next_id(),
			shared: Arc::clone(&self.shared),
			config: *config,
			content,
			cookies,
			finder: Arc::new(HeadlessFinder::new(Arc::clone(&self.shared))),
			hooks: Mutex::new(None),
			schemes: Mutex::new(IndexMap::new()),
			history: Mutex::new(History::default()),
			settings: Mutex::new(ViewSettings::default()),
			zoom: Mutex::new(1.0),
			inspector_open: AtomicBool::new(false),
		});
		self.views.lock().push(Arc::clone(&view));
		Ok(view)
	}
}

/// A host surface.
pub struct HeadlessHost {
	surface: SurfaceId,
	shared: Arc<Shared>,
	fail_embed: bool,
	embedded: Mutex<Option<Arc<dyn WebView>>>,
	shown: AtomicBool,
	destroyed: AtomicBool,
}

impl HeadlessHost {
	pub fn surface(&self) -> SurfaceId {
		self.surface
	}

	pub fn is_embedded(&self) -> bool {
		self.embedded.lock().is_some()
	}

	pub fn is_shown(&self) -> bool {
		self.shown.load(Ordering::SeqCst)
	}

	pub fn is_destroyed(&self) -> bool {
		self.destroyed.load(Ordering::SeqCst)
	}
}

impl HostSurface for HeadlessHost {
	fn embed(&self, view: &Arc<dyn WebView>) -> std::result::Result<(), EngineError> {
		self.shared.record("embed", Call::Embed);
		if self.fail_embed {
			return Err(EngineError::other("embedding failed"));
		}
		*self.embedded.lock() = Some(Arc::clone(view));
		Ok(())
	}

	fn show(&self) {
		self.shared.record("show", Call::Show);
		self.shown.store(true, Ordering::SeqCst);
	}

	fn destroy(&self) {
		self.shared.record("destroy", Call::DestroyHost);
		self.destroyed.store(true, Ordering::SeqCst);
		self.shown.store(false, Ordering::SeqCst);
		self.embedded.lock().take();
	}
}

/// A content manager.
pub struct HeadlessContent {
	shared: Arc<Shared>,
	handlers: Mutex<IndexMap<String, Arc<dyn ViewHooks>>>,
	scripts: Mutex<Vec<(UserScriptId, String)>>,
}

impl HeadlessContent {
	/// Names with a registered message handler.
	pub fn message_handlers(&self) -> Vec<String> {
		self.handlers.lock().keys().cloned().collect()
	}

	/// Sources of the injected user scripts, in order.
	pub fn user_scripts(&self) -> Vec<String> {
		self.scripts.lock().iter().map(|(_, source)| source.clone()).collect()
	}

	/// Delivers `body` to the handler registered as `name`, as page script
	/// would. Must run on the owner thread. Returns false if no handler is
	/// registered.
	fn deliver(&self, name: &str, body: &str) -> bool {
		let hooks = self.handlers.lock().get(name).cloned();
		match hooks {
			Some(hooks) => {
				hooks.script_message(body);
				true
			}
			None => false,
		}
	}
}

impl ContentManager for HeadlessContent {
	fn register_message_handler(
		&self,
		name: &str,
		hooks: Arc<dyn ViewHooks>,
	) -> std::result::Result<(), EngineError> {
		self.shared.record(
			"register_message_handler",
			Call::RegisterMessageHandler(name.to_string()),
		);
		let mut handlers = self.handlers.lock();
		if handlers.contains_key(name) {
			return Err(EngineError::other(format!("handler {name} already registered")));
		}
		handlers.insert(name.to_string(), hooks);
		Ok(())
	}

	fn unregister_message_handler(&self, name: &str) {
		self.shared.record(
			"unregister_message_handler",
			Call::UnregisterMessageHandler(name.to_string()),
		);
		self.handlers.lock().shift_remove(name);
	}

	fn add_user_script(&self, source: &str) -> UserScriptId {
		self.shared
			.record("add_user_script", Call::AddUserScript(source.to_string()));
		let id = UserScriptId(self.shared.next_id());
		self.scripts.lock().push((id, source.to_string()));
		id
	}

	fn remove_all_user_scripts(&self) {
		self.shared
			.record("remove_all_user_scripts", Call::RemoveAllUserScripts);
		self.scripts.lock().clear();
	}
}

#[derive(Default)]
struct History {
	entries: Vec<String>,
	index: Option<usize>,
}

impl History {
	fn push(&mut self, uri: String) {
		let keep = self.index.map_or(0, |index| index + 1);
		self.entries.truncate(keep);
		self.entries.push(uri);
		self.index = Some(self.entries.len() - 1);
	}

	fn current(&self) -> Option<String> {
		self.index.and_then(|index| self.entries.get(index).cloned())
	}

	fn can_go_back(&self) -> bool {
		self.index.is_some_and(|index| index > 0)
	}

	fn can_go_forward(&self) -> bool {
		self.index.is_some_and(|index| index + 1 < self.entries.len())
	}
}

/// Settings applied to a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSettings {
	pub developer_extras: bool,
	pub user_agent: Option<String>,
	pub javascript_enabled: bool,
}

/// A view.
pub struct HeadlessView {
	id: u64,
	shared: Arc<Shared>,
	config: ViewConfig,
	content: Arc<HeadlessContent>,
	cookies: Arc<HeadlessCookies>,
	finder: Arc<HeadlessFinder>,
	hooks: Mutex<Option<Arc<dyn ViewHooks>>>,
	schemes: Mutex<IndexMap<String, Arc<dyn SchemeHandler>>>,
	history: Mutex<History>,
	settings: Mutex<ViewSettings>,
	zoom: Mutex<f64>,
	inspector_open: AtomicBool,
}

impl HeadlessView {
	fn handle(&self) -> usize {
		HANDLE_BASE + self.id as usize
	}

	pub fn is_ephemeral(&self) -> bool {
		self.config.ephemeral
	}

	pub fn settings(&self) -> ViewSettings {
		self.settings.lock().clone()
	}

	/// Schemes registered on this view, in order.
	pub fn schemes(&self) -> Vec<String> {
		self.schemes.lock().keys().cloned().collect()
	}

	pub fn is_inspector_open(&self) -> bool {
		self.inspector_open.load(Ordering::SeqCst)
	}

	/// Cookies visible to this view.
	pub fn cookies(&self) -> Vec<Cookie> {
		self.cookies.jar.lock().clone()
	}

	fn hooks(&self) -> Option<Arc<dyn ViewHooks>> {
		self.hooks.lock().clone()
	}

	/// Runs `event` against the connected hooks on the owner thread.
	/// Returns `None` if nothing is connected.
	fn fire<R, F>(self: &Arc<Self>, event: F) -> Result<Option<R>>
	where
		F: FnOnce(&HeadlessView, Arc<dyn ViewHooks>) -> R + Send + 'static,
		R: Send + 'static,
	{
		let view = Arc::clone(self);
		self.shared
			.dispatcher
			.run_on_owner_thread(move || view.hooks().map(|hooks| event(&view, hooks)))
	}

	/// Reports that the current load finished.
	pub fn finish_load(self: &Arc<Self>) -> Result<()> {
		self.fire(|_, hooks| hooks.load_finished()).map(drop)
	}

	/// Reports a failed load.
	pub fn fail_load(self: &Arc<Self>, failing_uri: Option<&str>, error: Option<EngineError>) -> Result<()> {
		let failing_uri = failing_uri.map(str::to_string);
		self.fire(move |_, hooks| hooks.load_failed(failing_uri.as_deref(), error.as_ref()))
			.map(drop)
	}

	/// Reports a certificate failure with the given flags.
	pub fn fail_tls(self: &Arc<Self>, failing_uri: Option<&str>, errors: u32) -> Result<()> {
		let failing_uri = failing_uri.map(str::to_string);
		self.fire(move |_, hooks| hooks.load_failed_tls(failing_uri.as_deref(), errors))
			.map(drop)
	}

	/// Asks for a policy decision.
	///
	/// Returns whether the hooks took the decision over, and a probe that
	/// observes the verdict.
	pub fn request_policy(self: &Arc<Self>, action: PolicyAction) -> Result<(bool, DecisionProbe)> {
		let probe = DecisionProbe::default();
		let decision = Box::new(HeadlessDecision {
			probe: probe.clone(),
		});
		let handled = self
			.fire(move |_, hooks| hooks.decide_policy(&action, decision))?
			.unwrap_or(false);
		Ok((handled, probe))
	}

	/// Posts a message from page script to the bridge handler.
	///
	/// Returns false if no handler is registered.
	pub fn post_message(self: &Arc<Self>, body: &str) -> Result<bool> {
		let body = body.to_string();
		let content = Arc::clone(&self.content);
		self.shared
			.dispatcher
			.run_on_owner_thread(move || content.deliver(MESSAGE_HANDLER_NAME, &body))
	}

	/// Reports a download.
	pub fn start_download(self: &Arc<Self>, download: DownloadInfo) -> Result<()> {
		self.fire(move |_, hooks| hooks.download_started(&download)).map(drop)
	}

	/// Raises a permission request of `kind`.
	pub fn request_permission(self: &Arc<Self>, kind: PermissionKind) -> Result<(bool, DecisionProbe)> {
		let probe = DecisionProbe::default();
		let request = Box::new(HeadlessPermission {
			kind,
			probe: probe.clone(),
		});
		let handled = self
			.fire(move |_, hooks| hooks.permission_requested(request))?
			.unwrap_or(false);
		Ok((handled, probe))
	}

	/// Fetches `uri` through its registered scheme handler.
	///
	/// Returns `None` if the scheme is not registered.
	pub fn fetch(self: &Arc<Self>, uri: &str) -> Result<Option<SchemeReply>> {
		let request = SchemeRequest {
			uri: uri.to_string(),
			method: "GET".to_string(),
		};
		let view = Arc::clone(self);
		self.shared.dispatcher.run_on_owner_thread(move || {
			let scheme = request.uri.split(':').next()?.to_ascii_lowercase();
			let handler = view.schemes.lock().get(&scheme).cloned()?;
			Some(handler.handle(&request))
		})
	}
}

impl WebView for HeadlessView {
	fn connect(&self, hooks: Arc<dyn ViewHooks>) {
		self.shared.record("connect", Call::Connect);
		*self.hooks.lock() = Some(hooks);
	}

	fn set_developer_extras(&self, enabled: bool) {
		self.shared
			.record("set_developer_extras", Call::SetDeveloperExtras(enabled));
		self.settings.lock().developer_extras = enabled;
	}

	fn set_user_agent(&self, user_agent: Option<&str>) {
		let user_agent = user_agent.map(str::to_string);
		self.shared
			.record("set_user_agent", Call::SetUserAgent(user_agent.clone()));
		self.settings.lock().user_agent = user_agent;
	}

	fn set_javascript_enabled(&self, enabled: bool) {
		self.shared
			.record("set_javascript_enabled", Call::SetJavascriptEnabled(enabled));
		self.settings.lock().javascript_enabled = enabled;
	}

	fn register_uri_scheme(
		&self,
		scheme: &str,
		handler: Arc<dyn SchemeHandler>,
	) -> std::result::Result<(), EngineError> {
		self.shared
			.record("register_uri_scheme", Call::RegisterScheme(scheme.to_string()));
		let mut schemes = self.schemes.lock();
		if schemes.contains_key(scheme) {
			return Err(EngineError::other(format!("scheme {scheme} already registered")));
		}
		schemes.insert(scheme.to_string(), handler);
		Ok(())
	}

	fn load_uri(&self, uri: &str) {
		self.shared.record("load_uri", Call::LoadUri(uri.to_string()));
		self.history.lock().push(uri.to_string());
	}

	fn load_html(&self, html: &str, base_uri: Option<&str>) {
		self.shared.record(
			"load_html",
			Call::LoadHtml {
				html: html.to_string(),
				base_uri: base_uri.map(str::to_string),
			},
		);
		self.history
			.lock()
			.push(base_uri.unwrap_or("about:blank").to_string());
	}

	fn reload(&self) {
		self.shared.record("reload", Call::Reload);
	}

	fn stop_loading(&self) {
		self.shared.record("stop_loading", Call::StopLoading);
	}

	fn go_back(&self) {
		self.shared.record("go_back", Call::GoBack);
		let mut history = self.history.lock();
		if history.can_go_back() {
			history.index = history.index.map(|index| index - 1);
		}
	}

	fn go_forward(&self) {
		self.shared.record("go_forward", Call::GoForward);
		let mut history = self.history.lock();
		if history.can_go_forward() {
			history.index = history.index.map(|index| index + 1);
		}
	}

	fn can_go_back(&self) -> bool {
		self.shared.check_owner("can_go_back");
		self.history.lock().can_go_back()
	}

	fn can_go_forward(&self) -> bool {
		self.shared.check_owner("can_go_forward");
		self.history.lock().can_go_forward()
	}

	fn uri(&self) -> Option<String> {
		self.shared.check_owner("uri");
		self.history.lock().current()
	}

	fn evaluate_script(&self, source: &str, completion: ScriptCompletion) {
		self.shared
			.record("evaluate_script", Call::EvaluateScript(source.to_string()));
		let scripted = self.shared.scripts.lock().get(source).cloned();
		let result = scripted.unwrap_or_else(|| match source.trim() {
			"null" | "undefined" => Ok(None),
			other => Ok(Some(other.to_string())),
		});
		self.shared.complete(move || completion(result));
	}

	fn cookie_manager(&self) -> Arc<dyn CookieManager> {
		self.shared.check_owner("cookie_manager");
		self.cookies.clone()
	}

	fn snapshot(&self, completion: SnapshotCompletion) {
		self.shared.record("snapshot", Call::Snapshot);
		let result = self
			.shared
			.snapshot
			.lock()
			.clone()
			.ok_or_else(|| EngineError::other("snapshot unavailable"));
		self.shared.complete(move || completion(result));
	}

	fn find_controller(&self) -> Arc<dyn FindController> {
		self.shared.check_owner("find_controller");
		self.finder.clone()
	}

	fn zoom_level(&self) -> f64 {
		self.shared.check_owner("zoom_level");
		*self.zoom.lock()
	}

	fn set_zoom_level(&self, level: f64) {
		self.shared.record("set_zoom_level", Call::SetZoom(level));
		*self.zoom.lock() = level;
	}

	fn show_inspector(&self) {
		self.shared.record("show_inspector", Call::ShowInspector);
		self.inspector_open.store(true, Ordering::SeqCst);
	}

	fn close_inspector(&self) {
		self.shared.record("close_inspector", Call::CloseInspector);
		self.inspector_open.store(false, Ordering::SeqCst);
	}

	fn native_handle(&self) -> usize {
		self.shared.check_owner("native_handle");
		self.handle()
	}
}

/// A cookie jar.
struct HeadlessCookies {
	shared: Arc<Shared>,
	jar: Mutex<Vec<Cookie>>,
}

impl HeadlessCookies {
	fn new(shared: Arc<Shared>) -> Self {
		Self {
			shared,
			jar: Mutex::new(Vec::new()),
		}
	}

	fn matching(&self, uri: &str) -> Vec<Cookie> {
		let (host, path) = split_uri(uri);
		self.jar
			.lock()
			.iter()
			.filter(|cookie| domain_matches(host, &cookie.domain) && path.starts_with(&cookie.path))
			.cloned()
			.collect()
	}
}

impl CookieManager for HeadlessCookies {
	fn get_cookies(&self, uri: &str, completion: CookiesCompletion) {
		self.shared.record("get_cookies", Call::GetCookies(uri.to_string()));
		let result = if self.shared.fail_cookies.load(Ordering::SeqCst) {
			Err(EngineError::other("cookie storage unavailable"))
		} else {
			Ok(self.matching(uri))
		};
		self.shared.complete(move || completion(result));
	}

	fn add_cookie(&self, cookie: &Cookie) {
		self.shared.record("add_cookie", Call::AddCookie(cookie.clone()));
		let mut jar = self.jar.lock();
		jar.retain(|existing| !same_cookie(existing, cookie));
		jar.push(cookie.clone());
	}

	fn delete_cookie(&self, cookie: &Cookie) {
		self.shared
			.record("delete_cookie", Call::DeleteCookie(cookie.clone()));
		self.jar.lock().retain(|existing| !same_cookie(existing, cookie));
	}

	fn clear_all(&self) {
		self.shared.record("clear_all", Call::ClearCookies);
		self.jar.lock().clear();
	}
}

fn same_cookie(a: &Cookie, b: &Cookie) -> bool {
	a.name == b.name && a.domain == b.domain && a.path == b.path
}

/// Splits `scheme://host[:port]/path` into host and path.
fn split_uri(uri: &str) -> (&str, &str) {
	let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
	let (authority, path) = match rest.find('/') {
		Some(index) => (&rest[..index], &rest[index..]),
		None => (rest, "/"),
	};
	let host = authority.split(':').next().unwrap_or(authority);
	(host, path)
}

fn domain_matches(host: &str, domain: &str) -> bool {
	let domain = domain.trim_start_matches('.');
	host.eq_ignore_ascii_case(domain)
		|| host
			.to_ascii_lowercase()
			.ends_with(&format!(".{}", domain.to_ascii_lowercase()))
}

type Listeners = Arc<Mutex<IndexMap<u64, FindListener>>>;

/// A find controller searching the configured page text.
///
/// Signals queued for a search are dropped once a newer search or `finish`
/// supersedes it.
struct HeadlessFinder {
	shared: Arc<Shared>,
	listeners: Listeners,
	generation: Arc<AtomicU64>,
}

impl HeadlessFinder {
	fn new(shared: Arc<Shared>) -> Self {
		Self {
			shared,
			listeners: Arc::new(Mutex::new(IndexMap::new())),
			generation: Arc::new(AtomicU64::new(0)),
		}
	}

	fn emit(&self, signal: FindSignal) {
		let listeners = Arc::clone(&self.listeners);
		let generation = Arc::clone(&self.generation);
		let issued = generation.load(Ordering::SeqCst);
		self.shared.complete(move || {
			if generation.load(Ordering::SeqCst) != issued {
				return;
			}
			let snapshot: Vec<FindListener> = listeners.lock().values().cloned().collect();
			for listener in snapshot {
				listener(signal);
			}
		});
	}
}

impl FindController for HeadlessFinder {
	fn connect(&self, listener: FindListener) -> SignalHandlerId {
		self.shared.check_owner("find_connect");
		let id = self.shared.next_id();
		self.listeners.lock().insert(id, listener);
		SignalHandlerId(id)
	}

	fn disconnect(&self, id: SignalHandlerId) {
		self.shared.check_owner("find_disconnect");
		self.listeners.lock().shift_remove(&id.0);
	}

	fn search(&self, text: &str, options: FindOptions, _max_matches: u32) {
		self.shared
			.record("search", Call::Search(text.to_string(), options));
		self.generation.fetch_add(1, Ordering::SeqCst);
		if self.shared.count_in_page(text, options.case_sensitive) == 0 {
			self.emit(FindSignal::FailedToFind);
		}
	}

	fn count_matches(&self, text: &str, options: FindOptions, _max_matches: u32) {
		self.shared
			.record("count_matches", Call::CountMatches(text.to_string(), options));
		let total = self.shared.count_in_page(text, options.case_sensitive);
		self.emit(FindSignal::CountedMatches(total));
	}

	fn finish(&self) {
		self.shared.record("finish_find", Call::FinishFind);
		self.generation.fetch_add(1, Ordering::SeqCst);
	}
}

impl HeadlessFinder {
	#[cfg(test)]
	fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}
}

impl HeadlessView {
	/// Number of connected find listeners.
	pub fn find_listener_count(&self) -> usize {
		self.finder.listeners.lock().len()
	}
}

/// Observes how a policy decision or permission request was answered.
#[derive(Debug, Clone, Default)]
pub struct DecisionProbe {
	state: Arc<ProbeState>,
}

#[derive(Debug, Default)]
struct ProbeState {
	verdict: Mutex<Option<bool>>,
	applied: AtomicUsize,
}

impl DecisionProbe {
	fn apply(&self, allow: bool) {
		self.state.applied.fetch_add(1, Ordering::SeqCst);
		*self.state.verdict.lock() = Some(allow);
	}

	/// `Some(true)` if allowed, `Some(false)` if denied, `None` if not yet
	/// answered or left to the engine default.
	pub fn verdict(&self) -> Option<bool> {
		*self.state.verdict.lock()
	}

	/// How many times a verdict was applied. At most one in a correct bridge.
	pub fn times_applied(&self) -> usize {
		self.state.applied.load(Ordering::SeqCst)
	}
}

struct HeadlessDecision {
	probe: DecisionProbe,
}

impl PolicyDecision for HeadlessDecision {
	fn allow(self: Box<Self>) {
		self.probe.apply(true);
	}

	fn deny(self: Box<Self>) {
		self.probe.apply(false);
	}
}

struct HeadlessPermission {
	kind: PermissionKind,
	probe: DecisionProbe,
}

impl PermissionRequest for HeadlessPermission {
	fn kind(&self) -> PermissionKind {
		self.kind
	}

	fn allow(self: Box<Self>) {
		self.probe.apply(true);
	}

	fn deny(self: Box<Self>) {
		self.probe.apply(false);
	}
}
