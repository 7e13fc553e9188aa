use hotparam_config::{BindingState, ConfigReader, ReaderSettings, ReloadPolicy, Value};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const SUM: &str = "add = function(a, b) return a + b end\n";
const PRODUCT: &str = "add = function(a, b) return a * b end\n";

struct Setup {
	_dir: TempDir,
	reader: ConfigReader,
}

impl Setup {
	fn edit(&self, source: &str) {
		std::fs::write(self.reader.script_path(), source).unwrap();
	}
}

fn args() -> [Value; 2] {
	[Value::Int(3), Value::Int(4)]
}

#[fixture]
fn setup(#[default(ReloadPolicy::EveryRead)] reload: ReloadPolicy) -> Setup {
	let _ = tracing_subscriber::fmt::try_init();
	let dir = tempfile::tempdir().unwrap();
	let settings = ReaderSettings::default().with_script(dir.path().join("hooks.lua")).with_reload(reload);
	let mut reader = ConfigReader::new(settings);
	reader.register_callable("add", "ii>i", "").unwrap();
	std::fs::write(reader.script_path(), SUM).unwrap();
	Setup { _dir: dir, reader }
}

#[rstest]
fn cached_keeps_target_until_next_read(setup: Setup) {
	let mut setup = setup;
	let cached = setup.reader.cached("add", "ii>i").unwrap();
	let live = setup.reader.resolve_now("add", "ii>i").unwrap();
	assert_eq!(cached.call(&args()).unwrap(), vec![Value::Int(7)]);
	assert_eq!(live.call(&args()).unwrap(), vec![Value::Int(7)]);

	setup.edit(PRODUCT);
	assert_eq!(live.call(&args()).unwrap(), vec![Value::Int(12)]);
	assert_eq!(cached.call(&args()).unwrap(), vec![Value::Int(7)]);
	assert_eq!(setup.reader.cached("add", "ii>i").unwrap().call(&args()).unwrap(), vec![Value::Int(7)]);

	setup.reader.read_callable("add", "ii>i").unwrap();
	assert_eq!(setup.reader.cached("add", "ii>i").unwrap().call(&args()).unwrap(), vec![Value::Int(12)]);
	// Hooks already handed out stay on their own target.
	assert_eq!(cached.call(&args()).unwrap(), vec![Value::Int(7)]);
}

#[rstest]
fn global_mutation_bypasses_cached_hook(setup: Setup) {
	let mut setup = setup;
	let cached = setup.reader.read_callable("add", "ii>i").unwrap();
	setup
		.reader
		.engine()
		.lock()
		.load_source("patch", "add = function(a, b) return a - b end")
		.unwrap();
	assert_eq!(cached.call(&args()).unwrap(), vec![Value::Int(7)]);

	let live = setup.reader.resolve_now("add", "ii>i").unwrap();
	setup.reader.engine().lock().load_source("patch", "add = function(a, b) return a - b end").unwrap();
	// A live hook reloads the script before calling, so the file wins.
	assert_eq!(live.call(&args()).unwrap(), vec![Value::Int(7)]);
}

#[rstest]
fn resolve_now_reloads_under_manual_policy(#[with(ReloadPolicy::Manual)] setup: Setup) {
	let mut setup = setup;
	let live = setup.reader.resolve_now("add", "ii>i").unwrap();
	assert!(live.is_live());
	assert_eq!(setup.reader.binding_state("add"), BindingState::Resolved);

	setup.edit(PRODUCT);
	assert_eq!(live.call(&args()).unwrap(), vec![Value::Int(12)]);
}

#[rstest]
fn read_callable_under_manual_policy_uses_loaded_state(#[with(ReloadPolicy::Manual)] setup: Setup) {
	let mut setup = setup;
	setup.reader.reload().unwrap();
	setup.edit(PRODUCT);
	let hook = setup.reader.read_callable("add", "ii>i").unwrap();
	assert_eq!(hook.call(&args()).unwrap(), vec![Value::Int(7)]);
}

#[rstest]
fn live_hook_reports_removed_definition(setup: Setup) {
	let mut setup = setup;
	let live = setup.reader.resolve_now("add", "ii>i").unwrap();
	setup.edit("add = nil\n");
	let err = live.call(&args()).unwrap_err();
	assert_eq!(err.to_string(), "callable 'add' is not defined or is not invocable");
}

#[rstest]
fn hooks_share_one_engine(setup: Setup) {
	let mut setup = setup;
	let first = setup.reader.cached("add", "ii>i").unwrap();
	let second = first.clone();
	drop(first);
	assert_eq!(second.call(&args()).unwrap(), vec![Value::Int(7)]);
	assert_eq!(second.id(), "add");
	assert_eq!(second.signature().to_string(), "ii>i");
}

#[rstest]
fn hook_dropped_under_engine_lock_is_released_later(setup: Setup) {
	let mut setup = setup;
	let first = setup.reader.read_callable("add", "ii>i").unwrap();
	// A second read replaces the cached target, leaving `first` as the only owner of its pin.
	setup.reader.read_callable("add", "ii>i").unwrap();

	let engine = setup.reader.engine().clone();
	let guard = engine.lock();
	drop(first);
	assert_eq!(engine.deferred_releases(), 1);
	drop(guard);

	let hook = setup.reader.cached("add", "ii>i").unwrap();
	assert_eq!(hook.call(&args()).unwrap(), vec![Value::Int(7)]);
	assert_eq!(engine.deferred_releases(), 0);
}
