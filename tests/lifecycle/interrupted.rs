use std::panic::{ catch_unwind, AssertUnwindSafe };
use std::path::Path ;
use std::sync::atomic::{ AtomicBool, Ordering };
use hotswap_link::{
	CompileError, CompileOutput, Compiler, Dependency, Engine, FnListener, LifecycleError, LifecycleState,
	ProjectErrorKind, ProjectManager, StateEvent, StateListener, WatCompiler,
};
use crate::workspace::{ Probe, TestContext, Workspace };

/// Panics on the first compile of the project named `target`, then assembles normally.
struct CrashOnce {
	target: &'static str,
	crashed: AtomicBool,
}

impl CrashOnce {
	fn new( target: &'static str ) -> Self { Self { target, crashed: AtomicBool::new( false ) }}
}

impl Compiler for CrashOnce {
	fn compile( &self, source_dir: &Path, output_dir: &Path, classpath: &[Dependency] ) -> Result<CompileOutput, CompileError> {
		let project = source_dir.parent().and_then( Path::file_name ).and_then(| name | name.to_str() );
		if project == Some( self.target ) && !self.crashed.swap( true, Ordering::SeqCst ) {
			panic!( "compiler crashed" );
		}
		WatCompiler.compile( source_dir, output_dir, classpath )
	}
}

fn manager_with(
	workspace: &Workspace,
	probe: &Probe,
	compiler: impl Compiler + 'static,
	listener: impl StateListener + 'static,
	parallel: bool,
) -> ProjectManager<TestContext> {
	let mut config = workspace.config();
	config.parallel_compile = parallel ;
	let engine = Engine::default();
	ProjectManager::builder( config, engine.clone() )
		.host_linker( probe.linker( &engine ))
		.compiler( compiler )
		.listener( listener )
		.build()
		.unwrap()
}

#[test]
fn panicking_compiler_restores_the_previous_state() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let probe = Probe::default();
	let manager = manager_with( &workspace, &probe, CrashOnce::new( "Foo" ), FnListener(| _: &str, _: &StateEvent<'_> | {}), false );
	let foo = manager.register_project( "Foo" ).unwrap();

	assert!( catch_unwind( AssertUnwindSafe(|| foo.compile() )).is_err() );
	assert_eq!( foo.state(), LifecycleState::Unloaded );
	assert!( !workspace.project_root( "Foo" ).join( "bin" ).exists() );
	assert!( !workspace.project_root( "Foo" ).join( ".bin.staging" ).exists() );

	foo.compile().unwrap();
	assert_eq!( foo.load().unwrap(), "1.0.0" );
	assert_eq!( foo.hot_swap().unwrap().version, "1.0.0" );
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2, 1 ]);

}

#[test]
fn panicking_listener_during_load_leaves_the_project_compiled() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let probe = Probe::default();
	let panicked = AtomicBool::new( false );
	let listener = FnListener( move | _: &str, event: &StateEvent<'_> | {
		if matches!( event, StateEvent::Loading ) && !panicked.swap( true, Ordering::SeqCst ) {
			panic!( "listener crashed" );
		}
	});
	let manager = manager_with( &workspace, &probe, WatCompiler, listener, false );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	assert!( catch_unwind( AssertUnwindSafe(|| foo.load() )).is_err() );

	assert_eq!( foo.state(), LifecycleState::Compiled );
	assert_eq!( foo.version(), None );
	assert!( probe.records( "Foo" ).is_empty() );

	assert_eq!( foo.load().unwrap(), "1.0.0" );
	assert_eq!( probe.records( "Foo" ), vec![ 1 ]);
	foo.unload().unwrap();
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2 ]);

}

#[test]
fn parallel_compile_reports_a_panic_and_the_project_recovers() {

	let workspace = Workspace::new();
	workspace
		.source( "Crash", "entry.wat", fixture!( "entry.wat" ))
		.source( "Fine", "entry.wat", fixture!( "entry.wat" ));
	let probe = Probe::default();
	let manager = manager_with( &workspace, &probe, CrashOnce::new( "Crash" ), FnListener(| _: &str, _: &StateEvent<'_> | {}), true );
	let crash = manager.register_project( "Crash" ).unwrap();
	manager.register_project( "Fine" ).unwrap();

	let report = manager.compile_all();
	assert_eq!( report.succeeded_ids().collect::<Vec<_>>(), vec![ "Fine" ]);
	match report.failed() {
		[ err ] => {
			assert_eq!( err.project, "Crash" );
			assert!( matches!( err.kind, ProjectErrorKind::Lifecycle( LifecycleError::Panicked )));
		},
		other => panic!( "Expected a single panic, found: {:?}", other ),
	}
	assert_eq!( crash.state(), LifecycleState::Unloaded );

	crash.compile().unwrap();
	assert_eq!( crash.hot_swap().unwrap().version, "1.0.0" );
	assert_eq!( crash.state(), LifecycleState::Loaded );

}
