use hotswap_link::{ LifecycleState, ProjectErrorKind };
use crate::workspace::{ Probe, Recorder, Workspace };

#[test]
fn hot_swap_replaces_the_loaded_entry_point() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	foo.load().unwrap();

	workspace.source( "Foo", "entry.wat", &fixture!( "entry.wat" ).replace( "1.0.0", "2.0.0" ));
	let outcome = foo.hot_swap().unwrap();

	assert_eq!( outcome.version, "2.0.0" );
	assert!( outcome.unload_warning.is_none() );
	assert_no_warnings!( outcome.warnings );
	assert_eq!( foo.version().as_deref(), Some( "2.0.0" ));
	assert_eq!( foo.state(), LifecycleState::Loaded );

	// Old load, old unload, new load: exactly one of each per swap.
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2, 1 ]);

}

#[test]
fn hot_swap_from_unloaded_compiles_and_loads() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	assert_eq!( foo.hot_swap().unwrap().version, "1.0.0" );
	assert_eq!( probe.records( "Foo" ), vec![ 1 ]);
	assert_eq!( recorder.states( "Foo" ), vec![
		LifecycleState::Compiling,
		LifecycleState::Compiled,
		LifecycleState::Loading,
		LifecycleState::Loaded,
	]);

}

#[test]
fn hot_swap_with_broken_sources_leaves_nothing_loaded() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	foo.load().unwrap();

	workspace.source( "Foo", "broken.wat", fixture!( "broken.wat" ));
	let err = foo.hot_swap().unwrap_err();

	assert!( matches!( err.kind, ProjectErrorKind::Compile( _ )));
	assert!( err.preceding.is_empty() );
	assert_eq!( foo.state(), LifecycleState::Unloaded );
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2 ]);
	assert!( workspace.artifact( "Foo", "entry.wasm" ).is_file() );

}

#[test]
fn hot_swap_carries_the_unload_warning() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "trapping_unload.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	foo.load().unwrap();

	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let outcome = foo.hot_swap().unwrap();

	assert!( outcome.unload_warning.is_some() );
	assert_eq!( foo.state(), LifecycleState::Loaded );
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2, 1 ]);

}
