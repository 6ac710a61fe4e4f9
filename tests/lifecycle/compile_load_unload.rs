use std::path::PathBuf ;
use hotswap_link::LifecycleState ;
use crate::workspace::{ Probe, Recorder, Workspace };

#[test]
fn lifecycle_compile_load_unload() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	let foo = manager.register_project( "Foo" ).unwrap();
	assert_eq!( foo.state(), LifecycleState::Unloaded );

	let output = foo.compile().unwrap();
	assert_no_warnings!( output.warnings );
	assert_eq!( output.artifacts, vec![ PathBuf::from( "entry.wasm" )]);
	assert!( workspace.artifact( "Foo", "entry.wasm" ).is_file() );
	assert_eq!( foo.state(), LifecycleState::Compiled );

	assert_eq!( foo.load().unwrap(), "1.0.0" );
	assert_eq!( foo.state(), LifecycleState::Loaded );
	assert_eq!( foo.version().as_deref(), Some( "1.0.0" ));
	assert_eq!( probe.records( "Foo" ), vec![ 1 ]);

	let status = foo.status();
	assert_eq!( status.owned_artifacts(), [ workspace.artifact( "Foo", "entry.wasm" )]);
	assert_eq!( status.entry_artifact(), Some( workspace.artifact( "Foo", "entry.wasm" ).as_path() ));

	foo.unload().unwrap();
	assert_eq!( foo.state(), LifecycleState::Compiled );
	assert_eq!( foo.version(), None );
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2 ]);

	assert_eq!( recorder.states( "Foo" ), vec![
		LifecycleState::Compiling,
		LifecycleState::Compiled,
		LifecycleState::Loading,
		LifecycleState::Loaded,
		LifecycleState::Unloading,
		LifecycleState::Compiled,
	]);
	assert_eq!( recorder.failures( "Foo" ), 0 );

}

#[test]
fn lifecycle_reload_after_unload() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	foo.load().unwrap();
	foo.unload().unwrap();
	foo.load().unwrap();

	assert_eq!( foo.state(), LifecycleState::Loaded );
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2, 1 ]);

}

#[test]
fn lifecycle_context_is_reachable_while_loaded() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	assert_eq!( foo.with_context(| context | context.data().project.clone() ).unwrap(), None );

	foo.load().unwrap();
	let project = foo.with_context(| context | context.data().project.clone() ).unwrap();
	assert_eq!( project.as_deref(), Some( "Foo" ));

}
