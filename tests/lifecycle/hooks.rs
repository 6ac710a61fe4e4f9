use hotswap_link::{ LifecycleState, LoadError, ProjectErrorKind };
use crate::workspace::{ Probe, Recorder, Workspace };

#[test]
fn load_hook_trap_fails_the_load() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "trapping_load.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	match foo.load() {
		Err( err ) if matches!( err.kind, ProjectErrorKind::Load( LoadError::LoadHook( _ ))) => {},
		other => panic!( "Expected a load hook failure, found: {:?}", other ),
	}

	assert_eq!( foo.state(), LifecycleState::Compiled );
	assert_eq!( foo.version(), None );
	assert!( foo.status().owned_artifacts().is_empty() );
	assert_eq!( probe.records( "Foo" ), vec![ 1 ]);

}

#[test]
fn unload_hook_trap_is_a_warning() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "trapping_unload.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	foo.load().unwrap();

	let err = foo.unload().unwrap_err();
	assert!( err.is_warning() );
	assert!( matches!( err.kind, ProjectErrorKind::Unload( _ )));

	assert_eq!( foo.state(), LifecycleState::Compiled );
	assert_eq!( foo.version(), None );
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2 ]);
	assert_eq!( recorder.failures( "Foo" ), 1 );

	// The context is gone, so the project can be loaded again.
	foo.load().unwrap();
	assert_eq!( foo.state(), LifecycleState::Loaded );

}
