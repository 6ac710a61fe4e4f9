use hotswap_link::{ LifecycleState, LoadError, ProjectErrorKind };
use crate::workspace::{ Probe, Recorder, Workspace };

#[test]
fn entry_point_missing() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "math_lib.wat", fixture!( "math_lib.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	match foo.load() {
		Err( err ) => match err.kind {
			ProjectErrorKind::Load( LoadError::EntryPointCardinality { interface, candidates }) => {
				assert_eq!( interface, "hotswap:project/entry-point" );
				assert!( candidates.is_empty() );
			},
			other => panic!( "Expected an entry point cardinality error, found: {}", other ),
		},
		Ok( _ ) => panic!( "Expected failure" ),
	}

	assert_eq!( foo.state(), LifecycleState::Compiled );
	assert_eq!( foo.version(), None );
	assert_eq!( recorder.failures( "Foo" ), 1 );

}

#[test]
fn entry_point_ambiguous() {

	let workspace = Workspace::new();
	workspace
		.source( "Foo", "first.wat", fixture!( "entry.wat" ))
		.source( "Foo", "second.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	match foo.load() {
		Err( err ) => match err.kind {
			ProjectErrorKind::Load( LoadError::EntryPointCardinality { candidates, .. }) => assert_eq!( candidates, vec![
				workspace.artifact( "Foo", "first.wasm" ),
				workspace.artifact( "Foo", "second.wasm" ),
			]),
			other => panic!( "Expected an entry point cardinality error, found: {}", other ),
		},
		Ok( _ ) => panic!( "Expected failure" ),
	}

	assert_eq!( foo.state(), LifecycleState::Compiled );
	assert!( probe.all().is_empty() );

}

#[test]
fn entry_point_interface_is_configurable() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", &fixture!( "entry.wat" ).replace( "hotswap:project/entry-point", "acme:app/main" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );

	let mut config = workspace.config();
	config.entry_point_interface = "acme:app/main".to_string();
	let manager = workspace.manager_with( config, &probe, &recorder );
	let foo = manager.register_project( "Foo" ).unwrap();

	foo.compile().unwrap();
	assert_eq!( foo.load().unwrap(), "1.0.0" );

}
