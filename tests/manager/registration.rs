use std::sync::Arc ;
use hotswap_link::{ DuplicateIdentifierError, LifecycleState, ManagerError };
use crate::workspace::{ Probe, Recorder, Workspace };

#[test]
fn registration_rejects_duplicates() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	let foo = manager.register_project( "Foo" ).unwrap();
	foo.compile().unwrap();
	foo.load().unwrap();

	match manager.register_project( "Foo" ) {
		Err( ManagerError::Duplicate( DuplicateIdentifierError { id })) => assert_eq!( id, "Foo" ),
		other => panic!( "Expected a duplicate identifier error, found: {:?}", other ),
	}

	assert_eq!( manager.len(), 1 );
	assert!( Arc::ptr_eq( &manager.project( "Foo" ).unwrap(), &foo ));
	assert_eq!( foo.state(), LifecycleState::Loaded );

}

#[test]
fn registration_rejects_path_like_identifiers() {

	let workspace = Workspace::new();
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	for id in [ "", "..", "a/b", "host:Foo" ] {
		match manager.register_project( id ) {
			Err( ManagerError::InvalidIdentifier( rejected )) => assert_eq!( rejected, id ),
			other => panic!( "Expected '{}' to be rejected, found: {:?}", id, other ),
		}
	}
	assert!( manager.is_empty() );

}

#[test]
fn deregistration_unloads_first() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	let foo = manager.register_project( "Foo" ).unwrap();
	foo.compile().unwrap();
	foo.load().unwrap();

	assert!( manager.deregister( "Foo" ).unwrap().is_none() );
	assert!( manager.project( "Foo" ).is_none() );
	assert_eq!( foo.state(), LifecycleState::Compiled );
	assert_eq!( probe.records( "Foo" ), vec![ 1, 2 ]);

	// The identifier is free again.
	manager.register_project( "Foo" ).unwrap();

}

#[test]
fn deregistration_reports_unload_warnings() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "trapping_unload.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	let foo = manager.register_project( "Foo" ).unwrap();
	foo.compile().unwrap();
	foo.load().unwrap();

	let warning = manager.deregister( "Foo" ).unwrap();
	assert!( warning.is_some_and(| warning | warning.is_warning() ));
	assert!( manager.is_empty() );

}

#[test]
fn deregistration_of_unknown_project_fails() {

	let workspace = Workspace::new();
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	assert!( matches!( manager.deregister( "Ghost" ), Err( ManagerError::UnknownProject( id )) if id == "Ghost" ));

}
