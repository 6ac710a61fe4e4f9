use std::sync::{ Arc, Mutex, OnceLock, Weak };
use hotswap_link::{ Engine, FnListener, LifecycleError, LifecycleState, Project, ProjectErrorKind, ProjectManager, StateEvent };
use crate::workspace::{ Probe, TestContext, Workspace };

#[test]
fn operations_on_a_busy_project_are_rejected() {

	let workspace = Workspace::new();
	workspace.source( "Foo", "entry.wat", fixture!( "entry.wat" ));

	let project: Arc<OnceLock<Weak<Project<TestContext>>>> = Arc::new( OnceLock::new() );
	let attempts = Arc::new( Mutex::new( Vec::new() ));

	let listener = {
		let ( project, attempts ) = ( Arc::clone( &project ), Arc::clone( &attempts ));
		FnListener( move | _id: &str, event: &StateEvent<'_> | {
			if let ( StateEvent::Compiling, Some( project )) = ( event, project.get().and_then( Weak::upgrade )) {
				attempts.lock().unwrap().push(( project.state(), project.load().map(| _ | () ), project.compile().map(| _ | () )));
			}
		})
	};

	let probe = Probe::default();
	let engine = Engine::default();
	let manager = ProjectManager::builder( workspace.config(), engine.clone() )
		.host_linker( probe.linker( &engine ))
		.listener( listener )
		.build()
		.unwrap();

	let foo = manager.register_project( "Foo" ).unwrap();
	project.set( Arc::downgrade( &foo )).unwrap();

	foo.compile().unwrap();

	let attempts = attempts.lock().unwrap();
	assert_eq!( attempts.len(), 1 );
	let ( state, load, compile ) = &attempts[0];
	assert_eq!( *state, LifecycleState::Compiling );
	for result in [ load, compile ] {
		match result {
			Err( err ) => assert!( matches!( err.kind, ProjectErrorKind::Lifecycle( LifecycleError::Busy ))),
			Ok(()) => panic!( "Expected the busy project to reject the operation" ),
		}
	}
	assert_eq!( foo.state(), LifecycleState::Compiled );

}
