use hotswap_link::{ LifecycleState, ProjectManager };
use crate::workspace::{ Probe, Recorder, TestContext, Workspace };

/// Loads A and B, then makes each depend on the other through `host:`.
fn cyclic( workspace: &Workspace, probe: &Probe, recorder: &Recorder ) -> ProjectManager<TestContext> {

	workspace
		.source( "A", "entry.wat", fixture!( "entry.wat" ))
		.source( "B", "entry.wat", fixture!( "entry.wat" ));
	let manager = workspace.manager( probe, recorder );
	for id in [ "A", "B" ] { manager.register_project( id ).unwrap(); }
	assert!( manager.compile_all().is_success() );
	assert!( manager.load_all().is_success() );

	// Each swap resolves against the other project while it is still loaded.
	workspace.dependencies( "A", &[ "host:B" ]).dependencies( "B", &[ "host:A" ]);
	manager.project( "A" ).unwrap().hot_swap().unwrap();
	manager.project( "B" ).unwrap().hot_swap().unwrap();

	manager

}

#[test]
fn dependency_cycle_blocks_unload_all() {

	let workspace = Workspace::new();
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = cyclic( &workspace, &probe, &recorder );
	recorder.clear();

	let err = manager.unload_all().unwrap_err();
	assert!( err.to_string().starts_with( "Dependency cycle: " ));
	let cycle = err.cycle.into_iter().collect::<Vec<_>>();
	assert_eq!( cycle.len(), 3 );
	assert_eq!( cycle.first(), cycle.last() );
	assert!( cycle.contains( &"A".to_string() ) && cycle.contains( &"B".to_string() ));

	// Nothing was touched.
	assert!( recorder.states( "A" ).is_empty() && recorder.states( "B" ).is_empty() );
	for id in [ "A", "B" ] {
		assert_eq!( manager.project( id ).unwrap().state(), LifecycleState::Loaded );
	}

}

#[test]
fn dependency_cycle_blocks_shutdown_and_hot_swap_all() {

	let workspace = Workspace::new();
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = cyclic( &workspace, &probe, &recorder );
	recorder.clear();

	assert!( manager.hot_swap_all().is_err() );
	assert!( manager.shutdown().is_err() );

	assert_eq!( manager.len(), 2 );
	assert!( recorder.states( "A" ).is_empty() && recorder.states( "B" ).is_empty() );

	// Breaking the cycle by hand lets the manager shut down.
	workspace.dependencies( "B", &[]);
	manager.project( "B" ).unwrap().hot_swap().unwrap();
	assert!( manager.shutdown().unwrap().is_success() );
	assert!( manager.is_empty() );

}
