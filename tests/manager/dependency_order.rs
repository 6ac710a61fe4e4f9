use hotswap_link::LifecycleState ;
use crate::workspace::{ Probe, Recorder, Workspace };

fn unload_records( probe: &Probe ) -> Vec<String> {
	probe.all().into_iter()
		.filter(|( _, code )| *code == 2 )
		.map(|( project, _ )| project )
		.collect()
}

#[test]
fn dependents_unload_before_their_dependencies() {

	let workspace = Workspace::new();
	workspace
		.source( "A", "entry.wat", fixture!( "entry.wat" ))
		.source( "B", "entry.wat", fixture!( "entry.wat" ))
		.dependencies( "A", &[ "host:B" ]);
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	// Registered dependency first, so plain registry order would get it wrong.
	let b = manager.register_project( "B" ).unwrap();
	let a = manager.register_project( "A" ).unwrap();
	b.compile().unwrap();
	b.load().unwrap();
	a.compile().unwrap();
	a.load().unwrap();

	let report = manager.unload_all().unwrap();
	assert!( report.is_success() );
	assert_eq!( report.succeeded_ids().collect::<Vec<_>>(), vec![ "A", "B" ]);
	assert_eq!( unload_records( &probe ), vec![ "A", "B" ]);
	assert_eq!( recorder.order_of( LifecycleState::Unloading ), vec![ "A", "B" ]);

}

#[test]
fn unload_all_skips_projects_that_are_not_loaded() {

	let workspace = Workspace::new();
	workspace
		.source( "A", "entry.wat", fixture!( "entry.wat" ))
		.source( "B", "entry.wat", fixture!( "entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let a = manager.register_project( "A" ).unwrap();
	manager.register_project( "B" ).unwrap().compile().unwrap();
	a.compile().unwrap();
	a.load().unwrap();

	let report = manager.unload_all().unwrap();
	assert_eq!( report.succeeded_ids().collect::<Vec<_>>(), vec![ "A" ]);
	assert!( report.failed().is_empty() );

}

#[test]
fn hot_swap_all_reloads_dependencies_first() {

	let workspace = Workspace::new();
	workspace
		.source( "A", "entry.wat", fixture!( "entry.wat" ))
		.source( "B", "entry.wat", fixture!( "entry.wat" ))
		.dependencies( "A", &[ "host:B" ]);
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	let a = manager.register_project( "A" ).unwrap();
	let b = manager.register_project( "B" ).unwrap();
	b.compile().unwrap();
	b.load().unwrap();
	a.compile().unwrap();
	a.load().unwrap();

	workspace.source( "B", "entry.wat", &fixture!( "entry.wat" ).replace( "1.0.0", "2.0.0" ));
	recorder.clear();

	let report = manager.hot_swap_all().unwrap();
	assert!( report.is_success(), "{:?}", report.failed() );
	assert_eq!( report.succeeded_ids().collect::<Vec<_>>(), vec![ "B", "A" ]);
	assert_eq!( recorder.order_of( LifecycleState::Unloading ), vec![ "A", "B" ]);
	assert_eq!( recorder.order_of( LifecycleState::Loaded ), vec![ "B", "A" ]);

	assert_eq!( b.version().as_deref(), Some( "2.0.0" ));
	assert_eq!( a.version().as_deref(), Some( "1.0.0" ));
	assert_eq!( probe.records( "A" ), vec![ 1, 2, 1 ]);
	assert_eq!( probe.records( "B" ), vec![ 1, 2, 1 ]);

}
