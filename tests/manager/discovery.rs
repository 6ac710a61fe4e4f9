use hotswap_link::LifecycleState ;
use crate::workspace::{ Probe, Recorder, Workspace };

#[test]
fn discovery_tracks_project_directories() {

	let workspace = Workspace::new();
	workspace
		.source( "Foo", "entry.wat", fixture!( "entry.wat" ))
		.source( "Bar", "entry.wat", fixture!( "entry.wat" ));
	std::fs::create_dir_all( workspace.root().join( "notes" )).unwrap();
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	let report = manager.discover().unwrap();
	assert_eq!( report.added, vec![ "Bar", "Foo" ]);
	assert!( report.removed.is_empty() );
	assert!( report.failures.is_empty() );
	assert_eq!( manager.ids(), vec![ "Bar", "Foo" ]);

	// Nothing changed on disk, nothing changes in the registry.
	let report = manager.discover().unwrap();
	assert!( report.added.is_empty() && report.removed.is_empty() );

	let bar = manager.project( "Bar" ).unwrap();
	bar.compile().unwrap();
	bar.load().unwrap();

	std::fs::remove_dir_all( workspace.project_root( "Bar" ).join( "src" )).unwrap();
	let report = manager.discover().unwrap();
	assert_eq!( report.removed, vec![ "Bar" ]);
	assert_eq!( manager.ids(), vec![ "Foo" ]);
	assert_eq!( bar.state(), LifecycleState::Compiled );
	assert_eq!( probe.records( "Bar" ), vec![ 1, 2 ]);

}

#[test]
fn discovery_fails_without_projects_root() {

	let workspace = Workspace::new();
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager_with(
		hotswap_link::ManagerConfig::new( workspace.root().join( "missing" )),
		&probe,
		&recorder,
	);

	assert!( matches!( manager.discover(), Err( hotswap_link::ManagerError::Io { .. })));

}
