use hotswap_link::{ Dependency, DependencyScope, LifecycleState, LoadError, ProjectErrorKind };
use crate::workspace::{ Probe, Recorder, Workspace };

#[test]
fn sources_of_one_project_link_to_each_other() {

	let workspace = Workspace::new();
	workspace
		.source( "App", "math_lib.wat", fixture!( "math_lib.wat" ))
		.source( "App", "math_entry.wat", fixture!( "math_entry.wat" ));
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let app = manager.register_project( "App" ).unwrap();

	app.compile().unwrap();
	app.load().unwrap();

	assert_eq!( probe.records( "App" ), vec![ 42 ]);
	assert_eq!( app.status().owned_artifacts(), [
		workspace.artifact( "App", "math_lib.wasm" ),
		workspace.artifact( "App", "math_entry.wasm" ),
	]);
	assert_eq!( app.status().entry_artifact(), Some( workspace.artifact( "App", "math_entry.wasm" ).as_path() ));

}

#[test]
fn include_dependencies_are_instantiated_inside_the_project() {

	let workspace = Workspace::new();
	workspace
		.source( "Lib", "math_lib.wat", fixture!( "math_lib.wat" ))
		.source( "App", "math_entry.wat", fixture!( "math_entry.wat" ))
		.dependencies( "App", &[ "include:../Lib/bin/math_lib.wasm" ]);
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let lib = manager.register_project( "Lib" ).unwrap();
	let app = manager.register_project( "App" ).unwrap();

	lib.compile().unwrap();
	let output = app.compile().unwrap();

	let artifact = std::fs::canonicalize( workspace.artifact( "Lib", "math_lib.wasm" )).unwrap();
	assert_eq!( output.classpath, vec![ Dependency::include( &artifact )]);
	assert_eq!( app.dependencies(), output.classpath );

	app.load().unwrap();
	assert_eq!( probe.records( "App" ), vec![ 42 ]);
	assert!( app.status().owned_artifacts().contains( &artifact ));
	assert_eq!( lib.state(), LifecycleState::Compiled );

}

#[test]
fn provided_dependencies_come_from_the_host() {

	let workspace = Workspace::new();
	workspace
		.source( "Lib", "math_lib.wat", fixture!( "math_lib.wat" ))
		.source( "App", "math_entry.wat", fixture!( "math_entry.wat" ))
		.dependencies( "App", &[ "provided:../Lib/bin/math_lib.wasm" ]);
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );

	let engine = hotswap_link::Engine::default();
	let mut linker = probe.linker( &engine );
	linker.instance( "hotswap:lib/math" ).unwrap()
		.func_wrap( "answer", | _ctx, (): () | Ok(( 7_u32, )))
		.unwrap();
	let manager = hotswap_link::ProjectManager::builder( workspace.config(), engine )
		.host_linker( linker )
		.listener( recorder.clone() )
		.build()
		.unwrap();

	manager.register_project( "Lib" ).unwrap().compile().unwrap();
	let app = manager.register_project( "App" ).unwrap();
	app.compile().unwrap();

	let artifact = std::fs::canonicalize( workspace.artifact( "Lib", "math_lib.wasm" )).unwrap();
	assert_eq!( app.dependencies().len(), 1 );
	assert_eq!( app.dependencies()[0].scope(), DependencyScope::Provided );

	app.load().unwrap();
	assert_eq!( probe.records( "App" ), vec![ 7 ]);
	assert!( !app.status().owned_artifacts().contains( &artifact ));

}

#[test]
fn provided_dependencies_missing_from_the_host_fail_the_load() {

	let workspace = Workspace::new();
	workspace
		.source( "Lib", "math_lib.wat", fixture!( "math_lib.wat" ))
		.source( "App", "math_entry.wat", fixture!( "math_entry.wat" ))
		.dependencies( "App", &[ "provided:../Lib/bin/math_lib.wasm" ]);
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );

	manager.register_project( "Lib" ).unwrap().compile().unwrap();
	let app = manager.register_project( "App" ).unwrap();
	app.compile().unwrap();

	match app.load() {
		Err( err ) if matches!( err.kind, ProjectErrorKind::Load( LoadError::UnresolvedImports { .. })) => {},
		other => panic!( "Expected unresolved imports, found: {:?}", other ),
	}
	assert_eq!( app.state(), LifecycleState::Compiled );
	assert!( probe.all().is_empty() );

}

#[test]
fn host_modules_resolve_to_loaded_projects() {

	let workspace = Workspace::new();
	workspace
		.source( "A", "entry.wat", fixture!( "entry.wat" ))
		.source( "B", "entry.wat", fixture!( "entry.wat" ))
		.dependencies( "A", &[ "host:B" ]);
	let ( probe, recorder ) = ( Probe::default(), Recorder::default() );
	let manager = workspace.manager( &probe, &recorder );
	let a = manager.register_project( "A" ).unwrap();
	let b = manager.register_project( "B" ).unwrap();

	// B is not loaded yet, so `host:B` has nothing to point at.
	assert!( matches!( a.compile().unwrap_err().kind, ProjectErrorKind::Resolution( _ )));

	b.compile().unwrap();
	b.load().unwrap();
	a.compile().unwrap();

	let artifact = std::fs::canonicalize( workspace.artifact( "B", "entry.wasm" )).unwrap();
	assert_eq!( a.dependencies(), vec![ Dependency::provided( &artifact )]);

	a.load().unwrap();
	assert!( !a.status().owned_artifacts().contains( &artifact ));

}
