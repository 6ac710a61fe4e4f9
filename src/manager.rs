//! The project registry and its batch operations.
//!
//! A [`ProjectManager`] owns every project under one projects root. It keeps
//! identifiers unique, fans operations out across projects and collects
//! per-project failures into a [`BatchReport`] rather than stopping at the first.
//!
//! Projects may depend on each other: project `A` depends on `B` when any
//! dependency resolved by `A`'s last compile points inside `B`'s root, which is
//! what `host:B` declarations resolve to. [`ProjectManager::unload_all`] unloads
//! dependents before their dependencies and refuses to touch anything when the
//! dependencies form a cycle.

use std::path::PathBuf ;
use std::sync::{ Arc, PoisonError, RwLock };
use indexmap::IndexMap ;
use pipe_trait::Pipe ;
use thiserror::Error ;
use wasmtime::Engine ;
use wasmtime::component::Linker ;

use crate::ProjectContext ;
use crate::compiler::{ CompileOutput, Compiler };
use crate::config::{ ConfigError, ManagerConfig };
use crate::loader::{ ModuleLoader, UnloadError };
use crate::project::{
	HotSwapOutcome, LifecycleError, LifecycleState, NoopListener, Project,
	ProjectError, ProjectErrorKind, ProjectLayout, ProjectServices, StateListener,
};
use crate::resolver::{ HostModuleResolver, ResolverChain, ResolverExtension };

mod report ;
mod unload_order ;
mod managed_projects ;

pub use report::BatchReport ;
pub use unload_order::DependencyCycleError ;
pub use managed_projects::ManagedProjects ;
use unload_order::{ load_order, unload_order };



type SharedRegistry<Ctx> = RwLock<IndexMap<String, Arc<Project<Ctx>>>> ;

/// A project with this identifier is already registered. The existing one is untouched.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
#[error( "A project named '{id}' is already registered" )]
pub struct DuplicateIdentifierError {
	pub id: String,
}

/// Errors of registry-level operations.
#[derive( Error, Debug )]
pub enum ManagerError {
	#[error( transparent )] Duplicate( #[from] DuplicateIdentifierError ),
	#[error( "No project named '{0}' is registered" )] UnknownProject( String ),
	#[error( "'{0}' is not a valid project identifier" )] InvalidIdentifier( String ),
	#[error( transparent )] Project( #[from] ProjectError ),
	#[error( "Failed to scan '{}': {source}", path.display() )]
	Io { path: PathBuf, source: std::io::Error },
}

/// A row of [`ProjectManager::status`].
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct ProjectSummary {
	pub id: String,
	pub state: LifecycleState,
	pub version: Option<String>,
}

/// What [`ProjectManager::discover`] changed.
#[derive( Debug, Default )]
pub struct DiscoveryReport {
	/// Newly registered projects, sorted by name.
	pub added: Vec<String>,
	/// Projects deregistered because their source directory disappeared.
	pub removed: Vec<String>,
	/// Projects that could not be registered or deregistered.
	pub failures: Vec<ManagerError>,
}

/// Owns a registry of projects and drives them as a group.
///
/// Several managers may coexist; each has its own registry, compiler, loader and listener.
pub struct ProjectManager<Ctx: ProjectContext = ()> {
	config: ManagerConfig,
	services: ProjectServices<Ctx>,
	registry: Arc<SharedRegistry<Ctx>>,
}

/// Configures a [`ProjectManager`].
pub struct ProjectManagerBuilder<Ctx: ProjectContext> {
	config: ManagerConfig,
	engine: Engine,
	host_linker: Option<Linker<Ctx>>,
	listener: Arc<dyn StateListener>,
	compiler: Option<Arc<dyn Compiler>>,
	extensions: Vec<Box<dyn ResolverExtension>>,
	managed_prefix: Option<String>,
}

impl<Ctx: ProjectContext> ProjectManagerBuilder<Ctx> {

	/// Host functions every project can import. Must belong to the builder's engine.
	///
	/// This is the host namespace `provided` dependencies resolve against.
	pub fn host_linker( mut self, linker: Linker<Ctx> ) -> Self {
		self.host_linker = Some( linker );
		self
	}

	/// Receives every transition of every project.
	pub fn listener( mut self, listener: impl StateListener + 'static ) -> Self {
		self.listener = Arc::new( listener );
		self
	}

	/// Overrides the compiler selected by the configuration.
	pub fn compiler( mut self, compiler: impl Compiler + 'static ) -> Self {
		self.compiler = Some( Arc::new( compiler ));
		self
	}

	/// Adds a resolver extension. Extensions are consulted in the order added,
	/// before the managed host modules and the base resolver.
	pub fn resolver_extension( mut self, extension: impl ResolverExtension + 'static ) -> Self {
		self.extensions.push( Box::new( extension ));
		self
	}

	/// Sets the prefix under which projects of this manager can be referenced
	/// (`host:` by default), or disables such references with `None`.
	pub fn managed_host_modules( mut self, prefix: Option<&str> ) -> Self {
		self.managed_prefix = prefix.map( str::to_string );
		self
	}

	/// Validates the configuration and creates the manager.
	///
	/// # Errors
	/// Returns [`ConfigError::Invalid`] if the configuration is unusable.
	pub fn build( self ) -> Result<ProjectManager<Ctx>, ConfigError> {

		self.config.validate()?;

		let registry = Arc::new( RwLock::new( IndexMap::new() ));

		let mut resolver = ResolverChain::new();
		self.extensions.into_iter().for_each(| extension | resolver.push_extension( extension ));
		if let Some( prefix ) = self.managed_prefix {
			let managed = ManagedProjects::new( Arc::downgrade( &registry ));
			resolver.push_extension( Box::new( HostModuleResolver::with_prefix( prefix, Arc::new( managed ))));
		}

		let linker = self.host_linker.unwrap_or_else(|| Linker::new( &self.engine ));
		let loader = ModuleLoader::new( self.engine, linker ).with_entry_interface( &self.config.entry_point_interface );
		let compiler = self.compiler.unwrap_or_else(|| self.config.compiler.build() );

		tracing::debug!(
			root = %self.config.projects_root.display(),
			interface = %self.config.entry_point_interface,
			parallel = self.config.parallel_compile,
			"project manager ready"
		);

		Ok( ProjectManager {
			services: ProjectServices {
				resolver: Arc::new( resolver ),
				compiler,
				loader: Arc::new( loader ),
				listener: self.listener,
			},
			config: self.config,
			registry,
		})

	}

}

impl<Ctx: ProjectContext> ProjectManager<Ctx> {

	/// Starts configuring a manager that runs components on `engine`.
	pub fn builder( config: ManagerConfig, engine: Engine ) -> ProjectManagerBuilder<Ctx> {
		ProjectManagerBuilder {
			config,
			engine,
			host_linker: None,
			listener: Arc::new( NoopListener ),
			compiler: None,
			extensions: Vec::new(),
			managed_prefix: Some( HostModuleResolver::DEFAULT_PREFIX.to_string() ),
		}
	}

	/// A manager with a default engine, an empty host linker and no listener.
	///
	/// # Errors
	/// Returns [`ConfigError::Invalid`] if the configuration is unusable.
	pub fn new( config: ManagerConfig ) -> Result<Self, ConfigError> {
		Self::builder( config, Engine::default() ).build()
	}

	#[inline] pub fn config( &self ) -> &ManagerConfig { &self.config }
	#[inline] pub fn engine( &self ) -> &Engine { self.services.loader.engine() }

	/// Registers the project rooted at `<projects_root>/<id>`.
	///
	/// # Errors
	/// [`DuplicateIdentifierError`] if `id` is taken, leaving the registered project
	/// as it was, or [`ManagerError::InvalidIdentifier`] if `id` is not a plain name.
	pub fn register_project( &self, id: &str ) -> Result<Arc<Project<Ctx>>, ManagerError> {

		if !is_valid_identifier( id ) {
			return Err( ManagerError::InvalidIdentifier( id.to_string() ));
		}

		let mut registry = self.registry.write().unwrap_or_else( PoisonError::into_inner );
		if registry.contains_key( id ) {
			return Err( DuplicateIdentifierError { id: id.to_string() }.into() );
		}

		let layout = ProjectLayout::new( self.config.projects_root.join( id ), &self.config.layout );
		let project = Arc::new( Project::new( id, layout, self.services.clone() ));
		registry.insert( id.to_string(), Arc::clone( &project ));

		tracing::info!( project = %id, "registered" );
		Ok( project )

	}

	/// Removes a project, unloading it first if it is loaded.
	///
	/// Returns the unload hook warning, if the hook trapped.
	///
	/// # Errors
	/// Fails without deregistering if the project is unknown or cannot be unloaded.
	pub fn deregister( &self, id: &str ) -> Result<Option<ProjectError>, ManagerError> {

		let project = self.project( id ).ok_or_else(|| ManagerError::UnknownProject( id.to_string() ))?;

		let warning = match project.is_loaded() {
			false => None,
			true => match project.unload() {
				Ok(()) => None,
				Err( err ) if err.is_warning() => Some( err ),
				Err( err ) => return Err( err.into() ),
			},
		};

		self.registry.write().unwrap_or_else( PoisonError::into_inner ).shift_remove( id );
		tracing::info!( project = %id, "deregistered" );
		Ok( warning )

	}

	/// Looks a project up by identifier.
	pub fn project( &self, id: &str ) -> Option<Arc<Project<Ctx>>> {
		self.registry.read().unwrap_or_else( PoisonError::into_inner ).get( id ).cloned()
	}

	/// Registered identifiers, in registration order.
	pub fn ids( &self ) -> Vec<String> {
		self.registry.read().unwrap_or_else( PoisonError::into_inner ).keys().cloned().collect()
	}

	pub fn len( &self ) -> usize { self.registry.read().unwrap_or_else( PoisonError::into_inner ).len() }
	pub fn is_empty( &self ) -> bool { self.len() == 0 }

	/// State and version of every project, in registration order.
	pub fn status( &self ) -> Vec<ProjectSummary> {
		self.snapshot().iter()
			.map(| project | {
				let status = project.status();
				ProjectSummary {
					id: project.id().to_string(),
					state: status.state(),
					version: status.version().map( str::to_string ),
				}
			})
			.collect()
	}

	/// Compiles every project, in parallel when configured to.
	///
	/// The report keeps registration order either way.
	pub fn compile_all( &self ) -> BatchReport<CompileOutput> {
		let projects = self.snapshot();
		match self.config.parallel_compile && projects.len() > 1 {
			false => projects.iter()
				.map(| project | ( project.id().to_string(), project.compile() ))
				.collect(),
			true => std::thread::scope(| scope | {
				let handles = projects.iter()
					.map(| project | ( project, scope.spawn(|| project.compile() )))
					.collect::<Vec<_>>();
				handles.into_iter()
					.map(|( project, handle )| ( project.id().to_string(), handle.join().unwrap_or_else(| _ |
						Err( ProjectError::new( project.id(), LifecycleError::Panicked ))
					)))
					.collect()
			}),
		}
	}

	/// Loads every project, in registration order.
	pub fn load_all( &self ) -> BatchReport<String> {
		self.snapshot().iter()
			.map(| project | ( project.id().to_string(), project.load() ))
			.collect()
	}

	/// Unloads every loaded project, dependents before their dependencies.
	///
	/// # Errors
	/// A [`DependencyCycleError`] among the loaded projects; nothing is unloaded then.
	pub fn unload_all( &self ) -> Result<BatchReport<()>, DependencyCycleError> {
		let loaded = self.snapshot().into_iter().filter(| project | project.is_loaded() ).collect::<Vec<_>>();
		let order = dependency_graph( &loaded ).pipe_ref( unload_order )?;
		tracing::debug!( ?order, "unloading" );
		Ok( order.iter()
			.filter_map(| id | loaded.iter().find(| project | project.id() == id ))
			.map(| project | ( project.id().to_string(), project.unload() ))
			.collect())
	}

	/// Hot-swaps every project.
	///
	/// Loaded projects are first unloaded in dependency order. Then every project is
	/// compiled and loaded, dependencies before their dependents. A project whose
	/// unload failed outright is not recompiled; an unload hook warning travels in
	/// its outcome (or in `preceding` if a later step failed).
	///
	/// # Errors
	/// A [`DependencyCycleError`], found before anything is touched.
	pub fn hot_swap_all( &self ) -> Result<BatchReport<HotSwapOutcome>, DependencyCycleError> {

		let projects = self.snapshot();
		let loaded = projects.iter().filter(| project | project.is_loaded() ).cloned().collect::<Vec<_>>();
		let unload = dependency_graph( &loaded ).pipe_ref( unload_order )?;
		let reload = dependency_graph( &projects ).pipe_ref( load_order )?;

		let mut unload_results = IndexMap::with_capacity( unload.len() );
		for id in &unload {
			if let Some( project ) = loaded.iter().find(| project | project.id() == id ) {
				unload_results.insert( id.clone(), project.unload() );
			}
		}

		Ok( reload.iter()
			.filter_map(| id | projects.iter().find(| project | project.id() == id ))
			.map(| project | {
				let unload_warning = match unload_results.shift_remove( project.id() ) {
					None | Some( Ok(())) => None,
					Some( Err( ProjectError { kind: ProjectErrorKind::Unload( warning ), .. })) => Some( warning ),
					Some( Err( err )) => return ( project.id().to_string(), Err( err )),
				};
				( project.id().to_string(), swap( project, unload_warning ))
			})
			.collect())

	}

	/// Registers new project directories and drops projects whose sources vanished.
	///
	/// A directory is a project when it contains the configured source directory.
	///
	/// # Errors
	/// Fails only if the projects root cannot be listed.
	pub fn discover( &self ) -> Result<DiscoveryReport, ManagerError> {

		let root = &self.config.projects_root ;
		let io_error = | source: std::io::Error | ManagerError::Io { path: root.clone(), source };

		let mut found = Vec::new();
		for entry in std::fs::read_dir( root ).map_err( io_error )? {
			let path = entry.map_err( io_error )?.path();
			if path.join( &self.config.layout.source_dir ).is_dir() {
				if let Some( name ) = path.file_name().and_then(| name | name.to_str() ) {
					found.push( name.to_string() );
				}
			}
		}
		found.sort();

		let mut report = DiscoveryReport::default();
		let known = self.ids();

		for id in found.iter().filter(| id | !known.contains( *id )) {
			match self.register_project( id ) {
				Ok( _ ) => report.added.push( id.clone() ),
				Err( err ) => report.failures.push( err ),
			}
		}

		for project in self.snapshot().iter().filter(| project | !project.layout().source_dir().is_dir() ) {
			match self.deregister( project.id() ) {
				Ok( warning ) => {
					report.removed.push( project.id().to_string() );
					report.failures.extend( warning.map( ManagerError::Project ));
				},
				Err( err ) => report.failures.push( err ),
			}
		}

		tracing::info!( added = report.added.len(), removed = report.removed.len(), failures = report.failures.len(), "discovery finished" );
		Ok( report )

	}

	/// Unloads everything in dependency order, then deregisters every project at rest.
	///
	/// A project still loaded afterwards, because its unload failed outright, stays
	/// registered and its error is in the report. So does a project caught in the
	/// middle of another operation. Unload hook warnings do not keep a project.
	///
	/// # Errors
	/// A [`DependencyCycleError`]; the registry is left untouched then.
	pub fn shutdown( &self ) -> Result<BatchReport<()>, DependencyCycleError> {

		let report = self.unload_all()?;

		let mut registry = self.registry.write().unwrap_or_else( PoisonError::into_inner );
		registry.retain(| _, project | !matches!( project.state(), LifecycleState::Unloaded | LifecycleState::Compiled ));
		let kept = registry.keys().cloned().collect::<Vec<_>>();
		drop( registry );

		tracing::info!( failures = report.failed().len(), ?kept, "shut down" );
		Ok( report )

	}

	fn snapshot( &self ) -> Vec<Arc<Project<Ctx>>> {
		self.registry.read().unwrap_or_else( PoisonError::into_inner ).values().cloned().collect()
	}

}

impl<Ctx: ProjectContext> std::fmt::Debug for ProjectManager<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ProjectManager" )
			.field( "config", &self.config )
			.field( "projects", &self.ids() )
			.finish_non_exhaustive()
	}
}

fn swap<Ctx: ProjectContext>( project: &Project<Ctx>, unload_warning: Option<UnloadError> ) -> Result<HotSwapOutcome, ProjectError> {
	let with_warning = | mut err: ProjectError, warning: Option<UnloadError> | {
		err.preceding.extend( warning.map( ProjectErrorKind::Unload ));
		err
	};
	let output = match project.compile() {
		Ok( output ) => output,
		Err( err ) => return Err( with_warning( err, unload_warning )),
	};
	match project.load() {
		Ok( version ) => Ok( HotSwapOutcome { version, warnings: output.warnings, unload_warning }),
		Err( err ) => Err( with_warning( err, unload_warning )),
	}
}

/// Maps each project to the projects its resolved dependencies point into.
fn dependency_graph<Ctx: ProjectContext>( projects: &[Arc<Project<Ctx>>] ) -> IndexMap<String, Vec<String>> {
	let roots = projects.iter()
		.map(| project | {
			let root = project.layout().root();
			( project.id(), std::fs::canonicalize( root ).unwrap_or_else(| _ | root.to_path_buf() ))
		})
		.collect::<Vec<_>>();

	projects.iter()
		.map(| project | {
			let dependencies = project.dependencies();
			let edges = roots.iter()
				.filter(|( id, root )| *id != project.id()
					&& dependencies.iter().any(| dependency | dependency.artifact().starts_with( root )))
				.map(|( id, _ )| ( *id ).to_string() )
				.collect();
			( project.id().to_string(), edges )
		})
		.collect()
}

fn is_valid_identifier( id: &str ) -> bool {
	!id.is_empty()
		&& id != "." && id != ".."
		&& !id.starts_with( '.' )
		&& !id.contains([ '/', '\\', ':' ])
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn identifiers_must_be_plain_names() {
		assert!( is_valid_identifier( "Foo" ));
		assert!( is_valid_identifier( "my-project_2" ));
		assert!( !is_valid_identifier( "" ));
		assert!( !is_valid_identifier( ".." ));
		assert!( !is_valid_identifier( ".hidden" ));
		assert!( !is_valid_identifier( "a/b" ));
		assert!( !is_valid_identifier( "host:Foo" ));
	}

}
