//! The per-project lifecycle state machine.
//!
//! ```text
//!              compile                 load
//! UNLOADED ──► COMPILING ──► COMPILED ──► LOADING ──► LOADED
//!    ▲             │            ▲  ▲          │          │
//!    └── failure ──┘            │  └─ failure ┘          │ unload
//!                               └───────── UNLOADING ◄───┘
//! ```
//!
//! A [`Project`] serialises its transitions behind an exclusive lock taken with
//! `try_lock`: a second operation on a busy project is rejected with
//! [`LifecycleError::Busy`] instead of waiting. Status is kept separately, so
//! [`Project::state`] and friends never block on a running operation.

use std::path::PathBuf ;
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError };
use thiserror::Error ;

use crate::ProjectContext ;
use crate::compiler::{ CompileError, CompileOutput, Compiler, Diagnostic, StagedOutput };
use crate::dependency::Dependency ;
use crate::loader::{ ExecutionContext, LoadError, LoadedModule, ModuleLoader, UnloadError };
use crate::resolver::{ DependencyResolutionError, DependencyResolver, ProjectLocation };

mod state ;
mod listener ;
mod layout ;

pub use state::{ LifecycleState, LifecycleError, Operation };
pub use listener::{ StateEvent, StateListener, NoopListener, FnListener };
pub use layout::ProjectLayout ;



/// Why a single project operation failed.
#[derive( Error, Debug )]
pub enum ProjectErrorKind {
	#[error( transparent )] Lifecycle( #[from] LifecycleError ),
	#[error( transparent )] Resolution( #[from] DependencyResolutionError ),
	#[error( transparent )] Compile( #[from] CompileError ),
	#[error( transparent )] Load( #[from] LoadError ),
	#[error( transparent )] Unload( #[from] UnloadError ),
}

/// A failed project operation, tagged with the project it happened to.
///
/// `preceding` holds problems from earlier steps of the same operation that did
/// not stop it, such as an unload hook trapping at the start of a hot swap.
#[derive( Error, Debug )]
#[error( "Project '{project}': {kind}" )]
pub struct ProjectError {
	pub project: String,
	#[source] pub kind: ProjectErrorKind,
	pub preceding: Vec<ProjectErrorKind>,
}

impl ProjectError {

	pub(crate) fn new( project: &str, kind: impl Into<ProjectErrorKind> ) -> Self {
		Self { project: project.to_string(), kind: kind.into(), preceding: Vec::with_capacity( 0 ) }
	}

	/// Whether this only reports an unload hook failure: the project was still unloaded.
	pub fn is_warning( &self ) -> bool {
		matches!( self.kind, ProjectErrorKind::Unload( _ )) && self.preceding.is_empty()
	}

}

/// The collaborators a project drives. Cheap to clone; managers share one set.
pub struct ProjectServices<Ctx: ProjectContext> {
	pub resolver: Arc<dyn DependencyResolver>,
	pub compiler: Arc<dyn Compiler>,
	pub loader: Arc<ModuleLoader<Ctx>>,
	pub listener: Arc<dyn StateListener>,
}

impl<Ctx: ProjectContext> Clone for ProjectServices<Ctx> {
	fn clone( &self ) -> Self {
		Self {
			resolver: Arc::clone( &self.resolver ),
			compiler: Arc::clone( &self.compiler ),
			loader: Arc::clone( &self.loader ),
			listener: Arc::clone( &self.listener ),
		}
	}
}

impl<Ctx: ProjectContext> std::fmt::Debug for ProjectServices<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ProjectServices" )
			.field( "loader", &self.loader )
			.finish_non_exhaustive()
	}
}

/// A point-in-time view of a project.
#[derive( Clone, Debug, Default )]
pub struct ProjectStatus {
	state: LifecycleState,
	version: Option<String>,
	declarations: Vec<String>,
	dependencies: Vec<Dependency>,
	warnings: Vec<Diagnostic>,
	owned_artifacts: Vec<PathBuf>,
	entry_artifact: Option<PathBuf>,
}

impl ProjectStatus {
	#[inline] pub fn state( &self ) -> LifecycleState { self.state }
	/// The entry point's version, while loaded.
	#[inline] pub fn version( &self ) -> Option<&str> { self.version.as_deref() }
	/// Declarations read by the last compile.
	#[inline] pub fn declarations( &self ) -> &[String] { &self.declarations }
	/// Dependencies resolved by the last successful compile; empty after a failed one.
	#[inline] pub fn dependencies( &self ) -> &[Dependency] { &self.dependencies }
	/// Warnings of the last successful compile.
	#[inline] pub fn warnings( &self ) -> &[Diagnostic] { &self.warnings }
	/// Artifacts instantiated in the execution context, while loaded.
	#[inline] pub fn owned_artifacts( &self ) -> &[PathBuf] { &self.owned_artifacts }
	/// The artifact that provided the entry point, while loaded.
	#[inline] pub fn entry_artifact( &self ) -> Option<&std::path::Path> { self.entry_artifact.as_deref() }
}

/// What a successful hot swap did.
#[derive( Debug )]
pub struct HotSwapOutcome {
	/// Version reported by the freshly loaded entry point.
	pub version: String,
	/// Warnings of the compile step.
	pub warnings: Vec<Diagnostic>,
	/// Set if the old entry point's unload hook trapped.
	pub unload_warning: Option<UnloadError>,
}

type Slot<Ctx> = Option<LoadedModule<Ctx>> ;

/// One source tree bound to at most one live entry point.
pub struct Project<Ctx: ProjectContext> {
	id: String,
	layout: ProjectLayout,
	services: ProjectServices<Ctx>,
	module: Mutex<Slot<Ctx>>,
	status: RwLock<ProjectStatus>,
}

impl<Ctx: ProjectContext> Project<Ctx> {

	/// Creates an `Unloaded` project.
	pub fn new( id: impl Into<String>, layout: ProjectLayout, services: ProjectServices<Ctx> ) -> Self {
		Self {
			id: id.into(),
			layout,
			services,
			module: Mutex::new( None ),
			status: RwLock::new( ProjectStatus::default() ),
		}
	}

	#[inline] pub fn id( &self ) -> &str { &self.id }
	#[inline] pub fn layout( &self ) -> &ProjectLayout { &self.layout }

	pub fn state( &self ) -> LifecycleState { self.read_status().state }
	pub fn status( &self ) -> ProjectStatus { self.read_status().clone() }
	pub fn version( &self ) -> Option<String> { self.read_status().version.clone() }
	pub fn dependencies( &self ) -> Vec<Dependency> { self.read_status().dependencies.clone() }
	pub fn is_loaded( &self ) -> bool { self.state() == LifecycleState::Loaded }

	/// Compiles the sources against freshly resolved dependencies.
	///
	/// Valid from `Unloaded` or `Compiled`. On failure the project is `Unloaded`
	/// and the previous binaries are left exactly as they were.
	///
	/// # Errors
	/// Lifecycle, resolution or compile errors, tagged with the project id.
	pub fn compile( &self ) -> Result<CompileOutput, ProjectError> {
		let _guard = self.acquire()?;
		self.compile_locked().map_err(| kind | ProjectError::new( &self.id, kind ))
	}

	/// Loads the compiled binaries with the dependencies of the last compile.
	///
	/// Valid from `Compiled` only. On failure the project stays `Compiled`.
	///
	/// # Errors
	/// Lifecycle or load errors, tagged with the project id.
	pub fn load( &self ) -> Result<String, ProjectError> {
		let mut guard = self.acquire()?;
		self.load_locked( &mut guard ).map_err(| kind | ProjectError::new( &self.id, kind ))
	}

	/// Runs the unload hook and releases the execution context.
	///
	/// Valid from `Loaded` only, and always ends `Compiled` once started.
	///
	/// # Errors
	/// A lifecycle error, or an [`UnloadError`] warning (see [`ProjectError::is_warning`])
	/// if the hook trapped.
	pub fn unload( &self ) -> Result<(), ProjectError> {
		let mut guard = self.acquire()?;
		match self.unload_locked( &mut guard ) {
			Ok( None ) => Ok(()),
			Ok( Some( warning )) => Err( ProjectError::new( &self.id, warning )),
			Err( kind ) => Err( ProjectError::new( &self.id, kind )),
		}
	}

	/// Unloads (if loaded), recompiles and reloads, all under one hold of the lock.
	///
	/// A failing step leaves the state it produced: a failed compile ends
	/// `Unloaded`, a failed load ends `Compiled`. The old code never stays loaded.
	///
	/// # Errors
	/// The error of the failing step, with an unload hook warning in `preceding` if there was one.
	pub fn hot_swap( &self ) -> Result<HotSwapOutcome, ProjectError> {

		let mut guard = self.acquire()?;
		let fail = | kind: ProjectErrorKind, preceding: Option<UnloadError> | ProjectError {
			project: self.id.clone(),
			kind,
			preceding: preceding.into_iter().map( ProjectErrorKind::Unload ).collect(),
		};

		let unload_warning = match self.state() {
			LifecycleState::Loaded => self.unload_locked( &mut guard ).map_err(| kind | fail( kind, None ))?,
			LifecycleState::Unloaded | LifecycleState::Compiled => None,
			state => return Err( fail( LifecycleError::InvalidTransition { operation: Operation::HotSwap, state }.into(), None )),
		};

		let output = match self.compile_locked() {
			Ok( output ) => output,
			Err( kind ) => return Err( fail( kind, unload_warning )),
		};

		match self.load_locked( &mut guard ) {
			Ok( version ) => Ok( HotSwapOutcome { version, warnings: output.warnings, unload_warning }),
			Err( kind ) => Err( fail( kind, unload_warning )),
		}

	}

	/// Runs `f` against the live execution context, if the project is loaded.
	///
	/// # Errors
	/// Rejected with [`LifecycleError::Busy`] while another operation runs.
	pub fn with_context<R>( &self, f: impl FnOnce( &mut ExecutionContext<Ctx> ) -> R ) -> Result<Option<R>, ProjectError> {
		let mut guard = self.acquire()?;
		Ok( guard.as_mut().map(| module | f( module.context_mut() )))
	}

	/// Takes the transition lock without waiting.
	///
	/// A lock poisoned by a panicking operation is taken over: the interrupted
	/// transition already put the status back on a stable state.
	fn acquire( &self ) -> Result<MutexGuard<'_, Slot<Ctx>>, ProjectError> {
		match self.module.try_lock() {
			Ok( guard ) => Ok( guard ),
			Err( TryLockError::WouldBlock ) => Err( ProjectError::new( &self.id, LifecycleError::Busy )),
			Err( TryLockError::Poisoned( poisoned )) => {
				tracing::warn!( project = %self.id, state = %self.state(), "recovering after a panicked operation" );
				self.module.clear_poison();
				Ok( poisoned.into_inner() )
			},
		}
	}

	fn compile_locked( &self ) -> Result<CompileOutput, ProjectErrorKind> {

		let previous = self.expect_state( Operation::Compile, &[ LifecycleState::Unloaded, LifecycleState::Compiled ])?;
		let transition = self.enter( LifecycleState::Compiling, previous, &StateEvent::Compiling );

		match self.run_compile() {
			Ok(( output, declarations, dependencies )) => {
				tracing::info!( project = %self.id, artifacts = output.artifacts.len(), warnings = output.warnings.len(), "compiled" );
				transition.settle(| status | {
					status.state = LifecycleState::Compiled ;
					status.declarations = declarations ;
					status.dependencies = dependencies ;
					status.warnings = output.warnings.clone();
				});
				self.notify( &StateEvent::Compiled { warnings: &output.warnings });
				Ok( output )
			},
			Err(( kind, declarations )) => {
				tracing::warn!( project = %self.id, error = %kind, "compile failed" );
				transition.settle(| status | {
					status.state = LifecycleState::Unloaded ;
					if let Some( declarations ) = declarations { status.declarations = declarations ; }
					status.dependencies.clear();
					status.warnings.clear();
				});
				self.notify( &StateEvent::CompileFailed( &kind ));
				Err( kind )
			},
		}

	}

	/// Resolves, compiles and commits. A failure carries the declarations, if they could be read.
	#[allow( clippy::type_complexity )]
	fn run_compile( &self ) -> Result<( CompileOutput, Vec<String>, Vec<Dependency> ), ( ProjectErrorKind, Option<Vec<String>> )> {

		let declarations = self.layout.read_declarations()
			.map_err(| source | ( CompileError::Io { path: self.layout.dependencies_file().to_path_buf(), source }.into(), None ))?;

		let location = ProjectLocation { id: &self.id, root: self.layout.root() };
		let dependencies = match declarations.iter()
			.map(| declaration | self.services.resolver.resolve( location, declaration ))
			.collect::<Result<Vec<_>, _>>()
		{
			Ok( dependencies ) => dependencies,
			Err( err ) => return Err(( err.into(), Some( declarations ))),
		};

		tracing::debug!( project = %self.id, dependencies = dependencies.len(), "resolved dependencies" );

		let staged = match StagedOutput::create( self.layout.binary_dir() ) {
			Ok( staged ) => staged,
			Err( source ) => return Err(( CompileError::Io { path: self.layout.binary_dir().to_path_buf(), source }.into(), Some( declarations ))),
		};

		let output = match self.services.compiler.compile( self.layout.source_dir(), staged.path(), &dependencies ) {
			Ok( output ) => output,
			Err( err ) => return Err(( err.into(), Some( declarations ))),
		};

		if let Err( source ) = staged.commit() {
			return Err(( CompileError::Io { path: self.layout.binary_dir().to_path_buf(), source }.into(), Some( declarations )));
		}

		Ok(( output, declarations, dependencies ))

	}

	fn load_locked( &self, slot: &mut Slot<Ctx> ) -> Result<String, ProjectErrorKind> {

		self.expect_state( Operation::Load, &[ LifecycleState::Compiled ])?;
		let transition = self.enter( LifecycleState::Loading, LifecycleState::Compiled, &StateEvent::Loading );

		let dependencies = self.read_status().dependencies.clone();
		match self.services.loader.load( &self.id, self.layout.binary_dir(), &dependencies ) {
			Ok( module ) => {
				let version = module.version().to_string();
				tracing::info!( project = %self.id, %version, "loaded" );
				transition.settle(| status | {
					status.state = LifecycleState::Loaded ;
					status.version = Some( version.clone() );
					status.owned_artifacts = module.context().owned_artifacts().to_vec();
					status.entry_artifact = Some( module.entry_artifact().to_path_buf() );
				});
				*slot = Some( module );
				self.notify( &StateEvent::Loaded { version: &version });
				Ok( version )
			},
			Err( err ) => {
				tracing::warn!( project = %self.id, error = %err, "load failed" );
				transition.settle(| status | status.state = LifecycleState::Compiled );
				self.notify( &StateEvent::LoadFailed( &err ));
				Err( err.into() )
			},
		}

	}

	fn unload_locked( &self, slot: &mut Slot<Ctx> ) -> Result<Option<UnloadError>, ProjectErrorKind> {

		self.expect_state( Operation::Unload, &[ LifecycleState::Loaded ])?;
		let transition = self.enter( LifecycleState::Unloading, LifecycleState::Compiled, &StateEvent::Unloading );

		let hook_error = slot.take()
			.map(| module | self.services.loader.unload( module ))
			.and_then( Result::err );

		tracing::info!( project = %self.id, hook_failed = hook_error.is_some(), "unloaded" );
		transition.settle(| status | {
			status.state = LifecycleState::Compiled ;
			status.version = None ;
			status.owned_artifacts.clear();
			status.entry_artifact = None ;
		});
		self.notify( &StateEvent::Unloaded { hook_error: hook_error.as_ref() });

		Ok( hook_error )

	}

	fn expect_state( &self, operation: Operation, valid: &[LifecycleState] ) -> Result<LifecycleState, LifecycleError> {
		let state = self.read_status().state ;
		match valid.contains( &state ) {
			true => Ok( state ),
			false => Err( LifecycleError::InvalidTransition { operation, state }),
		}
	}

	/// Moves into the transient `state`. Until the returned transition settles,
	/// unwinding puts the project back on `fallback`.
	fn enter( &self, state: LifecycleState, fallback: LifecycleState, event: &StateEvent<'_> ) -> Transition<'_, Ctx> {
		let transition = Transition { project: self, fallback, settled: false };
		tracing::debug!( project = %self.id, %state, "transition" );
		self.update_status(| status | status.state = state );
		self.notify( event );
		transition
	}

	fn notify( &self, event: &StateEvent<'_> ) {
		self.services.listener.on_transition( &self.id, event );
	}

	fn read_status( &self ) -> std::sync::RwLockReadGuard<'_, ProjectStatus> {
		self.status.read().unwrap_or_else( PoisonError::into_inner )
	}

	fn update_status( &self, update: impl FnOnce( &mut ProjectStatus )) {
		update( &mut self.status.write().unwrap_or_else( PoisonError::into_inner ));
	}

}

/// A transition in progress. Dropped without settling, it restores the stable
/// state the project fell back to, with nothing loaded.
struct Transition<'p, Ctx: ProjectContext> {
	project: &'p Project<Ctx>,
	fallback: LifecycleState,
	settled: bool,
}

impl<Ctx: ProjectContext> Transition<'_, Ctx> {
	fn settle( mut self, update: impl FnOnce( &mut ProjectStatus )) {
		self.project.update_status( update );
		self.settled = true ;
	}
}

impl<Ctx: ProjectContext> Drop for Transition<'_, Ctx> {
	fn drop( &mut self ) {
		if self.settled { return }
		tracing::warn!( project = %self.project.id, state = %self.fallback, "transition interrupted, restoring stable state" );
		let fallback = self.fallback ;
		self.project.update_status(| status | {
			status.state = fallback ;
			status.version = None ;
			status.owned_artifacts.clear();
			status.entry_artifact = None ;
		});
	}
}

impl<Ctx: ProjectContext> Drop for Project<Ctx> {
	fn drop( &mut self ) {
		let slot = self.module.get_mut().unwrap_or_else( PoisonError::into_inner );
		if slot.take().is_some() {
			tracing::debug!( project = %self.id, "released execution context without running hooks" );
		}
	}
}

impl<Ctx: ProjectContext> std::fmt::Debug for Project<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Project" )
			.field( "id", &self.id )
			.field( "layout", &self.layout )
			.field( "status", &*self.read_status() )
			.finish_non_exhaustive()
	}
}
