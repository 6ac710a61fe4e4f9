//! Loading compiled projects into isolated execution contexts.
//!
//! [`ModuleLoader::load`] takes a project's output directory and the
//! dependencies of its last compile, and builds a fresh [`ExecutionContext`]:
//!
//! 1. Every `*.wasm` in the output directory and every `include` dependency is
//! 	read as a component. Exactly one of them must export the entry-point
//! 	interface (by default `hotswap:project/entry-point`).
//! 2. The other components are instantiated into the context, each one's
//! 	exported functions becoming importable by the rest. `provided`
//! 	dependencies are never instantiated; whatever they export must already be
//! 	defined in the host [`Linker`].
//! 3. The entry component is instantiated last, its version is queried and its
//! 	`on-load` hook runs.
//!
//! A failure at any step drops the half-built context before returning, so no
//! partially loaded state is ever observable.

use std::path::{ Path, PathBuf };
use thiserror::Error ;
use wasmtime::{ Engine, Store };
use wasmtime::component::{ Component, Linker };

use crate::ProjectContext ;
use crate::compiler::collect_files ;
use crate::dependency::Dependency ;

mod entry_point ;
mod execution_context ;
mod namespace ;

pub use execution_context::ExecutionContext ;
pub(crate) use entry_point::EntryPoint ;
use namespace::{ instantiate_units, Unit };



/// Errors that fail a load. The execution context is always released before one is returned.
#[derive( Error, Debug )]
pub enum LoadError {
	/// The output directory or a dependency artifact does not exist.
	#[error( "Artifact '{}' is missing", path.display() )]
	ArtifactMissing { path: PathBuf },
	/// The output directory could not be listed.
	#[error( "Failed to read '{}': {source}", path.display() )]
	Io { path: PathBuf, source: std::io::Error },
	/// An artifact is not a valid component for this engine.
	#[error( "Artifact '{}' is not a valid component: {cause}", path.display() )]
	InvalidComponent { path: PathBuf, cause: wasmtime::Error },
	/// Zero or several artifacts export the entry-point interface.
	#[error( "Expected exactly one component exporting '{interface}', found {}", candidates.len() )]
	EntryPointCardinality { interface: String, candidates: Vec<PathBuf> },
	/// The entry component lacks one of the contract functions.
	#[error( "Entry point '{}' does not export '{function}'", artifact.display() )]
	IncompleteEntryPoint { artifact: PathBuf, function: String },
	/// A contract function has the wrong type.
	#[error( "Entry point function '{function}' has an unexpected signature: {cause}" )]
	EntryPointSignature { function: String, cause: wasmtime::Error },
	/// A component imports something neither the host nor the project provides.
	#[error( "Imports of '{}' cannot be satisfied: {cause}", artifact.display() )]
	UnresolvedImports { artifact: PathBuf, cause: wasmtime::Error },
	/// Two components export the same name, or a component shadows a host definition.
	#[error( "Export '{name}' of '{}' is already defined: {cause}", artifact.display() )]
	DuplicateExport { artifact: PathBuf, name: String, cause: wasmtime::Error },
	/// A non-entry component exports something other than functions.
	#[error( "Export '{name}' of '{}' cannot be shared: only functions are forwarded", artifact.display() )]
	UnsupportedExport { artifact: PathBuf, name: String },
	/// Instantiating a component trapped.
	#[error( "Failed to instantiate '{}': {cause}", artifact.display() )]
	Instantiation { artifact: PathBuf, cause: wasmtime::Error },
	/// `get-version` trapped.
	#[error( "Entry point version query failed: {0}" )]
	VersionQuery( wasmtime::Error ),
	/// `on-load` trapped.
	#[error( "Entry point load hook failed: {0}" )]
	LoadHook( wasmtime::Error ),
}

/// The `on-unload` hook trapped. The context was released anyway.
#[derive( Error, Debug )]
#[error( "Entry point unload hook failed: {0}" )]
pub struct UnloadError( wasmtime::Error );

impl UnloadError {
	/// The trap raised by the hook.
	#[inline] pub fn cause( &self ) -> &wasmtime::Error { &self.0 }
}

/// A project instantiated inside its own execution context.
pub struct LoadedModule<Ctx: 'static> {
	context: ExecutionContext<Ctx>,
	entry: EntryPoint,
	version: String,
}

impl<Ctx: 'static> LoadedModule<Ctx> {
	/// What the entry point's `get-version` returned at load.
	#[inline] pub fn version( &self ) -> &str { &self.version }
	/// The artifact that provided the entry point.
	#[inline] pub fn entry_artifact( &self ) -> &Path { self.entry.artifact() }
	#[inline] pub fn context( &self ) -> &ExecutionContext<Ctx> { &self.context }
	#[inline] pub fn context_mut( &mut self ) -> &mut ExecutionContext<Ctx> { &mut self.context }
}

impl<Ctx: std::fmt::Debug + 'static> std::fmt::Debug for LoadedModule<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "LoadedModule" )
			.field( "version", &self.version )
			.field( "entry", &self.entry )
			.field( "context", &self.context )
			.finish()
	}
}

/// Builds and tears down execution contexts.
///
/// Every context is linked against a clone of the host [`Linker`], which is
/// where `provided` dependencies find their symbols.
pub struct ModuleLoader<Ctx: ProjectContext> {
	engine: Engine,
	host: Linker<Ctx>,
	entry_interface: String,
}

impl<Ctx: ProjectContext> ModuleLoader<Ctx> {

	/// The interface an entry component exports unless configured otherwise.
	pub const DEFAULT_ENTRY_INTERFACE: &str = "hotswap:project/entry-point" ;

	const ARTIFACT_EXTENSION: &str = "wasm" ;

	/// Creates a loader. `host` must have been created for `engine`.
	pub fn new( engine: Engine, host: Linker<Ctx> ) -> Self {
		Self { engine, host, entry_interface: Self::DEFAULT_ENTRY_INTERFACE.to_string() }
	}

	/// Replaces the name of the entry-point interface.
	pub fn with_entry_interface( mut self, interface: impl Into<String> ) -> Self {
		self.entry_interface = interface.into();
		self
	}

	#[inline] pub fn engine( &self ) -> &Engine { &self.engine }
	#[inline] pub fn entry_interface( &self ) -> &str { &self.entry_interface }

	/// Loads the artifacts in `output_dir` for `project`, then runs its load hook.
	///
	/// # Errors
	/// See [`LoadError`]. Nothing instantiated so far survives a failure.
	pub fn load( &self, project: &str, output_dir: &Path, dependencies: &[Dependency] ) -> Result<LoadedModule<Ctx>, LoadError> {

		let units = self.read_units( output_dir, dependencies )?;

		let ( candidates, rest ): ( Vec<_>, Vec<_> ) = units.into_iter()
			.partition(| unit | unit.exports_instance( &self.engine, &self.entry_interface ));

		let entry_unit = match <[Unit; 1]>::try_from( candidates ) {
			Ok([ unit ]) => unit,
			Err( candidates ) => return Err( LoadError::EntryPointCardinality {
				interface: self.entry_interface.clone(),
				candidates: candidates.into_iter().map(| unit | unit.artifact ).collect(),
			}),
		};

		let mut context = ExecutionContext::new( Store::new( &self.engine, Ctx::new( project )));
		let mut linker = self.host.clone();

		instantiate_units( &self.engine, &mut linker, &mut context, rest )?;

		let pre = linker.instantiate_pre( &entry_unit.component )
			.map_err(| cause | LoadError::UnresolvedImports { artifact: entry_unit.artifact.clone(), cause })?;
		let instance = pre.instantiate( &mut context.store )
			.map_err(| cause | LoadError::Instantiation { artifact: entry_unit.artifact.clone(), cause })?;

		let entry = EntryPoint::resolve( &mut context.store, &instance, &self.entry_interface, &entry_unit.artifact )?;
		context.record_instance( entry_unit.artifact, std::iter::empty() );

		let version = entry.version( &mut context.store ).map_err( LoadError::VersionQuery )?;
		entry.on_load( &mut context.store ).map_err( LoadError::LoadHook )?;

		tracing::debug!(
			project,
			version = %version,
			instances = context.owned_artifacts().len(),
			"execution context ready"
		);

		Ok( LoadedModule { context, entry, version })

	}

	/// Runs the module's unload hook, then releases its execution context.
	///
	/// # Errors
	/// Returns the hook's trap. The context is released regardless.
	pub fn unload( &self, module: LoadedModule<Ctx> ) -> Result<(), UnloadError> {
		let LoadedModule { mut context, entry, version } = module ;
		let result = entry.on_unload( &mut context.store ).map_err( UnloadError );
		drop( entry );
		drop( context );
		if let Err( err ) = &result {
			tracing::warn!( interface = %self.entry_interface, %version, %err, "unload hook failed, context released anyway" );
		}
		result
	}

	fn read_units( &self, output_dir: &Path, dependencies: &[Dependency] ) -> Result<Vec<Unit>, LoadError> {

		if !output_dir.is_dir() {
			return Err( LoadError::ArtifactMissing { path: output_dir.to_path_buf() });
		}

		let mut artifacts = collect_files( output_dir, Self::ARTIFACT_EXTENSION )
			.map_err(| source | LoadError::Io { path: output_dir.to_path_buf(), source })?
			.into_iter()
			.map(| relative | output_dir.join( relative ))
			.collect::<Vec<_>>();

		dependencies.iter()
			.filter(| dependency | dependency.is_included() )
			.for_each(| dependency | if !artifacts.iter().any(| known | known == dependency.artifact() ) {
				artifacts.push( dependency.artifact().to_path_buf() );
			});

		artifacts.into_iter()
			.map(| artifact | match artifact.is_file() {
				true => Component::from_file( &self.engine, &artifact )
					.map(| component | Unit { artifact: artifact.clone(), component })
					.map_err(| cause | LoadError::InvalidComponent { path: artifact, cause }),
				false => Err( LoadError::ArtifactMissing { path: artifact }),
			})
			.collect()

	}

}

impl<Ctx: ProjectContext> std::fmt::Debug for ModuleLoader<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ModuleLoader" )
			.field( "entry_interface", &self.entry_interface )
			.finish_non_exhaustive()
	}
}
