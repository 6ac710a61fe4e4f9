use std::collections::HashMap ;
use std::path::PathBuf ;
use std::sync::Arc ;

use crate::dependency::Dependency ;
use super::{ BaseResolver, DependencyResolutionError, ProjectLocation, ResolverExtension };



/// Outcome of asking the host for a module's backing artifact.
#[derive( Clone, Debug, PartialEq, Eq )]
pub enum HostModuleLookup {
	/// No module with that name runs in the host.
	Absent,
	/// The module runs, but where it was loaded from is unknown.
	Unlocated,
	/// The module's backing artifact.
	Located( PathBuf ),
}

/// The host's view of modules it is already running.
pub trait HostModuleRegistry: Send + Sync {
	/// Looks up the backing artifact of the module called `module`.
	fn artifact_location( &self, module: &str ) -> HostModuleLookup ;
}

impl HostModuleRegistry for HashMap<String, PathBuf> {
	fn artifact_location( &self, module: &str ) -> HostModuleLookup {
		match self.get( module ) {
			Some( path ) => HostModuleLookup::Located( path.clone() ),
			None => HostModuleLookup::Absent,
		}
	}
}

/// Resolves `host:<module>` declarations to [`Provided`]( crate::DependencyScope::Provided )
/// dependencies through a [`HostModuleRegistry`].
///
/// A lookup that fails is an error, never a silently dropped dependency.
#[derive( Clone )]
pub struct HostModuleResolver {
	prefix: String,
	registry: Arc<dyn HostModuleRegistry>,
}

impl HostModuleResolver {

	/// The prefix claimed by [`HostModuleResolver::new`].
	pub const DEFAULT_PREFIX: &str = "host:" ;

	/// Creates a resolver claiming the `host:` prefix.
	pub fn new( registry: Arc<dyn HostModuleRegistry> ) -> Self {
		Self::with_prefix( Self::DEFAULT_PREFIX, registry )
	}

	/// Creates a resolver claiming a custom prefix, e.g. `plugin:`.
	pub fn with_prefix( prefix: impl Into<String>, registry: Arc<dyn HostModuleRegistry> ) -> Self {
		Self { prefix: prefix.into(), registry }
	}

}

impl std::fmt::Debug for HostModuleResolver {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "HostModuleResolver" )
			.field( "prefix", &self.prefix )
			.field( "registry", &"<HostModuleRegistry>" )
			.finish()
	}
}

impl ResolverExtension for HostModuleResolver {
	fn try_resolve( &self, project: ProjectLocation<'_>, declaration: &str ) -> Option<Result<Dependency, DependencyResolutionError>> {
		let module = declaration.strip_prefix( self.prefix.as_str() )?.trim();
		Some( self.resolve_module( project, declaration, module ))
	}
}

impl HostModuleResolver {
	fn resolve_module( &self, project: ProjectLocation<'_>, declaration: &str, module: &str ) -> Result<Dependency, DependencyResolutionError> {

		if module.is_empty() {
			return Err( DependencyResolutionError::Malformed { declaration: declaration.to_string(), reason: "missing host module name" });
		}

		match self.registry.artifact_location( module ) {
			HostModuleLookup::Absent => Err( DependencyResolutionError::HostModuleNotFound {
				declaration: declaration.to_string(),
				module: module.to_string(),
			}),
			HostModuleLookup::Unlocated => Err( DependencyResolutionError::HostArtifactUnavailable {
				declaration: declaration.to_string(),
				module: module.to_string(),
			}),
			HostModuleLookup::Located( path ) => BaseResolver::locate( project.root, &path, declaration )
				.map_err(| _ | DependencyResolutionError::HostArtifactUnavailable {
					declaration: declaration.to_string(),
					module: module.to_string(),
				})
				.map( Dependency::provided ),
		}

	}
}

#[cfg( test )]
mod tests {

	use std::path::Path ;
	use super::* ;
	use crate::dependency::DependencyScope ;
	use crate::resolver::{ DependencyResolver, ResolverChain };

	struct Unlocated ;
	impl HostModuleRegistry for Unlocated {
		fn artifact_location( &self, _: &str ) -> HostModuleLookup { HostModuleLookup::Unlocated }
	}

	fn location( root: &Path ) -> ProjectLocation<'_> {
		ProjectLocation { id: "Foo", root }
	}

	#[test]
	fn host_reference_resolves_to_provided() {
		let dir = tempfile::tempdir().unwrap();
		let artifact = dir.path().join( "essentials.wasm" );
		std::fs::write( &artifact, b"" ).unwrap();

		let registry = HashMap::from([( "Essentials".to_string(), artifact )]);
		let chain = ResolverChain::new().with_extension( HostModuleResolver::new( Arc::new( registry )));

		let dependency = chain.resolve( location( dir.path() ), "host:Essentials" ).unwrap();
		assert_eq!( dependency.scope(), DependencyScope::Provided );
		assert!( dependency.artifact().ends_with( "essentials.wasm" ));
	}

	#[test]
	fn absent_host_module_fails_resolution() {
		let dir = tempfile::tempdir().unwrap();
		let chain = ResolverChain::new().with_extension( HostModuleResolver::new( Arc::new( HashMap::new() )));
		match chain.resolve( location( dir.path() ), "host:Missing" ) {
			Err( DependencyResolutionError::HostModuleNotFound { module, declaration }) => {
				assert_eq!( module, "Missing" );
				assert_eq!( declaration, "host:Missing" );
			},
			other => panic!( "Expected HostModuleNotFound, found: {:?}", other ),
		}
	}

	#[test]
	fn unlocated_or_vanished_artifact_fails_resolution() {
		let dir = tempfile::tempdir().unwrap();

		let chain = ResolverChain::new().with_extension( HostModuleResolver::new( Arc::new( Unlocated )));
		assert!( matches!(
			chain.resolve( location( dir.path() ), "host:Essentials" ),
			Err( DependencyResolutionError::HostArtifactUnavailable { .. }),
		));

		let registry = HashMap::from([( "Gone".to_string(), dir.path().join( "gone.wasm" ))]);
		let chain = ResolverChain::new().with_extension( HostModuleResolver::new( Arc::new( registry )));
		assert!( matches!(
			chain.resolve( location( dir.path() ), "host:Gone" ),
			Err( DependencyResolutionError::HostArtifactUnavailable { .. }),
		));
	}

	#[test]
	fn host_prefix_without_extension_is_an_unknown_qualifier() {
		let dir = tempfile::tempdir().unwrap();
		assert!( matches!(
			ResolverChain::new().resolve( location( dir.path() ), "host:Essentials" ),
			Err( DependencyResolutionError::UnknownQualifier { .. }),
		));
	}

}
