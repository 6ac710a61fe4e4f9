//! Dependency declaration resolution.
//!
//! A declaration is one line of a project's dependency file. The
//! [`BaseResolver`] understands plain artifact paths with an optional scope
//! qualifier:
//!
//! - `lib/math.wasm` - an [`Include`]( DependencyScope::Include ) dependency
//! - `include:lib/math.wasm` - the same, spelled out
//! - `provided:lib/host-api.wasm` - a [`Provided`]( DependencyScope::Provided ) dependency
//!
//! Hosts extend the grammar by registering [`ResolverExtension`]s on a
//! [`ResolverChain`]. Each extension gets first refusal on a declaration, in
//! registration order; declarations nobody claims fall through to the base
//! resolver. [`HostModuleResolver`] is the stock extension, resolving
//! `host:<name>` through a [`HostModuleRegistry`].
//!
//! Resolution only reads the declaration and queries the environment. It never
//! touches project state.

use std::path::{ Path, PathBuf };
use thiserror::Error ;

use crate::dependency::{ Dependency, DependencyScope };

mod host_module ;

pub use host_module::{ HostModuleRegistry, HostModuleLookup, HostModuleResolver };



/// Errors produced while resolving a dependency declaration.
///
/// Every variant carries the offending declaration text.
#[derive( Error, Debug )]
pub enum DependencyResolutionError {
	/// The declaration does not follow the grammar.
	#[error( "Malformed dependency declaration '{declaration}': {reason}" )]
	Malformed { declaration: String, reason: &'static str },
	/// The declaration names a scope qualifier no resolver understands.
	#[error( "Unknown qualifier '{qualifier}' in dependency declaration '{declaration}'" )]
	UnknownQualifier { declaration: String, qualifier: String },
	/// The referenced artifact does not exist or is not a regular file.
	#[error( "Artifact '{}' referenced by '{declaration}' not found", path.display() )]
	ArtifactNotFound { declaration: String, path: PathBuf },
	/// The host has no module with the referenced name.
	#[error( "Host module '{module}' referenced by '{declaration}' is not present" )]
	HostModuleNotFound { declaration: String, module: String },
	/// The host module exists but its backing artifact cannot be located.
	#[error( "Backing artifact of host module '{module}' referenced by '{declaration}' is unavailable" )]
	HostArtifactUnavailable { declaration: String, module: String },
}

impl DependencyResolutionError {
	/// The declaration that failed to resolve.
	pub fn declaration( &self ) -> &str {
		match self {
			Self::Malformed { declaration, .. }
			| Self::UnknownQualifier { declaration, .. }
			| Self::ArtifactNotFound { declaration, .. }
			| Self::HostModuleNotFound { declaration, .. }
			| Self::HostArtifactUnavailable { declaration, .. } => declaration,
		}
	}
}

/// The project a declaration belongs to.
///
/// Relative artifact paths are resolved against `root`.
#[derive( Copy, Clone, Debug )]
pub struct ProjectLocation<'a> {
	/// Identifier of the declaring project.
	pub id: &'a str,
	/// Root directory of the declaring project.
	pub root: &'a Path,
}

/// Turns a declaration into a [`Dependency`].
pub trait DependencyResolver: Send + Sync {
	/// Resolves `declaration` on behalf of `project`.
	///
	/// # Errors
	/// Fails when the declaration is malformed or its artifact cannot be located.
	fn resolve( &self, project: ProjectLocation<'_>, declaration: &str ) -> Result<Dependency, DependencyResolutionError> ;
}

/// A host-specific grammar extension.
pub trait ResolverExtension: Send + Sync {
	/// Returns `None` when `declaration` is not part of this extension's grammar, leaving
	/// it to the next resolver in the chain.
	fn try_resolve( &self, project: ProjectLocation<'_>, declaration: &str ) -> Option<Result<Dependency, DependencyResolutionError>> ;
}

/// Resolves plain artifact paths with an optional `include:` or `provided:` qualifier.
#[derive( Copy, Clone, Debug, Default )]
pub struct BaseResolver ;

impl BaseResolver {

	const INCLUDE_QUALIFIER: &str = "include" ;
	const PROVIDED_QUALIFIER: &str = "provided" ;

	/// Locates an artifact path relative to `root` and checks it exists.
	///
	/// Existing artifacts are returned canonicalised so paths from different
	/// projects compare equal when they point at the same file.
	///
	/// # Errors
	/// Returns [`DependencyResolutionError::ArtifactNotFound`] when the path is not a file.
	pub fn locate( root: &Path, path: &Path, declaration: &str ) -> Result<PathBuf, DependencyResolutionError> {
		let path = match path.is_absolute() {
			true => path.to_path_buf(),
			false => root.join( path ),
		};
		match path.is_file() {
			true => Ok( std::fs::canonicalize( &path ).unwrap_or( path )),
			false => Err( DependencyResolutionError::ArtifactNotFound { declaration: declaration.to_string(), path }),
		}
	}

}

impl DependencyResolver for BaseResolver {
	fn resolve( &self, project: ProjectLocation<'_>, declaration: &str ) -> Result<Dependency, DependencyResolutionError> {

		let ( qualifier, path ) = split_qualifier( declaration );
		let scope = match qualifier {
			None => DependencyScope::Include,
			Some( Self::INCLUDE_QUALIFIER ) => DependencyScope::Include,
			Some( Self::PROVIDED_QUALIFIER ) => DependencyScope::Provided,
			Some( other ) => return Err( DependencyResolutionError::UnknownQualifier {
				declaration: declaration.to_string(),
				qualifier: other.to_string(),
			}),
		};

		let path = path.trim();
		if path.is_empty() {
			return Err( DependencyResolutionError::Malformed { declaration: declaration.to_string(), reason: "missing artifact path" });
		}

		Ok( Dependency::new( Self::locate( project.root, Path::new( path ), declaration )?, scope ))

	}
}

/// A base resolver preceded by an ordered list of extensions.
///
/// The first extension to claim a declaration decides its outcome, errors included.
#[derive( Default )]
pub struct ResolverChain {
	extensions: Vec<Box<dyn ResolverExtension>>,
	base: BaseResolver,
}

impl ResolverChain {

	/// Creates a chain with no extensions.
	pub fn new() -> Self { Self::default() }

	/// Appends an extension. Extensions registered earlier get earlier refusal.
	pub fn with_extension( mut self, extension: impl ResolverExtension + 'static ) -> Self {
		self.extensions.push( Box::new( extension ));
		self
	}

	/// Appends an already boxed extension.
	pub fn push_extension( &mut self, extension: Box<dyn ResolverExtension> ) {
		self.extensions.push( extension );
	}

}

impl std::fmt::Debug for ResolverChain {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ResolverChain" )
			.field( "extensions", &self.extensions.len() )
			.finish_non_exhaustive()
	}
}

impl DependencyResolver for ResolverChain {
	fn resolve( &self, project: ProjectLocation<'_>, declaration: &str ) -> Result<Dependency, DependencyResolutionError> {
		let declaration = declaration.trim();
		if declaration.is_empty() {
			return Err( DependencyResolutionError::Malformed { declaration: declaration.to_string(), reason: "empty declaration" });
		}
		self.extensions.iter()
			.find_map(| extension | extension.try_resolve( project, declaration ))
			.unwrap_or_else(|| self.base.resolve( project, declaration ))
	}
}

/// Splits `qualifier:rest` off a declaration.
///
/// A qualifier is at least two characters long, so `C:\lib\math.wasm` is read as a path.
pub(crate) fn split_qualifier( declaration: &str ) -> ( Option<&str>, &str ) {
	match declaration.split_once( ':' ) {
		Some(( qualifier, rest )) if qualifier.len() >= 2
			&& qualifier.chars().all(| c | c.is_ascii_alphanumeric() || c == '-' || c == '_' )
			=> ( Some( qualifier ), rest ),
		_ => ( None, declaration ),
	}
}

#[cfg( test )]
mod tests {

	use super::* ;

	fn location( root: &Path ) -> ProjectLocation<'_> {
		ProjectLocation { id: "Foo", root }
	}

	#[test]
	fn bare_path_resolves_to_include() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write( dir.path().join( "math.wasm" ), b"" ).unwrap();
		let dependency = BaseResolver.resolve( location( dir.path() ), "math.wasm" ).unwrap();
		assert_eq!( dependency.scope(), DependencyScope::Include );
		assert!( dependency.artifact().ends_with( "math.wasm" ));
	}

	#[test]
	fn provided_qualifier_resolves_to_provided() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write( dir.path().join( "api.wasm" ), b"" ).unwrap();
		let dependency = BaseResolver.resolve( location( dir.path() ), "provided:api.wasm" ).unwrap();
		assert_eq!( dependency.scope(), DependencyScope::Provided );
	}

	#[test]
	fn missing_artifact_is_reported_with_declaration() {
		let dir = tempfile::tempdir().unwrap();
		match BaseResolver.resolve( location( dir.path() ), "include:nope.wasm" ) {
			Err( err @ DependencyResolutionError::ArtifactNotFound { .. }) => assert_eq!( err.declaration(), "include:nope.wasm" ),
			other => panic!( "Expected ArtifactNotFound, found: {:?}", other ),
		}
	}

	#[test]
	fn unknown_qualifier_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		match BaseResolver.resolve( location( dir.path() ), "runtime:math.wasm" ) {
			Err( DependencyResolutionError::UnknownQualifier { qualifier, .. }) => assert_eq!( qualifier, "runtime" ),
			other => panic!( "Expected UnknownQualifier, found: {:?}", other ),
		}
	}

	#[test]
	fn empty_path_is_malformed() {
		let dir = tempfile::tempdir().unwrap();
		assert!( matches!(
			BaseResolver.resolve( location( dir.path() ), "provided:  " ),
			Err( DependencyResolutionError::Malformed { .. }),
		));
		assert!( matches!(
			ResolverChain::new().resolve( location( dir.path() ), "   " ),
			Err( DependencyResolutionError::Malformed { .. }),
		));
	}

	#[test]
	fn drive_letters_are_not_qualifiers() {
		assert_eq!( split_qualifier( r"C:\lib\math.wasm" ), ( None, r"C:\lib\math.wasm" ));
		assert_eq!( split_qualifier( "provided:x.wasm" ), ( Some( "provided" ), "x.wasm" ));
	}

	struct Claims ;
	impl ResolverExtension for Claims {
		fn try_resolve( &self, _: ProjectLocation<'_>, declaration: &str ) -> Option<Result<Dependency, DependencyResolutionError>> {
			declaration.strip_prefix( "fixed:" ).map(| name | Ok( Dependency::provided( format!( "/fixed/{}", name ))))
		}
	}

	#[test]
	fn extensions_get_first_refusal() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write( dir.path().join( "math.wasm" ), b"" ).unwrap();
		let chain = ResolverChain::new().with_extension( Claims );

		let claimed = chain.resolve( location( dir.path() ), "fixed:api" ).unwrap();
		assert_eq!( claimed.artifact(), Path::new( "/fixed/api" ));

		let fallthrough = chain.resolve( location( dir.path() ), "math.wasm" ).unwrap();
		assert_eq!( fallthrough.scope(), DependencyScope::Include );
	}

}
