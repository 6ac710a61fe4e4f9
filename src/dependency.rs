//! Resolved dependency values.
//!
//! A [`Dependency`] is what a textual declaration turns into once a
//! [`DependencyResolver`]( crate::DependencyResolver ) located its artifact. It is
//! immutable: a new compile cycle resolves the declarations again and produces
//! fresh values rather than updating old ones.

use std::path::{ Path, PathBuf };



/// Where the symbols of a dependency live at runtime.
///
/// Only two scopes exist. A declaration qualifier that names anything else is
/// rejected by the resolver.
#[derive( Copy, Clone, Eq, PartialEq, Hash, Debug )]
pub enum DependencyScope {
	/// Bundled with the project. The artifact is instantiated inside the project's own
	/// execution context and its exports join the project's namespace.
	Include,
	/// Supplied by the host environment. The artifact is part of the compile classpath
	/// but its symbols are looked up in the host linker, never instantiated by the project.
	Provided,
}

impl std::fmt::Display for DependencyScope {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Include => write!( f, "include" ),
			Self::Provided => write!( f, "provided" ),
		}
	}
}

/// A dependency declaration resolved to a concrete binary artifact.
#[derive( Clone, Eq, PartialEq, Hash, Debug )]
pub struct Dependency {
	artifact: PathBuf,
	scope: DependencyScope,
}

impl Dependency {

	/// Creates a dependency on `artifact` with the given scope.
	#[inline]
	pub fn new( artifact: impl Into<PathBuf>, scope: DependencyScope ) -> Self {
		Self { artifact: artifact.into(), scope }
	}

	/// Shorthand for an [`DependencyScope::Include`] dependency.
	#[inline]
	pub fn include( artifact: impl Into<PathBuf> ) -> Self { Self::new( artifact, DependencyScope::Include )}

	/// Shorthand for a [`DependencyScope::Provided`] dependency.
	#[inline]
	pub fn provided( artifact: impl Into<PathBuf> ) -> Self { Self::new( artifact, DependencyScope::Provided )}

	/// Location of the binary artifact.
	#[inline] pub fn artifact( &self ) -> &Path { &self.artifact }

	/// Scope the artifact was declared with.
	#[inline] pub fn scope( &self ) -> DependencyScope { self.scope }

	/// Whether the project bundles this artifact into its own execution context.
	#[inline] pub fn is_included( &self ) -> bool { self.scope == DependencyScope::Include }

}

impl std::fmt::Display for Dependency {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		write!( f, "{}:{}", self.scope, self.artifact.display() )
	}
}
