//! Compiler adapters.
//!
//! A [`Compiler`] turns a project's source tree into binary components inside an
//! output directory. Callers hand it a fresh staging directory (see
//! [`Project::compile`]( crate::Project::compile )), so a compiler is free to
//! write as it goes: a failed compile never reaches the real output directory.
//!
//! Two adapters ship with the crate:
//! - [`WatCompiler`] assembles WebAssembly text in-process.
//! - [`CommandCompiler`] runs an external toolchain and scrapes its diagnostics.

use std::path::{ Path, PathBuf };
use nonempty_collections::NEVec ;
use thiserror::Error ;

use crate::dependency::Dependency ;

mod diagnostic ;
mod staging ;
mod wat_compiler ;
mod command_compiler ;

pub use diagnostic::{ Diagnostic, Severity };
pub use wat_compiler::WatCompiler ;
pub use command_compiler::CommandCompiler ;
pub(crate) use staging::StagedOutput ;



/// Errors that fail a compile.
#[derive( Error, Debug )]
pub enum CompileError {
	/// One or more source files failed to compile. Holds every error diagnostic produced.
	#[error( "{} error(s) while compiling:\n{}", .0.len(), format_diagnostics( .0 ))]
	Diagnostics( NEVec<Diagnostic> ),
	/// Reading sources or writing artifacts failed.
	#[error( "I/O error at '{}': {source}", path.display() )]
	Io { path: PathBuf, source: std::io::Error },
	/// The external toolchain could not be started.
	#[error( "Failed to run compiler '{program}': {source}" )]
	Toolchain { program: String, source: std::io::Error },
}

impl CompileError {
	/// Error diagnostics carried by this error, empty for I/O and toolchain failures.
	pub fn diagnostics( &self ) -> Vec<&Diagnostic> {
		match self {
			Self::Diagnostics( diagnostics ) => diagnostics.into_iter().collect(),
			Self::Io { .. } | Self::Toolchain { .. } => Vec::with_capacity( 0 ),
		}
	}
}

fn format_diagnostics( diagnostics: &NEVec<Diagnostic> ) -> String {
	use itertools::Itertools ;
	diagnostics.clone().into_iter().map(| diagnostic | format!( "  {}", diagnostic )).join( "\n" )
}

/// A successful compile.
#[derive( Clone, Debug, Default )]
pub struct CompileOutput {
	/// Artifacts written, relative to the output directory.
	pub artifacts: Vec<PathBuf>,
	/// Non-fatal diagnostics.
	pub warnings: Vec<Diagnostic>,
	/// The classpath the sources were compiled against.
	pub classpath: Vec<Dependency>,
}

/// Compiles a source tree into an output directory.
pub trait Compiler: Send + Sync {

	/// Compiles every source file under `source_dir` into `output_dir`, using all of
	/// `classpath` (both scopes) to satisfy references.
	///
	/// # Errors
	/// Fails with the full list of error diagnostics if any file fails to compile,
	/// or with an I/O error if the tree cannot be read or written.
	fn compile( &self, source_dir: &Path, output_dir: &Path, classpath: &[Dependency] ) -> Result<CompileOutput, CompileError> ;

}

/// Collects every file under `root` with the given extension, relative to `root`, sorted.
pub(crate) fn collect_files( root: &Path, extension: &str ) -> std::io::Result<Vec<PathBuf>> {
	fn walk( root: &Path, dir: &Path, extension: &str, found: &mut Vec<PathBuf> ) -> std::io::Result<()> {
		for entry in std::fs::read_dir( dir )? {
			let path = entry?.path();
			if path.is_dir() {
				walk( root, &path, extension, found )?;
			} else if path.extension().is_some_and(| ext | ext == extension ) {
				if let Ok( relative ) = path.strip_prefix( root ) { found.push( relative.to_path_buf() ); }
			}
		}
		Ok(())
	}
	let mut found = Vec::new();
	walk( root, root, extension, &mut found )?;
	found.sort();
	Ok( found )
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn collects_nested_files_sorted() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir_all( dir.path().join( "nested/deeper" )).unwrap();
		std::fs::write( dir.path().join( "b.wat" ), "" ).unwrap();
		std::fs::write( dir.path().join( "a.wat" ), "" ).unwrap();
		std::fs::write( dir.path().join( "notes.txt" ), "" ).unwrap();
		std::fs::write( dir.path().join( "nested/deeper/c.wat" ), "" ).unwrap();

		let found = collect_files( dir.path(), "wat" ).unwrap();
		assert_eq!( found, vec![
			PathBuf::from( "a.wat" ),
			PathBuf::from( "b.wat" ),
			PathBuf::from( "nested/deeper/c.wat" ),
		]);
	}

}
