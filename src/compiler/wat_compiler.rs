use std::path::{ Path, PathBuf };
use itertools::Itertools ;
use nonempty_collections::NEVec ;
use wast::Wat ;
use wast::parser::{ self, ParseBuffer };

use crate::dependency::Dependency ;
use super::{ collect_files, CompileError, CompileOutput, Compiler, Diagnostic };



/// Assembles WebAssembly text (`*.wat`) into binary components, in-process.
///
/// Each `src/<path>.wat` becomes `<output>/<path>.wasm`. Every file is attempted
/// even after a failure so the returned diagnostics cover the whole tree.
///
/// The text format resolves imports by name at instantiation time, so the
/// classpath is recorded in the output but not consulted while assembling.
#[derive( Copy, Clone, Debug, Default )]
pub struct WatCompiler ;

impl WatCompiler {

	const SOURCE_EXTENSION: &str = "wat" ;
	const ARTIFACT_EXTENSION: &str = "wasm" ;

	/// Assembles a single source text. `path` is only used to label diagnostics.
	///
	/// # Errors
	/// Returns a diagnostic pointing at the first syntax or name-resolution error.
	pub fn assemble( path: &Path, text: &str ) -> Result<Vec<u8>, Diagnostic> {
		let to_diagnostic = | err: wast::Error | {
			let ( line, column ) = err.span().linecol_in( text );
			Diagnostic::error( path, Some( line + 1 ), Some( column + 1 ), err.message() )
		};
		let buffer = ParseBuffer::new( text ).map_err( to_diagnostic )?;
		let mut wat = parser::parse::<Wat>( &buffer ).map_err( to_diagnostic )?;
		wat.encode().map_err( to_diagnostic )
	}

	fn assemble_file( source_dir: &Path, relative: &Path ) -> Result<( PathBuf, Vec<u8> ), Diagnostic> {
		let path = source_dir.join( relative );
		let text = std::fs::read_to_string( &path )
			.map_err(| err | Diagnostic::error( &path, None, None, format!( "failed to read source: {}", err )))?;
		let binary = Self::assemble( &path, &text )?;
		Ok(( relative.with_extension( Self::ARTIFACT_EXTENSION ), binary ))
	}

}

impl Compiler for WatCompiler {
	fn compile( &self, source_dir: &Path, output_dir: &Path, classpath: &[Dependency] ) -> Result<CompileOutput, CompileError> {

		let sources = collect_files( source_dir, Self::SOURCE_EXTENSION )
			.map_err(| source | CompileError::Io { path: source_dir.to_path_buf(), source })?;

		let ( assembled, errors ): ( Vec<_>, Vec<_> ) = sources.iter()
			.map(| relative | Self::assemble_file( source_dir, relative ))
			.partition_result();

		if let Some( errors ) = NEVec::try_from_vec( errors ) {
			return Err( CompileError::Diagnostics( errors ));
		}

		let warnings = match sources.is_empty() {
			true => vec![ Diagnostic::warning( source_dir, None, None, "no .wat sources found" ) ],
			false => Vec::with_capacity( 0 ),
		};

		let artifacts = assembled.into_iter()
			.map(|( relative, binary )| {
				let path = output_dir.join( &relative );
				if let Some( parent ) = path.parent() {
					std::fs::create_dir_all( parent ).map_err(| source | CompileError::Io { path: parent.to_path_buf(), source })?;
				}
				std::fs::write( &path, binary ).map_err(| source | CompileError::Io { path: path.clone(), source })?;
				Ok( relative )
			})
			.collect::<Result<Vec<_>, CompileError>>()?;

		tracing::debug!( source = %source_dir.display(), artifacts = artifacts.len(), "assembled sources" );

		Ok( CompileOutput { artifacts, warnings, classpath: classpath.to_vec() })

	}
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn assembles_an_empty_component() {
		let binary = WatCompiler::assemble( Path::new( "empty.wat" ), "(component)" ).unwrap();
		assert_eq!( &binary[..4], b"\0asm" );
	}

	#[test]
	fn reports_syntax_errors_with_location() {
		let text = "(component\n  (core module $m\n    (func (export \"f\") (result i32) i32.const oops)))";
		let diagnostic = WatCompiler::assemble( Path::new( "broken.wat" ), text ).unwrap_err();
		assert!( diagnostic.is_error() );
		assert_eq!( diagnostic.file(), Path::new( "broken.wat" ));
		assert_eq!( diagnostic.line(), Some( 3 ));
	}

	#[test]
	fn failed_file_produces_no_artifacts() {
		let source = tempfile::tempdir().unwrap();
		let output = tempfile::tempdir().unwrap();
		std::fs::write( source.path().join( "good.wat" ), "(component)" ).unwrap();
		std::fs::write( source.path().join( "bad.wat" ), "(component" ).unwrap();

		match WatCompiler.compile( source.path(), output.path(), &[] ) {
			Err( err @ CompileError::Diagnostics( _ )) => assert_eq!( err.diagnostics().len(), 1 ),
			other => panic!( "Expected diagnostics, found: {:?}", other ),
		}
		assert!( !output.path().join( "good.wasm" ).exists() );
	}

	#[test]
	fn empty_tree_compiles_with_a_warning() {
		let source = tempfile::tempdir().unwrap();
		let output = tempfile::tempdir().unwrap();
		let result = WatCompiler.compile( source.path(), output.path(), &[] ).unwrap();
		assert!( result.artifacts.is_empty() );
		assert_eq!( result.warnings.len(), 1 );
	}

}
