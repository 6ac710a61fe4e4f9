use std::path::{ Path, PathBuf };
use std::process::Command ;
use itertools::Itertools ;
use nonempty_collections::{ NEVec, nev };

use crate::dependency::Dependency ;
use super::{ collect_files, CompileError, CompileOutput, Compiler, Diagnostic };



/// Runs an external toolchain program.
///
/// Arguments may contain the placeholders `{source}`, `{output}` and
/// `{classpath}`; the classpath is every dependency artifact joined with the
/// platform path separator. The program runs with the source directory as its
/// working directory.
///
/// Output lines shaped like `path:line[:column]: error|warning: message`, on
/// either stream, become [`Diagnostic`]s. The compile fails if the program exits
/// unsuccessfully or reports any error; artifacts are the `*.wasm` files it left
/// in the output directory.
#[derive( Clone, Debug )]
pub struct CommandCompiler {
	program: String,
	args: Vec<String>,
}

impl CommandCompiler {

	const ARTIFACT_EXTENSION: &str = "wasm" ;
	const STDERR_TAIL_LINES: usize = 10 ;

	/// Creates an adapter for `program` invoked with `args`.
	pub fn new( program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>> ) -> Self {
		Self { program: program.into(), args: args.into_iter().map( Into::into ).collect() }
	}

	#[inline] pub fn program( &self ) -> &str { &self.program }
	#[inline] pub fn args( &self ) -> &[String] { &self.args }

	fn expand( &self, source_dir: &Path, output_dir: &Path, classpath: &[Dependency] ) -> Result<Vec<String>, CompileError> {
		let classpath = join_classpath( classpath )?;
		Ok( self.args.iter()
			.map(| arg | arg
				.replace( "{source}", &source_dir.to_string_lossy() )
				.replace( "{output}", &output_dir.to_string_lossy() )
				.replace( "{classpath}", &classpath ))
			.collect())
	}

}

impl Compiler for CommandCompiler {
	fn compile( &self, source_dir: &Path, output_dir: &Path, classpath: &[Dependency] ) -> Result<CompileOutput, CompileError> {

		let output = Command::new( &self.program )
			.args( self.expand( source_dir, output_dir, classpath )?)
			.current_dir( source_dir )
			.output()
			.map_err(| source | CompileError::Toolchain { program: self.program.clone(), source })?;

		let stdout = String::from_utf8_lossy( &output.stdout );
		let stderr = String::from_utf8_lossy( &output.stderr );

		let ( errors, warnings ): ( Vec<_>, Vec<_> ) = stdout.lines()
			.chain( stderr.lines() )
			.filter_map(| line | Diagnostic::parse_line( line, source_dir ))
			.partition( Diagnostic::is_error );

		if let Some( errors ) = NEVec::try_from_vec( errors ) {
			return Err( CompileError::Diagnostics( errors ));
		}

		if !output.status.success() {
			let tail = stderr.lines().rev().take( Self::STDERR_TAIL_LINES ).collect::<Vec<_>>().into_iter().rev().join( "\n" );
			return Err( CompileError::Diagnostics( nev![ Diagnostic::error(
				source_dir,
				None,
				None,
				format!( "'{}' exited with {}: {}", self.program, output.status, tail ),
			)]));
		}

		let artifacts = collect_files( output_dir, Self::ARTIFACT_EXTENSION )
			.map_err(| source | CompileError::Io { path: output_dir.to_path_buf(), source })?;

		tracing::debug!( program = %self.program, artifacts = artifacts.len(), warnings = warnings.len(), "external compile finished" );

		Ok( CompileOutput { artifacts, warnings, classpath: classpath.to_vec() })

	}
}

/// Joins every artifact with the platform path separator.
///
/// An artifact whose path contains the separator cannot be represented; each one
/// becomes an error diagnostic rather than being dropped from the classpath.
fn join_classpath( classpath: &[Dependency] ) -> Result<String, CompileError> {

	let unrepresentable = classpath.iter()
		.filter(| dependency | std::env::join_paths( std::iter::once( dependency.artifact() )).is_err() )
		.map(| dependency | Diagnostic::error(
			dependency.artifact(),
			None,
			None,
			"dependency path contains the classpath separator",
		))
		.collect::<Vec<_>>();

	if let Some( errors ) = NEVec::try_from_vec( unrepresentable ) {
		return Err( CompileError::Diagnostics( errors ));
	}

	std::env::join_paths( classpath.iter().map( Dependency::artifact ))
		.map(| joined | joined.to_string_lossy().into_owned() )
		.map_err(| err | CompileError::Diagnostics( nev![ Diagnostic::error( PathBuf::new(), None, None, err.to_string() )]))

}

#[cfg( all( test, unix ))]
mod tests {

	use super::* ;

	#[test]
	fn placeholders_are_expanded() {
		let compiler = CommandCompiler::new( "wasm-tools", [ "parse", "{source}/entry.wat", "-o", "{output}/entry.wasm", "--cp={classpath}" ]);
		let args = compiler.expand(
			Path::new( "/p/src" ),
			Path::new( "/p/.bin.staging" ),
			&[ Dependency::include( "/a.wasm" ), Dependency::provided( "/b.wasm" ) ],
		).unwrap();
		assert_eq!( args, vec![ "parse", "/p/src/entry.wat", "-o", "/p/.bin.staging/entry.wasm", "--cp=/a.wasm:/b.wasm" ]);
	}

	#[test]
	fn separator_in_a_dependency_path_fails_the_compile() {
		let source = tempfile::tempdir().unwrap();
		let output = tempfile::tempdir().unwrap();
		let compiler = CommandCompiler::new( "sh", [ "-c", "printf '%s' '{classpath}' > {output}/classpath.txt" ]);
		let classpath = [ Dependency::include( "/libs/a.wasm" ), Dependency::provided( "/libs/v1:2/b.wasm" ) ];

		let err = compiler.compile( source.path(), output.path(), &classpath ).unwrap_err();
		let diagnostics = err.diagnostics();
		assert_eq!( diagnostics.len(), 1 );
		assert_eq!( diagnostics[0].file(), Path::new( "/libs/v1:2/b.wasm" ));
		assert!( !output.path().join( "classpath.txt" ).exists() );
	}

	#[test]
	fn toolchain_diagnostics_fail_the_compile() {
		let source = tempfile::tempdir().unwrap();
		let output = tempfile::tempdir().unwrap();
		let compiler = CommandCompiler::new( "sh", [ "-c", "echo 'entry.wat:4:2: error: unknown instruction' >&2; exit 1" ]);
		match compiler.compile( source.path(), output.path(), &[] ) {
			Err( err @ CompileError::Diagnostics( _ )) => {
				let diagnostics = err.diagnostics();
				assert_eq!( diagnostics.len(), 1 );
				assert_eq!( diagnostics[0].line(), Some( 4 ));
				assert_eq!( diagnostics[0].message(), "unknown instruction" );
			},
			other => panic!( "Expected diagnostics, found: {:?}", other ),
		}
	}

	#[test]
	fn silent_failure_yields_a_synthetic_diagnostic() {
		let source = tempfile::tempdir().unwrap();
		let output = tempfile::tempdir().unwrap();
		let compiler = CommandCompiler::new( "sh", [ "-c", "echo 'linker exploded' >&2; exit 3" ]);
		let err = compiler.compile( source.path(), output.path(), &[] ).unwrap_err();
		let diagnostics = err.diagnostics();
		assert_eq!( diagnostics.len(), 1 );
		assert!( diagnostics[0].message().contains( "linker exploded" ));
	}

	#[test]
	fn warnings_and_artifacts_are_collected() {
		let source = tempfile::tempdir().unwrap();
		let output = tempfile::tempdir().unwrap();
		let compiler = CommandCompiler::new( "sh", [ "-c", "touch {output}/entry.wasm; echo 'entry.wat:1: warning: unused'" ]);
		let result = compiler.compile( source.path(), output.path(), &[] ).unwrap();
		assert_eq!( result.artifacts, vec![ PathBuf::from( "entry.wasm" ) ]);
		assert_eq!( result.warnings.len(), 1 );
	}

	#[test]
	fn missing_program_is_a_toolchain_error() {
		let source = tempfile::tempdir().unwrap();
		let compiler = CommandCompiler::new( "definitely-not-a-compiler-7935", Vec::<String>::new() );
		assert!( matches!(
			compiler.compile( source.path(), source.path(), &[] ),
			Err( CompileError::Toolchain { .. }),
		));
	}

}
