use std::path::{ Path, PathBuf };



/// How serious a [`Diagnostic`] is.
#[derive( Copy, Clone, Eq, PartialEq, Hash, Debug )]
pub enum Severity {
	/// The file failed to compile.
	Error,
	/// The file compiled, but something deserves attention.
	Warning,
}

impl std::fmt::Display for Severity {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Error => write!( f, "error" ),
			Self::Warning => write!( f, "warning" ),
		}
	}
}

/// A compiler message located in a source file.
///
/// Lines and columns are 1-based. Either may be missing when the toolchain did not report it.
#[derive( Clone, Eq, PartialEq, Debug )]
pub struct Diagnostic {
	severity: Severity,
	file: PathBuf,
	line: Option<usize>,
	column: Option<usize>,
	message: String,
}

impl Diagnostic {

	/// Creates a diagnostic.
	pub fn new(
		severity: Severity,
		file: impl Into<PathBuf>,
		line: Option<usize>,
		column: Option<usize>,
		message: impl Into<String>,
	) -> Self {
		Self { severity, file: file.into(), line, column, message: message.into() }
	}

	/// Creates an error diagnostic.
	pub fn error( file: impl Into<PathBuf>, line: Option<usize>, column: Option<usize>, message: impl Into<String> ) -> Self {
		Self::new( Severity::Error, file, line, column, message )
	}

	/// Creates a warning diagnostic.
	pub fn warning( file: impl Into<PathBuf>, line: Option<usize>, column: Option<usize>, message: impl Into<String> ) -> Self {
		Self::new( Severity::Warning, file, line, column, message )
	}

	#[inline] pub fn severity( &self ) -> Severity { self.severity }
	#[inline] pub fn file( &self ) -> &Path { &self.file }
	#[inline] pub fn line( &self ) -> Option<usize> { self.line }
	#[inline] pub fn column( &self ) -> Option<usize> { self.column }
	#[inline] pub fn message( &self ) -> &str { &self.message }
	#[inline] pub fn is_error( &self ) -> bool { self.severity == Severity::Error }

	/// Parses a toolchain output line of the form
	/// `path:line[:column]: error|warning: message`.
	///
	/// Relative paths are joined onto `base`. Lines in any other shape yield `None`.
	pub fn parse_line( line: &str, base: &Path ) -> Option<Self> {

		let ( location, severity, message ) = [( ": error: ", Severity::Error ), ( ": warning: ", Severity::Warning )]
			.into_iter()
			.filter_map(|( marker, severity )| line.find( marker ).map(| at | ( at, marker, severity )))
			.min_by_key(|( at, _, _ )| *at )
			.map(|( at, marker, severity )| ( &line[..at], severity, &line[at + marker.len()..] ))?;

		// `location` is `path:line` or `path:line:column`; the path itself may contain ':'
		let mut parts = location.rsplitn( 3, ':' );
		let last = parts.next()?.trim().parse::<usize>().ok()?;
		let ( file, line_number, column ) = match parts.next().map(| part | part.trim().parse::<usize>() ) {
			Some( Ok( line_number )) => ( parts.next()?, line_number, Some( last )),
			Some( Err( _ )) => ( location.rsplit_once( ':' )?.0, last, None ),
			None => return None,
		};

		let file = Path::new( file.trim() );
		let file = match file.is_absolute() {
			true => file.to_path_buf(),
			false => base.join( file ),
		};

		Some( Self::new( severity, file, Some( line_number ), column, message.trim() ))

	}

}

impl std::fmt::Display for Diagnostic {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		write!( f, "{}", self.file.display() )?;
		if let Some( line ) = self.line { write!( f, ":{}", line )?; }
		if let Some( column ) = self.column { write!( f, ":{}", column )?; }
		write!( f, ": {}: {}", self.severity, self.message )
	}
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn parses_line_and_column() {
		let diagnostic = Diagnostic::parse_line( "entry.wat:3:7: error: unexpected token", Path::new( "/src" )).unwrap();
		assert_eq!( diagnostic.severity(), Severity::Error );
		assert_eq!( diagnostic.file(), Path::new( "/src/entry.wat" ));
		assert_eq!( diagnostic.line(), Some( 3 ));
		assert_eq!( diagnostic.column(), Some( 7 ));
		assert_eq!( diagnostic.message(), "unexpected token" );
	}

	#[test]
	fn parses_line_without_column() {
		let diagnostic = Diagnostic::parse_line( "/abs/lib.wat:12: warning: unused import", Path::new( "/src" )).unwrap();
		assert_eq!( diagnostic.severity(), Severity::Warning );
		assert_eq!( diagnostic.file(), Path::new( "/abs/lib.wat" ));
		assert_eq!( diagnostic.line(), Some( 12 ));
		assert_eq!( diagnostic.column(), None );
	}

	#[test]
	fn ignores_unrelated_output() {
		assert_eq!( Diagnostic::parse_line( "Compiling 3 files", Path::new( "/src" )), None );
		assert_eq!( Diagnostic::parse_line( "no location: error: boom", Path::new( "/src" )), None );
	}

	#[test]
	fn displays_like_a_toolchain() {
		let diagnostic = Diagnostic::error( "src/entry.wat", Some( 1 ), Some( 2 ), "boom" );
		assert_eq!( diagnostic.to_string(), "src/entry.wat:1:2: error: boom" );
	}

}
