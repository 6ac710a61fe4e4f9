use std::path::{ Path, PathBuf };

use crate::config::LayoutConfig ;



/// Where a project keeps its sources, binaries and dependency declarations.
///
/// All three are fixed subpaths of the project root, so two projects with
/// different roots never share a directory.
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct ProjectLayout {
	root: PathBuf,
	source_dir: PathBuf,
	binary_dir: PathBuf,
	dependencies_file: PathBuf,
}

impl ProjectLayout {

	/// Derives the layout of the project rooted at `root`.
	pub fn new( root: impl Into<PathBuf>, names: &LayoutConfig ) -> Self {
		let root = root.into();
		Self {
			source_dir: root.join( &names.source_dir ),
			binary_dir: root.join( &names.binary_dir ),
			dependencies_file: root.join( &names.dependencies_file ),
			root,
		}
	}

	#[inline] pub fn root( &self ) -> &Path { &self.root }
	#[inline] pub fn source_dir( &self ) -> &Path { &self.source_dir }
	#[inline] pub fn binary_dir( &self ) -> &Path { &self.binary_dir }
	#[inline] pub fn dependencies_file( &self ) -> &Path { &self.dependencies_file }

	/// Reads the dependency declarations, one per line.
	///
	/// Blank lines and `#` comments are skipped. A missing file declares nothing.
	///
	/// # Errors
	/// Fails if the file exists but cannot be read.
	pub fn read_declarations( &self ) -> std::io::Result<Vec<String>> {
		match std::fs::read_to_string( &self.dependencies_file ) {
			Ok( text ) => Ok( parse_declarations( &text )),
			Err( err ) if err.kind() == std::io::ErrorKind::NotFound => Ok( Vec::with_capacity( 0 )),
			Err( err ) => Err( err ),
		}
	}

}

fn parse_declarations( text: &str ) -> Vec<String> {
	text.lines()
		.map( str::trim )
		.filter(| line | !line.is_empty() && !line.starts_with( '#' ))
		.map( str::to_string )
		.collect()
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn comments_and_blank_lines_are_skipped() {
		let text = "# libraries\nlib/math.wasm\n\n   provided:api.wasm  \n#host:Other\n" ;
		assert_eq!( parse_declarations( text ), vec![ "lib/math.wasm", "provided:api.wasm" ]);
	}

	#[test]
	fn missing_file_declares_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let layout = ProjectLayout::new( dir.path(), &LayoutConfig::default() );
		assert!( layout.read_declarations().unwrap().is_empty() );
	}

	#[test]
	fn subpaths_derive_from_root() {
		let layout = ProjectLayout::new( "/projects/Foo", &LayoutConfig::default() );
		assert_eq!( layout.source_dir(), Path::new( "/projects/Foo/src" ));
		assert_eq!( layout.binary_dir(), Path::new( "/projects/Foo/bin" ));
		assert_eq!( layout.dependencies_file(), Path::new( "/projects/Foo/dependencies" ));
	}

}
