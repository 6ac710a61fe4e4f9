//! Manager configuration.
//!
//! ```toml
//! projects_root = "projects"
//! source_dir = "src"                # default
//! binary_dir = "bin"                # default
//! dependencies_file = "dependencies" # default
//! entry_point_interface = "hotswap:project/entry-point" # default
//! parallel_compile = true           # default
//!
//! [compiler]                        # default: kind = "wat"
//! kind = "command"
//! program = "wasm-tools"
//! args = [ "component", "new", "{source}/core.wasm", "-o", "{output}/entry.wasm" ]
//! ```

use std::path::{ Component, Path, PathBuf };
use std::sync::Arc ;
use serde::Deserialize ;
use thiserror::Error ;

use crate::compiler::{ CommandCompiler, Compiler, WatCompiler };
use crate::loader::ModuleLoader ;



/// Errors reading or validating a configuration.
#[derive( Error, Debug )]
pub enum ConfigError {
	#[error( "Failed to read config '{}': {source}", path.display() )]
	Io { path: PathBuf, source: std::io::Error },
	#[error( "Failed to parse config: {0}" )]
	Toml( #[from] toml::de::Error ),
	#[error( "Invalid config: {0}" )]
	Invalid( String ),
}

/// Names of the fixed subpaths inside every project root.
#[derive( Clone, Debug, Deserialize, PartialEq, Eq )]
#[serde( default )]
pub struct LayoutConfig {
	pub source_dir: String,
	pub binary_dir: String,
	pub dependencies_file: String,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			source_dir: "src".to_string(),
			binary_dir: "bin".to_string(),
			dependencies_file: "dependencies".to_string(),
		}
	}
}

impl LayoutConfig {
	fn validate( &self ) -> Result<(), ConfigError> {
		for ( key, value ) in [
			( "source_dir", &self.source_dir ),
			( "binary_dir", &self.binary_dir ),
			( "dependencies_file", &self.dependencies_file ),
		] {
			let mut components = Path::new( value ).components();
			if !matches!(( components.next(), components.next() ), ( Some( Component::Normal( _ )), None )) {
				return Err( ConfigError::Invalid( format!( "{} must be a single relative path segment, got '{}'", key, value )));
			}
		}
		if self.source_dir == self.binary_dir || self.binary_dir == self.dependencies_file || self.source_dir == self.dependencies_file {
			return Err( ConfigError::Invalid( "source_dir, binary_dir and dependencies_file must differ".to_string() ));
		}
		Ok(())
	}
}

/// Which compiler the manager drives.
#[derive( Clone, Debug, Default, Deserialize, PartialEq, Eq )]
#[serde( tag = "kind", rename_all = "lowercase" )]
pub enum CompilerConfig {
	/// The in-process WebAssembly text assembler.
	#[default] Wat,
	/// An external program, see [`CommandCompiler`].
	Command {
		program: String,
		#[serde( default )] args: Vec<String>,
	},
}

impl CompilerConfig {
	/// Instantiates the configured compiler.
	pub fn build( &self ) -> Arc<dyn Compiler> {
		match self {
			Self::Wat => Arc::new( WatCompiler ),
			Self::Command { program, args } => Arc::new( CommandCompiler::new( program.clone(), args.iter().cloned() )),
		}
	}
}

/// Settings for a [`ProjectManager`]( crate::ProjectManager ).
#[derive( Clone, Debug, Deserialize, PartialEq, Eq )]
pub struct ManagerConfig {
	/// Directory whose immediate subdirectories are projects.
	pub projects_root: PathBuf,
	#[serde( flatten )]
	pub layout: LayoutConfig,
	#[serde( default = "default_entry_point_interface" )]
	pub entry_point_interface: String,
	/// Compile projects of a batch on parallel threads.
	#[serde( default = "default_parallel_compile" )]
	pub parallel_compile: bool,
	#[serde( default )]
	pub compiler: CompilerConfig,
}

fn default_entry_point_interface() -> String { ModuleLoader::<()>::DEFAULT_ENTRY_INTERFACE.to_string() }
fn default_parallel_compile() -> bool { true }

impl ManagerConfig {

	/// Default settings for projects under `projects_root`.
	pub fn new( projects_root: impl Into<PathBuf> ) -> Self {
		Self {
			projects_root: projects_root.into(),
			layout: LayoutConfig::default(),
			entry_point_interface: default_entry_point_interface(),
			parallel_compile: default_parallel_compile(),
			compiler: CompilerConfig::default(),
		}
	}

	/// Reads a TOML file. A relative `projects_root` is taken relative to the file's directory.
	///
	/// # Errors
	/// I/O, parse or validation failures.
	pub fn from_file( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string( path )
			.map_err(| source | ConfigError::Io { path: path.to_path_buf(), source })?;
		let mut config = Self::from_toml_str( &text )?;
		if config.projects_root.is_relative() {
			if let Some( parent ) = path.parent() {
				config.projects_root = parent.join( &config.projects_root );
			}
		}
		Ok( config )
	}

	/// Parses TOML text.
	///
	/// # Errors
	/// Parse or validation failures.
	pub fn from_toml_str( text: &str ) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str( text )?;
		config.validate()?;
		Ok( config )
	}

	/// Checks the settings are usable.
	///
	/// # Errors
	/// [`ConfigError::Invalid`] describing the first problem found.
	pub fn validate( &self ) -> Result<(), ConfigError> {
		self.layout.validate()?;
		if self.entry_point_interface.trim().is_empty() {
			return Err( ConfigError::Invalid( "entry_point_interface must not be empty".to_string() ));
		}
		if let CompilerConfig::Command { program, .. } = &self.compiler {
			if program.trim().is_empty() {
				return Err( ConfigError::Invalid( "compiler program must not be empty".to_string() ));
			}
		}
		Ok(())
	}

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn minimal_config_uses_defaults() {
		let config = ManagerConfig::from_toml_str( r#"projects_root = "/srv/projects""# ).unwrap();
		assert_eq!( config, ManagerConfig::new( "/srv/projects" ));
		assert_eq!( config.layout.source_dir, "src" );
		assert_eq!( config.entry_point_interface, "hotswap:project/entry-point" );
		assert!( config.parallel_compile );
	}

	#[test]
	fn command_compiler_is_parsed() {
		let config = ManagerConfig::from_toml_str( r#"
			projects_root = "p"
			binary_dir = "out"
			parallel_compile = false

			[compiler]
			kind = "command"
			program = "wasm-tools"
			args = [ "parse", "{source}/entry.wat" ]
		"# ).unwrap();
		assert_eq!( config.layout.binary_dir, "out" );
		assert!( !config.parallel_compile );
		assert_eq!( config.compiler, CompilerConfig::Command {
			program: "wasm-tools".to_string(),
			args: vec![ "parse".to_string(), "{source}/entry.wat".to_string() ],
		});
	}

	#[test]
	fn overlapping_directories_are_rejected() {
		let err = ManagerConfig::from_toml_str( "projects_root = \"p\"\nsource_dir = \"code\"\nbinary_dir = \"code\"" ).unwrap_err();
		assert!( matches!( err, ConfigError::Invalid( _ )));
	}

	#[test]
	fn nested_or_escaping_names_are_rejected() {
		assert!( matches!(
			ManagerConfig::from_toml_str( "projects_root = \"p\"\nbinary_dir = \"../bin\"" ),
			Err( ConfigError::Invalid( _ )),
		));
		assert!( matches!(
			ManagerConfig::from_toml_str( "projects_root = \"p\"\nsource_dir = \"\"" ),
			Err( ConfigError::Invalid( _ )),
		));
	}

	#[test]
	fn unknown_compiler_kind_fails_to_parse() {
		assert!( matches!(
			ManagerConfig::from_toml_str( "projects_root = \"p\"\n[compiler]\nkind = \"javac\"" ),
			Err( ConfigError::Toml( _ )),
		));
	}

	#[test]
	fn relative_root_is_anchored_at_the_config_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join( "hotswap.toml" );
		std::fs::write( &path, "projects_root = \"projects\"" ).unwrap();
		let config = ManagerConfig::from_file( &path ).unwrap();
		assert_eq!( config.projects_root, dir.path().join( "projects" ));
	}

}
