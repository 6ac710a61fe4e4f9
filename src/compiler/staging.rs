use std::path::{ Path, PathBuf };



/// A scratch directory that replaces an output directory in one step.
///
/// Compilers write into [`StagedOutput::path`]. Nothing touches the real output
/// directory until [`StagedOutput::commit`]; dropping an uncommitted stage
/// removes it, so a failed compile leaves the previous artifacts exactly as they were.
#[derive( Debug )]
pub(crate) struct StagedOutput {
	staging: PathBuf,
	target: PathBuf,
}

impl StagedOutput {

	/// Creates an empty staging directory next to `target`.
	pub fn create( target: &Path ) -> std::io::Result<Self> {
		let staging = sibling( target, "staging" );
		if staging.exists() { std::fs::remove_dir_all( &staging )?; }
		std::fs::create_dir_all( &staging )?;
		Ok( Self { staging, target: target.to_path_buf() })
	}

	#[inline] pub fn path( &self ) -> &Path { &self.staging }

	/// Swaps the staged directory in place of the target.
	///
	/// The previous target is moved aside first and restored if the swap fails.
	pub fn commit( self ) -> std::io::Result<()> {

		let previous = sibling( &self.target, "previous" );
		if previous.exists() { std::fs::remove_dir_all( &previous )?; }

		let had_previous = self.target.exists();
		if had_previous { std::fs::rename( &self.target, &previous )?; }

		if let Err( err ) = std::fs::rename( &self.staging, &self.target ) {
			if had_previous { restore( &previous, &self.target ); }
			return Err( err );
		}

		if had_previous {
			if let Err( err ) = std::fs::remove_dir_all( &previous ) {
				tracing::warn!( path = %previous.display(), %err, "failed to remove previous output" );
			}
		}

		Ok(())

	}

}

impl Drop for StagedOutput {
	fn drop( &mut self ) {
		if self.staging.exists() { let _ = std::fs::remove_dir_all( &self.staging ); }
	}
}

fn restore( previous: &Path, target: &Path ) {
	if let Err( err ) = std::fs::rename( previous, target ) {
		tracing::warn!( path = %target.display(), previous = %previous.display(), %err, "failed to restore previous output" );
	}
}

fn sibling( target: &Path, suffix: &str ) -> PathBuf {
	let name = target.file_name().map_or_else(|| "output".into(), | name | name.to_string_lossy() );
	target.with_file_name( format!( ".{}.{}", name, suffix ))
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn commit_replaces_previous_output() {
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join( "bin" );
		std::fs::create_dir_all( &target ).unwrap();
		std::fs::write( target.join( "old.wasm" ), b"old" ).unwrap();

		let staged = StagedOutput::create( &target ).unwrap();
		std::fs::write( staged.path().join( "new.wasm" ), b"new" ).unwrap();
		staged.commit().unwrap();

		assert!( target.join( "new.wasm" ).is_file() );
		assert!( !target.join( "old.wasm" ).exists() );
		assert!( !dir.path().join( ".bin.previous" ).exists() );
		assert!( !dir.path().join( ".bin.staging" ).exists() );
	}

	#[test]
	fn failed_swap_restores_previous_output() {
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join( "bin" );
		std::fs::create_dir_all( &target ).unwrap();
		std::fs::write( target.join( "old.wasm" ), b"old" ).unwrap();

		let staged = StagedOutput::create( &target ).unwrap();
		std::fs::remove_dir_all( staged.path() ).unwrap();
		assert!( staged.commit().is_err() );

		assert_eq!( std::fs::read( target.join( "old.wasm" )).unwrap(), b"old" );
		assert!( !dir.path().join( ".bin.previous" ).exists() );
	}

	#[test]
	fn dropped_stage_leaves_output_untouched() {
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join( "bin" );
		std::fs::create_dir_all( &target ).unwrap();
		std::fs::write( target.join( "old.wasm" ), b"old" ).unwrap();

		let staged = StagedOutput::create( &target ).unwrap();
		std::fs::write( staged.path().join( "half.wasm" ), b"half" ).unwrap();
		drop( staged );

		assert_eq!( std::fs::read( target.join( "old.wasm" )).unwrap(), b"old" );
		assert!( !target.join( "half.wasm" ).exists() );
		assert!( !dir.path().join( ".bin.staging" ).exists() );
	}

}
