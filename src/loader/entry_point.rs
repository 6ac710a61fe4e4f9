use std::path::{ Path, PathBuf };
use wasmtime::Store ;
use wasmtime::component::{ Instance, TypedFunc };

use super::LoadError ;



/// Typed handles to the three functions of the entry-point contract.
///
/// Only valid for the store the entry component was instantiated in, so it
/// always travels together with its [`ExecutionContext`]( super::ExecutionContext ).
pub(crate) struct EntryPoint {
	artifact: PathBuf,
	on_load: TypedFunc<(), ()>,
	on_unload: TypedFunc<(), ()>,
	get_version: TypedFunc<(), ( String, )>,
}

impl EntryPoint {

	pub const ON_LOAD: &str = "on-load" ;
	pub const ON_UNLOAD: &str = "on-unload" ;
	pub const GET_VERSION: &str = "get-version" ;

	pub fn resolve<Ctx: 'static>(
		store: &mut Store<Ctx>,
		instance: &Instance,
		interface: &str,
		artifact: &Path,
	) -> Result<Self, LoadError> {

		let missing = | function: &str | LoadError::IncompleteEntryPoint {
			artifact: artifact.to_path_buf(),
			function: function.to_string(),
		};

		let interface_index = instance
			.get_export_index( &mut *store, None, interface )
			.ok_or_else(|| missing( interface ))?;

		macro_rules! typed {( $name: expr ) => {{
			let index = instance
				.get_export_index( &mut *store, Some( &interface_index ), $name )
				.ok_or_else(|| missing( $name ))?;
			instance.get_typed_func( &mut *store, index )
				.map_err(| cause | LoadError::EntryPointSignature { function: $name.to_string(), cause })?
		}}}

		Ok( Self {
			artifact: artifact.to_path_buf(),
			on_load: typed!( Self::ON_LOAD ),
			on_unload: typed!( Self::ON_UNLOAD ),
			get_version: typed!( Self::GET_VERSION ),
		})

	}

	#[inline] pub fn artifact( &self ) -> &Path { &self.artifact }

	pub fn on_load<Ctx: 'static>( &self, store: &mut Store<Ctx> ) -> wasmtime::Result<()> {
		self.on_load.call( &mut *store, () )?;
		self.on_load.post_return( store )
	}

	pub fn on_unload<Ctx: 'static>( &self, store: &mut Store<Ctx> ) -> wasmtime::Result<()> {
		self.on_unload.call( &mut *store, () )?;
		self.on_unload.post_return( store )
	}

	pub fn version<Ctx: 'static>( &self, store: &mut Store<Ctx> ) -> wasmtime::Result<String> {
		let ( version, ) = self.get_version.call( &mut *store, () )?;
		self.get_version.post_return( store )?;
		Ok( version )
	}

}

impl std::fmt::Debug for EntryPoint {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "EntryPoint" )
			.field( "artifact", &self.artifact )
			.finish_non_exhaustive()
	}
}
