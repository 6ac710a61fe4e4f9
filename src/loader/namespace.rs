use std::path::PathBuf ;
use wasmtime::{ Engine, Store };
use wasmtime::component::{ Component, Func, Instance, Linker, LinkerInstance };
use wasmtime::component::types::ComponentItem ;

use super::{ ExecutionContext, LoadError };



/// A compiled component waiting to be instantiated.
pub(super) struct Unit {
	pub artifact: PathBuf,
	pub component: Component,
}

impl Unit {
	/// Whether the component exports an instance called `interface`.
	pub fn exports_instance( &self, engine: &Engine, interface: &str ) -> bool {
		self.component.component_type()
			.exports( engine )
			.any(|( name, item )| name == interface && matches!( item, ComponentItem::ComponentInstance( _ )))
	}
}

/// Instantiates every unit into `context`, forwarding each one's exports into `linker`.
///
/// Units are taken in passes: each pass instantiates every unit whose imports the
/// linker can already satisfy. A pass that makes no progress means the remaining
/// imports can never be met.
pub(super) fn instantiate_units<Ctx: 'static>(
	engine: &Engine,
	linker: &mut Linker<Ctx>,
	context: &mut ExecutionContext<Ctx>,
	units: Vec<Unit>,
) -> Result<(), LoadError> {

	let mut pending = units ;

	while !pending.is_empty() {

		let before = pending.len();
		let mut blocked = Vec::with_capacity( before );

		for unit in pending {
			match linker.instantiate_pre( &unit.component ) {
				Ok( pre ) => {
					let instance = pre.instantiate( &mut context.store )
						.map_err(| cause | LoadError::Instantiation { artifact: unit.artifact.clone(), cause })?;
					let exports = forward_exports( engine, linker, &mut context.store, &unit, &instance )?;
					tracing::trace!( artifact = %unit.artifact.display(), exports = exports.len(), "instantiated component" );
					context.record_instance( unit.artifact, exports );
				},
				Err( cause ) => blocked.push(( unit, cause )),
			}
		}

		if blocked.len() == before {
			return match blocked.into_iter().next() {
				Some(( unit, cause )) => Err( LoadError::UnresolvedImports { artifact: unit.artifact, cause }),
				None => Ok(()),
			};
		}

		pending = blocked.into_iter().map(|( unit, _ )| unit ).collect();

	}

	Ok(())

}

/// Defines every function `instance` exports in `linker`, calling straight into the instance.
///
/// Returns the names defined. Exported resources and nested components cannot be
/// shared through a linker and fail the load.
fn forward_exports<Ctx: 'static>(
	engine: &Engine,
	linker: &mut Linker<Ctx>,
	store: &mut Store<Ctx>,
	unit: &Unit,
	instance: &Instance,
) -> Result<Vec<String>, LoadError> {

	let component_type = unit.component.component_type();
	let mut forwarded = Vec::new();
	let mut root = linker.root();

	for ( name, item ) in component_type.exports( engine ) {
		match item {
			ComponentItem::ComponentInstance( instance_type ) => {

				let instance_index = instance.get_export_index( &mut *store, None, name )
					.ok_or_else(|| unsupported( unit, name ))?;
				let mut linker_instance = root.instance( name )
					.map_err(| cause | duplicate( unit, name, cause ))?;

				for ( function, item ) in instance_type.exports( engine ) {
					let path = format!( "{}#{}", name, function );
					match item {
						ComponentItem::ComponentFunc( _ ) => {
							let func = instance.get_export_index( &mut *store, Some( &instance_index ), function )
								.and_then(| index | instance.get_func( &mut *store, index ))
								.ok_or_else(|| unsupported( unit, &path ))?;
							define( &mut linker_instance, function, func ).map_err(| cause | duplicate( unit, &path, cause ))?;
							forwarded.push( path );
						},
						ComponentItem::Type( _ ) => {},
						_ => return Err( unsupported( unit, &path )),
					}
				}

			},
			ComponentItem::ComponentFunc( _ ) => {
				let func = instance.get_export_index( &mut *store, None, name )
					.and_then(| index | instance.get_func( &mut *store, index ))
					.ok_or_else(|| unsupported( unit, name ))?;
				define( &mut root, name, func ).map_err(| cause | duplicate( unit, name, cause ))?;
				forwarded.push( name.to_string() );
			},
			ComponentItem::Type( _ ) => {},
			_ => return Err( unsupported( unit, name )),
		}
	}

	Ok( forwarded )

}

fn define<Ctx: 'static>( linker_instance: &mut LinkerInstance<'_, Ctx>, name: &str, func: Func ) -> wasmtime::Result<()> {
	linker_instance.func_new( name, move | mut ctx, _ty, args, results | {
		func.call( &mut ctx, args, results )?;
		func.post_return( &mut ctx )
	})
}

fn unsupported( unit: &Unit, name: &str ) -> LoadError {
	LoadError::UnsupportedExport { artifact: unit.artifact.clone(), name: name.to_string() }
}

fn duplicate( unit: &Unit, name: &str, cause: wasmtime::Error ) -> LoadError {
	LoadError::DuplicateExport { artifact: unit.artifact.clone(), name: name.to_string(), cause }
}
