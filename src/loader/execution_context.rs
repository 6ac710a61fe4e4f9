use std::path::{ Path, PathBuf };
use wasmtime::Store ;



/// The isolated namespace of one loaded project.
///
/// Owns the wasmtime [`Store`] every component of the project (and every
/// `include`d dependency) was instantiated into. Stores never share instances,
/// so dropping the context releases every symbol the project loaded and nothing
/// else. Two projects depending on the same artifact each instantiate their own copy.
pub struct ExecutionContext<Ctx: 'static> {
	pub(crate) store: Store<Ctx>,
	owned: Vec<PathBuf>,
	exports: Vec<String>,
}

impl<Ctx: 'static> ExecutionContext<Ctx> {

	pub(crate) fn new( store: Store<Ctx> ) -> Self {
		Self { store, owned: Vec::new(), exports: Vec::new() }
	}

	pub(crate) fn record_instance( &mut self, artifact: PathBuf, exports: impl IntoIterator<Item = String> ) {
		self.owned.push( artifact );
		self.exports.extend( exports );
	}

	/// Artifacts instantiated inside this context, in instantiation order.
	#[inline] pub fn owned_artifacts( &self ) -> &[PathBuf] { &self.owned }

	/// Whether `artifact` was instantiated inside this context.
	///
	/// Always `false` for `provided` dependencies: their symbols live in the host.
	pub fn owns( &self, artifact: &Path ) -> bool {
		self.owned.iter().any(| owned | owned == artifact )
	}

	/// Functions forwarded into the shared namespace, as `interface#function`
	/// (or just `function` for top-level exports).
	#[inline] pub fn exports( &self ) -> &[String] { &self.exports }

	#[inline] pub fn data( &self ) -> &Ctx { self.store.data() }
	#[inline] pub fn data_mut( &mut self ) -> &mut Ctx { self.store.data_mut() }

}

impl<Ctx: std::fmt::Debug + 'static> std::fmt::Debug for ExecutionContext<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ExecutionContext" )
			.field( "data", self.store.data() )
			.field( "owned", &self.owned )
			.field( "exports", &self.exports )
			.finish_non_exhaustive()
	}
}
