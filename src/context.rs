/// Host data stored inside every project's execution context.
///
/// A fresh value is built for each load, so nothing survives an unload or a
/// hot swap. It becomes the data of the wasmtime `Store` the project's
/// components run in, and host functions registered on the manager's
/// [`Linker`]( wasmtime::component::Linker ) reach it through their
/// `StoreContextMut`.
///
/// ```
/// use hotswap_link::ProjectContext ;
///
/// struct Context { project: String, calls: u32 }
///
/// impl ProjectContext for Context {
/// 	fn new( project: &str ) -> Self { Self { project: project.to_string(), calls: 0 } }
/// }
/// ```
pub trait ProjectContext: Send + Sized + 'static {
	/// Creates the context data for a load of `project`.
	fn new( project: &str ) -> Self ;
}

impl ProjectContext for () {
	fn new( _project: &str ) -> Self {}
}
