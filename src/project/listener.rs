use crate::compiler::Diagnostic ;
use crate::loader::{ LoadError, UnloadError };
use super::{ LifecycleState, ProjectErrorKind };



/// A committed transition or failure, as seen by a [`StateListener`].
#[derive( Debug )]
pub enum StateEvent<'a> {
	Compiling,
	Compiled { warnings: &'a [Diagnostic] },
	/// Resolution, compilation or writing the output failed.
	CompileFailed( &'a ProjectErrorKind ),
	Loading,
	Loaded { version: &'a str },
	LoadFailed( &'a LoadError ),
	Unloading,
	/// The context is released. `hook_error` is set if `on-unload` trapped.
	Unloaded { hook_error: Option<&'a UnloadError> },
}

impl StateEvent<'_> {

	/// The state the project is in once the event is delivered.
	pub fn state( &self ) -> LifecycleState {
		match self {
			Self::Compiling => LifecycleState::Compiling,
			Self::Compiled { .. } | Self::LoadFailed( _ ) | Self::Unloaded { .. } => LifecycleState::Compiled,
			Self::CompileFailed( _ ) => LifecycleState::Unloaded,
			Self::Loading => LifecycleState::Loading,
			Self::Loaded { .. } => LifecycleState::Loaded,
			Self::Unloading => LifecycleState::Unloading,
		}
	}

	/// Whether the event reports an error or warning.
	pub fn is_failure( &self ) -> bool {
		matches!( self, Self::CompileFailed( _ ) | Self::LoadFailed( _ ) | Self::Unloaded { hook_error: Some( _ ) })
	}

}

/// Observes every transition of the projects it is attached to.
///
/// Called synchronously on the thread running the operation, with the
/// project's transition lock held: calling back into the same project's
/// lifecycle operations is rejected as busy. Reading its status is fine.
pub trait StateListener: Send + Sync {
	fn on_transition( &self, project: &str, event: &StateEvent<'_> );
}

/// Ignores everything.
#[derive( Copy, Clone, Debug, Default )]
pub struct NoopListener ;

impl StateListener for NoopListener {
	fn on_transition( &self, _project: &str, _event: &StateEvent<'_> ) {}
}

/// Adapts a closure into a [`StateListener`].
pub struct FnListener<F>( pub F );

impl<F> StateListener for FnListener<F>
where
	F: Fn( &str, &StateEvent<'_> ) + Send + Sync,
{
	fn on_transition( &self, project: &str, event: &StateEvent<'_> ) { ( self.0 )( project, event ) }
}

impl<F> std::fmt::Debug for FnListener<F> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_tuple( "FnListener" ).field( &"<closure>" ).finish()
	}
}
