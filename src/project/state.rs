use thiserror::Error ;



/// Where a project is in its lifecycle.
///
/// `Compiling`, `Loading` and `Unloading` are only ever observed while the
/// project's transition lock is held. Every failure settles back on one of the
/// stable states: `Unloaded`, `Compiled` or `Loaded`.
#[derive( Copy, Clone, Eq, PartialEq, Hash, Debug, Default )]
pub enum LifecycleState {
	/// No usable artifact; compile before loading.
	#[default] Unloaded,
	Compiling,
	/// Artifacts are on disk, nothing is instantiated.
	Compiled,
	Loading,
	/// The entry point is live inside an execution context.
	Loaded,
	Unloading,
}

impl LifecycleState {
	/// Whether the state can persist between operations.
	pub fn is_stable( self ) -> bool {
		matches!( self, Self::Unloaded | Self::Compiled | Self::Loaded )
	}
}

impl std::fmt::Display for LifecycleState {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		f.write_str( match self {
			Self::Unloaded => "unloaded",
			Self::Compiling => "compiling",
			Self::Compiled => "compiled",
			Self::Loading => "loading",
			Self::Loaded => "loaded",
			Self::Unloading => "unloading",
		})
	}
}

/// A lifecycle operation, as named in errors and logs.
#[derive( Copy, Clone, Eq, PartialEq, Hash, Debug )]
pub enum Operation { Compile, Load, Unload, HotSwap }

impl std::fmt::Display for Operation {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		f.write_str( match self {
			Self::Compile => "compile",
			Self::Load => "load",
			Self::Unload => "unload",
			Self::HotSwap => "hot swap",
		})
	}
}

/// The operation was refused before anything happened.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
pub enum LifecycleError {
	/// The operation is not valid from the current state.
	#[error( "Cannot {operation} while {state}" )]
	InvalidTransition { operation: Operation, state: LifecycleState },
	/// Another operation on the same project is in progress.
	#[error( "Another operation is in progress" )]
	Busy,
	/// The operation panicked. The project was put back on its last stable state.
	#[error( "Operation panicked" )]
	Panicked,
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn only_resting_states_are_stable() {
		let stable = [
			LifecycleState::Unloaded, LifecycleState::Compiling, LifecycleState::Compiled,
			LifecycleState::Loading, LifecycleState::Loaded, LifecycleState::Unloading,
		].into_iter().filter(| state | state.is_stable() ).collect::<Vec<_>>();
		assert_eq!( stable, vec![ LifecycleState::Unloaded, LifecycleState::Compiled, LifecycleState::Loaded ]);
	}

	#[test]
	fn invalid_transition_names_operation_and_state() {
		let err = LifecycleError::InvalidTransition { operation: Operation::HotSwap, state: LifecycleState::Loading };
		assert_eq!( err.to_string(), "Cannot hot swap while loading" );
	}

}
