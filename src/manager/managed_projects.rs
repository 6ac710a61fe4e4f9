use std::sync::{ PoisonError, Weak };

use crate::ProjectContext ;
use crate::project::LifecycleState ;
use crate::resolver::{ HostModuleLookup, HostModuleRegistry };
use super::SharedRegistry ;



/// Exposes the projects of one manager as host modules.
///
/// `host:Bar` finds project `Bar` and, while it is loaded, the artifact its entry
/// point came from. Holds the registry weakly so the manager owns its projects alone.
pub struct ManagedProjects<Ctx: ProjectContext> {
	registry: Weak<SharedRegistry<Ctx>>,
}

impl<Ctx: ProjectContext> ManagedProjects<Ctx> {
	pub(super) fn new( registry: Weak<SharedRegistry<Ctx>> ) -> Self { Self { registry }}
}

impl<Ctx: ProjectContext> HostModuleRegistry for ManagedProjects<Ctx> {
	fn artifact_location( &self, module: &str ) -> HostModuleLookup {

		let Some( registry ) = self.registry.upgrade() else { return HostModuleLookup::Absent };
		let Some( project ) = registry.read().unwrap_or_else( PoisonError::into_inner ).get( module ).cloned() else {
			return HostModuleLookup::Absent
		};

		let status = project.status();
		match ( status.state(), status.entry_artifact() ) {
			( LifecycleState::Loaded, Some( artifact )) => HostModuleLookup::Located( artifact.to_path_buf() ),
			( LifecycleState::Loaded, None ) => HostModuleLookup::Unlocated,
			_ => HostModuleLookup::Absent,
		}

	}
}

impl<Ctx: ProjectContext> std::fmt::Debug for ManagedProjects<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ManagedProjects" ).finish_non_exhaustive()
	}
}
