//! A project lifecycle engine for WebAssembly components.
//!
//! `hotswap_link` drives *projects*: source trees that compile into components
//! and run inside a host without restarting it. Each project moves through a
//! small state machine (`Unloaded`, `Compiled`, `Loaded` and the transient
//! states between them) and can be recompiled and swapped while the host keeps
//! running.
//!
//! The pieces, bottom up:
//!
//! - A [`DependencyResolver`] turns the lines of a project's `dependencies`
//! 	file into [`Dependency`] values, each scoped [`Include`]( DependencyScope::Include )
//! 	(instantiated inside the project) or [`Provided`]( DependencyScope::Provided )
//! 	(already present in the host).
//! - A [`Compiler`] builds the sources into a staging directory that only
//! 	replaces the previous binaries once the whole compile succeeded.
//! - A [`ModuleLoader`] instantiates the binaries into a fresh, isolated
//! 	[`ExecutionContext`] and calls the entry point's `on-load` hook.
//! - A [`Project`] ties these together behind its lifecycle.
//! - A [`ProjectManager`] owns many projects, fans operations out over them and
//! 	unloads them in dependency order.
//!
//! # Entry points
//!
//! Exactly one component of a loaded project must export the entry-point
//! interface, `hotswap:project/entry-point` unless configured otherwise:
//!
//! ```text
//! interface entry-point {
//! 	on-load: func();
//! 	on-unload: func();
//! 	get-version: func() -> string;
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use hotswap_link::{ LifecycleState, ManagerConfig, ProjectManager };
//!
//! const ENTRY: &str = r#"(component
//! 	(core module $m
//! 		(memory (export "memory") 1)
//! 		(data (i32.const 0) "\08\00\00\00\05\00\00\00" "1.0.0")
//! 		(func (export "on-load"))
//! 		(func (export "on-unload"))
//! 		(func (export "get-version") (result i32) i32.const 0))
//! 	(core instance $i (instantiate $m))
//! 	(func $on-load (canon lift (core func $i "on-load")))
//! 	(func $on-unload (canon lift (core func $i "on-unload")))
//! 	(func $get-version (result string) (canon lift (core func $i "get-version") (memory $i "memory")))
//! 	(instance $entry
//! 		(export "on-load" (func $on-load))
//! 		(export "on-unload" (func $on-unload))
//! 		(export "get-version" (func $get-version)))
//! 	(export "hotswap:project/entry-point" (instance $entry)))"# ;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let workspace = tempfile::tempdir()?;
//! let source_dir = workspace.path().join( "Foo" ).join( "src" );
//! std::fs::create_dir_all( &source_dir )?;
//! std::fs::write( source_dir.join( "entry.wat" ), ENTRY )?;
//!
//! let manager: ProjectManager = ProjectManager::new( ManagerConfig::new( workspace.path() ))?;
//! let foo = manager.register_project( "Foo" )?;
//!
//! foo.compile()?;
//! assert_eq!( foo.load()?, "1.0.0" );
//! assert_eq!( foo.state(), LifecycleState::Loaded );
//!
//! // Recompile and reload in one step.
//! let outcome = foo.hot_swap()?;
//! assert_eq!( outcome.version, "1.0.0" );
//!
//! let report = manager.shutdown()?;
//! assert!( report.is_success() );
//! assert_eq!( foo.state(), LifecycleState::Compiled );
//! # Ok(())
//! # }
//! ```
//!
//! # Host functions
//!
//! Components of every project may import whatever the manager's host
//! [`Linker`] defines. Host functions see the project's [`ProjectContext`]
//! through the store:
//!
//! ```
//! use hotswap_link::{ Engine, Linker, ManagerConfig, ProjectContext, ProjectManager };
//!
//! struct Context { project: String }
//! impl ProjectContext for Context {
//! 	fn new( project: &str ) -> Self { Self { project: project.to_string() } }
//! }
//!
//! # fn main() -> wasmtime::Result<()> {
//! let engine = Engine::default();
//! let mut linker = Linker::<Context>::new( &engine );
//! linker.instance( "host:log/sink" )?.func_wrap( "write", | ctx, ( line, ): ( String, ) | {
//! 	println!( "[{}] {}", ctx.data().project, line );
//! 	Ok(())
//! })?;
//!
//! let manager = ProjectManager::builder( ManagerConfig::new( "projects" ), engine )
//! 	.host_linker( linker )
//! 	.build()?;
//! # let _ = manager ;
//! # Ok(())
//! # }
//! ```

mod context ;
mod dependency ;
pub mod resolver ;
pub mod compiler ;
pub mod loader ;
pub mod project ;
pub mod manager ;
pub mod config ;

#[doc( no_inline )]
pub use wasmtime::Engine ;
#[doc( no_inline )]
pub use wasmtime::component::{ Component, Linker };

pub use context::ProjectContext ;
pub use dependency::{ Dependency, DependencyScope };
pub use resolver::{
	BaseResolver, DependencyResolutionError, DependencyResolver, ProjectLocation,
	ResolverChain, ResolverExtension, HostModuleLookup, HostModuleRegistry, HostModuleResolver,
};
pub use compiler::{ CommandCompiler, CompileError, CompileOutput, Compiler, Diagnostic, Severity, WatCompiler };
pub use loader::{ ExecutionContext, LoadError, LoadedModule, ModuleLoader, UnloadError };
pub use project::{
	FnListener, HotSwapOutcome, LifecycleError, LifecycleState, NoopListener, Operation, Project,
	ProjectError, ProjectErrorKind, ProjectLayout, ProjectServices, ProjectStatus, StateEvent, StateListener,
};
pub use manager::{
	BatchReport, DependencyCycleError, DiscoveryReport, DuplicateIdentifierError, ManagedProjects,
	ManagerError, ProjectManager, ProjectManagerBuilder, ProjectSummary,
};
pub use config::{ CompilerConfig, ConfigError, LayoutConfig, ManagerConfig };
