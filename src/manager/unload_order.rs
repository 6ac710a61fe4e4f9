use std::collections::HashMap ;
use indexmap::IndexMap ;
use itertools::Itertools ;
use nonempty_collections::{ NEVec, nev };
use thiserror::Error ;



/// Projects depend on each other in a loop, so no unload order exists.
///
/// The cycle is listed in dependency direction and ends where it started:
/// `[ "A", "B", "A" ]` means A depends on B, which depends on A.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
#[error( "Dependency cycle: {}", join_cycle( .cycle ))]
pub struct DependencyCycleError {
	pub cycle: NEVec<String>,
}

fn join_cycle( cycle: &NEVec<String> ) -> String {
	cycle.clone().into_iter().join( " -> " )
}

#[derive( Copy, Clone, Debug, PartialEq, Eq )]
enum Visit { InProgress, Done }

/// Orders `graph` so every project comes before the projects it depends on.
///
/// `graph` maps each project to its dependencies; dependencies that are not
/// keys themselves are ignored. Unrelated projects keep their relative order.
pub(crate) fn unload_order( graph: &IndexMap<String, Vec<String>> ) -> Result<Vec<String>, DependencyCycleError> {
	let mut dependents: IndexMap<&str, Vec<&str>> = graph.keys().map(| id | ( id.as_str(), Vec::new() )).collect();
	for ( id, dependencies ) in graph {
		for dependency in dependencies {
			if let Some( list ) = dependents.get_mut( dependency.as_str() ) { list.push( id.as_str() ); }
		}
	}
	topological( &dependents, true )
}

/// Orders `graph` so every project comes after the projects it depends on.
pub(crate) fn load_order( graph: &IndexMap<String, Vec<String>> ) -> Result<Vec<String>, DependencyCycleError> {
	let dependencies: IndexMap<&str, Vec<&str>> = graph.iter()
		.map(|( id, dependencies )| ( id.as_str(), dependencies.iter()
			.map( String::as_str )
			.filter(| dependency | graph.contains_key( *dependency ))
			.collect() ))
		.collect();
	topological( &dependencies, false )
}

/// Post-order depth-first walk: a node is emitted once everything it points at is.
///
/// Edges point from a node to what must come first. `reverse_cycle` flips a found
/// cycle so it always reads in dependency direction.
fn topological<'a>( edges: &IndexMap<&'a str, Vec<&'a str>>, reverse_cycle: bool ) -> Result<Vec<String>, DependencyCycleError> {

	let mut walk = Walk {
		edges,
		visits: HashMap::with_capacity( edges.len() ),
		stack: Vec::new(),
		order: Vec::with_capacity( edges.len() ),
		reverse_cycle,
	};

	for id in edges.keys() {
		walk.visit( *id )?;
	}

	Ok( walk.order )

}

struct Walk<'a, 'g> {
	edges: &'g IndexMap<&'a str, Vec<&'a str>>,
	visits: HashMap<&'a str, Visit>,
	stack: Vec<&'a str>,
	order: Vec<String>,
	reverse_cycle: bool,
}

impl<'a> Walk<'a, '_> {
	fn visit( &mut self, id: &'a str ) -> Result<(), DependencyCycleError> {

		match self.visits.insert( id, Visit::InProgress ) {
			None => {},
			Some( Visit::Done ) => {
				self.visits.insert( id, Visit::Done );
				return Ok(());
			},
			Some( Visit::InProgress ) => {
				let start = self.stack.iter().position(| entry | *entry == id ).unwrap_or( 0 );
				let mut cycle = self.stack[start..].iter()
					.copied()
					.chain( std::iter::once( id ))
					.map( str::to_string )
					.collect::<Vec<_>>();
				if self.reverse_cycle { cycle.reverse(); }
				return Err( DependencyCycleError {
					cycle: NEVec::try_from_vec( cycle ).unwrap_or_else(|| nev![ id.to_string() ]),
				});
			},
		}

		self.stack.push( id );
		let edges = self.edges ;
		for next in edges.get( id ).into_iter().flatten() {
			self.visit( *next )?;
		}
		self.stack.pop();

		self.visits.insert( id, Visit::Done );
		self.order.push( id.to_string() );
		Ok(())

	}
}

#[cfg( test )]
mod tests {

	use super::* ;

	fn graph( edges: &[( &str, &[&str] )] ) -> IndexMap<String, Vec<String>> {
		edges.iter()
			.map(|( id, dependencies )| ( id.to_string(), dependencies.iter().map(| d | d.to_string() ).collect() ))
			.collect()
	}

	fn position( order: &[String], id: &str ) -> usize {
		order.iter().position(| entry | entry == id ).unwrap()
	}

	#[test]
	fn dependents_come_before_dependencies() {
		let order = unload_order( &graph( &[( "B", &[] ), ( "A", &[ "B" ])])).unwrap();
		assert_eq!( order, vec![ "A", "B" ]);
	}

	#[test]
	fn chains_and_diamonds_are_respected() {
		let order = unload_order( &graph( &[
			( "Core", &[] ),
			( "Left", &[ "Core" ]),
			( "Right", &[ "Core" ]),
			( "App", &[ "Left", "Right" ]),
		])).unwrap();
		assert_eq!( order.len(), 4 );
		assert!( position( &order, "App" ) < position( &order, "Left" ));
		assert!( position( &order, "App" ) < position( &order, "Right" ));
		assert!( position( &order, "Left" ) < position( &order, "Core" ));
		assert!( position( &order, "Right" ) < position( &order, "Core" ));
	}

	#[test]
	fn unrelated_projects_keep_registry_order() {
		let order = unload_order( &graph( &[( "X", &[] ), ( "Y", &[] ), ( "Z", &[] )])).unwrap();
		assert_eq!( order, vec![ "X", "Y", "Z" ]);
	}

	#[test]
	fn unknown_dependencies_are_ignored() {
		let order = unload_order( &graph( &[( "A", &[ "NotLoaded" ])])).unwrap();
		assert_eq!( order, vec![ "A" ]);
	}

	#[test]
	fn cycle_is_reported_in_dependency_direction() {
		let err = unload_order( &graph( &[( "A", &[ "B" ]), ( "B", &[ "A" ])])).unwrap_err();
		assert_eq!( err.to_string(), "Dependency cycle: A -> B -> A" );
		let cycle = err.cycle.into_iter().collect::<Vec<_>>();
		assert_eq!( cycle, vec![ "A", "B", "A" ]);
	}

	#[test]
	fn load_order_puts_dependencies_first() {
		let order = load_order( &graph( &[
			( "App", &[ "Lib" ]),
			( "Other", &[] ),
			( "Lib", &[ "Gone" ]),
		])).unwrap();
		assert_eq!( order, vec![ "Lib", "App", "Other" ]);
	}

	#[test]
	fn load_order_reports_cycles_in_dependency_direction() {
		let err = load_order( &graph( &[( "A", &[ "B" ]), ( "B", &[ "C" ]), ( "C", &[ "A" ])])).unwrap_err();
		assert_eq!( err.cycle.into_iter().collect::<Vec<_>>(), vec![ "A", "B", "C", "A" ]);
	}

	#[test]
	fn longer_cycles_are_found() {
		let err = unload_order( &graph( &[
			( "Free", &[] ),
			( "A", &[ "B" ]),
			( "B", &[ "C" ]),
			( "C", &[ "A" ]),
		])).unwrap_err();
		assert_eq!( err.cycle.len().get(), 4 );
	}

}
