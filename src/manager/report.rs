use crate::project::ProjectError ;



/// Outcome of a batch operation.
///
/// Successes are `( project id, value )` pairs; both lists keep processing order.
/// A batch never stops at the first failure.
#[derive( Debug )]
pub struct BatchReport<T> {
	successful: Vec<( String, T )>,
	failed: Vec<ProjectError>,
}

impl<T> BatchReport<T> {

	pub fn new() -> Self { Self { successful: Vec::new(), failed: Vec::new() }}

	#[inline] pub fn successful( &self ) -> &[( String, T )] { &self.successful }
	#[inline] pub fn failed( &self ) -> &[ProjectError] { &self.failed }
	#[inline] pub fn deconstruct( self ) -> ( Vec<( String, T )>, Vec<ProjectError> ) {( self.successful, self.failed )}

	/// Whether nothing failed. Unload hook warnings count as failures here.
	pub fn is_success( &self ) -> bool { self.failed.is_empty() }

	/// Failures other than unload hook warnings.
	pub fn errors( &self ) -> impl Iterator<Item = &ProjectError> {
		self.failed.iter().filter(| err | !err.is_warning() )
	}

	/// Unload hook warnings. The projects they concern were still unloaded.
	pub fn warnings( &self ) -> impl Iterator<Item = &ProjectError> {
		self.failed.iter().filter(| err | err.is_warning() )
	}

	/// Ids of the projects that succeeded, in processing order.
	pub fn succeeded_ids( &self ) -> impl Iterator<Item = &str> {
		self.successful.iter().map(|( id, _ )| id.as_str() )
	}

	pub(crate) fn push( &mut self, id: &str, result: Result<T, ProjectError> ) {
		match result {
			Ok( value ) => self.successful.push(( id.to_string(), value )),
			Err( err ) => self.failed.push( err ),
		}
	}

}

impl<T> Default for BatchReport<T> {
	fn default() -> Self { Self::new() }
}

impl<T> FromIterator<( String, Result<T, ProjectError> )> for BatchReport<T> {
	fn from_iter<I: IntoIterator<Item = ( String, Result<T, ProjectError> )>>( iter: I ) -> Self {
		iter.into_iter().fold( Self::new(), | mut report, ( id, result )| {
			report.push( &id, result );
			report
		})
	}
}

#[cfg( test )]
mod tests {

	use super::* ;
	use crate::project::{ LifecycleError, ProjectErrorKind };

	#[test]
	fn keeps_processing_order() {
		let report = vec![
			( "A".to_string(), Ok( 1 )),
			( "B".to_string(), Err( ProjectError::new( "B", LifecycleError::Busy ))),
			( "C".to_string(), Ok( 3 )),
		].into_iter().collect::<BatchReport<i32>>();

		assert_eq!( report.succeeded_ids().collect::<Vec<_>>(), vec![ "A", "C" ]);
		assert_eq!( report.failed().len(), 1 );
		assert_eq!( report.failed()[0].project, "B" );
		assert!( matches!( report.failed()[0].kind, ProjectErrorKind::Lifecycle( LifecycleError::Busy )));
		assert!( !report.is_success() );
		assert_eq!( report.errors().count(), 1 );
		assert_eq!( report.warnings().count(), 0 );
	}

}
