//! Properties: a function from generation parameters to an outcome.

use std::fmt;
use std::sync::Arc;

use crate::error::{catch_panic, PropertyError};
use crate::parameters::{GenParameters, TestParameters};
use crate::prop_result::PropResult;
use crate::runner::Runner;
use crate::test_result::TestResult;

type PropFn = Arc<dyn Fn(&mut GenParameters) -> PropResult + Send + Sync>;

/// A property ready to be driven by a [`Runner`]
#[derive(Clone)]
pub struct Prop {
    inner: PropFn,
    configuration_error: Option<PropertyError>,
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prop")
            .field("configuration_error", &self.configuration_error)
            .finish_non_exhaustive()
    }
}

impl Prop {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut GenParameters) -> PropResult + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            configuration_error: None,
        }
    }

    /// A property that could not be assembled; runs report it without iterating
    pub fn error(error: PropertyError) -> Self {
        let message = error.to_string();
        Self {
            inner: Arc::new(move |_| PropResult::error(message.clone(), None)),
            configuration_error: Some(error),
        }
    }

    pub fn configuration_error(&self) -> Option<&PropertyError> {
        self.configuration_error.as_ref()
    }

    /// Evaluate once. Panics escaping generators or checks become `Error` outcomes.
    pub fn evaluate(&self, params: &mut GenParameters) -> PropResult {
        catch_panic(|| (self.inner)(params)).unwrap_or_else(PropResult::from)
    }

    /// Run this property with the default log reporter
    pub fn check(&self, parameters: &TestParameters) -> TestResult {
        Runner::new(parameters.clone()).run(self)
    }
}
