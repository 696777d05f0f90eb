//! A named collection of properties checked under one parameter set.

use std::sync::Arc;

use crate::parameters::TestParameters;
use crate::prop::Prop;
use crate::report::Reporter;
use crate::runner::Runner;
use crate::test_result::TestResult;

#[derive(Debug)]
pub struct Properties {
    runner: Runner,
    props: Vec<(String, Prop)>,
    results: Vec<(String, TestResult)>,
}

impl Properties {
    pub fn new(parameters: TestParameters) -> Self {
        Self {
            runner: Runner::new(parameters),
            props: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.runner = self.runner.with_reporter(reporter);
        self
    }

    /// Add a property; properties run in insertion order
    pub fn property(&mut self, name: impl Into<String>, prop: Prop) -> &mut Self {
        self.props.push((name.into(), prop));
        self
    }

    /// Check every property; true iff all passed or proved
    pub fn run(&mut self) -> bool {
        self.results.clear();
        for (name, prop) in &self.props {
            let result = self.runner.run(prop);
            self.runner.reporter().report_result(name, &result);
            self.results.push((name.clone(), result));
        }
        self.results.iter().all(|(_, result)| result.passed())
    }

    /// Results of the last `run`, in insertion order
    pub fn results(&self) -> &[(String, TestResult)] {
        &self.results
    }
}
