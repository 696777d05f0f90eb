//! Generators and their results.
//!
//! A [`Gen`] is a pure function from [`GenParameters`] to a [`GenResult`]:
//! the same random stream state and size always produce the same result.
//! A result either holds a value with its [`ShrinkTree`], or is *undecided*
//! (the generator could not produce a valid value). Undecided results
//! propagate through every combinator; no combinator substitutes a default.

use std::fmt;
use std::sync::Arc;

use crate::parameters::GenParameters;
use crate::shrink::{no_shrinker, Shrink, ShrinkTree, Shrinker, Sieve};

/// Values a generator may produce
pub trait Value: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// Outcome of one generator invocation
pub struct GenResult<T> {
    tree: Option<ShrinkTree<T>>,
    sieve: Option<Sieve<T>>,
    /// Labels used when reporting this value
    pub labels: Vec<String>,
}

impl<T: Value> Clone for GenResult<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            sieve: self.sieve.clone(),
            labels: self.labels.clone(),
        }
    }
}

impl<T: Value> fmt::Debug for GenResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenResult")
            .field("value", &self.retrieve())
            .field("labels", &self.labels)
            .finish()
    }
}

impl<T: Value> GenResult<T> {
    /// A value shrunk with the given strategy
    pub fn new(value: T, shrinker: Shrinker<T>) -> Self {
        Self::from_tree(ShrinkTree::unfold(value, shrinker))
    }

    /// A value that never shrinks
    pub fn constant(value: T) -> Self {
        Self::from_tree(ShrinkTree::leaf(value))
    }

    pub fn from_tree(tree: ShrinkTree<T>) -> Self {
        Self {
            tree: Some(tree),
            sieve: None,
            labels: Vec::new(),
        }
    }

    /// The "no value" marker of a discarded draw
    pub fn undecided() -> Self {
        Self {
            tree: None,
            sieve: None,
            labels: Vec::new(),
        }
    }

    /// The generated value, unless the draw was discarded or the sieve rejects it
    pub fn retrieve(&self) -> Option<&T> {
        self.tree
            .as_ref()
            .map(ShrinkTree::value)
            .filter(|value| self.sieve_accepts(value))
    }

    pub fn is_undecided(&self) -> bool {
        self.retrieve().is_none()
    }

    /// Tree of the retrieved value
    pub fn tree(&self) -> Option<&ShrinkTree<T>> {
        self.tree.as_ref().filter(|tree| self.sieve_accepts(tree.value()))
    }

    pub fn sieve_accepts(&self, value: &T) -> bool {
        self.sieve.as_ref().map_or(true, |sieve| sieve(value))
    }

    /// Shrink candidates below `current` that pass this result's sieve
    pub fn shrink(&self, current: &ShrinkTree<T>) -> Shrink<ShrinkTree<T>> {
        match self.sieve.clone() {
            Some(sieve) => current.children().filter(move |candidate| sieve(candidate.value())),
            None => current.children(),
        }
    }

    /// Tree with the sieve applied at every depth, for embedding in composites
    pub fn into_tree(self) -> Option<ShrinkTree<T>> {
        let accepted = self.retrieve().is_some();
        let tree = self.tree.filter(|_| accepted)?;
        Some(match self.sieve {
            Some(sieve) => tree.filter(sieve),
            None => tree,
        })
    }

    /// Add a sieve; it is combined with any existing one
    pub fn with_sieve(mut self, sieve: Sieve<T>) -> Self {
        let combined: Sieve<T> = match self.sieve.take() {
            Some(existing) => Arc::new(move |value: &T| existing(value) && sieve(value)),
            None => sieve,
        };
        self.sieve = Some(combined);
        self
    }

    pub fn with_shrinker(mut self, shrinker: Shrinker<T>) -> Self {
        self.tree = self.tree.map(|tree| tree.with_shrinker(shrinker));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// Map the value and its shrink candidates; the sieve is applied before mapping
    pub fn map<U, F>(self, f: F) -> GenResult<U>
    where
        U: Value,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let labels = self.labels.clone();
        match self.into_tree() {
            Some(tree) => GenResult::from_tree(tree.map(f)).with_labels(labels),
            None => GenResult::undecided().with_labels(labels),
        }
    }
}

/// A generator of values of type `T`
pub struct Gen<T> {
    generate: Arc<dyn Fn(&mut GenParameters) -> GenResult<T> + Send + Sync>,
}

impl<T> Clone for Gen<T> {
    fn clone(&self) -> Self {
        Self {
            generate: self.generate.clone(),
        }
    }
}

impl<T> fmt::Debug for Gen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gen")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Value> Gen<T> {
    pub fn new<F>(generate: F) -> Self
    where
        F: Fn(&mut GenParameters) -> GenResult<T> + Send + Sync + 'static,
    {
        Self {
            generate: Arc::new(generate),
        }
    }

    pub fn generate(&self, params: &mut GenParameters) -> GenResult<T> {
        (self.generate)(params)
    }

    /// Draw a single value with throwaway parameters
    pub fn sample(&self) -> Option<T> {
        self.generate(&mut GenParameters::default()).retrieve().cloned()
    }

    /// Draw a single value on a fixed seed
    pub fn sample_with_seed(&self, seed: u64) -> Option<T> {
        self.generate(&mut GenParameters::with_seed(seed))
            .retrieve()
            .cloned()
    }

    /// Transform generated values; candidates shrink through the mapping
    pub fn map<U, F>(&self, f: F) -> Gen<U>
    where
        U: Value,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Gen::new(move |params| {
            let f = f.clone();
            source.generate(params).map(move |value| f(value))
        })
    }

    /// Keep only values (generated or shrunk) accepted by `sieve`.
    ///
    /// Rejected draws are not retried; they surface as undecided results.
    pub fn such_that<F>(&self, sieve: F) -> Gen<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let source = self.clone();
        let sieve: Sieve<T> = Arc::new(sieve);
        Gen::new(move |params| source.generate(params).with_sieve(sieve.clone()))
    }

    /// Replace the shrink strategy of generated values
    pub fn with_shrinker(&self, shrinker: Shrinker<T>) -> Gen<T> {
        let source = self.clone();
        Gen::new(move |params| source.generate(params).with_shrinker(shrinker.clone()))
    }

    pub fn without_shrinker(&self) -> Gen<T> {
        self.with_shrinker(no_shrinker())
    }

    pub fn with_label(&self, label: impl Into<String>) -> Gen<T> {
        let source = self.clone();
        let label = label.into();
        Gen::new(move |params| source.generate(params).with_label(label.clone()))
    }

    /// Choose the next generator from a generated value.
    ///
    /// Shrinking uses the inner generator's strategy; the outer value is fixed.
    pub fn flat_map<U, F>(&self, f: F) -> Gen<U>
    where
        U: Value,
        F: Fn(T) -> Gen<U> + Send + Sync + 'static,
    {
        let source = self.clone();
        Gen::new(move |params| {
            let outer = source.generate(params);
            match outer.retrieve() {
                Some(value) => f(value.clone()).generate(params),
                None => GenResult::undecided().with_labels(outer.labels.clone()),
            }
        })
    }

    /// Generate pairs; candidates shrink the left value first.
    pub fn zip<U: Value>(&self, other: &Gen<U>) -> Gen<(T, U)> {
        let left = self.clone();
        let right = other.clone();
        Gen::new(move |params| {
            let l = left.generate(params);
            let r = right.generate(params);
            let mut labels = l.labels.clone();
            labels.extend(r.labels.iter().cloned());
            match (l.into_tree(), r.into_tree()) {
                (Some(l), Some(r)) => GenResult::from_tree(l.zip(r)).with_labels(labels),
                _ => GenResult::undecided().with_labels(labels),
            }
        })
    }
}
