//! Lazy shrink sequences and shrink trees.
//!
//! A [`Shrink`] is a pull-based, single-pass iterator of candidate values that
//! are "smaller" than some original. It can only be restarted by asking the
//! [`Shrinker`] for a new one. Every candidate sequence is finite: each strategy
//! here strictly narrows the candidate space.
//!
//! A [`ShrinkTree`] pairs a value with the lazily computed trees of its
//! candidates. The search engine walks trees rather than raw values, which is
//! what lets [`ShrinkTree::map`] shrink *through* a mapping: the mapped tree
//! keeps shrinking the source value and maps every candidate.

use std::fmt;
use std::sync::Arc;

/// Produce a shrink sequence for a value
pub type Shrinker<T> = Arc<dyn Fn(&T) -> Shrink<T> + Send + Sync>;

/// Predicate rejecting invalid generated or shrunk values
pub type Sieve<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A finite, lazy sequence of shrink candidates
pub struct Shrink<T> {
    inner: Box<dyn Iterator<Item = T> + Send>,
}

impl<T> fmt::Debug for Shrink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shrink").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Shrink<T> {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = T> + Send + 'static,
    {
        Self {
            inner: Box::new(iter),
        }
    }

    /// A sequence without candidates
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Keep only candidates accepted by the sieve
    pub fn filter<F>(self, sieve: F) -> Self
    where
        F: Fn(&T) -> bool + Send + 'static,
    {
        Self::new(self.inner.filter(move |candidate| sieve(candidate)))
    }

    pub fn map<U, F>(self, f: F) -> Shrink<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        Shrink::new(self.inner.map(f))
    }

    /// Alternate candidates of both sequences, draining the longer one at the end
    pub fn interleave(self, other: Shrink<T>) -> Self {
        Self::new(Interleave {
            first: self.inner,
            second: other.inner,
            take_first: true,
            first_done: false,
            second_done: false,
        })
    }

    /// All candidates of `self`, then all candidates of `other`
    pub fn concat(self, other: Shrink<T>) -> Self {
        Self::new(self.inner.chain(other.inner))
    }
}

impl<T> Iterator for Shrink<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }
}

struct Interleave<T> {
    first: Box<dyn Iterator<Item = T> + Send>,
    second: Box<dyn Iterator<Item = T> + Send>,
    take_first: bool,
    first_done: bool,
    second_done: bool,
}

impl<T> Iterator for Interleave<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if self.first_done && self.second_done {
                return None;
            }
            let take_first = self.take_first;
            self.take_first = !self.take_first;
            if take_first && !self.first_done {
                match self.first.next() {
                    Some(value) => return Some(value),
                    None => self.first_done = true,
                }
            } else if !take_first && !self.second_done {
                match self.second.next() {
                    Some(value) => return Some(value),
                    None => self.second_done = true,
                }
            }
        }
    }
}

/// Shrinker that never offers a candidate
pub fn no_shrinker<T: Send + 'static>() -> Shrinker<T> {
    Arc::new(|_| Shrink::empty())
}

/// Walks from `original` back towards `original - half`, halving the step each time.
struct Halving {
    original: i128,
    half: i128,
}

impl Iterator for Halving {
    type Item = i128;

    fn next(&mut self) -> Option<i128> {
        if self.half == 0 {
            return None;
        }
        let value = self.original - self.half;
        self.half /= 2;
        Some(value)
    }
}

/// Candidates for a signed 64-bit value: zero first, then halving steps
/// from both the negated and the original value, interleaved.
pub fn int64_shrink(value: i64) -> Shrink<i64> {
    let value = value as i128;
    let negative = Halving {
        original: -value,
        half: -value,
    };
    let positive = Halving {
        original: value,
        half: value / 2,
    };
    Shrink::new(negative.filter_map(|v| i64::try_from(v).ok()))
        .interleave(Shrink::new(positive.filter_map(|v| i64::try_from(v).ok())))
}

/// Candidates moving `value` towards `target`: the target itself, then
/// values closing half, a quarter, ... of the remaining distance.
pub fn int64_shrink_towards(target: i64, value: i64) -> Shrink<i64> {
    let halving = Halving {
        original: value as i128,
        half: value as i128 - target as i128,
    };
    Shrink::new(halving.filter_map(|v| i64::try_from(v).ok()))
}

/// Candidates for an unsigned 64-bit value: zero, then halving steps up to `value - 1`.
pub fn uint64_shrink(value: u64) -> Shrink<u64> {
    let halving = Halving {
        original: value as i128,
        half: value as i128,
    };
    Shrink::new(halving.filter_map(|v| u64::try_from(v).ok()))
}

pub fn int64_shrinker() -> Shrinker<i64> {
    Arc::new(|value: &i64| int64_shrink(*value))
}

pub fn uint64_shrinker() -> Shrinker<u64> {
    Arc::new(|value: &u64| uint64_shrink(*value))
}

pub fn bool_shrinker() -> Shrinker<bool> {
    Arc::new(|value: &bool| {
        if *value {
            Shrink::new(std::iter::once(false))
        } else {
            Shrink::empty()
        }
    })
}

/// Sub-sequences with one contiguous chunk removed, for chunk sizes
/// `len, len/2, ..., 1` at every aligned offset.
struct ChunkRemovals<T> {
    items: Arc<Vec<T>>,
    chunk: usize,
    offset: usize,
}

impl<T> ChunkRemovals<T> {
    fn new(items: Arc<Vec<T>>) -> Self {
        let chunk = items.len();
        Self {
            items,
            chunk,
            offset: 0,
        }
    }
}

impl<T: Clone> Iterator for ChunkRemovals<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        loop {
            if self.chunk == 0 {
                return None;
            }
            if self.offset + self.chunk <= self.items.len() {
                let mut remaining = Vec::with_capacity(self.items.len() - self.chunk);
                remaining.extend_from_slice(&self.items[..self.offset]);
                remaining.extend_from_slice(&self.items[self.offset + self.chunk..]);
                self.offset += self.chunk;
                return Some(remaining);
            }
            self.chunk /= 2;
            self.offset = 0;
        }
    }
}

/// Shrinker for vectors: remove chunks first, then shrink single elements.
pub fn vec_shrinker<T>(element: Shrinker<T>) -> Shrinker<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    Arc::new(move |values: &Vec<T>| {
        let items = Arc::new(values.clone());
        let removals = Shrink::new(ChunkRemovals::new(items.clone()));
        let element = element.clone();
        let element_shrinks = (0..items.len()).flat_map(move |index| {
            let items = items.clone();
            (element)(&items[index]).map(move |candidate| {
                let mut replaced = (*items).clone();
                replaced[index] = candidate;
                replaced
            })
        });
        removals.concat(Shrink::new(element_shrinks))
    })
}

/// A value together with the lazily computed trees of its shrink candidates
pub struct ShrinkTree<T> {
    value: T,
    children: Arc<dyn Fn() -> Shrink<ShrinkTree<T>> + Send + Sync>,
}

impl<T: Clone> Clone for ShrinkTree<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            children: self.children.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ShrinkTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShrinkTree")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl<T> ShrinkTree<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A tree without candidates
    pub fn leaf(value: T) -> Self {
        Self {
            value,
            children: Arc::new(|| Shrink::<ShrinkTree<T>>::empty()),
        }
    }

    /// Expand `value` with `shrinker`, recursively and on demand
    pub fn unfold(value: T, shrinker: Shrinker<T>) -> Self {
        let source = value.clone();
        Self {
            value,
            children: Arc::new(move || {
                let shrinker_for_children = shrinker.clone();
                (shrinker)(&source)
                    .map(move |candidate| ShrinkTree::unfold(candidate, shrinker_for_children.clone()))
            }),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// A fresh shrink sequence of candidate trees
    pub fn children(&self) -> Shrink<ShrinkTree<T>> {
        (self.children)()
    }

    /// Replace the whole shrink strategy below this value
    pub fn with_shrinker(self, shrinker: Shrinker<T>) -> Self {
        Self::unfold(self.value, shrinker)
    }

    /// Map the value and every candidate below it
    pub fn map<U, F>(self, f: F) -> ShrinkTree<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.map_shared(Arc::new(f))
    }

    fn map_shared<U>(self, f: Arc<dyn Fn(T) -> U + Send + Sync>) -> ShrinkTree<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        let children = self.children;
        let value = f(self.value);
        ShrinkTree {
            value,
            children: Arc::new(move || {
                let f = f.clone();
                (children)().map(move |child| child.map_shared(f.clone()))
            }),
        }
    }

    /// Drop every candidate (at any depth) rejected by the sieve
    pub fn filter(self, sieve: Sieve<T>) -> Self {
        let children = self.children;
        Self {
            value: self.value,
            children: Arc::new(move || {
                let keep = sieve.clone();
                let below = sieve.clone();
                (children)()
                    .filter(move |child| keep(child.value()))
                    .map(move |child| child.filter(below.clone()))
            }),
        }
    }

    /// Pair two trees; candidates shrink the left side first, then the right.
    pub fn zip<U>(self, other: ShrinkTree<U>) -> ShrinkTree<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        let left = self.clone();
        let right = other.clone();
        ShrinkTree {
            value: (self.value, other.value),
            children: Arc::new(move || {
                let fixed_right = right.clone();
                let fixed_left = left.clone();
                let left_shrinks = left
                    .children()
                    .map(move |l| l.zip(fixed_right.clone()));
                let right_shrinks = right
                    .children()
                    .map(move |r| fixed_left.clone().zip(r));
                left_shrinks.concat(right_shrinks)
            }),
        }
    }

    /// Combine element trees into a tree of the whole sequence: candidates
    /// remove chunks of elements first, then shrink one element at a time.
    pub fn sequence(trees: Vec<ShrinkTree<T>>) -> ShrinkTree<Vec<T>> {
        let value = trees.iter().map(|tree| tree.value.clone()).collect();
        let trees = Arc::new(trees);
        ShrinkTree {
            value,
            children: Arc::new(move || {
                let removals =
                    Shrink::new(ChunkRemovals::new(trees.clone())).map(ShrinkTree::sequence);
                let all = trees.clone();
                let element_shrinks = (0..all.len()).flat_map(move |index| {
                    let all = all.clone();
                    all[index].children().map(move |child| {
                        let mut replaced = (*all).clone();
                        replaced[index] = child;
                        ShrinkTree::sequence(replaced)
                    })
                });
                removals.concat(Shrink::new(element_shrinks))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int64_shrink_order() {
        let candidates: Vec<i64> = int64_shrink(100).collect();
        assert_eq!(
            candidates,
            vec![0, 50, -50, 75, -75, 88, -88, 94, -94, 97, -97, 99, -99]
        );
        assert_eq!(int64_shrink(0).count(), 0);
    }

    #[test]
    fn test_int64_shrink_extremes_do_not_overflow() {
        assert!(int64_shrink(i64::MIN).all(|v| v != i64::MIN));
        assert!(int64_shrink(i64::MAX).all(|v| v != i64::MAX));
    }

    #[test]
    fn test_shrink_towards_target() {
        let candidates: Vec<i64> = int64_shrink_towards(10, 30).collect();
        assert_eq!(candidates, vec![10, 20, 25, 28, 29]);
        let candidates: Vec<i64> = int64_shrink_towards(-5, -9).collect();
        assert_eq!(candidates, vec![-5, -7, -8]);
    }

    #[test]
    fn test_uint64_shrink_reaches_zero() {
        let candidates: Vec<u64> = uint64_shrink(1).collect();
        assert_eq!(candidates, vec![0]);
    }

    #[test]
    fn test_interleave_drains_longer_side() {
        let a = Shrink::new(vec![1, 2, 3].into_iter());
        let b = Shrink::new(vec![10].into_iter());
        let merged: Vec<i32> = a.interleave(b).collect();
        assert_eq!(merged, vec![1, 10, 2, 3]);
    }

    #[test]
    fn test_filter_and_map_are_lazy_combinators() {
        let shrink = Shrink::new(0..10).filter(|v| v % 2 == 0).map(|v| v * 10);
        assert_eq!(shrink.collect::<Vec<_>>(), vec![0, 20, 40, 60, 80]);
    }

    #[test]
    fn test_chunk_removals() {
        let removals: Vec<Vec<i32>> = ChunkRemovals::new(Arc::new(vec![1, 2, 3, 4])).collect();
        assert_eq!(
            removals,
            vec![
                vec![],
                vec![3, 4],
                vec![1, 2],
                vec![2, 3, 4],
                vec![1, 3, 4],
                vec![1, 2, 4],
                vec![1, 2, 3],
            ]
        );
    }

    #[test]
    fn test_vec_shrinker_removes_then_shrinks_elements() {
        let shrinker = vec_shrinker(bool_shrinker());
        let candidates: Vec<Vec<bool>> = shrinker(&vec![true, false]).collect();
        assert_eq!(
            candidates,
            vec![vec![], vec![false], vec![true], vec![false, false]]
        );
    }

    #[test]
    fn test_tree_map_shrinks_through_mapping() {
        let tree = ShrinkTree::unfold(8i64, int64_shrinker()).map(|v| format!("#{}", v));
        assert_eq!(tree.value(), "#8");
        let first: Vec<String> = tree.children().map(|c| c.into_value()).collect();
        assert_eq!(first[0], "#0");

        // the mapped candidate keeps its own source shrinker
        let four = tree
            .children()
            .find(|c| c.value() == "#4")
            .expect("candidate #4");
        let below: Vec<String> = four.children().map(|c| c.into_value()).collect();
        assert!(below.contains(&"#2".to_string()));
    }

    #[test]
    fn test_tree_filter_applies_at_every_depth() {
        let tree = ShrinkTree::unfold(40i64, int64_shrinker()).filter(Arc::new(|v: &i64| *v >= 10));
        for child in tree.children() {
            assert!(*child.value() >= 10);
            for grandchild in child.children() {
                assert!(*grandchild.value() >= 10);
            }
        }
    }

    #[test]
    fn test_zip_shrinks_left_first() {
        let tree = ShrinkTree::unfold(true, bool_shrinker()).zip(ShrinkTree::unfold(true, bool_shrinker()));
        let candidates: Vec<(bool, bool)> = tree.children().map(|c| c.into_value()).collect();
        assert_eq!(candidates, vec![(false, true), (true, false)]);
    }

    #[test]
    fn test_sequence_tree_matches_vec_shrinker() {
        let trees = vec![
            ShrinkTree::unfold(true, bool_shrinker()),
            ShrinkTree::unfold(false, bool_shrinker()),
        ];
        let tree = ShrinkTree::sequence(trees);
        let from_tree: Vec<Vec<bool>> = tree.children().map(|c| c.into_value()).collect();
        let from_shrinker: Vec<Vec<bool>> = vec_shrinker(bool_shrinker())(&vec![true, false]).collect();
        assert_eq!(from_tree, from_shrinker);
    }
}
