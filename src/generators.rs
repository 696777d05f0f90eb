//! A small library of primitive and combining generators.
//!
//! These are the building blocks the engine, the command machinery and the
//! type registry need. Integer generators draw uniformly over their range and
//! shrink towards zero (or the in-range value closest to zero); collection
//! lengths grow with the iteration size.

use std::sync::Arc;

use crate::generator::{Gen, GenResult, Value};
use crate::parameters::GenParameters;
use crate::shrink::{bool_shrinker, int64_shrink_towards, int64_shrinker, uint64_shrinker, ShrinkTree};

/// Always the same value, never shrinks
pub fn constant<T: Value>(value: T) -> Gen<T> {
    Gen::new(move |_| GenResult::constant(value.clone()))
}

/// A generator that discards every draw
pub fn fail<T: Value>() -> Gen<T> {
    Gen::new(|_| GenResult::undecided())
}

/// One of the given constants, chosen uniformly; constants do not shrink
pub fn one_const_of<T: Value>(values: Vec<T>) -> Gen<T> {
    if values.is_empty() {
        return fail();
    }
    Gen::new(move |params| GenResult::constant(values[params.next_index(values.len())].clone()))
}

/// One of the given generators, chosen uniformly; the chosen one's shrinker is kept
pub fn one_gen_of<T: Value>(gens: Vec<Gen<T>>) -> Gen<T> {
    if gens.is_empty() {
        return fail();
    }
    Gen::new(move |params| {
        let chosen = params.next_index(gens.len());
        gens[chosen].generate(params)
    })
}

/// Choose a generator with probability proportional to its weight
pub fn weighted<T: Value>(choices: Vec<(u32, Gen<T>)>) -> Gen<T> {
    let total: u64 = choices.iter().map(|(weight, _)| *weight as u64).sum();
    if total == 0 {
        return fail();
    }
    Gen::new(move |params| {
        let mut pick = params.next_u64() % total;
        for (weight, gen) in &choices {
            let weight = *weight as u64;
            if pick < weight {
                return gen.generate(params);
            }
            pick -= weight;
        }
        GenResult::undecided()
    })
}

/// Integers in `min..=max`, shrinking towards the in-range value closest to zero
pub fn int_range(min: i64, max: i64) -> Gen<i64> {
    if min > max {
        return fail();
    }
    let target = 0i64.clamp(min, max);
    Gen::new(move |params| {
        let value = params.next_in_range(min, max);
        let shrinker = Arc::new(move |v: &i64| int64_shrink_towards(target, *v));
        GenResult::new(value, shrinker).with_sieve(Arc::new(move |v: &i64| (min..=max).contains(v)))
    })
}

/// Any signed 64-bit integer
pub fn int64() -> Gen<i64> {
    Gen::new(|params| GenResult::new(params.next_i64(), int64_shrinker()))
}

/// Any unsigned 64-bit integer
pub fn uint64() -> Gen<u64> {
    Gen::new(|params| GenResult::new(params.next_u64(), uint64_shrinker()))
}

/// Integers whose magnitude is bounded by the current size
pub fn sized_int() -> Gen<i64> {
    sized(|size| {
        let bound = size as i64;
        int_range(-bound, bound)
    })
}

pub fn boolean() -> Gen<bool> {
    Gen::new(|params| GenResult::new(params.next_bool(), bool_shrinker()))
}

/// Build the generator from the current size
pub fn sized<T, F>(f: F) -> Gen<T>
where
    T: Value,
    F: Fn(usize) -> Gen<T> + Send + Sync + 'static,
{
    Gen::new(move |params| f(params.size).generate(params))
}

/// Vectors of `min_size..=size` elements.
///
/// Candidates remove chunks of elements, then shrink single elements with
/// their own strategy. An undecided element makes the whole vector undecided.
pub fn vec_of<T: Value>(element: Gen<T>) -> Gen<Vec<T>> {
    Gen::new(move |params: &mut GenParameters| {
        let min_len = params.min_size.min(params.size);
        let len = params.next_in_range(min_len as i64, params.size as i64) as usize;
        let mut trees = Vec::with_capacity(len);
        for _ in 0..len {
            match element.generate(params).into_tree() {
                Some(tree) => trees.push(tree),
                None => return GenResult::undecided(),
            }
        }
        GenResult::from_tree(ShrinkTree::sequence(trees))
            .with_sieve(Arc::new(move |v: &Vec<T>| v.len() >= min_len))
    })
}

/// Vectors of exactly `len` elements
pub fn vec_of_n<T: Value>(len: usize, element: Gen<T>) -> Gen<Vec<T>> {
    Gen::new(move |params| {
        let mut trees = Vec::with_capacity(len);
        for _ in 0..len {
            match element.generate(params).into_tree() {
                Some(tree) => trees.push(tree),
                None => return GenResult::undecided(),
            }
        }
        GenResult::from_tree(ShrinkTree::sequence(trees))
            .with_sieve(Arc::new(move |v: &Vec<T>| v.len() == len))
    })
}

/// Lowercase ASCII letters, shrinking towards `'a'`
pub fn alpha_char() -> Gen<char> {
    int_range(0, 25).map(|offset| (b'a' + offset as u8) as char)
}

/// Strings of lowercase ASCII letters; shrinks like a vector of characters
pub fn alpha_string() -> Gen<String> {
    vec_of(alpha_char()).map(|chars| chars.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_range_stays_in_range() {
        let gen = int_range(-5, 5);
        let mut params = GenParameters::with_seed(11);
        for _ in 0..200 {
            let value = *gen.generate(&mut params).retrieve().unwrap();
            assert!((-5..=5).contains(&value));
        }
    }

    #[test]
    fn test_int_range_shrinks_towards_lower_bound_when_positive() {
        let result = int_range(10, 20).generate(&mut GenParameters::with_seed(2));
        let tree = result.tree().unwrap().clone();
        if *tree.value() != 10 {
            let first = result.shrink(&tree).next().unwrap();
            assert_eq!(*first.value(), 10);
        }
    }

    #[test]
    fn test_empty_choices_discard() {
        assert!(one_const_of::<i32>(vec![]).sample_with_seed(1).is_none());
        assert!(one_gen_of::<i32>(vec![]).sample_with_seed(1).is_none());
        assert!(weighted::<i32>(vec![(0, constant(1))]).sample_with_seed(1).is_none());
        assert!(int_range(3, 1).sample_with_seed(1).is_none());
    }

    #[test]
    fn test_weighted_only_picks_positive_weights() {
        let gen = weighted(vec![(0, constant(1)), (5, constant(2))]);
        let mut params = GenParameters::with_seed(9);
        for _ in 0..50 {
            assert_eq!(gen.generate(&mut params).retrieve(), Some(&2));
        }
    }

    #[test]
    fn test_vec_of_respects_size() {
        let gen = vec_of(int64());
        let mut params = GenParameters::with_seed(4).with_size(3);
        for _ in 0..50 {
            let value = gen.generate(&mut params).retrieve().cloned().unwrap();
            assert!(value.len() <= 3);
        }
    }

    #[test]
    fn test_vec_of_discards_when_an_element_discards() {
        let gen = vec_of_n(2, int64().such_that(|_| false));
        assert!(gen.sample_with_seed(1).is_none());
    }

    #[test]
    fn test_alpha_string_shrinks_through_map() {
        let gen = alpha_string();
        let mut params = GenParameters::with_seed(8).with_size(10);
        let result = loop {
            let result = gen.generate(&mut params);
            if result.retrieve().map_or(false, |s| !s.is_empty()) {
                break result;
            }
        };
        let tree = result.tree().unwrap().clone();
        let first = result.shrink(&tree).next().unwrap();
        assert_eq!(first.value(), "");
        assert!(tree.value().chars().all(|c| c.is_ascii_lowercase()));
    }
}
