//! Type-keyed generator registry.
//!
//! Types opt in through [`Arbitrary`]; composite types (vectors, options,
//! boxes, maps, pairs) resolve their element generators recursively through
//! the same registry, so an override registered for an element type is used
//! inside every composite containing it. Lookups are explicit and happen when
//! a property is assembled, never while it runs.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::warn;

use crate::error::{PropertyError, PropertyResult};
use crate::forall::{for_all, CheckFn, Generators};
use crate::generator::{Gen, Value};
use crate::generators::{alpha_char, alpha_string, boolean, constant, fail, int64, int_range, uint64, vec_of, weighted};
use crate::prop::Prop;

/// Types with a default generator.
///
/// The default implementation has none; such types need a registered override.
pub trait Arbitrary: Value {
    fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
        None
    }
}

/// Registry of generator overrides keyed by type
#[derive(Default)]
pub struct Arbitraries {
    overrides: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for Arbitraries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arbitraries")
            .field("overrides", &self.overrides.len())
            .finish()
    }
}

impl Arbitraries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `gen` for every `T`, replacing any earlier override
    pub fn register<T: Value>(&mut self, gen: Gen<T>) -> &mut Self {
        self.overrides.insert(TypeId::of::<T>(), Box::new(gen));
        self
    }

    /// Registered override for `T`, else its default generator
    pub fn resolve<T: Arbitrary>(&self) -> Option<Gen<T>> {
        let registered = self
            .overrides
            .get(&TypeId::of::<T>())
            .and_then(|gen| gen.downcast_ref::<Gen<T>>());
        match registered {
            Some(gen) => Some(gen.clone()),
            None => T::arbitrary(self),
        }
    }

    pub fn try_gen_for<T: Arbitrary>(&self) -> PropertyResult<Gen<T>> {
        self.resolve::<T>().ok_or(PropertyError::NoGenerator {
            type_name: type_name::<T>(),
        })
    }

    /// Generator for `T`; discards every draw when none is available
    pub fn gen_for<T: Arbitrary>(&self) -> Gen<T> {
        match self.try_gen_for::<T>() {
            Ok(gen) => gen,
            Err(e) => {
                warn!("{}; values of this type will be discarded", e);
                fail()
            }
        }
    }

    /// Property over arguments drawn from this registry.
    ///
    /// An argument type without a generator is a configuration error; the
    /// property is reported as such without running.
    pub fn for_all<Args, C>(&self, check: C) -> Prop
    where
        Args: ArbitraryArgs,
        C: CheckFn<Args>,
    {
        match Args::resolve(self) {
            Ok(gens) => for_all(check, gens),
            Err(e) => {
                warn!("Cannot assemble property: {}", e);
                Prop::error(PropertyError::Configuration(e.to_string()))
            }
        }
    }
}

/// Argument tuples whose every position resolves through the registry
pub trait ArbitraryArgs: Value {
    type Gens: Generators<Values = Self>;

    fn resolve(registry: &Arbitraries) -> PropertyResult<Self::Gens>;
}

macro_rules! impl_arbitrary_args {
    ($($T:ident),+) => {
        impl<$($T: Arbitrary),+> ArbitraryArgs for ($($T,)+) {
            type Gens = ($(Gen<$T>,)+);

            fn resolve(registry: &Arbitraries) -> PropertyResult<Self::Gens> {
                Ok(($(registry.try_gen_for::<$T>()?,)+))
            }
        }
    };
}

impl_arbitrary_args!(A);
impl_arbitrary_args!(A, B);
impl_arbitrary_args!(A, B, C);
impl_arbitrary_args!(A, B, C, D);
impl_arbitrary_args!(A, B, C, D, E);
impl_arbitrary_args!(A, B, C, D, E, F);

macro_rules! impl_arbitrary_small_int {
    ($($t:ty),+) => {
        $(
            impl Arbitrary for $t {
                fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
                    Some(int_range(<$t>::MIN as i64, <$t>::MAX as i64).map(|v| v as $t))
                }
            }
        )+
    };
}

impl_arbitrary_small_int!(i8, i16, i32, u8, u16, u32);

impl Arbitrary for i64 {
    fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(int64())
    }
}

impl Arbitrary for isize {
    fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(int64().map(|v| v as isize))
    }
}

impl Arbitrary for u64 {
    fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(uint64())
    }
}

impl Arbitrary for usize {
    fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(uint64().map(|v| v as usize))
    }
}

impl Arbitrary for bool {
    fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(boolean())
    }
}

impl Arbitrary for char {
    fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(alpha_char())
    }
}

impl Arbitrary for String {
    fn arbitrary(_registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(alpha_string())
    }
}

impl<T: Arbitrary> Arbitrary for Vec<T> {
    fn arbitrary(registry: &Arbitraries) -> Option<Gen<Self>> {
        registry.resolve::<T>().map(vec_of)
    }
}

/// `None` one time in ten
impl<T: Arbitrary> Arbitrary for Option<T> {
    fn arbitrary(registry: &Arbitraries) -> Option<Gen<Self>> {
        let some = registry.resolve::<T>()?.map(Some);
        Some(weighted(vec![(1, constant(None)), (9, some)]))
    }
}

impl<T: Arbitrary> Arbitrary for Box<T> {
    fn arbitrary(registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(registry.resolve::<T>()?.map(Box::new))
    }
}

impl<K, V> Arbitrary for BTreeMap<K, V>
where
    K: Arbitrary + Ord,
    V: Arbitrary,
{
    fn arbitrary(registry: &Arbitraries) -> Option<Gen<Self>> {
        let entry = registry.resolve::<K>()?.zip(&registry.resolve::<V>()?);
        Some(vec_of(entry).map(|entries| entries.into_iter().collect()))
    }
}

impl<A: Arbitrary, B: Arbitrary> Arbitrary for (A, B) {
    fn arbitrary(registry: &Arbitraries) -> Option<Gen<Self>> {
        Some(registry.resolve::<A>()?.zip(&registry.resolve::<B>()?))
    }
}
