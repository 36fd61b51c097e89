use crate::{
    context::{Context, DataPlugin},
    hashing::hash_str,
    type_of,
    HashMap,
    TypeId,
};
use log::trace;
use rand::{
    distr::uniform::{SampleRange, SampleUniform},
    Rng,
    SeedableRng,
};
use std::any::Any;

/// A named random number stream. Implemented by the types `define_rng!` declares; each stream
/// is seeded from the base seed and its own name, so adding draws to one stage never perturbs
/// the draws of another.
pub trait RngId: Any {
    #![allow(non_upper_case_globals)]
    const new: &'static dyn Fn(u64) -> Self;
    const name: &'static str;
    type RngType: SeedableRng;
    fn rng(&mut self) -> &mut Self::RngType;
}

struct RngPlugin {
    base_seed: u64,
    rng_map: HashMap<TypeId, Box<dyn Any>>,
}

impl RngPlugin {
    fn clear(&mut self) {
        self.rng_map.clear();
    }

    fn get_rng<R: RngId>(&mut self) -> &mut R::RngType {
        let base_seed = self.base_seed;
        self.rng_map
            .entry(type_of::<R>())
            .or_insert_with(|| Box::new((R::new)(base_seed.wrapping_add(hash_str(R::name)))))
            .downcast_mut::<R>()
            .unwrap() // Will never panic as the entry for `R` always holds an `R`
            .rng()
    }
}

impl DataPlugin for RngPlugin {
    #[allow(non_upper_case_globals)]
    const new: &'static dyn Fn() -> Self = &|| RngPlugin {
        base_seed: 0,
        rng_map: HashMap::default(),
    };
}

// Kept private so stages can only draw through `ContextRandomExt`.
fn get_rng<R: RngId>(context: &mut Context) -> &mut R::RngType {
    context.get_data_container_mut::<RngPlugin>().get_rng::<R>()
}

/// Draws from named streams. Every draw in a trial goes through one of these methods, which is
/// what makes a trial a pure function of its seed.
pub trait ContextRandomExt {
    /// Sets the trial's base seed and drops every stream, so each is re-seeded on its next draw.
    fn init_random(&mut self, base_seed: u64);

    /// Applies `sampler` to stream `R`, creating the stream on first use.
    fn sample<R: RngId + 'static, T>(&mut self, sampler: impl FnOnce(&mut R::RngType) -> T) -> T;

    /// A uniform draw from `range` on stream `R`.
    fn sample_range<R: RngId + 'static, S, T>(&mut self, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform;

    /// A Bernoulli(`p`) draw on stream `R`. Panics unless `p` is in `[0, 1]`, which
    /// `Parameters::validate` guarantees for every rate a stage uses.
    fn sample_bool<R: RngId + 'static>(&mut self, p: f64) -> bool
    where
        R::RngType: Rng;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("base seed {base_seed}");
        let rng_plugin = self.get_data_container_mut::<RngPlugin>();
        rng_plugin.base_seed = base_seed;
        rng_plugin.clear();
    }

    fn sample<R: RngId + 'static, T>(&mut self, sampler: impl FnOnce(&mut R::RngType) -> T) -> T {
        let rng = get_rng::<R>(self);
        sampler(rng)
    }

    fn sample_range<R: RngId + 'static, S, T>(&mut self, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample::<R, T>(|rng| rng.random_range(range))
    }

    fn sample_bool<R: RngId + 'static>(&mut self, p: f64) -> bool
    where
        R::RngType: Rng,
    {
        self.sample::<R, bool>(|rng| rng.random_bool(p))
    }
}

#[macro_export]
macro_rules! define_rng {
    ($random_id:ident) => {
        $crate::define_rng!($random_id, $crate::rand::rngs::StdRng);
    };
    ($random_id:ident, $rng_type:ty) => {
        pub(crate) struct $random_id {
            rng: $rng_type,
        }

        impl $crate::random::RngId for $random_id {
            #![allow(non_upper_case_globals)]
            type RngType = $rng_type;
            const name: &'static str = stringify!($random_id);
            const new: &'static dyn Fn(u64) -> Self = &|seed| {
                use $crate::rand::SeedableRng;
                Self {
                    rng: <$rng_type>::seed_from_u64(seed),
                }
            };

            fn rng(&mut self) -> &mut Self::RngType {
                &mut self.rng
            }
        }
    };
}
pub use define_rng;
