//! Disc arrangements and reproducible instance sampling.
//!
//! Model
//! - An instance is a pair of arrangements (start, goal) mapping object ids
//!   to disc centers, plus the shared disc radius. The radius follows from
//!   the workspace size, the disc count, and the occupied-area density.
//! - Sampling rejects overlapping placements until each arrangement holds
//!   `num_objs` pairwise non-overlapping discs. Determinism uses a replay
//!   token `(seed, index)` mixed into a single RNG.
//! - `layer_composition` draws the per-layer block sizes for the multi-layer
//!   graph variant: a uniformly random composition of the object count into
//!   positive parts, returned largest-first so every layer fits inside the
//!   one below it.

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::error::PlanError;
use crate::graph::ObjectId;

/// Object id to disc center, ordered for reproducible iteration.
pub type Arrangement = BTreeMap<ObjectId, Vector2<f64>>;

/// A rearrangement instance: where every disc starts, where it must end up,
/// and the common disc radius.
#[derive(Clone, Debug)]
pub struct Instance {
    pub start: Arrangement,
    pub goal: Arrangement,
    pub radius: f64,
}

impl Instance {
    pub fn num_objects(&self) -> usize {
        self.start.len()
    }

    /// Check the invariants the graph builder relies on.
    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(PlanError::invalid(format!(
                "disc radius must be positive and finite, got {}",
                self.radius
            )));
        }
        if !self.start.keys().eq(self.goal.keys()) {
            return Err(PlanError::invalid(
                "start and goal arrangements must cover the same object ids",
            ));
        }
        Ok(())
    }
}

/// Disc radius for `num_objs` discs filling `density` of a `width x height`
/// workspace: `sqrt(width * height * density / (pi * num_objs))`.
pub fn disc_radius(width: f64, height: f64, density: f64, num_objs: usize) -> f64 {
    (width * height * density / (PI * num_objs as f64)).sqrt()
}

/// Sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct SampleCfg {
    pub num_objs: usize,
    /// Occupied-area fraction of the workspace, in (0, 1).
    pub density: f64,
    pub width: f64,
    pub height: f64,
    /// Placement attempts per arrangement before giving up.
    pub max_attempts: usize,
}

impl Default for SampleCfg {
    fn default() -> Self {
        Self {
            num_objs: 10,
            density: 0.3,
            width: 1000.0,
            height: 1000.0,
            max_attempts: 100_000,
        }
    }
}

/// Replay token `(seed, index)` for reproducible sampling streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ self.index.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

/// Draw a start/goal instance with non-overlapping discs in each arrangement.
pub fn draw_instance(cfg: &SampleCfg, token: ReplayToken) -> Result<Instance, PlanError> {
    if cfg.num_objs == 0 {
        return Err(PlanError::invalid("instance needs at least one object"));
    }
    if !(0.0..1.0).contains(&cfg.density) || cfg.density == 0.0 {
        return Err(PlanError::invalid(format!(
            "density must lie in (0, 1), got {}",
            cfg.density
        )));
    }
    let radius = disc_radius(cfg.width, cfg.height, cfg.density, cfg.num_objs);
    if !radius.is_finite() || 2.0 * radius >= cfg.width.min(cfg.height) {
        return Err(PlanError::invalid(format!(
            "disc radius {radius} does not fit a {}x{} workspace",
            cfg.width, cfg.height
        )));
    }
    let mut rng = token.rng();
    let start = draw_arrangement(&mut rng, cfg, radius)?;
    let goal = draw_arrangement(&mut rng, cfg, radius)?;
    Ok(Instance {
        start,
        goal,
        radius,
    })
}

fn draw_arrangement(
    rng: &mut StdRng,
    cfg: &SampleCfg,
    radius: f64,
) -> Result<Arrangement, PlanError> {
    let mut centers: Vec<Vector2<f64>> = Vec::with_capacity(cfg.num_objs);
    let mut attempts = 0usize;
    while centers.len() < cfg.num_objs {
        attempts += 1;
        if attempts > cfg.max_attempts {
            return Err(PlanError::invalid(format!(
                "could not place {} non-overlapping discs within {} attempts",
                cfg.num_objs, cfg.max_attempts
            )));
        }
        let p = Vector2::new(
            rng.gen_range(radius..cfg.width - radius),
            rng.gen_range(radius..cfg.height - radius),
        );
        if centers.iter().all(|q| (p - q).norm() >= 2.0 * radius) {
            centers.push(p);
        }
    }
    Ok(centers
        .into_iter()
        .enumerate()
        .map(|(i, p)| (ObjectId(i), p))
        .collect())
}

/// Uniformly random composition of `total` into `layers` positive parts,
/// sorted largest-first. The non-increasing order lets each layer block be
/// duplicated from the block below it during graph construction.
pub fn layer_composition<R: Rng>(
    rng: &mut R,
    layers: usize,
    total: usize,
) -> Result<Vec<usize>, PlanError> {
    if layers == 0 {
        return Err(PlanError::invalid("layer count must be at least one"));
    }
    if layers == 1 {
        return Ok(vec![total]);
    }
    if layers >= total {
        return Err(PlanError::invalid(format!(
            "layer count {layers} must be below the object count {total}"
        )));
    }
    let mut dividers: Vec<usize> = rand::seq::index::sample(rng, total - 1, layers - 1)
        .iter()
        .map(|i| i + 1)
        .collect();
    dividers.sort_unstable();
    let mut sizes = Vec::with_capacity(layers);
    let mut prev = 0usize;
    for d in dividers {
        sizes.push(d - prev);
        prev = d;
    }
    sizes.push(total - prev);
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_formula_matches_closed_form() {
        // 0.4 density, 1000x1000, 120 discs: sqrt(400_000 / (120 pi)).
        let r = disc_radius(1000.0, 1000.0, 0.4, 120);
        assert!((r - (400_000.0 / (120.0 * PI)).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn draw_is_reproducible_per_token() {
        let cfg = SampleCfg::default();
        let a = draw_instance(&cfg, ReplayToken::new(7, 3)).unwrap();
        let b = draw_instance(&cfg, ReplayToken::new(7, 3)).unwrap();
        assert_eq!(a.start, b.start);
        assert_eq!(a.goal, b.goal);
        let c = draw_instance(&cfg, ReplayToken::new(7, 4)).unwrap();
        assert_ne!(a.start, c.start);
    }

    #[test]
    fn drawn_discs_do_not_overlap() {
        let cfg = SampleCfg {
            num_objs: 20,
            ..SampleCfg::default()
        };
        let inst = draw_instance(&cfg, ReplayToken::new(1, 0)).unwrap();
        inst.validate().unwrap();
        let pts: Vec<_> = inst.start.values().collect();
        for (i, p) in pts.iter().enumerate() {
            for q in &pts[i + 1..] {
                assert!((*p - *q).norm() >= 2.0 * inst.radius);
            }
        }
    }

    #[test]
    fn rejects_degenerate_cfg() {
        let cfg = SampleCfg {
            density: 0.0,
            ..SampleCfg::default()
        };
        assert!(draw_instance(&cfg, ReplayToken::new(0, 0)).is_err());
        let cfg = SampleCfg {
            num_objs: 0,
            ..SampleCfg::default()
        };
        assert!(draw_instance(&cfg, ReplayToken::new(0, 0)).is_err());
    }

    #[test]
    fn compositions_are_positive_and_sorted() {
        let mut rng = StdRng::seed_from_u64(11);
        for layers in 2..6 {
            let sizes = layer_composition(&mut rng, layers, 30).unwrap();
            assert_eq!(sizes.len(), layers);
            assert_eq!(sizes.iter().sum::<usize>(), 30);
            assert!(sizes.iter().all(|&s| s > 0));
            assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn composition_rejects_too_many_layers() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(layer_composition(&mut rng, 5, 5).is_err());
        assert!(layer_composition(&mut rng, 0, 5).is_err());
        assert_eq!(layer_composition(&mut rng, 1, 5).unwrap(), vec![5]);
    }
}
