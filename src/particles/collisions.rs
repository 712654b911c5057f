use log::debug;
use rayon::prelude::*;

use crate::models::Bounds;
use crate::particles::{Particle, QuadTree};
use crate::utils::{SimulationConstants, MAX_CAPACITY};

/// Uniform samples of the relative trajectory over `[0, dt]` (10 intervals).
const TRAJECTORY_SAMPLES: usize = 11;

/// Bodies already closer than this multiple of their summed radii are
/// treated as colliding at the start of the step.
const CONTACT_FACTOR: f64 = 1.1;

/// Result of a continuous collision test for one ordered pair.
#[derive(Debug, Clone, Copy)]
pub struct CollisionPrediction {
    /// Whether the pair comes within contact distance during the step.
    pub will_collide: bool,
    /// Earliest sampled contact time, clamped to `[0, dt]`; `dt` if none.
    pub collision_time: f64,
    /// Smallest sampled separation over the step.
    pub min_distance: f64,
}

/// Continuous collision test between two bodies over one time step.
///
/// The relative motion is modeled as the quadratic
/// `dr(t) = dr + dv t + da t^2 / 2` with `da` the mutual gravitational
/// pull at the start of the step (softened by the summed radii). The
/// trajectory is sampled at eleven uniform points; around the discrete
/// minimum a five-point pass at quarter-sample spacing sharpens both the
/// minimum separation and the contact time.
pub fn predict_collision(
    p: &Particle,
    q: &Particle,
    constants: &SimulationConstants,
    dt: f64,
) -> CollisionPrediction {
    let dr = p.position - q.position;
    let dv = p.velocity - q.velocity;
    let contact = p.radius + q.radius;
    let start_distance = dr.norm();

    if start_distance < CONTACT_FACTOR * contact {
        return CollisionPrediction {
            will_collide: true,
            collision_time: 0.0,
            min_distance: start_distance,
        };
    }

    let softened = start_distance.max(contact);
    let da = dr * (-constants.g * (p.mass + q.mass) / (softened * softened * softened));
    let separation_at = |t: f64| (dr + dv * t + da * (0.5 * t * t)).norm();

    let step = dt / (TRAJECTORY_SAMPLES - 1) as f64;
    let mut min_distance = f64::INFINITY;
    let mut min_sample = 0;
    let mut collision_time: Option<f64> = None;

    for sample in 0..TRAJECTORY_SAMPLES {
        let t = step * sample as f64;
        let distance = separation_at(t);
        if distance < min_distance {
            min_distance = distance;
            min_sample = sample;
        }
        if collision_time.is_none() && distance < contact {
            collision_time = Some(t);
        }
    }

    // Refine around the discrete minimum at quarter-sample spacing.
    let quarter = step / 4.0;
    for offset in -2..=2i32 {
        let t = (min_sample as f64 * step + offset as f64 * quarter).clamp(0.0, dt);
        let distance = separation_at(t);
        if distance < min_distance {
            min_distance = distance;
        }
        if distance < contact && collision_time.map_or(true, |current| t < current) {
            collision_time = Some(t);
        }
    }

    CollisionPrediction {
        will_collide: collision_time.is_some(),
        collision_time: collision_time.unwrap_or(dt).clamp(0.0, dt),
        min_distance,
    }
}

#[derive(Debug, Clone, Copy)]
struct MergeEvent {
    survivor: usize,
    victim: usize,
}

/// Collision sweep: detects merging pairs, applies perfectly inelastic
/// merges, and compacts the particle list. Returns the number of merges.
///
/// Detection runs data-parallel and read-only: each worker queries the tree
/// in a box of half-width `2 r + |v| dt` around its particle and tests
/// candidates with a strictly greater id, so every unordered pair is
/// examined by exactly one worker. A particle proposes at most one merge
/// (the first predicted collision in its neighborhood); events are then
/// applied single-threaded in ascending survivor id, skipping any event
/// whose participant was already consumed: the merged body has mutated and
/// further pair tests from this step would be stale.
pub fn resolve_collisions(
    particles: &mut Vec<Particle>,
    tree: &mut QuadTree,
    constants: &SimulationConstants,
    dt: f64,
) -> usize {
    let proposals: Vec<Option<MergeEvent>> = {
        let shared: &[Particle] = particles;
        let tree_view: &QuadTree = tree;
        shared
            .par_iter()
            .enumerate()
            .map_init(
                || Vec::with_capacity(MAX_CAPACITY * 5),
                |neighbours, (i, p)| {
                    neighbours.clear();
                    let reach = 2.0 * p.radius + p.velocity.norm() * dt;
                    let region = Bounds::centered_square(p.position, reach);
                    tree_view.query(region, shared, neighbours);
                    for &j in neighbours.iter() {
                        let q = &shared[j];
                        if q.id <= p.id {
                            continue;
                        }
                        if predict_collision(p, q, constants, dt).will_collide {
                            return Some(MergeEvent { survivor: i, victim: j });
                        }
                    }
                    None
                },
            )
            .collect()
    };

    let mut events: Vec<MergeEvent> = proposals.into_iter().flatten().collect();
    events.sort_by_key(|event| particles[event.survivor].id);

    let mut merged = 0;
    for event in events {
        if particles[event.survivor].mark_for_deletion
            || particles[event.victim].mark_for_deletion
        {
            continue;
        }
        merge_pair(particles, event.survivor, event.victim);
        merged += 1;
    }

    if merged > 0 {
        debug!("collision sweep merged {} pairs", merged);
        compact(particles, tree);
    }
    merged
}

/// Perfectly inelastic merge of `victim` into `survivor`: momentum is
/// conserved, masses add, and the radius grows by the volume-conservation
/// factor `(M / m)^(1/3)`.
fn merge_pair(particles: &mut [Particle], survivor: usize, victim: usize) {
    let victim_mass = particles[victim].mass;
    let victim_momentum = particles[victim].momentum();
    particles[victim].mark_for_deletion = true;

    let p = &mut particles[survivor];
    let total_mass = p.mass + victim_mass;
    p.velocity = (p.momentum() + victim_momentum) / total_mass;
    p.radius *= (total_mass / p.mass).powf(1.0 / 3.0);
    p.mass = total_mass;
}

/// Removes every marked particle and rewrites the tree's resident indices
/// through the old-to-new map, so leaves only reference live records.
fn compact(particles: &mut Vec<Particle>, tree: &mut QuadTree) {
    let mut map = vec![None; particles.len()];
    let mut next = 0;
    for (index, particle) in particles.iter().enumerate() {
        if !particle.mark_for_deletion {
            map[index] = Some(next);
            next += 1;
        }
    }
    particles.retain(|particle| !particle.mark_for_deletion);
    tree.remap(&map);
}
