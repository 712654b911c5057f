use rayon::prelude::*;

use crate::models::Vec2;
use crate::particles::{NodeId, Particle, QuadTree};
use crate::utils::SimulationConstants;

/// Selects which kinematic fields of the particle list a walk reads.
///
/// Integrators that evaluate forces at an extrapolated state (the Hermite
/// predictor) write that state into the particles' scratch fields and walk
/// with `Predicted`, so every pairwise term sees the extrapolated positions
/// and velocities of both bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSet {
    Current,
    Predicted,
}

impl FieldSet {
    #[inline]
    fn position(self, particle: &Particle) -> Vec2 {
        match self {
            FieldSet::Current => particle.position,
            FieldSet::Predicted => particle.predicted_position,
        }
    }

    #[inline]
    fn velocity(self, particle: &Particle) -> Vec2 {
        match self {
            FieldSet::Current => particle.velocity,
            FieldSet::Predicted => particle.predicted_velocity,
        }
    }
}

/// Detached kinematic state of the body a walk targets.
///
/// Decoupling the target from the particle list lets integrators probe
/// scratch states (an RK2 midpoint, a Hermite prediction) without mutating
/// any shared record. `id` is carried so a probe derived from a live
/// particle still skips its own entry in leaf sums.
#[derive(Debug, Clone, Copy)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f64,
    pub id: u64,
}

impl BodyState {
    pub fn of(particle: &Particle) -> Self {
        Self {
            position: particle.position,
            velocity: particle.velocity,
            radius: particle.radius,
            id: particle.id,
        }
    }

    pub fn predicted(particle: &Particle) -> Self {
        Self {
            position: particle.predicted_position,
            velocity: particle.predicted_velocity,
            radius: particle.radius,
            id: particle.id,
        }
    }
}

/// Net gravitational acceleration on `body` from the whole tree.
///
/// Walks with the opening criterion `s < d * theta * theta_scale`, where `s`
/// is the cell width, `d` the distance to the cell's center of mass (floored
/// at `2 * body.radius`), and `theta_scale = (mass_ref / M)^alpha` makes
/// light cells open more aggressively than heavy ones. Accepted cells count
/// as point masses; leaves are summed exactly with the pair softening floor
/// `|r|, r_p + r_q`. The walk is a pure read over tree and particles.
pub fn acceleration(
    tree: &QuadTree,
    particles: &[Particle],
    body: &BodyState,
    fields: FieldSet,
    constants: &SimulationConstants,
) -> Vec2 {
    let mut acc = Vec2::zeros();
    accumulate(tree, tree.root(), particles, body, fields, constants, &mut acc, None);
    acc
}

/// Net acceleration and jerk on `body` from the whole tree.
///
/// The far-field jerk of an accepted cell uses only the target's velocity;
/// the tree carries no aggregate velocity. This is a known simplification
/// inherited from the force model.
pub fn acceleration_and_jerk(
    tree: &QuadTree,
    particles: &[Particle],
    body: &BodyState,
    fields: FieldSet,
    constants: &SimulationConstants,
) -> (Vec2, Vec2) {
    let mut acc = Vec2::zeros();
    let mut jerk = Vec2::zeros();
    accumulate(tree, tree.root(), particles, body, fields, constants, &mut acc, Some(&mut jerk));
    (acc, jerk)
}

#[allow(clippy::too_many_arguments)]
fn accumulate(
    tree: &QuadTree,
    node: NodeId,
    particles: &[Particle],
    body: &BodyState,
    fields: FieldSet,
    constants: &SimulationConstants,
    acc: &mut Vec2,
    mut jerk: Option<&mut Vec2>,
) {
    let cell = tree.node(node);
    if cell.total_mass == 0.0 {
        return;
    }

    let delta = body.position - cell.center_of_mass;
    let dist = delta.norm().max(2.0 * body.radius); // singularity floor
    let size = cell.bounds.width;

    if size < dist * constants.theta * cell.theta_scale {
        // Far enough: the whole cell acts as a point mass at its COM.
        let inv_r3 = 1.0 / (dist * dist * dist);
        let scale = -constants.g * cell.total_mass;
        *acc += delta * (scale * inv_r3);
        if let Some(jerk) = jerk.as_deref_mut() {
            let inv_r5 = inv_r3 / (dist * dist);
            *jerk += (body.velocity * inv_r3
                - delta * (3.0 * delta.dot(&body.velocity) * inv_r5))
                * scale;
        }
        return;
    }

    match cell.children() {
        Some(children) => {
            for child in children {
                accumulate(tree, child, particles, body, fields, constants, acc, jerk.as_deref_mut());
            }
        }
        None => {
            for &index in cell.resident() {
                let other = &particles[index];
                if other.id == body.id {
                    continue;
                }
                let r = body.position - fields.position(other);
                let v = body.velocity - fields.velocity(other);
                let r_soft = r.norm().max(body.radius + other.radius);
                let inv_r3 = 1.0 / (r_soft * r_soft * r_soft);
                let scale = -constants.g * other.mass;
                *acc += r * (scale * inv_r3);
                if let Some(jerk) = jerk.as_deref_mut() {
                    let inv_r5 = inv_r3 / (r_soft * r_soft);
                    *jerk += (v * inv_r3 - r * (3.0 * r.dot(&v) * inv_r5)) * scale;
                }
            }
        }
    }
}

/// Evaluates the acceleration of every particle at its current state and
/// stores the result on the particle. Data-parallel: the walk phase reads
/// the tree and particle list immutably, then the results are assigned.
pub fn compute_accelerations(
    tree: &QuadTree,
    particles: &mut [Particle],
    constants: &SimulationConstants,
) {
    let accelerations: Vec<Vec2> = {
        let shared: &[Particle] = particles;
        shared
            .par_iter()
            .map(|p| acceleration(tree, shared, &BodyState::of(p), FieldSet::Current, constants))
            .collect()
    };
    particles
        .par_iter_mut()
        .zip(accelerations.into_par_iter())
        .for_each(|(particle, acc)| {
            particle.acceleration = acc;
        });
}

/// Evaluates acceleration and jerk of every particle at its current state
/// and stores both on the particle. Used to seed the Hermite scheme.
pub fn compute_accelerations_and_jerks(
    tree: &QuadTree,
    particles: &mut [Particle],
    constants: &SimulationConstants,
) {
    let evaluated: Vec<(Vec2, Vec2)> = {
        let shared: &[Particle] = particles;
        shared
            .par_iter()
            .map(|p| {
                acceleration_and_jerk(tree, shared, &BodyState::of(p), FieldSet::Current, constants)
            })
            .collect()
    };
    particles
        .par_iter_mut()
        .zip(evaluated.into_par_iter())
        .for_each(|(particle, (acc, jerk))| {
            particle.acceleration = acc;
            particle.jerk = jerk;
        });
}
