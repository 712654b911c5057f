use rayon::prelude::*;

use crate::models::Vec2;
use crate::particles::barnes_hut::{self, BodyState, FieldSet};
use crate::particles::{Particle, QuadTree};
use crate::utils::{SimulationConstants, CHUNK_SIZE};

/// Time-stepping scheme driving `advance(dt)`.
///
/// Hermite is a 4th-order predictor-corrector using acceleration and jerk:
/// one combined force-and-jerk walk per step, reusing the previous
/// corrector's evaluation as the current state. Yoshida is a 4th-order
/// symplectic drift-kick composition (three acceleration walks). RK2 is the
/// cheap non-symplectic midpoint method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Integrator {
    #[default]
    Hermite,
    Yoshida,
    Rk2,
}

/// Position update under fixed velocity: `x += v * dt`.
pub fn drift(particles: &mut [Particle], dt: f64) {
    particles.par_chunks_mut(CHUNK_SIZE).for_each(|chunk| {
        for particle in chunk {
            particle.position += particle.velocity * dt;
        }
    });
}

/// Velocity update under fixed acceleration: `v += a * dt`.
pub fn kick(particles: &mut [Particle], dt: f64) {
    particles.par_chunks_mut(CHUNK_SIZE).for_each(|chunk| {
        for particle in chunk {
            particle.velocity += particle.acceleration * dt;
        }
    });
}

/// One step of the Hermite 4th-order predictor-corrector.
///
/// Requires every particle's `acceleration` and `jerk` to reflect its
/// current state (seeded at construction, maintained by the corrector).
///
/// 1. Predict `x_p = x + v dt + a dt^2/2 + j dt^3/6`,
///    `v_p = v + a dt + j dt^2/2` into the scratch fields.
/// 2. Evaluate force and jerk with every body at its predicted state.
/// 3. Correct:
///    `v1 = v + (a0 + a1) dt/2 + (j0 - j1) dt^2/12`,
///    `x1 = x + (v + v1) dt/2 + (a0 - a1) dt^2/12`,
///    leaving `a`, `j` at the post-step evaluation for the next step.
pub fn hermite_step(
    particles: &mut [Particle],
    tree: &QuadTree,
    constants: &SimulationConstants,
    dt: f64,
) {
    particles.par_chunks_mut(CHUNK_SIZE).for_each(|chunk| {
        for p in chunk {
            p.predicted_position = p.position
                + p.velocity * dt
                + p.acceleration * (0.5 * dt * dt)
                + p.jerk * (dt * dt * dt / 6.0);
            p.predicted_velocity =
                p.velocity + p.acceleration * dt + p.jerk * (0.5 * dt * dt);
        }
    });

    let evaluated: Vec<(Vec2, Vec2)> = {
        let shared: &[Particle] = particles;
        shared
            .par_iter()
            .map(|p| {
                barnes_hut::acceleration_and_jerk(
                    tree,
                    shared,
                    &BodyState::predicted(p),
                    FieldSet::Predicted,
                    constants,
                )
            })
            .collect()
    };

    particles
        .par_iter_mut()
        .zip(evaluated.into_par_iter())
        .for_each(|(p, (a1, j1))| {
            let a0 = p.acceleration;
            let j0 = p.jerk;
            let v0 = p.velocity;
            p.velocity = v0 + (a0 + a1) * (0.5 * dt) + (j0 - j1) * (dt * dt / 12.0);
            p.position += (v0 + p.velocity) * (0.5 * dt) + (a0 - a1) * (dt * dt / 12.0);
            p.acceleration = a1;
            p.jerk = j1;
        });
}

/// One step of the Yoshida 4th-order symplectic composition:
/// three drift-eval-kick stages and a closing drift.
pub fn yoshida_step(
    particles: &mut [Particle],
    tree: &QuadTree,
    constants: &SimulationConstants,
    dt: f64,
) {
    let cbrt2 = 2.0_f64.cbrt();
    let w0 = -cbrt2 / (2.0 - cbrt2);
    let w1 = 1.0 / (2.0 - cbrt2);
    let c = [w1 / 2.0, (w0 + w1) / 2.0, (w0 + w1) / 2.0, w1 / 2.0];
    let d = [w1, w0, w1];

    for stage in 0..3 {
        drift(particles, c[stage] * dt);
        barnes_hut::compute_accelerations(tree, particles, constants);
        kick(particles, d[stage] * dt);
    }
    drift(particles, c[3] * dt);
}

/// One step of the 2nd-order Runge-Kutta midpoint method.
///
/// Evaluates once at the start, advances a scratch copy of each body by
/// `x + v dt + a dt^2/2`, evaluates the acceleration there (against the
/// other bodies' start-of-step state), then corrects the velocity with the
/// mean of the two accelerations and adopts the scratch position.
pub fn rk2_step(
    particles: &mut [Particle],
    tree: &QuadTree,
    constants: &SimulationConstants,
    dt: f64,
) {
    barnes_hut::compute_accelerations(tree, particles, constants);

    let midpoints: Vec<(Vec2, Vec2)> = {
        let shared: &[Particle] = particles;
        shared
            .par_iter()
            .map(|p| {
                let scratch_position =
                    p.position + p.velocity * dt + p.acceleration * (0.5 * dt * dt);
                let probe = BodyState {
                    position: scratch_position,
                    velocity: p.velocity,
                    radius: p.radius,
                    id: p.id,
                };
                let scratch_acceleration =
                    barnes_hut::acceleration(tree, shared, &probe, FieldSet::Current, constants);
                (scratch_position, scratch_acceleration)
            })
            .collect()
    };

    particles
        .par_iter_mut()
        .zip(midpoints.into_par_iter())
        .for_each(|(p, (position, acceleration))| {
            p.position = position;
            p.velocity += (acceleration + p.acceleration) * (0.5 * dt);
            p.acceleration = acceleration;
        });
}
