use log::{debug, warn};
use rayon::prelude::*;

use crate::errors::SimulationError;
use crate::models::{Bounds, Vec2};
use crate::particles::barnes_hut;
use crate::particles::collisions::resolve_collisions;
use crate::particles::integrators::{hermite_step, rk2_step, yoshida_step, Integrator};
use crate::particles::{Particle, QuadTree};
use crate::utils::{SimulationConstants, CHUNK_SIZE};

/// Construction-time configuration of a [`Simulation`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationConfig {
    pub integrator: Integrator,
    pub constants: SimulationConstants,
}

impl SimulationConfig {
    pub fn new(integrator: Integrator, constants: SimulationConstants) -> Self {
        Self { integrator, constants }
    }
}

/// The simulation core: a particle ensemble, the quadtree indexing it, and
/// the step pipeline over both.
///
/// Each `advance(dt)` runs the phases in strict sequence: tree maintenance
/// (migration sweep + reinsertion), mass moments, one integrator step, the
/// collision sweep with compaction, and recentering. Per-particle phase
/// bodies run data-parallel; the phases themselves never overlap.
///
/// # Examples
///
/// ```
/// use accretion::{Bounds, Particle, Simulation, SimulationConfig, Vec2};
///
/// let particles = vec![
///     Particle::new(0, Vec2::new(0.0, 0.0), Vec2::zeros(), 1.0, 0.005).unwrap(),
///     Particle::new(1, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), 1e-6, 0.0005).unwrap(),
/// ];
/// let bounds = Bounds::new(-250.0, -250.0, 500.0, 500.0);
/// let mut sim = Simulation::new(particles, bounds, SimulationConfig::default())
///     .expect("Failed to build simulation");
///
/// sim.advance(0.01).expect("Step failed");
/// assert_eq!(sim.particles().len(), 2);
/// ```
#[derive(Debug)]
pub struct Simulation {
    particles: Vec<Particle>,
    tree: QuadTree,
    config: SimulationConfig,
    migrated: Vec<usize>,
    steps: u64,
    elapsed: f64,
}

impl Simulation {
    /// Builds the core from an initial population and the tree's outer
    /// bounds: validates the configuration, inserts the particles (bodies
    /// outside the root region are skipped from tree accounting), computes
    /// the mass moments, and seeds acceleration and jerk with one
    /// force-and-jerk evaluation, as the Hermite scheme requires.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-positive opening angle or
    /// degenerate root bounds.
    pub fn new(
        particles: Vec<Particle>,
        bounds: Bounds,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        config.constants.validate()?;
        if !(bounds.width > 0.0) || !(bounds.height > 0.0) {
            return Err(SimulationError::InvalidTreeGeometry);
        }

        let mut tree = QuadTree::new(bounds);
        let mut skipped = 0;
        for index in 0..particles.len() {
            if !tree.insert(index, &particles) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!("{} particles start outside the root region and are not tracked", skipped);
        }
        tree.calculate_com(&particles, &config.constants);

        let mut sim = Self {
            particles,
            tree,
            config,
            migrated: Vec::new(),
            steps: 0,
            elapsed: 0.0,
        };
        barnes_hut::compute_accelerations_and_jerks(
            &sim.tree,
            &mut sim.particles,
            &sim.config.constants,
        );
        Ok(sim)
    }

    /// Runs one full step of the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTimeStep`] unless `dt` is finite
    /// and strictly positive.
    pub fn advance(&mut self, dt: f64) -> Result<(), SimulationError> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(SimulationError::InvalidTimeStep);
        }

        self.maintain_tree();
        self.tree.calculate_com(&self.particles, &self.config.constants);

        match self.config.integrator {
            Integrator::Hermite => {
                hermite_step(&mut self.particles, &self.tree, &self.config.constants, dt)
            }
            Integrator::Yoshida => {
                yoshida_step(&mut self.particles, &self.tree, &self.config.constants, dt)
            }
            Integrator::Rk2 => {
                rk2_step(&mut self.particles, &self.tree, &self.config.constants, dt)
            }
        }

        resolve_collisions(&mut self.particles, &mut self.tree, &self.config.constants, dt);
        self.recenter();

        self.steps += 1;
        self.elapsed += dt;
        Ok(())
    }

    /// Migration sweep plus reinsertion: leaves shed particles that drifted
    /// out of their bounds, sparse subtrees collapse, and each migrant is
    /// reinserted from the root. A migrant the root no longer contains
    /// stays on the particle list but falls out of gravitational
    /// accounting.
    fn maintain_tree(&mut self) {
        let mut migrated = std::mem::take(&mut self.migrated);
        migrated.clear();
        self.tree.update_particles(&self.particles, &mut migrated);

        let mut lost = 0;
        for &index in &migrated {
            if !self.tree.insert(index, &self.particles) {
                lost += 1;
            }
        }
        if lost > 0 {
            warn!("{} particles left the root region and are no longer tracked", lost);
        }
        self.migrated = migrated;
    }

    /// Subtracts the mass-weighted centroid of the in-bounds particles from
    /// every position, keeping the tree's useful region centered on the
    /// mass. No-op when the in-bounds mass is zero.
    fn recenter(&mut self) {
        let bounds = self.tree.bounds();
        let (mass, weighted_x, weighted_y) = self
            .particles
            .par_iter()
            .filter(|p| bounds.contains(p.position))
            .map(|p| (p.mass, p.mass * p.position.x, p.mass * p.position.y))
            .reduce(
                || (0.0, 0.0, 0.0),
                |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2),
            );
        if mass > 0.0 {
            let centroid = Vec2::new(weighted_x / mass, weighted_y / mass);
            self.particles.par_chunks_mut(CHUNK_SIZE).for_each(|chunk| {
                for particle in chunk {
                    particle.position -= centroid;
                }
            });
        }
    }

    /// The live particle list. References stay valid for the duration of a
    /// step; merging may reorder or shrink the list between steps.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The spatial index, for read-only traversal (visualization).
    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    pub fn integrator(&self) -> Integrator {
        self.config.integrator
    }

    pub fn constants(&self) -> &SimulationConstants {
        &self.config.constants
    }

    /// Number of completed `advance` calls.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Total simulated time across completed steps.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Sum of the masses of all live particles.
    pub fn total_mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    /// Sum of the linear momenta of all live particles.
    pub fn total_momentum(&self) -> Vec2 {
        self.particles
            .iter()
            .fold(Vec2::zeros(), |acc, p| acc + p.momentum())
    }
}
