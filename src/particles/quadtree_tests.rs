use crate::assert_float_eq;
use crate::models::{Bounds, Vec2};
use crate::particles::{NodeId, Particle, QuadTree};
use crate::utils::{SimulationConstants, MAX_CAPACITY, MAX_DEPTH};

fn particle_at(id: u64, x: f64, y: f64, mass: f64) -> Particle {
    Particle::new(id, Vec2::new(x, y), Vec2::zeros(), mass, 1e-3).expect("valid particle")
}

fn build_tree(particles: &[Particle], bounds: Bounds) -> QuadTree {
    let mut tree = QuadTree::new(bounds);
    for index in 0..particles.len() {
        tree.insert(index, particles);
    }
    tree
}

fn leaves(tree: &QuadTree) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        match tree.node(id).children() {
            Some(children) => stack.extend(children),
            None => out.push(id),
        }
    }
    out
}

fn internal_nodes(tree: &QuadTree) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        if let Some(children) = tree.node(id).children() {
            out.push(id);
            stack.extend(children);
        }
    }
    out
}

#[test]
fn test_insert_inside_and_outside() {
    let particles = vec![
        particle_at(0, 0.5, 0.5, 1.0),
        particle_at(1, 10.0, 0.0, 1.0), // outside the root region
    ];
    let mut tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));
    assert_eq!(tree.resident_count(), 1);
    assert!(!tree.insert(1, &particles));
}

#[test]
fn test_subdivision_on_capacity_overflow() {
    // Spread enough particles to overflow the root leaf; every quadrant gets
    // a share so no child overflows in turn.
    let mut particles = Vec::new();
    for i in 0..(MAX_CAPACITY + 10) {
        let angle = i as f64 * 0.104;
        let dist = 0.2 + 0.7 * ((i % 10) as f64 / 10.0);
        particles.push(particle_at(i as u64, dist * angle.cos(), dist * angle.sin(), 1.0));
    }
    let tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));

    assert!(!tree.node(tree.root()).is_leaf(), "Root should have subdivided");
    assert_eq!(tree.resident_count(), MAX_CAPACITY + 10);
    for leaf in leaves(&tree) {
        let node = tree.node(leaf);
        if node.depth < MAX_DEPTH {
            assert!(node.resident().len() <= MAX_CAPACITY);
        }
    }
}

#[test]
fn test_children_tile_parent_exactly() {
    let particles: Vec<Particle> = (0..(MAX_CAPACITY + 1))
        .map(|i| particle_at(i as u64, -0.9 + 1.8 * (i as f64 / 60.0), 0.3, 1.0))
        .collect();
    let tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));

    for node in internal_nodes(&tree) {
        let parent = tree.node(node).bounds;
        let children = tree.node(node).children().unwrap();
        let area: f64 = children
            .iter()
            .map(|&c| {
                let b = tree.node(c).bounds;
                b.width * b.height
            })
            .sum();
        assert_float_eq(area, parent.width * parent.height, 1e-12, Some("children tile parent"));
        for &child in &children {
            let b = tree.node(child).bounds;
            assert!(b.left() >= parent.left() && b.right() <= parent.right());
            assert!(b.bottom() >= parent.bottom() && b.top() <= parent.top());
        }
    }
}

#[test]
fn test_leaf_grows_without_bound_at_max_depth() {
    // Coincident particles can never be separated by subdividing; the chain
    // stops at the depth cap and the deepest leaf absorbs them all.
    let particles: Vec<Particle> = (0..(MAX_CAPACITY + 10))
        .map(|i| particle_at(i as u64, 0.3, 0.3, 1.0))
        .collect();
    let tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));

    assert_eq!(tree.resident_count(), MAX_CAPACITY + 10);
    let deepest = leaves(&tree)
        .into_iter()
        .map(|id| tree.node(id))
        .max_by_key(|node| node.depth)
        .unwrap();
    assert_eq!(deepest.depth, MAX_DEPTH);
    assert!(deepest.resident().len() > MAX_CAPACITY);
}

#[test]
fn test_query_appends_without_clearing() {
    let particles = vec![
        particle_at(0, -0.5, -0.5, 1.0),
        particle_at(1, 0.5, 0.5, 1.0),
        particle_at(2, 0.6, 0.6, 1.0),
    ];
    let tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));

    let mut found = vec![usize::MAX]; // sentinel: query must not clear it
    tree.query(Bounds::new(0.0, 0.0, 1.0, 1.0), &particles, &mut found);
    assert_eq!(found[0], usize::MAX);
    let mut hits: Vec<usize> = found[1..].to_vec();
    hits.sort_unstable();
    assert_eq!(hits, vec![1, 2]);
}

#[test]
fn test_update_particles_migration_restores_residency() {
    let mut particles: Vec<Particle> = (0..80)
        .map(|i| {
            let x = -0.9 + 1.8 * ((i % 9) as f64 / 9.0);
            let y = -0.9 + 1.8 * ((i / 9) as f64 / 9.0);
            particle_at(i as u64, x, y, 1.0)
        })
        .collect();
    let mut tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));

    // Drift a handful of bodies into other quadrants.
    for i in 0..10 {
        particles[i].position = Vec2::new(0.8 - 0.01 * i as f64, 0.8);
    }

    let mut removed = Vec::new();
    tree.update_particles(&particles, &mut removed);
    assert!(!removed.is_empty());
    for &index in &removed {
        assert!(tree.insert(index, &particles));
    }

    assert_eq!(tree.resident_count(), particles.len());
    for leaf in leaves(&tree) {
        let node = tree.node(leaf);
        for &index in node.resident() {
            assert!(
                node.bounds.contains(particles[index].position),
                "Leaf holds a particle outside its bounds"
            );
        }
    }
}

#[test]
fn test_sparse_subtree_collapses() {
    let mut particles: Vec<Particle> = (0..60)
        .map(|i| {
            let x = -0.9 + 1.8 * ((i % 8) as f64 / 8.0);
            let y = -0.9 + 1.8 * ((i / 8) as f64 / 8.0);
            particle_at(i as u64, x, y, 1.0)
        })
        .collect();
    let mut tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));
    assert!(!tree.node(tree.root()).is_leaf());

    // Evict a third of the population from the region entirely.
    for i in 0..20 {
        particles[i].position = Vec2::new(500.0, 500.0);
    }
    let mut removed = Vec::new();
    tree.update_particles(&particles, &mut removed);
    assert_eq!(removed.len(), 20);

    // 40 residents spread over four leaf children is below capacity, so the
    // sweep collapses the root back to a leaf.
    assert!(tree.node(tree.root()).is_leaf());
    assert_eq!(tree.resident_count(), 40);
}

#[test]
fn test_calculate_com_weighted_average() {
    let particles = vec![
        particle_at(0, -0.5, 0.0, 3.0),
        particle_at(1, 0.5, 0.0, 1.0),
        particle_at(2, 0.0, 0.8, 4.0),
    ];
    let mut tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));
    let constants = SimulationConstants::default();
    tree.calculate_com(&particles, &constants);

    let root = tree.node(tree.root());
    assert_float_eq(root.total_mass, 8.0, 1e-12, None);
    assert_float_eq(root.center_of_mass.x, (-1.5 + 0.5) / 8.0, 1e-12, None);
    assert_float_eq(root.center_of_mass.y, 3.2 / 8.0, 1e-12, None);
    assert_float_eq(
        root.theta_scale,
        (constants.mass_ref / 8.0).powf(constants.alpha),
        1e-12,
        None,
    );
}

#[test]
fn test_calculate_com_internal_consistency() {
    let particles: Vec<Particle> = (0..120)
        .map(|i| {
            let angle = i as f64 * 0.37;
            let dist = 0.1 + 0.85 * ((i % 13) as f64 / 13.0);
            particle_at(i as u64, dist * angle.cos(), dist * angle.sin(), 0.5 + (i % 3) as f64)
        })
        .collect();
    let mut tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));
    tree.calculate_com(&particles, &SimulationConstants::default());

    for node in internal_nodes(&tree) {
        let children = tree.node(node).children().unwrap();
        let child_mass: f64 = children.iter().map(|&c| tree.node(c).total_mass).sum();
        assert_float_eq(
            tree.node(node).total_mass,
            child_mass,
            1e-9,
            Some("internal mass equals sum over children"),
        );
    }
}

#[test]
fn test_calculate_com_zero_mass() {
    let particles = vec![particle_at(0, 0.2, 0.2, 0.0)];
    let mut tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));
    tree.calculate_com(&particles, &SimulationConstants::default());

    let root = tree.node(tree.root());
    assert_eq!(root.total_mass, 0.0);
    assert_eq!(root.center_of_mass, Vec2::zeros());
    assert_eq!(root.theta_scale, 0.0);
}

#[test]
fn test_remap_rewrites_resident_indices() {
    let particles = vec![
        particle_at(0, -0.5, -0.5, 1.0),
        particle_at(1, 0.5, -0.5, 1.0),
        particle_at(2, 0.5, 0.5, 1.0),
    ];
    let mut tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));

    // Drop the middle particle; the last one shifts down by one.
    tree.remap(&[Some(0), None, Some(1)]);

    assert_eq!(tree.resident_count(), 2);
    for leaf in leaves(&tree) {
        for &index in tree.node(leaf).resident() {
            assert!(index < 2);
        }
    }
}

#[test]
fn test_collect_bounds_covers_all_nodes() {
    let particles: Vec<Particle> = (0..(MAX_CAPACITY + 1))
        .map(|i| {
            let angle = i as f64 * 0.7;
            particle_at(i as u64, 0.8 * angle.cos(), 0.8 * angle.sin(), 1.0)
        })
        .collect();
    let tree = build_tree(&particles, Bounds::new(-1.0, -1.0, 2.0, 2.0));

    let rects = tree.collect_bounds();
    assert_eq!(rects.len(), leaves(&tree).len() + internal_nodes(&tree).len());
    assert_eq!(rects[0], tree.bounds());
}
