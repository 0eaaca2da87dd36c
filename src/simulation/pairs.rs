//! Candidate pair enumeration.
//!
//! There is no spatial broadphase. The policy below decides which colliders are
//! tested against each other, and in what order:
//!
//! 1. each actor against every plane, then every obstacle
//! 2. actors pairwise (`i < j`)
//! 3. each projectile `i` against every plane, every actor, every obstacle and every
//!    projectile `j > i`
//!
//! Obstacles are never tested against planes or each other. Every unordered pair is
//! visited at most once and a plane is always the second participant.

use std::ops::Deref;

use super::world::SimulationWorld;
use crate::physics::Collider;

/// One side of a candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Participant {
    /// Index into [`SimulationWorld::planes`].
    Plane(usize),
    Entity(hecs::Entity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidatePair {
    pub first: Participant,
    pub second: Participant,
}

impl CandidatePair {
    fn new(first: Participant, second: Participant) -> Self {
        Self { first, second }
    }
}

/// Append every candidate pair of `world` to `pairs`, in policy order.
pub fn collect_candidate_pairs(world: &SimulationWorld, pairs: &mut Vec<CandidatePair>) {
    let planes = 0..world.planes().len();
    let actors = world.actors();
    let obstacles = world.obstacles();
    let projectiles = world.projectiles();

    for &actor in actors {
        let first = Participant::Entity(actor);
        pairs.extend(
            planes
                .clone()
                .map(|plane| CandidatePair::new(first, Participant::Plane(plane))),
        );
        pairs.extend(
            obstacles
                .iter()
                .map(|&obstacle| CandidatePair::new(first, Participant::Entity(obstacle))),
        );
    }

    for (i, &a) in actors.iter().enumerate() {
        for &b in &actors[i + 1..] {
            pairs.push(CandidatePair::new(
                Participant::Entity(a),
                Participant::Entity(b),
            ));
        }
    }

    for (i, &projectile) in projectiles.iter().enumerate() {
        let first = Participant::Entity(projectile);
        pairs.extend(
            planes
                .clone()
                .map(|plane| CandidatePair::new(first, Participant::Plane(plane))),
        );
        pairs.extend(
            actors
                .iter()
                .chain(obstacles)
                .chain(&projectiles[i + 1..])
                .map(|&other| CandidatePair::new(first, Participant::Entity(other))),
        );
    }
}

/// All candidate pairs of `world`, in policy order.
pub fn candidate_pairs(world: &SimulationWorld) -> Vec<CandidatePair> {
    let mut pairs = Vec::new();
    collect_candidate_pairs(world, &mut pairs);
    pairs
}

/// A collider borrowed either from the plane list or from entity storage.
pub(crate) enum ColliderRef<'w> {
    Static(&'w Collider),
    Component(hecs::Ref<'w, Collider>),
}

impl Deref for ColliderRef<'_> {
    type Target = Collider;

    fn deref(&self) -> &Collider {
        match self {
            ColliderRef::Static(collider) => *collider,
            ColliderRef::Component(collider) => &**collider,
        }
    }
}

/// Look up the collider of one participant.
pub(crate) fn collider_of(
    world: &SimulationWorld,
    participant: Participant,
) -> Option<ColliderRef<'_>> {
    match participant {
        Participant::Plane(index) => world.planes().get(index).map(ColliderRef::Static),
        Participant::Entity(entity) => world.collider(entity).map(ColliderRef::Component),
    }
}
