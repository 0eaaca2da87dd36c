//! Contact resolution: projection of interpenetration followed by sequential impulses.
//!
//! Bodies are copied out of the world once, resolved locally and written back at the
//! end. Infinite-mass bodies take part in the maths with zero inverse mass and are
//! never written back.

use std::collections::HashMap;

use glam::{Mat3, Quat, Vec3};

use super::contact::Contact;
use super::rigid_body::RigidBody;

/// Penetration below which a contact is considered resolved.
const PENETRATION_EPSILON: f32 = 1e-4;
/// Closing speed below which restitution is ignored, so resting contacts stay at rest.
const RESTITUTION_THRESHOLD: f32 = 0.5;
/// Largest rotational share of one position correction, as a fraction of the contact arm.
const ANGULAR_MOVE_LIMIT: f32 = 0.2;

#[derive(Debug, Clone, Copy)]
struct SolverBody {
    entity: hecs::Entity,
    inverse_mass: f32,
    inverse_inertia: Mat3,
    position: Vec3,
    orientation: Quat,
    velocity: Vec3,
    angular_velocity: Vec3,
    acceleration: Vec3,
}

impl SolverBody {
    fn from_body(entity: hecs::Entity, body: &RigidBody) -> Self {
        let movable = body.has_finite_mass();
        Self {
            entity,
            inverse_mass: body.inverse_mass(),
            inverse_inertia: if movable {
                body.inverse_inertia_world()
            } else {
                Mat3::ZERO
            },
            position: body.position,
            orientation: body.orientation,
            velocity: body.velocity,
            angular_velocity: body.angular_velocity,
            acceleration: if movable {
                body.acceleration
            } else {
                Vec3::ZERO
            },
        }
    }

    #[inline]
    fn point_velocity(&self, r: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(r)
    }

    #[inline]
    fn effective_inverse_mass(&self, r: Vec3, direction: Vec3) -> f32 {
        let rn = r.cross(direction);
        self.inverse_mass + (self.inverse_inertia * rn).dot(rn)
    }

    /// Displacement of a contact point along `direction` per unit rotational move.
    #[inline]
    fn angular_inertia(&self, r: Vec3, direction: Vec3) -> f32 {
        (self.inverse_inertia * r.cross(direction)).cross(r).dot(direction)
    }

    /// Rotate by the small rotation vector `rotation`.
    fn rotate(&mut self, rotation: Vec3) {
        let spin = Quat::from_xyzw(rotation.x, rotation.y, rotation.z, 0.0) * self.orientation;
        self.orientation = Quat::from_xyzw(
            self.orientation.x + spin.x * 0.5,
            self.orientation.y + spin.y * 0.5,
            self.orientation.z + spin.z * 0.5,
            self.orientation.w + spin.w * 0.5,
        )
        .normalize();
    }

    #[inline]
    fn apply_impulse(&mut self, r: Vec3, impulse: Vec3) {
        self.velocity += impulse * self.inverse_mass;
        self.angular_velocity += self.inverse_inertia * r.cross(impulse);
    }
}

/// Per-contact data prepared once before the velocity iterations.
#[derive(Debug, Clone, Copy)]
struct VelocityConstraint {
    bodies: [Option<usize>; 2],
    r: [Vec3; 2],
    normal: Vec3,
    tangents: [Vec3; 2],
    normal_mass: f32,
    tangent_mass: [f32; 2],
    target_normal_velocity: f32,
    friction: f32,
    normal_impulse: f32,
    tangent_impulse: [f32; 2],
}

/// Resolve `contacts` against the bodies stored in `world`.
///
/// The position phase repeatedly separates the deepest remaining contact, splitting the
/// correction between translation and rotation by each body's inertia at the contact,
/// and updates the penetration of every contact sharing a moved body. The velocity
/// phase sweeps the contacts with accumulated, clamped normal and friction impulses.
/// Each phase is bounded by `iterations`.
pub fn resolve_contacts(
    iterations: usize,
    contacts: &mut [Contact],
    world: &mut hecs::World,
    dt: f32,
) {
    if contacts.is_empty() || iterations == 0 {
        return;
    }

    let mut bodies: Vec<SolverBody> = Vec::new();
    let mut lookup: HashMap<hecs::Entity, usize> = HashMap::new();
    let indices: Vec<[Option<usize>; 2]> = contacts
        .iter()
        .map(|contact| contact.bodies.map(|entity| gather(entity, world, &mut bodies, &mut lookup)))
        .collect();

    let arms: Vec<[Vec3; 2]> = contacts
        .iter()
        .zip(&indices)
        .map(|(contact, pair)| {
            pair.map(|body| body.map_or(Vec3::ZERO, |i| contact.point - bodies[i].position))
        })
        .collect();

    resolve_penetration(iterations, contacts, &indices, &arms, &mut bodies);
    resolve_velocity(iterations, contacts, &indices, &arms, &mut bodies, dt);

    for solved in &bodies {
        if solved.inverse_mass == 0.0 {
            continue;
        }
        if let Ok(mut body) = world.get::<&mut RigidBody>(solved.entity) {
            body.position = solved.position;
            body.orientation = solved.orientation;
            body.velocity = solved.velocity;
            body.angular_velocity = solved.angular_velocity;
            body.calculate_derived_data();
        }
    }
}

fn gather(
    entity: Option<hecs::Entity>,
    world: &hecs::World,
    bodies: &mut Vec<SolverBody>,
    lookup: &mut HashMap<hecs::Entity, usize>,
) -> Option<usize> {
    let entity = entity?;
    if let Some(&index) = lookup.get(&entity) {
        return Some(index);
    }
    let body = world.get::<&RigidBody>(entity).ok()?;
    let index = bodies.len();
    bodies.push(SolverBody::from_body(entity, &body));
    lookup.insert(entity, index);
    Some(index)
}

/// Translation and rotation applied to one body by one position correction.
#[derive(Debug, Clone, Copy, Default)]
struct Correction {
    linear: Vec3,
    angular: Vec3,
}

impl Correction {
    /// Movement of a point at arm `r` from the body's centre.
    #[inline]
    fn displacement(&self, r: Vec3) -> Vec3 {
        self.linear + self.angular.cross(r)
    }
}

/// Split the removal of `penetration` between both sides of a contact.
fn position_corrections(
    contact: &Contact,
    pair: [Option<usize>; 2],
    arms: [Vec3; 2],
    bodies: &[SolverBody],
) -> Option<[Correction; 2]> {
    let normal = contact.normal;
    let mut linear_inertia = [0.0; 2];
    let mut angular_inertia = [0.0; 2];
    for side in 0..2 {
        if let Some(i) = pair[side] {
            linear_inertia[side] = bodies[i].inverse_mass;
            angular_inertia[side] = bodies[i].angular_inertia(arms[side], normal).max(0.0);
        }
    }
    let total = linear_inertia[0] + linear_inertia[1] + angular_inertia[0] + angular_inertia[1];
    if total <= 0.0 {
        return None;
    }

    let mut corrections = [Correction::default(); 2];
    for side in 0..2 {
        let Some(i) = pair[side] else {
            continue;
        };
        // Body 0 moves along the normal, body 1 against it.
        let sign = if side == 0 { 1.0 } else { -1.0 };
        let mut linear_move = sign * contact.penetration * linear_inertia[side] / total;
        let mut angular_move = sign * contact.penetration * angular_inertia[side] / total;

        let limit = ANGULAR_MOVE_LIMIT * arms[side].length();
        if angular_move.abs() > limit {
            let total_move = linear_move + angular_move;
            angular_move = angular_move.clamp(-limit, limit);
            linear_move = total_move - angular_move;
        }

        corrections[side].linear = normal * linear_move;
        if angular_move != 0.0 && angular_inertia[side] > 0.0 {
            let per_move = bodies[i].inverse_inertia * arms[side].cross(normal);
            corrections[side].angular = per_move * (angular_move / angular_inertia[side]);
        }
    }
    Some(corrections)
}

fn resolve_penetration(
    iterations: usize,
    contacts: &mut [Contact],
    indices: &[[Option<usize>; 2]],
    arms: &[[Vec3; 2]],
    bodies: &mut [SolverBody],
) {
    for _ in 0..iterations {
        let deepest = contacts
            .iter()
            .enumerate()
            .filter(|(_, contact)| contact.penetration > PENETRATION_EPSILON)
            .max_by(|(_, a), (_, b)| a.penetration.total_cmp(&b.penetration))
            .map(|(i, _)| i);
        let Some(index) = deepest else {
            break;
        };

        let pair = indices[index];
        let Some(corrections) = position_corrections(&contacts[index], pair, arms[index], bodies)
        else {
            contacts[index].penetration = 0.0;
            continue;
        };

        for side in 0..2 {
            let Some(moved) = pair[side] else {
                continue;
            };
            if bodies[moved].inverse_mass == 0.0 {
                continue;
            }
            let correction = corrections[side];
            bodies[moved].position += correction.linear;
            if correction.angular != Vec3::ZERO {
                bodies[moved].rotate(correction.angular);
            }

            for ((other, other_pair), other_arms) in contacts.iter_mut().zip(indices).zip(arms) {
                if other_pair[0] == Some(moved) {
                    other.penetration -= correction.displacement(other_arms[0]).dot(other.normal);
                }
                if other_pair[1] == Some(moved) {
                    other.penetration += correction.displacement(other_arms[1]).dot(other.normal);
                }
            }
        }
    }
}

fn resolve_velocity(
    iterations: usize,
    contacts: &[Contact],
    indices: &[[Option<usize>; 2]],
    arms: &[[Vec3; 2]],
    bodies: &mut [SolverBody],
    dt: f32,
) {
    let mut constraints: Vec<VelocityConstraint> = contacts
        .iter()
        .zip(indices)
        .zip(arms)
        .map(|((contact, &pair), &r)| prepare(contact, pair, r, bodies, dt))
        .collect();

    let count = constraints.len();
    for step in 0..iterations {
        solve(&mut constraints[step % count], bodies);
    }
}

fn prepare(
    contact: &Contact,
    pair: [Option<usize>; 2],
    r: [Vec3; 2],
    bodies: &[SolverBody],
    dt: f32,
) -> VelocityConstraint {
    let normal = contact.normal;
    let (t1, t2) = normal.any_orthonormal_pair();
    let tangents = [t1, t2];

    let effective = |direction: Vec3| -> f32 {
        let mut k = 0.0;
        for side in 0..2 {
            if let Some(i) = pair[side] {
                k += bodies[i].effective_inverse_mass(r[side], direction);
            }
        }
        k
    };
    let inverse_or_zero = |k: f32| if k > 0.0 { 1.0 / k } else { 0.0 };

    let relative = relative_velocity(pair, r, bodies);
    let closing = relative.dot(normal);

    // Velocity built up from acceleration alone during this frame is not bounced back.
    let mut acceleration_velocity = 0.0;
    if let Some(i) = pair[0] {
        acceleration_velocity += bodies[i].acceleration.dot(normal) * dt;
    }
    if let Some(i) = pair[1] {
        acceleration_velocity -= bodies[i].acceleration.dot(normal) * dt;
    }

    let target_normal_velocity = if closing < -RESTITUTION_THRESHOLD {
        -contact.restitution * (closing - acceleration_velocity).min(0.0)
    } else {
        0.0
    };

    VelocityConstraint {
        bodies: pair,
        r,
        normal,
        tangents,
        normal_mass: inverse_or_zero(effective(normal)),
        tangent_mass: [
            inverse_or_zero(effective(tangents[0])),
            inverse_or_zero(effective(tangents[1])),
        ],
        target_normal_velocity,
        friction: contact.friction,
        normal_impulse: 0.0,
        tangent_impulse: [0.0; 2],
    }
}

/// Velocity of participant 0 relative to participant 1 at the contact point.
fn relative_velocity(pair: [Option<usize>; 2], r: [Vec3; 2], bodies: &[SolverBody]) -> Vec3 {
    let v0 = pair[0].map_or(Vec3::ZERO, |i| bodies[i].point_velocity(r[0]));
    let v1 = pair[1].map_or(Vec3::ZERO, |i| bodies[i].point_velocity(r[1]));
    v0 - v1
}

fn apply(constraint: &VelocityConstraint, impulse: Vec3, bodies: &mut [SolverBody]) {
    if let Some(i) = constraint.bodies[0] {
        bodies[i].apply_impulse(constraint.r[0], impulse);
    }
    if let Some(i) = constraint.bodies[1] {
        bodies[i].apply_impulse(constraint.r[1], -impulse);
    }
}

fn solve(constraint: &mut VelocityConstraint, bodies: &mut [SolverBody]) {
    if constraint.normal_mass == 0.0 {
        return;
    }

    // Normal
    let relative = relative_velocity(constraint.bodies, constraint.r, bodies);
    let vn = relative.dot(constraint.normal);
    let lambda = (constraint.target_normal_velocity - vn) * constraint.normal_mass;
    let accumulated = (constraint.normal_impulse + lambda).max(0.0);
    let delta = accumulated - constraint.normal_impulse;
    constraint.normal_impulse = accumulated;
    apply(constraint, constraint.normal * delta, bodies);

    // Friction, bounded by the accumulated normal impulse.
    let limit = constraint.friction * constraint.normal_impulse;
    for axis in 0..2 {
        let tangent = constraint.tangents[axis];
        let relative = relative_velocity(constraint.bodies, constraint.r, bodies);
        let lambda = -relative.dot(tangent) * constraint.tangent_mass[axis];
        let accumulated = (constraint.tangent_impulse[axis] + lambda).clamp(-limit, limit);
        let delta = accumulated - constraint.tangent_impulse[axis];
        constraint.tangent_impulse[axis] = accumulated;
        apply(constraint, tangent * delta, bodies);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::contact::ContactMaterial;
    use crate::physics::rigid_body::{cuboid_inertia, sphere_inertia};

    fn ball(world: &mut hecs::World, position: Vec3, velocity: Vec3) -> hecs::Entity {
        let mut body = RigidBody::new(position);
        body.set_inertia_tensor(sphere_inertia(1.0, 0.5));
        body.velocity = velocity;
        world.spawn((body,))
    }

    fn ground_contact(entity: hecs::Entity, penetration: f32, material: ContactMaterial) -> Contact {
        Contact::new(
            [Some(entity), None],
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::Y,
            penetration,
            material,
        )
    }

    #[test]
    fn test_bounce_off_ground() {
        let mut world = hecs::World::new();
        let entity = ball(&mut world, Vec3::new(0.0, 0.45, 0.0), Vec3::new(0.0, -10.0, 0.0));
        let material = ContactMaterial {
            restitution: 0.5,
            friction: 0.0,
        };
        let mut contacts = [ground_contact(entity, 0.05, material)];

        resolve_contacts(8, &mut contacts, &mut world, 1.0 / 60.0);

        let body = world.get::<&RigidBody>(entity).expect("body");
        assert!(
            (body.velocity.y - 5.0).abs() < 1e-3,
            "expected rebound at 5 m/s, got {}",
            body.velocity.y
        );
        assert!(
            (body.position.y - 0.5).abs() < 1e-4,
            "penetration not projected out: y = {}",
            body.position.y
        );
    }

    #[test]
    fn test_slow_contact_does_not_bounce() {
        let mut world = hecs::World::new();
        let entity = ball(&mut world, Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -0.2, 0.0));
        let mut contacts = [ground_contact(entity, 0.0, ContactMaterial::default())];

        resolve_contacts(8, &mut contacts, &mut world, 1.0 / 60.0);

        let body = world.get::<&RigidBody>(entity).expect("body");
        assert!(body.velocity.y.abs() < 1e-4, "vy = {}", body.velocity.y);
    }

    #[test]
    fn test_head_on_elastic_exchange() {
        let mut world = hecs::World::new();
        let a = ball(&mut world, Vec3::new(-0.45, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let b = ball(&mut world, Vec3::new(0.45, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0));
        let material = ContactMaterial {
            restitution: 1.0,
            friction: 0.0,
        };
        // Normal points from B toward A.
        let mut contacts = [Contact::new(
            [Some(a), Some(b)],
            Vec3::ZERO,
            Vec3::NEG_X,
            0.1,
            material,
        )];

        resolve_contacts(8, &mut contacts, &mut world, 1.0 / 60.0);

        let va = world.get::<&RigidBody>(a).expect("a").velocity;
        let vb = world.get::<&RigidBody>(b).expect("b").velocity;
        assert!((va.x + 2.0).abs() < 1e-3, "va = {:?}", va);
        assert!((vb.x - 2.0).abs() < 1e-3, "vb = {:?}", vb);

        let pa = world.get::<&RigidBody>(a).expect("a").position;
        let pb = world.get::<&RigidBody>(b).expect("b").position;
        assert!(((pb.x - pa.x) - 1.0).abs() < 1e-4, "gap = {}", pb.x - pa.x);
    }

    #[test]
    fn test_infinite_mass_never_moves() {
        let mut world = hecs::World::new();
        let wall = world.spawn((RigidBody::new_static(Vec3::new(0.0, 2.0, -10.0)),));
        let bullet = ball(&mut world, Vec3::new(0.0, 2.0, -9.6), Vec3::new(0.0, 0.0, -40.0));
        let before = (*world.get::<&RigidBody>(wall).expect("wall")).clone();
        let mut contacts = [Contact::new(
            [Some(wall), Some(bullet)],
            Vec3::new(0.0, 2.0, -9.75),
            Vec3::NEG_Z,
            0.15,
            ContactMaterial::default(),
        )];

        resolve_contacts(8, &mut contacts, &mut world, 1.0 / 60.0);

        let after = (*world.get::<&RigidBody>(wall).expect("wall")).clone();
        assert_eq!(before, after);
        let bullet_velocity = world.get::<&RigidBody>(bullet).expect("bullet").velocity;
        assert!(bullet_velocity.z > 0.0, "bullet should bounce back: {:?}", bullet_velocity);
    }

    #[test]
    fn test_friction_slows_sliding() {
        let mut world = hecs::World::new();
        let entity = ball(&mut world, Vec3::new(0.0, 0.5, 0.0), Vec3::new(3.0, -4.0, 0.0));
        let material = ContactMaterial {
            restitution: 0.0,
            friction: 0.5,
        };
        let mut contacts = [Contact::new(
            [Some(entity), None],
            Vec3::ZERO,
            Vec3::Y,
            0.0,
            material,
        )];

        resolve_contacts(8, &mut contacts, &mut world, 1.0 / 60.0);

        let velocity = world.get::<&RigidBody>(entity).expect("body").velocity;
        assert!(velocity.x < 3.0, "friction had no effect: {:?}", velocity);
        assert!(velocity.x > 0.0, "friction reversed motion: {:?}", velocity);
    }

    #[test]
    fn test_corner_penetration_rotates_box_out() {
        let mut world = hecs::World::new();
        let mut body = RigidBody::new(Vec3::ZERO);
        body.set_mass(8.0);
        body.set_inertia_tensor(cuboid_inertia(8.0, Vec3::ONE));
        let entity = world.spawn((body,));
        let corner = Vec3::new(1.0, -1.0, 1.0);
        let mut contacts = [Contact::new(
            [Some(entity), None],
            corner,
            Vec3::Y,
            0.1,
            ContactMaterial::default(),
        )];

        resolve_contacts(8, &mut contacts, &mut world, 1.0 / 60.0);

        let body = world.get::<&RigidBody>(entity).expect("body");
        // Linear share is 0.125 / (0.125 + 0.375) of the penetration.
        assert!(
            (body.position.y - 0.025).abs() < 1e-4,
            "box lifted by {} instead of rotating",
            body.position.y
        );
        assert!(
            body.orientation.angle_between(Quat::IDENTITY) > 0.01,
            "box did not rotate: {:?}",
            body.orientation
        );
        let lifted = body.position + body.orientation * corner;
        assert!(
            (lifted.y - (corner.y + 0.1)).abs() < 0.01,
            "corner not projected out: y = {}",
            lifted.y
        );
        assert!(contacts[0].penetration.abs() < 1e-4, "{}", contacts[0].penetration);
    }
}
