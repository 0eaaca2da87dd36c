//! Narrowphase collision detection: specialized primitive tests and SAT for boxes.
//!
//! Every test appends zero or more [`Contact`]s. Normals always point from the second
//! participant toward the first, and a plane is always the second participant.

use glam::Vec3;

use super::collider::{Collider, ColliderShape};
use super::contact::{Contact, ContactMaterial};

/// Detect contacts between two colliders, dispatching on the shape pair.
///
/// Returns `true` if at least one contact was appended to `out`.
pub fn detect_collision(
    a: &Collider,
    b: &Collider,
    material: ContactMaterial,
    out: &mut Vec<Contact>,
) -> bool {
    let before = out.len();
    match (a.shape, b.shape) {
        (ColliderShape::Plane { .. }, ColliderShape::Plane { .. }) => {}
        (_, ColliderShape::Plane { normal, offset }) => {
            shape_and_half_space(a, normal, offset, material, out);
        }
        (ColliderShape::Plane { normal, offset }, _) => {
            shape_and_half_space(b, normal, offset, material, out);
        }
        (ColliderShape::Sphere { radius: ra }, ColliderShape::Sphere { radius: rb }) => {
            sphere_and_sphere(a, ra, b, rb, material, out);
        }
        (ColliderShape::Box { half_size }, ColliderShape::Sphere { radius }) => {
            box_and_sphere(a, half_size, b, radius, material, out);
        }
        (ColliderShape::Sphere { radius }, ColliderShape::Box { half_size }) => {
            box_and_sphere(b, half_size, a, radius, material, out);
        }
        (ColliderShape::Box { half_size: ha }, ColliderShape::Box { half_size: hb }) => {
            box_and_box(a, ha, b, hb, material, out);
        }
    }
    out.len() > before
}

fn shape_and_half_space(
    collider: &Collider,
    normal: Vec3,
    offset: f32,
    material: ContactMaterial,
    out: &mut Vec<Contact>,
) {
    let bodies = [collider.body(), None];
    match collider.shape {
        ColliderShape::Sphere { radius } => {
            let centre = collider.position();
            let distance = normal.dot(centre) - radius - offset;
            if distance >= 0.0 {
                return;
            }
            let point = centre - normal * (distance + radius);
            out.push(Contact::new(bodies, point, normal, -distance, material));
        }
        ColliderShape::Box { .. } => {
            let Some(vertices) = collider.box_vertices() else {
                return;
            };
            for vertex in vertices {
                let distance = vertex.dot(normal);
                if distance < offset {
                    let penetration = offset - distance;
                    let point = vertex + normal * (penetration * 0.5);
                    out.push(Contact::new(bodies, point, normal, penetration, material));
                }
            }
        }
        ColliderShape::Plane { .. } => {}
    }
}

fn sphere_and_sphere(
    a: &Collider,
    radius_a: f32,
    b: &Collider,
    radius_b: f32,
    material: ContactMaterial,
    out: &mut Vec<Contact>,
) {
    let centre_a = a.position();
    let centre_b = b.position();
    let midline = centre_a - centre_b;
    let distance = midline.length();
    let reach = radius_a + radius_b;

    if distance >= reach {
        return;
    }

    let normal = if distance > 1e-6 {
        midline / distance
    } else {
        Vec3::Y
    };
    let point = centre_b + midline * 0.5;
    out.push(Contact::new(
        [a.body(), b.body()],
        point,
        normal,
        reach - distance,
        material,
    ));
}

/// Box is the first participant, sphere the second.
fn box_and_sphere(
    cuboid: &Collider,
    half_size: Vec3,
    sphere: &Collider,
    radius: f32,
    material: ContactMaterial,
    out: &mut Vec<Contact>,
) {
    let transform = cuboid.transform();
    let centre_world = sphere.position();
    let centre = transform.inverse().transform_point3(centre_world);

    // Early out on the separating face axes.
    if (centre.abs() - half_size).max_element() > radius {
        return;
    }

    let bodies = [cuboid.body(), sphere.body()];
    let closest = centre.clamp(-half_size, half_size);
    let offset = centre - closest;
    let distance_sq = offset.length_squared();

    if distance_sq > 1e-12 {
        if distance_sq > radius * radius {
            return;
        }
        let distance = distance_sq.sqrt();
        let closest_world = transform.transform_point3(closest);
        let normal = (closest_world - centre_world) / distance;
        out.push(Contact::new(
            bodies,
            closest_world,
            normal,
            radius - distance,
            material,
        ));
        return;
    }

    // Centre inside the box: push out through the nearest face.
    let depth = half_size - centre.abs();
    let axis = if depth.x <= depth.y && depth.x <= depth.z {
        0
    } else if depth.y <= depth.z {
        1
    } else {
        2
    };
    let side = if centre[axis] >= 0.0 { 1.0 } else { -1.0 };
    let normal = -cuboid.axis(axis).normalize_or_zero() * side;
    out.push(Contact::new(
        bodies,
        centre_world,
        normal,
        depth[axis] + radius,
        material,
    ));
}

/// SAT over the 15 candidate axes of two oriented boxes.
fn box_and_box(
    a: &Collider,
    half_a: Vec3,
    b: &Collider,
    half_b: Vec3,
    material: ContactMaterial,
    out: &mut Vec<Contact>,
) {
    let axes_a = [0, 1, 2].map(|i| a.axis(i).normalize_or_zero());
    let axes_b = [0, 1, 2].map(|i| b.axis(i).normalize_or_zero());
    let half_a = half_a.to_array();
    let half_b = half_b.to_array();

    // From A toward B.
    let t = b.position() - a.position();

    let mut min_overlap = f32::MAX;
    let mut best_axis = Vec3::ZERO;
    let mut candidates = Vec::with_capacity(15);
    candidates.extend_from_slice(&axes_a);
    candidates.extend_from_slice(&axes_b);
    for axis_a in axes_a {
        for axis_b in axes_b {
            let axis = axis_a.cross(axis_b);
            let len = axis.length();
            // Parallel edges
            if len > 1e-6 {
                candidates.push(axis / len);
            }
        }
    }

    for axis in candidates {
        let Some(overlap) = overlap_on_axis(axis, &axes_a, &half_a, &axes_b, &half_b, t) else {
            return;
        };
        if overlap < min_overlap {
            min_overlap = overlap;
            best_axis = axis;
        }
    }

    // Normal from B toward A.
    let normal = if best_axis.dot(t) > 0.0 {
        -best_axis
    } else {
        best_axis
    };
    let deepest = b.support(normal);
    let point = deepest - normal * (min_overlap * 0.5);
    out.push(Contact::new(
        [a.body(), b.body()],
        point,
        normal,
        min_overlap,
        material,
    ));
}

/// Overlap of both boxes projected onto `axis`, `None` if the axis separates them.
fn overlap_on_axis(
    axis: Vec3,
    axes_a: &[Vec3; 3],
    half_a: &[f32; 3],
    axes_b: &[Vec3; 3],
    half_b: &[f32; 3],
    t: Vec3,
) -> Option<f32> {
    let mut proj_a = 0.0f32;
    let mut proj_b = 0.0f32;
    for i in 0..3 {
        proj_a += half_a[i] * axes_a[i].dot(axis).abs();
        proj_b += half_b[i] * axes_b[i].dot(axis).abs();
    }

    let overlap = proj_a + proj_b - t.dot(axis).abs();
    if overlap > 0.0 {
        Some(overlap)
    } else {
        None
    }
}
