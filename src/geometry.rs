//! Ray, plane and box helpers shared by picking, camera framing, and the drag constraint.
//!
//! Walls and posters are rigid: their transforms carry a translation and a rotation but never a
//! scale. The local/world conversions here rely on that.

use bevy_math::prelude::*;
use bevy_transform::prelude::*;

/// Transform a world space point into the local frame of `frame`.
pub fn world_to_local(frame: &Transform, world: Vec3) -> Vec3 {
    frame.rotation.inverse() * (world - frame.translation)
}

/// Transform a point in the local frame of `frame` into world space.
pub fn local_to_world(frame: &Transform, local: Vec3) -> Vec3 {
    frame.translation + frame.rotation * local
}

/// Express a world space ray in the local frame of `frame`. Distances along the ray are preserved.
pub fn ray_to_local(frame: &Transform, ray: Ray3d) -> Ray3d {
    Ray3d {
        origin: world_to_local(frame, ray.origin),
        direction: frame.rotation.inverse() * ray.direction,
    }
}

/// Intersect a ray with the infinite plane through `plane_origin` with the given `normal`.
///
/// Returns `None` when the ray is parallel to the plane or the plane is behind the ray.
pub fn intersect_plane(ray: Ray3d, plane_origin: Vec3, normal: Dir3) -> Option<Vec3> {
    ray.intersect_plane(plane_origin, InfinitePlane3d { normal })
        .map(|distance| ray.get_point(distance))
}

/// Distance along `ray` to the first hit with an oriented box of `size` centered on `center` in
/// the local frame of `frame`.
pub fn ray_hits_box(ray: Ray3d, frame: &Transform, center: Vec3, size: Vec3) -> Option<f32> {
    let local = ray_to_local(frame, ray);
    let half = size * 0.5;
    ray_aabb_hit_t(local.origin, *local.direction, center - half, center + half)
}

/// Slab-method ray–AABB intersection, returns the nearest non-negative distance if any.
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let (origin, direction) = (ray_origin[axis], ray_direction[axis]);
        if direction == 0.0 {
            // Parallel to this slab: miss unless the origin already lies inside it.
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inv = direction.recip();
        let (mut t0, mut t1) = ((min[axis] - origin) * inv, (max[axis] - origin) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    Some(if t_near >= 0.0 { t_near } else { t_far })
}

/// Clamp the center of a rectangle of `size` so the whole rectangle stays inside `[min, max]`.
///
/// If the rectangle is larger than the region on an axis, or the requested coordinate is NaN, it
/// is centered on that axis. Infinite coordinates clamp to the matching edge.
pub fn clamp_rect_center(center: Vec2, size: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    let half = size * 0.5;
    let lo = min + half;
    let hi = max - half;
    let axis = |value: f32, lo: f32, hi: f32| {
        if lo > hi || value.is_nan() {
            (lo + hi) * 0.5
        } else {
            value.clamp(lo, hi)
        }
    };
    Vec2::new(axis(center.x, lo.x, hi.x), axis(center.y, lo.y, hi.y))
}
