use bevy::prelude::*;

use super::body::Body;
use super::error::ResetReason;
use super::registry::BodyRegistry;
use super::settings::SimSettings;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollisionReport {
    pub contacts: usize,
    pub removed: usize,
    pub mass_transferred: f32,
}

/// Pairs that never resolve through the overlap path.
pub fn collision_excluded(a: &Body, b: &Body, now: f64, immunity_window: f32) -> bool {
    if (a.is_player() && b.is_spark()) || (a.is_spark() && b.is_player()) {
        return true;
    }
    if a.is_spark() && b.is_spark() {
        return true;
    }
    // Player against sun belongs to absorption.
    if (a.is_player() && b.is_sun()) || (a.is_sun() && b.is_player()) {
        return true;
    }

    let a_immune = a.is_immune(now, immunity_window);
    let b_immune = b.is_immune(now, immunity_window);
    if a_immune && b_immune {
        return true;
    }
    (a_immune && (b.is_player() || b.is_spark())) || (b_immune && (a.is_player() || a.is_spark()))
}

pub fn overlapping(a: &Body, b: &Body) -> bool {
    let rsum = a.radius() + b.radius();
    (b.pos - a.pos).length_squared() <= rsum * rsum
}

/// Moves mass from `small` into `big` and returns the amount moved.
///
/// Sparks hand over everything at once; anything else drains at `rate` of its
/// own mass per second. A consuming player keeps its momentum.
pub fn transfer_mass(big: &mut Body, small: &mut Body, rate: f32, dt: f32) -> f32 {
    let amount = if small.is_spark() {
        small.mass()
    } else {
        (small.mass() * rate * dt).min(small.mass())
    };
    if amount <= 0.0 {
        return 0.0;
    }

    if big.is_player() {
        let total = big.mass() + amount;
        big.vel = (big.vel * big.mass() + small.vel * amount) / total;
    }
    big.set_mass(big.mass() + amount);
    small.set_mass(small.mass() - amount);
    amount
}

/// Tests every unordered pair once and resolves overlaps by gradual mass
/// transfer from the lighter body to the heavier one.
///
/// Depleted bodies are marked during the pass and swept out afterwards in one
/// order-preserving retain.
pub fn resolve_collisions(
    registry: &mut BodyRegistry,
    settings: &SimSettings,
    now: f64,
    dt: f32,
) -> Result<CollisionReport, ResetReason> {
    let mut report = CollisionReport::default();
    let bodies = registry.as_mut_slice();
    let n = bodies.len();
    let mut removed = vec![false; n];

    for i in (0..n).rev() {
        for j in (0..i).rev() {
            if removed[i] {
                break;
            }
            if removed[j] {
                continue;
            }

            let (lo, hi) = bodies.split_at_mut(i);
            let (outer, inner) = (&mut hi[0], &mut lo[j]);
            if collision_excluded(outer, inner, now, settings.immunity_window) {
                continue;
            }
            if !overlapping(outer, inner) {
                continue;
            }

            let ((big, _), (small, small_idx)) = if outer.mass() >= inner.mass() {
                ((outer, i), (inner, j))
            } else {
                ((inner, j), (outer, i))
            };
            if small.gravitational_center || big.is_spark() {
                continue;
            }

            let was_spark = small.is_spark();
            let amount = transfer_mass(big, small, settings.collision_transfer_rate, dt);
            report.contacts += 1;
            report.mass_transferred += amount;

            if small.is_player() {
                if small.mass() < settings.min_player_mass {
                    return Err(ResetReason::PlayerDepleted { mass: small.mass() });
                }
                continue;
            }
            if small.mass() <= settings.min_body_mass || (was_spark && small.mass() <= f32::EPSILON) {
                debug!("body {} absorbed by {}", small.id, big.id);
                removed[small_idx] = true;
                report.removed += 1;
            }
        }
    }

    if report.removed > 0 {
        let mut idx = 0;
        registry.retain(|_| {
            let keep = !removed[idx];
            idx += 1;
            keep
        });
    }
    Ok(report)
}
