use bevy::prelude::*;

use super::body::Body;

/// Ordered collection of every simulated body.
///
/// Bodies are kept in append order; collision pairing walks that order, so it
/// must stay deterministic for a seeded session to replay identically.
#[derive(Clone, Debug, Default)]
pub struct BodyRegistry {
    bodies: Vec<Body>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, body: Body) {
        self.bodies.push(body);
    }

    pub fn remove_at(&mut self, index: usize) -> Body {
        self.bodies.remove(index)
    }

    pub fn find_first(&self, pred: impl Fn(&Body) -> bool) -> Option<usize> {
        self.bodies.iter().position(pred)
    }

    pub fn sun_index(&self) -> Option<usize> {
        self.find_first(Body::is_sun)
    }

    pub fn player_index(&self) -> Option<usize> {
        self.find_first(Body::is_player)
    }

    pub fn center_index(&self) -> Option<usize> {
        self.find_first(|b| b.gravitational_center)
    }

    pub fn sun(&self) -> Option<&Body> {
        self.sun_index().map(|i| &self.bodies[i])
    }

    pub fn player(&self) -> Option<&Body> {
        self.player_index().map(|i| &self.bodies[i])
    }

    pub fn get(&self, index: usize) -> Option<&Body> {
        self.bodies.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Body> {
        self.bodies.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Body> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Body> {
        self.bodies.iter_mut()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn retain(&mut self, f: impl FnMut(&Body) -> bool) {
        self.bodies.retain(f);
    }

    pub fn total_mass(&self) -> f32 {
        self.bodies.iter().map(Body::mass).sum()
    }

    /// Drops expired sparks and depleted ordinary bodies. The player and the
    /// gravitational center are never removed here.
    pub fn cleanup(&mut self, now: f64, min_body_mass: f32) -> usize {
        let before = self.bodies.len();
        self.bodies.retain(|b| {
            if b.is_expired(now) {
                return false;
            }
            b.is_player() || b.gravitational_center || b.mass() >= min_body_mass
        });
        let removed = before - self.bodies.len();
        if removed > 0 {
            debug!("registry cleanup removed {removed} bodies");
        }
        removed
    }
}

impl<'a> IntoIterator for &'a BodyRegistry {
    type Item = &'a Body;
    type IntoIter = std::slice::Iter<'a, Body>;

    fn into_iter(self) -> Self::IntoIter {
        self.bodies.iter()
    }
}
