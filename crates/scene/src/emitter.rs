use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const MAX_PARTICLE_COUNT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub speed: f32,
    /// Milliseconds alive.
    pub age: f32,
    pub max_age: f32,
    pub scale: f32,
}

/// Spawns short-lived particles drawn as instances of the owner's mesh.
///
/// Particles live in the emitter's local space, so the owner's model
/// transform places them; instance data is `[x, y, z, scale]`.
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    particles: Vec<Particle>,
    /// Particles spawned per step before jitter.
    pub rate: f32,
    pub jitter: f32,
    pub speed: f32,
    /// Upper bound of a particle's lifetime in milliseconds.
    pub max_age: f32,
    pub particle_scale: f32,
    rng: StdRng,
}

impl ParticleEmitter {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let max_age = 1000.0 * rng.random::<f32>();
        Self {
            particles: Vec::new(),
            rate: 10.0,
            jitter: 2.0,
            speed: 0.25,
            max_age,
            particle_scale: 0.25,
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spawn new particles at `origin` (local to the emitter), then advance and age every particle.
    pub fn update(&mut self, origin: Vec3, dt: Duration) {
        let amount = self.rate - self.rng.random::<f32>() * self.jitter;
        self.spawn(origin, amount);

        let ms = dt.as_secs_f32() * 1000.0;
        let base = self.particle_scale;
        self.particles.retain_mut(|p| {
            p.position += p.velocity * p.speed;
            p.speed *= 0.98;
            p.age += ms;
            if p.age >= p.max_age {
                return false;
            }
            p.scale = base * (1.0 - p.age / p.max_age);
            true
        });
    }

    fn spawn(&mut self, origin: Vec3, amount: f32) {
        let count = amount.max(0.0).ceil() as usize;
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLE_COUNT {
                break;
            }
            let velocity = Vec3::new(
                self.rng.random::<f32>() - 0.5,
                self.rng.random::<f32>() - 0.5,
                self.rng.random::<f32>() - 0.5,
            );
            let max_age = self.max_age * self.rng.random::<f32>();
            self.particles.push(Particle {
                position: origin,
                velocity,
                speed: self.speed,
                age: 0.0,
                max_age,
                scale: self.particle_scale,
            });
        }
    }

    /// Per-instance `[x, y, z, scale]`, at most [`MAX_PARTICLE_COUNT`] entries.
    pub fn instance_data(&self) -> Vec<[f32; 4]> {
        self.particles
            .iter()
            .take(MAX_PARTICLE_COUNT)
            .map(|p| [p.position.x, p.position.y, p.position.z, p.scale])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_nanos(7_812_500);

    #[test]
    fn spawns_at_origin() {
        let mut emitter = ParticleEmitter::new(1);
        emitter.max_age = 1000.0;
        emitter.update(Vec3::new(1.0, 2.0, 3.0), Duration::ZERO);
        assert!(emitter.len() >= 8 && emitter.len() <= 10, "{}", emitter.len());
        for p in emitter.particles() {
            assert!(p.position.distance(Vec3::new(1.0, 2.0, 3.0)) < 0.5);
            assert!(p.velocity.abs().max_element() <= 0.5);
        }
    }

    #[test]
    fn capped_at_max_count() {
        let mut emitter = ParticleEmitter::new(2);
        emitter.max_age = f32::MAX;
        for _ in 0..200 {
            emitter.update(Vec3::ZERO, STEP);
        }
        assert_eq!(emitter.len(), MAX_PARTICLE_COUNT);
        assert_eq!(emitter.instance_data().len(), MAX_PARTICLE_COUNT);
    }

    #[test]
    fn particles_expire() {
        let mut emitter = ParticleEmitter::new(3);
        emitter.max_age = 50.0;
        emitter.update(Vec3::ZERO, STEP);
        emitter.rate = 0.0;
        emitter.jitter = 0.0;
        for _ in 0..10 {
            emitter.update(Vec3::ZERO, STEP);
        }
        assert!(emitter.is_empty());
    }

    #[test]
    fn same_seed_same_particles() {
        let mut a = ParticleEmitter::new(9);
        let mut b = ParticleEmitter::new(9);
        for _ in 0..5 {
            a.update(Vec3::ZERO, STEP);
            b.update(Vec3::ZERO, STEP);
        }
        assert_eq!(a.instance_data(), b.instance_data());
    }
}
