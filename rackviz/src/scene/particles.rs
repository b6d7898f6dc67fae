//! Ambient particle cloud: a fixed pool that drifts down and is recycled at the top.

use glam::Vec3;
use rand::Rng;

use super::color::Rgb;

/// Particles falling below this height are recycled.
pub const PARTICLE_FLOOR: f32 = -5.0;
/// Recycled particles restart at this height.
pub const PARTICLE_CEILING: f32 = 5.0;
/// Edge length of the cube the cloud occupies.
pub const CLOUD_SPAN: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub color: Rgb,
    pub size: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ParticleCloud {
    pub particles: Vec<Particle>,
}

fn spread<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    (rng.gen::<f32>() - 0.5) * CLOUD_SPAN
}

/// Fall distance per update for a particle of `size` at the given activity (0..100).
pub fn fall_step(activity: f32, size: f32) -> f32 {
    (0.01 + activity * 0.0003) * (size * 10.0)
}

/// Hue given to recycled particles; shifts from cyan toward violet with load.
pub fn recycle_hue(activity: f32) -> f32 {
    0.5 + (activity / 100.0) * 0.3
}

impl ParticleCloud {
    /// Scatter `count` particles through the cloud volume in blue-cyan tones.
    pub fn scatter<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let particles = (0..count)
            .map(|_| Particle {
                position: Vec3::new(spread(rng), spread(rng), spread(rng)),
                color: Rgb::from_hsl(
                    0.5 + rng.gen::<f32>() * 0.1,
                    1.0,
                    0.5 + rng.gen::<f32>() * 0.3,
                ),
                size: rng.gen::<f32>() * 0.1,
            })
            .collect();
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Move every particle down by its activity-scaled step and recycle the ones
    /// that fell through the floor. Returns how many were recycled.
    pub fn advance<R: Rng + ?Sized>(&mut self, activity: f32, rng: &mut R) -> usize {
        let hue = recycle_hue(activity);
        let mut recycled = 0;
        for p in &mut self.particles {
            p.position.y -= fall_step(activity, p.size);
            if p.position.y < PARTICLE_FLOOR {
                p.position = Vec3::new(spread(rng), PARTICLE_CEILING, spread(rng));
                p.color = Rgb::from_hsl(hue, 1.0, 0.5);
                recycled += 1;
            }
        }
        recycled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn scatter_fills_the_volume() {
        let mut rng = StdRng::seed_from_u64(7);
        let cloud = ParticleCloud::scatter(300, &mut rng);
        assert_eq!(cloud.len(), 300);
        for p in &cloud.particles {
            for c in p.position.to_array() {
                assert!((-5.0..=5.0).contains(&c));
            }
            assert!((0.0..0.1).contains(&p.size));
        }
    }

    #[test]
    fn busier_systems_fall_faster() {
        assert!(fall_step(100.0, 0.05) > fall_step(0.0, 0.05));
        assert_eq!(fall_step(50.0, 0.0), 0.0);
    }

    #[test]
    fn particle_below_floor_is_recycled_on_next_advance() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cloud = ParticleCloud {
            particles: vec![
                Particle {
                    position: Vec3::new(1.0, -4.999, 2.0),
                    color: Rgb::new(0.0, 0.0, 0.0),
                    size: 0.09,
                },
                Particle {
                    position: Vec3::new(0.0, 0.0, 0.0),
                    color: Rgb::new(0.0, 0.0, 0.0),
                    size: 0.01,
                },
            ],
        };
        let recycled = cloud.advance(80.0, &mut rng);
        assert_eq!(recycled, 1);
        let p = &cloud.particles[0];
        assert_eq!(p.position.y, PARTICLE_CEILING);
        assert!((-5.0..=5.0).contains(&p.position.x));
        assert!((-5.0..=5.0).contains(&p.position.z));
        assert_eq!(p.color, Rgb::from_hsl(recycle_hue(80.0), 1.0, 0.5));
        // the other one just drifted
        assert!(cloud.particles[1].position.y < 0.0);
        assert_eq!(cloud.particles[1].color, Rgb::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn recycle_hue_tracks_activity() {
        assert_eq!(recycle_hue(0.0), 0.5);
        assert!((recycle_hue(100.0) - 0.8).abs() < 1e-6);
    }
}
