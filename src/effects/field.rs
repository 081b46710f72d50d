use super::common::{faded_rgb, hsl_to_rgb, Effect, FrameContext};
use crate::render::Surface;
use crate::theme::{ParticleSettings, Theme};

/// Velocities and lifetimes are expressed in units per frame at this
/// reference rate, so motion is independent of the actual frame rate.
const BASE_FRAME_RATE: f32 = 60.0;

#[derive(Debug)]
struct FieldParticle {
    x: f32,
    y: f32,
    velocity_x: f32,
    velocity_y: f32,
    size: f32,
    opacity: f32,
    /// Remaining lifetime in reference frames.
    life: f32,
}

impl FieldParticle {
    fn spawn(rng: &mut fastrand::Rng, settings: &ParticleSettings, width: f32, height: f32) -> Self {
        Self {
            x: rng.f32() * width,
            y: rng.f32() * height,
            velocity_x: (rng.f32() - 0.5) * settings.base_speed,
            velocity_y: (rng.f32() - 0.5) * settings.base_speed * 0.5,
            size: rng.f32() * settings.base_size + 0.5,
            opacity: rng.f32() * 0.6 + 0.2,
            life: rng.f32() * 100.0 + 100.0,
        }
    }

    fn respawn(&mut self, rng: &mut fastrand::Rng, width: f32, height: f32) {
        self.x = rng.f32() * width;
        self.y = rng.f32() * height;
        self.life = rng.f32() * 100.0 + 100.0;
    }
}

/// Theme-colored drifting particle field.
///
/// An infinite, restartable process: particles advance by their velocity
/// every frame, reflect off the bounds, and respawn at a fresh random
/// position when their life runs out. Switching themes reseeds the whole
/// field with that theme's settings row.
pub(crate) struct ThemeParticleField {
    theme: Theme,
    particles: Vec<FieldParticle>,
    rng: fastrand::Rng,
    bounds: (f32, f32),
}

impl ThemeParticleField {
    pub(crate) fn new(theme: Theme, rng: fastrand::Rng) -> Self {
        let mut field = Self { theme, particles: Vec::new(), rng, bounds: (0.0, 0.0) };
        field.reseed(theme);
        field
    }

    fn reseed(&mut self, theme: Theme) {
        self.theme = theme;
        let settings = theme.particle_settings();
        let (width, height) = if self.bounds.0 > 0.0 { self.bounds } else { (80.0, 24.0) };
        self.particles = (0..settings.count)
            .map(|_| FieldParticle::spawn(&mut self.rng, &settings, width, height))
            .collect();
    }

    fn particle_color(&self, particle: &FieldParticle, width: f32) -> crossterm::style::Color {
        let settings = self.theme.particle_settings();
        if settings.hue_shift {
            match self.theme {
                // Teal-to-blue band keyed off horizontal position.
                Theme::Aurora => {
                    let hue = particle.x / width.max(1.0) * 60.0 + 170.0;
                    hsl_to_rgb(hue, 70.0, 50.0 * particle.opacity.max(0.3))
                }
                // Ember drifts between red and amber.
                _ => {
                    let hue = particle.x / width.max(1.0) * 30.0 + 10.0;
                    hsl_to_rgb(hue, 80.0, 50.0 * particle.opacity.max(0.3))
                }
            }
        } else {
            faded_rgb(settings.base_rgb, particle.opacity)
        }
    }

    fn glyph(size: f32) -> char {
        if size > 2.0 {
            '●'
        } else if size > 1.2 {
            '•'
        } else {
            '·'
        }
    }
}

impl Effect for ThemeParticleField {
    fn update(&mut self, ctx: &FrameContext) {
        if ctx.theme != self.theme {
            self.reseed(ctx.theme);
        }
        let width = f32::from(ctx.width);
        let height = f32::from(ctx.height);
        self.bounds = (width, height);
        let frames = ctx.delta * BASE_FRAME_RATE;

        for particle in &mut self.particles {
            particle.x += particle.velocity_x * frames;
            particle.y += particle.velocity_y * frames;
            particle.life -= frames;

            // Reflect, never clamp: the velocity component flips on contact.
            if particle.x < 0.0 || particle.x > width {
                particle.velocity_x = -particle.velocity_x;
                particle.x = particle.x.clamp(0.0, width);
            }
            if particle.y < 0.0 || particle.y > height {
                particle.velocity_y = -particle.velocity_y;
                particle.y = particle.y.clamp(0.0, height);
            }

            if particle.life <= 0.0 {
                particle.respawn(&mut self.rng, width, height);
            }
        }
    }

    fn render(&self, ctx: &FrameContext, surface: &mut Surface) {
        let width = f32::from(ctx.width);
        for particle in &self.particles {
            surface.set(
                particle.x as i32,
                particle.y as i32,
                Self::glyph(particle.size),
                self.particle_color(particle, width),
            );
        }
    }
}
