use std::f32::consts::TAU;

use crossterm::style::Color;

use super::common::{faded_rgb, Effect, FrameContext};
use crate::render::Surface;

const STAR_COUNT: usize = 30;
const DUST_COUNT: usize = 15;
const METEOR_COUNT: usize = 3;

/// Star colors: white plus three pale indigo and lavender tints.
const STAR_COLORS: [(u8, u8, u8); 4] = [
    (255, 255, 255),
    (199, 210, 254),
    (216, 180, 254),
    (224, 231, 255),
];

#[derive(Debug)]
struct Star {
    /// Position as a fraction of the screen, so resizes keep the layout.
    x: f32,
    y: f32,
    size: f32,
    opacity: f32,
    period: f32,
    delay: f32,
    color: (u8, u8, u8),
}

#[derive(Debug)]
struct Dust {
    x: f32,
    y: f32,
    drift: f32,
    opacity: f32,
    period: f32,
}

#[derive(Debug)]
struct Meteor {
    x: f32,
    y: f32,
    angle: f32,
    duration: f32,
    delay: f32,
    length: f32,
}

/// Ambient star/dust/meteor backdrop.
///
/// Purely a function of elapsed time once seeded; the breathing cycle does
/// not influence it.
pub(crate) struct Starfield {
    stars: Vec<Star>,
    dust: Vec<Dust>,
    meteors: Vec<Meteor>,
}

impl Starfield {
    pub(crate) fn new(rng: &mut fastrand::Rng) -> Self {
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                x: rng.f32(),
                y: rng.f32(),
                size: rng.f32() * 0.25 + 0.1,
                opacity: rng.f32() * 0.5 + 0.2,
                period: rng.f32() * 15.0 + 5.0,
                delay: rng.f32() * 5.0,
                color: STAR_COLORS[rng.usize(0..STAR_COLORS.len())],
            })
            .collect();
        let dust = (0..DUST_COUNT)
            .map(|_| Dust {
                x: rng.f32(),
                y: rng.f32(),
                drift: rng.f32() * 0.02 - 0.01,
                opacity: rng.f32() * 0.08 + 0.02,
                period: rng.f32() * 40.0 + 20.0,
            })
            .collect();
        let meteors = (0..METEOR_COUNT)
            .map(|index| Meteor {
                x: rng.f32(),
                // Meteors only streak through the upper half.
                y: rng.f32() * 0.5,
                angle: (rng.f32() * 30.0 + 15.0).to_radians(),
                duration: rng.f32() * 3.0 + 2.0,
                delay: rng.f32() * 10.0 + index as f32 * 10.0,
                length: rng.f32() * 8.0 + 4.0,
            })
            .collect();
        Self { stars, dust, meteors }
    }

    fn star_glyph(size: f32, brightness: f32) -> char {
        if brightness < 0.25 {
            '·'
        } else if size > 0.3 {
            '✦'
        } else if size > 0.2 {
            '✶'
        } else {
            '·'
        }
    }
}

impl Effect for Starfield {
    fn update(&mut self, _ctx: &FrameContext) {
        // Stateless per frame: everything derives from elapsed time.
    }

    fn render(&self, ctx: &FrameContext, surface: &mut Surface) {
        let width = f32::from(ctx.width);
        let height = f32::from(ctx.height);

        for star in &self.stars {
            let t = (ctx.elapsed - star.delay).max(0.0);
            // Twinkle between 0.7x and 1.5x of the base opacity.
            let pulse = (t / star.period * TAU).sin();
            let brightness = star.opacity * (1.1 + 0.4 * pulse);
            surface.set(
                (star.x * width) as i32,
                (star.y * height) as i32,
                Self::star_glyph(star.size, brightness),
                faded_rgb(star.color, brightness),
            );
        }

        for dust in &self.dust {
            let t = ctx.elapsed / dust.period * TAU;
            let x = dust.x + dust.drift * t.sin();
            let y = dust.y + dust.drift * t.cos();
            let brightness = dust.opacity * (1.15 + 0.3 * t.sin());
            // Very subtle purple haze.
            surface.set(
                (x * width) as i32,
                (y * height) as i32,
                '░',
                faded_rgb((139, 92, 246), brightness * 4.0),
            );
        }

        for meteor in &self.meteors {
            // Each meteor repeats on a long cadence with a dark gap.
            let cycle_length = meteor.duration + 20.0;
            let t = ctx.elapsed - meteor.delay;
            if t < 0.0 {
                continue;
            }
            let local = t % cycle_length;
            if local > meteor.duration {
                continue;
            }
            let progress = local / meteor.duration;
            let head_x = meteor.x * width + progress * meteor.length * 2.0 * meteor.angle.cos();
            let head_y = meteor.y * height + progress * meteor.length * meteor.angle.sin();
            // Fade in fast, fade out along the tail of its run.
            let brightness = if progress < 0.2 { progress / 0.2 } else { 1.0 - progress };
            for trail in 0..4 {
                let falloff = 1.0 - trail as f32 / 4.0;
                surface.set(
                    (head_x - trail as f32 * meteor.angle.cos() * 2.0) as i32,
                    (head_y - trail as f32 * meteor.angle.sin()) as i32,
                    if trail == 0 { '✦' } else { '·' },
                    faded_rgb((255, 255, 255), brightness * falloff * 0.7),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::breathing::BreathingCycle;
    use crate::effects::common::tests::frame;

    use super::*;

    #[test]
    fn test_population_counts() {
        let mut rng = fastrand::Rng::with_seed(7);
        let field = Starfield::new(&mut rng);
        assert_eq!(field.stars.len(), STAR_COUNT);
        assert_eq!(field.dust.len(), DUST_COUNT);
        assert_eq!(field.meteors.len(), METEOR_COUNT);
    }

    #[test]
    fn test_meteors_spawn_in_upper_half() {
        let mut rng = fastrand::Rng::with_seed(11);
        let field = Starfield::new(&mut rng);
        assert!(field.meteors.iter().all(|meteor| meteor.y <= 0.5));
    }

    #[test]
    fn test_render_stays_in_bounds() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut field = Starfield::new(&mut rng);
        let cycle = BreathingCycle::new();
        let mut surface = Surface::new(80, 24);
        for step in 0..120 {
            let ctx = frame(cycle.snapshot(), 0.25, step as f32 * 0.25);
            field.update(&ctx);
            // Out-of-bounds writes would be dropped silently by the surface;
            // this exercises the math for panics and NaNs.
            field.render(&ctx, &mut surface);
        }
    }
}
