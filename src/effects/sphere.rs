use std::f32::consts::TAU;

use super::common::{faded_rgb, hsl_to_rgb, Effect, FrameContext, PhaseEdge, Spring};
use crate::breathing::BreathingPhase;
use crate::render::Surface;

const POINT_COUNT: usize = 300;
const BASE_FRAME_RATE: f32 = 60.0;

/// Horizontal stretch so the projected sphere reads as round in cells.
const ASPECT: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
struct OrbitPoint {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug)]
struct EnergyRing {
    scale: f32,
    opacity: f32,
}

/// Particle-sphere view: a spring-scaled core inside a cloud of orbiting
/// points that contracts on inhale and expands on exhale, with energy rings
/// emitted at each transition into exhale.
pub(crate) struct SphereView {
    points: Vec<OrbitPoint>,
    rings: Vec<EnergyRing>,
    scale: Spring,
    emissive: Spring,
    speed: Spring,
    rotation_y: f32,
    rotation_z: f32,
    edge: PhaseEdge,
}

impl SphereView {
    pub(crate) fn new(rng: &mut fastrand::Rng) -> Self {
        let points = (0..POINT_COUNT)
            .map(|_| {
                let radius = 2.0 + rng.f32() * 1.5;
                let theta = rng.f32() * TAU;
                let phi = rng.f32() * TAU;
                OrbitPoint {
                    x: radius * theta.sin() * phi.cos(),
                    y: radius * theta.sin() * phi.sin(),
                    z: radius * theta.cos(),
                }
            })
            .collect();
        Self {
            points,
            rings: Vec::new(),
            scale: Spring::new(1.1),
            emissive: Spring::new(0.5),
            speed: Spring::new(2.0),
            rotation_y: 0.0,
            rotation_z: 0.0,
            edge: PhaseEdge::default(),
        }
    }

    fn targets(phase: BreathingPhase, is_active: bool) -> (f32, f32, f32) {
        // (scale, emissive intensity, rotation speed)
        if !is_active {
            return (1.1, 0.5, 2.0);
        }
        match phase {
            BreathingPhase::Inhale => (1.2, 1.0, 3.0),
            BreathingPhase::Hold => (1.2, 1.2, 1.0),
            BreathingPhase::Exhale => (1.0, 0.7, 5.0),
        }
    }

    /// Radial breathing factor applied to the point cloud each frame.
    fn drift_factor(phase: BreathingPhase) -> f32 {
        match phase {
            BreathingPhase::Inhale => 0.998,
            BreathingPhase::Hold => 1.0,
            BreathingPhase::Exhale => 1.002,
        }
    }
}

impl Effect for SphereView {
    fn update(&mut self, ctx: &FrameContext) {
        let cycle = ctx.cycle;
        let (scale, emissive, speed) = Self::targets(cycle.phase, cycle.is_active);
        self.scale.advance(scale, ctx.delta);
        self.emissive.advance(emissive, ctx.delta);
        self.speed.advance(speed, ctx.delta);

        self.rotation_y += 0.003 * self.speed.value() * ctx.delta * BASE_FRAME_RATE;
        self.rotation_z += 0.001 * self.speed.value() * ctx.delta * BASE_FRAME_RATE;

        if cycle.is_active {
            let frames = ctx.delta * BASE_FRAME_RATE;
            let factor = Self::drift_factor(cycle.phase).powf(frames);
            let time = ctx.elapsed * 0.5;
            for (index, point) in self.points.iter_mut().enumerate() {
                point.x *= factor;
                point.y *= factor;
                point.z *= factor;
                // Gentle floating wobble on top of the radial drift.
                let offset = index as f32 * 0.01;
                point.x += (time + offset).sin() * 0.002 * frames;
                point.y += (time + offset).cos() * 0.002 * frames;
                point.z += (time + offset * 0.7).sin() * 0.002 * frames;
            }
        }

        if self.edge.entered(&cycle) == Some(BreathingPhase::Exhale) && cycle.is_active {
            self.rings.push(EnergyRing { scale: 1.2, opacity: 0.8 });
        }

        let frames = ctx.delta * BASE_FRAME_RATE;
        for ring in &mut self.rings {
            ring.scale += 0.03 * frames;
            ring.opacity -= 0.02 * frames;
        }
        self.rings.retain(|ring| ring.opacity > 0.0);
    }

    fn render(&self, ctx: &FrameContext, surface: &mut Surface) {
        let cx = f32::from(ctx.width) / 2.0;
        let cy = f32::from(ctx.height) / 2.0;
        let unit = (f32::from(ctx.height) * 0.11).max(1.5);

        // Core sphere as a filled disc whose brightness follows the
        // emissive spring.
        let core_radius = unit * self.scale.value();
        let lightness = 20.0 + self.emissive.value() * 25.0;
        let max_y = core_radius as i32 + 1;
        for row in -max_y..=max_y {
            for col in (-max_y * 2)..=(max_y * 2) {
                let dx = col as f32 / ASPECT;
                let dy = row as f32;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance <= core_radius {
                    let shade = 1.0 - distance / core_radius.max(0.1) * 0.5;
                    surface.set(
                        (cx + col as f32) as i32,
                        (cy + row as f32) as i32,
                        '█',
                        hsl_to_rgb(275.0, 70.0, lightness * shade),
                    );
                }
            }
        }

        // Orbiting points, rotated then projected orthographically.
        let (sin_y, cos_y) = self.rotation_y.sin_cos();
        let (sin_z, cos_z) = self.rotation_z.sin_cos();
        for point in &self.points {
            let (x, z) = (point.x * cos_y + point.z * sin_y, -point.x * sin_y + point.z * cos_y);
            let (x, y) = (x * cos_z - point.y * sin_z, x * sin_z + point.y * cos_z);
            // Depth cueing: points behind the core are dimmer.
            let depth = (z + 3.5) / 7.0;
            let brightness = (0.25 + 0.75 * depth.clamp(0.0, 1.0)) * self.emissive.value().min(1.0);
            surface.set(
                (cx + x * unit * 0.55 * ASPECT) as i32,
                (cy + y * unit * 0.55) as i32,
                if depth > 0.6 { '•' } else { '·' },
                faded_rgb((168, 85, 247), brightness),
            );
        }

        // Expanding energy rings drawn as flattened ellipses.
        for ring in &self.rings {
            let rx = unit * ring.scale * ASPECT;
            let ry = unit * ring.scale * 0.35;
            let steps = (rx * 8.0) as u32;
            for step in 0..steps.max(12) {
                let angle = step as f32 / steps.max(12) as f32 * TAU;
                surface.set(
                    (cx + rx * angle.cos()) as i32,
                    (cy + ry * angle.sin()) as i32,
                    '∘',
                    faded_rgb((168, 85, 247), ring.opacity),
                );
            }
        }
    }
}
