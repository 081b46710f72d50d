use std::f32::consts::TAU;

use crossterm::style::Color;

use super::common::{faded_rgb, hsl_to_rgb, Effect, FrameContext, PhaseEdge, PhaseTween};
use crate::breathing::BreathingPhase;
use crate::render::Surface;

/// Terminal cells are roughly twice as tall as wide; circles are drawn with
/// this horizontal stretch so they read as round.
const ASPECT: f32 = 2.0;

const BURST_PARTICLES: usize = 8;

#[derive(Debug)]
struct BurstParticle {
    angle: f32,
    speed: f32,
    delay: f32,
    age: f32,
    lifetime: f32,
}

/// The classic 2D guide: concentric rings that grow on inhale, stay at full
/// size through hold, and shrink over the exhale, with a particle burst
/// emitted once at the start of every exhale.
pub(crate) struct BreathingPulse {
    core: PhaseTween,
    ring: PhaseTween,
    glow: PhaseTween,
    burst: Vec<BurstParticle>,
    edge: PhaseEdge,
    rng: fastrand::Rng,
}

impl BreathingPulse {
    pub(crate) fn new(rng: fastrand::Rng) -> Self {
        Self {
            core: PhaseTween::new(1.0),
            ring: PhaseTween::new(1.0),
            glow: PhaseTween::new(0.4),
            burst: Vec::new(),
            edge: PhaseEdge::default(),
            rng,
        }
    }

    fn scale_target(phase: BreathingPhase, is_active: bool, grown: f32) -> f32 {
        if !is_active {
            return 1.0 + (grown - 1.0) * 0.5;
        }
        match phase {
            BreathingPhase::Inhale | BreathingPhase::Hold => grown,
            BreathingPhase::Exhale => 1.0,
        }
    }

    fn glow_target(phase: BreathingPhase, is_active: bool) -> f32 {
        if !is_active {
            return 0.4;
        }
        match phase {
            BreathingPhase::Inhale => 0.7,
            BreathingPhase::Hold => 0.8,
            BreathingPhase::Exhale => 0.35,
        }
    }

    fn spawn_burst(&mut self, exhale_seconds: f32) {
        self.burst.clear();
        for index in 0..BURST_PARTICLES {
            self.burst.push(BurstParticle {
                angle: self.rng.f32() * TAU,
                speed: self.rng.f32() * 4.0 + 3.0,
                delay: index as f32 * 0.1,
                age: 0.0,
                lifetime: exhale_seconds * 0.8,
            });
        }
    }

    fn draw_ring(surface: &mut Surface, cx: f32, cy: f32, radius: f32, ch: char, color: Color) {
        let steps = (radius * 24.0).max(16.0) as u32;
        for step in 0..steps {
            let angle = step as f32 / steps as f32 * TAU;
            let x = cx + radius * ASPECT * angle.cos();
            let y = cy + radius * angle.sin();
            surface.set(x.round() as i32, y.round() as i32, ch, color);
        }
    }
}

impl Effect for BreathingPulse {
    fn update(&mut self, ctx: &FrameContext) {
        let cycle = ctx.cycle;
        let core_target = Self::scale_target(cycle.phase, cycle.is_active, 1.6);
        let ring_target = Self::scale_target(cycle.phase, cycle.is_active, 1.2);
        let glow_target = Self::glow_target(cycle.phase, cycle.is_active);
        self.core.advance(ctx, core_target);
        self.ring.advance(ctx, ring_target);
        self.glow.advance(ctx, glow_target);

        if self.edge.entered(&cycle) == Some(BreathingPhase::Exhale) && cycle.is_active {
            self.spawn_burst(BreathingPhase::Exhale.duration_seconds() as f32);
        }

        if cycle.is_active {
            self.burst.retain_mut(|particle| {
                particle.age += ctx.delta;
                particle.age < particle.lifetime + particle.delay
            });
        }
    }

    fn render(&self, ctx: &FrameContext, surface: &mut Surface) {
        let cx = f32::from(ctx.width) / 2.0;
        let cy = f32::from(ctx.height) / 2.0;
        let base_radius = (f32::from(ctx.height) * 0.28).max(3.0);
        let glow = self.glow.value();

        // Outer halo, middle ring, then the main circle.
        Self::draw_ring(
            surface,
            cx,
            cy,
            base_radius * self.ring.value() * 1.35,
            '·',
            hsl_to_rgb(265.0, 60.0, 18.0 + glow * 20.0),
        );
        Self::draw_ring(
            surface,
            cx,
            cy,
            base_radius * self.ring.value() * 1.15,
            '∘',
            hsl_to_rgb(265.0, 70.0, 25.0 + glow * 25.0),
        );
        Self::draw_ring(
            surface,
            cx,
            cy,
            base_radius * self.core.value() * 0.8,
            '●',
            hsl_to_rgb(270.0, 75.0, 35.0 + glow * 35.0),
        );

        // Exhale burst particles radiating outward.
        for particle in &self.burst {
            let t = particle.age - particle.delay;
            if t < 0.0 {
                continue;
            }
            let progress = (t / particle.lifetime).min(1.0);
            let distance = particle.speed * t;
            let x = cx + distance * ASPECT * particle.angle.cos();
            let y = cy + distance * particle.angle.sin();
            let opacity = 0.8 * (1.0 - progress);
            surface.set(
                x.round() as i32,
                y.round() as i32,
                '✧',
                faded_rgb((180, 120, 250), opacity),
            );
        }

        // Countdown in the center of the circle.
        let label = if ctx.cycle.is_active {
            ctx.cycle.countdown.to_string()
        } else {
            "--".to_string()
        };
        surface.put_centered(cy as i32, &label, Color::White);
    }
}

#[cfg(test)]
mod tests {
    use crate::breathing::BreathingCycle;
    use crate::effects::common::tests::frame;

    use super::*;

    fn advance_seconds(pulse: &mut BreathingPulse, cycle: &BreathingCycle, seconds: f32) {
        let frames = (seconds * 30.0) as u32;
        for _ in 0..frames {
            pulse.update(&frame(cycle.snapshot(), 1.0 / 30.0, 0.0));
        }
    }

    #[test]
    fn test_burst_emitted_once_on_entering_exhale() {
        let mut pulse = BreathingPulse::new(fastrand::Rng::with_seed(1));
        let mut cycle = BreathingCycle::new();
        pulse.update(&frame(cycle.snapshot(), 0.0, 0.0));

        // Reach exhale: 4 inhale ticks + 2 hold ticks.
        for _ in 0..6 {
            cycle.tick();
        }
        assert_eq!(cycle.snapshot().phase, BreathingPhase::Exhale);
        pulse.update(&frame(cycle.snapshot(), 1.0 / 30.0, 0.0));
        assert_eq!(pulse.burst.len(), BURST_PARTICLES);

        // Staying in exhale must not re-trigger the emission.
        let before: Vec<f32> = pulse.burst.iter().map(|p| p.age).collect();
        pulse.update(&frame(cycle.snapshot(), 1.0 / 30.0, 0.0));
        assert_eq!(pulse.burst.len(), BURST_PARTICLES);
        assert!(pulse
            .burst
            .iter()
            .zip(&before)
            .all(|(particle, age)| particle.age > *age));
    }

    #[test]
    fn test_burst_particles_expire() {
        let mut pulse = BreathingPulse::new(fastrand::Rng::with_seed(2));
        let mut cycle = BreathingCycle::new();
        pulse.update(&frame(cycle.snapshot(), 0.0, 0.0));
        for _ in 0..6 {
            cycle.tick();
        }
        pulse.update(&frame(cycle.snapshot(), 1.0 / 30.0, 0.0));
        assert!(!pulse.burst.is_empty());
        // Lifetime is exhale * 0.8 plus stagger; 7 seconds clears everything.
        advance_seconds(&mut pulse, &cycle, 7.0);
        assert!(pulse.burst.is_empty());
    }

    #[test]
    fn test_scale_grows_through_inhale_and_hold() {
        let mut pulse = BreathingPulse::new(fastrand::Rng::with_seed(3));
        let mut cycle = BreathingCycle::new();
        pulse.update(&frame(cycle.snapshot(), 0.0, 0.0));
        advance_seconds(&mut pulse, &cycle, 4.0);
        let grown = pulse.core.value();
        assert!(grown > 1.5, "core should approach 1.6, got {grown}");

        // Hold keeps the grown size.
        for _ in 0..4 {
            cycle.tick();
        }
        assert_eq!(cycle.snapshot().phase, BreathingPhase::Hold);
        advance_seconds(&mut pulse, &cycle, 2.0);
        assert!(pulse.core.value() > 1.5);
    }

    #[test]
    fn test_no_burst_when_paused() {
        let mut pulse = BreathingPulse::new(fastrand::Rng::with_seed(4));
        let mut cycle = BreathingCycle::new();
        pulse.update(&frame(cycle.snapshot(), 0.0, 0.0));
        for _ in 0..6 {
            cycle.tick();
        }
        cycle.toggle_active();
        pulse.update(&frame(cycle.snapshot(), 1.0 / 30.0, 0.0));
        assert!(pulse.burst.is_empty());
    }
}
