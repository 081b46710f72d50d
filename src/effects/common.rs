use crossterm::style::Color;

use crate::breathing::{BreathingPhase, CycleSnapshot};
use crate::render::Surface;
use crate::theme::Theme;

/// Frame context passed to all effects.
///
/// The cycle field is an immutable snapshot taken once per frame; effects
/// read it and never write back.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameContext {
    pub(crate) cycle: CycleSnapshot,
    pub(crate) theme: Theme,
    /// Seconds since the application started.
    pub(crate) elapsed: f32,
    /// Seconds since the previous frame.
    pub(crate) delta: f32,
    pub(crate) width: u16,
    pub(crate) height: u16,
}

/// Trait for generative effects driven by, but never feeding back into, the
/// breathing cycle.
pub(crate) trait Effect {
    /// Advance private per-frame state.
    fn update(&mut self, ctx: &FrameContext);

    /// Paint the current state onto the surface.
    fn render(&self, ctx: &FrameContext, surface: &mut Surface);
}

/// Convert HSL to an RGB terminal color
/// H: hue (0-360), S: saturation (0-100), L: lightness (0-100)
pub(crate) fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    let s = s / 100.0;
    let l = l / 100.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Color::Rgb {
        r: ((r + m) * 255.0) as u8,
        g: ((g + m) * 255.0) as u8,
        b: ((b + m) * 255.0) as u8,
    }
}

/// Dim an RGB triple toward black; alpha 1.0 leaves it untouched.
pub(crate) fn faded_rgb(rgb: (u8, u8, u8), alpha: f32) -> Color {
    let alpha = alpha.clamp(0.0, 1.0);
    Color::Rgb {
        r: (f32::from(rgb.0) * alpha) as u8,
        g: (f32::from(rgb.1) * alpha) as u8,
        b: (f32::from(rgb.2) * alpha) as u8,
    }
}

pub(crate) fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Detects transitions between breathing phases from per-frame snapshots.
/// Used for edge-triggered effects that must fire once per transition, not
/// on every frame a phase happens to be current.
#[derive(Debug, Default)]
pub(crate) struct PhaseEdge {
    last: Option<BreathingPhase>,
}

impl PhaseEdge {
    /// The phase just entered, if this frame's snapshot differs from the
    /// previous one. The first observed snapshot is not an edge.
    pub(crate) fn entered(&mut self, cycle: &CycleSnapshot) -> Option<BreathingPhase> {
        let previous = self.last.replace(cycle.phase);
        match previous {
            Some(phase) if phase != cycle.phase => Some(cycle.phase),
            Some(_) => None,
            None => None,
        }
    }
}

/// A timed tween toward a per-phase target whose duration equals the
/// remaining duration of the current phase, so the transition lands exactly
/// on the phase boundary.
#[derive(Debug)]
pub(crate) struct PhaseTween {
    value: f32,
    start: f32,
    target: f32,
    elapsed: f32,
    duration: f32,
    edge: PhaseEdge,
}

impl PhaseTween {
    pub(crate) fn new(initial: f32) -> Self {
        Self {
            value: initial,
            start: initial,
            target: initial,
            elapsed: 0.0,
            duration: 0.0,
            edge: PhaseEdge::default(),
        }
    }

    /// Advance toward the target selected for the current phase. Frozen
    /// while the cycle is paused.
    pub(crate) fn advance(&mut self, ctx: &FrameContext, target: f32) -> f32 {
        if self.edge.entered(&ctx.cycle).is_some() || (self.target - target).abs() > f32::EPSILON {
            self.start = self.value;
            self.target = target;
            self.elapsed = 0.0;
            // The countdown was just reloaded with the phase duration, so the
            // remaining time is exactly the countdown.
            self.duration = ctx.cycle.countdown as f32;
        }
        if !ctx.cycle.is_active {
            return self.value;
        }
        self.elapsed += ctx.delta;
        let progress = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };
        self.value = self.start + (self.target - self.start) * ease_in_out(progress);
        self.value
    }

    pub(crate) fn value(&self) -> f32 {
        self.value
    }
}

/// Damped spring following a moving target (mass 1, tension 100,
/// friction 20).
#[derive(Debug)]
pub(crate) struct Spring {
    value: f32,
    velocity: f32,
    mass: f32,
    tension: f32,
    friction: f32,
}

impl Spring {
    pub(crate) fn new(initial: f32) -> Self {
        Self {
            value: initial,
            velocity: 0.0,
            mass: 1.0,
            tension: 100.0,
            friction: 20.0,
        }
    }

    pub(crate) fn advance(&mut self, target: f32, delta: f32) -> f32 {
        // Integrate in small steps so large frame deltas stay stable.
        let mut remaining = delta.clamp(0.0, 0.25);
        const STEP: f32 = 1.0 / 120.0;
        while remaining > 0.0 {
            let dt = remaining.min(STEP);
            let force = -self.tension * (self.value - target) - self.friction * self.velocity;
            self.velocity += force / self.mass * dt;
            self.value += self.velocity * dt;
            remaining -= dt;
        }
        self.value
    }

    pub(crate) fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::breathing::BreathingCycle;

    pub(crate) fn frame(cycle: CycleSnapshot, delta: f32, elapsed: f32) -> FrameContext {
        FrameContext {
            cycle,
            theme: Theme::Cosmic,
            elapsed,
            delta,
            width: 80,
            height: 24,
        }
    }

    #[test]
    fn test_phase_edge_fires_once_per_transition() {
        let mut cycle = BreathingCycle::new();
        let mut edge = PhaseEdge::default();
        assert_eq!(edge.entered(&cycle.snapshot()), None);

        for _ in 0..3 {
            cycle.tick();
            assert_eq!(edge.entered(&cycle.snapshot()), None);
        }
        cycle.tick();
        assert_eq!(edge.entered(&cycle.snapshot()), Some(BreathingPhase::Hold));
        // Level-triggered reads must not fire again.
        assert_eq!(edge.entered(&cycle.snapshot()), None);
    }

    #[test]
    fn test_tween_completes_at_phase_boundary() {
        let mut cycle = BreathingCycle::new();
        let mut tween = PhaseTween::new(1.0);
        // Prime with the initial snapshot.
        tween.advance(&frame(cycle.snapshot(), 0.0, 0.0), 1.0);

        // Enter hold, then simulate exactly the phase duration of frames.
        for _ in 0..4 {
            cycle.tick();
        }
        let snapshot = cycle.snapshot();
        assert_eq!(snapshot.phase, BreathingPhase::Hold);
        let frames = 60;
        let delta = snapshot.countdown as f32 / frames as f32;
        for _ in 0..frames {
            tween.advance(&frame(snapshot, delta, 0.0), 2.0);
        }
        assert!((tween.value() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_tween_freezes_while_paused() {
        let mut cycle = BreathingCycle::new();
        let mut tween = PhaseTween::new(1.0);
        tween.advance(&frame(cycle.snapshot(), 0.1, 0.0), 1.0);
        for _ in 0..4 {
            cycle.tick();
        }
        tween.advance(&frame(cycle.snapshot(), 0.1, 0.0), 2.0);
        let mid = tween.value();

        cycle.toggle_active();
        let paused = cycle.snapshot();
        for _ in 0..30 {
            tween.advance(&frame(paused, 0.1, 0.0), 2.0);
        }
        assert_eq!(tween.value(), mid);
    }

    #[test]
    fn test_spring_settles_on_target() {
        let mut spring = Spring::new(1.0);
        for _ in 0..600 {
            spring.advance(1.2, 1.0 / 60.0);
        }
        assert!((spring.value() - 1.2).abs() < 1e-2);
    }

    #[test]
    fn test_hsl_primary_hues() {
        assert_eq!(hsl_to_rgb(0.0, 100.0, 50.0), Color::Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(hsl_to_rgb(120.0, 100.0, 50.0), Color::Rgb { r: 0, g: 255, b: 0 });
        assert_eq!(hsl_to_rgb(240.0, 100.0, 50.0), Color::Rgb { r: 0, g: 0, b: 255 });
    }
}
