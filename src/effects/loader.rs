use crossterm::style::Color;

use super::common::{faded_rgb, hsl_to_rgb, Effect, FrameContext};
use crate::render::Surface;

const RAMP_STEP: f32 = 0.08;
const RAMP_CEILING: u8 = 97;
const SETTLE_SECONDS: f32 = 0.3;
const LINGER_SECONDS: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Climbing toward the ceiling two points at a time.
    Ramping,
    /// Short beat before snapping to 100.
    Settling,
    /// Showing the full bar before handing off.
    Full,
    Done,
}

/// Splash progress ramp shown before the breathing view.
///
/// The bar climbs to 97, pauses, snaps to 100, lingers for a moment and then
/// reports completion exactly once so the caller can swap it out.
pub(crate) struct IntroLoader {
    progress: u8,
    stage: Stage,
    stage_clock: f32,
    completion_pending: bool,
}

impl IntroLoader {
    pub(crate) fn new() -> Self {
        Self { progress: 0, stage: Stage::Ramping, stage_clock: 0.0, completion_pending: false }
    }

    /// True exactly once, after the full bar has lingered.
    pub(crate) fn take_completion(&mut self) -> bool {
        std::mem::take(&mut self.completion_pending)
    }

    fn breathe_text(&self) -> &'static str {
        if self.progress < 33 {
            "Breathe in slowly..."
        } else if self.progress < 66 {
            "Hold your breath..."
        } else {
            "Release and let go..."
        }
    }
}

impl Effect for IntroLoader {
    fn update(&mut self, ctx: &FrameContext) {
        self.stage_clock += ctx.delta;
        match self.stage {
            Stage::Ramping => {
                while self.stage_clock >= RAMP_STEP && self.progress < RAMP_CEILING {
                    self.stage_clock -= RAMP_STEP;
                    self.progress = (self.progress + 2).min(RAMP_CEILING);
                }
                if self.progress >= RAMP_CEILING {
                    self.stage = Stage::Settling;
                    self.stage_clock = 0.0;
                }
            }
            Stage::Settling => {
                if self.stage_clock >= SETTLE_SECONDS {
                    self.progress = 100;
                    self.stage = Stage::Full;
                    self.stage_clock = 0.0;
                }
            }
            Stage::Full => {
                if self.stage_clock >= LINGER_SECONDS {
                    self.stage = Stage::Done;
                    self.completion_pending = true;
                }
            }
            Stage::Done => {}
        }
    }

    fn render(&self, ctx: &FrameContext, surface: &mut Surface) {
        let cy = i32::from(ctx.height) / 2;
        let width = i32::from(ctx.width);

        // Pulsing orb above the bar.
        let pulse = 1.0 + 0.25 * (ctx.elapsed * 2.0).sin();
        let radius = 2.0 * pulse;
        let max = radius.ceil() as i32;
        for row in -max..=max {
            for col in (-max * 2)..=(max * 2) {
                let distance = ((col as f32 / 2.0).powi(2) + (row as f32).powi(2)).sqrt();
                if distance <= radius {
                    surface.set(
                        width / 2 + col,
                        cy - 5 + row,
                        '●',
                        hsl_to_rgb(270.0, 70.0, 40.0 - distance * 6.0),
                    );
                }
            }
        }

        surface.put_centered(cy - 1, "S E R E N I M", hsl_to_rgb(270.0, 60.0, 70.0));
        surface.put_centered(cy, self.breathe_text(), faded_rgb((216, 180, 254), 0.8));

        let bar_width = (width / 2).clamp(10, 40);
        let filled = (self.progress as i32 * bar_width) / 100;
        let left = (width - bar_width) / 2;
        for i in 0..bar_width {
            let (ch, color) = if i < filled {
                ('━', hsl_to_rgb(270.0, 70.0, 55.0))
            } else {
                ('─', faded_rgb((139, 92, 246), 0.25))
            };
            surface.set(left + i, cy + 2, ch, color);
        }
        surface.put_centered(cy + 3, &format!("{:>3} %", self.progress), Color::White);
        surface.put_centered(cy + 5, "Prepare for mindfulness", faded_rgb((199, 210, 254), 0.5));
    }
}

#[cfg(test)]
mod tests {
    use crate::breathing::BreathingCycle;
    use crate::effects::common::tests::frame;

    use super::*;

    fn advance(loader: &mut IntroLoader, seconds: f32) {
        let cycle = BreathingCycle::new();
        let frames = (seconds * 30.0).round() as u32;
        for step in 0..frames {
            loader.update(&frame(cycle.snapshot(), 1.0 / 30.0, step as f32 / 30.0));
        }
    }

    #[test]
    fn test_ramp_pauses_at_ceiling_then_fills() {
        let mut loader = IntroLoader::new();
        // 49 steps of 80 ms reach the ceiling; run well past that.
        advance(&mut loader, 4.1);
        assert_eq!(loader.progress, RAMP_CEILING);
        assert_eq!(loader.stage, Stage::Settling);

        advance(&mut loader, SETTLE_SECONDS + 0.1);
        assert_eq!(loader.progress, 100);
    }

    #[test]
    fn test_progress_never_exceeds_100() {
        let mut loader = IntroLoader::new();
        advance(&mut loader, 10.0);
        assert_eq!(loader.progress, 100);
        assert_eq!(loader.stage, Stage::Done);
    }

    #[test]
    fn test_completion_signaled_exactly_once() {
        let mut loader = IntroLoader::new();
        advance(&mut loader, 10.0);
        assert!(loader.take_completion());
        assert!(!loader.take_completion());
        advance(&mut loader, 1.0);
        assert!(!loader.take_completion());
    }

    #[test]
    fn test_breathe_text_thresholds() {
        let mut loader = IntroLoader::new();
        assert_eq!(loader.breathe_text(), "Breathe in slowly...");
        loader.progress = 33;
        assert_eq!(loader.breathe_text(), "Hold your breath...");
        loader.progress = 66;
        assert_eq!(loader.breathe_text(), "Release and let go...");
    }
}
