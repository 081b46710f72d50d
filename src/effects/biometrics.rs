use crossterm::style::Color;
use itertools::Itertools;

use super::common::{faded_rgb, Effect, FrameContext, PhaseEdge};
use crate::breathing::BreathingPhase;
use crate::render::Surface;

const SCAN_SAMPLES: usize = 50;
const SCAN_INTERVAL: f32 = 0.05;

/// Simulated vitals readout plus an on-demand waveform scan.
///
/// Vitals move a notch on every phase transition while the cycle is active;
/// the scan collects a fixed number of samples on its own cadence and
/// signals completion exactly once. The finished waveform stays on screen
/// until the next scan replaces it.
pub(crate) struct BiometricPanel {
    heart_rate: f32,
    blood_oxygen: f32,
    calm_level: f32,
    edge: PhaseEdge,
    samples: Vec<f32>,
    since_last_sample: f32,
    scan_running: bool,
    scan_complete: bool,
    completion_pending: bool,
    rng: fastrand::Rng,
}

impl BiometricPanel {
    pub(crate) fn new(rng: fastrand::Rng) -> Self {
        Self {
            heart_rate: 72.0,
            blood_oxygen: 97.0,
            calm_level: 65.0,
            edge: PhaseEdge::default(),
            samples: Vec::with_capacity(SCAN_SAMPLES),
            since_last_sample: 0.0,
            scan_running: false,
            scan_complete: false,
            completion_pending: false,
            rng,
        }
    }

    /// Begin a vitals scan. Ignored while one is already running.
    pub(crate) fn start_scan(&mut self) {
        if self.scan_running {
            return;
        }
        self.samples.clear();
        self.since_last_sample = 0.0;
        self.scan_running = true;
        self.scan_complete = false;
    }

    pub(crate) fn scan_running(&self) -> bool {
        self.scan_running
    }

    /// True exactly once after a scan finishes; later calls return false
    /// until another scan completes.
    pub(crate) fn take_completion(&mut self) -> bool {
        std::mem::take(&mut self.completion_pending)
    }

    fn apply_phase(&mut self, phase: BreathingPhase) {
        match phase {
            BreathingPhase::Inhale => {
                self.heart_rate = (self.heart_rate + 1.0).min(78.0);
                self.blood_oxygen = (self.blood_oxygen + 0.1).min(99.0);
            }
            BreathingPhase::Exhale => {
                self.heart_rate = (self.heart_rate - 2.0).max(65.0);
            }
            BreathingPhase::Hold => {
                self.calm_level = (self.calm_level + 0.5).min(95.0);
            }
        }
        if self.scan_complete {
            self.calm_level = (self.calm_level + 0.2).min(95.0);
        }
    }

    fn sample_value(&mut self, index: usize, phase: BreathingPhase) -> f32 {
        let mut value = 50.0 + (index as f32 / 5.0).sin() * 20.0;
        value += match phase {
            BreathingPhase::Inhale => 5.0,
            BreathingPhase::Exhale => -3.0,
            BreathingPhase::Hold => 0.0,
        };
        value += (self.rng.f32() - 0.5) * 10.0;
        value.clamp(0.0, 100.0)
    }

    fn trend(&self, phase: BreathingPhase, is_active: bool) -> [&'static str; 3] {
        let heart = match phase {
            BreathingPhase::Inhale => "↑",
            BreathingPhase::Exhale => "↓",
            BreathingPhase::Hold => "→",
        };
        let oxygen = if phase == BreathingPhase::Inhale { "↑" } else { "→" };
        let calm = if is_active { "↑" } else { "↓" };
        [heart, oxygen, calm]
    }
}

impl Effect for BiometricPanel {
    fn update(&mut self, ctx: &FrameContext) {
        let cycle = ctx.cycle;
        if let Some(phase) = self.edge.entered(&cycle) {
            if cycle.is_active {
                self.apply_phase(phase);
            }
        }

        if self.scan_running {
            self.since_last_sample += ctx.delta;
            while self.since_last_sample >= SCAN_INTERVAL && self.samples.len() < SCAN_SAMPLES {
                self.since_last_sample -= SCAN_INTERVAL;
                let value = self.sample_value(self.samples.len(), cycle.phase);
                self.samples.push(value);
            }
            if self.samples.len() >= SCAN_SAMPLES {
                self.scan_running = false;
                self.scan_complete = true;
                self.completion_pending = true;
            }
        }
    }

    fn render(&self, ctx: &FrameContext, surface: &mut Surface) {
        let width = i32::from(ctx.width);
        let height = i32::from(ctx.height);
        let panel_left = (width / 8).max(1);
        let panel_right = width - panel_left;
        let panel_width = panel_right - panel_left;
        let wave_top = height / 4;
        let wave_height = (height / 3).max(6);
        let wave_bottom = wave_top + wave_height;

        let frame_color = faded_rgb((139, 92, 246), 0.45);
        for x in panel_left..=panel_right {
            surface.set(x, wave_top, '─', frame_color);
            surface.set(x, wave_bottom, '─', frame_color);
        }
        for y in wave_top..=wave_bottom {
            surface.set(panel_left, y, '│', frame_color);
            surface.set(panel_right, y, '│', frame_color);
        }
        surface.set(panel_left, wave_top, '┌', frame_color);
        surface.set(panel_right, wave_top, '┐', frame_color);
        surface.set(panel_left, wave_bottom, '└', frame_color);
        surface.set(panel_right, wave_bottom, '┘', frame_color);

        // Faint horizontal grid lines inside the frame.
        for fraction in [0.25, 0.5, 0.75] {
            let y = wave_top + (wave_height as f32 * fraction) as i32;
            for x in (panel_left + 1)..panel_right {
                surface.set(x, y, '┄', faded_rgb((139, 92, 246), 0.15));
            }
        }

        // Waveform: connect consecutive samples across the frame width.
        let column = |index: usize| {
            panel_left + 1 + (index as f32 / SCAN_SAMPLES as f32 * (panel_width - 2) as f32) as i32
        };
        let row = |value: f32| {
            wave_bottom - 1 - ((value / 100.0) * (wave_height - 2) as f32) as i32
        };
        for ((i, a), (_, b)) in self.samples.iter().enumerate().tuple_windows() {
            let (x0, x1) = (column(i), column(i + 1));
            let (y0, y1) = (row(*a), row(*b));
            let span = (x1 - x0).max(1);
            for x in x0..=x1 {
                let t = (x - x0) as f32 / span as f32;
                let y = y0 as f32 + (y1 - y0) as f32 * t;
                surface.set(x, y.round() as i32, '•', faded_rgb((168, 85, 247), 0.9));
            }
        }

        // Sweeping scan line while a scan is running.
        if self.scan_running {
            let sweep = (ctx.elapsed / 2.5).fract();
            let x = panel_left + 1 + (sweep * (panel_width - 2) as f32) as i32;
            for y in (wave_top + 1)..wave_bottom {
                surface.set(x, y, '┃', faded_rgb((168, 85, 247), 0.8));
            }
            surface.put_centered(
                wave_bottom + 1,
                "ANALYZING BIOMETRIC DATA...",
                faded_rgb((216, 180, 254), 0.8),
            );
        } else if self.scan_complete {
            surface.put_centered(
                wave_bottom + 1,
                "SCAN COMPLETE · RESULTS EXCELLENT",
                faded_rgb((74, 222, 128), 0.9),
            );
        } else {
            surface.put_centered(
                wave_bottom + 1,
                "Press s to scan vitals",
                faded_rgb((216, 180, 254), 0.6),
            );
        }

        // Vitals row under the waveform.
        let [heart, oxygen, calm] = self.trend(ctx.cycle.phase, ctx.cycle.is_active);
        let stats = format!(
            "Heart {:>2} bpm {}   SpO2 {:>4.1} % {}   Calm {:>2} % {}",
            self.heart_rate as u32,
            heart,
            self.blood_oxygen,
            oxygen,
            self.calm_level as u32,
            calm,
        );
        surface.put_centered(wave_bottom + 3, &stats, Color::White);
    }
}
