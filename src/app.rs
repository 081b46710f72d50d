use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Color;
use crossterm::terminal;
use strum::Display;
use unicode_width::UnicodeWidthStr;

use crate::breathing::BreathingCycle;
use crate::effects::{
    BiometricPanel, BreathingPulse, Effect, FrameContext, IntroLoader, SphereView, Starfield,
    ThemeParticleField,
};
use crate::render::Surface;
use crate::theme::ThemeContext;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Which foreground visualization is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ViewMode {
    Classic,
    Sphere,
    Biometrics,
}

/// Top-level application state: the cycle timer, the theme, and one
/// instance of every effect, updated and painted once per frame.
pub(crate) struct App {
    cycle: BreathingCycle,
    theme: ThemeContext,
    view: ViewMode,
    starfield: Starfield,
    field: ThemeParticleField,
    pulse: BreathingPulse,
    sphere: SphereView,
    biometrics: BiometricPanel,
    loader: Option<IntroLoader>,
    /// Transient status line with its remaining display time in seconds.
    notice: Option<(String, f32)>,
    frame_interval: Duration,
    /// Non-fatal problems surfaced after the terminal is restored.
    warnings: Vec<String>,
}

impl App {
    pub(crate) fn new(cycle: BreathingCycle, theme: ThemeContext, fps: u32, skip_intro: bool) -> Self {
        let mut rng = fastrand::Rng::new();
        let starfield = Starfield::new(&mut rng);
        let field = ThemeParticleField::new(theme.theme(), rng.fork());
        let pulse = BreathingPulse::new(rng.fork());
        let sphere = SphereView::new(&mut rng);
        let biometrics = BiometricPanel::new(rng.fork());
        Self {
            cycle,
            theme,
            view: ViewMode::Classic,
            starfield,
            field,
            pulse,
            sphere,
            biometrics,
            loader: (!skip_intro).then(IntroLoader::new),
            notice: None,
            frame_interval: Duration::from_secs(1) / fps.max(1),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Run the frame loop until the user quits.
    pub(crate) fn run(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        let start = Instant::now();
        let mut last_tick = Instant::now();
        let mut last_frame = Instant::now();
        let (width, height) = terminal::size()?;
        let mut surface = Surface::new(width, height);

        loop {
            let timeout = self.frame_interval.saturating_sub(last_frame.elapsed());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if !self.handle_key(key) {
                            return Ok(());
                        }
                    }
                    // Resizes are picked up when the frame queries the size.
                    _ => {}
                }
                continue;
            }

            let now = Instant::now();
            let delta = now.duration_since(last_frame);
            last_frame = now;
            self.tick_clock(now, &mut last_tick);

            let (width, height) = terminal::size()?;
            let ctx = FrameContext {
                cycle: self.cycle.snapshot(),
                theme: self.theme.theme(),
                elapsed: start.elapsed().as_secs_f32(),
                delta: delta.as_secs_f32(),
                width,
                height,
            };
            surface.resize(width, height);
            surface.clear();
            self.frame(&ctx, &mut surface);
            surface.present(out)?;
        }
    }

    /// Advance the 1 Hz cycle clock. The clock is held while the intro is
    /// on screen, so the first visible state is a fresh inhale and no
    /// spoken cues fire over the splash. One logical tick per elapsed
    /// second; a stalled frame loop drops the missed ticks instead of
    /// replaying them.
    fn tick_clock(&mut self, now: Instant, last_tick: &mut Instant) {
        if self.loader.is_some() {
            *last_tick = now;
            return;
        }
        if now.duration_since(*last_tick) >= TICK_INTERVAL {
            self.cycle.tick();
            *last_tick = now;
        }
    }

    /// Returns false when the application should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            _ => {}
        }
        if self.loader.is_some() {
            // Everything except quitting waits for the intro to finish.
            return true;
        }
        match key.code {
            KeyCode::Char(' ') => self.cycle.toggle_active(),
            KeyCode::Esc => self.cycle.reset(),
            KeyCode::Char('1') => self.view = ViewMode::Classic,
            KeyCode::Char('2') => self.view = ViewMode::Sphere,
            KeyCode::Char('3') => self.view = ViewMode::Biometrics,
            KeyCode::Char('t') => {
                let next = self.theme.theme().cycle();
                if let Err(error) = self.theme.set(next) {
                    self.warn(format!("theme not persisted: {error}"));
                }
                self.notice = Some((format!("{}: {}", next.label(), next.description()), 4.0));
            }
            KeyCode::Char('s') => {
                self.view = ViewMode::Biometrics;
                if !self.biometrics.scan_running() {
                    self.biometrics.start_scan();
                }
            }
            _ => {}
        }
        true
    }

    fn warn(&mut self, message: String) {
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    fn frame(&mut self, ctx: &FrameContext, surface: &mut Surface) {
        self.starfield.update(ctx);
        self.starfield.render(ctx, surface);

        if let Some(loader) = &mut self.loader {
            loader.update(ctx);
            loader.render(ctx, surface);
            if loader.take_completion() {
                self.loader = None;
            }
            return;
        }

        self.field.update(ctx);
        self.field.render(ctx, surface);

        let view: &mut dyn Effect = match self.view {
            ViewMode::Classic => &mut self.pulse,
            ViewMode::Sphere => &mut self.sphere,
            ViewMode::Biometrics => &mut self.biometrics,
        };
        view.update(ctx);
        view.render(ctx, surface);
        if self.biometrics.take_completion() {
            self.notice = Some(("Biometric scan complete".to_string(), 4.0));
        }

        self.chrome(ctx, surface);
    }

    /// Title, guidance text, and key help around the active view.
    fn chrome(&mut self, ctx: &FrameContext, surface: &mut Surface) {
        let theme = ctx.theme;
        surface.put_centered(1, "S E R E N I M", Color::Rgb { r: 216, g: 180, b: 254 });

        let corner = format!("{} {} · {}", theme.icon(), theme.label(), self.view);
        let corner_x = i32::from(ctx.width) - corner.width() as i32 - 2;
        surface.put_str(corner_x, 1, &corner, Color::Rgb { r: 160, g: 160, b: 180 });

        let guidance = if ctx.cycle.is_active {
            ctx.cycle.phase.instruction().to_string()
        } else {
            "Paused".to_string()
        };
        surface.put_centered(3, &guidance, Color::White);

        if ctx.cycle.completed_cycles > 0 {
            let cycles = format!("{} cycles completed", ctx.cycle.completed_cycles);
            surface.put_centered(4, &cycles, Color::Rgb { r: 160, g: 160, b: 180 });
        }

        if let Some((message, remaining)) = self.notice.take() {
            let remaining = remaining - ctx.delta;
            if remaining > 0.0 {
                surface.put_centered(5, &message, Color::Rgb { r: 74, g: 222, b: 128 });
                self.notice = Some((message, remaining));
            }
        }

        let bottom = i32::from(ctx.height) - 2;
        surface.put_centered(
            bottom,
            "space pause · esc reset · 1/2/3 view · t theme · s scan · q quit",
            Color::Rgb { r: 110, g: 110, b: 130 },
        );
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::breathing::BreathingPhase;
    use crate::theme::{Theme, ThemeStore};

    use super::*;

    fn app(skip_intro: bool) -> (App, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create temp dir");
        let store = ThemeStore::at(dir.path().join("theme.yaml"));
        let theme = ThemeContext::load(store);
        (App::new(BreathingCycle::new(), theme, 30, skip_intro), dir)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn finish_intro(app: &mut App) {
        let mut surface = Surface::new(80, 24);
        let mut elapsed = 0.0;
        while app.loader.is_some() && elapsed < 20.0 {
            let ctx = FrameContext {
                cycle: app.cycle.snapshot(),
                theme: app.theme.theme(),
                elapsed,
                delta: 1.0 / 30.0,
                width: 80,
                height: 24,
            };
            surface.clear();
            app.frame(&ctx, &mut surface);
            elapsed += 1.0 / 30.0;
        }
    }

    #[test]
    fn test_view_switching_keys() {
        let (mut app, _dir) = app(true);
        assert_eq!(app.view, ViewMode::Classic);
        app.handle_key(press(KeyCode::Char('2')));
        assert_eq!(app.view, ViewMode::Sphere);
        app.handle_key(press(KeyCode::Char('3')));
        assert_eq!(app.view, ViewMode::Biometrics);
        app.handle_key(press(KeyCode::Char('1')));
        assert_eq!(app.view, ViewMode::Classic);
    }

    #[test]
    fn test_space_toggles_and_esc_resets() {
        let (mut app, _dir) = app(true);
        app.handle_key(press(KeyCode::Char(' ')));
        assert!(!app.cycle.snapshot().is_active);
        app.handle_key(press(KeyCode::Esc));
        assert!(app.cycle.snapshot().is_active);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _dir) = app(true);
        assert!(!app.handle_key(press(KeyCode::Char('q'))));
        assert!(!app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.handle_key(press(KeyCode::Char('x'))));
    }

    #[test]
    fn test_theme_key_cycles_and_persists() {
        let (mut app, dir) = app(true);
        app.handle_key(press(KeyCode::Char('t')));
        assert_eq!(app.theme.theme(), Theme::Aurora);
        assert!(app.warnings().is_empty());

        let reloaded = ThemeStore::at(dir.path().join("theme.yaml"));
        assert_eq!(reloaded.load(), Theme::Aurora);
    }

    #[test]
    fn test_scan_key_switches_to_biometrics() {
        let (mut app, _dir) = app(true);
        app.handle_key(press(KeyCode::Char('s')));
        assert_eq!(app.view, ViewMode::Biometrics);
        assert!(app.biometrics.scan_running());
    }

    #[test]
    fn test_intro_swallows_keys_until_done() {
        let (mut app, _dir) = app(false);
        app.handle_key(press(KeyCode::Char(' ')));
        assert!(app.cycle.snapshot().is_active);
        assert!(app.handle_key(press(KeyCode::Char('2'))));
        assert_eq!(app.view, ViewMode::Classic);
        // Quit still works during the intro.
        assert!(!app.handle_key(press(KeyCode::Char('q'))));
    }

    #[test]
    fn test_intro_hands_off_after_completion() {
        let (mut app, _dir) = app(false);
        finish_intro(&mut app);
        assert!(app.loader.is_none());
    }

    #[test]
    fn test_cycle_holds_fresh_inhale_until_intro_hands_off() {
        let (mut app, _dir) = app(false);
        let start = Instant::now();
        let mut last_tick = start;

        // Seconds pass while the intro is up; the cycle must not move.
        for seconds in 1..=5 {
            app.tick_clock(start + Duration::from_secs(seconds), &mut last_tick);
        }
        let held = app.cycle.snapshot();
        assert_eq!(held.phase, BreathingPhase::Inhale);
        assert_eq!(held.countdown, 4);
        assert!(held.is_active);
        assert_eq!(held.completed_cycles, 0);

        // The first visible state after handoff is still a fresh inhale,
        // and the clock runs normally from there.
        finish_intro(&mut app);
        let handoff = app.cycle.snapshot();
        assert_eq!(handoff.phase, BreathingPhase::Inhale);
        assert_eq!(handoff.countdown, 4);
        app.tick_clock(last_tick + Duration::from_secs(2), &mut last_tick);
        assert_eq!(app.cycle.snapshot().countdown, 3);
    }
}
