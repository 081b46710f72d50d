use strum::Display;

// Constants for cycle timing
const INHALE_SECONDS: u32 = 4;
const HOLD_SECONDS: u32 = 2;
const EXHALE_SECONDS: u32 = 6;

/// One segment of the breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum BreathingPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathingPhase {
    /// Fixed duration of this phase in seconds.
    pub(crate) fn duration_seconds(self) -> u32 {
        match self {
            Self::Inhale => INHALE_SECONDS,
            Self::Hold => HOLD_SECONDS,
            Self::Exhale => EXHALE_SECONDS,
        }
    }

    /// The phase that follows this one in the cycle.
    pub(crate) fn next(self) -> Self {
        match self {
            Self::Inhale => Self::Hold,
            Self::Hold => Self::Exhale,
            Self::Exhale => Self::Inhale,
        }
    }

    /// Guidance text shown while this phase is running.
    pub(crate) fn instruction(self) -> &'static str {
        match self {
            Self::Inhale => "Inhale slowly",
            Self::Hold => "Hold",
            Self::Exhale => "Exhale slowly",
        }
    }

    /// Single word spoken by voice guidance on entering this phase.
    pub(crate) fn spoken_word(self) -> &'static str {
        match self {
            Self::Inhale => "Inhale",
            Self::Hold => "Hold",
            Self::Exhale => "Exhale",
        }
    }
}

/// Immutable view of the cycle state, taken once per frame by effects.
///
/// `version` changes on every mutation so consumers can detect updates
/// without holding a reference into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CycleSnapshot {
    pub(crate) phase: BreathingPhase,
    pub(crate) countdown: u32,
    pub(crate) is_active: bool,
    pub(crate) completed_cycles: u32,
    pub(crate) version: u64,
}

/// Callbacks fired synchronously whenever the phase or active flag changes.
pub(crate) trait CycleObserver {
    fn on_phase_change(&mut self, _phase: BreathingPhase) {}
    fn on_active_change(&mut self, _is_active: bool) {}
}

/// The breathing cycle timer.
///
/// Driven by one `tick()` per elapsed wall-clock second while active. The
/// countdown is 1-indexed: it runs from the phase duration down to 1, and the
/// tick that would reach 0 instead rolls straight into the next phase with
/// that phase's full duration. A countdown of 0 is therefore never
/// observable.
pub(crate) struct BreathingCycle {
    phase: BreathingPhase,
    countdown: u32,
    is_active: bool,
    completed_cycles: u32,
    version: u64,
    observers: Vec<Box<dyn CycleObserver>>,
}

impl BreathingCycle {
    pub(crate) fn new() -> Self {
        Self {
            phase: BreathingPhase::Inhale,
            countdown: INHALE_SECONDS,
            is_active: true,
            completed_cycles: 0,
            version: 0,
            observers: Vec::new(),
        }
    }

    /// Register an observer for phase/active changes. Observers live as long
    /// as the controller; they are dropped with it on teardown.
    pub(crate) fn subscribe(&mut self, observer: Box<dyn CycleObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            phase: self.phase,
            countdown: self.countdown,
            is_active: self.is_active,
            completed_cycles: self.completed_cycles,
            version: self.version,
        }
    }

    /// Advance the timer by one second. Has no effect while paused.
    pub(crate) fn tick(&mut self) {
        if !self.is_active {
            return;
        }
        if self.countdown > 1 {
            self.countdown -= 1;
            self.version += 1;
            return;
        }
        // Last second of the phase: roll over immediately so the displayed
        // countdown never reaches 0.
        if self.phase == BreathingPhase::Exhale {
            self.completed_cycles += 1;
        }
        self.phase = self.phase.next();
        self.countdown = self.phase.duration_seconds();
        self.version += 1;
        let phase = self.phase;
        for observer in &mut self.observers {
            observer.on_phase_change(phase);
        }
    }

    /// Pause or resume. Pausing freezes phase and countdown in place;
    /// resuming continues from the same point.
    pub(crate) fn toggle_active(&mut self) {
        self.is_active = !self.is_active;
        self.version += 1;
        let is_active = self.is_active;
        for observer in &mut self.observers {
            observer.on_active_change(is_active);
        }
    }

    /// Return to the initial state regardless of where the cycle is.
    pub(crate) fn reset(&mut self) {
        let phase_changed = self.phase != BreathingPhase::Inhale;
        let active_changed = !self.is_active;
        self.phase = BreathingPhase::Inhale;
        self.countdown = INHALE_SECONDS;
        self.is_active = true;
        self.completed_cycles = 0;
        self.version += 1;
        if phase_changed {
            for observer in &mut self.observers {
                observer.on_phase_change(BreathingPhase::Inhale);
            }
        }
        if active_changed {
            for observer in &mut self.observers {
                observer.on_active_change(true);
            }
        }
    }
}
