use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use crate::breathing::{BreathingPhase, CycleObserver};

/// Host text-to-speech commands probed in order of preference.
const SPEECH_COMMANDS: [&str; 3] = ["say", "espeak", "spd-say"];

/// Speaks a one-word cue at the start of every breathing phase by shelling
/// out to the first text-to-speech command found on the host.
///
/// Speech is fire-and-forget: it runs on its own and is never used to pace
/// the cycle. Spawn failures are swallowed so a broken speech setup cannot
/// take the session down.
pub(crate) struct VoiceGuidance {
    command: Option<PathBuf>,
    children: Vec<Child>,
}

impl VoiceGuidance {
    /// Probe the host for a speech command. `available()` reports whether
    /// one was found.
    pub(crate) fn new() -> Self {
        Self { command: find_speech_command(), children: Vec::new() }
    }

    pub(crate) fn available(&self) -> bool {
        self.command.is_some()
    }

    fn speak(&mut self, word: &str) {
        let Some(command) = &self.command else {
            return;
        };
        let spawned = Command::new(command)
            .arg(word)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Ok(child) = spawned {
            self.children.push(child);
        }
        // Reap children that have finished speaking.
        self.children.retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
    }
}

impl CycleObserver for VoiceGuidance {
    fn on_phase_change(&mut self, phase: BreathingPhase) {
        self.speak(phase.spoken_word());
    }
}

impl Drop for VoiceGuidance {
    fn drop(&mut self) {
        for child in &mut self.children {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn find_speech_command() -> Option<PathBuf> {
    find_speech_command_in(&env::var_os("PATH")?)
}

fn find_speech_command_in(path: &OsStr) -> Option<PathBuf> {
    for name in SPEECH_COMMANDS {
        for dir in env::split_paths(path) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_missing_command_is_silent() {
        let mut voice = VoiceGuidance { command: None, children: Vec::new() };
        assert!(!voice.available());
        voice.on_phase_change(BreathingPhase::Exhale);
        assert!(voice.children.is_empty());
    }

    #[test]
    fn test_probe_handles_empty_path() {
        assert!(find_speech_command_in(OsStr::new("")).is_none());
    }

    #[test]
    fn test_probe_prefers_earlier_commands() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::write(dir.path().join("espeak"), b"").expect("failed to write");
        let search = dir.path().as_os_str();
        assert_eq!(
            find_speech_command_in(search),
            Some(dir.path().join("espeak"))
        );

        // "say" comes first in the probe order once present.
        fs::write(dir.path().join("say"), b"").expect("failed to write");
        assert_eq!(find_speech_command_in(search), Some(dir.path().join("say")));
    }
}
