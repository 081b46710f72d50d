mod common;

// Individual effect modules
mod biometrics;
mod field;
mod loader;
mod pulse;
mod sphere;
mod starfield;

pub(crate) use biometrics::BiometricPanel;
pub(crate) use common::{Effect, FrameContext};
pub(crate) use field::ThemeParticleField;
pub(crate) use loader::IntroLoader;
pub(crate) use pulse::BreathingPulse;
pub(crate) use sphere::SphereView;
pub(crate) use starfield::Starfield;
