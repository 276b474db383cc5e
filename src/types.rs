use serde::Serialize;
use std::time::Duration;

use crate::curve::TransitionCurve;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationAction {
    FadingOut,
    FadingIn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationDestination {
    Blank,
    Minimum,
    Maximum,
}

/// Issued for every admitted fade and carried by its tween, so a completion
/// can be checked against whatever is in flight when it arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TweenTicket {
    pub action: AnimationAction,
    pub destination: AnimationDestination,
    pub generation: u64,
}

/// Optional overrides for a single fade. Unset fields fall back to settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct FadeParams {
    pub time: Option<Duration>,
    pub curve: Option<&'static TransitionCurve>,
    pub interruptible: bool,
}

impl FadeParams {
    pub fn time(mut self, time: Duration) -> Self {
        self.time = Some(time);
        self
    }

    pub fn curve(mut self, curve: &'static TransitionCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn interruptible(mut self) -> Self {
        self.interruptible = true;
        self
    }
}

/// `FadeParams` with every default filled in.
#[derive(Clone, Copy, Debug)]
pub struct FadeRequest {
    pub duration: Duration,
    pub curve: &'static TransitionCurve,
    pub interruptible: bool,
}
