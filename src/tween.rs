use std::f64::consts::PI;
use std::time::Duration;

use crate::types::TweenTicket;

pub const BACKGROUND_ALPHA: &str = "background_alpha";

/// One interpolation of a panel property, tagged with the fade it belongs to.
#[derive(Clone, Debug)]
pub struct Tween {
    pub property: &'static str,
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub easing: String,
    pub ticket: TweenTicket,
}

/// Result of stepping a tween: the new property value and, on the final
/// frame, the ticket of the fade that just finished.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenFrame {
    pub property: &'static str,
    pub value: f64,
    pub completed: Option<TweenTicket>,
}

/// Time-stepped interpolation engine. Holds at most one tween; adding a new
/// one replaces whatever is in flight on the property.
pub trait Tweener {
    fn add_tween(&mut self, tween: Tween);
    fn advance(&mut self, dt: Duration) -> Option<TweenFrame>;
    fn is_active(&self) -> bool;
    /// Drops the in-flight tween without emitting a final frame.
    fn cancel(&mut self);
}

/// Picks the engine once, at startup. The shell engine honours the desktop's
/// animation preference; the core engine always animates.
pub fn select_tweener(force_animation: bool, animations_enabled: bool) -> Box<dyn Tweener> {
    if force_animation {
        tracing::debug!("using core tweener");
        Box::new(CoreTweener::default())
    } else {
        tracing::debug!(animations_enabled, "using shell tweener");
        Box::new(ShellTweener::new(animations_enabled))
    }
}

#[derive(Default)]
pub struct CoreTweener {
    slot: TweenSlot,
}

impl Tweener for CoreTweener {
    fn add_tween(&mut self, tween: Tween) {
        self.slot.retarget(tween);
    }

    fn advance(&mut self, dt: Duration) -> Option<TweenFrame> {
        self.slot.advance(dt)
    }

    fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    fn cancel(&mut self) {
        self.slot.cancel();
    }
}

pub struct ShellTweener {
    slot: TweenSlot,
    animations_enabled: bool,
}

impl ShellTweener {
    pub fn new(animations_enabled: bool) -> Self {
        Self {
            slot: TweenSlot::default(),
            animations_enabled,
        }
    }
}

impl Tweener for ShellTweener {
    fn add_tween(&mut self, mut tween: Tween) {
        if !self.animations_enabled {
            tween.duration = Duration::ZERO;
        }
        self.slot.retarget(tween);
    }

    fn advance(&mut self, dt: Duration) -> Option<TweenFrame> {
        self.slot.advance(dt)
    }

    fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    fn cancel(&mut self) {
        self.slot.cancel();
    }
}

struct ActiveTween {
    tween: Tween,
    easing: Easing,
    elapsed: Duration,
}

#[derive(Default)]
struct TweenSlot {
    active: Option<ActiveTween>,
}

impl TweenSlot {
    fn retarget(&mut self, tween: Tween) {
        let easing = Easing::parse(&tween.easing).unwrap_or_else(|| {
            tracing::warn!(token = %tween.easing, "unknown easing, using linear");
            Easing::LINEAR
        });
        if let Some(previous) = &self.active {
            tracing::debug!(
                property = tween.property,
                replaced = ?previous.tween.ticket,
                "retargeting in-flight tween"
            );
        }
        self.active = Some(ActiveTween {
            tween,
            easing,
            elapsed: Duration::ZERO,
        });
    }

    fn advance(&mut self, dt: Duration) -> Option<TweenFrame> {
        let active = self.active.as_mut()?;
        active.elapsed = active.elapsed.saturating_add(dt);
        if active.elapsed < active.tween.duration {
            let progress = active.elapsed.as_secs_f64() / active.tween.duration.as_secs_f64();
            let eased = active.easing.apply(progress);
            let tween = &active.tween;
            return Some(TweenFrame {
                property: tween.property,
                value: tween.from + (tween.to - tween.from) * eased,
                completed: None,
            });
        }

        let done = self.active.take()?;
        Some(TweenFrame {
            property: done.tween.property,
            value: done.tween.to,
            completed: Some(done.tween.ticket),
        })
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn cancel(&mut self) {
        if let Some(dropped) = self.active.take() {
            tracing::debug!(ticket = ?dropped.tween.ticket, "tween cancelled");
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Family {
    Linear,
    Sine,
    Quad,
    Cubic,
    Quart,
    Quint,
    Expo,
    Circ,
    Back,
    Elastic,
    Bounce,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Easing {
    family: Family,
    ease_in: bool,
}

impl Easing {
    const LINEAR: Easing = Easing {
        family: Family::Linear,
        ease_in: true,
    };

    /// Accepts `linear`, `easeIn<Family>` and `easeOut<Family>`.
    fn parse(token: &str) -> Option<Easing> {
        if token == "linear" {
            return Some(Self::LINEAR);
        }
        let (ease_in, name) = if let Some(name) = token.strip_prefix("easeIn") {
            (true, name)
        } else {
            (false, token.strip_prefix("easeOut")?)
        };
        let family = match name {
            "Sine" => Family::Sine,
            "Quad" => Family::Quad,
            "Cubic" => Family::Cubic,
            "Quart" => Family::Quart,
            "Quint" => Family::Quint,
            "Expo" => Family::Expo,
            "Circ" => Family::Circ,
            "Back" => Family::Back,
            "Elastic" => Family::Elastic,
            "Bounce" => Family::Bounce,
            _ => return None,
        };
        Some(Easing { family, ease_in })
    }

    fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if self.family == Family::Linear {
            return t;
        }
        if self.ease_in {
            ease_in(self.family, t)
        } else {
            1.0 - ease_in(self.family, 1.0 - t)
        }
    }
}

const BACK_OVERSHOOT: f64 = 1.70158;

fn ease_in(family: Family, t: f64) -> f64 {
    match family {
        Family::Linear => t,
        Family::Sine => 1.0 - (t * PI / 2.0).cos(),
        Family::Quad => t.powi(2),
        Family::Cubic => t.powi(3),
        Family::Quart => t.powi(4),
        Family::Quint => t.powi(5),
        Family::Expo => {
            if t <= 0.0 {
                0.0
            } else {
                2f64.powf(10.0 * (t - 1.0))
            }
        }
        Family::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
        Family::Back => (BACK_OVERSHOOT + 1.0) * t.powi(3) - BACK_OVERSHOOT * t.powi(2),
        Family::Elastic => {
            if t <= 0.0 || t >= 1.0 {
                t
            } else {
                -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * (2.0 * PI / 3.0)).sin()
            }
        }
        Family::Bounce => 1.0 - bounce_out(1.0 - t),
    }
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}
