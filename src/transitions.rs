//! Fade orchestration for the panel background.
//!
//! Every fade goes through the same admission check against the animation in
//! flight, updates the logical [`TransparencyState`] up front, and then either
//! writes the target alpha immediately or hands a ticketed [`Tween`] to the
//! engine. Completions come back through [`TransitionController::advance`] and
//! are dropped when their ticket has been superseded.

use std::time::Duration;

use crate::backend::{Shell, Theming};
use crate::config::SettingsProvider;
use crate::curve::TransitionCurve;
use crate::status::{AnimationState, TransparencyState};
use crate::tween::{BACKGROUND_ALPHA, Tween, Tweener};
use crate::types::{AnimationAction, AnimationDestination, FadeParams, FadeRequest, TweenTicket};

pub struct TransitionController<S, B> {
    settings: S,
    backend: B,
    tweener: Box<dyn Tweener>,
    status: TransparencyState,
    animation: AnimationState,
    transition: &'static TransitionCurve,
    generation: u64,
}

impl<S, B> TransitionController<S, B>
where
    S: SettingsProvider,
    B: Theming + Shell,
{
    pub fn new(settings: S, backend: B, tweener: Box<dyn Tweener>) -> Self {
        let transition = TransitionCurve::from_index_or_default(settings.transition_type());
        Self {
            settings,
            backend,
            tweener,
            status: TransparencyState::default(),
            animation: AnimationState::default(),
            transition,
            generation: 0,
        }
    }

    /// Releases the collaborators. Any tween still in flight is discarded.
    pub fn shutdown(self) -> (S, B) {
        if !self.animation.is_idle() {
            tracing::debug!(current = ?self.animation.current(), "dropping in-flight fade");
        }
        (self.settings, self.backend)
    }

    pub fn update_transition_type(&mut self) {
        self.transition = TransitionCurve::from_index_or_default(self.settings.transition_type());
        tracing::debug!(curve = self.transition.name, "transition type updated");
    }

    pub fn transparency(&self) -> &TransparencyState {
        &self.status
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn transition(&self) -> &'static TransitionCurve {
        self.transition
    }

    pub fn is_animating(&self) -> bool {
        self.tweener.is_active()
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Fades into the unmaximized alpha. Used when the overview closes.
    pub fn fade_to_minimum(&mut self, params: FadeParams) {
        if self.backend.overview_shown() {
            return;
        }
        let request = self.resolve(params);
        let Some(ticket) = self.admit(
            AnimationAction::FadingIn,
            AnimationDestination::Minimum,
            request.interruptible,
        ) else {
            return;
        };
        let easing = request.curve.engine_token(AnimationAction::FadingIn);

        self.status.set_transparent(true);
        self.status.set_blank(false);
        self.backend.set_panel_color();

        let target = self.backend.unmaximized_opacity();
        // Nothing to animate towards a zero target.
        if request.duration.is_zero() || target == 0 {
            self.apply_now(f64::from(target));
            self.finish_fade_in(ticket);
        } else {
            self.schedule(ticket, &request, easing, target);
        }
    }

    /// Fades into the maximized alpha.
    pub fn fade_to_maximum(&mut self, params: FadeParams) {
        if self.backend.overview_shown() {
            return;
        }
        let request = self.resolve(params);
        let Some(ticket) = self.admit(
            AnimationAction::FadingIn,
            AnimationDestination::Maximum,
            request.interruptible,
        ) else {
            return;
        };
        let easing = request.curve.engine_token(AnimationAction::FadingIn);

        self.status.set_transparent(false);
        self.status.set_blank(false);
        self.backend.set_panel_color();

        let target = self.backend.maximized_opacity();
        if request.duration.is_zero() {
            self.apply_now(f64::from(target));
            self.finish_fade_in(ticket);
        } else {
            self.schedule(ticket, &request, easing, target);
        }
    }

    /// Fades down to the unmaximized alpha once no window is maximized.
    pub fn fade_out(&mut self, params: FadeParams) {
        let request = self.resolve(params);
        let Some(ticket) = self.admit(
            AnimationAction::FadingOut,
            AnimationDestination::Minimum,
            request.interruptible,
        ) else {
            return;
        };
        let easing = request.curve.engine_token(AnimationAction::FadingOut);

        self.status.set_transparent(true);
        self.status.set_blank(false);

        // Corners can't be faded; switch them before the panel starts moving.
        if self.settings.hide_corners() {
            self.update_corner_alpha(Some(0));
        } else {
            self.update_corner_alpha(None);
        }
        self.backend.strip_panel_styling();

        let target = self.backend.unmaximized_opacity();
        if self.backend.overview_shown() {
            tracing::debug!("overview shown, fading out to blank instead");
            self.fade_to_blank(FadeParams::default().time(Duration::ZERO));
        } else if request.duration.is_zero() {
            self.apply_now(f64::from(target));
            self.finish_fade_out(ticket);
        } else {
            self.schedule(ticket, &request, easing, target);
        }
    }

    /// Fades the panel to fully invisible, for the overview and the lock screen.
    pub fn fade_to_blank(&mut self, params: FadeParams) {
        let request = self.resolve(params);
        let Some(ticket) = self.admit(
            AnimationAction::FadingOut,
            AnimationDestination::Blank,
            request.interruptible,
        ) else {
            return;
        };
        // Blank eases with the fade-in variant of the curve.
        let easing = request.curve.engine_token(AnimationAction::FadingIn);

        self.status.set_transparent(true);
        self.status.set_blank(true);

        self.update_corner_alpha(Some(0));

        if request.duration.is_zero() {
            self.apply_now(0.0);
            self.finish_fade_out(ticket);
        } else {
            self.schedule(ticket, &request, easing, 0);
        }
    }

    /// Steps the tween engine by `dt`, writes the frame to the panel and
    /// finalizes the owning fade on its last frame.
    pub fn advance(&mut self, dt: Duration) {
        let Some(frame) = self.tweener.advance(dt) else {
            return;
        };
        if frame.property == BACKGROUND_ALPHA {
            self.backend.set_background_alpha(frame.value);
        }
        if let Some(ticket) = frame.completed {
            self.complete(ticket);
        }
    }

    /// Finalizes the fade identified by `ticket`, unless a newer fade has
    /// taken over since it was issued.
    pub fn complete(&mut self, ticket: TweenTicket) {
        match ticket.action {
            AnimationAction::FadingIn => self.finish_fade_in(ticket),
            AnimationAction::FadingOut => self.finish_fade_out(ticket),
        }
    }

    fn resolve(&self, params: FadeParams) -> FadeRequest {
        FadeRequest {
            duration: params
                .time
                .unwrap_or_else(|| Duration::from_millis(self.settings.transition_speed())),
            curve: params.curve.unwrap_or(self.transition),
            interruptible: params.interruptible,
        }
    }

    fn admit(
        &mut self,
        action: AnimationAction,
        destination: AnimationDestination,
        interruptible: bool,
    ) -> Option<TweenTicket> {
        if !interruptible && self.animation.matches(action, destination) {
            tracing::trace!(?action, ?destination, "same fade already running");
            return None;
        }
        if let Some(previous) = self.animation.current() {
            tracing::debug!(?previous, ?action, ?destination, "fade superseded");
        }
        self.animation.begin(action, destination);
        self.generation += 1;
        Some(TweenTicket {
            action,
            destination,
            generation: self.generation,
        })
    }

    fn is_current(&self, ticket: TweenTicket) -> bool {
        ticket.generation == self.generation
            && self.animation.matches(ticket.action, ticket.destination)
    }

    /// Writes `alpha` straight to the panel. The engine must not keep
    /// stepping an older tween over it.
    fn apply_now(&mut self, alpha: f64) {
        self.tweener.cancel();
        self.backend.set_background_alpha(alpha);
    }

    fn schedule(&mut self, ticket: TweenTicket, request: &FadeRequest, easing: String, target: u8) {
        tracing::debug!(
            ?ticket,
            target,
            duration_ms = request.duration.as_millis() as u64,
            easing = %easing,
            "scheduling fade"
        );
        self.tweener.add_tween(Tween {
            property: BACKGROUND_ALPHA,
            from: self.backend.background_alpha(),
            to: f64::from(target),
            duration: request.duration,
            easing,
            ticket,
        });
    }

    fn finish_fade_in(&mut self, ticket: TweenTicket) {
        if !self.is_current(ticket) {
            tracing::debug!(?ticket, "ignoring stale fade-in completion");
            return;
        }
        if self.backend.overview_shown() {
            tracing::debug!("overview opened during fade-in, going blank");
            self.fade_to_blank(FadeParams::default());
            return;
        }

        if !self.settings.hide_corners() {
            self.update_corner_alpha(None);
        }
        if !self.settings.remove_panel_styling() {
            self.backend.reapply_panel_styling();
        }
        self.animation.finish();
    }

    fn finish_fade_out(&mut self, ticket: TweenTicket) {
        if !self.is_current(ticket) {
            tracing::debug!(?ticket, "ignoring stale fade-out completion");
            return;
        }
        self.backend.set_panel_color();
        self.animation.finish();
    }

    /// `None` tracks the opacity that matches the current transparency.
    fn update_corner_alpha(&mut self, alpha: Option<u8>) {
        let alpha = alpha.unwrap_or_else(|| {
            if self.status.is_transparent() {
                self.backend.unmaximized_opacity()
            } else {
                self.backend.maximized_opacity()
            }
        });
        self.backend.set_corner_color(alpha);
    }
}
