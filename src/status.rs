use crate::types::{AnimationAction, AnimationDestination};

/// Where the panel is meant to be, regardless of any running animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransparencyState {
    transparent: bool,
    blank: bool,
}

impl TransparencyState {
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn is_blank(&self) -> bool {
        self.blank
    }

    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    pub fn set_blank(&mut self, blank: bool) {
        self.blank = blank;
    }
}

/// The fade currently in flight, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationState {
    current: Option<(AnimationAction, AnimationDestination)>,
}

impl AnimationState {
    pub fn current(&self) -> Option<(AnimationAction, AnimationDestination)> {
        self.current
    }

    pub fn begin(&mut self, action: AnimationAction, destination: AnimationDestination) {
        self.current = Some((action, destination));
    }

    pub fn finish(&mut self) {
        self.current = None;
    }

    pub fn matches(&self, action: AnimationAction, destination: AnimationDestination) -> bool {
        self.current == Some((action, destination))
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }
}
