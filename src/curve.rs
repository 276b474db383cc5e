use crate::types::AnimationAction;

/// A named easing family. `index` is the value persisted in settings.
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionCurve {
    pub id: &'static str,
    pub name: &'static str,
    pub index: i32,
}

const LINEAR_ID: &str = "linear";

static CURVES: [TransitionCurve; 11] = [
    TransitionCurve { id: LINEAR_ID, name: "Linear", index: 1 },
    TransitionCurve { id: "Sine", name: "Sine", index: 2 },
    TransitionCurve { id: "Quad", name: "Quadratic", index: 3 },
    TransitionCurve { id: "Cubic", name: "Cubic", index: 4 },
    TransitionCurve { id: "Quart", name: "Quartic", index: 5 },
    TransitionCurve { id: "Quint", name: "Quintic", index: 6 },
    TransitionCurve { id: "Expo", name: "Exponential", index: 7 },
    TransitionCurve { id: "Circ", name: "Circle", index: 8 },
    TransitionCurve { id: "Back", name: "Back", index: 15 },
    TransitionCurve { id: "Elastic", name: "Elastic", index: 9 },
    TransitionCurve { id: "Bounce", name: "Bounce", index: 10 },
];

impl TransitionCurve {
    pub fn all() -> &'static [TransitionCurve] {
        &CURVES
    }

    pub fn linear() -> &'static TransitionCurve {
        &CURVES[0]
    }

    pub fn from_index(index: i32) -> Option<&'static TransitionCurve> {
        CURVES.iter().find(|curve| curve.index == index)
    }

    /// Unknown indices (stale or hand-edited settings) resolve to linear.
    pub fn from_index_or_default(index: i32) -> &'static TransitionCurve {
        match Self::from_index(index) {
            Some(curve) => curve,
            None => {
                tracing::warn!(index, "unknown transition type, falling back to linear");
                Self::linear()
            }
        }
    }

    pub fn is_linear(&self) -> bool {
        self.id == LINEAR_ID
    }

    /// Name understood by the tween engine. Linear has no in/out variants.
    pub fn engine_token(&self, direction: AnimationAction) -> String {
        if self.is_linear() {
            return LINEAR_ID.to_string();
        }
        let prefix = match direction {
            AnimationAction::FadingIn => "easeIn",
            AnimationAction::FadingOut => "easeOut",
        };
        format!("{prefix}{}", self.id)
    }
}
