use std::f64::consts::PI;

/// Easing functions used to map normalized motion progress.
///
/// Most curves map `0 -> 0` and `1 -> 1` and stay inside `[0, 1]`; `Back*` and `Elastic*`
/// overshoot on purpose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Linear interpolation.
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InSine,
    OutSine,
    InOutSine,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    /// Pulls back before starting.
    InBack,
    /// Overshoots the end, then settles.
    OutBack,
    InOutBack,
    InElastic,
    OutElastic,
    InOutElastic,
    InBounce,
    OutBounce,
    InOutBounce,
}

const BACK: f64 = 1.701_58;
const ELASTIC_PERIOD: f64 = 0.3;

impl Ease {
    pub const ALL: [Self; 31] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::InQuart,
        Self::OutQuart,
        Self::InOutQuart,
        Self::InQuint,
        Self::OutQuint,
        Self::InOutQuint,
        Self::InSine,
        Self::OutSine,
        Self::InOutSine,
        Self::InExpo,
        Self::OutExpo,
        Self::InOutExpo,
        Self::InCirc,
        Self::OutCirc,
        Self::InOutCirc,
        Self::InBack,
        Self::OutBack,
        Self::InOutBack,
        Self::InElastic,
        Self::OutElastic,
        Self::InOutElastic,
        Self::InBounce,
        Self::OutBounce,
        Self::InOutBounce,
    ];

    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t.powi(2),
            Self::OutQuad => out(t, |t| t.powi(2)),
            Self::InOutQuad => in_out(t, |t| t.powi(2)),
            Self::InCubic => t.powi(3),
            Self::OutCubic => out(t, |t| t.powi(3)),
            Self::InOutCubic => in_out(t, |t| t.powi(3)),
            Self::InQuart => t.powi(4),
            Self::OutQuart => out(t, |t| t.powi(4)),
            Self::InOutQuart => in_out(t, |t| t.powi(4)),
            Self::InQuint => t.powi(5),
            Self::OutQuint => out(t, |t| t.powi(5)),
            Self::InOutQuint => in_out(t, |t| t.powi(5)),
            Self::InSine => in_sine(t),
            Self::OutSine => out(t, in_sine),
            Self::InOutSine => in_out(t, in_sine),
            Self::InExpo => in_expo(t),
            Self::OutExpo => out(t, in_expo),
            Self::InOutExpo => in_out(t, in_expo),
            Self::InCirc => in_circ(t),
            Self::OutCirc => out(t, in_circ),
            Self::InOutCirc => in_out(t, in_circ),
            Self::InBack => in_back(t),
            Self::OutBack => out(t, in_back),
            Self::InOutBack => in_out(t, in_back),
            Self::InElastic => in_elastic(t),
            Self::OutElastic => out(t, in_elastic),
            Self::InOutElastic => in_out(t, in_elastic),
            Self::InBounce => out(t, out_bounce),
            Self::OutBounce => out_bounce(t),
            Self::InOutBounce => in_out(t, |t| out(t, out_bounce)),
        }
    }

    /// Look up an ease by its variant name (`"OutQuad"`), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| format!("{e:?}").eq_ignore_ascii_case(name))
    }
}

fn out(t: f64, f: impl Fn(f64) -> f64) -> f64 {
    1.0 - f(1.0 - t)
}

fn in_out(t: f64, f: impl Fn(f64) -> f64) -> f64 {
    if t < 0.5 {
        f(t * 2.0) * 0.5
    } else {
        1.0 - f((1.0 - t) * 2.0) * 0.5
    }
}

fn in_sine(t: f64) -> f64 {
    1.0 - (t * PI * 0.5).cos()
}

fn in_expo(t: f64) -> f64 {
    if t == 0.0 {
        0.0
    } else {
        2f64.powf(10.0 * (t - 1.0))
    }
}

fn in_circ(t: f64) -> f64 {
    1.0 - (1.0 - t * t).sqrt()
}

fn in_back(t: f64) -> f64 {
    t * t * ((BACK + 1.0) * t - BACK)
}

fn in_elastic(t: f64) -> f64 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let s = ELASTIC_PERIOD / 4.0;
    -(2f64.powf(10.0 * (t - 1.0)) * ((t - 1.0 - s) * 2.0 * PI / ELASTIC_PERIOD).sin())
}

fn out_bounce(t: f64) -> f64 {
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
        N * t * t + 0.984_375
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
