//! One step of a tween: interpolation of a set of slots over a frame range.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::animation::ease::Ease;
use crate::animation::guide::GuideSamples;
use crate::animation::property::{PropertyId, PropertyMask, PropertyValue, PropertyValues, Props};
use crate::foundation::error::{FlitterError, FlitterResult};

/// How a slot moves from its start value to its target.
#[derive(Clone, Debug, PartialEq)]
pub enum Interp {
    /// Numeric slots: eased linear interpolation.
    Lerp { from: f64, to: f64 },
    /// Everything else: `from` until the motion ends, then `to`.
    Step {
        from: PropertyValue,
        to: PropertyValue,
    },
}

/// A step of a tween starting at `start` and lasting `duration` frames.
///
/// `base` holds the values every slot had when the motion starts (the previous motion's end
/// values), so a seek can restore slots this motion does not animate. `mask` is cumulative:
/// it covers every slot animated by this motion or any earlier one.
#[derive(Clone, Debug)]
pub struct TweenMotion {
    start: f64,
    duration: f64,
    ease: Ease,
    props: SmallVec<[(PropertyId, Interp); 4]>,
    mask: PropertyMask,
    base: PropertyValues,
    guide: Option<Arc<GuideSamples>>,
}

impl TweenMotion {
    /// Chain a motion after one that ended with `base` values and animated `prev_mask`.
    pub fn chain(
        base: PropertyValues,
        prev_mask: PropertyMask,
        start: f64,
        duration: f64,
        targets: &Props,
        ease: Ease,
    ) -> FlitterResult<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(FlitterError::animation(format!(
                "motion duration must be finite and >= 0, got {duration}"
            )));
        }
        let mut props = SmallVec::new();
        for (id, to) in targets.entries() {
            if !to.fits(*id) {
                return Err(FlitterError::animation(format!(
                    "value {to:?} does not fit property '{}'",
                    id.as_str()
                )));
            }
            let from = base.get(*id).clone();
            let interp = match (id.is_numeric(), from.as_number(), to.as_number()) {
                (true, Some(from), Some(to)) => Interp::Lerp { from, to },
                _ => Interp::Step {
                    from,
                    to: to.clone(),
                },
            };
            props.push((*id, interp));
        }
        Ok(Self {
            start,
            duration,
            ease,
            props,
            mask: prev_mask | targets.mask(),
            base,
            guide: None,
        })
    }

    /// A motion that animates nothing for `duration` frames.
    pub fn hold(base: PropertyValues, prev_mask: PropertyMask, start: f64, duration: f64) -> Self {
        Self {
            start,
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            ease: Ease::Linear,
            props: SmallVec::new(),
            mask: prev_mask,
            base,
            guide: None,
        }
    }

    /// Move along precomputed guide samples. Claims `X`/`Y`, plus `Rotation` when oriented.
    pub fn with_guide(mut self, guide: Arc<GuideSamples>) -> Self {
        self.mask.insert(PropertyId::X);
        self.mask.insert(PropertyId::Y);
        if guide.oriented() {
            self.mask.insert(PropertyId::Rotation);
        }
        self.guide = Some(guide);
        self
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn ease(&self) -> Ease {
        self.ease
    }

    pub fn mask(&self) -> PropertyMask {
        self.mask
    }

    pub fn props(&self) -> &[(PropertyId, Interp)] {
        &self.props
    }

    pub fn base(&self) -> &PropertyValues {
        &self.base
    }

    pub fn guide(&self) -> Option<&Arc<GuideSamples>> {
        self.guide.as_ref()
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end()
    }

    /// Linear progress at `time`, clamped to `[0, 1]`. Zero-length motions jump to 1.
    pub fn ratio(&self, time: f64) -> f64 {
        if self.duration <= 0.0 {
            return if time >= self.start { 1.0 } else { 0.0 };
        }
        ((time - self.start) / self.duration).clamp(0.0, 1.0)
    }

    /// Write the values at `time` into `values` and return the slots written.
    ///
    /// On a seek every cumulative slot is first reset from `base`; otherwise step slots are
    /// only written at either end of the motion.
    pub fn interpolate(&self, time: f64, seek: bool, values: &mut PropertyValues) -> PropertyMask {
        let ratio = self.ratio(time);
        let eased = self.ease.apply(ratio);
        if seek {
            values.copy_from(&self.base, self.mask);
        }

        let mut written = PropertyMask::EMPTY;
        let mut rotation = self.base.number(PropertyId::Rotation);
        for (id, interp) in &self.props {
            match interp {
                Interp::Lerp { from, to } => {
                    let v = if ratio >= 1.0 {
                        *to
                    } else if ratio <= 0.0 {
                        *from
                    } else {
                        from + (to - from) * eased
                    };
                    if *id == PropertyId::Rotation {
                        rotation = v;
                    }
                    values.set(*id, PropertyValue::Number(v));
                    written.insert(*id);
                }
                Interp::Step { from, to } => {
                    if seek || ratio <= 0.0 || ratio >= 1.0 {
                        let v = if ratio >= 1.0 { to } else { from };
                        values.set(*id, v.clone());
                        written.insert(*id);
                    }
                }
            }
        }

        if let Some(guide) = &self.guide {
            let s = if ratio >= 1.0 {
                guide.last()
            } else {
                guide.sample(eased)
            };
            values.set(PropertyId::X, s.point.x.into());
            values.set(PropertyId::Y, s.point.y.into());
            written.insert(PropertyId::X);
            written.insert(PropertyId::Y);
            if guide.oriented() {
                values.set(PropertyId::Rotation, (rotation + s.angle).into());
                written.insert(PropertyId::Rotation);
            }
        }

        if seek { self.mask } else { written }
    }

    /// Every slot's value once this motion has finished.
    pub fn end_values(&self) -> PropertyValues {
        let mut out = self.base.clone();
        self.interpolate(self.end(), false, &mut out);
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/motion.rs"]
mod tests;
