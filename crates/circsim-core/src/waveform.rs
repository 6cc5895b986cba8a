//! Waveform descriptors for independent sources.
//!
//! One shared type is used by both voltage and current sources, since the
//! time-domain shape and the device it drives are orthogonal concerns.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    /// Constant value.
    Dc(f64),
    /// `offset + amplitude * sin(2*pi*f*(t-delay)) * exp(-damping*(t-delay))`
    /// for `t >= delay`, else `offset`.
    Sine {
        offset: f64,
        amplitude: f64,
        frequency: f64,
        delay: f64,
        damping: f64,
    },
    /// SPICE-style trapezoidal pulse train.
    Pulse {
        v1: f64,
        v2: f64,
        td: f64,
        tr: f64,
        tf: f64,
        pw: f64,
        per: f64,
    },
    /// Two-stage exponential.
    Exp {
        v1: f64,
        v2: f64,
        td1: f64,
        tau1: f64,
        td2: f64,
        tau2: f64,
    },
    /// Piecewise-linear, strictly increasing in time.
    Pwl(Vec<(f64, f64)>),
    /// A phase-continuous sinusoid with no start-delay gating:
    /// `offset + amplitude * sin(2*pi*f*t + phase) * exp(-damping*t)` for
    /// all `t`. Used by the three-phase meta-device, whose three legs must
    /// already be 120 degrees apart at `t = 0` rather than held flat until
    /// a delay elapses.
    PhaseShiftedSine {
        offset: f64,
        amplitude: f64,
        frequency: f64,
        phase: f64,
        damping: f64,
    },
}

impl Waveform {
    pub fn sine(offset: f64, amplitude: f64, frequency: f64, delay: f64, damping: f64) -> Self {
        Waveform::Sine {
            offset,
            amplitude,
            frequency,
            delay,
            damping,
        }
    }

    pub fn phase_shifted_sine(offset: f64, amplitude: f64, frequency: f64, phase: f64) -> Self {
        Waveform::PhaseShiftedSine {
            offset,
            amplitude,
            frequency,
            phase,
            damping: 0.0,
        }
    }

    /// Defaults: `td=0, tr=tf=1e-9, pw=1e-6, per=2e-6`.
    pub fn pulse_default(v1: f64, v2: f64) -> Self {
        Waveform::Pulse {
            v1,
            v2,
            td: 0.0,
            tr: 1e-9,
            tf: 1e-9,
            pw: 1e-6,
            per: 2e-6,
        }
    }

    /// Construct a PWL waveform, validating that `t` is strictly increasing.
    pub fn pwl(points: Vec<(f64, f64)>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::Validation(
                "PWL waveform requires at least two (t, v) points".to_string(),
            ));
        }
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(Error::Validation(format!(
                    "PWL time values must be strictly increasing: {} followed by {}",
                    pair[0].0, pair[1].0
                )));
            }
        }
        Ok(Waveform::Pwl(points))
    }

    pub fn value(&self, t: f64) -> f64 {
        match self {
            Waveform::Dc(v) => *v,
            Waveform::Sine {
                offset,
                amplitude,
                frequency,
                delay,
                damping,
            } => {
                if t < *delay {
                    *offset
                } else {
                    let dt = t - delay;
                    offset + amplitude * (2.0 * std::f64::consts::PI * frequency * dt).sin() * (-damping * dt).exp()
                }
            }
            Waveform::Pulse {
                v1,
                v2,
                td,
                tr,
                tf,
                pw,
                per,
            } => pulse_value(*v1, *v2, *td, *tr, *tf, *pw, *per, t),
            Waveform::Exp {
                v1,
                v2,
                td1,
                tau1,
                td2,
                tau2,
            } => exp_value(*v1, *v2, *td1, *tau1, *td2, *tau2, t),
            Waveform::Pwl(points) => pwl_value(points, t),
            Waveform::PhaseShiftedSine {
                offset,
                amplitude,
                frequency,
                phase,
                damping,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * t + phase).sin() * (-damping * t).exp(),
        }
    }
}

fn pulse_value(v1: f64, v2: f64, td: f64, tr: f64, tf: f64, pw: f64, per: f64, t: f64) -> f64 {
    if t < td {
        return v1;
    }
    let tau = if per > 0.0 {
        (t - td).rem_euclid(per)
    } else {
        t - td
    };
    if tau < tr {
        if tr <= 0.0 { v2 } else { v1 + (v2 - v1) * (tau / tr) }
    } else if tau <= tr + pw {
        v2
    } else if tau <= tr + pw + tf {
        if tf <= 0.0 {
            v1
        } else {
            v2 + (v1 - v2) * ((tau - (tr + pw)) / tf)
        }
    } else {
        v1
    }
}

fn exp_value(v1: f64, v2: f64, td1: f64, tau1: f64, td2: f64, tau2: f64, t: f64) -> f64 {
    if t < td1 {
        return v1;
    }
    let rising = v1 + (v2 - v1) * (1.0 - (-(t - td1) / tau1).exp());
    if t < td2 {
        return rising;
    }
    rising + (v1 - v2) * (1.0 - (-(t - td2) / tau2).exp())
}

fn pwl_value(points: &[(f64, f64)], t: f64) -> f64 {
    if t <= points[0].0 {
        return points[0].1;
    }
    let last = points.len() - 1;
    if t >= points[last].0 {
        return points[last].1;
    }
    for pair in points.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t >= t0 && t <= t1 {
            let frac = (t - t0) / (t1 - t0);
            return v0 + (v1 - v0) * frac;
        }
    }
    points[last].1
}
