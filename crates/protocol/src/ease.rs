use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_BACK_OVERSHOOT: f64 = 1.70158;

#[derive(Debug, Error, PartialEq)]
pub enum EaseParseError {
    #[error("unknown ease `{0}`")]
    Unknown(String),
    #[error("invalid ease parameter in `{0}`")]
    BadParameter(String),
}

/// Easing curve mapping linear progress `t ∈ [0, 1]` to eased progress.
///
/// Names follow the `family.direction(param)` convention used by page
/// authors, e.g. `"power3.out"`, `"back.out(1.7)"`, `"none"`. The `powerN`
/// families raise `t` to the `N + 1`th power.
///
/// Every curve maps `0 → 0` and `1 → 1` exactly; overshooting curves may
/// leave `[0, 1]` in between.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    #[default]
    Linear,
    PowerIn(u8),
    PowerOut(u8),
    PowerInOut(u8),
    BackOut(f64),
    ExpoOut,
    /// Exponential curve used for smooth scrolling:
    /// `min(1, 1.001 - 2^(-10t))`.
    Smooth,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Ease::Linear => t,
            Ease::PowerIn(n) => t.powi(i32::from(n) + 1),
            Ease::PowerOut(n) => 1.0 - (1.0 - t).powi(i32::from(n) + 1),
            Ease::PowerInOut(n) => {
                let exp = i32::from(n) + 1;
                if t < 0.5 {
                    (2.0 * t).powi(exp) / 2.0
                } else {
                    1.0 - (2.0 * (1.0 - t)).powi(exp) / 2.0
                }
            }
            Ease::BackOut(s) => {
                let u = t - 1.0;
                1.0 + (s + 1.0) * u * u * u + s * u * u
            }
            Ease::ExpoOut => 1.0 - 2f64.powf(-10.0 * t),
            Ease::Smooth => (1.001 - 2f64.powf(-10.0 * t)).min(1.0),
        }
    }
}

impl FromStr for Ease {
    type Err = EaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (head, param) = match s.find('(') {
            Some(open) => {
                let close = s
                    .rfind(')')
                    .filter(|&c| c > open)
                    .ok_or_else(|| EaseParseError::BadParameter(s.to_string()))?;
                let value: f64 = s[open + 1..close]
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| EaseParseError::BadParameter(s.to_string()))?;
                (&s[..open], Some(value))
            }
            None => (s, None),
        };

        let (family, direction) = head.split_once('.').unwrap_or((head, "out"));

        match (family, direction) {
            ("none" | "linear", _) => Ok(Ease::Linear),
            ("smooth", _) => Ok(Ease::Smooth),
            ("expo", "out") => Ok(Ease::ExpoOut),
            ("back", "out") => Ok(Ease::BackOut(param.unwrap_or(DEFAULT_BACK_OVERSHOOT))),
            (power, dir) if power.starts_with("power") => {
                let n: u8 = power["power".len()..]
                    .parse()
                    .ok()
                    .filter(|n| (1..=4).contains(n))
                    .ok_or_else(|| EaseParseError::Unknown(s.to_string()))?;
                match dir {
                    "in" => Ok(Ease::PowerIn(n)),
                    "out" => Ok(Ease::PowerOut(n)),
                    "inOut" => Ok(Ease::PowerInOut(n)),
                    _ => Err(EaseParseError::Unknown(s.to_string())),
                }
            }
            _ => Err(EaseParseError::Unknown(s.to_string())),
        }
    }
}

impl TryFrom<String> for Ease {
    type Error = EaseParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.to_string()
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Linear => write!(f, "none"),
            Ease::PowerIn(n) => write!(f, "power{n}.in"),
            Ease::PowerOut(n) => write!(f, "power{n}.out"),
            Ease::PowerInOut(n) => write!(f, "power{n}.inOut"),
            Ease::BackOut(s) => write!(f, "back.out({s})"),
            Ease::ExpoOut => write!(f, "expo.out"),
            Ease::Smooth => write!(f, "smooth"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 7] = [
        Ease::Linear,
        Ease::PowerIn(2),
        Ease::PowerOut(3),
        Ease::PowerInOut(2),
        Ease::BackOut(1.7),
        Ease::ExpoOut,
        Ease::Smooth,
    ];

    #[test]
    fn endpoints_are_exact() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease} at 0");
            assert_eq!(ease.apply(1.0), 1.0, "{ease} at 1");
        }
    }

    #[test]
    fn parses_page_author_names() {
        assert_eq!("power3.out".parse(), Ok(Ease::PowerOut(3)));
        assert_eq!("power2.inOut".parse(), Ok(Ease::PowerInOut(2)));
        assert_eq!("power4.in".parse(), Ok(Ease::PowerIn(4)));
        assert_eq!("power2".parse(), Ok(Ease::PowerOut(2)));
        assert_eq!("back.out(1.4)".parse(), Ok(Ease::BackOut(1.4)));
        assert_eq!("none".parse(), Ok(Ease::Linear));
        assert_eq!(
            "back.out".parse(),
            Ok(Ease::BackOut(DEFAULT_BACK_OVERSHOOT))
        );
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("power9.out".parse::<Ease>().is_err());
        assert!("bounce.out".parse::<Ease>().is_err());
        assert!(matches!(
            "back.out(x)".parse::<Ease>(),
            Err(EaseParseError::BadParameter(_))
        ));
    }

    #[test]
    fn rejects_non_finite_parameters() {
        for name in ["back.out(NaN)", "back.out(inf)", "back.out(-inf)"] {
            assert_eq!(
                name.parse::<Ease>(),
                Err(EaseParseError::BadParameter(name.to_string())),
                "{name}"
            );
        }
    }

    #[test]
    fn back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Ease::BackOut(1.7).apply(f64::from(i) / 100.0))
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&Ease::PowerOut(3)).unwrap();
        assert_eq!(json, "\"power3.out\"");
        let back: Ease = serde_json::from_str("\"back.out(1.7)\"").unwrap();
        assert_eq!(back, Ease::BackOut(1.7));
    }
}
