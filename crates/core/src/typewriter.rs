//! Banner text that types a phrase, holds it, deletes it, then moves on to
//! the next phrase.

use scrollreel_protocol::{FrameCommand, SharedStr};

use crate::config::TypewriterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypewriterPhase {
    Typing,
    Pausing,
    Deleting,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    target: SharedStr,
    phrases: Vec<Vec<char>>,
    phrase: usize,
    shown: usize,
    phase: TypewriterPhase,
    /// Seconds accumulated toward the next step.
    elapsed: f64,
    type_step: f64,
    delete_step: f64,
    pause: f64,
}

impl Typewriter {
    pub fn new(
        target: impl Into<SharedStr>,
        phrases: impl IntoIterator<Item = impl AsRef<str>>,
        config: &TypewriterConfig,
    ) -> Self {
        Self {
            target: target.into(),
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().chars().collect())
                .collect(),
            phrase: 0,
            shown: 0,
            phase: TypewriterPhase::Typing,
            elapsed: 0.0,
            type_step: f64::from(config.type_ms) / 1000.0,
            delete_step: f64::from(config.delete_ms) / 1000.0,
            pause: f64::from(config.pause_ms) / 1000.0,
        }
    }

    pub fn phase(&self) -> TypewriterPhase {
        self.phase
    }

    pub fn text(&self) -> String {
        self.phrases
            .get(self.phrase)
            .map(|p| p[..self.shown].iter().collect())
            .unwrap_or_default()
    }

    fn current_len(&self) -> usize {
        self.phrases.get(self.phrase).map_or(0, Vec::len)
    }

    fn step_duration(&self) -> f64 {
        match self.phase {
            TypewriterPhase::Typing => self.type_step,
            TypewriterPhase::Pausing => self.pause,
            TypewriterPhase::Deleting => self.delete_step,
        }
    }

    /// Advance by `dt` seconds. Returns a text write when the visible text
    /// changed; several steps inside one long frame collapse into one write.
    pub fn advance(&mut self, dt: f64) -> Option<FrameCommand> {
        if self.phrases.is_empty() || dt <= 0.0 {
            return None;
        }
        let before = (self.phrase, self.shown);
        self.elapsed += dt;

        // Every phase has a non-zero step unless configured to zero, in which
        // case one step per call keeps the loop bounded.
        loop {
            let step = self.step_duration();
            if self.elapsed < step {
                break;
            }
            self.elapsed -= step;
            self.step();
            if step <= 0.0 {
                self.elapsed = 0.0;
                break;
            }
        }

        if (self.phrase, self.shown) == before {
            return None;
        }
        Some(FrameCommand::SetText {
            target: self.target.clone(),
            text: self.text().into(),
        })
    }

    fn step(&mut self) {
        match self.phase {
            TypewriterPhase::Typing => {
                if self.shown < self.current_len() {
                    self.shown += 1;
                }
                if self.shown >= self.current_len() {
                    self.phase = TypewriterPhase::Pausing;
                }
            }
            TypewriterPhase::Pausing => self.phase = TypewriterPhase::Deleting,
            TypewriterPhase::Deleting => {
                self.shown = self.shown.saturating_sub(1);
                if self.shown == 0 {
                    self.phrase = (self.phrase + 1) % self.phrases.len();
                    self.phase = TypewriterPhase::Typing;
                }
            }
        }
    }
}
