use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::trigger::{Direction, TriggerEventKind};

/// What a scroll-triggered timeline does on one trigger transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Play,
    Pause,
    Resume,
    Reverse,
    Restart,
    Reset,
    Complete,
    None,
}

impl ToggleAction {
    /// Equivalent action when motion is reduced: anything that would
    /// animate jumps straight to where the animation would end.
    pub fn settled(self) -> Self {
        match self {
            ToggleAction::Play | ToggleAction::Resume | ToggleAction::Restart => {
                ToggleAction::Complete
            }
            ToggleAction::Reverse => ToggleAction::Reset,
            other => other,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ToggleAction::Play => "play",
            ToggleAction::Pause => "pause",
            ToggleAction::Resume => "resume",
            ToggleAction::Reverse => "reverse",
            ToggleAction::Restart => "restart",
            ToggleAction::Reset => "reset",
            ToggleAction::Complete => "complete",
            ToggleAction::None => "none",
        }
    }
}

impl FromStr for ToggleAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "play" => ToggleAction::Play,
            "pause" => ToggleAction::Pause,
            "resume" => ToggleAction::Resume,
            "reverse" => ToggleAction::Reverse,
            "restart" => ToggleAction::Restart,
            "reset" => ToggleAction::Reset,
            "complete" => ToggleAction::Complete,
            "none" => ToggleAction::None,
            _ => return Err(ParseError::ToggleActions(s.to_string())),
        })
    }
}

/// Actions for the four transitions, written as
/// `"onEnter onLeave onEnterBack onLeaveBack"`, e.g.
/// `"play none none reverse"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToggleActions {
    pub on_enter: ToggleAction,
    pub on_leave: ToggleAction,
    pub on_enter_back: ToggleAction,
    pub on_leave_back: ToggleAction,
}

impl Default for ToggleActions {
    fn default() -> Self {
        Self {
            on_enter: ToggleAction::Play,
            on_leave: ToggleAction::None,
            on_enter_back: ToggleAction::None,
            on_leave_back: ToggleAction::None,
        }
    }
}

impl ToggleActions {
    pub fn action_for(&self, kind: TriggerEventKind) -> ToggleAction {
        match kind {
            TriggerEventKind::Enter(Direction::Forward) => self.on_enter,
            TriggerEventKind::Leave(Direction::Forward) => self.on_leave,
            TriggerEventKind::Enter(Direction::Backward) => self.on_enter_back,
            TriggerEventKind::Leave(Direction::Backward) => self.on_leave_back,
            TriggerEventKind::Progress(_) | TriggerEventKind::Detached => ToggleAction::None,
        }
    }
}

impl FromStr for ToggleActions {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::ToggleActions(s.to_string());
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [on_enter, on_leave, on_enter_back, on_leave_back] = parts.as_slice() else {
            return Err(bad());
        };
        let parse = |token: &str| token.parse::<ToggleAction>().map_err(|_| bad());
        Ok(Self {
            on_enter: parse(*on_enter)?,
            on_leave: parse(*on_leave)?,
            on_enter_back: parse(*on_enter_back)?,
            on_leave_back: parse(*on_leave_back)?,
        })
    }
}

impl TryFrom<String> for ToggleActions {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ToggleActions> for String {
    fn from(actions: ToggleActions) -> Self {
        actions.to_string()
    }
}

impl fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.on_enter.as_str(),
            self.on_leave.as_str(),
            self.on_enter_back.as_str(),
            self.on_leave_back.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_actions() {
        let actions: ToggleActions = "play none none reverse".parse().unwrap();
        assert_eq!(
            actions.action_for(TriggerEventKind::Enter(Direction::Forward)),
            ToggleAction::Play
        );
        assert_eq!(
            actions.action_for(TriggerEventKind::Leave(Direction::Backward)),
            ToggleAction::Reverse
        );
        assert_eq!(
            actions.action_for(TriggerEventKind::Progress(0.5)),
            ToggleAction::None
        );
        assert_eq!(actions.to_string(), "play none none reverse");
    }

    #[test]
    fn rejects_wrong_arity_and_unknown_words() {
        assert!("play none".parse::<ToggleActions>().is_err());
        assert!("play none none bounce".parse::<ToggleActions>().is_err());
    }

    #[test]
    fn reduced_motion_settles_actions() {
        assert_eq!(ToggleAction::Play.settled(), ToggleAction::Complete);
        assert_eq!(ToggleAction::Reverse.settled(), ToggleAction::Reset);
        assert_eq!(ToggleAction::Pause.settled(), ToggleAction::Pause);
    }
}
