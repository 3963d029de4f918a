//! Declarative page description: sections, their animations, and the
//! page-wide extras (progress bar, typewriter banner).
//!
//! Pages load from TOML or JSON; [`PageSpec::portfolio`] is the built-in
//! default.

use std::collections::HashSet;

use scrollreel_protocol::{Ease, Property, PropertyValues, SharedStr};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, OrchestratorError};
use crate::timeline::{Position, Step, ToggleAction, ToggleActions};
use crate::trigger::TriggerPoint;

/// Target written by the page-wide scroll progress bar.
pub const PROGRESS_BAR_TARGET: &str = "scroll-progress";
/// Cursor ring trailing the pointer.
pub const CURSOR_RING_TARGET: &str = "cursor.ring";
/// Cursor dot pinned to the pointer.
pub const CURSOR_DOT_TARGET: &str = "cursor.dot";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub sections: Vec<SectionSpec>,
    #[serde(default)]
    pub typewriter: Option<TypewriterSpec>,
    #[serde(default = "default_true")]
    pub progress_bar: bool,
    /// Custom cursor following pointer moves.
    #[serde(default = "default_true")]
    pub cursor: bool,
    #[serde(default)]
    pub tilt: Vec<TiltSpec>,
}

/// A card that leans towards the pointer while the pointer is over its
/// section, and eases back flat when it leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiltSpec {
    pub target: SharedStr,
    /// Section whose on-screen box is the hover area.
    pub section: SharedStr,
    /// Pointer pixels per degree of rotation.
    #[serde(default = "default_tilt_divisor")]
    pub divisor: f64,
    /// Tip the top edge towards the pointer instead of away from it.
    #[serde(default)]
    pub invert_x: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypewriterSpec {
    pub target: SharedStr,
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub id: SharedStr,
    pub label: SharedStr,
    /// Laid-out height in px.
    pub height: f64,
    #[serde(default)]
    pub entrance: Option<EntranceSpec>,
    #[serde(default)]
    pub scrubbed: Vec<ScrubSpec>,
}

/// Entrance sequence of a section. Without a trigger it plays as soon as
/// the section mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntranceSpec {
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub trigger: Option<ScrollTriggerSpec>,
    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollTriggerSpec {
    #[serde(default = "default_entrance_start")]
    pub start: TriggerPoint,
    #[serde(default = "default_entrance_end")]
    pub end: TriggerPoint,
    #[serde(default = "default_toggle_actions")]
    pub toggle_actions: ToggleActions,
}

impl Default for ScrollTriggerSpec {
    fn default() -> Self {
        Self {
            start: default_entrance_start(),
            end: default_entrance_end(),
            toggle_actions: default_toggle_actions(),
        }
    }
}

/// Timeline whose position follows scroll progress through the section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrubSpec {
    pub start: TriggerPoint,
    pub end: TriggerPoint,
    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub targets: Vec<SharedStr>,
    #[serde(default)]
    pub from: PropertyValues,
    #[serde(default)]
    pub to: PropertyValues,
    #[serde(default = "default_step_duration")]
    pub duration: f64,
    #[serde(default)]
    pub ease: Ease,
    #[serde(default)]
    pub stagger: f64,
    #[serde(default)]
    pub position: Position,
}

impl StepSpec {
    pub fn to_step(&self) -> Step {
        Step::many(self.targets.iter().cloned())
            .from(self.from.clone())
            .to(self.to.clone())
            .duration(self.duration)
            .ease(self.ease)
            .stagger(self.stagger)
            .at(self.position)
    }
}

impl PageSpec {
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let spec: Self = serde_json::from_str(contents)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let spec: Self = toml::from_str(contents)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn section(&self, id: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.id.as_str() == id)
    }

    /// Section ids must be unique and heights finite and positive. Tilt
    /// cards must hover over a listed section.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.sections.is_empty() {
            return Err(OrchestratorError::EmptyPage);
        }
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.id.clone()) {
                return Err(OrchestratorError::DuplicateSection(section.id.clone()));
            }
            if !section.height.is_finite() || section.height <= 0.0 {
                return Err(OrchestratorError::InvalidHeight {
                    id: section.id.clone(),
                    height: section.height,
                });
            }
        }
        for tilt in &self.tilt {
            if self.section(&tilt.section).is_none() {
                return Err(OrchestratorError::UnknownSection(tilt.section.clone()));
            }
            if !tilt.divisor.is_finite() || tilt.divisor <= 0.0 {
                return Err(OrchestratorError::InvalidTilt {
                    target: tilt.target.clone(),
                    divisor: tilt.divisor,
                });
            }
        }
        Ok(())
    }

    /// The default single-page portfolio.
    pub fn portfolio() -> Self {
        let hero = SectionSpec {
            id: "hero".into(),
            label: "Home".into(),
            height: 900.0,
            entrance: Some(EntranceSpec {
                delay: 0.5,
                trigger: None,
                steps: vec![
                    rise(&["hero.greeting"], 30.0, 0.8, ""),
                    rise_scaled(&["hero.name"], 50.0, 0.9, 1.0, "-=0.4", Ease::PowerOut(3)),
                    rise(&["hero.role"], 20.0, 0.6, "-=0.5"),
                    rise(&["hero.cta"], 30.0, 0.6, "-=0.3"),
                    staggered(
                        rise_scaled(
                            &["hero.social.0", "hero.social.1", "hero.social.2", "hero.social.3"],
                            20.0,
                            0.8,
                            0.4,
                            "-=0.3",
                            Ease::BackOut(1.7),
                        ),
                        0.1,
                    ),
                    StepSpec {
                        targets: vec!["hero.scroll-indicator".into()],
                        from: values(&[(Property::Opacity, 0.0)]),
                        to: values(&[(Property::Opacity, 1.0)]),
                        duration: 0.5,
                        ease: Ease::Linear,
                        stagger: 0.0,
                        position: position("-=0.2"),
                    },
                ],
            }),
            scrubbed: vec![hero_exit()],
        };

        let about = section(
            "about",
            "About",
            1200.0,
            vec![
                title("about"),
                StepSpec {
                    targets: vec!["about.card".into()],
                    from: values(&[
                        (Property::Opacity, 0.0),
                        (Property::X, -100.0),
                        (Property::RotateY, -30.0),
                    ]),
                    to: values(&[
                        (Property::Opacity, 1.0),
                        (Property::X, 0.0),
                        (Property::RotateY, 0.0),
                    ]),
                    duration: 1.0,
                    ease: Ease::PowerOut(3),
                    stagger: 0.0,
                    position: position("-=0.5"),
                },
                rise(&["about.text"], 30.0, 0.6, "-=0.6"),
                staggered(
                    rise_scaled(
                        &["about.fact.0", "about.fact.1", "about.fact.2", "about.fact.3"],
                        20.0,
                        0.9,
                        0.4,
                        "-=0.4",
                        Ease::BackOut(1.4),
                    ),
                    0.05,
                ),
            ],
        );

        let skills = section(
            "skills",
            "Skills",
            1300.0,
            vec![
                title("skills"),
                rise_scaled(&["skills.sphere"], 0.0, 0.5, 1.0, "-=0.5", Ease::PowerOut(3)),
                slide(&["skills.chart"], 50.0, 0.8, "-=0.6"),
                rise(&["skills.categories"], 30.0, 0.6, "-=0.4"),
            ],
        );

        let projects = section(
            "projects",
            "Projects",
            1100.0,
            vec![title("projects"), rise(&["projects.carousel"], 30.0, 0.8, "-=0.5")],
        );

        let mut dashboard_steps = vec![
            title("dashboard"),
            staggered(
                rise_scaled(
                    &["dashboard.stat.0", "dashboard.stat.1", "dashboard.stat.2", "dashboard.stat.3"],
                    30.0,
                    0.9,
                    0.5,
                    "-=0.4",
                    Ease::BackOut(1.4),
                ),
                0.1,
            ),
            staggered(
                rise(&["dashboard.chart.0", "dashboard.chart.1"], 40.0, 0.6, "-=0.3"),
                0.15,
            ),
        ];
        for (i, total) in [850.0, 452.0, 4.0, 45.0].into_iter().enumerate() {
            dashboard_steps.push(StepSpec {
                targets: vec![format!("dashboard.stat.{i}.value").into()],
                from: values(&[(Property::Value, 0.0)]),
                to: values(&[(Property::Value, total)]),
                duration: 2.0,
                ease: Ease::PowerOut(2),
                stagger: 0.0,
                position: Position::Absolute(0.0),
            });
        }
        let dashboard = section("dashboard", "Dashboard", 1400.0, dashboard_steps);

        let education = section(
            "education",
            "Education",
            1300.0,
            vec![
                title("education"),
                StepSpec {
                    targets: vec!["education.line".into()],
                    from: values(&[(Property::ScaleY, 0.0)]),
                    to: values(&[(Property::ScaleY, 1.0)]),
                    duration: 1.5,
                    ease: Ease::PowerOut(2),
                    stagger: 0.0,
                    position: position("-=0.4"),
                },
                staggered(
                    slide(&["education.item.0", "education.item.2"], -50.0, 0.6, "-=1"),
                    0.4,
                ),
                staggered(
                    slide(&["education.item.1", "education.item.3"], 50.0, 0.6, "<0.2"),
                    0.4,
                ),
            ],
        );

        let certifications = section(
            "certifications",
            "Certs",
            1200.0,
            vec![
                title("certifications"),
                StepSpec {
                    targets: vec![
                        "certifications.card.0".into(),
                        "certifications.card.1".into(),
                        "certifications.card.2".into(),
                    ],
                    from: values(&[
                        (Property::Opacity, 0.0),
                        (Property::Y, 40.0),
                        (Property::RotateY, -30.0),
                    ]),
                    to: values(&[
                        (Property::Opacity, 1.0),
                        (Property::Y, 0.0),
                        (Property::RotateY, 0.0),
                    ]),
                    duration: 0.8,
                    ease: Ease::PowerOut(3),
                    stagger: 0.2,
                    position: position("-=0.4"),
                },
                staggered(
                    pop(
                        &["certifications.award.0", "certifications.award.1", "certifications.award.2"],
                        0.5,
                        "-=0.4",
                        Ease::BackOut(1.7),
                    ),
                    0.1,
                ),
            ],
        );

        let blog = section(
            "blog",
            "Blog",
            1200.0,
            vec![
                title("blog"),
                rise(&["blog.filter"], 20.0, 0.5, "-=0.4"),
                staggered(
                    rise(&["blog.card.0", "blog.card.1", "blog.card.2"], 40.0, 0.6, "-=0.3"),
                    0.1,
                ),
            ],
        );

        let interests = section(
            "interests",
            "Interests",
            1100.0,
            vec![
                title("interests"),
                staggered(
                    rise_scaled(
                        &["interests.card.0", "interests.card.1", "interests.card.2", "interests.card.3"],
                        40.0,
                        0.9,
                        0.6,
                        "-=0.4",
                        Ease::BackOut(1.4),
                    ),
                    0.1,
                ),
            ],
        );

        let resume = section(
            "resume",
            "Resume",
            1000.0,
            vec![
                title("resume"),
                rise(&["resume.card"], 40.0, 0.8, "-=0.5"),
                staggered(
                    pop(
                        &["resume.highlight.0", "resume.highlight.1", "resume.highlight.2"],
                        0.5,
                        "-=0.4",
                        Ease::BackOut(1.7),
                    ),
                    0.1,
                ),
            ],
        );

        let contact = section(
            "contact",
            "Contact",
            1000.0,
            vec![
                title("contact"),
                slide(&["contact.form"], -50.0, 0.8, "-=0.5"),
                slide(&["contact.info"], 50.0, 0.8, "-=0.6"),
                staggered(
                    rise_scaled(
                        &["contact.social.0", "contact.social.1", "contact.social.2"],
                        20.0,
                        0.8,
                        0.4,
                        "-=0.4",
                        Ease::BackOut(1.7),
                    ),
                    0.1,
                ),
            ],
        );

        Self {
            sections: vec![
                hero,
                about,
                skills,
                projects,
                dashboard,
                education,
                certifications,
                blog,
                interests,
                resume,
                contact,
            ],
            typewriter: Some(TypewriterSpec {
                target: "hero.role.text".into(),
                phrases: [
                    "Full Stack Developer",
                    "UI/UX Enthusiast",
                    "Problem Solver",
                    "Tech Innovator",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            }),
            progress_bar: true,
            cursor: true,
            tilt: vec![
                TiltSpec {
                    target: "about.card.tilt".into(),
                    section: "about".into(),
                    divisor: 20.0,
                    invert_x: false,
                },
                TiltSpec {
                    target: "projects.card.tilt".into(),
                    section: "projects".into(),
                    divisor: 15.0,
                    invert_x: true,
                },
            ],
        }
    }
}

fn values(pairs: &[(Property, f64)]) -> PropertyValues {
    pairs.iter().copied().collect()
}

// Authoring strings in the built-in page are literals; an unparsable one
// falls back to "right after the previous step".
fn position(text: &str) -> Position {
    text.parse().unwrap_or_default()
}

fn targets(ids: &[&str]) -> Vec<SharedStr> {
    ids.iter().map(|&id| SharedStr::from(id)).collect()
}

fn section(id: &str, label: &str, height: f64, steps: Vec<StepSpec>) -> SectionSpec {
    SectionSpec {
        id: id.into(),
        label: label.into(),
        height,
        entrance: Some(EntranceSpec {
            delay: 0.0,
            trigger: Some(ScrollTriggerSpec::default()),
            steps,
        }),
        scrubbed: Vec::new(),
    }
}

fn title(section: &str) -> StepSpec {
    let id = format!("{section}.title");
    rise(&[id.as_str()], 50.0, 0.8, "")
}

/// Fade in while moving up from `dy` px below.
fn rise(ids: &[&str], dy: f64, duration: f64, at: &str) -> StepSpec {
    StepSpec {
        targets: targets(ids),
        from: values(&[(Property::Opacity, 0.0), (Property::Y, dy)]),
        to: values(&[(Property::Opacity, 1.0), (Property::Y, 0.0)]),
        duration,
        ease: Ease::PowerOut(3),
        stagger: 0.0,
        position: position(at),
    }
}

fn rise_scaled(
    ids: &[&str],
    dy: f64,
    scale: f64,
    duration: f64,
    at: &str,
    ease: Ease,
) -> StepSpec {
    let mut step = rise(ids, dy, duration, at);
    step.from.set(Property::Scale, scale);
    step.to.set(Property::Scale, 1.0);
    step.ease = ease;
    step
}

/// Fade in while sliding horizontally from `dx` px.
fn slide(ids: &[&str], dx: f64, duration: f64, at: &str) -> StepSpec {
    StepSpec {
        targets: targets(ids),
        from: values(&[(Property::Opacity, 0.0), (Property::X, dx)]),
        to: values(&[(Property::Opacity, 1.0), (Property::X, 0.0)]),
        duration,
        ease: Ease::PowerOut(3),
        stagger: 0.0,
        position: position(at),
    }
}

fn pop(ids: &[&str], duration: f64, at: &str, ease: Ease) -> StepSpec {
    StepSpec {
        targets: targets(ids),
        from: values(&[(Property::Opacity, 0.0), (Property::Scale, 0.8)]),
        to: values(&[(Property::Opacity, 1.0), (Property::Scale, 1.0)]),
        duration,
        ease,
        stagger: 0.0,
        position: position(at),
    }
}

fn staggered(mut step: StepSpec, stagger: f64) -> StepSpec {
    step.stagger = stagger;
    step
}

/// Hero fades out in the first two thirds of its exit while it grows and
/// lifts over the whole exit.
fn hero_exit() -> ScrubSpec {
    ScrubSpec {
        start: TriggerPoint::new(0.0, 0.0),
        end: TriggerPoint::new(1.0, 0.0),
        steps: vec![
            StepSpec {
                targets: vec!["hero.content".into()],
                from: values(&[(Property::Scale, 1.0), (Property::Y, 0.0)]),
                to: values(&[(Property::Scale, 1.2), (Property::Y, -100.0)]),
                duration: 1.0,
                ease: Ease::Linear,
                stagger: 0.0,
                position: Position::Absolute(0.0),
            },
            StepSpec {
                targets: vec!["hero.content".into()],
                from: values(&[(Property::Opacity, 1.0)]),
                to: values(&[(Property::Opacity, 0.0)]),
                duration: 2.0 / 3.0,
                ease: Ease::Linear,
                stagger: 0.0,
                position: Position::Absolute(0.0),
            },
        ],
    }
}

fn default_true() -> bool {
    true
}

fn default_tilt_divisor() -> f64 {
    20.0
}

fn default_step_duration() -> f64 {
    0.5
}

fn default_entrance_start() -> TriggerPoint {
    TriggerPoint::new(0.0, 0.8)
}

fn default_entrance_end() -> TriggerPoint {
    TriggerPoint::new(0.5, 0.5)
}

fn default_toggle_actions() -> ToggleActions {
    ToggleActions {
        on_enter: ToggleAction::Play,
        on_leave: ToggleAction::None,
        on_enter_back: ToggleAction::None,
        on_leave_back: ToggleAction::Reverse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_is_valid() {
        let page = PageSpec::portfolio();
        assert_eq!(page.validate(), Ok(()));
        assert_eq!(page.sections.len(), 11);
        assert_eq!(page.sections[0].id, "hero");
        assert_eq!(page.sections[10].id, "contact");
        assert!(page.section("dashboard").is_some());
    }

    #[test]
    fn portfolio_positions_parse() {
        let page = PageSpec::portfolio();
        let hero = page.section("hero").unwrap().entrance.as_ref().unwrap();
        assert_eq!(hero.steps[1].position, Position::Relative(-0.4));
        let education = page.section("education").unwrap().entrance.as_ref().unwrap();
        assert_eq!(education.steps[3].position, Position::WithPrevious(0.2));
    }

    #[test]
    fn validate_rejects_bad_pages() {
        let mut page = PageSpec::portfolio();
        page.sections[1].id = "hero".into();
        assert_eq!(
            page.validate(),
            Err(OrchestratorError::DuplicateSection("hero".into()))
        );

        let mut page = PageSpec::portfolio();
        page.sections[2].height = 0.0;
        assert!(matches!(
            page.validate(),
            Err(OrchestratorError::InvalidHeight { .. })
        ));

        let mut page = PageSpec::portfolio();
        page.tilt[0].section = "gallery".into();
        assert_eq!(
            page.validate(),
            Err(OrchestratorError::UnknownSection("gallery".into()))
        );

        let mut page = PageSpec::portfolio();
        page.tilt[1].divisor = 0.0;
        assert!(matches!(
            page.validate(),
            Err(OrchestratorError::InvalidTilt { .. })
        ));

        let empty = PageSpec {
            sections: Vec::new(),
            typewriter: None,
            progress_bar: false,
            cursor: false,
            tilt: Vec::new(),
        };
        assert_eq!(empty.validate(), Err(OrchestratorError::EmptyPage));
    }

    #[test]
    fn loads_minimal_toml_page() {
        let page = PageSpec::from_toml(
            r#"
            [[sections]]
            id = "intro"
            label = "Intro"
            height = 900.0

            [[sections]]
            id = "outro"
            label = "Outro"
            height = 700.0

            [sections.entrance]
            steps = [
                { targets = ["outro.title"], from = { opacity = 0.0 }, to = { opacity = 1.0 }, ease = "power3.out" },
            ]

            [sections.entrance.trigger]
            toggle_actions = "play none none reverse"
            "#,
        )
        .unwrap();
        assert!(page.progress_bar);
        assert!(page.cursor);
        assert!(page.tilt.is_empty());
        let outro = page.section("outro").unwrap().entrance.as_ref().unwrap();
        let trigger = outro.trigger.as_ref().unwrap();
        assert_eq!(trigger.start, TriggerPoint::new(0.0, 0.8));
        assert_eq!(outro.steps[0].ease, Ease::PowerOut(3));
        assert_eq!(outro.steps[0].duration, 0.5);
    }

    #[test]
    fn json_page_round_trips_through_serde() {
        let page = PageSpec::portfolio();
        let json = serde_json::to_string(&page).unwrap();
        let back = PageSpec::from_json(&json).unwrap();
        assert_eq!(back.sections.len(), page.sections.len());
        assert_eq!(back.typewriter, page.typewriter);
        assert_eq!(back.tilt, page.tilt);
    }

    #[test]
    fn json_page_with_duplicate_ids_is_rejected() {
        let json = r#"{"sections":[
            {"id":"a","label":"A","height":100.0},
            {"id":"a","label":"A","height":100.0}
        ]}"#;
        assert!(matches!(
            PageSpec::from_json(json),
            Err(ConfigError::Page(OrchestratorError::DuplicateSection(_)))
        ));
    }
}
