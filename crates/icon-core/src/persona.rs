//! Persona catalog: the simulated characters a visitor can talk to.
//!
//! Personas are static. Each one carries a display name, a role line, a per-action token
//! cost table and the voice the synthesizer should use. Ids are positions in the catalog.

use crate::error::{CoreError, CoreResult};
use icon_voice::VoicePreference;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into the persona catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonaId(pub usize);

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Costed actions a visitor can take in the chat panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Say something to the persona.
    Speak,
    /// Ask the persona to do something on the visitor's behalf.
    RequestAction,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Speak => "speak",
            ActionKind::RequestAction => "request_action",
        }
    }
}

fn default_speak_cost() -> u64 {
    10
}

fn default_request_action_cost() -> u64 {
    25
}

/// Token cost of each action for one persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTable {
    #[serde(default = "default_speak_cost")]
    pub speak: u64,
    #[serde(default = "default_request_action_cost")]
    pub request_action: u64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            speak: default_speak_cost(),
            request_action: default_request_action_cost(),
        }
    }
}

impl CostTable {
    pub fn cost(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Speak => self.speak,
            ActionKind::RequestAction => self.request_action,
        }
    }
}

/// Persona definition as written in configuration (no id; ids come from catalog order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSpec {
    pub display_name: String,
    pub role: String,
    #[serde(default)]
    pub costs: CostTable,
    #[serde(default)]
    pub voice: VoicePreference,
}

/// A selectable simulated character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: PersonaId,
    pub display_name: String,
    pub role: String,
    pub costs: CostTable,
    pub voice: VoicePreference,
}

impl Persona {
    pub fn cost(&self, kind: ActionKind) -> u64 {
        self.costs.cost(kind)
    }
}

/// Fixed, ordered set of personas.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    /// The studio's default line-up.
    pub fn builtin() -> Self {
        let personas = vec![
            Persona {
                id: PersonaId(0),
                display_name: "Mr. I Got Bars".to_string(),
                role: "Lyricist and host".to_string(),
                costs: CostTable::default(),
                voice: VoicePreference {
                    voice: "en-US-deep".to_string(),
                    rate: 1.0,
                    pitch: 0.9,
                },
            },
            Persona {
                id: PersonaId(1),
                display_name: "The Third Icon".to_string(),
                role: "Executive producer".to_string(),
                costs: CostTable::default(),
                voice: VoicePreference::named("en-US-warm"),
            },
            Persona {
                id: PersonaId(2),
                display_name: "Block Radio DJ".to_string(),
                role: "Radio host".to_string(),
                costs: CostTable::default(),
                voice: VoicePreference {
                    voice: "en-US-bright".to_string(),
                    rate: 1.1,
                    pitch: 1.0,
                },
            },
        ];
        Self { personas }
    }

    /// Build a catalog from configured specs. Rejects an empty list, blank names and
    /// zero-cost actions.
    pub fn from_specs(specs: Vec<PersonaSpec>) -> CoreResult<Self> {
        if specs.is_empty() {
            return Err(CoreError::Config("persona catalog is empty".to_string()));
        }
        let mut personas = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            if spec.display_name.trim().is_empty() {
                return Err(CoreError::Config(format!("persona {} has no display_name", index)));
            }
            if spec.costs.speak == 0 || spec.costs.request_action == 0 {
                return Err(CoreError::Config(format!(
                    "persona '{}' must have non-zero action costs",
                    spec.display_name
                )));
            }
            personas.push(Persona {
                id: PersonaId(index),
                display_name: spec.display_name,
                role: spec.role,
                costs: spec.costs,
                voice: spec.voice,
            });
        }
        Ok(Self { personas })
    }

    pub fn get(&self, id: PersonaId) -> Option<&Persona> {
        self.personas.get(id.0)
    }

    /// Case-insensitive lookup by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Persona> {
        let name = name.trim();
        self.personas
            .iter()
            .find(|p| p.display_name.eq_ignore_ascii_case(name))
    }

    /// First persona; the panel's initial selection.
    pub fn default_persona(&self) -> Option<&Persona> {
        self.personas.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_uses_default_costs() {
        let catalog = PersonaCatalog::builtin();
        assert_eq!(catalog.len(), 3);
        let bars = catalog.get(PersonaId(0)).unwrap();
        assert_eq!(bars.display_name, "Mr. I Got Bars");
        assert_eq!(bars.cost(ActionKind::Speak), 10);
        assert_eq!(bars.cost(ActionKind::RequestAction), 25);
    }

    #[test]
    fn find_by_name_ignores_case() {
        let catalog = PersonaCatalog::builtin();
        let dj = catalog.find_by_name("block radio dj").unwrap();
        assert_eq!(dj.id, PersonaId(2));
        assert!(catalog.find_by_name("nobody").is_none());
    }

    #[test]
    fn builtin_catalog_passes_config_validation() {
        let builtin = PersonaCatalog::builtin();
        let specs: Vec<PersonaSpec> = builtin
            .iter()
            .map(|p| PersonaSpec {
                display_name: p.display_name.clone(),
                role: p.role.clone(),
                costs: p.costs,
                voice: p.voice.clone(),
            })
            .collect();
        let rebuilt = PersonaCatalog::from_specs(specs).unwrap();
        assert_eq!(rebuilt.len(), 3);
        for (a, b) in builtin.iter().zip(rebuilt.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn from_specs_rejects_zero_cost() {
        let spec = PersonaSpec {
            display_name: "Freebie".to_string(),
            role: "none".to_string(),
            costs: CostTable {
                speak: 0,
                request_action: 25,
            },
            voice: VoicePreference::default(),
        };
        assert!(PersonaCatalog::from_specs(vec![spec]).is_err());
        assert!(PersonaCatalog::from_specs(Vec::new()).is_err());
    }

    #[test]
    fn cost_table_deserializes_with_defaults() {
        let costs: CostTable = toml::from_str("speak = 4").unwrap();
        assert_eq!(costs.speak, 4);
        assert_eq!(costs.request_action, 25);
    }
}
