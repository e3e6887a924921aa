use serde::Serialize;

/// Canonical state category derived from a raw state code.
///
/// Used for filtering, grouping and stats only. Change detection always
/// compares raw codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateCategory {
    Available,
    InMission,
    InProgress,
    Pending,
    Completed,
    Error,
}

impl StateCategory {
    pub const ALL: [StateCategory; 6] = [
        StateCategory::Available,
        StateCategory::InMission,
        StateCategory::InProgress,
        StateCategory::Pending,
        StateCategory::Completed,
        StateCategory::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateCategory::Available => "available",
            StateCategory::InMission => "in-mission",
            StateCategory::InProgress => "in-progress",
            StateCategory::Pending => "pending",
            StateCategory::Completed => "completed",
            StateCategory::Error => "error",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }
}

/// Prefix token some services put in front of state codes ("ESTADO_EM_MISSAO").
const STATE_PREFIX: &str = "estado-";

/// Containment rules, most specific first. The first match wins, so
/// "in-progress" spellings must stay ahead of the broader "miss" rule.
const RULES: &[(&str, StateCategory)] = &[
    ("andamento", StateCategory::InProgress),
    ("in-progress", StateCategory::InProgress),
    ("dispon", StateCategory::Available),
    ("available", StateCategory::Available),
    ("exec", StateCategory::InMission),
    ("miss", StateCategory::InMission),
    ("pend", StateCategory::Pending),
    ("concl", StateCategory::Completed),
    ("complet", StateCategory::Completed),
    ("erro", StateCategory::Error),
    ("falha", StateCategory::Error),
    ("fail", StateCategory::Error),
];

/// A state code after canonicalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalState {
    /// Lower-cased code with separators unified to '-' and the prefix removed
    pub code: String,
    pub category: Option<StateCategory>,
}

impl CanonicalState {
    /// Category label, or the normalized code when uncategorized.
    pub fn label(&self) -> &str {
        match self.category {
            Some(category) => category.as_str(),
            None => &self.code,
        }
    }
}

/// Canonicalizes a raw state code.
///
/// "ESTADO_EM_MISSAO", "estado em missao" and "EM_MISSAO" all map to
/// `InMission`. Unknown codes keep their normalized form with no category.
pub fn canonicalize(raw: &str) -> CanonicalState {
    let unified: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .collect();

    let code = unified
        .strip_prefix(STATE_PREFIX)
        .map(str::to_string)
        .unwrap_or(unified);

    let category = RULES
        .iter()
        .find(|(pattern, _)| code.contains(pattern))
        .map(|(_, category)| *category);

    CanonicalState { code, category }
}
