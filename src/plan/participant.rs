use serde::{Deserialize, Serialize};
use std::fmt;

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role a participant holds in a plan. Carried for display; the engine
/// never branches on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(alias = "Organizador")]
    Organizer,
    #[serde(alias = "Fotógrafo")]
    Photographer,
    #[serde(alias = "Pagafantas")]
    Treasurer,
    #[serde(alias = "Invitado")]
    Guest,
    #[default]
    #[serde(alias = "Asistente")]
    Attendee,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Organizer => "Organizer",
            Role::Photographer => "Photographer",
            Role::Treasurer => "Treasurer",
            Role::Guest => "Guest",
            Role::Attendee => "Attendee",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
}

impl Participant {
    pub fn new(id: &str, display_name: &str, role: Role) -> Self {
        Self {
            participant_id: ParticipantId::new(id),
            display_name: display_name.to_string(),
            role,
        }
    }
}

/// Group nickname first, then account name, then e-mail.
pub fn resolve_display_name(nickname: Option<&str>, name: Option<&str>, email: Option<&str>) -> String {
    [nickname, name, email]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}
