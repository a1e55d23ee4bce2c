use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Language;
use super::TutorTurn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub version: String,
    pub timestamp: String,
    pub language: Language,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub turns: Vec<TutorTurn>,
}

/// Cold-start state handed to a new session reconciler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSeed {
    pub session_id: String,
    pub language: Language,
    pub overall_level: Option<String>,
    pub turns: Vec<TutorTurn>,
}

impl From<Session> for SessionSeed {
    fn from(session: Session) -> SessionSeed {
        return SessionSeed {
            session_id: session.id,
            language: session.language,
            overall_level: session.level,
            turns: session.turns,
        };
    }
}
