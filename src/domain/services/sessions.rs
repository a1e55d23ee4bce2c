#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use chrono::DateTime;
use chrono::Local;
use chrono::SecondsFormat;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::models::Language;
use crate::domain::models::Role;
use crate::domain::models::Session;
use crate::domain::models::TutorTurn;

pub struct Sessions {
    pub sessions_dir: path::PathBuf,
}

impl Sessions {
    pub fn new(data_dir: &path::Path) -> Sessions {
        return Sessions {
            sessions_dir: data_dir.join("sessions"),
        };
    }

    fn get_file_path(&self, id: &str) -> path::PathBuf {
        return self.sessions_dir.join(format!("{id}.yaml"));
    }

    fn now() -> String {
        return Local::now().to_rfc3339_opts(SecondsFormat::Millis, false);
    }

    /// Returns all sessions, oldest first, with only the first user turn
    /// kept to save on memory.
    pub async fn list(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = vec![];
        if !self.sessions_dir.exists() {
            return Ok(sessions);
        }

        let mut dir = fs::read_dir(&self.sessions_dir).await?;
        while let Some(file) = dir.next_entry().await? {
            if file.path().extension().and_then(|e| return e.to_str()) != Some("yaml") {
                continue;
            }

            let payload = fs::read_to_string(file.path()).await?;
            let mut session: Session = serde_yaml::from_str(&payload)?;
            session.turns = session
                .turns
                .into_iter()
                .filter(|e| return e.role == Role::User)
                .take(1)
                .collect();

            sessions.push(session);
        }

        sessions.sort_by_cached_key(|session| {
            return DateTime::parse_from_rfc3339(&session.timestamp).ok();
        });

        return Ok(sessions);
    }

    /// The most recently updated session, with all of its turns.
    pub async fn latest(&self) -> Result<Option<Session>> {
        let sessions = self.list().await?;
        if let Some(session) = sessions.last() {
            return Ok(Some(self.load(&session.id).await?));
        }

        return Ok(None);
    }

    pub async fn load(&self, id: &str) -> Result<Session> {
        let file_path = self.get_file_path(id);
        if !file_path.exists() {
            bail!(format!("No session found for id {id}"));
        }

        let payload = fs::read_to_string(file_path).await?;
        let session: Session = serde_yaml::from_str(&payload)?;

        return Ok(session);
    }

    /// Appends a finalized turn to the session, creating the session on first
    /// use. A turn that was already archived is replaced in place.
    pub async fn append_turn(&self, id: &str, language: Language, turn: TutorTurn) -> Result<()> {
        let mut session = if self.get_file_path(id).exists() {
            self.load(id).await?
        } else {
            Session {
                id: id.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Sessions::now(),
                language,
                level: None,
                turns: vec![],
            }
        };

        if let Some(res) = turn.response() {
            session.level = Some(res.progress.overall_level.to_string());
        }

        if let Some(existing) = session.turns.iter_mut().find(|e| return e.id == turn.id) {
            *existing = turn;
        } else {
            session.turns.push(turn);
        }

        session.timestamp = Sessions::now();
        return self.save(&session).await;
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let payload = serde_yaml::to_string(session)?;

        if !self.sessions_dir.exists() {
            fs::create_dir_all(&self.sessions_dir).await?;
        }

        let mut file = fs::File::create(self.get_file_path(&session.id)).await?;
        file.write_all(payload.as_bytes()).await?;

        return Ok(());
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let file_path = self.get_file_path(id);
        if !file_path.exists() {
            return Ok(());
        }

        fs::remove_file(file_path).await?;
        return Ok(());
    }

    pub async fn delete_all(&self) -> Result<()> {
        if !self.sessions_dir.exists() {
            return Ok(());
        }

        fs::remove_dir_all(&self.sessions_dir).await?;
        return Ok(());
    }
}
