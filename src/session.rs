//! Client-held session hint: `{email, role}` stored as JSON.
//!
//! Nothing here is a security boundary. A missing or garbled blob
//! degrades to a student session with the placeholder email.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scheduling::rules::is_admin_email;

pub const PLACEHOLDER_EMAIL: &str = "student@lynxhealth.local";
pub const SESSION_FILE_NAME: &str = "session.json";
pub const SESSION_QUERY_PARAM: &str = "session";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub role: Role,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            email: PLACEHOLDER_EMAIL.to_string(),
            role: Role::User,
        }
    }
}

impl Session {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            email: email.trim().to_string(),
            role,
        }
    }

    /// Role picked from the email shape when the caller does not say.
    pub fn for_email(email: &str) -> Self {
        let role = if is_admin_email(email) {
            Role::Admin
        } else {
            Role::User
        };
        Self::new(email, role)
    }

    /// Read a stored blob. Never fails.
    pub fn from_stored(raw: Option<&str>) -> Self {
        let Some(value) = raw.and_then(|raw| serde_json::from_str::<Value>(raw).ok()) else {
            return Self::default();
        };

        let email = value
            .get("email")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .unwrap_or(PLACEHOLDER_EMAIL);
        let role = match value.get("role").and_then(Value::as_str) {
            Some("admin") => Role::Admin,
            _ => Role::User,
        };

        Self {
            email: email.to_string(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Persists the raw session blob in a single file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(storage_path: impl AsRef<Path>) -> Self {
        Self {
            path: storage_path.as_ref().join(SESSION_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Session {
        let raw = fs::read_to_string(&self.path).ok();
        Session::from_stored(raw.as_deref())
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        self.save_raw(&serde_json::to_string(session)?)
    }

    fn save_raw(&self, raw: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, raw)?;
        tracing::debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Take a `session` query parameter off `url`.
    ///
    /// The first decoded value is stored as-is and the URL is returned
    /// without any `session` parameter. Returns `None` when there was
    /// nothing to take.
    pub fn absorb_from_url(&self, url: &str) -> Result<Option<String>> {
        let mut url = Url::parse(url)?;

        let Some(raw) = url
            .query_pairs()
            .find(|(name, _)| name == SESSION_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
        else {
            return Ok(None);
        };
        self.save_raw(&raw)?;

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| name != SESSION_QUERY_PARAM)
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        Ok(Some(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_malformed_sessions() {
        let cases = [
            None,
            Some(""),
            Some("not json"),
            Some("[]"),
            Some("{}"),
            Some(r#"{"email": 42, "role": "admin"}"#),
            Some(r#"{"email": "   ", "role": "user"}"#),
        ];
        for raw in cases {
            let session = Session::from_stored(raw);
            assert_eq!(session.email, PLACEHOLDER_EMAIL, "{:?}", raw);
        }
        assert_eq!(Session::from_stored(Some("not json")).role, Role::User);
    }

    #[test]
    fn it_reads_a_stored_session() {
        let session = Session::from_stored(Some(r#"{"email":"nurse@admin.edu","role":"admin"}"#));
        assert_eq!(session.email, "nurse@admin.edu");
        assert!(session.is_admin());

        let session = Session::from_stored(Some(r#"{"email":"a@b.edu","role":"superuser"}"#));
        assert_eq!(session.role, Role::User);
    }

    #[test]
    fn it_picks_the_role_from_the_email() {
        assert!(Session::for_email("Nurse@Admin.edu").is_admin());
        assert!(!Session::for_email("kim@school.edu").is_admin());
    }

    #[test]
    fn it_saves_loads_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.load(), Session::default());

        let session = Session::new("kim@school.edu", Role::User);
        store.save(&session).unwrap();
        assert_eq!(store.load(), session);

        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn it_absorbs_the_session_query_param() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let blob = r#"{"email":"nurse@admin.edu","role":"admin"}"#;
        let mut url = Url::parse("http://localhost:5173/admin?tab=week#grid").unwrap();
        url.query_pairs_mut().append_pair("session", blob);

        let stripped = store.absorb_from_url(url.as_str()).unwrap();
        assert_eq!(
            stripped.as_deref(),
            Some("http://localhost:5173/admin?tab=week#grid")
        );
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), blob);
        assert!(store.load().is_admin());
    }

    #[test]
    fn it_ignores_urls_without_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.absorb_from_url("http://localhost/?tab=1").unwrap(), None);
        assert_eq!(store.absorb_from_url("http://localhost/").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn it_decodes_plus_as_space() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let url = "http://localhost/?session=%7B%22email%22%3A+%22kim%40school.edu%22%7D";

        let stripped = store.absorb_from_url(url).unwrap();

        assert_eq!(stripped.as_deref(), Some("http://localhost/"));
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            r#"{"email": "kim@school.edu"}"#
        );
        assert_eq!(store.load().email, "kim@school.edu");
    }

    #[test]
    fn it_keeps_the_first_of_repeated_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let url = concat!(
            "http://localhost/admin?session=%7B%22email%22%3A%22a%40admin.edu%22%2C%22role%22%3A%22admin%22%7D",
            "&tab=week&session=%7B%7D"
        );

        let stripped = store.absorb_from_url(url).unwrap();

        assert_eq!(stripped.as_deref(), Some("http://localhost/admin?tab=week"));
        let session = store.load();
        assert_eq!(session.email, "a@admin.edu");
        assert!(session.is_admin());
    }

    #[test]
    fn it_rejects_unparsable_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.absorb_from_url("not a url?session=x").is_err());
        assert!(!store.path().exists());
    }
}
