use anyhow::Result;

use crate::core::AppConfig;
use crate::scheduling::rules::normalize_email;
use crate::session::{Role, Session, SessionStore};

pub fn login(
    config: &AppConfig,
    email: Option<String>,
    role: Option<Role>,
    url: Option<String>,
) -> Result<()> {
    let store = SessionStore::new(config.session_path());

    if let Some(url) = url {
        match store.absorb_from_url(&url)? {
            Some(stripped) => println!("Stored session from URL, continue at {}", stripped),
            None => println!("No session parameter found in {}", url),
        }
        whoami(config);
        return Ok(());
    }

    let email = normalize_email(email.as_deref().unwrap_or_default());
    let session = match role {
        Some(role) => Session::new(&email, role),
        None => Session::for_email(&email),
    };
    store.save(&session)?;
    whoami(config);
    Ok(())
}

pub fn logout(config: &AppConfig) -> Result<()> {
    SessionStore::new(config.session_path()).clear()?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(config: &AppConfig) {
    let session = SessionStore::new(config.session_path()).load();
    let role = match session.role {
        Role::Admin => "admin",
        Role::User => "student",
    };
    println!("{} ({})", session.email, role);
}
