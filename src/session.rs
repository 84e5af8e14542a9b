use crate::api::models::{SessionUser, UserKind};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KEY_USER_ID: &str = "usuarioId";
pub const KEY_USER_NAME: &str = "usuarioNome";
pub const KEY_USER_KIND: &str = "usuarioTipo";
pub const KEY_USER_OBJ: &str = "usuarioObj";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no data directory available")]
    NoDataDir,
    #[error("session io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored user is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn db_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("br", "serviflex", "ServiFlex")?;
    Some(proj.data_dir().join("session.sqlite"))
}

/// Persistent key-value store for the logged-in user. Holds at most the
/// four keys above; logging out wipes all of them.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open_default() -> Result<Self, SessionError> {
        let path = db_path().ok_or(SessionError::NoDataDir)?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self, SessionError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, SessionError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SessionError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let value = self
            .conn
            .query_row("SELECT value FROM session WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.conn.execute(
            r#"
            INSERT INTO session (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.conn.execute("DELETE FROM session", [])?;
        log::info!("session cleared");
        Ok(())
    }

    /// Writes id, name, kind and the full user object in one transaction.
    pub fn store_login(&mut self, user: &SessionUser) -> Result<(), SessionError> {
        let obj = serde_json::to_string(user)?;
        let tx = self.conn.transaction()?;
        for (key, value) in [
            (KEY_USER_ID, user.id.as_str()),
            (KEY_USER_KIND, user.tipo.as_str()),
            (KEY_USER_NAME, user.nome.as_str()),
            (KEY_USER_OBJ, obj.as_str()),
        ] {
            tx.execute(
                "INSERT INTO session (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;
        log::info!("stored session for user {} ({})", user.id, user.tipo.as_str());
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.get(KEY_USER_ID), Ok(Some(_)))
    }

    pub fn user_id(&self) -> Option<String> {
        self.get(KEY_USER_ID).ok().flatten()
    }

    pub fn user_name(&self) -> Option<String> {
        self.get(KEY_USER_NAME).ok().flatten()
    }

    pub fn user_kind(&self) -> UserKind {
        self.get(KEY_USER_KIND)
            .ok()
            .flatten()
            .map(|k| UserKind::from_tipo(&k))
            .unwrap_or(UserKind::Unknown)
    }

    pub fn user(&self) -> Result<Option<SessionUser>, SessionError> {
        match self.get(KEY_USER_OBJ)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Applies a successful profile edit to the stored name and user object.
    pub fn update_profile(
        &mut self,
        nome: &str,
        email: &str,
        imagem_url: Option<&str>,
    ) -> Result<SessionUser, SessionError> {
        let mut user = self.user()?.unwrap_or_else(|| SessionUser {
            id: self.user_id().unwrap_or_default(),
            nome: String::new(),
            email: String::new(),
            tipo: self.user_kind(),
            imagem_url: None,
            foto_url: None,
            estabelecimento_id: None,
            extra: Default::default(),
        });
        user.nome = nome.to_string();
        user.email = email.to_string();
        if let Some(url) = imagem_url {
            user.imagem_url = Some(url.to_string());
            user.foto_url = Some(url.to_string());
        }
        self.set(KEY_USER_NAME, nome)?;
        self.set(KEY_USER_OBJ, &serde_json::to_string(&user)?)?;
        Ok(user)
    }

    /// Marks the stored professional as linked after accepting an invitation.
    pub fn set_establishment(&mut self, establishment_id: &str) -> Result<(), SessionError> {
        if let Some(mut user) = self.user()? {
            user.estabelecimento_id = Some(establishment_id.to_string());
            self.set(KEY_USER_OBJ, &serde_json::to_string(&user)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(kind: &str) -> SessionUser {
        serde_json::from_value(json!({
            "id": "u1", "tipo": kind, "nome": "Ana", "email": "ana@ex.com"
        }))
        .unwrap()
    }

    #[test]
    fn login_stores_all_keys() {
        let mut store = SessionStore::open_in_memory().unwrap();
        assert!(!store.is_authenticated());
        store.store_login(&user("clientes")).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.user_id().as_deref(), Some("u1"));
        assert_eq!(store.user_name().as_deref(), Some("Ana"));
        assert_eq!(store.get(KEY_USER_KIND).unwrap().as_deref(), Some("clientes"));
        assert_eq!(store.user_kind(), UserKind::Client);
        assert_eq!(store.user().unwrap().unwrap().email, "ana@ex.com");
    }

    #[test]
    fn clear_removes_every_key() {
        let mut store = SessionStore::open_in_memory().unwrap();
        store.store_login(&user("profissionais")).unwrap();
        store.clear().unwrap();
        for key in [KEY_USER_ID, KEY_USER_NAME, KEY_USER_KIND, KEY_USER_OBJ] {
            assert_eq!(store.get(key).unwrap(), None);
        }
        assert!(!store.is_authenticated());
        assert_eq!(store.user_kind(), UserKind::Unknown);
        let route = crate::routes::guard(crate::routes::Route::MyAppointments, store.is_authenticated());
        assert_eq!(route, crate::routes::Route::Login);
    }

    #[test]
    fn session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("session.sqlite");
        {
            let mut store = SessionStore::open(&path).unwrap();
            store.store_login(&user("clientes")).unwrap();
        }
        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.user_id().as_deref(), Some("u1"));
    }

    #[test]
    fn profile_update_rewrites_name_and_object() {
        let mut store = SessionStore::open_in_memory().unwrap();
        store.store_login(&user("profissionais")).unwrap();
        let updated = store
            .update_profile("Ana Paula", "ap@ex.com", Some("http://img/ap.png"))
            .unwrap();
        assert_eq!(updated.photo(), Some("http://img/ap.png"));
        assert_eq!(store.user_name().as_deref(), Some("Ana Paula"));
        let stored = store.user().unwrap().unwrap();
        assert_eq!(stored.email, "ap@ex.com");
        assert_eq!(stored.foto_url.as_deref(), Some("http://img/ap.png"));
    }

    #[test]
    fn accepting_invitation_links_establishment() {
        let mut store = SessionStore::open_in_memory().unwrap();
        store.store_login(&user("profissionais")).unwrap();
        assert!(!store.user().unwrap().unwrap().has_establishment());
        store.set_establishment("e42").unwrap();
        let stored = store.user().unwrap().unwrap();
        assert_eq!(stored.estabelecimento_id.as_deref(), Some("e42"));
    }

    #[test]
    fn set_overwrites_existing_key() {
        let store = SessionStore::open_in_memory().unwrap();
        store.set("extra", "1").unwrap();
        store.set("extra", "2").unwrap();
        assert_eq!(store.get("extra").unwrap().as_deref(), Some("2"));
        assert_eq!(store.get("missing").unwrap(), None);
    }
}
