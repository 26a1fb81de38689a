//! Typed view over the preference store for the local user's own profile

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::store::{PreferenceStore, Result};

const PROFILE_PREFIX: &str = "profile.";
const KEY_NAME: &str = "profile.name";
const KEY_EMAIL: &str = "profile.email";
const KEY_PROFESSION: &str = "profile.profession";
const KEY_ABOUT: &str = "profile.about";
const KEY_SIGNED_IN: &str = "profile.signed_in";

/// The signed-in user's own profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub profession: String,
    pub about: String,
    pub signed_in: bool,
}

/// Reads and writes a [`Profile`] as individual `profile.*` preference keys
#[derive(Debug, Clone)]
pub struct ProfileDefaults {
    store: Arc<PreferenceStore>,
}

impl ProfileDefaults {
    pub fn new(store: Arc<PreferenceStore>) -> Self {
        Self { store }
    }

    /// Load the profile; missing keys fall back to empty values
    pub fn load(&self) -> Result<Profile> {
        Ok(Profile {
            name: self.store.get(KEY_NAME)?.unwrap_or_default(),
            email: self.store.get(KEY_EMAIL)?.unwrap_or_default(),
            profession: self.store.get(KEY_PROFESSION)?.unwrap_or_default(),
            about: self.store.get(KEY_ABOUT)?.unwrap_or_default(),
            signed_in: self.store.get(KEY_SIGNED_IN)?.unwrap_or(false),
        })
    }

    /// Write every profile key in a single file replacement
    pub async fn save(&self, profile: &Profile) -> Result<()> {
        let entries = [
            (KEY_NAME, Value::from(profile.name.as_str())),
            (KEY_EMAIL, Value::from(profile.email.as_str())),
            (KEY_PROFESSION, Value::from(profile.profession.as_str())),
            (KEY_ABOUT, Value::from(profile.about.as_str())),
            (KEY_SIGNED_IN, Value::from(profile.signed_in)),
        ];
        self.store
            .set_many(entries.map(|(key, value)| (key.to_string(), value)))
            .await?;
        debug!("Saved profile for {}", profile.email);
        Ok(())
    }

    /// Remove every `profile.*` key, leaving other preferences alone
    pub async fn reset(&self) -> Result<()> {
        let removed = self
            .store
            .remove_where(|key| key.starts_with(PROFILE_PREFIX))
            .await?;
        debug!("Reset profile ({} keys removed)", removed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ann() -> Profile {
        Profile {
            name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            profession: "Eng".to_string(),
            about: "bio".to_string(),
            signed_in: true,
        }
    }

    #[tokio::test]
    async fn test_load_empty_profile() {
        let dir = tempdir().unwrap();
        let store = Arc::new(PreferenceStore::open(dir.path().join("prefs.json")).await.unwrap());
        let profile = ProfileDefaults::new(store).load().unwrap();
        assert_eq!(profile, Profile::default());
    }

    #[tokio::test]
    async fn test_save_and_reload_profile() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = Arc::new(PreferenceStore::open(&path).await.unwrap());
        ProfileDefaults::new(store).save(&ann()).await.unwrap();

        let reopened = Arc::new(PreferenceStore::open(&path).await.unwrap());
        assert_eq!(ProfileDefaults::new(reopened).load().unwrap(), ann());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_profile() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let store = Arc::new(PreferenceStore::open(&path).await.unwrap());
        let defaults = ProfileDefaults::new(store);
        defaults.save(&ann()).await.unwrap();

        std::fs::create_dir(dir.path().join("prefs.tmp")).unwrap();
        let bo = Profile {
            name: "Bo".to_string(),
            email: "b@x.com".to_string(),
            profession: "PM".to_string(),
            about: "bio2".to_string(),
            signed_in: false,
        };
        assert!(defaults.save(&bo).await.is_err());
        assert_eq!(defaults.load().unwrap(), ann());

        let reopened = Arc::new(PreferenceStore::open(&path).await.unwrap());
        assert_eq!(ProfileDefaults::new(reopened).load().unwrap(), ann());
    }

    #[tokio::test]
    async fn test_reset_keeps_other_preferences() {
        let dir = tempdir().unwrap();
        let store = Arc::new(PreferenceStore::open(dir.path().join("prefs.json")).await.unwrap());
        store.set("theme", "dark").await.unwrap();

        let defaults = ProfileDefaults::new(store.clone());
        defaults.save(&ann()).await.unwrap();
        defaults.reset().await.unwrap();

        assert_eq!(defaults.load().unwrap(), Profile::default());
        assert_eq!(store.keys().unwrap(), vec!["theme"]);
    }
}
