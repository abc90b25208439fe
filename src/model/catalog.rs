use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_AVATAR: &str = "assets/defaultpfp.png";
pub const DEFAULT_BANNER: &str = "assets/defaultbanner.jpg";

/// One entry of the static level list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    /// Community author; official levels have none.
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub thumbnail: String,
    /// Leaderboard endpoint for this level.
    pub api: String,
}

impl Level {
    pub fn is_official(&self) -> bool {
        self.creator.is_none()
    }
}

/// Cosmetic metadata for a player, keyed by username in `profiles.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub pfp: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
}

impl Profile {
    pub fn avatar_url(&self) -> &str {
        self.pfp.as_deref().unwrap_or(DEFAULT_AVATAR)
    }

    pub fn banner_url(&self) -> &str {
        self.banner.as_deref().unwrap_or(DEFAULT_BANNER)
    }
}

/// Level list plus profile metadata, loaded once per session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub levels: Vec<Level>,
    pub profiles: HashMap<String, Profile>,
}

impl Catalog {
    pub fn new(levels: Vec<Level>, profiles: HashMap<String, Profile>) -> Self {
        Self { levels, profiles }
    }

    /// Parse the two static JSON documents.
    pub fn from_json(levels_json: &str, profiles_json: &str) -> Result<Self> {
        let levels: Vec<Level> =
            serde_json::from_str(levels_json).context("parsing level list")?;
        let profiles: HashMap<String, Profile> =
            serde_json::from_str(profiles_json).context("parsing profile metadata")?;
        Ok(Self { levels, profiles })
    }

    /// Load the catalog from disk.
    ///
    /// The level list is required. A missing or unreadable profile file
    /// degrades to an empty profile map, since every profile field has a
    /// default asset.
    pub async fn load(levels_path: &Path, profiles_path: &Path) -> Result<Self> {
        let levels_raw = tokio::fs::read_to_string(levels_path)
            .await
            .with_context(|| format!("reading level list {}", levels_path.display()))?;
        let levels: Vec<Level> = serde_json::from_str(&levels_raw)
            .with_context(|| format!("parsing level list {}", levels_path.display()))?;

        let profiles = match tokio::fs::read_to_string(profiles_path).await {
            Ok(raw) => serde_json::from_str::<HashMap<String, Profile>>(&raw)
                .with_context(|| format!("parsing profile metadata {}", profiles_path.display()))?,
            Err(e) => {
                warn!(
                    "profile metadata unavailable path={} err={}",
                    profiles_path.display(),
                    e
                );
                HashMap::new()
            }
        };

        info!(
            "catalog loaded levels={} profiles={}",
            levels.len(),
            profiles.len()
        );
        Ok(Self { levels, profiles })
    }

    pub fn profile(&self, username: &str) -> Profile {
        self.profiles.get(username).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_json() {
        let catalog = Catalog::from_json(
            r#"[
                {"name": "Intro", "thumbnail": "thumbs/intro.png", "api": "https://api.example/lb/1"},
                {"name": "Spiral", "creator": "mira", "thumbnail": "thumbs/spiral.png", "api": "https://api.example/lb/2"}
            ]"#,
            r#"{"mira": {"pfp": "pfp/mira.png"}}"#,
        )
        .unwrap();

        assert_eq!(catalog.levels.len(), 2);
        assert!(catalog.levels[0].is_official());
        assert_eq!(catalog.levels[1].creator.as_deref(), Some("mira"));

        let mira = catalog.profile("mira");
        assert_eq!(mira.avatar_url(), "pfp/mira.png");
        assert_eq!(mira.banner_url(), DEFAULT_BANNER);

        let nobody = catalog.profile("nobody");
        assert_eq!(nobody.avatar_url(), DEFAULT_AVATAR);
    }

    #[test]
    fn test_catalog_rejects_malformed_levels() {
        assert!(Catalog::from_json(r#"{"not": "a list"}"#, "{}").is_err());
    }
}
