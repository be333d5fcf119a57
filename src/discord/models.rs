use serde::{Deserialize, Serialize};

/// A server, as returned by `GET /guilds/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    /// Avatar hash; absent or empty when the user has no custom avatar
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    pub fn avatar_hash(&self) -> Option<&str> {
        self.avatar.as_deref().filter(|hash| !hash.is_empty())
    }

    /// Animated avatars carry an `a_` prefix on their hash
    pub fn has_animated_avatar(&self) -> bool {
        self.avatar_hash().is_some_and(|hash| hash.starts_with("a_"))
    }
}

/// A server member, as returned by `GET /guilds/{id}/members`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
}
