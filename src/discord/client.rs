use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::models::{Guild, Member, User};
use crate::error::DiscordError;

type Result<T> = std::result::Result<T, DiscordError>;

pub const API_BASE: &str = "https://discord.com/api/v10";
pub const CDN_BASE: &str = "https://cdn.discordapp.com";

/// Largest page `GET /guilds/{id}/members` will return
pub const MEMBER_PAGE_LIMIT: usize = 1000;

const USER_AGENT: &str = concat!("DiscordBot (dl-avatars, ", env!("CARGO_PKG_VERSION"), ")");

/// Read access to servers and their members
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// Look up a server by ID
    async fn guild(&self, guild_id: &str) -> Result<Guild>;

    /// List every member of a server
    async fn members(&self, guild_id: &str) -> Result<Vec<Member>>;

    /// CDN URL of a user's avatar at `size` pixels, or `None` without a custom avatar
    fn avatar_url(&self, user: &User, size: u32) -> Option<String>;
}

/// Bot-authenticated Discord REST client
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    authorization: String,
    api_base: String,
    cdn_base: String,
}

impl DiscordClient {
    /// Build a client with its own HTTP connection pool and request timeout
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, token))
    }

    /// Create a DiscordClient with an existing reqwest Client.
    pub fn with_client(client: Client, token: &str) -> Self {
        let token = token.trim();
        let authorization = if token.starts_with("Bot ") {
            token.to_string()
        } else {
            format!("Bot {}", token)
        };

        Self {
            client,
            authorization,
            api_base: API_BASE.to_string(),
            cdn_base: CDN_BASE.to_string(),
        }
    }

    /// Point the client at different API and CDN hosts
    pub fn with_base_urls(mut self, api_base: impl Into<String>, cdn_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.cdn_base = cdn_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Underlying HTTP client, shared with the avatar fetcher
    pub fn http(&self) -> &Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .header(AUTHORIZATION, &self.authorization)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|source| DiscordError::Json {
            endpoint: path.to_string(),
            source,
        })
    }

    /// Verify the token by fetching the bot's own user
    /// GET /users/@me
    pub async fn current_user(&self) -> Result<User> {
        self.get_json("/users/@me", &[]).await
    }
}

#[async_trait]
impl GuildDirectory for DiscordClient {
    /// GET /guilds/{guild_id}
    async fn guild(&self, guild_id: &str) -> Result<Guild> {
        self.get_json(&format!("/guilds/{}", guild_id), &[]).await
    }

    /// GET /guilds/{guild_id}/members, following `after` until a short page
    async fn members(&self, guild_id: &str) -> Result<Vec<Member>> {
        let path = format!("/guilds/{}/members", guild_id);
        let mut members = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("limit", MEMBER_PAGE_LIMIT.to_string())];
            if let Some(after) = &after {
                query.push(("after", after.clone()));
            }

            let page: Vec<Member> = self.get_json(&path, &query).await?;
            let page_len = page.len();
            // Pages are ordered by user ID, so the last one is the cursor
            after = page
                .iter()
                .filter_map(|member| member.user.as_ref())
                .map(|user| user.id.clone())
                .last();
            members.extend(page);

            tracing::trace!(
                "Fetched {} members of {} ({} so far)",
                page_len,
                guild_id,
                members.len()
            );

            if page_len < MEMBER_PAGE_LIMIT || after.is_none() {
                break;
            }
        }

        Ok(members)
    }

    fn avatar_url(&self, user: &User, size: u32) -> Option<String> {
        let hash = user.avatar_hash()?;
        let ext = if user.has_animated_avatar() { "gif" } else { "webp" };
        Some(format!(
            "{}/avatars/{}/{}.{}?size={}",
            self.cdn_base, user.id, hash, ext, size
        ))
    }
}
