//! Server-by-server harvest
//!
//! Servers are processed strictly in the configured order. A server that
//! cannot be resolved, listed or given a folder is skipped; the run always
//! moves on to the next one.

use indicatif::ProgressBar;
use std::path::PathBuf;

use crate::config::Settings;
use crate::discord::GuildDirectory;
use crate::download::{self, naming, BatchReport, Fetch};
use crate::progress;

/// What happened to one configured server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    Completed {
        id: String,
        name: String,
        report: BatchReport,
    },
    Skipped {
        id: String,
        reason: String,
    },
}

impl GroupOutcome {
    pub fn id(&self) -> &str {
        match self {
            GroupOutcome::Completed { id, .. } | GroupOutcome::Skipped { id, .. } => id,
        }
    }
}

/// Drives the per-server pipeline: resolve, list, dispatch
pub struct Harvester<'a, D: ?Sized, F: ?Sized> {
    directory: &'a D,
    fetcher: &'a F,
    base_dir: PathBuf,
    avatar_size: u32,
    concurrency: Option<usize>,
    show_progress: bool,
}

impl<'a, D, F> Harvester<'a, D, F>
where
    D: GuildDirectory + ?Sized,
    F: Fetch + ?Sized,
{
    pub fn new(directory: &'a D, fetcher: &'a F, settings: &Settings, base_dir: PathBuf) -> Self {
        Self {
            directory,
            fetcher,
            base_dir,
            avatar_size: settings.avatar_size,
            concurrency: settings.concurrency,
            show_progress: false,
        }
    }

    /// Draw a progress bar per server
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Harvest every server in order, one at a time
    pub async fn run(&self, server_ids: &[String]) -> Vec<GroupOutcome> {
        let mut outcomes = Vec::with_capacity(server_ids.len());
        for server_id in server_ids {
            outcomes.push(self.harvest_group(server_id).await);
        }
        outcomes
    }

    async fn harvest_group(&self, server_id: &str) -> GroupOutcome {
        let skip = |reason: String| GroupOutcome::Skipped {
            id: server_id.to_string(),
            reason,
        };

        let guild = match self.directory.guild(server_id).await {
            Ok(guild) => guild,
            Err(e) => {
                tracing::warn!("Error fetching server info for {}: {}", server_id, e);
                return skip(e.to_string());
            }
        };

        let output_dir = naming::group_dir(&self.base_dir, &guild.name);
        if let Err(e) = naming::ensure_dir(&output_dir).await {
            tracing::warn!("Error creating path for {}: {}", guild.name, e);
            return skip(e.to_string());
        }

        let members = match self.directory.members(server_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!("Error fetching members of {}: {}", guild.name, e);
                return skip(e.to_string());
            }
        };

        let items = download::eligible_items(self.directory, &members, &output_dir, self.avatar_size);
        tracing::debug!(
            "{}: {} members, {} with avatars, saving to {}",
            guild.name,
            members.len(),
            items.len(),
            output_dir.display()
        );

        let bar = if self.show_progress {
            progress::create_progress_bar(items.len() as u64, &guild.name)
        } else {
            ProgressBar::hidden()
        };
        let report = download::dispatch(self.fetcher, items, self.concurrency, &bar).await;
        bar.finish_and_clear();

        tracing::info!("Finished downloading avatars for {}.", guild.name);
        tracing::info!("  └─ {}", progress::format_group_summary(&report));

        GroupOutcome::Completed {
            id: guild.id,
            name: guild.name,
            report,
        }
    }
}
