use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

use super::worker::{fetch_and_save, DownloadOutcome, Fetch};
use crate::discord::{GuildDirectory, Member};

/// One avatar to fetch and where to put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub url: String,
    pub dest_dir: PathBuf,
}

/// Tally of a finished batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub saved: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl BatchReport {
    fn record(&mut self, outcome: &DownloadOutcome) {
        self.attempted += 1;
        match outcome {
            DownloadOutcome::Saved { bytes, .. } => {
                self.saved += 1;
                self.bytes += bytes;
            }
            DownloadOutcome::Failed => self.failed += 1,
        }
    }
}

/// Build download items for every member that has a custom avatar
pub fn eligible_items<D>(
    directory: &D,
    members: &[Member],
    dest_dir: &Path,
    avatar_size: u32,
) -> Vec<DownloadItem>
where
    D: GuildDirectory + ?Sized,
{
    members
        .iter()
        .filter_map(|member| member.user.as_ref())
        .filter_map(|user| directory.avatar_url(user, avatar_size))
        .map(|url| DownloadItem {
            url,
            dest_dir: dest_dir.to_path_buf(),
        })
        .collect()
}

/// Run every item concurrently and wait for all of them.
///
/// `concurrency` caps the number of in-flight downloads; `None` or `Some(0)`
/// starts them all at once. Individual failures never cut the batch short.
pub async fn dispatch<F>(
    fetcher: &F,
    items: Vec<DownloadItem>,
    concurrency: Option<usize>,
    progress: &ProgressBar,
) -> BatchReport
where
    F: Fetch + ?Sized,
{
    let mut report = BatchReport::default();
    if items.is_empty() {
        return report;
    }

    let width = match concurrency {
        Some(limit) if limit > 0 => limit,
        _ => items.len(),
    };

    let downloads = items.into_iter().map(|item| {
        let progress = progress.clone();
        async move {
            let outcome = fetch_and_save(fetcher, &item.url, &item.dest_dir).await;
            progress.inc(1);
            outcome
        }
    });

    let outcomes: Vec<DownloadOutcome> = stream::iter(downloads)
        .buffer_unordered(width)
        .collect()
        .await;

    for outcome in &outcomes {
        report.record(outcome);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::{Guild, User};
    use crate::download::worker::ByteStream;
    use crate::error::{DiscordError, DownloadError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Serves `<name>` as the body, after a delay encoded in the URL path
    /// (`https://cdn/<delay-ms>/<name>`). A `fail` segment yields a 404.
    #[derive(Default)]
    struct DelayedFetch {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Fetch for DelayedFetch {
        async fn fetch(&self, url: &str) -> Result<ByteStream, DownloadError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let mut parts = url.trim_start_matches("https://cdn/").split('/');
            let delay: u64 = parts.next().unwrap().parse().unwrap();
            let name = parts.next().unwrap().to_string();

            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);

            if name.starts_with("fail") {
                return Err(DownloadError::Status { status: 404 });
            }
            Ok(stream::iter(vec![Ok(Bytes::from(name))]).boxed())
        }
    }

    fn items(dest: &Path, specs: &[(u64, &str)]) -> Vec<DownloadItem> {
        specs
            .iter()
            .map(|(delay, name)| DownloadItem {
                url: format!("https://cdn/{}/{}", delay, name),
                dest_dir: dest.to_path_buf(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_returns_only_after_slowest_worker() {
        let out = tempfile::tempdir().unwrap();
        let fetch = DelayedFetch::default();
        let batch = items(out.path(), &[(10, "a.webp"), (250, "slow.webp"), (50, "c.webp")]);

        let report = dispatch(&fetch, batch, None, &ProgressBar::hidden()).await;

        assert_eq!(fetch.finished.load(Ordering::SeqCst), 3);
        assert_eq!(
            tokio::fs::read(out.path().join("slow.png")).await.unwrap(),
            b"slow.webp"
        );
        assert_eq!(report.saved, 3);
        assert_eq!(report.bytes, ("a.webp".len() + "slow.webp".len() + "c.webp".len()) as u64);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_siblings() {
        let out = tempfile::tempdir().unwrap();
        let fetch = DelayedFetch::default();
        let batch = items(
            out.path(),
            &[(0, "fail1.webp"), (30, "ok1.webp"), (0, "fail2.webp"), (10, "ok2.webp")],
        );

        let report = dispatch(&fetch, batch, None, &ProgressBar::hidden()).await;

        assert_eq!(
            report,
            BatchReport {
                attempted: 4,
                saved: 2,
                failed: 2,
                bytes: ("ok1.webp".len() + "ok2.webp".len()) as u64,
            }
        );
        assert!(out.path().join("ok1.png").exists());
        assert!(out.path().join("ok2.png").exists());
    }

    #[tokio::test]
    async fn test_unbounded_runs_everything_at_once() {
        let out = tempfile::tempdir().unwrap();
        let fetch = DelayedFetch::default();
        let specs: Vec<(u64, String)> = (0..8).map(|i| (50, format!("{}.webp", i))).collect();
        let specs: Vec<(u64, &str)> = specs.iter().map(|(d, n)| (*d, n.as_str())).collect();

        dispatch(&fetch, items(out.path(), &specs), None, &ProgressBar::hidden()).await;

        assert_eq!(fetch.peak.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_concurrency_limit_respected() {
        let out = tempfile::tempdir().unwrap();
        let fetch = DelayedFetch::default();
        let specs: Vec<(u64, String)> = (0..8).map(|i| (20, format!("{}.webp", i))).collect();
        let specs: Vec<(u64, &str)> = specs.iter().map(|(d, n)| (*d, n.as_str())).collect();

        let report = dispatch(&fetch, items(out.path(), &specs), Some(2), &ProgressBar::hidden()).await;

        assert!(fetch.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(report.saved, 8);
    }

    #[tokio::test]
    async fn test_progress_counts_every_item() {
        let out = tempfile::tempdir().unwrap();
        let fetch = DelayedFetch::default();
        let progress = ProgressBar::hidden();
        progress.set_length(3);

        dispatch(
            &fetch,
            items(out.path(), &[(0, "a.webp"), (0, "fail.webp"), (0, "b.webp")]),
            None,
            &progress,
        )
        .await;

        assert_eq!(progress.position(), 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let fetch = DelayedFetch::default();
        let report = dispatch(&fetch, Vec::new(), None, &ProgressBar::hidden()).await;
        assert_eq!(report, BatchReport::default());
    }

    struct Cdn;

    #[async_trait]
    impl GuildDirectory for Cdn {
        async fn guild(&self, guild_id: &str) -> Result<Guild, DiscordError> {
            Ok(Guild {
                id: guild_id.to_string(),
                name: guild_id.to_string(),
            })
        }

        async fn members(&self, _guild_id: &str) -> Result<Vec<Member>, DiscordError> {
            Ok(Vec::new())
        }

        fn avatar_url(&self, user: &User, size: u32) -> Option<String> {
            user.avatar_hash()
                .map(|hash| format!("https://cdn/avatars/{}/{}.webp?size={}", user.id, hash, size))
        }
    }

    fn member(id: &str, avatar: Option<&str>) -> Member {
        Member {
            user: Some(User {
                id: id.to_string(),
                username: id.to_string(),
                avatar: avatar.map(str::to_string),
            }),
            nick: None,
        }
    }

    #[test]
    fn test_only_members_with_avatars_are_eligible() {
        let members = vec![
            member("1", Some("abc")),
            member("2", None),
            member("3", Some("")),
            Member {
                user: None,
                nick: Some("ghost".to_string()),
            },
            member("5", Some("def")),
        ];

        let dest = Path::new("out/server");
        let items = eligible_items(&Cdn, &members, dest, 512);

        assert_eq!(
            items,
            vec![
                DownloadItem {
                    url: "https://cdn/avatars/1/abc.webp?size=512".to_string(),
                    dest_dir: dest.to_path_buf(),
                },
                DownloadItem {
                    url: "https://cdn/avatars/5/def.webp?size=512".to_string(),
                    dest_dir: dest.to_path_buf(),
                },
            ]
        );
    }
}
