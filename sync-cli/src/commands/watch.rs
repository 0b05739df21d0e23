//! Run a simulated sync session and print each snapshot.

use anyhow::{Context, Result};
use peersync_session::{SimulatedSource, SyncSession};
use peersync_types::{DiscoveryState, SyncSnapshot};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;

/// Command-line overrides for `watch`.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Number of simulated peers, overriding `[simulation] peers`.
    pub peers: Option<usize>,
    /// Simulation seed, overriding `[simulation] seed`.
    pub seed: Option<u64>,
    /// Give up after this long.
    pub duration: Duration,
    /// Print snapshots as JSON lines.
    pub json: bool,
}

/// Run the watch command.
///
/// Ends when every peer is synced, when discovery finds nobody, or when
/// `duration` elapses.
pub async fn run(config: &Config, options: WatchOptions) -> Result<()> {
    let peers = options.peers.unwrap_or(config.simulation.peers);
    let source = match options.seed.or(config.simulation.seed) {
        Some(seed) => SimulatedSource::seeded(peers, seed),
        None => SimulatedSource::new(peers),
    }
    .with_max_step(config.simulation.max_step);

    let mut session =
        SyncSession::new(config.session_config(), source).context("Invalid session config")?;
    let mut snapshots = session.watch();
    session.start().await;
    info!(peers, "watching simulated session");

    let deadline = tokio::time::sleep(options.duration);
    tokio::pin!(deadline);

    let mut searching_shown = false;
    loop {
        tokio::select! {
            _ = &mut deadline => {
                debug!("watch duration elapsed");
                if !options.json {
                    println!("Stopped after {}s", options.duration.as_secs());
                }
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();

                if options.json {
                    println!("{}", serde_json::to_string(&snapshot)?);
                } else if snapshot.state == DiscoveryState::Searching {
                    // One indicator line for the whole window.
                    if !searching_shown {
                        println!("Searching for devices...");
                        searching_shown = true;
                    }
                } else {
                    println!("{}", render_line(&snapshot));
                }

                if is_finished(&snapshot) {
                    if snapshot.state == DiscoveryState::Idle && !options.json {
                        println!("No devices found");
                    }
                    break;
                }
            }
        }
    }

    session.stop().await;
    Ok(())
}

/// Whether a snapshot ends the watch.
fn is_finished(snapshot: &SyncSnapshot) -> bool {
    match snapshot.state {
        DiscoveryState::Searching => false,
        DiscoveryState::Idle => true,
        DiscoveryState::PeersFound => snapshot.progress.is_complete(),
    }
}

/// One status line for a snapshot past discovery.
fn render_line(snapshot: &SyncSnapshot) -> String {
    let complete = snapshot.peers.iter().filter(|p| p.is_complete()).count();
    format!(
        "[tick {:>4}] {:<11} {:>3}% ({}/{} peers synced)",
        snapshot.tick,
        snapshot.state,
        snapshot.progress.percentage,
        complete,
        snapshot.progress.peer_count,
    )
}
