//! Discovery lifecycle state machine for peersync.
//!
//! This module provides a pure, side-effect-free state machine for the
//! searching → peers found / idle lifecycle of one sync session. It takes
//! events as input and produces a new lifecycle plus a list of actions.
//!
//! The actual timer is owned by sync-session, not by this module. Every
//! session start arms a timer under a fresh epoch; a `WindowElapsed`
//! carrying any other epoch is stale and changes nothing. That is what
//! keeps a timer that outlives its session from mutating state.

use std::time::Duration;

use peersync_types::DiscoveryState;

/// Discovery window used when none is configured.
pub const DEFAULT_DISCOVERY_WINDOW: Duration = Duration::from_millis(3000);

/// Discovery lifecycle - NO timers, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryLifecycle {
    state: DiscoveryState,
    window: Duration,
    /// Epoch of the most recent session start.
    epoch: u64,
    /// Epoch whose window timer is still outstanding.
    armed: Option<u64>,
}

impl DiscoveryLifecycle {
    /// Create a lifecycle in `Searching` with no timer armed.
    pub fn new(window: Duration) -> Self {
        Self {
            state: DiscoveryState::Searching,
            window,
            epoch: 0,
            armed: None,
        }
    }

    /// Current discovery state.
    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Configured discovery window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Epoch of the most recent session start.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Epoch of the outstanding window timer, if any.
    pub fn armed_epoch(&self) -> Option<u64> {
        self.armed
    }

    /// Process an event and return the new lifecycle plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-session)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: LifecycleEvent) -> (Self, Vec<LifecycleAction>) {
        match event {
            LifecycleEvent::SessionStarted => {
                let mut actions = Vec::with_capacity(3);
                if let Some(epoch) = self.armed {
                    actions.push(LifecycleAction::CancelWindowTimer { epoch });
                }

                let epoch = self.epoch.wrapping_add(1);
                actions.push(LifecycleAction::StartWindowTimer {
                    epoch,
                    window: self.window,
                });
                if self.state != DiscoveryState::Searching {
                    actions.push(LifecycleAction::StateChanged {
                        from: self.state,
                        to: DiscoveryState::Searching,
                    });
                }

                (
                    Self {
                        state: DiscoveryState::Searching,
                        epoch,
                        armed: Some(epoch),
                        ..self
                    },
                    actions,
                )
            }

            LifecycleEvent::WindowElapsed { epoch, peer_count } if self.armed == Some(epoch) => {
                let to = if peer_count > 0 {
                    DiscoveryState::PeersFound
                } else {
                    DiscoveryState::Idle
                };
                let actions = vec![LifecycleAction::StateChanged {
                    from: self.state,
                    to,
                }];
                (
                    Self {
                        state: to,
                        armed: None,
                        ..self
                    },
                    actions,
                )
            }

            LifecycleEvent::SessionStopped => match self.armed {
                Some(epoch) => (
                    Self {
                        armed: None,
                        ..self
                    },
                    vec![LifecycleAction::CancelWindowTimer { epoch }],
                ),
                None => (self, vec![]),
            },

            // Stale timer - stay in current state
            LifecycleEvent::WindowElapsed { .. } => (self, vec![]),
        }
    }
}

impl Default for DiscoveryLifecycle {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_WINDOW)
    }
}

/// Events that drive the discovery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A sync session started or restarted.
    SessionStarted,
    /// A discovery window timer fired.
    WindowElapsed {
        /// Epoch the timer was armed under.
        epoch: u64,
        /// Peers in the registry when the timer fired.
        peer_count: usize,
    },
    /// The owning session was torn down.
    SessionStopped,
}

/// Actions to be executed by sync-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Arm the discovery window timer.
    StartWindowTimer {
        /// Epoch to report back in `WindowElapsed`.
        epoch: u64,
        /// How long to wait.
        window: Duration,
    },
    /// Drop the timer armed under this epoch.
    CancelWindowTimer {
        /// Epoch of the timer to drop.
        epoch: u64,
    },
    /// The discovery state changed.
    StateChanged {
        /// State before the event.
        from: DiscoveryState,
        /// State after the event.
        to: DiscoveryState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (DiscoveryLifecycle, Vec<LifecycleAction>) {
        DiscoveryLifecycle::default().on_event(LifecycleEvent::SessionStarted)
    }

    #[test]
    fn starts_searching_with_default_window() {
        let lifecycle = DiscoveryLifecycle::default();
        assert_eq!(lifecycle.state(), DiscoveryState::Searching);
        assert_eq!(lifecycle.window(), Duration::from_millis(3000));
        assert_eq!(lifecycle.armed_epoch(), None);
    }

    #[test]
    fn session_start_arms_window_timer() {
        let (lifecycle, actions) = started();

        assert_eq!(lifecycle.state(), DiscoveryState::Searching);
        assert_eq!(lifecycle.armed_epoch(), Some(1));
        assert_eq!(
            actions,
            vec![LifecycleAction::StartWindowTimer {
                epoch: 1,
                window: DEFAULT_DISCOVERY_WINDOW,
            }]
        );
    }

    #[test]
    fn empty_window_goes_idle() {
        let (lifecycle, _) = started();
        let (lifecycle, actions) = lifecycle.on_event(LifecycleEvent::WindowElapsed {
            epoch: 1,
            peer_count: 0,
        });

        assert_eq!(lifecycle.state(), DiscoveryState::Idle);
        assert!(actions.contains(&LifecycleAction::StateChanged {
            from: DiscoveryState::Searching,
            to: DiscoveryState::Idle,
        }));
    }

    #[test]
    fn window_with_peers_goes_peers_found() {
        let (lifecycle, _) = started();
        let (lifecycle, _) = lifecycle.on_event(LifecycleEvent::WindowElapsed {
            epoch: 1,
            peer_count: 3,
        });

        assert_eq!(lifecycle.state(), DiscoveryState::PeersFound);
        assert_eq!(lifecycle.armed_epoch(), None);
    }

    #[test]
    fn idle_stays_idle_until_restart() {
        let (lifecycle, _) = started();
        let (lifecycle, _) = lifecycle.on_event(LifecycleEvent::WindowElapsed {
            epoch: 1,
            peer_count: 0,
        });

        // A second firing of the same timer is stale.
        let (lifecycle, actions) = lifecycle.on_event(LifecycleEvent::WindowElapsed {
            epoch: 1,
            peer_count: 5,
        });
        assert_eq!(lifecycle.state(), DiscoveryState::Idle);
        assert!(actions.is_empty());
    }

    #[test]
    fn restart_from_peers_found_returns_to_searching() {
        let (lifecycle, _) = started();
        let (lifecycle, _) = lifecycle.on_event(LifecycleEvent::WindowElapsed {
            epoch: 1,
            peer_count: 1,
        });
        let (lifecycle, actions) = lifecycle.on_event(LifecycleEvent::SessionStarted);

        assert_eq!(lifecycle.state(), DiscoveryState::Searching);
        assert_eq!(lifecycle.armed_epoch(), Some(2));
        assert!(actions.contains(&LifecycleAction::StateChanged {
            from: DiscoveryState::PeersFound,
            to: DiscoveryState::Searching,
        }));
    }

    #[test]
    fn stop_before_window_cancels_and_suppresses_late_timer() {
        let (lifecycle, _) = started();
        let (lifecycle, actions) = lifecycle.on_event(LifecycleEvent::SessionStopped);
        assert_eq!(actions, vec![LifecycleAction::CancelWindowTimer { epoch: 1 }]);

        let (lifecycle, actions) = lifecycle.on_event(LifecycleEvent::WindowElapsed {
            epoch: 1,
            peer_count: 2,
        });
        assert_eq!(lifecycle.state(), DiscoveryState::Searching);
        assert!(actions.is_empty());
    }

    #[test]
    fn stop_when_nothing_armed_is_noop() {
        let lifecycle = DiscoveryLifecycle::default();
        let (after, actions) = lifecycle.clone().on_event(LifecycleEvent::SessionStopped);
        assert_eq!(after, lifecycle);
        assert!(actions.is_empty());
    }

    #[test]
    fn restart_while_armed_cancels_previous_timer() {
        let (lifecycle, _) = started();
        let (lifecycle, actions) = lifecycle.on_event(LifecycleEvent::SessionStarted);

        assert_eq!(
            actions,
            vec![
                LifecycleAction::CancelWindowTimer { epoch: 1 },
                LifecycleAction::StartWindowTimer {
                    epoch: 2,
                    window: DEFAULT_DISCOVERY_WINDOW,
                },
            ]
        );

        // The first session's timer must not resolve the second session.
        let (lifecycle, _) = lifecycle.on_event(LifecycleEvent::WindowElapsed {
            epoch: 1,
            peer_count: 0,
        });
        assert_eq!(lifecycle.state(), DiscoveryState::Searching);
        assert_eq!(lifecycle.armed_epoch(), Some(2));
    }

    #[test]
    fn custom_window_is_carried_into_timer() {
        let lifecycle = DiscoveryLifecycle::new(Duration::from_millis(250));
        let (_, actions) = lifecycle.on_event(LifecycleEvent::SessionStarted);
        assert!(actions.iter().any(|a| matches!(
            a,
            LifecycleAction::StartWindowTimer { window, .. } if *window == Duration::from_millis(250)
        )));
    }
}
