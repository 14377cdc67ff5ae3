//! Offline portal with fixed per-channel survival odds.
//!
//! Each send survives or dies as a whole batch, like the real service.
//! The pool is capped: a send never takes more units than remain.
//! Every channel draws from its own seeded stream, so concurrent sends
//! give the same outcomes whatever order they arrive in.

use super::{SendCollaborator, StartCollaborator, StatusCollaborator};
use mx_common::{Channel, EpisodeStatus, Error, Result, SendOutcome, CHANNEL_COUNT};
use mx_math::clamp_unit;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard};

/// Parameters of a simulated episode.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_pool: u32,
    /// Survival probability per channel, in wire index order.
    pub survival: [f64; CHANNEL_COUNT],
    pub seed: u64,
    /// Fail every call once this many sends have succeeded.
    pub fail_after_sends: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_pool: 1000,
            survival: [0.75, 0.5, 0.3],
            seed: 0,
            fail_after_sends: None,
        }
    }
}

#[derive(Debug)]
struct SimState {
    status: EpisodeStatus,
    started: bool,
    sends: u64,
    rngs: [StdRng; CHANNEL_COUNT],
}

/// In-process stand-in for the portal API.
#[derive(Debug)]
pub struct SimulatedPortal {
    config: SimulationConfig,
    state: Mutex<SimState>,
}

impl SimulatedPortal {
    pub fn new(config: SimulationConfig) -> Self {
        SimulatedPortal {
            state: Mutex::new(SimState {
                status: EpisodeStatus::default(),
                started: false,
                sends: 0,
                rngs: channel_rngs(config.seed),
            }),
            config,
        }
    }

    /// Current counters without going through the status collaborator.
    pub fn snapshot(&self) -> Result<EpisodeStatus> {
        Ok(self.lock()?.status.clone())
    }

    /// Number of sends served so far.
    pub fn sends(&self) -> Result<u64> {
        Ok(self.lock()?.sends)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SimState>> {
        self.state
            .lock()
            .map_err(|_| Error::Transport("simulated portal state poisoned".to_string()))
    }

    fn check_injected_failure(&self, state: &SimState) -> Result<()> {
        match self.config.fail_after_sends {
            Some(limit) if state.sends >= limit => Err(Error::Transport(format!(
                "simulated outage after {} sends",
                limit
            ))),
            _ => Ok(()),
        }
    }
}

fn channel_rngs(seed: u64) -> [StdRng; CHANNEL_COUNT] {
    Channel::ALL.map(|channel| {
        let stream = (channel.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(seed ^ stream)
    })
}

impl StartCollaborator for SimulatedPortal {
    fn start(&self) -> Result<EpisodeStatus> {
        let mut state = self.lock()?;
        state.status = EpisodeStatus {
            remaining_in_source: self.config.initial_pool,
            status_message: Some("Episode started".to_string()),
            ..EpisodeStatus::default()
        };
        state.started = true;
        state.sends = 0;
        state.rngs = channel_rngs(self.config.seed);
        Ok(state.status.clone())
    }
}

impl SendCollaborator for SimulatedPortal {
    fn send(&self, channel: Channel, count: u32) -> Result<SendOutcome> {
        let mut state = self.lock()?;
        if !state.started {
            return Err(Error::Transport("no active episode".to_string()));
        }
        self.check_injected_failure(&state)?;

        let sent = count.min(state.status.remaining_in_source);
        let p = self.config.survival[channel.index()];
        let survived = sent > 0 && state.rngs[channel.index()].random_bool(clamp_unit(p));

        state.status.remaining_in_source -= sent;
        if survived {
            state.status.delivered += sent;
        } else {
            state.status.lost += sent;
        }
        state.status.steps_taken += 1;
        state.status.status_message = if state.status.remaining_in_source == 0 {
            Some("Episode complete".to_string())
        } else {
            None
        };
        state.sends += 1;

        Ok(SendOutcome {
            sent,
            survived,
            remaining_in_source: state.status.remaining_in_source,
            delivered: state.status.delivered,
            lost: state.status.lost,
            steps_taken: state.status.steps_taken,
        })
    }
}

impl StatusCollaborator for SimulatedPortal {
    fn status(&self) -> Result<EpisodeStatus> {
        let state = self.lock()?;
        self.check_injected_failure(&state)?;
        Ok(state.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portal(pool: u32, survival: [f64; 3]) -> SimulatedPortal {
        SimulatedPortal::new(SimulationConfig {
            initial_pool: pool,
            survival,
            ..SimulationConfig::default()
        })
    }

    #[test]
    fn send_before_start_fails() {
        let p = portal(10, [1.0; 3]);
        assert!(p.send(Channel::OnACob, 1).is_err());
    }

    #[test]
    fn certain_survival_delivers_everything() {
        let p = portal(6, [1.0; 3]);
        p.start().unwrap();
        let out = p.send(Channel::PurgePlanet, 3).unwrap();
        assert!(out.survived);
        assert_eq!(out.sent, 3);
        let status = p.status().unwrap();
        assert_eq!(status.remaining_in_source, 3);
        assert_eq!(status.delivered, 3);
        assert_eq!(status.lost, 0);
    }

    #[test]
    fn certain_death_loses_everything() {
        let p = portal(6, [0.0; 3]);
        p.start().unwrap();
        let out = p.send(Channel::OnACob, 2).unwrap();
        assert!(!out.survived);
        assert_eq!(p.status().unwrap().lost, 2);
    }

    #[test]
    fn sends_are_capped_by_pool() {
        let p = portal(2, [1.0; 3]);
        p.start().unwrap();
        let out = p.send(Channel::OnACob, 3).unwrap();
        assert_eq!(out.sent, 2);
        assert_eq!(out.remaining_in_source, 0);
        let empty = p.send(Channel::CronenbergWorld, 1).unwrap();
        assert_eq!(empty.sent, 0);
        assert!(!empty.survived);
    }

    #[test]
    fn outcomes_do_not_depend_on_channel_order() {
        let forward = portal(100, [0.5; 3]);
        let backward = portal(100, [0.5; 3]);
        forward.start().unwrap();
        backward.start().unwrap();
        let mut a = Vec::new();
        let mut b = Vec::new();
        for _ in 0..10 {
            for channel in Channel::ALL {
                a.push((channel, forward.send(channel, 1).unwrap().survived));
            }
            for channel in Channel::ALL.iter().rev() {
                b.push((*channel, backward.send(*channel, 1).unwrap().survived));
            }
        }
        for channel in Channel::ALL {
            let fa: Vec<bool> = a.iter().filter(|(c, _)| *c == channel).map(|(_, s)| *s).collect();
            let fb: Vec<bool> = b.iter().filter(|(c, _)| *c == channel).map(|(_, s)| *s).collect();
            assert_eq!(fa, fb);
        }
    }

    #[test]
    fn injected_failure_trips_after_limit() {
        let p = SimulatedPortal::new(SimulationConfig {
            initial_pool: 10,
            fail_after_sends: Some(1),
            ..SimulationConfig::default()
        });
        p.start().unwrap();
        assert!(p.send(Channel::OnACob, 1).is_ok());
        assert!(matches!(p.send(Channel::OnACob, 1), Err(Error::Transport(_))));
        assert!(p.status().is_err());
    }
}
