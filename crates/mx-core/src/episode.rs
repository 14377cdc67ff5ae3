//! Episode loop: start, then decide / send / observe until the pool is empty.
//!
//! The runner owns no state between episodes. The engine and its table are
//! borrowed for one run; the portal is only ever reached through the
//! collaborator traits.

use crate::config::ConfigSnapshot;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::policy::{ActionSummary, DecisionMode, PolicyEngine};
use crate::transport::{Portal, SendCollaborator};
use chrono::{DateTime, Utc};
use mx_common::{Action, Channel, ChannelOutcome, Error, Result, SendOutcome, CHANNEL_COUNT};
use mx_math::ratio_or_zero;
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// How an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    /// The pool was emptied.
    Completed,
    /// `max_steps` was hit with units still waiting.
    StepCapReached,
}

/// How often each policy branch fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionCounts {
    pub explore: u64,
    pub exploit: u64,
    pub fallback: u64,
    /// Steps where the low-capacity clamp replaced the branch's action.
    pub clamped: u64,
}

impl DecisionCounts {
    fn record(&mut self, mode: DecisionMode, clamped: bool) {
        match mode {
            DecisionMode::Explore => self.explore += 1,
            DecisionMode::Exploit => self.exploit += 1,
            DecisionMode::Fallback => self.fallback += 1,
        }
        if clamped {
            self.clamped += 1;
        }
    }
}

/// Summary of a finished episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    pub run_id: String,
    pub mode: &'static str,
    pub outcome: EpisodeOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Pool size reported by the start call.
    pub initial_pool: u32,
    pub delivered: u32,
    pub lost: u32,
    pub remaining: u32,
    /// Steps driven by this client.
    pub steps: u64,
    /// Step counter as reported by the portal.
    pub portal_steps: u32,
    /// `delivered / initial_pool`, 0 for an empty pool.
    pub delivery_rate: f64,
    pub decisions: DecisionCounts,
    pub best_action: Option<ActionSummary>,
    /// Table entries, best first.
    pub actions: Vec<ActionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigSnapshot>,
}

/// Drives one episode against a portal.
#[derive(Debug)]
pub struct EpisodeRunner<'a> {
    ctx: LogContext,
    max_steps: Option<u64>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> EpisodeRunner<'a> {
    pub fn new(ctx: LogContext) -> Self {
        EpisodeRunner {
            ctx,
            max_steps: None,
            cancel: None,
        }
    }

    /// Stop after this many steps even if units remain.
    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Abort with [`Error::Cancelled`] once `flag` is raised.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run a full episode.
    ///
    /// Any collaborator failure aborts the episode and is returned as is.
    /// A step whose sends complete after cancellation is discarded without
    /// touching the table.
    pub fn run<R, P>(&self, engine: &mut PolicyEngine<R>, portal: &P) -> Result<EpisodeReport>
    where
        R: Rng,
        P: Portal + ?Sized,
    {
        let started_at = Utc::now();
        let mut status = portal.start()?;
        let initial_pool = status.remaining_in_source;

        log_event!(
            self.ctx,
            INFO,
            event_names::EPISODE_STARTED,
            Stage::Start,
            "episode started",
            initial_pool = initial_pool,
            epsilon = engine.params().epsilon
        );

        let mut steps: u64 = 0;
        let mut decisions = DecisionCounts::default();

        let outcome = loop {
            if status.is_exhausted() {
                break EpisodeOutcome::Completed;
            }
            if self.max_steps.is_some_and(|cap| steps >= cap) {
                break EpisodeOutcome::StepCapReached;
            }
            self.check_cancelled(steps)?;

            let decision = engine.choose(status.remaining_in_source);
            decisions.record(decision.mode, decision.clamped);
            log_event!(
                self.ctx,
                DEBUG,
                event_names::POLICY_DECIDED,
                Stage::Decide,
                "action chosen",
                step = steps + 1,
                action = tracing::field::display(decision.action),
                decision = tracing::field::display(decision.mode),
                clamped = decision.clamped,
                remaining = status.remaining_in_source
            );

            let outcomes = match self.dispatch(portal, decision.action) {
                Ok(outcomes) => outcomes,
                Err(err) => {
                    // A send cut short by an interrupt reports the interrupt.
                    self.check_cancelled(steps)?;
                    return Err(err);
                }
            };
            self.check_cancelled(steps)?;

            let reward = engine.update(decision.action, &outcomes);
            status = portal.status()?;
            steps += 1;

            log_event!(
                self.ctx,
                INFO,
                event_names::EPISODE_STEP,
                Stage::Status,
                "step complete",
                step = steps,
                action = tracing::field::display(decision.action),
                reward = reward,
                remaining = status.remaining_in_source,
                delivered = status.delivered,
                lost = status.lost,
                rate = delivery_rate(status.delivered, initial_pool)
            );
        };

        let delivery_rate = delivery_rate(status.delivered, initial_pool);
        let table = engine.table();
        let best_action = table.best().map(|(action, stats)| ActionSummary {
            action,
            avg_reward: stats.avg_reward(),
            pulls: stats.pulls(),
        });

        log_event!(
            self.ctx,
            INFO,
            event_names::EPISODE_FINISHED,
            Stage::Finish,
            "episode finished",
            outcome = tracing::field::debug(outcome),
            steps = steps,
            delivered = status.delivered,
            lost = status.lost,
            delivery_rate = delivery_rate,
            table_size = table.len()
        );

        Ok(EpisodeReport {
            run_id: self.ctx.run_id.clone(),
            mode: self.ctx.mode,
            outcome,
            started_at,
            finished_at: Utc::now(),
            initial_pool,
            delivered: status.delivered,
            lost: status.lost,
            remaining: status.remaining_in_source,
            steps,
            portal_steps: status.steps_taken,
            delivery_rate,
            decisions,
            best_action,
            actions: table.ranked(),
            status_message: status.status_message,
            config: None,
        })
    }

    /// Send every non-zero component of `action` concurrently and join.
    ///
    /// All sends are joined before the first error, in channel order, is
    /// returned.
    fn dispatch<P>(&self, portal: &P, action: Action) -> Result<[ChannelOutcome; CHANNEL_COUNT]>
    where
        P: SendCollaborator + ?Sized,
    {
        let results: Vec<(Channel, u32, Result<SendOutcome>)> = thread::scope(|s| {
            let handles: Vec<_> = action
                .dispatches()
                .map(|(channel, count)| (channel, count, s.spawn(move || portal.send(channel, count))))
                .collect();

            handles
                .into_iter()
                .map(|(channel, count, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(Error::Transport(format!("send to {} panicked", channel)))
                    });
                    (channel, count, result)
                })
                .collect()
        });

        let mut outcomes = Channel::ALL.map(ChannelOutcome::idle);
        for (channel, requested, result) in results {
            let sent = result?;
            log_event!(
                self.ctx,
                DEBUG,
                event_names::PORTAL_SENT,
                Stage::Send,
                "units sent",
                channel = channel.name(),
                requested = requested,
                sent = sent.sent,
                survived = sent.survived
            );
            let slot = &mut outcomes[channel.index()];
            slot.sent = sent.sent;
            slot.survived = sent.survived;
        }
        Ok(outcomes)
    }

    fn check_cancelled(&self, steps: u64) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => {
                log_event!(
                    self.ctx,
                    WARN,
                    event_names::EPISODE_CANCELLED,
                    Stage::Finish,
                    "episode cancelled",
                    steps = steps
                );
                Err(Error::Cancelled { steps })
            }
            _ => Ok(()),
        }
    }
}

/// Fraction of the initial pool delivered so far; 0 for an empty pool.
fn delivery_rate(delivered: u32, initial_pool: u32) -> f64 {
    ratio_or_zero(u64::from(delivered), u64::from(initial_pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ActionTable, PolicyParams};
    use crate::transport::{StartCollaborator, StatusCollaborator};
    use mx_common::EpisodeStatus;
    use std::sync::Mutex;

    /// Portal where every send survives and the pool drains exactly.
    struct Recorder {
        status: Mutex<EpisodeStatus>,
        sends: Mutex<Vec<(Channel, u32)>>,
        fail_on: Option<Channel>,
        cancel_on_send: Option<&'static AtomicBool>,
    }

    impl Recorder {
        fn new(pool: u32) -> Self {
            Recorder {
                status: Mutex::new(EpisodeStatus {
                    remaining_in_source: pool,
                    ..EpisodeStatus::default()
                }),
                sends: Mutex::new(Vec::new()),
                fail_on: None,
                cancel_on_send: None,
            }
        }
    }

    impl StartCollaborator for Recorder {
        fn start(&self) -> Result<EpisodeStatus> {
            Ok(self.status.lock().unwrap().clone())
        }
    }

    impl SendCollaborator for Recorder {
        fn send(&self, channel: Channel, count: u32) -> Result<SendOutcome> {
            if let Some(flag) = self.cancel_on_send {
                flag.store(true, Ordering::SeqCst);
            }
            if self.fail_on == Some(channel) {
                return Err(Error::Transport("boom".into()));
            }
            self.sends.lock().unwrap().push((channel, count));
            let mut status = self.status.lock().unwrap();
            let sent = count.min(status.remaining_in_source);
            status.remaining_in_source -= sent;
            status.delivered += sent;
            status.steps_taken += 1;
            Ok(SendOutcome {
                sent,
                survived: true,
                remaining_in_source: status.remaining_in_source,
                delivered: status.delivered,
                lost: status.lost,
                steps_taken: status.steps_taken,
            })
        }
    }

    impl StatusCollaborator for Recorder {
        fn status(&self) -> Result<EpisodeStatus> {
            Ok(self.status.lock().unwrap().clone())
        }
    }

    fn engine() -> PolicyEngine {
        PolicyEngine::from_seed(
            PolicyParams::default(),
            ActionTable::seeded(Action::new(2, 2, 2), 0.1),
            Some(11),
        )
        .unwrap()
    }

    fn runner() -> EpisodeRunner<'static> {
        EpisodeRunner::new(LogContext::new("run-test", "test"))
    }

    #[test]
    fn small_pool_goes_to_first_channel() {
        let portal = Recorder::new(2);
        let mut engine = engine();
        let report = runner().run(&mut engine, &portal).unwrap();

        assert_eq!(report.outcome, EpisodeOutcome::Completed);
        assert_eq!(report.steps, 1);
        assert_eq!(*portal.sends.lock().unwrap(), vec![(Channel::OnACob, 2)]);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.delivery_rate, 1.0);
        assert!(engine.table().get(&Action::new(2, 0, 0)).is_some());
    }

    #[test]
    fn zero_components_are_not_sent() {
        let portal = Recorder::new(1);
        let mut engine = engine();
        runner().run(&mut engine, &portal).unwrap();
        let sends = portal.sends.lock().unwrap();
        assert!(sends.iter().all(|&(_, count)| count > 0));
    }

    #[test]
    fn pool_drains_to_completion() {
        let portal = Recorder::new(50);
        let mut engine = engine();
        let report = runner().run(&mut engine, &portal).unwrap();
        assert_eq!(report.outcome, EpisodeOutcome::Completed);
        assert_eq!(report.remaining, 0);
        assert_eq!(report.delivered, 50);
        let d = report.decisions;
        assert_eq!(d.explore + d.exploit + d.fallback, report.steps);
        assert!(report.best_action.is_some());
    }

    #[test]
    fn empty_pool_finishes_without_steps() {
        let portal = Recorder::new(0);
        let mut engine = engine();
        let report = runner().run(&mut engine, &portal).unwrap();
        assert_eq!(report.steps, 0);
        assert_eq!(report.delivery_rate, 0.0);
        assert!(portal.sends.lock().unwrap().is_empty());
    }

    #[test]
    fn step_cap_stops_early() {
        let portal = Recorder::new(1000);
        let mut engine = engine();
        let report = runner()
            .with_max_steps(Some(3))
            .run(&mut engine, &portal)
            .unwrap();
        assert_eq!(report.outcome, EpisodeOutcome::StepCapReached);
        assert_eq!(report.steps, 3);
        assert!(report.remaining > 0);
    }

    #[test]
    fn send_failure_aborts_episode() {
        let mut portal = Recorder::new(100);
        portal.fail_on = Some(Channel::CronenbergWorld);
        let mut engine = engine();
        let err = runner().run(&mut engine, &portal).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        // The failed step is never folded into the table.
        assert_eq!(engine.table().len(), 1);
        assert_eq!(engine.table().get(&Action::new(2, 2, 2)).unwrap().pulls(), 1);
    }

    #[test]
    fn failed_send_after_interrupt_reports_cancellation() {
        static FLAG: AtomicBool = AtomicBool::new(false);
        let mut portal = Recorder::new(100);
        portal.cancel_on_send = Some(&FLAG);
        portal.fail_on = Some(Channel::OnACob);
        let mut engine = engine();
        let err = runner()
            .with_cancel_flag(&FLAG)
            .run(&mut engine, &portal)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { steps: 0 }), "got {:?}", err);
        assert_eq!(engine.table().len(), 1);
    }

    #[test]
    fn delivery_rate_is_relative_to_initial_pool() {
        assert_eq!(delivery_rate(250, 1000), 0.25);
        assert_eq!(delivery_rate(3, 0), 0.0);
    }

    #[test]
    fn cancellation_before_first_step() {
        static FLAG: AtomicBool = AtomicBool::new(true);
        let portal = Recorder::new(10);
        let mut engine = engine();
        let err = runner()
            .with_cancel_flag(&FLAG)
            .run(&mut engine, &portal)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { steps: 0 }));
        assert!(portal.sends.lock().unwrap().is_empty());
    }

    #[test]
    fn cancellation_mid_step_discards_results() {
        static FLAG: AtomicBool = AtomicBool::new(false);
        let mut portal = Recorder::new(100);
        portal.cancel_on_send = Some(&FLAG);
        let mut engine = engine();
        let err = runner()
            .with_cancel_flag(&FLAG)
            .run(&mut engine, &portal)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { steps: 0 }));
        assert!(!portal.sends.lock().unwrap().is_empty());
        assert_eq!(engine.table().len(), 1);
        assert_eq!(engine.table().get(&Action::new(2, 2, 2)).unwrap().pulls(), 1);
    }
}
