//! `SchedulerActor`: daily and interval triggers for fleet checks
//!
//! Each trigger is a task that sleeps, runs a check, then re-arms, so a slow
//! check pushes the next one back instead of overlapping it.

use std::time::Duration;

use chrono::Local;
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use updock_api::CheckTrigger;

use crate::actor::fleet::FleetActor;
use crate::config::{DailyTime, ScheduleConfig};
use crate::error::CoreError;
use crate::message::{GetSchedule, RunFleetCheck, ScheduleStatus, SetCheckInterval};
use crate::scheduler::next_daily_delay;

/// Arguments for spawning a `SchedulerActor`
pub struct SchedulerActorArgs {
    /// Actor that runs the checks
    pub fleet: ActorRef<FleetActor>,
    /// Initial schedule
    pub schedule: ScheduleConfig,
}

pub struct SchedulerActor {
    fleet: ActorRef<FleetActor>,
    interval_minutes: u32,
    daily: DailyTime,
    interval_task: Option<JoinHandle<()>>,
    daily_task: Option<JoinHandle<()>>,
}

impl SchedulerActor {
    fn arm_interval(&mut self) {
        if let Some(task) = self.interval_task.take() {
            task.abort();
        }
        if self.interval_minutes == 0 {
            info!("interval checks disabled");
            return;
        }

        let period = Duration::from_secs(u64::from(self.interval_minutes) * 60);
        let fleet = self.fleet.clone();
        info!(minutes = self.interval_minutes, "interval checks scheduled");
        self.interval_task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                run_check(&fleet, CheckTrigger::Interval).await;
            }
        }));
    }

    fn arm_daily(&mut self) {
        if let Some(task) = self.daily_task.take() {
            task.abort();
        }

        let at = self.daily.as_naive_time();
        let fleet = self.fleet.clone();
        info!(at = %self.daily, "daily check scheduled");
        self.daily_task = Some(tokio::spawn(async move {
            loop {
                let delay = next_daily_delay(&Local::now(), at);
                debug!(secs = delay.as_secs(), "next daily check");
                tokio::time::sleep(delay).await;
                run_check(&fleet, CheckTrigger::Daily).await;
            }
        }));
    }

    fn status(&self) -> ScheduleStatus {
        ScheduleStatus {
            interval_minutes: self.interval_minutes,
            daily_hour: self.daily.hour(),
            daily_minute: self.daily.minute(),
        }
    }
}

async fn run_check(fleet: &ActorRef<FleetActor>, trigger: CheckTrigger) {
    info!(%trigger, "running scheduled update check");
    if let Err(e) = fleet.ask(RunFleetCheck { trigger }).await {
        error!(%trigger, error = %e, "scheduled update check failed");
    }
}

impl Actor for SchedulerActor {
    type Args = SchedulerActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(id = %actor_ref.id(), "SchedulerActor starting");

        let mut actor = Self {
            fleet: args.fleet,
            interval_minutes: args.schedule.interval_minutes,
            daily: args.schedule.daily,
            interval_task: None,
            daily_task: None,
        };
        actor.arm_daily();
        actor.arm_interval();
        Ok(actor)
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, "SchedulerActor stopping");
        for task in [self.interval_task.take(), self.daily_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<SetCheckInterval> for SchedulerActor {
    type Reply = ScheduleStatus;

    async fn handle(
        &mut self,
        msg: SetCheckInterval,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.interval_minutes = msg.minutes;
        self.arm_interval();
        self.status()
    }
}

impl Message<GetSchedule> for SchedulerActor {
    type Reply = ScheduleStatus;

    async fn handle(
        &mut self,
        _msg: GetSchedule,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.status()
    }
}
