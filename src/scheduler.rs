//! Timer/scheduler engine.
//!
//! Replaces blocking sleeps in the control loop with fixed-interval tasks.
//! The scheduler notifies a [`SchedulerDelegate`] when tasks are due; the
//! runtime implements the delegate and does the actual work.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Task timing                           │
//! │                                                              │
//! │  ┌──────────────┐  ┌────────────┐  ┌────────────┐  ┌───────┐ │
//! │  │ThermalSample │  │ RemotePoll │  │ GateUpdate │  │  LED  │ │
//! │  │   2000 ms    │  │  1000 ms   │  │   100 ms   │  │ 500 ms│ │
//! │  └──────┬───────┘  └─────┬──────┘  └─────┬──────┘  └───┬───┘ │
//! │         │ arms           │               │             │     │
//! │         ▼                │               │             │     │
//! │  ┌──────────────┐        │               │             │     │
//! │  │ ThermalRead  │        │               │             │     │
//! │  │ one-shot 750 │        │               │             │     │
//! │  └──────┬───────┘        │               │             │     │
//! │         ▼                ▼               ▼             ▼     │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                 SchedulerDelegate                      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use log::{debug, info, trace};

use crate::app::ports::SchedulerDelegate;
use crate::config::GateConfig;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// Work items the control loop runs on a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Start a temperature conversion.
    ThermalSample,
    /// Read back the conversion.
    ThermalRead,
    /// Fetch inbound remote messages.
    RemotePoll,
    /// Travel timer check.
    GateUpdate,
    /// Advance the status LED pattern.
    StatusLed,
}

impl Task {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ThermalSample => "thermal-sample",
            Self::ThermalRead => "thermal-read",
            Self::RemotePoll => "remote-poll",
            Self::GateUpdate => "gate-update",
            Self::StatusLed => "status-led",
        }
    }
}

/// A single schedule entry.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub task: Task,
    pub kind: ScheduleKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Fire on the first tick, then every `interval_ms`.
    Periodic { interval_ms: u32 },
    /// Fire once `delay_ms` after being added, then auto-disable.
    OneShot { delay_ms: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 6;

pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone, Copy)]
struct ScheduleEntry {
    schedule: Schedule,
    /// When the entry was added or last re-armed.
    armed_at_ms: u64,
    /// Last periodic fire.
    last_fire_ms: Option<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None; MAX_SCHEDULES],
        }
    }

    /// The controller's standard periodic tasks.
    pub fn from_config(config: &GateConfig, now_ms: u64) -> Self {
        let mut sched = Self::new();
        for (task, interval_ms) in [
            (Task::GateUpdate, config.loop_interval_ms),
            (Task::ThermalSample, config.sample_interval_ms),
            (Task::RemotePoll, config.remote_poll_interval_ms),
            (Task::StatusLed, config.led_blink_interval_ms),
        ] {
            sched.add(
                Schedule {
                    task,
                    kind: ScheduleKind::Periodic { interval_ms },
                    enabled: true,
                },
                now_ms,
            );
        }
        sched
    }

    /// Add a schedule. Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule, now_ms: u64) -> Option<usize> {
        let (i, slot) = self
            .schedules
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())?;
        info!("Scheduler: added '{}' at slot {}", schedule.task.label(), i);
        *slot = Some(ScheduleEntry {
            schedule,
            armed_at_ms: now_ms,
            last_fire_ms: None,
        });
        Some(i)
    }

    /// Arm a one-shot for `task`, reusing its slot if one already exists.
    pub fn arm_one_shot(&mut self, task: Task, delay_ms: u32, now_ms: u64) -> Option<usize> {
        let schedule = Schedule {
            task,
            kind: ScheduleKind::OneShot { delay_ms },
            enabled: true,
        };
        let existing = self.schedules.iter_mut().enumerate().find(|(_, slot)| {
            slot.is_some_and(|e| {
                e.schedule.task == task && matches!(e.schedule.kind, ScheduleKind::OneShot { .. })
            })
        });
        if let Some((i, slot)) = existing {
            *slot = Some(ScheduleEntry {
                schedule,
                armed_at_ms: now_ms,
                last_fire_ms: None,
            });
            debug!("Scheduler: re-armed '{}' ({} ms)", task.label(), delay_ms);
            return Some(i);
        }
        self.add(schedule, now_ms)
    }

    /// Call once per loop iteration; due tasks go to `delegate` in slot order.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        for slot in &mut self.schedules {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };
            let task = entry.schedule.task;

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_ms } => {
                    let due = entry
                        .last_fire_ms
                        .is_none_or(|last| now_ms.saturating_sub(last) >= u64::from(interval_ms));
                    if due {
                        trace!("Scheduler: '{}' periodic fire", task.label());
                        entry.last_fire_ms = Some(now_ms);
                        delegate.on_task_due(task, now_ms);
                    }
                }

                ScheduleKind::OneShot { delay_ms } => {
                    if now_ms.saturating_sub(entry.armed_at_ms) >= u64::from(delay_ms) {
                        debug!("Scheduler: '{}' one-shot fired", task.label());
                        entry.schedule.enabled = false;
                        delegate.on_task_due(task, now_ms);
                    }
                }
            }
        }
    }

    /// Whether `task` has an enabled schedule.
    pub fn is_armed(&self, task: Task) -> bool {
        self.schedules
            .iter()
            .flatten()
            .any(|e| e.schedule.enabled && e.schedule.task == task)
    }

    /// Number of active (enabled) schedules.
    pub fn active_count(&self) -> usize {
        self.schedules
            .iter()
            .flatten()
            .filter(|e| e.schedule.enabled)
            .count()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
