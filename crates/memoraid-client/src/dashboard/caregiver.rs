//! Caregiver overview: per-patient stats, overview urgency, quick actions,
//! alerts and the routine calendar.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset};
use tokio::sync::watch;

use memoraid_core::lifecycle::TaskAction;
use memoraid_core::models::{AlertId, CaregiverStats, DailyTask, TaskStatus};
use memoraid_core::resolver::{classify_overview, OverviewUrgency};

use super::{shared, Clock, ViewHandle};
use crate::alerts::AlertService;
use crate::api::{ApiError, CareApi};
use crate::auth::SharedSession;
use crate::config::{ClientConfig, ViewKind};
use crate::notifications::{NotificationListener, Notifier, PushStream};
use crate::scheduler::{RefreshScheduler, RefreshTrigger};
use crate::tasks::{DayBoard, StatusWrite, TaskError, TaskResult, TaskService, QUICK_ACTION_NOTE};

pub const STATS_ERROR: &str = "Unable to load care statistics.";
pub const QUICK_ACTION_DENIED: &str =
    "Only primary caregivers may perform this quick-action. Please coordinate with the workspace owner.";
pub const QUICK_ACTION_ERROR: &str = "Could not update the task. Please try again.";
pub const ALERT_ACK_ERROR: &str = "Could not acknowledge the alert. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct CaregiverView {
    pub loading: bool,
    pub error: Option<String>,
    pub stats: CaregiverStats,
    pub now: Option<DateTime<FixedOffset>>,
}

impl Default for CaregiverView {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            stats: CaregiverStats::default(),
            now: None,
        }
    }
}

impl CaregiverView {
    /// Badge for a patient's next task.
    pub fn overview_urgency(&self, patient_id: i64) -> Option<OverviewUrgency> {
        let now = self.now?;
        let patient = self.stats.patient(patient_id)?;
        patient.next_task.as_ref()?;
        Some(classify_overview(
            patient.next_task_time_label(),
            now.naive_local(),
        ))
    }
}

pub struct CaregiverOverview<A, N, C> {
    tasks: TaskService<A>,
    alerts: AlertService<A>,
    listener: Arc<NotificationListener<N>>,
    clock: Arc<C>,
    config: ClientConfig,
    trigger: RefreshTrigger,
    view: Arc<watch::Sender<CaregiverView>>,
}

impl<A, N, C> CaregiverOverview<A, N, C>
where
    A: CareApi + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    pub fn new(
        api: Arc<A>,
        session: SharedSession,
        notifier: Arc<N>,
        clock: Arc<C>,
        config: ClientConfig,
    ) -> Self {
        let trigger = RefreshTrigger::new();
        let listener = NotificationListener::new(
            notifier,
            config.toast_duration(ViewKind::Caregiver),
            trigger.clone(),
        );
        Self {
            alerts: AlertService::new(Arc::clone(&api)),
            tasks: TaskService::new(api, session),
            listener: Arc::new(listener),
            clock,
            config,
            trigger,
            view: shared(CaregiverView::default()),
        }
    }

    pub fn view(&self) -> watch::Receiver<CaregiverView> {
        self.view.subscribe()
    }

    /// Routine management and status changes outside the overview.
    pub fn tasks(&self) -> &TaskService<A> {
        &self.tasks
    }

    pub fn alerts(&self) -> &AlertService<A> {
        &self.alerts
    }

    pub async fn refresh(&self) {
        let now = self.clock.now();
        match self.tasks.api().caregiver_stats().await {
            Ok(stats) => self.view.send_modify(|v| {
                v.loading = false;
                v.error = None;
                v.stats = stats;
                v.now = Some(now);
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Caregiver stats refresh failed");
                self.view.send_modify(|v| {
                    v.loading = false;
                    v.stats = CaregiverStats::default();
                    v.error = Some(STATS_ERROR.to_string());
                    v.now = Some(now);
                });
            }
        }
    }

    /// Mark a patient's next task completed from the overview card.
    ///
    /// Secondary caregivers get an explanation instead of a request.
    pub async fn mark_next_completed(&self, patient_id: i64) -> Result<(), TaskError> {
        let target = self
            .view
            .borrow()
            .stats
            .patient(patient_id)
            .map(|p| (p.can_edit(), p.next_task_id));
        let Some((can_edit, next_task_id)) = target else {
            return Ok(());
        };
        if !can_edit {
            self.show_error(QUICK_ACTION_DENIED);
            return Err(TaskError::PermissionDenied);
        }
        let Some(routine) = next_task_id else {
            return Ok(());
        };

        let write = StatusWrite {
            routine,
            log: None,
            status: TaskStatus::Completed,
            date: self.clock.now().date_naive(),
            notes: Some(QUICK_ACTION_NOTE.to_string()),
        };
        let result = self.tasks.write_status(Some(patient_id), write).await;
        self.refresh().await;
        if let Err(e) = &result {
            tracing::warn!(patient = patient_id, error = %e, "Quick action failed");
            let forbidden = matches!(e, TaskError::Api(ApiError::Status { status: 403, .. }));
            self.show_error(if forbidden { QUICK_ACTION_DENIED } else { QUICK_ACTION_ERROR });
        }
        result.map(|_| ())
    }

    /// Mark an alert handled, then reload the stats. A failed reload shows
    /// the stats error, not an acknowledgment error.
    pub async fn acknowledge_alert(&self, id: AlertId) -> Result<(), ApiError> {
        if let Err(e) = self.tasks.api().acknowledge_alert(id).await {
            tracing::warn!(alert = id, error = %e, "Alert acknowledgment failed");
            self.show_error(ALERT_ACK_ERROR);
            return Err(e);
        }
        self.refresh().await;
        Ok(())
    }

    /// Today's tracker for one patient, including logs of deleted routines.
    pub async fn tracker(&self, patient_id: i64) -> TaskResult<DayBoard> {
        self.tasks.fetch_tracker(Some(patient_id), &self.clock.now()).await
    }

    /// One calendar day for a patient.
    pub async fn calendar_day(&self, patient_id: i64, date: NaiveDate) -> TaskResult<DayBoard> {
        let offset = self.clock.now().offset().fix();
        self.tasks.fetch_calendar(Some(patient_id), date, offset).await
    }

    /// Acknowledge a missed task on the calendar and reload the day.
    pub async fn escalate(
        &self,
        patient_id: i64,
        task: &DailyTask,
        date: NaiveDate,
    ) -> TaskResult<DayBoard> {
        self.tasks
            .apply(Some(patient_id), task, TaskAction::Escalate, date)
            .await?;
        self.calendar_day(patient_id, date).await
    }

    /// Calendar checkbox: complete, or undo a completion.
    pub async fn toggle_completion(
        &self,
        patient_id: i64,
        task: &DailyTask,
        date: NaiveDate,
    ) -> TaskResult<DayBoard> {
        let action = if task.status == TaskStatus::Completed {
            TaskAction::Reopen
        } else {
            TaskAction::Complete
        };
        self.tasks.apply(Some(patient_id), task, action, date).await?;
        self.calendar_day(patient_id, date).await
    }

    pub fn clear_error(&self) {
        self.view.send_modify(|v| v.error = None);
    }

    fn show_error(&self, message: &str) {
        self.view.send_modify(|v| v.error = Some(message.to_string()));
    }

    /// Start the stats polling loop and, if given, the push listener.
    pub fn start(self: &Arc<Self>, push: Option<PushStream>) -> ViewHandle {
        let mut scheduler = RefreshScheduler::new();

        let overview = Arc::clone(self);
        scheduler.poll(
            "caregiver-stats",
            self.config.refresh_period(ViewKind::Caregiver),
            self.trigger.clone(),
            move || {
                let overview = Arc::clone(&overview);
                async move { overview.refresh().await }
            },
        );

        let listener = push.map(|stream| Arc::clone(&self.listener).spawn(stream));
        tracing::info!("Caregiver overview started");
        ViewHandle::new(scheduler, listener, self.listener.toasts())
    }
}
