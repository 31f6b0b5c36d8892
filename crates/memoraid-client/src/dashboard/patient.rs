//! Patient dashboard: today's tasks, the next task card, urgency and SOS.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tokio::sync::watch;

use memoraid_core::lifecycle::TaskAction;
use memoraid_core::models::{DailyTask, RoutineId, TaskStatus, TaskSummary};
use memoraid_core::resolver::{classify_urgency, Urgency};

use super::{shared, Clock, ViewHandle};
use crate::api::CareApi;
use crate::auth::SharedSession;
use crate::config::{ClientConfig, ViewKind};
use crate::notifications::{NotificationListener, Notifier, PushStream};
use crate::scheduler::{RefreshScheduler, RefreshTrigger};
use crate::sos::{Geolocator, SosDispatcher, SosOutcome, SosState};
use crate::tasks::{DayBoard, TaskError, TaskService};

pub const LOAD_ERROR: &str = "Unable to load your routines. Please check your connection.";

#[derive(Debug, Clone, PartialEq)]
pub struct PatientView {
    pub loading: bool,
    pub error: Option<String>,
    pub tasks: Vec<DailyTask>,
    pub next_task: Option<DailyTask>,
    pub urgency: Option<Urgency>,
    pub summary: TaskSummary,
    pub now: Option<DateTime<FixedOffset>>,
}

impl Default for PatientView {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            tasks: Vec::new(),
            next_task: None,
            urgency: None,
            summary: TaskSummary::default(),
            now: None,
        }
    }
}

impl PatientView {
    /// Nothing left to do today.
    pub fn all_done(&self) -> bool {
        !self.loading && self.error.is_none() && self.next_task.is_none()
    }

    fn apply_board(&mut self, board: DayBoard, now: DateTime<FixedOffset>) {
        self.loading = false;
        self.error = None;
        self.summary = board.summary();
        self.next_task = board.next_task().cloned();
        self.tasks = board.tasks;
        self.now = Some(now);
        self.recompute_urgency(now);
    }

    fn recompute_urgency(&mut self, now: DateTime<FixedOffset>) {
        self.urgency = self
            .next_task
            .as_ref()
            .map(|task| classify_urgency(task, now.naive_local()));
    }
}

pub struct PatientDashboard<A, N, G, C> {
    tasks: TaskService<A>,
    sos: SosDispatcher<A, G>,
    listener: Arc<NotificationListener<N>>,
    clock: Arc<C>,
    config: ClientConfig,
    trigger: RefreshTrigger,
    view: Arc<watch::Sender<PatientView>>,
}

impl<A, N, G, C> PatientDashboard<A, N, G, C>
where
    A: CareApi + 'static,
    N: Notifier + 'static,
    G: Geolocator + 'static,
    C: Clock + 'static,
{
    pub fn new(
        api: Arc<A>,
        session: SharedSession,
        notifier: Arc<N>,
        locator: Arc<G>,
        clock: Arc<C>,
        config: ClientConfig,
    ) -> Self {
        let trigger = RefreshTrigger::new();
        let listener = NotificationListener::new(
            notifier,
            config.toast_duration(ViewKind::Patient),
            trigger.clone(),
        );
        Self {
            sos: SosDispatcher::new(Arc::clone(&api), locator, &config),
            tasks: TaskService::new(api, session),
            listener: Arc::new(listener),
            clock,
            config,
            trigger,
            view: shared(PatientView::default()),
        }
    }

    pub fn view(&self) -> watch::Receiver<PatientView> {
        self.view.subscribe()
    }

    pub fn tasks(&self) -> &TaskService<A> {
        &self.tasks
    }

    pub fn sos_state(&self) -> watch::Receiver<SosState> {
        self.sos.state()
    }

    /// Re-fetch today's routines and logs and rebuild the board.
    pub async fn refresh(&self) {
        let now = self.clock.now();
        match self.tasks.fetch_today(None, &now).await {
            Ok(board) => self.view.send_modify(|v| v.apply_board(board, now)),
            Err(e) => {
                tracing::warn!(error = %e, "Patient dashboard refresh failed");
                self.view.send_modify(|v| {
                    v.loading = false;
                    v.tasks.clear();
                    v.next_task = None;
                    v.urgency = None;
                    v.summary = TaskSummary::default();
                    v.error = Some(LOAD_ERROR.to_string());
                });
            }
        }
    }

    /// Clock redraw: urgency moves with the wall clock, no fetch.
    pub fn tick(&self) {
        let now = self.clock.now();
        self.view.send_modify(|v| {
            v.now = Some(now);
            v.recompute_urgency(now);
        });
    }

    /// Mark the next task done, then reload.
    pub async fn complete_next(&self) -> Result<(), TaskError> {
        let next = self.view.borrow().next_task.clone();
        match next {
            Some(task) => self.act(&task, TaskAction::Complete).await,
            None => Ok(()),
        }
    }

    /// Undo a completion made by mistake.
    pub async fn undo(&self, routine_id: RoutineId) -> Result<(), TaskError> {
        let task = self
            .view
            .borrow()
            .tasks
            .iter()
            .find(|t| t.routine_id == routine_id && t.status == TaskStatus::Completed)
            .cloned();
        match task {
            Some(task) => self.act(&task, TaskAction::Reopen).await,
            None => Ok(()),
        }
    }

    async fn act(&self, task: &DailyTask, action: TaskAction) -> Result<(), TaskError> {
        let date = self.clock.now().date_naive();
        let result = self.tasks.apply(None, task, action, date).await.map(|_| ());
        if let Err(e) = &result {
            tracing::warn!(routine = task.routine_id, error = %e, "Task update failed");
        }
        self.refresh().await;
        result
    }

    pub async fn sos(&self) -> SosOutcome {
        self.sos.trigger().await
    }

    /// Start polling (data and clock) and, if given, the push listener.
    pub fn start(self: &Arc<Self>, push: Option<PushStream>) -> ViewHandle {
        let mut scheduler = RefreshScheduler::new();

        let dashboard = Arc::clone(self);
        scheduler.poll(
            "patient-data",
            self.config.refresh_period(ViewKind::Patient),
            self.trigger.clone(),
            move || {
                let dashboard = Arc::clone(&dashboard);
                async move { dashboard.refresh().await }
            },
        );

        let dashboard = Arc::clone(self);
        scheduler.every("patient-clock", self.config.clock_tick(), move || {
            dashboard.tick();
            std::future::ready(())
        });

        let listener = push.map(|stream| Arc::clone(&self.listener).spawn(stream));
        tracing::info!("Patient dashboard started");
        ViewHandle::new(scheduler, listener, self.listener.toasts())
    }
}
