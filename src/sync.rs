//! Keeps a user's leaderboard snapshot in step with the portal.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::aggregate::compute_average;
use crate::attendance::extract_attendance;
use crate::db::SnapshotStore;
use crate::error::{PortalError, Result};
use crate::grades::extract_grades;
use crate::models::{Identity, Session, UserSnapshot};
use crate::pages::{extract_school_name, is_authenticated_page};
use crate::portal::{Endpoint, PageFetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    NotOptedIn,
    UsernameNotSet,
    UpToDate,
    Refreshed,
}

pub struct SyncService<F, S> {
    fetcher: F,
    store: S,
    refresh_window: Duration,
}

impl<F: PageFetcher, S: SnapshotStore> SyncService<F, S> {
    pub fn new(fetcher: F, store: S, refresh_window: Duration) -> Self {
        Self {
            fetcher,
            store,
            refresh_window,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The session is valid when the portal renders its logged-in menu and
    /// the stored internal id still belongs to this portal user.
    pub async fn verify_session(&self, identity: &Identity, session: &Session) -> Result<bool> {
        Ok(self.verified_menu(identity, session).await?.is_some())
    }

    /// Menu body of a verified session, reused by the caller for the school name.
    async fn verified_menu(&self, identity: &Identity, session: &Session) -> Result<Option<String>> {
        let menu = self.fetcher.fetch(session, Endpoint::Menu).await?;
        if !is_authenticated_page(&menu) {
            return Ok(None);
        }
        let snapshot = self.store.load_snapshot(&identity.user_id).await?;
        let owned = snapshot.is_some_and(|s| s.internal_id == identity.internal_id);
        Ok(owned.then_some(menu))
    }

    pub async fn refresh(
        &self,
        identity: &Identity,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome> {
        let Some(menu) = self.verified_menu(identity, session).await? else {
            return Err(PortalError::InvalidSession);
        };
        let snapshot = self
            .store
            .load_snapshot(&identity.user_id)
            .await?
            .ok_or_else(|| PortalError::UnknownUser(identity.user_id.clone()))?;

        if !snapshot.accepted_social_terms {
            return Ok(SyncOutcome::NotOptedIn);
        }

        if snapshot.school.is_none() {
            if let Some(school) = extract_school_name(&menu) {
                self.store.save_school(&snapshot.user_id, &school).await?;
            }
        }

        let has_name = snapshot.name.is_some();
        let stale = is_stale(snapshot.last_update, now, self.refresh_window);
        let plan = RefreshPlan::for_snapshot(&snapshot, has_name && stale);

        if plan.average || plan.attendance {
            self.apply(&snapshot.user_id, session, plan, now).await?;
        }

        let outcome = if !has_name {
            SyncOutcome::UsernameNotSet
        } else if !stale {
            SyncOutcome::UpToDate
        } else {
            SyncOutcome::Refreshed
        };
        info!(user = %identity.internal_id, ?outcome, "snapshot sync finished");
        Ok(outcome)
    }

    async fn apply(
        &self,
        user_id: &str,
        session: &Session,
        plan: RefreshPlan,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let grades_page = async {
            if plan.average {
                self.fetcher.fetch(session, Endpoint::Grades).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let attendance_page = async {
            if plan.attendance {
                self.fetcher.fetch(session, Endpoint::Attendance).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let (grades_page, attendance_page) = tokio::try_join!(grades_page, attendance_page)?;

        if let Some(html) = grades_page {
            let grades = extract_grades(&html, None)?;
            match compute_average(&grades) {
                Some(average) => self.store.save_average(user_id, average, now).await?,
                None => warn!(user = %user_id, grades = grades.len(), "no counting grades, average left unchanged"),
            }
        }

        if let Some(html) = attendance_page {
            let summary = extract_attendance(&html);
            self.store.save_attendance(user_id, summary, now).await?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RefreshPlan {
    average: bool,
    attendance: bool,
}

impl RefreshPlan {
    fn for_snapshot(snapshot: &UserSnapshot, due: bool) -> Self {
        Self {
            average: due || snapshot.average.is_none(),
            attendance: due || snapshot.absence_hours.is_none() || snapshot.tardy_count.is_none(),
        }
    }
}

pub fn is_stale(last_update: Option<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) -> bool {
    match last_update {
        Some(at) => now - at >= window,
        None => true,
    }
}
