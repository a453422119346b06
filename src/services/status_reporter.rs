//! Periodic read-only status line, the headless counterpart of a dashboard
//! refresh loop.

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::data::store::SignalStore;

pub struct StatusReporter {
    store: SignalStore,
    schedule: String,
}

impl StatusReporter {
    pub fn new(store: SignalStore, schedule: impl Into<String>) -> Self {
        Self {
            store,
            schedule: schedule.into(),
        }
    }

    /// Starts the cron job. The returned scheduler must be kept alive.
    pub async fn start(&self) -> Result<JobScheduler, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;
        let store = self.store.clone();

        let job = Job::new_async(self.schedule.as_str(), move |_uuid, _l| {
            let store = store.clone();
            Box::pin(async move {
                info!("{}", Self::status_line(&store));
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("🔔 Status reporter started with schedule: {}", self.schedule);
        Ok(scheduler)
    }

    pub fn status_line(store: &SignalStore) -> String {
        let stats = store.stats();
        let streak = match stats.streak_result {
            Some(result) => format!("{} x{}", result, stats.current_streak),
            None => "-".to_string(),
        };
        let last = match store.latest() {
            Some(signal) => format!(
                "{} {} @ {}",
                signal.period_id(),
                signal.result(),
                signal.received_at().format("%H:%M:%S")
            ),
            None => "no signals received yet".to_string(),
        };

        format!(
            "📊 Total: {} | ✅ Wins: {} | ❌ Losses: {} | 📈 Win rate: {:.2}% | 🔥 Streak: {} | 📋 Last: {}",
            stats.total, stats.wins, stats.losses, stats.win_rate, streak, last
        )
    }
}
