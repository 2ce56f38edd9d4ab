use parking_lot::RwLock;
use sched_core::{Dataset, ScheduleRun, Scheduler};
use std::collections::HashMap;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed { result: ScheduleRun },
    Failed { message: String },
}

#[derive(Clone)]
pub struct InMemJobs<S: Scheduler> {
    inner: std::sync::Arc<RwLock<HashMap<String, JobStatus>>>,
    scheduler: std::sync::Arc<S>,
}

impl<S: Scheduler> InMemJobs<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            inner: Default::default(),
            scheduler: std::sync::Arc::new(scheduler),
        }
    }

    pub fn enqueue(&self, dataset: Dataset) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let scheduler = self.scheduler.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            {
                let mut w = map.write();
                w.insert(id_for_task.clone(), JobStatus::Running);
            }
            match scheduler.schedule(dataset).await {
                Ok(res) => {
                    info!(job = %id_for_task, "job completed");
                    map.write()
                        .insert(id_for_task, JobStatus::Completed { result: res });
                }
                Err(e) => {
                    error!(?e, job = %id_for_task, "job failed");
                    map.write().insert(
                        id_for_task,
                        JobStatus::Failed {
                            message: e.to_string(),
                        },
                    );
                }
            }
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl Scheduler for Echo {
        async fn schedule(&self, dataset: Dataset) -> anyhow::Result<ScheduleRun> {
            if dataset.requests.is_empty() {
                anyhow::bail!("nothing to schedule");
            }
            Ok(ScheduleRun {
                blocks: vec![],
                required_courses: Default::default(),
                allocation: Default::default(),
                analysis: Default::default(),
            })
        }
    }

    async fn wait_done<S: Scheduler>(jobs: &InMemJobs<S>, id: &JobId) -> JobStatus {
        for _ in 0..100 {
            match jobs.get(&id.0) {
                Some(JobStatus::Queued) | Some(JobStatus::Running) | None => {
                    tokio::time::sleep(Duration::from_millis(10)).await
                }
                Some(done) => return done,
            }
        }
        panic!("job {} did not finish", id.0);
    }

    #[tokio::test]
    async fn successful_job_stores_result() {
        let jobs = InMemJobs::new(Echo);
        let ds = Dataset {
            requests: vec![Default::default()],
            ..Default::default()
        };
        let id = jobs.enqueue(ds);
        assert!(matches!(wait_done(&jobs, &id).await, JobStatus::Completed { .. }));
    }

    #[tokio::test]
    async fn failing_job_keeps_message() {
        let jobs = InMemJobs::new(Echo);
        let id = jobs.enqueue(Dataset::default());
        match wait_done(&jobs, &id).await {
            JobStatus::Failed { message } => assert_eq!(message, "nothing to schedule"),
            other => panic!("unexpected status {other:?}"),
        }
        assert!(jobs.get("missing").is_none());
    }
}
