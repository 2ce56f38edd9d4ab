use std::sync::Arc;
use allocator::BlockAllocator;
use jobs::InMemJobs;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<BlockAllocator>>,
}

impl AppState {
    pub fn new_default() -> Self {
        let jobs = InMemJobs::new(BlockAllocator::new());
        Self { jobs: Arc::new(jobs) }
    }
}
