// Services layer - Business logic and orchestration
pub mod activity_stats;
pub mod activity_summary;
pub mod activity_tracker;
pub mod tracking_worker;

pub use activity_stats::ActivityStatsService;
pub use activity_summary::{ActivitySummaryService, SummaryGroupBy, SummaryPeriod};
pub use activity_tracker::{
    ActivityTrackerService, BulkTrackEntry, BulkTrackOutcome, TrackResult, TrackingError,
};
pub use tracking_worker::{RetryPolicy, TrackingQueue, TrackingWorker};
