pub mod analytics;
pub mod notify;

pub use analytics::{AnalyticsEvent, AnalyticsHandle, AnalyticsSink};
pub use notify::{NotificationRequest, NotificationSender};
