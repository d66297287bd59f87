pub mod snapshot;
pub mod stats;

pub use snapshot::AnalyticsSnapshot;
pub use stats::{
    category_breakdown, county_breakdown, daily_trends, CategoryStats, CountyStats, DailyTrend,
    DashboardStats, MonthlyTrend, RecentActivity,
};
