// Dashboard feed API consumed by the rendering front end

pub mod dashboard;

pub use dashboard::{create_dashboard_router, DashboardAppState};
