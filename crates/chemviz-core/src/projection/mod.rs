//! View projection.
//!
//! Pure derivation of the dashboard's presentation artifacts from the
//! selected upload and the search text. Holds no state of its own.

mod view;

pub use view::{ChartData, DashboardView, Insight, StatCards, filter_rows, top_equipment_type};
