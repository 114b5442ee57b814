use serde::Serialize;

use crate::history::HistoryState;
use crate::upload::{RowRecord, Summary, TypeDistribution, UploadRecord};

/// The four headline numbers.
///
/// Averages keep full precision; rounding happens only in the `display_*`
/// accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCards {
    pub total_records: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
}

impl StatCards {
    pub fn from_summary(summary: &Summary) -> Self {
        Self {
            total_records: summary.total_records,
            avg_flowrate: summary.avg_flowrate,
            avg_pressure: summary.avg_pressure,
            avg_temperature: summary.avg_temperature,
        }
    }

    pub fn display_flowrate(&self) -> String {
        format!("{:.2}", self.avg_flowrate)
    }

    pub fn display_pressure(&self) -> String {
        format!("{:.2}", self.avg_pressure)
    }

    pub fn display_temperature(&self) -> String {
        format!("{:.2}", self.avg_temperature)
    }
}

/// Highlight of the most frequent equipment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub equipment_type: String,
    pub count: u64,
}

impl Insight {
    pub fn sentence(&self) -> String {
        format!(
            "Most common equipment is {} with {} units.",
            self.equipment_type, self.count
        )
    }
}

/// Bar chart series: categories and counts in distribution order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChartData {
    pub categories: Vec<String>,
    pub values: Vec<u64>,
}

impl ChartData {
    pub fn from_distribution(distribution: &TypeDistribution) -> Self {
        let (categories, values) = distribution
            .iter()
            .map(|(name, count)| (name.to_string(), count))
            .unzip();
        Self { categories, values }
    }
}

/// Returns the type with the highest count. Among ties the entry that comes
/// first in distribution order wins.
pub fn top_equipment_type(distribution: &TypeDistribution) -> Option<Insight> {
    let mut best: Option<(&str, u64)> = None;
    for (name, count) in distribution.iter() {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((name, count));
        }
    }

    best.map(|(name, count)| Insight {
        equipment_type: name.to_string(),
        count,
    })
}

/// Rows whose serialized, lower-cased content contains `filter`
/// case-insensitively. An empty filter keeps every row.
pub fn filter_rows<'a>(rows: &'a [RowRecord], filter: &str) -> Vec<&'a RowRecord> {
    if filter.is_empty() {
        return rows.iter().collect();
    }

    let needle = filter.to_lowercase();
    rows.iter()
        .filter(|row| row.search_text().contains(&needle))
        .collect()
}

/// Everything the dashboard renders for the selected upload.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    pub upload: &'a UploadRecord,
    pub stats: StatCards,
    pub insight: Option<Insight>,
    pub chart: ChartData,
    pub rows: Vec<&'a RowRecord>,
}

impl<'a> DashboardView<'a> {
    pub fn of_record(record: &'a UploadRecord, search: &str) -> Self {
        Self {
            upload: record,
            stats: StatCards::from_summary(&record.summary),
            insight: top_equipment_type(&record.summary.type_distribution),
            chart: ChartData::from_distribution(&record.summary.type_distribution),
            rows: filter_rows(&record.rows, search),
        }
    }

    /// Projects the selected upload. `None` when nothing is selected, which
    /// is a valid state and not a failure.
    pub fn project(history: &'a HistoryState, search: &str) -> Option<Self> {
        history
            .selected()
            .map(|record| Self::of_record(record, search))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadId;
    use chrono::Utc;
    use serde_json::json;

    fn row(value: serde_json::Value) -> RowRecord {
        serde_json::from_value(value).unwrap()
    }

    fn sample_rows() -> Vec<RowRecord> {
        vec![
            row(json!({"Equipment Name": "Pump-1", "Type": "Pump", "Flowrate": 120, "Pressure": 5.2, "Temperature": 110})),
            row(json!({"Equipment Name": "Valve-7", "Type": "Valve", "Flowrate": 60, "Pressure": 4.1, "Temperature": 105})),
            row(json!({"Equipment Name": "HX-2", "Type": "HeatExchanger", "Flowrate": 150, "Pressure": 6.0, "Temperature": 130})),
        ]
    }

    #[test]
    fn tie_goes_to_first_inserted() {
        let distribution: TypeDistribution = [("Pump", 3), ("Valve", 3)].into_iter().collect();
        let insight = top_equipment_type(&distribution).unwrap();
        assert_eq!(insight.equipment_type, "Pump");
        assert_eq!(insight.count, 3);
    }

    #[test]
    fn tie_break_is_not_alphabetical() {
        let distribution: TypeDistribution =
            [("Valve", 2), ("Compressor", 4), ("Pump", 4)].into_iter().collect();
        let insight = top_equipment_type(&distribution).unwrap();
        assert_eq!(insight.equipment_type, "Compressor");
        assert_eq!(
            insight.sentence(),
            "Most common equipment is Compressor with 4 units."
        );
    }

    #[test]
    fn empty_distribution_has_no_insight() {
        assert!(top_equipment_type(&TypeDistribution::new()).is_none());
    }

    #[test]
    fn chart_follows_distribution_order() {
        let distribution: TypeDistribution =
            [("Valve", 1), ("Pump", 9), ("Reactor", 4)].into_iter().collect();
        let chart = ChartData::from_distribution(&distribution);
        assert_eq!(chart.categories, vec!["Valve", "Pump", "Reactor"]);
        assert_eq!(chart.values, vec![1, 9, 4]);
    }

    #[test]
    fn stat_cards_round_for_display_only() {
        let summary = Summary {
            total_records: 10,
            avg_flowrate: 119.8765,
            avg_pressure: 5.0,
            avg_temperature: 110.333,
            type_distribution: TypeDistribution::new(),
        };
        let stats = StatCards::from_summary(&summary);
        assert_eq!(stats.display_flowrate(), "119.88");
        assert_eq!(stats.display_pressure(), "5.00");
        assert_eq!(stats.display_temperature(), "110.33");
        assert_eq!(stats.avg_flowrate, 119.8765);
    }

    #[test]
    fn empty_filter_keeps_all_rows() {
        let rows = sample_rows();
        assert_eq!(filter_rows(&rows, "").len(), 3);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let rows = sample_rows();
        let matched = filter_rows(&rows, "VALVE");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].equipment_name(), "Valve-7");
    }

    #[test]
    fn filter_matches_serialized_keys_too() {
        let rows = sample_rows();
        // Every row carries the "Temperature" key.
        assert_eq!(filter_rows(&rows, "temperature").len(), 3);
        assert!(filter_rows(&rows, "no such equipment").is_empty());
    }

    #[test]
    fn filtered_rows_are_subset_matching_lowercase_needle() {
        let rows = sample_rows();
        for needle in ["p", "Pump", "1", "hx-", "6.0", "\"type\""] {
            let matched = filter_rows(&rows, needle);
            assert!(matched.len() <= rows.len());
            for candidate in &rows {
                let included = matched.iter().any(|m| std::ptr::eq(*m, candidate));
                assert_eq!(
                    included,
                    candidate.search_text().contains(&needle.to_lowercase()),
                    "needle {:?}",
                    needle
                );
            }
        }
    }

    #[test]
    fn nothing_selected_renders_nothing() {
        let history = HistoryState::new();
        assert!(DashboardView::project(&history, "").is_none());
    }

    #[test]
    fn projection_reads_selected_upload() {
        let mut history = HistoryState::new();
        history.on_history_fetched(vec![UploadRecord {
            id: UploadId(1),
            name: "plant.csv".to_string(),
            uploaded_at: Utc::now(),
            rows: sample_rows(),
            summary: Summary {
                total_records: 3,
                avg_flowrate: 110.0,
                avg_pressure: 5.1,
                avg_temperature: 115.0,
                type_distribution: [("Pump", 1), ("Valve", 1), ("HeatExchanger", 1)]
                    .into_iter()
                    .collect(),
            },
        }]);

        let view = DashboardView::project(&history, "pump").unwrap();
        assert_eq!(view.stats.total_records, 3);
        assert_eq!(view.insight.unwrap().equipment_type, "Pump");
        assert_eq!(view.chart.categories.len(), 3);
        assert_eq!(view.rows.len(), 1);
    }
}
