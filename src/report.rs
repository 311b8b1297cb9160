//! Tag report rendering.
//!
//! The report is a title line followed by one line per node:
//! `<node>[,<tag>]*`. Nodes are ordered case-insensitively, tags by plain
//! string order with duplicates dropped, so the same mapping always renders to
//! the same bytes regardless of how it was built.
use chrono::NaiveDate;

use crate::tagmap::TagMapping;

/// strftime pattern of the title's date stamp.
pub const DATE_FORMAT: &str = "%m-%d-%y";

/// Presentation inputs of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportParameters {
    customer: String,
    node_group: String,
    date_stamp: String,
}

impl ReportParameters {
    pub fn new(
        customer: impl Into<String>,
        node_group: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self::with_date_stamp(customer, node_group, date.format(DATE_FORMAT).to_string())
    }

    /// Use an already formatted date stamp verbatim.
    pub fn with_date_stamp(
        customer: impl Into<String>,
        node_group: impl Into<String>,
        date_stamp: impl Into<String>,
    ) -> Self {
        Self {
            customer: customer.into(),
            node_group: node_group.into(),
            date_stamp: date_stamp.into(),
        }
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn node_group(&self) -> &str {
        &self.node_group
    }

    pub fn date_stamp(&self) -> &str {
        &self.date_stamp
    }

    pub fn title(&self) -> String {
        format!(
            "Tags for all nodes at {} in SmartNode group \"{}\" as of {}",
            self.customer, self.node_group, self.date_stamp
        )
    }
}

/// Nodes in report order, each with its sorted, deduplicated tags.
pub fn sorted_rows(tags: &TagMapping) -> Vec<(&str, Vec<&str>)> {
    let mut rows: Vec<(&str, Vec<&str>)> = tags
        .iter()
        .map(|(node, values)| {
            let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
            values.sort_unstable();
            // Earlier reports repeated a tag once per occurrence in the listing;
            // these list each tag once per node.
            values.dedup();
            (node.as_str(), values)
        })
        .collect();
    // Ties on the folded key fall back to the raw key so the order is total.
    rows.sort_by_cached_key(|(node, _)| (node.to_lowercase(), node.to_string()));
    rows
}

/// Render one report line for a node.
pub fn render_row(node: &str, values: &[&str]) -> String {
    let tags_len: usize = values.iter().map(|v| v.len() + 1).sum();
    let mut line = String::with_capacity(node.len() + tags_len);
    line.push_str(node);
    for v in values {
        line.push(',');
        line.push_str(v);
    }
    line
}

/// Render the full report, every line terminated by `\n`.
pub fn render_report(tags: &TagMapping, params: &ReportParameters) -> String {
    let mut out = String::new();
    out.push_str(&params.title());
    out.push('\n');
    for (node, values) in sorted_rows(tags) {
        out.push_str(&render_row(node, &values));
        out.push('\n');
    }
    out
}
