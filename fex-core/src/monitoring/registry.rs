//! Request-scoped metric registry and Prometheus text exposition
//!
//! Records are grouped per family and validated before anything reaches
//! the `prometheus` crate, which would otherwise panic on negative counter
//! increments or silently merge duplicate series.

use std::collections::BTreeMap;

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, TextEncoder};
use tracing::debug;

use crate::core::{MetricDesc, MetricKind, MetricRecord, RenderConflictError};

struct Family {
    desc: &'static MetricDesc,
    series: BTreeMap<Vec<String>, f64>,
}

/// Metric families collected for a single response
#[derive(Default)]
pub struct Registry {
    families: BTreeMap<&'static str, Family>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Number of series across all families
    pub fn series_count(&self) -> usize {
        self.families.values().map(|f| f.series.len()).sum()
    }

    /// Add one record
    ///
    /// Fails on a repeated (name, labels) pair, on a name reused with a
    /// different descriptor, and on a negative counter value.
    pub fn insert(&mut self, record: MetricRecord) -> Result<(), RenderConflictError> {
        let desc = record.desc;

        if desc.labels.len() != record.label_values.len() {
            return Err(RenderConflictError::InconsistentFamily {
                name: desc.name.to_string(),
            });
        }

        if desc.kind == MetricKind::Counter && !(record.value >= 0.0) {
            return Err(RenderConflictError::NegativeCounter {
                name: desc.name.to_string(),
                value: record.value,
            });
        }

        let family = self.families.entry(desc.name).or_insert_with(|| Family {
            desc,
            series: BTreeMap::new(),
        });

        if family.desc != desc {
            return Err(RenderConflictError::InconsistentFamily {
                name: desc.name.to_string(),
            });
        }

        if family.series.contains_key(&record.label_values) {
            return Err(RenderConflictError::DuplicateSeries {
                name: desc.name.to_string(),
                labels: format_labels(&record),
            });
        }

        family.series.insert(record.label_values, record.value);
        Ok(())
    }

    /// Add every record, stopping at the first conflict
    pub fn extend<I>(&mut self, records: I) -> Result<(), RenderConflictError>
    where
        I: IntoIterator<Item = MetricRecord>,
    {
        for record in records {
            self.insert(record)?;
        }
        Ok(())
    }

    /// Encode in Prometheus text format (version 0.0.4)
    ///
    /// Families come out sorted by name and series by label values. An
    /// empty registry renders to an empty string.
    pub fn render(self) -> Result<String, RenderConflictError> {
        if self.families.is_empty() {
            return Ok(String::new());
        }

        let registry = prometheus::Registry::new();
        let series = self.series_count();

        for family in self.families.values() {
            register_family(&registry, family)?;
        }

        let encoder = TextEncoder::new();
        let metric_families = registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(encoding)?;

        debug!(
            families = metric_families.len(),
            series, "rendered exposition"
        );

        String::from_utf8(buffer).map_err(encoding)
    }
}

/// Validate and render a batch of records in one step
pub fn render<I>(records: I) -> Result<String, RenderConflictError>
where
    I: IntoIterator<Item = MetricRecord>,
{
    let mut registry = Registry::new();
    registry.extend(records)?;
    registry.render()
}

fn register_family(
    registry: &prometheus::Registry,
    family: &Family,
) -> Result<(), RenderConflictError> {
    let desc = family.desc;
    let opts = Opts::new(desc.name, desc.help);

    match desc.kind {
        MetricKind::Gauge => {
            let vec = GaugeVec::new(opts, desc.labels).map_err(encoding)?;
            for (labels, value) in &family.series {
                let values: Vec<&str> = labels.iter().map(String::as_str).collect();
                vec.get_metric_with_label_values(&values)
                    .map_err(encoding)?
                    .set(*value);
            }
            registry.register(Box::new(vec)).map_err(encoding)?;
        }
        MetricKind::Counter => {
            let vec = CounterVec::new(opts, desc.labels).map_err(encoding)?;
            for (labels, value) in &family.series {
                let values: Vec<&str> = labels.iter().map(String::as_str).collect();
                vec.get_metric_with_label_values(&values)
                    .map_err(encoding)?
                    .inc_by(*value);
            }
            registry.register(Box::new(vec)).map_err(encoding)?;
        }
    }
    Ok(())
}

fn encoding(e: impl std::fmt::Display) -> RenderConflictError {
    RenderConflictError::Encoding {
        reason: e.to_string(),
    }
}

fn format_labels(record: &MetricRecord) -> String {
    record
        .labels()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
