//! Timing metrics fed with elapsed seconds

use std::any::Any;

use super::super::metric::{Metric, MetricInfo, MetricKind, RecalcParams};
use super::super::value::MetricValue;

/// Total time spent setting up an algorithm on training data
#[derive(Debug, Clone)]
pub struct SetupTimeMetric {
    info: MetricInfo,
}

impl SetupTimeMetric {
    pub const NAME: &'static str = "setup_time";

    pub fn new() -> Self {
        Self {
            info: MetricInfo::new(
                Self::NAME,
                "Seconds spent in algorithm setup",
                MetricKind::Time,
            ),
        }
    }
}

impl Default for SetupTimeMetric {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for SetupTimeMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        match params {
            RecalcParams::Elapsed(secs) if *secs >= 0.0 => Some(MetricValue::real(*secs)),
            _ => None,
        }
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Mean time to execute one test sample
#[derive(Debug, Clone)]
pub struct SpeedMetric {
    info: MetricInfo,
}

impl SpeedMetric {
    pub const NAME: &'static str = "speed";

    pub fn new() -> Self {
        Self {
            info: MetricInfo::new(
                Self::NAME,
                "Mean seconds per executed sample",
                MetricKind::Time,
            ),
        }
    }
}

impl Default for SpeedMetric {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for SpeedMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        match params {
            RecalcParams::Elapsed(secs) if *secs >= 0.0 => Some(MetricValue::mean(*secs)),
            _ => None,
        }
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
