#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod aggregator;
pub mod deadline;
pub mod error;
pub mod executor;
pub mod http;
pub mod report;

pub(crate) mod vu;

pub use error::{AggregationError, ReportError, RunError};
pub use load_test::LoadTest;
pub use stampede_core::*;

pub mod prelude {
    pub use crate::aggregator::{Aggregator, GroupMetrics};
    pub use crate::deadline::{Deadline, DeadlineHandle};
    pub use crate::error::{AggregationError, ReportError, RunError};
    pub use crate::executor::{RequestExecutor, Transport};
    pub use crate::http::HttpTransport;
    pub use crate::load_test::LoadTest;
    pub use crate::report::{FileSink, ReportSink};

    pub use stampede_core::{
        ConfigError, Endpoint, FinalReport, Outcome, RunConfig, RunStatistics, TestGroup,
        TestPlan, TransportError,
    };
}
