//! Core business logic abstractions

pub mod auth;
pub mod config;
pub mod flow;
pub mod index;
pub mod interval;
pub mod log;
pub mod price;
pub mod refresh;
pub mod report;

// Re-export main types for cleaner imports
pub use auth::{AuthError, AuthenticatedUser, Role, SessionClaims, TokenVerifier};
pub use flow::{FlowError, FlowRunner};
pub use index::{IndexAggregator, IndexError, IndexValue, SeriesPoint};
pub use interval::{Interval, IntervalError};
pub use price::{PriceRecord, PriceSource, SourceError};
pub use refresh::PriceRefresher;
pub use report::{
    Report, ReportContext, ReportError, ReportGenerator, ReportSnapshot, ReportStore,
};
