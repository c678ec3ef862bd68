//! Certification-expiry alerting.
//!
//! - `classifier` - days-until-expiry bucketing and idempotent alert creation
//! - `email` - notification email dispatch with email_log records
//! - `scan` - background sweep over expiring certifications

pub mod classifier;
pub mod email;
pub mod scan;

pub use classifier::{classify, classify_certification, days_until_expiry};
pub use email::send_expiry_email;
pub use scan::{SweepOutcome, expiry_scan_loop, run_expiry_sweep};
