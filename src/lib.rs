//! Static privilege boundary auditor for Thumb-2 firmware images.
//!
//! Proves that code outside the privileged section only enters privileged code
//! through an allow-listed set of functions, and flags `CPS`/`MSR` wherever
//! they appear in scanned code.
//!
//! ```no_run
//! use privaudit::{audit, AuditConfig, ObjectImage};
//!
//! let image = ObjectImage::from_path("firmware.elf")?;
//! let report = audit(&image, &AuditConfig::default().with_scan_unaligned(true))?;
//! for line in report.lines() {
//!     println!("{}", line);
//! }
//! # Ok::<(), privaudit::AuditError>(())
//! ```

pub mod audit;
pub mod error;
pub mod image;
pub mod logging;
pub mod thumb;

pub use audit::{audit, AuditConfig, AuditReport, Finding, FindingKind};
pub use error::{AuditError, Result};
pub use image::ObjectImage;
