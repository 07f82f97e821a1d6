//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
#[cfg(feature = "html-report")]
pub mod chart_svg;
#[cfg(feature = "html-report")]
pub mod html_report_adapter;
