pub mod report_log;

pub use report_log::{load_latest, load_report, report_path, save_report};
