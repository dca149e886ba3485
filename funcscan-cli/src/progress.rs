//! Progress bar shown while files are analyzed

use indicatif::{ProgressBar, ProgressStyle};

/// Minimum number of files to display progress bar
const MIN_FILES_FOR_PROGRESS: usize = 10;

const TEMPLATE: &str = "Extracting {bar:40} {pos:>4}/{len:4} files ({percent:>3}%) [{elapsed_precise}]";

/// Progress display for the extraction phase
pub struct ScanProgress {
    bar: Option<ProgressBar>,
}

impl ScanProgress {
    /// Only shown for at least 10 files on an interactive terminal outside CI
    pub fn new(total_files: usize, is_tty: bool, is_ci: bool) -> Self {
        let bar = if should_show_progress(total_files, is_tty, is_ci) {
            Some(create_progress_bar(total_files))
        } else {
            None
        };
        Self { bar }
    }

    pub fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn should_show_progress(total_files: usize, is_tty: bool, is_ci: bool) -> bool {
    total_files >= MIN_FILES_FOR_PROGRESS && is_tty && !is_ci
}

fn create_progress_bar(total: usize) -> ProgressBar {
    let style = ProgressStyle::with_template(TEMPLATE)
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::new(total as u64);
    bar.set_style(style);
    bar
}
