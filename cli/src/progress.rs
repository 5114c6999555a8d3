//! Spinner-based execution hooks.

use std::time::Duration;

use chrono::Local;
use crossterm::style::Stylize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use whoshome_core::{CommandOutcome, ExecutionHooks};

const TICK: Duration = Duration::from_millis(100);

/// The spinner set shared by every batch and the log writer.
pub fn multi_progress(visible: bool) -> MultiProgress {
    let target = if visible {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    };
    MultiProgress::with_draw_target(target)
}

/// Shows one spinner per running command and prints whatever `render`
/// returns for each finished one.
///
/// `MultiProgress` synchronizes internally, so concurrent `before`/`after`
/// calls from the coordinator's tasks are safe.
pub struct ProgressHooks<F> {
    progress: MultiProgress,
    render: F,
}

impl<F> ProgressHooks<F>
where
    F: Fn(&CommandOutcome) -> Option<String> + Send + Sync + 'static,
{
    pub fn new(progress: MultiProgress, render: F) -> Self {
        Self { progress, render }
    }

    /// Reports belong on stdout; spinners are cleared while they print.
    fn emit(&self, text: String) {
        self.progress.suspend(|| println!("{}", text));
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(" {spinner:.magenta} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl<F> ExecutionHooks for ProgressHooks<F>
where
    F: Fn(&CommandOutcome) -> Option<String> + Send + Sync + 'static,
{
    type Handle = ProgressBar;

    fn before(&self, command: &str) -> ProgressBar {
        let spinner = self.progress.add(ProgressBar::new_spinner());
        spinner.set_style(spinner_style());
        spinner.set_message(format!(
            "{} {} {} {}",
            "Running".magenta().bold(),
            command.cyan().bold(),
            "at".magenta().bold(),
            Local::now().format("%H:%M:%S").to_string().cyan().bold(),
        ));
        spinner.enable_steady_tick(TICK);
        spinner
    }

    fn after(&self, outcome: &CommandOutcome, spinner: ProgressBar) {
        spinner.finish_and_clear();
        self.progress.remove(&spinner);
        if let Some(text) = (self.render)(outcome) {
            self.emit(text);
        }
    }
}
