use amberflow::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;
const STAGING_MESSAGE: &str = "Staging";

/// Spinner for each job phase, switching to a bar while inputs are staged.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<DisplayState>>,
}

struct DisplayState {
    pb: ProgressBar,
    phase: Option<&'static str>,
}

impl DisplayState {
    fn apply(&mut self, progress: Progress) {
        let pb = &self.pb;
        match progress {
            Progress::PhaseStart { name } => {
                self.phase = Some(name);
                pb.reset();
                pb.set_length(0);
                pb.set_style(CliProgressHandler::spinner_style());
                pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                pb.set_message(name);
            }
            Progress::PhaseFinish => {
                pb.disable_steady_tick();
                let done = match self.phase.take() {
                    Some(name) => format!("✓ {name}"),
                    None => "✓ Done".to_string(),
                };
                pb.finish_with_message(done);
            }
            // A job without inputs keeps the phase spinner.
            Progress::StagingStart { total_files: 0 } => {}
            Progress::StagingStart { total_files } => {
                pb.disable_steady_tick();
                pb.reset();
                pb.set_length(total_files);
                pb.set_style(CliProgressHandler::bar_style());
                pb.set_message(STAGING_MESSAGE);
            }
            Progress::FileStaged => pb.inc(1),
            Progress::StagingFinish => {
                if let Some(total) = pb.length().filter(|&total| total > 0) {
                    pb.set_position(total);
                }
            }
            Progress::Message(msg) => {
                if pb.is_finished() {
                    pb.set_message(msg);
                } else {
                    pb.println(format!("  {msg}"));
                }
            }
        }
    }
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Preparing job...");
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(DisplayState { pb, phase: None })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };
            state.apply(progress);
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<12} [{bar:40.cyan/blue}] {pos}/{len} file(s) ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
