use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tubenotes_core::{PipelineObserver, Stage, VideoOutcome};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Extracting => "Fetching transcript and metadata...",
        Stage::Summarizing => "Summarizing transcript...",
        Stage::Converting => "Converting summary...",
        Stage::Publishing => "Publishing to Notion...",
        Stage::Done => "Done",
    }
}

/// Spinner per video, updated as the pipeline moves between stages.
#[derive(Default)]
pub struct SpinnerObserver {
    current: Mutex<Option<(ProgressBar, Instant)>>,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineObserver for SpinnerObserver {
    fn video_started(&self, position: usize, total: usize, input: &str) {
        println!(
            "\n{} {}",
            style(format!("[{}/{}]", position, total)).cyan().bold(),
            style(input).dim()
        );
        if let Ok(mut current) = self.current.lock() {
            *current = Some((create_spinner("Starting..."), Instant::now()));
        }
    }

    fn stage_started(&self, stage: Stage) {
        if let Ok(current) = self.current.lock() {
            if let Some((spinner, _)) = current.as_ref() {
                spinner.set_message(stage_message(stage));
            }
        }
    }

    fn video_finished(&self, outcome: &VideoOutcome) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        let Some((spinner, started)) = current.take() else {
            return;
        };
        let elapsed = style(format!("[{}]", format_elapsed(started.elapsed()))).dim();

        match &outcome.result {
            Ok(published) => spinner.finish_with_message(format!(
                "{} Published: {} {}",
                style("✓").green().bold(),
                published.title,
                elapsed
            )),
            Err(failure) => spinner.finish_with_message(format!(
                "{} Failed while {}: {} {}",
                style("✗").red().bold(),
                failure.stage,
                failure.error,
                elapsed
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m 5s");
    }
}
