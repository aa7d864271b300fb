use indicatif::{ProgressBar, ProgressStyle};

/// Spinner showing how many test cases have been replayed so far
pub fn create_case_progress(message: impl Into<String>, silent: bool) -> ProgressBar {
    if silent {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("[{elapsed_precise}] {spinner:.cyan} [{pos}] {msg}")
    {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.into());
    pb
}
