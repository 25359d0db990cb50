pub mod config;
#[cfg(target_os = "macos")]
mod hotkeys;
pub mod recorder;

use anyhow::Result;

pub use config::RecorderConfig;

/// Wait for the start hotkey, record until the stop hotkey, save, return.
#[cfg(target_os = "macos")]
pub fn run() -> Result<()> {
    let config = RecorderConfig::load()?;
    let hotkeys = hotkeys::Hotkeys::register(&config)?;
    log::info!(
        "ready; press {} to start recording and {} to stop",
        config.start_hotkey,
        config.stop_hotkey
    );

    let mut controller =
        recorder::SessionController::new(config, recorder::macos_collaborators());
    let summary = hotkeys.run(&mut controller)?;
    log::info!(
        "recorded {} actions and {} screenshots in {:.1}s; report at {}",
        summary.action_count,
        summary.screenshot_count,
        summary.total_duration.as_secs_f64(),
        summary.report_path.display()
    );
    Ok(())
}

#[cfg(not(target_os = "macos"))]
pub fn run() -> Result<()> {
    anyhow::bail!("actioncap needs macOS event taps and window lists; this platform is unsupported")
}
