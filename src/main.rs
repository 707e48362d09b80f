//! minivol CLI - applet shell around the reconciliation core

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use minivol::config::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args)?;

    #[cfg(not(windows))]
    {
        let _ = args;
        anyhow::bail!("minivol drives the Windows audio and media stack and only runs on Windows");
    }

    #[cfg(windows)]
    run_command(args)
}

fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(log_file) = &args.log {
        let file = std::fs::File::create(log_file)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

#[cfg(windows)]
use minivol::audio::{SystemEndpointGateway, VolumeCache};
#[cfg(windows)]
use minivol::config::args::{Command, MuteAction, StartupAction};
#[cfg(windows)]
use minivol::config::AppSettings;
#[cfg(windows)]
use minivol::media::{AppCommandChannel, PlaybackController, SmtcGateway};
#[cfg(windows)]
use minivol::platform::startup;
#[cfg(windows)]
use std::time::Duration;

#[cfg(windows)]
fn run_command(args: Args) -> Result<()> {
    match args.command.unwrap_or_default() {
        Command::Status => cmd_status(),
        Command::Volume { percent } => cmd_volume(percent),
        Command::Mute { action } => cmd_mute(action),
        Command::PlayPause => cmd_play_pause(),
        Command::Next => cmd_skip(true),
        Command::Previous => cmd_skip(false),
        Command::MediaInfo => cmd_media_info(),
        Command::Run { interval, no_media } => cmd_run(interval, no_media),
        Command::Startup { action } => cmd_startup(action),
    }
}

#[cfg(windows)]
fn volume_cache() -> Result<VolumeCache<SystemEndpointGateway>> {
    let gateway = SystemEndpointGateway::new()?;
    Ok(VolumeCache::new(gateway))
}

#[cfg(windows)]
fn playback_controller() -> PlaybackController<AppCommandChannel, SmtcGateway> {
    let settings = AppSettings::load_default();
    let mut controller = PlaybackController::new(
        AppCommandChannel,
        SmtcGateway::new(),
        Duration::from_millis(settings.suppression_window_ms),
    );
    controller.initialize();
    controller
}

/// Show current volume, mute and playback state
#[cfg(windows)]
fn cmd_status() -> Result<()> {
    let cache = volume_cache()?;
    cache.refresh_from_system();
    let state = cache.state();

    match state.volume_percent {
        Some(volume) => println!("Volume:   {}%", volume),
        None => println!("Volume:   unknown (no audio endpoint)"),
    }
    match state.muted {
        Some(muted) => println!("Muted:    {}", if muted { "yes" } else { "no" }),
        None => println!("Muted:    unknown"),
    }

    let controller = playback_controller();
    if controller.has_active_session() {
        println!(
            "Playback: {}",
            if controller.is_playing() {
                "playing"
            } else {
                "paused"
            }
        );
        if let Some(info) = controller.media_info() {
            println!("Track:    {} - {}", info.artist, info.title);
        }
    } else {
        println!("Playback: no active media session");
    }

    Ok(())
}

/// Set the master volume
#[cfg(windows)]
fn cmd_volume(percent: u32) -> Result<()> {
    let cache = volume_cache()?;
    cache.set_volume(percent);
    println!("Volume set to {}%", cache.current_volume());
    Ok(())
}

/// Change the mute state
#[cfg(windows)]
fn cmd_mute(action: MuteAction) -> Result<()> {
    let cache = volume_cache()?;
    let muted = match action {
        MuteAction::On => true,
        MuteAction::Off => false,
        MuteAction::Toggle => !cache.is_muted(),
    };
    cache.set_muted(muted);
    println!("{}", if muted { "Muted" } else { "Unmuted" });
    Ok(())
}

/// Toggle playback via the fast channel with session fallback
#[cfg(windows)]
fn cmd_play_pause() -> Result<()> {
    let controller = playback_controller();
    controller.play_pause();
    println!(
        "{}",
        if controller.is_playing() {
            "Playing"
        } else {
            "Paused"
        }
    );
    Ok(())
}

/// Skip to the next or previous track
#[cfg(windows)]
fn cmd_skip(forward: bool) -> Result<()> {
    let controller = playback_controller();
    if forward {
        controller.next();
        println!("Next track");
    } else {
        controller.previous();
        println!("Previous track");
    }
    Ok(())
}

/// Show title and artist of the current track
#[cfg(windows)]
fn cmd_media_info() -> Result<()> {
    let controller = playback_controller();
    match controller.media_info() {
        Some(info) => {
            println!("Title:  {}", info.title);
            println!("Artist: {}", info.artist);
        }
        None => println!("No active media session."),
    }
    Ok(())
}

/// Run the applet loop until interrupted
#[cfg(windows)]
fn cmd_run(interval_ms: Option<u64>, no_media: bool) -> Result<()> {
    use crossbeam_channel::unbounded;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let settings = AppSettings::load_default();
    let interval = Duration::from_millis(interval_ms.unwrap_or(settings.sync_interval_ms));

    let cache = volume_cache()?;
    cache.refresh_from_system();

    let (event_tx, event_rx) = unbounded();
    let media_enabled = settings.show_media_controls && !no_media;
    let controller = if media_enabled {
        let mut controller = PlaybackController::new(
            AppCommandChannel,
            SmtcGateway::new(),
            Duration::from_millis(settings.suppression_window_ms),
        );
        controller.set_event_channel(event_tx);
        controller.initialize();
        Some(controller)
    } else {
        None
    };

    println!(
        "minivol {} running (sync every {:?}{}), press Ctrl+C to stop\n",
        minivol::VERSION,
        interval,
        if media_enabled { ", media on" } else { "" },
    );

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    let _ = ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping...");
        r.store(false, Ordering::SeqCst);
    });

    let mut last = cache.state();
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(interval);

        cache.refresh_from_system();
        let state = cache.state();
        if (state.volume_percent, state.muted) != (last.volume_percent, last.muted) {
            match (state.volume_percent, state.muted) {
                (Some(volume), Some(muted)) => {
                    println!("volume {}%{}", volume, if muted { " (muted)" } else { "" })
                }
                _ => println!("audio endpoint lost"),
            }
            last = state;
        }

        if let Some(controller) = &controller {
            controller.refresh_playback_state();
            while let Ok(is_playing) = event_rx.try_recv() {
                println!(
                    "playback {}",
                    if is_playing { "started" } else { "paused" }
                );
            }
        }
    }

    println!("Stopped.");
    Ok(())
}

/// Manage the run-on-startup registry entry
#[cfg(windows)]
fn cmd_startup(action: StartupAction) -> Result<()> {
    match action {
        StartupAction::Enable => {
            if startup::set_startup_enabled(true) {
                println!("Startup enabled.");
            } else {
                println!("Failed to enable startup.");
            }
        }
        StartupAction::Disable => {
            if startup::set_startup_enabled(false) {
                println!("Startup disabled.");
            } else {
                println!("Failed to disable startup.");
            }
        }
        StartupAction::Status => {
            println!(
                "Startup is {}.",
                if startup::is_startup_enabled() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
    }
    Ok(())
}
