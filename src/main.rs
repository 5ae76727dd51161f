//! Godot Camera demo CLI
//!
//! Drives the plugin surface the way a game script would, against the
//! mock camera backend, and reports the frames that come back.

use clap::Parser;
use godot_camera::{
    config::PluginConfig,
    convert::KernelKind,
    device::{DeviceError, MockBackend},
    dispatch::{CameraEvent, ChannelSink},
    metrics::CaptureMetrics,
    plugin::GodotCamera,
    session::CameraSession,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "godot-camera", version, about = "Camera plugin demo against a mock device")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera index to open.
    #[arg(short, long)]
    device: Option<i32>,

    /// Preview width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Preview height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Preview format code (17 = NV21, 842094169 = YV12).
    #[arg(long)]
    format: Option<i32>,

    /// Number of frames to receive before stopping.
    #[arg(short = 'n', long)]
    frames: Option<u32>,

    /// Run until interrupted.
    #[arg(long)]
    continuous: bool,

    /// Conversion kernel (software or threaded).
    #[arg(long)]
    kernel: Option<KernelKind>,

    /// Worker threads for the threaded kernel.
    #[arg(long)]
    threads: Option<usize>,

    /// Number of cameras the mock backend exposes.
    #[arg(long, default_value_t = 1)]
    cameras: usize,

    /// Make opening the camera fail with this message.
    #[arg(long)]
    fail_open: Option<String>,

    /// Serve Prometheus metrics on this port.
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn load_config(args: &Args) -> Result<PluginConfig, godot_camera::config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => PluginConfig::from_file(path)?,
        None => PluginConfig::default(),
    };

    if let Some(device) = args.device {
        config.camera.device_index = device;
    }
    if let Some(width) = args.width {
        config.camera.preview_width = width;
    }
    if let Some(height) = args.height {
        config.camera.preview_height = height;
    }
    if let Some(format) = args.format {
        config.camera.preview_format = format;
    }
    if let Some(frames) = args.frames {
        config.output.frame_count = frames;
    }
    if args.continuous {
        config.output.continuous = true;
    }
    if let Some(kernel) = args.kernel {
        config.conversion.kernel = kernel;
    }
    if let Some(threads) = args.threads {
        config.conversion.threads = threads;
    }
    #[cfg(feature = "metrics")]
    if let Some(port) = args.metrics_port {
        config.output.metrics_port = port;
    }

    config.camera.validate()?;
    Ok(config)
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(port: u16, metrics: CaptureMetrics) {
    use godot_camera::metrics::MetricsServer;

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        let server = MetricsServer::on_port(port, metrics);
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Godot Camera v{}", godot_camera::VERSION);
    info!("This is a demonstration using mock camera input");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let metrics = match CaptureMetrics::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };

    #[cfg(feature = "metrics")]
    if config.output.metrics_port != 0 {
        spawn_metrics_server(config.output.metrics_port, metrics.clone());
    }

    // Initialize components
    let backend = MockBackend::new(args.cameras).with_streaming(true);
    if let Some(message) = &args.fail_open {
        backend.fail_next_open(DeviceError::OpenFailed(message.clone()));
    }

    let (sink, events) = ChannelSink::new();
    let kernel = config
        .conversion
        .kernel
        .build(config.conversion.threads);
    let session = CameraSession::new(backend, Arc::new(sink))
        .with_kernel(kernel)
        .with_metrics(metrics.clone());
    let mut camera = GodotCamera::new(session);

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    camera.set_callback_object(config.camera.receiver_id);
    if camera.initialize_camera(config.camera.device_index) == 0 {
        while let Ok(dispatch) = events.try_recv() {
            if let CameraEvent::Exception { message } = dispatch.event {
                eprintln!("Camera exception: {}", message);
            }
        }
        std::process::exit(1);
    }

    info!(
        "Camera {} open ({} available)",
        config.camera.device_index,
        camera.get_camera_count()
    );

    camera.set_preview_size(
        i32::try_from(config.camera.preview_width).unwrap_or(i32::MAX),
        i32::try_from(config.camera.preview_height).unwrap_or(i32::MAX),
    );
    camera.set_preview_format(config.camera.preview_format);

    let [width, height] = camera.get_preview_size();
    info!(
        "Preview {}x{} format {} at {} fps, supported formats {:?}",
        width,
        height,
        camera.get_preview_format(),
        camera.get_preview_framerate(),
        camera.get_supported_preview_formats()
    );

    camera.initialize_capture();

    let mut received = 0u32;
    while running.load(Ordering::SeqCst)
        && (config.output.continuous || received < config.output.frame_count)
    {
        let dispatch = match events.recv_timeout(Duration::from_secs(1)) {
            Ok(dispatch) => dispatch,
            Err(RecvTimeoutError::Timeout) => {
                warn!("No frame within 1s");
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match dispatch.event {
            CameraEvent::CapturedData {
                rgba,
                width,
                height,
            } => {
                received += 1;
                info!(
                    "Frame {}: {}x{} ({} bytes) -> receiver {}",
                    received,
                    width,
                    height,
                    rgba.len(),
                    dispatch.receiver
                );
            }
            CameraEvent::Exception { message } => {
                warn!("Camera exception: {}", message);
            }
        }
    }

    camera.finalize_capture();

    let snapshot = metrics.snapshot();
    info!(
        "Done. {} frames delivered, {} converted, {} size mismatches, {} exceptions",
        snapshot.frames_delivered,
        snapshot.frames_converted,
        snapshot.size_mismatches,
        snapshot.exceptions_reported
    );
}
