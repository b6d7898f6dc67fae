//! Entry point for the rackviz TUI. Parses args, resolves settings and runs the App.

use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rackviz::app::App;
use rackviz::config::{config_path, load_config, save_config, VizConfig};
use rackviz::logging::init_file_logging;
use rackviz::poller::{MetricsSource, DEFAULT_URL};

const DEMO_PORT: u16 = 5055;

#[derive(Debug, Default, PartialEq)]
struct ParsedArgs {
    url: Option<String>,
    config: Option<PathBuf>,
    log: Option<PathBuf>,
    save: bool,
    demo: bool,
    dry_run: bool,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--config FILE|-c FILE] [--log FILE|-l FILE] [--save] [--demo] [--dry-run] [http://HOST:PORT/metrics | ws://HOST:PORT/ws]"
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "rackviz".into());
    let mut out = ParsedArgs::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--config" | "-c" => out.config = it.next().map(PathBuf::from),
            "--log" | "-l" => out.log = it.next().map(PathBuf::from),
            "--save" => out.save = true,
            "--demo" => out.demo = true,
            "--dry-run" => out.dry_run = true,
            _ if arg.starts_with("--config=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        out.config = Some(PathBuf::from(v));
                    }
                }
            }
            _ if arg.starts_with("--log=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        out.log = Some(PathBuf::from(v));
                    }
                }
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option '{arg}'. {}", usage(&prog)));
            }
            _ => {
                if out.url.is_none() {
                    out.url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. {}", usage(&prog)));
                }
            }
        }
    }
    Ok(out)
}

/// CLI URL wins, then the config file, then the local agent default.
fn resolve_url(cli: Option<&str>, cfg: &VizConfig) -> String {
    cli.map(str::to_string)
        .or_else(|| cfg.url.clone())
        .unwrap_or_else(|| DEFAULT_URL.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let log_path = parsed
        .log
        .clone()
        .or_else(|| env::var_os("RACKVIZ_LOG").map(PathBuf::from));
    if let Some(path) = log_path.as_deref() {
        init_file_logging(path)?;
    }

    let cfg_path = parsed.config.clone().unwrap_or_else(config_path);
    let mut cfg = load_config(&cfg_path);

    let url = if parsed.demo {
        format!("http://127.0.0.1:{DEMO_PORT}/metrics")
    } else {
        resolve_url(parsed.url.as_deref(), &cfg)
    };
    // validate before touching the terminal or the config file
    let source = MetricsSource::from_url(&url)?;

    if parsed.save && !parsed.demo {
        cfg.url = Some(url.clone());
        save_config(&cfg_path, &cfg)?;
        eprintln!("saved {url} to {}", cfg_path.display());
    }

    if parsed.dry_run {
        println!("url: {}", source.url());
        println!("config: {}", cfg_path.display());
        println!(
            "servers: {}  bars: {}  particles: {}",
            cfg.server_count, cfg.bar_count, cfg.particle_count
        );
        println!(
            "poll: {}ms  frame: {}ms  resize quiet: {}ms",
            cfg.poll_interval_ms, cfg.frame_interval_ms, cfg.resize_quiet_ms
        );
        return Ok(());
    }

    let _agent = if parsed.demo {
        Some(spawn_demo_agent(DEMO_PORT)?)
    } else {
        None
    };

    let mut app = App::new(cfg);
    app.run(source).await
}

// --- Demo Mode ---

struct DemoGuard(Arc<Mutex<Option<std::process::Child>>>);

impl Drop for DemoGuard {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.0.lock() {
            if let Some(mut ch) = slot.take() {
                let _ = ch.kill();
                let _ = ch.wait();
            }
        }
    }
}

fn spawn_demo_agent(port: u16) -> Result<DemoGuard, Box<dyn std::error::Error>> {
    let candidate = find_agent_executable();
    let mut cmd = std::process::Command::new(candidate);
    cmd.arg("--port").arg(port.to_string());
    cmd.stdout(std::process::Stdio::null());
    cmd.stderr(std::process::Stdio::null());
    let child = cmd.spawn()?;
    // Give the agent a brief moment to bind
    std::thread::sleep(std::time::Duration::from_millis(300));
    Ok(DemoGuard(Arc::new(Mutex::new(Some(child)))))
}

fn find_agent_executable() -> PathBuf {
    #[cfg(windows)]
    let name = "rackviz_agent.exe";
    #[cfg(not(windows))]
    let name = "rackviz_agent";
    if let Some(parent) = env::current_exe().ok().as_deref().and_then(|p| p.parent()) {
        let candidate = parent.join(name);
        if candidate.exists() {
            return candidate;
        }
    }
    // Fallback to relying on PATH
    PathBuf::from(name)
}
