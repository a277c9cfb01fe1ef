use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use sat_predict::catalog::{auto_update, Catalog, CatalogPaths, Qth};
use sat_predict::config::Config;
use sat_predict::predict::quick::{
    quick_doppler100, quick_find, quick_predict, quick_predict_json,
};
use sat_predict::server::{ServerContext, UdpServer};
use sat_predict::tracker::{SerialAntenna, Shared, Tracker, TrackerMode};

/// Exit status of a fatal startup configuration error.
const EXIT_CONFIG: u8 = 255;

#[derive(Parser, Debug)]
#[command(name = "sat-predict", version)]
#[command(about = "Satellite tracking and orbital prediction")]
struct Cli {
    /// Two-line element file [default: ~/.predict/predict.tle]
    #[arg(short = 't', value_name = "FILE")]
    tle: Option<PathBuf>,
    /// Ground station file [default: ~/.predict/predict.qth]
    #[arg(short = 'q', value_name = "FILE")]
    qth: Option<PathBuf>,
    /// Transponder database [default: ~/.predict/predict.db]
    #[arg(short = 'd', value_name = "FILE")]
    db: Option<PathBuf>,
    /// Settings file
    #[arg(short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Positions: SATELLITE [START [END | +N[m]]]
    #[arg(short = 'f', num_args = 1.., value_name = "ARG")]
    find: Option<Vec<String>>,
    /// Next pass with look angles: SATELLITE [START]
    #[arg(short = 'p', num_args = 1.., value_name = "ARG")]
    predict: Option<Vec<String>>,
    /// Doppler shift at 100 MHz through the next pass (-dp): SATELLITE [START]
    #[arg(long = "doppler", num_args = 1.., value_name = "ARG")]
    doppler: Option<Vec<String>>,
    /// Print the -p pass as JSON
    #[arg(long)]
    json: bool,
    /// Write listings to FILE instead of stdout
    #[arg(short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Merge newer element sets from these files into the element file
    #[arg(short = 'u', num_args = 1.., value_name = "FILE")]
    update: Option<Vec<PathBuf>>,

    /// Answer tracking clients over UDP
    #[arg(short = 's')]
    server: bool,
    /// UDP port
    #[arg(short = 'n', value_name = "PORT")]
    port: Option<u16>,
    /// Track one satellite instead of the whole catalog
    #[arg(long, value_name = "SATELLITE")]
    track: Option<String>,
    /// Antenna rotator serial port
    #[arg(short = 'a', value_name = "DEVICE")]
    antenna: Option<PathBuf>,
    /// Antenna rotator serial port, refreshed every second (-a1)
    #[arg(long = "antenna-once", value_name = "DEVICE")]
    antenna_once: Option<PathBuf>,
}

/// Rewrites the single dash multi-letter flags into their long forms.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-dp") => "--doppler".into(),
            Some("-a1") => "--antenna-once".into(),
            _ => arg,
        })
        .collect()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("*** ERROR! {}: {}", path.display(), e);
                return ExitCode::from(EXIT_CONFIG);
            }
        },
        None => Config::default(),
    };
    let paths = catalog_paths(&cli, &config);

    if let Some(files) = &cli.update {
        return update(paths, files);
    }

    let listing = cli.find.is_some() || cli.predict.is_some() || cli.doppler.is_some();
    if !listing && !cli.server && cli.track.is_none() {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    let catalog = match Catalog::load(paths) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("*** ERROR! {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if listing {
        quick(&cli, catalog)
    } else {
        serve(&cli, &config, catalog)
    }
}

fn catalog_paths(cli: &Cli, config: &Config) -> CatalogPaths {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".predict");
    let pick = |flag: &Option<PathBuf>, file: &Option<PathBuf>| flag.clone().or(file.clone());

    CatalogPaths {
        tle: pick(&cli.tle, &config.files.tle).unwrap_or_else(|| home.join("predict.tle")),
        qth: pick(&cli.qth, &config.files.qth).unwrap_or_else(|| home.join("predict.qth")),
        db: pick(&cli.db, &config.files.db)
            .or_else(|| Some(home.join("predict.db")).filter(|path| path.exists())),
    }
}

fn update(paths: CatalogPaths, files: &[PathBuf]) -> ExitCode {
    let mut catalog = match Catalog::load_with_qth(paths, Qth::default()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("*** ERROR! {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    for file in files {
        match auto_update(&mut catalog, file) {
            Ok(summary) => println!(
                "{}: {} element sets read, {} updated",
                file.display(),
                summary.read,
                summary.updated
            ),
            Err(e) => eprintln!("{}", e),
        }
    }
    ExitCode::SUCCESS
}

fn quick(cli: &Cli, mut catalog: Catalog) -> ExitCode {
    let now = chrono::Utc::now().timestamp();

    let text = if let Some(args) = &cli.find {
        quick_find(&mut catalog, args, now).map(|lines| lines.concat())
    } else if let Some(args) = &cli.predict {
        if cli.json {
            quick_predict_json(&mut catalog, args, now).map(|points| {
                serde_json::to_string_pretty(&points).unwrap_or_default() + "\n"
            })
        } else {
            quick_predict(&mut catalog, args, now).map(|lines| lines.concat())
        }
    } else if let Some(args) = &cli.doppler {
        quick_doppler100(&mut catalog, args, now).map(|lines| lines.concat())
    } else {
        Ok(String::new())
    };

    let text = match text {
        Ok(text) => text,
        Err(e) => {
            eprintln!("*** {}", e);
            return ExitCode::FAILURE;
        }
    };

    match write_output(cli.output.as_deref(), &text) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error writing output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn write_output(path: Option<&Path>, text: &str) -> std::io::Result<()> {
    match path {
        Some(path) => fs::write(path, text),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn serve(cli: &Cli, config: &Config, catalog: Catalog) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(run_services(cli, config, catalog))
}

async fn run_services(cli: &Cli, config: &Config, catalog: Catalog) -> ExitCode {
    let shared = Arc::new(Mutex::new(Shared::new(&catalog)));
    let catalog = Arc::new(Mutex::new(catalog));
    let mut tracker = Tracker::new(catalog.clone(), shared.clone(), config.tracker.interval);

    let antenna = match (&cli.antenna, &cli.antenna_once) {
        (_, Some(device)) => Some((device, true)),
        (Some(device), None) => Some((device, false)),
        (None, None) => config
            .tracker
            .antenna
            .as_ref()
            .map(|device| (device, config.tracker.antenna_once_per_second)),
    };
    if let Some((device, once_per_second)) = antenna {
        match SerialAntenna::open(device, once_per_second) {
            Ok(rotor) => tracker.add_rig(Box::new(rotor)),
            Err(e) => log::warn!("antenna {} disabled: {}", device.display(), e),
        }
    }

    let mode = match &cli.track {
        Some(name) => TrackerMode::Single(name.clone()),
        None => TrackerMode::Multi,
    };
    if let Err(e) = tracker.start(mode) {
        eprintln!("*** ERROR! {}", e);
        return ExitCode::FAILURE;
    }

    let server = if cli.server {
        let port = cli.port.unwrap_or(config.server.port);
        let addr: SocketAddr = match format!("{}:{}", config.server.bind, port).parse() {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("*** ERROR! bind address {}: {}", config.server.bind, e);
                tracker.stop().await;
                return ExitCode::from(EXIT_CONFIG);
            }
        };
        match UdpServer::start(addr, ServerContext::new(catalog, shared)).await {
            Ok(server) => Some(server),
            Err(e) => {
                eprintln!("*** ERROR! UDP port {}: {}", port, e);
                tracker.stop().await;
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("waiting for ctrl-c: {}", e);
    }
    log::info!("shutting down");

    if let Some(server) = server {
        server.shutdown().await;
    }
    tracker.stop().await;
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from))).unwrap()
    }

    #[test]
    fn multi_letter_flags() {
        let cli = parse(&["sat-predict", "-dp", "ISS", "0", "-a1", "/dev/ttyS0"]);
        assert_eq!(cli.doppler.unwrap(), ["ISS", "0"]);
        assert_eq!(cli.antenna_once.unwrap(), Path::new("/dev/ttyS0"));
        assert!(cli.antenna.is_none());
    }

    #[test]
    fn listing_arguments_stop_at_next_flag() {
        let cli = parse(&["sat-predict", "-t", "a.tle", "-f", "ISS", "0", "+10m", "-o", "out"]);
        assert_eq!(cli.find.unwrap(), ["ISS", "0", "+10m"]);
        assert_eq!(cli.tle.unwrap(), Path::new("a.tle"));
        assert_eq!(cli.output.unwrap(), Path::new("out"));
    }

    #[test]
    fn server_flags() {
        let cli = parse(&["sat-predict", "-s", "-n", "1211", "--track", "ISS"]);
        assert!(cli.server);
        assert_eq!(cli.port, Some(1211));
        assert_eq!(cli.track.as_deref(), Some("ISS"));
    }

    #[test]
    fn flags_override_config_paths() {
        let config =
            Config::parse("files:\n  tle: /etc/sats.tle\n  qth: /etc/home.qth\n").unwrap();
        let cli = parse(&["sat-predict", "-q", "other.qth"]);
        let paths = catalog_paths(&cli, &config);
        assert_eq!(paths.tle, Path::new("/etc/sats.tle"));
        assert_eq!(paths.qth, Path::new("other.qth"));
    }
}
