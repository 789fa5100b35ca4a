use chrono::{FixedOffset, Utc};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use focusflight::{
    app::{App, LaunchOptions, SharedStore, FRAME_INTERVAL},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    error::FlightError,
    export,
    geo::{self, City},
    logging,
    records::RecordStore,
    runtime::{CrosstermEventSource, FixedTicker, FlightEvent, Runner, SystemClock},
    stats::{self, RECENT_FLIGHTS},
    store::{MemoryStore, SqliteStore},
    util::format_minutes,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    rc::Rc,
};

/// focus timer tui that turns every session into a flight between cities
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Pick a route, take off, and stay focused until you land. Every completed flight is logged with streaks, a weekly chart and a calendar of focus days."
)]
pub struct Cli {
    /// city to depart from (defaults to the home city in settings)
    #[clap(short = 'f', long)]
    from: Option<String>,

    /// city to fly to
    #[clap(short = 't', long)]
    to: Option<String>,

    /// flight time in minutes, overriding the distance estimate
    #[clap(short = 'm', long)]
    minutes: Option<u32>,

    /// depart from the city nearest to LAT,LNG
    #[clap(long, value_name = "LAT,LNG", value_parser = parse_coords, conflicts_with = "from", allow_hyphen_values = true)]
    near: Option<(f64, f64)>,

    /// database file holding flights and settings
    #[clap(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// log filter, e.g. "debug" or "focusflight=trace" (RUST_LOG wins)
    #[clap(long)]
    log_level: Option<String>,

    /// minutes east of UTC used to split calendar days (default: local time)
    #[clap(long, value_name = "MINUTES", allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// write the flight log to PATH (.csv for CSV, JSON otherwise) and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// print logbook totals and recent flights, then exit
    #[clap(long)]
    summary: bool,
}

impl Cli {
    fn to_config(&self) -> Config {
        Config {
            db_path: self.db.clone(),
            log_level: self.log_level.clone(),
            utc_offset_minutes: self.utc_offset,
        }
    }

    fn launch_options(&self) -> Result<LaunchOptions, FlightError> {
        let origin = match (&self.from, self.near) {
            (Some(name), _) => Some(find_city(name)?),
            (None, Some((lat, lng))) => geo::nearest_city(lat, lng),
            (None, None) => None,
        };
        let destination = self.to.as_deref().map(find_city).transpose()?;

        Ok(LaunchOptions {
            origin,
            destination,
            minutes: self.minutes,
        })
    }

    fn is_batch(&self) -> bool {
        self.summary || self.export.is_some()
    }
}

fn parse_coords(s: &str) -> Result<(f64, f64), String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG but got '{s}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinates out of range: {lat},{lng}"));
    }
    Ok((lat, lng))
}

fn find_city(name: &str) -> Result<&'static City, FlightError> {
    geo::city_by_name(name).ok_or_else(|| FlightError::CityNotFound(name.to_string()))
}

fn open_store(config: &Config) -> Result<SqliteStore, FlightError> {
    let store = match &config.db_path {
        Some(path) => SqliteStore::open(path),
        None => SqliteStore::open_default(),
    };
    Ok(store?)
}

/// Storage for the interactive session. A database that will not open is
/// replaced by an in-memory store so the timer still works.
fn open_store_or_memory(config: &Config) -> (SharedStore, Option<FlightError>) {
    match open_store(config) {
        Ok(store) => (Rc::new(store), None),
        Err(e) => {
            log::error!("falling back to in-memory storage: {e}");
            (Rc::new(MemoryStore::new()), Some(e))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = FileConfigStore::new().load().merge(&cli.to_config());
    let tz = config.day_offset();

    if cli.is_batch() {
        logging::init_stderr_logger(config.log_filter());
        return run_batch(&cli, &config, tz);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let launch = match cli.launch_options() {
        Ok(launch) => launch,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.user_message()).exit();
        }
    };

    let log_path = AppDirs::log_path().unwrap_or_else(|| PathBuf::from("focusflight.log"));
    if let Err(e) = logging::init_file_logger(&log_path, config.log_filter()) {
        eprintln!("logging disabled: {e}");
    }

    let (store, store_error) = open_store_or_memory(&config);
    let mut app = App::new(store, Box::new(SystemClock), tz, launch);
    if store_error.is_some() {
        app.alert("Storage unavailable, flights will not be kept after exit");
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        log::error!("terminal loop failed: {e}");
    }
    log::info!("FocusFlight shutting down");
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::every_second());

    let size = terminal.size()?;
    app.set_viewport(size.width, size.height);
    terminal.draw(|f| ui(app, f))?;

    while !app.should_quit {
        let event = runner.step();
        if let FlightEvent::Resize = event {
            let size = terminal.size()?;
            app.set_viewport(size.width, size.height);
        }

        app.handle(event);

        if app.take_tick_reset() {
            runner.reset_tick();
        }
        runner.set_frame_interval(app.needs_frames().then_some(FRAME_INTERVAL));
        if app.take_bell() {
            ring_bell();
        }

        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn ring_bell() {
    let mut out = io::stdout();
    if let Err(e) = out.write_all(b"\x07").and_then(|()| out.flush()) {
        log::debug!("bell failed: {e}");
    }
}

/// Non-interactive modes: no terminal setup, output goes to stdout
fn run_batch(cli: &Cli, config: &Config, tz: FixedOffset) -> Result<(), Box<dyn Error>> {
    let records = RecordStore::open(open_store(config)?)?;

    if let Some(path) = &cli.export {
        let format = export::export_to_path(&records, path, Utc::now())?;
        println!(
            "Exported {} flights to {} ({format:?})",
            records.history().len(),
            path.display()
        );
    }

    if cli.summary {
        let today = Utc::now().with_timezone(&tz).date_naive();
        let summary =
            stats::profile_summary(records.history(), records.total_minutes(), today, &tz);

        println!(
            "{} flights, {} focused, {} km flown, {} day streak",
            summary.flights,
            summary.total_time_text(),
            summary.total_distance_km,
            summary.streak
        );
        for flight in stats::recent_flights(records.history(), RECENT_FLIGHTS, today, &tz) {
            println!(
                "  {:<12}{} → {}  {}",
                flight.date_text,
                flight.record.from_city,
                flight.record.to_city,
                format_minutes(flight.record.duration_min)
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use focusflight::store::KeyValueStore;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("focusflight").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_unopenable_database_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let config = Config {
            db_path: Some(blocker.join("flights.db")),
            ..Config::default()
        };

        let (store, err) = open_store_or_memory(&config);
        assert_matches!(err, Some(FlightError::Persistence(_)));
        store.set("focusflight-check", "1").unwrap();
        assert_eq!(store.get("focusflight-check").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_cli_default_values() {
        let cli = parse(&[]);
        assert!(cli.from.is_none());
        assert!(cli.to.is_none());
        assert!(cli.minutes.is_none());
        assert!(!cli.summary);
        assert!(!cli.is_batch());
        assert_eq!(cli.to_config(), Config::default());
    }

    #[test]
    fn test_cli_route_flags() {
        let cli = parse(&["--from", "beijing", "-t", "Xi'an", "-m", "25"]);
        let launch = cli.launch_options().unwrap();
        assert_eq!(launch.origin.unwrap().name, "Beijing");
        assert_eq!(launch.destination.unwrap().name, "Xi'an");
        assert_eq!(launch.minutes, Some(25));
    }

    #[test]
    fn test_cli_unknown_city() {
        let cli = parse(&["--to", "Atlantis"]);
        assert_matches!(
            cli.launch_options(),
            Err(FlightError::CityNotFound(name)) if name == "Atlantis"
        );
    }

    #[test]
    fn test_cli_near_picks_closest_city() {
        let cli = parse(&["--near", "31.2,121.5"]);
        assert_eq!(cli.launch_options().unwrap().origin.unwrap().name, "Shanghai");
    }

    #[test]
    fn test_cli_near_conflicts_with_from() {
        let res = Cli::try_parse_from(["focusflight", "--near", "31,121", "--from", "Beijing"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_parse_coords() {
        assert_eq!(parse_coords("39.9, 116.4"), Ok((39.9, 116.4)));
        assert_eq!(parse_coords("-33.8,151.2"), Ok((-33.8, 151.2)));
        assert!(parse_coords("39.9").is_err());
        assert!(parse_coords("abc,1").is_err());
        assert!(parse_coords("91,0").is_err());
    }

    #[test]
    fn test_cli_batch_and_config_flags() {
        let cli = parse(&[
            "--summary",
            "--db",
            "/tmp/f.db",
            "--utc-offset",
            "-300",
            "--log-level",
            "debug",
        ]);
        assert!(cli.is_batch());
        let cfg = cli.to_config();
        assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/f.db")));
        assert_eq!(cfg.utc_offset_minutes, Some(-300));
        assert_eq!(cfg.log_filter(), "debug");

        assert!(parse(&["--export", "out.csv"]).is_batch());
    }
}
