use std::io::{stdin, IsTerminal};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use midipc2cmd::midi_reading::list_ports;
use midipc2cmd::{Config, Engine, EventKind, MidirSource, ProcessLauncher, ProgramNumbering, StopHandle};

/// Run a command for every matching MIDI event, program changes by default.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Command to run; the event value is appended as its last argument
    executable: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Config file (default: <config dir>/midipc2cmd/config.toml)")]
    config: Option<PathBuf>,

    #[arg(short, long, alias = "port", value_name = "PORT", help = "Connect to the first input port whose name contains PORT")]
    connect: Option<String>,

    #[arg(short, long, help = "MIDI client name")]
    name: Option<String>,

    #[arg(short, long = "accept", value_name = "KIND", help = "Event kind to react to (repeatable), e.g. program-change")]
    accept: Vec<EventKind>,

    #[arg(long, help = "Pass programs as 1-128 instead of 0-127")]
    one_based: bool,

    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    #[arg(long, help = "List MIDI input ports and exit")]
    list_ports: bool,
}

impl Args {
    // Command line wins over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(executable) = &self.executable {
            config.executable_path = executable.clone();
        }
        if let Some(port) = &self.connect {
            config.midi_port = Some(port.clone());
        }
        if let Some(name) = &self.name {
            config.client_name = name.clone();
        }
        if !self.accept.is_empty() {
            config.accepted_kinds = self.accept.clone();
        }
        if self.one_based {
            config.program_numbering = ProgramNumbering::OneBased;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

fn main() {
    match run() {
        Ok(_) => (),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_path) = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    TermLogger::init(
        config.level_filter()?,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("initializing logger")?;

    if let Some(path) = config_path {
        info!("Loaded config from {}", path.display());
    }

    if args.list_ports {
        let ports = list_ports(&config.client_name).context("listing MIDI ports")?;
        if ports.is_empty() {
            println!("No MIDI input ports available");
        }
        for (i, port) in ports.iter().enumerate() {
            println!("{}: {}", i, port);
        }
        return Ok(());
    }

    let mut source = MidirSource::open(&config.client_name, config.midi_port.as_deref())
        .context("opening MIDI input")?;

    let mut engine = Engine::new(config.filter(), config.template(), ProcessLauncher::new());

    let stop = StopHandle::new();
    if stdin().is_terminal() {
        let stdin_stop = stop.clone();
        thread::spawn(move || {
            let mut input = String::new();
            // wait for next enter key press
            if let Err(err) = stdin().read_line(&mut input) {
                warn!("could not read stdin: {}", err);
            }
            stdin_stop.stop();
        });
        info!(
            "Reading input from '{}' (press enter to exit) ...",
            source.port_name()
        );
    } else {
        info!("Reading input from '{}' ...", source.port_name());
    }

    engine.run(&mut source, &stop);
    source.close();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_file() -> Config {
        Config {
            executable_path: PathBuf::from("/opt/presets/load"),
            args: vec!["--bank".to_string(), "a".to_string()],
            accepted_kinds: vec![EventKind::ControlChange, EventKind::NoteOn],
            midi_port: Some("MiniLab".to_string()),
            client_name: "studio".to_string(),
            program_numbering: ProgramNumbering::ZeroBased,
            log_level: "warn".to_string(),
        }
    }

    fn applied(argv: &[&str]) -> Config {
        let args = Args::try_parse_from(std::iter::once("midipc2cmd").chain(argv.iter().copied())).unwrap();
        let mut config = from_file();
        args.apply(&mut config);
        config
    }

    #[test]
    fn no_flags_keep_the_file_settings() {
        assert_eq!(applied(&[]), from_file());
    }

    #[test]
    fn positional_executable_replaces_the_configured_one() {
        let config = applied(&["./other-script"]);
        assert_eq!(config.executable_path, PathBuf::from("./other-script"));
        assert_eq!(config.args, vec!["--bank", "a"]);
    }

    #[test]
    fn accept_replaces_the_configured_kinds() {
        let config = applied(&["-a", "program-change", "--accept", "pitch-bend"]);
        assert_eq!(
            config.accepted_kinds,
            vec![EventKind::ProgramChange, EventKind::PitchBend]
        );
    }

    #[test]
    fn port_name_level_and_numbering_override() {
        let config = applied(&["--port", "Launchkey", "-n", "rig", "--log-level", "debug", "--one-based"]);
        assert_eq!(config.midi_port.as_deref(), Some("Launchkey"));
        assert_eq!(config.client_name, "rig");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.program_numbering, ProgramNumbering::OneBased);

        assert_eq!(applied(&["-c", "Keystep"]).midi_port.as_deref(), Some("Keystep"));
    }

    #[test]
    fn unknown_kind_is_rejected_by_the_parser() {
        let argv = ["midipc2cmd", "--accept", "program_change"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn list_ports_and_config_do_not_touch_the_config() {
        let args = Args::try_parse_from(["midipc2cmd", "--list-ports", "--config", "/tmp/x.toml"]).unwrap();
        assert!(args.list_ports);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/x.toml")));

        let mut config = from_file();
        args.apply(&mut config);
        assert_eq!(config, from_file());
    }
}
