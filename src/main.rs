use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::{error, info, warn};

use orbitals::config::load_or_default;
use orbitals::{OrbitalBuilder, QuantumState};

const USAGE: &str = "orbitals <n> <l> <m> <s> [settings.json]   (s: 1 = up, -1 = down, 0 = both)";

fn parse_state(args: &[String]) -> Result<QuantumState, String> {
    if args.len() != 4 {
        return Err(format!("expected 4 quantum numbers, got {}", args.len()));
    }
    let n: u32 = args[0].parse().map_err(|e| format!("n = {:?}: {e}", args[0]))?;
    let l: u32 = args[1].parse().map_err(|e| format!("l = {:?}: {e}", args[1]))?;
    let m: i32 = args[2].parse().map_err(|e| format!("m = {:?}: {e}", args[2]))?;
    let s: i32 = args[3].parse().map_err(|e| format!("s = {:?}: {e}", args[3]))?;
    QuantumState::from_input(n, l, m, s)
}

/// Splits the command line into a state and an optional settings path.
fn parse_args(args: &[String]) -> Result<(QuantumState, Option<&Path>), String> {
    match args.len() {
        0 => {
            warn!("No quantum numbers given, generating the default 1s orbital");
            Ok((QuantumState::default(), None))
        }
        4 | 5 => Ok((parse_state(&args[..4])?, args.get(4).map(Path::new))),
        _ => Err(format!("Usage: {USAGE}")),
    }
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (state, settings_path) = parse_args(&args)?;

    let settings = load_or_default(settings_path).map_err(|e| {
        error!("Failed to load settings: {e}");
        e
    })?;

    let builder = OrbitalBuilder::from_settings(&settings);
    let cloud = builder.regenerate(state);

    let out_path = format!("orbital_{}.json", state.label());
    let file = File::create(&out_path).map_err(|e| format!("create {out_path}: {e}"))?;
    serde_json::to_writer(BufWriter::new(file), &cloud)
        .map_err(|e| format!("write {out_path}: {e}"))?;

    info!("Wrote {} points to {}", cloud.count(), out_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitals::Spin;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_state() {
        let state = parse_state(&args(&["3", "2", "-1", "0"])).unwrap();
        assert_eq!(state, QuantumState { n: 3, l: 2, m: -1, spin: Spin::Mixed });
    }

    #[test]
    fn test_parse_state_rejects_bad_input() {
        assert!(parse_state(&args(&["8", "0", "0", "1"])).is_err());
        assert!(parse_state(&args(&["2", "2", "0", "1"])).is_err());
        assert!(parse_state(&args(&["2", "1", "0", "3"])).is_err());
        assert!(parse_state(&args(&["two", "1", "0", "1"])).is_err());
        assert!(parse_state(&args(&["2", "1", "0"])).is_err());
    }

    #[test]
    fn test_unmodeled_but_valid_state_parses() {
        let state = parse_state(&args(&["5", "0", "0", "1"])).unwrap();
        assert!(!state.is_modeled());
    }

    #[test]
    fn test_wrong_argument_count_is_a_usage_error() {
        let wrong: [&[&str]; 3] = [&["2"], &["2", "1"], &["2", "1", "0", "1", "a.json", "extra"]];
        for values in wrong {
            let err = parse_args(&args(values)).unwrap_err();
            assert!(err.starts_with("Usage:"), "{err}");
        }

        let (state, path) = parse_args(&[]).unwrap();
        assert_eq!(state, QuantumState::default());
        assert!(path.is_none());

        let full = args(&["2", "1", "-1", "-1", "settings.json"]);
        let (state, path) = parse_args(&full).unwrap();
        assert_eq!(state, QuantumState { n: 2, l: 1, m: -1, spin: Spin::Down });
        assert_eq!(path, Some(Path::new("settings.json")));
    }
}
