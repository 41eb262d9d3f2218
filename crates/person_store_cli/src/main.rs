//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `person_store_core` linkage by opening a store and listing it.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `person_store_cli [--log-dir ABS_DIR] [DB_PATH]`.
//! Without a path an in-memory store is used. Logs go to `ABS_DIR` at the
//! build's default level when `--log-dir` is given.

use person_store_core::{core_version, default_log_level, init_logging, PersonStore, StoreConfig};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    db_path: Option<PathBuf>,
    log_dir: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = OsString>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--log-dir" {
            let dir = args
                .next()
                .ok_or_else(|| "--log-dir requires a directory".to_string())?;
            let dir = dir
                .into_string()
                .map_err(|_| "--log-dir must be valid UTF-8".to_string())?;
            parsed.log_dir = Some(dir);
        } else if parsed.db_path.is_none() {
            parsed.db_path = Some(PathBuf::from(arg));
        } else {
            return Err(format!("unexpected argument `{}`", arg.to_string_lossy()));
        }
    }

    Ok(parsed)
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args_os().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("person_store_cli error={err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = &args.log_dir {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("person_store_cli error={err}");
            return ExitCode::FAILURE;
        }
    }

    let config = match args.db_path {
        Some(path) => StoreConfig::with_path(path),
        None => StoreConfig::in_memory(),
    };

    println!("person_store_core version={}", core_version());

    let people = match PersonStore::open(&config).and_then(|store| store.list()) {
        Ok(people) => people,
        Err(err) => {
            eprintln!("person_store_cli error={err}");
            return ExitCode::FAILURE;
        }
    };

    println!("person_store_core count={}", people.len());
    for person in people {
        println!(
            "{}\t{}\t{}\t{}",
            person.id, person.first_name, person.last_name, person.bio
        );
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::{parse_args, CliArgs};
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn no_arguments_means_in_memory_without_logging() {
        assert_eq!(parse_args(args(&[])).unwrap(), CliArgs::default());
    }

    #[test]
    fn log_dir_and_db_path_parse_in_any_order() {
        let expected = CliArgs {
            db_path: Some(PathBuf::from("people.sqlite3")),
            log_dir: Some("/tmp/person-logs".to_string()),
        };
        assert_eq!(
            parse_args(args(&["--log-dir", "/tmp/person-logs", "people.sqlite3"])).unwrap(),
            expected
        );
        assert_eq!(
            parse_args(args(&["people.sqlite3", "--log-dir", "/tmp/person-logs"])).unwrap(),
            expected
        );
    }

    #[test]
    fn missing_log_dir_value_and_extra_paths_are_rejected() {
        assert!(parse_args(args(&["--log-dir"])).is_err());
        assert!(parse_args(args(&["a.sqlite3", "b.sqlite3"])).is_err());
    }
}
