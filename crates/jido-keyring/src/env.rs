//! Environment sources: layered env files plus the OS environment.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::key::normalize_key;

/// Env files in ascending precedence for the given environment tag.
pub(crate) fn env_files(dir: &Path, environment: &str) -> [PathBuf; 3] {
    [
        dir.join(".env"),
        dir.join(format!(".{environment}.env")),
        dir.join(format!(".{environment}.overrides.env")),
    ]
}

/// Load every env source into a single normalized map.
///
/// Later sources overwrite earlier ones. Missing files are skipped; a file
/// that exists but fails to parse aborts the load.
pub(crate) fn load_env_sources(
    dir: &Path,
    environment: &str,
    include_process_env: bool,
) -> Result<HashMap<String, Value>> {
    let mut values = HashMap::new();

    for path in env_files(dir, environment) {
        if !path.is_file() {
            debug!(path = %path.display(), "env file not present, skipping");
            continue;
        }
        let count = load_env_file(&path, &mut values)?;
        debug!(path = %path.display(), count, "loaded env file");
    }

    if include_process_env {
        let count = load_process_env(std::env::vars_os(), &mut values);
        debug!(count, "loaded process environment");
    }

    Ok(values)
}

/// Layer OS environment entries over `into`. Entries whose name or value is
/// not valid UTF-8 are skipped.
fn load_process_env<I>(vars: I, into: &mut HashMap<String, Value>) -> usize
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut count = 0;
    for (name, value) in vars {
        let (name, value) = match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => (name, value),
            (Ok(name), Err(_)) => {
                warn!(var = %name, "skipping environment variable with a non-UTF-8 value");
                continue;
            }
            (Err(name), _) => {
                warn!(
                    var = %name.to_string_lossy(),
                    "skipping environment variable with a non-UTF-8 name"
                );
                continue;
            }
        };
        if insert_normalized(into, &name, value) {
            count += 1;
        }
    }
    count
}

fn load_env_file(path: &Path, into: &mut HashMap<String, Value>) -> Result<usize> {
    let wrap = |source| Error::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let mut count = 0;
    for item in dotenvy::from_path_iter(path).map_err(wrap)? {
        let (name, value) = item.map_err(wrap)?;
        if insert_normalized(into, &name, value) {
            count += 1;
        }
    }
    Ok(count)
}

fn insert_normalized(into: &mut HashMap<String, Value>, name: &str, value: String) -> bool {
    let key = normalize_key(name);
    if key.is_empty() {
        return false;
    }
    into.insert(key, Value::String(value));
    true
}

/// Default environment tag: `JIDO_ENV`, then `APP_ENV`, then `"dev"`.
pub(crate) fn default_environment() -> String {
    ["JIDO_ENV", "APP_ENV"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| "dev".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).expect("write env file");
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), ".env", "OPENAI_API_KEY=sk-general\nSHARED=general\n");
        write(dir.path(), ".test.env", "OPENAI_API_KEY=sk-test\n");
        write(dir.path(), ".test.overrides.env", "SHARED=local\n");

        let values = load_env_sources(dir.path(), "test", false).expect("load");

        assert_eq!(values["openai_api_key"], Value::from("sk-test"));
        assert_eq!(values["shared"], Value::from("local"));
    }

    #[test]
    fn missing_files_are_tolerated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let values = load_env_sources(dir.path(), "prod", false).expect("load");
        assert!(values.is_empty());
    }

    #[test]
    fn malformed_file_fails_the_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), ".env", "GOOD=1\nthis line has no equals sign\n");

        let err = load_env_sources(dir.path(), "dev", false).unwrap_err();
        assert!(matches!(err, Error::EnvFile { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_process_entries_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("GOOD_KEY"), OsString::from("ok")),
            (OsString::from("BAD_VALUE"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![b'K', 0xff]), OsString::from("x")),
        ];
        let mut values = HashMap::new();

        assert_eq!(load_process_env(vars, &mut values), 1);
        assert_eq!(values.len(), 1);
        assert_eq!(values["good_key"], Value::from("ok"));
    }

    #[test]
    fn process_entries_override_files() {
        let mut values = HashMap::from([("shared".to_string(), Value::from("file"))]);
        let vars = vec![(OsString::from("SHARED"), OsString::from("os"))];
        load_process_env(vars, &mut values);
        assert_eq!(values["shared"], Value::from("os"));
    }

    #[test]
    fn env_file_names_follow_the_environment_tag() {
        let files = env_files(Path::new("envs"), "staging");
        assert_eq!(files[0], Path::new("envs/.env"));
        assert_eq!(files[1], Path::new("envs/.staging.env"));
        assert_eq!(files[2], Path::new("envs/.staging.overrides.env"));
    }
}
