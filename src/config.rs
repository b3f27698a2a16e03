use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::Error;
use crate::prompt::Prompter;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/tuntool.json";

const DEFAULT_SSH_HOST_IP: &str = "";
const DEFAULT_SSH_USER: &str = "";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub local_port: String,
    pub remote_host: String,
    pub remote_port: String,
}

impl Remote {
    /// The `-L` argument for this remote, also what identifies its ssh process.
    pub fn forward_spec(&self) -> String {
        format!("{}:{}:{}", self.local_port, self.remote_host, self.remote_port)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub ssh_host_ip: String,
    pub ssh_user: String,
    #[serde(default)]
    pub remotes: BTreeMap<String, Remote>,
}

pub fn expand_config_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

pub fn load_config(path: &Path) -> Result<Config, Error> {
    let raw = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config at `path`, asking for the ssh defaults and writing a fresh
/// file when there is none yet.
pub fn load_or_init<P>(path: &Path, prompter: &mut P, out: &mut dyn Write) -> Result<Config, Error>
where
    P: Prompter + ?Sized,
{
    if path.is_file() {
        return load_config(path);
    }

    writeln!(out, "Configuration file wasn't found. Generating one...")?;
    let ssh_host_ip = ask_with_default(prompter, "ssh host ip", DEFAULT_SSH_HOST_IP)?;
    let ssh_user = ask_with_default(prompter, "ssh user", DEFAULT_SSH_USER)?;

    let config = Config {
        ssh_host_ip,
        ssh_user,
        remotes: BTreeMap::new(),
    };
    save_config(path, &config)?;
    tracing::info!(path = %path.display(), "created config");
    Ok(config)
}

fn ask_with_default<P>(prompter: &mut P, name: &str, default: &str) -> Result<String, Error>
where
    P: Prompter + ?Sized,
{
    let answer = prompter
        .ask(&format!("Enter the {name} [{default}]: "))
        .map_err(Error::Prompt)?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Replace `path` with the whole config: sorted keys, four-space indent.
/// The new contents go to a sibling temp file that is renamed over `path`,
/// so a crash leaves either the old file or the new one.
pub fn save_config(path: &Path, config: &Config) -> Result<(), Error> {
    let contents = to_json(config)?;
    let write_err = |source: io::Error| Error::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(&contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn to_json(config: &Config) -> Result<Vec<u8>, Error> {
    // serde_json::Value keeps object keys in a BTreeMap, which sorts them.
    let value = serde_json::to_value(config).map_err(Error::ConfigSerialize)?;
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(Error::ConfigSerialize)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::tests::Scripted;

    fn sample() -> Config {
        let mut remotes = BTreeMap::new();
        remotes.insert(
            "db".to_string(),
            Remote {
                local_port: "5432".to_string(),
                remote_host: "dbhost".to_string(),
                remote_port: "5432".to_string(),
            },
        );
        Config {
            ssh_host_ip: "10.0.0.1".to_string(),
            ssh_user: "bob".to_string(),
            remotes,
        }
    }

    #[test]
    fn check_basic_deserialization() {
        let raw = r#"{"ssh_host_ip":"10.0.0.1","ssh_user":"bob","remotes":{"db":{"local_port":"5432","remote_host":"dbhost","remote_port":"5432"}}}"#;
        let parsed: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, sample());
        assert_eq!(parsed.remotes["db"].forward_spec(), "5432:dbhost:5432");
    }

    #[test]
    fn save_then_load_preserves_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tuntool.json");
        save_config(&path, &sample()).unwrap();
        assert_eq!(load_config(&path).unwrap(), sample());
    }

    #[test]
    fn saved_file_is_sorted_and_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuntool.json");
        save_config(&path, &sample()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let expected = r#"{
    "remotes": {
        "db": {
            "local_port": "5432",
            "remote_host": "dbhost",
            "remote_port": "5432"
        }
    },
    "ssh_host_ip": "10.0.0.1",
    "ssh_user": "bob"
}"#;
        assert_eq!(written, expected);
    }

    #[test]
    fn save_replaces_the_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuntool.json");
        fs::write(&path, "x".repeat(4096)).unwrap();

        save_config(&path, &sample()).unwrap();
        save_config(&path, &Config::default()).unwrap();

        assert_eq!(load_config(&path).unwrap(), Config::default());
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("tuntool.json")]);
    }

    #[test]
    fn failed_save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        // a directory at the target makes the final rename fail
        let path = dir.path().join("tuntool.json");
        fs::create_dir(&path).unwrap();

        let err = save_config(&path, &sample()).unwrap_err();

        assert!(matches!(err, Error::ConfigWrite { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(path.is_dir());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuntool.json");
        fs::write(&path, "{ not json").unwrap();
        let mut prompter = Scripted::new(&[]);
        let err = load_or_init(&path, &mut prompter, &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(prompter.asked.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn missing_file_is_bootstrapped_from_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuntool.json");
        let mut prompter = Scripted::new(&[" 10.0.0.1 ", "bob"]);
        let mut out: Vec<u8> = Vec::new();

        let config = load_or_init(&path, &mut prompter, &mut out).unwrap();

        assert_eq!(config.ssh_host_ip, "10.0.0.1");
        assert_eq!(config.ssh_user, "bob");
        assert!(config.remotes.is_empty());
        assert_eq!(
            prompter.asked,
            vec!["Enter the ssh host ip []: ", "Enter the ssh user []: "]
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Configuration file wasn't found. Generating one...\n"
        );
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn blank_bootstrap_answers_fall_back_to_empty_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuntool.json");
        let mut prompter = Scripted::new(&["", "  "]);
        let config = load_or_init(&path, &mut prompter, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(config, Config::default());
        assert!(fs::read_to_string(&path).unwrap().contains("\"remotes\": {}"));
    }

    #[test]
    fn existing_file_is_loaded_without_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuntool.json");
        save_config(&path, &sample()).unwrap();
        let mut prompter = Scripted::new(&[]);
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(load_or_init(&path, &mut prompter, &mut out).unwrap(), sample());
        assert!(out.is_empty());
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_config_path(DEFAULT_CONFIG_PATH);
        assert!(!expanded.starts_with("~"));
        assert!(expanded.ends_with(".config/tuntool.json"));
    }
}
