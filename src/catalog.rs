//! JSON-backed catalog of CLI command templates.
//!
//! Commands are grouped into categories; each entry carries the command
//! template with `{placeholder}` parameters, an expected-response template
//! used for verification, and an optional regex used to parse structured
//! data out of device output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// One command template in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommandSpec {
    pub command: String,
    #[serde(default)]
    pub expected_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subcommands: BTreeMap<String, String>,
}

/// Catalog of command templates, optionally bound to a file on disk so
/// that edits persist.
#[derive(Debug, Clone, Default)]
pub struct CommandCatalog {
    path: Option<PathBuf>,
    commands: BTreeMap<String, BTreeMap<String, CommandSpec>>,
}

impl CommandCatalog {
    /// Loads the catalog from a JSON file and validates every
    /// `parse_pattern` up front, so a bad regex fails at load rather than
    /// mid-run.
    pub fn load(path: impl AsRef<Path>) -> Result<CommandCatalog> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Catalog(format!("failed to read {}: {e}", path.display())))?;
        let commands: BTreeMap<String, BTreeMap<String, CommandSpec>> =
            serde_json::from_str(&raw)
                .map_err(|e| Error::Catalog(format!("invalid catalog {}: {e}", path.display())))?;
        let catalog = CommandCatalog {
            path: Some(path.to_path_buf()),
            commands,
        };
        catalog.validate_patterns()?;
        debug!(
            "loaded command catalog from {} ({} categories)",
            path.display(),
            catalog.commands.len()
        );
        Ok(catalog)
    }

    /// Builds a catalog from an in-memory JSON document; used by tests.
    pub fn from_json(raw: &str) -> Result<CommandCatalog> {
        let commands = serde_json::from_str(raw)
            .map_err(|e| Error::Catalog(format!("invalid catalog document: {e}")))?;
        let catalog = CommandCatalog {
            path: None,
            commands,
        };
        catalog.validate_patterns()?;
        Ok(catalog)
    }

    fn validate_patterns(&self) -> Result<()> {
        for (category, entries) in &self.commands {
            for (name, spec) in entries {
                if let Some(pattern) = &spec.parse_pattern {
                    Regex::new(pattern).map_err(|source| Error::InvalidParsePattern {
                        category: category.clone(),
                        name: name.clone(),
                        source,
                    })?;
                }
            }
        }
        Ok(())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Looks up a command entry.
    pub fn get(&self, category: &str, name: &str) -> Result<&CommandSpec> {
        self.commands
            .get(category)
            .and_then(|entries| entries.get(name))
            .ok_or_else(|| Error::CommandNotFound {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    /// Renders a command template, substituting every `{placeholder}` from
    /// `params`. A placeholder with no matching parameter is an error;
    /// unused parameters are ignored.
    pub fn format(&self, category: &str, name: &str, params: &[(&str, &str)]) -> Result<String> {
        let spec = self.get(category, name)?;
        substitute(&spec.command, params)
    }

    /// Renders the expected-response template for a command. Unlike
    /// [`CommandCatalog::format`], a missing entry or parameter yields an
    /// empty expectation, which verification treats as "accept anything".
    pub fn expected_response(&self, category: &str, name: &str, params: &[(&str, &str)]) -> String {
        let Ok(spec) = self.get(category, name) else {
            return String::new();
        };
        substitute(&spec.expected_response, params).unwrap_or_default()
    }

    /// Checks device output against the rendered expected response. An
    /// empty expectation always verifies.
    pub fn verify_response(
        &self,
        category: &str,
        name: &str,
        params: &[(&str, &str)],
        response: &str,
    ) -> bool {
        let expected = self.expected_response(category, name, params);
        expected.is_empty() || response.contains(&expected)
    }

    /// Extracts structured matches from device output using the entry's
    /// `parse_pattern`. An entry without a pattern returns the whole
    /// response as its only item.
    pub fn parse_response(&self, category: &str, name: &str, response: &str) -> Result<Vec<String>> {
        let spec = self.get(category, name)?;
        let Some(pattern) = &spec.parse_pattern else {
            return Ok(vec![response.to_string()]);
        };
        let re = Regex::new(pattern).map_err(|source| Error::InvalidParsePattern {
            category: category.to_string(),
            name: name.to_string(),
            source,
        })?;
        Ok(re
            .find_iter(response)
            .map(|m| m.as_str().to_string())
            .collect())
    }

    /// Inserts or replaces a command entry and persists the catalog.
    pub fn update_command(&mut self, category: &str, name: &str, spec: CommandSpec) -> Result<()> {
        if let Some(pattern) = &spec.parse_pattern {
            Regex::new(pattern).map_err(|source| Error::InvalidParsePattern {
                category: category.to_string(),
                name: name.to_string(),
                source,
            })?;
        }
        self.commands
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string(), spec);
        self.persist()
    }

    /// Creates an empty category if it does not exist and persists.
    pub fn add_category(&mut self, category: &str) -> Result<()> {
        self.commands.entry(category.to_string()).or_default();
        self.persist()
    }

    /// Removes a command entry; missing entries are not an error. Persists
    /// on change.
    pub fn remove_command(&mut self, category: &str, name: &str) -> Result<()> {
        let removed = self
            .commands
            .get_mut(category)
            .and_then(|entries| entries.remove(name))
            .is_some();
        if removed {
            self.persist()?;
        } else {
            warn!("remove_command: no entry {category}/{name}");
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let doc = serde_json::to_string_pretty(&self.commands)
            .map_err(|e| Error::Catalog(format!("failed to serialize catalog: {e}")))?;
        std::fs::write(path, doc)
            .map_err(|e| Error::Catalog(format!("failed to write {}: {e}", path.display())))?;
        Ok(())
    }
}

fn substitute(template: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let whole = caps.get(0).unwrap();
        let key = &caps[1];
        let value = params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| Error::MissingParameter(key.to_string()))?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
{
  "vlan_commands": {
    "create_vlan": {
      "command": "vlan {vlan_id}\n name {vlan_name}",
      "expected_response": ""
    },
    "show_vlan": {
      "command": "show vlan brief",
      "expected_response": "{vlan_name}",
      "parse_pattern": "\\d+\\s+\\S+\\s+active"
    }
  },
  "system_commands": {
    "hostname": {
      "command": "hostname {name}",
      "expected_response": ""
    }
  }
}
"#;

    #[test]
    fn formats_multiline_template() {
        let catalog = CommandCatalog::from_json(CATALOG).unwrap();
        let rendered = catalog
            .format(
                "vlan_commands",
                "create_vlan",
                &[("vlan_id", "10"), ("vlan_name", "TEST_VLAN")],
            )
            .unwrap();
        assert_eq!(rendered, "vlan 10\n name TEST_VLAN");
        // Rendered text has no placeholders left, so substituting again
        // changes nothing.
        assert_eq!(substitute(&rendered, &[]).unwrap(), rendered);
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let catalog = CommandCatalog::from_json(CATALOG).unwrap();
        let err = catalog
            .format("vlan_commands", "create_vlan", &[("vlan_id", "10")])
            .expect_err("vlan_name is missing");
        assert!(matches!(err, Error::MissingParameter(name) if name == "vlan_name"));
    }

    #[test]
    fn unknown_command_is_an_error() {
        let catalog = CommandCatalog::from_json(CATALOG).unwrap();
        let err = catalog
            .format("vlan_commands", "no_such", &[])
            .expect_err("unknown command");
        assert!(matches!(err, Error::CommandNotFound { .. }));
    }

    #[test]
    fn expected_response_is_lenient() {
        let catalog = CommandCatalog::from_json(CATALOG).unwrap();
        // Unknown entry and missing parameter both render empty.
        assert_eq!(catalog.expected_response("vlan_commands", "no_such", &[]), "");
        assert_eq!(catalog.expected_response("vlan_commands", "show_vlan", &[]), "");
        assert_eq!(
            catalog.expected_response("vlan_commands", "show_vlan", &[("vlan_name", "LAB")]),
            "LAB"
        );
    }

    #[test]
    fn verify_response_substring_match() {
        let catalog = CommandCatalog::from_json(CATALOG).unwrap();
        let output = "10   LAB   active";
        assert!(catalog.verify_response(
            "vlan_commands",
            "show_vlan",
            &[("vlan_name", "LAB")],
            output
        ));
        assert!(!catalog.verify_response(
            "vlan_commands",
            "show_vlan",
            &[("vlan_name", "OTHER")],
            output
        ));
        // Empty expectation verifies anything.
        assert!(catalog.verify_response("vlan_commands", "create_vlan", &[], "whatever"));
    }

    #[test]
    fn parse_response_uses_pattern() {
        let catalog = CommandCatalog::from_json(CATALOG).unwrap();
        let output = "1    default  active\n10   LAB      active\n99   unused   act/lshut";
        let rows = catalog
            .parse_response("vlan_commands", "show_vlan", output)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("1 "));
        // No pattern: the whole response comes back as one item.
        let whole = catalog
            .parse_response("vlan_commands", "create_vlan", output)
            .unwrap();
        assert_eq!(whole, vec![output.to_string()]);
    }

    #[test]
    fn shipped_catalog_extracts_rows_from_multiline_output() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/switch_commands.json");
        let catalog = CommandCatalog::load(path).unwrap();
        let output = "VLAN Name     Status    Ports\n\
                      ---- -------- --------- -----\n\
                      1    default  active    Fa0/3\n\
                      10   LAB      active    Fa0/1\n";
        let rows = catalog
            .parse_response("vlan_commands", "show_vlan", output)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("1 "));
        assert!(rows[1].starts_with("10 "));
    }

    #[test]
    fn invalid_pattern_rejected_at_load() {
        let raw = r#"{"x": {"bad": {"command": "c", "parse_pattern": "(unclosed"}}}"#;
        let err = CommandCatalog::from_json(raw).expect_err("bad regex");
        assert!(matches!(err, Error::InvalidParsePattern { .. }));
    }

    #[test]
    fn update_and_remove_persist_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");
        std::fs::write(&path, CATALOG).unwrap();

        let mut catalog = CommandCatalog::load(&path).unwrap();
        catalog
            .update_command(
                "system_commands",
                "reload",
                CommandSpec {
                    command: "reload".to_string(),
                    ..CommandSpec::default()
                },
            )
            .unwrap();
        catalog.remove_command("vlan_commands", "show_vlan").unwrap();

        let reloaded = CommandCatalog::load(&path).unwrap();
        assert!(reloaded.get("system_commands", "reload").is_ok());
        assert!(reloaded.get("vlan_commands", "show_vlan").is_err());
    }
}
