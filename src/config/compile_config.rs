use crate::error::{CompileError, CompileResult};
use crate::preprocessor::{DEFAULT_ROOT_UNIT, IncludeMap, normalize_path};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// File extensions picked up by [`CompileConfig::load_include_dir`]
pub const SHADER_EXTENSIONS: &[&str] = &["glsl", "vert", "frag", "gs", "shader", "inc"];

/// Engine-injected macro; `None` defines it as `1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredefinedMacro {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    pub root_unit: String,
    pub base_path: String,
    pub predefined_macros: Vec<PredefinedMacro>,
    pub includes: BTreeMap<String, String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            root_unit: DEFAULT_ROOT_UNIT.to_string(),
            base_path: "".to_string(),
            predefined_macros: Vec::new(),
            includes: BTreeMap::new(),
        }
    }
}

impl CompileConfig {
    pub fn load_from_file(path: &Path) -> CompileResult<Self> {
        let file = fs::File::open(path).map_err(|e| config_error(path, e))?;
        let reader = std::io::BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(config) => Ok(config),
            Err(e) => Err(config_error(path, e)),
        }
    }

    pub fn from_json_str(s: &str) -> CompileResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> CompileResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add or replace a predefined macro
    pub fn define(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        self.predefined_macros.retain(|m| m.name != name);
        self.predefined_macros.push(PredefinedMacro {
            name: name.to_string(),
            value: value.map(|v| v.to_string()),
        });
        self
    }

    pub fn add_include(&mut self, path: &str, text: &str) -> &mut Self {
        self.includes.insert(path.to_string(), text.to_string());
        self
    }

    /// Register every shader file below `dir`, keyed by its `/`-separated relative path.
    /// Returns the number of files added.
    pub fn load_include_dir(&mut self, dir: &Path) -> CompileResult<usize> {
        let mut count = 0;
        self.load_include_dir_recursive(dir, "", &mut count)?;
        log::debug!("loaded {} include file(s) from {:?}", count, dir);
        Ok(count)
    }

    fn load_include_dir_recursive(
        &mut self,
        dir: &Path,
        prefix: &str,
        count: &mut usize,
    ) -> CompileResult<()> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| config_error(dir, e))? {
            let entry = entry.map_err(|e| config_error(dir, e))?;
            entries.push(entry.path());
        }
        entries.sort();

        for path in entries {
            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            let key = if prefix.is_empty() {
                file_name
            } else {
                format!("{}/{}", prefix, file_name)
            };

            if path.is_dir() {
                self.load_include_dir_recursive(&path, &key, count)?;
            } else if is_shader_file(&path) {
                let text = fs::read_to_string(&path).map_err(|e| config_error(&path, e))?;
                self.includes.insert(key, text);
                *count += 1;
            }
        }
        Ok(())
    }

    /// Includes keyed by normalized `/`-separated path
    pub fn include_map(&self) -> IncludeMap {
        self.includes
            .iter()
            .map(|(k, v)| (normalize_path(k), v.clone()))
            .collect()
    }
}

fn is_shader_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| SHADER_EXTENSIONS.contains(&e))
}

fn config_error(path: &Path, e: impl std::fmt::Display) -> CompileError {
    CompileError::config(path.display().to_string(), e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_partial_json() {
        let config = CompileConfig::from_json_str(
            r#"{ "predefined_macros": [ { "name": "GLES" }, { "name": "MAX_LIGHTS", "value": "4" } ] }"#,
        )
        .unwrap();
        assert_eq!(config.root_unit, "shader");
        assert_eq!(config.base_path, "");
        assert_eq!(config.predefined_macros[0].value, None);
        assert_eq!(config.predefined_macros[1].value.as_deref(), Some("4"));
    }

    #[test]
    fn test_malformed_json() {
        let err = CompileConfig::from_json_str("{ \"root_unit\": 3 }").unwrap_err();
        assert!(matches!(err, CompileError::ConfigError { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("compile.json");
        let mut config = CompileConfig::default();
        config.define("USE_FOG", None).add_include("common.glsl", "float x;");
        fs::write(&path, config.to_json_string().unwrap()).unwrap();

        let loaded = CompileConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");
        match CompileConfig::load_from_file(&path) {
            Err(CompileError::ConfigError { path: p, .. }) => assert!(p.ends_with("missing.json")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_include_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("lib/brdf")).unwrap();
        fs::write(temp_dir.path().join("common.glsl"), "common();").unwrap();
        fs::write(temp_dir.path().join("lib/light.inc"), "light();").unwrap();
        fs::write(temp_dir.path().join("lib/brdf/ggx.frag"), "ggx();").unwrap();
        fs::write(temp_dir.path().join("README.md"), "not a shader").unwrap();

        let mut config = CompileConfig::default();
        let count = config.load_include_dir(temp_dir.path()).unwrap();
        assert_eq!(count, 3);
        assert_eq!(config.includes.get("lib/brdf/ggx.frag").map(|s| s.as_str()), Some("ggx();"));
        assert!(config.includes.contains_key("common.glsl"));
        assert!(config.includes.contains_key("lib/light.inc"));
        assert!(!config.includes.contains_key("README.md"));
    }

    #[test]
    fn test_include_map_normalizes_keys() {
        let mut config = CompileConfig::default();
        config
            .add_include("./lib/a.glsl", "a();")
            .add_include("lib\\b.glsl", "b();");
        let includes = config.include_map();
        assert_eq!(includes.get("lib/a.glsl").map(|s| s.as_str()), Some("a();"));
        assert_eq!(includes.get("lib/b.glsl").map(|s| s.as_str()), Some("b();"));
    }

    #[test]
    fn test_define_replaces() {
        let mut config = CompileConfig::default();
        config.define("A", Some("1")).define("A", Some("2"));
        assert_eq!(config.predefined_macros.len(), 1);
        assert_eq!(config.predefined_macros[0].value.as_deref(), Some("2"));
    }
}
