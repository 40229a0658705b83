use anyhow::{Context, Result, ensure};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Relative path of the project config file.
pub const PROJECT_CONFIG_PATH: &str = ".daygrid/config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub lane: LaneConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub week: WeekConfig,
    #[serde(default)]
    pub month: MonthConfig,
}

impl ProjectConfig {
    /// Reject values the layout math cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid.row_height_px.is_finite() && self.grid.row_height_px > 0.0,
            "grid.row_height_px must be a positive number, got {}",
            self.grid.row_height_px
        );
        ensure!(
            self.grid.min_duration_minutes <= 24 * 60,
            "grid.min_duration_minutes must be at most one day, got {}",
            self.grid.min_duration_minutes
        );
        ensure!(
            self.lane.member_width_px.is_finite() && self.lane.member_width_px > 0.0,
            "lane.member_width_px must be a positive number, got {}",
            self.lane.member_width_px
        );
        ensure!(
            self.lane.max_visible_members >= 1,
            "lane.max_visible_members must be at least 1"
        );
        ensure!(
            self.month.visible_per_cell >= 1,
            "month.visible_per_cell must be at least 1"
        );
        Ok(())
    }
}

/// Vertical time grid geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_row_height_px")]
    pub row_height_px: f64,
    #[serde(default = "default_min_duration_minutes")]
    pub min_duration_minutes: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_height_px: default_row_height_px(),
            min_duration_minutes: default_min_duration_minutes(),
        }
    }
}

/// Day-view scroll lane geometry and its soft member cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneConfig {
    #[serde(default = "default_member_width_px")]
    pub member_width_px: f64,
    #[serde(default = "default_max_visible_members")]
    pub max_visible_members: usize,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            member_width_px: default_member_width_px(),
            max_visible_members: default_max_visible_members(),
        }
    }
}

/// How same-day events are clustered before compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// Maximal connected components of the overlap relation.
    #[default]
    Transitive,
    /// Everything still unassigned that overlaps the earliest unassigned
    /// event; chains further than one hop may split.
    AnchorSingleHop,
}

impl GroupingPolicy {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Transitive => "transitive",
            Self::AnchorSingleHop => "anchor_single_hop",
        }
    }
}

impl fmt::Display for GroupingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GroupingConfig {
    #[serde(default)]
    pub policy: GroupingPolicy,
}

/// First day of the week for week views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    #[must_use]
    pub const fn weekday(self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Sunday => Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WeekConfig {
    #[serde(default)]
    pub starts_on: WeekStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthConfig {
    #[serde(default = "default_visible_per_cell")]
    pub visible_per_cell: usize,
}

impl Default for MonthConfig {
    fn default() -> Self {
        Self {
            visible_per_cell: default_visible_per_cell(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
    /// File the project config came from, if any.
    pub project_source: Option<PathBuf>,
}

/// Load a project config from an explicit file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or holds
/// invalid values.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid values in {}", path.display()))?;
    Ok(config)
}

/// Load `.daygrid/config.toml` under `project_root`, or defaults if absent.
///
/// # Errors
///
/// Propagates [`load_config_file`] failures for a file that exists.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_CONFIG_PATH);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    load_config_file(&path)
}

/// Load `<config_dir>/daygrid/config.toml`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("daygrid/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve project config, user config and output mode.
///
/// An explicit `config_path` replaces project discovery entirely.
///
/// # Errors
///
/// Propagates config load failures.
pub fn resolve_config(
    project_root: &Path,
    config_path: Option<&Path>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let (project, project_source) = match config_path {
        Some(path) => (load_config_file(path)?, Some(path.to_path_buf())),
        None => {
            let discovered = project_root.join(PROJECT_CONFIG_PATH);
            let source = discovered.exists().then_some(discovered);
            (load_project_config(project_root)?, source)
        }
    };
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
        project_source,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_row_height_px() -> f64 {
    56.0
}

const fn default_min_duration_minutes() -> u32 {
    30
}

const fn default_member_width_px() -> f64 {
    180.0
}

const fn default_max_visible_members() -> usize {
    12
}

const fn default_visible_per_cell() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project_config(root: &Path, content: &str) {
        let dir = root.join(".daygrid");
        std::fs::create_dir_all(&dir).expect("create .daygrid");
        std::fs::write(dir.join("config.toml"), content).expect("write config");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert!((cfg.grid.row_height_px - 56.0).abs() < f64::EPSILON);
        assert_eq!(cfg.grid.min_duration_minutes, 30);
        assert!((cfg.lane.member_width_px - 180.0).abs() < f64::EPSILON);
        assert_eq!(cfg.lane.max_visible_members, 12);
        assert_eq!(cfg.grouping.policy, GroupingPolicy::Transitive);
        assert_eq!(cfg.week.starts_on, WeekStart::Monday);
        assert_eq!(cfg.month.visible_per_cell, 3);
    }

    #[test]
    fn partial_project_config_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(
            root.path(),
            r#"
[grid]
row_height_px = 48.0

[grouping]
policy = "anchor_single_hop"

[week]
starts_on = "sunday"
"#,
        );

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert!((cfg.grid.row_height_px - 48.0).abs() < f64::EPSILON);
        assert_eq!(cfg.grid.min_duration_minutes, 30);
        assert_eq!(cfg.grouping.policy, GroupingPolicy::AnchorSingleHop);
        assert_eq!(cfg.week.starts_on.weekday(), Weekday::Sun);
        assert_eq!(cfg.lane.max_visible_members, 12);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[grid]\nrow_height_px = 0.0\n");
        let err = load_project_config(root.path()).expect_err("zero row height must fail");
        assert!(format!("{err:#}").contains("row_height_px"));

        write_project_config(root.path(), "[lane]\nmax_visible_members = 0\n");
        assert!(load_project_config(root.path()).is_err());
    }

    #[test]
    fn malformed_toml_reports_path() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[grid\nrow_height_px = ");
        let err = load_project_config(root.path()).expect_err("bad toml must fail");
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn explicit_config_path_wins_over_discovery() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[grid]\nrow_height_px = 40.0\n");
        let explicit = root.path().join("other.toml");
        std::fs::write(&explicit, "[grid]\nrow_height_px = 64.0\n").expect("write explicit");

        let effective =
            resolve_config(root.path(), Some(&explicit), true).expect("resolve should succeed");
        assert!((effective.project.grid.row_height_px - 64.0).abs() < f64::EPSILON);
        assert_eq!(effective.project_source.as_deref(), Some(explicit.as_path()));
        assert_eq!(effective.resolved_output, "json");
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        let pretty = resolve_output(false, Some("table".to_string()), Some("human".to_string()));
        assert_eq!(pretty, "pretty");

        let text = resolve_output(false, Some("human".to_string()), Some("table".to_string()));
        assert_eq!(text, "text");
    }
}
