//! Project configuration
//!
//! A project is a directory holding `compack.json` and one recipe file
//! (`recipe.json`, `recipe.yaml` or `recipe.yml`). All build output goes under
//! `compack-build/`:
//!
//! ```text
//! compack-build/
//!   artifacts/<component>/<version>/   staged artifacts
//!   recipes/<recipe file>              build recipe
//!   publish/<recipe file>              publish recipe
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::version::VersionExpression;

/// Project configuration file name
pub const PROJECT_FILE: &str = "compack.json";

/// Build output directory, relative to the project root
pub const BUILD_DIR: &str = "compack-build";

const RECIPE_CANDIDATES: [&str; 3] = ["recipe.json", "recipe.yaml", "recipe.yml"];

/// How the component's artifacts are produced
///
/// Building is done by the tool itself; the build system only tells compack
/// where to look for its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    Zip,
    Maven,
    Gradle,
    #[default]
    Custom,
}

impl BuildSystem {
    /// Output folders, relative to the project root, in probe order
    pub fn default_build_folders(&self) -> &'static [&'static str] {
        match self {
            Self::Zip => &["zip-build"],
            Self::Maven => &["target"],
            Self::Gradle => &["build/libs"],
            Self::Custom => &[],
        }
    }
}

/// On-disk layout of `compack.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub component: IndexMap<String, ComponentEntry>,

    #[serde(default)]
    pub compack_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub author: String,

    pub version: String,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub publish: PublishSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub build_system: BuildSystem,

    /// Overrides the build system's default output folders
    #[serde(default)]
    pub build_folders: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishSection {
    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub region: String,
}

/// Resolved parameters for one build or publish invocation
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub component_name: String,
    pub author: String,
    pub version: VersionExpression,
    pub bucket: String,
    pub region: String,
    pub build_system: BuildSystem,

    /// Folders probed for build output, in order
    pub build_folders: Vec<PathBuf>,

    pub project_root: PathBuf,
    pub recipe_file: PathBuf,

    /// Parent of the per-version artifact directories
    pub artifacts_dir: PathBuf,
    pub build_recipe_dir: PathBuf,
    pub publish_recipe_file: PathBuf,
}

impl ProjectConfig {
    /// Configuration with the standard directory layout and empty publish target
    pub fn new(
        project_root: impl Into<PathBuf>,
        component_name: impl Into<String>,
        recipe_file_name: &str,
    ) -> Self {
        let project_root = project_root.into();
        let component_name = component_name.into();
        let build_dir = project_root.join(BUILD_DIR);

        Self {
            artifacts_dir: build_dir.join("artifacts").join(&component_name),
            build_recipe_dir: build_dir.join("recipes"),
            publish_recipe_file: build_dir.join("publish").join(recipe_file_name),
            recipe_file: project_root.join(recipe_file_name),
            component_name,
            author: String::new(),
            version: VersionExpression::NextPatch,
            bucket: String::new(),
            region: String::new(),
            build_system: BuildSystem::default(),
            build_folders: Vec::new(),
            project_root,
        }
    }

    /// Load `compack.json` from a project directory
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self> {
        let root = project_root.as_ref();
        let path = root.join(PROJECT_FILE);
        if !path.exists() {
            return Err(CoreError::ConfigNotFound { path });
        }

        let content = std::fs::read_to_string(&path)?;
        let file: ProjectFile =
            serde_json::from_str(&content).map_err(|e| CoreError::InvalidConfig {
                message: format!("{}: {}", path.display(), e),
            })?;

        Self::from_project_file(root, file)
    }

    /// Resolve a parsed project file against its project directory
    pub fn from_project_file(project_root: &Path, file: ProjectFile) -> Result<Self> {
        let count = file.component.len();
        let mut components = file.component.into_iter();
        let (name, entry) = match (components.next(), components.next()) {
            (Some(component), None) => component,
            _ => {
                return Err(CoreError::InvalidConfig {
                    message: format!(
                        "expected exactly one component in {}, found {}",
                        PROJECT_FILE, count
                    ),
                });
            }
        };

        if name.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "component name must not be empty".to_string(),
            });
        }

        let recipe_file_name = find_recipe_file(project_root)?;
        let version: VersionExpression = entry.version.parse()?;

        let build_folders = if entry.build.build_folders.is_empty() {
            entry
                .build
                .build_system
                .default_build_folders()
                .iter()
                .map(|f| project_root.join(f))
                .collect()
        } else {
            entry
                .build
                .build_folders
                .iter()
                .map(|f| project_root.join(f))
                .collect()
        };

        let mut config = Self::new(project_root, name, &recipe_file_name);
        config.author = entry.author;
        config.version = version;
        config.bucket = entry.publish.bucket;
        config.region = entry.publish.region;
        config.build_system = entry.build.build_system;
        config.build_folders = build_folders;
        Ok(config)
    }

    /// Staged artifact directory for one version
    pub fn artifacts_dir_for(&self, version: &str) -> PathBuf {
        self.artifacts_dir.join(version)
    }

    pub fn recipe_file_name(&self) -> &OsStr {
        self.recipe_file.file_name().unwrap_or_default()
    }

    /// Where the build stage writes its recipe
    pub fn build_recipe_file(&self) -> PathBuf {
        self.build_recipe_dir.join(self.recipe_file_name())
    }
}

/// Find the single recipe file in a project directory
fn find_recipe_file(project_root: &Path) -> Result<String> {
    let found: Vec<&str> = RECIPE_CANDIDATES
        .iter()
        .copied()
        .filter(|name| project_root.join(name).is_file())
        .collect();

    match found.as_slice() {
        [single] => Ok(single.to_string()),
        [] => Err(CoreError::InvalidConfig {
            message: format!(
                "no recipe file in {} (expected one of: {})",
                project_root.display(),
                RECIPE_CANDIDATES.join(", ")
            ),
        }),
        many => Err(CoreError::InvalidConfig {
            message: format!(
                "more than one recipe file in {}: {}",
                project_root.display(),
                many.join(", ")
            ),
        }),
    }
}
