//! Build stage: stamp the recipe and stage its artifacts
//!
//! Every `s3://` artifact must resolve, either to a file in one of the build
//! folders (copied into the versioned artifacts directory) or to an object
//! that already exists in storage. The first artifact that resolves to
//! neither aborts the build.

use compack_core::{artifact_file_name, is_s3_uri, keys, ProjectConfig, RecipeDocument, S3Uri};
use compack_repo::{ObjectStore, RepoError};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::version::{resolve_version, LocalVersionScan};

/// Bucket placeholder written into build recipes
pub const BUCKET_PLACEHOLDER: &str = "BUCKET_NAME";
/// Component name placeholder written into build recipes
pub const NAME_PLACEHOLDER: &str = "COMPONENT_NAME";
/// Component version placeholder written into build recipes
pub const VERSION_PLACEHOLDER: &str = "COMPONENT_VERSION";

/// Placeholder locator for a locally staged artifact
pub fn placeholder_uri(file_name: &str) -> String {
    S3Uri::for_artifact(BUCKET_PLACEHOLDER, NAME_PLACEHOLDER, VERSION_PLACEHOLDER, file_name)
        .to_string()
}

/// How one artifact was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactResolution {
    /// Found in a build folder and copied into the staged directory
    Copied { source: PathBuf, staged: PathBuf },
    /// Not built locally but already present in object storage
    Remote,
}

#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub manifest_index: usize,
    pub artifact_index: usize,
    pub file_name: String,
    /// Locator as written in the source recipe
    pub uri: String,
    pub resolution: ArtifactResolution,
}

/// Result of a complete build run
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub version: String,
    pub recipe_path: PathBuf,
    pub staged_dir: PathBuf,
    pub artifacts: Vec<ResolvedArtifact>,
}

impl BuildOutcome {
    pub fn copied(&self) -> impl Iterator<Item = &ResolvedArtifact> {
        self.artifacts
            .iter()
            .filter(|a| matches!(a.resolution, ArtifactResolution::Copied { .. }))
    }

    pub fn remote(&self) -> impl Iterator<Item = &ResolvedArtifact> {
        self.artifacts
            .iter()
            .filter(|a| a.resolution == ArtifactResolution::Remote)
    }
}

/// Produces the build recipe for a project
pub struct BuildRecipeTransformer<'a> {
    config: &'a ProjectConfig,
    store: &'a dyn ObjectStore,
}

impl<'a> BuildRecipeTransformer<'a> {
    pub fn new(config: &'a ProjectConfig, store: &'a dyn ObjectStore) -> Self {
        Self { config, store }
    }

    /// Stamp identity and resolve artifacts for `version`
    pub fn transform(
        &self,
        document: RecipeDocument,
        version: &str,
        build_folders: &[PathBuf],
    ) -> Result<RecipeDocument> {
        self.transform_with_report(document, version, build_folders)
            .map(|(document, _)| document)
    }

    fn transform_with_report(
        &self,
        mut document: RecipeDocument,
        version: &str,
        build_folders: &[PathBuf],
    ) -> Result<(RecipeDocument, Vec<ResolvedArtifact>)> {
        document.insert(keys::COMPONENT_NAME, self.config.component_name.as_str());
        document.insert(keys::COMPONENT_VERSION, version);
        document.insert(keys::COMPONENT_PUBLISHER, self.config.author.as_str());

        let staged_dir = self.config.artifacts_dir_for(version);
        let mut resolved = Vec::new();

        document.visit_artifacts_mut(|mut slot| -> Result<()> {
            let Some(uri) = slot.uri().filter(|u| is_s3_uri(u)).map(str::to_string) else {
                return Ok(());
            };
            let file_name = artifact_file_name(&uri).to_string();

            let resolution = if let Some(source) = probe_build_folders(build_folders, &file_name) {
                let staged = stage_artifact(&source, &staged_dir, &file_name)?;
                slot.set_uri(placeholder_uri(&file_name));
                ArtifactResolution::Copied { source, staged }
            } else if self.exists_remotely(&uri)? {
                tracing::debug!(uri = %uri, "artifact not built locally, found in object storage");
                ArtifactResolution::Remote
            } else {
                return Err(EngineError::ArtifactNotFound {
                    file_name,
                    uri,
                    searched: build_folders.to_vec(),
                });
            };

            resolved.push(ResolvedArtifact {
                manifest_index: slot.manifest_index,
                artifact_index: slot.artifact_index,
                file_name,
                uri,
                resolution,
            });
            Ok(())
        })?;

        Ok((document, resolved))
    }

    /// Locators the store cannot address count as absent
    fn exists_remotely(&self, uri: &str) -> Result<bool> {
        let Some(locator) = S3Uri::parse(uri) else {
            return Ok(false);
        };
        match self.store.object_exists(&locator) {
            Ok(exists) => Ok(exists),
            Err(RepoError::InvalidLocator { reason, .. }) => {
                tracing::debug!(uri = %uri, %reason, "locator not addressable in object storage");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the version locally, transform the project recipe and write it
    pub fn run(&self, build_folders: &[PathBuf]) -> Result<BuildOutcome> {
        let version = resolve_version(
            &self.config.version,
            &LocalVersionScan::from_config(self.config),
        )?;

        let document = RecipeDocument::read(&self.config.recipe_file)?;
        let (document, artifacts) = self.transform_with_report(document, &version, build_folders)?;

        let recipe_path = self.config.build_recipe_file();
        document.write(&recipe_path)?;

        tracing::info!(
            component = %self.config.component_name,
            version = %version,
            path = %recipe_path.display(),
            "wrote build recipe"
        );

        Ok(BuildOutcome {
            staged_dir: self.config.artifacts_dir_for(&version),
            version,
            recipe_path,
            artifacts,
        })
    }
}

/// First build folder holding a regular file with this name
fn probe_build_folders(build_folders: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    build_folders
        .iter()
        .map(|folder| folder.join(file_name))
        .find(|candidate| candidate.is_file())
}

fn stage_artifact(source: &Path, staged_dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(staged_dir)?;
    let staged = staged_dir.join(file_name);
    std::fs::copy(source, &staged)?;
    tracing::debug!(from = %source.display(), to = %staged.display(), "staged artifact");
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compack_core::Node;
    use compack_repo::{DirectoryObjectStore, MemoryObjectStore};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    struct Project {
        dir: TempDir,
        config: ProjectConfig,
    }

    impl Project {
        fn new(recipe_file: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = ProjectConfig::new(dir.path(), "com.example.Hello", recipe_file);
            config.author = "Example Corp".to_string();
            Self { dir, config }
        }

        fn folder(&self, name: &str) -> PathBuf {
            let folder = self.dir.path().join(name);
            fs::create_dir_all(&folder).unwrap();
            folder
        }

        fn put(&self, folder: &str, file: &str, content: &str) {
            fs::write(self.folder(folder).join(file), content).unwrap();
        }
    }

    fn recipe(uris: &[&str]) -> RecipeDocument {
        let artifacts: Vec<_> = uris.iter().map(|u| json!({"Uri": u})).collect();
        RecipeDocument::from_plain(json!({
            "RecipeFormatVersion": "2020-01-25",
            "ComponentName": "old",
            "Manifests": [{"Platform": {"os": "linux"}, "Artifacts": artifacts}]
        }))
        .unwrap()
    }

    #[test]
    fn test_stamps_identity_keeping_casing() {
        let project = Project::new("recipe.json");
        let store = MemoryObjectStore::new();
        let doc = RecipeDocument::from_plain(json!({"componentname": "old", "COMPONENTVERSION": "0.0.1"})).unwrap();

        let out = BuildRecipeTransformer::new(&project.config, &store)
            .transform(doc, "1.0.0", &[])
            .unwrap();

        assert_eq!(
            out.to_plain(),
            json!({
                "componentname": "com.example.Hello",
                "COMPONENTVERSION": "1.0.0",
                "ComponentPublisher": "Example Corp"
            })
        );
    }

    #[test]
    fn test_local_artifact_is_copied_and_rewritten() {
        let project = Project::new("recipe.json");
        project.put("zip-build", "hello.py", "print('hello')");
        let store = MemoryObjectStore::new();

        let out = BuildRecipeTransformer::new(&project.config, &store)
            .transform(
                recipe(&["s3://my-bucket/artifacts/hello.py"]),
                "1.0.0",
                &[project.folder("zip-build")],
            )
            .unwrap();

        assert_eq!(
            out.artifact_uris(),
            ["s3://BUCKET_NAME/COMPONENT_NAME/COMPONENT_VERSION/hello.py"]
        );
        let staged = project.config.artifacts_dir_for("1.0.0").join("hello.py");
        assert_eq!(fs::read_to_string(staged).unwrap(), "print('hello')");
        assert_eq!(store.operation_counts().object_exists, 0);
    }

    #[test]
    fn test_first_build_folder_wins() {
        let project = Project::new("recipe.json");
        project.put("first", "app.jar", "first");
        project.put("second", "app.jar", "second");
        let store = MemoryObjectStore::new();

        BuildRecipeTransformer::new(&project.config, &store)
            .transform(
                recipe(&["s3://b/app.jar"]),
                "1.0.0",
                &[project.folder("first"), project.folder("second")],
            )
            .unwrap();

        let staged = project.config.artifacts_dir_for("1.0.0").join("app.jar");
        assert_eq!(fs::read_to_string(staged).unwrap(), "first");
    }

    #[test]
    fn test_directory_with_artifact_name_is_not_a_match() {
        let project = Project::new("recipe.json");
        fs::create_dir_all(project.folder("out").join("hello.py")).unwrap();
        let store = MemoryObjectStore::new();

        let err = BuildRecipeTransformer::new(&project.config, &store)
            .transform(recipe(&["s3://b/hello.py"]), "1.0.0", &[project.folder("out")])
            .unwrap_err();
        assert!(matches!(err, EngineError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_remote_artifact_is_left_untouched() {
        let project = Project::new("recipe.json");
        let store = MemoryObjectStore::with_objects(&["s3://shared/libs/common.zip"]);

        let out = BuildRecipeTransformer::new(&project.config, &store)
            .transform(recipe(&["s3://shared/libs/common.zip"]), "1.0.0", &[project.folder("zip-build")])
            .unwrap();

        assert_eq!(out.artifact_uris(), ["s3://shared/libs/common.zip"]);
        assert_eq!(store.operation_counts().object_exists, 1);
        assert!(!project.config.artifacts_dir_for("1.0.0").exists());
    }

    #[test]
    fn test_missing_artifact_fails() {
        let project = Project::new("recipe.json");
        let store = MemoryObjectStore::new();
        let folders = vec![project.folder("zip-build")];

        let err = BuildRecipeTransformer::new(&project.config, &store)
            .transform(recipe(&["s3://b/missing.zip"]), "1.0.0", &folders)
            .unwrap_err();

        match err {
            EngineError::ArtifactNotFound { file_name, uri, searched } => {
                assert_eq!(file_name, "missing.zip");
                assert_eq!(uri, "s3://b/missing.zip");
                assert_eq!(searched, folders);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_s3_locators_pass_through() {
        let project = Project::new("recipe.json");
        let store = MemoryObjectStore::new();

        let out = BuildRecipeTransformer::new(&project.config, &store)
            .transform(recipe(&["docker:nginx:latest", "https://example.com/a.zip"]), "1.0.0", &[])
            .unwrap();

        assert_eq!(out.artifact_uris(), ["docker:nginx:latest", "https://example.com/a.zip"]);
        assert_eq!(store.operation_counts().object_exists, 0);
    }

    #[test]
    fn test_recipe_without_manifests() {
        let project = Project::new("recipe.json");
        let store = MemoryObjectStore::new();
        let doc = RecipeDocument::from_plain(json!({"Manifests": "oops"})).unwrap();

        let out = BuildRecipeTransformer::new(&project.config, &store)
            .transform(doc, "1.0.0", &[])
            .unwrap();
        assert_eq!(out.get("manifests"), Some(&Node::from("oops")));
    }

    #[test]
    fn test_run_writes_build_recipe() {
        let mut project = Project::new("recipe.yaml");
        project.put("zip-build", "hello.py", "print('hello')");
        fs::create_dir_all(project.config.artifacts_dir.join("1.0.3")).unwrap();
        fs::write(
            &project.config.recipe_file,
            "ComponentName: com.example.Hello\nManifests:\n  - Artifacts:\n      - URI: s3://b/hello.py\n        Unarchive: NONE\n      - URI: s3://shared/common.zip\n",
        )
        .unwrap();
        project.config.build_folders = vec![project.folder("zip-build")];
        let store = MemoryObjectStore::with_objects(&["s3://shared/common.zip"]);

        let transformer = BuildRecipeTransformer::new(&project.config, &store);
        let outcome = transformer.run(&project.config.build_folders).unwrap();

        assert_eq!(outcome.version, "1.0.4");
        assert_eq!(outcome.recipe_path, project.dir.path().join("compack-build/recipes/recipe.yaml"));
        assert_eq!(outcome.copied().count(), 1);
        assert_eq!(outcome.remote().count(), 1);
        assert!(outcome.staged_dir.join("hello.py").is_file());

        let written = RecipeDocument::read(&outcome.recipe_path).unwrap();
        assert_eq!(written.component_version(), Some("1.0.4"));
        assert_eq!(
            written.artifact_uris(),
            [
                "s3://BUCKET_NAME/COMPONENT_NAME/COMPONENT_VERSION/hello.py",
                "s3://shared/common.zip"
            ]
        );
    }

    #[test]
    fn test_run_writes_nothing_on_failure() {
        let project = Project::new("recipe.json");
        fs::write(
            &project.config.recipe_file,
            r#"{"Manifests": [{"Artifacts": [{"Uri": "s3://b/missing.py"}]}]}"#,
        )
        .unwrap();
        let store = MemoryObjectStore::new();

        let transformer = BuildRecipeTransformer::new(&project.config, &store);
        assert!(transformer.run(&[]).is_err());
        assert!(!project.config.build_recipe_file().exists());
    }

    #[test]
    fn test_unaddressable_locator_is_artifact_not_found() {
        let project = Project::new("recipe.json");
        let folder = project.folder("zip-build");
        let store = DirectoryObjectStore::new(project.dir.path().join("registry")).unwrap();

        for uri in ["s3://bucket/dir//hello.py", "s3://bucket/dir/", "s3://bucket"] {
            let err = BuildRecipeTransformer::new(&project.config, &store)
                .transform(recipe(&[uri]), "1.0.0", std::slice::from_ref(&folder))
                .unwrap_err();

            match err {
                EngineError::ArtifactNotFound {
                    uri: reported,
                    searched,
                    ..
                } => {
                    assert_eq!(reported, uri);
                    assert_eq!(searched, vec![folder.clone()]);
                }
                other => panic!("unexpected error for {}: {:?}", uri, other),
            }
        }
    }
}
