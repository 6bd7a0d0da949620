//! Publish stage: point the build recipe at its final storage location
//!
//! Unlike the build stage, an artifact that cannot be matched in the staged
//! directory is not fatal. It is logged and its locator is left as it was.

use compack_core::{artifact_file_name, is_s3_uri, keys, ProjectConfig, RecipeDocument, S3Uri};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{EngineError, Result};

/// An `s3://` artifact whose file was not matched exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedArtifact {
    pub file_name: String,
    pub uri: String,
    /// Number of files with this name in the staged directory
    pub matches: usize,
}

/// A staged file and the object it is uploaded to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpload {
    pub source: PathBuf,
    pub uri: S3Uri,
}

/// Result of a complete publish run
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub version: String,
    pub recipe_path: PathBuf,
    pub staged_dir: PathBuf,
    pub unresolved: Vec<UnresolvedArtifact>,
    /// Every staged file, sorted by path
    pub uploads: Vec<StagedUpload>,
    pub document: RecipeDocument,
}

/// Produces the publish recipe from a build recipe
pub struct PublishRecipeTransformer<'a> {
    config: &'a ProjectConfig,
}

impl<'a> PublishRecipeTransformer<'a> {
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self { config }
    }

    /// Rewrite staged artifacts to their published locators for `version`
    pub fn transform(&self, document: RecipeDocument, version: &str) -> Result<RecipeDocument> {
        self.transform_with_report(document, version)
            .map(|(document, _, _)| document)
    }

    fn transform_with_report(
        &self,
        mut document: RecipeDocument,
        version: &str,
    ) -> Result<(RecipeDocument, PathBuf, Vec<UnresolvedArtifact>)> {
        let staged_dir = self.staged_dir(&document)?;
        document.insert(keys::COMPONENT_VERSION, version);

        let staged = staged_files(&staged_dir);
        let mut unresolved = Vec::new();
        document.visit_artifacts_mut(|mut slot| -> Result<()> {
            let Some(uri) = slot.uri().filter(|u| is_s3_uri(u)).map(str::to_string) else {
                return Ok(());
            };
            let file_name = artifact_file_name(&uri).to_string();

            let matches = count_named(&staged, &file_name);
            if matches == 1 {
                let published = S3Uri::for_artifact(
                    &self.config.bucket,
                    &self.config.component_name,
                    version,
                    &file_name,
                );
                slot.set_uri(published.to_string());
                return Ok(());
            }

            tracing::warn!(
                artifact = %file_name,
                uri = %uri,
                matches,
                dir = %staged_dir.display(),
                "expected exactly one staged file for artifact, leaving locator unchanged"
            );
            unresolved.push(UnresolvedArtifact {
                file_name,
                uri,
                matches,
            });
            Ok(())
        })?;

        Ok((document, staged_dir, unresolved))
    }

    /// Staged directory of the version the build stage stamped
    fn staged_dir(&self, document: &RecipeDocument) -> Result<PathBuf> {
        let expected = &self.config.component_name;

        match document.component_name() {
            Some(name) if name == expected => {}
            Some(name) => {
                return Err(EngineError::ComponentNotBuilt {
                    expected: expected.clone(),
                    found: format!("names '{}'", name),
                });
            }
            None => {
                return Err(EngineError::ComponentNotBuilt {
                    expected: expected.clone(),
                    found: "has no ComponentName".to_string(),
                });
            }
        }

        let built_version = document
            .component_version()
            .ok_or_else(|| EngineError::ComponentNotBuilt {
                expected: expected.clone(),
                found: "has no ComponentVersion".to_string(),
            })?;

        Ok(self.config.artifacts_dir_for(built_version))
    }

    /// Destination of every file under the staged directory
    ///
    /// A file whose name is unique in the tree goes to
    /// `s3://<bucket>/<name>/<version>/<file>`, the locator a matching artifact
    /// is rewritten to. Files sharing a name keep their relative path so none
    /// overwrites another.
    pub fn uploads(&self, staged_dir: &Path, version: &str) -> Vec<StagedUpload> {
        let staged = staged_files(staged_dir);
        staged
            .iter()
            .filter_map(|source| {
                let file_name = source.file_name()?.to_str()?;
                let uri = if count_named(&staged, file_name) == 1 {
                    S3Uri::for_artifact(
                        &self.config.bucket,
                        &self.config.component_name,
                        version,
                        file_name,
                    )
                } else {
                    let relative = source.strip_prefix(staged_dir).ok()?;
                    let relative: Vec<_> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect();
                    S3Uri::for_artifact(
                        &self.config.bucket,
                        &self.config.component_name,
                        version,
                        &relative.join("/"),
                    )
                };
                Some(StagedUpload {
                    source: source.clone(),
                    uri,
                })
            })
            .collect()
    }

    /// Transform the build recipe and write the publish recipe
    pub fn run(&self, version: &str) -> Result<PublishOutcome> {
        let build_recipe = self.config.build_recipe_file();
        if !build_recipe.is_file() {
            return Err(EngineError::ComponentNotBuilt {
                expected: self.config.component_name.clone(),
                found: format!("was not found at {}", build_recipe.display()),
            });
        }

        let document = RecipeDocument::read(&build_recipe)?;
        let (document, staged_dir, unresolved) = self.transform_with_report(document, version)?;

        let recipe_path = self.config.publish_recipe_file.clone();
        document.write(&recipe_path)?;

        tracing::info!(
            component = %self.config.component_name,
            version,
            path = %recipe_path.display(),
            unresolved = unresolved.len(),
            "wrote publish recipe"
        );

        Ok(PublishOutcome {
            version: version.to_string(),
            recipe_path,
            uploads: self.uploads(&staged_dir, version),
            staged_dir,
            unresolved,
            document,
        })
    }
}

/// Regular files anywhere under `dir`, sorted by path
fn staged_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

fn count_named(files: &[PathBuf], file_name: &str) -> usize {
    files
        .iter()
        .filter(|p| p.file_name() == Some(OsStr::new(file_name)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn project(recipe_file: &str) -> (TempDir, ProjectConfig) {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig::new(dir.path(), "com.example.Hello", recipe_file);
        config.bucket = "my-bucket".to_string();
        config.region = "us-east-1".to_string();
        (dir, config)
    }

    fn stage(config: &ProjectConfig, version: &str, relative: &str) {
        let path = config.artifacts_dir_for(version).join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "content").unwrap();
    }

    fn built_recipe(uris: &[&str]) -> RecipeDocument {
        let artifacts: Vec<_> = uris.iter().map(|u| json!({"Uri": u, "Unarchive": "NONE"})).collect();
        RecipeDocument::from_plain(json!({
            "ComponentName": "com.example.Hello",
            "ComponentVersion": "1.0.0",
            "Manifests": [{"Artifacts": artifacts}]
        }))
        .unwrap()
    }

    #[test]
    fn test_single_match_is_rewritten() {
        let (_dir, config) = project("recipe.json");
        stage(&config, "1.0.0", "hello.py");

        let out = PublishRecipeTransformer::new(&config)
            .transform(
                built_recipe(&["s3://BUCKET_NAME/COMPONENT_NAME/COMPONENT_VERSION/hello.py"]),
                "1.0.1",
            )
            .unwrap();

        assert_eq!(out.component_version(), Some("1.0.1"));
        assert_eq!(
            out.artifact_uris(),
            ["s3://my-bucket/com.example.Hello/1.0.1/hello.py"]
        );
    }

    #[test]
    fn test_nested_staged_file_counts() {
        let (_dir, config) = project("recipe.json");
        stage(&config, "1.0.0", "lib/common.zip");

        let out = PublishRecipeTransformer::new(&config)
            .transform(built_recipe(&["s3://shared/common.zip"]), "2.0.0")
            .unwrap();

        assert_eq!(out.artifact_uris(), ["s3://my-bucket/com.example.Hello/2.0.0/common.zip"]);
    }

    #[test]
    fn test_missing_or_ambiguous_artifacts_are_left_unchanged() {
        let (_dir, config) = project("recipe.json");
        stage(&config, "1.0.0", "a/dup.txt");
        stage(&config, "1.0.0", "b/dup.txt");

        let uris = ["s3://b/dup.txt", "s3://b/absent.txt", "docker:nginx"];
        let (out, _, unresolved) = PublishRecipeTransformer::new(&config)
            .transform_with_report(built_recipe(&uris), "1.0.1")
            .unwrap();

        assert_eq!(out.artifact_uris(), uris);
        assert_eq!(
            unresolved,
            vec![
                UnresolvedArtifact {
                    file_name: "dup.txt".to_string(),
                    uri: "s3://b/dup.txt".to_string(),
                    matches: 2,
                },
                UnresolvedArtifact {
                    file_name: "absent.txt".to_string(),
                    uri: "s3://b/absent.txt".to_string(),
                    matches: 0,
                },
            ]
        );
    }

    #[test]
    fn test_uploads_cover_nested_files() {
        let (_dir, config) = project("recipe.json");
        stage(&config, "1.0.0", "hello.py");
        stage(&config, "1.0.0", "lib/common.zip");
        stage(&config, "1.0.0", "a/dup.txt");
        stage(&config, "1.0.0", "b/dup.txt");
        let staged_dir = config.artifacts_dir_for("1.0.0");

        let uploads: Vec<_> = PublishRecipeTransformer::new(&config)
            .uploads(&staged_dir, "2.0.0")
            .into_iter()
            .map(|u| (u.source, u.uri.to_string()))
            .collect();

        let expected: Vec<_> = [
            ("a/dup.txt", "a/dup.txt"),
            ("b/dup.txt", "b/dup.txt"),
            ("hello.py", "hello.py"),
            ("lib/common.zip", "common.zip"),
        ]
        .iter()
        .map(|(staged, key)| {
            (
                staged_dir.join(staged),
                format!("s3://my-bucket/com.example.Hello/2.0.0/{}", key),
            )
        })
        .collect();
        assert_eq!(uploads, expected);
    }

    #[test]
    fn test_uploads_of_missing_staged_dir_is_empty() {
        let (_dir, config) = project("recipe.json");
        let staged_dir = config.artifacts_dir_for("9.9.9");
        let uploads = PublishRecipeTransformer::new(&config).uploads(&staged_dir, "1.0.0");
        assert!(uploads.is_empty());
    }

    #[test]
    fn test_name_mismatch_is_not_built() {
        let (_dir, config) = project("recipe.json");
        let doc = RecipeDocument::from_plain(json!({"ComponentName": "com.example.Other"})).unwrap();

        let err = PublishRecipeTransformer::new(&config).transform(doc, "1.0.0").unwrap_err();
        assert!(matches!(
            err,
            EngineError::ComponentNotBuilt { ref found, .. } if found == "names 'com.example.Other'"
        ));
    }

    #[test]
    fn test_missing_identity_is_not_built() {
        let (_dir, config) = project("recipe.json");
        let transformer = PublishRecipeTransformer::new(&config);

        let unnamed = RecipeDocument::from_plain(json!({"ComponentVersion": "1.0.0"})).unwrap();
        assert!(matches!(
            transformer.transform(unnamed, "1.0.0").unwrap_err(),
            EngineError::ComponentNotBuilt { .. }
        ));

        let unversioned = RecipeDocument::from_plain(json!({"componentname": "com.example.Hello"})).unwrap();
        let err = transformer.transform(unversioned, "1.0.0").unwrap_err();
        assert!(err.to_string().contains("has no ComponentVersion"));
    }

    #[test]
    fn test_run_requires_build_recipe() {
        let (_dir, config) = project("recipe.yaml");
        let err = PublishRecipeTransformer::new(&config).run("1.0.0").unwrap_err();
        assert!(matches!(err, EngineError::ComponentNotBuilt { .. }));
    }

    #[test]
    fn test_run_writes_publish_recipe() {
        let (dir, config) = project("recipe.yaml");
        stage(&config, "1.0.0", "hello.py");
        built_recipe(&["s3://BUCKET_NAME/COMPONENT_NAME/COMPONENT_VERSION/hello.py"])
            .write(config.build_recipe_file())
            .unwrap();

        let outcome = PublishRecipeTransformer::new(&config).run("1.0.5").unwrap();

        assert_eq!(outcome.recipe_path, dir.path().join("compack-build/publish/recipe.yaml"));
        assert_eq!(outcome.staged_dir, config.artifacts_dir_for("1.0.0"));
        assert!(outcome.unresolved.is_empty());
        assert_eq!(outcome.uploads.len(), 1);
        assert_eq!(
            outcome.uploads[0].uri.to_string(),
            "s3://my-bucket/com.example.Hello/1.0.5/hello.py"
        );

        let written = RecipeDocument::read(&outcome.recipe_path).unwrap();
        assert_eq!(written, outcome.document);
        assert_eq!(
            written.artifact_uris(),
            ["s3://my-bucket/com.example.Hello/1.0.5/hello.py"]
        );
    }
}
