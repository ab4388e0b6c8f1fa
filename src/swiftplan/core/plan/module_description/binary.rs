//! Pre-built artifact handling: pick the variant matching the triple
//! from the artifact's info manifest and expose its headers, libraries,
//! and bundled tools.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::module::ResolvedModule;
use crate::core::plan::{Destination, PlanContext};
use crate::util::errors::{PlanError, PlanResult};

/// The typed shape of an artifact's info manifest.
#[derive(Debug, Deserialize)]
struct ArtifactManifest {
    variants: Vec<ManifestVariant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestVariant {
    path: String,
    /// Platform name the variant supports; absent means any.
    platform: Option<String>,
    /// Architectures the variant supports; empty means any.
    #[serde(default)]
    archs: Vec<String>,
    headers_path: Option<String>,
}

/// What kind of payload a selected variant is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArtifactKind {
    Framework,
    StaticLibrary,
    Executable,
}

/// A variant resolved against one triple.
#[derive(Clone, Debug)]
pub struct SelectedArtifact {
    path: PathBuf,
    headers_dir: PathBuf,
    kind: ArtifactKind,
}

impl SelectedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers_dir(&self) -> &Path {
        &self.headers_dir
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// The payload name: framework name, library name (without prefix or
    /// extension), or tool name.
    pub fn name(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        match self.kind {
            ArtifactKind::StaticLibrary => {
                stem.strip_prefix("lib").unwrap_or(stem).to_string()
            }
            _ => stem.to_string(),
        }
    }

    /// Flags a product link gains from this artifact.
    pub fn linker_arguments(&self) -> Vec<String> {
        let search_dir = self
            .path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match self.kind {
            ArtifactKind::Framework => vec![
                "-L".to_string(),
                search_dir.clone(),
                "-F".to_string(),
                search_dir,
                "-framework".to_string(),
                self.name(),
            ],
            ArtifactKind::StaticLibrary => vec![
                "-L".to_string(),
                search_dir,
                format!("-l{}", self.name()),
            ],
            ArtifactKind::Executable => Vec::new(),
        }
    }
}

/// Parse the artifact's info manifest and pick the variant matching the
/// destination triple.
pub(crate) fn select_variant(
    cx: &PlanContext<'_>,
    module: &ResolvedModule,
    artifact_path: &Path,
    destination: Destination,
) -> PlanResult<SelectedArtifact> {
    let triple = &cx.parameters(destination).triple;
    let manifest_path = artifact_path.join("info.json");
    let raw = cx
        .fs
        .read_to_string(&manifest_path)
        .with_context(|| format!("failed to read artifact manifest for '{}'", module.name()))?;
    let manifest: ArtifactManifest = serde_json::from_str(&raw)
        .with_context(|| format!("malformed artifact manifest for '{}'", module.name()))?;

    let platform_name = triple.platform().map(|p| p.name().to_string());
    let variant = manifest
        .variants
        .iter()
        .find(|v| {
            let platform_ok = match (&v.platform, &platform_name) {
                (None, _) => true,
                (Some(declared), Some(current)) => declared == current,
                (Some(_), None) => false,
            };
            let arch_ok = v.archs.is_empty() || v.archs.iter().any(|a| a == triple.arch_name());
            platform_ok && arch_ok
        })
        .ok_or_else(|| PlanError::UnknownBinaryArtifactVariant {
            artifact: module.name().to_string(),
            triple: triple.to_string(),
        })?;

    let path = artifact_path.join(&variant.path);
    let kind = match path.extension().and_then(|e| e.to_str()) {
        Some("framework") => ArtifactKind::Framework,
        Some("a") | Some("lib") => ArtifactKind::StaticLibrary,
        _ => ArtifactKind::Executable,
    };
    let headers_dir = match &variant.headers_path {
        Some(headers) => artifact_path.join(headers),
        None => path.join("Headers"),
    };
    Ok(SelectedArtifact {
        path,
        headers_dir,
        kind,
    })
}

/// Build description of a binary-artifact module: nothing compiles, the
/// selected variant's paths flow into dependents.
#[derive(Debug)]
pub struct BinaryModuleBuildDescription {
    module: Arc<ResolvedModule>,
    destination: Destination,
    selected: SelectedArtifact,
}

impl BinaryModuleBuildDescription {
    pub(crate) fn new(
        cx: &PlanContext<'_>,
        module: Arc<ResolvedModule>,
        destination: Destination,
        artifact_path: &Path,
    ) -> PlanResult<BinaryModuleBuildDescription> {
        let selected = select_variant(cx, &module, artifact_path, destination)?;
        Ok(BinaryModuleBuildDescription {
            module,
            destination,
            selected,
        })
    }

    pub fn module(&self) -> &Arc<ResolvedModule> {
        &self.module
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn selected(&self) -> &SelectedArtifact {
        &self.selected
    }

    /// Executables bundled in the artifact, available as named tools to
    /// build commands.
    pub fn tools(&self) -> Vec<(String, PathBuf)> {
        match self.selected.kind() {
            ArtifactKind::Executable => {
                vec![(self.selected.name(), self.selected.path().to_path_buf())]
            }
            _ => Vec::new(),
        }
    }
}
