//! Named resource groups.
//!
//! A package is a TOML manifest under `packages/<name>.package` listing
//! bundle paths. Loading a package requests every listed resource;
//! flushing blocks until the whole group is settled.

use log::info;
use serde::Deserialize;

use coronet_fs::BundleFs;

use crate::error::{ResourceError, ResourceResult};
use crate::id::ResourceId;
use crate::manager::ResourceManager;

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    resources: Vec<String>,
}

pub struct ResourcePackage {
    name: String,
    paths: Vec<String>,
    ids: Vec<ResourceId>,
}

impl ResourcePackage {
    /// Reads and parses the manifest for `name`.
    pub fn open(fs: &dyn BundleFs, name: &str) -> ResourceResult<Self> {
        let manifest_path = format!("packages/{}.package", name);
        let bytes = fs.read(&manifest_path)?;

        let text = std::str::from_utf8(&bytes).map_err(|_| ResourceError::Manifest {
            package: name.to_string(),
            reason: "manifest is not utf-8".to_string(),
        })?;
        let manifest: PackageManifest =
            toml::from_str(text).map_err(|e| ResourceError::Manifest {
                package: name.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            target: "resource",
            "package.open name='{}' resources={}",
            name,
            manifest.resources.len()
        );

        Ok(Self {
            name: name.to_string(),
            paths: manifest.resources,
            ids: Vec::new(),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn resource_count(&self) -> usize {
        self.paths.len()
    }

    /// Requests every listed resource. Loading twice is a logged no-op.
    pub fn load(&mut self, rm: &ResourceManager) -> ResourceResult<()> {
        if !self.ids.is_empty() {
            info!(target: "resource", "package.load name='{}' already loaded", self.name);
            return Ok(());
        }

        for path in &self.paths {
            let id = rm.load(path)?;
            self.ids.push(id);
        }

        info!(target: "resource", "package.load name='{}' requested={}", self.name, self.ids.len());
        Ok(())
    }

    /// Blocks until every request in the manager has settled.
    pub fn flush(&self, rm: &ResourceManager) {
        rm.flush();
    }

    /// Whether every listed resource is loaded.
    pub fn has_loaded(&self, rm: &ResourceManager) -> bool {
        !self.ids.is_empty() && self.ids.iter().all(|&id| rm.has(id))
    }

    /// Releases one reference on every listed resource.
    pub fn unload(&mut self, rm: &ResourceManager) {
        for id in self.ids.drain(..) {
            rm.unload(id);
        }
        info!(target: "resource", "package.unload name='{}'", self.name);
    }
}
