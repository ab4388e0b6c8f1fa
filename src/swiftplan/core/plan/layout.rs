//! On-disk layout of one build destination, rooted at
//! `<data_path>/<configuration>/`. Every derived path the plan hands out
//! comes from here so the policy lives in one place.

use std::path::{Path, PathBuf};
use swiftplan_platform::{Configuration, Triple};

use crate::core::product::{LibraryLinkage, ProductKind, ResolvedProduct};

#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(data_path: &Path, configuration: Configuration) -> Layout {
        Layout {
            root: data_path.join(configuration.dirname()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-module working directory: objects, synthesized module map,
    /// diagnostics, output file map, derived sources.
    pub fn module_build_dir(&self, module_name: &str) -> PathBuf {
        self.root.join(format!("{module_name}.build"))
    }

    pub fn derived_sources_dir(&self, module_name: &str) -> PathBuf {
        self.module_build_dir(module_name).join("DerivedSources")
    }

    /// Directory holding the public `.swiftmodule` outputs.
    pub fn modules_dir(&self) -> PathBuf {
        self.root.join("Modules")
    }

    pub fn swiftmodule(&self, module_name: &str) -> PathBuf {
        self.modules_dir().join(format!("{module_name}.swiftmodule"))
    }

    pub fn swiftinterface(&self, module_name: &str) -> PathBuf {
        self.modules_dir()
            .join(format!("{module_name}.swiftinterface"))
    }

    pub fn objc_header(&self, module_name: &str) -> PathBuf {
        self.module_build_dir(module_name)
            .join(format!("{module_name}-Swift.h"))
    }

    pub fn output_file_map(&self, module_name: &str) -> PathBuf {
        self.module_build_dir(module_name).join("output-file-map.json")
    }

    pub fn synthesized_module_map(&self, module_name: &str) -> PathBuf {
        self.module_build_dir(module_name).join("module.modulemap")
    }

    /// Shared compiler module cache.
    pub fn module_cache(&self) -> PathBuf {
        self.root.join("ModuleCache")
    }

    pub fn index_store(&self) -> PathBuf {
        self.root.join("index").join("store")
    }

    pub fn product_dir(&self, product_name: &str) -> PathBuf {
        self.root.join(format!("{product_name}.product"))
    }

    pub fn link_file_list(&self, product_name: &str) -> PathBuf {
        self.product_dir(product_name).join("Objects.LinkFileList")
    }

    /// Final binary location, with the platform-appropriate name.
    pub fn binary_path(&self, product: &ResolvedProduct, triple: &Triple) -> PathBuf {
        let name = product.name();
        let file = match product.kind() {
            ProductKind::Library(LibraryLinkage::Dynamic) => format!(
                "{}{}.{}",
                triple.dynamic_library_prefix(),
                name,
                triple.dynamic_library_extension()
            ),
            ProductKind::Library(_) => format!(
                "{}{}.{}",
                triple.static_library_prefix(),
                name,
                triple.static_library_extension()
            ),
            ProductKind::Test if triple.is_darwin() => format!("{name}.xctest"),
            _ => match triple.executable_extension() {
                "" => name.to_string(),
                ext => format!("{name}.{ext}"),
            },
        };
        self.root.join(file)
    }
}
