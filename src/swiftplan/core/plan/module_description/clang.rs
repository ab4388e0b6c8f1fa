use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::core::module::{ClangSetting, ModuleKind, ModuleMapType, ResolvedModule};
use crate::core::plan::closure::ClosureKind;
use crate::core::plan::module_description::{binary, dependency_module_map, object_paths};
use crate::core::plan::{Destination, PlanContext};
use crate::util::errors::PlanResult;
use crate::util::Invocation;

const COMPILABLE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "m", "mm", "s", "S"];

/// Build description of one C-family module for one destination. One
/// invocation per source file shares the common argument list.
#[derive(Debug)]
pub struct ClangModuleBuildDescription {
    module: Arc<ResolvedModule>,
    destination: Destination,
    program: PathBuf,
    common_arguments: Vec<String>,
    compiled_sources: Vec<PathBuf>,
    objects: Vec<PathBuf>,
    module_map_path: Option<PathBuf>,
    derived_sources: Vec<PathBuf>,
    is_cxx: bool,
}

impl ClangModuleBuildDescription {
    pub(crate) fn new(
        cx: &PlanContext<'_>,
        module: Arc<ResolvedModule>,
        destination: Destination,
    ) -> PlanResult<ClangModuleBuildDescription> {
        debug!("describing clang module {} ({:?})", module.name(), destination);
        let params = cx.parameters(destination);
        let layout = cx.layout(destination);
        let package = cx.graph.package_of_module(&module)?;
        let environment = params.build_environment();
        let triple = &params.triple;
        let build_dir = layout.module_build_dir(module.name());
        let is_cxx = module.has_cxx_sources();
        let closure = cx
            .resolver()
            .module_closure(&module, destination, ClosureKind::Compile)?;

        let mut args: Vec<String> = Vec::new();
        args.push("-target".to_string());
        args.push(cx.qualified_triple(destination, package).to_string());
        if params.is_debug() {
            args.push("-O0".to_string());
        } else {
            args.push("-Os".to_string());
        }
        args.push("-DSWIFT_PACKAGE=1".to_string());
        if params.is_debug() {
            args.push("-DDEBUG=1".to_string());
        }
        args.push("-fblocks".to_string());

        if triple.is_darwin() {
            args.push("-fobjc-arc".to_string());
            args.push("-fmodules".to_string());
            args.push(format!("-fmodule-name={}", module.c99_name()));
            args.push(format!(
                "-fmodules-cache-path={}",
                layout.module_cache().display()
            ));
        }

        if let Some(headers) = module.public_headers_dir() {
            args.push("-I".to_string());
            args.push(headers.display().to_string());
        }

        for (dep, dep_destination) in &closure.modules {
            if *dep_destination != destination {
                continue;
            }
            match dep.kind() {
                ModuleKind::ClangLibrary => {
                    if let Some(headers) = dep.public_headers_dir() {
                        args.push("-I".to_string());
                        args.push(headers.display().to_string());
                    }
                    if let Some(map) = dependency_module_map(dep, layout) {
                        args.push(format!("-fmodule-map-file={}", map.display()));
                    }
                }
                ModuleKind::SystemLibrary { pkg_config, .. } => {
                    if let Some(map) = dependency_module_map(dep, layout) {
                        args.push(format!("-fmodule-map-file={}", map.display()));
                    }
                    if let Some(paths) = pkg_config {
                        for include in &paths.include_paths {
                            args.push("-I".to_string());
                            args.push(include.display().to_string());
                        }
                    }
                }
                ModuleKind::BinaryArtifact { path } => {
                    let selected = binary::select_variant(cx, dep, path, destination)?;
                    args.push("-I".to_string());
                    args.push(selected.headers_dir().display().to_string());
                }
                _ => {}
            }
        }

        // Declared settings, in manifest order. C++ modules additionally
        // honor the C++ settings table.
        let mut declared: Vec<&crate::core::module::Conditional<ClangSetting>> =
            module.settings().c.iter().collect();
        if is_cxx {
            declared.extend(module.settings().cxx.iter());
        }
        for setting in declared {
            let active = setting
                .condition
                .as_ref()
                .map_or(true, |c| c.satisfied_by(&environment));
            if !active {
                continue;
            }
            match &setting.value {
                ClangSetting::Define(name) => args.push(format!("-D{name}")),
                ClangSetting::HeaderSearchPath(path) => {
                    args.push("-I".to_string());
                    args.push(path.clone());
                }
                ClangSetting::UnsafeFlags(flags) => args.extend(flags.iter().cloned()),
            }
        }

        if triple.is_windows() {
            args.push("-gdwarf".to_string());
        } else {
            args.push("-g".to_string());
        }

        match params.keeps_frame_pointers() {
            Some(true) => args.push("-fno-omit-frame-pointer".to_string()),
            Some(false) => args.push("-fomit-frame-pointer".to_string()),
            None => {}
        }

        for sanitizer in &params.sanitizers {
            args.push(format!("-fsanitize={}", sanitizer.name()));
        }

        let standard = if is_cxx {
            module.cxx_language_standard()
        } else {
            module.c_language_standard()
        };
        if let Some(standard) = standard {
            args.push(format!("-std={standard}"));
        }

        if package.is_remote() {
            args.push("-w".to_string());
        }

        // The Foundation core libraries need the Swift runtime's own
        // headers when built outside Darwin.
        if package.identity().as_str() == "swift-corelibs-foundation" && !triple.is_darwin() {
            if let Some(resources) = cx.toolchain.resources_path() {
                args.push("-I".to_string());
                args.push(resources.display().to_string());
            }
        }

        let module_map_path = synthesize_module_map(cx, &module, layout)?;

        let mut derived_sources = Vec::new();
        if !module.resources().is_empty() {
            let derived_dir = layout.derived_sources_dir(module.name());
            let header = derived_dir.join("resource_bundle_accessor.h");
            let source = derived_dir.join("resource_bundle_accessor.c");
            cx.fs.write(
                &header,
                &resource_accessor_header(&module.c99_name()),
            )?;
            cx.fs.write(
                &source,
                &resource_accessor_source(
                    package.identity().as_str(),
                    module.name(),
                    &module.c99_name(),
                ),
            )?;
            args.push("-I".to_string());
            args.push(derived_dir.display().to_string());
            derived_sources.push(source);
        }

        args.extend(params.flags.cc.iter().cloned());
        if is_cxx {
            args.extend(params.flags.cxx.iter().cloned());
        }

        let mut compiled_sources: Vec<PathBuf> = module
            .sources()
            .iter()
            .filter(|s| {
                matches!(
                    s.extension().and_then(|e| e.to_str()),
                    Some(ext) if COMPILABLE_EXTENSIONS.contains(&ext)
                )
            })
            .cloned()
            .collect();
        compiled_sources.extend(derived_sources.iter().cloned());
        let objects = object_paths(&compiled_sources, &build_dir, "o")?;

        Ok(ClangModuleBuildDescription {
            module,
            destination,
            program: cx.toolchain.clang_compiler().to_path_buf(),
            common_arguments: args,
            compiled_sources,
            objects,
            module_map_path,
            derived_sources,
            is_cxx,
        })
    }

    pub fn module(&self) -> &Arc<ResolvedModule> {
        &self.module
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Arguments shared by every per-source invocation.
    pub fn common_arguments(&self) -> &[String] {
        &self.common_arguments
    }

    pub fn objects(&self) -> &[PathBuf] {
        &self.objects
    }

    pub fn module_map_path(&self) -> Option<&Path> {
        self.module_map_path.as_deref()
    }

    pub fn derived_sources(&self) -> &[PathBuf] {
        &self.derived_sources
    }

    pub fn is_cxx(&self) -> bool {
        self.is_cxx
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.compiled_sources
            .iter()
            .zip(&self.objects)
            .map(|(source, object)| {
                let mut invocation = Invocation::new(&self.program);
                invocation.args(self.common_arguments.iter().cloned());
                invocation.arg("-c");
                invocation.arg(source.display().to_string());
                invocation.arg("-o");
                invocation.arg(object.display().to_string());
                invocation
            })
            .collect()
    }
}

/// Write the module map for a module that needs one synthesized, and
/// return the map path dependents should import, if any.
fn synthesize_module_map(
    cx: &PlanContext<'_>,
    module: &ResolvedModule,
    layout: &crate::core::plan::layout::Layout,
) -> PlanResult<Option<PathBuf>> {
    let (umbrella_header, umbrella_dir) = match module.module_map() {
        ModuleMapType::Custom(path) => return Ok(Some(path.clone())),
        ModuleMapType::UmbrellaHeader(path) => (Some(path.clone()), None),
        ModuleMapType::UmbrellaDirectory(path) => (None, Some(path.clone())),
        ModuleMapType::None => match module.public_headers_dir() {
            // No map declared: build one over the public headers,
            // preferring a header named after the module.
            Some(headers) => {
                let candidate = headers.join(format!("{}.h", module.name()));
                if cx.fs.exists(&candidate) {
                    (Some(candidate), None)
                } else {
                    (None, Some(headers.to_path_buf()))
                }
            }
            None => return Ok(None),
        },
    };
    let body = match (&umbrella_header, &umbrella_dir) {
        (Some(header), _) => format!("    umbrella header \"{}\"\n", header.display()),
        (_, Some(dir)) => format!("    umbrella \"{}\"\n", dir.display()),
        _ => unreachable!(),
    };
    let contents = format!(
        "module {} {{\n{}    export *\n}}\n",
        module.c99_name(),
        body
    );
    let path = layout.synthesized_module_map(module.name());
    cx.fs.write(&path, &contents)?;
    Ok(Some(path))
}

fn resource_accessor_header(c99_name: &str) -> String {
    format!(
        "#ifndef {0}_SWIFTPM_MODULE_BUNDLE_H\n\
         #define {0}_SWIFTPM_MODULE_BUNDLE_H\n\
         \n\
         const char *{0}_SWIFTPM_MODULE_BUNDLE(void);\n\
         \n\
         #endif\n",
        c99_name
    )
}

fn resource_accessor_source(package: &str, module: &str, c99_name: &str) -> String {
    format!(
        "#include \"resource_bundle_accessor.h\"\n\
         \n\
         const char *{c99_name}_SWIFTPM_MODULE_BUNDLE(void) {{\n\
         \x20   return \"{package}_{module}.bundle\";\n\
         }}\n"
    )
}
