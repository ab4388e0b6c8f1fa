use indexmap::IndexMap;
use itertools::Itertools;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::core::module::ModuleKind;
use crate::core::plan::closure::ClosureKind;
use crate::core::plan::module_description::{binary, ModuleBuildDescription};
use crate::core::plan::{Destination, PlanContext};
use crate::core::product::{LibraryLinkage, LinkerSetting, ProductKind, ResolvedProduct};
use crate::util::errors::PlanResult;
use crate::util::Invocation;

/// Build description of one product for one destination: the link (or
/// archive) command, its inputs, and the binary it produces.
#[derive(Debug)]
pub struct ProductBuildDescription {
    product: Arc<ResolvedProduct>,
    destination: Destination,
    program: PathBuf,
    link_arguments: Vec<String>,
    objects: Vec<PathBuf>,
    dylib_dependencies: Vec<String>,
    binary_path: PathBuf,
    link_file_list_path: PathBuf,
}

impl ProductBuildDescription {
    pub(crate) fn new(
        cx: &PlanContext<'_>,
        product: Arc<ResolvedProduct>,
        destination: Destination,
        descriptions: &IndexMap<(String, Destination), ModuleBuildDescription>,
    ) -> PlanResult<ProductBuildDescription> {
        debug!("describing product {} ({:?})", product.name(), destination);
        let params = cx.parameters(destination);
        let layout = cx.layout(destination);
        let triple = &params.triple;
        let package = cx
            .graph
            .package(product.package())
            .ok_or_else(|| anyhow::format_err!("unknown package '{}'", product.package()))?;
        let environment = params.build_environment();
        let resolver = cx.resolver();

        // Objects come from the static closure; dynamic libraries from
        // the full closure (a dylib behind another dylib is still loaded
        // at run time, so it is named on the link line).
        let link_closure = resolver.product_closure(&product, destination, ClosureKind::Link)?;
        let full_closure = resolver.product_closure(&product, destination, ClosureKind::Compile)?;
        let dylibs = full_closure.dynamic_library_products(&product);

        let description_of = |name: &str, dest: Destination| {
            descriptions.get(&(name.to_string(), dest))
        };

        let mut objects: Vec<PathBuf> = Vec::new();
        let mut swiftmodules: Vec<PathBuf> = Vec::new();
        let mut has_cxx_objects = false;
        let mut embedded = false;
        for (module, module_destination) in &link_closure.modules {
            if *module_destination != destination {
                continue;
            }
            let Some(description) = description_of(module.name(), *module_destination) else {
                continue;
            };
            objects.extend(description.objects());
            match description {
                ModuleBuildDescription::Swift(swift) => {
                    swiftmodules.push(swift.swiftmodule_path().clone());
                    embedded |= swift.uses_embedded();
                }
                ModuleBuildDescription::Clang(clang) => {
                    has_cxx_objects |= clang.is_cxx();
                }
                _ => {}
            }
        }

        let binary_path = layout.binary_path(&product, triple);
        let link_file_list_path = layout.link_file_list(product.name());

        // On Windows the non-member modules are relayed as archives; the
        // link-file list carries only the product's own objects then.
        let member_names: Vec<&str> = product.modules().iter().map(|s| s.as_str()).collect();
        let (listed_objects, archives): (Vec<PathBuf>, Vec<PathBuf>) = if triple.is_windows() {
            let mut listed = Vec::new();
            let mut archives = Vec::new();
            for (module, module_destination) in &link_closure.modules {
                if *module_destination != destination || !module.is_compiled() {
                    continue;
                }
                if member_names.contains(&module.name()) {
                    if let Some(description) = description_of(module.name(), *module_destination) {
                        listed.extend(description.objects());
                    }
                } else {
                    archives.push(
                        layout
                            .module_build_dir(module.name())
                            .join(format!("{}.lib", module.name())),
                    );
                }
            }
            (listed, archives)
        } else {
            (objects.clone(), Vec::new())
        };

        let list_contents = listed_objects
            .iter()
            .map(|o| o.display().to_string())
            .join("\n")
            + "\n";
        cx.fs.write(&link_file_list_path, &list_contents)?;

        let dylib_dependencies: Vec<String> =
            dylibs.iter().map(|(p, _)| p.name().to_string()).collect();

        // Static libraries go through the librarian, everything else
        // through the compiler driver.
        if matches!(
            product.kind(),
            ProductKind::Library(LibraryLinkage::Static) | ProductKind::Library(LibraryLinkage::Automatic)
        ) {
            let mut args: Vec<String> = Vec::new();
            if triple.is_windows() {
                args.push("/LIB".to_string());
                args.push(format!("/OUT:{}", binary_path.display()));
            } else if triple.is_darwin() {
                args.push("-static".to_string());
                args.push("-o".to_string());
                args.push(binary_path.display().to_string());
            } else {
                args.push("crs".to_string());
                args.push(binary_path.display().to_string());
            }
            args.push(format!("@{}", link_file_list_path.display()));
            return Ok(ProductBuildDescription {
                product,
                destination,
                program: cx.toolchain.librarian().to_path_buf(),
                link_arguments: args,
                objects,
                dylib_dependencies,
                binary_path,
                link_file_list_path,
            });
        }

        let mut args: Vec<String> = Vec::new();
        args.push("-L".to_string());
        args.push(layout.root().display().to_string());
        args.push("-o".to_string());
        args.push(binary_path.display().to_string());
        args.push("-module-name".to_string());
        args.push(product.c99_name());

        for dylib in &dylib_dependencies {
            args.push(format!("-l{dylib}"));
        }

        let is_test_bundle = product.kind() == ProductKind::Test && triple.is_darwin();
        match product.kind() {
            ProductKind::Executable | ProductKind::Macro => {
                args.push("-emit-executable".to_string())
            }
            ProductKind::Library(LibraryLinkage::Dynamic) | ProductKind::ReplStub => {
                args.push("-emit-library".to_string());
                if triple.is_darwin() {
                    args.push("-Xlinker".to_string());
                    args.push("-install_name".to_string());
                    args.push("-Xlinker".to_string());
                    args.push(format!(
                        "@rpath/{}{}.{}",
                        triple.dynamic_library_prefix(),
                        product.name(),
                        triple.dynamic_library_extension()
                    ));
                }
            }
            ProductKind::Test if triple.is_darwin() => {
                args.push("-Xlinker".to_string());
                args.push("-bundle".to_string());
            }
            ProductKind::Test => args.push("-emit-executable".to_string()),
            // Static and automatic libraries returned through the
            // librarian path above.
            ProductKind::Library(_) => unreachable!(),
            ProductKind::Plugin => {
                anyhow::bail!("plugin product '{}' has no link step", product.name())
            }
        }

        if triple.is_darwin() {
            if !params.linking.disable_local_rpath {
                let rpath = if is_test_bundle {
                    "@loader_path/../../../"
                } else {
                    "@loader_path"
                };
                args.push("-Xlinker".to_string());
                args.push("-rpath".to_string());
                args.push("-Xlinker".to_string());
                args.push(rpath.to_string());
            }
            if !params.linking.link_static_swift_stdlib {
                if let Some(stdlib) = cx.toolchain.macos_swift_stdlib_rpath() {
                    args.push("-Xlinker".to_string());
                    args.push("-rpath".to_string());
                    args.push("-Xlinker".to_string());
                    args.push(stdlib.display().to_string());
                }
            }
        } else if (triple.is_linux() || triple.is_freebsd())
            && !params.linking.disable_local_rpath
        {
            args.push("-Xlinker".to_string());
            args.push("-rpath=$ORIGIN".to_string());
        }

        if !params.is_debug() && params.linking.dead_strip && params.sanitizers.is_empty() {
            if triple.is_darwin() {
                args.push("-Xlinker".to_string());
                args.push("-dead_strip".to_string());
            } else if triple.is_windows() {
                args.push("-Xlinker".to_string());
                args.push("/OPT:REF".to_string());
            } else {
                args.push("-Xlinker".to_string());
                args.push("--gc-sections".to_string());
            }
        }

        args.push(format!("@{}", link_file_list_path.display()));
        for archive in &archives {
            args.push(archive.display().to_string());
        }

        args.push("-target".to_string());
        args.push(cx.qualified_triple(destination, package).to_string());

        // Manifest linker settings and the contributions of binary and
        // system modules, in closure order.
        for (module, module_destination) in &link_closure.modules {
            if *module_destination != destination {
                continue;
            }
            for setting in &module.settings().linker {
                let active = setting
                    .condition
                    .as_ref()
                    .map_or(true, |c| c.satisfied_by(&environment));
                if !active {
                    continue;
                }
                match &setting.value {
                    LinkerSetting::LinkedLibrary(library) => args.push(format!("-l{library}")),
                    LinkerSetting::LinkedFramework(framework) => {
                        if triple.is_darwin() {
                            args.push("-framework".to_string());
                            args.push(framework.clone());
                        }
                    }
                    LinkerSetting::UnsafeFlags(flags) => args.extend(flags.iter().cloned()),
                }
            }
            match module.kind() {
                ModuleKind::BinaryArtifact { path } => {
                    let selected = binary::select_variant(cx, module, path, destination)?;
                    args.extend(selected.linker_arguments());
                }
                ModuleKind::SystemLibrary { .. } => {
                    if let Some(ModuleBuildDescription::System(system)) =
                        description_of(module.name(), *module_destination)
                    {
                        args.extend(system.linker_arguments());
                    }
                }
                _ => {}
            }
        }

        if let Some(lto) = params.linking.lto {
            args.push(lto.swift_flag().to_string());
        }
        for sanitizer in &params.sanitizers {
            args.push(format!("-sanitize={}", sanitizer.name()));
        }
        if params.linking.link_static_swift_stdlib {
            args.push("-static-stdlib".to_string());
        }

        args.push("-g".to_string());
        if triple.is_windows() {
            args.push("-use-ld=lld".to_string());
            args.push("-Xlinker".to_string());
            args.push("-debug:dwarf".to_string());
        }

        if has_cxx_objects && !triple.is_windows() {
            if triple.is_darwin() || triple.is_freebsd() {
                args.push("-lc++".to_string());
            } else {
                args.push("-lstdc++".to_string());
            }
        }

        // Debugger symbol navigation into Swift modules.
        if triple.is_darwin() {
            for swiftmodule in &swiftmodules {
                args.push("-Xlinker".to_string());
                args.push("-add_ast_path".to_string());
                args.push("-Xlinker".to_string());
                args.push(swiftmodule.display().to_string());
            }
        }

        if embedded {
            args.push("-enable-experimental-feature".to_string());
            args.push("Embedded".to_string());
        }

        args.extend(params.flags.linker.iter().cloned());

        Ok(ProductBuildDescription {
            product,
            destination,
            program: cx.toolchain.swift_compiler().to_path_buf(),
            link_arguments: args,
            objects,
            dylib_dependencies,
            binary_path,
            link_file_list_path,
        })
    }

    pub fn product(&self) -> &Arc<ResolvedProduct> {
        &self.product
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn link_arguments(&self) -> &[String] {
        &self.link_arguments
    }

    /// Objects linked into this product: the static closure's outputs.
    pub fn objects(&self) -> &[PathBuf] {
        &self.objects
    }

    pub fn dylib_dependencies(&self) -> &[String] {
        &self.dylib_dependencies
    }

    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    pub fn link_file_list_path(&self) -> &PathBuf {
        &self.link_file_list_path
    }

    pub fn invocation(&self) -> Invocation {
        let mut invocation = Invocation::new(&self.program);
        invocation.args(self.link_arguments.iter().cloned());
        invocation
    }
}
