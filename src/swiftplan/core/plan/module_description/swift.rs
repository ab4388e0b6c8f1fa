use anyhow::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::core::module::{
    DefaultIsolation, InteropMode, ModuleKind, ResolvedModule, SwiftSetting,
};
use crate::core::plan::closure::ClosureKind;
use crate::core::plan::module_description::{
    binary, dependency_module_map, enables_embedded, object_paths,
};
use crate::core::plan::{Destination, PlanContext};
use crate::util::errors::PlanResult;
use crate::util::{Diagnostics, Invocation};

/// Build description of one Swift-family module for one destination: the
/// complete compiler command line plus every path it produces.
#[derive(Debug)]
pub struct SwiftModuleBuildDescription {
    module: Arc<ResolvedModule>,
    destination: Destination,
    program: PathBuf,
    /// Everything except file-specific pieces; also what symbol-graph
    /// extraction reuses.
    flags: Vec<String>,
    /// Output and source arguments appended after `flags`.
    file_arguments: Vec<String>,
    objects: Vec<PathBuf>,
    swiftmodule_path: PathBuf,
    interface_path: Option<PathBuf>,
    objc_header_path: Option<PathBuf>,
    diagnostic_files: Vec<PathBuf>,
    modulewrap_object: Option<PathBuf>,
    output_file_map_path: PathBuf,
    derived_sources: Vec<PathBuf>,
    uses_embedded: bool,
}

impl SwiftModuleBuildDescription {
    pub(crate) fn new(
        cx: &PlanContext<'_>,
        module: Arc<ResolvedModule>,
        destination: Destination,
        diagnostics: &mut Diagnostics,
    ) -> PlanResult<SwiftModuleBuildDescription> {
        debug!("describing swift module {} ({:?})", module.name(), destination);
        let params = cx.parameters(destination);
        let layout = cx.layout(destination);
        let package = cx.graph.package_of_module(&module)?;
        let environment = params.build_environment();
        let toolchain = cx.toolchain;
        let build_dir = layout.module_build_dir(module.name());
        let closure = cx
            .resolver()
            .module_closure(&module, destination, ClosureKind::Compile)?;

        let mut args: Vec<String> = Vec::new();
        let arg = |args: &mut Vec<String>, a: &str| args.push(a.to_string());

        // Module identity, output triple, caches, toolchain paths.
        arg(&mut args, "-module-name");
        args.push(module.c99_name());
        if !package.tools_version().supports_package_naming() {
            diagnostics.warn(format!(
                "not namespacing module '{}' by package: requires tools version 5.9 \
                 (package '{}' declares {})",
                module.name(),
                package.identity(),
                package.tools_version()
            ));
        } else if toolchain.supports_flag("-package-name") {
            arg(&mut args, "-package-name");
            args.push(package.identity().as_str().replace('-', "_"));
        }
        arg(&mut args, "-target");
        args.push(cx.qualified_triple(destination, package).to_string());
        arg(&mut args, "-module-cache-path");
        args.push(layout.module_cache().display().to_string());
        if let Some(sdk) = toolchain.sdk_root() {
            arg(&mut args, "-sdk");
            args.push(sdk.display().to_string());
        }
        if let Some(resources) = toolchain.resources_path() {
            arg(&mut args, "-resource-dir");
            args.push(resources.display().to_string());
        }
        arg(&mut args, "-I");
        args.push(layout.modules_dir().display().to_string());

        // Configuration.
        let embedded = enables_embedded(&module, &environment);
        if params.is_debug() {
            for flag in [
                "-Onone",
                "-enable-testing",
                "-g",
                "-serialize-diagnostics",
                "-enable-batch-mode",
                "-DSWIFT_PACKAGE",
                "-DDEBUG",
            ] {
                arg(&mut args, flag);
            }
            if embedded {
                arg(&mut args, "-whole-module-optimization");
            }
        } else {
            arg(&mut args, "-O");
            arg(&mut args, "-DSWIFT_PACKAGE");
            arg(&mut args, "-whole-module-optimization");
            arg(&mut args, "-g");
        }
        args.push(format!("-j{}", params.workers));

        // Imports from the compile closure: module maps and headers of
        // C-family dependencies, resolved system libraries, selected
        // binary artifacts, and macro plugin executables.
        for (dep, dep_destination) in &closure.modules {
            match dep.kind() {
                ModuleKind::SwiftMacro => {
                    // Macros run inside the compiler, from the host build.
                    let executable = cx
                        .host_layout
                        .root()
                        .join(executable_file_name(dep.name(), cx.host_parameters));
                    arg(&mut args, "-Xfrontend");
                    arg(&mut args, "-load-plugin-executable");
                    arg(&mut args, "-Xfrontend");
                    args.push(format!("{}#{}", executable.display(), dep.c99_name()));
                }
                _ if *dep_destination != destination => continue,
                ModuleKind::ClangLibrary => {
                    if let Some(map) = dependency_module_map(dep, layout) {
                        arg(&mut args, "-Xcc");
                        args.push(format!("-fmodule-map-file={}", map.display()));
                    }
                    if let Some(headers) = dep.public_headers_dir() {
                        arg(&mut args, "-Xcc");
                        arg(&mut args, "-I");
                        arg(&mut args, "-Xcc");
                        args.push(headers.display().to_string());
                    }
                }
                ModuleKind::SystemLibrary { pkg_config, .. } => {
                    if let Some(map) = dependency_module_map(dep, layout) {
                        arg(&mut args, "-Xcc");
                        args.push(format!("-fmodule-map-file={}", map.display()));
                    }
                    if let Some(paths) = pkg_config {
                        for include in &paths.include_paths {
                            arg(&mut args, "-Xcc");
                            arg(&mut args, "-I");
                            arg(&mut args, "-Xcc");
                            args.push(include.display().to_string());
                        }
                    }
                }
                ModuleKind::BinaryArtifact { path } => {
                    let selected = binary::select_variant(cx, dep, path, destination)?;
                    arg(&mut args, "-Xcc");
                    arg(&mut args, "-I");
                    arg(&mut args, "-Xcc");
                    args.push(selected.headers_dir().display().to_string());
                }
                _ => {}
            }
        }

        // Declared settings, in manifest order.
        let mut language_version = None;
        for setting in &module.settings().swift {
            let active = setting
                .condition
                .as_ref()
                .map_or(true, |c| c.satisfied_by(&environment));
            if !active {
                continue;
            }
            match &setting.value {
                SwiftSetting::Define(name) => args.push(format!("-D{name}")),
                SwiftSetting::HeaderSearchPath(path) => {
                    arg(&mut args, "-Xcc");
                    arg(&mut args, "-I");
                    arg(&mut args, "-Xcc");
                    arg(&mut args, path);
                }
                SwiftSetting::UnsafeFlags(flags) => args.extend(flags.iter().cloned()),
                SwiftSetting::InteroperabilityMode(mode) => {
                    if *mode == InteropMode::Cxx {
                        arg(&mut args, "-cxx-interoperability-mode=default");
                        if let Some(std) = module.cxx_language_standard() {
                            arg(&mut args, "-Xcc");
                            args.push(format!("-std={std}"));
                        }
                    }
                }
                SwiftSetting::UpcomingFeature(name) => {
                    if toolchain.supports_flag("-enable-upcoming-feature") {
                        arg(&mut args, "-enable-upcoming-feature");
                        arg(&mut args, name);
                    }
                }
                SwiftSetting::ExperimentalFeature(name) => {
                    if toolchain.supports_flag("-enable-experimental-feature") {
                        arg(&mut args, "-enable-experimental-feature");
                        arg(&mut args, name);
                    }
                }
                SwiftSetting::LanguageVersion(version) => {
                    language_version = Some(version.clone());
                }
                SwiftSetting::DefaultIsolation(isolation) => {
                    if !package.tools_version().supports_safety_settings() {
                        diagnostics.warn(format!(
                            "ignoring default isolation setting of module '{}': requires \
                             tools version 6.0 (package '{}' declares {})",
                            module.name(),
                            package.identity(),
                            package.tools_version()
                        ));
                    } else if toolchain.supports_flag("-default-isolation") {
                        arg(&mut args, "-default-isolation");
                        arg(
                            &mut args,
                            match isolation {
                                DefaultIsolation::MainActor => "MainActor",
                                DefaultIsolation::Nonisolated => "nonisolated",
                            },
                        );
                    }
                }
                SwiftSetting::StrictMemorySafety => {
                    if !package.tools_version().supports_safety_settings() {
                        diagnostics.warn(format!(
                            "ignoring strict memory safety setting of module '{}': requires \
                             tools version 6.0 (package '{}' declares {})",
                            module.name(),
                            package.identity(),
                            package.tools_version()
                        ));
                    } else if toolchain.supports_flag("-strict-memory-safety") {
                        arg(&mut args, "-strict-memory-safety");
                    }
                }
            }
        }
        arg(&mut args, "-swift-version");
        match language_version {
            Some(version) => args.push(version),
            None => arg(
                &mut args,
                package.tools_version().default_swift_language_version(),
            ),
        }

        for sanitizer in &params.sanitizers {
            args.push(format!("-sanitize={}", sanitizer.name()));
        }

        let object_extension = if params.linking.lto.is_some() { "bc" } else { "o" };
        if let Some(lto) = params.linking.lto {
            arg(&mut args, lto.swift_flag());
        }

        if params.index_store_mode.is_enabled() {
            arg(&mut args, "-index-store-path");
            args.push(layout.index_store().display().to_string());
        }

        match params.keeps_frame_pointers() {
            Some(true) => {
                arg(&mut args, "-Xcc");
                arg(&mut args, "-fno-omit-frame-pointer");
            }
            Some(false) => {
                arg(&mut args, "-Xcc");
                arg(&mut args, "-fomit-frame-pointer");
            }
            None => {}
        }

        if module.is_executable() && module.sources().len() == 1 {
            let source = &module.sources()[0];
            let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let contents = cx
                .fs
                .read_to_string(source)
                .with_context(|| format!("failed to scan `{}`", source.display()))?;
            if parses_as_library(stem, &contents) {
                arg(&mut args, "-parse-as-library");
            }
        }

        if module.is_executable()
            && params.driver.can_rename_entrypoint_function_name
            && !params.triple.is_wasi()
        {
            arg(&mut args, "-Xfrontend");
            arg(&mut args, "-entry-point-function-name");
            arg(&mut args, "-Xfrontend");
            args.push(format!("{}_main", module.c99_name()));
        }

        let objc_header_path = if params.triple.is_darwin() {
            let header = layout.objc_header(module.name());
            arg(&mut args, "-emit-objc-header");
            arg(&mut args, "-emit-objc-header-path");
            args.push(header.display().to_string());
            Some(header)
        } else {
            None
        };

        if params.driver.explicit_module_build && toolchain.supports_flag("-explicit-module-build")
        {
            arg(&mut args, "-explicit-module-build");
        }

        args.extend(params.flags.swift.iter().cloned());

        // Derived sources compile alongside the declared ones.
        let mut derived_sources = Vec::new();
        if !module.resources().is_empty() {
            let accessor = layout
                .derived_sources_dir(module.name())
                .join("resource_bundle_accessor.swift");
            cx.fs.write(
                &accessor,
                &resource_bundle_accessor(package.identity().as_str(), module.name()),
            )?;
            derived_sources.push(accessor);
        }
        let mut sources = module.sources().to_vec();
        sources.extend(derived_sources.iter().cloned());

        // Outputs and file-specific arguments.
        let swiftmodule_path = layout.swiftmodule(module.name());
        let interface_path = if toolchain.supports_flag("-emit-module-interface-path") {
            Some(layout.swiftinterface(module.name()))
        } else {
            None
        };
        let output_file_map_path = layout.output_file_map(module.name());
        let objects = object_paths(&sources, &build_dir, object_extension)?;
        let diagnostic_files = object_paths(&sources, &build_dir, "dia")?;

        let mut file_arguments = Vec::new();
        file_arguments.push("-emit-module".to_string());
        file_arguments.push("-emit-module-path".to_string());
        file_arguments.push(swiftmodule_path.display().to_string());
        if let Some(interface) = &interface_path {
            file_arguments.push("-emit-module-interface-path".to_string());
            file_arguments.push(interface.display().to_string());
        }
        file_arguments.push("-output-file-map".to_string());
        file_arguments.push(output_file_map_path.display().to_string());
        file_arguments.push("-c".to_string());
        file_arguments.extend(sources.iter().map(|s| s.display().to_string()));

        write_output_file_map(cx, &sources, &objects, &diagnostic_files, &build_dir, &output_file_map_path)?;

        // The debugger reads the swiftmodule out of an object file on
        // non-Darwin, so wrap it there.
        let modulewrap_object = if params.triple.is_darwin() {
            None
        } else {
            Some(build_dir.join(format!("{}.swiftmodule.o", module.name())))
        };

        Ok(SwiftModuleBuildDescription {
            module,
            destination,
            program: toolchain.swift_compiler().to_path_buf(),
            flags: args,
            file_arguments,
            objects,
            swiftmodule_path,
            interface_path,
            objc_header_path,
            diagnostic_files,
            modulewrap_object,
            output_file_map_path,
            derived_sources,
            uses_embedded: embedded,
        })
    }

    pub fn module(&self) -> &Arc<ResolvedModule> {
        &self.module
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// The full compile command line.
    pub fn compile_arguments(&self) -> Vec<String> {
        let mut args = self.flags.clone();
        args.extend(self.file_arguments.iter().cloned());
        args
    }

    /// Compile arguments minus file-specific pieces; suitable for symbol
    /// graph extraction, which supplies its own outputs.
    pub fn symbol_graph_extract_arguments(&self) -> &[String] {
        &self.flags
    }

    /// Objects to link, including the wrapped swiftmodule where the
    /// platform needs it.
    pub fn objects(&self) -> Vec<PathBuf> {
        let mut objects = self.objects.clone();
        objects.extend(self.modulewrap_object.iter().cloned());
        objects
    }

    pub fn swiftmodule_path(&self) -> &PathBuf {
        &self.swiftmodule_path
    }

    pub fn diagnostic_files(&self) -> &[PathBuf] {
        &self.diagnostic_files
    }

    pub fn derived_sources(&self) -> &[PathBuf] {
        &self.derived_sources
    }

    pub fn output_file_map_path(&self) -> &PathBuf {
        &self.output_file_map_path
    }

    pub fn uses_embedded(&self) -> bool {
        self.uses_embedded
    }

    pub fn modulewrap_arguments(&self) -> Option<Vec<String>> {
        let object = self.modulewrap_object.as_ref()?;
        Some(vec![
            "-modulewrap".to_string(),
            self.swiftmodule_path.display().to_string(),
            "-o".to_string(),
            object.display().to_string(),
        ])
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        let mut invocations = Vec::new();
        let mut compile = Invocation::new(&self.program);
        compile.args(self.compile_arguments());
        invocations.push(compile);
        if let Some(args) = self.modulewrap_arguments() {
            let mut wrap = Invocation::new(&self.program);
            wrap.args(args);
            invocations.push(wrap);
        }
        invocations
    }

    pub fn output_paths(&self) -> Vec<PathBuf> {
        let mut outputs = self.objects();
        outputs.push(self.swiftmodule_path.clone());
        outputs.extend(self.interface_path.iter().cloned());
        outputs.extend(self.objc_header_path.iter().cloned());
        outputs.extend(self.diagnostic_files.iter().cloned());
        outputs
    }
}

fn executable_file_name(name: &str, params: &crate::core::plan::BuildParameters) -> String {
    match params.triple.executable_extension() {
        "" => name.to_string(),
        ext => format!("{name}.{ext}"),
    }
}

/// Per-source compiler outputs, keyed the way the driver expects: an
/// empty key for whole-module entries, then one entry per source.
fn write_output_file_map(
    cx: &PlanContext<'_>,
    sources: &[PathBuf],
    objects: &[PathBuf],
    diagnostics: &[PathBuf],
    build_dir: &PathBuf,
    path: &PathBuf,
) -> PlanResult<()> {
    let mut map: BTreeMap<String, BTreeMap<&'static str, String>> = BTreeMap::new();
    map.insert(
        String::new(),
        BTreeMap::from([(
            "swift-dependencies",
            build_dir.join("master.swiftdeps").display().to_string(),
        )]),
    );
    for ((source, object), diagnostic) in sources.iter().zip(objects).zip(diagnostics) {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        map.insert(
            source.display().to_string(),
            BTreeMap::from([
                ("object", object.display().to_string()),
                ("diagnostics", diagnostic.display().to_string()),
                (
                    "swift-dependencies",
                    build_dir.join(format!("{stem}.swiftdeps")).display().to_string(),
                ),
            ]),
        );
    }
    let json = serde_json::to_string_pretty(&map)?;
    cx.fs.write(path, &json)
}

fn resource_bundle_accessor(package: &str, module: &str) -> String {
    format!(
        r#"import class Foundation.Bundle
import class Foundation.ProcessInfo
import struct Foundation.URL

private class BundleFinder {{}}

extension Foundation.Bundle {{
    /// Returns the resource bundle associated with the current Swift module.
    static let module: Bundle = {{
        let bundleName = "{package}_{module}"
        let candidates = [
            Bundle.main.resourceURL,
            Bundle(for: BundleFinder.self).resourceURL,
            Bundle.main.bundleURL,
        ]
        for candidate in candidates {{
            let bundlePath = candidate?.appendingPathComponent(bundleName + ".bundle")
            if let bundle = bundlePath.flatMap(Bundle.init(url:)) {{
                return bundle
            }}
        }}
        fatalError("unable to find bundle named {package}_{module}")
    }}()
}}
"#
    )
}

/// Whether a single-file executable module should be compiled with
/// `-parse-as-library`.
///
/// A live `@main` always wins. Otherwise a file with top-level
/// executable statements keeps the script model regardless of its name,
/// and a declarations-only file gets the flag unless it is named `main`.
/// "Live" is decided lexically: comments (including nested block
/// comments) and string literals are stripped, and whatever text remains
/// counts. No language parsing is attempted.
pub(crate) fn parses_as_library(stem: &str, source: &str) -> bool {
    let live = strip_comments_and_strings(source);
    if contains_at_main(&live) {
        return true;
    }
    if has_top_level_code(&live) {
        return false;
    }
    stem != "main"
}

/// Strip `//` comments, nested `/* */` comments, and `"…"`/`"""…"""`
/// string literals, preserving line structure.
pub(crate) fn strip_comments_and_strings(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(source.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let mut depth = 1;
                i += 2;
                while i < bytes.len() && depth > 0 {
                    if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
                        depth += 1;
                        i += 2;
                    } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        depth -= 1;
                        i += 2;
                    } else {
                        if bytes[i] == b'\n' {
                            out.push(b'\n');
                        }
                        i += 1;
                    }
                }
            }
            b'"' => {
                let triple = bytes.get(i + 1) == Some(&b'"') && bytes.get(i + 2) == Some(&b'"');
                let terminator: &[u8] = if triple { b"\"\"\"" } else { b"\"" };
                i += terminator.len();
                while i < bytes.len() {
                    if bytes[i] == b'\\' {
                        i += 2;
                        continue;
                    }
                    if bytes[i..].starts_with(terminator) {
                        i += terminator.len();
                        break;
                    }
                    if bytes[i] == b'\n' {
                        out.push(b'\n');
                    }
                    i += 1;
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    // Only ASCII delimiters are ever removed, so what remains is intact
    // UTF-8.
    String::from_utf8(out).unwrap_or_default()
}

fn contains_at_main(live: &str) -> bool {
    let bytes = live.as_bytes();
    let needle = b"@main";
    let mut from = 0;
    while let Some(pos) = live[from..].find("@main").map(|p| p + from) {
        let end = pos + needle.len();
        let followed_by_ident = bytes
            .get(end)
            .map_or(false, |c| c.is_ascii_alphanumeric() || *c == b'_');
        if !followed_by_ident {
            return true;
        }
        from = end;
    }
    false
}

/// Heuristic scan for executable statements at brace depth zero. Lines
/// opening with a declaration introducer, an attribute, or a compiler
/// directive do not count.
fn has_top_level_code(live: &str) -> bool {
    const INTRODUCERS: &[&str] = &[
        "import",
        "func",
        "struct",
        "class",
        "actor",
        "enum",
        "protocol",
        "extension",
        "typealias",
        "let",
        "var",
        "operator",
        "precedencegroup",
        "prefix",
        "infix",
        "postfix",
        "indirect",
        "final",
        "public",
        "internal",
        "private",
        "fileprivate",
        "open",
        "static",
    ];
    let mut depth: i32 = 0;
    for line in live.lines() {
        let trimmed = line.trim_start();
        if depth == 0 && !trimmed.is_empty() {
            let first = trimmed
                .split(|c: char| c.is_whitespace() || c == '(' || c == '{')
                .next()
                .unwrap_or("");
            let declares = first.starts_with('@')
                || first.starts_with('#')
                || INTRODUCERS.contains(&first)
                || first.is_empty();
            if !declares {
                return true;
            }
        }
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }
    }
    false
}
