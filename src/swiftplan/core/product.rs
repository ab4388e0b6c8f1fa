use crate::core::package::PackageIdentity;

/// How a library product is linked into its consumers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LibraryLinkage {
    Static,
    Dynamic,
    /// The engine picks; behaves as static unless a consumer forces
    /// otherwise. Automatic products are also exempt from product-name
    /// uniqueness.
    Automatic,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProductKind {
    Executable,
    Library(LibraryLinkage),
    Test,
    Plugin,
    /// Synthesized stand-in that makes a package's modules importable
    /// from an interactive session.
    ReplStub,
    Macro,
}

/// A linker-level setting declared in a module's manifest.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkerSetting {
    LinkedLibrary(String),
    LinkedFramework(String),
    UnsafeFlags(Vec<String>),
}

/// A linkable artifact in the resolved graph: an executable, library, or
/// test bundle composed of one or more modules.
#[derive(Clone, Debug)]
pub struct ResolvedProduct {
    name: String,
    kind: ProductKind,
    package: PackageIdentity,
    /// Names of the product's member modules, in declaration order.
    modules: Vec<String>,
}

impl ResolvedProduct {
    pub fn new(
        name: &str,
        kind: ProductKind,
        package: PackageIdentity,
        modules: Vec<String>,
    ) -> ResolvedProduct {
        ResolvedProduct {
            name: name.to_string(),
            kind,
            package,
            modules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The product name with dashes mapped to underscores, as used for
    /// `-module-name`. The binary keeps the original name.
    pub fn c99_name(&self) -> String {
        self.name.replace('-', "_")
    }

    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    pub fn package(&self) -> &PackageIdentity {
        &self.package
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn is_dynamic_library(&self) -> bool {
        self.kind == ProductKind::Library(LibraryLinkage::Dynamic)
    }

    pub fn is_automatic_library(&self) -> bool {
        self.kind == ProductKind::Library(LibraryLinkage::Automatic)
    }

    /// Whether consumers stop at this product's boundary when collecting
    /// objects to link (they link the product's binary instead).
    pub fn truncates_link_closure(&self) -> bool {
        self.is_dynamic_library()
    }
}
