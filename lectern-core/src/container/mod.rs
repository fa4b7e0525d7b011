//! Container loader: opens an EPUB archive and resolves its package
//!
//! The loader reads the package document, maps the spine and navigation
//! through the manifest, and extracts the raw bytes the builder needs. It
//! does not interpret chapter markup; that is the normalizer's job.

mod archive;
mod nav;
mod opf;
pub mod path;

use crate::error::{ContainerError, RefTable};
use crate::types::{BookMetadata, CoverImage, Resource, ResourceKind, SpineItem, Target, TocEntry};
use archive::Archive;
use nav::{NavParseError, NavPoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Read, Seek};
use std::path::Path;
use std::time::Duration;

const CONTAINER_XML: &str = "META-INF/container.xml";

/// Conventional package locations tried when container.xml is unusable
const FALLBACK_PACKAGE_PATHS: &[&str] = &[
    "OEBPS/content.opf",
    "OPS/content.opf",
    "content.opf",
    "OEBPS/package.opf",
    "OPS/package.opf",
    "package.opf",
];

const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Bounds applied while loading one container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoaderLimits {
    /// Largest accepted archive file
    pub max_archive_bytes: u64,

    /// Most entries an archive may list
    pub max_entries: usize,

    /// Largest uncompressed entry
    pub max_entry_bytes: u64,

    /// Total uncompressed bytes read from one archive
    pub max_total_bytes: u64,

    /// Deepest accepted navigation nesting
    pub max_toc_depth: usize,

    /// Wall-clock budget for one load
    pub time_budget_secs: u64,
}

impl LoaderLimits {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }
}

impl Default for LoaderLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: 512 * 1024 * 1024,
            max_entries: 10_000,
            max_entry_bytes: 64 * 1024 * 1024,
            max_total_bytes: 1024 * 1024 * 1024,
            max_toc_depth: 32,
            time_budget_secs: 60,
        }
    }
}

/// A manifest item with its href resolved to an archive path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub kind: ResourceKind,
    pub properties: Vec<String>,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }
}

/// The package manifest, indexed by id and by resolved href
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    by_id: HashMap<String, usize>,
    by_href: HashMap<String, usize>,
}

impl Manifest {
    fn from_declared(declared: Vec<opf::DeclaredItem>, base_dir: &str) -> Self {
        let mut manifest = Manifest::default();
        for item in declared {
            if manifest.by_id.contains_key(&item.id) {
                tracing::warn!(id = %item.id, "duplicate manifest id, keeping the first");
                continue;
            }
            let index = manifest.items.len();
            let href = path::resolve(base_dir, &item.href);
            manifest.by_id.insert(item.id.clone(), index);
            manifest.by_href.entry(href.clone()).or_insert(index);
            manifest.items.push(ManifestItem {
                kind: ResourceKind::from_media_type(&item.media_type),
                id: item.id,
                href,
                media_type: item.media_type,
                properties: item.properties,
            });
        }
        manifest
    }

    /// Look up an item by manifest id
    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.by_id.get(id).map(|&i| &self.items[i])
    }

    /// Look up an item by resolved archive path
    pub fn by_href(&self, href: &str) -> Option<&ManifestItem> {
        self.by_href.get(href).map(|&i| &self.items[i])
    }

    /// Items in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Everything the builder needs from one container
#[derive(Debug, Clone)]
pub struct RawPackage {
    /// Archive path of the package document
    pub package_path: String,

    pub metadata: BookMetadata,

    pub manifest: Manifest,

    /// Resolved reading order
    pub spine: Vec<SpineItem>,

    /// Resolved navigation; empty when the package has none
    pub toc: Vec<TocEntry>,

    /// Raw bytes of each spine document, keyed by href
    pub documents: HashMap<String, Vec<u8>>,

    pub cover: Option<CoverImage>,

    pub images: BTreeMap<String, Resource>,

    pub stylesheets: BTreeMap<String, Resource>,
}

/// Opens containers and resolves their packages
#[derive(Debug, Clone, Default)]
pub struct ContainerLoader {
    limits: LoaderLimits,
}

impl ContainerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: LoaderLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LoaderLimits {
        &self.limits
    }

    /// Load a container from disk
    pub fn load(&self, path: &Path) -> Result<RawPackage, ContainerError> {
        let size = std::fs::metadata(path)
            .map_err(|e| ContainerError::MalformedContainer(format!("{}: {}", path.display(), e)))?
            .len();
        if size > self.limits.max_archive_bytes {
            return Err(ContainerError::ResourceLimitExceeded(format!(
                "archive is {} bytes, limit is {}",
                size, self.limits.max_archive_bytes
            )));
        }

        let archive = Archive::open(path, &self.limits)?;
        self.load_archive(archive)
    }

    /// Load a container from any seekable reader
    pub fn load_from_reader<R: Read + Seek>(&self, reader: R) -> Result<RawPackage, ContainerError> {
        let archive = Archive::from_reader(reader, &self.limits)?;
        self.load_archive(archive)
    }

    fn load_archive<R: Read + Seek>(
        &self,
        mut archive: Archive<R>,
    ) -> Result<RawPackage, ContainerError> {
        let package_path = locate_package(&mut archive)?;
        let package_bytes = archive
            .read_optional(&package_path)?
            .ok_or_else(|| ContainerError::MissingManifest(package_path.clone()))?;
        let doc = opf::parse_package(&path::decode_text(&package_bytes)).map_err(|e| {
            ContainerError::MalformedContainer(format!("{}: {}", package_path, e))
        })?;

        let base_dir = path::parent_dir(&package_path).to_string();
        let manifest = Manifest::from_declared(doc.manifest.clone(), &base_dir);
        let spine = resolve_spine(&doc, &manifest)?;

        let mut documents = HashMap::with_capacity(spine.len());
        for item in &spine {
            let data = archive
                .read_optional(&item.href)?
                .ok_or_else(|| ContainerError::broken(&item.id, RefTable::Manifest))?;
            documents.insert(item.href.clone(), data);
        }

        let toc = self.resolve_navigation(&mut archive, &doc, &manifest, &spine)?;
        let cover_item = resolve_cover(&doc, &manifest, &base_dir)?.cloned();

        let mut images = BTreeMap::new();
        let mut stylesheets = BTreeMap::new();
        for item in manifest.iter() {
            let target = match item.kind {
                ResourceKind::Image => &mut images,
                ResourceKind::Stylesheet => &mut stylesheets,
                _ => continue,
            };
            match archive.read_optional(&item.href)? {
                Some(data) => {
                    target.insert(item.href.clone(), Resource::new(&item.media_type, data));
                }
                None => tracing::warn!(id = %item.id, href = %item.href, "manifest resource missing from archive"),
            }
        }

        let cover = cover_item.and_then(|item| {
            images.get(&item.href).map(|resource| CoverImage {
                href: item.href.clone(),
                resource: resource.clone(),
            })
        });

        tracing::debug!(
            package = %package_path,
            manifest = manifest.len(),
            spine = spine.len(),
            toc = toc.len(),
            images = images.len(),
            "resolved container"
        );

        Ok(RawPackage {
            package_path,
            metadata: doc.metadata,
            manifest,
            spine,
            toc,
            documents,
            cover,
            images,
            stylesheets,
        })
    }

    /// Prefer the XHTML nav document, fall back to the NCX
    fn resolve_navigation<R: Read + Seek>(
        &self,
        archive: &mut Archive<R>,
        doc: &opf::PackageDocument,
        manifest: &Manifest,
        spine: &[SpineItem],
    ) -> Result<Vec<TocEntry>, ContainerError> {
        let max_depth = self.limits.max_toc_depth;
        let spine_hrefs: HashSet<&str> = spine.iter().map(|s| s.href.as_str()).collect();

        let nav_doc = manifest.iter().find(|i| i.has_property("nav"));
        let ncx = match &doc.spine_toc {
            Some(id) => Some(
                manifest
                    .get(id)
                    .ok_or_else(|| ContainerError::broken(id, RefTable::Spine))?,
            ),
            None => manifest.iter().find(|i| i.media_type == NCX_MEDIA_TYPE),
        };

        let sources = nav_doc
            .map(|item| (item, true))
            .into_iter()
            .chain(ncx.map(|item| (item, false)));

        for (item, is_nav_doc) in sources {
            let Some(bytes) = archive.read_optional(&item.href)? else {
                tracing::warn!(id = %item.id, href = %item.href, "navigation document missing from archive");
                continue;
            };
            let text = path::decode_text(&bytes);
            let parsed = if is_nav_doc {
                nav::parse_nav_document(&text, max_depth)
            } else {
                nav::parse_ncx(&text, max_depth)
            };

            let points = match parsed {
                Ok(points) => points,
                Err(NavParseError::TooDeep(depth)) => {
                    return Err(ContainerError::ResourceLimitExceeded(format!(
                        "navigation in '{}' nests deeper than {}",
                        item.href, depth
                    )))
                }
                Err(NavParseError::Xml(e)) => {
                    tracing::warn!(href = %item.href, error = %e, "unreadable navigation document");
                    continue;
                }
            };

            let nav_dir = path::parent_dir(&item.href);
            let entries = resolve_points(points, nav_dir, &item.href, manifest, &spine_hrefs)?;
            if !entries.is_empty() {
                return Ok(entries);
            }
        }

        Ok(Vec::new())
    }
}

/// Find the package document path inside the archive
fn locate_package<R: Read + Seek>(archive: &mut Archive<R>) -> Result<String, ContainerError> {
    if let Some(bytes) = archive.read_optional(CONTAINER_XML)? {
        match opf::parse_container_xml(&path::decode_text(&bytes)) {
            Ok(Some(full_path)) => {
                let full_path = path::resolve("", &full_path);
                if let Some(actual) = archive.entry_name(&full_path) {
                    return Ok(actual);
                }
                tracing::warn!(path = %full_path, "container.xml points at a missing package document");
            }
            Ok(None) => tracing::warn!("container.xml declares no rootfile"),
            Err(e) => tracing::warn!(error = %e, "unreadable container.xml"),
        }
    }

    for candidate in FALLBACK_PACKAGE_PATHS {
        if let Some(actual) = archive.entry_name(candidate) {
            return Ok(actual);
        }
    }

    archive
        .names()
        .into_iter()
        .find(|name| name.to_lowercase().ends_with(".opf"))
        .ok_or_else(|| {
            ContainerError::MissingManifest("no package document found in archive".to_string())
        })
}

fn resolve_spine(
    doc: &opf::PackageDocument,
    manifest: &Manifest,
) -> Result<Vec<SpineItem>, ContainerError> {
    let mut seen = HashSet::new();
    let mut spine = Vec::with_capacity(doc.spine.len());

    for itemref in &doc.spine {
        let item = manifest
            .get(&itemref.idref)
            .ok_or_else(|| ContainerError::broken(&itemref.idref, RefTable::Spine))?;

        if !seen.insert(item.href.clone()) {
            tracing::warn!(id = %item.id, href = %item.href, "spine repeats a document, skipping");
            continue;
        }

        spine.push(SpineItem {
            ordinal: spine.len(),
            href: item.href.clone(),
            id: item.id.clone(),
            media_type: item.media_type.clone(),
            linear: itemref.linear,
        });
    }

    if spine.is_empty() {
        return Err(ContainerError::MalformedContainer(
            "package declares an empty spine".to_string(),
        ));
    }

    Ok(spine)
}

/// Map raw navigation points through the manifest.
///
/// Points without a usable target borrow their first child's target; points
/// aimed outside the spine are dropped and their children promoted.
fn resolve_points(
    points: Vec<NavPoint>,
    nav_dir: &str,
    nav_href: &str,
    manifest: &Manifest,
    spine_hrefs: &HashSet<&str>,
) -> Result<Vec<TocEntry>, ContainerError> {
    let mut entries = Vec::new();

    for point in points {
        let children = resolve_points(point.children, nav_dir, nav_href, manifest, spine_hrefs)?;

        let src = match point.src.as_deref().map(str::trim) {
            Some(src) if !src.is_empty() && !path::has_scheme(src) => src.to_string(),
            _ => {
                match children.first().map(|c| c.target.clone()) {
                    Some(target) => entries.push(TocEntry {
                        title: point.label,
                        target,
                        children,
                    }),
                    None => tracing::debug!(label = %point.label, "navigation point without target"),
                }
                continue;
            }
        };

        let raw = Target::parse(&src);
        let href = if raw.href.is_empty() {
            nav_href.to_string()
        } else {
            path::resolve(nav_dir, &raw.href)
        };

        let item = manifest
            .by_href(&href)
            .ok_or_else(|| ContainerError::broken(&src, RefTable::Toc))?;

        if !spine_hrefs.contains(item.href.as_str()) {
            tracing::warn!(href = %item.href, "navigation target outside the spine, dropping");
            entries.extend(children);
            continue;
        }

        let title = if point.label.is_empty() {
            path::file_stem(&item.href).to_string()
        } else {
            point.label
        };

        entries.push(TocEntry {
            title,
            target: Target {
                href: item.href.clone(),
                fragment: raw.fragment,
            },
            children,
        });
    }

    Ok(entries)
}

/// Pick the cover image item, in order of how explicit the declaration is
fn resolve_cover<'m>(
    doc: &opf::PackageDocument,
    manifest: &'m Manifest,
    base_dir: &str,
) -> Result<Option<&'m ManifestItem>, ContainerError> {
    if let Some(item) = manifest.iter().find(|i| i.has_property("cover-image")) {
        return Ok(Some(item));
    }

    if let Some(pointer) = &doc.cover_meta {
        let item = manifest
            .get(pointer)
            .or_else(|| manifest.by_href(&path::resolve(base_dir, pointer)))
            .ok_or_else(|| ContainerError::broken(pointer, RefTable::Metadata))?;
        if item.kind == ResourceKind::Image {
            return Ok(Some(item));
        }
        tracing::debug!(id = %item.id, "cover meta points at a non-image resource");
    }

    for reference in doc.guide.iter().filter(|r| r.kind.eq_ignore_ascii_case("cover")) {
        let href = path::resolve(base_dir, Target::parse(&reference.href).href.as_str());
        if let Some(item) = manifest.by_href(&href) {
            if item.kind == ResourceKind::Image {
                return Ok(Some(item));
            }
        }
    }

    Ok(manifest.iter().find(|i| {
        i.kind == ResourceKind::Image
            && (i.id.to_lowercase().contains("cover")
                || path::file_stem(&i.href).to_lowercase().contains("cover"))
    }))
}
