//! Build manifest scanning
//!
//! Reads `<PackageReference>` items out of `.csproj` files and annotates each
//! package with risk and license data from a small known table. A manifest
//! that is not well-formed XML contributes nothing; scanning continues with
//! the next one.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use crate::{Error, Result};
use crate::extract::SourceFile;
use crate::package::PackageRecord;

/// Extensions treated as build manifests (lowercase, no dot)
pub const MANIFEST_EXTENSIONS: &[&str] = &["csproj"];

/// Known packages: (name, risk, license). Lookup ignores ASCII case.
const KNOWN_PACKAGES: &[(&str, &str, &str)] = &[
    ("Newtonsoft.Json", "Low: keep updated", "MIT"),
    ("Dapper", "Low", "Apache-2.0"),
    ("Some.Vuln.Package", "High: CVE-XXXX-YYYY", "UNKNOWN"),
];

/// Whether a path names a build manifest
pub fn is_manifest(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| MANIFEST_EXTENSIONS.iter().any(|m| m.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct PendingReference {
    name: String,
    version: Option<String>,
    version_element: Option<String>,
}

impl PendingReference {
    fn from_element(element: &BytesStart) -> Result<Self> {
        Ok(Self {
            name: attribute(element, "Include")?.unwrap_or_default(),
            version: attribute(element, "Version")?,
            version_element: None,
        })
    }
}

fn attribute(element: &BytesStart, key: &str) -> Result<Option<String>> {
    let attr = element
        .try_get_attribute(key)
        .map_err(|e| Error::Manifest(e.to_string()))?;
    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|e| Error::Manifest(e.to_string()))
    })
    .transpose()
}

/// Scans build manifests for package references
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageScanner;

impl PackageScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan every manifest, skipping the ones that fail to parse
    pub fn scan(&self, manifests: &[SourceFile]) -> Vec<PackageRecord> {
        let mut packages = Vec::new();
        for manifest in manifests {
            match self.scan_manifest(&manifest.text) {
                Ok(found) => packages.extend(found),
                Err(e) => tracing::debug!("Skipping malformed manifest {}: {}", manifest.path, e),
            }
        }
        packages
    }

    /// Parse one manifest; any XML error discards the whole file.
    ///
    /// The document must be well formed: exactly one root element and every
    /// element closed before the end of input.
    pub fn scan_manifest(&self, xml: &str) -> Result<Vec<PackageRecord>> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut packages = Vec::new();
        let mut current: Option<PendingReference> = None;
        let mut in_version = false;
        let mut depth = 0usize;
        let mut roots = 0usize;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::Manifest(format!("at byte {}: {}", reader.buffer_position(), e)))?;

            if matches!(event, Event::Start(_) | Event::Empty(_)) && depth == 0 {
                roots += 1;
                if roots > 1 {
                    return Err(Error::Manifest("multiple root elements".to_string()));
                }
            }

            match event {
                Event::Start(e) => {
                    depth += 1;
                    match e.local_name().as_ref() {
                        b"PackageReference" => current = Some(PendingReference::from_element(&e)?),
                        b"Version" if current.is_some() => in_version = true,
                        _ => {}
                    }
                }
                Event::Empty(e) => {
                    if e.local_name().as_ref() == b"PackageReference" {
                        self.push(&mut packages, PendingReference::from_element(&e)?);
                    }
                }
                Event::Text(t) if in_version => {
                    let text = t.unescape().map_err(|e| Error::Manifest(e.to_string()))?;
                    if let Some(pending) = current.as_mut() {
                        pending.version_element = Some(text.into_owned());
                    }
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    match e.local_name().as_ref() {
                        b"Version" => in_version = false,
                        b"PackageReference" => {
                            if let Some(pending) = current.take() {
                                self.push(&mut packages, pending);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof if depth > 0 => {
                    return Err(Error::Manifest(format!("{} unclosed element(s) at end of input", depth)));
                }
                Event::Eof if roots == 0 => return Err(Error::Manifest("root element is missing".to_string())),
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(packages)
    }

    fn push(&self, packages: &mut Vec<PackageRecord>, pending: PendingReference) {
        if pending.name.trim().is_empty() {
            return;
        }
        let version = pending.version.or(pending.version_element).unwrap_or_default();
        packages.push(self.annotate(PackageRecord::new(pending.name, version)));
    }

    /// Attach risk and license from the known table
    pub fn annotate(&self, package: PackageRecord) -> PackageRecord {
        match KNOWN_PACKAGES
            .iter()
            .find(|(name, _, _)| name.eq_ignore_ascii_case(&package.name))
        {
            Some((_, risk, license)) => package.with_risk(*risk).with_license(*license),
            None => package,
        }
    }
}
