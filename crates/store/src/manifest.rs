//! Launcher-facing read model.
//!
//! Documents are rebuilt from the current association state on every call;
//! nothing here is cached. Builds and mods are emitted in name order so
//! repeated requests produce identical documents.

use crate::error::{Error, ErrorKind, Result};
use crate::models::{Attachment, Build, Forge, Id, Minecraft, Pack, Version};
use crate::repo::Store;
use serde::Serialize;
use solder_storage::Category;
use std::collections::HashMap;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackManifest {
    /// The pack's slug; launchers address packs by it.
    pub name: String,
    pub display_name: String,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Download>,
    pub recommended: Option<String>,
    pub latest: Option<String>,
    /// Names of the published builds.
    pub builds: Vec<String>,
    pub build_summaries: Vec<BuildSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub name: String,
    pub minecraft: Option<String>,
    pub forge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildManifest {
    pub minecraft: Option<String>,
    pub forge: Option<String>,
    pub java: Option<String>,
    pub memory: Option<String>,
    pub mods: Vec<ModEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModEntry {
    /// The mod's slug.
    pub name: String,
    /// The version's display name.
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub url: String,
    pub md5: String,
}

/// Release names looked up once per document.
#[derive(Default)]
struct Releases {
    minecraft: HashMap<Id, String>,
    forge: HashMap<Id, String>,
}

#[derive(Debug, Clone)]
pub struct ManifestSynthesizer {
    store: Store,
    download_url: String,
}
impl ManifestSynthesizer {
    /// `download_url` is the public base under which blobs are served as
    /// `<download_url>/<category>/<md5>`.
    pub fn new(store: Store, download_url: impl Into<String>) -> Self {
        let download_url = download_url.into().trim_end_matches('/').to_string();
        Self { store, download_url }
    }

    pub fn download(&self, category: Category, attachment: &Attachment) -> Download {
        Download {
            url: format!("{}/{category}/{}", self.download_url, attachment.md5),
            md5: attachment.md5.clone(),
        }
    }

    /// Manifests of every pack that is not hidden.
    #[instrument(skip(self))]
    pub async fn packs(&self) -> Result<Vec<PackManifest>> {
        let mut releases = Releases::default();
        let mut manifests = Vec::new();
        for pack in self.store.packs.list().await? {
            if pack.hidden {
                continue;
            }
            manifests.push(self.pack_manifest(pack, &mut releases).await?);
        }
        Ok(manifests)
    }

    #[instrument(skip(self))]
    pub async fn pack(&self, pack: &str) -> Result<PackManifest> {
        let pack = self.store.packs.get(pack).await?;
        self.pack_manifest(pack, &mut Releases::default()).await
    }

    /// The build must belong to the pack; a build of another pack with the
    /// same slug or id is not found.
    #[instrument(skip(self))]
    pub async fn build(&self, pack: &str, build: &str) -> Result<BuildManifest> {
        let pack = self.store.packs.get(pack).await?;
        let build = self.store.builds.get(pack.id, build).await?;
        let mut releases = Releases::default();
        let minecraft = self.minecraft(build.minecraft_id, &mut releases).await?;
        let forge = self.forge(build.forge_id, &mut releases).await?;

        let versions = self.store.builds.versions().list_by_a(build.id).await?;
        let mut slugs: HashMap<Id, String> = HashMap::new();
        let mut entries = Vec::with_capacity(versions.len());
        for version in versions {
            let slug = match slugs.get(&version.mod_id) {
                Some(slug) => slug.clone(),
                None => {
                    let owner = self.store.mods.by_id(version.mod_id).await?;
                    slugs.insert(owner.id, owner.slug.clone());
                    owner.slug
                },
            };
            let download = match self.file(&version) {
                Ok(download) => Some(download),
                Err(err) if matches!(&*err, ErrorKind::PartialData(_)) => {
                    tracing::warn!(error = ?err, "mod entry without download");
                    None
                },
                Err(err) => return Err(err),
            };
            entries.push(ModEntry {
                name: slug,
                version: version.name,
                md5: download.as_ref().map(|download| download.md5.clone()),
                url: download.map(|download| download.url),
            });
        }

        Ok(BuildManifest {
            minecraft,
            forge,
            java: build.min_java,
            memory: build.min_memory,
            mods: entries,
        })
    }

    async fn pack_manifest(&self, pack: Pack, releases: &mut Releases) -> Result<PackManifest> {
        let builds = self.store.builds.list(pack.id).await?;
        let name_of = |id: Option<Id>| -> Option<String> {
            let id = id?;
            builds.iter().find(|build| build.id == id).map(|build| build.name.clone())
        };
        let recommended = name_of(pack.recommended_id);
        let latest = name_of(pack.latest_id);

        let mut names = Vec::new();
        let mut summaries = Vec::new();
        for build in builds.iter().filter(|build| build.published) {
            names.push(build.name.clone());
            summaries.push(self.summary(build, releases).await?);
        }
        Ok(PackManifest {
            name: pack.slug,
            display_name: pack.name,
            url: pack.website,
            logo: pack.logo.as_ref().map(|logo| self.download(Category::Logo, logo)),
            recommended,
            latest,
            builds: names,
            build_summaries: summaries,
        })
    }

    async fn summary(&self, build: &Build, releases: &mut Releases) -> Result<BuildSummary> {
        Ok(BuildSummary {
            name: build.name.clone(),
            minecraft: self.minecraft(build.minecraft_id, releases).await?,
            forge: self.forge(build.forge_id, releases).await?,
        })
    }

    fn file(&self, version: &Version) -> Result<Download> {
        match &version.file {
            Some(file) => Ok(self.download(Category::File, file)),
            None => Err(Error::from(ErrorKind::PartialData(format!(
                "version {} of mod {} has no file",
                version.name, version.mod_id
            )))),
        }
    }

    async fn minecraft(&self, id: Option<Id>, releases: &mut Releases) -> Result<Option<String>> {
        let Some(id) = id else { return Ok(None) };
        if let Some(name) = releases.minecraft.get(&id) {
            return Ok(Some(name.clone()));
        }
        let release: Minecraft = self.store.minecrafts.by_id(id).await?;
        releases.minecraft.insert(id, release.name.clone());
        Ok(Some(release.name))
    }

    async fn forge(&self, id: Option<Id>, releases: &mut Releases) -> Result<Option<String>> {
        let Some(id) = id else { return Ok(None) };
        if let Some(name) = releases.forge.get(&id) {
            return Ok(Some(name.clone()));
        }
        let release: Forge = self.store.forges.by_id(id).await?;
        releases.forge.insert(id, release.name.clone());
        Ok(Some(release.name))
    }
}
