use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Context as _;
use pulldown_cmark::{Options, Parser, html};
use serde::{Deserialize, Serialize};

/// Blog slugs map to fixed filenames under `posts/`; the mapping is a table,
/// not derived from the slug.
const POST_FILES: &[(&str, &str)] = &[
    ("mirissa-whale-season", "whale-season.md"),
    ("ella-by-train", "ella-train.md"),
    ("street-food-colombo", "colombo-food.md"),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    pub vehicle_type: String,
    pub passengers: i64,
    pub price_per_day: f64,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tour {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub duration_days: u32,
    pub price: f64,
    pub rating: f64,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

/// One fully replaceable FAQ unit; the admin edits whole categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaqCategory {
    pub category: String,
    pub items: Vec<FaqItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostMeta {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub category: String,
}

/// The deploy-time site document (`site.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDocument {
    pub site: serde_json::Value,
    pub fleet: Vec<Vehicle>,
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub destination_categories: BTreeMap<String, String>,
    pub tours: Vec<Tour>,
    pub faq: Vec<FaqCategory>,
    pub posts: Vec<PostMeta>,
}

/// Immutable view of the content directory, loaded once and swapped on
/// explicit reload rather than re-read per request.
#[derive(Debug)]
pub struct Snapshot {
    pub document: SiteDocument,
    post_bodies: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn post_body(&self, slug: &str) -> Option<&str> {
        self.post_bodies.get(slug).map(String::as_str)
    }

    pub fn category_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.document
            .destination_categories
            .get(id)
            .map(String::as_str)
            .unwrap_or(id)
    }
}

#[derive(Debug)]
pub struct ContentStore {
    dir: PathBuf,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl ContentStore {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        let snapshot = Arc::new(load_snapshot(&dir)?);
        Ok(Self {
            dir,
            snapshot: RwLock::new(snapshot),
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().expect("content snapshot lock"))
    }

    /// Rebuilds the snapshot from disk and swaps it in.
    pub fn reload(&self) -> anyhow::Result<()> {
        let fresh = Arc::new(load_snapshot(&self.dir)?);
        *self.snapshot.write().expect("content snapshot lock") = fresh;
        Ok(())
    }

    /// Replaces the destinations section of `site.json` wholesale and
    /// reloads. This is the admin's file-replace path for the JSON-only
    /// domain; there is no per-field patch.
    pub fn overwrite_destinations(&self, destinations: Vec<Destination>) -> anyhow::Result<()> {
        let path = self.dir.join("site.json");
        let mut document = self.snapshot().document.clone();
        document.destinations = destinations;
        write_json_atomic(&path, &document)?;
        self.reload()
    }
}

fn load_snapshot(dir: &Path) -> anyhow::Result<Snapshot> {
    let site_path = dir.join("site.json");
    let raw = std::fs::read(&site_path)
        .with_context(|| format!("read site document: {}", site_path.display()))?;
    let document: SiteDocument = serde_json::from_slice(&raw)
        .with_context(|| format!("parse site document: {}", site_path.display()))?;

    let mut post_bodies = BTreeMap::new();
    for &(slug, file) in POST_FILES {
        let path = dir.join("posts").join(file);
        match std::fs::read_to_string(&path) {
            Ok(body) => {
                post_bodies.insert(slug.to_string(), body);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(slug, path = %path.display(), "post body missing");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read post body: {}", path.display()));
            }
        }
    }

    Ok(Snapshot {
        document,
        post_bodies,
    })
}

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    std::fs::write(&tmp_path, &data)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}
