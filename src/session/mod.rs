//! The single-operator labeling session.
//!
//! A [`Session`] is the context object every operation runs against: it owns
//! the label catalog, the annotation store, the resolver chain and the HTTP
//! client, and holds at most one active [`Image`].
//!
//! ```text
//! Idle --load--> Loaded --commit--> Idle
//!                  |  ^
//!                  +--+ load (replaces the active image)
//! ```
//!
//! Loads follow last-load-wins: each [`Session::begin_load`] issues a fresh
//! [`LoadTicket`], and [`Session::finish_load`] drops any result whose ticket
//! has been superseded.

use crate::catalog::{Label, LabelCatalog};
use crate::config::Config;
use crate::error::DroplabelError;
use crate::fetch::{self, Image};
use crate::http::HttpClient;
use crate::resolve::Resolver;
use crate::source::{self, Reference};
use crate::store::{AnnotationRecord, AnnotationStore};

/// Where the session is in its load/commit cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No active image; only a load is meaningful.
    Idle,
    /// An image is waiting for labels.
    Loaded,
}

/// Identifies one load request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// What happened to a finished load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image became the active image.
    Loaded,
    /// A newer load was started meanwhile; the result was discarded.
    Superseded,
}

pub struct Session {
    catalog: LabelCatalog,
    store: AnnotationStore,
    resolver: Resolver,
    http: Box<dyn HttpClient>,
    active: Option<Image>,
    generation: u64,
}

impl Session {
    pub fn new(catalog: LabelCatalog, store: AnnotationStore, http: Box<dyn HttpClient>) -> Self {
        Self {
            catalog,
            store,
            resolver: Resolver::default(),
            http,
            active: None,
            generation: 0,
        }
    }

    /// Opens the catalog and store described by `config`, publishes the
    /// output directory, and connects a real HTTP client.
    pub fn open(config: &Config) -> Result<Self, DroplabelError> {
        let catalog = LabelCatalog::load(&config.labels_path)?;
        let store = AnnotationStore::open(&config.output_dir, &config.annotations_path)?
            .with_jpeg_quality(config.jpeg_quality);
        store.publish_output_dir(&config.folder_path_file)?;
        Ok(Self::new(catalog, store, Box::new(config.http_client())))
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Loaded
        } else {
            SessionState::Idle
        }
    }

    pub fn active_image(&self) -> Option<&Image> {
        self.active.as_ref()
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn add_label(&mut self, raw: &str) -> Result<Label, DroplabelError> {
        self.catalog.add(raw)
    }

    /// Classifies, resolves and fetches `raw` without touching session state.
    pub fn prepare(&self, raw: &str) -> Result<Image, DroplabelError> {
        load_image(raw, &self.resolver, self.http.as_ref())
    }

    /// Starts a load: the active image is discarded and earlier tickets
    /// become stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.active = None;
        LoadTicket(self.generation)
    }

    /// Completes the load identified by `ticket`.
    ///
    /// Stale results are dropped regardless of success. A failed current
    /// load leaves the session idle.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Image, DroplabelError>,
    ) -> Result<LoadOutcome, DroplabelError> {
        if ticket.0 != self.generation {
            tracing::debug!(ticket = ticket.0, current = self.generation, "discarding stale load");
            return Ok(LoadOutcome::Superseded);
        }
        let image = result?;
        tracing::info!(
            source = %image.provenance(),
            width = image.width(),
            height = image.height(),
            "loaded image"
        );
        self.active = Some(image);
        Ok(LoadOutcome::Loaded)
    }

    /// Loads `raw` synchronously, replacing any active image.
    pub fn load(&mut self, raw: &str) -> Result<&Image, DroplabelError> {
        let ticket = self.begin_load();
        let result = self.prepare(raw);
        self.finish_load(ticket, result)?;
        self.active.as_ref().ok_or(DroplabelError::NoImageLoaded)
    }

    /// Saves the active image with the selected catalog labels.
    ///
    /// On success the session returns to idle. On any failure the image
    /// stays loaded so the operator can retry.
    pub fn commit<S: AsRef<str>>(&mut self, selected: &[S]) -> Result<AnnotationRecord, DroplabelError> {
        let image = self.active.as_ref().ok_or(DroplabelError::NoImageLoaded)?;
        let names: Vec<&str> = selected
            .iter()
            .map(|name| name.as_ref().trim())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Err(DroplabelError::NoLabelsSelected);
        }

        let labels = names
            .into_iter()
            .map(|name| {
                self.catalog
                    .get(name)
                    .cloned()
                    .ok_or_else(|| DroplabelError::UnknownLabel(name.to_string()))
            })
            .collect::<Result<Vec<Label>, _>>()?;

        let record = self.store.commit(image, &labels)?;
        self.active = None;
        Ok(record)
    }
}

/// Runs the full classify, resolve and fetch pipeline for one raw payload.
pub fn load_image(
    raw: &str,
    resolver: &Resolver,
    http: &dyn HttpClient,
) -> Result<Image, DroplabelError> {
    let reference = source::classify(raw);
    tracing::debug!(%reference, "classified input");

    match &reference {
        Reference::Unresolvable => Err(DroplabelError::Unresolvable {
            input: raw.to_string(),
        }),
        Reference::LocalFile(_) => fetch::fetch(&reference, None, http),
        Reference::RemoteUrl(url) => {
            let resolution = resolver.resolve(url, http);
            fetch::fetch(&reference, Some(resolution.url.as_str()), http)
        }
    }
}
