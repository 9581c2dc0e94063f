#![forbid(unsafe_code)]

//! The declarative experiment descriptor: TOML document schema, static
//! class registry, and CLI-flag override merging. Loading a document here
//! is the single place that turns a user-authored TOML file into a fully
//! wired `Router`/`SyncRegistry`/`Extractor`/collecter set; everything
//! downstream (`trialzone-driver`) only ever sees already-built domain
//! objects.

mod args;
mod doc;
mod error;
mod overrides;
mod registry;

use std::collections::HashMap;
use std::path::Path;

use trialzone_core::{BufferId, BufferKind};
use trialzone_enhance::{Collecter, Enhancer, EnhancerPipeline};
use trialzone_extract::{Extractor, ExtractorConfig, WrtConfig};
use trialzone_readers::{DerivedEntry, Router, RouterEntry};
use trialzone_sync::SyncRegistry;
use trialzone_transform::Pipeline;

pub use doc::{ComponentDoc, ExperimentDoc, ExtraBufferDoc, PlotterDoc, ReaderDoc, SyncDoc, TransformerDoc, TrialsDoc};
pub use error::ConfigError;
pub use overrides::apply_overrides;
pub use registry::{build_collecter, build_enhancer, build_reader, build_sync, build_transformer};

/// Everything a driver needs to run one experiment: the wired router, the
/// sync registry it reads offsets from, the trial extractor, and the
/// collecters that run once at end-of-stream. `experiment` carries the
/// document's free-form `experiment` table through unaltered, for sinks and
/// enhancers that want it.
pub struct Experiment {
    pub experiment: toml::value::Table,
    pub router: Router,
    pub sync: SyncRegistry,
    pub extractor: Extractor,
    pub collecters: Vec<Box<dyn Collecter>>,
    /// Set when any reader declared `simulate_delay = true`. Only consulted
    /// by the driver in `gui` mode, where it paces emission to real time.
    pub gui_paced: bool,
}

/// Parses, overrides, and fully constructs an experiment from a TOML
/// descriptor. Every failure here is reported before any reader opens.
pub fn load_experiment(
    path: impl AsRef<Path>,
    subject: Option<&Path>,
    reader_overrides: &[String],
    search_path: Option<&Path>,
) -> Result<Experiment, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut document: ExperimentDoc = toml::from_str(&text)?;
    apply_overrides(&mut document, subject, reader_overrides)?;
    build_experiment(document, search_path)
}

fn build_experiment(document: ExperimentDoc, search_path: Option<&Path>) -> Result<Experiment, ConfigError> {
    let mut router = Router::new();
    let mut buffer_kinds: HashMap<String, BufferKind> = HashMap::new();
    let mut sync_descriptors = HashMap::new();
    let mut gui_paced = false;

    for (name, reader_doc) in &document.readers {
        gui_paced |= reader_doc.simulate_delay;
        let (reader, primary) = build_reader(name, reader_doc, search_path)?;
        buffer_kinds.insert(primary.name().to_string(), primary.kind());

        let mut derived = Vec::new();
        for extra in &reader_doc.extra_buffers {
            let mut pipeline = Pipeline::default();
            for transformer_doc in &extra.transformers {
                pipeline.push(build_transformer(transformer_doc)?);
            }
            let buffer = registry::build_derived_buffer(&extra.name, &extra.transformers);
            buffer_kinds.insert(buffer.name().to_string(), buffer.kind());
            derived.push(DerivedEntry { pipeline, buffer });
        }

        if let Some(sync_doc) = &reader_doc.sync {
            sync_descriptors.insert(name.clone(), build_sync(name, sync_doc)?);
        }

        router.add_reader(RouterEntry::new(reader, primary, derived));
    }

    let sync = SyncRegistry::new(sync_descriptors)?;

    let start_buffer = resolve_buffer_id(&buffer_kinds, &document.trials.start_buffer)?;
    let wrt = match (&document.trials.wrt_buffer, document.trials.wrt_value) {
        (Some(name), Some(value)) => Some(WrtConfig {
            buffer: resolve_buffer_id(&buffer_kinds, name)?,
            column: 0,
            value,
        }),
        _ => None,
    };

    let mut enhancer_stages: Vec<Box<dyn Enhancer>> = Vec::new();
    for component in &document.trials.enhancers {
        enhancer_stages.push(build_enhancer(component)?);
    }
    let mut collecters: Vec<Box<dyn Collecter>> = Vec::new();
    for component in &document.trials.collecters {
        collecters.push(build_collecter(component)?);
    }

    let extractor_config = ExtractorConfig {
        start_buffer,
        start_column: 0,
        start_value: document.trials.start_value,
        wrt,
    };
    let extractor = Extractor::new(extractor_config, EnhancerPipeline::new(enhancer_stages));

    Ok(Experiment {
        experiment: document.experiment,
        router,
        sync,
        extractor,
        collecters,
        gui_paced,
    })
}

fn resolve_buffer_id(buffer_kinds: &HashMap<String, BufferKind>, name: &str) -> Result<BufferId, ConfigError> {
    let kind = buffer_kinds
        .get(name)
        .copied()
        .ok_or_else(|| ConfigError::UnknownBuffer { name: name.to_string() })?;
    Ok(BufferId::new(kind, name))
}
