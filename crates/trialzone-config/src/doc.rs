use std::collections::BTreeMap;

use serde::Deserialize;

/// The declarative experiment descriptor. `args` bags stay `toml::Value`
/// tables: each component class validates its own bag against a schema at
/// construction time, rather than one `serde` struct trying to model every
/// class.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentDoc {
    #[serde(default)]
    pub experiment: toml::value::Table,
    pub readers: BTreeMap<String, ReaderDoc>,
    pub trials: TrialsDoc,
    #[serde(default)]
    pub plotters: Vec<PlotterDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaderDoc {
    pub class: String,
    #[serde(default)]
    pub package_path: Option<String>,
    #[serde(default)]
    pub args: toml::value::Table,
    #[serde(default)]
    pub extra_buffers: Vec<ExtraBufferDoc>,
    #[serde(default)]
    pub sync: Option<SyncDoc>,
    #[serde(default)]
    pub simulate_delay: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraBufferDoc {
    /// Name of the derived buffer this pipeline writes into. Must be
    /// distinct from the reader's primary buffer name and from any other
    /// derived buffer, since the router addresses buffers by name alone.
    pub name: String,
    pub reader_result_name: String,
    pub transformers: Vec<TransformerDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformerDoc {
    pub class: String,
    #[serde(default)]
    pub args: toml::value::Table,
}

/// `sync` entry: either `buffer_name` (this reader owns a sync descriptor)
/// or `reader_name` (inherits another reader's), never both.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncDoc {
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub buffer_name: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub reader_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrialsDoc {
    pub start_buffer: String,
    pub start_value: f64,
    #[serde(default)]
    pub wrt_buffer: Option<String>,
    #[serde(default)]
    pub wrt_value: Option<f64>,
    #[serde(default)]
    pub enhancers: Vec<ComponentDoc>,
    #[serde(default)]
    pub collecters: Vec<ComponentDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDoc {
    pub class: String,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub args: toml::value::Table,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlotterDoc {
    pub class: String,
    #[serde(default)]
    pub package_path: Option<String>,
    #[serde(default)]
    pub args: toml::value::Table,
}
