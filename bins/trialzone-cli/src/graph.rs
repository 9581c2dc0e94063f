use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use trialzone_config::ExperimentDoc;

/// Emits a Graphviz DOT file describing readers -> buffers -> delimiter/WRT
/// -> enhancers/collecters -> sink, without instantiating any reader,
/// enhancer, or sink (it just walks the parsed document).
pub fn run(experiment_path: &Path, graph_file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(experiment_path)
        .with_context(|| format!("failed to read '{}'", experiment_path.display()))?;
    let doc: ExperimentDoc = toml::from_str(&text).context("failed to parse config")?;

    let dot = render(&doc);
    std::fs::write(graph_file, dot).with_context(|| format!("failed to write '{}'", graph_file.display()))?;
    Ok(())
}

fn render(doc: &ExperimentDoc) -> String {
    let mut out = String::new();
    out.push_str("digraph trialzone {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"monospace\"];\n\n");

    for (name, reader) in &doc.readers {
        let reader_node = format!("reader_{}", sanitize(name));
        let buffer_node = format!("buf_{}", sanitize(name));
        writeln!(out, "  {reader_node} [label=\"{name}\\n({})\"];", reader.class).ok();
        writeln!(out, "  {buffer_node} [shape=ellipse, label=\"{name}\"];").ok();
        writeln!(out, "  {reader_node} -> {buffer_node};").ok();

        for extra in &reader.extra_buffers {
            let derived_node = format!("buf_{}", sanitize(&extra.name));
            let chain: Vec<&str> = extra.transformers.iter().map(|t| t.class.as_str()).collect();
            writeln!(
                out,
                "  {derived_node} [shape=ellipse, label=\"{}\"];",
                extra.name
            )
            .ok();
            writeln!(
                out,
                "  {buffer_node} -> {derived_node} [label=\"{}\"];",
                chain.join(" -> ")
            )
            .ok();
        }

        if let Some(sync) = &reader.sync {
            let role = if sync.is_reference { "reference" } else { "follower" };
            let source = match (&sync.buffer_name, &sync.reader_name) {
                (Some(buf), _) => format!("buf_{}", sanitize(buf)),
                (None, Some(other)) => format!("buf_{}", sanitize(other)),
                (None, None) => buffer_node.clone(),
            };
            writeln!(out, "  \"sync\" [shape=diamond, label=\"sync registry\"];").ok();
            writeln!(out, "  {source} -> \"sync\" [label=\"{role}\"];").ok();
        }
        out.push('\n');
    }

    let start_buf = format!("buf_{}", sanitize(&doc.trials.start_buffer));
    writeln!(
        out,
        "  delimiter [shape=diamond, label=\"delimiter\\nstart_value={}\"];",
        doc.trials.start_value
    )
    .ok();
    writeln!(out, "  {start_buf} -> delimiter;").ok();

    if let (Some(wrt_buf), Some(wrt_value)) = (&doc.trials.wrt_buffer, doc.trials.wrt_value) {
        let wrt_node = format!("buf_{}", sanitize(wrt_buf));
        writeln!(out, "  {wrt_node} -> delimiter [label=\"wrt={wrt_value}\"];").ok();
    }

    let mut previous = "delimiter".to_string();
    for (index, enhancer) in doc.trials.enhancers.iter().enumerate() {
        let node = format!("enhancer_{index}");
        writeln!(out, "  {node} [label=\"{}\"];", enhancer.class).ok();
        writeln!(out, "  {previous} -> {node};").ok();
        previous = node;
    }

    if !doc.trials.collecters.is_empty() {
        let classes: Vec<&str> = doc.trials.collecters.iter().map(|c| c.class.as_str()).collect();
        writeln!(out, "  collecters [label=\"{}\"];", classes.join("\\n")).ok();
        writeln!(out, "  {previous} -> collecters;").ok();
        previous = "collecters".to_string();
    }

    writeln!(out, "  sink [shape=cylinder, label=\"trial sink\"];").ok();
    writeln!(out, "  {previous} -> sink;").ok();

    out.push_str("}\n");
    out
}

/// Graphviz node IDs can't contain arbitrary characters; buffer/reader
/// names come straight from the TOML document, so normalize before using
/// them as identifiers.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use trialzone_config::{ReaderDoc, TrialsDoc};

    fn doc() -> ExperimentDoc {
        ExperimentDoc {
            experiment: toml::value::Table::new(),
            readers: {
                let mut m = BTreeMap::new();
                m.insert(
                    "delim".to_string(),
                    ReaderDoc {
                        class: "csv_numeric".to_string(),
                        package_path: None,
                        args: toml::value::Table::new(),
                        extra_buffers: Vec::new(),
                        sync: None,
                        simulate_delay: false,
                    },
                );
                m
            },
            trials: TrialsDoc {
                start_buffer: "delim".to_string(),
                start_value: 1010.0,
                wrt_buffer: None,
                wrt_value: None,
                enhancers: Vec::new(),
                collecters: Vec::new(),
            },
            plotters: Vec::new(),
        }
    }

    #[test]
    fn renders_a_reader_through_delimiter_to_sink() {
        let rendered = render(&doc());
        assert!(rendered.starts_with("digraph trialzone {"));
        assert!(rendered.contains("reader_delim -> buf_delim;"));
        assert!(rendered.contains("buf_delim -> delimiter;"));
        assert!(rendered.contains("delimiter -> sink;"));
    }
}
