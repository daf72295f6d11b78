//! CLI command implementations.

use colored::Colorize;
use grove_analysis::{
    analyze as run_analysis, execution_order, export_graph, file_neighbors, rank_components,
    summarize, AnalysisReport, AnalysisSession, GroveConfig, HashingEmbedder, LocalDirectory,
    OutlineSummarizer,
};
use grove_graph::{DotRenderer, Metric};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Write the default config.
pub fn init(path: &Path) -> Result<()> {
    let config_path = GroveConfig::path(path);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    GroveConfig::default().save(path)?;

    println!("{} Initialized Grove in {}", "✓".green(), path.display());
    println!("  Run {} to build the component graph", "grove analyze".cyan());

    Ok(())
}

/// Build, rank and render the component graph.
pub fn analyze(path: &Path, output: Option<&Path>, json: bool) -> Result<()> {
    let mut session = open_session(path)?;
    let report = with_spinner("Building component graph...", || {
        run_analysis(&mut session, &DotRenderer::new())
    });

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} Analyzed {} files ({} functions, {} classes) in {}ms",
        "✓".green(),
        report.source_files.to_string().cyan(),
        report.functions.to_string().cyan(),
        report.classes.to_string().cyan(),
        report.duration_ms
    );

    if let Some(component) = &report.component {
        let stats = component.graph.stats();
        println!(
            "  {} {} mode, {} nodes, {} edges",
            "Graph:".dimmed(),
            component.mode,
            stats.node_count,
            stats.edge_count
        );
        if !component.removed_edges.is_empty() {
            println!(
                "  {} {} edges removed to break cycles",
                "Cycles:".dimmed(),
                component.removed_edges.len()
            );
        }
    }

    if !report.ranking.is_empty() {
        println!("\n{}", "Representative components:".cyan().bold());
        for (i, node) in report.ranking.iter().enumerate() {
            println!(
                "  {:>2}. {} {}",
                i + 1,
                node.id,
                format!("({:.3})", node.score).dimmed()
            );
        }
    }

    if let Some(bytes) = &report.rendered {
        let target = match output {
            Some(p) => p.to_path_buf(),
            None => {
                let config = session.config();
                config.output_dir(path).join(&config.output.graph_file)
            }
        };
        write_output(&target, bytes)?;
    }

    print_failures(&report);
    Ok(())
}

/// Build the file k-NN graph.
pub fn neighbors(path: &Path, k: Option<usize>, metric: Option<&str>) -> Result<()> {
    let mut config = GroveConfig::load(path)?;
    if let Some(k) = k {
        config.neighbors.k = k;
    }
    if let Some(metric) = metric {
        config.neighbors.metric = metric.parse::<Metric>()?;
    }

    let session = open_session_with(path, config)?;
    let embedder = HashingEmbedder::new(session.config().embedding.dimensions)?;
    let graph = with_spinner("Embedding files...", || file_neighbors(&session, &embedder))?;

    println!(
        "{} {} files, {} neighbor edges ({})",
        "✓".green(),
        graph.node_count().to_string().cyan(),
        graph.edge_count().to_string().cyan(),
        session.config().neighbors.metric
    );
    for file in graph.labels() {
        let neighbors = graph.successors(file);
        println!("  {} {} {}", file, "→".dimmed(), neighbors.join(", "));
    }

    Ok(())
}

/// Show the most central components.
pub fn rank(path: &Path, top: Option<usize>) -> Result<()> {
    let mut session = open_session(path)?;
    let top_n = top.unwrap_or(session.config().ranking.top_n);
    let ranked = with_spinner("Ranking components...", || {
        rank_components(&mut session, top_n)
    })?;

    for (i, node) in ranked.iter().enumerate() {
        println!(
            "  {:>2}. {} {}",
            i + 1,
            node.id.cyan(),
            format!("({:.3})", node.score).dimmed()
        );
    }
    Ok(())
}

/// Print the file execution order.
pub fn sequence(path: &Path) -> Result<()> {
    let mut session = open_session(path)?;
    let order = with_spinner("Ordering files...", || execution_order(&mut session))?;

    println!("{} Execution order ({} files):", "✓".green(), order.len());
    for (i, file) in order.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, file);
    }
    Ok(())
}

/// Summarize files and write the block diagram.
pub fn summary(path: &Path) -> Result<()> {
    let mut session = open_session(path)?;
    let result = with_spinner("Summarizing files...", || {
        summarize(&mut session, &OutlineSummarizer)
    })?;

    println!(
        "{} {}",
        "Execution order:".cyan().bold(),
        result.execution_order.join(" → ")
    );
    for file in &result.execution_order {
        if let Some(text) = result.summary_for(file) {
            println!("\n{}", file.bold());
            println!("{}", text);
        }
    }
    for (file, reason) in &result.failures {
        println!("  {} {} - {}", "⚠".yellow(), file.red(), reason);
    }

    let config = session.config();
    let target = config.output_dir(path).join(&config.output.diagram_file);
    write_output(&target, result.diagram.as_bytes())?;
    Ok(())
}

/// Export the component graph to JSON.
pub fn export(path: &Path, output: &Path) -> Result<()> {
    let mut session = open_session(path)?;
    let export = with_spinner("Exporting graph...", || export_graph(&mut session, output))?;

    println!(
        "{} Exported {} nodes and {} edges to {}",
        "✓".green(),
        export.nodes.len().to_string().cyan(),
        export.edges.len().to_string().cyan(),
        output.display()
    );
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn open_session(path: &Path) -> Result<AnalysisSession> {
    let config = GroveConfig::load(path)?;
    open_session_with(path, config)
}

fn open_session_with(path: &Path, config: GroveConfig) -> Result<AnalysisSession> {
    let source = LocalDirectory::new(path).with_ignore(config.ignore.clone());
    let session = with_spinner("Scanning files...", || {
        AnalysisSession::open(&source, config)
    })?;
    Ok(session)
}

fn with_spinner<T>(message: &'static str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message);

    let result = f();

    spinner.finish_and_clear();
    result
}

fn write_output(target: &Path, bytes: &[u8]) -> Result<()> {
    grove_analysis::write_output(target, bytes)?;
    println!("{} Wrote {}", "✓".green(), target.display());
    Ok(())
}

fn print_failures(report: &AnalysisReport) {
    if report.failures.is_empty() {
        return;
    }

    println!("\n{} {} failures:", "⚠".yellow(), report.failures.len());
    for failure in report.failures.iter().take(5) {
        match &failure.subject {
            Some(file) => println!("  [{}] {} - {}", failure.stage, file.red(), failure.message),
            None => println!("  [{}] {}", failure.stage, failure.message),
        }
    }
    if report.failures.len() > 5 {
        println!("  ... and {} more", report.failures.len() - 5);
    }
}
