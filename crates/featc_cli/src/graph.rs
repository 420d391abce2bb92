//! `featc graph` — print the module dependency graph and compile order.

use featc_graph::{detect_cycles, resolve_order, DependencyGraph, ModuleRegistry};
use serde::Serialize;

use crate::pipeline::{load_project, load_sources};
use crate::{GlobalArgs, GraphArgs, ReportFormat};

/// One module in the JSON report.
#[derive(Debug, Serialize)]
struct ModuleReport {
    name: String,
    dependencies: Vec<String>,
    dependents: Vec<String>,
}

/// The JSON report.
#[derive(Debug, Serialize)]
struct GraphReport {
    modules: Vec<ModuleReport>,
    /// Dependencies-first build order; empty when cycles exist.
    build_order: Vec<String>,
    cycles: Vec<String>,
}

/// Runs the `featc graph` command.
///
/// Returns exit code 1 when the graph has cycles.
pub fn run(args: &GraphArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;
    let units = load_sources(&project_dir, &config)?;

    let registry = ModuleRegistry::from_parsed(units.into_iter().map(|u| u.parsed))?;
    let graph = DependencyGraph::build(&registry)?;
    let report = describe(&graph);

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print_text(&report),
    }

    Ok(if report.cycles.is_empty() { 0 } else { 1 })
}

fn describe(graph: &DependencyGraph) -> GraphReport {
    let modules = graph
        .nodes()
        .map(|name| ModuleReport {
            name: name.to_string(),
            dependencies: graph.dependencies_of(name).map(str::to_string).collect(),
            dependents: graph.dependents_of(name).map(str::to_string).collect(),
        })
        .collect();
    let cycles: Vec<String> = detect_cycles(graph).into_iter().map(|c| c.message).collect();
    let build_order = resolve_order(graph).iter().rev().cloned().collect();
    GraphReport {
        modules,
        build_order,
        cycles,
    }
}

fn print_text(report: &GraphReport) {
    for module in &report.modules {
        if module.dependencies.is_empty() {
            println!("{}", module.name);
        } else {
            println!("{} -> {}", module.name, module.dependencies.join(", "));
        }
    }
    if report.cycles.is_empty() {
        println!();
        println!("build order: {}", report.build_order.join(", "));
    }
    for cycle in &report.cycles {
        eprintln!("error: {cycle}");
    }
}
