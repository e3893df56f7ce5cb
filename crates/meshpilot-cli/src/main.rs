//! meshpilot CLI - navigation mesh inspection and path queries.
//!
//! - `meshpilot graph <scene>` - build the adjacency graph and print it
//! - `meshpilot path <scene> --from x,y --to x,y` - run a path query

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meshpilot::geom::Vec2;
use meshpilot::nav::{AgentId, Algorithm};
use meshpilot_cli::{GraphReport, PathReport, Scene};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "meshpilot")]
#[command(about = "Navigation mesh pathfinding", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the navigation graph for a scene and print it
    Graph {
        /// Scene file (YAML)
        scene: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Find a path between two points
    Path {
        /// Scene file (YAML)
        scene: PathBuf,

        /// Start point, `x,y`
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: Vec2,

        /// Goal point, `x,y`
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: Vec2,

        /// Search algorithm (a*, dijkstra, bfs, dfs); defaults to the scene config
        #[arg(short, long)]
        algorithm: Option<String>,

        /// Plan as an agent with this scene profile
        #[arg(short, long)]
        profile: Option<String>,

        /// Override the iteration budget
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Return nothing instead of a partial path when the goal is unreachable
        #[arg(long)]
        no_partial: bool,

        /// Shortcut waypoints joined by a direct edge
        #[arg(long)]
        smooth: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn parse_point(s: &str) -> std::result::Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate `{v}`: {e}"))
    };
    Ok(Vec2::new(parse(x)?, parse(y)?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    if cli.log_json {
        fmt().json().with_env_filter(filter).with_target(false).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    match cli.command {
        Commands::Graph { scene, json } => show_graph(&scene, json),
        Commands::Path {
            scene,
            from,
            to,
            algorithm,
            profile,
            max_iterations,
            no_partial,
            smooth,
            json,
        } => {
            let options = PathOptions {
                algorithm: algorithm.as_deref().map(str::parse::<Algorithm>).transpose()?,
                profile,
                max_iterations,
                partial: !no_partial,
                smooth,
            };
            find_path(&scene, from, to, options, json)
        }
    }
}

fn show_graph(path: &Path, json: bool) -> Result<()> {
    let scene = Scene::load(path)?;
    let (mesh, _) = scene.build()?;
    let graph = mesh.graph().context("Scene produced no graph")?;
    let report = GraphReport::new(&mesh, graph);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

struct PathOptions {
    algorithm: Option<Algorithm>,
    profile: Option<String>,
    max_iterations: Option<usize>,
    partial: bool,
    smooth: bool,
}

fn find_path(path: &Path, from: Vec2, to: Vec2, options: PathOptions, json: bool) -> Result<()> {
    let mut scene = Scene::load(path)?;
    if let Some(algorithm) = options.algorithm {
        scene.config.search.algorithm = algorithm;
    }
    if let Some(max) = options.max_iterations {
        scene.config.search.max_iterations = max;
    }
    scene.config.search.partial_path = options.partial;
    scene.config.search.smooth_path |= options.smooth;

    let (mut mesh, _) = scene.build()?;
    tracing::info!(from = ?from, to = ?to, algorithm = %scene.config.search.algorithm, "Path query");

    let result = match &options.profile {
        Some(profile) => {
            let agent = mesh
                .create_agent(AgentId::new("cli"), profile, from)
                .with_context(|| format!("Failed to create agent with profile `{profile}`"))?;
            mesh.set_agent_target(&agent, to, options.partial)?
        }
        None => mesh.find_path(from, to)?,
    };

    let report = PathReport {
        algorithm: scene.config.search.algorithm.to_string(),
        profile: options.profile,
        result,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    if !report.result.complete {
        tracing::warn!(nodes = report.result.nodes.len(), "Goal not reached");
    }
    Ok(())
}
