use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::SubscriberBuilder;

use rearrange::api::{
    build_graph, draw_instance, layer_composition, optimal_sequence, Arrangement, BnbBackend,
    DepGraph, Instance, ObjectId, Placement, ReplayToken, ReturnPolicy, SampleCfg, SequenceCfg,
    SequencePlan,
};

mod provenance;

#[derive(Parser)]
#[command(name = "rearrange")]
#[command(about = "Rearrangement sequencing experiment runner")]
struct Cmd {
    /// Base RNG seed for instance sampling and layer compositions
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Sample a random instance and write it as JSON
    Gen {
        #[arg(long, default_value_t = 10)]
        num_objs: usize,
        #[arg(long, default_value_t = 0.3)]
        density: f64,
        #[arg(long)]
        out: String,
    },
    /// Sequence an instance file and print the action list
    Solve {
        #[arg(long)]
        input: String,
        #[arg(long, default_value_t = 1)]
        layers: usize,
        /// Defer buffered objects' goal placements to the end of the sequence
        #[arg(long)]
        defer_returns: bool,
        /// Per-component solver budget in milliseconds
        #[arg(long, default_value_t = 10_000)]
        time_limit_ms: u64,
        #[arg(long)]
        out: Option<String>,
    },
    /// Sequence a batch of seeded instances and write result rows as CSV
    Batch {
        #[arg(long, default_value_t = 20)]
        count: usize,
        #[arg(long, default_value_t = 10)]
        num_objs: usize,
        #[arg(long, default_value_t = 0.3)]
        density: f64,
        #[arg(long, default_value_t = 1)]
        layers: usize,
        #[arg(long, default_value_t = 10_000)]
        time_limit_ms: u64,
        #[arg(long)]
        out: String,
    },
    /// Aggregate a batch CSV
    Summarize {
        #[arg(long)]
        input: String,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Gen {
            num_objs,
            density,
            out,
        } => gen(num_objs, density, cmd.seed, out),
        Action::Solve {
            input,
            layers,
            defer_returns,
            time_limit_ms,
            out,
        } => solve(input, layers, defer_returns, time_limit_ms, cmd.seed, out),
        Action::Batch {
            count,
            num_objs,
            density,
            layers,
            time_limit_ms,
            out,
        } => batch(count, num_objs, density, layers, time_limit_ms, cmd.seed, out),
        Action::Summarize { input } => summarize(input),
        Action::Report => report(cmd.seed),
    }
}

/// On-disk instance format: centers indexed by object id.
#[derive(Serialize, Deserialize)]
struct InstanceFile {
    radius: f64,
    start: Vec<[f64; 2]>,
    goal: Vec<[f64; 2]>,
}

impl InstanceFile {
    fn from_instance(instance: &Instance) -> Self {
        let flatten = |arr: &Arrangement| arr.values().map(|p| [p.x, p.y]).collect();
        Self {
            radius: instance.radius,
            start: flatten(&instance.start),
            goal: flatten(&instance.goal),
        }
    }

    fn into_instance(self) -> Instance {
        let gather = |points: Vec<[f64; 2]>| -> Arrangement {
            points
                .into_iter()
                .enumerate()
                .map(|(i, [x, y])| (ObjectId(i), rearrange::Vec2::new(x, y)))
                .collect()
        };
        Instance {
            start: gather(self.start),
            goal: gather(self.goal),
            radius: self.radius,
        }
    }
}

fn gen(num_objs: usize, density: f64, seed: u64, out: String) -> Result<()> {
    let cfg = SampleCfg {
        num_objs,
        density,
        ..SampleCfg::default()
    };
    let instance = draw_instance(&cfg, ReplayToken::new(seed, 0))?;
    tracing::info!(num_objs, density, radius = instance.radius, "instance drawn");
    write_artifact(
        &out,
        &serde_json::to_vec_pretty(&InstanceFile::from_instance(&instance))?,
    )?;
    provenance::write_sidecar(
        &out,
        serde_json::json!({"num_objs": num_objs, "density": density, "seed": seed}),
    )?;
    Ok(())
}

fn run_instance(
    instance: &Instance,
    layers: usize,
    time_limit: Duration,
    defer_returns: bool,
    rng: &mut StdRng,
) -> Result<(DepGraph, SequencePlan)> {
    instance.validate()?;
    let sizes = layer_composition(rng, layers, instance.num_objects())?;
    let mut start = instance.start.clone();
    let dg = build_graph(&mut start, &instance.goal, instance.radius, &sizes)?;
    let mut cfg = SequenceCfg {
        return_policy: if defer_returns {
            ReturnPolicy::SequenceEnd
        } else {
            ReturnPolicy::ComponentEnd
        },
        ..SequenceCfg::default()
    };
    cfg.solve.time_limit = Some(time_limit);
    let plan = optimal_sequence(&dg, &BnbBackend, &cfg)?;
    Ok((dg, plan))
}

fn solve(
    input: String,
    layers: usize,
    defer_returns: bool,
    time_limit_ms: u64,
    seed: u64,
    out: Option<String>,
) -> Result<()> {
    let text =
        std::fs::read_to_string(&input).with_context(|| format!("reading instance {input}"))?;
    let file: InstanceFile = serde_json::from_str(&text)?;
    let instance = file.into_instance();
    let mut rng = StdRng::seed_from_u64(seed);
    let (dg, plan) = run_instance(
        &instance,
        layers,
        Duration::from_millis(time_limit_ms),
        defer_returns,
        &mut rng,
    )?;
    for action in &plan.actions {
        let kind = match action.placement {
            Placement::Buffer => 'b',
            Placement::Goal => 'g',
        };
        println!("({}, '{}')", action.node.0, kind);
    }
    tracing::info!(
        nodes = dg.node_count(),
        edges = dg.edge_count(),
        actions = plan.actions.len(),
        feedback = plan.feedback_total,
        degraded = plan.degraded,
        "sequenced"
    );
    if let Some(out) = out {
        let doc = serde_json::json!({
            "actions": plan.actions.iter().map(|a| {
                serde_json::json!({
                    "node": a.node.0,
                    "kind": match a.placement { Placement::Buffer => "buffer", Placement::Goal => "goal" },
                })
            }).collect::<Vec<_>>(),
            "feedback_total": plan.feedback_total,
            "degraded": plan.degraded,
        });
        write_artifact(&out, &serde_json::to_vec_pretty(&doc)?)?;
        provenance::write_sidecar(
            &out,
            serde_json::json!({"input": input, "layers": layers, "seed": seed}),
        )?;
    }
    Ok(())
}

fn batch(
    count: usize,
    num_objs: usize,
    density: f64,
    layers: usize,
    time_limit_ms: u64,
    seed: u64,
    out: String,
) -> Result<()> {
    let cfg = SampleCfg {
        num_objs,
        density,
        ..SampleCfg::default()
    };
    let mut csv = String::from("index,num_objs,density,layers,nodes,edges,feedback,actions,degraded,millis\n");
    for index in 0..count {
        let instance = draw_instance(&cfg, ReplayToken::new(seed, index as u64))?;
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
        let started = Instant::now();
        let (dg, plan) = run_instance(
            &instance,
            layers,
            Duration::from_millis(time_limit_ms),
            false,
            &mut rng,
        )?;
        let millis = started.elapsed().as_millis();
        writeln!(
            csv,
            "{index},{num_objs},{density},{layers},{},{},{},{},{},{millis}",
            dg.node_count(),
            dg.edge_count(),
            plan.feedback_total,
            plan.actions.len(),
            plan.degraded,
        )?;
        tracing::info!(
            index,
            feedback = plan.feedback_total,
            millis = millis as u64,
            "batch run done"
        );
    }
    write_artifact(&out, csv.as_bytes())?;
    provenance::write_sidecar(
        &out,
        serde_json::json!({
            "count": count, "num_objs": num_objs, "density": density,
            "layers": layers, "seed": seed
        }),
    )?;
    Ok(())
}

fn summarize(input: String) -> Result<()> {
    let lf = LazyCsvReader::new(&input)
        .with_infer_schema_length(Some(100))
        .finish()?;
    let df = lf
        .select([
            col("feedback").mean().alias("mean_feedback"),
            col("feedback").max().alias("max_feedback"),
            col("actions").mean().alias("mean_actions"),
            col("millis").mean().alias("mean_millis"),
        ])
        .collect()?;
    println!("{df}");
    Ok(())
}

fn report(seed: u64) -> Result<()> {
    let doc = serde_json::json!({
        "code_rev": provenance::current_git_rev(),
        "version": rearrange::VERSION,
        "params": {"seed": seed},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn write_artifact(out: &str, bytes: &[u8]) -> Result<()> {
    let path = Path::new(out);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("writing {out}"))?;
    Ok(())
}
