//! Variable Reordering Example
//!
//! This example demonstrates explicit variable orders and the dynamic
//! reordering heuristics on the classic pairs function
//! `(x1 ∧ y1) ∨ (x2 ∧ y2) ∨ ... ∨ (xn ∧ yn)`, whose size is linear when
//! every `xi` sits next to its `yi` and exponential when all `x` come first.
//!
//! Key features demonstrated:
//! - Querying and setting the variable order
//! - Every reordering method, with statistics
//! - Variable groups that move as a unit
//! - Automatic reordering between operations
//!
//! Run with:
//! ```bash
//! cargo run --example reordering -- --pairs 6
//! ```

use clap::Parser;

use dd_rs::config::ManagerConfig;
use dd_rs::handle::Bdd;
use dd_rs::manager::Manager;
use dd_rs::order::GroupKind;
use dd_rs::reorder::ReorderMethod;
use dd_rs::types::Var;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of `(x ∧ y)` pairs.
    #[arg(long, value_name = "INT", default_value = "5")]
    pairs: usize,

    /// Seed for the randomized heuristics.
    #[arg(long, value_name = "INT", default_value = "1")]
    seed: u64,

    /// Show engine logs at debug level.
    #[arg(short, long)]
    verbose: bool,
}

/// Builds the pairs function with `xi = var(i)` and `yi = var(n + i)`, so
/// the identity order separates every pair.
fn separated_pairs(mgr: &Manager, n: usize) -> color_eyre::Result<Bdd> {
    let mut f = mgr.zero();
    for i in 0..n {
        let x = mgr.var(i as u32)?;
        let y = mgr.var((n + i) as u32)?;
        f = mgr.or(&f, &mgr.and(&x, &y)?)?;
    }
    Ok(f)
}

fn interleaved(n: usize) -> Vec<Var> {
    (0..n).flat_map(|i| [Var::new(i as u32), Var::new((n + i) as u32)]).collect()
}

fn example_1_ordering_impact(args: &Cli) -> color_eyre::Result<()> {
    println!("Example 1: Variable Ordering Impact");
    println!("=====================================");

    let mgr = Manager::new(2 * args.pairs, 0, None);
    let f = separated_pairs(&mgr, args.pairs)?;
    println!("Separated order {}", mgr.order_string());
    println!("  Size: {} nodes", f.size());

    mgr.set_order(&interleaved(args.pairs))?;
    println!("Interleaved order {}", mgr.order_string());
    println!("  Size: {} nodes", f.size());
    Ok(())
}

fn example_2_methods(args: &Cli) -> color_eyre::Result<()> {
    println!("Example 2: Reordering Methods");
    println!("==============================");

    let methods = [
        ReorderMethod::Sift,
        ReorderMethod::SiftConverge,
        ReorderMethod::Window2,
        ReorderMethod::Window3,
        ReorderMethod::Random,
        ReorderMethod::Genetic,
        ReorderMethod::Exact,
    ];
    for method in methods {
        if method == ReorderMethod::Exact && 2 * args.pairs > dd_rs::reorder::EXACT_MAX_BLOCKS {
            println!("  {:?}: skipped, more than {} variables", method, dd_rs::reorder::EXACT_MAX_BLOCKS);
            continue;
        }
        let mgr = Manager::with_config(ManagerConfig::default().with_vars(2 * args.pairs).with_seed(args.seed));
        let f = separated_pairs(&mgr, args.pairs)?;
        let stats = mgr.reorder(method)?;
        println!(
            "  {:?}: {} -> {} nodes ({:.1}% smaller, {} swaps, {:.3} ms), f has {} nodes",
            method,
            stats.initial_size,
            stats.final_size,
            stats.reduction_percent(),
            stats.swaps,
            stats.elapsed.as_secs_f64() * 1000.0,
            f.size(),
        );
    }
    Ok(())
}

fn example_3_groups(args: &Cli) -> color_eyre::Result<()> {
    println!("Example 3: Variable Groups");
    println!("===========================");

    let mgr = Manager::new(2 * args.pairs, 0, None);
    let f = separated_pairs(&mgr, args.pairs)?;
    // Freeze the x block: sifting may move it, but not split or permute it.
    mgr.make_group(Var::new(0), args.pairs, GroupKind::Fixed)?;
    let stats = mgr.reorder(ReorderMethod::Sift)?;
    println!("Groups: {:?}", mgr.groups());
    println!("Order after sifting: {}", mgr.order_string());
    println!("  Size: {} -> {} nodes (f has {})", stats.initial_size, stats.final_size, f.size());
    Ok(())
}

fn example_4_auto_reorder(args: &Cli) -> color_eyre::Result<()> {
    println!("Example 4: Automatic Reordering");
    println!("================================");

    let mut config = ManagerConfig::default()
        .with_vars(2 * args.pairs)
        .with_auto_reorder(ReorderMethod::Sift)
        .with_reorder_threshold(16);
    config.report_reordering = true;
    let mgr = Manager::with_config(config);
    let f = separated_pairs(&mgr, args.pairs)?;
    println!("Automatic reorderings so far: {}", mgr.auto_reorderings());
    println!("Next threshold: {} live nodes", mgr.next_reorder_threshold());
    println!("Order {}", mgr.order_string());
    println!("  Size: {} nodes", f.size());

    let cubes = mgr.cubes(&f)?.count();
    println!("  {} cubes, {} minterms", cubes, mgr.sat_count(&f, 2 * args.pairs)?);
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("=== Variable Reordering Example ===\n");

    example_1_ordering_impact(&args)?;
    println!();

    example_2_methods(&args)?;
    println!();

    example_3_groups(&args)?;
    println!();

    example_4_auto_reorder(&args)?;

    Ok(())
}
