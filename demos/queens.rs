use clap::{Parser, ValueEnum};

use dd_rs::config::ManagerConfig;
use dd_rs::handle::Bdd;
use dd_rs::manager::Manager;
use dd_rs::reorder::ReorderMethod;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Method {
    Sift,
    SiftConverge,
    Window2,
    Window3,
    Random,
    Genetic,
}

impl From<Method> for ReorderMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Sift => ReorderMethod::Sift,
            Method::SiftConverge => ReorderMethod::SiftConverge,
            Method::Window2 => ReorderMethod::Window2,
            Method::Window3 => ReorderMethod::Window3,
            Method::Random => ReorderMethod::Random,
            Method::Genetic => ReorderMethod::Genetic,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of queens.
    #[arg(value_name = "INT", default_value = "8")]
    n: usize,

    /// Unique-table buckets per variable (in bits).
    #[clap(long, value_name = "INT", default_value = "8")]
    bucket_bits: usize,

    /// Operation cache size (in bits, so the actual size is `2^size` entries).
    #[clap(long, value_name = "INT", default_value = "18")]
    cache_bits: usize,

    /// Enable automatic reordering with the given method.
    #[clap(long, value_enum)]
    reorder: Option<Method>,

    /// Abort once this many nodes are alive.
    #[clap(long, value_name = "INT")]
    node_limit: Option<usize>,

    /// Disable garbage collection.
    #[clap(long)]
    no_gc: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let n = args.n;
    let mut config = ManagerConfig::default()
        .with_vars(n * n)
        .with_bucket_bits(args.bucket_bits)
        .with_cache_bits(args.cache_bits)
        .with_gc(!args.no_gc);
    if let Some(method) = args.reorder {
        config = config.with_auto_reorder(method.into());
        config.report_reordering = true;
    }
    if let Some(limit) = args.node_limit {
        config = config.with_node_limit(limit);
    }
    let mgr = Manager::with_config(config);
    println!("mgr = {:?}", mgr);

    // Encode N-queens problem:
    // - N queens on an NxN board
    // - One queen per row
    // - At most one queen per column
    // - No two queens on the same diagonal
    println!("Encoding n-queens problem with n = {}", n);
    let mut queens: Vec<Vec<Bdd>> = vec![];
    for i in 0..n {
        let mut row = vec![];
        for j in 0..n {
            row.push(mgr.var((i * n + j) as u32)?);
        }
        queens.push(row);
    }

    let mut constraints: Vec<Bdd> = vec![];

    // One queen per row
    for row in &queens {
        constraints.push(mgr.or_all(row)?);
    }

    // No two queens attack each other
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                for l in 0..n {
                    if (i, j) >= (k, l) {
                        continue;
                    }
                    let same_col = j == l;
                    let same_row = i == k;
                    let same_diag = i + l == k + j || i + j == k + l;
                    if same_row || same_col || same_diag {
                        let both = mgr.and(&queens[i][j], &queens[k][l])?;
                        constraints.push(!&both);
                    }
                }
            }
        }
    }

    println!(
        "Total {} constraints of total size {}",
        constraints.len(),
        mgr.shared_size(constraints.iter())?
    );

    println!("Merging constraints...");
    let mut res = mgr.one();
    for c in &constraints {
        res = mgr.and(&res, c)?;
    }
    drop(constraints);
    println!("res of size {}", res.size());

    let vars: Vec<_> = (0..(n * n) as u32).map(dd_rs::types::Var::new).collect();
    let solutions = mgr.sat_count(&res, vars.len())?;
    println!("{} solutions", solutions);
    if let Some(cube) = mgr.pick_one_minterm(&res, &vars)? {
        for i in 0..n {
            let line: String = (0..n)
                .map(|j| if cube[i * n + j].is_positive() { 'Q' } else { '.' })
                .collect();
            println!("  {}", line);
        }
    }

    let stats = mgr.stats();
    println!("stats = {:?}", stats);
    println!("cache hit rate: {:.1}%", stats.cache_hit_rate() * 100.0);

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
