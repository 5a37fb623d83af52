use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use feastplan_core::{Catalog, Comparator, ConstraintSpec, RunOutcome, VendorResult};
use feastplan_solver::{BranchAndBound, MicroLp, MilpSolver};

#[derive(Parser)]
#[command(name = "feastplan")]
#[command(about = "Find the cheapest catering order that feeds everyone", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

/// Integer programming engine used for each vendor
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// microlp through good_lp
    Microlp,
    /// Built-in simplex branch and bound, honours the node and time limits
    BranchAndBound,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every vendor and report the cheapest order
    Solve {
        /// JSON catalog to use instead of the built-in sample
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        /// Number of people to feed
        #[arg(long, default_value_t = 10)]
        people: u32,
        /// People who need vegan food
        #[arg(long, default_value_t = 2)]
        vegan: u32,
        /// People who need halal food
        #[arg(long, default_value_t = 1)]
        halal: u32,
        /// Maximum total spend
        #[arg(long, default_value_t = 120.0, allow_negative_numbers = true)]
        budget: f64,
        /// Maximum units of any single item
        #[arg(long, default_value_t = 1)]
        max_repeats: u32,
        /// Output format (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Solver backend
        #[arg(long, value_enum, default_value_t = Backend::Microlp)]
        backend: Backend,
        /// Branch and bound node limit per vendor
        #[arg(long, default_value_t = 100_000)]
        node_limit: usize,
        /// Branch and bound wall-clock limit per vendor, in milliseconds
        #[arg(long, default_value_t = 30_000)]
        time_limit_ms: u64,
    },
    /// Check a catalog file for errors
    Check {
        /// The catalog to check
        file: PathBuf,
    },
    /// Print the menus of a catalog
    Menu {
        /// JSON catalog to use instead of the built-in sample
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            catalog,
            people,
            vegan,
            halal,
            budget,
            max_repeats,
            format,
            backend,
            node_limit,
            time_limit_ms,
        } => {
            let catalog = load_or_sample(catalog.as_deref());
            let spec = ConstraintSpec {
                people,
                vegan_min: vegan,
                halal_min: halal,
                budget,
                max_repeats,
            };

            let solver = make_solver(backend, node_limit, time_limit_ms);

            let started = Instant::now();
            let outcome = match Comparator::new(solver.as_ref()).run(&catalog, &spec) {
                Ok(o) => o,
                Err(e) => {
                    eprintln!("Invalid request: {}", e);
                    std::process::exit(1);
                }
            };
            let elapsed = started.elapsed();

            if format == "json" {
                match serde_json::to_string_pretty(&outcome) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing result: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                println!();
                println!("*** RUN TIME ***");
                println!("   {:.3} ms", elapsed.as_secs_f64() * 1000.0);
                println!();
                print!("{}", render_outcome(&spec, &outcome));
            }

            if outcome.cheapest().is_none() {
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let catalog = match load_catalog(&file) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            };

            let mut problems = Vec::new();
            if let Err(e) = catalog.validate() {
                problems.push(e.to_string());
            }
            for vendor in &catalog.vendors {
                if let Err(e) = vendor.validate() {
                    problems.push(e.to_string());
                }
            }

            if problems.is_empty() {
                println!("✓ {} is valid", file.display());
                println!("  {} vendors", catalog.vendors.len());
                println!("  {} items", catalog.item_count());
            } else {
                eprintln!("✗ {} has errors:", file.display());
                for p in problems {
                    eprintln!("  {}", p);
                }
                std::process::exit(1);
            }
        }
        Commands::Menu { catalog } => {
            let catalog = load_or_sample(catalog.as_deref());
            print!("{}", render_catalog(&catalog));
        }
    }
}

fn make_solver(backend: Backend, node_limit: usize, time_limit_ms: u64) -> Box<dyn MilpSolver> {
    match backend {
        Backend::Microlp => Box::new(MicroLp::new()),
        Backend::BranchAndBound => Box::new(
            BranchAndBound::new()
                .with_max_nodes(node_limit)
                .with_time_limit(Duration::from_millis(time_limit_ms)),
        ),
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    // A logger may already be installed when embedded
    let _ = builder.try_init();
}

fn load_catalog(path: &Path) -> Result<Catalog, String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("Error reading file: {}", e))?;
    serde_json::from_str(&source).map_err(|e| format!("Parse error: {}", e))
}

fn load_or_sample(path: Option<&Path>) -> Catalog {
    let Some(path) = path else {
        return Catalog::sample();
    };
    match load_catalog(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn render_result(out: &mut String, result: &VendorResult, label: &str) {
    let _ = writeln!(out, "{}", result.vendor);
    let _ = writeln!(out, "\t{}: {:.2}", label, result.total_cost);
    for chosen in &result.items {
        let _ = writeln!(out, "\t\t{}x {}", chosen.quantity, chosen.name);
    }
}

fn render_outcome(spec: &ConstraintSpec, outcome: &RunOutcome) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "*** Constraints ***");
    let _ = writeln!(out, "People: {}", spec.people);
    let _ = writeln!(out, "Vegans: {}", spec.vegan_min);
    let _ = writeln!(out, "Halals: {}", spec.halal_min);
    let _ = writeln!(out, "Budget: ${}", spec.budget);
    let _ = writeln!(out, "Repeats: {}", spec.max_repeats);
    let _ = writeln!(out);

    match outcome.cheapest() {
        Some(best) => {
            let _ = writeln!(out, "Best option:");
            render_result(&mut out, best, "Cost");
            let _ = writeln!(out);
            let _ = writeln!(out, "*** ALL SOLUTIONS ***");
            for result in outcome.results() {
                let _ = writeln!(out);
                render_result(&mut out, result, "T_Cost");
            }
        }
        None => {
            let _ = writeln!(out, "No vendor can satisfy these constraints.");
        }
    }

    if !outcome.failures().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "*** NO RESULT ***");
        for failure in outcome.failures() {
            let _ = writeln!(out, "{}: {}", failure.vendor, failure.reason);
        }
    }

    out
}

fn render_catalog(catalog: &Catalog) -> String {
    let mut out = String::new();
    for vendor in &catalog.vendors {
        let _ = writeln!(out, "{}", vendor.name);
        for item in &vendor.items {
            let mut tags = Vec::new();
            if item.vegan {
                tags.push("vegan");
            }
            if item.halal {
                tags.push("halal");
            }
            let _ = writeln!(
                out,
                "  {:24} serves {:2}  {:8.2}  {}",
                item.name,
                item.serves,
                item.price,
                tags.join(", ")
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_solve_defaults_match_sample_request() {
        let cli = Cli::parse_from(["feastplan", "solve"]);
        let Commands::Solve {
            people,
            vegan,
            halal,
            budget,
            max_repeats,
            backend,
            time_limit_ms,
            ..
        } = cli.command
        else {
            panic!("expected solve");
        };
        assert_eq!(backend, Backend::Microlp);
        assert_eq!(time_limit_ms, 30_000);
        let defaults = ConstraintSpec::default();
        assert_eq!(people, defaults.people);
        assert_eq!(vegan, defaults.vegan_min);
        assert_eq!(halal, defaults.halal_min);
        assert_eq!(budget, defaults.budget);
        assert_eq!(max_repeats, defaults.max_repeats);
    }

    #[test]
    fn test_backend_flag() {
        let cli = Cli::parse_from(["feastplan", "solve", "--backend", "branch-and-bound", "--time-limit-ms", "5"]);
        let Commands::Solve { backend, .. } = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(backend, Backend::BranchAndBound);
    }

    #[test]
    fn test_render_sample_outcome() {
        let spec = ConstraintSpec::default();
        let solver = make_solver(Backend::Microlp, 100_000, 30_000);
        let outcome = Comparator::new(solver.as_ref()).run(&Catalog::sample(), &spec).unwrap();

        let text = render_outcome(&spec, &outcome);

        assert!(text.contains("Best option:\nLebanese Grill\n\tCost: 78.00\n"));
        assert!(text.contains("*** ALL SOLUTIONS ***"));
        assert!(text.contains("Chinese Kitchen: no combination of items satisfies the constraints"));
    }

    #[test]
    fn test_render_no_solution() {
        let spec = ConstraintSpec {
            budget: 1.0,
            ..ConstraintSpec::default()
        };
        let outcome = RunOutcome::NoSolution { failures: Vec::new() };

        let text = render_outcome(&spec, &outcome);

        assert!(text.contains("No vendor can satisfy these constraints."));
        assert!(!text.contains("Best option"));
    }

    #[test]
    fn test_render_catalog_lists_tags() {
        let text = render_catalog(&Catalog::sample());
        assert!(text.starts_with("Thai House\n"));
        assert!(text.contains("Hummus Bowl"));
        assert!(text.contains("vegan, halal"));
    }
}
