use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{App, Arg};
use dimacs::{Instance, Sign};
use solver::controller::deadline_from_now;
use solver::{Controller, ControllerConfig};

/// Converts a parsed DIMACS instance into the `(clauses, variables)` pair the
/// core's ingest adapter expects. `variables` is derived from the clauses actually
/// present rather than the declared variable count, since a DIMACS header can
/// overstate it.
fn instance_to_raw(instance: Instance) -> Result<(Vec<Vec<i64>>, Vec<u32>), String> {
    let clauses = match instance {
        Instance::Cnf { clauses, .. } => clauses,
        _ => return Err("only CNF instances are supported".to_string()),
    };

    let raw: Vec<Vec<i64>> = clauses
        .iter()
        .map(|clause| {
            clause
                .lits()
                .iter()
                .map(|lit| {
                    let var = lit.var().to_u64() as i64;
                    if lit.sign() == Sign::Pos {
                        var
                    } else {
                        -var
                    }
                })
                .collect()
        })
        .collect();

    let mut variables: Vec<u32> = raw.iter().flatten().map(|&l| l.unsigned_abs() as u32).collect();
    variables.sort_unstable();
    variables.dedup();

    Ok((raw, variables))
}

fn print_assignment(assignment: &std::collections::HashMap<u32, bool>) {
    let mut vars: Vec<u32> = assignment.keys().copied().collect();
    vars.sort_unstable();
    let rendered: Vec<String> = vars
        .iter()
        .map(|v| {
            let value = assignment[v];
            format!("{}{}", if value { "" } else { "-" }, v)
        })
        .collect();
    println!("v {} 0", rendered.join(" "));
}

fn main() {
    env_logger::init();

    let matches = App::new("hybrid-sat-cli")
        .version("0.1.0")
        .author("hybrid-sat-solver contributors")
        .about("Portfolio SAT solver: CDCL, then WalkSAT, then brute force")
        .arg(
            Arg::with_name("cnf")
                .long("cnf")
                .takes_value(true)
                .required(true)
                .help("Path to a DIMACS CNF file"),
        )
        .arg(
            Arg::with_name("brute_limit")
                .long("brute-limit")
                .takes_value(true)
                .default_value("10")
                .help("Max variables allowed for the brute-force fallback"),
        )
        .arg(
            Arg::with_name("store")
                .long("store")
                .takes_value(true)
                .default_value("logs/shared_memory.json")
                .help("Path to the persistent shared knowledge store"),
        )
        .arg(
            Arg::with_name("debug")
                .long("debug")
                .takes_value(false)
                .help("Log the full run record at debug level"),
        )
        .arg(
            Arg::with_name("deadline_secs")
                .long("deadline-secs")
                .takes_value(true)
                .help("Abort CDCL once this many seconds have elapsed, reporting failure"),
        )
        .get_matches();

    let cnf_path = matches.value_of("cnf").unwrap();
    let brute_scope_limit: usize = matches
        .value_of("brute_limit")
        .unwrap()
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("--brute-limit must be a non-negative integer");
            process::exit(2);
        });
    let store_path = PathBuf::from(matches.value_of("store").unwrap());
    let debug = matches.is_present("debug");
    let deadline = match matches.value_of("deadline_secs") {
        Some(raw) => match raw.parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                Some(deadline_from_now(Duration::from_secs_f64(secs)))
            }
            _ => {
                eprintln!("--deadline-secs must be a non-negative number of seconds");
                process::exit(2);
            }
        },
        None => None,
    };

    let content = match std::fs::read_to_string(cnf_path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("failed to read {}: {}", cnf_path, err);
            process::exit(2);
        }
    };

    let instance = match dimacs::parse_dimacs(&content) {
        Ok(instance) => instance,
        Err(err) => {
            eprintln!("failed to parse {}: {:?}", cnf_path, err);
            process::exit(2);
        }
    };

    let (raw_clauses, variables) = match instance_to_raw(instance) {
        Ok(pair) => pair,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(2);
        }
    };

    let formula = match solver::ingest::ingest(raw_clauses, variables) {
        Ok(formula) => formula,
        Err(err) => {
            eprintln!("malformed formula: {}", err);
            process::exit(2);
        }
    };

    println!("CNF file: {}", cnf_path);
    println!("Variables: {}", formula.num_variables());
    println!("Clauses: {}", formula.clauses().len());
    if formula.num_variables() > 0 {
        println!(
            "Clause-to-variable ratio: {:.2}",
            formula.clauses().len() as f64 / formula.num_variables() as f64
        );
    }

    let config = ControllerConfig {
        brute_scope_limit,
        debug,
        source_file: Some(cnf_path.to_string()),
        deadline,
        ..ControllerConfig::default()
    };
    let controller = Controller::new(store_path, config);
    let result = controller.run(&formula);

    if result.solved {
        println!("s SATISFIABLE");
        print_assignment(&result.assignment);
        process::exit(0);
    } else {
        println!("s UNSATISFIABLE or no solver succeeded");
        process::exit(1);
    }
}
