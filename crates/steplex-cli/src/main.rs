use clap::{Parser, Subcommand, ValueEnum};
use steplex_parse::{SolveFailure, SolveRequest};
use steplex_solver::{
    IterationState, ProblemState, Sense, Snapshot, SolveReport, StandardizedState, Trace,
    VariableCounts, render_expression, variable_name,
};

#[derive(Parser)]
#[command(name = "steplex")]
#[command(about = "A step-by-step tableau simplex solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a linear program and show every tableau on the way
    Solve {
        /// Objective function, e.g. "3x1 + 5x2"
        objective: String,
        /// Constraints, e.g. "x1 <= 4" "2x2 <= 12"
        constraints: Vec<String>,
        /// Optimization sense
        #[arg(short, long, default_value = "max")]
        sense: SenseArg,
        /// Transform the problem into its dual before solving
        #[arg(long)]
        dual: bool,
        /// Emit the full report as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Print only the final solution, skipping the derivation
        #[arg(short, long)]
        quiet: bool,
    },
    /// Check constraint syntax without solving
    Check {
        /// Constraints to validate
        constraints: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SenseArg {
    Max,
    Min,
}

impl From<SenseArg> for Sense {
    fn from(arg: SenseArg) -> Self {
        match arg {
            SenseArg::Max => Sense::Max,
            SenseArg::Min => Sense::Min,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            objective,
            constraints,
            sense,
            dual,
            json,
            quiet,
        } => {
            let request = SolveRequest {
                objective,
                sense: sense.into(),
                constraints,
                apply_duality: dual,
            };

            match request.run() {
                Ok(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_else(
                            |e| format!("{{\"error\": \"{e}\"}}"),
                        ));
                    } else {
                        if !quiet {
                            print_trace(&report.trace, report.dual_derived);
                        }
                        print_solution(&report);
                    }
                }
                Err(failure) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&failure).unwrap_or_else(
                            |e| format!("{{\"error\": \"{e}\"}}"),
                        ));
                    } else {
                        if !quiet {
                            print_trace(&failure.trace, dual);
                        }
                        print_failure(&failure);
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { constraints } => {
            let mut failed = false;
            for constraint in &constraints {
                match steplex_parse::Parser::constraint(constraint) {
                    Ok(parsed) => {
                        println!(
                            "✓ {} {} {}",
                            render_expression(&parsed.coefficients),
                            parsed.op,
                            parsed.rhs
                        );
                    }
                    Err(e) => {
                        eprintln!("✗ {constraint}: {e}");
                        failed = true;
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
        }
    }
}

fn print_trace(trace: &Trace, dual: bool) {
    let mut counts: Option<VariableCounts> = None;
    for snapshot in trace.steps() {
        println!("== {} ==", snapshot.title());
        match snapshot {
            Snapshot::Original(state)
            | Snapshot::DualityStep1(state)
            | Snapshot::DualityStep2(state) => {
                // The dual's variables display as y, everything else as x.
                let as_dual = matches!(snapshot, Snapshot::DualityStep2(_));
                print_problem(state, as_dual);
            }
            Snapshot::Standardized(state) => {
                counts = Some(state.counts);
                print_standardized(state, dual);
            }
            Snapshot::Iteration(state) => print_iteration(state, counts.as_ref(), dual),
        }
        println!();
    }
}

fn print_problem(state: &ProblemState, as_dual: bool) {
    let objective = render_expression(&state.objective);
    println!("{} z = {}", state.sense, relabel(&objective, as_dual));
    for (i, row) in state.matrix.iter().enumerate() {
        println!(
            "  {} {} {}",
            relabel(&render_expression(row), as_dual),
            state.operators[i],
            state.rhs[i]
        );
    }
}

fn relabel(expression: &str, as_dual: bool) -> String {
    if as_dual {
        expression.replace('x', "y")
    } else {
        expression.to_string()
    }
}

fn print_standardized(state: &StandardizedState, dual: bool) {
    let counts = &state.counts;
    println!(
        "{} variables ({} original, {} slack, {} surplus, {} artificial)",
        counts.total(),
        counts.original,
        counts.slack,
        counts.surplus,
        counts.artificial
    );
    let names = column_names(Some(counts), dual, state.objective.len());

    print!("{:>8}", "Cj");
    for value in &state.objective {
        print!("{value:>9.2}");
    }
    println!();
    print!("{:>8}", "");
    for name in &names {
        print!("{name:>9}");
    }
    println!("{:>9}", "b");
    for (i, row) in state.matrix.iter().enumerate() {
        print!("{:>8}", format!("R{}", i + 1));
        for value in row {
            print!("{value:>9.2}");
        }
        println!("{:>9.2}", state.rhs[i]);
    }
}

fn print_iteration(state: &IterationState, counts: Option<&VariableCounts>, dual: bool) {
    if let Some(pivot) = &state.pivot {
        println!(
            "{} enters, {} leaves (pivot row {}, column {})",
            pivot.entering,
            pivot.leaving,
            pivot.row + 1,
            pivot.column + 1
        );
    }

    let cols = state.tableau[0].len() - 1;
    let names = column_names(counts, dual, cols);

    print!("{:>8}", "basis");
    for name in &names {
        print!("{name:>9}");
    }
    println!("{:>9}", "b");

    for (i, row) in state.tableau.iter().enumerate() {
        let label = if i < state.basis.len() {
            names
                .get(state.basis[i])
                .cloned()
                .unwrap_or_else(|| format!("V{}", state.basis[i] + 1))
        } else {
            "Cj-Zj".to_string()
        };
        print!("{label:>8}");
        for value in row {
            print!("{value:>9.2}");
        }
        println!();
    }
    println!("z = {:.4}", state.objective_value);
}

fn column_names(counts: Option<&VariableCounts>, dual: bool, total: usize) -> Vec<String> {
    match counts {
        Some(counts) => (0..total)
            .map(|i| variable_name(counts, dual, i))
            .collect(),
        None => (0..total).map(|i| format!("V{}", i + 1)).collect(),
    }
}

fn print_solution(report: &SolveReport) {
    println!("Status: OPTIMAL");
    println!("{} z = {:.4}", report.sense, report.objective_value);
    println!();
    println!("Basic variables:");
    for variable in &report.basic_variables {
        println!("  {:6} = {:10.4}", variable.name, variable.value);
    }
    println!("Non-basic variables (all 0):");
    let names: Vec<&str> = report
        .non_basic_variables
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    println!("  {}", names.join(", "));
}

fn print_failure(failure: &SolveFailure) {
    eprintln!("Error: {failure}");
}
