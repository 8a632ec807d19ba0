// Purpose: Binary entry for the dependency guesser.
// Inputs/Outputs: Reads process args and returns process exit code from CLI dispatcher.
// Invariants: Main must not bypass centralized CLI argument/diagnostic handling.

fn main() {
    let code = depguess::cli::run_cli(std::env::args().skip(1));
    std::process::exit(code);
}
