// Purpose: Define crate-level module surface for the dependency guesser.
// Inputs/Outputs: Exposes locator, discovery and manifest modules to the binary and tests.
// Invariants: Discovery (`guess`) resolves packages only through the `PackageLocator` trait.
// Gotchas: Keep module wiring consistent with src/main.rs.

pub mod cli;
pub mod guess;
pub mod manifest;
pub mod pkg;

pub use guess::{Guess, GuessError, Strategy, guess_deps};
pub use pkg::build_ctx::BuildConfig;
pub use pkg::locate::{FsLocator, LocateError, Package, PackageKind, PackageLocator};
