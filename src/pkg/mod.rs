// Purpose: Go package lookup layer: search context, source header scanning, locator, name roots.
// Inputs/Outputs: Re-exports the pieces the discovery algorithms consume.
// Invariants: Nothing here walks import graphs; that belongs to `guess`.

pub mod build_ctx;
pub mod import_scan;
pub mod locate;
pub mod normalize;
