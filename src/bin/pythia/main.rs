//! Main entry point for Pythia

#![deny(warnings, missing_docs, trivial_casts, unused_qualifications)]
#![forbid(unsafe_code)]

/// Boot Pythia
fn main() {
    abscissa_core::boot(&pythia::application::APP);
}
