pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Hard failures of the composition contract. Capability-level failures are
/// never raised here; they travel as tagged data inside the composed
/// response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query rejected: {reason}.")]
	QueryRejected { reason: &'static str },
	#[error("Route plan produced no targets; routing fallback is broken.")]
	NoTargets,
}
