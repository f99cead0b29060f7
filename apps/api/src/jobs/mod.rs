// Job lifecycle: dispatch to the evaluation service, status mirroring,
// and per-persona feedback written back by that service.

pub mod handlers;
pub mod lifecycle;
