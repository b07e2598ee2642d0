//! The etcd sub-plan's five leaf executors (§4.E "Etcd sub-plan", §4.F
//! "etcd-restore"). Each operates on one master, addressed via
//! `ServerPhaseData`.

pub mod backup;
pub mod restart;
pub mod restore;
pub mod shutdown;
pub mod upgrade;
