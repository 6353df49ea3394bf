pub mod recovery_policy;
pub mod recovery_state_machine;
