use fallout_core::models::{ActivationStatus, EsimStatus, SwitchStatus};
use proptest::prelude::*;

pub fn known_label_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("resubmission".to_string()),
        Just("esim".to_string()),
        Just("switch".to_string()),
        Just("human".to_string()),
    ]
}

/// Arbitrary classifier output, including padding and case noise
pub fn raw_label_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        known_label_strategy().prop_map(|l| format!("  {}\n", l.to_uppercase())),
        known_label_strategy(),
        "[a-zA-Z_ ]{0,16}",
        ".{0,32}",
    ]
}

pub fn decision_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("approve".to_string()),
        Just("REJECT".to_string()),
        Just(" Approve ".to_string()),
        ".{0,24}",
    ]
}

pub fn activation_strategy() -> impl Strategy<Value = ActivationStatus> {
    prop_oneof![
        Just(ActivationStatus::NotSent),
        Just(ActivationStatus::Sent),
        Just(ActivationStatus::Pending),
        Just(ActivationStatus::Failed),
    ]
}

pub fn esim_strategy() -> impl Strategy<Value = EsimStatus> {
    prop_oneof![
        Just(EsimStatus::Active),
        Just(EsimStatus::Failed),
        Just(EsimStatus::Reprovisioned),
    ]
}

pub fn switch_strategy() -> impl Strategy<Value = SwitchStatus> {
    prop_oneof![
        Just(SwitchStatus::Ok),
        Just(SwitchStatus::Error),
        Just(SwitchStatus::Reconfigured),
    ]
}
