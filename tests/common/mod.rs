#![allow(dead_code)] // Each integration test binary uses a different subset

pub mod doubles;
pub mod strategies;

pub use doubles::*;

use fallout_core::config::EngineConfig;
use fallout_core::models::{ActivationStatus, EsimStatus, NewCustomer, NewOrder, SwitchStatus};
use fallout_core::store::{AuditStore, InMemoryAuditStore};
use fallout_core::{Classifier, WorkflowEngine};
use std::sync::Arc;

/// Scenario orders: (order, customer, activation, esim, switch, issue_type)
pub const SCENARIO_ORDERS: [(&str, &str, ActivationStatus, EsimStatus, SwitchStatus, &str); 5] = [
    ("ORD123", "CUST001", ActivationStatus::NotSent, EsimStatus::Active, SwitchStatus::Ok, "activation_issue"),
    ("ORD456", "CUST002", ActivationStatus::Sent, EsimStatus::Failed, SwitchStatus::Ok, "esim_issue"),
    ("ORD789", "CUST003", ActivationStatus::Sent, EsimStatus::Active, SwitchStatus::Error, "switch_issue"),
    ("ORD999", "CUST004", ActivationStatus::Sent, EsimStatus::Active, SwitchStatus::Ok, "unknown_issue"),
    ("ORD555", "CUST005", ActivationStatus::Sent, EsimStatus::Failed, SwitchStatus::Error, "complex_issue"),
];

const CUSTOMERS: [(&str, &str, &str, i32); 5] = [
    ("CUST001", "John Doe", "gold", 1),
    ("CUST002", "Jane Smith", "silver", 2),
    ("CUST003", "Bob Johnson", "bronze", 3),
    ("CUST004", "Alice Brown", "gold", 1),
    ("CUST005", "Charlie Wilson", "silver", 2),
];

/// Insert the scenario customers and orders into any store
pub async fn seed_scenario(store: &dyn AuditStore) {
    for (customer_id, name, tier, priority) in CUSTOMERS {
        store
            .create_customer(NewCustomer {
                customer_id: customer_id.to_string(),
                name: name.to_string(),
                account_tier: tier.to_string(),
                priority_level: priority,
            })
            .await
            .expect("Failed to create scenario customer");
    }
    for (order_id, customer_id, activation, esim, switch, issue) in SCENARIO_ORDERS {
        store
            .create_order(NewOrder {
                order_id: order_id.to_string(),
                customer_id: customer_id.to_string(),
                product_category: "mobile".to_string(),
                activation_status: activation,
                esim_status: esim,
                switch_status: switch,
                issue_type: Some(issue.to_string()),
            })
            .await
            .expect("Failed to create scenario order");
    }
}

pub async fn seeded_store() -> Arc<InMemoryAuditStore> {
    let store = Arc::new(InMemoryAuditStore::new());
    seed_scenario(store.as_ref()).await;
    store
}

pub fn engine_with(store: Arc<InMemoryAuditStore>, classifier: Arc<dyn Classifier>) -> WorkflowEngine {
    WorkflowEngine::new(store, classifier, EngineConfig::default())
}
