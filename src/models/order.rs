//! # Order Model
//!
//! A telecom order and its three independent sub-statuses.
//!
//! ## Overview
//!
//! An order is created at intake and never deleted. Its sub-statuses are the
//! only mutable part, and only specialist handlers change them, always through
//! [`crate::store::AuditStore::update_order_sub_status`] so that every change
//! lands together with its audit entry.
//!
//! ## Database Schema
//!
//! Maps to the `orders` table:
//! ```sql
//! CREATE TABLE orders (
//!   order_id TEXT PRIMARY KEY,
//!   customer_id TEXT NOT NULL REFERENCES customers(customer_id),
//!   product_category TEXT NOT NULL,
//!   activation_status TEXT NOT NULL,  -- not_sent | sent | pending | failed
//!   esim_status TEXT NOT NULL,        -- active | failed | reprovisioned
//!   switch_status TEXT NOT NULL,      -- ok | error | reconfigured
//!   issue_type TEXT,
//!   created_at TIMESTAMPTZ NOT NULL,
//!   updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! sub_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {s}", stringify!($name))),
                }
            }
        }
    };
}

sub_status_enum! {
    /// Whether the order reached the activation system
    ActivationStatus {
        NotSent => "not_sent",
        Sent => "sent",
        Pending => "pending",
        Failed => "failed",
    }
}

sub_status_enum! {
    /// eSIM profile provisioning state
    EsimStatus {
        Active => "active",
        Failed => "failed",
        Reprovisioned => "reprovisioned",
    }
}

sub_status_enum! {
    /// Network switch configuration state
    SwitchStatus {
        Ok => "ok",
        Error => "error",
        Reconfigured => "reconfigured",
    }
}

/// Which sub-status column a change targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubStatusField {
    Activation,
    Esim,
    Switch,
}

impl SubStatusField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Activation => "activation_status",
            Self::Esim => "esim_status",
            Self::Switch => "switch_status",
        }
    }
}

impl fmt::Display for SubStatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A compare-and-set change of one sub-status.
///
/// The store applies it only while the column still holds `expected`; a
/// second attempt after a successful one therefore changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubStatusChange {
    pub field: SubStatusField,
    pub expected: String,
    pub new_value: String,
}

impl SubStatusChange {
    pub fn activation(expected: ActivationStatus, new_value: ActivationStatus) -> Self {
        Self {
            field: SubStatusField::Activation,
            expected: expected.to_string(),
            new_value: new_value.to_string(),
        }
    }

    pub fn esim(expected: EsimStatus, new_value: EsimStatus) -> Self {
        Self {
            field: SubStatusField::Esim,
            expected: expected.to_string(),
            new_value: new_value.to_string(),
        }
    }

    pub fn switch(expected: SwitchStatus, new_value: SwitchStatus) -> Self {
        Self {
            field: SubStatusField::Switch,
            expected: expected.to_string(),
            new_value: new_value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub product_category: String,
    pub activation_status: ActivationStatus,
    pub esim_status: EsimStatus,
    pub switch_status: SwitchStatus,
    pub issue_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Order for intake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: String,
    pub customer_id: String,
    pub product_category: String,
    pub activation_status: ActivationStatus,
    pub esim_status: EsimStatus,
    pub switch_status: SwitchStatus,
    pub issue_type: Option<String>,
}

impl Order {
    /// Current value of one sub-status as stored
    pub fn sub_status(&self, field: SubStatusField) -> &'static str {
        match field {
            SubStatusField::Activation => self.activation_status.as_str(),
            SubStatusField::Esim => self.esim_status.as_str(),
            SubStatusField::Switch => self.switch_status.as_str(),
        }
    }

    /// Apply a parsed sub-status value, returning an error for values outside the enum
    pub fn set_sub_status(&mut self, field: SubStatusField, value: &str) -> Result<(), String> {
        match field {
            SubStatusField::Activation => self.activation_status = value.parse()?,
            SubStatusField::Esim => self.esim_status = value.parse()?,
            SubStatusField::Switch => self.switch_status = value.parse()?,
        }
        Ok(())
    }

    /// Sub-statuses currently in a fallout condition, highest priority first
    pub fn faulty_fields(&self) -> Vec<SubStatusField> {
        let mut fields = Vec::new();
        if self.switch_status == SwitchStatus::Error {
            fields.push(SubStatusField::Switch);
        }
        if self.esim_status == EsimStatus::Failed {
            fields.push(SubStatusField::Esim);
        }
        if matches!(
            self.activation_status,
            ActivationStatus::NotSent | ActivationStatus::Failed
        ) {
            fields.push(SubStatusField::Activation);
        }
        fields
    }

    pub fn is_fallout(&self) -> bool {
        !self.faulty_fields().is_empty()
    }
}

impl NewOrder {
    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        Order {
            order_id: self.order_id,
            customer_id: self.customer_id,
            product_category: self.product_category,
            activation_status: self.activation_status,
            esim_status: self.esim_status,
            switch_status: self.switch_status,
            issue_type: self.issue_type,
            created_at: now,
            updated_at: now,
        }
    }
}
