//! Payment gateway abstraction and the simulated processor

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

use crate::models::PaymentMethod;

/// A charge submitted for a booking
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub amount: f64,
    pub method: PaymentMethod,
}

/// Gateway verdict on a charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved { transaction_id: String },
    Declined { reason: String },
}

/// Processor that charges bookings
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> ChargeOutcome;
}

/// Transaction reference in the `TRX-<millis>` form
pub fn transaction_id() -> String {
    format!("TRX-{}", Utc::now().timestamp_millis())
}

/// Approves charges at random with a fixed probability
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    success_rate: f64,
}

impl SimulatedGateway {
    /// `success_rate` is clamped to `0..=1`
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(0.9)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> ChargeOutcome {
        let approved = rand::thread_rng().gen_bool(self.success_rate);
        debug!(
            "Simulated {} charge of {:.2}: {}",
            request.method,
            request.amount,
            if approved { "approved" } else { "declined" }
        );

        if approved {
            ChargeOutcome::Approved {
                transaction_id: transaction_id(),
            }
        } else {
            ChargeOutcome::Declined {
                reason: "Simulated decline".to_string(),
            }
        }
    }
}

/// Approves every charge, optionally after a delay
#[derive(Debug, Clone, Default)]
pub struct ApprovingGateway {
    delay: Option<Duration>,
}

impl ApprovingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every charge for `delay` before approving it
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

#[async_trait]
impl PaymentGateway for ApprovingGateway {
    async fn charge(&self, _request: &ChargeRequest) -> ChargeOutcome {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        ChargeOutcome::Approved {
            transaction_id: transaction_id(),
        }
    }
}

/// Declines every charge
#[derive(Debug, Clone, Default)]
pub struct DecliningGateway;

#[async_trait]
impl PaymentGateway for DecliningGateway {
    async fn charge(&self, _request: &ChargeRequest) -> ChargeOutcome {
        ChargeOutcome::Declined {
            reason: "Card declined".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChargeRequest {
        ChargeRequest {
            amount: 49.0,
            method: PaymentMethod::Card,
        }
    }

    #[tokio::test]
    async fn test_simulated_gateway_extremes_are_deterministic() {
        for _ in 0..20 {
            assert!(matches!(
                SimulatedGateway::new(1.0).charge(&request()).await,
                ChargeOutcome::Approved { .. }
            ));
            assert!(matches!(
                SimulatedGateway::new(0.0).charge(&request()).await,
                ChargeOutcome::Declined { .. }
            ));
        }
    }

    #[test]
    fn test_success_rate_is_clamped() {
        assert_eq!(SimulatedGateway::new(3.0).success_rate(), 1.0);
        assert_eq!(SimulatedGateway::new(-1.0).success_rate(), 0.0);
        assert_eq!(SimulatedGateway::default().success_rate(), 0.9);
    }

    #[tokio::test]
    async fn test_fixed_gateways() {
        let outcome = ApprovingGateway::new().charge(&request()).await;
        let ChargeOutcome::Approved { transaction_id } = outcome else {
            panic!("expected approval");
        };
        assert!(transaction_id.starts_with("TRX-"));
        assert!(matches!(
            DecliningGateway.charge(&request()).await,
            ChargeOutcome::Declined { .. }
        ));
    }
}
