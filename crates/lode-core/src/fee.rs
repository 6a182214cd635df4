//! Default linear fee formula.
//!
//! `fee = constant + coefficient * (inputs + outputs) + certificate`, the
//! certificate term applying only when a certificate is attached. Any other
//! formula can be injected through [`FeeCalculator`].

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FEE_CERTIFICATE, DEFAULT_FEE_COEFFICIENT, DEFAULT_FEE_CONSTANT};
use crate::traits::FeeCalculator;
use crate::types::{Certificate, Lovelace, Output, TxInput};

/// Chain fee parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    pub fee_constant: Lovelace,
    pub fee_coefficient: Lovelace,
    pub fee_certificate: Lovelace,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            fee_constant: DEFAULT_FEE_CONSTANT,
            fee_coefficient: DEFAULT_FEE_COEFFICIENT,
            fee_certificate: DEFAULT_FEE_CERTIFICATE,
        }
    }
}

/// Linear fee over a [`ChainConfig`]. Saturates instead of overflowing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearFee {
    config: ChainConfig,
}

impl LinearFee {
    pub fn new(config: ChainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }
}

impl FeeCalculator for LinearFee {
    fn required_fee(
        &self,
        inputs: &[TxInput],
        outputs: &[Output],
        certificate: Option<&Certificate>,
    ) -> Lovelace {
        let parts = (inputs.len() as u64).saturating_add(outputs.len() as u64);
        let certificate_fee = if certificate.is_some() {
            self.config.fee_certificate
        } else {
            0
        };
        self.config
            .fee_constant
            .saturating_add(self.config.fee_coefficient.saturating_mul(parts))
            .saturating_add(certificate_fee)
    }
}
