//! Largest amounts a wallet can move in one transaction.
//!
//! Both calculations spend every available UTXO and size the fee for the
//! final output shape, so planning the returned amount gives an exact fit
//! with no change.

use lode_core::traits::FeeCalculator;
use lode_core::types::{Lovelace, Output, TxInput, Utxo};

use crate::error::WalletError;

pub struct MaxAmountCalculator<'a> {
    fee: &'a dyn FeeCalculator,
    donation_address: &'a str,
}

impl<'a> MaxAmountCalculator<'a> {
    pub fn new(fee: &'a dyn FeeCalculator, donation_address: &'a str) -> Self {
        Self {
            fee,
            donation_address,
        }
    }

    fn spend_all(&self, utxos: &[Utxo], outputs: &[Output]) -> Result<(Lovelace, Lovelace), WalletError> {
        let inputs: Vec<TxInput> = utxos.iter().cloned().map(TxInput::from).collect();
        let total = utxos
            .iter()
            .try_fold(0u64, |acc, u| acc.checked_add(u.coins))
            .ok_or(WalletError::AmountOverflow)?;
        Ok((total, self.fee.required_fee(&inputs, outputs, None)))
    }

    /// Maximum amount sendable to `address` alongside a `donation`.
    ///
    /// Floored at zero.
    pub fn max_sendable_amount(
        &self,
        utxos: &[Utxo],
        address: &str,
        donation: Lovelace,
    ) -> Result<Lovelace, WalletError> {
        let mut outputs = vec![Output::new(address, 0)];
        if donation > 0 {
            outputs.push(Output::new(self.donation_address, donation));
        }
        let (total, fee) = self.spend_all(utxos, &outputs)?;
        Ok(total.saturating_sub(fee).saturating_sub(donation))
    }

    /// Maximum donation alongside sending `send_amount` to `address`.
    ///
    /// Floored at zero.
    pub fn max_donation_amount(
        &self,
        utxos: &[Utxo],
        address: &str,
        send_amount: Lovelace,
    ) -> Result<Lovelace, WalletError> {
        let outputs = vec![
            Output::new(address, send_amount),
            Output::new(self.donation_address, 0),
        ];
        let (total, fee) = self.spend_all(utxos, &outputs)?;
        Ok(total.saturating_sub(fee).saturating_sub(send_amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::select_minimal_tx_plan;
    use lode_core::fee::{ChainConfig, LinearFee};

    fn utxos(values: &[Lovelace]) -> Vec<Utxo> {
        values
            .iter()
            .enumerate()
            .map(|(i, &coins)| Utxo {
                tx_hash: format!("{i:064x}"),
                output_index: i as u32,
                address: "src".into(),
                coins,
            })
            .collect()
    }

    #[test]
    fn sendable_without_donation() {
        let fee = LinearFee::new(ChainConfig::default());
        let calc = MaxAmountCalculator::new(&fee, "don");
        // 2 inputs + 1 output
        let max = calc.max_sendable_amount(&utxos(&[1_000_000, 2_000_000]), "dst", 0).unwrap();
        assert_eq!(max, 3_000_000 - 500_000);
    }

    #[test]
    fn sendable_with_donation() {
        let fee = LinearFee::new(ChainConfig::default());
        let calc = MaxAmountCalculator::new(&fee, "don");
        let max = calc.max_sendable_amount(&utxos(&[3_000_000]), "dst", 100_000).unwrap();
        // 1 input + 2 outputs
        assert_eq!(max, 3_000_000 - 500_000 - 100_000);
    }

    #[test]
    fn donation_max() {
        let fee = LinearFee::new(ChainConfig::default());
        let calc = MaxAmountCalculator::new(&fee, "don");
        let max = calc.max_donation_amount(&utxos(&[3_000_000]), "dst", 1_000_000).unwrap();
        assert_eq!(max, 3_000_000 - 500_000 - 1_000_000);
    }

    #[test]
    fn floored_at_zero() {
        let fee = LinearFee::new(ChainConfig::default());
        let calc = MaxAmountCalculator::new(&fee, "don");
        assert_eq!(calc.max_sendable_amount(&utxos(&[10]), "dst", 0).unwrap(), 0);
        assert_eq!(calc.max_sendable_amount(&[], "dst", 0).unwrap(), 0);
        assert_eq!(calc.max_donation_amount(&utxos(&[10]), "dst", 5).unwrap(), 0);
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let fee = LinearFee::new(ChainConfig::default());
        let calc = MaxAmountCalculator::new(&fee, "don");
        let err = calc.max_sendable_amount(&utxos(&[u64::MAX, 1]), "dst", 0).unwrap_err();
        assert_eq!(err, WalletError::AmountOverflow);
    }

    #[test]
    fn max_sendable_plans_as_exact_fit() {
        let fee = LinearFee::new(ChainConfig::default());
        let calc = MaxAmountCalculator::new(&fee, "don");
        let available = utxos(&[1_500_000, 700_000, 4_000_000]);
        let max = calc.max_sendable_amount(&available, "dst", 250_000).unwrap();

        let outputs = vec![Output::new("dst", max), Output::new("don", 250_000)];
        let plan = select_minimal_tx_plan(&fee, &available, "chg", &outputs, None)
            .unwrap()
            .into_plan()
            .unwrap();
        assert_eq!(plan.inputs.len(), 3);
        assert!(plan.change.is_none());
        assert!(plan.is_balanced());
    }
}
