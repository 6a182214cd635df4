//! Fee-correct transaction plan construction.
//!
//! [`compute_tx_plan`] decides, for a fixed set of inputs and outputs,
//! whether a plan exists and whether it needs a change output. The ledger
//! checks fee equality strictly, so a plan either balances to the lovelace
//! or is not produced at all.

use lode_core::constants::MAX_LOVELACE;
use lode_core::traits::FeeCalculator;
use lode_core::types::{AccountInput, Certificate, Lovelace, Output, TxInput, TxPlan, TxPlanKind};

use crate::error::WalletError;

fn checked_sum<I: Iterator<Item = Lovelace>>(mut coins: I) -> Result<Lovelace, WalletError> {
    coins.try_fold(0u64, |acc, c| acc.checked_add(c).ok_or(WalletError::AmountOverflow))
}

/// Build a plan spending exactly `inputs`.
///
/// Returns `Ok(None)` when the inputs cannot cover outputs and fee, or when
/// a change output would be needed but cannot be paid for (or no change
/// candidate was supplied). `possible_change` only contributes its address;
/// its coins are recomputed.
///
/// # Errors
/// [`WalletError::AmountOverflow`] when a sum overflows or the output total
/// exceeds [`MAX_LOVELACE`].
pub fn compute_tx_plan(
    kind: TxPlanKind,
    fee: &dyn FeeCalculator,
    inputs: &[TxInput],
    outputs: &[Output],
    possible_change: Option<&Output>,
    certificate: Option<&Certificate>,
) -> Result<Option<TxPlan>, WalletError> {
    let total_in = checked_sum(inputs.iter().map(TxInput::coins))?;
    let total_out = checked_sum(outputs.iter().map(|o| o.coins))?;
    if total_out > MAX_LOVELACE {
        return Err(WalletError::AmountOverflow);
    }

    let plan = |change: Option<Output>, plan_fee: Lovelace| TxPlan {
        kind,
        inputs: inputs.to_vec(),
        outputs: outputs.to_vec(),
        change,
        certificate: certificate.cloned(),
        fee: plan_fee,
    };

    let fee_without_change = fee.required_fee(inputs, outputs, certificate);
    let needed = u128::from(total_out) + u128::from(fee_without_change);
    if needed > u128::from(total_in) {
        return Ok(None);
    }
    if needed == u128::from(total_in) {
        return Ok(Some(plan(None, fee_without_change)));
    }

    let Some(change) = possible_change else {
        return Ok(None);
    };
    let mut with_change = outputs.to_vec();
    with_change.push(Output::new(change.address.clone(), 0));
    let fee_with_change = fee.required_fee(inputs, &with_change, certificate);
    let needed = u128::from(total_out) + u128::from(fee_with_change);
    if needed > u128::from(total_in) {
        return Ok(None);
    }

    // needed <= total_in, so the difference fits
    let change_coins = total_in - total_out - fee_with_change;
    Ok(Some(plan(
        Some(Output::new(change.address.clone(), change_coins)),
        fee_with_change,
    )))
}

/// Build a plan spending `amount` plus fee from a staking account.
///
/// The fee is computed for the final shape (one account input and the
/// destination output, none when `amount` is zero) so the plan is an exact
/// fit. Returns `Ok(None)` when the account balance cannot cover it.
pub fn compute_account_tx_plan(
    fee: &dyn FeeCalculator,
    destination: &str,
    amount: Lovelace,
    account_address: &str,
    counter: u32,
    account_balance: Lovelace,
) -> Result<Option<TxPlan>, WalletError> {
    let outputs: Vec<Output> = if amount > 0 {
        vec![Output::new(destination, amount)]
    } else {
        Vec::new()
    };

    let mut account = AccountInput {
        address: account_address.to_string(),
        coins: 0,
        counter,
    };
    let input_fee = fee.required_fee(&[TxInput::Account(account.clone())], &outputs, None);
    let coins = amount.checked_add(input_fee).ok_or(WalletError::AmountOverflow)?;
    if coins > account_balance {
        return Ok(None);
    }
    account.coins = coins;

    compute_tx_plan(
        TxPlanKind::Account,
        fee,
        &[TxInput::Account(account)],
        &outputs,
        None,
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FixedFee, StepFee};
    use lode_core::fee::{ChainConfig, LinearFee};
    use lode_core::types::{PoolDelegation, Utxo};

    fn utxo(coins: Lovelace) -> TxInput {
        TxInput::Utxo(Utxo {
            tx_hash: "11".repeat(32),
            output_index: 0,
            address: "src".into(),
            coins,
        })
    }

    fn change() -> Output {
        Output::new("chg", 0)
    }

    #[test]
    fn change_absorbs_surplus() {
        let fee = StepFee {
            without: 180_000,
            with: 200_000,
            base_outputs: 1,
        };
        let plan = compute_tx_plan(
            TxPlanKind::Utxo,
            &fee,
            &[utxo(1_000_000)],
            &[Output::new("dst", 500_000)],
            Some(&change()),
            None,
        )
        .unwrap()
        .unwrap();

        assert_eq!(plan.fee, 200_000);
        assert_eq!(plan.change, Some(Output::new("chg", 300_000)));
        assert!(plan.is_balanced());
    }

    #[test]
    fn exact_fit_has_no_change() {
        let plan = compute_tx_plan(
            TxPlanKind::Utxo,
            &FixedFee(0),
            &[utxo(500)],
            &[Output::new("dst", 500)],
            Some(&change()),
            None,
        )
        .unwrap()
        .unwrap();
        assert!(plan.change.is_none());
        assert_eq!(plan.fee, 0);
        assert!(plan.is_balanced());
    }

    #[test]
    fn short_inputs_give_none() {
        let plan = compute_tx_plan(
            TxPlanKind::Utxo,
            &FixedFee(10),
            &[utxo(100)],
            &[Output::new("dst", 95)],
            Some(&change()),
            None,
        )
        .unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn unaffordable_change_gives_none() {
        // surplus of 5 cannot pay the extra 10 a change output costs
        let fee = StepFee {
            without: 10,
            with: 20,
            base_outputs: 1,
        };
        let plan = compute_tx_plan(
            TxPlanKind::Utxo,
            &fee,
            &[utxo(115)],
            &[Output::new("dst", 100)],
            Some(&change()),
            None,
        )
        .unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn surplus_without_change_candidate_gives_none() {
        let plan = compute_tx_plan(
            TxPlanKind::Utxo,
            &FixedFee(1),
            &[utxo(100)],
            &[Output::new("dst", 50)],
            None,
            None,
        )
        .unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn output_overflow_is_an_error() {
        let err = compute_tx_plan(
            TxPlanKind::Utxo,
            &FixedFee(0),
            &[utxo(1)],
            &[Output::new("a", u64::MAX), Output::new("b", 1)],
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, WalletError::AmountOverflow);

        let err = compute_tx_plan(
            TxPlanKind::Utxo,
            &FixedFee(0),
            &[utxo(1)],
            &[Output::new("a", MAX_LOVELACE + 1)],
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, WalletError::AmountOverflow);
    }

    #[test]
    fn certificate_fee_is_charged() {
        let fee = LinearFee::new(ChainConfig::default());
        let cert = Certificate::StakeDelegation {
            pools: vec![PoolDelegation {
                pool_id: "pool".into(),
                ratio: 1,
            }],
            account_address: "acct".into(),
        };
        let plan = compute_tx_plan(
            TxPlanKind::Utxo,
            &fee,
            &[utxo(10_000_000)],
            &[],
            Some(&change()),
            Some(&cert),
        )
        .unwrap()
        .unwrap();
        // constant + 2 parts (input, change) + certificate
        assert_eq!(plan.fee, 200_000 + 2 * 100_000 + 400_000);
        assert_eq!(plan.certificate, Some(cert));
        assert!(plan.is_balanced());
    }

    #[test]
    fn pure_for_identical_arguments() {
        let fee = LinearFee::new(ChainConfig::default());
        let inputs = [utxo(3_000_000), utxo(1_000_000)];
        let outputs = [Output::new("dst", 1_500_000)];
        let a = compute_tx_plan(TxPlanKind::Utxo, &fee, &inputs, &outputs, Some(&change()), None).unwrap();
        let b = compute_tx_plan(TxPlanKind::Utxo, &fee, &inputs, &outputs, Some(&change()), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn account_plan_is_exact_fit() {
        let fee = LinearFee::new(ChainConfig::default());
        let plan = compute_account_tx_plan(&fee, "dst", 1_000_000, "acct", 4, 5_000_000)
            .unwrap()
            .unwrap();
        assert_eq!(plan.kind, TxPlanKind::Account);
        assert!(plan.change.is_none());
        assert_eq!(plan.outputs, vec![Output::new("dst", 1_000_000)]);
        assert_eq!(plan.fee, 200_000 + 2 * 100_000);
        match &plan.inputs[0] {
            TxInput::Account(input) => {
                assert_eq!(input.counter, 4);
                assert_eq!(input.coins, 1_000_000 + plan.fee);
            }
            other => panic!("unexpected input {other:?}"),
        }
        assert!(plan.is_balanced());
    }

    #[test]
    fn account_plan_over_balance_is_none() {
        let fee = LinearFee::new(ChainConfig::default());
        let plan = compute_account_tx_plan(&fee, "dst", 1_000_000, "acct", 0, 1_000_000).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn zero_amount_account_plan_has_no_outputs() {
        let plan = compute_account_tx_plan(&FixedFee(7), "dst", 0, "acct", 0, 7)
            .unwrap()
            .unwrap();
        assert!(plan.outputs.is_empty());
        assert_eq!(plan.fee, 7);
    }
}
