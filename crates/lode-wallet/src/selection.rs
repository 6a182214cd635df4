//! UTXO ordering and greedy plan selection.
//!
//! Non-staking UTXOs are spent first so funds migrate toward staking
//! addresses. Within each group the order is a seeded shuffle, so the same
//! session seed reproduces the same plan. Selection then grows the input
//! set one UTXO at a time and returns the first prefix that yields a plan.

use tracing::debug;

use lode_core::address::is_base;
use lode_core::traits::FeeCalculator;
use lode_core::types::{Certificate, Lovelace, Output, PlanOutcome, PoolDelegation, TxInput, TxPlanKind, Utxo};

use crate::error::WalletError;
use crate::plan::compute_tx_plan;
use crate::random::{shuffle, PseudoRandom};

/// Which UTXOs a plan may spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Non-staking first, then staking.
    #[default]
    All,
    /// Only non-staking UTXOs; used to convert legacy funds.
    NonStakingOnly,
}

/// Candidate order for selection.
///
/// Non-staking and staking UTXOs are shuffled separately with the same
/// generator, non-staking first.
pub fn order_utxos(utxos: Vec<Utxo>, mode: SelectionMode, rng: &mut PseudoRandom) -> Vec<Utxo> {
    let (mut staking, mut non_staking): (Vec<Utxo>, Vec<Utxo>) =
        utxos.into_iter().partition(|u| is_base(&u.address));
    shuffle(&mut non_staking, rng);
    if mode == SelectionMode::NonStakingOnly {
        return non_staking;
    }
    shuffle(&mut staking, rng);
    non_staking.extend(staking);
    non_staking
}

/// Smallest candidate prefix that yields a plan.
///
/// Inputs are added in candidate order; after each addition the plan builder
/// is consulted with `change_address` as the change candidate. When no prefix
/// works the outcome carries the fee estimated over all candidates.
pub fn select_minimal_tx_plan(
    fee: &dyn FeeCalculator,
    candidates: &[Utxo],
    change_address: &str,
    outputs: &[Output],
    certificate: Option<&Certificate>,
) -> Result<PlanOutcome, WalletError> {
    let change = Output::new(change_address, 0);
    let mut inputs: Vec<TxInput> = Vec::with_capacity(candidates.len());

    for utxo in candidates {
        inputs.push(TxInput::Utxo(utxo.clone()));
        if let Some(plan) = compute_tx_plan(TxPlanKind::Utxo, fee, &inputs, outputs, Some(&change), certificate)? {
            debug!(inputs = plan.inputs.len(), fee = plan.fee, change = plan.change_coins(), "selected plan");
            return Ok(PlanOutcome::Ready(plan));
        }
    }

    let estimated_fee = fee.required_fee(&inputs, outputs, certificate);
    debug!(candidates = candidates.len(), estimated_fee, "insufficient funds");
    Ok(PlanOutcome::InsufficientFunds { estimated_fee })
}

/// Builder for a UTXO-spending plan.
///
/// # Example
/// ```ignore
/// let outcome = TxPlanner::new(&fee)
///     .destination(address, 2_000_000)
///     .donation(&donation_address, 500_000)
///     .select(utxos, &change_address, seeds.input_seed)?;
/// ```
pub struct TxPlanner<'a> {
    fee: &'a dyn FeeCalculator,
    outputs: Vec<Output>,
    certificate: Option<Certificate>,
    mode: SelectionMode,
}

impl<'a> TxPlanner<'a> {
    pub fn new(fee: &'a dyn FeeCalculator) -> Self {
        Self {
            fee,
            outputs: Vec::new(),
            certificate: None,
            mode: SelectionMode::All,
        }
    }

    /// Pay `coins` to `address`. Zero amounts add no output.
    pub fn destination(&mut self, address: &str, coins: Lovelace) -> &mut Self {
        if coins > 0 {
            self.outputs.push(Output::new(address, coins));
        }
        self
    }

    /// Add a donation output. Zero amounts add no output.
    pub fn donation(&mut self, address: &str, amount: Lovelace) -> &mut Self {
        self.destination(address, amount)
    }

    /// Attach a stake delegation certificate.
    ///
    /// # Errors
    /// [`WalletError::InvalidDelegation`] for an empty pool list or zero
    /// total weight.
    pub fn delegation(
        &mut self,
        pools: Vec<PoolDelegation>,
        account_address: &str,
    ) -> Result<&mut Self, WalletError> {
        if pools.is_empty() {
            return Err(WalletError::InvalidDelegation("no pools".into()));
        }
        let total: u64 = pools.iter().map(|p| u64::from(p.ratio)).sum();
        if total == 0 {
            return Err(WalletError::InvalidDelegation("total ratio is zero".into()));
        }
        self.certificate = Some(Certificate::StakeDelegation {
            pools,
            account_address: account_address.to_string(),
        });
        Ok(self)
    }

    /// Restrict selection to non-staking UTXOs.
    pub fn non_staking_only(&mut self) -> &mut Self {
        self.mode = SelectionMode::NonStakingOnly;
        self
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// Order `utxos` with `input_seed` and select the minimal plan.
    pub fn select(
        &self,
        utxos: Vec<Utxo>,
        change_address: &str,
        input_seed: u32,
    ) -> Result<PlanOutcome, WalletError> {
        let mut rng = PseudoRandom::new(input_seed);
        let candidates = order_utxos(utxos, self.mode, &mut rng);
        select_minimal_tx_plan(
            self.fee,
            &candidates,
            change_address,
            &self.outputs,
            self.certificate.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{AddressProviders, Seed};
    use crate::config::WalletConfig;
    use crate::test_utils::{FixedFee, StepFee};
    use lode_core::fee::{ChainConfig, LinearFee};

    fn utxo(address: &str, coins: Lovelace, n: u32) -> Utxo {
        Utxo {
            tx_hash: format!("{n:064x}"),
            output_index: n,
            address: address.to_string(),
            coins,
        }
    }

    /// One real base address and one real legacy address.
    fn addresses() -> (String, String) {
        let providers = AddressProviders::from_seed(Seed::from_bytes([3u8; 32]), &WalletConfig::default()).unwrap();
        (
            providers.base_external.derive(0).unwrap().address,
            providers.legacy_external.derive(0).unwrap().address,
        )
    }

    #[test]
    fn non_staking_precede_staking() {
        let (base, legacy) = addresses();
        let utxos: Vec<Utxo> = (0..6)
            .map(|n| utxo(if n % 2 == 0 { &base } else { &legacy }, 10, n))
            .collect();
        let ordered = order_utxos(utxos, SelectionMode::All, &mut PseudoRandom::new(11));
        assert_eq!(ordered.len(), 6);
        assert!(ordered[..3].iter().all(|u| u.address == legacy));
        assert!(ordered[3..].iter().all(|u| u.address == base));
    }

    #[test]
    fn non_staking_only_drops_base_utxos() {
        let (base, legacy) = addresses();
        let utxos = vec![utxo(&base, 10, 0), utxo(&legacy, 10, 1), utxo("unparseable", 10, 2)];
        let ordered = order_utxos(utxos, SelectionMode::NonStakingOnly, &mut PseudoRandom::new(1));
        assert_eq!(ordered.len(), 2);
        assert!(ordered.iter().all(|u| u.address != base));
    }

    #[test]
    fn ordering_is_seeded() {
        let utxos: Vec<Utxo> = (0..10).map(|n| utxo("legacy", 10, n)).collect();
        let a = order_utxos(utxos.clone(), SelectionMode::All, &mut PseudoRandom::new(5));
        let b = order_utxos(utxos, SelectionMode::All, &mut PseudoRandom::new(5));
        assert_eq!(a, b);
    }

    #[test]
    fn smallest_sufficient_prefix_wins() {
        let candidates = vec![utxo("a", 300, 0), utxo("b", 300, 1), utxo("c", 300, 2)];
        let outputs = vec![Output::new("dst", 500)];
        let outcome = select_minimal_tx_plan(&FixedFee(50), &candidates, "chg", &outputs, None).unwrap();
        let plan = outcome.into_plan().unwrap();
        assert_eq!(plan.inputs.len(), 2);
        assert_eq!(plan.change, Some(Output::new("chg", 50)));
        assert!(plan.is_balanced());
    }

    #[test]
    fn insufficient_reports_fee_over_all_candidates() {
        let fee = LinearFee::new(ChainConfig::default());
        let candidates = vec![utxo("a", 100, 0), utxo("b", 100, 1)];
        let outputs = vec![Output::new("dst", 1_000_000)];
        let outcome = select_minimal_tx_plan(&fee, &candidates, "chg", &outputs, None).unwrap();
        assert_eq!(
            outcome,
            PlanOutcome::InsufficientFunds {
                estimated_fee: 200_000 + 3 * 100_000
            }
        );
    }

    #[test]
    fn empty_candidates_are_insufficient() {
        let outcome = select_minimal_tx_plan(&FixedFee(1), &[], "chg", &[Output::new("d", 1)], None).unwrap();
        assert_eq!(outcome, PlanOutcome::InsufficientFunds { estimated_fee: 1 });
    }

    #[test]
    fn planner_skips_zero_amounts() {
        let fee = FixedFee(0);
        let mut planner = TxPlanner::new(&fee);
        planner.destination("dst", 0).donation("don", 0);
        assert!(planner.outputs().is_empty());
        planner.destination("dst", 5).donation("don", 1);
        assert_eq!(planner.outputs().len(), 2);
    }

    #[test]
    fn planner_rejects_bad_delegations() {
        let fee = FixedFee(0);
        let mut planner = TxPlanner::new(&fee);
        assert!(matches!(
            planner.delegation(vec![], "acct"),
            Err(WalletError::InvalidDelegation(_))
        ));
        let zero = vec![PoolDelegation {
            pool_id: "p".into(),
            ratio: 0,
        }];
        assert!(matches!(
            planner.delegation(zero, "acct"),
            Err(WalletError::InvalidDelegation(_))
        ));
        assert!(planner.certificate().is_none());
    }

    #[test]
    fn planner_end_to_end() {
        let fee = StepFee {
            without: 180_000,
            with: 200_000,
            base_outputs: 1,
        };
        let outcome = TxPlanner::new(&fee)
            .destination("dst", 500_000)
            .select(vec![utxo("legacy", 1_000_000, 0)], "chg", 42)
            .unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.fee, 200_000);
        assert_eq!(plan.change_coins(), 300_000);
    }

    #[test]
    fn delegation_only_plan() {
        let fee = LinearFee::new(ChainConfig::default());
        let pools = vec![
            PoolDelegation {
                pool_id: "p1".into(),
                ratio: 1,
            },
            PoolDelegation {
                pool_id: "p2".into(),
                ratio: 3,
            },
        ];
        let mut planner = TxPlanner::new(&fee);
        planner.delegation(pools, "acct").unwrap();
        let plan = planner
            .select(vec![utxo("legacy", 5_000_000, 0)], "chg", 1)
            .unwrap()
            .into_plan()
            .unwrap();
        assert!(plan.outputs.is_empty());
        assert!(plan.certificate.is_some());
        assert!(plan.is_balanced());
    }
}
