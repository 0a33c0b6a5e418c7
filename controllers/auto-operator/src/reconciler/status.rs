//! Status aggregation.
//!
//! Folds the BundleDeployments Fleet reports for a Channel into one phase.

use crate::reconciler::bundle::owner_selector;
use crds::labels::VENDOR_LABEL;
use crds::{BundleDeployment, ChannelPhase};
use gpu_stack::Vendor;
use kube_store::{ObjectStore, StoreError};
use tracing::debug;

/// Display states Fleet uses for a deployment that did not converge
pub const FAILING_STATES: [&str; 3] = ["ErrApplied", "Modified", "NotReady"];

/// Reduces deployment results to a phase.
///
/// Failure dominates readiness; nothing reported yet is still rolling out.
pub fn aggregate_phase(deployments: &[BundleDeployment]) -> ChannelPhase {
    if deployments.is_empty() {
        return ChannelPhase::RollingOut;
    }
    let failing = deployments
        .iter()
        .any(|bd| bd.display_state().is_some_and(|s| FAILING_STATES.contains(&s)));
    if failing {
        return ChannelPhase::Failed;
    }
    if deployments.iter().any(BundleDeployment::is_ready) {
        return ChannelPhase::Completed;
    }
    ChannelPhase::RollingOut
}

/// Lists the deployments owned by `owner` for `vendor` and aggregates them.
pub async fn summarize(
    store: &dyn ObjectStore,
    owner: &str,
    vendor: Vendor,
) -> Result<ChannelPhase, StoreError> {
    let mut selector = owner_selector(owner);
    selector.insert(VENDOR_LABEL.to_string(), vendor.to_string());

    let deployments = store.list_bundle_deployments(&selector).await?;
    let phase = aggregate_phase(&deployments);
    debug!(
        "Channel {}: {} deployment(s) for {} -> {}",
        owner,
        deployments.len(),
        vendor,
        phase
    );
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_bundle_deployment;
    use kube_store::MockObjectStore;

    fn bd(ready: bool, state: &str) -> BundleDeployment {
        create_test_bundle_deployment("bd", "gpu", Vendor::Nvidia, ready, Some(state))
    }

    #[test]
    fn test_no_deployments_is_rolling_out() {
        assert_eq!(aggregate_phase(&[]), ChannelPhase::RollingOut);
    }

    #[test]
    fn test_ready_deployment_completes() {
        assert_eq!(aggregate_phase(&[bd(true, "Ready")]), ChannelPhase::Completed);
        assert_eq!(
            aggregate_phase(&[bd(true, "Ready"), bd(false, "WaitApplied")]),
            ChannelPhase::Completed
        );
    }

    #[test]
    fn test_failure_dominates_readiness() {
        for state in FAILING_STATES {
            let phase = aggregate_phase(&[bd(true, "Ready"), bd(true, state), bd(true, "Ready")]);
            assert_eq!(phase, ChannelPhase::Failed, "state {}", state);
        }
    }

    #[test]
    fn test_unready_without_failure_is_rolling_out() {
        assert_eq!(
            aggregate_phase(&[bd(false, "WaitApplied"), bd(false, "Pending")]),
            ChannelPhase::RollingOut
        );
        let no_status = create_test_bundle_deployment("bd", "gpu", Vendor::Nvidia, false, None);
        assert_eq!(aggregate_phase(&[no_status]), ChannelPhase::RollingOut);
    }

    #[test]
    fn test_aggregation_is_total() {
        let states = ["Ready", "ErrApplied", "Modified", "NotReady", "WaitApplied", ""];
        for a in states {
            for b in states {
                for ready in [true, false] {
                    let phase = aggregate_phase(&[bd(ready, a), bd(!ready, b)]);
                    assert!(matches!(
                        phase,
                        ChannelPhase::RollingOut | ChannelPhase::Completed | ChannelPhase::Failed
                    ));
                    if FAILING_STATES.contains(&a) || FAILING_STATES.contains(&b) {
                        assert_eq!(phase, ChannelPhase::Failed);
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_summarize_filters_by_owner_and_vendor() {
        let store = MockObjectStore::new();
        store.add_bundle_deployment(create_test_bundle_deployment("a", "gpu", Vendor::Nvidia, true, Some("Ready")));
        store.add_bundle_deployment(create_test_bundle_deployment("b", "other", Vendor::Nvidia, false, Some("ErrApplied")));
        store.add_bundle_deployment(create_test_bundle_deployment("c", "gpu", Vendor::Amd, false, Some("ErrApplied")));

        let phase = summarize(&store, "gpu", Vendor::Nvidia).await.unwrap();
        assert_eq!(phase, ChannelPhase::Completed);
    }

    #[tokio::test]
    async fn test_summarize_surfaces_list_errors() {
        let store = MockObjectStore::new();
        store.fail_list_bundle_deployments("connection refused");
        assert!(summarize(&store, "gpu", Vendor::Nvidia).await.is_err());
    }
}
