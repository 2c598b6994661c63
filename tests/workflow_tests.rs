mod common;

use common::{ACCOUNT, AutomationMode, BANK_CODE, HOLDER, Harness, submission};
use payout_activation::domain::organizer::{ActivationMethod, OrganizerAccount, OrganizerState};
use payout_activation::domain::provisioning::{OutboxStatus, ProvisioningOutcome};
use payout_activation::error::PayoutError;

fn assert_invariant(record: &OrganizerAccount) {
    if record.is_setup_complete() {
        assert!(
            record.subaccount_id().is_some(),
            "{} is complete without a subaccount id",
            record.user_id
        );
        assert!(record.activation().is_some());
    }
}

#[tokio::test]
async fn test_end_to_end_activation() {
    let h = Harness::happy_path();
    h.automation.set_mode(AutomationMode::Accept);

    let receipt = h.onboarding.submit_bank_details(submission("u1")).await.unwrap();
    assert_eq!(receipt.record.account_name(), Some(HOLDER));
    assert_eq!(receipt.record.state(), OrganizerState::BankSubmitted);
    assert_eq!(receipt.provisioning, ProvisioningOutcome::Pending);
    assert_invariant(&receipt.record);

    let record = h
        .onboarding
        .attach_subaccount("u1", "SUB_123")
        .await
        .unwrap();
    assert_eq!(record.state(), OrganizerState::SubaccountPending);
    assert_invariant(&record);

    let record = h.gate.activate_verified("u1").await.unwrap();
    assert_eq!(record.state(), OrganizerState::Active);
    assert!(record.paystack_verified());
    assert!(record.last_verified().is_some());
    assert_eq!(
        record.activation().map(|a| a.method),
        Some(ActivationMethod::Verified)
    );
    assert_invariant(&record);

    assert_eq!(h.record("u1").await.unwrap(), record);
    assert_eq!(h.notifier.count(), 1);
    assert_eq!(h.provider.calls(), 1);
}

#[tokio::test]
async fn test_end_to_end_activation_with_synchronous_provisioning() {
    let h = Harness::happy_path();

    let receipt = h.onboarding.submit_bank_details(submission("u1")).await.unwrap();
    assert_eq!(
        receipt.provisioning,
        ProvisioningOutcome::Assigned {
            subaccount_id: "SUB_123".to_string()
        }
    );
    assert_eq!(receipt.record.state(), OrganizerState::SubaccountPending);
    assert_invariant(&receipt.record);

    let record = h.gate.activate_verified("u1").await.unwrap();
    assert_eq!(record.state(), OrganizerState::Active);
    assert_eq!(record.subaccount_id(), Some("SUB_123"));
    assert!(record.paystack_verified());
    assert_eq!(
        record.activation().map(|a| a.method),
        Some(ActivationMethod::Verified)
    );
    assert_invariant(&record);

    assert_eq!(h.record("u1").await.unwrap(), record);
    assert_eq!(h.automation.calls(), 1);
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(h.notifier.count(), 1);
}

#[tokio::test]
async fn test_synchronous_provisioning_assigns_subaccount() {
    let h = Harness::happy_path();

    let receipt = h.onboarding.submit_bank_details(submission("u1")).await.unwrap();

    assert_eq!(
        receipt.provisioning,
        ProvisioningOutcome::Assigned {
            subaccount_id: "SUB_123".to_string()
        }
    );
    assert_eq!(receipt.record.subaccount_id(), Some("SUB_123"));
    let stored = h.record("u1").await.unwrap();
    assert_eq!(stored.state(), OrganizerState::SubaccountPending);
    assert_invariant(&stored);
}

#[tokio::test]
async fn test_verification_is_deterministic() {
    let h = Harness::happy_path();

    let first = h.onboarding.verify_account(ACCOUNT, BANK_CODE).await.unwrap();
    let second = h.onboarding.verify_account(ACCOUNT, BANK_CODE).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.account_name, HOLDER);
}

#[tokio::test]
async fn test_malformed_account_rejected_before_network() {
    let h = Harness::happy_path();

    for bad in ["12345", "01020273221", "01020A7322", ""] {
        let err = h.onboarding.verify_account(bad, BANK_CODE).await.unwrap_err();
        assert!(matches!(err, PayoutError::Format(_)), "{bad}: {err}");
    }

    let mut bad = submission("u1");
    bad.account_number = "0102".to_string();
    assert!(matches!(
        h.onboarding.submit_bank_details(bad).await,
        Err(PayoutError::Format(_))
    ));

    assert_eq!(h.directory.calls(), 0);
    assert!(h.record("u1").await.is_none());
}

#[tokio::test]
async fn test_verification_fails_closed() {
    let h = Harness::happy_path();

    let mut unknown = submission("u1");
    unknown.account_number = "9999999999".to_string();
    assert!(matches!(
        h.onboarding.submit_bank_details(unknown).await,
        Err(PayoutError::InvalidAccount(_))
    ));

    h.directory.exhaust_quota();
    assert!(matches!(
        h.onboarding.submit_bank_details(submission("u1")).await,
        Err(PayoutError::RateLimited { .. })
    ));

    assert!(h.record("u1").await.is_none());
    assert_eq!(h.automation.calls(), 0);
}

#[tokio::test]
async fn test_provisioning_failure_keeps_bank_details() {
    let h = Harness::happy_path();
    h.automation.set_mode(AutomationMode::Fail);

    let receipt = h.onboarding.submit_bank_details(submission("u1")).await.unwrap();

    assert!(matches!(
        receipt.provisioning,
        ProvisioningOutcome::Failed { ref reason } if reason.contains("webhook error: 500")
    ));
    let stored = h.record("u1").await.unwrap();
    assert_eq!(stored.state(), OrganizerState::BankSubmitted);
    assert_eq!(stored.account_name(), Some(HOLDER));
}

#[tokio::test]
async fn test_resubmission_is_not_provisioned_twice() {
    let h = Harness::happy_path();
    h.automation.set_mode(AutomationMode::Accept);

    h.onboarding.submit_bank_details(submission("u1")).await.unwrap();
    let mut again = submission("u1");
    again.email = Some("new@example.com".to_string());
    let receipt = h.onboarding.submit_bank_details(again).await.unwrap();

    assert_eq!(receipt.provisioning, ProvisioningOutcome::Pending);
    assert_eq!(receipt.record.email.as_deref(), Some("new@example.com"));
    assert_eq!(h.automation.calls(), 1);

    let history = h.onboarding.provisioning_history("u1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attempts, 1);
    assert_eq!(history[0].status, OutboxStatus::Accepted);
}

#[tokio::test]
async fn test_retry_resends_only_failed_submissions() {
    let h = Harness::happy_path();
    h.automation.set_mode(AutomationMode::Fail);
    h.onboarding.submit_bank_details(submission("u1")).await.unwrap();

    h.automation
        .set_mode(AutomationMode::Assign("SUB_123".to_string()));
    let receipt = h.onboarding.retry_provisioning("u1", false).await.unwrap();
    assert_eq!(
        receipt.provisioning,
        ProvisioningOutcome::Assigned {
            subaccount_id: "SUB_123".to_string()
        }
    );

    // Same submission both times, so the idempotency key does not change.
    let keys = h.automation.idempotency_keys.lock().unwrap().clone();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);

    let history = h.onboarding.provisioning_history("u1").await.unwrap();
    assert_eq!(history[0].attempts, 2);

    // A subaccount is already on record: nothing left to send.
    h.onboarding.retry_provisioning("u1", false).await.unwrap();
    assert_eq!(h.automation.calls(), 2);
}

#[tokio::test]
async fn test_forced_retry_resends_accepted_submission() {
    let h = Harness::happy_path();
    h.automation.set_mode(AutomationMode::Accept);
    h.onboarding.submit_bank_details(submission("u1")).await.unwrap();

    // The automation accepted the request but no id ever came back.
    h.automation
        .set_mode(AutomationMode::Assign("SUB_123".to_string()));
    let receipt = h.onboarding.submit_bank_details(submission("u1")).await.unwrap();
    assert_eq!(receipt.provisioning, ProvisioningOutcome::Pending);
    let receipt = h.onboarding.retry_provisioning("u1", false).await.unwrap();
    assert_eq!(receipt.provisioning, ProvisioningOutcome::Pending);
    assert_eq!(receipt.record.state(), OrganizerState::BankSubmitted);
    assert_eq!(h.automation.calls(), 1);

    let receipt = h.onboarding.retry_provisioning("u1", true).await.unwrap();
    assert_eq!(
        receipt.provisioning,
        ProvisioningOutcome::Assigned {
            subaccount_id: "SUB_123".to_string()
        }
    );
    assert_eq!(receipt.record.state(), OrganizerState::SubaccountPending);
    assert_eq!(h.automation.calls(), 2);

    let keys = h.automation.idempotency_keys.lock().unwrap().clone();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);

    let history = h.onboarding.provisioning_history("u1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attempts, 2);

    // Once an id is on record even a forced retry has nothing to send.
    h.onboarding.retry_provisioning("u1", true).await.unwrap();
    assert_eq!(h.automation.calls(), 2);
}

#[tokio::test]
async fn test_retry_requires_known_organizer() {
    let h = Harness::happy_path();
    assert!(matches!(
        h.onboarding.retry_provisioning("ghost", false).await,
        Err(PayoutError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_changed_account_drops_pending_subaccount() {
    let h = Harness::happy_path();
    h.onboarding.submit_bank_details(submission("u1")).await.unwrap();
    assert_eq!(h.record("u1").await.unwrap().subaccount_id(), Some("SUB_123"));

    h.directory.add_account("0000000001", BANK_CODE, "JOHN A. DOE");
    h.automation.set_mode(AutomationMode::Accept);
    let mut moved = submission("u1");
    moved.account_number = "0000000001".to_string();
    let receipt = h.onboarding.submit_bank_details(moved).await.unwrap();

    assert_eq!(receipt.provisioning, ProvisioningOutcome::Pending);
    let stored = h.record("u1").await.unwrap();
    assert_eq!(stored.subaccount_id(), None);
    assert_eq!(stored.account_name(), Some("JOHN A. DOE"));
    assert_eq!(stored.state(), OrganizerState::BankSubmitted);
    assert_eq!(h.automation.calls(), 2);
    assert_eq!(h.onboarding.provisioning_history("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_active_record_rejects_bank_change() {
    let h = Harness::happy_path();
    h.onboarding.submit_bank_details(submission("u1")).await.unwrap();
    h.gate.force_activate("u1").await.unwrap();
    let before = h.record("u1").await.unwrap();

    h.directory.add_account(ACCOUNT, "058", HOLDER);
    let mut other_bank = submission("u1");
    other_bank.bank_code = "058".to_string();
    assert!(matches!(
        h.onboarding.submit_bank_details(other_bank).await,
        Err(PayoutError::AlreadyActive(_))
    ));
    assert_eq!(h.record("u1").await.unwrap(), before);

    // Resubmitting the same details is harmless.
    let receipt = h.onboarding.submit_bank_details(submission("u1")).await.unwrap();
    assert!(receipt.record.is_setup_complete());
    assert_eq!(receipt.record.activation(), before.activation());
    assert_invariant(&receipt.record);
}

#[tokio::test]
async fn test_list_banks_passes_through_directory() {
    let h = Harness::happy_path();
    let banks = h.onboarding.list_banks().await.unwrap();
    assert_eq!(banks.len(), 1);
    assert_eq!(banks[0].code, BANK_CODE);
}
