//! Transfer-fee lifecycle against the in-memory ledger

mod common;

use common::{scenario_fee, Harness, MINT_AMOUNT, TRANSFER_AMOUNT};
use withheld_sdk::{
    instructions::{create_mint_instructions, transfer_with_fee_instruction, CollectionOp, MintSpec},
    prelude::*,
    protocol::TransferQuote,
    ClusterClient, CollectionKind, CollectionPath, ErrorKind, FeeBreakdown, LifecyclePlan,
    SdkError, TransferFeeParams,
};
use withheld_sdk::testing::LOCAL_SIGNATURE_FEE;

#[tokio::test]
async fn test_transfer_withholds_fee_at_destination() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;

    let quote = h.client.tokens.quote(&setup.mint, TRANSFER_AMOUNT).await.unwrap();
    assert_eq!(quote.fee(), 5_000);
    assert_eq!(quote.net(), 995_000);

    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    assert_eq!(h.balance(&setup.destination).await, 995_000);
    assert_eq!(h.withheld(&setup.destination).await, 5_000);
    assert_eq!(h.balance(&setup.source).await, MINT_AMOUNT - TRANSFER_AMOUNT);
    assert_eq!(h.withheld(&setup.source).await, 0);
}

#[tokio::test]
async fn test_two_transfers_accumulate_withheld() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;

    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    let found = h.client.discovery.find_withheld(&setup.mint).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].address, setup.destination);
    assert_eq!(found[0].owner, h.recipient.pubkey());
    assert_eq!(found[0].withheld_amount, 10_000);
}

#[tokio::test]
async fn test_discovery_is_empty_before_transfers_and_idempotent() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;

    assert!(h.client.discovery.find_withheld(&setup.mint).await.unwrap().is_empty());

    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;
    let first = h.client.discovery.find_withheld(&setup.mint).await.unwrap();
    let second = h.client.discovery.find_withheld(&setup.mint).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_discovery_orders_by_address() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;

    for _ in 0..5 {
        let owner = Pubkey::new_unique();
        let (account, _) = h
            .client
            .tokens
            .create_account(&h.payer, &setup.mint, &owner)
            .await
            .unwrap();
        h.transfer(&setup, &account, TRANSFER_AMOUNT).await;
    }

    let found = h.client.discovery.find_withheld(&setup.mint).await.unwrap();
    assert_eq!(found.len(), 5);
    assert!(found.windows(2).all(|w| w[0].address < w[1].address));
}

#[tokio::test]
async fn test_withdraw_from_accounts_moves_exact_amount() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    let collector = h.client.collector(setup.mint, &h.payer, Some(&h.payer));
    let receipts = collector
        .collect(CollectionPath::Withdraw, &setup.destination)
        .await
        .unwrap();

    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].kind, CollectionKind::WithdrawFromAccounts);
    assert_eq!(receipts[0].amount, 5_000);
    assert_eq!(receipts[0].sources, vec![setup.destination]);
    assert_eq!(h.withheld(&setup.destination).await, 0);
    assert_eq!(h.balance(&setup.destination).await, TRANSFER_AMOUNT);

    let ledger = h.ledger.withheld_ledger(&setup.mint).unwrap();
    assert_eq!(ledger.total_value(), u128::from(MINT_AMOUNT));
    assert_eq!(ledger.total_withheld(), 0);
}

#[tokio::test]
async fn test_harvest_then_withdraw_from_mint_credits_once() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    let collector = h.client.collector(setup.mint, &h.payer, Some(&h.payer));
    let harvest = collector
        .plan(CollectionPath::Harvest, &setup.destination)
        .await
        .unwrap();
    let receipt = collector.execute(&harvest).await.unwrap();
    assert_eq!(receipt.kind, CollectionKind::HarvestToMint);
    assert_eq!(receipt.amount, 5_000);

    // harvest conserves the total, moving it into the pool
    let snapshot = h.client.discovery.snapshot(&setup.mint).await.unwrap();
    assert!(snapshot.accounts.is_empty());
    assert_eq!(snapshot.mint_pool, 5_000);
    assert_eq!(snapshot.total(), 5_000);

    let drained = collector.drain_mint(&setup.destination).await.unwrap();
    assert_eq!(drained.kind, CollectionKind::WithdrawFromMint);
    assert_eq!(drained.amount, 5_000);
    assert_eq!(h.client.mint.fetch(&setup.mint).await.unwrap().withheld_amount(), 0);

    // the harvested amount is gone from the account
    let stale = CollectionOp::WithdrawFromAccounts {
        destination: setup.destination,
        sources: vec![setup.destination],
    };
    let before = h.ledger.transaction_count().unwrap();
    let err = collector.execute(&stale).await.unwrap_err();
    assert!(matches!(err, SdkError::NothingToCollect(_)));
    assert_eq!(h.ledger.transaction_count().unwrap(), before);

    assert_eq!(h.balance(&setup.destination).await, TRANSFER_AMOUNT);
}

#[tokio::test]
async fn test_harvest_path_drains_pool_into_destination() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    let collector = h.client.collector(setup.mint, &h.payer, Some(&h.payer));
    let receipts = collector
        .collect(CollectionPath::Harvest, &setup.destination)
        .await
        .unwrap();

    let kinds: Vec<_> = receipts.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![CollectionKind::HarvestToMint, CollectionKind::WithdrawFromMint]
    );
    assert_eq!(receipts[1].amount, 10_000);
    assert_eq!(h.client.discovery.total_withheld(&setup.mint).await.unwrap(), 0);
    assert_eq!(h.balance(&setup.destination).await, 2 * TRANSFER_AMOUNT);
}

#[tokio::test]
async fn test_nothing_to_collect_before_any_transfer() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    let collector = h.client.collector(setup.mint, &h.payer, Some(&h.payer));

    for path in [CollectionPath::Withdraw, CollectionPath::Harvest] {
        let err = collector.collect(path, &setup.destination).await.unwrap_err();
        assert!(matches!(err, SdkError::NothingToCollect(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

#[tokio::test]
async fn test_withdraw_requires_withdraw_authority() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;
    let before = h.ledger.transaction_count().unwrap();

    let stranger = Keypair::new();
    for authority in [None, Some(&stranger)] {
        let collector = h.client.collector(setup.mint, &h.payer, authority);
        let err = collector
            .collect(CollectionPath::Withdraw, &setup.destination)
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Unauthorized(_)), "{:?}", err);
    }
    assert_eq!(h.ledger.transaction_count().unwrap(), before);
    assert_eq!(h.withheld(&setup.destination).await, 5_000);
}

#[tokio::test]
async fn test_harvest_is_permissionless_but_pool_withdraw_is_not() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    let anyone = Keypair::new();
    h.ledger.fund(&anyone.pubkey(), 1_000_000).unwrap();
    let collector = h.client.collector(setup.mint, &anyone, None);

    let op = collector
        .plan(CollectionPath::Harvest, &setup.destination)
        .await
        .unwrap();
    assert_eq!(collector.execute(&op).await.unwrap().amount, 5_000);

    let err = collector.drain_mint(&setup.destination).await.unwrap_err();
    assert!(matches!(err, SdkError::Unauthorized(_)));
}

#[tokio::test]
async fn test_ledger_rejects_foreign_withdraw_authority() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    // bypass the collector's own check
    let stranger = Keypair::new();
    let op = CollectionOp::WithdrawFromAccounts {
        destination: setup.destination,
        sources: vec![setup.destination],
    };
    let instructions = withheld_sdk::instructions::collection_instructions(
        &op,
        &setup.mint,
        &stranger.pubkey(),
        20,
    )
    .unwrap();
    let err = h
        .ledger
        .send_and_confirm(&instructions, &h.payer, &[&stranger])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_large_source_sets_are_batched() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;

    for _ in 0..25 {
        let owner = Pubkey::new_unique();
        let (account, _) = h
            .client
            .tokens
            .create_account(&h.payer, &setup.mint, &owner)
            .await
            .unwrap();
        h.transfer(&setup, &account, TRANSFER_AMOUNT).await;
    }

    let collector = h
        .client
        .collector(setup.mint, &h.payer, Some(&h.payer))
        .with_batch_size(10);
    let receipts = collector
        .collect(CollectionPath::Withdraw, &setup.destination)
        .await
        .unwrap();

    assert_eq!(receipts[0].signatures.len(), 3);
    assert_eq!(receipts[0].sources.len(), 25);
    assert_eq!(receipts[0].amount, 25 * 5_000);
    assert_eq!(h.client.discovery.total_withheld(&setup.mint).await.unwrap(), 0);
}

#[tokio::test]
async fn test_corrupt_account_aborts_discovery() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    let corrupt = Pubkey::new_unique();
    let mut data = setup.mint.to_bytes().to_vec();
    data.extend_from_slice(&[0xAB; 40]);
    h.ledger
        .insert_raw_token_account(&setup.mint, &corrupt, data)
        .unwrap();

    let err = h.client.discovery.find_withheld(&setup.mint).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Deserialization);
    assert!(matches!(err, SdkError::Deserialization { address, .. } if address == corrupt));
}

#[tokio::test]
async fn test_rounding_disagreement_rejected_before_submission() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    let before = h.ledger.transaction_count().unwrap();

    // 100 * 50 / 10000 = 0.5
    let err = h
        .client
        .tokens
        .transfer_with_fee(&h.payer, &setup.mint, &setup.source, &setup.destination, &h.payer, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::FeeMismatch { client: 0, program: 1 }));
    assert_eq!(h.ledger.transaction_count().unwrap(), before);
}

#[tokio::test]
async fn test_wrong_stated_fee_rejected_by_program() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;

    let quote = TransferQuote {
        params: scenario_fee(),
        breakdown: FeeBreakdown {
            gross: TRANSFER_AMOUNT,
            fee: 4_000,
            net: TRANSFER_AMOUNT - 4_000,
        },
        epoch: 0,
    };
    let instruction = transfer_with_fee_instruction(
        &setup.source,
        &setup.mint,
        &setup.destination,
        &h.payer.pubkey(),
        9,
        &quote,
    )
    .unwrap();

    let err = h
        .ledger
        .send_and_confirm(&[instruction], &h.payer, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::TransactionRejected(_)));
    assert_eq!(h.balance(&setup.source).await, MINT_AMOUNT);
}

#[tokio::test]
async fn test_overdraft_rejected_before_submission() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;

    let err = h
        .client
        .tokens
        .transfer_with_fee(
            &h.payer,
            &setup.mint,
            &setup.source,
            &setup.destination,
            &h.payer,
            MINT_AMOUNT + 1,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_extension_after_mint_initialization_rejected() {
    let h = Harness::new();
    let mint = Keypair::new();
    let spec = h.fee_spec(scenario_fee());
    let lamports = h
        .ledger
        .minimum_balance_for_rent_exemption(spec.account_len().unwrap())
        .await
        .unwrap();

    let mut instructions =
        create_mint_instructions(&h.payer.pubkey(), &mint.pubkey(), lamports, &spec).unwrap();
    // allocate, initialize mint, then the fee extension
    instructions.swap(1, 2);

    let err = h
        .ledger
        .send_and_confirm(&instructions, &h.payer, &[&mint])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
    assert!(!err.is_retryable());

    // the allocation was rolled back with the rest of the transaction
    assert!(h.ledger.get_account(&mint.pubkey()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_fee_rejected_before_submission() {
    let h = Harness::new();
    let spec = MintSpec::new(9, h.payer.pubkey()).with_transfer_fee(
        None,
        None,
        TransferFeeParams {
            basis_points: 10_001,
            maximum_fee: 0,
        },
    );
    let before = h.ledger.transaction_count().unwrap();
    let err = h
        .client
        .mint
        .create_mint(&h.payer, &Keypair::new(), &spec)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.ledger.transaction_count().unwrap(), before);
}

#[tokio::test]
async fn test_create_and_close_mint() {
    let h = Harness::new();
    let spec = MintSpec::new(9, h.payer.pubkey()).with_close_authority(h.payer.pubkey());
    let mint = h.create_mint(&spec).await;

    let view = h.client.mint.fetch(&mint).await.unwrap();
    assert_eq!(view.close_authority, Some(h.payer.pubkey()));
    assert!(!view.has_transfer_fee());

    let stranger = Keypair::new();
    let err = h
        .client
        .mint
        .close(&h.payer, &mint, &h.payer.pubkey(), &stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Unauthorized(_)));

    let balance = h.ledger.get_balance(&h.payer.pubkey()).await.unwrap();
    h.client
        .mint
        .close(&h.payer, &mint, &h.payer.pubkey(), &h.payer)
        .await
        .unwrap();
    assert!(h.ledger.get_account(&mint).await.unwrap().is_none());
    assert!(h.ledger.get_balance(&h.payer.pubkey()).await.unwrap() > balance);
}

#[tokio::test]
async fn test_close_mint_with_supply_refused() {
    let h = Harness::new();
    let spec = h
        .fee_spec(scenario_fee())
        .with_close_authority(h.payer.pubkey());
    let mint = h.create_mint(&spec).await;
    let (account, _) = h
        .client
        .tokens
        .create_account(&h.payer, &mint, &h.payer.pubkey())
        .await
        .unwrap();
    h.client
        .tokens
        .mint_to(&h.payer, &mint, &account, &h.payer, 1)
        .await
        .unwrap();

    let err = h
        .client
        .mint
        .close(&h.payer, &mint, &h.payer.pubkey(), &h.payer)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::InvalidParameters(_)));
}

#[tokio::test]
async fn test_full_lifecycle() {
    let h = Harness::new();
    let plan = LifecyclePlan {
        decimals: 9,
        fee: scenario_fee(),
        close_authority: false,
        mint_amount: MINT_AMOUNT,
        transfer_amount: TRANSFER_AMOUNT,
        transfers: 1,
        cycles: vec![CollectionPath::Withdraw, CollectionPath::Harvest],
        sources_per_transaction: 20,
    };

    let report = h
        .client
        .lifecycle()
        .run(&h.payer, &h.recipient.pubkey(), &Keypair::new(), &plan)
        .await
        .unwrap();

    let labels: Vec<_> = report.steps.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "create mint",
            "create source account",
            "mint supply",
            "create destination account",
            "transfer with fee",
            "withdraw-from-accounts",
            "transfer with fee",
            "harvest-to-mint",
            "withdraw-from-mint",
        ]
    );
    let withheld: Vec<_> = report.steps.iter().map(|s| s.withheld_after).collect();
    assert_eq!(withheld, vec![0, 0, 0, 0, 5_000, 0, 5_000, 5_000, 0]);

    assert_eq!(report.fees_charged(), 10_000);
    assert_eq!(report.collected(), 10_000);
    assert_eq!(h.balance(&report.destination).await, 2 * TRANSFER_AMOUNT);
    assert_eq!(report.signatures().count(), 9);
}

#[tokio::test]
async fn test_failed_batch_keeps_landed_batches_and_resumes() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    for _ in 0..25 {
        let (account, _) = h
            .client
            .tokens
            .create_account(&h.payer, &setup.mint, &Pubkey::new_unique())
            .await
            .unwrap();
        h.transfer(&setup, &account, TRANSFER_AMOUNT).await;
    }

    // two signatures per batch: enough lamports for the first batch only
    let thin = Keypair::new();
    h.ledger.fund(&thin.pubkey(), 3 * LOCAL_SIGNATURE_FEE).unwrap();
    let collector = h
        .client
        .collector(setup.mint, &thin, Some(&h.payer))
        .with_batch_size(10);

    let err = collector
        .collect(CollectionPath::Withdraw, &setup.destination)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
    assert_eq!(h.balance(&setup.destination).await, 10 * 5_000);
    assert_eq!(
        h.client.discovery.total_withheld(&setup.mint).await.unwrap(),
        15 * 5_000
    );

    // a rerun only picks up what is still withheld
    h.ledger.fund(&thin.pubkey(), 10 * LOCAL_SIGNATURE_FEE).unwrap();
    let receipts = collector
        .collect(CollectionPath::Withdraw, &setup.destination)
        .await
        .unwrap();
    assert_eq!(receipts[0].sources.len(), 15);
    assert_eq!(receipts[0].amount, 15 * 5_000);
    assert_eq!(h.balance(&setup.destination).await, 25 * 5_000);
    assert_eq!(h.client.discovery.total_withheld(&setup.mint).await.unwrap(), 0);
}

#[tokio::test]
async fn test_close_token_account_requires_empty_account() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;

    let err = h
        .client
        .tokens
        .close_account(&h.payer, &setup.destination, &h.payer.pubkey(), &h.recipient)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::InvalidParameters(_)));

    let err = h
        .client
        .tokens
        .close_account(&h.payer, &setup.destination, &h.payer.pubkey(), &h.payer)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Unauthorized(_)));

    let owner = Keypair::new();
    let (empty, _) = h
        .client
        .tokens
        .create_account(&h.payer, &setup.mint, &owner.pubkey())
        .await
        .unwrap();
    let before = h.ledger.get_balance(&owner.pubkey()).await.unwrap();
    h.client
        .tokens
        .close_account(&h.payer, &empty, &owner.pubkey(), &owner)
        .await
        .unwrap();

    assert!(h.ledger.get_account(&empty).await.unwrap().is_none());
    assert!(h.ledger.get_balance(&owner.pubkey()).await.unwrap() > before);
    let found = h.client.discovery.find_withheld(&setup.mint).await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_harvest_skips_sources_of_other_mints() {
    let h = Harness::new();
    let setup = h.fee_mint(scenario_fee()).await;
    let other = h.fee_mint(scenario_fee()).await;
    h.transfer(&setup, &setup.destination, TRANSFER_AMOUNT).await;
    h.transfer(&other, &other.destination, TRANSFER_AMOUNT).await;

    let op = CollectionOp::HarvestToMint {
        sources: vec![setup.destination, other.destination],
    };
    let instructions = withheld_sdk::instructions::collection_instructions(
        &op,
        &setup.mint,
        &h.payer.pubkey(),
        20,
    )
    .unwrap();
    h.ledger
        .send_and_confirm(&instructions, &h.payer, &[])
        .await
        .unwrap();

    let snapshot = h.client.discovery.snapshot(&setup.mint).await.unwrap();
    assert!(snapshot.accounts.is_empty());
    assert_eq!(snapshot.mint_pool, 5_000);
    assert_eq!(h.withheld(&other.destination).await, 5_000);
}
